//! An eager, in-memory scene index.
//!
//! Prims are held in an ordered map so subtree operations are bounded by the
//! affected subtree. Mutations emit the corresponding notifications, which
//! makes this the standard input scene for pipeline construction and tests.

use super::observer::{
	AddedEntry, DirtiedEntry, ObserverList, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use super::{Prim, SceneIndex};
use crate::ds::ContainerRef;
use crate::path::PrimPath;
use crate::tf;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

#[derive(Clone)]
pub struct AddedPrim {
	pub path: PrimPath,
	pub prim_type: tf::Token,
	pub data_source: Option<ContainerRef>,
}

#[derive(Clone)]
struct PrimEntry {
	prim_type: tf::Token,
	data_source: Option<ContainerRef>,
}

#[derive(Default)]
pub struct RetainedSceneIndex {
	prims: RwLock<BTreeMap<PrimPath, PrimEntry>>,
	observers: ObserverList,
}

impl RetainedSceneIndex {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn add_prims(&self, prims: Vec<AddedPrim>) {
		let mut added = Vec::with_capacity(prims.len());
		{
			let mut map = self.prims.write();
			for prim in prims {
				map.insert(
					prim.path.clone(),
					PrimEntry {
						prim_type: prim.prim_type.clone(),
						data_source: prim.data_source,
					},
				);
				added.push(AddedEntry {
					path: prim.path,
					prim_type: prim.prim_type,
				});
			}
		}
		self.observers.send_added(&added);
	}

	/// Removes each listed prim and its whole subtree.
	pub fn remove_prims(&self, paths: Vec<PrimPath>) {
		let mut removed = Vec::with_capacity(paths.len());
		{
			let mut map = self.prims.write();
			for path in paths {
				let in_subtree: Vec<PrimPath> = map
					.range((Bound::Included(path.clone()), Bound::Unbounded))
					.take_while(|(candidate, _)| candidate.has_prefix(&path))
					.map(|(candidate, _)| candidate.clone())
					.collect();
				for candidate in in_subtree {
					map.remove(&candidate);
				}
				removed.push(RemovedEntry { path });
			}
		}
		self.observers.send_removed(&removed);
	}

	/// Replaces the data source of an existing prim and dirties `locators`.
	pub fn set_prim_data_source(
		&self,
		path: &PrimPath,
		data_source: Option<ContainerRef>,
		locators: crate::ds::LocatorSet,
	) {
		{
			let mut map = self.prims.write();
			if let Some(entry) = map.get_mut(path) {
				entry.data_source = data_source;
			} else {
				tracing::warn!("set_prim_data_source: no prim at {path}");
				return;
			}
		}
		self.dirty_prims(vec![DirtiedEntry {
			path: path.clone(),
			locators,
		}]);
	}

	pub fn dirty_prims(&self, entries: Vec<DirtiedEntry>) {
		self.observers.send_dirtied(&entries);
	}

	/// Moves each prim (with its subtree) to a new path.
	pub fn rename_prims(&self, entries: Vec<RenamedEntry>) {
		{
			let mut map = self.prims.write();
			for entry in &entries {
				let in_subtree: Vec<PrimPath> = map
					.range((Bound::Included(entry.old_path.clone()), Bound::Unbounded))
					.take_while(|(candidate, _)| candidate.has_prefix(&entry.old_path))
					.map(|(candidate, _)| candidate.clone())
					.collect();
				for old_path in in_subtree {
					if let Some(prim) = map.remove(&old_path) {
						let suffix = old_path.elements()[entry.old_path.element_count()..].to_vec();
						let mut new_path = entry.new_path.clone();
						for token in suffix {
							new_path = new_path.append_child(&token);
						}
						map.insert(new_path, prim);
					}
				}
			}
		}
		self.observers.send_renamed(&entries);
	}
}

impl SceneIndex for RetainedSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let map = self.prims.read();
		match map.get(path) {
			Some(entry) => Prim::new(entry.prim_type.clone(), entry.data_source.clone()),
			None => Prim::absent(),
		}
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		let child_depth = path.element_count() + 1;
		let map = self.prims.read();
		map.range((Bound::Excluded(path.clone()), Bound::Unbounded))
			.take_while(|(candidate, _)| candidate.has_prefix(path))
			.filter(|(candidate, _)| candidate.element_count() == child_depth)
			.map(|(candidate, _)| candidate.clone())
			.collect()
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.observers.add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.observers.remove(observer);
	}
}
