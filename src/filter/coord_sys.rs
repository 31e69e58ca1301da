//! Synthesizes one coordinate-system prim per bound (target, name) pair.
//!
//! A synthetic prim exists at `target.__coordSys:<name>` exactly while some
//! prim in the scene binds `name` to `target`. Ref-counts are maintained
//! whether or not anyone observes this index; only the notifications are
//! gated on observation.

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{DataSource, RetainedContainer, RetainedSampled};
use crate::path::PrimPath;
use crate::scene::observer::{
	AddedEntry, DirtiedEntry, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::coord_sys::{
	CoordSysBindingSchema, TOKENS, binding_name_of_synthesized, synthesized_child_name,
};
use crate::tf;
use crate::vt;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

pub struct CoordSysPrimSceneIndex {
	base: FilteringBase,
	state: RwLock<BindingState>,
}

#[derive(Default)]
struct BindingState {
	/// target prim -> binding name -> number of live bindings.
	ref_counts: BTreeMap<PrimPath, BTreeMap<tf::Token, usize>>,
	/// binding prim -> the bindings it currently contributes.
	bindings_by_prim: BTreeMap<PrimPath, Vec<(tf::Token, PrimPath)>>,
}

/// Synthetic prims scheduled for addition or removal by a state change.
#[derive(Default)]
struct SyntheticDelta {
	added: Vec<PrimPath>,
	removed: Vec<PrimPath>,
}

impl BindingState {
	fn acquire(&mut self, name: &tf::Token, target: &PrimPath, delta: &mut SyntheticDelta) {
		let count = self
			.ref_counts
			.entry(target.clone())
			.or_default()
			.entry(name.clone())
			.or_insert(0);
		*count += 1;
		if *count == 1 {
			delta.added.push(target.append_child(&synthesized_child_name(name)));
		}
	}

	fn release(&mut self, name: &tf::Token, target: &PrimPath, delta: &mut SyntheticDelta) {
		let Some(counts) = self.ref_counts.get_mut(target) else {
			tracing::error!("coord-sys ref-count underflow for {target} / {name}");
			return;
		};
		let Some(count) = counts.get_mut(name) else {
			tracing::error!("coord-sys ref-count underflow for {target} / {name}");
			return;
		};
		*count -= 1;
		if *count == 0 {
			counts.remove(name);
			if counts.is_empty() {
				self.ref_counts.remove(target);
			}
			delta
				.removed
				.push(target.append_child(&synthesized_child_name(name)));
		}
	}

	/// Replaces the bindings contributed by `prim`, ref-counting the
	/// difference.
	fn rebind(
		&mut self,
		prim: &PrimPath,
		new_bindings: Vec<(tf::Token, PrimPath)>,
		delta: &mut SyntheticDelta,
	) {
		let old_bindings = self.bindings_by_prim.remove(prim).unwrap_or_default();
		for (name, target) in &new_bindings {
			self.acquire(name, target, delta);
		}
		for (name, target) in &old_bindings {
			self.release(name, target, delta);
		}
		if !new_bindings.is_empty() {
			self.bindings_by_prim.insert(prim.clone(), new_bindings);
		}
	}

	/// Releases every binding contributed by prims at or under `root`.
	fn release_subtree(&mut self, root: &PrimPath, delta: &mut SyntheticDelta) {
		let in_subtree: Vec<PrimPath> = self
			.bindings_by_prim
			.range((Bound::Included(root.clone()), Bound::Unbounded))
			.take_while(|(path, _)| path.has_prefix(root))
			.map(|(path, _)| path.clone())
			.collect();
		for path in in_subtree {
			self.rebind(&path, Vec::new(), delta);
		}
	}
}

impl CoordSysPrimSceneIndex {
	pub fn new(input: SceneIndexRef) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			state: RwLock::new(BindingState::default()),
		});
		FilteringBase::observe_input(&index);

		// Account for prims already present in the input.
		let mut delta = SyntheticDelta::default();
		index.scan_subtree(&PrimPath::absolute_root(), &mut delta);
		index
	}

	/// Bindings authored on the prim at `path`, ignoring targets that are
	/// not genuine prim paths; an external layer already synthesizes prims
	/// for those.
	fn scan_prim(&self, path: &PrimPath) -> Vec<(tf::Token, PrimPath)> {
		let Some(data_source) = self.base.input().prim(path).data_source else {
			return Vec::new();
		};
		let Some(schema) = CoordSysBindingSchema::from_prim(&data_source) else {
			return Vec::new();
		};
		let mut bindings = Vec::new();
		for name in schema.binding_names() {
			if let Some(target) = schema.binding_target(&name)
				&& !target.is_absolute_root()
			{
				bindings.push((name, target));
			}
		}
		bindings
	}

	fn scan_subtree(&self, root: &PrimPath, delta: &mut SyntheticDelta) {
		let bindings = self.scan_prim(root);
		if !bindings.is_empty() {
			self.state.write().rebind(root, bindings, delta);
		}
		for child in self.base.input().child_prim_paths(root) {
			self.scan_subtree(&child, delta);
		}
	}

	fn send_delta(&self, delta: SyntheticDelta) {
		let removed: Vec<RemovedEntry> = delta
			.removed
			.into_iter()
			.map(|path| RemovedEntry { path })
			.collect();
		let added: Vec<AddedEntry> = delta
			.added
			.into_iter()
			.map(|path| AddedEntry {
				path,
				prim_type: TOKENS.coord_sys.clone(),
			})
			.collect();
		self.base.observers().send_removed(&removed);
		self.base.observers().send_added(&added);
	}

	fn synthetic_prim(&self, path: &PrimPath) -> Option<Prim> {
		let name = binding_name_of_synthesized(&path.name_token())?;
		let target = path.parent_path()?;
		let state = self.state.read();
		let count = state
			.ref_counts
			.get(&target)
			.and_then(|counts| counts.get(&name))
			.copied()
			.unwrap_or(0);
		if count == 0 {
			return None;
		}
		let coord_sys = RetainedContainer::builder()
			.set(
				TOKENS.name.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(name))),
			)
			.build();
		Some(Prim::new(
			TOKENS.coord_sys.clone(),
			Some(
				RetainedContainer::builder()
					.set(TOKENS.coord_sys.clone(), DataSource::Container(coord_sys))
					.build(),
			),
		))
	}
}

impl SceneIndex for CoordSysPrimSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		if let Some(prim) = self.synthetic_prim(path) {
			return prim;
		}
		self.base.input().prim(path)
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		let mut children = self.base.input().child_prim_paths(path);
		let state = self.state.read();
		if let Some(counts) = state.ref_counts.get(path) {
			for name in counts.keys() {
				children.push(path.append_child(&synthesized_child_name(name)));
			}
		}
		children
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().remove(observer);
	}
}

impl FilteringSceneIndex for CoordSysPrimSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}

	fn on_prims_added(&self, entries: &[AddedEntry]) {
		let mut delta = SyntheticDelta::default();
		for entry in entries {
			let bindings = self.scan_prim(&entry.path);
			self.state.write().rebind(&entry.path, bindings, &mut delta);
		}
		self.base.observers().send_added(entries);
		self.send_delta(delta);
	}

	fn on_prims_removed(&self, entries: &[RemovedEntry]) {
		let mut delta = SyntheticDelta::default();
		{
			let mut state = self.state.write();
			for entry in entries {
				state.release_subtree(&entry.path, &mut delta);
			}
		}
		// Synthetic prims inside a removed subtree go away with it; only
		// removals elsewhere need their own notice.
		delta
			.removed
			.retain(|path| !entries.iter().any(|entry| path.has_prefix(&entry.path)));
		self.base.observers().send_removed(entries);
		self.send_delta(delta);
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		let mut delta = SyntheticDelta::default();
		for entry in entries {
			if entry
				.locators
				.intersects(CoordSysBindingSchema::default_locator())
			{
				let bindings = self.scan_prim(&entry.path);
				self.state.write().rebind(&entry.path, bindings, &mut delta);
			}
		}
		self.base.observers().send_dirtied(entries);
		self.send_delta(delta);
	}

	fn on_prims_renamed(&self, entries: &[RenamedEntry]) {
		let mut delta = SyntheticDelta::default();
		for entry in entries {
			self.state.write().release_subtree(&entry.old_path, &mut delta);
			self.scan_subtree(&entry.new_path, &mut delta);
		}
		self.base.observers().send_renamed(entries);
		self.send_delta(delta);
	}
}
