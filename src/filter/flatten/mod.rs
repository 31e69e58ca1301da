//! The flattening stage: resolves inherited state (primvars, transform,
//! visibility, purpose) so every prim can be queried independently.

pub mod primvars;
pub mod purpose;
pub mod visibility;
pub mod xform;

pub use primvars::{FlattenedPrimvarsDataSource, is_absent_sentinel};
pub use purpose::FlattenedPurposeDataSource;
pub use visibility::FlattenedVisibilityDataSource;
pub use xform::FlattenedXformDataSource;

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{ContainerDataSource, ContainerRef, DataSource, LocatorSet};
use crate::path::PrimPath;
use crate::scene::observer::{
	AddedEntry, DirtiedEntry, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use crate::scene::{Prim, SceneIndex};
use crate::schema::PrimvarsSchema;
use crate::schema::primvars::TOKENS as PRIMVARS_TOKENS;
use crate::schema::purpose::TOKENS as PURPOSE_TOKENS;
use crate::schema::visibility::TOKENS as VISIBILITY_TOKENS;
use crate::schema::xform::TOKENS as XFORM_TOKENS;
use crate::tf;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

/// Filtering scene index that overlays each prim's data source with the
/// flattened primvars, xform, visibility and purpose of its ancestor chain.
///
/// Flattened providers are cached per prim, created on demand when a prim
/// (or one of its descendants) is queried, and destroyed when invalidation
/// reports that the whole aspect must be recomputed.
pub struct FlatteningSceneIndex {
	base: FilteringBase,
	prims: RwLock<BTreeMap<PrimPath, FlattenedPrim>>,
}

#[derive(Clone)]
struct FlattenedPrim {
	primvars: Arc<FlattenedPrimvarsDataSource>,
	xform: ContainerRef,
	visibility: ContainerRef,
	purpose: ContainerRef,
}

impl FlatteningSceneIndex {
	pub fn new(input: crate::scene::SceneIndexRef) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			prims: RwLock::new(BTreeMap::new()),
		});
		FilteringBase::observe_input(&index);
		index
	}

	fn entry_for(&self, path: &PrimPath) -> FlattenedPrim {
		if let Some(entry) = self.prims.read().get(path) {
			return entry.clone();
		}

		let parent = path.parent_path().map(|parent| self.entry_for(&parent));
		let input_data = self.base.input().prim(path).data_source;
		let entry = Self::build_entry(input_data.as_ref(), parent.as_ref());

		// Losing racers adopt whichever entry was published first.
		self.prims
			.write()
			.entry(path.clone())
			.or_insert(entry)
			.clone()
	}

	fn build_entry(
		input_data: Option<&ContainerRef>,
		parent: Option<&FlattenedPrim>,
	) -> FlattenedPrim {
		let aspect = |name: &tf::Token| -> Option<ContainerRef> {
			input_data?.get(name)?.container()
		};

		FlattenedPrim {
			primvars: FlattenedPrimvarsDataSource::new(
				aspect(&PRIMVARS_TOKENS.primvars),
				parent.map(|parent| parent.primvars.clone()),
			),
			xform: FlattenedXformDataSource::flattened(
				aspect(&XFORM_TOKENS.xform),
				parent.map(|parent| parent.xform.clone()),
			),
			visibility: FlattenedVisibilityDataSource::flattened(
				aspect(&VISIBILITY_TOKENS.visibility),
				parent.map(|parent| parent.visibility.clone()),
			),
			purpose: FlattenedPurposeDataSource::flattened(
				aspect(&PURPOSE_TOKENS.purpose),
				parent.map(|parent| parent.purpose.clone()),
			),
		}
	}

	fn cached_subtree(map: &BTreeMap<PrimPath, FlattenedPrim>, root: &PrimPath) -> Vec<PrimPath> {
		map.range((Bound::Included(root.clone()), Bound::Unbounded))
			.take_while(|(path, _)| path.has_prefix(root))
			.map(|(path, _)| path.clone())
			.collect()
	}

	fn drop_cached_subtree(&self, root: &PrimPath) -> Vec<PrimPath> {
		let mut map = self.prims.write();
		let subtree = Self::cached_subtree(&map, root);
		for path in &subtree {
			map.remove(path);
		}
		subtree
	}
}

impl SceneIndex for FlatteningSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let input = self.base.input().prim(path);
		if input.prim_type.is_empty() && input.data_source.is_none() {
			return input;
		}
		let entry = self.entry_for(path);
		Prim::new(
			input.prim_type,
			Some(Arc::new(FlattenedPrimDataSource {
				input: input.data_source,
				entry,
			})),
		)
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		self.base.input().child_prim_paths(path)
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().remove(observer);
	}
}

impl FilteringSceneIndex for FlatteningSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}

	fn on_prims_added(&self, entries: &[AddedEntry]) {
		// A re-added prim is a resync: cached state below it refers to the
		// old data and must go; descendants are told everything changed.
		let mut dirtied = Vec::new();
		for entry in entries {
			for path in self.drop_cached_subtree(&entry.path) {
				if path != entry.path {
					dirtied.push(DirtiedEntry {
						path,
						locators: LocatorSet::universal(),
					});
				}
			}
		}
		self.base.observers().send_added(entries);
		self.base.observers().send_dirtied(&dirtied);
	}

	fn on_prims_removed(&self, entries: &[RemovedEntry]) {
		for entry in entries {
			self.drop_cached_subtree(&entry.path);
		}
		self.base.observers().send_removed(entries);
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		let whole_primvars: LocatorSet = [PrimvarsSchema::default_locator().clone()].into();
		let mut out = Vec::with_capacity(entries.len());

		for entry in entries {
			let primvars_dirty =
				FlattenedPrimvarsDataSource::compute_dirty_primvars_locators(&entry.locators);

			let mut descendant_locators = primvars_dirty.clone();
			descendant_locators.insert_set(
				&FlattenedXformDataSource::compute_dirty_locators_for_descendants(&entry.locators),
			);
			descendant_locators.insert_set(
				&FlattenedVisibilityDataSource::compute_dirty_locators_for_descendants(
					&entry.locators,
				),
			);
			descendant_locators.insert_set(
				&FlattenedPurposeDataSource::compute_dirty_locators_for_descendants(
					&entry.locators,
				),
			);

			let mut own_locators = entry.locators.clone();
			own_locators.insert_set(&primvars_dirty);
			out.push(DirtiedEntry {
				path: entry.path.clone(),
				locators: own_locators,
			});

			if descendant_locators.is_empty() {
				continue;
			}

			// Whole-aspect changes force cached providers to be rebuilt;
			// scoped primvar changes evict just the named cache slots.
			let discard = descendant_locators.contains_empty() || primvars_dirty == whole_primvars;

			let mut map = self.prims.write();
			if !discard
				&& let Some(cached) = map.get(&entry.path)
			{
				// The dirtied prim's own data changed; descendants keep
				// reading through this provider, so refresh it in place.
				let fresh = self
					.base
					.input()
					.prim(&entry.path)
					.data_source
					.and_then(|data| data.get(&PRIMVARS_TOKENS.primvars))
					.and_then(|primvars| primvars.container());
				cached.primvars.update_input(fresh);
			}
			for path in Self::cached_subtree(&map, &entry.path) {
				if discard {
					map.remove(&path);
				} else if let Some(cached) = map.get(&path) {
					let survived = cached.primvars.invalidate(&primvars_dirty);
					if !survived {
						map.remove(&path);
					}
				}
				if path != entry.path {
					out.push(DirtiedEntry {
						path,
						locators: descendant_locators.clone(),
					});
				}
			}
		}

		self.base.observers().send_dirtied(&out);
	}

	fn on_prims_renamed(&self, entries: &[RenamedEntry]) {
		for entry in entries {
			self.drop_cached_subtree(&entry.old_path);
			self.drop_cached_subtree(&entry.new_path);
		}
		self.base.observers().send_renamed(entries);
	}
}

/// Per-prim wrapper: overlays the flattened aspects onto the input data
/// source and passes everything else through.
struct FlattenedPrimDataSource {
	input: Option<ContainerRef>,
	entry: FlattenedPrim,
}

impl ContainerDataSource for FlattenedPrimDataSource {
	fn names(&self) -> Vec<tf::Token> {
		let mut names = self
			.input
			.as_ref()
			.map(|input| input.names())
			.unwrap_or_default();
		for overlay in [
			&PRIMVARS_TOKENS.primvars,
			&XFORM_TOKENS.xform,
			&VISIBILITY_TOKENS.visibility,
			&PURPOSE_TOKENS.purpose,
		] {
			if !names.contains(overlay) {
				names.push(overlay.clone());
			}
		}
		names
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		if name == &PRIMVARS_TOKENS.primvars {
			let primvars: ContainerRef = self.entry.primvars.clone();
			return Some(DataSource::Container(primvars));
		}
		if name == &XFORM_TOKENS.xform {
			return Some(DataSource::Container(self.entry.xform.clone()));
		}
		if name == &VISIBILITY_TOKENS.visibility {
			return Some(DataSource::Container(self.entry.visibility.clone()));
		}
		if name == &PURPOSE_TOKENS.purpose {
			return Some(DataSource::Container(self.entry.purpose.clone()));
		}
		self.input.as_ref()?.get(name)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ds::{Locator, RetainedContainer};
	use crate::scene::retained::{AddedPrim, RetainedSceneIndex};
	use crate::schema::primvars::PrimvarSchema;
	use crate::vt;

	fn p(s: &str) -> PrimPath {
		PrimPath::from(s)
	}

	fn t(s: &str) -> tf::Token {
		tf::Token::new(s)
	}

	fn prim_with_constant_primvar(name: &str, value: i32) -> Option<ContainerRef> {
		let primvars = RetainedContainer::builder()
			.set(
				t(name),
				DataSource::Container(PrimvarSchema::build(
					vt::Value::new(value),
					&PRIMVARS_TOKENS.constant,
					None,
				)),
			)
			.build();
		Some(
			RetainedContainer::builder()
				.set(PRIMVARS_TOKENS.primvars.clone(), DataSource::Container(primvars))
				.build(),
		)
	}

	#[test]
	fn child_sees_inherited_primvar() {
		let input = RetainedSceneIndex::new();
		input.add_prims(vec![
			AddedPrim {
				path: p("/root"),
				prim_type: t("scope"),
				data_source: prim_with_constant_primvar("foo", 1),
			},
			AddedPrim {
				path: p("/root/child"),
				prim_type: t("mesh"),
				data_source: Some(RetainedContainer::empty()),
			},
		]);

		let flattening = FlatteningSceneIndex::new(input);
		let child = flattening.prim(&p("/root/child"));
		let primvars = PrimvarsSchema::from_prim(child.data_source.as_ref().unwrap()).unwrap();
		let foo = primvars.primvar(&t("foo")).unwrap();
		assert_eq!(foo.primvar_value().unwrap().value(0.0).get::<i32>(), Some(1));
	}

	#[test]
	fn dirty_fans_out_to_cached_descendants() {
		let input = RetainedSceneIndex::new();
		input.add_prims(vec![
			AddedPrim {
				path: p("/root"),
				prim_type: t("scope"),
				data_source: prim_with_constant_primvar("foo", 1),
			},
			AddedPrim {
				path: p("/root/child"),
				prim_type: t("mesh"),
				data_source: Some(RetainedContainer::empty()),
			},
		]);

		let flattening = FlatteningSceneIndex::new(input.clone());
		// Populate the cache.
		let _ = flattening.prim(&p("/root/child"));

		let observer = crate::scene::observer::testing::RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		flattening.add_observer(&observer_dyn);

		input.dirty_prims(vec![DirtiedEntry {
			path: p("/root"),
			locators: [Locator::from("primvars/foo/primvarValue")].into(),
		}]);

		let events = observer.take();
		let crate::scene::observer::testing::Event::Dirtied(entries) = &events[0] else {
			panic!("expected dirtied batch");
		};
		assert_eq!(entries.len(), 2);
		assert_eq!(entries[0].path, p("/root"));
		assert_eq!(entries[1].path, p("/root/child"));
		assert_eq!(
			entries[1].locators,
			LocatorSet::from([Locator::from("primvars/foo/primvarValue")]),
		);
	}

	#[test]
	fn interpolation_change_collapses_to_whole_primvars() {
		let input = RetainedSceneIndex::new();
		input.add_prims(vec![AddedPrim {
			path: p("/root"),
			prim_type: t("scope"),
			data_source: prim_with_constant_primvar("foo", 1),
		}]);

		let flattening = FlatteningSceneIndex::new(input.clone());
		let observer = crate::scene::observer::testing::RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		flattening.add_observer(&observer_dyn);

		input.dirty_prims(vec![DirtiedEntry {
			path: p("/root"),
			locators: [Locator::from("primvars/foo/interpolation")].into(),
		}]);

		let events = observer.take();
		let crate::scene::observer::testing::Event::Dirtied(entries) = &events[0] else {
			panic!("expected dirtied batch");
		};
		assert!(
			entries[0]
				.locators
				.intersects(PrimvarsSchema::default_locator()),
		);
		assert_eq!(
			entries[0].locators,
			LocatorSet::from([Locator::from("primvars")]),
		);
	}
}
