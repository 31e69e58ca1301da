//! Injects the `sceneGlobals` container onto the absolute root prim.

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{ContainerRef, DataSource, LocatorSet, OverlayContainer, RetainedContainer};
use crate::path::PrimPath;
use crate::scene::observer::{DirtiedEntry, SceneIndexObserver};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::scene_globals::{SceneGlobalsSchema, TOKENS};
use parking_lot::RwLock;
use std::sync::Arc;

pub struct SceneGlobalsSceneIndex {
	base: FilteringBase,
	active_render_settings_prim: RwLock<Option<PrimPath>>,
	current_frame: RwLock<Option<f64>>,
}

impl SceneGlobalsSceneIndex {
	pub fn new(input: SceneIndexRef) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			active_render_settings_prim: RwLock::new(None),
			current_frame: RwLock::new(None),
		});
		FilteringBase::observe_input(&index);
		index
	}

	pub fn set_active_render_settings_prim(&self, path: Option<PrimPath>) {
		*self.active_render_settings_prim.write() = path;
		self.dirty_globals();
	}

	pub fn set_current_frame(&self, frame: f64) {
		*self.current_frame.write() = Some(frame);
		self.dirty_globals();
	}

	fn dirty_globals(&self) {
		self.base.observers().send_dirtied(&[DirtiedEntry {
			path: PrimPath::absolute_root(),
			locators: LocatorSet::from([SceneGlobalsSchema::default_locator().clone()]),
		}]);
	}

	fn globals_container(&self) -> ContainerRef {
		let globals = SceneGlobalsSchema::build(
			self.active_render_settings_prim.read().as_ref(),
			*self.current_frame.read(),
		);
		RetainedContainer::builder()
			.set(TOKENS.scene_globals.clone(), DataSource::Container(globals))
			.build()
	}
}

impl SceneIndex for SceneGlobalsSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let mut prim = self.base.input().prim(path);
		if path.is_absolute_root() {
			prim.data_source = Some(match prim.data_source {
				Some(input) => OverlayContainer::new(self.globals_container(), input),
				None => self.globals_container(),
			});
		}
		prim
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

impl FilteringSceneIndex for SceneGlobalsSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scene::observer::testing::{Event, RecordingObserver};
	use crate::scene::retained::RetainedSceneIndex;

	#[test]
	fn root_carries_globals() {
		let index = SceneGlobalsSceneIndex::new(RetainedSceneIndex::new());
		index.set_active_render_settings_prim(Some(PrimPath::from("/render/settings")));
		index.set_current_frame(12.0);

		let root = index.prim(&PrimPath::absolute_root());
		let schema = SceneGlobalsSchema::from_prim(root.data_source.as_ref().unwrap()).unwrap();
		assert_eq!(
			schema.active_render_settings_prim(),
			Some(PrimPath::from("/render/settings")),
		);
		assert_eq!(schema.current_frame(), Some(12.0));
	}

	#[test]
	fn setters_dirty_the_root() {
		let index = SceneGlobalsSceneIndex::new(RetainedSceneIndex::new());
		let observer = RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		index.add_observer(&observer_dyn);

		index.set_current_frame(3.0);
		let events = observer.take();
		let Event::Dirtied(entries) = &events[0] else {
			panic!("expected dirtied batch");
		};
		assert_eq!(entries[0].path, PrimPath::absolute_root());
		assert!(
			entries[0]
				.locators
				.intersects(SceneGlobalsSchema::default_locator()),
		);
	}
}
