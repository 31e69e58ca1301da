//! Filtering scene indices: pipeline stages that wrap one input scene and
//! republish a transformed view plus translated change notifications.

pub mod coord_sys;
pub mod flatten;
pub mod implicit_surface;
pub mod material_binding;
pub mod pinned_curve;
pub mod render_settings;
pub mod scene_globals;
pub mod switching;

pub use coord_sys::CoordSysPrimSceneIndex;
pub use flatten::FlatteningSceneIndex;
pub use implicit_surface::ImplicitSurfaceSceneIndex;
pub use material_binding::MaterialBindingResolvingSceneIndex;
pub use pinned_curve::PinnedCurveExpandingSceneIndex;
pub use render_settings::RenderSettingsFilteringSceneIndex;
pub use scene_globals::SceneGlobalsSceneIndex;
pub use switching::{CoarseDiff, DiffStrategy, FineDiff, SceneDiff, SwitchingSceneIndex};

use crate::scene::observer::{
	AddedEntry, DirtiedEntry, ObserverList, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use crate::scene::{SceneIndex, SceneIndexRef};
use std::sync::{Arc, OnceLock, Weak};

/// A scene index with exactly one input scene.
///
/// The default notification handlers forward verbatim, preserving entry
/// count and order; concrete indices override them to rewrite types, widen
/// or narrow locator sets, or split entries. Outward sends are gated on the
/// observer list, while internal bookkeeping in the handlers must run
/// whether or not anyone is listening.
pub trait FilteringSceneIndex: SceneIndex + 'static {
	fn base(&self) -> &FilteringBase;

	fn on_prims_added(&self, entries: &[AddedEntry]) {
		self.base().observers().send_added(entries);
	}

	fn on_prims_removed(&self, entries: &[RemovedEntry]) {
		self.base().observers().send_removed(entries);
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		self.base().observers().send_dirtied(entries);
	}

	fn on_prims_renamed(&self, entries: &[RenamedEntry]) {
		self.base().observers().send_renamed(entries);
	}
}

/// Shared plumbing of a single-input filtering scene index.
pub struct FilteringBase {
	input: SceneIndexRef,
	observers: ObserverList,
	input_observer: OnceLock<Arc<dyn SceneIndexObserver>>,
}

impl FilteringBase {
	pub fn new(input: SceneIndexRef) -> Self {
		Self {
			input,
			observers: ObserverList::new(),
			input_observer: OnceLock::new(),
		}
	}

	pub fn input(&self) -> &SceneIndexRef {
		&self.input
	}

	pub fn observers(&self) -> &ObserverList {
		&self.observers
	}

	pub fn is_observed(&self) -> bool {
		self.observers.is_observed()
	}

	/// Subscribes `index` to its input scene. Call once right after
	/// construction; the adapter lives as long as the index.
	pub fn observe_input<T: FilteringSceneIndex>(index: &Arc<T>) {
		let adapter: Arc<dyn SceneIndexObserver> = Arc::new(InputObserver {
			index: Arc::downgrade(index),
		});
		index.base().input.add_observer(&adapter);
		let _ = index.base().input_observer.set(adapter);
	}
}

/// Forwards input-scene notifications to the owning filtering index.
struct InputObserver<T: FilteringSceneIndex> {
	index: Weak<T>,
}

impl<T: FilteringSceneIndex> SceneIndexObserver for InputObserver<T> {
	fn prims_added(&self, entries: &[AddedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.on_prims_added(entries);
		}
	}

	fn prims_removed(&self, entries: &[RemovedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.on_prims_removed(entries);
		}
	}

	fn prims_dirtied(&self, entries: &[DirtiedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.on_prims_dirtied(entries);
		}
	}

	fn prims_renamed(&self, entries: &[RenamedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.on_prims_renamed(entries);
		}
	}
}
