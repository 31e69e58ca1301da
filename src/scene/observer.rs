//! Observer contract: notification entry types and subscriber fan-out.

use crate::ds::LocatorSet;
use crate::path::PrimPath;
use crate::tf;
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

#[derive(Debug, Clone, PartialEq)]
pub struct AddedEntry {
	pub path: PrimPath,
	pub prim_type: tf::Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RemovedEntry {
	pub path: PrimPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirtiedEntry {
	pub path: PrimPath,
	pub locators: LocatorSet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenamedEntry {
	pub old_path: PrimPath,
	pub new_path: PrimPath,
}

/// Receives change notifications from a scene index.
///
/// Callbacks are dispatched synchronously, in registration order, preserving
/// the relative order in which the source emitted its batches.
pub trait SceneIndexObserver: Send + Sync {
	fn prims_added(&self, entries: &[AddedEntry]);
	fn prims_removed(&self, entries: &[RemovedEntry]);
	fn prims_dirtied(&self, entries: &[DirtiedEntry]);
	fn prims_renamed(&self, entries: &[RenamedEntry]);
}

/// Weakly-held subscriber list with the observed/unobserved gate.
///
/// Sending while unobserved is a no-op; internal bookkeeping of the owning
/// scene index must not depend on whether a send actually went out.
#[derive(Default)]
pub struct ObserverList {
	observers: RwLock<Vec<Weak<dyn SceneIndexObserver>>>,
}

impl ObserverList {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn add(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.observers.write().push(Arc::downgrade(observer));
	}

	pub fn remove(&self, observer: &Arc<dyn SceneIndexObserver>) {
		let target = Arc::downgrade(observer);
		self.observers
			.write()
			.retain(|existing| !existing.ptr_eq(&target) && existing.strong_count() > 0);
	}

	pub fn is_observed(&self) -> bool {
		self.observers
			.read()
			.iter()
			.any(|observer| observer.strong_count() > 0)
	}

	fn live_observers(&self) -> Vec<Arc<dyn SceneIndexObserver>> {
		let mut observers = self.observers.write();
		observers.retain(|observer| observer.strong_count() > 0);
		observers
			.iter()
			.filter_map(Weak::upgrade)
			.collect()
	}

	pub fn send_added(&self, entries: &[AddedEntry]) {
		if entries.is_empty() {
			return;
		}
		for observer in self.live_observers() {
			observer.prims_added(entries);
		}
	}

	pub fn send_removed(&self, entries: &[RemovedEntry]) {
		if entries.is_empty() {
			return;
		}
		for observer in self.live_observers() {
			observer.prims_removed(entries);
		}
	}

	pub fn send_dirtied(&self, entries: &[DirtiedEntry]) {
		if entries.is_empty() {
			return;
		}
		for observer in self.live_observers() {
			observer.prims_dirtied(entries);
		}
	}

	pub fn send_renamed(&self, entries: &[RenamedEntry]) {
		if entries.is_empty() {
			return;
		}
		for observer in self.live_observers() {
			observer.prims_renamed(entries);
		}
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use super::*;
	use parking_lot::Mutex;

	/// Records every notification batch in arrival order.
	#[derive(Default)]
	pub struct RecordingObserver {
		pub events: Mutex<Vec<Event>>,
	}

	#[derive(Debug, Clone, PartialEq)]
	pub enum Event {
		Added(Vec<AddedEntry>),
		Removed(Vec<RemovedEntry>),
		Dirtied(Vec<DirtiedEntry>),
		Renamed(Vec<RenamedEntry>),
	}

	impl RecordingObserver {
		pub fn new() -> Arc<Self> {
			Arc::new(Self::default())
		}

		pub fn take(&self) -> Vec<Event> {
			std::mem::take(&mut self.events.lock())
		}
	}

	impl SceneIndexObserver for RecordingObserver {
		fn prims_added(&self, entries: &[AddedEntry]) {
			self.events.lock().push(Event::Added(entries.to_vec()));
		}

		fn prims_removed(&self, entries: &[RemovedEntry]) {
			self.events.lock().push(Event::Removed(entries.to_vec()));
		}

		fn prims_dirtied(&self, entries: &[DirtiedEntry]) {
			self.events.lock().push(Event::Dirtied(entries.to_vec()));
		}

		fn prims_renamed(&self, entries: &[RenamedEntry]) {
			self.events.lock().push(Event::Renamed(entries.to_vec()));
		}
	}
}
