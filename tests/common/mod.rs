//! Shared helpers for the integration tests.

use parking_lot::Mutex;
use scene_index::ds::{ContainerRef, DataSource, RetainedContainer};
use scene_index::path::PrimPath;
use scene_index::scene::observer::{
	AddedEntry, DirtiedEntry, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use scene_index::schema::primvars::{PrimvarSchema, TOKENS as PRIMVARS_TOKENS};
use scene_index::tf;
use scene_index::vt;
use std::sync::Arc;

pub fn p(s: &str) -> PrimPath {
	PrimPath::from(s)
}

pub fn t(s: &str) -> tf::Token {
	tf::Token::new(s)
}

/// Builds a prim-level data source holding the given primvars.
pub fn primvars_data_source(primvars: &[(&str, vt::Value, &tf::Token)]) -> ContainerRef {
	let mut builder = RetainedContainer::builder();
	for (name, value, interpolation) in primvars {
		builder = builder.set(
			t(name),
			DataSource::Container(PrimvarSchema::build(value.clone(), interpolation, None)),
		);
	}
	let primvars = builder.build();
	RetainedContainer::builder()
		.set(
			PRIMVARS_TOKENS.primvars.clone(),
			DataSource::Container(primvars),
		)
		.build()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
	Added(Vec<AddedEntry>),
	Removed(Vec<RemovedEntry>),
	Dirtied(Vec<DirtiedEntry>),
	Renamed(Vec<RenamedEntry>),
}

/// Records every notification batch in arrival order.
#[derive(Default)]
pub struct RecordingObserver {
	events: Mutex<Vec<Event>>,
}

impl RecordingObserver {
	pub fn new() -> Arc<Self> {
		Arc::new(Self::default())
	}

	pub fn take(&self) -> Vec<Event> {
		std::mem::take(&mut self.events.lock())
	}

	/// Registers `self` with `scene` and returns the handle keeping the
	/// registration alive.
	pub fn attach(
		self: &Arc<Self>,
		scene: &dyn scene_index::scene::SceneIndex,
	) -> Arc<dyn SceneIndexObserver> {
		let observer: Arc<dyn SceneIndexObserver> = self.clone();
		scene.add_observer(&observer);
		observer
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
