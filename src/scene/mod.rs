//! Scene model: prims, scene indices and change observation.

pub mod observer;
pub mod retained;

pub use observer::{
	AddedEntry, DirtiedEntry, ObserverList, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
pub use retained::RetainedSceneIndex;

use crate::ds::ContainerRef;
use crate::path::PrimPath;
use crate::tf;
use std::sync::Arc;

/// A prim as exposed by a scene index: a type token plus the nested data
/// source carrying all of the prim's attribute data.
#[derive(Clone)]
pub struct Prim {
	pub prim_type: tf::Token,
	pub data_source: Option<ContainerRef>,
}

impl Prim {
	pub fn new(prim_type: tf::Token, data_source: Option<ContainerRef>) -> Self {
		Self {
			prim_type,
			data_source,
		}
	}

	/// The prim returned for paths a scene does not resolve.
	pub fn absent() -> Self {
		Self {
			prim_type: tf::Token::empty(),
			data_source: None,
		}
	}

	pub fn is_absent(&self) -> bool {
		self.prim_type.is_empty() && self.data_source.is_none()
	}
}

/// A queryable scene: resolves paths to prims and to child paths, and fans
/// change notifications out to registered observers.
pub trait SceneIndex: Send + Sync {
	fn prim(&self, path: &PrimPath) -> Prim;

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath>;

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>);

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>);
}

pub type SceneIndexRef = Arc<dyn SceneIndex>;
