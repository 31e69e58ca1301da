//! Switches between a fixed set of candidate input scenes, emitting a
//! structural diff so downstream state tracks the active scene.

use crate::ds::LocatorSet;
use crate::path::PrimPath;
use crate::scene::observer::{
	AddedEntry, DirtiedEntry, ObserverList, RemovedEntry, RenamedEntry, SceneIndexObserver,
};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};

/// The structural difference between two scenes, emitted in
/// removed -> added -> renamed -> dirtied order.
#[derive(Default)]
pub struct SceneDiff {
	pub removed: Vec<RemovedEntry>,
	pub added: Vec<AddedEntry>,
	pub renamed: Vec<RenamedEntry>,
	pub dirtied: Vec<DirtiedEntry>,
}

/// Computes the diff to emit when the active scene changes. Either side may
/// be absent (no scene selected).
pub trait DiffStrategy: Send + Sync {
	fn diff(&self, old: Option<&SceneIndexRef>, new: Option<&SceneIndexRef>) -> SceneDiff;
}

/// Always correct, maximal invalidation: remove everything under the root,
/// then add everything under the root of the new scene.
pub struct CoarseDiff;

impl DiffStrategy for CoarseDiff {
	fn diff(&self, old: Option<&SceneIndexRef>, new: Option<&SceneIndexRef>) -> SceneDiff {
		let mut diff = SceneDiff::default();
		if old.is_some() {
			diff.removed.push(RemovedEntry {
				path: PrimPath::absolute_root(),
			});
		}
		if let Some(new) = new {
			collect_subtree(new, &PrimPath::absolute_root(), &mut diff.added);
		}
		diff
	}
}

/// Walks both scenes in parallel and emits only the prims that actually
/// differ, for the common case where most of the tree is shared between
/// candidates.
///
/// Prims present in both scenes are dirtied with the universal set: the two
/// scenes are distinct instances, so their values cannot be assumed equal
/// even when the structure matches.
pub struct FineDiff;

impl DiffStrategy for FineDiff {
	fn diff(&self, old: Option<&SceneIndexRef>, new: Option<&SceneIndexRef>) -> SceneDiff {
		let mut diff = SceneDiff::default();
		match (old, new) {
			(None, None) => {}
			(Some(_), None) => {
				diff.removed.push(RemovedEntry {
					path: PrimPath::absolute_root(),
				});
			}
			(None, Some(new)) => {
				collect_subtree(new, &PrimPath::absolute_root(), &mut diff.added);
			}
			(Some(old), Some(new)) => {
				diff.dirtied.push(DirtiedEntry {
					path: PrimPath::absolute_root(),
					locators: LocatorSet::universal(),
				});
				diff_subtree(old, new, &PrimPath::absolute_root(), &mut diff);
			}
		}
		diff
	}
}

fn collect_subtree(scene: &SceneIndexRef, root: &PrimPath, out: &mut Vec<AddedEntry>) {
	for child in scene.child_prim_paths(root) {
		out.push(AddedEntry {
			path: child.clone(),
			prim_type: scene.prim(&child).prim_type,
		});
		collect_subtree(scene, &child, out);
	}
}

fn diff_subtree(old: &SceneIndexRef, new: &SceneIndexRef, path: &PrimPath, out: &mut SceneDiff) {
	let old_children = old.child_prim_paths(path);
	let new_children = new.child_prim_paths(path);

	for child in &old_children {
		if !new_children.contains(child) {
			out.removed.push(RemovedEntry { path: child.clone() });
		}
	}
	for child in &new_children {
		if !old_children.contains(child) {
			out.added.push(AddedEntry {
				path: child.clone(),
				prim_type: new.prim(child).prim_type,
			});
			collect_subtree(new, child, &mut out.added);
			continue;
		}

		let old_prim_type = old.prim(child).prim_type;
		let new_prim_type = new.prim(child).prim_type;
		if old_prim_type != new_prim_type {
			out.added.push(AddedEntry {
				path: child.clone(),
				prim_type: new_prim_type,
			});
		} else {
			out.dirtied.push(DirtiedEntry {
				path: child.clone(),
				locators: LocatorSet::universal(),
			});
		}
		diff_subtree(old, new, child, out);
	}
}

/// Holds a fixed, ordered array of candidate scenes and republishes the
/// currently-selected one.
pub struct SwitchingSceneIndex {
	inputs: Vec<SceneIndexRef>,
	diff_strategy: Box<dyn DiffStrategy>,
	current: RwLock<Option<usize>>,
	observers: ObserverList,
	input_observer: RwLock<Option<Arc<dyn SceneIndexObserver>>>,
	self_ref: std::sync::OnceLock<Weak<SwitchingSceneIndex>>,
}

impl SwitchingSceneIndex {
	/// Creates the index with the coarse diff strategy and no current scene.
	pub fn new(inputs: Vec<SceneIndexRef>) -> Arc<Self> {
		Self::with_diff_strategy(inputs, Box::new(CoarseDiff))
	}

	pub fn with_diff_strategy(
		inputs: Vec<SceneIndexRef>,
		diff_strategy: Box<dyn DiffStrategy>,
	) -> Arc<Self> {
		let index = Arc::new(Self {
			inputs,
			diff_strategy,
			current: RwLock::new(None),
			observers: ObserverList::new(),
			input_observer: RwLock::new(None),
			self_ref: std::sync::OnceLock::new(),
		});
		let _ = index.self_ref.set(Arc::downgrade(&index));
		index
	}

	pub fn current_index(&self) -> Option<usize> {
		*self.current.read()
	}

	fn current_scene(&self) -> Option<SceneIndexRef> {
		self.current.read().map(|index| self.inputs[index].clone())
	}

	/// Selects input `index` as the active scene.
	///
	/// An out-of-range index is a caller bug: it is reported, the current
	/// scene is reset to none and downstream sees everything removed.
	pub fn set_index(&self, index: usize) {
		let new_index = if index < self.inputs.len() {
			Some(index)
		} else {
			tracing::error!(
				"switching scene index: index {index} out of range (have {}); no current scene",
				self.inputs.len(),
			);
			None
		};

		let old_scene = self.current_scene();

		// Stop listening before the diff so nothing interleaves.
		if let Some(adapter) = self.input_observer.write().take()
			&& let Some(old_scene) = &old_scene
		{
			old_scene.remove_observer(&adapter);
		}

		let new_scene = new_index.map(|index| self.inputs[index].clone());
		*self.current.write() = new_index;

		let diff = self
			.diff_strategy
			.diff(old_scene.as_ref(), new_scene.as_ref());
		self.observers.send_removed(&diff.removed);
		self.observers.send_added(&diff.added);
		self.observers.send_renamed(&diff.renamed);
		self.observers.send_dirtied(&diff.dirtied);

		if let Some(new_scene) = &new_scene
			&& let Some(self_ref) = self.self_ref.get()
		{
			let adapter: Arc<dyn SceneIndexObserver> = Arc::new(ForwardingObserver {
				index: self_ref.clone(),
			});
			new_scene.add_observer(&adapter);
			*self.input_observer.write() = Some(adapter);
		}
	}
}

impl SceneIndex for SwitchingSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		match self.current_scene() {
			Some(scene) => scene.prim(path),
			None => Prim::absent(),
		}
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		match self.current_scene() {
			Some(scene) => scene.child_prim_paths(path),
			None => Vec::new(),
		}
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.observers.add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.observers.remove(observer);
	}
}

/// Forwards notifications of the active input verbatim.
struct ForwardingObserver {
	index: Weak<SwitchingSceneIndex>,
}

impl SceneIndexObserver for ForwardingObserver {
	fn prims_added(&self, entries: &[AddedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.observers.send_added(entries);
		}
	}

	fn prims_removed(&self, entries: &[RemovedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.observers.send_removed(entries);
		}
	}

	fn prims_dirtied(&self, entries: &[DirtiedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.observers.send_dirtied(entries);
		}
	}

	fn prims_renamed(&self, entries: &[RenamedEntry]) {
		if let Some(index) = self.index.upgrade() {
			index.observers.send_renamed(entries);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::scene::observer::testing::{Event, RecordingObserver};
	use crate::scene::retained::{AddedPrim, RetainedSceneIndex};
	use crate::tf;

	fn p(s: &str) -> PrimPath {
		PrimPath::from(s)
	}

	fn t(s: &str) -> tf::Token {
		tf::Token::new(s)
	}

	fn scene(prims: &[(&str, &str)]) -> Arc<RetainedSceneIndex> {
		let scene = RetainedSceneIndex::new();
		scene.add_prims(
			prims
				.iter()
				.map(|(path, prim_type)| AddedPrim {
					path: p(path),
					prim_type: t(prim_type),
					data_source: None,
				})
				.collect(),
		);
		scene
	}

	#[test]
	fn selects_and_republishes() {
		let a = scene(&[("/x", "mesh")]);
		let b = scene(&[("/y", "mesh")]);
		let switching = SwitchingSceneIndex::new(vec![a, b]);

		assert!(switching.prim(&p("/x")).is_absent());
		switching.set_index(0);
		assert_eq!(switching.prim(&p("/x")).prim_type, t("mesh"));
		switching.set_index(1);
		assert!(switching.prim(&p("/x")).is_absent());
		assert_eq!(switching.prim(&p("/y")).prim_type, t("mesh"));
	}

	#[test]
	fn coarse_diff_removes_then_adds() {
		let a = scene(&[("/x", "mesh")]);
		let b = scene(&[("/y", "mesh"), ("/y/z", "mesh")]);
		let switching = SwitchingSceneIndex::new(vec![a, b]);
		switching.set_index(0);

		let observer = RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		switching.add_observer(&observer_dyn);

		switching.set_index(1);
		let events = observer.take();
		assert_eq!(
			events[0],
			Event::Removed(vec![RemovedEntry {
				path: PrimPath::absolute_root()
			}]),
		);
		let Event::Added(added) = &events[1] else {
			panic!("expected added batch");
		};
		assert_eq!(added.len(), 2);
		assert_eq!(added[0].path, p("/y"));
		assert_eq!(added[1].path, p("/y/z"));
	}

	#[test]
	fn fine_diff_emits_only_differences() {
		let a = scene(&[("/shared", "mesh"), ("/only_a", "mesh")]);
		let b = scene(&[("/shared", "mesh"), ("/only_b", "cube")]);
		let switching =
			SwitchingSceneIndex::with_diff_strategy(vec![a, b], Box::new(FineDiff));
		switching.set_index(0);

		let observer = RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		switching.add_observer(&observer_dyn);

		switching.set_index(1);
		let events = observer.take();
		assert_eq!(
			events[0],
			Event::Removed(vec![RemovedEntry { path: p("/only_a") }]),
		);
		assert_eq!(
			events[1],
			Event::Added(vec![AddedEntry {
				path: p("/only_b"),
				prim_type: t("cube"),
			}]),
		);
		let Event::Dirtied(dirtied) = &events[2] else {
			panic!("expected dirtied batch");
		};
		assert!(dirtied.iter().any(|entry| entry.path == p("/shared")));
	}

	#[test]
	fn out_of_range_degrades_to_no_scene() {
		let a = scene(&[("/x", "mesh")]);
		let switching = SwitchingSceneIndex::new(vec![a]);
		switching.set_index(0);
		switching.set_index(5);
		assert_eq!(switching.current_index(), None);
		assert!(switching.prim(&p("/x")).is_absent());
		assert!(switching.child_prim_paths(&PrimPath::absolute_root()).is_empty());
	}

	#[test]
	fn active_scene_notifications_forward() {
		let a = scene(&[("/x", "mesh")]);
		let switching = SwitchingSceneIndex::new(vec![a.clone()]);
		switching.set_index(0);

		let observer = RecordingObserver::new();
		let observer_dyn: Arc<dyn SceneIndexObserver> = observer.clone();
		switching.add_observer(&observer_dyn);

		a.add_prims(vec![AddedPrim {
			path: p("/x/child"),
			prim_type: t("mesh"),
			data_source: None,
		}]);
		let events = observer.take();
		assert_eq!(events.len(), 1);
		assert!(matches!(events[0], Event::Added(_)));
	}
}
