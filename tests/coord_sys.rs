mod common;

use common::{Event, RecordingObserver, p, t};
use scene_index::ds::{ContainerRef, DataSource, RetainedContainer};
use scene_index::filter::CoordSysPrimSceneIndex;
use scene_index::path::PrimPath;
use scene_index::scene::SceneIndex;
use scene_index::scene::retained::{AddedPrim, RetainedSceneIndex};
use scene_index::schema::coord_sys::{CoordSysBindingSchema, TOKENS};
use scene_index::tf;

fn binding_data_source(bindings: &[(&str, &str)]) -> Option<ContainerRef> {
	let pairs: Vec<(tf::Token, PrimPath)> = bindings
		.iter()
		.map(|(name, target)| (t(name), p(target)))
		.collect();
	Some(
		RetainedContainer::builder()
			.set(
				TOKENS.coord_sys_binding.clone(),
				DataSource::Container(CoordSysBindingSchema::build(&pairs)),
			)
			.build(),
	)
}

fn add(scene: &RetainedSceneIndex, path: &str, data_source: Option<ContainerRef>) {
	scene.add_prims(vec![AddedPrim {
		path: p(path),
		prim_type: t("mesh"),
		data_source,
	}]);
}

/// Checks the structural invariant: a synthetic prim is exposed exactly for
/// the positive ref-counts.
fn assert_synthetic(index: &CoordSysPrimSceneIndex, target: &str, name: &str, expected: bool) {
	let child = p(target).append_child(&tf::Token::new(format!("__coordSys:{name}")));
	assert_eq!(
		index.child_prim_paths(&p(target)).contains(&child),
		expected,
		"synthetic {child} presence"
	);
	assert_eq!(!index.prim(&child).is_absent(), expected, "synthetic {child} prim");
}

#[test]
fn bind_then_remove_binder() {
	let input = RetainedSceneIndex::new();
	add(&input, "/B", None);
	let index = CoordSysPrimSceneIndex::new(input.clone());

	let observer = RecordingObserver::new();
	let _handle = observer.attach(&*index);

	add(&input, "/A", binding_data_source(&[("FOO", "/B")]));
	assert_synthetic(&index, "/B", "FOO", true);

	let events = observer.take();
	assert!(matches!(&events[0], Event::Added(entries) if entries[0].path == p("/A")));
	let Event::Added(synthetic) = &events[1] else {
		panic!("expected synthetic add, got {events:?}");
	};
	assert_eq!(synthetic[0].path, p("/B/__coordSys:FOO"));
	assert_eq!(synthetic[0].prim_type, TOKENS.coord_sys);

	input.remove_prims(vec![p("/A")]);
	assert_synthetic(&index, "/B", "FOO", false);

	let events = observer.take();
	assert!(matches!(&events[0], Event::Removed(entries) if entries[0].path == p("/A")));
	assert!(
		matches!(&events[1], Event::Removed(entries) if entries[0].path == p("/B/__coordSys:FOO")),
	);
}

#[test]
fn subtree_removal_releases_nested_bindings() {
	let input = RetainedSceneIndex::new();
	add(&input, "/B", None);
	add(&input, "/group", None);
	add(&input, "/group/a", binding_data_source(&[("FOO", "/B")]));
	add(&input, "/group/deep", None);
	add(&input, "/group/deep/b", binding_data_source(&[("FOO", "/B"), ("BAR", "/B")]));

	let index = CoordSysPrimSceneIndex::new(input.clone());
	assert_synthetic(&index, "/B", "FOO", true);
	assert_synthetic(&index, "/B", "BAR", true);

	// Removing the group releases every binding rooted under it.
	input.remove_prims(vec![p("/group")]);
	assert_synthetic(&index, "/B", "FOO", false);
	assert_synthetic(&index, "/B", "BAR", false);
}

#[test]
fn shared_binding_is_ref_counted() {
	let input = RetainedSceneIndex::new();
	add(&input, "/B", None);
	add(&input, "/A", binding_data_source(&[("FOO", "/B")]));
	add(&input, "/C", binding_data_source(&[("FOO", "/B")]));
	let index = CoordSysPrimSceneIndex::new(input.clone());

	input.remove_prims(vec![p("/A")]);
	assert_synthetic(&index, "/B", "FOO", true);
	input.remove_prims(vec![p("/C")]);
	assert_synthetic(&index, "/B", "FOO", false);
}

#[test]
fn unobserved_bookkeeping_matches_observed() {
	let input = RetainedSceneIndex::new();
	add(&input, "/B", None);
	let index = CoordSysPrimSceneIndex::new(input.clone());

	// All mutations happen unobserved.
	add(&input, "/A", binding_data_source(&[("FOO", "/B")]));
	add(&input, "/C", binding_data_source(&[("FOO", "/B")]));
	input.remove_prims(vec![p("/A")]);

	// Attaching afterwards sees the exact post-mutation state.
	let observer = RecordingObserver::new();
	let _handle = observer.attach(&*index);
	assert!(observer.take().is_empty());
	assert_synthetic(&index, "/B", "FOO", true);
}

#[test]
fn rebinding_via_dirty_moves_the_prim() {
	let input = RetainedSceneIndex::new();
	add(&input, "/B", None);
	add(&input, "/D", None);
	add(&input, "/A", binding_data_source(&[("FOO", "/B")]));
	let index = CoordSysPrimSceneIndex::new(input.clone());

	let observer = RecordingObserver::new();
	let _handle = observer.attach(&*index);

	input.set_prim_data_source(
		&p("/A"),
		binding_data_source(&[("FOO", "/D")]),
		[CoordSysBindingSchema::default_locator().clone()].into(),
	);

	assert_synthetic(&index, "/B", "FOO", false);
	assert_synthetic(&index, "/D", "FOO", true);

	// Dirty forwarded first, then the synthetic removal and addition.
	let events = observer.take();
	assert!(matches!(events[0], Event::Dirtied(_)));
	assert!(
		matches!(&events[1], Event::Removed(entries) if entries[0].path == p("/B/__coordSys:FOO")),
	);
	assert!(
		matches!(&events[2], Event::Added(entries) if entries[0].path == p("/D/__coordSys:FOO")),
	);
}
