//! Visibility flattening.
//!
//! Each level's authored opinion, if present, wins outright regardless of
//! ancestor state: an invisible ancestor does NOT force descendants
//! invisible. This is an intentional simplification of strict
//! scene-composition semantics; downstream behavior depends on it, so do
//! not "fix" it to ancestor-wins.

use crate::ds::{ContainerRef, LocatorSet};
use crate::schema::visibility::VisibilitySchema;
use std::sync::LazyLock;

static VISIBLE: LazyLock<ContainerRef> = LazyLock::new(|| VisibilitySchema::build(true));

pub struct FlattenedVisibilityDataSource;

impl FlattenedVisibilityDataSource {
	pub fn flattened(own: Option<ContainerRef>, parent: Option<ContainerRef>) -> ContainerRef {
		if let Some(own) = &own
			&& VisibilitySchema::new(own.clone()).visibility().is_some()
		{
			return own.clone();
		}
		parent.unwrap_or_else(|| VISIBLE.clone())
	}

	pub fn compute_dirty_locators_for_descendants(dirty_locators: &LocatorSet) -> LocatorSet {
		if dirty_locators.intersects(VisibilitySchema::default_locator()) {
			LocatorSet::universal()
		} else {
			LocatorSet::new()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn own_opinion_wins_over_invisible_ancestor() {
		let parent = FlattenedVisibilityDataSource::flattened(
			Some(VisibilitySchema::build(false)),
			None,
		);
		let child = FlattenedVisibilityDataSource::flattened(
			Some(VisibilitySchema::build(true)),
			Some(parent.clone()),
		);
		assert_eq!(
			VisibilitySchema::new(child).visibility().unwrap().value(0.0).get::<bool>(),
			Some(true),
		);

		// An unauthored child inherits the parent's flattened opinion.
		let silent_child = FlattenedVisibilityDataSource::flattened(None, Some(parent));
		assert_eq!(
			VisibilitySchema::new(silent_child)
				.visibility()
				.unwrap()
				.value(0.0)
				.get::<bool>(),
			Some(false),
		);
	}

	#[test]
	fn default_is_the_shared_visible_singleton() {
		let a = FlattenedVisibilityDataSource::flattened(None, None);
		let b = FlattenedVisibilityDataSource::flattened(None, None);
		assert!(std::sync::Arc::ptr_eq(&a, &b));
	}
}
