//! Purpose flattening: same own-opinion-wins shape as visibility, with the
//! `geometry` fallback.

use crate::ds::{ContainerRef, LocatorSet};
use crate::schema::purpose::{PurposeSchema, TOKENS};
use std::sync::LazyLock;

static GEOMETRY: LazyLock<ContainerRef> = LazyLock::new(|| PurposeSchema::build(&TOKENS.geometry));

pub struct FlattenedPurposeDataSource;

impl FlattenedPurposeDataSource {
	pub fn flattened(own: Option<ContainerRef>, parent: Option<ContainerRef>) -> ContainerRef {
		if let Some(own) = &own
			&& PurposeSchema::new(own.clone()).purpose().is_some()
		{
			return own.clone();
		}
		parent.unwrap_or_else(|| GEOMETRY.clone())
	}

	pub fn compute_dirty_locators_for_descendants(dirty_locators: &LocatorSet) -> LocatorSet {
		if dirty_locators.intersects(PurposeSchema::default_locator()) {
			LocatorSet::universal()
		} else {
			LocatorSet::new()
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tf;

	#[test]
	fn inherits_and_defaults() {
		let parent = FlattenedPurposeDataSource::flattened(
			Some(PurposeSchema::build(&tf::Token::new("proxy"))),
			None,
		);
		let child = FlattenedPurposeDataSource::flattened(None, Some(parent));
		assert_eq!(
			PurposeSchema::new(child)
				.purpose()
				.unwrap()
				.value(0.0)
				.get::<tf::Token>(),
			Some(tf::Token::new("proxy")),
		);

		let fallback = FlattenedPurposeDataSource::flattened(None, None);
		assert_eq!(
			PurposeSchema::new(fallback)
				.purpose()
				.unwrap()
				.value(0.0)
				.get::<tf::Token>(),
			Some(TOKENS.geometry.clone()),
		);
	}
}
