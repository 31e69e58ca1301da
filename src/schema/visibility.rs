//! Visibility state.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::declare_tokens;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	visibility: "visibility",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.visibility.clone()));

pub struct VisibilitySchema {
	container: ContainerRef,
}

impl VisibilitySchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.visibility)?.container()?;
		Some(Self { container })
	}

	pub fn visibility(&self) -> Option<SampledRef> {
		self.container.get(&TOKENS.visibility)?.sampled()
	}

	/// `visibility`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(visible: bool) -> ContainerRef {
		RetainedContainer::builder()
			.set(
				TOKENS.visibility.clone(),
				DataSource::Sampled(RetainedSampled::bool_value(visible)),
			)
			.build()
	}
}
