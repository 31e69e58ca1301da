//! Render purpose classification.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::{self, declare_tokens};
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	purpose: "purpose",
	geometry: "geometry",
	render: "render",
	proxy: "proxy",
	guide: "guide",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.purpose.clone()));

pub struct PurposeSchema {
	container: ContainerRef,
}

impl PurposeSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.purpose)?.container()?;
		Some(Self { container })
	}

	pub fn purpose(&self) -> Option<SampledRef> {
		self.container.get(&TOKENS.purpose)?.sampled()
	}

	/// `purpose`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(purpose: &tf::Token) -> ContainerRef {
		RetainedContainer::builder()
			.set(
				TOKENS.purpose.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(purpose.clone()))),
			)
			.build()
	}
}
