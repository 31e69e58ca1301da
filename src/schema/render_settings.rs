//! Render settings prims.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::declare_tokens;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	render_settings: "renderSettings",
	namespaced_settings: "namespacedSettings",
	active: "active",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.render_settings.clone()));

pub struct RenderSettingsSchema {
	container: ContainerRef,
}

impl RenderSettingsSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.render_settings)?.container()?;
		Some(Self { container })
	}

	pub fn namespaced_settings(&self) -> Option<ContainerRef> {
		self.container.get(&TOKENS.namespaced_settings)?.container()
	}

	pub fn active(&self) -> Option<SampledRef> {
		self.container.get(&TOKENS.active)?.sampled()
	}

	/// `renderSettings`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(namespaced_settings: ContainerRef, active: bool) -> ContainerRef {
		RetainedContainer::builder()
			.set(
				TOKENS.namespaced_settings.clone(),
				DataSource::Container(namespaced_settings),
			)
			.set(
				TOKENS.active.clone(),
				DataSource::Sampled(RetainedSampled::bool_value(active)),
			)
			.build()
	}
}
