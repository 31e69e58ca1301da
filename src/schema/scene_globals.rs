//! Scene globals carried on the absolute root prim.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled};
use crate::path::PrimPath;
use crate::tf::declare_tokens;
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	scene_globals: "sceneGlobals",
	active_render_settings_prim: "activeRenderSettingsPrim",
	current_frame: "currentFrame",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.scene_globals.clone()));

pub struct SceneGlobalsSchema {
	container: ContainerRef,
}

impl SceneGlobalsSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.scene_globals)?.container()?;
		Some(Self { container })
	}

	pub fn active_render_settings_prim(&self) -> Option<PrimPath> {
		self.container
			.get(&TOKENS.active_render_settings_prim)?
			.typed_value::<PrimPath>(0.0)
	}

	pub fn current_frame(&self) -> Option<f64> {
		self.container
			.get(&TOKENS.current_frame)?
			.typed_value::<f64>(0.0)
	}

	/// `sceneGlobals`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(active_render_settings_prim: Option<&PrimPath>, current_frame: Option<f64>) -> ContainerRef {
		RetainedContainer::builder()
			.set_optional(
				TOKENS.active_render_settings_prim.clone(),
				active_render_settings_prim.map(|path| {
					DataSource::Sampled(RetainedSampled::new(vt::Value::new(path.clone())))
				}),
			)
			.set_optional(
				TOKENS.current_frame.clone(),
				current_frame.map(|frame| {
					DataSource::Sampled(RetainedSampled::new(vt::Value::new(frame)))
				}),
			)
			.build()
	}
}
