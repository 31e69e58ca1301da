//! Transform state: a time-sampled matrix plus the reset-stack flag marking
//! a transform as fully composed.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::gf;
use crate::tf::declare_tokens;
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	xform: "xform",
	matrix: "matrix",
	reset_xform_stack: "resetXformStack",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.xform.clone()));

pub struct XformSchema {
	container: ContainerRef,
}

impl XformSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.xform)?.container()?;
		Some(Self { container })
	}

	pub fn container(&self) -> &ContainerRef {
		&self.container
	}

	pub fn matrix(&self) -> Option<SampledRef> {
		self.container.get(&TOKENS.matrix)?.sampled()
	}

	pub fn reset_xform_stack(&self) -> bool {
		self.container
			.get(&TOKENS.reset_xform_stack)
			.and_then(|ds| ds.typed_value::<bool>(0.0))
			.unwrap_or(false)
	}

	/// `xform`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	/// Builds an xform container holding a constant matrix.
	pub fn build(matrix: gf::Matrix4d, reset_xform_stack: bool) -> ContainerRef {
		Self::build_sampled(RetainedSampled::new(vt::Value::new(matrix)), reset_xform_stack)
	}

	pub fn build_sampled(matrix: SampledRef, reset_xform_stack: bool) -> ContainerRef {
		RetainedContainer::builder()
			.set(TOKENS.matrix.clone(), DataSource::Sampled(matrix))
			.set(
				TOKENS.reset_xform_stack.clone(),
				DataSource::Sampled(RetainedSampled::bool_value(reset_xform_stack)),
			)
			.build()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn reset_stack_defaults_to_false() {
		let schema = XformSchema::new(XformSchema::build(gf::Matrix4d::IDENTITY, false));
		assert!(!schema.reset_xform_stack());
		assert!(schema.matrix().is_some());
	}
}
