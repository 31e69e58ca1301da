//! Material bindings keyed by purpose.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled};
use crate::path::PrimPath;
use crate::tf::{self, declare_tokens};
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	material_bindings: "materialBindings",
	all_purpose: "",
	preview: "preview",
	full: "full",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.material_bindings.clone()));

/// View over a prim's `materialBindings` container: purpose -> material prim
/// path. The all-purpose binding uses the empty token.
pub struct MaterialBindingsSchema {
	container: ContainerRef,
}

impl MaterialBindingsSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.material_bindings)?.container()?;
		Some(Self { container })
	}

	pub fn purposes(&self) -> Vec<tf::Token> {
		self.container.names()
	}

	pub fn binding(&self, purpose: &tf::Token) -> Option<DataSource> {
		self.container.get(purpose)
	}

	pub fn binding_path(&self, purpose: &tf::Token) -> Option<PrimPath> {
		self.container.get(purpose)?.typed_value::<PrimPath>(0.0)
	}

	/// `materialBindings`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(bindings: &[(tf::Token, PrimPath)]) -> ContainerRef {
		let mut builder = RetainedContainer::builder();
		for (purpose, path) in bindings {
			builder = builder.set(
				purpose.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(path.clone()))),
			);
		}
		builder.build()
	}
}
