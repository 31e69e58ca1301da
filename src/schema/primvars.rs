//! Primvars: per-prim values that interpolate across a primitive's topology
//! and, for `constant` interpolation, inherit down namespace.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::{self, declare_tokens};
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	primvars: "primvars",
	primvar_value: "primvarValue",
	interpolation: "interpolation",
	role: "role",

	constant: "constant",
	uniform: "uniform",
	varying: "varying",
	vertex: "vertex",
	face_varying: "faceVarying",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.primvars.clone()));

/// View over a prim's `primvars` container: primvar name -> [`PrimvarSchema`].
pub struct PrimvarsSchema {
	container: ContainerRef,
}

impl PrimvarsSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.primvars)?.container()?;
		Some(Self { container })
	}

	pub fn container(&self) -> &ContainerRef {
		&self.container
	}

	pub fn primvar_names(&self) -> Vec<tf::Token> {
		self.container.names()
	}

	pub fn primvar(&self, name: &tf::Token) -> Option<PrimvarSchema> {
		let container = self.container.get(name)?.container()?;
		Some(PrimvarSchema { container })
	}

	/// `primvars`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}
}

/// View over one primvar: its value, interpolation and role.
pub struct PrimvarSchema {
	container: ContainerRef,
}

impl PrimvarSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn container(&self) -> &ContainerRef {
		&self.container
	}

	pub fn primvar_value(&self) -> Option<SampledRef> {
		self.container.get(&TOKENS.primvar_value)?.sampled()
	}

	pub fn interpolation(&self) -> Option<tf::Token> {
		self.container
			.get(&TOKENS.interpolation)?
			.typed_value::<tf::Token>(0.0)
	}

	pub fn role(&self) -> Option<tf::Token> {
		self.container.get(&TOKENS.role)?.typed_value::<tf::Token>(0.0)
	}

	pub fn is_constant(&self) -> bool {
		self.interpolation().as_ref() == Some(&TOKENS.constant)
	}

	/// Builds a primvar container from retained parts.
	pub fn build(
		value: vt::Value,
		interpolation: &tf::Token,
		role: Option<&tf::Token>,
	) -> ContainerRef {
		RetainedContainer::builder()
			.set(
				TOKENS.primvar_value.clone(),
				DataSource::Sampled(RetainedSampled::new(value)),
			)
			.set(
				TOKENS.interpolation.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(interpolation.clone()))),
			)
			.set_optional(
				TOKENS.role.clone(),
				role.map(|role| {
					DataSource::Sampled(RetainedSampled::new(vt::Value::new(role.clone())))
				}),
			)
			.build()
	}
}
