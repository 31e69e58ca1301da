//! Basis-curves topology.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::{self, declare_tokens};
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	basis_curves: "basisCurves",
	topology: "topology",
	curve_vertex_counts: "curveVertexCounts",
	basis: "basis",
	wrap: "wrap",

	bezier: "bezier",
	bspline: "bSpline",
	catmull_rom: "catmullRom",

	pinned: "pinned",
	nonperiodic: "nonperiodic",
	periodic: "periodic",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.basis_curves.clone()));

pub struct BasisCurvesSchema {
	container: ContainerRef,
}

impl BasisCurvesSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.basis_curves)?.container()?;
		Some(Self { container })
	}

	pub fn topology(&self) -> Option<ContainerRef> {
		self.container.get(&TOKENS.topology)?.container()
	}

	pub fn curve_vertex_counts(&self) -> Option<SampledRef> {
		self.topology()?.get(&TOKENS.curve_vertex_counts)?.sampled()
	}

	pub fn basis(&self) -> Option<tf::Token> {
		self.topology()?
			.get(&TOKENS.basis)?
			.typed_value::<tf::Token>(0.0)
	}

	pub fn wrap(&self) -> Option<tf::Token> {
		self.topology()?
			.get(&TOKENS.wrap)?
			.typed_value::<tf::Token>(0.0)
	}

	/// `basisCurves`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(curve_vertex_counts: Vec<i32>, basis: &tf::Token, wrap: &tf::Token) -> ContainerRef {
		let topology = RetainedContainer::builder()
			.set(
				TOKENS.curve_vertex_counts.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(curve_vertex_counts))),
			)
			.set(
				TOKENS.basis.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(basis.clone()))),
			)
			.set(
				TOKENS.wrap.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(wrap.clone()))),
			)
			.build();
		RetainedContainer::builder()
			.set(TOKENS.topology.clone(), DataSource::Container(topology))
			.build()
	}
}
