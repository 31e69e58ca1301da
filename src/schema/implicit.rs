//! Implicit-surface prims: spheres, cubes, cylinders, cones and capsules
//! described by a handful of scalars rather than explicit topology.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled};
use crate::tf::{self, declare_tokens};
use crate::vt;

declare_tokens!(Tokens, TOKENS, [
	sphere: "sphere",
	cube: "cube",
	cylinder: "cylinder",
	cone: "cone",
	capsule: "capsule",

	radius: "radius",
	size: "size",
	height: "height",
	axis: "axis",

	axis_x: "X",
	axis_y: "Y",
	axis_z: "Z",

	to_mesh: "toMesh",
	axis_to_transform: "axisToTransform",
]);

/// View over the scalar container of one implicit-surface kind; the
/// container name matches the prim type token (`sphere`, `cube`, ...).
pub struct ImplicitSchema {
	container: ContainerRef,
}

impl ImplicitSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef, prim_type: &tf::Token) -> Option<Self> {
		let container = prim_container.get(prim_type)?.container()?;
		Some(Self { container })
	}

	pub fn container(&self) -> &ContainerRef {
		&self.container
	}

	pub fn radius(&self) -> Option<f64> {
		self.container.get(&TOKENS.radius)?.typed_value::<f64>(0.0)
	}

	pub fn size(&self) -> Option<f64> {
		self.container.get(&TOKENS.size)?.typed_value::<f64>(0.0)
	}

	pub fn height(&self) -> Option<f64> {
		self.container.get(&TOKENS.height)?.typed_value::<f64>(0.0)
	}

	pub fn axis(&self) -> Option<tf::Token> {
		self.container.get(&TOKENS.axis)?.typed_value::<tf::Token>(0.0)
	}

	pub fn locator_for(prim_type: &tf::Token) -> Locator {
		Locator::from_token(prim_type.clone())
	}

	pub fn build(entries: &[(&tf::Token, vt::Value)]) -> ContainerRef {
		let mut builder = RetainedContainer::builder();
		for (name, value) in entries {
			builder = builder.set(
				(*name).clone(),
				DataSource::Sampled(RetainedSampled::new(value.clone())),
			);
		}
		builder.build()
	}
}
