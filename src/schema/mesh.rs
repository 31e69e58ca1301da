//! Mesh topology.

use crate::ds::{ContainerRef, DataSource, Locator, RetainedContainer, RetainedSampled, SampledRef};
use crate::tf::declare_tokens;
use crate::vt;
use std::sync::LazyLock;

declare_tokens!(Tokens, TOKENS, [
	mesh: "mesh",
	topology: "topology",
	face_vertex_counts: "faceVertexCounts",
	face_vertex_indices: "faceVertexIndices",
	points: "points",
	double_sided: "doubleSided",
]);

static DEFAULT_LOCATOR: LazyLock<Locator> =
	LazyLock::new(|| Locator::from_token(TOKENS.mesh.clone()));

pub struct MeshSchema {
	container: ContainerRef,
}

impl MeshSchema {
	pub fn new(container: ContainerRef) -> Self {
		Self { container }
	}

	pub fn from_prim(prim_container: &ContainerRef) -> Option<Self> {
		let container = prim_container.get(&TOKENS.mesh)?.container()?;
		Some(Self { container })
	}

	pub fn topology(&self) -> Option<ContainerRef> {
		self.container.get(&TOKENS.topology)?.container()
	}

	pub fn face_vertex_counts(&self) -> Option<SampledRef> {
		self.topology()?.get(&TOKENS.face_vertex_counts)?.sampled()
	}

	pub fn face_vertex_indices(&self) -> Option<SampledRef> {
		self.topology()?.get(&TOKENS.face_vertex_indices)?.sampled()
	}

	/// `mesh`
	pub fn default_locator() -> &'static Locator {
		&DEFAULT_LOCATOR
	}

	pub fn build(face_vertex_counts: Vec<i32>, face_vertex_indices: Vec<i32>) -> ContainerRef {
		let topology = RetainedContainer::builder()
			.set(
				TOKENS.face_vertex_counts.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(face_vertex_counts))),
			)
			.set(
				TOKENS.face_vertex_indices.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(face_vertex_indices))),
			)
			.build();
		RetainedContainer::builder()
			.set(TOKENS.topology.clone(), DataSource::Container(topology))
			.build()
	}
}
