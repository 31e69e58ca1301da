//! Converts implicit-surface prims per a static configuration: either to an
//! equivalent mesh, or by folding their spine axis into the transform.

use super::flatten::xform::merge_sample_times;
use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{
	ContainerRef, DataSource, OverlayContainer, RetainedContainer, RetainedSampled,
	SampledDataSource,
};
use crate::gf;
use crate::path::PrimPath;
use crate::scene::observer::{AddedEntry, DirtiedEntry, SceneIndexObserver};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::MeshSchema;
use crate::schema::implicit::{ImplicitSchema, TOKENS};
use crate::schema::mesh::TOKENS as MESH_TOKENS;
use crate::schema::primvars::{PrimvarsSchema, TOKENS as PRIMVARS_TOKENS};
use crate::schema::xform::{TOKENS as XFORM_TOKENS, XformSchema};
use crate::tf;
use crate::vt;
use std::collections::HashMap;
use std::sync::Arc;

const SLICES: usize = 16;
const STACKS: usize = 16;

pub struct ImplicitSurfaceSceneIndex {
	base: FilteringBase,
	/// prim type -> conversion mode (`toMesh` or `axisToTransform`).
	modes: HashMap<tf::Token, tf::Token>,
}

impl ImplicitSurfaceSceneIndex {
	/// `config` maps prim-type names to mode tokens, interpreted per type;
	/// unsupported combinations are reported and left untouched.
	pub fn new(input: SceneIndexRef, config: Option<ContainerRef>) -> Arc<Self> {
		let mut modes = HashMap::new();
		if let Some(config) = config {
			for prim_type in config.names() {
				let Some(mode) = config
					.get(&prim_type)
					.and_then(|ds| ds.typed_value::<tf::Token>(0.0))
				else {
					continue;
				};
				if Self::supported(&prim_type, &mode) {
					modes.insert(prim_type, mode);
				} else {
					tracing::warn!(
						"implicit surface config: unsupported mode {mode} for {prim_type}"
					);
				}
			}
		}

		let index = Arc::new(Self {
			base: FilteringBase::new(input),
			modes,
		});
		FilteringBase::observe_input(&index);
		index
	}

	fn supported(prim_type: &tf::Token, mode: &tf::Token) -> bool {
		if mode == &TOKENS.to_mesh {
			[&TOKENS.sphere, &TOKENS.cube, &TOKENS.cylinder, &TOKENS.cone]
				.contains(&prim_type)
		} else if mode == &TOKENS.axis_to_transform {
			[&TOKENS.cylinder, &TOKENS.cone, &TOKENS.capsule].contains(&prim_type)
		} else {
			false
		}
	}

	fn mode_for(&self, prim_type: &tf::Token) -> Option<&tf::Token> {
		self.modes.get(prim_type)
	}

	fn to_mesh_prim(&self, prim: Prim) -> Prim {
		let Some(input) = prim.data_source else {
			return Prim::new(MESH_TOKENS.mesh.clone(), None);
		};

		let (counts, indices) = topology_for(&prim.prim_type);
		let points: crate::ds::SampledRef = Arc::new(GeneratedPointsDataSource {
			prim: input.clone(),
			prim_type: prim.prim_type.clone(),
		});
		let points_primvar = PrimvarsSchema::new(
			RetainedContainer::builder()
				.set(
					MESH_TOKENS.points.clone(),
					DataSource::Container(
						RetainedContainer::builder()
							.set(
								PRIMVARS_TOKENS.primvar_value.clone(),
								DataSource::Sampled(points),
							)
							.set(
								PRIMVARS_TOKENS.interpolation.clone(),
								DataSource::Sampled(RetainedSampled::new(vt::Value::new(
									PRIMVARS_TOKENS.vertex.clone(),
								))),
							)
							.build(),
					),
				)
				.build(),
		);

		let primvars: ContainerRef = match PrimvarsSchema::from_prim(&input) {
			Some(existing) => OverlayContainer::new(
				points_primvar.container().clone(),
				existing.container().clone(),
			),
			None => points_primvar.container().clone(),
		};

		let generated = RetainedContainer::builder()
			.set(
				MESH_TOKENS.mesh.clone(),
				DataSource::Container(MeshSchema::build(counts, indices)),
			)
			.set(PRIMVARS_TOKENS.primvars.clone(), DataSource::Container(primvars))
			.build();

		Prim::new(
			MESH_TOKENS.mesh.clone(),
			Some(OverlayContainer::new(generated, input)),
		)
	}

	fn axis_to_transform_prim(&self, prim: Prim) -> Prim {
		let Some(input) = prim.data_source else {
			return prim;
		};

		let matrix: crate::ds::SampledRef = Arc::new(AxisAdjustedMatrixDataSource {
			prim: input.clone(),
			prim_type: prim.prim_type.clone(),
		});
		let xform = XformSchema::build_sampled(matrix, false);

		// The output implicit data reads as Z-aligned.
		let canonical_axis = RetainedContainer::builder()
			.set(
				TOKENS.axis.clone(),
				DataSource::Sampled(RetainedSampled::new(vt::Value::new(TOKENS.axis_z.clone()))),
			)
			.build();
		let implicit: Option<DataSource> = input
			.get(&prim.prim_type)
			.and_then(|ds| ds.container())
			.map(|container| {
				DataSource::Container(OverlayContainer::new(canonical_axis, container))
			});

		let generated = RetainedContainer::builder()
			.set(XFORM_TOKENS.xform.clone(), DataSource::Container(xform))
			.set_optional(prim.prim_type.clone(), implicit)
			.build();

		Prim::new(
			prim.prim_type,
			Some(OverlayContainer::new(generated, input)),
		)
	}
}

impl SceneIndex for ImplicitSurfaceSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let prim = self.base.input().prim(path);
		match self.mode_for(&prim.prim_type) {
			Some(mode) if mode == &TOKENS.to_mesh => self.to_mesh_prim(prim),
			Some(mode) if mode == &TOKENS.axis_to_transform => self.axis_to_transform_prim(prim),
			_ => prim,
		}
	}

	fn child_prim_paths(&self, path: &PrimPath) -> Vec<PrimPath> {
		self.base.input().child_prim_paths(path)
	}

	fn add_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().add(observer);
	}

	fn remove_observer(&self, observer: &Arc<dyn SceneIndexObserver>) {
		self.base.observers().remove(observer);
	}
}

impl FilteringSceneIndex for ImplicitSurfaceSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}

	fn on_prims_added(&self, entries: &[AddedEntry]) {
		// Relabel converted prim types in-flight, keeping count and order.
		let translated: Vec<AddedEntry> = entries
			.iter()
			.map(|entry| {
				if self.mode_for(&entry.prim_type) == Some(&TOKENS.to_mesh) {
					AddedEntry {
						path: entry.path.clone(),
						prim_type: MESH_TOKENS.mesh.clone(),
					}
				} else {
					entry.clone()
				}
			})
			.collect();
		self.base.observers().send_added(&translated);
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		let translated: Vec<DirtiedEntry> = entries
			.iter()
			.map(|entry| {
				let prim_type = self.base.input().prim(&entry.path).prim_type;
				let Some(mode) = self.mode_for(&prim_type) else {
					return entry.clone();
				};
				if !entry.locators.intersects(&ImplicitSchema::locator_for(&prim_type)) {
					return entry.clone();
				}
				let mut locators = entry.locators.clone();
				if mode == &TOKENS.to_mesh {
					locators.insert(MeshSchema::default_locator().clone());
					locators.insert(PrimvarsSchema::default_locator().clone());
				} else {
					locators.insert(XformSchema::default_locator().clone());
				}
				DirtiedEntry {
					path: entry.path.clone(),
					locators,
				}
			})
			.collect();
		self.base.observers().send_dirtied(&translated);
	}
}

/// Lazily generates mesh points from the implicit prim's current scalars.
struct GeneratedPointsDataSource {
	prim: ContainerRef,
	prim_type: tf::Token,
}

impl GeneratedPointsDataSource {
	fn scalar_sources(&self) -> Vec<crate::ds::SampledRef> {
		let Some(schema) = ImplicitSchema::from_prim(&self.prim, &self.prim_type) else {
			return Vec::new();
		};
		[&TOKENS.radius, &TOKENS.size, &TOKENS.height]
			.iter()
			.filter_map(|name| schema_get_sampled(&schema, name))
			.collect()
	}
}

fn schema_get_sampled(schema: &ImplicitSchema, name: &tf::Token) -> Option<crate::ds::SampledRef> {
	schema.container().get(name)?.sampled()
}

impl SampledDataSource for GeneratedPointsDataSource {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		let schema = ImplicitSchema::from_prim(&self.prim, &self.prim_type);
		let scalar = |name: &tf::Token, fallback: f64| -> f64 {
			schema
				.as_ref()
				.and_then(|schema| schema_get_sampled(schema, name))
				.and_then(|sampled| sampled.value(shutter_offset).get::<f64>())
				.unwrap_or(fallback)
		};

		let points = if self.prim_type == TOKENS.cube {
			cube_points(scalar(&TOKENS.size, 2.0))
		} else if self.prim_type == TOKENS.sphere {
			sphere_points(scalar(&TOKENS.radius, 1.0))
		} else if self.prim_type == TOKENS.cylinder {
			cylinder_points(scalar(&TOKENS.radius, 1.0), scalar(&TOKENS.height, 2.0))
		} else {
			cone_points(scalar(&TOKENS.radius, 1.0), scalar(&TOKENS.height, 2.0))
		};
		vt::Value::new(points)
	}

	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>> {
		let mut merged: Option<Vec<f64>> = None;
		for source in self.scalar_sources() {
			if let Some(times) = source.sample_times_for_interval(start_time, end_time) {
				merged = Some(match merged {
					Some(existing) => merge_sample_times(existing, times),
					None => times,
				});
			}
		}
		merged
	}
}

fn topology_for(prim_type: &tf::Token) -> (Vec<i32>, Vec<i32>) {
	if prim_type == &TOKENS.cube {
		cube_topology()
	} else if prim_type == &TOKENS.sphere {
		sphere_topology()
	} else if prim_type == &TOKENS.cylinder {
		cylinder_topology()
	} else {
		cone_topology()
	}
}

fn cube_topology() -> (Vec<i32>, Vec<i32>) {
	let counts = vec![4; 6];
	let indices = vec![
		0, 1, 2, 3, // +z
		7, 6, 5, 4, // -z
		0, 4, 5, 1, // -y
		1, 5, 6, 2, // +x
		2, 6, 7, 3, // +y
		3, 7, 4, 0, // -x
	];
	(counts, indices)
}

fn cube_points(size: f64) -> Vec<gf::Vec3f> {
	let h = (size * 0.5) as f32;
	vec![
		gf::Vec3f::new(-h, -h, h),
		gf::Vec3f::new(h, -h, h),
		gf::Vec3f::new(h, h, h),
		gf::Vec3f::new(-h, h, h),
		gf::Vec3f::new(-h, -h, -h),
		gf::Vec3f::new(h, -h, -h),
		gf::Vec3f::new(h, h, -h),
		gf::Vec3f::new(-h, h, -h),
	]
}

fn sphere_topology() -> (Vec<i32>, Vec<i32>) {
	let mut counts = Vec::new();
	let mut indices = Vec::new();
	let ring = |stack: usize, slice: usize| -> i32 { (stack * SLICES + (slice % SLICES)) as i32 };
	let north = ((STACKS - 1) * SLICES) as i32;
	let south = north + 1;

	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([north, ring(0, slice), ring(0, slice + 1)]);
	}
	for stack in 0..STACKS - 2 {
		for slice in 0..SLICES {
			counts.push(4);
			indices.extend([
				ring(stack, slice),
				ring(stack + 1, slice),
				ring(stack + 1, slice + 1),
				ring(stack, slice + 1),
			]);
		}
	}
	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([south, ring(STACKS - 2, slice + 1), ring(STACKS - 2, slice)]);
	}
	(counts, indices)
}

fn sphere_points(radius: f64) -> Vec<gf::Vec3f> {
	let mut points = Vec::with_capacity((STACKS - 1) * SLICES + 2);
	for stack in 1..STACKS {
		let phi = std::f64::consts::PI * (stack as f64) / (STACKS as f64);
		for slice in 0..SLICES {
			let theta = std::f64::consts::TAU * (slice as f64) / (SLICES as f64);
			points.push(gf::Vec3f::new(
				(radius * phi.sin() * theta.cos()) as f32,
				(radius * phi.sin() * theta.sin()) as f32,
				(radius * phi.cos()) as f32,
			));
		}
	}
	points.push(gf::Vec3f::new(0.0, 0.0, radius as f32));
	points.push(gf::Vec3f::new(0.0, 0.0, -radius as f32));
	points
}

fn cylinder_topology() -> (Vec<i32>, Vec<i32>) {
	let mut counts = Vec::new();
	let mut indices = Vec::new();
	let top = |slice: usize| -> i32 { (slice % SLICES) as i32 };
	let bottom = |slice: usize| -> i32 { (SLICES + slice % SLICES) as i32 };
	let top_center = (2 * SLICES) as i32;
	let bottom_center = top_center + 1;

	for slice in 0..SLICES {
		counts.push(4);
		indices.extend([top(slice), bottom(slice), bottom(slice + 1), top(slice + 1)]);
	}
	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([top_center, top(slice + 1), top(slice)]);
	}
	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([bottom_center, bottom(slice), bottom(slice + 1)]);
	}
	(counts, indices)
}

fn cylinder_points(radius: f64, height: f64) -> Vec<gf::Vec3f> {
	let h = (height * 0.5) as f32;
	let mut points = Vec::with_capacity(2 * SLICES + 2);
	for z in [h, -h] {
		for slice in 0..SLICES {
			let theta = std::f64::consts::TAU * (slice as f64) / (SLICES as f64);
			points.push(gf::Vec3f::new(
				(radius * theta.cos()) as f32,
				(radius * theta.sin()) as f32,
				z,
			));
		}
	}
	points.push(gf::Vec3f::new(0.0, 0.0, h));
	points.push(gf::Vec3f::new(0.0, 0.0, -h));
	points
}

fn cone_topology() -> (Vec<i32>, Vec<i32>) {
	let mut counts = Vec::new();
	let mut indices = Vec::new();
	let base = |slice: usize| -> i32 { (slice % SLICES) as i32 };
	let apex = SLICES as i32;
	let base_center = apex + 1;

	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([apex, base(slice), base(slice + 1)]);
	}
	for slice in 0..SLICES {
		counts.push(3);
		indices.extend([base_center, base(slice + 1), base(slice)]);
	}
	(counts, indices)
}

fn cone_points(radius: f64, height: f64) -> Vec<gf::Vec3f> {
	let h = (height * 0.5) as f32;
	let mut points = Vec::with_capacity(SLICES + 2);
	for slice in 0..SLICES {
		let theta = std::f64::consts::TAU * (slice as f64) / (SLICES as f64);
		points.push(gf::Vec3f::new(
			(radius * theta.cos()) as f32,
			(radius * theta.sin()) as f32,
			-h,
		));
	}
	points.push(gf::Vec3f::new(0.0, 0.0, h));
	points.push(gf::Vec3f::new(0.0, 0.0, -h));
	points
}

/// Rotates the implicit's spine axis onto Z and composes the prim's own
/// local matrix on top.
struct AxisAdjustedMatrixDataSource {
	prim: ContainerRef,
	prim_type: tf::Token,
}

impl AxisAdjustedMatrixDataSource {
	fn rotation(&self) -> gf::Matrix4d {
		let axis = ImplicitSchema::from_prim(&self.prim, &self.prim_type)
			.and_then(|schema| schema.axis())
			.unwrap_or(TOKENS.axis_z.clone());
		if axis == TOKENS.axis_x {
			gf::Matrix4d {
				data: [
					[0.0, 0.0, -1.0, 0.0],
					[0.0, 1.0, 0.0, 0.0],
					[1.0, 0.0, 0.0, 0.0],
					[0.0, 0.0, 0.0, 1.0],
				],
			}
		} else if axis == TOKENS.axis_y {
			gf::Matrix4d {
				data: [
					[1.0, 0.0, 0.0, 0.0],
					[0.0, 0.0, -1.0, 0.0],
					[0.0, 1.0, 0.0, 0.0],
					[0.0, 0.0, 0.0, 1.0],
				],
			}
		} else {
			gf::Matrix4d::IDENTITY
		}
	}

	fn local_matrix(&self, shutter_offset: f64) -> gf::Matrix4d {
		XformSchema::from_prim(&self.prim)
			.and_then(|schema| schema.matrix())
			.and_then(|matrix| matrix.value(shutter_offset).get::<gf::Matrix4d>())
			.unwrap_or(gf::Matrix4d::IDENTITY)
	}
}

impl SampledDataSource for AxisAdjustedMatrixDataSource {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		vt::Value::new(self.rotation().post_mult(&self.local_matrix(shutter_offset)))
	}

	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>> {
		XformSchema::from_prim(&self.prim)
			.and_then(|schema| schema.matrix())
			.and_then(|matrix| matrix.sample_times_for_interval(start_time, end_time))
	}
}
