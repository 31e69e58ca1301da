//! Transform flattening: concatenates a prim's local matrix onto the
//! parent's already-composed matrix.

use crate::ds::{ContainerRef, LocatorSet, SampledDataSource, SampledRef};
use crate::gf;
use crate::schema::xform::XformSchema;
use crate::vt;
use std::sync::{Arc, LazyLock};

static IDENTITY_XFORM: LazyLock<ContainerRef> =
	LazyLock::new(|| XformSchema::build(gf::Matrix4d::IDENTITY, true));

pub struct FlattenedXformDataSource;

impl FlattenedXformDataSource {
	/// Computes the flattened xform container from a prim's own xform data
	/// and the parent's flattened result. The output is always marked fully
	/// composed.
	pub fn flattened(own: Option<ContainerRef>, parent: Option<ContainerRef>) -> ContainerRef {
		let own_schema = own.clone().map(XformSchema::new);

		// A reset stack is fully composed already.
		if let Some(schema) = &own_schema
			&& schema.reset_xform_stack()
		{
			return match schema.matrix() {
				Some(_) => own.unwrap(),
				None => IDENTITY_XFORM.clone(),
			};
		}

		let local = own_schema.as_ref().and_then(XformSchema::matrix);
		let parent_matrix = parent
			.as_ref()
			.and_then(|parent| XformSchema::new(parent.clone()).matrix());

		match (local, parent_matrix) {
			(None, None) => IDENTITY_XFORM.clone(),
			(Some(local), None) => XformSchema::build_sampled(local, true),
			// The parent result is already composed; forwarding it avoids a
			// second concatenation drifting the values.
			(None, Some(_)) => parent.unwrap(),
			(Some(local), Some(parent_matrix)) => XformSchema::build_sampled(
				ComposedMatrixDataSource::new(local, parent_matrix),
				true,
			),
		}
	}

	/// Locators to dirty on every descendant when `dirty_locators` touches a
	/// prim's xform: ancestor transforms feed into every descendant value,
	/// so the answer is all-or-nothing.
	pub fn compute_dirty_locators_for_descendants(dirty_locators: &LocatorSet) -> LocatorSet {
		if dirty_locators.intersects(XformSchema::default_locator()) {
			LocatorSet::universal()
		} else {
			LocatorSet::new()
		}
	}
}

/// Multiplies `local(t) * parent(t)` on demand per query time.
struct ComposedMatrixDataSource {
	local: SampledRef,
	parent: SampledRef,
	// The common case queries time zero only.
	time_zero: gf::Matrix4d,
}

impl ComposedMatrixDataSource {
	fn new(local: SampledRef, parent: SampledRef) -> SampledRef {
		let time_zero = Self::compose(&local, &parent, 0.0);
		Arc::new(Self {
			local,
			parent,
			time_zero,
		})
	}

	fn compose(local: &SampledRef, parent: &SampledRef, shutter_offset: f64) -> gf::Matrix4d {
		let local_matrix = local
			.value(shutter_offset)
			.get::<gf::Matrix4d>()
			.unwrap_or(gf::Matrix4d::IDENTITY);
		let parent_matrix = parent
			.value(shutter_offset)
			.get::<gf::Matrix4d>()
			.unwrap_or(gf::Matrix4d::IDENTITY);
		local_matrix.post_mult(&parent_matrix)
	}
}

impl SampledDataSource for ComposedMatrixDataSource {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		if shutter_offset == 0.0 {
			return vt::Value::new(self.time_zero);
		}
		vt::Value::new(Self::compose(&self.local, &self.parent, shutter_offset))
	}

	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>> {
		let local = self.local.sample_times_for_interval(start_time, end_time);
		let parent = self.parent.sample_times_for_interval(start_time, end_time);
		match (local, parent) {
			(None, None) => None,
			(Some(times), None) | (None, Some(times)) => Some(times),
			(Some(local), Some(parent)) => Some(merge_sample_times(local, parent)),
		}
	}
}

pub(crate) fn merge_sample_times(a: Vec<f64>, b: Vec<f64>) -> Vec<f64> {
	let mut merged = Vec::with_capacity(a.len() + b.len());
	let (mut i, mut j) = (0, 0);
	while i < a.len() || j < b.len() {
		let next = match (a.get(i), b.get(j)) {
			(Some(&x), Some(&y)) if x == y => {
				i += 1;
				j += 1;
				x
			}
			(Some(&x), Some(&y)) if x < y => {
				i += 1;
				x
			}
			(Some(_), Some(&y)) => {
				j += 1;
				y
			}
			(Some(&x), None) => {
				i += 1;
				x
			}
			(None, Some(&y)) => {
				j += 1;
				y
			}
			(None, None) => break,
		};
		merged.push(next);
	}
	merged
}
