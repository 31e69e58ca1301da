//! Expands pinned basis curves into their nonperiodic equivalent by
//! repeating each curve's end points, so downstream consumers never see the
//! `pinned` wrap mode.

use super::{FilteringBase, FilteringSceneIndex};
use crate::ds::{
	ContainerDataSource, ContainerRef, DataSource, RetainedSampled, SampledDataSource, SampledRef,
};
use crate::gf;
use crate::path::PrimPath;
use crate::scene::observer::{DirtiedEntry, SceneIndexObserver};
use crate::scene::{Prim, SceneIndex, SceneIndexRef};
use crate::schema::basis_curves::{BasisCurvesSchema, TOKENS};
use crate::schema::primvars::{PrimvarSchema, PrimvarsSchema, TOKENS as PRIMVARS_TOKENS};
use crate::tf;
use crate::vt;
use std::sync::Arc;

pub struct PinnedCurveExpandingSceneIndex {
	base: FilteringBase,
}

impl PinnedCurveExpandingSceneIndex {
	pub fn new(input: SceneIndexRef) -> Arc<Self> {
		let index = Arc::new(Self {
			base: FilteringBase::new(input),
		});
		FilteringBase::observe_input(&index);
		index
	}

	/// End points to repeat per curve end, by basis; `None` means the prim
	/// needs no expansion.
	fn repeat_count(data_source: &ContainerRef) -> Option<usize> {
		let schema = BasisCurvesSchema::from_prim(data_source)?;
		if schema.wrap()? != TOKENS.pinned {
			return None;
		}
		let basis = schema.basis()?;
		if basis == TOKENS.bspline {
			Some(2)
		} else if basis == TOKENS.catmull_rom {
			Some(1)
		} else {
			None
		}
	}
}

impl SceneIndex for PinnedCurveExpandingSceneIndex {
	fn prim(&self, path: &PrimPath) -> Prim {
		let mut prim = self.base.input().prim(path);
		if prim.prim_type == TOKENS.basis_curves
			&& let Some(data_source) = &prim.data_source
			&& let Some(repeat) = Self::repeat_count(data_source)
		{
			prim.data_source = Some(Arc::new(ExpandedCurvePrimDataSource {
				input: data_source.clone(),
				repeat,
			}));
		}
		prim
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

impl FilteringSceneIndex for PinnedCurveExpandingSceneIndex {
	fn base(&self) -> &FilteringBase {
		&self.base
	}

	fn on_prims_dirtied(&self, entries: &[DirtiedEntry]) {
		// Expanded primvar values derive from the topology counts, so a
		// topology change on a curve prim dirties its primvars as well.
		let translated: Vec<DirtiedEntry> = entries
			.iter()
			.map(|entry| {
				let prim_type = self.base.input().prim(&entry.path).prim_type;
				if prim_type == TOKENS.basis_curves
					&& entry.locators.intersects(BasisCurvesSchema::default_locator())
				{
					let mut locators = entry.locators.clone();
					locators.insert(PrimvarsSchema::default_locator().clone());
					DirtiedEntry {
						path: entry.path.clone(),
						locators,
					}
				} else {
					entry.clone()
				}
			})
			.collect();
		self.base.observers().send_dirtied(&translated);
	}
}

struct ExpandedCurvePrimDataSource {
	input: ContainerRef,
	repeat: usize,
}

impl ExpandedCurvePrimDataSource {
	fn counts_source(&self) -> Option<SampledRef> {
		BasisCurvesSchema::from_prim(&self.input)?.curve_vertex_counts()
	}
}

impl ContainerDataSource for ExpandedCurvePrimDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.input.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.input.get(name)?;
		if name == &TOKENS.basis_curves {
			let curves = child.container()?;
			return Some(DataSource::Container(Arc::new(ExpandedCurvesDataSource {
				curves,
				repeat: self.repeat,
			})));
		}
		if name == &PRIMVARS_TOKENS.primvars {
			let primvars = child.container()?;
			return Some(DataSource::Container(Arc::new(ExpandedPrimvarsDataSource {
				primvars,
				counts: self.counts_source(),
				repeat: self.repeat,
			})));
		}
		Some(child)
	}
}

struct ExpandedCurvesDataSource {
	curves: ContainerRef,
	repeat: usize,
}

impl ContainerDataSource for ExpandedCurvesDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.curves.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.curves.get(name)?;
		if name != &TOKENS.topology {
			return Some(child);
		}
		let topology = child.container()?;
		Some(DataSource::Container(Arc::new(ExpandedTopologyDataSource {
			topology,
			repeat: self.repeat,
		})))
	}
}

struct ExpandedTopologyDataSource {
	topology: ContainerRef,
	repeat: usize,
}

impl ContainerDataSource for ExpandedTopologyDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.topology.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		if name == &TOKENS.wrap {
			return Some(DataSource::Sampled(RetainedSampled::new(vt::Value::new(
				TOKENS.nonperiodic.clone(),
			))));
		}
		let child = self.topology.get(name)?;
		if name == &TOKENS.curve_vertex_counts {
			let counts = child.sampled()?;
			return Some(DataSource::Sampled(Arc::new(ExpandedCountsDataSource {
				counts,
				repeat: self.repeat,
			})));
		}
		Some(child)
	}
}

struct ExpandedCountsDataSource {
	counts: SampledRef,
	repeat: usize,
}

impl SampledDataSource for ExpandedCountsDataSource {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		match self.counts.value(shutter_offset).get::<vt::Array<i32>>() {
			Some(counts) => vt::Value::new(
				counts
					.into_iter()
					.map(|count| count + 2 * self.repeat as i32)
					.collect::<Vec<i32>>(),
			),
			None => vt::Value::empty(),
		}
	}

	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>> {
		self.counts.sample_times_for_interval(start_time, end_time)
	}
}

struct ExpandedPrimvarsDataSource {
	primvars: ContainerRef,
	counts: Option<SampledRef>,
	repeat: usize,
}

impl ContainerDataSource for ExpandedPrimvarsDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.primvars.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.primvars.get(name)?;
		let Some(counts) = self.counts.clone() else {
			return Some(child);
		};
		let Some(primvar) = child.container() else {
			return Some(child);
		};
		let schema = PrimvarSchema::new(primvar.clone());
		if schema.interpolation().as_ref() != Some(&PRIMVARS_TOKENS.vertex) {
			return Some(DataSource::Container(primvar));
		}
		Some(DataSource::Container(Arc::new(ExpandedPrimvarDataSource {
			primvar,
			counts,
			repeat: self.repeat,
		})))
	}
}

struct ExpandedPrimvarDataSource {
	primvar: ContainerRef,
	counts: SampledRef,
	repeat: usize,
}

impl ContainerDataSource for ExpandedPrimvarDataSource {
	fn names(&self) -> Vec<tf::Token> {
		self.primvar.names()
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		let child = self.primvar.get(name)?;
		if name != &PRIMVARS_TOKENS.primvar_value {
			return Some(child);
		}
		let values = child.sampled()?;
		Some(DataSource::Sampled(Arc::new(ExpandedVertexValuesDataSource {
			values,
			counts: self.counts.clone(),
			repeat: self.repeat,
		})))
	}
}

struct ExpandedVertexValuesDataSource {
	values: SampledRef,
	counts: SampledRef,
	repeat: usize,
}

impl SampledDataSource for ExpandedVertexValuesDataSource {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		let Some(counts) = self.counts.value(shutter_offset).get::<vt::Array<i32>>() else {
			return self.values.value(shutter_offset);
		};
		expand_vertex_value(self.values.value(shutter_offset), &counts, self.repeat)
	}

	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>> {
		self.values.sample_times_for_interval(start_time, end_time)
	}
}

fn expand_vertex_value(value: vt::Value, counts: &[i32], repeat: usize) -> vt::Value {
	macro_rules! expand_as {
		($type:ty) => {
			if let Some(array) = value.get::<vt::Array<$type>>() {
				return vt::Value::new(expand_array(&array, counts, repeat));
			}
		};
	}

	expand_as!(gf::Vec3f);
	expand_as!(gf::Vec2f);
	expand_as!(f32);
	expand_as!(f64);
	expand_as!(i32);

	tracing::warn!("pinned curve expansion: unsupported vertex primvar value {value:?}");
	value
}

fn expand_array<T: Clone>(array: &[T], counts: &[i32], repeat: usize) -> Vec<T> {
	let mut expanded = Vec::with_capacity(array.len() + counts.len() * 2 * repeat);
	let mut offset = 0usize;
	for &count in counts {
		let end = (offset + count as usize).min(array.len());
		let curve = &array[offset.min(array.len())..end];
		if let Some(first) = curve.first() {
			for _ in 0..repeat {
				expanded.push(first.clone());
			}
		}
		expanded.extend_from_slice(curve);
		if let Some(last) = curve.last() {
			for _ in 0..repeat {
				expanded.push(last.clone());
			}
		}
		offset = end;
	}
	expanded
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::ds::RetainedContainer;
	use crate::scene::retained::{AddedPrim, RetainedSceneIndex};

	fn p(s: &str) -> PrimPath {
		PrimPath::from(s)
	}

	fn curve_prim(basis: &tf::Token, wrap: &tf::Token, counts: Vec<i32>, points: Vec<gf::Vec3f>) -> Option<ContainerRef> {
		let primvars = RetainedContainer::builder()
			.set(
				tf::Token::new("points"),
				DataSource::Container(PrimvarSchema::build(
					vt::Value::new(points),
					&PRIMVARS_TOKENS.vertex,
					None,
				)),
			)
			.build();
		Some(
			RetainedContainer::builder()
				.set(
					TOKENS.basis_curves.clone(),
					DataSource::Container(BasisCurvesSchema::build(counts, basis, wrap)),
				)
				.set(PRIMVARS_TOKENS.primvars.clone(), DataSource::Container(primvars))
				.build(),
		)
	}

	fn curve_scene(basis: &tf::Token, wrap: &tf::Token) -> Arc<RetainedSceneIndex> {
		let input = RetainedSceneIndex::new();
		input.add_prims(vec![AddedPrim {
			path: p("/curve"),
			prim_type: TOKENS.basis_curves.clone(),
			data_source: curve_prim(
				basis,
				wrap,
				vec![4],
				vec![
					gf::Vec3f::new(0.0, 0.0, 0.0),
					gf::Vec3f::new(1.0, 0.0, 0.0),
					gf::Vec3f::new(2.0, 0.0, 0.0),
					gf::Vec3f::new(3.0, 0.0, 0.0),
				],
			),
		}]);
		input
	}

	#[test]
	fn bspline_ends_are_repeated_twice() {
		let index = PinnedCurveExpandingSceneIndex::new(curve_scene(&TOKENS.bspline, &TOKENS.pinned));
		let prim = index.prim(&p("/curve"));
		let data_source = prim.data_source.unwrap();

		let curves = BasisCurvesSchema::from_prim(&data_source).unwrap();
		assert_eq!(curves.wrap(), Some(TOKENS.nonperiodic.clone()));
		assert_eq!(
			curves.curve_vertex_counts().unwrap().value(0.0).get::<Vec<i32>>(),
			Some(vec![8]),
		);

		let primvars = PrimvarsSchema::from_prim(&data_source).unwrap();
		let points = primvars
			.primvar(&tf::Token::new("points"))
			.unwrap()
			.primvar_value()
			.unwrap()
			.value(0.0)
			.get::<Vec<gf::Vec3f>>()
			.unwrap();
		assert_eq!(points.len(), 8);
		assert_eq!(points[0], points[1]);
		assert_eq!(points[2], gf::Vec3f::new(0.0, 0.0, 0.0));
		assert_eq!(points[7], points[6]);
	}

	#[test]
	fn catmull_rom_repeats_once() {
		let index =
			PinnedCurveExpandingSceneIndex::new(curve_scene(&TOKENS.catmull_rom, &TOKENS.pinned));
		let prim = index.prim(&p("/curve"));
		let curves = BasisCurvesSchema::from_prim(prim.data_source.as_ref().unwrap()).unwrap();
		assert_eq!(
			curves.curve_vertex_counts().unwrap().value(0.0).get::<Vec<i32>>(),
			Some(vec![6]),
		);
	}

	#[test]
	fn unpinned_curves_pass_through() {
		let index =
			PinnedCurveExpandingSceneIndex::new(curve_scene(&TOKENS.bspline, &TOKENS.nonperiodic));
		let prim = index.prim(&p("/curve"));
		let curves = BasisCurvesSchema::from_prim(prim.data_source.as_ref().unwrap()).unwrap();
		assert_eq!(
			curves.curve_vertex_counts().unwrap().value(0.0).get::<Vec<i32>>(),
			Some(vec![4]),
		);
	}

	#[test]
	fn multiple_curves_expand_independently() {
		let array = vec![1.0f32, 2.0, 3.0, 4.0, 5.0];
		let expanded = expand_array(&array, &[2, 3], 1);
		assert_eq!(expanded, vec![1.0, 1.0, 2.0, 2.0, 3.0, 3.0, 4.0, 5.0, 5.0]);
	}
}
