//! Data-Source Foundations
//!
//! A data source is either a *container* mapping names to child data sources
//! or a *sampled value* evaluated at a shutter offset. Scene indices hand
//! these out lazily; a provider may return the same instance repeatedly or a
//! fresh wrapper each call, so callers must not rely on identity unless a
//! singleton contract says otherwise.

pub mod locator;
pub mod retained;

pub use locator::{Locator, LocatorSet};
pub use retained::{OverlayContainer, RetainedContainer, RetainedMultisampled, RetainedSampled};

use crate::{tf, vt};
use std::sync::Arc;

pub type ContainerRef = Arc<dyn ContainerDataSource>;
pub type SampledRef = Arc<dyn SampledDataSource>;

/// Mapping from names to child data sources, queried by exact name.
pub trait ContainerDataSource: Send + Sync {
	fn names(&self) -> Vec<tf::Token>;

	fn get(&self, name: &tf::Token) -> Option<DataSource>;

	fn has(&self, name: &tf::Token) -> bool {
		self.get(name).is_some()
	}
}

/// A typed value as a function of a shutter offset.
pub trait SampledDataSource: Send + Sync {
	fn value(&self, shutter_offset: f64) -> vt::Value;

	/// Returns the sample offsets that influence the half-open interval
	/// `[start_time, end_time)`, or `None` when the value is not
	/// time-varying and a single evaluation suffices.
	fn sample_times_for_interval(&self, start_time: f64, end_time: f64) -> Option<Vec<f64>>;
}

/// Handle to any data source, tagged by capability.
#[derive(Clone)]
pub enum DataSource {
	Container(ContainerRef),
	Sampled(SampledRef),
}

impl DataSource {
	pub fn container(&self) -> Option<ContainerRef> {
		match self {
			DataSource::Container(c) => Some(c.clone()),
			DataSource::Sampled(_) => None,
		}
	}

	pub fn sampled(&self) -> Option<SampledRef> {
		match self {
			DataSource::Container(_) => None,
			DataSource::Sampled(s) => Some(s.clone()),
		}
	}

	/// Evaluate as a sampled source and extract a `T`.
	///
	/// Returns `None` for containers, empty values and values of another
	/// type; a present-but-mismatched value is a caller bug and is reported.
	pub fn typed_value<T: vt::ValueType>(&self, shutter_offset: f64) -> Option<T> {
		let sampled = self.sampled()?;
		let value = sampled.value(shutter_offset);
		if value.is_empty() {
			return None;
		}
		let typed = value.get::<T>();
		if typed.is_none() {
			tracing::warn!(
				"typed dispatch failed: value {:?} does not hold the requested type",
				value
			);
		}
		typed
	}

	/// Follow `locator` element-by-element down nested containers.
	pub fn get_at_locator(&self, locator: &Locator) -> Option<DataSource> {
		let mut current = self.clone();
		for name in locator.elements() {
			current = current.container()?.get(name)?;
		}
		Some(current)
	}
}

impl std::fmt::Debug for DataSource {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self {
			DataSource::Container(c) => write!(f, "Container({:?})", c.names()),
			DataSource::Sampled(s) => write!(f, "Sampled({:?})", s.value(0.0)),
		}
	}
}

impl From<ContainerRef> for DataSource {
	fn from(c: ContainerRef) -> Self {
		DataSource::Container(c)
	}
}

impl From<SampledRef> for DataSource {
	fn from(s: SampledRef) -> Self {
		DataSource::Sampled(s)
	}
}
