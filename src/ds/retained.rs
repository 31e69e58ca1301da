//! Retained (eager) data sources: immutable, in-memory building blocks used
//! to construct synthetic or cached results cheaply.

use super::{ContainerDataSource, ContainerRef, DataSource, SampledDataSource, SampledRef};
use crate::{tf, vt};
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

// Containers at or below this size trade hashing for a linear scan.
const SMALL_CONTAINER_CAPACITY: usize = 16;

enum Storage {
	Small(Vec<(tf::Token, DataSource)>),
	Hashed {
		order: Vec<tf::Token>,
		entries: HashMap<tf::Token, DataSource>,
	},
}

/// Immutable container data source.
///
/// Entries whose value is absent are dropped at construction: building with
/// a `None` value is equivalent to omitting that name. The zero-entry
/// container is one process-wide shared instance.
pub struct RetainedContainer {
	storage: Storage,
}

static EMPTY_CONTAINER: LazyLock<ContainerRef> = LazyLock::new(|| {
	Arc::new(RetainedContainer {
		storage: Storage::Small(Vec::new()),
	})
});

impl RetainedContainer {
	pub fn new(entries: Vec<(tf::Token, Option<DataSource>)>) -> ContainerRef {
		let entries: Vec<(tf::Token, DataSource)> = entries
			.into_iter()
			.filter_map(|(name, value)| value.map(|value| (name, value)))
			.collect();

		if entries.is_empty() {
			return EMPTY_CONTAINER.clone();
		}

		let storage = if entries.len() <= SMALL_CONTAINER_CAPACITY {
			Storage::Small(entries)
		} else {
			let order = entries.iter().map(|(name, _)| name.clone()).collect();
			Storage::Hashed {
				order,
				entries: entries.into_iter().collect(),
			}
		};

		Arc::new(RetainedContainer { storage })
	}

	pub fn empty() -> ContainerRef {
		EMPTY_CONTAINER.clone()
	}

	pub fn builder() -> RetainedContainerBuilder {
		RetainedContainerBuilder {
			entries: Vec::new(),
		}
	}
}

impl ContainerDataSource for RetainedContainer {
	fn names(&self) -> Vec<tf::Token> {
		match &self.storage {
			Storage::Small(entries) => entries.iter().map(|(name, _)| name.clone()).collect(),
			Storage::Hashed { order, .. } => order.clone(),
		}
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		match &self.storage {
			Storage::Small(entries) => entries
				.iter()
				.find(|(entry_name, _)| entry_name == name)
				.map(|(_, value)| value.clone()),
			Storage::Hashed { entries, .. } => entries.get(name).cloned(),
		}
	}

	fn has(&self, name: &tf::Token) -> bool {
		match &self.storage {
			Storage::Small(entries) => entries.iter().any(|(entry_name, _)| entry_name == name),
			Storage::Hashed { entries, .. } => entries.contains_key(name),
		}
	}
}

pub struct RetainedContainerBuilder {
	entries: Vec<(tf::Token, Option<DataSource>)>,
}

impl RetainedContainerBuilder {
	pub fn set(mut self, name: tf::Token, value: impl Into<DataSource>) -> Self {
		self.entries.push((name, Some(value.into())));
		self
	}

	pub fn set_optional(mut self, name: tf::Token, value: Option<DataSource>) -> Self {
		self.entries.push((name, value));
		self
	}

	pub fn build(self) -> ContainerRef {
		RetainedContainer::new(self.entries)
	}
}

/// A single constant value; never time-varying.
pub struct RetainedSampled {
	value: vt::Value,
}

static BOOL_TRUE: LazyLock<SampledRef> = LazyLock::new(|| {
	Arc::new(RetainedSampled {
		value: vt::Value::new(true),
	})
});

static BOOL_FALSE: LazyLock<SampledRef> = LazyLock::new(|| {
	Arc::new(RetainedSampled {
		value: vt::Value::new(false),
	})
});

impl RetainedSampled {
	pub fn new(value: vt::Value) -> SampledRef {
		Arc::new(RetainedSampled { value })
	}

	/// The process-wide `true` instance. Callers may compare by pointer.
	pub fn bool_true() -> SampledRef {
		BOOL_TRUE.clone()
	}

	/// The process-wide `false` instance. Callers may compare by pointer.
	pub fn bool_false() -> SampledRef {
		BOOL_FALSE.clone()
	}

	pub fn bool_value(value: bool) -> SampledRef {
		if value { Self::bool_true() } else { Self::bool_false() }
	}
}

impl SampledDataSource for RetainedSampled {
	fn value(&self, _shutter_offset: f64) -> vt::Value {
		self.value.clone()
	}

	fn sample_times_for_interval(&self, _start_time: f64, _end_time: f64) -> Option<Vec<f64>> {
		None
	}
}

const SAMPLE_TIME_EPSILON: f64 = 1e-4;

/// An explicit ordered set of (time, value) samples; times must be sorted
/// ascending by the caller.
pub struct RetainedMultisampled {
	times: Vec<f64>,
	values: Vec<vt::Value>,
}

impl RetainedMultisampled {
	pub fn new(times: Vec<f64>, values: Vec<vt::Value>) -> SampledRef {
		debug_assert_eq!(times.len(), values.len());
		Arc::new(RetainedMultisampled { times, values })
	}
}

impl SampledDataSource for RetainedMultisampled {
	fn value(&self, shutter_offset: f64) -> vt::Value {
		let mut first_greater = None;
		for (i, &time) in self.times.iter().enumerate() {
			if (time - shutter_offset).abs() < SAMPLE_TIME_EPSILON {
				return self.values[i].clone();
			}
			if time > shutter_offset {
				first_greater = Some(i);
				break;
			}
		}

		match first_greater {
			None => self.values.last().cloned().unwrap_or_default(),
			Some(0) => self.values[0].clone(),
			Some(i) => {
				let delta = self.times[i] - shutter_offset;
				let prev_delta = shutter_offset - self.times[i - 1];
				if delta < SAMPLE_TIME_EPSILON {
					self.values[i].clone()
				} else if prev_delta <= delta {
					// Ties favor the earlier sample.
					self.values[i - 1].clone()
				} else {
					self.values[i].clone()
				}
			}
		}
	}

	fn sample_times_for_interval(&self, _start_time: f64, _end_time: f64) -> Option<Vec<f64>> {
		if self.times.len() >= 2 {
			Some(self.times.clone())
		} else {
			None
		}
	}
}

/// Pairs two containers, with entries of `over` shadowing same-named entries
/// of `under`.
pub struct OverlayContainer {
	over: ContainerRef,
	under: ContainerRef,
}

impl OverlayContainer {
	pub fn new(over: ContainerRef, under: ContainerRef) -> ContainerRef {
		Arc::new(OverlayContainer { over, under })
	}
}

impl ContainerDataSource for OverlayContainer {
	fn names(&self) -> Vec<tf::Token> {
		let mut names = self.over.names();
		for name in self.under.names() {
			if !names.contains(&name) {
				names.push(name);
			}
		}
		names
	}

	fn get(&self, name: &tf::Token) -> Option<DataSource> {
		self.over.get(name).or_else(|| self.under.get(name))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn t(s: &str) -> tf::Token {
		tf::Token::new(s)
	}

	fn leaf(v: i32) -> DataSource {
		DataSource::Sampled(RetainedSampled::new(vt::Value::new(v)))
	}

	#[test]
	fn null_entries_are_dropped() {
		let container = RetainedContainer::new(vec![
			(t("a"), Some(leaf(1))),
			(t("b"), None),
			(t("c"), Some(leaf(3))),
		]);
		assert_eq!(container.names(), vec![t("a"), t("c")]);
		assert!(container.has(&t("a")));
		assert!(!container.has(&t("b")));
	}

	#[test]
	fn empty_container_is_shared() {
		let a = RetainedContainer::new(vec![]);
		let b = RetainedContainer::new(vec![(t("x"), None)]);
		assert!(Arc::ptr_eq(&a, &b));
		assert!(a.names().is_empty());
	}

	#[test]
	fn small_and_hashed_storage_behave_identically() {
		let entries: Vec<_> = (0..20)
			.map(|i| (t(&format!("name{i}")), Some(leaf(i))))
			.collect();
		let small = RetainedContainer::new(entries[..10].to_vec());
		let hashed = RetainedContainer::new(entries.clone());

		for i in 0..10 {
			let name = t(&format!("name{i}"));
			assert_eq!(
				small.get(&name).unwrap().typed_value::<i32>(0.0),
				hashed.get(&name).unwrap().typed_value::<i32>(0.0),
			);
		}
		assert_eq!(hashed.names(), entries.iter().map(|(n, _)| n.clone()).collect::<Vec<_>>());
		assert!(!hashed.has(&t("name20")));
	}

	#[test]
	fn bool_singletons_are_identity_stable() {
		assert!(Arc::ptr_eq(&RetainedSampled::bool_true(), &RetainedSampled::bool_true()));
		assert!(Arc::ptr_eq(&RetainedSampled::bool_false(), &RetainedSampled::bool_false()));
		assert!(!Arc::ptr_eq(&RetainedSampled::bool_true(), &RetainedSampled::bool_false()));
		assert_eq!(RetainedSampled::bool_true().value(0.0).get::<bool>(), Some(true));
	}

	#[test]
	fn nearest_sample_selection() {
		let sampled = RetainedMultisampled::new(
			vec![0.0, 1.0, 2.0],
			vec![vt::Value::new(10i32), vt::Value::new(20i32), vt::Value::new(30i32)],
		);

		assert_eq!(sampled.value(0.0).get::<i32>(), Some(10));
		// Within epsilon of the middle sample.
		assert_eq!(sampled.value(1.00005).get::<i32>(), Some(20));
		// Exact midpoint: ties favor the earlier sample.
		assert_eq!(sampled.value(1.5).get::<i32>(), Some(20));
		assert_eq!(sampled.value(1.6).get::<i32>(), Some(30));
		// Beyond the last sample.
		assert_eq!(sampled.value(5.0).get::<i32>(), Some(30));
		// Before the first sample.
		assert_eq!(sampled.value(-3.0).get::<i32>(), Some(10));
	}

	#[test]
	fn nearest_sample_empty_is_default() {
		let sampled = RetainedMultisampled::new(vec![], vec![]);
		assert!(sampled.value(0.0).is_empty());
		assert_eq!(sampled.sample_times_for_interval(0.0, 1.0), None);
	}

	#[test]
	fn multisample_reports_all_times() {
		let sampled = RetainedMultisampled::new(
			vec![0.0, 1.0],
			vec![vt::Value::new(1i32), vt::Value::new(2i32)],
		);
		assert_eq!(sampled.sample_times_for_interval(0.25, 0.75), Some(vec![0.0, 1.0]));

		let single = RetainedMultisampled::new(vec![0.0], vec![vt::Value::new(1i32)]);
		assert_eq!(single.sample_times_for_interval(0.0, 1.0), None);
	}

	#[test]
	fn overlay_shadows_under() {
		let over = RetainedContainer::builder().set(t("a"), leaf(1)).build();
		let under = RetainedContainer::builder()
			.set(t("a"), leaf(100))
			.set(t("b"), leaf(2))
			.build();
		let overlay = OverlayContainer::new(over, under);
		assert_eq!(overlay.get(&t("a")).unwrap().typed_value::<i32>(0.0), Some(1));
		assert_eq!(overlay.get(&t("b")).unwrap().typed_value::<i32>(0.0), Some(2));
		assert_eq!(overlay.names(), vec![t("a"), t("b")]);
	}
}
