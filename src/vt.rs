//! Value Types

use crate::path::PrimPath;
use crate::{gf, tf};
use half::f16;

pub type Array<T> = Vec<T>;

/// Type-erased container for a single value of any supported type.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
	store: ValueStore,
}

impl Value {
	pub fn new<T: ValueType>(value: T) -> Self {
		Value {
			store: value.store(),
		}
	}

	pub fn empty() -> Self {
		Value {
			store: ValueStore::Empty,
		}
	}

	pub fn is_empty(&self) -> bool {
		matches!(self.store, ValueStore::Empty)
	}

	pub fn get<T: ValueType>(&self) -> Option<T> {
		T::load(&self.store)
	}
}

impl Default for Value {
	fn default() -> Self {
		Self::empty()
	}
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValueStore {
	Empty,

	Bool(bool),
	BoolArray(Array<bool>),

	Int(i32),
	IntArray(Array<i32>),

	Half(f16),
	HalfArray(Array<f16>),
	Float(f32),
	FloatArray(Array<f32>),
	Double(f64),
	DoubleArray(Array<f64>),

	Vec2f(gf::Vec2f),
	Vec2fArray(Array<gf::Vec2f>),
	Vec3f(gf::Vec3f),
	Vec3fArray(Array<gf::Vec3f>),
	Vec3d(gf::Vec3d),
	Vec3dArray(Array<gf::Vec3d>),

	Matrix4d(gf::Matrix4d),

	Token(tf::Token),
	TokenArray(Array<tf::Token>),

	String(String),
	StringArray(Array<String>),

	Path(PrimPath),
	PathArray(Array<PrimPath>),
}

pub trait ValueType {
	fn load(store: &ValueStore) -> Option<Self>
	where
		Self: Sized;
	fn store(self) -> ValueStore;
}

macro_rules! impl_value_type_clone {
	($type:ty, $store:ident) => {
		impl ValueType for $type {
			fn load(store: &ValueStore) -> Option<Self> {
				match store {
					ValueStore::$store(v) => Some(v.clone()),
					_ => None,
				}
			}

			fn store(self) -> ValueStore {
				ValueStore::$store(self)
			}
		}

		impl From<$type> for Value {
			fn from(value: $type) -> Self {
				Value {
					store: ValueStore::$store(value),
				}
			}
		}
	};
}

macro_rules! impl_value_type_deref {
	($type:ty, $store:ident) => {
		impl ValueType for $type {
			fn load(store: &ValueStore) -> Option<Self> {
				match store {
					ValueStore::$store(v) => Some(*v),
					_ => None,
				}
			}

			fn store(self) -> ValueStore {
				ValueStore::$store(self)
			}
		}

		impl From<$type> for Value {
			fn from(value: $type) -> Self {
				Value {
					store: ValueStore::$store(value),
				}
			}
		}
	};
}

impl_value_type_deref!(bool, Bool);
impl_value_type_clone!(Array<bool>, BoolArray);

impl_value_type_deref!(i32, Int);
impl_value_type_clone!(Array<i32>, IntArray);

impl_value_type_deref!(f16, Half);
impl_value_type_clone!(Array<f16>, HalfArray);
impl_value_type_deref!(f32, Float);
impl_value_type_clone!(Array<f32>, FloatArray);
impl_value_type_deref!(f64, Double);
impl_value_type_clone!(Array<f64>, DoubleArray);

impl_value_type_deref!(gf::Vec2f, Vec2f);
impl_value_type_clone!(Array<gf::Vec2f>, Vec2fArray);
impl_value_type_deref!(gf::Vec3f, Vec3f);
impl_value_type_clone!(Array<gf::Vec3f>, Vec3fArray);
impl_value_type_deref!(gf::Vec3d, Vec3d);
impl_value_type_clone!(Array<gf::Vec3d>, Vec3dArray);

impl_value_type_deref!(gf::Matrix4d, Matrix4d);

impl_value_type_clone!(tf::Token, Token);
impl_value_type_clone!(Array<tf::Token>, TokenArray);

impl_value_type_clone!(String, String);
impl_value_type_clone!(Array<String>, StringArray);

impl_value_type_clone!(PrimPath, Path);
impl_value_type_clone!(Array<PrimPath>, PathArray);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn round_trip() {
		let v = Value::new(3.5f64);
		assert_eq!(v.get::<f64>(), Some(3.5));
		assert_eq!(v.get::<f32>(), None);
	}

	#[test]
	fn empty_yields_nothing() {
		let v = Value::empty();
		assert!(v.is_empty());
		assert_eq!(v.get::<bool>(), None);
	}

	#[test]
	fn token_array() {
		let v = Value::new(vec![tf::Token::new("a"), tf::Token::new("b")]);
		assert_eq!(v.get::<Array<tf::Token>>().unwrap().len(), 2);
	}
}
