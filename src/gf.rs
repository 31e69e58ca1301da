//! Graphics Foundations

use glam::DMat4;
use half::f16;

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec2<T> {
	pub x: T,
	pub y: T,
}

impl<T> Vec2<T> {
	pub fn new(x: T, y: T) -> Self {
		Self { x, y }
	}
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec3<T> {
	pub x: T,
	pub y: T,
	pub z: T,
}

impl<T> Vec3<T> {
	pub fn new(x: T, y: T, z: T) -> Self {
		Self { x, y, z }
	}
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vec4<T> {
	pub x: T,
	pub y: T,
	pub z: T,
	pub w: T,
}

impl<T> Vec4<T> {
	pub fn new(x: T, y: T, z: T, w: T) -> Self {
		Self { x, y, z, w }
	}
}

pub type Vec2h = Vec2<f16>;
pub type Vec2f = Vec2<f32>;
pub type Vec2d = Vec2<f64>;
pub type Vec2i = Vec2<i32>;

pub type Vec3h = Vec3<f16>;
pub type Vec3f = Vec3<f32>;
pub type Vec3d = Vec3<f64>;
pub type Vec3i = Vec3<i32>;

pub type Vec4h = Vec4<f16>;
pub type Vec4f = Vec4<f32>;
pub type Vec4d = Vec4<f64>;
pub type Vec4i = Vec4<i32>;

impl From<Vec3h> for Vec3d {
	fn from(v: Vec3h) -> Self {
		Self {
			x: v.x.into(),
			y: v.y.into(),
			z: v.z.into(),
		}
	}
}

impl From<Vec3f> for Vec3d {
	fn from(v: Vec3f) -> Self {
		Self {
			x: v.x.into(),
			y: v.y.into(),
			z: v.z.into(),
		}
	}
}

/// Row-major 4x4 double matrix, row-vector convention: `v' = v * M`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix4d {
	pub data: [[f64; 4]; 4],
}

impl Matrix4d {
	pub const IDENTITY: Self = Self {
		data: [
			[1.0, 0.0, 0.0, 0.0],
			[0.0, 1.0, 0.0, 0.0],
			[0.0, 0.0, 1.0, 0.0],
			[0.0, 0.0, 0.0, 1.0],
		],
	};

	pub fn from_diagonal(diagonal: Vec4d) -> Self {
		Self {
			data: [
				[diagonal.x, 0.0, 0.0, 0.0],
				[0.0, diagonal.y, 0.0, 0.0],
				[0.0, 0.0, diagonal.z, 0.0],
				[0.0, 0.0, 0.0, diagonal.w],
			],
		}
	}

	pub fn from_translation(translation: Vec3d) -> Self {
		let mut m = Self::IDENTITY;
		m.data[3][0] = translation.x;
		m.data[3][1] = translation.y;
		m.data[3][2] = translation.z;
		m
	}

	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Returns `self * rhs` in row-vector convention, so that `rhs` is
	/// applied after `self`.
	pub fn post_mult(&self, rhs: &Matrix4d) -> Matrix4d {
		// glam is column-major: loading row-major data yields the transpose,
		// and (rhs^T * self^T) = (self * rhs)^T reads back out as row-major.
		let a = DMat4::from_cols_array_2d(&self.data);
		let b = DMat4::from_cols_array_2d(&rhs.data);
		Matrix4d {
			data: (b * a).to_cols_array_2d(),
		}
	}

	/// Returns `lhs * self` in row-vector convention.
	pub fn pre_mult(&self, lhs: &Matrix4d) -> Matrix4d {
		lhs.post_mult(self)
	}
}

impl Default for Matrix4d {
	fn default() -> Self {
		Self::IDENTITY
	}
}
