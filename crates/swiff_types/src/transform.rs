//! Affine and color transforms, and their composition along a nesting chain.
//!
//! # Composition order
//!
//! Geometry: `absolute = parent.absolute * local`, so the local matrix maps
//! character space into the parent's space first and the parent's absolute
//! matrix takes it the rest of the way to the stage.
//!
//! Color: a child's own color transform is applied first and the ancestor's
//! composed transform afterwards. Chaining `A` then `B` yields
//!
//! ```text
//! C.multiply = A.multiply * B.multiply
//! C.add      = A.add * B.multiply + B.add
//! ```
//!
//! Swapping the operands gives different results once two non-trivial
//! transforms are nested.

use kurbo::Affine;
use serde::{Deserialize, Serialize};

use crate::codec::{BitReader, BitWriter, count_fb_bits, count_sb_bits};
use crate::error::TagError;
use crate::types::Color;

/// Placement matrix as stored in the file
///
/// Scale and skew terms are 16.16 fixed point; translation is in twips.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
	/// Horizontal scale
	pub scale_x: f64,
	/// Vertical scale
	pub scale_y: f64,
	/// Skew term feeding x into y
	pub rotate_skew0: f64,
	/// Skew term feeding y into x
	pub rotate_skew1: f64,
	/// Horizontal translation in twips
	pub translate_x: i32,
	/// Vertical translation in twips
	pub translate_y: i32,
}

impl Default for Matrix {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Matrix {
	/// The identity matrix
	pub const IDENTITY: Self = Self {
		scale_x: 1.0,
		scale_y: 1.0,
		rotate_skew0: 0.0,
		rotate_skew1: 0.0,
		translate_x: 0,
		translate_y: 0,
	};

	/// Pure translation in twips
	pub fn translate(x: i32, y: i32) -> Self {
		Self {
			translate_x: x,
			translate_y: y,
			..Self::IDENTITY
		}
	}

	/// Pure scale
	pub fn scale(x: f64, y: f64) -> Self {
		Self {
			scale_x: x,
			scale_y: y,
			..Self::IDENTITY
		}
	}

	/// Reads a packed `MATRIX` record.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		reader.align();
		let mut matrix = Self::IDENTITY;

		if reader.read_bit()? {
			let num_bits = reader.read_ub(5)?;
			matrix.scale_x = reader.read_fb(num_bits)?;
			matrix.scale_y = reader.read_fb(num_bits)?;
		}

		if reader.read_bit()? {
			let num_bits = reader.read_ub(5)?;
			matrix.rotate_skew0 = reader.read_fb(num_bits)?;
			matrix.rotate_skew1 = reader.read_fb(num_bits)?;
		}

		let num_bits = reader.read_ub(5)?;
		matrix.translate_x = reader.read_sb(num_bits)?;
		matrix.translate_y = reader.read_sb(num_bits)?;
		Ok(matrix)
	}

	/// Writes a packed `MATRIX` record, omitting identity parts.
	pub fn write(&self, writer: &mut BitWriter) {
		writer.align();

		let has_scale = self.scale_x != 1.0 || self.scale_y != 1.0;
		writer.write_bit(has_scale);
		if has_scale {
			let num_bits = count_fb_bits(self.scale_x).max(count_fb_bits(self.scale_y));
			writer.write_ub(num_bits, 5);
			writer.write_fb(self.scale_x, num_bits);
			writer.write_fb(self.scale_y, num_bits);
		}

		let has_rotate = self.rotate_skew0 != 0.0 || self.rotate_skew1 != 0.0;
		writer.write_bit(has_rotate);
		if has_rotate {
			let num_bits = count_fb_bits(self.rotate_skew0).max(count_fb_bits(self.rotate_skew1));
			writer.write_ub(num_bits, 5);
			writer.write_fb(self.rotate_skew0, num_bits);
			writer.write_fb(self.rotate_skew1, num_bits);
		}

		let num_bits = count_sb_bits(self.translate_x).max(count_sb_bits(self.translate_y));
		writer.write_ub(num_bits, 5);
		writer.write_sb(self.translate_x, num_bits);
		writer.write_sb(self.translate_y, num_bits);
	}

	/// Converts to an affine transform in twip space.
	pub fn to_affine(&self) -> Affine {
		Affine::new([
			self.scale_x,
			self.rotate_skew0,
			self.rotate_skew1,
			self.scale_y,
			f64::from(self.translate_x),
			f64::from(self.translate_y),
		])
	}

	/// Component-wise interpolation used by morph shapes.
	pub fn lerp(&self, other: &Self, t: f64) -> Self {
		let mix = |a: f64, b: f64| a + (b - a) * t;
		let mix_twips = |a: i32, b: i32| mix(f64::from(a), f64::from(b)).round() as i32;
		Self {
			scale_x: mix(self.scale_x, other.scale_x),
			scale_y: mix(self.scale_y, other.scale_y),
			rotate_skew0: mix(self.rotate_skew0, other.rotate_skew0),
			rotate_skew1: mix(self.rotate_skew1, other.rotate_skew1),
			translate_x: mix_twips(self.translate_x, other.translate_x),
			translate_y: mix_twips(self.translate_y, other.translate_y),
		}
	}
}

/// Per-channel color adjustment: `out = in * multiply + add`
///
/// Channels are normalized to `0.0..=1.0`; `add` terms are stored in the same
/// scale (the file's `-255..=255` range divided by 255).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTransform {
	/// Red multiplier
	pub red_multiply: f32,
	/// Green multiplier
	pub green_multiply: f32,
	/// Blue multiplier
	pub blue_multiply: f32,
	/// Alpha multiplier
	pub alpha_multiply: f32,
	/// Red offset
	pub red_add: f32,
	/// Green offset
	pub green_add: f32,
	/// Blue offset
	pub blue_add: f32,
	/// Alpha offset
	pub alpha_add: f32,
}

impl Default for ColorTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ColorTransform {
	/// Multiply by one, add zero
	pub const IDENTITY: Self = Self {
		red_multiply: 1.0,
		green_multiply: 1.0,
		blue_multiply: 1.0,
		alpha_multiply: 1.0,
		red_add: 0.0,
		green_add: 0.0,
		blue_add: 0.0,
		alpha_add: 0.0,
	};

	/// Creates a transform from multiply and add terms in RGBA order.
	pub fn new(multiply: [f32; 4], add: [f32; 4]) -> Self {
		Self {
			red_multiply: multiply[0],
			green_multiply: multiply[1],
			blue_multiply: multiply[2],
			alpha_multiply: multiply[3],
			red_add: add[0],
			green_add: add[1],
			blue_add: add[2],
			alpha_add: add[3],
		}
	}

	/// Multiply terms in RGBA order
	pub fn multiply(&self) -> [f32; 4] {
		[self.red_multiply, self.green_multiply, self.blue_multiply, self.alpha_multiply]
	}

	/// Add terms in RGBA order
	pub fn add(&self) -> [f32; 4] {
		[self.red_add, self.green_add, self.blue_add, self.alpha_add]
	}

	/// Reads a `CXFORM` (no alpha) or `CXFORMWITHALPHA` record.
	pub fn from_reader(reader: &mut BitReader<'_>, with_alpha: bool) -> Result<Self, TagError> {
		reader.align();
		let has_add = reader.read_bit()?;
		let has_multiply = reader.read_bit()?;
		let num_bits = reader.read_ub(4)?;
		let channels = if with_alpha {
			4
		} else {
			3
		};

		let mut multiply = [1.0f32; 4];
		let mut add = [0.0f32; 4];
		if has_multiply {
			for value in multiply.iter_mut().take(channels) {
				*value = reader.read_sb(num_bits)? as f32 / 256.0;
			}
		}
		if has_add {
			for value in add.iter_mut().take(channels) {
				*value = reader.read_sb(num_bits)? as f32 / 255.0;
			}
		}
		Ok(Self::new(multiply, add))
	}

	/// Writes a `CXFORM` or `CXFORMWITHALPHA` record.
	pub fn write(&self, writer: &mut BitWriter, with_alpha: bool) {
		let channels = if with_alpha {
			4
		} else {
			3
		};
		let multiply: Vec<i32> =
			self.multiply()[..channels].iter().map(|m| (m * 256.0).round() as i32).collect();
		let add: Vec<i32> =
			self.add()[..channels].iter().map(|a| (a * 255.0).round() as i32).collect();
		let has_multiply = multiply.iter().any(|&m| m != 256);
		let has_add = add.iter().any(|&a| a != 0);

		let mut num_bits = 0;
		if has_multiply {
			num_bits = multiply.iter().map(|&m| count_sb_bits(m)).fold(num_bits, u32::max);
		}
		if has_add {
			num_bits = add.iter().map(|&a| count_sb_bits(a)).fold(num_bits, u32::max);
		}

		writer.align();
		writer.write_bit(has_add);
		writer.write_bit(has_multiply);
		writer.write_ub(num_bits, 4);
		if has_multiply {
			multiply.iter().for_each(|&m| writer.write_sb(m, num_bits));
		}
		if has_add {
			add.iter().for_each(|&a| writer.write_sb(a, num_bits));
		}
		writer.align();
	}

	/// Returns `true` if applying this transform changes nothing.
	pub fn is_identity(&self) -> bool {
		*self == Self::IDENTITY
	}

	/// Chains `self` then `next` into one transform.
	///
	/// The result applied once equals applying `self` and then `next`.
	pub fn then(&self, next: &Self) -> Self {
		let a_mul = self.multiply();
		let a_add = self.add();
		let b_mul = next.multiply();
		let b_add = next.add();
		Self::new(
			std::array::from_fn(|i| a_mul[i] * b_mul[i]),
			std::array::from_fn(|i| a_add[i] * b_mul[i] + b_add[i]),
		)
	}

	/// Applies to normalized channels without clamping.
	pub fn apply_channels(&self, channels: [f32; 4]) -> [f32; 4] {
		let multiply = self.multiply();
		let add = self.add();
		std::array::from_fn(|i| channels[i] * multiply[i] + add[i])
	}

	/// Applies to a color, clamping to the valid range.
	pub fn apply(&self, color: Color) -> Color {
		Color::from_normalized(self.apply_channels(color.to_normalized()))
	}

	/// Component-wise interpolation.
	pub fn lerp(&self, other: &Self, t: f32) -> Self {
		let (am, aa, bm, ba) = (self.multiply(), self.add(), other.multiply(), other.add());
		Self::new(
			std::array::from_fn(|i| am[i] + (bm[i] - am[i]) * t),
			std::array::from_fn(|i| aa[i] + (ba[i] - aa[i]) * t),
		)
	}
}

/// Absolute geometry and color state of one node in the nesting chain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
	/// Character space to stage space, in twips
	pub matrix: Affine,
	/// Composed color transform
	pub color: ColorTransform,
}

impl Default for Transform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl Transform {
	/// The root of every nesting chain
	pub const IDENTITY: Self = Self {
		matrix: Affine::IDENTITY,
		color: ColorTransform::IDENTITY,
	};

	/// Composes a child placement under this (parent) transform.
	pub fn nest(&self, local_matrix: &Matrix, local_color: &ColorTransform) -> Self {
		Self {
			matrix: self.matrix * local_matrix.to_affine(),
			color: local_color.then(&self.color),
		}
	}
}
