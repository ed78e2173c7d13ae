//! Basic value records: rectangles and colors.

use serde::{Deserialize, Serialize};

use crate::codec::{BitReader, BitWriter, count_sb_bits};
use crate::error::TagError;

/// Twips per pixel
pub const TWIPS_PER_PIXEL: f64 = 20.0;

/// Axis-aligned rectangle in twips
///
/// Encoded as a 5-bit field width followed by four signed fields of that
/// width in the order `x_min`, `x_max`, `y_min`, `y_max`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
	/// Left edge
	pub x_min: i32,
	/// Right edge
	pub x_max: i32,
	/// Top edge
	pub y_min: i32,
	/// Bottom edge
	pub y_max: i32,
}

impl Rect {
	/// Creates a rectangle from its edges in twips.
	pub fn new(x_min: i32, x_max: i32, y_min: i32, y_max: i32) -> Self {
		Self {
			x_min,
			x_max,
			y_min,
			y_max,
		}
	}

	/// Reads a packed rectangle.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		reader.align();
		let num_bits = reader.read_ub(5)?;
		Ok(Self {
			x_min: reader.read_sb(num_bits)?,
			x_max: reader.read_sb(num_bits)?,
			y_min: reader.read_sb(num_bits)?,
			y_max: reader.read_sb(num_bits)?,
		})
	}

	/// Writes the rectangle with the smallest field width that holds it.
	pub fn write(&self, writer: &mut BitWriter) {
		writer.align();
		let num_bits = [self.x_min, self.x_max, self.y_min, self.y_max]
			.into_iter()
			.map(count_sb_bits)
			.max()
			.unwrap_or(0);
		writer.write_ub(num_bits, 5);
		writer.write_sb(self.x_min, num_bits);
		writer.write_sb(self.x_max, num_bits);
		writer.write_sb(self.y_min, num_bits);
		writer.write_sb(self.y_max, num_bits);
	}

	/// Width in twips
	pub fn width(&self) -> i32 {
		self.x_max - self.x_min
	}

	/// Height in twips
	pub fn height(&self) -> i32 {
		self.y_max - self.y_min
	}

	/// Converts to a pixel-space rectangle.
	pub fn to_pixels(&self) -> kurbo::Rect {
		kurbo::Rect::new(
			f64::from(self.x_min) / TWIPS_PER_PIXEL,
			f64::from(self.y_min) / TWIPS_PER_PIXEL,
			f64::from(self.x_max) / TWIPS_PER_PIXEL,
			f64::from(self.y_max) / TWIPS_PER_PIXEL,
		)
	}
}

/// 8-bit RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
	/// Red channel
	pub r: u8,
	/// Green channel
	pub g: u8,
	/// Blue channel
	pub b: u8,
	/// Alpha channel, 255 is opaque
	pub a: u8,
}

impl Default for Color {
	fn default() -> Self {
		Self::BLACK
	}
}

impl Color {
	/// Opaque black
	pub const BLACK: Self = Self::rgb(0, 0, 0);

	/// Opaque white
	pub const WHITE: Self = Self::rgb(255, 255, 255);

	/// Fully transparent black
	pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

	/// Creates an opaque color.
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self::rgba(r, g, b, 255)
	}

	/// Creates a color with alpha.
	pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
		Self {
			r,
			g,
			b,
			a,
		}
	}

	/// Reads a 3-byte `RGB` record; alpha is opaque.
	pub fn from_rgb(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let bytes = reader.read_bytes(3)?;
		Ok(Self::rgb(bytes[0], bytes[1], bytes[2]))
	}

	/// Reads a 4-byte `RGBA` record.
	pub fn from_rgba(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let bytes = reader.read_bytes(4)?;
		Ok(Self::rgba(bytes[0], bytes[1], bytes[2], bytes[3]))
	}

	/// Reads `RGBA` when `with_alpha` is set, `RGB` otherwise.
	pub fn from_reader(reader: &mut BitReader<'_>, with_alpha: bool) -> Result<Self, TagError> {
		if with_alpha {
			Self::from_rgba(reader)
		} else {
			Self::from_rgb(reader)
		}
	}

	/// Writes `RGBA` when `with_alpha` is set, `RGB` otherwise.
	pub fn write(&self, writer: &mut BitWriter, with_alpha: bool) {
		writer.write_bytes(&[self.r, self.g, self.b]);
		if with_alpha {
			writer.write_u8(self.a);
		}
	}

	/// Channels scaled to `0.0..=1.0`
	pub fn to_normalized(self) -> [f32; 4] {
		[self.r, self.g, self.b, self.a].map(|c| f32::from(c) / 255.0)
	}

	/// Builds a color from normalized channels, clamping out-of-range values.
	pub fn from_normalized(channels: [f32; 4]) -> Self {
		let [r, g, b, a] = channels.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
		Self::rgba(r, g, b, a)
	}

	/// Linear interpolation between `self` (at 0) and `other` (at 1).
	pub fn lerp(self, other: Self, t: f32) -> Self {
		let a = self.to_normalized();
		let b = other.to_normalized();
		Self::from_normalized(std::array::from_fn(|i| a[i] + (b[i] - a[i]) * t))
	}
}

/// One stop of a gradient ramp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GradientRecord {
	/// Position along the ramp, 0 to 255
	pub ratio: u8,
	/// Color at this stop
	pub color: Color,
}

impl GradientRecord {
	/// Reads a ratio byte followed by an `RGB` or `RGBA` color.
	pub fn from_reader(reader: &mut BitReader<'_>, with_alpha: bool) -> Result<Self, TagError> {
		Ok(Self {
			ratio: reader.read_u8()?,
			color: Color::from_reader(reader, with_alpha)?,
		})
	}

	/// Writes the stop.
	pub fn write(&self, writer: &mut BitWriter, with_alpha: bool) {
		writer.write_u8(self.ratio);
		self.color.write(writer, with_alpha);
	}
}
