//! Display filters and blend modes.
//!
//! # Filter list
//!
//! ```text
//! UI8     count
//! repeat count times:
//!   UI8   kind      0 DropShadow, 1 Blur, 2 Glow, 3 Bevel,
//!                   4 GradientGlow, 5 Convolution, 6 ColorMatrix,
//!                   7 GradientBevel
//!   ...   fields of that kind
//! ```
//!
//! The kind byte indexes [`FILTER_DECODERS`] directly. Filters in a list are
//! applied in order, each one consuming the previous one's output, and the
//! result is composited into the parent with the placement's [`BlendMode`].

use serde::{Deserialize, Serialize};

use crate::codec::{BitReader, BitWriter};
use crate::error::TagError;
use crate::types::{Color, GradientRecord};

/// Gaussian-style blur
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BlurFilter {
	/// Horizontal blur radius
	pub blur_x: f64,
	/// Vertical blur radius
	pub blur_y: f64,
	/// Number of box-blur passes, normally 1 to 3
	pub passes: u8,
}

/// 4x5 color matrix applied to `(R, G, B, A, 1)`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorMatrixFilter {
	/// Row-major coefficients; the fifth column is an offset in `0..=255` units
	pub matrix: [f32; 20],
}

impl ColorMatrixFilter {
	/// The matrix that leaves every color unchanged
	pub const IDENTITY: Self = Self {
		matrix: [
			1.0, 0.0, 0.0, 0.0, 0.0, //
			0.0, 1.0, 0.0, 0.0, 0.0, //
			0.0, 0.0, 1.0, 0.0, 0.0, //
			0.0, 0.0, 0.0, 1.0, 0.0,
		],
	};

	/// Applies the matrix to normalized RGBA channels.
	pub fn apply_channels(&self, channels: [f32; 4]) -> [f32; 4] {
		std::array::from_fn(|row| {
			let coefficients = &self.matrix[row * 5..row * 5 + 5];
			let linear: f32 = coefficients[..4].iter().zip(channels).map(|(m, c)| m * c).sum();
			linear + coefficients[4] / 255.0
		})
	}

	/// Applies the matrix to a color, clamping the result.
	pub fn apply(&self, color: Color) -> Color {
		Color::from_normalized(self.apply_channels(color.to_normalized()))
	}
}

/// Convolution kernel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvolutionFilter {
	/// Kernel columns
	pub width: u8,
	/// Kernel rows
	pub height: u8,
	/// Row-major kernel, `width * height` entries
	pub kernel: Vec<f32>,
	/// Divisor applied to the weighted sum
	pub divisor: f32,
	/// Bias added after division
	pub bias: f32,
	/// Color used for pixels outside the source
	pub default_color: Color,
	/// Clamp edge pixels instead of using the default color
	pub clamp: bool,
	/// Leave the alpha channel untouched
	pub preserve_alpha: bool,
}

/// Drop shadow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DropShadowFilter {
	/// Shadow color
	pub color: Color,
	/// Horizontal blur radius
	pub blur_x: f64,
	/// Vertical blur radius
	pub blur_y: f64,
	/// Direction in radians
	pub angle: f64,
	/// Offset distance in pixels
	pub distance: f64,
	/// Shadow strength
	pub strength: f32,
	/// Shadow falls inside the shape
	pub inner: bool,
	/// Hide the source, keep only the shadow
	pub knockout: bool,
	/// Composite the source over the shadow
	pub composite_source: bool,
	/// Blur passes
	pub passes: u8,
}

/// Glow around or inside the shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GlowFilter {
	/// Glow color
	pub color: Color,
	/// Horizontal blur radius
	pub blur_x: f64,
	/// Vertical blur radius
	pub blur_y: f64,
	/// Glow strength
	pub strength: f32,
	/// Glow falls inside the shape
	pub inner: bool,
	/// Hide the source, keep only the glow
	pub knockout: bool,
	/// Composite the source over the glow
	pub composite_source: bool,
	/// Blur passes
	pub passes: u8,
}

/// Bevel with shadow and highlight colors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BevelFilter {
	/// Color of the shadowed edge
	pub shadow_color: Color,
	/// Color of the lit edge
	pub highlight_color: Color,
	/// Horizontal blur radius
	pub blur_x: f64,
	/// Vertical blur radius
	pub blur_y: f64,
	/// Light direction in radians
	pub angle: f64,
	/// Bevel distance in pixels
	pub distance: f64,
	/// Bevel strength
	pub strength: f32,
	/// Bevel is drawn inside the shape
	pub inner: bool,
	/// Hide the source
	pub knockout: bool,
	/// Composite the source under the effect
	pub composite_source: bool,
	/// Draw the bevel above the source
	pub on_top: bool,
	/// Blur passes
	pub passes: u8,
}

/// Glow or bevel whose color comes from a gradient ramp
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientFilter {
	/// Color stops
	pub gradient: Vec<GradientRecord>,
	/// Horizontal blur radius
	pub blur_x: f64,
	/// Vertical blur radius
	pub blur_y: f64,
	/// Direction in radians
	pub angle: f64,
	/// Offset distance in pixels
	pub distance: f64,
	/// Effect strength
	pub strength: f32,
	/// Effect is drawn inside the shape
	pub inner: bool,
	/// Hide the source
	pub knockout: bool,
	/// Composite the source with the effect
	pub composite_source: bool,
	/// Draw the effect above the source
	pub on_top: bool,
	/// Blur passes
	pub passes: u8,
}

/// One entry of a filter chain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Filter {
	/// Kind 0
	DropShadow(DropShadowFilter),
	/// Kind 1
	Blur(BlurFilter),
	/// Kind 2
	Glow(GlowFilter),
	/// Kind 3
	Bevel(BevelFilter),
	/// Kind 4
	GradientGlow(GradientFilter),
	/// Kind 5
	Convolution(ConvolutionFilter),
	/// Kind 6
	ColorMatrix(ColorMatrixFilter),
	/// Kind 7
	GradientBevel(GradientFilter),
}

type FilterDecoder = fn(&mut BitReader<'_>) -> Result<Filter, TagError>;

/// Payload decoders indexed by the kind byte
pub const FILTER_DECODERS: [FilterDecoder; 8] = [
	decode_drop_shadow,
	decode_blur,
	decode_glow,
	decode_bevel,
	decode_gradient_glow,
	decode_convolution,
	decode_color_matrix,
	decode_gradient_bevel,
];

fn decode_drop_shadow(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	Ok(Filter::DropShadow(DropShadowFilter {
		color: Color::from_rgba(r)?,
		blur_x: r.read_fixed16()?,
		blur_y: r.read_fixed16()?,
		angle: r.read_fixed16()?,
		distance: r.read_fixed16()?,
		strength: r.read_fixed8()?,
		inner: r.read_bit()?,
		knockout: r.read_bit()?,
		composite_source: r.read_bit()?,
		passes: r.read_ub(5)? as u8,
	}))
}

fn decode_blur(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	let blur_x = r.read_fixed16()?;
	let blur_y = r.read_fixed16()?;
	let passes = r.read_ub(5)? as u8;
	r.read_ub(3)?;
	Ok(Filter::Blur(BlurFilter {
		blur_x,
		blur_y,
		passes,
	}))
}

fn decode_glow(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	Ok(Filter::Glow(GlowFilter {
		color: Color::from_rgba(r)?,
		blur_x: r.read_fixed16()?,
		blur_y: r.read_fixed16()?,
		strength: r.read_fixed8()?,
		inner: r.read_bit()?,
		knockout: r.read_bit()?,
		composite_source: r.read_bit()?,
		passes: r.read_ub(5)? as u8,
	}))
}

fn decode_bevel(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	Ok(Filter::Bevel(BevelFilter {
		shadow_color: Color::from_rgba(r)?,
		highlight_color: Color::from_rgba(r)?,
		blur_x: r.read_fixed16()?,
		blur_y: r.read_fixed16()?,
		angle: r.read_fixed16()?,
		distance: r.read_fixed16()?,
		strength: r.read_fixed8()?,
		inner: r.read_bit()?,
		knockout: r.read_bit()?,
		composite_source: r.read_bit()?,
		on_top: r.read_bit()?,
		passes: r.read_ub(4)? as u8,
	}))
}

fn decode_gradient_glow(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	decode_gradient(r).map(Filter::GradientGlow)
}

fn decode_gradient_bevel(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	decode_gradient(r).map(Filter::GradientBevel)
}

fn decode_gradient(r: &mut BitReader<'_>) -> Result<GradientFilter, TagError> {
	let count = usize::from(r.read_u8()?);
	let colors = (0..count).map(|_| Color::from_rgba(r)).collect::<Result<Vec<_>, _>>()?;
	let ratios = r.read_bytes(count)?;
	let gradient = colors
		.into_iter()
		.zip(ratios)
		.map(|(color, &ratio)| GradientRecord {
			ratio,
			color,
		})
		.collect();

	Ok(GradientFilter {
		gradient,
		blur_x: r.read_fixed16()?,
		blur_y: r.read_fixed16()?,
		angle: r.read_fixed16()?,
		distance: r.read_fixed16()?,
		strength: r.read_fixed8()?,
		inner: r.read_bit()?,
		knockout: r.read_bit()?,
		composite_source: r.read_bit()?,
		on_top: r.read_bit()?,
		passes: r.read_ub(4)? as u8,
	})
}

fn decode_convolution(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	let width = r.read_u8()?;
	let height = r.read_u8()?;
	let divisor = r.read_f32()?;
	let bias = r.read_f32()?;
	let kernel = (0..usize::from(width) * usize::from(height))
		.map(|_| r.read_f32())
		.collect::<Result<Vec<_>, _>>()?;
	let default_color = Color::from_rgba(r)?;
	r.read_ub(6)?;
	Ok(Filter::Convolution(ConvolutionFilter {
		width,
		height,
		kernel,
		divisor,
		bias,
		default_color,
		clamp: r.read_bit()?,
		preserve_alpha: r.read_bit()?,
	}))
}

fn decode_color_matrix(r: &mut BitReader<'_>) -> Result<Filter, TagError> {
	let mut matrix = [0.0f32; 20];
	for value in &mut matrix {
		*value = r.read_f32()?;
	}
	Ok(Filter::ColorMatrix(ColorMatrixFilter {
		matrix,
	}))
}

impl Filter {
	/// Kind byte as stored in a filter list
	pub fn kind_id(&self) -> u8 {
		match self {
			Filter::DropShadow(_) => 0,
			Filter::Blur(_) => 1,
			Filter::Glow(_) => 2,
			Filter::Bevel(_) => 3,
			Filter::GradientGlow(_) => 4,
			Filter::Convolution(_) => 5,
			Filter::ColorMatrix(_) => 6,
			Filter::GradientBevel(_) => 7,
		}
	}

	/// Reads one kind byte and its payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let kind = reader.read_u8()?;
		let decode = FILTER_DECODERS.get(usize::from(kind)).ok_or(TagError::UnknownFilter(kind))?;
		let filter = decode(reader)?;
		reader.align();
		Ok(filter)
	}

	/// Writes the kind byte and payload.
	pub fn write(&self, w: &mut BitWriter) {
		w.write_u8(self.kind_id());
		match self {
			Filter::DropShadow(f) => {
				f.color.write(w, true);
				for v in [f.blur_x, f.blur_y, f.angle, f.distance] {
					w.write_fixed16(v);
				}
				w.write_fixed8(f.strength);
				write_flags(w, &[f.inner, f.knockout, f.composite_source]);
				w.write_ub(u32::from(f.passes), 5);
			}
			Filter::Blur(f) => {
				w.write_fixed16(f.blur_x);
				w.write_fixed16(f.blur_y);
				w.write_ub(u32::from(f.passes), 5);
				w.write_ub(0, 3);
			}
			Filter::Glow(f) => {
				f.color.write(w, true);
				w.write_fixed16(f.blur_x);
				w.write_fixed16(f.blur_y);
				w.write_fixed8(f.strength);
				write_flags(w, &[f.inner, f.knockout, f.composite_source]);
				w.write_ub(u32::from(f.passes), 5);
			}
			Filter::Bevel(f) => {
				f.shadow_color.write(w, true);
				f.highlight_color.write(w, true);
				for v in [f.blur_x, f.blur_y, f.angle, f.distance] {
					w.write_fixed16(v);
				}
				w.write_fixed8(f.strength);
				write_flags(w, &[f.inner, f.knockout, f.composite_source, f.on_top]);
				w.write_ub(u32::from(f.passes), 4);
			}
			Filter::GradientGlow(f) | Filter::GradientBevel(f) => {
				w.write_u8(f.gradient.len() as u8);
				f.gradient.iter().for_each(|g| g.color.write(w, true));
				f.gradient.iter().for_each(|g| w.write_u8(g.ratio));
				for v in [f.blur_x, f.blur_y, f.angle, f.distance] {
					w.write_fixed16(v);
				}
				w.write_fixed8(f.strength);
				write_flags(w, &[f.inner, f.knockout, f.composite_source, f.on_top]);
				w.write_ub(u32::from(f.passes), 4);
			}
			Filter::Convolution(f) => {
				w.write_u8(f.width);
				w.write_u8(f.height);
				w.write_f32(f.divisor);
				w.write_f32(f.bias);
				f.kernel.iter().for_each(|&k| w.write_f32(k));
				f.default_color.write(w, true);
				w.write_ub(0, 6);
				write_flags(w, &[f.clamp, f.preserve_alpha]);
			}
			Filter::ColorMatrix(f) => f.matrix.iter().for_each(|&m| w.write_f32(m)),
		}
		w.align();
	}
}

fn write_flags(w: &mut BitWriter, flags: &[bool]) {
	flags.iter().for_each(|&flag| w.write_bit(flag));
}

/// Reads a `FILTERLIST`.
pub fn read_filter_list(reader: &mut BitReader<'_>) -> Result<Vec<Filter>, TagError> {
	let count = reader.read_u8()?;
	(0..count).map(|_| Filter::from_reader(reader)).collect()
}

/// Writes a `FILTERLIST`.
pub fn write_filter_list(writer: &mut BitWriter, filters: &[Filter]) {
	writer.write_u8(filters.len() as u8);
	filters.iter().for_each(|f| f.write(writer));
}

/// Compositing operator used when merging an item into its parent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum BlendMode {
	#[default]
	Normal,
	Layer,
	Multiply,
	Screen,
	Lighten,
	Darken,
	Difference,
	Add,
	Subtract,
	Invert,
	Alpha,
	Erase,
	Overlay,
	Hardlight,
	/// Any code outside `0..=14`; composites as [`BlendMode::Normal`]
	Other(u16),
}

impl BlendMode {
	/// Decodes a blend code. Never fails.
	pub fn from_code(code: u16) -> Self {
		match code {
			0 | 1 => Self::Normal,
			2 => Self::Layer,
			3 => Self::Multiply,
			4 => Self::Screen,
			5 => Self::Lighten,
			6 => Self::Darken,
			7 => Self::Difference,
			8 => Self::Add,
			9 => Self::Subtract,
			10 => Self::Invert,
			11 => Self::Alpha,
			12 => Self::Erase,
			13 => Self::Overlay,
			14 => Self::Hardlight,
			other => Self::Other(other),
		}
	}

	/// Code as stored in the file
	pub fn to_code(self) -> u16 {
		match self {
			Self::Normal => 0,
			Self::Layer => 2,
			Self::Multiply => 3,
			Self::Screen => 4,
			Self::Lighten => 5,
			Self::Darken => 6,
			Self::Difference => 7,
			Self::Add => 8,
			Self::Subtract => 9,
			Self::Invert => 10,
			Self::Alpha => 11,
			Self::Erase => 12,
			Self::Overlay => 13,
			Self::Hardlight => 14,
			Self::Other(code) => code,
		}
	}

	/// Operator a backend should actually use.
	pub fn compositing(self) -> Self {
		match self {
			Self::Other(_) => Self::Normal,
			mode => mode,
		}
	}

	/// Returns `true` if the item composites as plain source-over.
	pub fn is_normal(self) -> bool {
		self.compositing() == Self::Normal
	}
}
