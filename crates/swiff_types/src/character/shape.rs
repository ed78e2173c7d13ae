//! Shape definitions (`DefineShape` 1 to 4) and the shared shape record stream.
//!
//! # Versions
//!
//! | Version | Additions |
//! |---------|-----------|
//! | 1 | solid, gradient and bitmap fills; line width and color |
//! | 2 | more than 255 styles; new styles inside the record stream |
//! | 3 | alpha in every color |
//! | 4 | edge bounds, winding rule, focal gradients, caps, joins, filled strokes |
//!
//! # Record stream
//!
//! ```text
//! UB4  fill index bits
//! UB4  line index bits
//! records until an all-zero style change:
//!   UB1 0  style change: new styles, line, fill 1, fill 0, move flags
//!   UB1 1  edge: straight (general, vertical or horizontal) or curved
//! ```

use kurbo::{BezPath, Point};
use log::trace;

use crate::codec::BitReader;
use crate::error::TagError;
use crate::transform::Matrix;
use crate::types::{Color, GradientRecord, Rect};

/// Gradient spread mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GradientSpread {
	/// Extend the end colors
	#[default]
	Pad,
	/// Mirror the ramp
	Reflect,
	/// Repeat the ramp
	Repeat,
}

/// Gradient color interpolation space
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum GradientInterpolation {
	/// Interpolate in sRGB
	#[default]
	Rgb,
	/// Interpolate in linear RGB
	LinearRgb,
}

/// Gradient with its placement in the shape
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
	/// Maps the 32768-twip gradient square into shape space
	pub matrix: Matrix,
	/// Spread mode
	pub spread: GradientSpread,
	/// Interpolation mode
	pub interpolation: GradientInterpolation,
	/// Color stops
	pub records: Vec<GradientRecord>,
}

impl Gradient {
	fn from_reader(
		reader: &mut BitReader<'_>,
		matrix: Matrix,
		with_alpha: bool,
	) -> Result<Self, TagError> {
		let spread = match reader.read_ub(2)? {
			1 => GradientSpread::Reflect,
			2 => GradientSpread::Repeat,
			_ => GradientSpread::Pad,
		};
		let interpolation = match reader.read_ub(2)? {
			1 => GradientInterpolation::LinearRgb,
			_ => GradientInterpolation::Rgb,
		};
		let count = reader.read_ub(4)?;
		let records = (0..count)
			.map(|_| GradientRecord::from_reader(reader, with_alpha))
			.collect::<Result<_, _>>()?;
		Ok(Self {
			matrix,
			spread,
			interpolation,
			records,
		})
	}

	/// Interpolates stops and matrix; stop counts must match.
	pub fn lerp(&self, other: &Self, t: f32) -> Self {
		let records = self
			.records
			.iter()
			.zip(&other.records)
			.map(|(a, b)| GradientRecord {
				ratio: (f32::from(a.ratio) + (f32::from(b.ratio) - f32::from(a.ratio)) * t).round() as u8,
				color: a.color.lerp(b.color, t),
			})
			.collect();
		Self {
			matrix: self.matrix.lerp(&other.matrix, f64::from(t)),
			spread: self.spread,
			interpolation: self.interpolation,
			records,
		}
	}
}

/// How a region is filled
#[derive(Debug, Clone, PartialEq)]
pub enum FillStyle {
	/// Flat color
	Solid(Color),
	/// Linear gradient
	LinearGradient(Gradient),
	/// Radial gradient
	RadialGradient(Gradient),
	/// Radial gradient with a shifted focal point
	FocalGradient {
		/// Gradient ramp
		gradient: Gradient,
		/// Focal point, -1.0 to 1.0 along the x axis
		focal_point: f32,
	},
	/// Bitmap fill
	Bitmap {
		/// Bitmap character, `0xFFFF` for none
		id: u16,
		/// Maps bitmap pixels into shape space
		matrix: Matrix,
		/// Tile instead of clamping the edges
		repeating: bool,
		/// Smooth when scaling
		smoothed: bool,
	},
}

impl FillStyle {
	/// Interpolates between two fills of the same kind.
	///
	/// Mismatched kinds snap to whichever end is closer.
	pub fn lerp(&self, other: &Self, t: f32) -> Self {
		match (self, other) {
			(FillStyle::Solid(a), FillStyle::Solid(b)) => FillStyle::Solid(a.lerp(*b, t)),
			(FillStyle::LinearGradient(a), FillStyle::LinearGradient(b)) => {
				FillStyle::LinearGradient(a.lerp(b, t))
			}
			(FillStyle::RadialGradient(a), FillStyle::RadialGradient(b)) => {
				FillStyle::RadialGradient(a.lerp(b, t))
			}
			(
				FillStyle::FocalGradient {
					gradient: a,
					focal_point: fa,
				},
				FillStyle::FocalGradient {
					gradient: b,
					focal_point: fb,
				},
			) => FillStyle::FocalGradient {
				gradient: a.lerp(b, t),
				focal_point: fa + (fb - fa) * t,
			},
			(
				FillStyle::Bitmap {
					id,
					matrix: a,
					repeating,
					smoothed,
				},
				FillStyle::Bitmap {
					matrix: b,
					..
				},
			) => FillStyle::Bitmap {
				id: *id,
				matrix: a.lerp(b, f64::from(t)),
				repeating: *repeating,
				smoothed: *smoothed,
			},
			_ if t < 0.5 => self.clone(),
			_ => other.clone(),
		}
	}
}

/// Stroke cap
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LineCap {
	/// Rounded
	#[default]
	Round,
	/// No cap
	None,
	/// Squared off past the end point
	Square,
}

impl LineCap {
	fn from_bits(bits: u32) -> Self {
		match bits {
			1 => LineCap::None,
			2 => LineCap::Square,
			_ => LineCap::Round,
		}
	}
}

/// Stroke join
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum LineJoin {
	/// Rounded
	#[default]
	Round,
	/// Beveled
	Bevel,
	/// Mitered with the given limit factor
	Miter(f32),
}

/// How an edge is stroked
#[derive(Debug, Clone, PartialEq)]
pub struct LineStyle {
	/// Width in twips
	pub width: u16,
	/// Stroke color; ignored when `fill` is set
	pub color: Color,
	/// Cap at the start of each open path
	pub start_cap: LineCap,
	/// Cap at the end of each open path
	pub end_cap: LineCap,
	/// Corner join
	pub join: LineJoin,
	/// Fill used to paint the stroke
	pub fill: Option<FillStyle>,
	/// Keep the width when scaled horizontally
	pub no_h_scale: bool,
	/// Keep the width when scaled vertically
	pub no_v_scale: bool,
	/// Snap to whole pixels
	pub pixel_hinting: bool,
	/// Do not close paths automatically
	pub no_close: bool,
}

impl LineStyle {
	/// A plain stroke of the given width and color.
	pub fn new(width: u16, color: Color) -> Self {
		Self {
			width,
			color,
			start_cap: LineCap::Round,
			end_cap: LineCap::Round,
			join: LineJoin::Round,
			fill: None,
			no_h_scale: false,
			no_v_scale: false,
			pixel_hinting: false,
			no_close: false,
		}
	}
}

/// Fill and line style arrays
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShapeStyles {
	/// Fill styles, referenced 1-based by the records
	pub fill_styles: Vec<FillStyle>,
	/// Line styles, referenced 1-based by the records
	pub line_styles: Vec<LineStyle>,
}

/// Style change record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleChange {
	/// Absolute pen position after the move
	pub move_to: Option<(i32, i32)>,
	/// Fill to the left of the edges, 0 for none
	pub fill_style0: Option<u32>,
	/// Fill to the right of the edges, 0 for none
	pub fill_style1: Option<u32>,
	/// Stroke, 0 for none
	pub line_style: Option<u32>,
	/// Replacement style arrays
	pub new_styles: Option<ShapeStyles>,
}

/// One entry of the shape record stream; deltas are in twips
#[derive(Debug, Clone, PartialEq)]
pub enum ShapeRecord {
	/// Style and pen changes
	StyleChange(StyleChange),
	/// Straight edge
	StraightEdge {
		/// Horizontal delta
		dx: i32,
		/// Vertical delta
		dy: i32,
	},
	/// Quadratic curve
	CurvedEdge {
		/// Control point delta from the pen
		control_dx: i32,
		/// Control point delta from the pen
		control_dy: i32,
		/// Anchor delta from the control point
		anchor_dx: i32,
		/// Anchor delta from the control point
		anchor_dy: i32,
	},
}

impl ShapeRecord {
	/// Returns `true` for straight and curved edges.
	pub fn is_edge(&self) -> bool {
		!matches!(self, ShapeRecord::StyleChange(_))
	}
}

/// Decoding context for styles and records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ShapeContext {
	/// Shape version, 1 to 4; morph shapes use 3 or 4
	pub version: u8,
	/// Whether styles come in start/end pairs
	pub morph: bool,
}

impl ShapeContext {
	pub fn shape(version: u8) -> Self {
		Self {
			version,
			morph: false,
		}
	}

	fn with_alpha(self) -> bool {
		self.version >= 3 || self.morph
	}
}

fn read_style_count(reader: &mut BitReader<'_>, ctx: ShapeContext) -> Result<usize, TagError> {
	let count = reader.read_u8()?;
	if count == 0xFF && (ctx.version >= 2 || ctx.morph) {
		Ok(usize::from(reader.read_u16()?))
	} else {
		Ok(usize::from(count))
	}
}

/// Reads one fill style, or a start/end pair for morph shapes.
pub(crate) fn read_fill_style(
	reader: &mut BitReader<'_>,
	ctx: ShapeContext,
) -> Result<(FillStyle, FillStyle), TagError> {
	let fill_type = reader.read_u8()?;
	let with_alpha = ctx.with_alpha();
	match fill_type {
		0x00 => {
			let start = Color::from_reader(reader, with_alpha)?;
			let end = if ctx.morph {
				Color::from_rgba(reader)?
			} else {
				start
			};
			Ok((FillStyle::Solid(start), FillStyle::Solid(end)))
		}
		0x10 | 0x12 | 0x13 => {
			let start_matrix = Matrix::from_reader(reader)?;
			let (start, end) = if ctx.morph {
				let end_matrix = Matrix::from_reader(reader)?;
				read_morph_gradient(reader, start_matrix, end_matrix)?
			} else {
				let gradient = Gradient::from_reader(reader, start_matrix, with_alpha)?;
				(gradient.clone(), gradient)
			};
			Ok(match fill_type {
				0x10 => (FillStyle::LinearGradient(start), FillStyle::LinearGradient(end)),
				0x12 => (FillStyle::RadialGradient(start), FillStyle::RadialGradient(end)),
				_ => {
					let start_focal = reader.read_fixed8()?;
					let end_focal = if ctx.morph {
						reader.read_fixed8()?
					} else {
						start_focal
					};
					(
						FillStyle::FocalGradient {
							gradient: start,
							focal_point: start_focal,
						},
						FillStyle::FocalGradient {
							gradient: end,
							focal_point: end_focal,
						},
					)
				}
			})
		}
		0x40..=0x43 => {
			let id = reader.read_u16()?;
			let start_matrix = Matrix::from_reader(reader)?;
			let end_matrix = if ctx.morph {
				Matrix::from_reader(reader)?
			} else {
				start_matrix
			};
			let repeating = fill_type & 0x01 == 0;
			let smoothed = fill_type & 0x02 == 0;
			let bitmap = |matrix| FillStyle::Bitmap {
				id,
				matrix,
				repeating,
				smoothed,
			};
			Ok((bitmap(start_matrix), bitmap(end_matrix)))
		}
		other => Err(TagError::InvalidValue {
			field: "fill style type",
			value: u32::from(other),
		}),
	}
}

fn read_morph_gradient(
	reader: &mut BitReader<'_>,
	start_matrix: Matrix,
	end_matrix: Matrix,
) -> Result<(Gradient, Gradient), TagError> {
	let count = reader.read_u8()? & 0x0F;
	let mut start = Vec::with_capacity(usize::from(count));
	let mut end = Vec::with_capacity(usize::from(count));
	for _ in 0..count {
		start.push(GradientRecord::from_reader(reader, true)?);
		end.push(GradientRecord::from_reader(reader, true)?);
	}
	let gradient = |matrix, records| Gradient {
		matrix,
		spread: GradientSpread::Pad,
		interpolation: GradientInterpolation::Rgb,
		records,
	};
	Ok((gradient(start_matrix, start), gradient(end_matrix, end)))
}

/// Reads one line style, or a start/end pair for morph shapes.
pub(crate) fn read_line_style(
	reader: &mut BitReader<'_>,
	ctx: ShapeContext,
) -> Result<(LineStyle, LineStyle), TagError> {
	let start_width = reader.read_u16()?;
	let end_width = if ctx.morph {
		reader.read_u16()?
	} else {
		start_width
	};

	if ctx.version < 4 {
		let start = Color::from_reader(reader, ctx.with_alpha())?;
		let end = if ctx.morph {
			Color::from_rgba(reader)?
		} else {
			start
		};
		return Ok((LineStyle::new(start_width, start), LineStyle::new(end_width, end)));
	}

	let start_cap = LineCap::from_bits(reader.read_ub(2)?);
	let join_bits = reader.read_ub(2)?;
	let has_fill = reader.read_bit()?;
	let no_h_scale = reader.read_bit()?;
	let no_v_scale = reader.read_bit()?;
	let pixel_hinting = reader.read_bit()?;
	reader.read_ub(5)?;
	let no_close = reader.read_bit()?;
	let end_cap = LineCap::from_bits(reader.read_ub(2)?);
	let join = match join_bits {
		1 => LineJoin::Bevel,
		2 => LineJoin::Miter(reader.read_fixed8()?),
		_ => LineJoin::Round,
	};

	let mut start = LineStyle {
		width: start_width,
		color: Color::BLACK,
		start_cap,
		end_cap,
		join,
		fill: None,
		no_h_scale,
		no_v_scale,
		pixel_hinting,
		no_close,
	};
	let mut end = start.clone();
	end.width = end_width;

	if has_fill {
		let (start_fill, end_fill) = read_fill_style(reader, ctx)?;
		start.fill = Some(start_fill);
		end.fill = Some(end_fill);
	} else {
		start.color = Color::from_rgba(reader)?;
		end.color = if ctx.morph {
			Color::from_rgba(reader)?
		} else {
			start.color
		};
	}
	Ok((start, end))
}

/// Reads fill and line style arrays, returning start and end styles.
pub(crate) fn read_styles(
	reader: &mut BitReader<'_>,
	ctx: ShapeContext,
) -> Result<(ShapeStyles, ShapeStyles), TagError> {
	let mut start = ShapeStyles::default();
	let mut end = ShapeStyles::default();

	let fill_count = read_style_count(reader, ctx)?;
	for _ in 0..fill_count {
		let (s, e) = read_fill_style(reader, ctx)?;
		start.fill_styles.push(s);
		end.fill_styles.push(e);
	}

	let line_count = read_style_count(reader, ctx)?;
	for _ in 0..line_count {
		let (s, e) = read_line_style(reader, ctx)?;
		start.line_styles.push(s);
		end.line_styles.push(e);
	}
	Ok((start, end))
}

/// Reads the index bit widths and the record stream up to its end record.
pub(crate) fn read_shape_records(
	reader: &mut BitReader<'_>,
	ctx: ShapeContext,
) -> Result<Vec<ShapeRecord>, TagError> {
	reader.align();
	let mut fill_bits = reader.read_ub(4)?;
	let mut line_bits = reader.read_ub(4)?;
	let mut records = Vec::new();

	loop {
		if reader.read_bit()? {
			records.push(read_edge(reader)?);
			continue;
		}

		let new_styles = reader.read_bit()?;
		let has_line = reader.read_bit()?;
		let has_fill1 = reader.read_bit()?;
		let has_fill0 = reader.read_bit()?;
		let has_move = reader.read_bit()?;
		if !(new_styles || has_line || has_fill1 || has_fill0 || has_move) {
			break;
		}

		let mut change = StyleChange::default();
		if has_move {
			let bits = reader.read_ub(5)?;
			change.move_to = Some((reader.read_sb(bits)?, reader.read_sb(bits)?));
		}
		if has_fill0 {
			change.fill_style0 = Some(reader.read_ub(fill_bits)?);
		}
		if has_fill1 {
			change.fill_style1 = Some(reader.read_ub(fill_bits)?);
		}
		if has_line {
			change.line_style = Some(reader.read_ub(line_bits)?);
		}
		// Only DefineShape2 and later may carry new styles mid-stream
		if new_styles && ctx.version >= 2 && !ctx.morph {
			let (styles, _) = read_styles(reader, ctx)?;
			change.new_styles = Some(styles);
			fill_bits = reader.read_ub(4)?;
			line_bits = reader.read_ub(4)?;
		}
		records.push(ShapeRecord::StyleChange(change));
	}

	reader.align();
	trace!("read {} shape records", records.len());
	Ok(records)
}

fn read_edge(reader: &mut BitReader<'_>) -> Result<ShapeRecord, TagError> {
	let straight = reader.read_bit()?;
	let bits = reader.read_ub(4)? + 2;
	if straight {
		let general = reader.read_bit()?;
		let (dx, dy) = if general {
			(reader.read_sb(bits)?, reader.read_sb(bits)?)
		} else if reader.read_bit()? {
			(0, reader.read_sb(bits)?)
		} else {
			(reader.read_sb(bits)?, 0)
		};
		Ok(ShapeRecord::StraightEdge {
			dx,
			dy,
		})
	} else {
		Ok(ShapeRecord::CurvedEdge {
			control_dx: reader.read_sb(bits)?,
			control_dy: reader.read_sb(bits)?,
			anchor_dx: reader.read_sb(bits)?,
			anchor_dy: reader.read_sb(bits)?,
		})
	}
}

/// Contiguous run of edges drawn with one set of styles
#[derive(Debug, Clone, PartialEq)]
pub struct ShapePath {
	/// Which style arrays the indices refer to: 0 for the initial arrays,
	/// `n` for the `n`th set of new styles in the record stream
	pub style_set: u32,
	/// Active fill 0, 0 for none
	pub fill_style0: u32,
	/// Active fill 1, 0 for none
	pub fill_style1: u32,
	/// Active stroke, 0 for none
	pub line_style: u32,
	/// Outline in twips
	pub path: BezPath,
}

/// Converts a record stream into runs of outline, one per style change.
pub fn records_to_paths(records: &[ShapeRecord]) -> Vec<ShapePath> {
	let mut paths = Vec::new();
	let mut current = ShapePath {
		style_set: 0,
		fill_style0: 0,
		fill_style1: 0,
		line_style: 0,
		path: BezPath::new(),
	};
	// wide enough that no run of 32-bit deltas overflows
	let (mut x, mut y) = (0i64, 0i64);
	let mut pen_down = false;

	for record in records {
		match record {
			ShapeRecord::StyleChange(change) => {
				if !current.path.elements().is_empty() {
					let styles = ShapePath {
						path: BezPath::new(),
						..current.clone()
					};
					paths.push(std::mem::replace(&mut current, styles));
				}
				if change.new_styles.is_some() {
					current.style_set += 1;
					current.fill_style0 = 0;
					current.fill_style1 = 0;
					current.line_style = 0;
				}
				current.fill_style0 = change.fill_style0.unwrap_or(current.fill_style0);
				current.fill_style1 = change.fill_style1.unwrap_or(current.fill_style1);
				current.line_style = change.line_style.unwrap_or(current.line_style);
				if let Some((mx, my)) = change.move_to {
					x = i64::from(mx);
					y = i64::from(my);
				}
				pen_down = false;
			}
			ShapeRecord::StraightEdge {
				dx,
				dy,
			} => {
				if !pen_down {
					current.path.move_to(point(x, y));
					pen_down = true;
				}
				x += i64::from(*dx);
				y += i64::from(*dy);
				current.path.line_to(point(x, y));
			}
			ShapeRecord::CurvedEdge {
				control_dx,
				control_dy,
				anchor_dx,
				anchor_dy,
			} => {
				if !pen_down {
					current.path.move_to(point(x, y));
					pen_down = true;
				}
				let (cx, cy) = (x + i64::from(*control_dx), y + i64::from(*control_dy));
				x = cx + i64::from(*anchor_dx);
				y = cy + i64::from(*anchor_dy);
				let control = point(cx, cy);
				current.path.quad_to(control, point(x, y));
			}
		}
	}

	if !current.path.elements().is_empty() {
		paths.push(current);
	}
	paths
}

fn point(x: i64, y: i64) -> Point {
	Point::new(x as f64, y as f64)
}

/// Decoded `DefineShape` of any version
#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
	/// Character ID
	pub id: u16,
	/// Tag version, 1 to 4
	pub version: u8,
	/// Bounds including strokes
	pub bounds: Rect,
	/// Bounds of the edges alone (version 4)
	pub edge_bounds: Option<Rect>,
	/// Fill with the non-zero winding rule instead of even-odd
	pub uses_fill_winding_rule: bool,
	/// Contains strokes that do not scale
	pub uses_non_scaling_strokes: bool,
	/// Contains strokes that scale
	pub uses_scaling_strokes: bool,
	/// Initial style arrays
	pub styles: ShapeStyles,
	/// Record stream
	pub records: Vec<ShapeRecord>,
}

impl Shape {
	/// Decodes a `DefineShape` payload of the given version.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let ctx = ShapeContext::shape(version);
		let id = reader.read_u16()?;
		let bounds = Rect::from_reader(reader)?;

		let mut shape = Self {
			id,
			version,
			bounds,
			edge_bounds: None,
			uses_fill_winding_rule: false,
			uses_non_scaling_strokes: false,
			uses_scaling_strokes: false,
			styles: ShapeStyles::default(),
			records: Vec::new(),
		};

		if version >= 4 {
			shape.edge_bounds = Some(Rect::from_reader(reader)?);
			let flags = reader.read_u8()?;
			shape.uses_fill_winding_rule = flags & 0x04 != 0;
			shape.uses_non_scaling_strokes = flags & 0x02 != 0;
			shape.uses_scaling_strokes = flags & 0x01 != 0;
		}

		shape.styles = read_styles(reader, ctx)?.0;
		shape.records = read_shape_records(reader, ctx)?;
		Ok(shape)
	}

	/// Outline runs in twips.
	pub fn paths(&self) -> Vec<ShapePath> {
		records_to_paths(&self.records)
	}
}
