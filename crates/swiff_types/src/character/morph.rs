//! Morph shapes (`DefineMorphShape` 1 and 2).
//!
//! A morph shape stores paired start and end styles and two edge streams with
//! the same topology. A placement's ratio (0 to 65535) selects a point between
//! them.

use crate::codec::BitReader;
use crate::error::TagError;
use crate::types::Rect;

use super::shape::{
	LineStyle, Shape, ShapeContext, ShapeRecord, ShapeStyles, StyleChange, read_shape_records,
	read_styles,
};

/// Decoded `DefineMorphShape` or `DefineMorphShape2`
#[derive(Debug, Clone, PartialEq)]
pub struct MorphShape {
	/// Character ID
	pub id: u16,
	/// Tag version, 1 or 2
	pub version: u8,
	/// Bounds at ratio 0
	pub start_bounds: Rect,
	/// Bounds at ratio 65535
	pub end_bounds: Rect,
	/// Edge-only bounds at ratio 0 (version 2)
	pub start_edge_bounds: Option<Rect>,
	/// Edge-only bounds at ratio 65535 (version 2)
	pub end_edge_bounds: Option<Rect>,
	/// Contains strokes that do not scale
	pub uses_non_scaling_strokes: bool,
	/// Contains strokes that scale
	pub uses_scaling_strokes: bool,
	/// Styles at ratio 0
	pub start_styles: ShapeStyles,
	/// Styles at ratio 65535
	pub end_styles: ShapeStyles,
	/// Edges at ratio 0
	pub start_records: Vec<ShapeRecord>,
	/// Edges at ratio 65535
	pub end_records: Vec<ShapeRecord>,
}

impl MorphShape {
	/// Decodes a morph shape payload of the given version.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let start_bounds = Rect::from_reader(reader)?;
		let end_bounds = Rect::from_reader(reader)?;

		let (mut start_edge_bounds, mut end_edge_bounds) = (None, None);
		let (mut uses_non_scaling_strokes, mut uses_scaling_strokes) = (false, false);
		if version >= 2 {
			start_edge_bounds = Some(Rect::from_reader(reader)?);
			end_edge_bounds = Some(Rect::from_reader(reader)?);
			let flags = reader.read_u8()?;
			uses_non_scaling_strokes = flags & 0x02 != 0;
			uses_scaling_strokes = flags & 0x01 != 0;
		}

		let end_edges_offset = reader.read_u32()? as usize;
		let offset_base = reader.position();

		let ctx = ShapeContext {
			version: if version >= 2 {
				4
			} else {
				3
			},
			morph: true,
		};
		let (start_styles, end_styles) = read_styles(reader, ctx)?;
		let start_records = read_shape_records(reader, ctx)?;

		// Trust the declared offset when it points at or past the current position
		let end_start = offset_base + end_edges_offset;
		if end_edges_offset != 0 && end_start > reader.position() {
			reader.skip(end_start - reader.position())?;
		}
		let end_records = read_shape_records(reader, ctx)?;

		Ok(Self {
			id,
			version,
			start_bounds,
			end_bounds,
			start_edge_bounds,
			end_edge_bounds,
			uses_non_scaling_strokes,
			uses_scaling_strokes,
			start_styles,
			end_styles,
			start_records,
			end_records,
		})
	}

	/// Interpolates the morph into a plain shape at `ratio` (0 to 65535).
	pub fn shape_at(&self, ratio: u16) -> Shape {
		let t = f32::from(ratio) / 65535.0;
		let styles = ShapeStyles {
			fill_styles: self
				.start_styles
				.fill_styles
				.iter()
				.zip(&self.end_styles.fill_styles)
				.map(|(a, b)| a.lerp(b, t))
				.collect(),
			line_styles: self
				.start_styles
				.line_styles
				.iter()
				.zip(&self.end_styles.line_styles)
				.map(|(a, b)| lerp_line(a, b, t))
				.collect(),
		};

		Shape {
			id: self.id,
			version: if self.version >= 2 {
				4
			} else {
				3
			},
			bounds: lerp_rect(&self.start_bounds, &self.end_bounds, t),
			edge_bounds: self
				.start_edge_bounds
				.zip(self.end_edge_bounds)
				.map(|(a, b)| lerp_rect(&a, &b, t)),
			uses_fill_winding_rule: false,
			uses_non_scaling_strokes: self.uses_non_scaling_strokes,
			uses_scaling_strokes: self.uses_scaling_strokes,
			styles,
			records: lerp_records(&self.start_records, &self.end_records, t),
		}
	}
}

fn lerp_i32(a: i32, b: i32, t: f32) -> i32 {
	(a as f32 + (b - a) as f32 * t).round() as i32
}

fn lerp_rect(a: &Rect, b: &Rect, t: f32) -> Rect {
	Rect::new(
		lerp_i32(a.x_min, b.x_min, t),
		lerp_i32(a.x_max, b.x_max, t),
		lerp_i32(a.y_min, b.y_min, t),
		lerp_i32(a.y_max, b.y_max, t),
	)
}

fn lerp_line(a: &LineStyle, b: &LineStyle, t: f32) -> LineStyle {
	LineStyle {
		width: lerp_i32(i32::from(a.width), i32::from(b.width), t).clamp(0, i32::from(u16::MAX))
			as u16,
		color: a.color.lerp(b.color, t),
		fill: a.fill.as_ref().zip(b.fill.as_ref()).map(|(fa, fb)| fa.lerp(fb, t)),
		..a.clone()
	}
}

/// Edge as a quadratic curve: control delta then anchor delta.
fn as_curve(record: &ShapeRecord) -> Option<[i32; 4]> {
	match *record {
		ShapeRecord::StraightEdge {
			dx,
			dy,
		} => Some([dx / 2, dy / 2, dx - dx / 2, dy - dy / 2]),
		ShapeRecord::CurvedEdge {
			control_dx,
			control_dy,
			anchor_dx,
			anchor_dy,
		} => Some([control_dx, control_dy, anchor_dx, anchor_dy]),
		ShapeRecord::StyleChange(_) => None,
	}
}

/// Pairs start records with end records and interpolates them.
///
/// The end stream holds only moves and edges. Each start edge consumes the
/// next end edge; each start move consumes the next end move if one is next.
fn lerp_records(start: &[ShapeRecord], end: &[ShapeRecord], t: f32) -> Vec<ShapeRecord> {
	let mut end_iter = end
		.iter()
		.filter(|r| match r {
			ShapeRecord::StyleChange(change) => change.move_to.is_some(),
			_ => true,
		})
		.peekable();

	start
		.iter()
		.map(|record| match record {
			ShapeRecord::StyleChange(change) => {
				let mut change = change.clone();
				if let Some((sx, sy)) = change.move_to
					&& let Some(ShapeRecord::StyleChange(StyleChange {
						move_to: Some((ex, ey)),
						..
					})) = end_iter.peek()
				{
					change.move_to = Some((lerp_i32(sx, *ex, t), lerp_i32(sy, *ey, t)));
					end_iter.next();
				}
				ShapeRecord::StyleChange(change)
			}
			edge => {
				let matching = loop {
					match end_iter.next() {
						Some(ShapeRecord::StyleChange(_)) => continue,
						other => break other,
					}
				};
				match (edge, matching) {
					(
						ShapeRecord::StraightEdge {
							dx: sdx,
							dy: sdy,
						},
						Some(ShapeRecord::StraightEdge {
							dx: edx,
							dy: edy,
						}),
					) => ShapeRecord::StraightEdge {
						dx: lerp_i32(*sdx, *edx, t),
						dy: lerp_i32(*sdy, *edy, t),
					},
					(edge, Some(other)) => {
						let (Some(a), Some(b)) = (as_curve(edge), as_curve(other)) else {
							return edge.clone();
						};
						ShapeRecord::CurvedEdge {
							control_dx: lerp_i32(a[0], b[0], t),
							control_dy: lerp_i32(a[1], b[1], t),
							anchor_dx: lerp_i32(a[2], b[2], t),
							anchor_dy: lerp_i32(a[3], b[3], t),
						}
					}
					(edge, None) => edge.clone(),
				}
			}
		})
		.collect()
}
