//! Frame resolution: turns a timeline frame into a depth-ordered paint
//! sequence for an external rendering backend.
//!
//! Resolution is a pure function of the definition table, the timeline and
//! the frame index. Nested sprites and buttons are expanded recursively:
//!
//! - matrices compose as `parent * local`
//! - color transforms chain child first, then parent
//! - filter chains are flattened innermost first (own filters, then the
//!   ancestors')
//! - a normal blend mode inherits the nearest non-normal ancestor mode
//!
//! A sprite frame is derived from the frame its instance was placed on:
//! `local = (parent_local - placed_at) mod frame_count`.

use kurbo::Affine;
use log::{debug, warn};
use serde::Serialize;

use crate::character::{Bitmap, CharacterDefinition, EditText, MorphShape, Shape, Text};
use crate::config::ParseConfig;
use crate::filter::{BlendMode, Filter};
use crate::table::DefinitionTable;
use crate::timeline::{DisplayList, Timeline};
use crate::transform::{ColorTransform, Matrix, Transform};

/// Drawable payload of a paint command
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint<'a> {
	/// Vector shape
	Shape(&'a Shape),
	/// Morph shape; interpolate with the command's ratio
	MorphShape(&'a MorphShape),
	/// Static text
	Text(&'a Text),
	/// Text field
	EditText(&'a EditText),
	/// Bitmap placed directly
	Bitmap(&'a Bitmap),
}

/// One item to draw, with every ancestor applied
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaintCommand<'a> {
	/// Drawn character
	pub character_id: u16,
	/// Depths from the root timeline down to this item
	pub depth_path: Vec<u16>,
	/// Character space to stage space, in twips
	pub transform: Affine,
	/// Composed color transform
	pub color_transform: ColorTransform,
	/// Flattened filter chain, applied in order
	pub filters: Vec<Filter>,
	/// Effective compositing operator
	pub blend_mode: BlendMode,
	/// Clip depth in the item's own timeline
	pub clip_depth: Option<u16>,
	/// Morph ratio
	pub ratio: Option<u16>,
	/// Payload to draw
	#[serde(skip)]
	pub paint: Paint<'a>,
}

impl PaintCommand<'_> {
	/// Depth in the item's own timeline
	pub fn depth(&self) -> u16 {
		self.depth_path.last().copied().unwrap_or_default()
	}

	/// Geometry to draw for shape and morph shape payloads.
	pub fn shape(&self) -> Option<Shape> {
		match self.paint {
			Paint::Shape(shape) => Some(shape.clone()),
			Paint::MorphShape(morph) => Some(morph.shape_at(self.ratio.unwrap_or(0))),
			_ => None,
		}
	}
}

/// State inherited from the ancestors of a display list
#[derive(Debug, Clone)]
struct Inherited {
	transform: Transform,
	filters: Vec<Filter>,
	blend_mode: BlendMode,
}

/// One character instance to expand
struct Instance<'p> {
	character_id: u16,
	depth: u16,
	matrix: &'p Matrix,
	color_transform: &'p ColorTransform,
	filters: &'p [Filter],
	blend_mode: BlendMode,
	clip_depth: Option<u16>,
	ratio: Option<u16>,
	/// Frames since the instance was placed
	elapsed: usize,
}

struct Walk<'a> {
	/// Sprites and buttons being expanded
	stack: Vec<u16>,
	path: Vec<u16>,
	out: Vec<PaintCommand<'a>>,
}

/// Resolves frames against one definition table
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
	table: &'a DefinitionTable,
	max_nesting_depth: usize,
}

impl<'a> Resolver<'a> {
	/// Creates a resolver that expands at most `max_nesting_depth` nested
	/// sprites or buttons.
	pub fn new(table: &'a DefinitionTable, max_nesting_depth: usize) -> Self {
		Self {
			table,
			max_nesting_depth,
		}
	}

	/// Paint sequence of frame `frame` of `timeline`.
	///
	/// A frame past the end of the timeline yields nothing.
	pub fn resolve(&self, timeline: &'a Timeline, frame: usize) -> Vec<PaintCommand<'a>> {
		if frame >= timeline.frame_count() {
			debug!("frame {frame} out of range ({} frames)", timeline.frame_count());
			return Vec::new();
		}

		let root = Inherited {
			transform: Transform::IDENTITY,
			filters: Vec::new(),
			blend_mode: BlendMode::Normal,
		};
		let mut walk = Walk {
			stack: Vec::new(),
			path: Vec::new(),
			out: Vec::new(),
		};
		self.paint_list(&timeline.display_list_at(frame), frame, &root, &mut walk);
		walk.out
	}

	fn paint_list(&self, list: &DisplayList, local_frame: usize, parent: &Inherited, walk: &mut Walk<'a>) {
		for entry in list.iter() {
			let placement = &entry.placement;
			if !placement.visible {
				continue;
			}
			let instance = Instance {
				character_id: placement.character_id,
				depth: placement.depth,
				matrix: &placement.matrix,
				color_transform: &placement.color_transform,
				filters: &placement.filters,
				blend_mode: placement.blend_mode,
				clip_depth: placement.clip_depth,
				ratio: placement.ratio,
				elapsed: local_frame.saturating_sub(entry.placed_at),
			};
			self.paint_instance(&instance, parent, walk);
		}
	}

	fn paint_instance(&self, instance: &Instance<'_>, parent: &Inherited, walk: &mut Walk<'a>) {
		let Some(definition) = self.table.lookup(instance.character_id) else {
			debug!(
				"skipping undefined character {} at depth {}",
				instance.character_id, instance.depth
			);
			return;
		};

		let mut filters = instance.filters.to_vec();
		filters.extend_from_slice(&parent.filters);
		let blend_mode = match instance.blend_mode.compositing() {
			BlendMode::Normal => parent.blend_mode,
			mode => mode,
		};
		let inherited = Inherited {
			transform: parent.transform.nest(instance.matrix, instance.color_transform),
			filters,
			blend_mode,
		};

		let paint = match definition {
			CharacterDefinition::Shape(shape) => Paint::Shape(shape),
			CharacterDefinition::MorphShape(morph) => Paint::MorphShape(morph),
			CharacterDefinition::Text(text) => Paint::Text(text),
			CharacterDefinition::EditText(text) => Paint::EditText(text),
			CharacterDefinition::Bitmap(bitmap) => Paint::Bitmap(bitmap),
			CharacterDefinition::Sprite(sprite) => {
				if !self.enter(instance, walk) {
					return;
				}
				let local_frame = sprite.local_frame(instance.elapsed);
				let list = sprite.timeline.display_list_at(local_frame);
				self.paint_list(&list, local_frame, &inherited, walk);
				self.leave(walk);
				return;
			}
			CharacterDefinition::Button(button) => {
				if !self.enter(instance, walk) {
					return;
				}
				for record in button.up_records() {
					let child = Instance {
						character_id: record.character_id,
						depth: record.depth,
						matrix: &record.matrix,
						color_transform: &record.color_transform,
						filters: &record.filters,
						blend_mode: record.blend_mode,
						clip_depth: None,
						ratio: None,
						elapsed: instance.elapsed,
					};
					self.paint_instance(&child, &inherited, walk);
				}
				self.leave(walk);
				return;
			}
			other => {
				debug!("{other} at depth {} is not drawable", instance.depth);
				return;
			}
		};

		let mut depth_path = walk.path.clone();
		depth_path.push(instance.depth);
		walk.out.push(PaintCommand {
			character_id: instance.character_id,
			depth_path,
			transform: inherited.transform.matrix,
			color_transform: inherited.transform.color,
			filters: inherited.filters,
			blend_mode: inherited.blend_mode,
			clip_depth: instance.clip_depth,
			ratio: instance.ratio,
			paint,
		});
	}

	/// Pushes a container onto the walk, refusing cycles and excess depth.
	fn enter(&self, instance: &Instance<'_>, walk: &mut Walk<'a>) -> bool {
		if walk.stack.contains(&instance.character_id) {
			warn!(
				"character {} contains itself, skipping depth {}",
				instance.character_id, instance.depth
			);
			return false;
		}
		if walk.stack.len() >= self.max_nesting_depth {
			warn!(
				"nesting limit {} reached at character {}",
				self.max_nesting_depth, instance.character_id
			);
			return false;
		}
		walk.stack.push(instance.character_id);
		walk.path.push(instance.depth);
		true
	}

	fn leave(&self, walk: &mut Walk<'a>) {
		walk.stack.pop();
		walk.path.pop();
	}
}

/// Resolves `frame` of `timeline` with the default nesting limit.
pub fn resolve<'a>(table: &'a DefinitionTable, timeline: &'a Timeline, frame: usize) -> Vec<PaintCommand<'a>> {
	Resolver::new(table, ParseConfig::default().max_nesting_depth).resolve(timeline, frame)
}
