//! Display-list instructions decoded from `PlaceObject` and `RemoveObject`.
//!
//! # `PlaceObject2` flags
//!
//! | Bit | Field |
//! |-----|-------|
//! | 0x80 | clip actions (ignored) |
//! | 0x40 | clip depth |
//! | 0x20 | name |
//! | 0x10 | ratio |
//! | 0x08 | color transform |
//! | 0x04 | matrix |
//! | 0x02 | character |
//! | 0x01 | move |
//!
//! `PlaceObject3` adds a second flag byte: opaque background 0x40, visible
//! 0x20, image 0x10, class name 0x08, cache as bitmap 0x04, blend mode 0x02,
//! filter list 0x01.
//!
//! The move and character flags select the instruction:
//!
//! | move | character | instruction |
//! |------|-----------|-------------|
//! | 0 | 1 | [`DisplayInstruction::Place`] |
//! | 1 | 0 | [`DisplayInstruction::Update`] |
//! | 1 | 1 | [`DisplayInstruction::Replace`] |

use serde::{Deserialize, Serialize};

use crate::codec::BitReader;
use crate::error::TagError;
use crate::filter::{BlendMode, Filter, read_filter_list};
use crate::transform::{ColorTransform, Matrix};
use crate::types::Color;

/// A character instance at a depth, with every field resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
	/// Z-order key
	pub depth: u16,
	/// Placed character
	pub character_id: u16,
	/// Local matrix
	pub matrix: Matrix,
	/// Local color transform
	pub color_transform: ColorTransform,
	/// Filters in application order
	pub filters: Vec<Filter>,
	/// Compositing operator
	pub blend_mode: BlendMode,
	/// Morph ratio, 0 to 65535
	pub ratio: Option<u16>,
	/// Depths up to this one are masked by this instance
	pub clip_depth: Option<u16>,
	/// Instance name
	pub name: Option<String>,
	/// Class name of the instance
	pub class_name: Option<String>,
	/// Rendered through a bitmap cache
	pub cache_as_bitmap: bool,
	/// Drawn at all
	pub visible: bool,
	/// Background fill of a cached bitmap
	pub background_color: Option<Color>,
}

impl Placement {
	/// A placement with identity transforms and no effects.
	pub fn new(depth: u16, character_id: u16) -> Self {
		Self {
			depth,
			character_id,
			matrix: Matrix::IDENTITY,
			color_transform: ColorTransform::IDENTITY,
			filters: Vec::new(),
			blend_mode: BlendMode::Normal,
			ratio: None,
			clip_depth: None,
			name: None,
			class_name: None,
			cache_as_bitmap: false,
			visible: true,
			background_color: None,
		}
	}

	/// Overwrites the fields `update` specifies.
	///
	/// Only appearance changes: the character, depth, name and clip depth
	/// stay as placed.
	pub fn apply_update(&mut self, update: &PlacementUpdate) {
		if let Some(matrix) = update.matrix {
			self.matrix = matrix;
		}
		if let Some(color_transform) = update.color_transform {
			self.color_transform = color_transform;
		}
		if let Some(filters) = &update.filters {
			self.filters.clone_from(filters);
		}
		if let Some(blend_mode) = update.blend_mode {
			self.blend_mode = blend_mode;
		}
		if update.ratio.is_some() {
			self.ratio = update.ratio;
		}
		if let Some(visible) = update.visible {
			self.visible = visible;
		}
		if let Some(cache_as_bitmap) = update.cache_as_bitmap {
			self.cache_as_bitmap = cache_as_bitmap;
		}
		if update.background_color.is_some() {
			self.background_color = update.background_color;
		}
	}
}

/// Fields a `PlaceObject` tag specifies; absent ones stay unchanged
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlacementUpdate {
	/// Depth the update targets
	pub depth: u16,
	/// New matrix
	pub matrix: Option<Matrix>,
	/// New color transform
	pub color_transform: Option<ColorTransform>,
	/// New filter chain
	pub filters: Option<Vec<Filter>>,
	/// New blend mode
	pub blend_mode: Option<BlendMode>,
	/// New morph ratio
	pub ratio: Option<u16>,
	/// New visibility
	pub visible: Option<bool>,
	/// New bitmap caching flag
	pub cache_as_bitmap: Option<bool>,
	/// New cache background
	pub background_color: Option<Color>,
	/// Name given with the tag
	pub name: Option<String>,
	/// Clip depth given with the tag
	pub clip_depth: Option<u16>,
	/// Class name given with the tag
	pub class_name: Option<String>,
}

impl PlacementUpdate {
	/// Builds a full placement from these fields, defaulting the rest.
	pub fn into_placement(self, character_id: u16) -> Placement {
		let mut placement = Placement::new(self.depth, character_id);
		placement.apply_update(&self);
		placement.name = self.name;
		placement.clip_depth = self.clip_depth;
		placement.class_name = self.class_name;
		placement
	}
}

/// One display-list mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DisplayInstruction {
	/// Put a character at a depth, replacing whatever was there
	Place(Placement),
	/// Change the appearance of the instance at a depth
	Update(PlacementUpdate),
	/// Swap the character at a depth, keeping unspecified fields
	Replace {
		/// New character
		character_id: u16,
		/// Fields to change
		update: PlacementUpdate,
	},
	/// Clear a depth
	Remove {
		/// Depth to clear
		depth: u16,
	},
}

impl DisplayInstruction {
	/// Depth the instruction acts on
	pub fn depth(&self) -> u16 {
		match self {
			DisplayInstruction::Place(placement) => placement.depth,
			DisplayInstruction::Update(update) | DisplayInstruction::Replace { update, .. } => update.depth,
			DisplayInstruction::Remove { depth } => *depth,
		}
	}

	/// Decodes a `PlaceObject` payload of the given version (1 to 3).
	pub fn from_place_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		if version == 1 {
			return read_place_object_1(reader);
		}

		let flags = reader.read_u8()?;
		let flags2 = if version >= 3 { reader.read_u8()? } else { 0 };
		let is_move = flags & 0x01 != 0;
		let has_character = flags & 0x02 != 0;

		let mut update = PlacementUpdate {
			depth: reader.read_u16()?,
			..PlacementUpdate::default()
		};
		let has_class_name = flags2 & 0x08 != 0 || (flags2 & 0x10 != 0 && has_character);
		if has_class_name {
			update.class_name = Some(reader.read_string()?);
		}
		let character_id = if has_character { Some(reader.read_u16()?) } else { None };
		if flags & 0x04 != 0 {
			update.matrix = Some(Matrix::from_reader(reader)?);
		}
		if flags & 0x08 != 0 {
			update.color_transform = Some(ColorTransform::from_reader(reader, true)?);
		}
		if flags & 0x10 != 0 {
			update.ratio = Some(reader.read_u16()?);
		}
		if flags & 0x20 != 0 {
			update.name = Some(reader.read_string()?);
		}
		if flags & 0x40 != 0 {
			update.clip_depth = Some(reader.read_u16()?);
		}
		if flags2 & 0x01 != 0 {
			update.filters = Some(read_filter_list(reader)?);
		}
		if flags2 & 0x02 != 0 {
			update.blend_mode = Some(BlendMode::from_code(u16::from(reader.read_u8()?)));
		}
		if flags2 & 0x04 != 0 {
			update.cache_as_bitmap = Some(reader.read_u8()? != 0);
		}
		// The trailing fields are optional in practice even when flagged
		if flags2 & 0x20 != 0 && !reader.is_empty() {
			update.visible = Some(reader.read_u8()? != 0);
		}
		if flags2 & 0x40 != 0 && !reader.is_empty() {
			update.background_color = Some(Color::from_rgba(reader)?);
		}
		// Clip actions (0x80) are scripts and are not decoded

		match (is_move, character_id) {
			(false, Some(character_id)) => Ok(Self::Place(update.into_placement(character_id))),
			(true, None) => Ok(Self::Update(update)),
			(true, Some(character_id)) => Ok(Self::Replace {
				character_id,
				update,
			}),
			(false, None) => Err(TagError::InvalidValue {
				field: "place flags",
				value: u32::from(flags),
			}),
		}
	}

	/// Decodes a `RemoveObject` payload of the given version (1 or 2).
	pub fn from_remove_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		if version == 1 {
			// character ID, redundant with the depth
			reader.read_u16()?;
		}
		Ok(Self::Remove {
			depth: reader.read_u16()?,
		})
	}
}

fn read_place_object_1(reader: &mut BitReader<'_>) -> Result<DisplayInstruction, TagError> {
	let character_id = reader.read_u16()?;
	let depth = reader.read_u16()?;
	let mut placement = Placement::new(depth, character_id);
	placement.matrix = Matrix::from_reader(reader)?;
	reader.align();
	if !reader.is_empty() {
		placement.color_transform = ColorTransform::from_reader(reader, false)?;
	}
	Ok(DisplayInstruction::Place(placement))
}
