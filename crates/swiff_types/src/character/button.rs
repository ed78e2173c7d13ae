//! Buttons (`DefineButton` 1 and 2) and the tags that decorate them.

use crate::codec::BitReader;
use crate::error::TagError;
use crate::filter::{BlendMode, Filter, read_filter_list};
use crate::sound::SoundInfo;
use crate::transform::{ColorTransform, Matrix};

/// Button states a record is shown in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ButtonStates {
	/// Idle
	pub up: bool,
	/// Pointer over the button
	pub over: bool,
	/// Pointer pressed
	pub down: bool,
	/// Hit-test area, never drawn
	pub hit_test: bool,
}

/// One character placed inside a button
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonRecord {
	/// States that show this record
	pub states: ButtonStates,
	/// Placed character
	pub character_id: u16,
	/// Depth inside the button
	pub depth: u16,
	/// Placement matrix
	pub matrix: Matrix,
	/// Color transform
	pub color_transform: ColorTransform,
	/// Filters (version 2)
	pub filters: Vec<Filter>,
	/// Blend mode (version 2)
	pub blend_mode: BlendMode,
}

/// Sound played on a state transition
#[derive(Debug, Clone, PartialEq)]
pub struct ButtonSound {
	/// Sound character
	pub sound_id: u16,
	/// Playback parameters
	pub info: SoundInfo,
}

/// Sounds of `DefineButtonSound`, one slot per transition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ButtonSounds {
	/// Over to up
	pub over_to_up: Option<ButtonSound>,
	/// Up to over
	pub up_to_over: Option<ButtonSound>,
	/// Over to down
	pub over_to_down: Option<ButtonSound>,
	/// Down to over
	pub down_to_over: Option<ButtonSound>,
}

impl ButtonSounds {
	/// Decodes a `DefineButtonSound` payload and returns the button ID with it.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<(u16, Self), TagError> {
		let button_id = reader.read_u16()?;
		let mut slot = || -> Result<Option<ButtonSound>, TagError> {
			let sound_id = reader.read_u16()?;
			if sound_id == 0 {
				return Ok(None);
			}
			Ok(Some(ButtonSound {
				sound_id,
				info: SoundInfo::from_reader(reader)?,
			}))
		};
		let sounds = Self {
			over_to_up: slot()?,
			up_to_over: slot()?,
			over_to_down: slot()?,
			down_to_over: slot()?,
		};
		Ok((button_id, sounds))
	}
}

/// Decoded button definition
#[derive(Debug, Clone, PartialEq)]
pub struct Button {
	/// Character ID
	pub id: u16,
	/// Tag version, 1 or 2
	pub version: u8,
	/// Behaves like a menu item
	pub track_as_menu: bool,
	/// State records in file order
	pub records: Vec<ButtonRecord>,
	/// Transition sounds
	pub sounds: ButtonSounds,
}

impl Button {
	/// Decodes a `DefineButton` payload of the given version.
	///
	/// Action data after the records is ignored.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let mut track_as_menu = false;
		if version >= 2 {
			track_as_menu = reader.read_u8()? & 0x01 != 0;
			// offset of the first condition action
			reader.read_u16()?;
		}

		let mut records = Vec::new();
		loop {
			let flags = reader.read_u8()?;
			if flags == 0 {
				break;
			}
			records.push(read_record(reader, flags, version)?);
		}

		Ok(Self {
			id,
			version,
			track_as_menu,
			records,
			sounds: ButtonSounds::default(),
		})
	}

	/// Records shown in the idle state, in depth order.
	pub fn up_records(&self) -> Vec<&ButtonRecord> {
		let mut records: Vec<_> = self.records.iter().filter(|r| r.states.up).collect();
		records.sort_by_key(|r| r.depth);
		records
	}

	/// Returns a copy whose records all use `color_transform`.
	///
	/// Used for `DefineButtonCxform`, which only applies to version 1 buttons.
	pub fn with_color_transform(&self, color_transform: ColorTransform) -> Self {
		let mut button = self.clone();
		for record in &mut button.records {
			record.color_transform = color_transform;
		}
		button
	}

	/// Returns a copy carrying `sounds`.
	pub fn with_sounds(&self, sounds: ButtonSounds) -> Self {
		Self {
			sounds,
			..self.clone()
		}
	}
}

fn read_record(reader: &mut BitReader<'_>, flags: u8, version: u8) -> Result<ButtonRecord, TagError> {
	let states = ButtonStates {
		hit_test: flags & 0x08 != 0,
		down: flags & 0x04 != 0,
		over: flags & 0x02 != 0,
		up: flags & 0x01 != 0,
	};
	let character_id = reader.read_u16()?;
	let depth = reader.read_u16()?;
	let matrix = Matrix::from_reader(reader)?;

	let mut record = ButtonRecord {
		states,
		character_id,
		depth,
		matrix,
		color_transform: ColorTransform::IDENTITY,
		filters: Vec::new(),
		blend_mode: BlendMode::Normal,
	};
	if version >= 2 {
		record.color_transform = ColorTransform::from_reader(reader, true)?;
		if flags & 0x10 != 0 {
			record.filters = read_filter_list(reader)?;
		}
		if flags & 0x20 != 0 {
			record.blend_mode = BlendMode::from_code(u16::from(reader.read_u8()?));
		}
	}
	Ok(record)
}
