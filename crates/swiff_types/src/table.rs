//! Character ID to definition mapping.
//!
//! IDs below [`DENSE_LIMIT`] live in a directly indexed vector, so movies that
//! number their characters from 1 upwards index directly. Larger IDs go to an
//! ordered map, which keeps memory proportional to the number of definitions
//! however sparse the ID space is.

use std::collections::BTreeMap;

use log::debug;

use crate::character::{
	Bitmap, Button, CharacterDefinition, EditText, Font, MorphShape, Shape, Sprite, Text,
};
use crate::sound::SoundDefinition;

/// IDs below this bound use the dense path
pub const DENSE_LIMIT: u16 = 4096;

/// Sparse table of character definitions
///
/// Inserting an ID twice keeps the newer definition. There is no removal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DefinitionTable {
	dense: Vec<Option<CharacterDefinition>>,
	sparse: BTreeMap<u16, CharacterDefinition>,
	len: usize,
}

impl DefinitionTable {
	/// Creates an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Stores `definition` under `id`, returning the definition it replaced.
	pub fn insert(&mut self, id: u16, definition: CharacterDefinition) -> Option<CharacterDefinition> {
		let previous = if id < DENSE_LIMIT {
			let index = usize::from(id);
			if index >= self.dense.len() {
				self.dense.resize_with(index + 1, || None);
			}
			self.dense[index].replace(definition)
		} else {
			self.sparse.insert(id, definition)
		};

		match &previous {
			Some(old) => debug!("character {id} redefined, replacing {old}"),
			None => self.len += 1,
		}
		previous
	}

	/// Looks up a definition.
	pub fn lookup(&self, id: u16) -> Option<&CharacterDefinition> {
		if id < DENSE_LIMIT {
			self.dense.get(usize::from(id)).and_then(Option::as_ref)
		} else {
			self.sparse.get(&id)
		}
	}

	/// Returns `true` if `id` is defined.
	pub fn contains(&self, id: u16) -> bool {
		self.lookup(id).is_some()
	}

	/// Number of defined characters
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if nothing is defined
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Iterates definitions in ascending ID order.
	pub fn iter(&self) -> impl Iterator<Item = (u16, &CharacterDefinition)> {
		let dense = self
			.dense
			.iter()
			.enumerate()
			.filter_map(|(id, slot)| slot.as_ref().map(|definition| (id as u16, definition)));
		dense.chain(self.sparse.iter().map(|(&id, definition)| (id, definition)))
	}

	/// Shape with the given ID
	pub fn shape(&self, id: u16) -> Option<&Shape> {
		match self.lookup(id)? {
			CharacterDefinition::Shape(shape) => Some(shape),
			_ => None,
		}
	}

	/// Morph shape with the given ID
	pub fn morph_shape(&self, id: u16) -> Option<&MorphShape> {
		match self.lookup(id)? {
			CharacterDefinition::MorphShape(morph) => Some(morph),
			_ => None,
		}
	}

	/// Sprite with the given ID
	pub fn sprite(&self, id: u16) -> Option<&Sprite> {
		match self.lookup(id)? {
			CharacterDefinition::Sprite(sprite) => Some(sprite),
			_ => None,
		}
	}

	/// Font with the given ID
	pub fn font(&self, id: u16) -> Option<&Font> {
		match self.lookup(id)? {
			CharacterDefinition::Font(font) => Some(font),
			_ => None,
		}
	}

	/// Bitmap with the given ID
	pub fn bitmap(&self, id: u16) -> Option<&Bitmap> {
		match self.lookup(id)? {
			CharacterDefinition::Bitmap(bitmap) => Some(bitmap),
			_ => None,
		}
	}

	/// Sound with the given ID
	pub fn sound(&self, id: u16) -> Option<&SoundDefinition> {
		match self.lookup(id)? {
			CharacterDefinition::Sound(sound) => Some(sound),
			_ => None,
		}
	}

	/// Static text with the given ID
	pub fn text(&self, id: u16) -> Option<&Text> {
		match self.lookup(id)? {
			CharacterDefinition::Text(text) => Some(text),
			_ => None,
		}
	}

	/// Edit text with the given ID
	pub fn edit_text(&self, id: u16) -> Option<&EditText> {
		match self.lookup(id)? {
			CharacterDefinition::EditText(text) => Some(text),
			_ => None,
		}
	}

	/// Button with the given ID
	pub fn button(&self, id: u16) -> Option<&Button> {
		match self.lookup(id)? {
			CharacterDefinition::Button(button) => Some(button),
			_ => None,
		}
	}
}
