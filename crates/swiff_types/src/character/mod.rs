//! Character definitions.
//!
//! Every definition tag produces one [`CharacterDefinition`], keyed by the
//! character ID it declares. Definitions are immutable once stored in the
//! [`DefinitionTable`](crate::table::DefinitionTable); tags that decorate an
//! existing character (font info, button color transforms and sounds) build a
//! merged copy and store that under the same ID.

pub mod bitmap;
pub mod button;
pub mod font;
pub mod morph;
pub mod shape;
pub mod sprite;
pub mod text;

use std::fmt::Display;

pub use bitmap::{Bitmap, BitmapEncoding, ImageFormat, LosslessFormat};
pub use button::{Button, ButtonRecord, ButtonSound, ButtonSounds, ButtonStates};
pub use font::{Font, FontFlags, FontInfo, FontLayout, Glyph, KerningRecord};
pub use morph::MorphShape;
pub use shape::{
	FillStyle, Gradient, LineCap, LineJoin, LineStyle, Shape, ShapePath, ShapeRecord, ShapeStyles,
	StyleChange,
};
pub use sprite::Sprite;
pub use text::{EditText, GlyphEntry, Text, TextAlign, TextLayout, TextRecord};

use crate::codec::BitReader;
use crate::error::TagError;
use crate::sound::SoundDefinition;

/// Opaque payload of `DefineBinaryData`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryData {
	/// Character ID
	pub id: u16,
	/// Payload bytes
	pub data: Vec<u8>,
}

impl BinaryData {
	/// Decodes a `DefineBinaryData` payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		// reserved
		reader.read_u32()?;
		Ok(Self {
			id,
			data: reader.read_rest().to_vec(),
		})
	}
}

/// Any decoded character
#[derive(Debug, Clone, PartialEq)]
pub enum CharacterDefinition {
	/// Vector shape
	Shape(Shape),
	/// Interpolated shape
	MorphShape(MorphShape),
	/// Movie clip
	Sprite(Sprite),
	/// Font
	Font(Font),
	/// Bitmap image
	Bitmap(Bitmap),
	/// Event sound
	Sound(SoundDefinition),
	/// Static text
	Text(Text),
	/// Dynamic text field
	EditText(EditText),
	/// Button
	Button(Button),
	/// Opaque bytes
	BinaryData(BinaryData),
}

impl CharacterDefinition {
	/// Character ID the definition was declared with
	pub fn id(&self) -> u16 {
		match self {
			CharacterDefinition::Shape(c) => c.id,
			CharacterDefinition::MorphShape(c) => c.id,
			CharacterDefinition::Sprite(c) => c.id,
			CharacterDefinition::Font(c) => c.id,
			CharacterDefinition::Bitmap(c) => c.id,
			CharacterDefinition::Sound(c) => c.id,
			CharacterDefinition::Text(c) => c.id,
			CharacterDefinition::EditText(c) => c.id,
			CharacterDefinition::Button(c) => c.id,
			CharacterDefinition::BinaryData(c) => c.id,
		}
	}

	/// Variant name for logs
	pub fn kind_name(&self) -> &'static str {
		match self {
			CharacterDefinition::Shape(_) => "Shape",
			CharacterDefinition::MorphShape(_) => "MorphShape",
			CharacterDefinition::Sprite(_) => "Sprite",
			CharacterDefinition::Font(_) => "Font",
			CharacterDefinition::Bitmap(_) => "Bitmap",
			CharacterDefinition::Sound(_) => "Sound",
			CharacterDefinition::Text(_) => "Text",
			CharacterDefinition::EditText(_) => "EditText",
			CharacterDefinition::Button(_) => "Button",
			CharacterDefinition::BinaryData(_) => "BinaryData",
		}
	}
}

impl Display for CharacterDefinition {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}#{}", self.kind_name(), self.id())
	}
}
