//! Static text (`DefineText` 1 and 2) and dynamic text fields (`DefineEditText`).

use crate::codec::BitReader;
use crate::error::TagError;
use crate::transform::Matrix;
use crate::types::{Color, Rect};

/// Glyph reference inside a text record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GlyphEntry {
	/// Index into the font's glyph table
	pub index: u32,
	/// Advance to the next glyph in twips
	pub advance: i32,
}

/// Run of glyphs sharing font, color and position state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextRecord {
	/// New font, if changed
	pub font_id: Option<u16>,
	/// New color, if changed
	pub color: Option<Color>,
	/// New x offset, if changed
	pub x_offset: Option<i16>,
	/// New y offset, if changed
	pub y_offset: Option<i16>,
	/// New text height in twips; present whenever the font changes
	pub height: Option<u16>,
	/// Glyphs of the run
	pub glyphs: Vec<GlyphEntry>,
}

/// Decoded `DefineText` or `DefineText2`
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
	/// Character ID
	pub id: u16,
	/// Tag version, 1 or 2
	pub version: u8,
	/// Text bounds
	pub bounds: Rect,
	/// Text space to character space
	pub matrix: Matrix,
	/// Glyph runs
	pub records: Vec<TextRecord>,
}

impl Text {
	/// Decodes a `DefineText` payload of the given version.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let bounds = Rect::from_reader(reader)?;
		let matrix = Matrix::from_reader(reader)?;
		let glyph_bits = u32::from(reader.read_u8()?);
		let advance_bits = u32::from(reader.read_u8()?);

		let mut records = Vec::new();
		loop {
			let flags = reader.read_u8()?;
			if flags == 0 {
				break;
			}

			let mut record = TextRecord::default();
			if flags & 0x08 != 0 {
				record.font_id = Some(reader.read_u16()?);
			}
			if flags & 0x04 != 0 {
				record.color = Some(Color::from_reader(reader, version >= 2)?);
			}
			if flags & 0x01 != 0 {
				record.x_offset = Some(reader.read_i16()?);
			}
			if flags & 0x02 != 0 {
				record.y_offset = Some(reader.read_i16()?);
			}
			if flags & 0x08 != 0 {
				record.height = Some(reader.read_u16()?);
			}

			let count = reader.read_u8()?;
			record.glyphs = (0..count)
				.map(|_| {
					Ok(GlyphEntry {
						index: reader.read_ub(glyph_bits)?,
						advance: reader.read_sb(advance_bits)?,
					})
				})
				.collect::<Result<_, TagError>>()?;
			reader.align();
			records.push(record);
		}

		Ok(Self {
			id,
			version,
			bounds,
			matrix,
			records,
		})
	}
}

/// Paragraph alignment of an edit text field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TextAlign {
	#[default]
	Left,
	Right,
	Center,
	Justify,
}

/// Paragraph layout of an edit text field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TextLayout {
	/// Alignment
	pub align: TextAlign,
	/// Left margin in twips
	pub left_margin: u16,
	/// Right margin in twips
	pub right_margin: u16,
	/// First-line indent in twips
	pub indent: u16,
	/// Extra line spacing in twips
	pub leading: i16,
}

/// Decoded `DefineEditText`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditText {
	/// Character ID
	pub id: u16,
	/// Field bounds
	pub bounds: Rect,
	/// Font character, if any
	pub font_id: Option<u16>,
	/// Font class name, if any
	pub font_class: Option<String>,
	/// Font height in twips
	pub height: Option<u16>,
	/// Text color
	pub color: Option<Color>,
	/// Maximum number of characters
	pub max_length: Option<u16>,
	/// Paragraph layout
	pub layout: Option<TextLayout>,
	/// Bound variable name
	pub variable_name: String,
	/// Initial text
	pub initial_text: Option<String>,
	/// Wrap long lines
	pub word_wrap: bool,
	/// More than one line
	pub multiline: bool,
	/// Mask the contents
	pub password: bool,
	/// Not editable
	pub read_only: bool,
	/// Resize to fit the text
	pub auto_size: bool,
	/// Text cannot be selected
	pub no_select: bool,
	/// Draw a border and background
	pub border: bool,
	/// Created from static text by the authoring tool
	pub was_static: bool,
	/// `initial_text` is HTML
	pub html: bool,
	/// Render with embedded glyph outlines
	pub use_outlines: bool,
}

impl EditText {
	/// Decodes a `DefineEditText` payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let bounds = Rect::from_reader(reader)?;
		let flags1 = reader.read_u8()?;
		let flags2 = reader.read_u8()?;

		let has_font = flags1 & 0x01 != 0;
		let has_font_class = flags2 & 0x80 != 0;

		let mut text = Self {
			id,
			bounds,
			word_wrap: flags1 & 0x40 != 0,
			multiline: flags1 & 0x20 != 0,
			password: flags1 & 0x10 != 0,
			read_only: flags1 & 0x08 != 0,
			auto_size: flags2 & 0x40 != 0,
			no_select: flags2 & 0x10 != 0,
			border: flags2 & 0x08 != 0,
			was_static: flags2 & 0x04 != 0,
			html: flags2 & 0x02 != 0,
			use_outlines: flags2 & 0x01 != 0,
			..Self::default()
		};

		if has_font {
			text.font_id = Some(reader.read_u16()?);
		}
		if has_font_class {
			text.font_class = Some(reader.read_string()?);
		}
		if has_font || has_font_class {
			text.height = Some(reader.read_u16()?);
		}
		if flags1 & 0x04 != 0 {
			text.color = Some(Color::from_rgba(reader)?);
		}
		if flags1 & 0x02 != 0 {
			text.max_length = Some(reader.read_u16()?);
		}
		if flags2 & 0x20 != 0 {
			text.layout = Some(TextLayout {
				align: match reader.read_u8()? {
					1 => TextAlign::Right,
					2 => TextAlign::Center,
					3 => TextAlign::Justify,
					_ => TextAlign::Left,
				},
				left_margin: reader.read_u16()?,
				right_margin: reader.read_u16()?,
				indent: reader.read_u16()?,
				leading: reader.read_i16()?,
			});
		}
		text.variable_name = reader.read_string()?;
		if flags1 & 0x80 != 0 {
			text.initial_text = Some(reader.read_string()?);
		}
		Ok(text)
	}
}
