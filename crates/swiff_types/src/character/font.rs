//! Fonts: `DefineFont` 1 to 4 and the `DefineFontInfo` tags that extend them.
//!
//! Glyph outlines of `DefineFont` and `DefineFont2` are laid out on a
//! 1024-unit em square; `DefineFont3` uses 20480 units. `DefineFont4` carries
//! an embedded font file instead of outlines.

use crate::codec::BitReader;
use crate::error::TagError;
use crate::types::Rect;

use super::shape::{ShapeContext, ShapeRecord, read_shape_records};

/// Font flags shared by `DefineFont2/3` and `DefineFontInfo`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FontFlags {
	/// Bold face
	pub bold: bool,
	/// Italic face
	pub italic: bool,
	/// Glyphs are tuned for small sizes
	pub small_text: bool,
	/// Code table is Shift-JIS
	pub shift_jis: bool,
	/// Code table is ANSI
	pub ansi: bool,
	/// Code table entries are 16 bits wide
	pub wide_codes: bool,
}

/// Kerning adjustment between two character codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KerningRecord {
	/// Left character code
	pub left: u16,
	/// Right character code
	pub right: u16,
	/// Advance adjustment in em units
	pub adjustment: i16,
}

/// Layout metrics of `DefineFont2/3`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontLayout {
	/// Ascent in em units
	pub ascent: u16,
	/// Descent in em units
	pub descent: u16,
	/// Line gap in em units
	pub leading: i16,
	/// Kerning pairs
	pub kerning: Vec<KerningRecord>,
}

/// One glyph with its code point and optional metrics
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Glyph {
	/// Outline records
	pub records: Vec<ShapeRecord>,
	/// Character code from the code table, 0 if unknown
	pub code: u16,
	/// Horizontal advance when the font has layout
	pub advance: Option<i16>,
	/// Glyph bounds when the font has layout
	pub bounds: Option<Rect>,
}

/// Decoded font definition
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Font {
	/// Character ID
	pub id: u16,
	/// Tag version, 1 to 4
	pub version: u8,
	/// Font name, empty for unnamed `DefineFont` fonts
	pub name: String,
	/// Style and encoding flags
	pub flags: FontFlags,
	/// Language code
	pub language: u8,
	/// Glyph table, indexed by text records
	pub glyphs: Vec<Glyph>,
	/// Metrics and kerning
	pub layout: Option<FontLayout>,
	/// Embedded font file of `DefineFont4`
	pub font_data: Option<Vec<u8>>,
}

impl Font {
	/// Em square size of the glyph outlines
	pub fn em_square(&self) -> u32 {
		if self.version >= 3 {
			20480
		} else {
			1024
		}
	}

	/// Looks up the glyph index for a character code.
	pub fn glyph_index(&self, code: u16) -> Option<usize> {
		self.glyphs.iter().position(|g| g.code == code)
	}

	/// Decodes a `DefineFont` payload of the given version.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		match version {
			1 => Self::read_font1(reader),
			4 => Self::read_font4(reader),
			_ => Self::read_font2(reader, version),
		}
	}

	fn read_font1(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let table = reader.read_rest();
		let mut table_reader = reader.sub_reader(table);

		// The first offset also gives the size of the offset table
		let mut offsets = Vec::new();
		if !table.is_empty() {
			let first = table_reader.read_u16()?;
			offsets.push(usize::from(first));
			for _ in 1..usize::from(first / 2) {
				offsets.push(usize::from(table_reader.read_u16()?));
			}
		}

		let glyphs = read_glyph_shapes(reader, table, &offsets, table.len())?;
		Ok(Self {
			id,
			version: 1,
			glyphs,
			..Self::default()
		})
	}

	fn read_font2(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let bits = reader.read_u8()?;
		let has_layout = bits & 0x80 != 0;
		let wide_offsets = bits & 0x08 != 0;
		let flags = FontFlags {
			shift_jis: bits & 0x40 != 0,
			small_text: bits & 0x20 != 0,
			ansi: bits & 0x10 != 0,
			wide_codes: bits & 0x04 != 0,
			italic: bits & 0x02 != 0,
			bold: bits & 0x01 != 0,
		};
		let language = reader.read_u8()?;
		let name = reader.read_length_prefixed_string()?;
		let glyph_count = usize::from(reader.read_u16()?);

		// Offsets are relative to the start of the offset table
		let table = reader.read_rest();
		let mut table_reader = reader.sub_reader(table);
		let read_offset = |r: &mut BitReader<'_>| -> Result<usize, TagError> {
			if wide_offsets {
				Ok(r.read_u32()? as usize)
			} else {
				Ok(usize::from(r.read_u16()?))
			}
		};
		let offsets = (0..glyph_count)
			.map(|_| read_offset(&mut table_reader))
			.collect::<Result<Vec<_>, _>>()?;
		let code_table_offset = if glyph_count > 0 || table_reader.remaining() > 0 {
			read_offset(&mut table_reader)?
		} else {
			table.len()
		};

		let mut glyphs = read_glyph_shapes(reader, table, &offsets, code_table_offset)?;

		let mut rest = reader.sub_reader(table.get(code_table_offset..).unwrap_or_default());
		for glyph in &mut glyphs {
			glyph.code = if flags.wide_codes {
				rest.read_u16()?
			} else {
				u16::from(rest.read_u8()?)
			};
		}

		let layout = if has_layout {
			let ascent = rest.read_u16()?;
			let descent = rest.read_u16()?;
			let leading = rest.read_i16()?;
			for glyph in &mut glyphs {
				glyph.advance = Some(rest.read_i16()?);
			}
			for glyph in &mut glyphs {
				glyph.bounds = Some(Rect::from_reader(&mut rest)?);
			}
			let kerning_count = rest.read_u16()?;
			let kerning = (0..kerning_count)
				.map(|_| {
					let (left, right) = if flags.wide_codes {
						(rest.read_u16()?, rest.read_u16()?)
					} else {
						(u16::from(rest.read_u8()?), u16::from(rest.read_u8()?))
					};
					Ok(KerningRecord {
						left,
						right,
						adjustment: rest.read_i16()?,
					})
				})
				.collect::<Result<_, TagError>>()?;
			Some(FontLayout {
				ascent,
				descent,
				leading,
				kerning,
			})
		} else {
			None
		};

		Ok(Self {
			id,
			version,
			name,
			flags,
			language,
			glyphs,
			layout,
			font_data: None,
		})
	}

	fn read_font4(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let bits = reader.read_u8()?;
		let name = reader.read_string()?;
		let data = reader.read_rest();
		Ok(Self {
			id,
			version: 4,
			name,
			flags: FontFlags {
				italic: bits & 0x02 != 0,
				bold: bits & 0x01 != 0,
				..FontFlags::default()
			},
			font_data: (bits & 0x04 != 0).then(|| data.to_vec()),
			..Self::default()
		})
	}

	/// Returns a copy with the names, flags and codes of a `DefineFontInfo`.
	pub fn with_info(&self, info: &FontInfo) -> Self {
		let mut font = self.clone();
		font.name.clone_from(&info.name);
		font.flags = info.flags;
		if let Some(language) = info.language {
			font.language = language;
		}
		for (glyph, &code) in font.glyphs.iter_mut().zip(&info.codes) {
			glyph.code = code;
		}
		font
	}
}

/// Cuts `table` at `offsets` and decodes each glyph outline.
fn read_glyph_shapes(
	reader: &BitReader<'_>,
	table: &[u8],
	offsets: &[usize],
	end: usize,
) -> Result<Vec<Glyph>, TagError> {
	let ctx = ShapeContext::shape(1);
	offsets
		.iter()
		.enumerate()
		.map(|(i, &start)| {
			let stop = offsets.get(i + 1).copied().unwrap_or(end).min(table.len());
			let data = table.get(start..stop).ok_or(TagError::InvalidValue {
				field: "glyph offset",
				value: start as u32,
			})?;
			let records = if data.is_empty() {
				Vec::new()
			} else {
				read_shape_records(&mut reader.sub_reader(data), ctx)?
			};
			Ok(Glyph {
				records,
				..Glyph::default()
			})
		})
		.collect()
}

/// Decoded `DefineFontInfo` or `DefineFontInfo2`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FontInfo {
	/// Font the info applies to
	pub font_id: u16,
	/// Font name
	pub name: String,
	/// Style and encoding flags
	pub flags: FontFlags,
	/// Language code (version 2)
	pub language: Option<u8>,
	/// Character code of each glyph
	pub codes: Vec<u16>,
}

impl FontInfo {
	/// Decodes a `DefineFontInfo` payload of the given version.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let font_id = reader.read_u16()?;
		let name = reader.read_length_prefixed_string()?;
		let bits = reader.read_u8()?;
		let flags = FontFlags {
			small_text: bits & 0x20 != 0,
			shift_jis: bits & 0x10 != 0,
			ansi: bits & 0x08 != 0,
			italic: bits & 0x04 != 0,
			bold: bits & 0x02 != 0,
			wide_codes: bits & 0x01 != 0 || version >= 2,
		};
		let language = if version >= 2 {
			Some(reader.read_u8()?)
		} else {
			None
		};

		let mut codes = Vec::with_capacity(reader.remaining());
		while !reader.is_empty() {
			codes.push(if flags.wide_codes {
				reader.read_u16()?
			} else {
				u16::from(reader.read_u8()?)
			});
		}
		Ok(Self {
			font_id,
			name,
			flags,
			language,
			codes,
		})
	}
}
