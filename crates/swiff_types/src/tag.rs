//! Tag records and the lazy tag iterator.
//!
//! # Tag header
//!
//! ```text
//! UI16  code_and_length   code = value >> 6, length = value & 0x3F
//! UI32  long_length       present only when length == 0x3F
//! ```
//!
//! The payload is exactly `length` bytes. Decoders get a slice of that size, so
//! a decoder that reads too little or too much can never shift the start of
//! the next tag.
//!
//! # Versioned codes
//!
//! Several codes are revisions of one logical construct. [`TagCode::kind`]
//! folds them into a [`TagKind`] plus a version number so each construct has a
//! single decoder:
//!
//! | Kind | Codes (version) |
//! |------|-----------------|
//! | `DefineShape` | 2 (1), 22 (2), 32 (3), 83 (4) |
//! | `PlaceObject` | 4 (1), 26 (2), 70 (3) |
//! | `DefineBits` | 6 (1), 21 (2), 35 (3), 90 (4) |
//! | `DefineFont` | 10 (1), 48 (2), 75 (3), 91 (4) |

use std::fmt::Display;

use log::trace;

use crate::error::MovieError;

macro_rules! tag_codes {
	($($(#[$doc:meta])* $name:ident = $value:literal,)*) => {
		/// Numeric tag codes
		#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
		pub enum TagCode {
			$($(#[$doc])* $name,)*
			/// A code this decoder does not know
			Unknown(u16),
		}

		impl TagCode {
			/// Maps a raw code to a tag code.
			pub fn from_u16(value: u16) -> Self {
				match value {
					$($value => Self::$name,)*
					other => Self::Unknown(other),
				}
			}

			/// Returns the raw code.
			pub fn to_u16(self) -> u16 {
				match self {
					$(Self::$name => $value,)*
					Self::Unknown(other) => other,
				}
			}

			/// Returns the tag's name as used in the format documentation.
			pub fn name(self) -> &'static str {
				match self {
					$(Self::$name => stringify!($name),)*
					Self::Unknown(_) => "Unknown",
				}
			}
		}
	};
}

tag_codes! {
	/// End of a tag stream
	End = 0,
	/// Frame boundary
	ShowFrame = 1,
	/// Shape definition, version 1
	DefineShape = 2,
	/// Display-list placement, version 1
	PlaceObject = 4,
	/// Display-list removal by character and depth
	RemoveObject = 5,
	/// JPEG image using shared tables
	DefineBits = 6,
	/// Button, version 1
	DefineButton = 7,
	/// Shared JPEG encoding tables
	JpegTables = 8,
	/// Stage background color
	SetBackgroundColor = 9,
	/// Glyph-only font
	DefineFont = 10,
	/// Static text, version 1
	DefineText = 11,
	/// Frame script
	DoAction = 12,
	/// Font names and code table, version 1
	DefineFontInfo = 13,
	/// Event sound
	DefineSound = 14,
	/// Event sound trigger, version 1
	StartSound = 15,
	/// Button state sounds
	DefineButtonSound = 17,
	/// Stream sound format, version 1
	SoundStreamHead = 18,
	/// Stream sound data for one frame
	SoundStreamBlock = 19,
	/// Zlib bitmap, version 1
	DefineBitsLossless = 20,
	/// Self-contained JPEG
	DefineBitsJpeg2 = 21,
	/// Shape definition, version 2
	DefineShape2 = 22,
	/// Button color transform
	DefineButtonCxform = 23,
	/// Authoring protection marker
	Protect = 24,
	/// Display-list placement, version 2
	PlaceObject2 = 26,
	/// Display-list removal by depth
	RemoveObject2 = 28,
	/// Shape definition, version 3
	DefineShape3 = 32,
	/// Static text, version 2
	DefineText2 = 33,
	/// Button, version 2
	DefineButton2 = 34,
	/// JPEG with alpha
	DefineBitsJpeg3 = 35,
	/// Zlib bitmap with alpha
	DefineBitsLossless2 = 36,
	/// Dynamic text field
	DefineEditText = 37,
	/// Movie clip with its own timeline
	DefineSprite = 39,
	/// Label of the current frame
	FrameLabel = 43,
	/// Stream sound format, version 2
	SoundStreamHead2 = 45,
	/// Morph shape, version 1
	DefineMorphShape = 46,
	/// Font with layout, version 2
	DefineFont2 = 48,
	/// Exported character names
	ExportAssets = 56,
	/// Imported characters
	ImportAssets = 57,
	/// Debugger switch, version 1
	EnableDebugger = 58,
	/// Initialization script
	DoInitAction = 59,
	/// Video stream definition
	DefineVideoStream = 60,
	/// Video frame data
	VideoFrame = 61,
	/// Font names and code table, version 2
	DefineFontInfo2 = 62,
	/// Debugger switch, version 2
	EnableDebugger2 = 64,
	/// Script execution limits
	ScriptLimits = 65,
	/// Tab order
	SetTabIndex = 66,
	/// Movie-wide flags
	FileAttributes = 69,
	/// Display-list placement, version 3
	PlaceObject3 = 70,
	/// Imported characters, version 2
	ImportAssets2 = 71,
	/// Font alignment zones
	DefineFontAlignZones = 73,
	/// Text rendering settings
	CsmTextSettings = 74,
	/// Font with layout, version 3
	DefineFont3 = 75,
	/// Class names bound to characters
	SymbolClass = 76,
	/// XML metadata
	Metadata = 77,
	/// Nine-slice scaling grid
	DefineScalingGrid = 78,
	/// Bytecode block
	DoAbc = 82,
	/// Shape definition, version 4
	DefineShape4 = 83,
	/// Morph shape, version 2
	DefineMorphShape2 = 84,
	/// Scene and frame label table
	DefineSceneAndFrameLabelData = 86,
	/// Opaque binary payload
	DefineBinaryData = 87,
	/// Font display name
	DefineFontName = 88,
	/// Event sound trigger by class name
	StartSound2 = 89,
	/// JPEG with alpha and deblocking
	DefineBitsJpeg4 = 90,
	/// Embedded font file
	DefineFont4 = 91,
}

impl Display for TagCode {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}({})", self.name(), self.to_u16())
	}
}

/// Logical tag constructs, with versioned codes folded together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum TagKind {
	End,
	ShowFrame,
	DefineShape,
	DefineMorphShape,
	PlaceObject,
	RemoveObject,
	DefineBits,
	DefineBitsLossless,
	JpegTables,
	DefineButton,
	DefineButtonCxform,
	DefineButtonSound,
	SetBackgroundColor,
	DefineFont,
	DefineFontInfo,
	DefineText,
	DefineEditText,
	DefineSound,
	StartSound,
	SoundStreamHead,
	SoundStreamBlock,
	DefineSprite,
	FrameLabel,
	DefineSceneAndFrameLabelData,
	ExportAssets,
	SymbolClass,
	FileAttributes,
	Metadata,
	DefineScalingGrid,
	DefineBinaryData,
	/// Recognised tags that carry nothing this decoder models
	Ignored,
	/// Codes outside the catalogue
	Unknown,
}

impl TagCode {
	/// Folds the code into its logical construct and version.
	pub fn kind(self) -> (TagKind, u8) {
		use TagCode as C;
		use TagKind as K;
		match self {
			C::End => (K::End, 1),
			C::ShowFrame => (K::ShowFrame, 1),
			C::DefineShape => (K::DefineShape, 1),
			C::DefineShape2 => (K::DefineShape, 2),
			C::DefineShape3 => (K::DefineShape, 3),
			C::DefineShape4 => (K::DefineShape, 4),
			C::DefineMorphShape => (K::DefineMorphShape, 1),
			C::DefineMorphShape2 => (K::DefineMorphShape, 2),
			C::PlaceObject => (K::PlaceObject, 1),
			C::PlaceObject2 => (K::PlaceObject, 2),
			C::PlaceObject3 => (K::PlaceObject, 3),
			C::RemoveObject => (K::RemoveObject, 1),
			C::RemoveObject2 => (K::RemoveObject, 2),
			C::DefineBits => (K::DefineBits, 1),
			C::DefineBitsJpeg2 => (K::DefineBits, 2),
			C::DefineBitsJpeg3 => (K::DefineBits, 3),
			C::DefineBitsJpeg4 => (K::DefineBits, 4),
			C::DefineBitsLossless => (K::DefineBitsLossless, 1),
			C::DefineBitsLossless2 => (K::DefineBitsLossless, 2),
			C::JpegTables => (K::JpegTables, 1),
			C::DefineButton => (K::DefineButton, 1),
			C::DefineButton2 => (K::DefineButton, 2),
			C::DefineButtonCxform => (K::DefineButtonCxform, 1),
			C::DefineButtonSound => (K::DefineButtonSound, 1),
			C::SetBackgroundColor => (K::SetBackgroundColor, 1),
			C::DefineFont => (K::DefineFont, 1),
			C::DefineFont2 => (K::DefineFont, 2),
			C::DefineFont3 => (K::DefineFont, 3),
			C::DefineFont4 => (K::DefineFont, 4),
			C::DefineFontInfo => (K::DefineFontInfo, 1),
			C::DefineFontInfo2 => (K::DefineFontInfo, 2),
			C::DefineText => (K::DefineText, 1),
			C::DefineText2 => (K::DefineText, 2),
			C::DefineEditText => (K::DefineEditText, 1),
			C::DefineSound => (K::DefineSound, 1),
			C::StartSound => (K::StartSound, 1),
			C::StartSound2 => (K::StartSound, 2),
			C::SoundStreamHead => (K::SoundStreamHead, 1),
			C::SoundStreamHead2 => (K::SoundStreamHead, 2),
			C::SoundStreamBlock => (K::SoundStreamBlock, 1),
			C::DefineSprite => (K::DefineSprite, 1),
			C::FrameLabel => (K::FrameLabel, 1),
			C::DefineSceneAndFrameLabelData => (K::DefineSceneAndFrameLabelData, 1),
			C::ExportAssets => (K::ExportAssets, 1),
			C::SymbolClass => (K::SymbolClass, 1),
			C::FileAttributes => (K::FileAttributes, 1),
			C::Metadata => (K::Metadata, 1),
			C::DefineScalingGrid => (K::DefineScalingGrid, 1),
			C::DefineBinaryData => (K::DefineBinaryData, 1),
			C::ImportAssets2 | C::EnableDebugger2 => (K::Ignored, 2),
			C::ImportAssets
			| C::EnableDebugger
			| C::DoInitAction
			| C::DoAction
			| C::Protect
			| C::DefineVideoStream
			| C::VideoFrame
			| C::ScriptLimits
			| C::SetTabIndex
			| C::DefineFontAlignZones
			| C::CsmTextSettings
			| C::DoAbc
			| C::DefineFontName => (K::Ignored, 1),
			C::Unknown(_) => (K::Unknown, 0),
		}
	}
}

/// One tag record borrowed from the movie buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag<'a> {
	/// Tag code
	pub code: TagCode,
	/// Offset of the tag header in the buffer the iterator walks
	pub offset: usize,
	/// Offset of the first payload byte, past the short or long header
	pub payload_offset: usize,
	/// Exactly `declared length` bytes of payload
	pub data: &'a [u8],
}

impl Tag<'_> {
	/// Declared payload length
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns `true` for an empty payload
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}
}

/// Lazy iterator over the tags of a tag stream
///
/// Stops after the `End` tag or when the buffer is exhausted on a tag
/// boundary. A tag header that cannot be read, or a declared length that runs
/// past the buffer, yields one error and ends the iteration. Cloning the
/// iterator before use gives a restartable sequence.
#[derive(Debug, Clone)]
pub struct TagIter<'a> {
	data: &'a [u8],
	position: usize,
	base_offset: usize,
	finished: bool,
	end_seen: bool,
}

impl<'a> TagIter<'a> {
	/// Iterates the tag stream in `data`.
	pub fn new(data: &'a [u8]) -> Self {
		Self::with_base_offset(data, 0)
	}

	/// Iterates `data`, reporting offsets relative to an enclosing buffer.
	pub fn with_base_offset(data: &'a [u8], base_offset: usize) -> Self {
		Self {
			data,
			position: 0,
			base_offset,
			finished: false,
			end_seen: false,
		}
	}

	/// Returns `true` once the `End` tag has been yielded.
	pub fn end_seen(&self) -> bool {
		self.end_seen
	}

	/// Offset just past the last tag read
	pub fn offset(&self) -> usize {
		self.base_offset + self.position
	}

	fn read_tag(&mut self) -> Result<Tag<'a>, MovieError> {
		let offset = self.base_offset + self.position;
		let rest = &self.data[self.position..];
		if rest.len() < 2 {
			return Err(MovieError::InsufficientData {
				expected: 2,
				actual: rest.len(),
			});
		}

		let code_and_length = u16::from_le_bytes([rest[0], rest[1]]);
		let code = TagCode::from_u16(code_and_length >> 6);
		let mut length = usize::from(code_and_length & 0x3F);
		let mut header_len = 2;
		if length == 0x3F {
			if rest.len() < 6 {
				return Err(MovieError::InsufficientData {
					expected: 6,
					actual: rest.len(),
				});
			}
			length = u32::from_le_bytes([rest[2], rest[3], rest[4], rest[5]]) as usize;
			header_len = 6;
		}

		let available = rest.len() - header_len;
		if length > available {
			return Err(MovieError::TagOverrun {
				code,
				offset,
				declared: length,
				available,
			});
		}

		self.position += header_len + length;
		trace!("tag {code} at {offset}: {length} bytes");
		Ok(Tag {
			code,
			offset,
			payload_offset: offset + header_len,
			data: &rest[header_len..header_len + length],
		})
	}
}

impl<'a> Iterator for TagIter<'a> {
	type Item = Result<Tag<'a>, MovieError>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.finished || self.position >= self.data.len() {
			return None;
		}

		match self.read_tag() {
			Ok(tag) => {
				if tag.code == TagCode::End {
					self.finished = true;
					self.end_seen = true;
				}
				Some(Ok(tag))
			}
			Err(e) => {
				self.finished = true;
				Some(Err(e))
			}
		}
	}
}
