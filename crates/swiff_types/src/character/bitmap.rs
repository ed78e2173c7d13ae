//! Bitmap definitions.
//!
//! Image payloads are kept as raw bytes; decoding JPEG, PNG, GIF or the zlib
//! streams of lossless bitmaps is left to the rendering backend.
//!
//! | Tag | Layout after the character ID |
//! |-----|-------------------------------|
//! | `DefineBits` | JPEG data without tables (uses `JPEGTables`) |
//! | `DefineBitsJPEG2` | JPEG, PNG or GIF89a |
//! | `DefineBitsJPEG3` | `UI32` image size, image, zlib alpha plane |
//! | `DefineBitsJPEG4` | `UI32` image size, `FIXED8` deblocking, image, zlib alpha plane |
//! | `DefineBitsLossless(2)` | format, width, height, [color table size], zlib data |

use std::fmt::Display;

use crate::codec::BitReader;
use crate::error::TagError;

/// Image container identified from its leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageFormat {
	/// JFIF / JPEG
	Jpeg,
	/// PNG
	Png,
	/// GIF89a
	Gif,
	/// Anything else
	Unknown,
}

impl ImageFormat {
	/// Identifies the container from its signature.
	pub fn sniff(data: &[u8]) -> Self {
		match data {
			[0xFF, 0xD8, ..] => Self::Jpeg,
			[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Self::Png,
			[b'G', b'I', b'F', b'8', b'9', b'a', ..] => Self::Gif,
			_ => Self::Unknown,
		}
	}
}

impl Display for ImageFormat {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			ImageFormat::Jpeg => write!(f, "JPEG"),
			ImageFormat::Png => write!(f, "PNG"),
			ImageFormat::Gif => write!(f, "GIF"),
			ImageFormat::Unknown => write!(f, "Unknown"),
		}
	}
}

/// Removes the stray `FF D9 FF D8` marker pair some encoders put in front of
/// the JPEG stream.
pub fn strip_erroneous_header(data: &[u8]) -> &[u8] {
	data.strip_prefix(&[0xFF, 0xD9, 0xFF, 0xD8]).unwrap_or(data)
}

/// Pixel layout of a lossless bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LosslessFormat {
	/// 8-bit indices into a color table
	ColorMapped {
		/// Number of color table entries
		table_size: u16,
	},
	/// 15-bit RGB (version 1 only)
	Rgb15,
	/// 24-bit RGB or 32-bit ARGB
	Rgb32,
}

/// How the bitmap's pixels are stored
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BitmapEncoding {
	/// A compressed image container
	Image {
		/// Container format of `data`
		format: ImageFormat,
		/// JPEG stream needs the movie's shared tables
		uses_shared_tables: bool,
		/// Deblocking filter strength (`DefineBitsJPEG4`)
		deblocking: Option<u16>,
	},
	/// Zlib-compressed raw pixels
	Lossless {
		/// Pixel layout
		format: LosslessFormat,
		/// Width in pixels
		width: u16,
		/// Height in pixels
		height: u16,
		/// Pixels carry alpha (`DefineBitsLossless2`)
		has_alpha: bool,
	},
}

/// Decoded bitmap definition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
	/// Character ID
	pub id: u16,
	/// Storage layout
	pub encoding: BitmapEncoding,
	/// Image or zlib data
	pub data: Vec<u8>,
	/// Zlib-compressed alpha plane for JPEG images
	pub alpha_data: Option<Vec<u8>>,
}

impl Bitmap {
	/// Decodes a `DefineBits` family payload (`version` 1 to 4).
	pub fn from_jpeg_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let (image_size, deblocking) = match version {
			3 => (Some(reader.read_u32()? as usize), None),
			4 => (Some(reader.read_u32()? as usize), Some(reader.read_u16()?)),
			_ => (None, None),
		};

		let image = match image_size {
			Some(size) => reader.read_bytes(size)?,
			None => reader.read_rest(),
		};
		let image = strip_erroneous_header(image);
		let alpha = reader.read_rest();

		Ok(Self {
			id,
			encoding: BitmapEncoding::Image {
				format: ImageFormat::sniff(image),
				uses_shared_tables: version == 1,
				deblocking,
			},
			data: image.to_vec(),
			alpha_data: (!alpha.is_empty()).then(|| alpha.to_vec()),
		})
	}

	/// Decodes a `DefineBitsLossless` payload (`version` 1 or 2).
	pub fn from_lossless_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let id = reader.read_u16()?;
		let format_code = reader.read_u8()?;
		let width = reader.read_u16()?;
		let height = reader.read_u16()?;
		let format = match format_code {
			3 => LosslessFormat::ColorMapped {
				table_size: u16::from(reader.read_u8()?) + 1,
			},
			4 if version == 1 => LosslessFormat::Rgb15,
			5 => LosslessFormat::Rgb32,
			other => {
				return Err(TagError::InvalidValue {
					field: "lossless bitmap format",
					value: u32::from(other),
				});
			}
		};

		Ok(Self {
			id,
			encoding: BitmapEncoding::Lossless {
				format,
				width,
				height,
				has_alpha: version >= 2,
			},
			data: reader.read_rest().to_vec(),
			alpha_data: None,
		})
	}

	/// Returns `true` if the JPEG stream must be joined with `JPEGTables`.
	pub fn needs_shared_tables(&self) -> bool {
		matches!(
			self.encoding,
			BitmapEncoding::Image {
				uses_shared_tables: true,
				..
			}
		)
	}
}
