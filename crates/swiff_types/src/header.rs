//! Movie header.
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----------------------------------------------
//! 0x00    3     signature   "FWS" plain, "CWS" zlib, "ZWS" LZMA
//! 0x03    1     version
//! 0x04    4     file length (declared, uncompressed)
//! 0x08    var   stage bounds (packed RECT, twips)
//! ...     2     frame rate (unsigned 8.8 fixed point)
//! ...     2     frame count (declared)
//! ```
//!
//! The parser always receives the decompressed body, so the signature is only
//! recorded. Declared length and frame count are sizing hints and are never
//! trusted for bounds.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::codec::BitReader;
use crate::error::MovieError;
use crate::types::Rect;

/// Signature of an uncompressed movie
pub const SIGNATURE_UNCOMPRESSED: [u8; 3] = *b"FWS";

/// Signature of a zlib-compressed movie
pub const SIGNATURE_ZLIB: [u8; 3] = *b"CWS";

/// Signature of an LZMA-compressed movie
pub const SIGNATURE_LZMA: [u8; 3] = *b"ZWS";

/// Compression scheme named by the signature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
	/// Stored as-is
	None,
	/// Body after byte 8 was zlib-compressed
	Zlib,
	/// Body after byte 8 was LZMA-compressed
	Lzma,
}

impl Compression {
	/// Identifies the scheme from the first three bytes.
	pub fn from_signature(signature: &[u8]) -> Option<Self> {
		match signature {
			s if s == SIGNATURE_UNCOMPRESSED => Some(Self::None),
			s if s == SIGNATURE_ZLIB => Some(Self::Zlib),
			s if s == SIGNATURE_LZMA => Some(Self::Lzma),
			_ => None,
		}
	}
}

impl Display for Compression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Compression::None => write!(f, "None"),
			Compression::Zlib => write!(f, "Zlib"),
			Compression::Lzma => write!(f, "LZMA"),
		}
	}
}

/// Decoded movie header
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Header {
	/// Format version
	pub version: u8,
	/// Compression scheme the original file used
	pub compression: Compression,
	/// Declared uncompressed file length
	pub file_length: u32,
	/// Stage bounds in twips
	pub stage: Rect,
	/// Frames per second
	pub frame_rate: f32,
	/// Declared number of frames on the main timeline
	pub frame_count: u16,
}

impl Header {
	/// Size of the signature, version and length fields
	pub const FIXED_SIZE: usize = 8;

	/// Returns `true` if the original file was compressed.
	pub fn is_compressed(&self) -> bool {
		self.compression != Compression::None
	}

	/// Parses the header and returns it with the offset of the first tag.
	pub fn parse(data: &[u8]) -> Result<(Self, usize), MovieError> {
		if data.len() < Self::FIXED_SIZE {
			return Err(MovieError::InsufficientData {
				expected: Self::FIXED_SIZE,
				actual: data.len(),
			});
		}

		let signature = [data[0], data[1], data[2]];
		let compression =
			Compression::from_signature(&signature).ok_or(MovieError::InvalidSignature(signature))?;
		let version = data[3];
		let file_length = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);

		let mut reader = BitReader::new(&data[Self::FIXED_SIZE..]);
		let stage = Rect::from_reader(&mut reader).map_err(MovieError::CorruptHeader)?;
		let frame_rate = reader.read_ufixed8().map_err(MovieError::CorruptHeader)?;
		let frame_count = reader.read_u16().map_err(MovieError::CorruptHeader)?;

		let header = Self {
			version,
			compression,
			file_length,
			stage,
			frame_rate,
			frame_count,
		};
		Ok((header, Self::FIXED_SIZE + reader.position()))
	}
}

impl Display for Header {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(
			f,
			"Header:\n\
			- Version: {}\n\
			- Compression: {}\n\
			- File Length: {} bytes\n\
			- Stage: {}x{} twips\n\
			- Frame Rate: {} fps\n\
			- Frame Count: {}",
			self.version,
			self.compression,
			self.file_length,
			self.stage.width(),
			self.stage.height(),
			self.frame_rate,
			self.frame_count
		)
	}
}
