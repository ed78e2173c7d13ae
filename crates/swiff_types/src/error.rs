//! Error types for movie parsing, tag decoding and sound handling.

use thiserror::Error;

use crate::tag::TagCode;

/// Fatal errors that abort parsing of a whole movie
#[derive(Debug, Error)]
pub enum MovieError {
	/// Not enough data to parse
	#[error("Insufficient data: expected at least {expected} bytes, got {actual} bytes")]
	InsufficientData {
		/// Expected number of bytes
		expected: usize,
		/// Actual number of bytes
		actual: usize,
	},

	/// Unknown compression-scheme signature
	#[error("Invalid signature: {0:02X?}")]
	InvalidSignature([u8; 3]),

	/// The header could not be decoded past the signature
	#[error("Corrupt header: {0}")]
	CorruptHeader(#[source] TagError),

	/// A tag declares more payload than the buffer holds
	#[error(
		"Tag {code} at offset {offset} declares {declared} bytes, but only {available} bytes remain"
	)]
	TagOverrun {
		/// Code of the offending tag
		code: TagCode,
		/// Offset of the tag header
		offset: usize,
		/// Declared payload length
		declared: usize,
		/// Remaining bytes in the buffer
		available: usize,
	},

	/// The buffer ended without an `End` tag while parsing in strict mode
	#[error("Tag stream ends at offset {offset} without an End tag")]
	MissingEnd {
		/// Offset just past the last complete tag
		offset: usize,
	},

	/// A tag failed to decode while parsing in strict mode
	#[error("Tag {code} at offset {offset} is malformed: {source}")]
	MalformedTag {
		/// Code of the offending tag
		code: TagCode,
		/// Offset of the tag header
		offset: usize,
		/// Underlying decode failure
		#[source]
		source: TagError,
	},

	/// IO error
	#[error(transparent)]
	IOError(#[from] std::io::Error),
}

/// Errors raised while decoding the payload of a single tag
///
/// These never escape a lenient parse: the tag is dropped and parsing resumes
/// at the next tag boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TagError {
	/// The payload ended before a field could be read
	#[error("Unexpected end of data: needed {needed} more bytes at offset {offset}")]
	UnexpectedEof {
		/// Bytes requested beyond the end
		needed: usize,
		/// Read position inside the payload
		offset: usize,
	},

	/// A field holds a value that cannot be decoded
	#[error("Invalid value {value} for field `{field}`")]
	InvalidValue {
		/// Name of the field
		field: &'static str,
		/// Raw value read
		value: u32,
	},

	/// The filter list names a kind this decoder does not know
	#[error("Unknown filter kind {0}")]
	UnknownFilter(u8),

	/// A string is missing its terminator
	#[error("Unterminated string at offset {0}")]
	UnterminatedString(usize),
}

/// Errors raised while decoding an MPEG audio frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum MpegError {
	/// Fewer than four bytes were available
	#[error("Truncated frame header: {0} bytes")]
	Truncated(usize),

	/// The 11-bit sync word is not all ones
	#[error("Invalid frame sync")]
	InvalidFrameSync,

	/// Free-format or reserved bitrate index
	#[error("Bad bitrate index {0:#06b}")]
	BadBitrate(u8),

	/// Version bits `01`
	#[error("Reserved MPEG version")]
	ReservedVersion,

	/// Layer bits `00`
	#[error("Reserved MPEG layer")]
	ReservedLayer,

	/// Sampling-rate index `11`
	#[error("Reserved sampling rate index")]
	ReservedSamplingRate,

	/// Emphasis bits `10`
	#[error("Reserved emphasis")]
	ReservedEmphasis,
}

/// Errors raised by sound decoding and playback
#[derive(Debug, Error)]
pub enum SoundError {
	/// The referenced sound character does not exist
	#[error("Sound {0} not found")]
	NotFound(u16),

	/// Decoding needs an external codec that was not provided
	#[error("No external decoder available for {0}")]
	MissingDecoder(crate::sound::SoundCompression),

	/// Sample data is malformed
	#[error("Invalid sample data: {0}")]
	InvalidData(String),

	/// MPEG frame header error
	#[error(transparent)]
	Mpeg(#[from] MpegError),

	/// WAV export error
	#[error(transparent)]
	Wav(#[from] hound::Error),

	/// IO error
	#[error(transparent)]
	IOError(#[from] std::io::Error),
}
