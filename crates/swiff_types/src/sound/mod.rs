//! Embedded audio: sound definitions, stream heads, start-sound events,
//! decoders and the frame-synchronised player.
//!
//! # Sound format byte
//!
//! ```text
//! UB4  compression     0 native PCM, 1 ADPCM, 2 MP3, 3 little-endian PCM,
//!                      4 Nellymoser 16 kHz, 5 Nellymoser 8 kHz, 6 Nellymoser,
//!                      11 Speex
//! UB2  rate            5512, 11025, 22050, 44100 Hz
//! UB1  16-bit samples
//! UB1  stereo
//! ```

pub mod adpcm;
pub mod mpeg;
pub mod pcm;
pub mod player;

use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::codec::BitReader;
use crate::error::TagError;

pub use pcm::{ExternalDecoder, PcmBuffer, Playback};
pub use player::{AudioSink, ChannelId, SoundPlayer};

/// Sample rates selectable by the two rate bits
pub const SAMPLE_RATES: [u32; 4] = [5512, 11025, 22050, 44100];

/// Audio codec of a sound or stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCompression {
	/// Uncompressed, platform byte order (read as little-endian)
	Native,
	/// Bit-packed IMA ADPCM
	Adpcm,
	/// MPEG audio
	Mp3,
	/// Uncompressed, little-endian
	LittleEndian,
	/// Nellymoser at 16 kHz
	Nellymoser16k,
	/// Nellymoser at 8 kHz
	Nellymoser8k,
	/// Nellymoser at the declared rate
	Nellymoser,
	/// Speex at 16 kHz
	Speex,
}

impl SoundCompression {
	/// Maps the four compression bits.
	pub fn from_code(code: u8) -> Result<Self, TagError> {
		Ok(match code {
			0 => Self::Native,
			1 => Self::Adpcm,
			2 => Self::Mp3,
			3 => Self::LittleEndian,
			4 => Self::Nellymoser16k,
			5 => Self::Nellymoser8k,
			6 => Self::Nellymoser,
			11 => Self::Speex,
			other => {
				return Err(TagError::InvalidValue {
					field: "sound compression",
					value: u32::from(other),
				});
			}
		})
	}

	/// Returns the four compression bits.
	pub fn code(self) -> u8 {
		match self {
			Self::Native => 0,
			Self::Adpcm => 1,
			Self::Mp3 => 2,
			Self::LittleEndian => 3,
			Self::Nellymoser16k => 4,
			Self::Nellymoser8k => 5,
			Self::Nellymoser => 6,
			Self::Speex => 11,
		}
	}

	/// Returns `true` if decoding needs an [`ExternalDecoder`].
	pub fn needs_external_decoder(self) -> bool {
		matches!(
			self,
			Self::Mp3 | Self::Nellymoser16k | Self::Nellymoser8k | Self::Nellymoser | Self::Speex
		)
	}
}

impl Display for SoundCompression {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		let name = match self {
			Self::Native => "native PCM",
			Self::Adpcm => "ADPCM",
			Self::Mp3 => "MP3",
			Self::LittleEndian => "little-endian PCM",
			Self::Nellymoser16k => "Nellymoser 16 kHz",
			Self::Nellymoser8k => "Nellymoser 8 kHz",
			Self::Nellymoser => "Nellymoser",
			Self::Speex => "Speex",
		};
		f.write_str(name)
	}
}

/// Decoded sound format byte
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundFormat {
	/// Codec
	pub compression: SoundCompression,
	/// Effective sample rate in Hz
	pub sample_rate: u32,
	/// 16-bit samples; 8-bit otherwise
	pub is_16_bit: bool,
	/// Two interleaved channels
	pub is_stereo: bool,
}

impl SoundFormat {
	/// Decodes a format byte.
	///
	/// Nellymoser 8 kHz, Nellymoser 16 kHz and Speex ignore the rate bits.
	pub fn from_byte(byte: u8) -> Result<Self, TagError> {
		let compression = SoundCompression::from_code(byte >> 4)?;
		let sample_rate = match compression {
			SoundCompression::Nellymoser8k => 8000,
			SoundCompression::Nellymoser16k | SoundCompression::Speex => 16000,
			_ => SAMPLE_RATES[usize::from((byte >> 2) & 0x03)],
		};
		Ok(Self {
			compression,
			sample_rate,
			is_16_bit: byte & 0x02 != 0,
			is_stereo: byte & 0x01 != 0,
		})
	}

	/// Reads a format byte.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		Self::from_byte(reader.read_u8()?)
	}

	/// Encodes the format byte.
	pub fn to_byte(&self) -> u8 {
		let rate_bits = SAMPLE_RATES
			.iter()
			.position(|&rate| rate == self.sample_rate)
			.unwrap_or(0) as u8;
		(self.compression.code() << 4) | (rate_bits << 2) | (u8::from(self.is_16_bit) << 1) | u8::from(self.is_stereo)
	}

	/// Number of interleaved channels
	pub fn channels(&self) -> u16 {
		if self.is_stereo { 2 } else { 1 }
	}
}

/// Decoded `DefineSound`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundDefinition {
	/// Character ID
	pub id: u16,
	/// Sample format
	pub format: SoundFormat,
	/// Samples per channel
	pub sample_count: u32,
	/// Encoded audio; MP3 data starts with a two-byte seek
	pub data: Vec<u8>,
}

impl SoundDefinition {
	/// Decodes a `DefineSound` payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		Ok(Self {
			id: reader.read_u16()?,
			format: SoundFormat::from_reader(reader)?,
			sample_count: reader.read_u32()?,
			data: reader.read_rest().to_vec(),
		})
	}

	/// Encoded audio without the MP3 seek prefix.
	pub fn audio_data(&self) -> &[u8] {
		match self.format.compression {
			SoundCompression::Mp3 => self.data.get(2..).unwrap_or_default(),
			_ => &self.data,
		}
	}

	/// Playback length in seconds
	pub fn duration(&self) -> f64 {
		f64::from(self.sample_count) / f64::from(self.format.sample_rate)
	}
}

/// One envelope control point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SoundEnvelopePoint {
	/// Position in 44.1 kHz samples
	pub position: u32,
	/// Left level, 0 to 32768
	pub left: u16,
	/// Right level, 0 to 32768
	pub right: u16,
}

/// Playback parameters of a start-sound event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundInfo {
	/// Stop the sound instead of starting it
	pub sync_stop: bool,
	/// Do not start if the sound is already playing
	pub no_multiple: bool,
	/// First sample to play, in 44.1 kHz samples
	pub in_point: Option<u32>,
	/// Sample to stop at, in 44.1 kHz samples
	pub out_point: Option<u32>,
	/// Times to play
	pub loop_count: u16,
	/// Volume envelope
	pub envelope: Option<Vec<SoundEnvelopePoint>>,
}

impl Default for SoundInfo {
	fn default() -> Self {
		Self {
			sync_stop: false,
			no_multiple: false,
			in_point: None,
			out_point: None,
			loop_count: 1,
			envelope: None,
		}
	}
}

impl SoundInfo {
	/// Decodes a `SOUNDINFO` record.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let flags = reader.read_u8()?;
		let in_point = (flags & 0x01 != 0).then(|| reader.read_u32()).transpose()?;
		let out_point = (flags & 0x02 != 0).then(|| reader.read_u32()).transpose()?;
		let loop_count = if flags & 0x04 != 0 { reader.read_u16()? } else { 1 };
		let envelope = if flags & 0x08 != 0 {
			let count = reader.read_u8()?;
			let mut points = Vec::with_capacity(usize::from(count));
			for _ in 0..count {
				points.push(SoundEnvelopePoint {
					position: reader.read_u32()?,
					left: reader.read_u16()?,
					right: reader.read_u16()?,
				});
			}
			Some(points)
		} else {
			None
		};

		Ok(Self {
			sync_stop: flags & 0x20 != 0,
			no_multiple: flags & 0x10 != 0,
			in_point,
			out_point,
			loop_count,
			envelope,
		})
	}
}

/// Sound a start-sound event refers to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundTarget {
	/// `StartSound`: a sound character
	Character(u16),
	/// `StartSound2`: a class name bound through `SymbolClass`
	Class(String),
}

/// Decoded `StartSound` or `StartSound2`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundEvent {
	/// Sound to start or stop
	pub target: SoundTarget,
	/// Playback parameters
	pub info: SoundInfo,
}

impl SoundEvent {
	/// Decodes a `StartSound` (version 1) or `StartSound2` (version 2) payload.
	pub fn from_reader(reader: &mut BitReader<'_>, version: u8) -> Result<Self, TagError> {
		let target = if version >= 2 {
			SoundTarget::Class(reader.read_string()?)
		} else {
			SoundTarget::Character(reader.read_u16()?)
		};
		Ok(Self {
			target,
			info: SoundInfo::from_reader(reader)?,
		})
	}
}

/// Decoded `SoundStreamHead` or `SoundStreamHead2`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoundStreamHead {
	/// Advisory playback format
	pub playback_format: SoundFormat,
	/// Format of the stream blocks
	pub stream_format: SoundFormat,
	/// Average samples per block
	pub samples_per_block: u16,
	/// MP3 latency seek
	pub latency_seek: Option<i16>,
}

impl SoundStreamHead {
	/// Decodes a stream head payload.
	///
	/// Version 1 heads only allow ADPCM and MP3, version 2 anything; both are
	/// read the same way.
	pub fn from_reader(reader: &mut BitReader<'_>, _version: u8) -> Result<Self, TagError> {
		// UB4 reserved
		let playback_format = SoundFormat::from_byte(reader.read_u8()? & 0x0F)?;
		let stream_format = SoundFormat::from_reader(reader)?;
		let samples_per_block = reader.read_u16()?;
		let latency_seek = match stream_format.compression {
			SoundCompression::Mp3 if reader.remaining() >= 2 => Some(reader.read_i16()?),
			_ => None,
		};
		Ok(Self {
			playback_format,
			stream_format,
			samples_per_block,
			latency_seek,
		})
	}
}
