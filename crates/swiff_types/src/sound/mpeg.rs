//! MPEG audio frame headers.
//!
//! ```text
//! AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
//! A  sync (11 bits, all ones)      G  private
//! B  version                       I  channel mode
//! C  layer                         J  mode extension
//! D  protection (0 = CRC follows)  K  copyright
//! E  bitrate index                 L  original
//! F  sampling rate index           M  emphasis
//! H  padding
//! ```
//!
//! Only the header is decoded. Audio data is handed to an external decoder.

use log::warn;

use crate::error::MpegError;

/// Size of a frame header in bytes
pub const HEADER_SIZE: usize = 4;

/// MPEG version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MpegVersion {
	/// MPEG-1
	V1,
	/// MPEG-2
	V2,
	/// MPEG-2.5
	V2_5,
}

/// MPEG audio layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MpegLayer {
	I,
	II,
	III,
}

/// Channel configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum ChannelMode {
	Stereo,
	JointStereo,
	DualChannel,
	Mono,
}

/// De-emphasis to apply after decoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Emphasis {
	/// No emphasis
	None,
	/// 50/15 microseconds
	Ms50_15,
	/// CCITT J.17
	CcittJ17,
}

/// Bitrates in kbps by `[version row][layer column][index]`
///
/// Rows: MPEG-1, MPEG-2/2.5. Columns: layer I, II, III. Index 0 (free format)
/// and 15 (bad) are rejected before lookup.
const BITRATES: [[[u16; 16]; 3]; 2] = [
	[
		[0, 32, 64, 96, 128, 160, 192, 224, 256, 288, 320, 352, 384, 416, 448, 0],
		[0, 32, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 0],
		[0, 32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 0],
	],
	[
		[0, 32, 48, 56, 64, 80, 96, 112, 128, 144, 160, 176, 192, 224, 256, 0],
		[0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
		[0, 8, 16, 24, 32, 40, 48, 56, 64, 80, 96, 112, 128, 144, 160, 0],
	],
];

/// Sampling rates in Hz by `[version][index]`
const SAMPLE_RATES: [[u32; 3]; 3] = [[44100, 48000, 32000], [22050, 24000, 16000], [11025, 12000, 8000]];

/// Decoded frame header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MpegHeader {
	/// MPEG version
	pub version: MpegVersion,
	/// Layer
	pub layer: MpegLayer,
	/// A 16-bit CRC follows the header
	pub has_crc: bool,
	/// Bitrate in kbps
	pub bitrate: u16,
	/// Sampling rate in Hz
	pub sample_rate: u32,
	/// Frame carries one padding slot
	pub padding: bool,
	/// Private bit
	pub private: bool,
	/// Channel configuration
	pub channel_mode: ChannelMode,
	/// Joint stereo mode extension
	pub mode_extension: u8,
	/// Copyrighted
	pub copyright: bool,
	/// Original media
	pub original: bool,
	/// De-emphasis
	pub emphasis: Emphasis,
	/// Frame length in bytes, header included
	pub frame_size: usize,
}

impl MpegHeader {
	/// Parses and validates the four header bytes at the start of `data`.
	///
	/// Fields are checked in stream order, so the first invalid field decides
	/// the error.
	pub fn parse(data: &[u8]) -> Result<Self, MpegError> {
		let [b0, b1, b2, b3] = match data {
			[b0, b1, b2, b3, ..] => [*b0, *b1, *b2, *b3],
			_ => return Err(MpegError::Truncated(data.len())),
		};

		if b0 != 0xFF || b1 & 0xE0 != 0xE0 {
			return Err(MpegError::InvalidFrameSync);
		}

		let version = match (b1 >> 3) & 0x03 {
			0b00 => MpegVersion::V2_5,
			0b10 => MpegVersion::V2,
			0b11 => MpegVersion::V1,
			_ => return Err(MpegError::ReservedVersion),
		};
		let layer = match (b1 >> 1) & 0x03 {
			0b01 => MpegLayer::III,
			0b10 => MpegLayer::II,
			0b11 => MpegLayer::I,
			_ => return Err(MpegError::ReservedLayer),
		};
		let has_crc = b1 & 0x01 == 0;

		let bitrate_index = b2 >> 4;
		if bitrate_index == 0 || bitrate_index == 0x0F {
			return Err(MpegError::BadBitrate(bitrate_index));
		}
		let row = usize::from(version != MpegVersion::V1);
		let column = match layer {
			MpegLayer::I => 0,
			MpegLayer::II => 1,
			MpegLayer::III => 2,
		};
		let bitrate = BITRATES[row][column][usize::from(bitrate_index)];

		let rate_index = usize::from((b2 >> 2) & 0x03);
		if rate_index == 3 {
			return Err(MpegError::ReservedSamplingRate);
		}
		let rate_row = match version {
			MpegVersion::V1 => 0,
			MpegVersion::V2 => 1,
			MpegVersion::V2_5 => 2,
		};
		let sample_rate = SAMPLE_RATES[rate_row][rate_index];
		let padding = b2 & 0x02 != 0;

		let emphasis = match b3 & 0x03 {
			0b00 => Emphasis::None,
			0b01 => Emphasis::Ms50_15,
			0b11 => Emphasis::CcittJ17,
			_ => return Err(MpegError::ReservedEmphasis),
		};

		Ok(Self {
			version,
			layer,
			has_crc,
			bitrate,
			sample_rate,
			padding,
			private: b2 & 0x01 != 0,
			channel_mode: match b3 >> 6 {
				0 => ChannelMode::Stereo,
				1 => ChannelMode::JointStereo,
				2 => ChannelMode::DualChannel,
				_ => ChannelMode::Mono,
			},
			mode_extension: (b3 >> 4) & 0x03,
			copyright: b3 & 0x08 != 0,
			original: b3 & 0x04 != 0,
			emphasis,
			frame_size: frame_size(version, layer, bitrate, sample_rate, padding),
		})
	}

	/// PCM samples per channel in one frame
	pub fn samples_per_frame(&self) -> usize {
		match (self.layer, self.version) {
			(MpegLayer::I, _) => 384,
			(MpegLayer::II, _) | (MpegLayer::III, MpegVersion::V1) => 1152,
			(MpegLayer::III, _) => 576,
		}
	}

	/// Number of output channels
	pub fn channels(&self) -> u16 {
		if self.channel_mode == ChannelMode::Mono {
			1
		} else {
			2
		}
	}
}

fn frame_size(version: MpegVersion, layer: MpegLayer, bitrate: u16, sample_rate: u32, padding: bool) -> usize {
	let bitrate = u32::from(bitrate) * 1000;
	let pad = u32::from(padding);
	let size = match (layer, version) {
		(MpegLayer::I, _) => (12 * bitrate / sample_rate + pad) * 4,
		(MpegLayer::II, _) | (MpegLayer::III, MpegVersion::V1) => 144 * bitrate / sample_rate + pad,
		(MpegLayer::III, _) => 72 * bitrate / sample_rate + pad,
	};
	size as usize
}

/// One validated frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MpegFrame<'a> {
	/// Decoded header
	pub header: MpegHeader,
	/// Whole frame, header included
	pub data: &'a [u8],
}

/// Iterator over the frames of an MPEG audio stream
///
/// A frame whose header fails validation is reported once; the iterator then
/// scans forward for the next sync byte and continues from there.
#[derive(Debug, Clone)]
pub struct MpegFrameIter<'a> {
	data: &'a [u8],
	position: usize,
}

impl<'a> MpegFrameIter<'a> {
	/// Iterates the frames in `data`.
	pub fn new(data: &'a [u8]) -> Self {
		Self {
			data,
			position: 0,
		}
	}

	fn resync(&mut self) {
		self.position += 1;
		while self.position < self.data.len() && self.data[self.position] != 0xFF {
			self.position += 1;
		}
	}
}

impl<'a> Iterator for MpegFrameIter<'a> {
	type Item = Result<MpegFrame<'a>, MpegError>;

	fn next(&mut self) -> Option<Self::Item> {
		let rest = self.data.get(self.position..).filter(|rest| !rest.is_empty())?;
		match MpegHeader::parse(rest) {
			Ok(header) if header.frame_size <= rest.len() => {
				self.position += header.frame_size;
				Some(Ok(MpegFrame {
					header,
					data: &rest[..header.frame_size],
				}))
			}
			Ok(header) => {
				// Partial last frame
				self.position = self.data.len();
				Some(Err(MpegError::Truncated(rest.len().min(header.frame_size))))
			}
			Err(e) => {
				self.resync();
				Some(Err(e))
			}
		}
	}
}

/// Returns the valid frames of `data`, logging and dropping the others.
pub fn valid_frames(data: &[u8]) -> Vec<MpegFrame<'_>> {
	MpegFrameIter::new(data)
		.filter_map(|frame| match frame {
			Ok(frame) => Some(frame),
			Err(e) => {
				warn!("dropping MPEG frame: {e}");
				None
			}
		})
		.collect()
}
