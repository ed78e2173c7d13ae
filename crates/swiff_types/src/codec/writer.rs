//! Bit-level writer, the inverse of [`BitReader`](super::BitReader).
//!
//! Used to build movies from scratch: fixtures, benchmarks and tools that
//! re-emit decoded structures.

use crate::header::{Compression, Header, SIGNATURE_UNCOMPRESSED};
use crate::tag::TagCode;
use crate::types::Rect;

/// Tag lengths at or above this value use the long header form
const LONG_TAG_THRESHOLD: usize = 0x3F;

/// Number of bits needed to hold `value` as an unsigned field
pub fn count_ub_bits(value: u32) -> u32 {
	32 - value.leading_zeros()
}

/// Number of bits needed to hold `value` as a signed field
pub fn count_sb_bits(value: i32) -> u32 {
	if value == 0 {
		0
	} else if value > 0 {
		count_ub_bits(value as u32) + 1
	} else {
		count_ub_bits(!value as u32) + 1
	}
}

/// Number of bits needed to hold `value` as a 16.16 fixed-point field
pub fn count_fb_bits(value: f64) -> u32 {
	count_sb_bits(fixed16_raw(value))
}

fn fixed16_raw(value: f64) -> i32 {
	(value * 65536.0).round() as i32
}

/// Sequential writer for the primitives of the movie format
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
	data: Vec<u8>,
	bit_buffer: u8,
	bits_in_buffer: u32,
}

impl BitWriter {
	/// Creates an empty writer.
	pub fn new() -> Self {
		Self::default()
	}

	/// Writes the low `num_bits` bits of `value`, most significant bit first.
	pub fn write_ub(&mut self, value: u32, num_bits: u32) {
		for i in (0..num_bits).rev() {
			let bit = if i < 32 {
				(value >> i) & 1
			} else {
				0
			};

			self.bit_buffer = (self.bit_buffer << 1) | (bit as u8);
			self.bits_in_buffer += 1;

			if self.bits_in_buffer == 8 {
				self.data.push(self.bit_buffer);
				self.bit_buffer = 0;
				self.bits_in_buffer = 0;
			}
		}
	}

	/// Writes a two's complement signed field.
	pub fn write_sb(&mut self, value: i32, num_bits: u32) {
		self.write_ub(value as u32, num_bits);
	}

	/// Writes a 16.16 fixed-point field.
	pub fn write_fb(&mut self, value: f64, num_bits: u32) {
		self.write_sb(fixed16_raw(value), num_bits);
	}

	/// Writes a single flag bit.
	pub fn write_bit(&mut self, value: bool) {
		self.write_ub(u32::from(value), 1);
	}

	/// Pads the partial byte with zero bits.
	pub fn align(&mut self) {
		if self.bits_in_buffer > 0 {
			self.bit_buffer <<= 8 - self.bits_in_buffer;
			self.data.push(self.bit_buffer);
			self.bit_buffer = 0;
			self.bits_in_buffer = 0;
		}
	}

	/// Writes raw bytes after aligning.
	pub fn write_bytes(&mut self, bytes: &[u8]) {
		self.align();
		self.data.extend_from_slice(bytes);
	}

	/// Writes an unsigned byte.
	pub fn write_u8(&mut self, value: u8) {
		self.write_bytes(&[value]);
	}

	/// Writes a little-endian `u16`.
	pub fn write_u16(&mut self, value: u16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `i16`.
	pub fn write_i16(&mut self, value: i16) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `u32`.
	pub fn write_u32(&mut self, value: u32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian `i32`.
	pub fn write_i32(&mut self, value: i32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes a little-endian IEEE single-precision float.
	pub fn write_f32(&mut self, value: f32) {
		self.write_bytes(&value.to_le_bytes());
	}

	/// Writes an 8.8 signed fixed-point number.
	pub fn write_fixed8(&mut self, value: f32) {
		self.write_i16((value * 256.0).round() as i16);
	}

	/// Writes an 8.8 unsigned fixed-point number.
	pub fn write_ufixed8(&mut self, value: f32) {
		self.write_u16((value * 256.0).round() as u16);
	}

	/// Writes a 16.16 signed fixed-point number.
	pub fn write_fixed16(&mut self, value: f64) {
		self.write_i32(fixed16_raw(value));
	}

	/// Writes a variable-length unsigned integer.
	pub fn write_encoded_u32(&mut self, mut value: u32) {
		loop {
			let byte = (value & 0x7F) as u8;
			value >>= 7;
			if value == 0 {
				self.write_u8(byte);
				break;
			}
			self.write_u8(byte | 0x80);
		}
	}

	/// Writes a NUL-terminated UTF-8 string.
	pub fn write_string(&mut self, value: &str) {
		self.write_bytes(value.as_bytes());
		self.write_u8(0);
	}

	/// Number of complete bytes written so far
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Returns `true` if nothing has been written
	pub fn is_empty(&self) -> bool {
		self.data.is_empty() && self.bits_in_buffer == 0
	}

	/// Aligns and returns the written bytes.
	pub fn into_bytes(mut self) -> Vec<u8> {
		self.align();
		self.data
	}
}

/// Appends a tag record to `out`, choosing the short or long header form.
pub fn write_tag(out: &mut Vec<u8>, code: TagCode, payload: &[u8]) {
	let code = code.to_u16();
	if payload.len() < LONG_TAG_THRESHOLD {
		let header = (code << 6) | payload.len() as u16;
		out.extend_from_slice(&header.to_le_bytes());
	} else {
		let header = (code << 6) | LONG_TAG_THRESHOLD as u16;
		out.extend_from_slice(&header.to_le_bytes());
		out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
	}
	out.extend_from_slice(payload);
}

/// Builder for an uncompressed movie buffer
///
/// # Examples
///
/// ```
/// use swiff_types::codec::MovieWriter;
/// use swiff_types::movie::Movie;
///
/// let mut writer = MovieWriter::new(10);
/// writer.show_frame();
/// let movie = Movie::from_bytes(&writer.finish()).unwrap();
/// assert_eq!(movie.timeline().frame_count(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct MovieWriter {
	version: u8,
	stage: Rect,
	frame_rate: f32,
	frame_count: u16,
	tags: Vec<u8>,
}

impl MovieWriter {
	/// Creates a writer for a 550x400 pixel stage at 24 fps.
	pub fn new(version: u8) -> Self {
		Self {
			version,
			stage: Rect::new(0, 11000, 0, 8000),
			frame_rate: 24.0,
			frame_count: 0,
			tags: Vec::new(),
		}
	}

	/// Sets the stage bounds in twips.
	pub fn stage(mut self, stage: Rect) -> Self {
		self.stage = stage;
		self
	}

	/// Sets the frame rate.
	pub fn frame_rate(mut self, frame_rate: f32) -> Self {
		self.frame_rate = frame_rate;
		self
	}

	/// Appends a tag.
	pub fn tag(&mut self, code: TagCode, payload: &[u8]) -> &mut Self {
		write_tag(&mut self.tags, code, payload);
		self
	}

	/// Appends a `ShowFrame` tag and counts the frame.
	pub fn show_frame(&mut self) -> &mut Self {
		self.frame_count = self.frame_count.saturating_add(1);
		self.tag(TagCode::ShowFrame, &[])
	}

	/// Appends bytes verbatim, e.g. a hand-crafted tag header.
	pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
		self.tags.extend_from_slice(bytes);
		self
	}

	/// Writes the header, the tags and the end marker.
	pub fn finish(&self) -> Vec<u8> {
		let mut body = BitWriter::new();
		self.stage.write(&mut body);
		body.write_ufixed8(self.frame_rate);
		body.write_u16(self.frame_count);
		let body = body.into_bytes();

		let mut out = Vec::with_capacity(Header::FIXED_SIZE + body.len() + self.tags.len() + 2);
		out.extend_from_slice(&SIGNATURE_UNCOMPRESSED);
		out.push(self.version);
		out.extend_from_slice(&[0; 4]);
		out.extend_from_slice(&body);
		out.extend_from_slice(&self.tags);
		write_tag(&mut out, TagCode::End, &[]);

		let file_length = out.len() as u32;
		out[4..8].copy_from_slice(&file_length.to_le_bytes());
		debug_assert_eq!(Compression::from_signature(&out[..3]), Some(Compression::None));
		out
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::BitReader;

	#[test]
	fn test_bit_counts() {
		assert_eq!(count_ub_bits(0), 0);
		assert_eq!(count_ub_bits(1), 1);
		assert_eq!(count_ub_bits(255), 8);
		assert_eq!(count_sb_bits(0), 0);
		assert_eq!(count_sb_bits(1), 2);
		assert_eq!(count_sb_bits(-1), 1);
		assert_eq!(count_sb_bits(-2), 2);
		assert_eq!(count_sb_bits(127), 8);
		assert_eq!(count_sb_bits(-128), 8);
	}

	#[test]
	fn test_bits_are_read_back() {
		let mut writer = BitWriter::new();
		writer.write_ub(5, 3);
		writer.write_sb(-3, 4);
		writer.write_bit(true);
		writer.write_fb(-1.25, 19);
		writer.write_u16(0xBEEF);
		let bytes = writer.into_bytes();

		let mut reader = BitReader::new(&bytes);
		assert_eq!(reader.read_ub(3).unwrap(), 5);
		assert_eq!(reader.read_sb(4).unwrap(), -3);
		assert!(reader.read_bit().unwrap());
		assert_eq!(reader.read_fb(19).unwrap(), -1.25);
		assert_eq!(reader.read_u16().unwrap(), 0xBEEF);
	}

	#[test]
	fn test_encoded_u32_boundaries() {
		for value in [0, 127, 128, 16_383, 16_384, u32::MAX] {
			let mut writer = BitWriter::new();
			writer.write_encoded_u32(value);
			let bytes = writer.into_bytes();
			assert_eq!(BitReader::new(&bytes).read_encoded_u32().unwrap(), value);
		}
	}

	#[test]
	fn test_short_and_long_tag_headers() {
		let mut out = Vec::new();
		write_tag(&mut out, TagCode::ShowFrame, &[]);
		assert_eq!(out, [0x40, 0x00]);

		let mut out = Vec::new();
		write_tag(&mut out, TagCode::DefineBinaryData, &[0u8; 0x3F]);
		assert_eq!(&out[..2], &((87u16 << 6) | 0x3F).to_le_bytes());
		assert_eq!(&out[2..6], &0x3Fu32.to_le_bytes());
		assert_eq!(out.len(), 6 + 0x3F);
	}
}
