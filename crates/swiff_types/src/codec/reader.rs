//! Bit-level reader over a tag payload.
//!
//! All multi-byte integers are little-endian. Bit fields are read most
//! significant bit first and are packed back to back until a byte-aligned
//! read flushes the partial byte.

use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};

use crate::error::TagError;

/// First movie version whose strings are always UTF-8
pub const UTF8_STRING_VERSION: u8 = 6;

/// Sequential reader for the primitives of the movie format
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
	data: &'a [u8],
	position: usize,
	bit_buffer: u8,
	bits_remaining: u32,
	version: u8,
	legacy_encoding: &'static Encoding,
}

impl<'a> BitReader<'a> {
	/// Creates a reader that decodes strings as UTF-8.
	pub fn new(data: &'a [u8]) -> Self {
		Self::with_version(data, UTF8_STRING_VERSION, WINDOWS_1252)
	}

	/// Creates a reader for a movie of the given version.
	///
	/// Strings in movies older than version 6 are decoded with `legacy_encoding`.
	pub fn with_version(data: &'a [u8], version: u8, legacy_encoding: &'static Encoding) -> Self {
		Self {
			data,
			position: 0,
			bit_buffer: 0,
			bits_remaining: 0,
			version,
			legacy_encoding,
		}
	}

	/// Creates a reader over `data` that shares this reader's string settings.
	pub fn sub_reader(&self, data: &'a [u8]) -> Self {
		Self::with_version(data, self.version, self.legacy_encoding)
	}

	/// Movie version this reader decodes for
	pub fn version(&self) -> u8 {
		self.version
	}

	/// Current byte position inside the payload
	pub fn position(&self) -> usize {
		self.position
	}

	/// Number of whole bytes left to read
	pub fn remaining(&self) -> usize {
		self.data.len() - self.position
	}

	/// Returns `true` when no whole byte is left
	pub fn is_empty(&self) -> bool {
		self.remaining() == 0
	}

	/// Discards the partially consumed byte, if any.
	pub fn align(&mut self) {
		self.bits_remaining = 0;
		self.bit_buffer = 0;
	}

	fn eof(&self, needed: usize) -> TagError {
		TagError::UnexpectedEof {
			needed,
			offset: self.position,
		}
	}

	fn next_byte(&mut self) -> Result<u8, TagError> {
		let byte = *self.data.get(self.position).ok_or_else(|| self.eof(1))?;
		self.position += 1;
		Ok(byte)
	}

	/// Reads `count` bytes as a slice borrowed from the payload.
	pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], TagError> {
		self.align();
		if count > self.remaining() {
			return Err(self.eof(count - self.remaining()));
		}
		let bytes = &self.data[self.position..self.position + count];
		self.position += count;
		Ok(bytes)
	}

	/// Reads everything up to the end of the payload.
	pub fn read_rest(&mut self) -> &'a [u8] {
		self.align();
		let bytes = &self.data[self.position..];
		self.position = self.data.len();
		bytes
	}

	/// Skips `count` bytes.
	pub fn skip(&mut self, count: usize) -> Result<(), TagError> {
		self.read_bytes(count).map(|_| ())
	}

	fn read_array<const N: usize>(&mut self) -> Result<[u8; N], TagError> {
		let mut buffer = [0u8; N];
		buffer.copy_from_slice(self.read_bytes(N)?);
		Ok(buffer)
	}

	/// Reads an unsigned byte.
	pub fn read_u8(&mut self) -> Result<u8, TagError> {
		self.align();
		self.next_byte()
	}

	/// Reads a little-endian `u16`.
	pub fn read_u16(&mut self) -> Result<u16, TagError> {
		Ok(u16::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `i16`.
	pub fn read_i16(&mut self) -> Result<i16, TagError> {
		Ok(i16::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `u32`.
	pub fn read_u32(&mut self) -> Result<u32, TagError> {
		Ok(u32::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian `i32`.
	pub fn read_i32(&mut self) -> Result<i32, TagError> {
		Ok(i32::from_le_bytes(self.read_array()?))
	}

	/// Reads a little-endian IEEE single-precision float.
	pub fn read_f32(&mut self) -> Result<f32, TagError> {
		Ok(f32::from_le_bytes(self.read_array()?))
	}

	/// Reads an 8.8 signed fixed-point number.
	pub fn read_fixed8(&mut self) -> Result<f32, TagError> {
		Ok(f32::from(self.read_i16()?) / 256.0)
	}

	/// Reads an 8.8 unsigned fixed-point number (frame rate).
	pub fn read_ufixed8(&mut self) -> Result<f32, TagError> {
		Ok(f32::from(self.read_u16()?) / 256.0)
	}

	/// Reads a 16.16 signed fixed-point number.
	pub fn read_fixed16(&mut self) -> Result<f64, TagError> {
		Ok(f64::from(self.read_i32()?) / 65536.0)
	}

	/// Reads a variable-length unsigned integer of up to five bytes.
	///
	/// Each byte carries seven value bits; the high bit flags a continuation.
	pub fn read_encoded_u32(&mut self) -> Result<u32, TagError> {
		let mut value = 0u32;
		for i in 0..5 {
			let byte = self.read_u8()?;
			value |= u32::from(byte & 0x7F) << (i * 7);
			if byte & 0x80 == 0 {
				break;
			}
		}
		Ok(value)
	}

	/// Reads a single bit as a flag.
	pub fn read_bit(&mut self) -> Result<bool, TagError> {
		Ok(self.read_ub(1)? == 1)
	}

	/// Reads an unsigned bit field of `num_bits` (0..=32) bits.
	pub fn read_ub(&mut self, num_bits: u32) -> Result<u32, TagError> {
		if num_bits > 32 {
			return Err(TagError::InvalidValue {
				field: "bit count",
				value: num_bits,
			});
		}

		let mut value = 0u64;
		for _ in 0..num_bits {
			if self.bits_remaining == 0 {
				self.bit_buffer = self.next_byte()?;
				self.bits_remaining = 8;
			}
			self.bits_remaining -= 1;
			value = (value << 1) | u64::from((self.bit_buffer >> self.bits_remaining) & 1);
		}
		Ok(value as u32)
	}

	/// Reads a sign-extended bit field of `num_bits` bits.
	pub fn read_sb(&mut self, num_bits: u32) -> Result<i32, TagError> {
		if num_bits == 0 {
			return Ok(0);
		}
		let raw = self.read_ub(num_bits)?;
		if num_bits < 32 && raw & (1 << (num_bits - 1)) != 0 {
			Ok((raw | !((1u32 << num_bits) - 1)) as i32)
		} else {
			Ok(raw as i32)
		}
	}

	/// Reads a 16.16 fixed-point bit field of `num_bits` bits.
	pub fn read_fb(&mut self, num_bits: u32) -> Result<f64, TagError> {
		Ok(f64::from(self.read_sb(num_bits)?) / 65536.0)
	}

	/// Reads a NUL-terminated string.
	///
	/// Movies of version 6 and later store UTF-8; older movies use the
	/// reader's legacy encoding.
	pub fn read_string(&mut self) -> Result<String, TagError> {
		self.align();
		let start = self.position;
		let rest = &self.data[start..];
		let len = rest.iter().position(|&b| b == 0).ok_or(TagError::UnterminatedString(start))?;
		self.position += len + 1;
		Ok(self.decode_string(&rest[..len]))
	}

	/// Reads a string prefixed by its byte length.
	pub fn read_length_prefixed_string(&mut self) -> Result<String, TagError> {
		let len = self.read_u8()? as usize;
		let bytes = self.read_bytes(len)?;
		// Some writers include the terminator in the length
		let bytes = bytes.strip_suffix(&[0]).unwrap_or(bytes);
		Ok(self.decode_string(bytes))
	}

	/// Decodes raw bytes with the encoding that matches the movie version.
	pub fn decode_string(&self, bytes: &[u8]) -> String {
		let encoding = if self.version >= UTF8_STRING_VERSION {
			UTF_8
		} else {
			self.legacy_encoding
		};
		let (text, _) = encoding.decode_without_bom_handling(bytes);
		text.into_owned()
	}
}
