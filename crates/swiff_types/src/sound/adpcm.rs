//! ADPCM decoder for embedded sounds.
//!
//! The stream is bit-packed, most significant bit first:
//!
//! ```text
//! UB2  code size - 2            (2 to 5 bits per sample)
//! packets of up to 4096 samples per channel:
//!   per channel: SB16 initial sample, UB6 initial step index
//!   4095 times:  per channel: UB[code size] code
//! ```
//!
//! The last packet may be short. Each code's top bit is the sign; the rest is
//! a magnitude scaled by the current IMA step size.

use crate::codec::BitReader;
use crate::error::SoundError;

/// IMA ADPCM step sizes
const STEP_TABLE: [i32; 89] = [
	7, 8, 9, 10, 11, 12, 13, 14, 16, 17, 19, 21, 23, 25, 28, 31, 34, 37, 41, 45, 50, 55, 60, 66,
	73, 80, 88, 97, 107, 118, 130, 143, 157, 173, 190, 209, 230, 253, 279, 307, 337, 371, 408,
	449, 494, 544, 598, 658, 724, 796, 876, 963, 1060, 1166, 1282, 1411, 1552, 1707, 1878, 2066,
	2272, 2499, 2749, 3024, 3327, 3660, 4026, 4428, 4871, 5358, 5894, 6484, 7132, 7845, 8630,
	9493, 10442, 11487, 12635, 13899, 15289, 16818, 18500, 20350, 22385, 24623, 27086, 29794,
	32767,
];

/// Step index adjustment by magnitude, one table per code size
const INDEX_TABLES: [&[i32]; 4] = [
	&[-1, 2],
	&[-1, -1, 2, 4],
	&[-1, -1, -1, -1, 2, 4, 6, 8],
	&[-1, -1, -1, -1, -1, -1, -1, -1, 1, 2, 4, 6, 8, 10, 13, 16],
];

/// Samples per channel in a full packet
pub const SAMPLES_PER_PACKET: usize = 4096;

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
	sample: i32,
	step_index: usize,
}

impl ChannelState {
	fn decode(&mut self, code: u32, bits: u32) -> i16 {
		let sign_mask = 1u32 << (bits - 1);
		let magnitude = code & (sign_mask - 1);
		let step = STEP_TABLE[self.step_index];

		let delta = ((2 * magnitude as i32 + 1) * step) >> (bits - 1);
		if code & sign_mask != 0 {
			self.sample -= delta;
		} else {
			self.sample += delta;
		}
		self.sample = self.sample.clamp(i32::from(i16::MIN), i32::from(i16::MAX));

		let adjust = INDEX_TABLES[(bits - 2) as usize][magnitude as usize];
		self.step_index = (self.step_index as i32 + adjust).clamp(0, 88) as usize;
		self.sample as i16
	}
}

/// Decodes ADPCM data into interleaved 16-bit samples.
///
/// Decoding stops at the end of the data; a partial packet yields the samples
/// that were complete.
///
/// # Arguments
/// * `data` - ADPCM stream, code size header included
/// * `channels` - 1 for mono, 2 for stereo
/// * `max_samples` - Stop after this many samples per channel, if given
pub fn decode_adpcm(data: &[u8], channels: u16, max_samples: Option<usize>) -> Result<Vec<i16>, SoundError> {
	if !(1..=2).contains(&channels) {
		return Err(SoundError::InvalidData(format!("ADPCM channel count {channels}")));
	}
	if data.is_empty() {
		return Err(SoundError::InvalidData("ADPCM data too short".to_string()));
	}

	let channels = usize::from(channels);
	let mut reader = BitReader::new(data);
	let bits = reader.read_ub(2).map_err(|e| SoundError::InvalidData(e.to_string()))? + 2;
	let limit = max_samples.unwrap_or(usize::MAX);
	let mut pcm = Vec::with_capacity(data.len() * 8 / bits as usize);
	let mut states = [ChannelState::default(); 2];
	let mut frames = 0usize;

	'packets: while frames < limit {
		// Packet header
		for state in states.iter_mut().take(channels) {
			let (Ok(sample), Ok(index)) = (reader.read_sb(16), reader.read_ub(6)) else {
				break 'packets;
			};
			state.sample = sample;
			state.step_index = (index as usize).min(88);
		}
		pcm.extend(states.iter().take(channels).map(|s| s.sample as i16));
		frames += 1;

		for _ in 1..SAMPLES_PER_PACKET {
			if frames >= limit {
				break 'packets;
			}
			let mut codes = [0u32; 2];
			for code in codes.iter_mut().take(channels) {
				match reader.read_ub(bits) {
					Ok(value) => *code = value,
					Err(_) => break 'packets,
				}
			}
			for (state, &code) in states.iter_mut().zip(&codes).take(channels) {
				pcm.push(state.decode(code, bits));
			}
			frames += 1;
		}
	}

	Ok(pcm)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::BitWriter;

	fn packet(bits: u32, initial: i32, index: u32, codes: &[u32]) -> Vec<u8> {
		let mut w = BitWriter::new();
		w.write_ub(bits - 2, 2);
		w.write_sb(initial, 16);
		w.write_ub(index, 6);
		for &code in codes {
			w.write_ub(code, bits);
		}
		w.into_bytes()
	}

	#[test]
	fn test_decode_empty() {
		assert!(decode_adpcm(&[], 1, None).is_err());
		assert!(decode_adpcm(&[0], 3, None).is_err());
	}

	#[test]
	fn test_header_only_yields_initial_sample() {
		let data = packet(4, -1234, 0, &[]);
		let pcm = decode_adpcm(&data, 1, None).unwrap();
		assert_eq!(pcm[0], -1234);
	}

	#[test]
	fn test_four_bit_codes() {
		// step 7: code 0x3 -> +((7 * 7) >> 3) = +6; code 0xB -> -6
		let data = packet(4, 100, 0, &[0x3, 0xB]);
		let pcm = decode_adpcm(&data, 1, Some(3)).unwrap();
		assert_eq!(pcm[..3], [100, 106, 100]);
	}

	#[test]
	fn test_step_index_adapts() {
		// largest magnitude raises the index by 8: step 7 then 16
		let data = packet(4, 0, 0, &[0x7, 0x7]);
		let pcm = decode_adpcm(&data, 1, Some(3)).unwrap();
		assert_eq!(pcm[1], (15 * 7) >> 3);
		assert_eq!(pcm[2], pcm[1] + ((15 * 16) >> 3));
	}

	#[test]
	fn test_clamps_to_i16() {
		let data = packet(5, i32::from(i16::MAX), 88, &[0x0F]);
		let pcm = decode_adpcm(&data, 1, Some(2)).unwrap();
		assert_eq!(pcm[1], i16::MAX);
	}

	#[test]
	fn test_stereo_interleaves() {
		let mut w = BitWriter::new();
		w.write_ub(0, 2);
		w.write_sb(10, 16);
		w.write_ub(0, 6);
		w.write_sb(-10, 16);
		w.write_ub(0, 6);
		w.write_ub(0b01, 2);
		w.write_ub(0b11, 2);
		let data = w.into_bytes();
		let pcm = decode_adpcm(&data, 2, Some(2)).unwrap();
		// 2-bit: delta = (3 * 7) >> 1 = 10
		assert_eq!(pcm, vec![10, -10, 20, -20]);
	}
}
