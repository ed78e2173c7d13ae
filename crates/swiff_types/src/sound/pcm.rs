//! Decoded sample buffers and the per-format decode dispatch.

use std::io::{Seek, Write};

use log::{debug, warn};

use crate::error::SoundError;
use crate::sound::adpcm::decode_adpcm;
use crate::sound::mpeg::valid_frames;
use crate::sound::{
	SoundCompression, SoundDefinition, SoundEnvelopePoint, SoundFormat, SoundInfo, SoundStreamHead,
};

/// Rate that in/out points and envelope positions are expressed in
const ENVELOPE_RATE: u64 = 44100;

/// Envelope level of unity gain
const FULL_LEVEL: f32 = 32768.0;

/// Longest envelope-shaped prefix a [`Playback`] materialises, one minute at 44.1 kHz
pub const MAX_ENVELOPE_FRAMES: usize = 60 * 44100;

/// Codec capability supplied by the application for formats the core only
/// identifies (MP3, Nellymoser, Speex)
///
/// MP3 data has already been split into validated frames when it arrives
/// here; frames with reserved header fields are gone.
pub trait ExternalDecoder {
	/// Decodes `data` encoded as `format`.
	fn decode(&mut self, format: &SoundFormat, data: &[u8]) -> Result<PcmBuffer, SoundError>;
}

/// Interleaved signed 16-bit samples
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PcmBuffer {
	/// Sample rate in Hz
	pub sample_rate: u32,
	/// Interleaved channel count
	pub channels: u16,
	/// Samples, `channels` per frame
	pub samples: Vec<i16>,
}

impl PcmBuffer {
	/// Wraps interleaved samples.
	pub fn new(sample_rate: u32, channels: u16, samples: Vec<i16>) -> Self {
		Self {
			sample_rate,
			channels,
			samples,
		}
	}

	/// Number of sample frames
	pub fn frames(&self) -> usize {
		match self.channels {
			0 => 0,
			channels => self.samples.len() / usize::from(channels),
		}
	}

	/// Returns `true` if there are no samples
	pub fn is_empty(&self) -> bool {
		self.samples.is_empty()
	}

	/// Calculates the duration in milliseconds
	pub fn duration_ms(&self) -> u64 {
		if self.sample_rate == 0 {
			return 0;
		}
		self.frames() as u64 * 1000 / u64::from(self.sample_rate)
	}

	/// Applies start-sound parameters: in/out trimming, looping and the volume
	/// envelope, in that order.
	///
	/// Loops stay symbolic. Passes are only materialised while the envelope
	/// still changes the level, up to [`MAX_ENVELOPE_FRAMES`]; every later pass
	/// repeats the last materialised one.
	pub fn with_info(&self, info: &SoundInfo) -> Playback {
		let channels = usize::from(self.channels.max(1));
		let to_frames = |point: u32| (u64::from(point) * u64::from(self.sample_rate) / ENVELOPE_RATE) as usize;

		let total = self.frames();
		let start = info.in_point.map_or(0, to_frames).min(total);
		let end = info.out_point.map_or(total, to_frames).clamp(start, total);
		let clip = &self.samples[start * channels..end * channels];
		let clip_frames = end - start;

		let loops = usize::from(info.loop_count.max(1));
		let envelope = info.envelope.as_deref().filter(|points| !points.is_empty());
		let passes = match envelope {
			Some(points) if clip_frames > 0 => {
				let last = points.iter().map(|p| to_frames(p.position)).max().unwrap_or(0);
				// the first pass starting at or after the last point plays at a constant level
				let needed = last.div_ceil(clip_frames) + 1;
				needed.min((MAX_ENVELOPE_FRAMES / clip_frames).max(1)).min(loops)
			}
			_ => 1,
		};

		let mut samples = Vec::with_capacity(clip.len() * passes);
		for _ in 0..passes {
			samples.extend_from_slice(clip);
		}
		let mut pcm = Self::new(self.sample_rate, self.channels, samples);
		if let Some(envelope) = envelope {
			pcm.apply_envelope(envelope);
		}
		Playback {
			pcm,
			pass_len: clip.len(),
			repeats: (loops - passes) as u32,
		}
	}

	fn apply_envelope(&mut self, envelope: &[SoundEnvelopePoint]) {
		let channels = usize::from(self.channels.max(1));
		let rate = u64::from(self.sample_rate.max(1));

		for (frame, chunk) in self.samples.chunks_mut(channels).enumerate() {
			let position = frame as u64 * ENVELOPE_RATE / rate;
			let (left, right) = envelope_levels(envelope, position);
			for (channel, sample) in chunk.iter_mut().enumerate() {
				let level = if channel == 0 { left } else { right };
				*sample = (f32::from(*sample) * level / FULL_LEVEL)
					.clamp(f32::from(i16::MIN), f32::from(i16::MAX)) as i16;
			}
		}
	}

	/// Appends another buffer's samples.
	///
	/// The formats must match; a mismatching buffer is dropped.
	pub fn append(&mut self, other: &PcmBuffer) {
		if self.is_empty() && self.channels == 0 {
			*self = other.clone();
			return;
		}
		if other.sample_rate != self.sample_rate || other.channels != self.channels {
			warn!(
				"dropping {} samples at {} Hz/{} ch appended to {} Hz/{} ch buffer",
				other.samples.len(),
				other.sample_rate,
				other.channels,
				self.sample_rate,
				self.channels
			);
			return;
		}
		self.samples.extend_from_slice(&other.samples);
	}

	/// Writes the samples as a 16-bit WAV file.
	pub fn write_wav<W: Write + Seek>(&self, writer: &mut W) -> Result<(), SoundError> {
		let spec = hound::WavSpec {
			channels: self.channels,
			sample_rate: self.sample_rate,
			bits_per_sample: 16,
			sample_format: hound::SampleFormat::Int,
		};

		let mut wav_writer = hound::WavWriter::new(writer, spec)?;

		for &sample in &self.samples {
			wav_writer.write_sample(sample)?;
		}

		wav_writer.finalize()?;

		Ok(())
	}
}

/// Samples of one start-sound event with its loops kept symbolic
///
/// A sink plays `pcm`, then the last `pass_len` samples of `pcm` another
/// `repeats` times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Playback {
	/// Trimmed samples, as many loop passes as the envelope shapes
	pub pcm: PcmBuffer,
	/// Samples in one loop pass
	pub pass_len: usize,
	/// Further plays of the final pass after `pcm` ends
	pub repeats: u32,
}

impl Playback {
	/// Plays `pcm` once.
	pub fn once(pcm: PcmBuffer) -> Self {
		let pass_len = pcm.samples.len();
		Self {
			pcm,
			pass_len,
			repeats: 0,
		}
	}

	/// Samples repeated after `pcm` ends
	pub fn last_pass(&self) -> &[i16] {
		let samples = &self.pcm.samples;
		&samples[samples.len().saturating_sub(self.pass_len)..]
	}

	/// Total sample frames across every loop
	pub fn frames(&self) -> u64 {
		let channels = u64::from(self.pcm.channels.max(1));
		let repeated = self.last_pass().len() as u64 * u64::from(self.repeats);
		(self.pcm.samples.len() as u64 + repeated) / channels
	}

	/// Iterates every sample in play order without expanding the loops.
	pub fn samples(&self) -> impl Iterator<Item = i16> + '_ {
		let last = self.last_pass();
		self.pcm
			.samples
			.iter()
			.chain(last.iter().cycle().take(last.len() * self.repeats as usize))
			.copied()
	}
}

impl From<PcmBuffer> for Playback {
	fn from(pcm: PcmBuffer) -> Self {
		Self::once(pcm)
	}
}

/// Linear interpolation of envelope levels at a 44.1 kHz position
fn envelope_levels(envelope: &[SoundEnvelopePoint], position: u64) -> (f32, f32) {
	let next = envelope.iter().position(|p| u64::from(p.position) > position);
	match next {
		Some(0) | None => {
			let point = if next.is_some() { &envelope[0] } else { &envelope[envelope.len() - 1] };
			(f32::from(point.left), f32::from(point.right))
		}
		Some(index) => {
			let (a, b) = (&envelope[index - 1], &envelope[index]);
			let span = (b.position - a.position) as f32;
			let t = if span > 0.0 {
				(position - u64::from(a.position)) as f32 / span
			} else {
				1.0
			};
			let lerp = |x: u16, y: u16| f32::from(x) + (f32::from(y) - f32::from(x)) * t;
			(lerp(a.left, b.left), lerp(a.right, b.right))
		}
	}
}

/// Decodes uncompressed PCM.
///
/// 8-bit samples are unsigned and widened; 16-bit samples are little-endian.
/// Native byte order is read as little-endian. A trailing partial sample is
/// ignored.
pub fn decode_uncompressed(format: &SoundFormat, data: &[u8]) -> Vec<i16> {
	if format.is_16_bit {
		data.chunks_exact(2)
			.map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
			.collect()
	} else {
		data.iter().map(|&byte| (i16::from(byte) - 128) << 8).collect()
	}
}

/// Decodes raw audio in `format` into PCM.
///
/// `max_frames` caps the result for codecs whose data does not end on the
/// declared sample count.
pub fn decode(
	format: &SoundFormat,
	data: &[u8],
	max_frames: Option<usize>,
	external: Option<&mut dyn ExternalDecoder>,
) -> Result<PcmBuffer, SoundError> {
	let channels = format.channels();
	let mut samples = match format.compression {
		SoundCompression::Native | SoundCompression::LittleEndian => decode_uncompressed(format, data),
		SoundCompression::Adpcm => decode_adpcm(data, channels, max_frames)?,
		SoundCompression::Mp3 => {
			let frames = valid_frames(data);
			let mut stream = Vec::with_capacity(data.len());
			for frame in &frames {
				stream.extend_from_slice(frame.data);
			}
			debug!("{} MPEG frames, {} bytes", frames.len(), stream.len());
			return delegate(format, &stream, external);
		}
		_ => return delegate(format, data, external),
	};

	if let Some(max) = max_frames {
		samples.truncate(max * usize::from(channels));
	}
	Ok(PcmBuffer::new(format.sample_rate, channels, samples))
}

fn delegate(
	format: &SoundFormat,
	data: &[u8],
	external: Option<&mut dyn ExternalDecoder>,
) -> Result<PcmBuffer, SoundError> {
	match external {
		Some(decoder) => decoder.decode(format, data),
		None => Err(SoundError::MissingDecoder(format.compression)),
	}
}

/// Decodes a `DefineSound`.
pub fn decode_sound(
	sound: &SoundDefinition,
	external: Option<&mut dyn ExternalDecoder>,
) -> Result<PcmBuffer, SoundError> {
	decode(
		&sound.format,
		sound.audio_data(),
		Some(sound.sample_count as usize),
		external,
	)
}

/// Decodes one `SoundStreamBlock` payload.
///
/// ADPCM blocks carry their own packet headers. MP3 blocks start with a
/// sample count and a seek before the frames.
pub fn decode_stream_block(
	head: &SoundStreamHead,
	block: &[u8],
	external: Option<&mut dyn ExternalDecoder>,
) -> Result<PcmBuffer, SoundError> {
	let format = &head.stream_format;
	match format.compression {
		SoundCompression::Mp3 => {
			let frames = block
				.get(4..)
				.ok_or_else(|| SoundError::InvalidData(format!("MP3 stream block of {} bytes", block.len())))?;
			decode(format, frames, None, external)
		}
		_ => decode(format, block, None, external),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn format(compression: SoundCompression, is_16_bit: bool, is_stereo: bool) -> SoundFormat {
		SoundFormat {
			compression,
			sample_rate: 44100,
			is_16_bit,
			is_stereo,
		}
	}

	struct Silence;

	impl ExternalDecoder for Silence {
		fn decode(&mut self, format: &SoundFormat, data: &[u8]) -> Result<PcmBuffer, SoundError> {
			Ok(PcmBuffer::new(format.sample_rate, format.channels(), vec![0; data.len()]))
		}
	}

	#[test]
	fn test_uncompressed() {
		let pcm8 = decode_uncompressed(&format(SoundCompression::Native, false, false), &[0, 128, 255]);
		assert_eq!(pcm8, vec![-32768, 0, 32512]);

		let pcm16 = decode_uncompressed(
			&format(SoundCompression::LittleEndian, true, false),
			&[0x34, 0x12, 0xFF, 0xFF, 0x01],
		);
		assert_eq!(pcm16, vec![0x1234, -1]);
	}

	#[test]
	fn test_external_formats_need_a_decoder() {
		let nelly = format(SoundCompression::Nellymoser, false, false);
		assert!(matches!(
			decode(&nelly, &[1, 2, 3], None, None),
			Err(SoundError::MissingDecoder(SoundCompression::Nellymoser))
		));
		let pcm = decode(&nelly, &[1, 2, 3], None, Some(&mut Silence)).unwrap();
		assert_eq!(pcm.samples.len(), 3);
	}

	#[test]
	fn test_mp3_drops_invalid_frames() {
		let mut data = vec![0xFF, 0xFB, 0x90, 0x00];
		data.resize(417, 0);
		// reserved sampling rate
		data.extend_from_slice(&[0xFF, 0xFB, 0x9C, 0x00]);
		let pcm = decode(&format(SoundCompression::Mp3, true, false), &data, None, Some(&mut Silence)).unwrap();
		assert_eq!(pcm.samples.len(), 417);
	}

	#[test]
	fn test_with_info_trims_and_loops() {
		let pcm = PcmBuffer::new(44100, 1, (0..10).collect());
		let info = SoundInfo {
			in_point: Some(2),
			out_point: Some(5),
			loop_count: 2,
			..SoundInfo::default()
		};
		let playback = pcm.with_info(&info);
		assert_eq!(playback.pcm.samples, vec![2, 3, 4]);
		assert_eq!(playback.repeats, 1);
		assert_eq!(playback.samples().collect::<Vec<_>>(), vec![2, 3, 4, 2, 3, 4]);

		// points past the end clamp
		let info = SoundInfo {
			in_point: Some(8),
			out_point: Some(100),
			..SoundInfo::default()
		};
		assert_eq!(pcm.with_info(&info).pcm.samples, vec![8, 9]);
	}

	#[test]
	fn test_envelope_ramps() {
		let pcm = PcmBuffer::new(44100, 2, vec![1000; 10]);
		let info = SoundInfo {
			envelope: Some(vec![
				SoundEnvelopePoint {
					position: 0,
					left: 0,
					right: 32768,
				},
				SoundEnvelopePoint {
					position: 4,
					left: 32768,
					right: 0,
				},
			]),
			..SoundInfo::default()
		};
		let out = pcm.with_info(&info).pcm.samples;
		assert_eq!(out[..2], [0, 1000]);
		assert_eq!(out[4..6], [500, 500]);
		assert_eq!(out[8..10], [1000, 0]);
	}

	#[test]
	fn test_max_loop_count_stays_bounded() {
		// 10 ms of 44.1 kHz stereo
		let pcm = PcmBuffer::new(44100, 2, vec![7; 882]);
		let info = SoundInfo {
			loop_count: u16::MAX,
			..SoundInfo::default()
		};
		let playback = pcm.with_info(&info);
		assert_eq!(playback.pcm.samples.len(), 882);
		assert_eq!(playback.repeats, u32::from(u16::MAX) - 1);
		assert_eq!(playback.frames(), 441 * u64::from(u16::MAX));
		assert_eq!(playback.samples().take(2000).count(), 2000);
	}

	#[test]
	fn test_envelope_spans_loop_passes() {
		let pcm = PcmBuffer::new(44100, 1, vec![1000; 3]);
		let info = SoundInfo {
			loop_count: u16::MAX,
			envelope: Some(vec![
				SoundEnvelopePoint {
					position: 0,
					left: 0,
					right: 0,
				},
				SoundEnvelopePoint {
					position: 4,
					left: 16384,
					right: 16384,
				},
			]),
			..SoundInfo::default()
		};
		let playback = pcm.with_info(&info);
		// passes 0 and 1 ramp, pass 2 starts past the last point
		assert_eq!(playback.pcm.samples.len(), 9);
		assert_eq!(playback.pcm.samples[..2], [0, 125]);
		assert_eq!(playback.last_pass(), &[500, 500, 500]);
		assert_eq!(playback.repeats, u32::from(u16::MAX) - 3);
	}

	#[test]
	fn test_wav_export() {
		let pcm = PcmBuffer::new(22050, 2, vec![1, -1, 300, -300]);
		let mut cursor = std::io::Cursor::new(Vec::new());
		pcm.write_wav(&mut cursor).unwrap();

		cursor.set_position(0);
		let mut reader = hound::WavReader::new(cursor).unwrap();
		assert_eq!(reader.spec().channels, 2);
		assert_eq!(reader.spec().sample_rate, 22050);
		let samples: Vec<i16> = reader.samples::<i16>().map(Result::unwrap).collect();
		assert_eq!(samples, pcm.samples);
		assert_eq!(pcm.duration_ms(), 0);
		assert_eq!(pcm.frames(), 2);
	}
}
