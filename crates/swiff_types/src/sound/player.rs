//! Frame-synchronised sound scheduling.
//!
//! The player is the only mutable state of the audio path. The application
//! creates one, injects the platform output as an [`AudioSink`], and calls
//! [`SoundPlayer::process_movie`] once per advanced frame. Every start, append
//! and stop goes through `&mut self`, so frame-driven stream advance and
//! external stop commands are serialised by ownership.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use log::{debug, trace, warn};

use crate::error::SoundError;
use crate::movie::Movie;
use crate::sound::pcm::{decode_sound, decode_stream_block};
use crate::sound::{ExternalDecoder, PcmBuffer, Playback, SoundEvent, SoundStreamHead, SoundTarget};

/// Identifier of one playback channel on the sink
pub type ChannelId = u64;

/// Platform audio output
pub trait AudioSink {
	/// Opens `channel` and queues `playback` on it, repeating its final pass
	/// `playback.repeats` times.
	fn start(&mut self, channel: ChannelId, playback: &Playback) -> Result<(), SoundError>;

	/// Queues more samples on an open channel.
	fn append(&mut self, channel: ChannelId, pcm: &PcmBuffer) -> Result<(), SoundError>;

	/// Closes `channel` immediately, discarding queued samples.
	fn stop(&mut self, channel: ChannelId);

	/// Returns `true` while `channel` still has samples to play.
	fn is_active(&self, channel: ChannelId) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct StreamChannel {
	channel: ChannelId,
	movie_id: u64,
	last_frame: usize,
}

#[derive(Debug, Clone, Copy)]
struct EventChannel {
	channel: ChannelId,
	movie_id: u64,
	sound_id: u16,
}

/// Schedules a movie's stream blocks and start-sound events on a sink
pub struct SoundPlayer<S: AudioSink> {
	sink: S,
	decoder: Option<Box<dyn ExternalDecoder>>,
	next_channel: ChannelId,
	stream: Option<StreamChannel>,
	events: Vec<EventChannel>,
	cache: HashMap<(u64, u16), PcmBuffer>,
}

impl<S: AudioSink> SoundPlayer<S> {
	/// Creates a player without an external codec.
	pub fn new(sink: S) -> Self {
		Self {
			sink,
			decoder: None,
			next_channel: 1,
			stream: None,
			events: Vec::new(),
			cache: HashMap::new(),
		}
	}

	/// Uses `decoder` for MP3, Nellymoser and Speex payloads.
	pub fn with_decoder(mut self, decoder: Box<dyn ExternalDecoder>) -> Self {
		self.decoder = Some(decoder);
		self
	}

	/// Output sink
	pub fn sink(&self) -> &S {
		&self.sink
	}

	/// Output sink, mutably
	pub fn sink_mut(&mut self) -> &mut S {
		&mut self.sink
	}

	/// Feeds the stream block and drains the start-sound events of main
	/// timeline frame `frame`.
	///
	/// A stream block continues the active stream only when it belongs to the
	/// same movie and directly follows the last fed frame; otherwise the
	/// stream channel is replaced. Decode and sink failures are logged and the
	/// affected sound is dropped.
	pub fn process_movie(&mut self, movie: &Movie, frame: usize) {
		self.prune_finished();

		let Some(current) = movie.timeline().frame(frame) else {
			debug!("movie {} has no frame {frame}", movie.id());
			return;
		};

		if let Some(block) = &current.stream_block {
			match movie.timeline().stream_head() {
				Some(head) => self.feed_stream(movie.id(), head, block, frame),
				None => debug!("stream block on frame {frame} without a stream head"),
			}
		}

		for event in &current.sound_events {
			self.start_event(movie, event);
		}
	}

	/// Stops every channel owned by movie `movie_id`.
	pub fn stop_all_sounds_for_movie(&mut self, movie_id: u64) {
		if self.stream.is_some_and(|stream| stream.movie_id == movie_id) {
			self.stop_stream();
		}
		let sink = &mut self.sink;
		self.events.retain(|event| {
			if event.movie_id == movie_id {
				sink.stop(event.channel);
				false
			} else {
				true
			}
		});
	}

	/// Stops the sounds of movie `movie_id` and drops its decoded samples.
	pub fn unload_movie(&mut self, movie_id: u64) {
		self.stop_all_sounds_for_movie(movie_id);
		self.cache.retain(|&(owner, _), _| owner != movie_id);
	}

	/// Silences every channel.
	pub fn stop_all_sounds(&mut self) {
		self.stop_stream();
		for event in self.events.drain(..) {
			self.sink.stop(event.channel);
		}
	}

	/// Stops the stream channel, if any.
	pub fn stop_stream(&mut self) {
		if let Some(stream) = self.stream.take() {
			trace!("stopping stream channel {}", stream.channel);
			self.sink.stop(stream.channel);
		}
	}

	/// Returns `true` if sound `sound_id` of movie `movie_id` is playing as an
	/// event sound.
	pub fn is_playing(&self, movie_id: u64, sound_id: u16) -> bool {
		self.events
			.iter()
			.any(|event| event.movie_id == movie_id && event.sound_id == sound_id && self.sink.is_active(event.channel))
	}

	/// Returns `true` while any event channel is still playing or a stream
	/// channel is open.
	pub fn is_any_playing(&self) -> bool {
		self.is_streaming() || self.events.iter().any(|event| self.sink.is_active(event.channel))
	}

	/// Returns `true` while a stream channel is open.
	pub fn is_streaming(&self) -> bool {
		self.stream.is_some()
	}

	/// Number of open event channels
	pub fn event_channel_count(&self) -> usize {
		self.events.len()
	}

	fn allocate_channel(&mut self) -> ChannelId {
		let channel = self.next_channel;
		self.next_channel += 1;
		channel
	}

	fn prune_finished(&mut self) {
		let sink = &self.sink;
		self.events.retain(|event| sink.is_active(event.channel));
	}

	fn feed_stream(&mut self, movie_id: u64, head: &SoundStreamHead, block: &[u8], frame: usize) {
		let external = self.decoder.as_mut().map(|d| &mut **d as &mut dyn ExternalDecoder);
		let pcm = match decode_stream_block(head, block, external) {
			Ok(pcm) => pcm,
			Err(e) => {
				warn!("dropping stream block of movie {movie_id} frame {frame}: {e}");
				return;
			}
		};

		let continues = self
			.stream
			.is_some_and(|stream| stream.movie_id == movie_id && stream.last_frame + 1 == frame);
		if continues {
			if let Some(stream) = self.stream.as_mut() {
				stream.last_frame = frame;
				if let Err(e) = self.sink.append(stream.channel, &pcm) {
					warn!("stream channel {} rejected samples: {e}", stream.channel);
				}
			}
			return;
		}

		self.stop_stream();
		let channel = self.allocate_channel();
		debug!("starting stream channel {channel} for movie {movie_id} at frame {frame}");
		match self.sink.start(channel, &Playback::once(pcm)) {
			Ok(()) => {
				self.stream = Some(StreamChannel {
					channel,
					movie_id,
					last_frame: frame,
				});
			}
			Err(e) => warn!("failed to start stream channel {channel}: {e}"),
		}
	}

	fn start_event(&mut self, movie: &Movie, event: &SoundEvent) {
		let movie_id = movie.id();
		let sound_id = match &event.target {
			SoundTarget::Character(id) => *id,
			SoundTarget::Class(name) => match movie.character_for_class(name) {
				Some(id) => id,
				None => {
					warn!("no sound bound to class {name} in movie {movie_id}");
					return;
				}
			},
		};

		if event.info.sync_stop {
			let sink = &mut self.sink;
			self.events.retain(|playing| {
				if playing.movie_id == movie_id && playing.sound_id == sound_id {
					sink.stop(playing.channel);
					false
				} else {
					true
				}
			});
			return;
		}
		if event.info.no_multiple && self.is_playing(movie_id, sound_id) {
			trace!("sound {sound_id} already playing");
			return;
		}

		let playback = match self.decoded(movie, sound_id) {
			Ok(pcm) => pcm.with_info(&event.info),
			Err(e) => {
				warn!("cannot play sound {sound_id} of movie {movie_id}: {e}");
				return;
			}
		};
		let channel = self.allocate_channel();
		match self.sink.start(channel, &playback) {
			Ok(()) => self.events.push(EventChannel {
				channel,
				movie_id,
				sound_id,
			}),
			Err(e) => warn!("failed to start channel {channel}: {e}"),
		}
	}

	/// Decoded samples of a sound, decoding on first use.
	fn decoded(&mut self, movie: &Movie, sound_id: u16) -> Result<&PcmBuffer, SoundError> {
		match self.cache.entry((movie.id(), sound_id)) {
			Entry::Occupied(entry) => Ok(entry.into_mut()),
			Entry::Vacant(entry) => {
				let sound = movie.table().sound(sound_id).ok_or(SoundError::NotFound(sound_id))?;
				let external = self.decoder.as_mut().map(|d| &mut **d as &mut dyn ExternalDecoder);
				let pcm = decode_sound(sound, external)?;
				debug!("decoded sound {sound_id}: {} frames", pcm.frames());
				Ok(entry.insert(pcm))
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use super::*;
	use crate::codec::{BitWriter, MovieWriter};
	use crate::sound::SoundFormat;
	use crate::tag::TagCode;

	#[derive(Default)]
	struct FakeSink {
		log: Vec<(&'static str, ChannelId, usize)>,
		active: HashSet<ChannelId>,
	}

	impl FakeSink {
		fn finish(&mut self, channel: ChannelId) {
			self.active.remove(&channel);
		}

		fn count(&self, action: &str) -> usize {
			self.log.iter().filter(|(a, ..)| *a == action).count()
		}
	}

	impl AudioSink for FakeSink {
		fn start(&mut self, channel: ChannelId, playback: &Playback) -> Result<(), SoundError> {
			self.log.push(("start", channel, playback.pcm.samples.len()));
			self.active.insert(channel);
			Ok(())
		}

		fn append(&mut self, channel: ChannelId, pcm: &PcmBuffer) -> Result<(), SoundError> {
			self.log.push(("append", channel, pcm.samples.len()));
			Ok(())
		}

		fn stop(&mut self, channel: ChannelId) {
			self.log.push(("stop", channel, 0));
			self.active.remove(&channel);
		}

		fn is_active(&self, channel: ChannelId) -> bool {
			self.active.contains(&channel)
		}
	}

	struct Silence;

	impl ExternalDecoder for Silence {
		fn decode(&mut self, format: &SoundFormat, data: &[u8]) -> Result<PcmBuffer, SoundError> {
			Ok(PcmBuffer::new(format.sample_rate, format.channels(), vec![0; data.len()]))
		}
	}

	/// 16-bit little-endian mono sound with `samples` samples
	fn define_sound(id: u16, samples: u32) -> Vec<u8> {
		let mut w = BitWriter::new();
		w.write_u16(id);
		w.write_u8(0x32);
		w.write_u32(samples);
		w.write_bytes(&vec![0; samples as usize * 2]);
		w.into_bytes()
	}

	fn start_sound(id: u16, flags: u8) -> [u8; 3] {
		let [lo, hi] = id.to_le_bytes();
		[lo, hi, flags]
	}

	/// Three frames, each with a four-sample stream block; sound 1 starts on
	/// frame 0 and sound 2 on frame 1.
	fn movie() -> Movie {
		let mut writer = MovieWriter::new(10);
		writer
			.tag(TagCode::DefineSound, &define_sound(1, 10))
			.tag(TagCode::DefineSound, &define_sound(2, 20))
			.tag(TagCode::SoundStreamHead2, &[0x02, 0x32, 4, 0])
			.tag(TagCode::SoundStreamBlock, &[0; 8])
			.tag(TagCode::StartSound, &start_sound(1, 0))
			.show_frame()
			.tag(TagCode::SoundStreamBlock, &[0; 8])
			.tag(TagCode::StartSound, &start_sound(2, 0))
			.show_frame()
			.tag(TagCode::SoundStreamBlock, &[0; 8])
			.show_frame();
		Movie::from_bytes(&writer.finish()).unwrap()
	}

	#[test]
	fn test_stream_continues_on_consecutive_frames() {
		let movie = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		for frame in 0..3 {
			player.process_movie(&movie, frame);
		}
		assert!(player.is_streaming());
		let sink = player.sink();
		assert_eq!(sink.count("append"), 2);
		// one stream start plus two event sounds
		assert_eq!(sink.count("start"), 3);
		assert_eq!(sink.count("stop"), 0);
	}

	#[test]
	fn test_stream_restarts_on_jump_or_other_movie() {
		let first = movie();
		let second = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&first, 0);
		player.process_movie(&first, 2);
		player.process_movie(&second, 0);

		let sink = player.sink();
		let stream_starts: Vec<_> = sink.log.iter().filter(|(a, _, n)| *a == "start" && *n == 4).collect();
		assert_eq!(stream_starts.len(), 3);
		assert_eq!(sink.count("append"), 0);
		// every restart closed the previous stream first
		assert_eq!(sink.count("stop"), 2);
	}

	#[test]
	fn test_event_sounds_are_independent_and_cached() {
		let movie = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		player.process_movie(&movie, 1);
		assert!(player.is_playing(movie.id(), 1));
		assert!(player.is_playing(movie.id(), 2));
		assert_eq!(player.event_channel_count(), 2);

		// a second start of sound 1 opens another channel from the cache
		player.process_movie(&movie, 0);
		assert_eq!(player.event_channel_count(), 3);
		assert_eq!(player.cache.len(), 2);
	}

	#[test]
	fn test_sync_stop_and_no_multiple() {
		let mut writer = MovieWriter::new(10);
		writer
			.tag(TagCode::DefineSound, &define_sound(1, 10))
			.tag(TagCode::StartSound, &start_sound(1, 0))
			.show_frame()
			.tag(TagCode::StartSound, &start_sound(1, 0x10))
			.show_frame()
			.tag(TagCode::StartSound, &start_sound(1, 0x20))
			.show_frame();
		let movie = Movie::from_bytes(&writer.finish()).unwrap();

		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		player.process_movie(&movie, 1);
		assert_eq!(player.event_channel_count(), 1);
		player.process_movie(&movie, 2);
		assert_eq!(player.event_channel_count(), 0);
		assert!(!player.is_playing(movie.id(), 1));
	}

	#[test]
	fn test_max_loop_count_is_not_expanded() {
		let mut writer = MovieWriter::new(10);
		writer
			.tag(TagCode::DefineSound, &define_sound(1, 441))
			.tag(TagCode::StartSound, &[1, 0, 0x04, 0xFF, 0xFF])
			.show_frame();
		let movie = Movie::from_bytes(&writer.finish()).unwrap();

		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		assert_eq!(player.sink().log, vec![("start", 1, 441)]);
		assert!(player.is_playing(movie.id(), 1));
	}

	#[test]
	fn test_any_playing() {
		let movie = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		assert!(!player.is_any_playing());

		player.process_movie(&movie, 0);
		assert!(player.is_any_playing());
		player.stop_stream();
		assert!(player.is_any_playing());

		let channel = player.events[0].channel;
		player.sink_mut().finish(channel);
		assert!(!player.is_any_playing());
	}

	#[test]
	fn test_finished_channels_are_pruned() {
		let movie = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		let channel = player.events[0].channel;
		player.sink_mut().finish(channel);
		player.process_movie(&movie, 2);
		assert_eq!(player.event_channel_count(), 0);
	}

	#[test]
	fn test_stop_only_touches_the_owning_movie() {
		let first = movie();
		let second = movie();
		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&first, 0);
		player.process_movie(&second, 1);

		player.stop_all_sounds_for_movie(first.id());
		assert!(!player.is_playing(first.id(), 1));
		assert!(player.is_playing(second.id(), 2));
		assert!(player.is_streaming());

		player.unload_movie(second.id());
		assert!(!player.is_streaming());
		assert!(player.cache.keys().all(|&(owner, _)| owner == first.id()));

		player.process_movie(&first, 0);
		player.stop_all_sounds();
		assert_eq!(player.event_channel_count(), 0);
		assert!(!player.is_streaming());
	}

	#[test]
	fn test_class_targets_and_missing_sounds() {
		let mut symbols = BitWriter::new();
		symbols.write_u16(1);
		symbols.write_u16(1);
		symbols.write_string("Beep");
		let symbols = symbols.into_bytes();

		let mut writer = MovieWriter::new(10);
		writer
			.tag(TagCode::DefineSound, &define_sound(1, 10))
			.tag(TagCode::SymbolClass, &symbols)
			.tag(TagCode::StartSound2, b"Beep\0\0")
			.tag(TagCode::StartSound2, b"Nope\0\0")
			.tag(TagCode::StartSound, &start_sound(9, 0))
			.show_frame();
		let movie = Movie::from_bytes(&writer.finish()).unwrap();

		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		assert_eq!(player.event_channel_count(), 1);
		assert!(player.is_playing(movie.id(), 1));
	}

	#[test]
	fn test_external_formats_use_the_injected_decoder() {
		let mut sound = BitWriter::new();
		sound.write_u16(1);
		// Nellymoser, 44.1 kHz, 16-bit, mono
		sound.write_u8(0x6E);
		sound.write_u32(64);
		sound.write_bytes(&[0; 64]);
		let sound = sound.into_bytes();

		let mut writer = MovieWriter::new(10);
		writer
			.tag(TagCode::DefineSound, &sound)
			.tag(TagCode::StartSound, &start_sound(1, 0))
			.show_frame();
		let movie = Movie::from_bytes(&writer.finish()).unwrap();

		let mut player = SoundPlayer::new(FakeSink::default());
		player.process_movie(&movie, 0);
		assert_eq!(player.event_channel_count(), 0);

		let mut player = SoundPlayer::new(FakeSink::default()).with_decoder(Box::new(Silence));
		player.process_movie(&movie, 0);
		assert_eq!(player.event_channel_count(), 1);
	}
}
