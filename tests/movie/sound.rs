//! Sound decoding and scheduling against a recording sink

use std::collections::HashSet;
use std::io::Cursor;

use anyhow::Result;
use swiff_rs::prelude::*;
use swiff_rs::swiff_types::sound::mpeg::{MpegHeader, valid_frames};
use swiff_rs::swiff_types::sound::pcm::decode_sound;
use test_log::test;

use crate::fixtures::pcm_sound;

#[derive(Default)]
struct RecordingSink {
	started: Vec<(ChannelId, usize)>,
	appended: Vec<(ChannelId, usize)>,
	stopped: Vec<ChannelId>,
	active: HashSet<ChannelId>,
}

impl AudioSink for RecordingSink {
	fn start(&mut self, channel: ChannelId, playback: &Playback) -> Result<(), SoundError> {
		self.started.push((channel, playback.frames() as usize));
		self.active.insert(channel);
		Ok(())
	}

	fn append(&mut self, channel: ChannelId, pcm: &PcmBuffer) -> Result<(), SoundError> {
		self.appended.push((channel, pcm.frames()));
		Ok(())
	}

	fn stop(&mut self, channel: ChannelId) {
		self.stopped.push(channel);
		self.active.remove(&channel);
	}

	fn is_active(&self, channel: ChannelId) -> bool {
		self.active.contains(&channel)
	}
}

/// Two-frame movie with a 16-bit mono stream and one event sound on frame 0
fn sound_movie() -> Result<Movie> {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineSound, &pcm_sound(1, &[100, 200, 300, 400]))
		.tag(TagCode::SoundStreamHead2, &[0x0E, 0x3E, 2, 0])
		.tag(TagCode::SoundStreamBlock, &[1, 0, 2, 0])
		// loop twice
		.tag(TagCode::StartSound, &[1, 0, 0x04, 2, 0])
		.show_frame()
		.tag(TagCode::SoundStreamBlock, &[3, 0, 4, 0])
		.show_frame();
	Ok(Movie::from_bytes(&writer.finish())?)
}

#[test]
fn test_player_follows_the_playhead() -> Result<()> {
	let movie = sound_movie()?;
	let mut player = SoundPlayer::new(RecordingSink::default());
	let mut playhead = Playhead::new(movie.timeline());

	// two full loops of the timeline
	for _ in 0..4 {
		if let Some((frame, _)) = playhead.advance() {
			player.process_movie(&movie, frame);
		}
	}

	let sink = player.sink();
	// the stream restarts when the playhead wraps to frame 0
	let stream_starts: Vec<_> = sink.started.iter().filter(|(_, frames)| *frames == 2).collect();
	assert_eq!(stream_starts.len(), 2);
	assert_eq!(sink.appended.len(), 2);
	// the looped event sound is eight frames long
	assert_eq!(sink.started.iter().filter(|(_, frames)| *frames == 8).count(), 2);
	assert_eq!(player.event_channel_count(), 2);

	player.stop_all_sounds_for_movie(movie.id());
	assert!(!player.is_streaming());
	assert_eq!(player.event_channel_count(), 0);
	assert_eq!(player.sink().active.len(), 0);
	Ok(())
}

#[test]
fn test_wav_export() -> Result<()> {
	let movie = sound_movie()?;
	let Some(sound) = movie.table().sound(1) else {
		panic!("sound 1 is defined");
	};
	let pcm = decode_sound(sound, None)?;
	assert_eq!(pcm.samples, vec![100, 200, 300, 400]);

	let mut wav = Cursor::new(Vec::new());
	pcm.write_wav(&mut wav)?;
	wav.set_position(0);

	let mut reader = hound::WavReader::new(wav)?;
	let spec = reader.spec();
	assert_eq!(spec.channels, 1);
	assert_eq!(spec.sample_rate, 44100);
	assert_eq!(spec.bits_per_sample, 16);
	let samples = reader.samples::<i16>().collect::<Result<Vec<_>, _>>()?;
	assert_eq!(samples, pcm.samples);
	Ok(())
}

#[test]
fn test_mpeg_frames_are_validated() -> Result<()> {
	// MPEG-1 layer III, 128 kbit/s, 44.1 kHz
	let header = [0xFF, 0xFB, 0x90, 0x00];
	let parsed = MpegHeader::parse(&header)?;
	assert_eq!(parsed.bitrate, 128);
	assert_eq!(parsed.sample_rate, 44100);
	assert_eq!(parsed.frame_size, 417);
	assert_eq!(parsed.samples_per_frame(), 1152);

	let mut stream = Vec::new();
	for _ in 0..3 {
		let start = stream.len();
		stream.extend_from_slice(&header);
		stream.resize(start + parsed.frame_size, 0);
	}
	// free-format bitrate, then a padded frame
	stream.extend_from_slice(&[0xFF, 0xFB, 0x00, 0x00]);
	let padded = stream.len();
	stream.extend_from_slice(&[0xFF, 0xFB, 0x92, 0x00]);
	stream.resize(padded + 418, 0);

	let frames = valid_frames(&stream);
	assert_eq!(frames.len(), 4);
	assert!(frames[3].header.padding);
	assert_eq!(frames[3].data.len(), 418);
	Ok(())
}

#[test]
fn test_compressed_streams_need_a_decoder() -> Result<()> {
	let mut writer = MovieWriter::new(10);
	writer
		// MP3 stream head with latency seek
		.tag(TagCode::SoundStreamHead2, &[0x2E, 0x2E, 0x80, 0x04, 0, 0])
		.tag(TagCode::SoundStreamBlock, &[0x80, 0x04, 0, 0, 0xFF, 0xFB, 0x90, 0x00])
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish())?;
	let Some(head) = movie.timeline().stream_head() else {
		panic!("stream head is parsed");
	};
	assert_eq!(head.stream_format.compression, SoundCompression::Mp3);
	assert_eq!(head.latency_seek, Some(0));

	let mut player = SoundPlayer::new(RecordingSink::default());
	player.process_movie(&movie, 0);
	assert!(!player.is_streaming());
	assert!(player.sink().started.is_empty());
	Ok(())
}
