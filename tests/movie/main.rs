//! Integration tests for `swiff-rs`

mod fixtures;
mod sound;

use anyhow::Result;
use log::info;
use swiff_rs::prelude::*;
use test_log::test;

use crate::fixtures::{animated_movie, place_at, square};

fn translation(command: &PaintCommand<'_>) -> (f64, f64) {
	let offset = command.transform.translation();
	(offset.x, offset.y)
}

#[test]
fn test_animated_movie_resolves_every_frame() -> Result<()> {
	let movie = Movie::from_bytes(&animated_movie())?;
	assert_eq!(movie.timeline().frame_count(), 4);
	assert_eq!(movie.background_color(), Some(Color::rgb(0xFF, 0xFF, 0xFF)));
	assert_eq!(movie.skipped_tags(), 0);

	let frame0 = movie.resolve_frame(0);
	assert_eq!(frame0.len(), 2);
	assert_eq!(frame0[0].depth_path, vec![1]);
	assert_eq!(translation(&frame0[0]), (0.0, 0.0));
	assert_eq!(frame0[1].character_id, 2);
	assert_eq!(frame0[1].depth_path, vec![2, 1]);
	assert_eq!(translation(&frame0[1]), (1000.0, 1000.0));

	let frame1 = movie.resolve_frame(1);
	assert_eq!(translation(&frame1[0]), (200.0, 0.0));
	assert_eq!(translation(&frame1[1]), (1100.0, 1000.0));

	let frame2 = movie.resolve_frame(2);
	assert_eq!(frame2.len(), 1);
	assert_eq!(translation(&frame2[0]), (1200.0, 1000.0));

	// the three-frame sprite has looped
	let frame3 = movie.resolve_frame(3);
	assert_eq!(translation(&frame3[0]), (1000.0, 1000.0));

	assert!(movie.resolve_frame(4).is_empty());
	info!("resolved {} frames of movie {}", movie.timeline().frame_count(), movie.id());
	Ok(())
}

#[test]
fn test_playhead_matches_random_access() -> Result<()> {
	let movie = Movie::from_bytes(&animated_movie())?;
	let timeline = movie.timeline();
	let mut playhead = Playhead::new(timeline);

	for _ in 0..2 * timeline.frame_count() {
		let Some((index, _)) = playhead.advance() else {
			panic!("timeline has frames");
		};
		assert_eq!(playhead.display_list(), &timeline.display_list_at(index));
	}
	assert_eq!(playhead.current_frame(), Some(3));
	Ok(())
}

#[test]
fn test_corrupt_tags_are_contained() -> Result<()> {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square(1, 100, Color::rgb(0, 255, 0)))
		// truncated shape: bounds and styles only
		.tag(TagCode::DefineShape3, &square(2, 100, Color::rgb(0, 0, 0))[..9])
		// unknown filter kind in a PlaceObject3
		.tag(TagCode::PlaceObject3, &[0x02, 0x01, 5, 0, 1, 0, 1, 42])
		.tag(TagCode::PlaceObject2, &place_at(1, 1, 0, 0))
		.tag(TagCode::PlaceObject2, &place_at(2, 2, 0, 0))
		.show_frame()
		.tag(TagCode::PlaceObject2, &place_at(3, 1, 500, 0))
		.show_frame();
	let data = writer.finish();

	let movie = Movie::from_bytes(&data)?;
	assert_eq!(movie.skipped_tags(), 2);
	assert_eq!(movie.timeline().frame_count(), 2);
	assert_eq!(movie.resolve_frame(0).len(), 1);
	assert_eq!(movie.resolve_frame(1).len(), 2);

	match Movie::from_bytes_with_config(&data, ParseConfig::strict()) {
		Err(MovieError::MalformedTag { code, .. }) => assert_eq!(code, TagCode::DefineShape3),
		other => panic!("expected a malformed tag error, got {other:?}"),
	}
	Ok(())
}

#[test]
fn test_sparse_character_ids() -> Result<()> {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square(7, 100, Color::rgb(1, 2, 3)))
		.tag(TagCode::DefineShape, &square(65000, 100, Color::rgb(4, 5, 6)))
		.tag(TagCode::PlaceObject2, &place_at(1, 65000, 0, 0))
		.tag(TagCode::PlaceObject2, &place_at(2, 7, 0, 0))
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish())?;

	let table = movie.table();
	assert_eq!(table.len(), 2);
	assert!(table.shape(7).is_some());
	assert!(table.shape(65000).is_some());
	assert!(table.lookup(8).is_none());
	let ids: Vec<_> = movie.resolve_frame(0).iter().map(|c| c.character_id).collect();
	assert_eq!(ids, vec![65000, 7]);
	Ok(())
}

#[test]
fn test_parallel_resolution() -> Result<()> {
	let movie = Movie::from_bytes(&animated_movie())?;
	let expected: Vec<_> = (0..4).map(|frame| movie.resolve_frame(frame)).collect();

	std::thread::scope(|scope| {
		let handles: Vec<_> = (0..4)
			.map(|frame| {
				let movie = &movie;
				scope.spawn(move || movie.resolve_frame(frame))
			})
			.collect();
		for (frame, handle) in handles.into_iter().enumerate() {
			let Ok(commands) = handle.join() else {
				panic!("resolver thread panicked");
			};
			assert_eq!(commands, expected[frame]);
		}
	});
	Ok(())
}

#[test]
fn test_paint_sequence_serializes() -> Result<()> {
	let movie = Movie::from_bytes(&animated_movie())?;
	let json = serde_json::to_value(movie.resolve_frame(1))?;
	let commands = json.as_array().map(Vec::len);
	assert_eq!(commands, Some(2));
	assert_eq!(json[1]["depth_path"], serde_json::json!([2, 1]));
	assert_eq!(json[1]["blend_mode"], "Normal");

	let timeline = serde_json::to_string(movie.timeline())?;
	assert!(timeline.contains("instructions"));
	Ok(())
}
