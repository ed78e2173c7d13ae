use test_log::test;

use super::*;
use crate::character::shape::tests::square_payload;
use crate::codec::{BitWriter, MovieWriter, write_tag};
use crate::error::TagError;
use crate::render::Paint;
use crate::sound::{SoundCompression, SoundTarget};
use crate::tag::TagCode;
use crate::transform::{ColorTransform, Matrix};
use crate::types::Rect;

fn place(depth: u16, character_id: u16) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u8(0x02);
	w.write_u16(depth);
	w.write_u16(character_id);
	w.into_bytes()
}

#[test]
fn test_minimal_movie_resolves_one_shape() {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square_payload(1))
		.tag(TagCode::PlaceObject2, &place(1, 1))
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();

	assert_eq!(movie.timeline().frame_count(), 1);
	assert_eq!(movie.table().len(), 1);
	let commands = movie.resolve_frame(0);
	assert_eq!(commands.len(), 1);
	assert!(matches!(commands[0].paint, Paint::Shape(_)));
	assert_eq!(commands[0].transform, kurbo::Affine::IDENTITY);
	assert!(commands[0].color_transform.is_identity());
}

#[test]
fn test_movie_ids_are_unique() {
	let data = MovieWriter::new(10).finish();
	let a = Movie::from_bytes(&data).unwrap();
	let b = Movie::from_bytes(&data).unwrap();
	assert_ne!(a.id(), b.id());
	assert_eq!(a.timeline().frame_count(), 0);
}

#[test]
fn test_malformed_tag_does_not_desynchronize() {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square_payload(1)[..4])
		.tag(TagCode::DefineShape, &square_payload(2))
		.tag(TagCode::PlaceObject2, &place(1, 1))
		.tag(TagCode::PlaceObject2, &place(2, 2))
		.show_frame();
	let data = writer.finish();

	let movie = Movie::from_bytes(&data).unwrap();
	assert_eq!(movie.skipped_tags(), 1);
	assert!(movie.table().lookup(1).is_none());
	assert!(movie.table().shape(2).is_some());
	// the placement of the missing shape is skipped
	let commands = movie.resolve_frame(0);
	assert_eq!(commands.len(), 1);
	assert_eq!(commands[0].character_id, 2);

	let strict = Movie::from_bytes_with_config(&data, ParseConfig::strict());
	assert!(matches!(
		strict,
		Err(MovieError::MalformedTag {
			code: TagCode::DefineShape,
			source: TagError::UnexpectedEof { .. },
			..
		})
	));
}

#[test]
fn test_unknown_tags_are_skipped() {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::Unknown(1000), &[1, 2, 3, 4])
		.tag(TagCode::DoAction, &[0])
		.tag(TagCode::DefineShape, &square_payload(1))
		.show_frame();
	let movie = Movie::from_bytes_with_config(&writer.finish(), ParseConfig::strict()).unwrap();
	assert_eq!(movie.skipped_tags(), 0);
	assert!(movie.table().shape(1).is_some());
}

#[test]
fn test_fatal_errors() {
	assert!(matches!(
		Movie::from_bytes(b"GIF89a\0\0\0\0"),
		Err(MovieError::InvalidSignature(_))
	));
	assert!(matches!(Movie::from_bytes(b"FWS"), Err(MovieError::InsufficientData { .. })));
	assert!(matches!(
		Movie::from_bytes(b"FWS\x0A\x20\0\0\0\xFF"),
		Err(MovieError::CorruptHeader(_))
	));

	// a tag claiming 50 bytes with only the end marker left
	let mut writer = MovieWriter::new(10);
	writer.raw(&[(2 << 6) | 50, 0]);
	assert!(matches!(
		Movie::from_bytes(&writer.finish()),
		Err(MovieError::TagOverrun {
			declared: 50,
			available: 2,
			..
		})
	));
}

#[test]
fn test_sprite_timeline() {
	let mut nested = Vec::new();
	write_tag(&mut nested, TagCode::PlaceObject2, &place(1, 1));
	write_tag(&mut nested, TagCode::ShowFrame, &[]);
	write_tag(&mut nested, TagCode::FrameLabel, b"second\0");
	write_tag(&mut nested, TagCode::ShowFrame, &[]);
	// definitions are not allowed inside sprites
	write_tag(&mut nested, TagCode::DefineShape, &square_payload(9));
	write_tag(&mut nested, TagCode::End, &[]);
	let mut sprite = vec![2, 0, 2, 0];
	sprite.extend_from_slice(&nested);

	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square_payload(1))
		.tag(TagCode::DefineSprite, &sprite)
		.tag(TagCode::PlaceObject2, &place(1, 2))
		.show_frame()
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();

	let sprite = movie.table().sprite(2).unwrap();
	assert_eq!(sprite.frame_count(), 2);
	assert_eq!(sprite.timeline.label_frame("second"), Some(1));
	assert!(movie.table().lookup(9).is_none());
	assert_eq!(movie.resolve_frame(1)[0].depth_path, vec![1, 1]);
}

#[test]
fn test_button_cxform_is_merged() {
	let mut button = BitWriter::new();
	button.write_u16(3);
	button.write_u8(0x01);
	button.write_u16(1);
	button.write_u16(1);
	Matrix::IDENTITY.write(&mut button);
	button.write_u8(0);
	let button = button.into_bytes();

	let tint = ColorTransform::new([0.5, 1.0, 1.0, 1.0], [0.0; 4]);
	let mut cxform = BitWriter::new();
	cxform.write_u16(3);
	tint.write(&mut cxform, false);
	let cxform = cxform.into_bytes();

	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square_payload(1))
		.tag(TagCode::DefineButton, &button)
		.tag(TagCode::DefineButtonCxform, &cxform)
		// refers to a button that does not exist
		.tag(TagCode::DefineButtonCxform, &[99, 0, 0])
		.tag(TagCode::PlaceObject2, &place(1, 3))
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();

	let button = movie.table().button(3).unwrap();
	assert_eq!(button.records[0].color_transform, tint);
	let commands = movie.resolve_frame(0);
	assert_eq!(commands.len(), 1);
	assert_eq!(commands[0].color_transform, tint);
}

#[test]
fn test_movie_metadata() {
	let mut symbols = BitWriter::new();
	symbols.write_u16(1);
	symbols.write_u16(1);
	symbols.write_string("Square");
	let symbols = symbols.into_bytes();

	let mut grid = BitWriter::new();
	grid.write_u16(1);
	Rect::new(20, 180, 20, 180).write(&mut grid);
	let grid = grid.into_bytes();

	let mut scenes = BitWriter::new();
	scenes.write_encoded_u32(1);
	scenes.write_encoded_u32(0);
	scenes.write_string("Scene 1");
	scenes.write_encoded_u32(0);
	let scenes = scenes.into_bytes();

	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::FileAttributes, &[0x08, 0, 0, 0])
		.tag(TagCode::Metadata, b"<rdf:RDF/>\0")
		.tag(TagCode::SetBackgroundColor, &[0xFF, 0x80, 0x00])
		.tag(TagCode::DefineSceneAndFrameLabelData, &scenes)
		.tag(TagCode::DefineShape, &square_payload(1))
		.tag(TagCode::ExportAssets, &symbols)
		.tag(TagCode::SymbolClass, &symbols)
		.tag(TagCode::DefineScalingGrid, &grid)
		.tag(TagCode::JpegTables, &[0xFF, 0xD8, 0xFF, 0xD9])
		.tag(TagCode::FrameLabel, b"intro\0")
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();

	let metadata = movie.metadata();
	assert_eq!(movie.background_color(), Some(Color::rgb(0xFF, 0x80, 0x00)));
	assert!(metadata.file_attributes.unwrap().is_action_script_3);
	assert_eq!(metadata.metadata_xml.as_deref(), Some("<rdf:RDF/>"));
	assert_eq!(metadata.scene_data.scenes[0].name, "Scene 1");
	assert_eq!(movie.exported_character("Square"), Some(1));
	assert_eq!(movie.character_for_class("Square"), Some(1));
	assert_eq!(metadata.scaling_grids.get(&1), Some(&Rect::new(20, 180, 20, 180)));
	assert_eq!(metadata.jpeg_tables.as_deref(), Some(&[0xFF, 0xD8, 0xFF, 0xD9][..]));
	assert_eq!(movie.timeline().label_frame("intro"), Some(0));
}

#[test]
fn test_legacy_strings() {
	let mut writer = MovieWriter::new(5);
	writer.tag(TagCode::FrameLabel, b"caf\xE9\0").show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();
	assert_eq!(movie.timeline().label_frame("café"), Some(0));
}

#[test]
fn test_sound_tags_land_in_frames() {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineSound, &[4, 0, 0x32, 2, 0, 0, 0, 0, 0, 0, 0])
		.tag(TagCode::SoundStreamHead2, &[0x02, 0x32, 1, 0])
		.tag(TagCode::StartSound, &[4, 0, 0])
		.tag(TagCode::SoundStreamBlock, &[0, 0])
		.show_frame()
		.tag(TagCode::SoundStreamBlock, &[1, 0])
		.show_frame();
	let movie = Movie::from_bytes(&writer.finish()).unwrap();

	let sound = movie.table().sound(4).unwrap();
	assert_eq!(sound.format.compression, SoundCompression::LittleEndian);
	assert_eq!(sound.sample_count, 2);
	let head = movie.timeline().stream_head().unwrap();
	assert_eq!(head.stream_format.sample_rate, 5512);
	let first = movie.timeline().frame(0).unwrap();
	assert_eq!(first.sound_events[0].target, SoundTarget::Character(4));
	assert_eq!(first.stream_block.as_deref(), Some(&[0, 0][..]));
	assert_eq!(movie.timeline().frame(1).unwrap().stream_block.as_deref(), Some(&[1, 0][..]));
}

#[test]
fn test_trailing_frame_without_show_frame() {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::DefineShape, &square_payload(1))
		.show_frame()
		.tag(TagCode::PlaceObject2, &place(1, 1));
	let movie = Movie::from_bytes(&writer.finish()).unwrap();
	assert_eq!(movie.header().frame_count, 1);
	assert_eq!(movie.timeline().frame_count(), 2);
	assert_eq!(movie.resolve_frame(1).len(), 1);
}

#[test]
fn test_missing_end_tag() {
	let mut writer = MovieWriter::new(10);
	writer.tag(TagCode::DefineShape, &square_payload(1)).show_frame();
	let mut data = writer.finish();
	// drop the End tag
	data.truncate(data.len() - 2);

	let movie = Movie::from_bytes(&data).unwrap();
	assert!(movie.is_truncated());
	assert_eq!(movie.timeline().frame_count(), 1);
	assert!(movie.table().shape(1).is_some());

	let offset = data.len();
	assert!(matches!(
		Movie::from_bytes_with_config(&data, ParseConfig::strict()),
		Err(MovieError::MissingEnd { offset: o }) if o == offset
	));

	// a header with no tags at all
	let (_, tag_offset) = Header::parse(&data).unwrap();
	let empty = &data[..tag_offset];
	assert!(Movie::from_bytes(empty).unwrap().is_truncated());

	assert!(!Movie::from_bytes(&writer.finish()).unwrap().is_truncated());
}

#[test]
fn test_nested_tag_offsets() {
	let mut nested = Vec::new();
	// PlaceObject2 with a character flag and no depth
	write_tag(&mut nested, TagCode::PlaceObject2, &[0x02]);
	write_tag(&mut nested, TagCode::ShowFrame, &[]);
	write_tag(&mut nested, TagCode::End, &[]);
	let mut sprite = vec![5, 0, 1, 0];
	sprite.extend_from_slice(&nested);

	let mut writer = MovieWriter::new(10);
	writer.tag(TagCode::DefineSprite, &sprite);
	let data = writer.finish();
	// sprite tag header, then the id and frame count, before the nested stream
	let sprite_offset = data.len() - 2 - (2 + sprite.len());
	let nested_offset = sprite_offset + 2 + 4;

	let movie = Movie::from_bytes(&data).unwrap();
	assert_eq!(movie.skipped_tags(), 1);
	assert_eq!(movie.table().sprite(5).unwrap().frame_count(), 1);

	match Movie::from_bytes_with_config(&data, ParseConfig::strict()) {
		Err(MovieError::MalformedTag { code, offset, .. }) => {
			assert_eq!(code, TagCode::PlaceObject2);
			assert_eq!(offset, nested_offset);
		}
		other => panic!("expected a malformed nested tag, got {other:?}"),
	}
}
