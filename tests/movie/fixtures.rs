//! Movie builders shared by the integration tests

use swiff_rs::prelude::*;
use swiff_rs::swiff_types::codec::write_tag;

/// A `size` x `size` twip square filled with `color`
pub(crate) fn square(id: u16, size: i32, color: Color) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u16(id);
	Rect::new(0, size, 0, size).write(&mut w);
	w.write_u8(1);
	w.write_u8(0x00);
	color.write(&mut w, false);
	w.write_u8(0);
	w.write_ub(1, 4);
	w.write_ub(0, 4);

	w.write_bit(false);
	w.write_ub(0b00011, 5);
	w.write_ub(1, 5);
	w.write_sb(0, 1);
	w.write_sb(0, 1);
	w.write_ub(1, 1);
	for (dx, dy) in [(size, 0), (0, size), (-size, 0), (0, -size)] {
		w.write_bit(true);
		w.write_bit(true);
		w.write_ub(14, 4);
		w.write_bit(false);
		if dx == 0 {
			w.write_bit(true);
			w.write_sb(dy, 16);
		} else {
			w.write_bit(false);
			w.write_sb(dx, 16);
		}
	}
	w.write_bit(false);
	w.write_ub(0, 5);
	w.into_bytes()
}

/// `PlaceObject2` of a new character with a translation
pub(crate) fn place_at(depth: u16, character_id: u16, x: i32, y: i32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u8(0x02 | 0x04);
	w.write_u16(depth);
	w.write_u16(character_id);
	Matrix::translate(x, y).write(&mut w);
	w.into_bytes()
}

/// `PlaceObject2` moving the character at `depth`
pub(crate) fn move_to(depth: u16, x: i32, y: i32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u8(0x01 | 0x04);
	w.write_u16(depth);
	Matrix::translate(x, y).write(&mut w);
	w.into_bytes()
}

/// `RemoveObject2`
pub(crate) fn remove(depth: u16) -> Vec<u8> {
	depth.to_le_bytes().to_vec()
}

/// `DefineSound` of 16-bit little-endian mono samples at 44.1 kHz
pub(crate) fn pcm_sound(id: u16, samples: &[i16]) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u16(id);
	w.write_u8(0x3E);
	w.write_u32(samples.len() as u32);
	for &sample in samples {
		w.write_i16(sample);
	}
	w.into_bytes()
}

/// A sprite of `frames` frames sliding the square at depth 1 to the right
pub(crate) fn sliding_sprite(id: u16, child: u16, frames: u16) -> Vec<u8> {
	let mut nested = Vec::new();
	write_tag(&mut nested, TagCode::PlaceObject2, &place_at(1, child, 0, 0));
	write_tag(&mut nested, TagCode::ShowFrame, &[]);
	for frame in 1..frames {
		write_tag(&mut nested, TagCode::PlaceObject2, &move_to(1, i32::from(frame) * 100, 0));
		write_tag(&mut nested, TagCode::ShowFrame, &[]);
	}
	write_tag(&mut nested, TagCode::End, &[]);

	let mut w = BitWriter::new();
	w.write_u16(id);
	w.write_u16(frames);
	w.write_bytes(&nested);
	w.into_bytes()
}

/// Four-frame movie:
///
/// - frame 0: red square at depth 1, sprite 3 (sliding blue square) at depth 2
/// - frame 1: red square moves to (200, 0)
/// - frame 2: red square removed
/// - frame 3: nothing changes
pub(crate) fn animated_movie() -> Vec<u8> {
	let mut writer = MovieWriter::new(10);
	writer
		.tag(TagCode::SetBackgroundColor, &[0xFF, 0xFF, 0xFF])
		.tag(TagCode::DefineShape, &square(1, 100, Color::rgb(255, 0, 0)))
		.tag(TagCode::DefineShape, &square(2, 100, Color::rgb(0, 0, 255)))
		.tag(TagCode::DefineSprite, &sliding_sprite(3, 2, 3))
		.tag(TagCode::PlaceObject2, &place_at(1, 1, 0, 0))
		.tag(TagCode::PlaceObject2, &place_at(2, 3, 1000, 1000))
		.show_frame()
		.tag(TagCode::PlaceObject2, &move_to(1, 200, 0))
		.show_frame()
		.tag(TagCode::RemoveObject2, &remove(1))
		.show_frame()
		.show_frame();
	writer.finish()
}
