//! Benchmark helper utilities for swiff-rs
//!
//! This module generates synthetic movies for the benchmark suite. Every
//! movie is built with [`MovieWriter`], so the parser sees exactly the bytes a
//! real uncompressed movie would carry.

use swiff_types::codec::{BitWriter, MovieWriter, write_tag};
use swiff_types::tag::TagCode;
use swiff_types::transform::{ColorTransform, Matrix};
use swiff_types::types::{Color, Rect};

/// Builds a `DefineShape` payload: a filled square made of `edges` straight
/// edges per side.
pub fn shape_payload(id: u16, size: i32, edges: u32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u16(id);
	Rect::new(0, size, 0, size).write(&mut w);
	w.write_u8(1);
	w.write_u8(0x00);
	Color::rgb((id % 256) as u8, 0x80, 0x40).write(&mut w, false);
	w.write_u8(0);
	w.write_ub(1, 4);
	w.write_ub(0, 4);

	// style change: fill0 = 1, move to (0, 0)
	w.write_bit(false);
	w.write_ub(0b00011, 5);
	w.write_ub(1, 5);
	w.write_sb(0, 1);
	w.write_sb(0, 1);
	w.write_ub(1, 1);

	let step = (size / edges.max(1) as i32).max(1);
	for (dx, dy) in [(step, 0), (0, step), (-step, 0), (0, -step)] {
		for _ in 0..edges.max(1) {
			w.write_bit(true);
			w.write_bit(true);
			// 16-bit deltas
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
	}
	w.write_bit(false);
	w.write_ub(0, 5);
	w.into_bytes()
}

/// Builds a `PlaceObject2` payload with a matrix and a color transform.
pub fn place_payload(depth: u16, character_id: u16, x: i32, y: i32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u8(0x02 | 0x04 | 0x08);
	w.write_u16(depth);
	w.write_u16(character_id);
	Matrix::translate(x, y).write(&mut w);
	ColorTransform::new([1.0, 0.5, 0.5, 1.0], [0.0; 4]).write(&mut w, true);
	w.into_bytes()
}

/// Builds a `PlaceObject2` payload that moves the object at `depth`.
pub fn move_payload(depth: u16, x: i32, y: i32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u8(0x01 | 0x04);
	w.write_u16(depth);
	Matrix::translate(x, y).write(&mut w);
	w.into_bytes()
}

/// Generates a movie with `shapes` shapes placed on the main timeline and
/// moved every frame for `frames` frames.
pub fn generate_flat_movie(shapes: u16, frames: u16) -> Vec<u8> {
	let mut writer = MovieWriter::new(10);
	for id in 1..=shapes {
		writer.tag(TagCode::DefineShape, &shape_payload(id, 400, 8));
	}
	for id in 1..=shapes {
		writer.tag(TagCode::PlaceObject2, &place_payload(id, id, i32::from(id) * 20, 0));
	}
	writer.show_frame();
	for frame in 1..frames {
		for depth in 1..=shapes {
			writer.tag(TagCode::PlaceObject2, &move_payload(depth, i32::from(frame) * 20, i32::from(depth)));
		}
		writer.show_frame();
	}
	writer.finish()
}

/// Generates a movie with a chain of `depth` nested sprites around one shape,
/// each sprite animating its child over `frames` frames.
pub fn generate_nested_movie(depth: u16, frames: u16) -> Vec<u8> {
	let mut writer = MovieWriter::new(10);
	writer.tag(TagCode::DefineShape, &shape_payload(1, 200, 4));

	for level in 0..depth {
		let id = level + 2;
		let child = level + 1;
		let mut nested = Vec::new();
		write_tag(&mut nested, TagCode::PlaceObject2, &place_payload(1, child, 10, 10));
		write_tag(&mut nested, TagCode::ShowFrame, &[]);
		for frame in 1..frames {
			write_tag(&mut nested, TagCode::PlaceObject2, &move_payload(1, i32::from(frame), 0));
			write_tag(&mut nested, TagCode::ShowFrame, &[]);
		}
		write_tag(&mut nested, TagCode::End, &[]);

		let mut sprite = BitWriter::new();
		sprite.write_u16(id);
		sprite.write_u16(frames);
		sprite.write_bytes(&nested);
		writer.tag(TagCode::DefineSprite, &sprite.into_bytes());
	}

	writer.tag(TagCode::PlaceObject2, &place_payload(1, depth + 1, 0, 0));
	for _ in 0..frames {
		writer.show_frame();
	}
	writer.finish()
}

/// Generates `samples` mono 16-bit samples of a square wave as a
/// `DefineSound` payload.
pub fn sound_payload(id: u16, samples: u32) -> Vec<u8> {
	let mut w = BitWriter::new();
	w.write_u16(id);
	// little-endian PCM, 44.1 kHz, 16-bit, mono
	w.write_u8(0x3E);
	w.write_u32(samples);
	for i in 0..samples {
		w.write_i16(if i % 100 < 50 { 8000 } else { -8000 });
	}
	w.into_bytes()
}
