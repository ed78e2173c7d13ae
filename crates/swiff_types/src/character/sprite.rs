//! Movie clips (`DefineSprite`).

use crate::timeline::Timeline;

/// Decoded `DefineSprite`: a character with its own timeline
///
/// The nested tag stream may only hold control tags (placements, frame
/// boundaries, labels and sound tags); definitions inside it are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sprite {
	/// Character ID
	pub id: u16,
	/// Declared frame count
	pub declared_frame_count: u16,
	/// Nested timeline
	pub timeline: Timeline,
}

impl Sprite {
	/// Number of frames the nested timeline actually holds.
	pub fn frame_count(&self) -> usize {
		self.timeline.frame_count()
	}

	/// Maps a parent-relative frame offset onto this sprite's looping timeline.
	///
	/// `elapsed` counts frames since the sprite instance was placed.
	pub fn local_frame(&self, elapsed: usize) -> usize {
		match self.frame_count() {
			0 => 0,
			count => elapsed % count,
		}
	}
}
