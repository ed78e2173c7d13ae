//! Frames and display lists of the main movie and of sprites.
//!
//! A [`Timeline`] is an immutable list of [`Frame`]s. The display list at a
//! frame is derived by applying every instruction from the first frame up to
//! and including that frame, so the timeline itself never changes after
//! parsing and can be shared across threads.

pub mod display_list;
pub mod frame;
pub mod instruction;
pub mod playhead;

use log::debug;
use serde::{Deserialize, Serialize};

pub use display_list::{DisplayEntry, DisplayList};
pub use frame::Frame;
pub use instruction::{DisplayInstruction, Placement, PlacementUpdate};
pub use playhead::Playhead;

use crate::sound::{SoundEvent, SoundStreamHead};

/// Ordered frames of one timeline
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Timeline {
	frames: Vec<Frame>,
	stream_head: Option<SoundStreamHead>,
}

impl Timeline {
	/// Number of frames
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Frame at `index`
	pub fn frame(&self, index: usize) -> Option<&Frame> {
		self.frames.get(index)
	}

	/// All frames in order
	pub fn frames(&self) -> &[Frame] {
		&self.frames
	}

	/// Stream sound format, if the timeline has a stream
	pub fn stream_head(&self) -> Option<&SoundStreamHead> {
		self.stream_head.as_ref()
	}

	/// Display list after applying frames `0..=index`.
	///
	/// An index past the end yields the list after the last frame.
	pub fn display_list_at(&self, index: usize) -> DisplayList {
		let mut list = DisplayList::new();
		for (frame_index, frame) in self.frames.iter().enumerate().take(index.saturating_add(1)) {
			for instruction in &frame.instructions {
				list.apply(instruction, frame_index);
			}
		}
		list
	}

	/// Index of the frame carrying `label`
	pub fn label_frame(&self, label: &str) -> Option<usize> {
		self.frames.iter().position(|frame| frame.label.as_deref() == Some(label))
	}

	/// Labels with their frame indices
	pub fn labels(&self) -> impl Iterator<Item = (usize, &str)> {
		self.frames
			.iter()
			.enumerate()
			.filter_map(|(index, frame)| frame.label.as_deref().map(|label| (index, label)))
	}
}

/// Collects control tags into frames during parsing
#[derive(Debug, Default)]
pub struct TimelineBuilder {
	frames: Vec<Frame>,
	current: Frame,
	stream_head: Option<SoundStreamHead>,
}

impl TimelineBuilder {
	/// Starts an empty timeline.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds an instruction to the frame being built.
	pub fn push_instruction(&mut self, instruction: DisplayInstruction) {
		self.current.instructions.push(instruction);
	}

	/// Labels the frame being built; a second label replaces the first.
	pub fn set_label(&mut self, label: String) {
		self.current.label = Some(label);
	}

	/// Adds a start-sound event to the frame being built.
	pub fn push_sound_event(&mut self, event: SoundEvent) {
		self.current.sound_events.push(event);
	}

	/// Sets the stream block of the frame being built.
	pub fn set_stream_block(&mut self, block: Vec<u8>) {
		if self.current.stream_block.replace(block).is_some() {
			debug!("second stream block in frame {} replaces the first", self.frames.len());
		}
	}

	/// Records the stream format.
	pub fn set_stream_head(&mut self, head: SoundStreamHead) {
		self.stream_head = Some(head);
	}

	/// Number of frames completed so far
	pub fn frame_count(&self) -> usize {
		self.frames.len()
	}

	/// Closes the frame being built.
	pub fn show_frame(&mut self) {
		let mut frame = std::mem::take(&mut self.current);
		frame.sort_by_depth();
		self.frames.push(frame);
	}

	/// Finishes the timeline.
	///
	/// Control tags after the last frame boundary still form a frame.
	pub fn finish(mut self) -> Timeline {
		if !self.current.is_empty() {
			debug!("closing trailing frame {} without ShowFrame", self.frames.len());
			self.show_frame();
		}
		Timeline {
			frames: self.frames,
			stream_head: self.stream_head,
		}
	}
}
