//! Frame-by-frame traversal of a timeline.

use crate::timeline::{DisplayList, Frame, Timeline};

/// Cursor that advances through a timeline, looping at the end
///
/// The display list is kept incrementally, so advancing costs only the
/// instructions of the next frame. Looping back to the first frame starts
/// from an empty display list.
#[derive(Debug, Clone)]
pub struct Playhead<'a> {
	timeline: &'a Timeline,
	current: Option<usize>,
	display_list: DisplayList,
}

impl<'a> Playhead<'a> {
	/// Creates a playhead positioned before the first frame.
	pub fn new(timeline: &'a Timeline) -> Self {
		Self {
			timeline,
			current: None,
			display_list: DisplayList::new(),
		}
	}

	/// Index of the frame last advanced to
	pub fn current_frame(&self) -> Option<usize> {
		self.current
	}

	/// Display list after the current frame
	pub fn display_list(&self) -> &DisplayList {
		&self.display_list
	}

	/// Advances one frame and returns its index and contents.
	///
	/// Returns `None` only for a timeline without frames.
	pub fn advance(&mut self) -> Option<(usize, &'a Frame)> {
		let count = self.timeline.frame_count();
		if count == 0 {
			return None;
		}

		let next = match self.current {
			Some(index) if index + 1 < count => index + 1,
			_ => {
				self.display_list.clear();
				0
			}
		};
		let frame = self.timeline.frame(next)?;
		for instruction in &frame.instructions {
			self.display_list.apply(instruction, next);
		}
		self.current = Some(next);
		Some((next, frame))
	}

	/// Jumps to `index`, rebuilding the display list from the first frame.
	pub fn seek(&mut self, index: usize) -> Option<&'a Frame> {
		let frame = self.timeline.frame(index)?;
		self.display_list = self.timeline.display_list_at(index);
		self.current = Some(index);
		Some(frame)
	}
}
