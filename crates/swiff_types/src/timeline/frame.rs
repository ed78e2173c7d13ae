//! Frames of a timeline.

use serde::{Deserialize, Serialize};

use crate::sound::SoundEvent;
use crate::timeline::instruction::DisplayInstruction;

/// Everything that happens on one frame
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frame {
	/// Display-list instructions, ordered by depth
	///
	/// Instructions on the same depth keep their file order.
	pub instructions: Vec<DisplayInstruction>,
	/// Label from `FrameLabel`
	pub label: Option<String>,
	/// Start-sound events, in file order
	pub sound_events: Vec<SoundEvent>,
	/// Payload of this frame's `SoundStreamBlock`
	pub stream_block: Option<Vec<u8>>,
}

impl Frame {
	/// Returns `true` if the frame carries nothing
	pub fn is_empty(&self) -> bool {
		self.instructions.is_empty()
			&& self.label.is_none()
			&& self.sound_events.is_empty()
			&& self.stream_block.is_none()
	}

	/// Stable-sorts the instructions by depth.
	pub(crate) fn sort_by_depth(&mut self) {
		self.instructions.sort_by_key(DisplayInstruction::depth);
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::timeline::instruction::Placement;

	#[test]
	fn test_sort_keeps_same_depth_order() {
		let mut frame = Frame {
			instructions: vec![
				DisplayInstruction::Remove { depth: 5 },
				DisplayInstruction::Place(Placement::new(2, 1)),
				DisplayInstruction::Place(Placement::new(5, 3)),
			],
			..Frame::default()
		};
		assert!(!frame.is_empty());
		frame.sort_by_depth();
		assert_eq!(
			frame.instructions.iter().map(DisplayInstruction::depth).collect::<Vec<_>>(),
			vec![2, 5, 5]
		);
		assert_eq!(frame.instructions[1], DisplayInstruction::Remove { depth: 5 });
	}
}
