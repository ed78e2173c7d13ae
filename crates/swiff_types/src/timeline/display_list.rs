//! Running display-list state of one timeline.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::timeline::instruction::{DisplayInstruction, Placement};

/// A placed instance and the frame its character was placed on
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayEntry {
	/// Current placement values
	pub placement: Placement,
	/// Frame index of the `Place` or `Replace` that created the instance
	pub placed_at: usize,
}

/// Instances by depth
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisplayList {
	entries: BTreeMap<u16, DisplayEntry>,
}

impl DisplayList {
	/// Creates an empty display list.
	pub fn new() -> Self {
		Self::default()
	}

	/// Applies one instruction as part of frame `frame_index`.
	pub fn apply(&mut self, instruction: &DisplayInstruction, frame_index: usize) {
		match instruction {
			DisplayInstruction::Place(placement) => {
				self.entries.insert(
					placement.depth,
					DisplayEntry {
						placement: placement.clone(),
						placed_at: frame_index,
					},
				);
			}
			DisplayInstruction::Update(update) => match self.entries.get_mut(&update.depth) {
				Some(entry) => entry.placement.apply_update(update),
				None => debug!("update of empty depth {} ignored", update.depth),
			},
			DisplayInstruction::Replace {
				character_id,
				update,
			} => {
				let placement = match self.entries.get(&update.depth) {
					Some(previous) => {
						let mut placement = previous.placement.clone();
						placement.character_id = *character_id;
						placement.apply_update(update);
						if update.name.is_some() {
							placement.name.clone_from(&update.name);
						}
						if update.clip_depth.is_some() {
							placement.clip_depth = update.clip_depth;
						}
						placement
					}
					None => update.clone().into_placement(*character_id),
				};
				self.entries.insert(
					update.depth,
					DisplayEntry {
						placement,
						placed_at: frame_index,
					},
				);
			}
			DisplayInstruction::Remove { depth } => {
				if self.entries.remove(depth).is_none() {
					debug!("remove of empty depth {depth} ignored");
				}
			}
		}
	}

	/// Entry at `depth`
	pub fn get(&self, depth: u16) -> Option<&DisplayEntry> {
		self.entries.get(&depth)
	}

	/// Entries in ascending depth order.
	pub fn iter(&self) -> impl Iterator<Item = &DisplayEntry> {
		self.entries.values()
	}

	/// Number of occupied depths
	pub fn len(&self) -> usize {
		self.entries.len()
	}

	/// Returns `true` if no depth is occupied
	pub fn is_empty(&self) -> bool {
		self.entries.is_empty()
	}

	/// Clears every depth.
	pub fn clear(&mut self) {
		self.entries.clear();
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::filter::BlendMode;
	use crate::timeline::instruction::PlacementUpdate;
	use crate::transform::Matrix;

	#[test]
	fn test_place_update_remove() {
		let mut list = DisplayList::new();
		list.apply(&DisplayInstruction::Place(Placement::new(2, 10)), 0);
		list.apply(&DisplayInstruction::Place(Placement::new(1, 11)), 0);
		let depths: Vec<_> = list.iter().map(|e| e.placement.depth).collect();
		assert_eq!(depths, vec![1, 2]);

		list.apply(
			&DisplayInstruction::Update(PlacementUpdate {
				depth: 2,
				blend_mode: Some(BlendMode::Screen),
				..PlacementUpdate::default()
			}),
			3,
		);
		let entry = list.get(2).unwrap();
		assert_eq!(entry.placement.character_id, 10);
		assert_eq!(entry.placement.blend_mode, BlendMode::Screen);
		assert_eq!(entry.placed_at, 0);

		list.apply(&DisplayInstruction::Remove { depth: 1 }, 4);
		list.apply(&DisplayInstruction::Remove { depth: 99 }, 4);
		assert_eq!(list.len(), 1);
	}

	#[test]
	fn test_update_of_empty_depth_is_ignored() {
		let mut list = DisplayList::new();
		list.apply(
			&DisplayInstruction::Update(PlacementUpdate {
				depth: 5,
				..PlacementUpdate::default()
			}),
			0,
		);
		assert!(list.is_empty());
	}

	#[test]
	fn test_replace_inherits_fields() {
		let mut list = DisplayList::new();
		let mut placement = Placement::new(1, 10);
		placement.matrix = Matrix::translate(50, 60);
		placement.name = Some("clip".to_string());
		list.apply(&DisplayInstruction::Place(placement), 0);

		list.apply(
			&DisplayInstruction::Replace {
				character_id: 20,
				update: PlacementUpdate {
					depth: 1,
					ratio: Some(7),
					..PlacementUpdate::default()
				},
			},
			2,
		);
		let entry = list.get(1).unwrap();
		assert_eq!(entry.placement.character_id, 20);
		assert_eq!(entry.placement.matrix, Matrix::translate(50, 60));
		assert_eq!(entry.placement.name.as_deref(), Some("clip"));
		assert_eq!(entry.placement.ratio, Some(7));
		assert_eq!(entry.placed_at, 2);
	}
}
