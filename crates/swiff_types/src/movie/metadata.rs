//! Movie-level records that are not characters or frames.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::codec::BitReader;
use crate::error::TagError;
use crate::types::{Color, Rect};

/// Flags of `FileAttributes`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileAttributes {
	/// Hardware-accelerated blitting requested
	pub use_direct_blit: bool,
	/// GPU compositing requested
	pub use_gpu: bool,
	/// The movie has a `Metadata` tag
	pub has_metadata: bool,
	/// Scripts use the newer virtual machine
	pub is_action_script_3: bool,
	/// Network access granted to local playback
	pub use_network: bool,
}

impl FileAttributes {
	/// Decodes a `FileAttributes` payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let flags = reader.read_u8()?;
		// remaining 24 bits are reserved
		Ok(Self {
			use_direct_blit: flags & 0x40 != 0,
			use_gpu: flags & 0x20 != 0,
			has_metadata: flags & 0x10 != 0,
			is_action_script_3: flags & 0x08 != 0,
			use_network: flags & 0x01 != 0,
		})
	}
}

/// Scene start
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Scene {
	/// First frame of the scene
	pub frame: u32,
	/// Scene name
	pub name: String,
}

/// Label from `DefineSceneAndFrameLabelData`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameLabel {
	/// Labelled frame
	pub frame: u32,
	/// Label text
	pub name: String,
}

/// Scenes and frame labels of the main timeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SceneData {
	/// Scenes by first frame
	pub scenes: Vec<Scene>,
	/// Frame labels
	pub labels: Vec<FrameLabel>,
}

impl SceneData {
	/// Decodes a `DefineSceneAndFrameLabelData` payload.
	pub fn from_reader(reader: &mut BitReader<'_>) -> Result<Self, TagError> {
		let scene_count = reader.read_encoded_u32()?;
		let mut scenes = Vec::new();
		for _ in 0..scene_count {
			scenes.push(Scene {
				frame: reader.read_encoded_u32()?,
				name: reader.read_string()?,
			});
		}
		let label_count = reader.read_encoded_u32()?;
		let mut labels = Vec::new();
		for _ in 0..label_count {
			labels.push(FrameLabel {
				frame: reader.read_encoded_u32()?,
				name: reader.read_string()?,
			});
		}
		Ok(Self { scenes, labels })
	}

	/// Scene containing `frame`
	pub fn scene_at(&self, frame: u32) -> Option<&Scene> {
		self.scenes.iter().rev().find(|scene| scene.frame <= frame)
	}
}

/// Reads the `(ID, name)` list of `ExportAssets` and `SymbolClass`.
pub fn read_symbol_list(reader: &mut BitReader<'_>) -> Result<Vec<(u16, String)>, TagError> {
	let count = reader.read_u16()?;
	let mut symbols = Vec::with_capacity(usize::from(count));
	for _ in 0..count {
		symbols.push((reader.read_u16()?, reader.read_string()?));
	}
	Ok(symbols)
}

/// Everything a movie declares outside its characters and frames
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MovieMetadata {
	/// Stage color from `SetBackgroundColor`
	pub background_color: Option<Color>,
	/// Flags from `FileAttributes`
	pub file_attributes: Option<FileAttributes>,
	/// Scenes and labels from `DefineSceneAndFrameLabelData`
	pub scene_data: SceneData,
	/// Exported names to character IDs
	pub exports: BTreeMap<String, u16>,
	/// Character IDs to class names
	pub symbol_classes: BTreeMap<u16, String>,
	/// XML from the `Metadata` tag
	pub metadata_xml: Option<String>,
	/// Nine-slice grids by character ID
	pub scaling_grids: HashMap<u16, Rect>,
	/// Encoding tables shared by `DefineBits` images
	pub jpeg_tables: Option<Vec<u8>>,
}

impl MovieMetadata {
	/// Character bound to a class name through `SymbolClass`
	pub fn character_for_class(&self, class_name: &str) -> Option<u16> {
		self.symbol_classes
			.iter()
			.find_map(|(&id, name)| (name == class_name).then_some(id))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::codec::BitWriter;

	#[test]
	fn test_file_attributes() {
		let data = [0x19, 0, 0, 0];
		let attributes = FileAttributes::from_reader(&mut BitReader::new(&data)).unwrap();
		assert!(attributes.has_metadata);
		assert!(attributes.is_action_script_3);
		assert!(attributes.use_network);
		assert!(!attributes.use_gpu);
	}

	#[test]
	fn test_scene_data() {
		let mut w = BitWriter::new();
		w.write_encoded_u32(2);
		w.write_encoded_u32(0);
		w.write_string("Intro");
		w.write_encoded_u32(200);
		w.write_string("Main");
		w.write_encoded_u32(1);
		w.write_encoded_u32(210);
		w.write_string("loop");
		let data = w.into_bytes();

		let scenes = SceneData::from_reader(&mut BitReader::new(&data)).unwrap();
		assert_eq!(scenes.scenes.len(), 2);
		assert_eq!(scenes.scenes[1].frame, 200);
		assert_eq!(scenes.labels[0].name, "loop");
		assert_eq!(scenes.scene_at(150).map(|s| s.name.as_str()), Some("Intro"));
		assert_eq!(scenes.scene_at(210).map(|s| s.name.as_str()), Some("Main"));
	}

	#[test]
	fn test_symbol_list() {
		let data = b"\x02\x00\x05\x00Ball\0\x00\x00Main\0";
		let symbols = read_symbol_list(&mut BitReader::new(data)).unwrap();
		assert_eq!(symbols, vec![(5, "Ball".to_string()), (0, "Main".to_string())]);

		let mut metadata = MovieMetadata::default();
		metadata.symbol_classes.extend(symbols);
		assert_eq!(metadata.character_for_class("Ball"), Some(5));
		assert_eq!(metadata.character_for_class("Nope"), None);
	}
}
