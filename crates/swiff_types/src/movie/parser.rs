//! Single-pass tag dispatch that builds the definition table, the main
//! timeline and the movie metadata.

use log::{debug, warn};

use crate::character::{
	BinaryData, Bitmap, Button, ButtonSounds, CharacterDefinition, EditText, Font, FontInfo,
	MorphShape, Shape, Sprite, Text,
};
use crate::codec::BitReader;
use crate::config::ParseConfig;
use crate::error::{MovieError, TagError};
use crate::movie::metadata::{FileAttributes, MovieMetadata, SceneData, read_symbol_list};
use crate::sound::{SoundDefinition, SoundEvent, SoundStreamHead};
use crate::table::DefinitionTable;
use crate::tag::{Tag, TagIter, TagKind};
use crate::timeline::{DisplayInstruction, Timeline, TimelineBuilder};
use crate::transform::ColorTransform;
use crate::types::{Color, Rect};

/// Output of a parse pass
#[derive(Debug, Default)]
pub(crate) struct ParsedMovie {
	pub table: DefinitionTable,
	pub timeline: Timeline,
	pub metadata: MovieMetadata,
	pub skipped_tags: usize,
	pub truncated: bool,
}

/// Parse state for one movie
pub(crate) struct MovieParser<'c> {
	config: &'c ParseConfig,
	version: u8,
	table: DefinitionTable,
	metadata: MovieMetadata,
	skipped_tags: usize,
}

impl<'c> MovieParser<'c> {
	pub fn new(config: &'c ParseConfig, version: u8) -> Self {
		Self {
			config,
			version,
			table: DefinitionTable::new(),
			metadata: MovieMetadata::default(),
			skipped_tags: 0,
		}
	}

	/// Parses the main tag stream starting at `base_offset` in the movie.
	pub fn parse(mut self, tags: &[u8], base_offset: usize) -> Result<ParsedMovie, MovieError> {
		let mut timeline = TimelineBuilder::new();
		let mut iter = TagIter::with_base_offset(tags, base_offset);
		for tag in iter.by_ref() {
			let tag = tag?;
			if tag.code.kind().0 == TagKind::DefineSprite {
				self.decode_sprite(&tag)?;
				continue;
			}
			let result = self.decode_tag(&tag, &mut timeline);
			self.recover(&tag, result)?;
		}

		let truncated = !iter.end_seen();
		if truncated {
			let offset = iter.offset();
			if self.config.strict {
				return Err(MovieError::MissingEnd { offset });
			}
			warn!("tag stream ends at offset {offset} without an End tag");
		}

		Ok(ParsedMovie {
			table: self.table,
			timeline: timeline.finish(),
			metadata: self.metadata,
			skipped_tags: self.skipped_tags,
			truncated,
		})
	}

	/// Turns a tag failure into a fatal error in strict mode, or a warning.
	fn recover(&mut self, tag: &Tag<'_>, result: Result<(), TagError>) -> Result<(), MovieError> {
		match result {
			Ok(()) => Ok(()),
			Err(source) if self.config.strict => Err(MovieError::MalformedTag {
				code: tag.code,
				offset: tag.offset,
				source,
			}),
			Err(e) => {
				warn!("skipping malformed tag {} at offset {}: {e}", tag.code, tag.offset);
				self.skipped_tags += 1;
				Ok(())
			}
		}
	}

	fn reader<'a>(&self, data: &'a [u8]) -> BitReader<'a> {
		BitReader::with_version(data, self.version, self.config.legacy_encoding)
	}

	fn define(&mut self, definition: CharacterDefinition) {
		self.table.insert(definition.id(), definition);
	}

	fn decode_tag(&mut self, tag: &Tag<'_>, timeline: &mut TimelineBuilder) -> Result<(), TagError> {
		let mut reader = self.reader(tag.data);
		let r = &mut reader;
		let (kind, version) = tag.code.kind();

		match kind {
			TagKind::DefineShape => self.define(CharacterDefinition::Shape(Shape::from_reader(r, version)?)),
			TagKind::DefineMorphShape => {
				self.define(CharacterDefinition::MorphShape(MorphShape::from_reader(r, version)?));
			}
			TagKind::DefineBits => {
				self.define(CharacterDefinition::Bitmap(Bitmap::from_jpeg_reader(r, version)?));
			}
			TagKind::DefineBitsLossless => {
				self.define(CharacterDefinition::Bitmap(Bitmap::from_lossless_reader(r, version)?));
			}
			TagKind::JpegTables => self.metadata.jpeg_tables = Some(r.read_rest().to_vec()),
			TagKind::DefineButton => self.define(CharacterDefinition::Button(Button::from_reader(r, version)?)),
			TagKind::DefineButtonCxform => {
				let id = r.read_u16()?;
				let color_transform = ColorTransform::from_reader(r, false)?;
				match self.table.button(id) {
					Some(button) => {
						let button = button.with_color_transform(color_transform);
						self.define(CharacterDefinition::Button(button));
					}
					None => debug!("color transform for undefined button {id}"),
				}
			}
			TagKind::DefineButtonSound => {
				let (id, sounds) = ButtonSounds::from_reader(r)?;
				match self.table.button(id) {
					Some(button) => {
						let button = button.with_sounds(sounds);
						self.define(CharacterDefinition::Button(button));
					}
					None => debug!("sounds for undefined button {id}"),
				}
			}
			TagKind::SetBackgroundColor => self.metadata.background_color = Some(Color::from_rgb(r)?),
			TagKind::DefineFont => self.define(CharacterDefinition::Font(Font::from_reader(r, version)?)),
			TagKind::DefineFontInfo => {
				let info = FontInfo::from_reader(r, version)?;
				match self.table.font(info.font_id) {
					Some(font) => {
						let font = font.with_info(&info);
						self.define(CharacterDefinition::Font(font));
					}
					None => debug!("font info for undefined font {}", info.font_id),
				}
			}
			TagKind::DefineText => self.define(CharacterDefinition::Text(Text::from_reader(r, version)?)),
			TagKind::DefineEditText => self.define(CharacterDefinition::EditText(EditText::from_reader(r)?)),
			TagKind::DefineSound => self.define(CharacterDefinition::Sound(SoundDefinition::from_reader(r)?)),
			TagKind::DefineBinaryData => {
				self.define(CharacterDefinition::BinaryData(BinaryData::from_reader(r)?));
			}
			TagKind::DefineSceneAndFrameLabelData => self.metadata.scene_data = SceneData::from_reader(r)?,
			TagKind::ExportAssets => {
				for (id, name) in read_symbol_list(r)? {
					self.metadata.exports.insert(name, id);
				}
			}
			TagKind::SymbolClass => self.metadata.symbol_classes.extend(read_symbol_list(r)?),
			TagKind::FileAttributes => self.metadata.file_attributes = Some(FileAttributes::from_reader(r)?),
			TagKind::Metadata => self.metadata.metadata_xml = Some(r.read_string()?),
			TagKind::DefineScalingGrid => {
				let id = r.read_u16()?;
				self.metadata.scaling_grids.insert(id, Rect::from_reader(r)?);
			}
			_ => decode_control_tag(tag, r, kind, version, timeline)?,
		}
		Ok(())
	}

	/// Decodes a sprite and its nested control-tag stream.
	///
	/// Nested failures are reported against the nested tag and its offset in
	/// the movie.
	fn decode_sprite(&mut self, tag: &Tag<'_>) -> Result<(), MovieError> {
		let mut reader = self.reader(tag.data);
		let (id, declared_frame_count) = match read_sprite_prefix(&mut reader) {
			Ok(prefix) => prefix,
			Err(e) => return self.recover(tag, Err(e)),
		};
		let nested = reader.read_rest();

		let mut timeline = TimelineBuilder::new();
		// id and frame count precede the nested stream
		for nested_tag in TagIter::with_base_offset(nested, tag.payload_offset + 4) {
			let nested_tag = match nested_tag {
				Ok(nested_tag) => nested_tag,
				Err(e) => {
					warn!("sprite {id} tag stream ends early: {e}");
					break;
				}
			};
			let mut reader = self.reader(nested_tag.data);
			let (kind, version) = nested_tag.code.kind();
			let result = decode_control_tag(&nested_tag, &mut reader, kind, version, &mut timeline);
			self.recover(&nested_tag, result)?;
		}

		let timeline = timeline.finish();
		if timeline.frame_count() != usize::from(declared_frame_count) {
			debug!(
				"sprite {id} declares {declared_frame_count} frames, has {}",
				timeline.frame_count()
			);
		}
		self.define(CharacterDefinition::Sprite(Sprite {
			id,
			declared_frame_count,
			timeline,
		}));
		Ok(())
	}
}

fn read_sprite_prefix(r: &mut BitReader<'_>) -> Result<(u16, u16), TagError> {
	Ok((r.read_u16()?, r.read_u16()?))
}

/// Decodes tags that may appear in any timeline.
fn decode_control_tag(
	tag: &Tag<'_>,
	r: &mut BitReader<'_>,
	kind: TagKind,
	version: u8,
	timeline: &mut TimelineBuilder,
) -> Result<(), TagError> {
	match kind {
		TagKind::ShowFrame => timeline.show_frame(),
		TagKind::PlaceObject => timeline.push_instruction(DisplayInstruction::from_place_reader(r, version)?),
		TagKind::RemoveObject => timeline.push_instruction(DisplayInstruction::from_remove_reader(r, version)?),
		// Optional anchor flag follows the label
		TagKind::FrameLabel => timeline.set_label(r.read_string()?),
		TagKind::StartSound => timeline.push_sound_event(SoundEvent::from_reader(r, version)?),
		TagKind::SoundStreamHead => timeline.set_stream_head(SoundStreamHead::from_reader(r, version)?),
		TagKind::SoundStreamBlock => timeline.set_stream_block(r.read_rest().to_vec()),
		TagKind::End => {}
		TagKind::Unknown => debug!("skipping unknown tag {} at offset {}", tag.code, tag.offset),
		_ => debug!("skipping {} at offset {}", tag.code, tag.offset),
	}
	Ok(())
}
