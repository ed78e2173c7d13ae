//! Prelude module for `swiff_types`.
//!
//! This module provides a convenient way to import commonly used types, traits, and constants.
//!
//! # Examples
//!
//! ```
//! use swiff_types::prelude::*;
//!
//! let config = ParseConfig::default();
//! let table = DefinitionTable::new();
//! assert!(table.is_empty());
//! assert_eq!(config.max_nesting_depth, 64);
//! ```

// Parsing
#[doc(inline)]
pub use crate::{
	codec::{BitReader, BitWriter, MovieWriter},
	config::ParseConfig,
	error::{MovieError, MpegError, SoundError, TagError},
	header::{Compression, Header},
	movie::{Movie, MovieMetadata},
	tag::{Tag, TagCode, TagIter, TagKind},
};

// Definitions
#[doc(inline)]
pub use crate::character::{
	BinaryData, Bitmap, Button, CharacterDefinition, EditText, Font, MorphShape, Shape, Sprite, Text,
};
#[doc(inline)]
pub use crate::table::DefinitionTable;

// Timeline and composition
#[doc(inline)]
pub use crate::{
	filter::{BlendMode, Filter},
	render::{Paint, PaintCommand, Resolver, resolve},
	timeline::{DisplayInstruction, DisplayList, Frame, Placement, PlacementUpdate, Playhead, Timeline},
	transform::{ColorTransform, Matrix, Transform},
	types::{Color, Rect},
};

// Sound
#[doc(inline)]
pub use crate::sound::{
	AudioSink, ChannelId, ExternalDecoder, PcmBuffer, Playback, SoundCompression, SoundDefinition,
	SoundEvent, SoundFormat, SoundInfo, SoundPlayer, SoundStreamHead,
};
