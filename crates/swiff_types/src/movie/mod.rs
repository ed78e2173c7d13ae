//! Parsed movies.
//!
//! A [`Movie`] is built by one synchronous pass over an already-decompressed
//! buffer and is immutable afterwards. Resolving frames only borrows it, so a
//! movie can be shared across threads and resolved in parallel.
//!
//! # Error policy
//!
//! | Failure | Outcome |
//! |---------|---------|
//! | bad signature, truncated header | fatal [`MovieError`] |
//! | tag length past the end of the buffer | fatal [`MovieError::TagOverrun`] |
//! | buffer ends without an `End` tag | [`Movie::is_truncated`] with a warning, or fatal [`MovieError::MissingEnd`] in strict mode |
//! | unknown tag code | skipped, logged at debug level |
//! | malformed tag payload | skipped with a warning, or fatal in strict mode |

pub mod metadata;
mod parser;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicU64, Ordering};

use log::{debug, info, warn};

pub use metadata::{FileAttributes, FrameLabel, MovieMetadata, Scene, SceneData};

use crate::config::ParseConfig;
use crate::error::MovieError;
use crate::header::Header;
use crate::render::{PaintCommand, Resolver};
use crate::table::DefinitionTable;
use crate::timeline::Timeline;
use crate::types::Color;

static NEXT_MOVIE_ID: AtomicU64 = AtomicU64::new(1);

/// A parsed movie
#[derive(Debug)]
pub struct Movie {
	id: u64,
	header: Header,
	config: ParseConfig,
	table: DefinitionTable,
	timeline: Timeline,
	metadata: MovieMetadata,
	skipped_tags: usize,
	truncated: bool,
}

impl Movie {
	/// Parses a decompressed movie with the default configuration.
	///
	/// # Examples
	///
	/// ```
	/// use swiff_types::codec::MovieWriter;
	/// use swiff_types::movie::Movie;
	/// use swiff_types::tag::TagCode;
	/// use swiff_types::types::Color;
	///
	/// let mut writer = MovieWriter::new(10);
	/// writer.tag(TagCode::SetBackgroundColor, &[0x10, 0x20, 0x30]).show_frame();
	/// let movie = Movie::from_bytes(&writer.finish()).unwrap();
	/// assert_eq!(movie.background_color(), Some(Color::rgb(0x10, 0x20, 0x30)));
	/// ```
	pub fn from_bytes(data: &[u8]) -> Result<Self, MovieError> {
		Self::from_bytes_with_config(data, ParseConfig::default())
	}

	/// Parses a decompressed movie.
	pub fn from_bytes_with_config(data: &[u8], config: ParseConfig) -> Result<Self, MovieError> {
		let (header, tag_offset) = Header::parse(data)?;
		debug!("{header}");
		if (header.file_length as usize) > data.len() {
			warn!(
				"declared length {} exceeds buffer length {}",
				header.file_length,
				data.len()
			);
		} else if header.file_length as usize != data.len() {
			debug!(
				"declared length {} differs from buffer length {}",
				header.file_length,
				data.len()
			);
		}

		let parsed = parser::MovieParser::new(&config, header.version).parse(&data[tag_offset..], tag_offset)?;
		let movie = Self {
			id: NEXT_MOVIE_ID.fetch_add(1, Ordering::Relaxed),
			header,
			config,
			table: parsed.table,
			timeline: parsed.timeline,
			metadata: parsed.metadata,
			skipped_tags: parsed.skipped_tags,
			truncated: parsed.truncated,
		};
		info!(
			"parsed movie {}: version {}, {} characters, {} frames, {} tags skipped",
			movie.id,
			movie.header.version,
			movie.table.len(),
			movie.timeline.frame_count(),
			movie.skipped_tags
		);
		Ok(movie)
	}

	/// Process-unique identifier, used to key per-movie state such as sounds
	pub fn id(&self) -> u64 {
		self.id
	}

	/// Header fields
	pub fn header(&self) -> &Header {
		&self.header
	}

	/// Format version
	pub fn version(&self) -> u8 {
		self.header.version
	}

	/// Configuration the movie was parsed with
	pub fn config(&self) -> &ParseConfig {
		&self.config
	}

	/// Character definitions
	pub fn table(&self) -> &DefinitionTable {
		&self.table
	}

	/// Main timeline
	pub fn timeline(&self) -> &Timeline {
		&self.timeline
	}

	/// Movie-level records
	pub fn metadata(&self) -> &MovieMetadata {
		&self.metadata
	}

	/// Stage background color
	pub fn background_color(&self) -> Option<Color> {
		self.metadata.background_color
	}

	/// Number of malformed tags skipped while parsing
	pub fn skipped_tags(&self) -> usize {
		self.skipped_tags
	}

	/// Returns `true` if the tag stream ended without an `End` tag
	pub fn is_truncated(&self) -> bool {
		self.truncated
	}

	/// Character bound to `class_name` by `SymbolClass`
	pub fn character_for_class(&self, class_name: &str) -> Option<u16> {
		self.metadata.character_for_class(class_name)
	}

	/// Character exported under `name`
	pub fn exported_character(&self, name: &str) -> Option<u16> {
		self.metadata.exports.get(name).copied()
	}

	/// Paint sequence of main-timeline frame `frame`.
	pub fn resolve_frame(&self, frame: usize) -> Vec<PaintCommand<'_>> {
		self.resolver().resolve(&self.timeline, frame)
	}

	/// Resolver over this movie's definitions, honouring its nesting limit.
	pub fn resolver(&self) -> Resolver<'_> {
		Resolver::new(&self.table, self.config.max_nesting_depth)
	}
}
