//! This crate provides the core data model and decoders for the `swiff-rs` project.
//!
//! # Pipeline
//!
//! - **Tags**: a decompressed movie is a header followed by length-prefixed tag records
//! - **Definitions**: character tags populate a sparse [`table::DefinitionTable`]
//! - **Timeline**: control tags become per-frame display instructions
//! - **Resolution**: a frame resolves to a depth-ordered sequence of
//!   [`render::PaintCommand`]s with transforms, color transforms, filters and
//!   blend modes composed through nested sprites
//! - **Sound**: embedded audio is decoded to PCM and scheduled on an injected sink
//!
//! # Examples
//!
//! Using the prelude (recommended):
//!
//! ```
//! use swiff_types::prelude::*;
//!
//! let mut writer = MovieWriter::new(10);
//! writer.show_frame();
//! let movie = Movie::from_bytes(&writer.finish()).unwrap();
//! for frame in 0..movie.timeline().frame_count() {
//!     let commands = movie.resolve_frame(frame);
//!     assert!(commands.is_empty());
//! }
//! ```
//!
//! Or use explicit paths:
//!
//! ```no_run
//! use swiff_types::config::ParseConfig;
//! use swiff_types::movie::Movie;
//!
//! let data = std::fs::read("movie.swf.raw").unwrap();
//! let movie = Movie::from_bytes_with_config(&data, ParseConfig::strict()).unwrap();
//! println!("{} characters", movie.table().len());
//! ```

pub mod character;
pub mod codec;
pub mod config;
pub mod error;
pub mod filter;
pub mod header;
pub mod movie;
pub mod render;
pub mod sound;
pub mod table;
pub mod tag;
pub mod timeline;
pub mod transform;
pub mod types;

/// `use swiff_types::prelude::*;` to import commonly used items.
pub mod prelude;
