//! Parse configuration for movie decoding.
//!
//! Controls how tolerant the parser is of malformed tags, how deep frame
//! resolution may recurse into nested sprites and buttons, and which code page
//! decodes strings in movies that predate UTF-8.

use encoding_rs::{Encoding, WINDOWS_1252};

/// Configuration for parsing a movie.
///
/// # Presets
///
/// - `default()`: skip malformed tags, nesting limit 64, Windows-1252 legacy text
/// - `lenient()`: skip malformed tags, nesting limit 256
/// - `strict()`: a malformed tag aborts the parse, nesting limit 16
///
/// # Examples
///
/// ```
/// use swiff_types::config::ParseConfig;
///
/// let config = ParseConfig::default();
/// assert!(!config.strict);
///
/// let config = ParseConfig::new(8, true, encoding_rs::SHIFT_JIS);
/// assert_eq!(config.max_nesting_depth, 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseConfig {
	/// Maximum sprite/button nesting followed while resolving a frame
	pub max_nesting_depth: usize,
	/// Treat a tag that fails to decode as fatal
	pub strict: bool,
	/// Encoding of strings in movies older than version 6
	pub legacy_encoding: &'static Encoding,
}

impl Default for ParseConfig {
	fn default() -> Self {
		Self {
			max_nesting_depth: 64,
			strict: false,
			legacy_encoding: WINDOWS_1252,
		}
	}
}

impl ParseConfig {
	/// Create a new parse configuration.
	///
	/// # Arguments
	/// * `max_nesting_depth` - Resolution recursion limit
	/// * `strict` - Whether a malformed tag aborts the parse
	/// * `legacy_encoding` - Code page for pre-UTF-8 strings
	pub fn new(max_nesting_depth: usize, strict: bool, legacy_encoding: &'static Encoding) -> Self {
		Self {
			max_nesting_depth,
			strict,
			legacy_encoding,
		}
	}

	/// Create a lenient configuration for deeply nested content.
	pub fn lenient() -> Self {
		Self {
			max_nesting_depth: 256,
			..Self::default()
		}
	}

	/// Create a strict configuration.
	///
	/// Any tag that fails to decode surfaces as
	/// [`MovieError::MalformedTag`](crate::error::MovieError::MalformedTag).
	pub fn strict() -> Self {
		Self {
			max_nesting_depth: 16,
			strict: true,
			..Self::default()
		}
	}
}
