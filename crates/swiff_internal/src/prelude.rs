//! Prelude module for `swiff_internal`.
//!
//! This module provides a convenient way to import commonly used types and traits.
//!
//! # Examples
//!
//! ```rust
//! use swiff_internal::prelude::*;
//!
//! // Now you can use all common types directly
//! let mut writer = MovieWriter::new(8);
//! writer.tag(TagCode::SetBackgroundColor, &[0, 0, 0]).show_frame();
//! let movie = Movie::from_bytes(&writer.finish()).unwrap();
//!
//! // Walk the main timeline
//! let mut playhead = Playhead::new(movie.timeline());
//! assert!(playhead.advance().is_some());
//! ```

// Re-export everything from swiff_types::prelude
#[doc(inline)]
pub use swiff_types::prelude::*;

// Re-export the entire swiff_types module for advanced usage
#[doc(inline)]
pub use swiff_types;
