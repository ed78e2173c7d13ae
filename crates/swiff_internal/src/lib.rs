//! This module is separated into its own crate to keep the facade crate thin, and should not be used directly.

/// `use swiff::prelude::*;` to import commonly used items.
pub mod prelude;

// Re-export swiff_types for convenience
pub use swiff_types;

// Re-export commonly used types at crate root
pub use swiff_types::config::ParseConfig;
pub use swiff_types::error::{MovieError, SoundError, TagError};
pub use swiff_types::movie::Movie;
pub use swiff_types::render::{PaintCommand, Resolver, resolve};
