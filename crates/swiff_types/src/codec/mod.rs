//! Bit-level encoding primitives shared by every tag decoder.
//!
//! The reader exposes the primitive field types of the format:
//!
//! | Primitive | Layout |
//! |-----------|--------|
//! | `UI8/16/32`, `SI16/32` | little-endian, byte aligned |
//! | `FIXED8` | signed 8.8 fixed point in two bytes |
//! | `FIXED` | signed 16.16 fixed point in four bytes |
//! | `UB[n]`, `SB[n]`, `FB[n]` | packed bit fields, most significant bit first |
//! | `EncodedU32` | 7 bits per byte, high bit continues |
//! | `STRING` | NUL-terminated, UTF-8 from version 6, legacy code page before |
//!
//! Composite records built from these (rectangles, matrices, color
//! transforms) live in [`crate::types`].

mod reader;
mod writer;

pub use reader::{BitReader, UTF8_STRING_VERSION};
pub use writer::{BitWriter, MovieWriter, count_fb_bits, count_sb_bits, count_ub_bits, write_tag};
