#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! `swiff-rs` decodes tag-structured vector movies into character definitions,
//! frame timelines, depth-ordered paint sequences and scheduled audio.
//!
//! Decompression of the container and final rasterization are left to the
//! caller; this crate works on the decompressed tag stream and hands a
//! resolved [`PaintCommand`] sequence to whatever backend draws it.
//!
pub use swiff_internal::*;
