//! Common utilities for MiniPack.
//!
//! This crate provides the foundational pieces shared by the MiniPack crates:
//!
//! - [`BinaryReader`] - Bounds-checked little-endian reading from byte slices
//! - [`fill_buf`] - Chunk filling for streamed copies
//! - [`text`] - Validated UTF-8 / UTF-16 conversion for entry names and
//!   BOM-aware decoding of text inputs

mod buf;
mod error;
mod reader;

pub mod text;

pub use buf::fill_buf;
pub use error::{EncodingError, Error, Result};
pub use reader::BinaryReader;
