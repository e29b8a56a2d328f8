//! Streaming encoder and decoder for the [QOI](https://qoiformat.org) image format.
//!
//! Encoding takes RGBA pixel data and produces the complete QOI byte stream in
//! one pass. Decoding pulls bytes from any [`std::io::Read`] through a fixed
//! 4 KiB window, so memory use beyond the output image does not grow with the
//! file size.
//!
//! Pixel data is always RGBA, 4 bytes per pixel. The `channels` and
//! `colorspace` header fields are carried through untouched.
//!
//! The [`plugin`] module exposes the codec through the [`ImageFormat`]
//! interface, loading into and saving from bottom-up [`Bitmap`]s.
#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(
    clippy::inline_always,
    clippy::similar_names,
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::cargo_common_metadata,
    clippy::cast_possible_truncation
)]

mod bitmap;
mod cache;
mod decode;
mod encode;
mod error;
mod header;
mod log;
mod pixel;
mod stream;
mod types;
mod utils;

#[doc(hidden)]
pub mod consts;
pub mod plugin;

pub use crate::bitmap::{Bitmap, Metadata};
pub use crate::cache::ColorCache;
pub use crate::decode::{decode_header, decode_to_buf, decode_to_vec, Decoder};
pub use crate::encode::{encode_max_len, encode_to_buf, encode_to_vec, Encoder};
pub use crate::error::{Error, ErrorKind, Result};
pub use crate::header::{validate_dimensions, Header};
pub use crate::pixel::Pixel;
pub use crate::plugin::{ImageFormat, LoadFlags, QoiFormat};
pub use crate::types::{Channels, ColorSpace};
