//! # Common Foundation Crate
//!
//! Shared low-level pieces for the browser core: big-endian byte codec with
//! length-prefixed framing, base64, percent/form escaping, and the RGBA
//! `Color` type used from the CSS value layer down to paint.

#![forbid(unsafe_code)]

pub mod base64;
pub mod bytes;
pub mod color;
pub mod escape;

pub use base64::{b64_decode, b64_encode};
pub use bytes::{ByteReader, ByteWriter, CodecError};
pub use color::Color;
pub use escape::{form_urlencode, percent_decode, percent_encode_component};
