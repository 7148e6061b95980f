//! Text representations of byte tokens.
//!
//! Tokens are raw bytes and need not be valid UTF-8. The byte-level mapping
//! gives every byte a printable character so tokens can be stored in text
//! formats such as JSON.

pub mod byte_level;

pub use byte_level::{bytes_to_display, display_to_bytes};
