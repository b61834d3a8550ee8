//! Wire formats for Courier.
//!
//! A [`FormatRegistry`] holds one [`Codec`] per format name and serves as
//! the dispatcher's serializer and MIME resolver:
//!
//! - `json` - `application/json`
//! - `hal_json` - `application/hal+json`
//! - `form` - `application/x-www-form-urlencoded`
//!
//! Parse failures surface as a [`FormatError`] for which
//! [`FormatError::is_parse`] holds, distinct from an empty body which
//! deserializes to `None`.

#![doc(html_root_url = "https://docs.rs/courier-format/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod codec;
mod error;
mod registry;

pub use codec::{Codec, FormCodec, JsonCodec};
pub use error::FormatError;
pub use registry::FormatRegistry;

/// Format used for responses when a route does not fix one.
pub const DEFAULT_FORMAT: &str = "hal_json";

/// Format used for error payloads when the response format has no codec.
pub const FALLBACK_FORMAT: &str = "json";
