//! Access log field extraction and validation
//!
//! Turns one raw access log line into a [`ParsedRequest`] or a typed
//! [`Rejection`].
//!
//! # Architecture
//!
//! - `traits.rs`: `RequestParser` trait
//! - `grammar.rs`: normalization and precompiled field grammars
//! - `layout.rs`: token position table
//! - `access_log.rs`: the nginx access log parser
//! - `model.rs`: parsed request and rejection types
//!
//! Malformed input is never an error for the caller to handle: every
//! rejection is a value, and the line is simply not counted.

pub mod traits;
pub mod grammar;
pub mod layout;
pub mod access_log;
pub mod model;

// Re-export commonly used types
pub use traits::RequestParser;
pub use access_log::AccessLogParser;
pub use layout::{Field, FieldLayout};
pub use model::{Country, Method, ParsedRequest, Rejection, UNKNOWN_COUNTRY};
