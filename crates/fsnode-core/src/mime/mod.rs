//! MIME type lookup by file extension.
//!
//! [`MimeRegistry`] holds the table; [`defaults`] carries the built-in seed.

mod defaults;
pub mod registry;

pub use registry::MimeRegistry;
