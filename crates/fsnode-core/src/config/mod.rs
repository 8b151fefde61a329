//! Configuration management for fsnode.
//!
//! Settings ([`settings::Config`]) are stored as TOML and cover the default
//! directory creation mode and how the MIME registry is seeded.

pub mod settings;

pub use settings::{Config, DirectoryConfig, MimeConfig};
