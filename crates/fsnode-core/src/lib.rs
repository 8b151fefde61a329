//! fsnode core library: object handles over files and directories.
//!
//! `fsnode-core` wraps paths in small handles that re-query the filesystem on
//! every call. Mutations report success as a `bool` and log the cause at
//! debug level; every mutator also has a `try_*` form that returns the
//! [`CoreError`] instead.
//!
//! # Modules
//!
//! - [`fs`] — [`FileEntry`], [`DirectoryEntry`], the shared [`PathEntry`] accessors and the operations behind them.
//! - [`mime`] — Extension → MIME type table ([`MimeRegistry`]).
//! - [`config`] — TOML settings for directory modes and MIME seeding.
//! - [`error`] — Unified error type ([`CoreError`]) and result alias ([`CoreResult`]).

pub mod config;
pub mod error;
pub mod fs;
pub mod mime;

pub use config::settings::Config;
pub use error::{CoreError, CoreResult};
pub use fs::{
    CameraInfo, Child, ChildKind, DirectoryEntry, FileEntry, ImageInfo, Listing, ListingKind,
    PathEntry,
};
pub use mime::MimeRegistry;
