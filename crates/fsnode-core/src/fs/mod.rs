//! Filesystem handles and the operations behind them.
//!
//! [`file::FileEntry`] and [`directory::DirectoryEntry`] are thin handles over
//! a path; the shared metadata surface lives in [`entry::PathEntry`]. The
//! free functions in [`ops`], [`content`], [`meta`] and [`imaging`] do the
//! actual work and return [`crate::CoreError`] on failure.

pub mod content;
pub mod directory;
pub mod entry;
pub mod file;
pub mod imaging;
pub mod meta;
pub mod ops;

pub use directory::{Child, ChildKind, DirectoryEntry, Listing, ListingKind};
pub use entry::PathEntry;
pub use file::FileEntry;
pub use imaging::{CameraInfo, ImageInfo};
