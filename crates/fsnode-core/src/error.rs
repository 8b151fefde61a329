//! Error types for `fsnode-core`.
//!
//! Fallible operations return [`CoreResult<T>`], an alias for
//! `Result<T, CoreError>`. The handle types in [`crate::fs`] split errors into
//! two tiers: precondition failures are always returned to the caller, while
//! runtime failures are logged and collapsed into `false`/`None` by the
//! convenience methods (their `try_*` twins keep the error).

use std::path::PathBuf;

/// Unified error type for all core operations.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The path the handle points at does not exist.
    #[error("path not found: {0}")]
    NotFound(PathBuf),

    /// A directory was expected but the path is something else.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The file exists but the process cannot read it.
    #[error("not readable: {0}")]
    NotReadable(PathBuf),

    /// The file exists but the process cannot write it.
    #[error("not writable: {0}")]
    NotWritable(PathBuf),

    /// The destination directory of a move or copy does not exist.
    #[error("directory not found: {0}")]
    TargetNotFound(PathBuf),

    /// The destination directory of a move or copy is not writable.
    #[error("directory not writable: {0}")]
    TargetNotWritable(PathBuf),

    /// A rename would overwrite an existing entry.
    #[error("already exists: {0}")]
    AlreadyExists(PathBuf),

    /// A file or directory name is invalid (empty, contains separators, etc.).
    #[error("invalid name: {0}")]
    InvalidName(String),

    /// A tree copy destination lies inside the source tree.
    #[error("cannot copy {src} into itself at {dest}")]
    NestedTarget { src: PathBuf, dest: PathBuf },

    /// No user or group with the given name exists.
    #[error("unknown {kind}: {name}")]
    UnknownPrincipal { kind: &'static str, name: String },

    /// The operation has no meaning on this platform.
    #[error("unsupported on this platform: {0}")]
    Unsupported(&'static str),

    /// Failed to parse a TOML configuration file.
    #[error("config parse error: {0}")]
    ConfigParse(String),

    /// An I/O error that doesn't fit a more specific variant.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Returns `true` for caller mistakes that must never be swallowed.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            CoreError::NotADirectory(_)
                | CoreError::NotReadable(_)
                | CoreError::NotWritable(_)
                | CoreError::TargetNotFound(_)
                | CoreError::TargetNotWritable(_)
        )
    }
}

/// Convenience alias used throughout `fsnode-core`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Collapses a runtime failure into `false`, logging it.
pub(crate) fn settle(op: &str, path: &std::path::Path, result: CoreResult<()>) -> bool {
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("{op} failed for {}: {e}", path.display());
            false
        }
    }
}

/// Like [`settle`] but lets precondition errors through.
pub(crate) fn settle_checked(
    op: &str,
    path: &std::path::Path,
    result: CoreResult<()>,
) -> CoreResult<bool> {
    match result {
        Err(e) if e.is_precondition() => Err(e),
        other => Ok(settle(op, path, other)),
    }
}
