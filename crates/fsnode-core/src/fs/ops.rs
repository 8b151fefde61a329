//! Path-level file operations.
//!
//! These are the fallible primitives behind [`crate::FileEntry`] and
//! [`crate::DirectoryEntry`]. Each returns a [`CoreResult`] carrying the
//! underlying cause; the handle types decide which errors surface and which
//! become `false`.

use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{CoreError, CoreResult};
use crate::fs::meta;

/// Renames `path` to `new_name` inside the same parent directory and returns
/// the new path.
///
/// Unlike a bare `rename(2)`, an existing entry at the destination is never
/// replaced.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `path` does not exist.
/// - [`CoreError::InvalidName`] if `new_name` is not a plain file name.
/// - [`CoreError::AlreadyExists`] if the destination is taken.
/// - [`CoreError::Io`] for any other failure.
pub fn rename_entry(path: &Path, new_name: &str) -> CoreResult<PathBuf> {
    if fs::symlink_metadata(path).is_err() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if !is_valid_filename(new_name) {
        return Err(CoreError::InvalidName(new_name.to_string()));
    }

    let new_path = match path.parent() {
        Some(parent) => parent.join(new_name),
        None => PathBuf::from(new_name),
    };
    if new_path == path {
        return Ok(new_path);
    }
    if fs::symlink_metadata(&new_path).is_ok() {
        return Err(CoreError::AlreadyExists(new_path));
    }

    fs::rename(path, &new_path)?;
    Ok(new_path)
}

/// Checks that `dir` is an existing, writable directory.
///
/// # Errors
///
/// - [`CoreError::TargetNotFound`] if `dir` is missing or not a directory.
/// - [`CoreError::TargetNotWritable`] if the process cannot write into it.
pub fn ensure_target_dir(dir: &Path) -> CoreResult<()> {
    if !dir.is_dir() {
        return Err(CoreError::TargetNotFound(dir.to_path_buf()));
    }
    if !meta::is_writable(dir) {
        return Err(CoreError::TargetNotWritable(dir.to_path_buf()));
    }
    Ok(())
}

/// Moves `src` into `dir`, keeping its file name, and returns the new path.
///
/// Attempts a fast `rename` first. Only when the destination is on another
/// device is the entry copied and the source removed; any other rename
/// failure is returned unchanged.
///
/// # Errors
///
/// - [`CoreError::TargetNotFound`] / [`CoreError::TargetNotWritable`] from
///   [`ensure_target_dir`].
/// - [`CoreError::NotFound`] if `src` does not exist.
/// - [`CoreError::Io`] for any I/O failure.
pub fn move_into(src: &Path, dir: &Path) -> CoreResult<PathBuf> {
    ensure_target_dir(dir)?;
    let meta = fs::symlink_metadata(src).map_err(|_| CoreError::NotFound(src.to_path_buf()))?;
    let name = src
        .file_name()
        .ok_or_else(|| CoreError::InvalidName(src.display().to_string()))?;
    let dest = dir.join(name);
    if dest == src {
        return Ok(dest);
    }

    match fs::rename(src, &dest) {
        Ok(()) => Ok(dest),
        Err(e) if !is_cross_device(&e) => Err(e.into()),
        Err(e) => {
            tracing::debug!(
                "rename {} -> {} failed ({e}), falling back to copy",
                src.display(),
                dest.display()
            );
            if meta.is_dir() {
                copy_tree(src, &dest)?;
                fs::remove_dir_all(src)?;
            } else {
                fs::copy(src, &dest)?;
                fs::remove_file(src)?;
            }
            Ok(dest)
        }
    }
}

/// Copies the file at `src` into `dir` as `new_name` (or its own name),
/// overwriting any existing file, and returns the destination path.
///
/// # Errors
///
/// - [`CoreError::TargetNotFound`] / [`CoreError::TargetNotWritable`] from
///   [`ensure_target_dir`].
/// - [`CoreError::NotFound`] if `src` is not a file.
/// - [`CoreError::InvalidName`] if `new_name` is not a plain file name.
pub fn copy_file_into(src: &Path, dir: &Path, new_name: Option<&str>) -> CoreResult<PathBuf> {
    ensure_target_dir(dir)?;
    if !src.is_file() {
        return Err(CoreError::NotFound(src.to_path_buf()));
    }
    let dest = match new_name {
        Some(name) if !is_valid_filename(name) => {
            return Err(CoreError::InvalidName(name.to_string()))
        }
        Some(name) => dir.join(name),
        None => dir.join(
            src.file_name()
                .ok_or_else(|| CoreError::InvalidName(src.display().to_string()))?,
        ),
    };
    fs::copy(src, &dest)?;
    Ok(dest)
}

/// Mirrors the contents of directory `src` into `dest`.
///
/// `dest` and any missing subdirectories are created. Regular files are
/// copied over existing ones; symlinks are recreated as symlinks rather than
/// followed, and a symlink already in `dest` is replaced, never written
/// through. The walk is iterative and never follows links, so link cycles
/// terminate.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if `src` is not a directory.
/// - [`CoreError::NestedTarget`] if `dest` lies inside `src`.
/// - [`CoreError::Io`] on the first failing step; earlier copies remain.
pub fn copy_tree(src: &Path, dest: &Path) -> CoreResult<()> {
    if !src.is_dir() {
        return Err(CoreError::NotFound(src.to_path_buf()));
    }
    if is_within(dest, src) {
        return Err(CoreError::NestedTarget {
            src: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }

    fs::create_dir_all(dest)?;

    for entry in WalkDir::new(src).min_depth(1).follow_links(false) {
        let entry = entry.map_err(walk_error)?;
        let rel = entry
            .path()
            .strip_prefix(src)
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))?;
        let target = dest.join(rel);
        let ft = entry.file_type();

        if ft.is_dir() {
            unlink_if_symlink(&target)?;
            fs::create_dir_all(&target)?;
        } else if ft.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else if ft.is_file() {
            unlink_if_symlink(&target)?;
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

/// Removes everything below `dir`, children before parents, leaving `dir`.
///
/// Individual failures are logged and skipped so that as much as possible is
/// removed; the first error is returned at the end.
///
/// # Errors
///
/// - [`CoreError::NotADirectory`] if `dir` is not a directory.
/// - The first failure met during the walk.
pub fn clear_tree(dir: &Path) -> CoreResult<()> {
    if !dir.is_dir() {
        return Err(CoreError::NotADirectory(dir.to_path_buf()));
    }

    let mut first_error: Option<CoreError> = None;
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .contents_first(true)
        .follow_links(false)
    {
        let result = match entry {
            Ok(entry) if entry.file_type().is_dir() => {
                fs::remove_dir(entry.path()).map_err(CoreError::from)
            }
            Ok(entry) => fs::remove_file(entry.path()).map_err(CoreError::from),
            Err(e) => Err(walk_error(e)),
        };
        if let Err(e) = result {
            tracing::warn!("failed to clear entry under {}: {e}", dir.display());
            first_error.get_or_insert(e);
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

/// Removes `dir` and everything below it.
pub fn remove_tree(dir: &Path) -> CoreResult<()> {
    clear_tree(dir)?;
    fs::remove_dir(dir)?;
    Ok(())
}

/// Sums the sizes of all regular files below `dir`. Symlinks are neither
/// followed nor counted; unreadable entries are skipped.
pub fn tree_size(dir: &Path) -> u64 {
    WalkDir::new(dir)
        .min_depth(1)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

/// Creates `path` and every missing ancestor, root first, applying `mode` to
/// each directory it creates. Existing segments are left untouched.
///
/// # Errors
///
/// - [`CoreError::NotADirectory`] if a segment exists but is not a directory.
/// - [`CoreError::Io`] at the first segment that cannot be created; segments
///   created before it are kept.
pub fn create_dir_path(path: &Path, mode: u32) -> CoreResult<()> {
    let mut missing: Vec<&Path> = Vec::new();
    for ancestor in path.ancestors() {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        match fs::metadata(ancestor) {
            Ok(m) if m.is_dir() => break,
            Ok(_) => return Err(CoreError::NotADirectory(ancestor.to_path_buf())),
            Err(_) => missing.push(ancestor),
        }
    }

    for segment in missing.into_iter().rev() {
        match fs::create_dir(segment) {
            Ok(()) => meta::set_permissions(segment, mode)?,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists && segment.is_dir() => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

/// Returns `true` when `path` is `root` or lies below it, comparing
/// canonical forms where they can be resolved.
fn is_within(path: &Path, root: &Path) -> bool {
    let root = fs::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
    // The destination may not exist yet; resolve its nearest existing ancestor.
    let mut probe = path.to_path_buf();
    let mut tail: Vec<std::ffi::OsString> = Vec::new();
    let resolved = loop {
        if let Ok(canon) = fs::canonicalize(&probe) {
            break tail.iter().rev().fold(canon, |acc, part| acc.join(part));
        }
        match (probe.file_name().map(|n| n.to_os_string()), probe.parent()) {
            (Some(name), Some(parent)) => {
                tail.push(name);
                probe = parent.to_path_buf();
            }
            _ => break path.to_path_buf(),
        }
    };
    resolved.starts_with(&root)
}

fn copy_symlink(link: &Path, target: &Path) -> CoreResult<()> {
    let link_target = fs::read_link(link)?;
    if fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(&link_target, target)?;
    #[cfg(not(unix))]
    {
        let _ = link_target;
        fs::copy(link, target)?;
    }
    Ok(())
}

fn is_cross_device(e: &std::io::Error) -> bool {
    #[cfg(unix)]
    {
        e.raw_os_error() == Some(nix::errno::Errno::EXDEV as i32)
    }
    #[cfg(windows)]
    {
        // ERROR_NOT_SAME_DEVICE
        e.raw_os_error() == Some(17)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = e;
        false
    }
}

/// Drops a symlink sitting where a copy is about to land, so the copy
/// replaces the link instead of writing through it.
fn unlink_if_symlink(target: &Path) -> CoreResult<()> {
    if fs::symlink_metadata(target).is_ok_and(|m| m.file_type().is_symlink()) {
        fs::remove_file(target)?;
    }
    Ok(())
}

fn walk_error(e: walkdir::Error) -> CoreError {
    match e.into_io_error() {
        Some(io) => CoreError::Io(io),
        None => CoreError::Io(std::io::Error::other("directory walk failed")),
    }
}

pub(crate) fn is_valid_filename(name: &str) -> bool {
    if name.is_empty() || name == "." || name == ".." {
        return false;
    }
    if name.contains('/') || name.contains('\0') {
        return false;
    }
    #[cfg(windows)]
    if name.contains('\\') || name.contains(':') {
        return false;
    }
    true
}
