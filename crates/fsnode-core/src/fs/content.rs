//! File content operations: append, prepend, truncate and read.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{CoreError, CoreResult};
use crate::fs::meta;

/// Appends `data` to the end of the file at `path`.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if the file does not exist.
/// - [`CoreError::NotWritable`] if the process cannot write it.
pub fn append(path: &Path, data: &[u8]) -> CoreResult<()> {
    ensure_writable_file(path)?;
    let mut file = OpenOptions::new().append(true).open(path)?;
    file.write_all(data)?;
    Ok(())
}

/// Inserts `data` at the start of the file at `path`.
///
/// The existing content is shifted forward one window at a time, the window
/// being as long as `data`: read the next window, write the pending bytes in
/// its place, carry what was read to the following window. Peak memory stays
/// at two windows regardless of the file size.
///
/// # Errors
///
/// Same as [`append`].
pub fn prepend(path: &Path, data: &[u8]) -> CoreResult<()> {
    ensure_writable_file(path)?;
    if data.is_empty() {
        return Ok(());
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    let mut carry = data.to_vec();
    let mut window = vec![0u8; data.len()];
    let mut pos: u64 = 0;

    while !carry.is_empty() {
        file.seek(SeekFrom::Start(pos))?;
        let read = read_window(&mut file, &mut window)?;
        file.seek(SeekFrom::Start(pos))?;
        file.write_all(&carry)?;
        pos += carry.len() as u64;
        carry.clear();
        carry.extend_from_slice(&window[..read]);
    }

    file.flush()?;
    Ok(())
}

/// Truncates the file at `path` to zero length while holding an exclusive
/// advisory lock on it.
///
/// # Errors
///
/// Same as [`append`].
pub fn truncate(path: &Path) -> CoreResult<()> {
    ensure_writable_file(path)?;
    let file = OpenOptions::new().write(true).open(path)?;
    let _lock = ExclusiveLock::acquire(&file)?;
    file.set_len(0)?;
    Ok(())
}

/// Reads the whole file at `path`.
///
/// # Errors
///
/// - [`CoreError::NotFound`] if the file does not exist.
/// - [`CoreError::NotReadable`] if the process cannot read it.
pub fn read(path: &Path) -> CoreResult<Vec<u8>> {
    if !path.is_file() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if !meta::is_readable(path) {
        return Err(CoreError::NotReadable(path.to_path_buf()));
    }
    fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => CoreError::NotReadable(path.to_path_buf()),
        _ => CoreError::Io(e),
    })
}

fn ensure_writable_file(path: &Path) -> CoreResult<()> {
    if !path.is_file() {
        return Err(CoreError::NotFound(path.to_path_buf()));
    }
    if !meta::is_writable(path) {
        return Err(CoreError::NotWritable(path.to_path_buf()));
    }
    Ok(())
}

/// Fills `buf` as far as the file allows, returning the byte count.
fn read_window(file: &mut File, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match file.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// `flock(LOCK_EX)` held until drop.
struct ExclusiveLock<'a> {
    #[cfg_attr(not(unix), allow(dead_code))]
    file: &'a File,
}

impl<'a> ExclusiveLock<'a> {
    fn acquire(file: &'a File) -> CoreResult<Self> {
        #[cfg(unix)]
        {
            use nix::fcntl::{flock, FlockArg};
            use std::os::unix::io::AsRawFd;
            flock(file.as_raw_fd(), FlockArg::LockExclusive).map_err(std::io::Error::from)?;
        }
        Ok(Self { file })
    }
}

impl Drop for ExclusiveLock<'_> {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use nix::fcntl::{flock, FlockArg};
            use std::os::unix::io::AsRawFd;
            if let Err(e) = flock(self.file.as_raw_fd(), FlockArg::Unlock) {
                tracing::warn!("failed to release file lock: {e}");
            }
        }
    }
}
