//! File handle.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use crate::error::{settle, settle_checked, CoreError, CoreResult};
use crate::fs::entry::PathEntry;
use crate::fs::imaging::{self, CameraInfo, ImageInfo};
use crate::fs::{content, ops};
use crate::mime::MimeRegistry;

/// A handle on a single file path.
///
/// The file need not exist. The handle caches nothing; it only remembers
/// the path, which is replaced when a rename or move succeeds.
///
/// # Examples
///
/// ```no_run
/// use fsnode_core::{FileEntry, PathEntry};
///
/// let mut log = FileEntry::new("/tmp/app.log");
/// log.create();
/// log.append("started\n").unwrap();
/// log.set_extension("old");
/// assert_eq!(log.extension().as_deref(), Some("old"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
}

impl FileEntry {
    /// Creates a handle for `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File name without its extension.
    pub fn base_name(&self) -> Option<String> {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
    }

    /// Text after the last dot of the file name, if any.
    pub fn extension(&self) -> Option<String> {
        self.path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
    }

    /// Size in bytes: `Some(0)` if the file does not exist, `None` if it
    /// exists but cannot be stat'ed.
    pub fn size(&self) -> Option<u64> {
        match fs::metadata(&self.path) {
            Ok(m) => Some(m.len()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Some(0),
            Err(_) => None,
        }
    }

    /// MIME type looked up by extension in `registry`.
    pub fn mime_type(&self, registry: &MimeRegistry) -> Option<String> {
        registry.lookup_path(&self.path).map(str::to_owned)
    }

    // --- lifecycle ---

    /// Creates the file if it is missing. Existing content is left as is.
    pub fn try_create(&self) -> CoreResult<()> {
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        Ok(())
    }

    pub fn create(&self) -> bool {
        settle("create", &self.path, self.try_create())
    }

    pub fn try_delete(&self) -> CoreResult<()> {
        if !self.exists() {
            return Err(CoreError::NotFound(self.path.clone()));
        }
        fs::remove_file(&self.path)?;
        Ok(())
    }

    /// Removes the file; `false` if it was already gone.
    pub fn delete(&self) -> bool {
        settle("delete", &self.path, self.try_delete())
    }

    /// Renames to `name` (full file name including extension).
    pub fn try_set_name(&mut self, name: &str) -> CoreResult<()> {
        self.try_rename(name)
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        self.rename(name)
    }

    /// Renames to `base` while keeping the current extension.
    pub fn try_set_base_name(&mut self, base: &str) -> CoreResult<()> {
        let name = match self.extension() {
            Some(ext) => format!("{base}.{ext}"),
            None => base.to_string(),
        };
        self.try_rename(&name)
    }

    pub fn set_base_name(&mut self, base: &str) -> bool {
        let result = self.try_set_base_name(base);
        settle("set base name", &self.path, result)
    }

    /// Replaces the extension; `ext` may carry a leading dot. An empty
    /// extension strips it.
    pub fn try_set_extension(&mut self, ext: &str) -> CoreResult<()> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        let base = self
            .base_name()
            .ok_or_else(|| CoreError::InvalidName(self.path.display().to_string()))?;
        let name = if ext.is_empty() {
            base
        } else {
            format!("{base}.{ext}")
        };
        self.try_rename(&name)
    }

    pub fn set_extension(&mut self, ext: &str) -> bool {
        let result = self.try_set_extension(ext);
        settle("set extension", &self.path, result)
    }

    /// Moves the file into `dir`, keeping its name, and re-targets the handle.
    pub fn try_move_to(&mut self, dir: impl AsRef<Path>) -> CoreResult<()> {
        let dir = dir.as_ref();
        ops::ensure_target_dir(dir)?;
        if !self.exists() {
            return Err(CoreError::NotFound(self.path.clone()));
        }
        let dest = ops::move_into(&self.path, dir)?;
        self.path = dest;
        Ok(())
    }

    /// Moves the file into `dir`.
    ///
    /// # Errors
    ///
    /// [`CoreError::TargetNotFound`] or [`CoreError::TargetNotWritable`] if
    /// `dir` is not an existing writable directory. Other failures return
    /// `Ok(false)` and leave the handle where it was.
    pub fn move_to(&mut self, dir: impl AsRef<Path>) -> CoreResult<bool> {
        let result = self.try_move_to(dir);
        settle_checked("move", &self.path, result)
    }

    /// Copies the file into `dir`, as `new_name` if given, overwriting any
    /// existing file. The handle keeps pointing at the source. Returns the
    /// destination path.
    pub fn try_copy_to(&self, dir: impl AsRef<Path>, new_name: Option<&str>) -> CoreResult<PathBuf> {
        ops::copy_file_into(&self.path, dir.as_ref(), new_name)
    }

    /// Copies the file into `dir`.
    ///
    /// # Errors
    ///
    /// Same preconditions as [`FileEntry::move_to`].
    pub fn copy_to(&self, dir: impl AsRef<Path>, new_name: Option<&str>) -> CoreResult<bool> {
        let result = self.try_copy_to(dir, new_name).map(|_| ());
        settle_checked("copy", &self.path, result)
    }

    // --- content ---

    /// Reads the whole file as text (invalid UTF-8 is replaced).
    ///
    /// Returns `Ok(None)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotReadable`] if the file exists but cannot be read.
    pub fn content(&self) -> CoreResult<Option<String>> {
        Ok(self
            .bytes()?
            .map(|b| String::from_utf8_lossy(&b).into_owned()))
    }

    /// Reads the whole file as bytes. Same contract as [`FileEntry::content`].
    pub fn bytes(&self) -> CoreResult<Option<Vec<u8>>> {
        match content::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.is_precondition() => Err(e),
            Err(e) => {
                tracing::debug!("read failed for {}: {e}", self.path.display());
                Ok(None)
            }
        }
    }

    pub fn try_append(&self, data: impl AsRef<[u8]>) -> CoreResult<()> {
        content::append(&self.path, data.as_ref())
    }

    /// Appends `data`; `Ok(false)` if the file does not exist.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotWritable`] if the file is not writable.
    pub fn append(&self, data: impl AsRef<[u8]>) -> CoreResult<bool> {
        settle_checked("append", &self.path, self.try_append(data))
    }

    pub fn try_prepend(&self, data: impl AsRef<[u8]>) -> CoreResult<()> {
        content::prepend(&self.path, data.as_ref())
    }

    /// Inserts `data` before the current content; `Ok(false)` if the file
    /// does not exist.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotWritable`] if the file is not writable.
    pub fn prepend(&self, data: impl AsRef<[u8]>) -> CoreResult<bool> {
        settle_checked("prepend", &self.path, self.try_prepend(data))
    }

    pub fn try_flush(&self) -> CoreResult<()> {
        content::truncate(&self.path)
    }

    /// Truncates the file to empty under an exclusive lock; `Ok(false)` if
    /// the file does not exist.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotWritable`] if the file is not writable.
    pub fn flush(&self) -> CoreResult<bool> {
        settle_checked("flush", &self.path, self.try_flush())
    }

    // --- images ---

    /// Width in pixels, if the file is an image.
    pub fn width(&self) -> Option<u32> {
        self.image_info().map(|i| i.width)
    }

    /// Height in pixels, if the file is an image.
    pub fn height(&self) -> Option<u32> {
        self.image_info().map(|i| i.height)
    }

    pub fn image_info(&self) -> Option<ImageInfo> {
        imaging::read_image_info(&self.path)
    }

    /// EXIF camera record, if the file is an image.
    pub fn camera_info(&self) -> Option<CameraInfo> {
        imaging::read_camera_info(&self.path)
    }
}

impl PathEntry for FileEntry {
    fn path(&self) -> &Path {
        &self.path
    }

    fn retarget(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}

impl From<PathBuf> for FileEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}
