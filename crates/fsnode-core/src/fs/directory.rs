//! Directory handle and listing shapes.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};

use serde::Serialize;

use crate::config::Config;
use crate::error::{settle, settle_checked, CoreError, CoreResult};
use crate::fs::entry::PathEntry;
use crate::fs::file::FileEntry;
use crate::fs::ops;

/// Whether a listed child is a file or a directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChildKind {
    File,
    Directory,
}

/// A live handle on one child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Child {
    File(FileEntry),
    Directory(DirectoryEntry),
}

impl Child {
    pub fn kind(&self) -> ChildKind {
        match self {
            Child::File(_) => ChildKind::File,
            Child::Directory(_) => ChildKind::Directory,
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Child::File(f) => f.path(),
            Child::Directory(d) => d.path(),
        }
    }

    pub fn name(&self) -> Option<String> {
        match self {
            Child::File(f) => f.name(),
            Child::Directory(d) => d.name(),
        }
    }
}

/// Output shape requested from [`DirectoryEntry::content`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListingKind {
    /// Plain name list.
    Names,
    /// JSON array of names.
    Json,
    /// Name → kind map.
    Record,
    /// Live [`Child`] handles.
    #[default]
    Entries,
}

/// A one-level directory listing in the requested shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Names(Vec<String>),
    Json(String),
    Record(BTreeMap<String, ChildKind>),
    Entries(Vec<Child>),
}

impl Listing {
    /// Number of children listed.
    pub fn len(&self) -> usize {
        match self {
            Listing::Names(v) => v.len(),
            Listing::Json(s) => serde_json::from_str::<Vec<String>>(s)
                .map(|v| v.len())
                .unwrap_or(0),
            Listing::Record(m) => m.len(),
            Listing::Entries(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A handle on a directory path.
///
/// Like [`FileEntry`] it caches nothing; listings are rebuilt on every call.
///
/// # Examples
///
/// ```no_run
/// use fsnode_core::{DirectoryEntry, PathEntry};
///
/// let cache = DirectoryEntry::new("/tmp/app/cache");
/// cache.create(0o755);
/// for name in cache.names().unwrap() {
///     println!("{name}");
/// }
/// cache.clear();
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    path: PathBuf,
}

impl DirectoryEntry {
    /// Creates a handle for `path` without touching the filesystem.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path rendered with exactly one trailing separator. An empty path
    /// renders as the current directory, `./`.
    pub fn path_string(&self) -> String {
        let raw = self.path.to_string_lossy();
        if raw.is_empty() {
            return format!(".{MAIN_SEPARATOR}");
        }
        let trimmed = raw.trim_end_matches(['/', MAIN_SEPARATOR]);
        format!("{trimmed}{MAIN_SEPARATOR}")
    }

    /// Total size in bytes of every regular file below the directory;
    /// `0` if it does not exist.
    pub fn size(&self) -> u64 {
        if !self.exists() {
            return 0;
        }
        ops::tree_size(&self.path)
    }

    // --- listings ---

    /// Lists immediate children in the requested shape, sorted by name.
    ///
    /// # Errors
    ///
    /// [`CoreError::NotADirectory`] if the path is not a directory.
    pub fn content(&self, kind: ListingKind) -> CoreResult<Listing> {
        Ok(match kind {
            ListingKind::Names => Listing::Names(self.names()?),
            ListingKind::Json => Listing::Json(self.names_json()?),
            ListingKind::Record => Listing::Record(self.record()?),
            ListingKind::Entries => Listing::Entries(self.children()?),
        })
    }

    /// Child names, sorted.
    pub fn names(&self) -> CoreResult<Vec<String>> {
        Ok(self
            .read_children()?
            .into_iter()
            .map(|(name, _, _)| name)
            .collect())
    }

    /// Child names as a JSON array.
    pub fn names_json(&self) -> CoreResult<String> {
        let names = self.names()?;
        serde_json::to_string(&names).map_err(|e| CoreError::Io(e.into()))
    }

    /// Child name → kind.
    pub fn record(&self) -> CoreResult<BTreeMap<String, ChildKind>> {
        Ok(self
            .read_children()?
            .into_iter()
            .map(|(name, _, kind)| (name, kind))
            .collect())
    }

    /// Live handles for every child.
    pub fn children(&self) -> CoreResult<Vec<Child>> {
        Ok(self
            .read_children()?
            .into_iter()
            .map(|(_, path, kind)| match kind {
                ChildKind::Directory => Child::Directory(DirectoryEntry::new(path)),
                ChildKind::File => Child::File(FileEntry::new(path)),
            })
            .collect())
    }

    /// One readdir pass. Symlinks are classified by their target; entries
    /// that vanish mid-listing are skipped.
    fn read_children(&self) -> CoreResult<Vec<(String, PathBuf, ChildKind)>> {
        if !self.path.is_dir() {
            return Err(CoreError::NotADirectory(self.path.clone()));
        }

        let mut children = Vec::new();
        for dir_entry in fs::read_dir(&self.path)? {
            let dir_entry = match dir_entry {
                Ok(e) => e,
                Err(_) => continue,
            };
            let path = dir_entry.path();
            let kind = if path.is_dir() {
                ChildKind::Directory
            } else {
                ChildKind::File
            };
            let name = dir_entry.file_name().to_string_lossy().into_owned();
            children.push((name, path, kind));
        }
        children.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(children)
    }

    // --- lifecycle ---

    /// Creates the directory and any missing ancestors with `mode`.
    pub fn try_create(&self, mode: u32) -> CoreResult<()> {
        ops::create_dir_path(&self.path, mode)
    }

    /// mkdir -p. Segments created before a failure are kept.
    pub fn create(&self, mode: u32) -> bool {
        settle("create", &self.path, self.try_create(mode))
    }

    /// [`DirectoryEntry::create`] with the configured directory mode.
    pub fn create_with(&self, config: &Config) -> bool {
        self.create(config.directory_mode())
    }

    pub fn try_clear(&self) -> CoreResult<()> {
        ops::clear_tree(&self.path)
    }

    /// Removes everything inside the directory, keeping the directory.
    pub fn clear(&self) -> bool {
        settle("clear", &self.path, self.try_clear())
    }

    pub fn try_delete(&self) -> CoreResult<()> {
        if !self.exists() {
            return Err(CoreError::NotFound(self.path.clone()));
        }
        ops::remove_tree(&self.path)
    }

    /// Removes the directory and its contents; `false` if it was missing.
    pub fn delete(&self) -> bool {
        settle("delete", &self.path, self.try_delete())
    }

    pub fn try_copy_to(&self, dest: impl AsRef<Path>) -> CoreResult<()> {
        ops::copy_tree(&self.path, dest.as_ref())
    }

    /// Mirrors the whole tree into `dest`, overwriting same-named files.
    pub fn copy_to(&self, dest: impl AsRef<Path>) -> bool {
        settle("copy", &self.path, self.try_copy_to(dest))
    }

    /// Moves the directory into `dir` and re-targets the handle.
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

    /// Moves the directory into `dir`.
    ///
    /// # Errors
    ///
    /// [`CoreError::TargetNotFound`] or [`CoreError::TargetNotWritable`] if
    /// `dir` is not an existing writable directory.
    pub fn move_to(&mut self, dir: impl AsRef<Path>) -> CoreResult<bool> {
        let result = self.try_move_to(dir);
        settle_checked("move", &self.path, result)
    }
}

impl PathEntry for DirectoryEntry {
    fn path(&self) -> &Path {
        &self.path
    }

    fn retarget(&mut self, path: PathBuf) {
        self.path = path;
    }

    fn exists(&self) -> bool {
        self.path.is_dir()
    }
}

impl From<PathBuf> for DirectoryEntry {
    fn from(path: PathBuf) -> Self {
        Self::new(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated(tmp: &TempDir) -> DirectoryEntry {
        let root = tmp.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.txt"), "bb").unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::write(root.join("sub/c.txt"), "ccc").unwrap();
        DirectoryEntry::new(root)
    }

    // --- size ---

    #[test]
    fn size_after_writing_four_bytes() {
        let tmp = TempDir::new().unwrap();
        let dir = DirectoryEntry::new(tmp.path());
        fs::write(tmp.path().join("four.bin"), "1234").unwrap();
        assert_eq!(dir.size(), 4);
    }

    #[test]
    fn size_is_recursive() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(populated(&tmp).size(), 6);
    }

    #[test]
    fn size_of_missing_is_zero() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(DirectoryEntry::new(tmp.path().join("ghost")).size(), 0);
    }

    // --- listings ---

    #[test]
    fn names_are_sorted_and_one_level() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);
        assert_eq!(dir.names().unwrap(), vec!["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn names_json_is_an_array() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);
        assert_eq!(dir.names_json().unwrap(), r#"["a.txt","b.txt","sub"]"#);
    }

    #[test]
    fn record_classifies_children() {
        let tmp = TempDir::new().unwrap();
        let record = populated(&tmp).record().unwrap();
        assert_eq!(record["a.txt"], ChildKind::File);
        assert_eq!(record["sub"], ChildKind::Directory);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"a.txt":"file","b.txt":"file","sub":"directory"}"#
        );
    }

    #[test]
    fn children_are_live_handles() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);

        let children = dir.children().unwrap();

        assert_eq!(children.len(), 3);
        match &children[2] {
            Child::Directory(sub) => assert_eq!(sub.names().unwrap(), vec!["c.txt"]),
            other => panic!("expected directory, got {other:?}"),
        }
        match &children[0] {
            Child::File(f) => assert_eq!(f.content().unwrap().as_deref(), Some("a")),
            other => panic!("expected file, got {other:?}"),
        }
    }

    #[test]
    fn content_dispatches_on_kind() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);

        assert!(matches!(dir.content(ListingKind::Names).unwrap(), Listing::Names(_)));
        assert!(matches!(dir.content(ListingKind::Json).unwrap(), Listing::Json(_)));
        assert!(matches!(dir.content(ListingKind::Record).unwrap(), Listing::Record(_)));
        let default = dir.content(ListingKind::default()).unwrap();
        assert!(matches!(default, Listing::Entries(_)));
        assert_eq!(default.len(), 3);
        assert_eq!(dir.content(ListingKind::Json).unwrap().len(), 3);
    }

    #[test]
    fn content_of_file_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f.txt");
        fs::write(&file, "").unwrap();

        let err = DirectoryEntry::new(file).content(ListingKind::Names).unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory(_)));
    }

    #[test]
    fn content_of_missing_is_not_a_directory() {
        let tmp = TempDir::new().unwrap();
        let err = DirectoryEntry::new(tmp.path().join("ghost")).children().unwrap_err();
        assert!(matches!(err, CoreError::NotADirectory(_)));
    }

    #[test]
    fn hidden_children_are_listed() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(".env"), "").unwrap();
        let names = DirectoryEntry::new(tmp.path()).names().unwrap();
        assert_eq!(names, vec![".env"]);
    }

    // --- clear / delete ---

    #[test]
    fn clear_keeps_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);

        assert!(dir.clear());

        assert!(dir.exists());
        assert!(dir.content(ListingKind::Names).unwrap().is_empty());
        assert_eq!(dir.size(), 0);
    }

    #[test]
    fn delete_removes_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);

        assert!(dir.delete());
        assert!(!dir.exists());
        assert!(!dir.delete());
    }

    // --- copy / move ---

    #[test]
    fn copy_reproduces_files() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);
        let dest = tmp.path().join("mirror");

        assert!(dir.copy_to(&dest));

        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dest.join("sub/c.txt")).unwrap(), "ccc");
        assert!(dir.exists());
    }

    #[test]
    fn copy_of_missing_source_is_false() {
        let tmp = TempDir::new().unwrap();
        let dir = DirectoryEntry::new(tmp.path().join("ghost"));
        assert!(!dir.copy_to(tmp.path().join("out")));
        assert!(!tmp.path().join("out").exists());
    }

    #[test]
    fn copy_into_own_subtree_is_false() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);
        let inner = dir.path().join("sub/copy");

        assert!(!dir.copy_to(&inner));
        assert!(matches!(
            dir.try_copy_to(&inner).unwrap_err(),
            CoreError::NestedTarget { .. }
        ));
        assert!(!inner.exists());
    }

    #[test]
    fn move_to_retargets() {
        let tmp = TempDir::new().unwrap();
        let mut dir = populated(&tmp);
        let target = tmp.path().join("archive");
        fs::create_dir(&target).unwrap();

        assert!(dir.move_to(&target).unwrap());

        assert_eq!(dir.path(), target.join("root"));
        assert_eq!(dir.size(), 6);
        assert!(!tmp.path().join("root").exists());
    }

    #[test]
    fn move_to_missing_target_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let mut dir = populated(&tmp);
        let err = dir.move_to(tmp.path().join("nowhere")).unwrap_err();
        assert!(matches!(err, CoreError::TargetNotFound(_)));
    }

    #[test]
    fn move_to_does_not_merge_with_same_named_directory() {
        let tmp = TempDir::new().unwrap();
        let mut dir = populated(&tmp);
        let target = tmp.path().join("archive");
        fs::create_dir_all(target.join("root")).unwrap();
        fs::write(target.join("root/other.txt"), "o").unwrap();

        assert!(!dir.move_to(&target).unwrap());

        assert_eq!(dir.path(), tmp.path().join("root"));
        assert_eq!(dir.names().unwrap(), vec!["a.txt", "b.txt", "sub"]);
        assert_eq!(
            DirectoryEntry::new(target.join("root")).names().unwrap(),
            vec!["other.txt"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn move_to_read_only_target_is_an_error() {
        if nix::unistd::geteuid().is_root() {
            return;
        }
        let tmp = TempDir::new().unwrap();
        let mut dir = populated(&tmp);
        let target = tmp.path().join("sealed");
        fs::create_dir(&target).unwrap();
        assert!(DirectoryEntry::new(&target).set_permissions(0o555));

        let err = dir.move_to(&target).unwrap_err();

        assert!(matches!(err, CoreError::TargetNotWritable(_)));
        assert_eq!(dir.path(), tmp.path().join("root"));
        assert!(dir.exists());
    }

    #[test]
    fn rename_directory() {
        let tmp = TempDir::new().unwrap();
        let mut dir = populated(&tmp);

        assert!(dir.rename("renamed"));

        assert_eq!(dir.name().as_deref(), Some("renamed"));
        assert!(dir.exists());
        assert_eq!(dir.names().unwrap().len(), 3);
    }

    // --- create ---

    #[test]
    fn create_makes_every_segment() {
        let tmp = TempDir::new().unwrap();
        let deep = tmp.path().join("x/y/z");

        assert!(DirectoryEntry::new(&deep).create(0o755));

        for level in ["x", "x/y", "x/y/z"] {
            assert!(DirectoryEntry::new(tmp.path().join(level)).exists(), "{level}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn create_with_config_mode() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.directory.mode = "700".to_string();
        let dir = DirectoryEntry::new(tmp.path().join("private"));

        assert!(dir.create_with(&config));
        assert_eq!(dir.permissions(), Some(0o700));
    }

    #[test]
    fn create_keeps_segments_made_before_a_failure() {
        let tmp = TempDir::new().unwrap();
        let too_long = "x".repeat(300);
        let dir = DirectoryEntry::new(tmp.path().join("a/b").join(&too_long).join("c"));

        assert!(!dir.create(0o755));

        assert!(DirectoryEntry::new(tmp.path().join("a")).exists());
        assert!(DirectoryEntry::new(tmp.path().join("a/b")).exists());
        assert!(!dir.exists());
    }

    #[test]
    fn create_below_a_file_fails() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, "").unwrap();
        assert!(!DirectoryEntry::new(file.join("sub")).create(0o755));
    }

    #[test]
    fn path_string_has_one_trailing_separator() {
        let sep = MAIN_SEPARATOR;
        assert_eq!(
            DirectoryEntry::new("data").path_string(),
            format!("data{sep}")
        );
        assert_eq!(
            DirectoryEntry::new(format!("data{sep}{sep}")).path_string(),
            format!("data{sep}")
        );
        assert_eq!(DirectoryEntry::new("").path_string(), format!(".{sep}"));
    }

    #[test]
    fn timestamps_on_directory() {
        let tmp = TempDir::new().unwrap();
        let dir = populated(&tmp);
        let when = std::time::SystemTime::UNIX_EPOCH + std::time::Duration::from_secs(86_400);

        assert!(dir.set_modification_time(when));
        assert_eq!(dir.modification_time(), Some(when));
    }
}
