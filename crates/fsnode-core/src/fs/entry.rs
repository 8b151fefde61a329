//! Shared metadata façade for path handles.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::error::{settle, CoreError, CoreResult};
use crate::fs::{meta, ops};

/// Accessors common to [`crate::FileEntry`] and [`crate::DirectoryEntry`].
///
/// Nothing is cached: every call re-queries the filesystem through the
/// stored path. Mutators come in pairs, a `try_*` form returning the error
/// and a plain form that logs the error and returns `false`.
///
/// # Examples
///
/// ```no_run
/// use fsnode_core::{FileEntry, PathEntry};
///
/// let mut file = FileEntry::new("/tmp/report.txt");
/// if file.rename("summary.txt") {
///     assert_eq!(file.name().as_deref(), Some("summary.txt"));
/// }
/// ```
pub trait PathEntry {
    /// The path this handle currently represents.
    fn path(&self) -> &Path;

    /// Points the handle at a new path after a successful rename or move.
    #[doc(hidden)]
    fn retarget(&mut self, path: PathBuf);

    /// Returns `true` if the path exists as the kind of entry this handle models.
    fn exists(&self) -> bool;

    /// Returns `true` if the process may read the entry.
    fn is_readable(&self) -> bool {
        meta::is_readable(self.path())
    }

    /// Returns `true` if the process may write the entry.
    fn is_writable(&self) -> bool {
        meta::is_writable(self.path())
    }

    /// Returns `true` if the path itself is a symbolic link.
    fn is_symlink(&self) -> bool {
        self.path().is_symlink()
    }

    /// Returns `true` if the name starts with `.`.
    fn is_hidden(&self) -> bool {
        self.name().is_some_and(|n| n.starts_with('.'))
    }

    /// Last path component.
    fn name(&self) -> Option<String> {
        self.path()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
    }

    /// Containing directory, if the path has one.
    fn parent(&self) -> Option<&Path> {
        self.path().parent()
    }

    fn modification_time(&self) -> Option<SystemTime> {
        meta::modification_time(self.path())
    }

    fn access_time(&self) -> Option<SystemTime> {
        meta::access_time(self.path())
    }

    /// Sets the modification time, keeping the access time.
    fn try_set_modification_time(&self, time: SystemTime) -> CoreResult<()> {
        meta::set_modification_time(self.path(), time)
    }

    fn set_modification_time(&self, time: SystemTime) -> bool {
        settle("set mtime", self.path(), self.try_set_modification_time(time))
    }

    /// Sets the access time, keeping the modification time.
    fn try_set_access_time(&self, time: SystemTime) -> CoreResult<()> {
        meta::set_access_time(self.path(), time)
    }

    fn set_access_time(&self, time: SystemTime) -> bool {
        settle("set atime", self.path(), self.try_set_access_time(time))
    }

    /// Permission bits, e.g. `0o644`.
    fn permissions(&self) -> Option<u32> {
        meta::permissions(self.path())
    }

    fn try_set_permissions(&self, mode: u32) -> CoreResult<()> {
        meta::set_permissions(self.path(), mode)
    }

    /// chmod.
    fn set_permissions(&self, mode: u32) -> bool {
        settle("chmod", self.path(), self.try_set_permissions(mode))
    }

    fn owner_id(&self) -> Option<u32> {
        meta::owner_id(self.path())
    }

    /// Owner user name; `None` without a user database.
    fn owner(&self) -> Option<String> {
        self.owner_id().and_then(meta::user_name)
    }

    fn try_set_owner_id(&self, uid: u32) -> CoreResult<()> {
        meta::set_owner_id(self.path(), uid)
    }

    fn set_owner_id(&self, uid: u32) -> bool {
        settle("chown", self.path(), self.try_set_owner_id(uid))
    }

    fn try_set_owner(&self, user: &str) -> CoreResult<()> {
        meta::set_owner(self.path(), user)
    }

    fn set_owner(&self, user: &str) -> bool {
        settle("chown", self.path(), self.try_set_owner(user))
    }

    fn group_id(&self) -> Option<u32> {
        meta::group_id(self.path())
    }

    /// Group name; `None` without a group database.
    fn group(&self) -> Option<String> {
        self.group_id().and_then(meta::group_name)
    }

    fn try_set_group_id(&self, gid: u32) -> CoreResult<()> {
        meta::set_group_id(self.path(), gid)
    }

    fn set_group_id(&self, gid: u32) -> bool {
        settle("chgrp", self.path(), self.try_set_group_id(gid))
    }

    fn try_set_group(&self, group: &str) -> CoreResult<()> {
        meta::set_group(self.path(), group)
    }

    fn set_group(&self, group: &str) -> bool {
        settle("chgrp", self.path(), self.try_set_group(group))
    }

    /// Renames the entry within its directory and re-targets the handle.
    ///
    /// Fails if the path is not the kind of entry this handle models, the
    /// name is invalid, or another entry already has that name.
    fn try_rename(&mut self, new_name: &str) -> CoreResult<()> {
        if !self.exists() {
            return Err(CoreError::NotFound(self.path().to_path_buf()));
        }
        let new_path = ops::rename_entry(self.path(), new_name)?;
        self.retarget(new_path);
        Ok(())
    }

    fn rename(&mut self, new_name: &str) -> bool {
        let result = self.try_rename(new_name);
        settle("rename", self.path(), result)
    }
}
