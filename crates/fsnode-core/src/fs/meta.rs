//! Metadata primitives: access probes, timestamps, permission bits and
//! ownership.
//!
//! Ownership and access(2) probes go through `nix` on Unix. Elsewhere the
//! ownership helpers report [`CoreError::Unsupported`] and the probes fall
//! back to what `std::fs::Metadata` can tell.

use std::fs;
use std::path::Path;
use std::time::SystemTime;

use filetime::{set_file_times, FileTime};

use crate::error::{CoreError, CoreResult};

/// Returns `true` if the current process may read `path`.
pub fn is_readable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        access(path, AccessFlags::R_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path).is_ok()
    }
}

/// Returns `true` if the current process may write `path`.
pub fn is_writable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use nix::unistd::{access, AccessFlags};
        access(path, AccessFlags::W_OK).is_ok()
    }
    #[cfg(not(unix))]
    {
        fs::metadata(path)
            .map(|m| !m.permissions().readonly())
            .unwrap_or(false)
    }
}

/// Last modification time, following symlinks.
pub fn modification_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified()).ok()
}

/// Last access time, following symlinks.
pub fn access_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|m| m.accessed()).ok()
}

/// Set the modification time, keeping the current access time.
pub fn set_modification_time(path: &Path, time: SystemTime) -> CoreResult<()> {
    let meta = existing_metadata(path)?;
    let atime = FileTime::from_last_access_time(&meta);
    set_file_times(path, atime, FileTime::from_system_time(time))?;
    Ok(())
}

/// Set the access time, keeping the current modification time.
pub fn set_access_time(path: &Path, time: SystemTime) -> CoreResult<()> {
    let meta = existing_metadata(path)?;
    let mtime = FileTime::from_last_modification_time(&meta);
    set_file_times(path, FileTime::from_system_time(time), mtime)?;
    Ok(())
}

/// Permission bits (`st_mode & 0o7777`) on Unix; `0o444`/`0o644` elsewhere.
pub fn permissions(path: &Path) -> Option<u32> {
    let meta = fs::metadata(path).ok()?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        Some(meta.permissions().mode() & 0o7777)
    }
    #[cfg(not(unix))]
    {
        Some(if meta.permissions().readonly() { 0o444 } else { 0o644 })
    }
}

/// chmod(2). Off Unix only the owner-write bit is honoured.
pub fn set_permissions(path: &Path, mode: u32) -> CoreResult<()> {
    let meta = existing_metadata(path)?;
    let mut perms = meta.permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        perms.set_mode(mode);
    }
    #[cfg(not(unix))]
    {
        perms.set_readonly(mode & 0o200 == 0);
    }
    fs::set_permissions(path, perms)?;
    Ok(())
}

fn existing_metadata(path: &Path) -> CoreResult<fs::Metadata> {
    fs::metadata(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => CoreError::NotFound(path.to_path_buf()),
        _ => CoreError::Io(e),
    })
}

#[cfg(unix)]
mod owner {
    use super::*;
    use nix::unistd::{chown, Gid, Group, Uid, User};
    use std::os::unix::fs::MetadataExt;

    pub fn owner_id(path: &Path) -> Option<u32> {
        fs::metadata(path).ok().map(|m| m.uid())
    }

    pub fn group_id(path: &Path) -> Option<u32> {
        fs::metadata(path).ok().map(|m| m.gid())
    }

    pub fn user_name(uid: u32) -> Option<String> {
        User::from_uid(Uid::from_raw(uid)).ok().flatten().map(|u| u.name)
    }

    pub fn group_name(gid: u32) -> Option<String> {
        Group::from_gid(Gid::from_raw(gid)).ok().flatten().map(|g| g.name)
    }

    pub fn set_owner_id(path: &Path, uid: u32) -> CoreResult<()> {
        existing_metadata(path)?;
        chown(path, Some(Uid::from_raw(uid)), None).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn set_group_id(path: &Path, gid: u32) -> CoreResult<()> {
        existing_metadata(path)?;
        chown(path, None, Some(Gid::from_raw(gid))).map_err(std::io::Error::from)?;
        Ok(())
    }

    pub fn uid_for(name: &str) -> CoreResult<u32> {
        User::from_name(name)
            .map_err(std::io::Error::from)?
            .map(|u| u.uid.as_raw())
            .ok_or_else(|| CoreError::UnknownPrincipal {
                kind: "user",
                name: name.to_string(),
            })
    }

    pub fn gid_for(name: &str) -> CoreResult<u32> {
        Group::from_name(name)
            .map_err(std::io::Error::from)?
            .map(|g| g.gid.as_raw())
            .ok_or_else(|| CoreError::UnknownPrincipal {
                kind: "group",
                name: name.to_string(),
            })
    }
}

#[cfg(not(unix))]
mod owner {
    use super::*;

    pub fn owner_id(_path: &Path) -> Option<u32> {
        None
    }

    pub fn group_id(_path: &Path) -> Option<u32> {
        None
    }

    pub fn user_name(_uid: u32) -> Option<String> {
        None
    }

    pub fn group_name(_gid: u32) -> Option<String> {
        None
    }

    pub fn set_owner_id(_path: &Path, _uid: u32) -> CoreResult<()> {
        Err(CoreError::Unsupported("chown"))
    }

    pub fn set_group_id(_path: &Path, _gid: u32) -> CoreResult<()> {
        Err(CoreError::Unsupported("chgrp"))
    }

    pub fn uid_for(_name: &str) -> CoreResult<u32> {
        Err(CoreError::Unsupported("user database"))
    }

    pub fn gid_for(_name: &str) -> CoreResult<u32> {
        Err(CoreError::Unsupported("group database"))
    }
}

pub use owner::{group_id, group_name, owner_id, set_group_id, set_owner_id, user_name};

/// chown(2) by user name.
pub fn set_owner(path: &Path, user: &str) -> CoreResult<()> {
    let uid = owner::uid_for(user)?;
    owner::set_owner_id(path, uid)
}

/// chgrp by group name.
pub fn set_group(path: &Path, group: &str) -> CoreResult<()> {
    let gid = owner::gid_for(group)?;
    owner::set_group_id(path, gid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    fn past(secs: u64) -> SystemTime {
        SystemTime::now() - Duration::from_secs(secs)
    }

    fn secs(t: SystemTime) -> u64 {
        t.duration_since(SystemTime::UNIX_EPOCH).unwrap().as_secs()
    }

    #[test]
    fn probes_on_existing_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        assert!(is_readable(&file));
        assert!(is_writable(&file));
    }

    #[test]
    fn probes_on_missing_file() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("missing.txt");

        assert!(!is_readable(&file));
        assert!(!is_writable(&file));
        assert!(modification_time(&file).is_none());
        assert!(access_time(&file).is_none());
        assert!(permissions(&file).is_none());
    }

    #[test]
    fn set_modification_time_preserves_access_time() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let atime = past(7200);
        set_access_time(&file, atime).unwrap();
        let mtime = past(3600);
        set_modification_time(&file, mtime).unwrap();

        assert_eq!(secs(modification_time(&file).unwrap()), secs(mtime));
        assert_eq!(secs(access_time(&file).unwrap()), secs(atime));
    }

    #[test]
    fn set_access_time_preserves_modification_time() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let mtime = past(86_400);
        set_modification_time(&file, mtime).unwrap();
        set_access_time(&file, past(60)).unwrap();

        assert_eq!(secs(modification_time(&file).unwrap()), secs(mtime));
    }

    #[test]
    fn set_times_on_missing_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("missing.txt");
        let err = set_modification_time(&file, SystemTime::now()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn set_permissions_round_trip() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        set_permissions(&file, 0o640).unwrap();
        assert_eq!(permissions(&file), Some(0o640));
    }

    #[cfg(unix)]
    #[test]
    fn owner_ids_match_metadata() {
        use std::os::unix::fs::MetadataExt;
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let meta = fs::metadata(&file).unwrap();

        assert_eq!(owner_id(&file), Some(meta.uid()));
        assert_eq!(group_id(&file), Some(meta.gid()));
    }

    #[cfg(unix)]
    #[test]
    fn chown_to_self_succeeds() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();
        let uid = owner_id(&file).unwrap();
        let gid = group_id(&file).unwrap();

        set_owner_id(&file, uid).unwrap();
        set_group_id(&file, gid).unwrap();
        assert_eq!(owner_id(&file), Some(uid));
    }

    #[cfg(unix)]
    #[test]
    fn unknown_user_name_is_reported() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("a.txt");
        fs::write(&file, "x").unwrap();

        let err = set_owner(&file, "no-such-user-fsnode-test").unwrap_err();
        assert!(matches!(err, CoreError::UnknownPrincipal { kind: "user", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn root_uid_resolves_to_name() {
        assert_eq!(user_name(0).as_deref(), Some("root"));
    }
}
