// src/watch/mtime.rs

//! Recursive modification-time scan.

use std::io::{self, ErrorKind};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::trace;

use crate::fs::FileSystem;

/// Seconds since the Unix epoch as a float (negative before the epoch).
pub fn to_timestamp(time: SystemTime) -> f64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Compute the latest modification time across `root` and every entry
/// beneath it.
///
/// - If `root` is a plain file, only that file is considered.
/// - A missing `root` is an error (`NotFound`), never "no change".
/// - Entries that disappear between the directory listing and the stat are
///   skipped; the parent directory's own mtime already reflects the removal.
/// - `root` is followed when it is a symlink to a directory; symlinked
///   directories *beneath* it are stat'ed but not descended into.
pub fn latest_mtime(fs: &dyn FileSystem, root: &Path) -> io::Result<f64> {
    let mut latest = to_timestamp(fs.modified(root)?);
    if !fs.is_dir(root) {
        return Ok(latest);
    }

    let mut pending = fs.read_dir(root)?;
    while let Some(path) = pending.pop() {
        match fs.modified(&path) {
            Ok(time) => latest = latest.max(to_timestamp(time)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                trace!(?path, "entry vanished during scan; skipping");
                continue;
            }
            Err(e) => return Err(e),
        }

        if fs.is_dir(&path) && !fs.is_symlink(&path) {
            match fs.read_dir(&path) {
                Ok(children) => pending.extend(children),
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => return Err(e),
            }
        }
    }

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use crate::fs::RealFileSystem;
    use std::fs::File;
    use std::time::Duration;

    #[test]
    fn plain_file_uses_its_own_mtime() {
        let fs = MockFileSystem::new();
        fs.add_file("./notes.txt", 42.0);

        let ts = latest_mtime(&fs, Path::new("./notes.txt")).unwrap();
        assert_eq!(ts, 42.0);
    }

    #[test]
    fn directory_takes_max_over_nested_entries() {
        let fs = MockFileSystem::new();
        fs.add_dir("./src", 10.0);
        fs.add_file("./src/main.go", 20.0);
        fs.add_dir("./src/pkg", 15.0);
        fs.add_file("./src/pkg/deep/util.go", 99.5);

        let ts = latest_mtime(&fs, Path::new("./src")).unwrap();
        assert_eq!(ts, 99.5);
    }

    #[test]
    fn symlinked_root_is_followed_but_nested_links_are_not() {
        let fs = MockFileSystem::new();
        fs.add_dir("./src", 10.0);
        fs.mark_symlink("./src");
        fs.add_file("./src/main.go", 20.0);
        fs.add_dir("./src/vendor", 12.0);
        fs.mark_symlink("./src/vendor");
        fs.add_file("./src/vendor/huge.go", 500.0);

        let ts = latest_mtime(&fs, Path::new("./src")).unwrap();
        assert_eq!(ts, 20.0);
    }

    #[test]
    fn missing_root_is_not_found() {
        let fs = MockFileSystem::new();
        let err = latest_mtime(&fs, Path::new("./gone")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn real_directory_scan_sees_later_touch() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b");
        std::fs::create_dir_all(&nested).unwrap();
        let file = nested.join("c.txt");
        std::fs::write(&file, b"x").unwrap();

        let fs = RealFileSystem;
        let before = latest_mtime(&fs, dir.path()).unwrap();
        assert_eq!(latest_mtime(&fs, dir.path()).unwrap(), before);

        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .append(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let after = latest_mtime(&fs, dir.path()).unwrap();
        assert!(after > before, "expected {after} > {before}");
    }

    #[cfg(unix)]
    #[test]
    fn edit_under_symlinked_target_is_seen() {
        let dir = tempfile::tempdir().unwrap();
        let real = dir.path().join("real_src");
        std::fs::create_dir(&real).unwrap();
        let file = real.join("main.go");
        std::fs::write(&file, b"package main\n").unwrap();
        let link = dir.path().join("src");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let fs = RealFileSystem;
        let before = latest_mtime(&fs, &link).unwrap();

        let later = SystemTime::now() + Duration::from_secs(60);
        File::options()
            .append(true)
            .open(&file)
            .unwrap()
            .set_modified(later)
            .unwrap();

        let after = latest_mtime(&fs, &link).unwrap();
        assert!(after > before, "expected {after} > {before}");
    }
}
