//! Temporary-file durability protocol for map writes.
//!
//! Saves with verification enabled write to `<name>.saving`, re-read the
//! temporary to prove it is loadable, then rename it over the target. An
//! interrupted save therefore leaves either a valid target, or a temporary
//! that load-time recovery can finish or discard.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::constants::{MAP_EXTENSION, SAVING_EXTENSION};

/// Path of the temporary file paired with a map path.
pub fn saving_path(path: &Path) -> PathBuf {
    let mut os: OsString = path.as_os_str().to_os_string();
    os.push(".");
    os.push(SAVING_EXTENSION);
    PathBuf::from(os)
}

/// Appends the map extension when the path does not already carry it.
pub fn ensure_map_extension(path: PathBuf) -> PathBuf {
    if path
        .extension()
        .map(|ext| ext == MAP_EXTENSION)
        .unwrap_or(false)
    {
        return path;
    }
    let mut os = path.into_os_string();
    os.push(".");
    os.push(MAP_EXTENSION);
    PathBuf::from(os)
}

/// Recovers from a save interrupted by a crash. Runs synchronously before a
/// load touches the target file.
///
/// - temp present, target absent: the rename never happened; finish it.
/// - both present: the target is assumed valid and newer; discard the temp.
pub fn recover_interrupted_save(path: &Path) -> std::io::Result<()> {
    let temp = saving_path(path);
    if !temp.exists() {
        return Ok(());
    }

    if path.exists() {
        info!("Discarding stale temporary save {:?}", temp);
        std::fs::remove_file(&temp)
    } else {
        info!("Recovering interrupted save {:?} -> {:?}", temp, path);
        std::fs::rename(&temp, path)
    }
}

/// Commits a verified temporary file: removes any existing target, then
/// renames the temporary into place.
pub fn commit_saved_file(path: &Path) -> std::io::Result<()> {
    let temp = saving_path(path);
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    std::fs::rename(&temp, path)
}

/// Makes sure the destination directory of a write target exists.
pub fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_target(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "mapwright-atomic-{}-{}",
            std::process::id(),
            name
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("side.map")
    }

    #[test]
    fn test_saving_path_appends_suffix() {
        let path = PathBuf::from("/tmp/foo.map");
        assert_eq!(saving_path(&path), PathBuf::from("/tmp/foo.map.saving"));
    }

    #[test]
    fn test_ensure_map_extension_appends() {
        assert_eq!(
            ensure_map_extension(PathBuf::from("side_a")),
            PathBuf::from("side_a.map")
        );
        // Appends rather than replacing a foreign extension
        assert_eq!(
            ensure_map_extension(PathBuf::from("side_a.bak")),
            PathBuf::from("side_a.bak.map")
        );
    }

    #[test]
    fn test_ensure_map_extension_keeps_existing() {
        assert_eq!(
            ensure_map_extension(PathBuf::from("side_a.map")),
            PathBuf::from("side_a.map")
        );
    }

    #[test]
    fn test_recovery_finishes_interrupted_rename() {
        let target = temp_target("finish");
        let temp = saving_path(&target);
        std::fs::write(&temp, b"payload").unwrap();

        recover_interrupted_save(&target).unwrap();

        assert!(target.exists());
        assert!(!temp.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"payload");

        std::fs::remove_file(&target).unwrap();
    }

    #[test]
    fn test_recovery_discards_stale_temp() {
        let target = temp_target("discard");
        let temp = saving_path(&target);
        std::fs::write(&target, b"good").unwrap();
        std::fs::write(&temp, b"stale").unwrap();

        recover_interrupted_save(&target).unwrap();

        assert!(!temp.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"good");

        std::fs::remove_file(&target).unwrap();
    }

    #[test]
    fn test_recovery_without_temp_is_noop() {
        let target = temp_target("noop");
        recover_interrupted_save(&target).unwrap();
        assert!(!target.exists());
    }

    #[test]
    fn test_commit_replaces_existing_target() {
        let target = temp_target("commit");
        let temp = saving_path(&target);
        std::fs::write(&target, b"old").unwrap();
        std::fs::write(&temp, b"new").unwrap();

        commit_saved_file(&target).unwrap();

        assert!(!temp.exists());
        assert_eq!(std::fs::read(&target).unwrap(), b"new");

        std::fs::remove_file(&target).unwrap();
    }

    #[test]
    fn test_ensure_parent_dir_creates_missing() {
        let base = std::env::temp_dir().join(format!(
            "mapwright-atomic-{}-parent/deep/nested",
            std::process::id()
        ));
        let file = base.join("side.map");
        ensure_parent_dir(&file).unwrap();
        assert!(base.exists());
    }
}
