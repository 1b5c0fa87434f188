//! Output artifact discovery.
//!
//! Each job writes timestamped artifacts into its own output directory;
//! "latest" means most recent modification time. An empty or absent
//! directory is not an error, callers render an explicit "no output yet"
//! message.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Return the newest regular file in `dir` by modification time.
///
/// Returns `None` if the directory is absent, empty, or contains no
/// regular files. Entries whose metadata cannot be read are skipped.
pub fn latest_artifact(dir: &Path) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;

    let mut newest: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let Ok(meta) = entry.metadata() else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        let Ok(modified) = meta.modified() else {
            continue;
        };
        let replace = match &newest {
            Some((best, _)) => modified > *best,
            None => true,
        };
        if replace {
            newest = Some((modified, entry.path()));
        }
    }
    newest.map(|(_, path)| path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::time::Duration;

    fn create_with_mtime(dir: &Path, name: &str, age: Duration) -> PathBuf {
        let path = dir.join(name);
        let file = File::create(&path).unwrap();
        file.set_modified(SystemTime::now() - age).unwrap();
        path
    }

    #[test]
    fn absent_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_artifact(&dir.path().join("missing")), None);
    }

    #[test]
    fn empty_directory_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_artifact(dir.path()), None);
    }

    #[test]
    fn newest_by_mtime_wins() {
        let dir = tempfile::tempdir().unwrap();
        create_with_mtime(dir.path(), "brief-t1.json", Duration::from_secs(300));
        let t3 = create_with_mtime(dir.path(), "brief-t3.json", Duration::from_secs(0));
        create_with_mtime(dir.path(), "brief-t2.json", Duration::from_secs(60));
        assert_eq!(latest_artifact(dir.path()), Some(t3));
    }

    #[test]
    fn subdirectories_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("archive")).unwrap();
        let only = create_with_mtime(dir.path(), "brief.json", Duration::from_secs(10));
        assert_eq!(latest_artifact(dir.path()), Some(only));
    }
}
