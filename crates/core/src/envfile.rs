//! Durable `KEY=value` configuration file.
//!
//! The active backend mode and origin survive across orchestrator
//! invocations in a flat env-style text file. Rewrites touch only the
//! named keys: every other line (unrelated keys, comments, blanks) is
//! preserved byte-identically and in order. The rewrite is atomic, a
//! temporary file in the same directory is written first and renamed over
//! the original, so a crash mid-write never corrupts the file.

use std::fs;
use std::io::Write;
use std::path::Path;

/// Errors from reading or rewriting the durable config file.
///
/// All of these are fatal to a mode switch; on failure the original file
/// is left untouched.
#[derive(Debug, thiserror::Error)]
pub enum EnvFileError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Config file I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Read the file and return the value of `key`, if present.
///
/// The first matching `KEY=value` line wins. Whitespace around the key is
/// not tolerated; the format is machine-written.
pub fn read_key(path: &Path, key: &str) -> Result<Option<String>, EnvFileError> {
    let contents = read(path)?;
    Ok(lookup(&contents, key))
}

/// Rewrite the values of the given keys in place.
///
/// Keys already present keep their line position; keys not yet present are
/// appended at the end in the given order. Everything else survives
/// unchanged. The write is temp-file + rename atomic.
pub fn update_keys(path: &Path, updates: &[(&str, &str)]) -> Result<(), EnvFileError> {
    let contents = read(path)?;

    let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();
    let mut missing: Vec<(&str, &str)> = Vec::new();

    for (key, value) in updates {
        match lines.iter_mut().find(|l| is_assignment(l, key)) {
            Some(line) => *line = format!("{key}={value}"),
            None => missing.push((key, value)),
        }
    }
    for (key, value) in missing {
        lines.push(format!("{key}={value}"));
    }

    let mut rewritten = lines.join("\n");
    rewritten.push('\n');

    write_atomic(path, &rewritten)?;
    Ok(())
}

fn read(path: &Path) -> Result<String, EnvFileError> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(EnvFileError::NotFound(path.display().to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

fn lookup(contents: &str, key: &str) -> Option<String> {
    contents
        .lines()
        .find(|l| is_assignment(l, key))
        .and_then(|l| l.split_once('='))
        .map(|(_, v)| v.to_string())
}

fn is_assignment(line: &str, key: &str) -> bool {
    line.strip_prefix(key)
        .is_some_and(|rest| rest.starts_with('='))
}

/// Write `contents` to a sibling temp file, then rename over `path`.
///
/// The rename only happens after the write (including flush) succeeded, so
/// a failed write leaves the original file untouched.
fn write_atomic(path: &Path, contents: &str) -> Result<(), EnvFileError> {
    let tmp_path = path.with_extension("tmp");
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
