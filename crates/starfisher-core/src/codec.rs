//! Single-document read/write.
//!
//! Documents are YAML restricted to a primitive-safe shape: mappings,
//! sequences, strings, numbers, booleans, and null. Richer in-memory
//! records (enums, timestamps) reach that shape through their serde
//! implementations, never through ad-hoc conversion at call sites.
//!
//! Writes create parent directories as needed and go through a temp file
//! in the target directory followed by a rename, so no reader ever
//! observes a partially written document.

use std::fs;
use std::io::Write;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, WorkspaceError};

/// Reads a YAML document into a raw value.
///
/// Fails with [`WorkspaceError::NotFound`] when the path does not exist;
/// callers decide whether that is fatal.
pub fn read_yaml_value(path: &Path) -> Result<serde_yaml::Value> {
    let contents = read_text(path)?;
    serde_yaml::from_str(&contents).map_err(|err| WorkspaceError::malformed(path, err))
}

/// Reads and deserializes a YAML document into `T`.
pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = read_text(path)?;
    serde_yaml::from_str(&contents).map_err(|err| WorkspaceError::malformed(path, err))
}

/// Reads a plain text document.
pub fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(contents),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(WorkspaceError::NotFound {
            path: path.to_path_buf(),
        }),
        Err(err) => Err(WorkspaceError::io(path, err)),
    }
}

/// Serializes `value` as YAML and writes it atomically to `path`.
pub fn write_yaml<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let rendered = serde_yaml::to_string(value).map_err(|err| WorkspaceError::Serialize {
        path: path.to_path_buf(),
        source: err,
    })?;
    write_atomic(path, rendered.as_bytes())
}

/// Serializes `value` as pretty JSON and writes it atomically to `path`.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let rendered = serde_json::to_vec_pretty(value)
        .map_err(|err| WorkspaceError::malformed(path, err))?;
    write_atomic(path, &rendered)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => Path::new(".").to_path_buf(),
    };
    fs::create_dir_all(&parent).map_err(|err| WorkspaceError::io(&parent, err))?;

    let mut tmp = tempfile::NamedTempFile::new_in(&parent)
        .map_err(|err| WorkspaceError::io(&parent, err))?;
    tmp.write_all(bytes)
        .map_err(|err| WorkspaceError::io(path, err))?;
    tmp.persist(path)
        .map_err(|err| WorkspaceError::io(path, err.error))?;
    Ok(())
}
