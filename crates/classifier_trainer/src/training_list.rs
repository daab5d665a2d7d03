//! Training list files: one session label-file path per line

use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::TrainerError;

/// Read a training list, skipping blank lines
pub fn read_training_list<P: AsRef<Path>>(path: P) -> Result<Vec<PathBuf>, TrainerError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| TrainerError::TrainingList {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(PathBuf::from)
        .collect())
}

/// Write a training list, replacing any existing file atomically
pub fn write_training_list<P: AsRef<Path>>(path: P, files: &[PathBuf]) -> Result<(), TrainerError> {
    let path = path.as_ref();
    let failure = |reason: String| TrainerError::TrainingList {
        path: path.to_path_buf(),
        reason,
    };

    let mut body = String::new();
    for file in files {
        body.push_str(&file.to_string_lossy());
        body.push('\n');
    }

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(&directory).map_err(|e| failure(e.to_string()))?;
    staged
        .write_all(body.as_bytes())
        .map_err(|e| failure(e.to_string()))?;
    staged.persist(path).map_err(|e| failure(e.error.to_string()))?;
    Ok(())
}
