//! Recording session files
//!
//! A session is identified by its label file, a CSV of
//! `label,probability` rows (one per detected object). The descriptor
//! records live next to it in `stat.json`: a JSON array with one object
//! per detected object mapping descriptor names to numbers. Non-numeric
//! fields (pixel lists and the like) are ignored.

use anyhow::{Context, Result};
use roiclass_core::{DescriptorRecord, Prediction};
use serde_json::Value;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// File name of the descriptor records inside a session directory
pub const DESCRIPTOR_FILE: &str = "stat.json";

/// Label row of a session: boolean label plus the probability that
/// produced it
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabelRow {
    pub is_cell: bool,
    pub probability: f64,
}

/// Path of the descriptor-record file belonging to a label file
pub fn descriptor_path_for(label_path: &Path) -> PathBuf {
    label_path
        .parent()
        .map(|dir| dir.join(DESCRIPTOR_FILE))
        .unwrap_or_else(|| PathBuf::from(DESCRIPTOR_FILE))
}

fn parse_label(field: &str) -> Option<bool> {
    match field {
        "1" | "true" | "True" => Some(true),
        "0" | "false" | "False" => Some(false),
        other => other.parse::<f64>().ok().map(|v| v > 0.5),
    }
}

/// Load a two-column label file.
///
/// Expected format: `label,probability` per line; blank lines and lines
/// starting with `#` are skipped.
pub fn load_labels<P: AsRef<Path>>(path: P) -> Result<Vec<LabelRow>> {
    let content = std::fs::read_to_string(path.as_ref()).context("Failed to read label file")?;

    let mut rows = Vec::new();
    for (line_idx, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split(',').map(|s| s.trim()).collect();
        if parts.len() != 2 {
            anyhow::bail!("Line {}: expected 2 columns, got {}", line_idx + 1, parts.len());
        }

        let is_cell = parse_label(parts[0])
            .with_context(|| format!("Line {}: invalid label '{}'", line_idx + 1, parts[0]))?;
        let probability = parts[1]
            .parse::<f64>()
            .with_context(|| format!("Line {}: invalid probability", line_idx + 1))?;

        rows.push(LabelRow { is_cell, probability });
    }

    Ok(rows)
}

/// Load descriptor records from a JSON array of objects
pub fn load_descriptor_records<P: AsRef<Path>>(path: P) -> Result<Vec<DescriptorRecord>> {
    let content = std::fs::read_to_string(path.as_ref()).context("Failed to read descriptor file")?;
    let value: Value = serde_json::from_str(&content).context("Descriptor file is not valid JSON")?;

    let entries = value
        .as_array()
        .context("Descriptor file must contain a JSON array")?;

    entries
        .iter()
        .enumerate()
        .map(|(idx, entry)| {
            let object = entry
                .as_object()
                .with_context(|| format!("Record {}: expected a JSON object", idx))?;
            Ok(object
                .iter()
                .filter_map(|(name, v)| v.as_f64().map(|x| (name.clone(), x)))
                .collect())
        })
        .collect()
}

/// Write predictions as `label,probability` rows.
///
/// The file is staged next to `path` and renamed into place.
pub fn write_predictions<P: AsRef<Path>>(path: P, predictions: &[Prediction]) -> Result<()> {
    let path = path.as_ref();
    let mut body = String::with_capacity(predictions.len() * 24);
    for prediction in predictions {
        let [label, probability] = prediction.as_row();
        body.push_str(&format!("{},{}\n", label as u8, probability));
    }

    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let mut staged = NamedTempFile::new_in(&directory).context("Failed to create output file")?;
    staged.write_all(body.as_bytes()).context("Failed to write predictions")?;
    staged.as_file().sync_all().context("Failed to sync predictions")?;
    staged
        .persist(path)
        .map_err(|e| e.error)
        .context("Failed to move predictions into place")?;
    Ok(())
}
