//! Local archive verification
//!
//! Downloaded backup archives can be inspected without a round trip to the
//! target: the archive must contain exactly one top-level directory with a
//! SQL dump inside.

use crate::error::{DeployError, Result};
use flate2::read::GzDecoder;
use std::collections::BTreeSet;
use std::path::Path;
use tar::Archive;

/// Summary of a backup archive's contents.
#[derive(Debug, Clone)]
pub struct ArchiveSummary {
    /// The single top-level directory.
    pub root: String,
    pub entries: usize,
    pub sql_files: Vec<String>,
}

/// List the contents of a `.tar.gz` backup archive.
pub fn inspect_archive(path: &Path) -> Result<ArchiveSummary> {
    let file = std::fs::File::open(path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut roots = BTreeSet::new();
    let mut entries = 0;
    let mut sql_files = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let entry_path = entry.path()?;
        let Some(first) = entry_path.components().next() else {
            continue;
        };
        roots.insert(first.as_os_str().to_string_lossy().to_string());
        entries += 1;

        if entry_path.extension().and_then(|e| e.to_str()) == Some("sql") {
            sql_files.push(entry_path.to_string_lossy().to_string());
        }
    }

    if entries == 0 {
        return Err(DeployError::InvalidArchive("archive is empty".to_string()));
    }
    if roots.len() != 1 {
        return Err(DeployError::InvalidArchive(format!(
            "expected one top-level directory, found {}",
            roots.len()
        )));
    }

    Ok(ArchiveSummary {
        root: roots.into_iter().next().unwrap(),
        entries,
        sql_files,
    })
}

/// Check that the archive looks like a usable backup.
pub fn verify_archive(path: &Path) -> Result<ArchiveSummary> {
    let summary = inspect_archive(path)?;
    if summary.sql_files.is_empty() {
        return Err(DeployError::InvalidArchive(
            "archive contains no SQL dump".to_string(),
        ));
    }
    Ok(summary)
}
