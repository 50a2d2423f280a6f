use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use log::info;
use zip::ZipArchive;

use crate::error::ObbError;
use crate::{DEFAULT_BUFFER_SIZE, Result};

/// One entry record read from an archive's central directory.
pub struct ListEntry {
    pub path: String,
    pub size: u64,
    pub is_dir: bool,
    pub encrypted: bool,
}

/// List every entry without extracting. No password is needed: the metadata
/// comes from the central directory alone.
pub fn list_entries(archive_path: &Path) -> Result<Vec<ListEntry>> {
    let file = File::open(archive_path)
        .map_err(|e| ObbError::IoContext(archive_path.display().to_string(), e))?;
    let mut archive = ZipArchive::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        .map_err(|e| ObbError::Extract(format!("{}: {}", archive_path.display(), e)))?;

    info!(
        "Archive {} holds {} entries",
        archive_path.display(),
        archive.len()
    );

    let mut entries = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| ObbError::Extract(format!("Entry {}: {}", index, e)))?;
        entries.push(ListEntry {
            path: entry.name().to_string(),
            size: entry.size(),
            is_dir: entry.is_dir(),
            encrypted: entry.encrypted(),
        });
    }
    Ok(entries)
}
