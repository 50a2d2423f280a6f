//! ZIP extraction: plain streaming extraction into a directory tree, and
//! the password variant used when staging an archive for rewrite.

use std::fs::{self, File};
use std::io::{self, BufReader, Read, Write};
use std::path::Path;

use log::{debug, info};
use zip::ZipArchive;
use zip::read::read_zipfile_from_stream;

use crate::error::ObbError;
use crate::{DEFAULT_BUFFER_SIZE, Progress, Result};

/// Extract a ZIP byte stream into `dest_dir`, recreating the entry tree.
///
/// Entries are processed strictly in stream order. `on_progress` receives
/// the running total of inflated bytes across all entries together with the
/// caller's `total_hint`, passed through unchanged. Pre-existing files at an
/// entry's destination are overwritten. Failure aborts the whole extraction;
/// partially written files are left behind (extraction is not transactional
/// at the directory level).
pub fn extract_stream<R: Read>(
    input: R,
    total_hint: Option<u64>,
    dest_dir: &Path,
    on_progress: impl Fn(Progress),
) -> Result<()> {
    let mut reader = BufReader::with_capacity(DEFAULT_BUFFER_SIZE, input);
    fs::create_dir_all(dest_dir)
        .map_err(|e| ObbError::Extract(format!("{}: {}", dest_dir.display(), e)))?;

    let mut inflated: u64 = 0;
    let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];

    while let Some(mut entry) = read_zipfile_from_stream(&mut reader)
        .map_err(|e| ObbError::Extract(format!("Malformed archive: {}", e)))?
    {
        let Some(rel) = entry.enclosed_name() else {
            return Err(ObbError::Extract(format!(
                "Entry escapes the destination root: {}",
                entry.name()
            )));
        };
        let out_path = dest_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| ObbError::Extract(format!("{}: {}", out_path.display(), e)))?;
            debug!("Created directory {}", out_path.display());
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ObbError::Extract(format!("{}: {}", parent.display(), e)))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| ObbError::Extract(format!("{}: {}", out_path.display(), e)))?;
        loop {
            let read = entry
                .read(&mut buf)
                .map_err(|e| ObbError::Extract(format!("{}: {}", entry.name(), e)))?;
            if read == 0 {
                break;
            }
            out.write_all(&buf[..read])
                .map_err(|e| ObbError::Extract(format!("{}: {}", out_path.display(), e)))?;
            inflated += read as u64;
            on_progress(Progress::new(inflated, total_hint));
        }
    }

    info!("Extracted {} bytes into {}", inflated, dest_dir.display());
    Ok(())
}

/// Extract a password-protected archive into `dest_dir` using its central
/// directory. Standard ZipCrypto and unencrypted entries are both accepted;
/// a wrong password or an undecodable entry aborts the whole extraction.
pub fn extract_encrypted(archive_path: &Path, password: &str, dest_dir: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(|e| ObbError::Extract(format!("{}: {}", archive_path.display(), e)))?;
    let mut archive = ZipArchive::new(BufReader::with_capacity(DEFAULT_BUFFER_SIZE, file))
        .map_err(|e| ObbError::Extract(format!("{}: {}", archive_path.display(), e)))?;

    fs::create_dir_all(dest_dir)
        .map_err(|e| ObbError::Extract(format!("{}: {}", dest_dir.display(), e)))?;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index_decrypt(index, password.as_bytes())
            .map_err(|e| ObbError::Extract(format!("Entry {}: {}", index, e)))?;
        let Some(rel) = entry.enclosed_name() else {
            return Err(ObbError::Extract(format!(
                "Entry escapes the destination root: {}",
                entry.name()
            )));
        };
        let out_path = dest_dir.join(rel);

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(|e| ObbError::Extract(format!("{}: {}", out_path.display(), e)))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ObbError::Extract(format!("{}: {}", parent.display(), e)))?;
        }
        let mut out = File::create(&out_path)
            .map_err(|e| ObbError::Extract(format!("{}: {}", out_path.display(), e)))?;
        io::copy(&mut entry, &mut out)
            .map_err(|e| ObbError::Extract(format!("{}: {}", entry.name(), e)))?;
    }

    info!(
        "Decoded {} into {}",
        archive_path.display(),
        dest_dir.display()
    );
    Ok(())
}
