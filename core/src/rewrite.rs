//! In-place rewrite of one entry inside a password-protected archive.
//!
//! The archive is decoded into an exclusively-owned scratch directory, the
//! target entry is overwritten (or created at the scratch root when absent),
//! every regular file is re-added to a fresh archive encrypted with the same
//! password, and the new archive replaces the original. The scratch tree is
//! removed on every exit path.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use log::{info, warn};
use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::unstable::write::FileOptionsExt;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::Result;
use crate::error::ObbError;
use crate::extract::extract_encrypted;

/// One secure-rewrite invocation.
///
/// The job owns `scratch_dir` exclusively for its duration; concurrent jobs
/// against the same archive path must be serialized by the caller.
pub struct RewriteJob {
    pub archive_path: PathBuf,
    pub password: String,
    pub scratch_dir: PathBuf,
    pub entry_name: String,
    pub entry_content: Vec<u8>,
}

/// Removes the scratch tree when dropped, no matter how the job exits.
struct ScratchGuard {
    path: PathBuf,
}

impl ScratchGuard {
    fn acquire(path: &Path) -> Result<Self> {
        if path.exists() {
            // A leftover tree from an aborted run is stale; start clean.
            fs::remove_dir_all(path)
                .map_err(|e| ObbError::IoContext(path.display().to_string(), e))?;
        }
        fs::create_dir_all(path).map_err(|e| ObbError::IoContext(path.display().to_string(), e))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }
}

impl Drop for ScratchGuard {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_dir_all(&self.path) {
            warn!("Failed to clean scratch {}: {}", self.path.display(), e);
        }
    }
}

impl RewriteJob {
    /// Temporary output path beside the original, so the final swap is a
    /// same-filesystem rename wherever the platform allows one.
    fn temp_archive_path(&self) -> PathBuf {
        let mut name = self
            .archive_path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.archive_path.with_file_name(name)
    }

    /// Run the rewrite: validate, extract to scratch, patch, recompress,
    /// swap. Each failure is classified by the stage it occurred in and
    /// nothing is retried here.
    pub fn run(&self) -> Result<()> {
        if !self.archive_path.is_file() {
            return Err(ObbError::SourceNotFound(self.archive_path.clone()));
        }

        let _scratch = ScratchGuard::acquire(&self.scratch_dir)?;

        info!(
            "Extracting {} to scratch {}",
            self.archive_path.display(),
            self.scratch_dir.display()
        );
        extract_encrypted(&self.archive_path, &self.password, &self.scratch_dir)?;

        self.patch_entry()?;

        let tmp = self.temp_archive_path();
        self.recompress(&tmp)?;
        self.swap(&tmp)?;

        info!("Rewrote {}", self.archive_path.display());
        Ok(())
    }

    /// Overwrite the first file named `entry_name` anywhere under scratch
    /// (depth-first). A well-formed archive always carries the entry; when
    /// it is missing the entry is synthesized at the scratch root instead
    /// of failing the job.
    fn patch_entry(&self) -> Result<()> {
        let wanted = std::ffi::OsStr::new(self.entry_name.as_str());
        let target = WalkDir::new(&self.scratch_dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .find(|e| e.file_type().is_file() && e.file_name() == wanted)
            .map(|e| e.into_path())
            .unwrap_or_else(|| {
                warn!(
                    "Entry {} not present, creating it at the scratch root",
                    self.entry_name
                );
                self.scratch_dir.join(&self.entry_name)
            });

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ObbError::IoContext(parent.display().to_string(), e))?;
        }
        fs::write(&target, &self.entry_content)
            .map_err(|e| ObbError::IoContext(target.display().to_string(), e))?;
        info!("Patched {}", target.display());
        Ok(())
    }

    /// Build the replacement archive at `tmp`. A half-written archive is
    /// never left behind on failure.
    fn recompress(&self, tmp: &Path) -> Result<()> {
        if tmp.exists() {
            fs::remove_file(tmp).map_err(|e| ObbError::Recompress(e.to_string()))?;
        }

        let result = self.write_archive(tmp);
        if result.is_err() {
            let _ = fs::remove_file(tmp);
        }
        result
    }

    /// Re-add every regular file under scratch, Deflate-compressed and
    /// encrypted with the job password using the legacy ZipCrypto scheme the
    /// original container's reader understands.
    fn write_archive(&self, tmp: &Path) -> Result<()> {
        let out = File::create(tmp)
            .map_err(|e| ObbError::Recompress(format!("{}: {}", tmp.display(), e)))?;
        let mut writer = ZipWriter::new(out);
        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .with_deprecated_encryption(self.password.as_bytes());

        for entry in WalkDir::new(&self.scratch_dir) {
            let entry = entry.map_err(|e| ObbError::Recompress(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.scratch_dir)
                .map_err(|e| ObbError::Unexpected(e.to_string()))?;
            let name = rel
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");

            writer
                .start_file(name.as_str(), options.clone())
                .map_err(|e| ObbError::Recompress(format!("{}: {}", name, e)))?;
            let mut src = File::open(entry.path())
                .map_err(|e| ObbError::Recompress(format!("{}: {}", name, e)))?;
            io::copy(&mut src, &mut writer)
                .map_err(|e| ObbError::Recompress(format!("{}: {}", name, e)))?;
        }

        writer
            .finish()
            .map_err(|e| ObbError::Recompress(e.to_string()))?;
        Ok(())
    }

    /// Replace the original archive with `tmp`: delete the original, rename
    /// the replacement in, and fall back to a byte copy when the rename
    /// fails. A deletion failure downgrades to a best-effort overwrite
    /// rather than aborting.
    fn swap(&self, tmp: &Path) -> Result<()> {
        if self.archive_path.exists() {
            if let Err(e) = fs::remove_file(&self.archive_path) {
                warn!(
                    "Could not delete {} ({}), attempting overwrite",
                    self.archive_path.display(),
                    e
                );
            }
        }

        match fs::rename(tmp, &self.archive_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                // Rename can fail across filesystems; copy instead.
                match fs::copy(tmp, &self.archive_path) {
                    Ok(_) => {
                        let _ = fs::remove_file(tmp);
                        Ok(())
                    }
                    Err(copy_err) => {
                        let _ = fs::remove_file(tmp);
                        Err(ObbError::Swap(format!(
                            "{}: rename failed ({}), copy failed ({})",
                            self.archive_path.display(),
                            rename_err,
                            copy_err
                        )))
                    }
                }
            }
        }
    }
}
