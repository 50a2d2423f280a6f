//! Byte sources feeding the copy and extract pipelines.
//!
//! Two kinds exist: a plain local file, and a read-only resource bundled
//! with the application. Bundled resources may be stored gzip-compressed,
//! in which case only the stored size is knowable and the decoded length
//! is reported as unknown.

use std::fs::{self, File};
use std::io::Read;
use std::path::PathBuf;

use flate2::read::GzDecoder;

use crate::Result;
use crate::error::ObbError;

/// A readable stream that can be handed across threads.
pub trait ReadSend: Read + Send {}
impl<T: Read + Send> ReadSend for T {}

/// Closed capability set shared by every source: open a fresh stream,
/// report a best-effort length, describe yourself for diagnostics, and
/// delete yourself if the backing store allows it.
pub trait ByteSource: Send + Sync {
    /// Open a fresh readable stream over the source bytes.
    fn open(&self) -> Result<Box<dyn ReadSend>>;

    /// Best-effort decoded length. `None` means "unknown", not a failure.
    fn length(&self) -> Option<u64>;

    /// Human-readable identity for logs and status lines. Not a path guarantee.
    fn identity(&self) -> String;

    /// Attempt to remove the backing store. `true` only if removal succeeded.
    fn try_delete(&self) -> bool;
}

/// A source backed by an ordinary local file.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ByteSource for FileSource {
    fn open(&self) -> Result<Box<dyn ReadSend>> {
        let file = File::open(&self.path)
            .map_err(|e| ObbError::IoContext(self.path.display().to_string(), e))?;
        Ok(Box::new(file))
    }

    fn length(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|m| m.len())
    }

    fn identity(&self) -> String {
        self.path.display().to_string()
    }

    fn try_delete(&self) -> bool {
        fs::remove_file(&self.path).is_ok()
    }
}

/// A read-only resource shipped inside the application's asset bundle.
///
/// Assets whose stored name ends in `.gz` are decoded transparently on
/// open; their decoded length is unknown up front.
pub struct AssetSource {
    bundle_dir: PathBuf,
    name: String,
}

impl AssetSource {
    pub fn new(bundle_dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            bundle_dir: bundle_dir.into(),
            name: name.into(),
        }
    }

    fn stored_path(&self) -> PathBuf {
        self.bundle_dir.join(&self.name)
    }

    fn is_compressed(&self) -> bool {
        self.name.ends_with(".gz")
    }
}

impl ByteSource for AssetSource {
    fn open(&self) -> Result<Box<dyn ReadSend>> {
        let file = File::open(self.stored_path())
            .map_err(|e| ObbError::IoContext(self.identity(), e))?;
        if self.is_compressed() {
            Ok(Box::new(GzDecoder::new(file)))
        } else {
            Ok(Box::new(file))
        }
    }

    fn length(&self) -> Option<u64> {
        if self.is_compressed() {
            // Only the stored size is known, not the decoded one.
            return None;
        }
        fs::metadata(self.stored_path()).ok().map(|m| m.len())
    }

    fn identity(&self) -> String {
        format!("asset:{}", self.name)
    }

    fn try_delete(&self) -> bool {
        // Bundled resources are read-only.
        false
    }
}
