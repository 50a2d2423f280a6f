pub mod copy;
pub mod error;
pub mod extract;
pub mod list;
pub mod rewrite;
pub mod source;

pub use copy::copy_with_progress;
pub use error::{ObbError, Result};
pub use extract::{extract_encrypted, extract_stream};
pub use list::{ListEntry, list_entries};
pub use rewrite::RewriteJob;
pub use source::{AssetSource, ByteSource, FileSource, ReadSend};

/// Chunk size for all streaming copies and inflate loops.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Cumulative byte progress for one copy or extract operation.
///
/// `total` is the caller-supplied size hint lowered to a signed value; any
/// value <= 0 means the total is unknown and the operation must be rendered
/// as indeterminate, never as a percentage.
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub bytes: u64,
    pub total: i64,
}

impl Progress {
    pub fn new(bytes: u64, total_hint: Option<u64>) -> Self {
        Self {
            bytes,
            total: total_hint.map_or(-1, |t| t as i64),
        }
    }

    /// Completed fraction in `0.0..=1.0`, or `None` when the total is unknown.
    pub fn fraction(&self) -> Option<f64> {
        if self.total > 0 {
            Some((self.bytes as f64 / self.total as f64).clamp(0.0, 1.0))
        } else {
            None
        }
    }
}
