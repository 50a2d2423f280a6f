//! Streaming copy with progress reporting and atomic commit.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::ObbError;
use crate::source::ByteSource;
use crate::{DEFAULT_BUFFER_SIZE, Progress, Result};

/// Sibling temp path used while the copy is in flight: `<dest>.tmp` in the
/// destination's own directory, so the final rename never crosses a
/// filesystem boundary.
fn temp_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    dest.with_file_name(name)
}

/// Copy `source` to `dest`, invoking `on_progress` after every chunk with
/// the cumulative byte count and the source's length hint.
///
/// Bytes are staged in a sibling `.tmp` file and renamed onto `dest` only
/// after a successful flush, so `dest` is never observed half-written. On
/// any failure the temp file is removed and `dest` keeps its prior state.
pub fn copy_with_progress(
    source: &dyn ByteSource,
    dest: &Path,
    on_progress: impl Fn(Progress),
) -> Result<u64> {
    let total = source.length();
    let mut input = source.open()?;
    let tmp = temp_path(dest);

    debug!(
        "Copying {} -> {} (total: {:?})",
        source.identity(),
        dest.display(),
        total
    );

    let result = (|| -> std::io::Result<u64> {
        let mut out = File::create(&tmp)?;
        let mut buf = vec![0u8; DEFAULT_BUFFER_SIZE];
        let mut copied: u64 = 0;
        loop {
            let read = input.read(&mut buf)?;
            if read == 0 {
                break;
            }
            out.write_all(&buf[..read])?;
            copied += read as u64;
            on_progress(Progress::new(copied, total));
        }
        out.flush()?;
        out.sync_all()?;
        drop(out);
        fs::rename(&tmp, dest)?;
        Ok(copied)
    })();

    result.map_err(|e| {
        let _ = fs::remove_file(&tmp);
        ObbError::Copy(format!(
            "{} -> {}: {}",
            source.identity(),
            dest.display(),
            e
        ))
    })
}
