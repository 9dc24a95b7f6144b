//! File output for rendered bulletins

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use tempfile::Builder;

use crate::model::BettingType;
use crate::Result;

/// `boletim-<type>-<unix-millis>.png`
pub fn export_filename(kind: BettingType, at: DateTime<Utc>) -> String {
    format!("boletim-{}-{}.png", kind.as_str(), at.timestamp_millis())
}

/// Write `bytes` to `path` through a sibling temporary file and a rename, so
/// readers never observe a partially written file. The temporary file is
/// removed if anything fails.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            fs::create_dir_all(parent)?;
            parent
        }
        None => Path::new("."),
    };
    let mut tmp = Builder::new().prefix(".boletim-").suffix(".tmp").tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
