//! Download affordance: write the current draft to a timestamped file.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::OffsetDateTime;

use crate::config::StudioConfig;

/// Builds a `<prefix>-<YYYYMMDDHHMMSS>.<ext>` filename.
#[must_use]
pub fn export_filename(prefix: &str, extension: &str, timestamp: OffsetDateTime) -> String {
    let format = format_description!("[year][month][day][hour][minute][second]");
    let stamp = timestamp
        .format(&format)
        .unwrap_or_else(|_| "00000000000000".to_string());
    format!("{prefix}-{stamp}.{extension}")
}

/// Writes `code` into `dir` under a freshly timestamped name.
pub fn export_draft(dir: &Path, config: &StudioConfig, code: &str) -> io::Result<PathBuf> {
    let name = export_filename(
        &config.export_prefix,
        &config.export_extension,
        OffsetDateTime::now_utc(),
    );
    let path = dir.join(name);
    fs::write(&path, code)?;
    Ok(path)
}
