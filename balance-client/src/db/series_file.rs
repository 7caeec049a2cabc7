use std::{
    ffi::OsString,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};

use crate::domain::Observation;

/// Load the full observation series stored at `path`.
///
/// A missing file means no history yet and yields an empty series.
pub async fn load_series(path: &Path) -> Result<Vec<Observation>> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read series file {}", path.display()))
        }
    };

    let series: Vec<Observation> = serde_json::from_slice(&bytes)
        .with_context(|| format!("failed to parse series file {}", path.display()))?;

    Ok(series)
}

/// Overwrite the series stored at `path` with `series`.
///
/// The body is written to a sibling temp file first and renamed into place,
/// so readers never observe a half-written array.
pub async fn save_series(path: &Path, series: &[Observation]) -> Result<()> {
    let body = serde_json::to_vec_pretty(series).context("failed to encode series")?;

    let tmp = temp_path(path);
    tokio::fs::write(&tmp, &body)
        .await
        .with_context(|| format!("failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("failed to replace series file {}", path.display()))?;

    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}
