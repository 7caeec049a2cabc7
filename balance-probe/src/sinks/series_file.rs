use std::path::PathBuf;

use balance_client::{db, domain::Observation};

use crate::pipeline::{ProbeError, SeriesStore};

/// JSON file holding the whole observation series.
pub struct SeriesFile {
    path: PathBuf,
}

impl SeriesFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait::async_trait]
impl SeriesStore for SeriesFile {
    async fn load(&self) -> Result<Vec<Observation>, ProbeError> {
        let series = db::load_series(&self.path)
            .await
            .map_err(|e| ProbeError::Persistence(format!("{e:#}")))?;
        tracing::debug!(path = %self.path.display(), len = series.len(), "series loaded");
        Ok(series)
    }

    async fn save(&self, series: &[Observation]) -> Result<(), ProbeError> {
        match db::save_series(&self.path, series).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::debug!(error = %e, path = %self.path.display(), "series save failed");
                metrics::counter!("series_file_errors_total").increment(1);
                Err(ProbeError::Persistence(format!("{e:#}")))
            }
        }
    }
}
