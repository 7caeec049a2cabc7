use balance_client::domain::{Account, Observation};
use time::OffsetDateTime;

use crate::{
    extract::{extract_balance, ParseError},
    transform::{merge_observation_with_outcome, MergeOutcome},
};

#[derive(thiserror::Error, Debug)]
pub enum ProbeError {
    #[error("transport error fetching {account} page: {message}")]
    Transport { account: Account, message: String },
    #[error("failed to parse {account} balance: {source}")]
    Parse {
        account: Account,
        #[source]
        source: ParseError,
    },
    #[error("persistence error: {0}")]
    Persistence(String),
}

/// Delivers the raw payment page of an account.
#[async_trait::async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, account: Account) -> Result<String, ProbeError>;
}

/// Whole-series persistence. No row-level updates.
#[async_trait::async_trait]
pub trait SeriesStore: Send + Sync {
    async fn load(&self) -> Result<Vec<Observation>, ProbeError>;
    async fn save(&self, series: &[Observation]) -> Result<(), ProbeError>;
}

#[derive(Debug, Clone)]
pub struct Recorded {
    pub observation: Observation,
    pub outcome: MergeOutcome,
    pub series_len: usize,
}

/// One polling run: fetch both pages, extract, merge, persist.
///
/// Nothing is saved unless both balances were extracted and the stored
/// series was loaded.
pub struct Probe<S, K> {
    pub source: S,
    pub store: K,
}

impl<S, K> Probe<S, K>
where
    S: PageSource,
    K: SeriesStore,
{
    pub async fn run(&self) -> Result<Recorded, ProbeError> {
        self.run_at(OffsetDateTime::now_utc()).await
    }

    pub async fn run_at(&self, now: OffsetDateTime) -> Result<Recorded, ProbeError> {
        let (water, electric) = tokio::try_join!(
            self.balance(Account::Water),
            self.balance(Account::Electric)
        )?;
        let observation = Observation::new(now, water, electric);

        let series = self.store.load().await?;
        let (series, outcome) = merge_observation_with_outcome(series, observation.clone());
        self.store.save(&series).await?;

        metrics::counter!("observations_recorded_total", "outcome" => outcome_label(outcome))
            .increment(1);
        tracing::debug!(series_len = series.len(), %outcome, "series saved");

        Ok(Recorded {
            observation,
            outcome,
            series_len: series.len(),
        })
    }

    async fn balance(&self, account: Account) -> Result<f64, ProbeError> {
        let page = self.source.fetch_page(account).await?;
        tracing::debug!(%account, bytes = page.len(), "page fetched");

        extract_balance(&page).map_err(|source| ProbeError::Parse { account, source })
    }
}

fn outcome_label(outcome: MergeOutcome) -> &'static str {
    match outcome {
        MergeOutcome::Appended => "appended",
        MergeOutcome::Replaced => "replaced",
    }
}
