use crate::{FundamentalField, FundamentalsSeries, RawInstrumentRow, ScoredInstrument, SourceError};
use async_trait::async_trait;

/// Supplies raw candidate rows, shaped like a spreadsheet export with a
/// fixed header row.
#[async_trait]
pub trait InstrumentSource: Send + Sync {
    async fn fetch_rows(&self) -> Result<Vec<RawInstrumentRow>, SourceError>;
}

/// Supplies a fundamentals time-series for one lookup symbol.
#[async_trait]
pub trait FundamentalsSource: Send + Sync {
    async fn fetch_series(
        &self,
        lookup_symbol: &str,
        fields: &[FundamentalField],
    ) -> Result<FundamentalsSeries, SourceError>;
}

/// Existence check keyed by security identifier, used to avoid re-scoring
/// instruments screened on a previous run.
#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn exists(&self, isin: &str) -> anyhow::Result<bool>;
    async fn record(&self, instrument: &ScoredInstrument) -> anyhow::Result<()>;
}
