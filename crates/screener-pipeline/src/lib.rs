//! Single-invocation screening batch: candidate rows are validated,
//! sampled, de-duplicated against the seen-store, scored from their
//! fundamentals, recorded, and rolled into one digest.
//!
//! Every per-record failure is logged and skipped; nothing short of the
//! candidate list itself being unreachable fails the batch.

use chrono::{DateTime, Utc};
use instrument_validation::ValidationConfig;
use screener_core::{
    FundamentalField, FundamentalsSource, InstrumentSource, ScoredInstrument, SeenStore,
};
use sheet_source::sample_candidates;
use std::sync::Arc;

/// How many instruments one run screens at most.
const DEFAULT_SAMPLE_LIMIT: usize = 5;

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub sheet_id: String,
    pub database_url: String,
    pub sample_limit: usize,
    pub validation: ValidationConfig,
}

impl PipelineConfig {
    /// Load from environment variables. Only the sheet id is required.
    pub fn from_env() -> anyhow::Result<Self> {
        let sheet_id = std::env::var("SHEET_ID")
            .map_err(|_| anyhow::anyhow!("SHEET_ID must be set"))?;

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:screener.db".to_string());

        let sample_limit = std::env::var("SAMPLE_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_SAMPLE_LIMIT);

        let validation = ValidationConfig {
            require_isa_eligible: env_flag("REQUIRE_ISA_ELIGIBLE", true),
            exclude_fund_like_instruments: env_flag("EXCLUDE_FUND_LIKE", true),
        };

        Ok(Self {
            sheet_id,
            database_url,
            sample_limit,
            validation,
        })
    }
}

fn env_flag(name: &str, default: bool) -> bool {
    match std::env::var(name).as_deref() {
        Ok("true") | Ok("TRUE") | Ok("1") => true,
        Ok("false") | Ok("FALSE") | Ok("0") => false,
        _ => default,
    }
}

/// Outcome of one batch run.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub scored: Vec<ScoredInstrument>,
    pub total_rows: usize,
    pub total_candidates: usize,
    pub timestamp: DateTime<Utc>,
}

pub struct ScreenerPipeline {
    instruments: Arc<dyn InstrumentSource>,
    fundamentals: Arc<dyn FundamentalsSource>,
    store: Arc<dyn SeenStore>,
    validation: ValidationConfig,
    sample_limit: usize,
}

impl ScreenerPipeline {
    pub fn new(
        instruments: Arc<dyn InstrumentSource>,
        fundamentals: Arc<dyn FundamentalsSource>,
        store: Arc<dyn SeenStore>,
        validation: ValidationConfig,
        sample_limit: usize,
    ) -> Self {
        Self {
            instruments,
            fundamentals,
            store,
            validation,
            sample_limit,
        }
    }

    /// Run one screening batch end to end.
    pub async fn run_once(&self) -> anyhow::Result<BatchOutcome> {
        let rows = self.instruments.fetch_rows().await?;
        let total_rows = rows.len();
        tracing::info!("Fetched {} candidate rows", total_rows);

        let candidates = sample_candidates(rows, &self.validation, self.sample_limit);
        let total_candidates = candidates.len();
        tracing::info!("{} candidates passed validation", total_candidates);

        let mut scored = Vec::with_capacity(total_candidates);

        for record in candidates {
            match self.store.exists(&record.isin).await {
                Ok(true) => {
                    tracing::info!("{} already screened, skipping", record.isin);
                    continue;
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Seen-store lookup failed for {}: {}", record.isin, e);
                    continue;
                }
            }

            let series = match self
                .fundamentals
                .fetch_series(&record.lookup_symbol, &FundamentalField::ALL)
                .await
            {
                Ok(series) => series,
                Err(e) => {
                    tracing::warn!(
                        "Fundamentals fetch failed for {} ({}): {}",
                        record.isin,
                        record.lookup_symbol,
                        e
                    );
                    continue;
                }
            };

            let result = match fundamental_scoring::score(&series) {
                Ok(result) => result,
                Err(e) => {
                    tracing::info!("Cannot score {}: {}", record.isin, e);
                    continue;
                }
            };

            tracing::info!(
                "{} ({}) scored {}",
                record.isin,
                record.lookup_symbol,
                result.total
            );

            let instrument = ScoredInstrument {
                isin: record.isin.clone(),
                total_score: result.total,
                timestamp: Utc::now(),
            };

            if let Err(e) = self.store.record(&instrument).await {
                tracing::warn!("Failed to record {} in seen-store: {}", record.isin, e);
            }

            scored.push(instrument);
        }

        tracing::info!(
            "Batch complete: {}/{} candidates scored",
            scored.len(),
            total_candidates
        );

        Ok(BatchOutcome {
            scored,
            total_rows,
            total_candidates,
            timestamp: Utc::now(),
        })
    }
}
