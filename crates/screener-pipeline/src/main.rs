//! screener-pipeline: run one screening batch and email the digest.
//!
//! Candidate instruments come from the configured spreadsheet export; each
//! validated candidate gets its fundamentals fetched and scored, and the
//! batch result goes out via the notification service.
//!
//! Usage:
//!   SHEET_ID=... cargo run -p screener-pipeline
//!
//! Optional env: DATABASE_URL, SAMPLE_LIMIT, REQUIRE_ISA_ELIGIBLE,
//! EXCLUDE_FUND_LIKE, SMTP_* / NOTIFICATION_EMAIL_TO for delivery.

use fundamentals_client::FundamentalsClient;
use notification_service::{NotificationConfig, NotificationService, ScreenDigest};
use screen_store::ScreenStore;
use screener_pipeline::{PipelineConfig, ScreenerPipeline};
use sheet_source::SheetSource;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "screener_pipeline=info,sheet_source=info".into()),
        )
        .init();

    let config = PipelineConfig::from_env()?;

    let instruments = Arc::new(SheetSource::new(config.sheet_id.clone())?);
    let fundamentals = Arc::new(FundamentalsClient::new()?);
    let store = Arc::new(ScreenStore::new(&config.database_url).await?);

    let pipeline = ScreenerPipeline::new(
        instruments,
        fundamentals,
        store,
        config.validation.clone(),
        config.sample_limit,
    );

    let outcome = pipeline.run_once().await?;

    if outcome.scored.is_empty() {
        tracing::info!("No instruments scored this run, skipping digest");
        return Ok(());
    }

    let notification_config = NotificationConfig::from_env();
    let service = NotificationService::new(&notification_config);
    let digest = ScreenDigest::from_results(notification_config.subject.clone(), &outcome.scored);
    service.send_digest(&digest).await;

    Ok(())
}
