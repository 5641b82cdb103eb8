//! HTTP client for the fundamentals time-series endpoint.
//!
//! Fetches the named series for one lookup symbol and flattens the nested
//! response into a `FundamentalsSeries`. Responses are cached per symbol
//! with a TTL so repeat screens inside one run do not refetch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use screener_core::{
    FundamentalField, FundamentalsSeries, FundamentalsSource, RawFundamentalsResponse, SourceError,
};

const BASE_URL: &str =
    "https://query1.finance.yahoo.com/ws/fundamentals-timeseries/v1/finance/timeseries";
const SECS_IN_A_DAY: i64 = 86_400;
/// How far past today the query window extends, so the latest filing is
/// always inside the requested period.
const PERIOD_HORIZON_DAYS: i64 = 2;
const CACHE_TTL_SECS: i64 = 1_800;

struct CacheEntry {
    series: FundamentalsSeries,
    cached_at: DateTime<Utc>,
}

pub struct FundamentalsClient {
    client: reqwest::Client,
    cache: DashMap<String, CacheEntry>,
}

impl FundamentalsClient {
    pub fn new() -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            cache: DashMap::new(),
        })
    }

    async fn fetch_raw(
        &self,
        lookup_symbol: &str,
        fields: &[FundamentalField],
    ) -> Result<RawFundamentalsResponse, SourceError> {
        let field_list = fields
            .iter()
            .map(|f| f.api_name())
            .collect::<Vec<_>>()
            .join(",");
        let now = Utc::now().timestamp();
        let url = format!(
            "{}/{}?type={}&period1=0&period2={}",
            BASE_URL,
            lookup_symbol,
            field_list,
            future_timestamp(now, PERIOD_HORIZON_DAYS),
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(format!("{}: {}", lookup_symbol, e))
            } else {
                SourceError::Http(e.to_string())
            }
        })?;

        response
            .json::<RawFundamentalsResponse>()
            .await
            .map_err(|e| SourceError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FundamentalsSource for FundamentalsClient {
    async fn fetch_series(
        &self,
        lookup_symbol: &str,
        fields: &[FundamentalField],
    ) -> Result<FundamentalsSeries, SourceError> {
        if let Some(entry) = self.cache.get(lookup_symbol) {
            if (Utc::now() - entry.cached_at).num_seconds() < CACHE_TTL_SECS {
                tracing::debug!("Fundamentals cache hit for {}", lookup_symbol);
                return Ok(entry.series.clone());
            }
        }

        let raw = self.fetch_raw(lookup_symbol, fields).await?;
        let series = FundamentalsSeries::from_raw(&raw);

        self.cache.insert(
            lookup_symbol.to_string(),
            CacheEntry {
                series: series.clone(),
                cached_at: Utc::now(),
            },
        );

        Ok(series)
    }
}

/// Unix timestamp `days` whole days after `now`.
pub fn future_timestamp(now: i64, days: i64) -> i64 {
    now + days * SECS_IN_A_DAY
}
