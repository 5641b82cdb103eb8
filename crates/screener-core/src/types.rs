use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the spreadsheet export, exactly as received.
///
/// Every field is optional and untyped; malformed rows survive parsing and
/// are rejected by the validation pipeline with a schema kind.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawInstrumentRow {
    #[serde(rename = "Title")]
    pub title: Option<String>,
    #[serde(rename = "Long_Title")]
    pub long_title: Option<String>,
    #[serde(rename = "Subtitle")]
    pub subtitle: Option<String>,
    #[serde(rename = "Currency")]
    pub currency: Option<String>,
    #[serde(rename = "ISA_eligible")]
    pub isa_eligible: Option<String>,
    #[serde(rename = "ISIN")]
    pub isin: Option<String>,
    #[serde(rename = "MIC")]
    pub mic: Option<String>,
    #[serde(rename = "Symbol")]
    pub symbol: Option<String>,
    #[serde(rename = "Fractional_Enabled")]
    pub fractional_enabled: Option<String>,
}

/// A fully validated instrument record.
///
/// Either every check passed and the record carries its derived lookup
/// symbol, or the row was rejected outright; no partial record exists.
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentRecord {
    pub title: String,
    pub long_title: String,
    pub subtitle: String,
    pub currency: String,
    pub isa_eligible: bool,
    pub isin: String,
    pub mic: String,
    pub symbol: String,
    pub fractional_enabled: bool,
    /// Venue-adjusted symbol used against the fundamentals source.
    pub lookup_symbol: String,
}

/// The fixed set of fundamental series a screen consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FundamentalField {
    MarketCap,
    TrailingPe,
    TrailingPb,
    FreeCashFlow,
    TotalRevenue,
    NetIncome,
}

impl FundamentalField {
    pub const ALL: [FundamentalField; 6] = [
        FundamentalField::MarketCap,
        FundamentalField::TrailingPe,
        FundamentalField::TrailingPb,
        FundamentalField::FreeCashFlow,
        FundamentalField::TotalRevenue,
        FundamentalField::NetIncome,
    ];

    /// Field key as the time-series endpoint spells it.
    pub fn api_name(&self) -> &'static str {
        match self {
            FundamentalField::MarketCap => "annualMarketCap",
            FundamentalField::TrailingPe => "trailingPeRatio",
            FundamentalField::TrailingPb => "trailingPbRatio",
            FundamentalField::FreeCashFlow => "annualFreeCashFlow",
            FundamentalField::TotalRevenue => "annualTotalRevenue",
            FundamentalField::NetIncome => "annualNetIncome",
        }
    }

    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|f| f.api_name() == name)
    }
}

/// One observation in a raw time-series response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    #[serde(rename = "reportedValue")]
    pub reported_value: ReportedValue,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportedValue {
    pub raw: f64,
}

/// Raw fundamentals response: field name to ordered observation list,
/// oldest first.
pub type RawFundamentalsResponse = HashMap<String, Vec<TimeSeriesPoint>>;

/// Flattened fundamentals for one instrument: each recognized field maps to
/// its ordered numeric values, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FundamentalsSeries {
    series: HashMap<FundamentalField, Vec<f64>>,
}

impl FundamentalsSeries {
    /// Flatten a raw nested response. Order within each series is preserved
    /// exactly; unrecognized field keys are ignored.
    pub fn from_raw(raw: &RawFundamentalsResponse) -> Self {
        let mut out = Self::default();
        for (name, points) in raw {
            if let Some(field) = FundamentalField::from_api_name(name) {
                out.insert(field, points.iter().map(|p| p.reported_value.raw).collect());
            }
        }
        out
    }

    pub fn insert(&mut self, field: FundamentalField, values: Vec<f64>) {
        self.series.insert(field, values);
    }

    pub fn get(&self, field: FundamentalField) -> Option<&[f64]> {
        self.series.get(&field).map(|v| v.as_slice())
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Per-instrument scoring outcome: six bounded sub-scores and their
/// unweighted sum. Produced fresh per invocation, immutable once computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub market_cap: u32,
    pub pe: u32,
    pub pb: u32,
    pub free_cash_flow: u32,
    pub profit_growth: u32,
    pub revenue_growth: u32,
    pub total: u32,
}

/// A screened instrument as delivered to the store and the digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredInstrument {
    pub isin: String,
    pub total_score: u32,
    pub timestamp: DateTime<Utc>,
}
