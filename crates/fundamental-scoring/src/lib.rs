//! Fundamentals scoring: six bounded sub-scores over a flattened
//! time-series, summed without weighting.
//!
//! Every sub-score is a pure function of the series. Numeric edge cases
//! (zero denominators, single-element series) degrade to a zero score;
//! only a missing series is an error.

use screener_core::{FundamentalField, FundamentalsSeries, ScoreError, ScoreResult};

const MARKET_CAP_FLOOR: f64 = 5.0e8;
const MARKET_CAP_CEILING: f64 = 5.0e10;
const PE_LIMIT: f64 = 50.0;
const PB_LIMIT: f64 = 10.0;

/// Compute all sub-scores and their composite for one instrument.
pub fn score(series: &FundamentalsSeries) -> Result<ScoreResult, ScoreError> {
    let market_cap = market_cap_score(series)?;
    let pe = pe_score(series)?;
    let pb = pb_score(series)?;
    let free_cash_flow = free_cash_flow_score(series)?;
    let profit_growth = profit_growth_score(series)?;
    let revenue_growth = revenue_growth_score(series)?;

    Ok(ScoreResult {
        market_cap,
        pe,
        pb,
        free_cash_flow,
        profit_growth,
        revenue_growth,
        total: market_cap + pe + pb + free_cash_flow + profit_growth + revenue_growth,
    })
}

/// Market-cap score: 100 below 5e8, 0 at or above 5e10, cubic decay in
/// between. Index 0 holds the latest-available value by upstream
/// convention.
pub fn market_cap_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    let values = required(series, FundamentalField::MarketCap)?;
    let cap = values[0];

    Ok(if cap < MARKET_CAP_FLOOR {
        100
    } else if cap >= MARKET_CAP_CEILING {
        0
    } else {
        (100.0 * (1.0 - cap / MARKET_CAP_CEILING).powi(3)).floor() as u32
    })
}

/// Trailing P/E score from the most recent observation.
pub fn pe_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    let values = required(series, FundamentalField::TrailingPe)?;
    Ok(ratio_score(values[values.len() - 1], PE_LIMIT))
}

/// Trailing P/B score from the most recent observation.
pub fn pb_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    let values = required(series, FundamentalField::TrailingPb)?;
    Ok(ratio_score(values[values.len() - 1], PB_LIMIT))
}

/// Free-cash-flow score: two independent 5-point conditions, growth
/// (last above first) and positivity (last above zero).
pub fn free_cash_flow_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    let values = required(series, FundamentalField::FreeCashFlow)?;
    let first = values[0];
    let last = values[values.len() - 1];

    let mut score = 0;
    if last > first {
        score += 5;
    }
    if last > 0.0 {
        score += 5;
    }
    Ok(score)
}

pub fn profit_growth_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    Ok(growth_score(required(series, FundamentalField::NetIncome)?))
}

pub fn revenue_growth_score(series: &FundamentalsSeries) -> Result<u32, ScoreError> {
    Ok(growth_score(required(
        series,
        FundamentalField::TotalRevenue,
    )?))
}

/// Quadratic decay inside `(0, limit]`, zero outside.
fn ratio_score(value: f64, limit: f64) -> u32 {
    if value <= 0.0 || value > limit {
        0
    } else {
        (11.0 * (1.0 - (value / limit).powi(2))).floor() as u32
    }
}

/// Average per-period growth classification.
///
/// Not CAGR: the raw first-to-last growth rate is divided by `len - 1`
/// periods. A zero first value or a single-element series scores 0 rather
/// than propagating a division error.
fn growth_score(values: &[f64]) -> u32 {
    if values.len() < 2 {
        return 0;
    }
    let first = values[0];
    let last = values[values.len() - 1];
    if first == 0.0 {
        return 0;
    }

    let growth_rate = (last - first) / first;
    let avg_growth_rate = growth_rate / (values.len() - 1) as f64;

    if avg_growth_rate <= 0.0 {
        0
    } else if avg_growth_rate > 0.1 && avg_growth_rate < 0.5 {
        5
    } else {
        3
    }
}

fn required(
    series: &FundamentalsSeries,
    field: FundamentalField,
) -> Result<&[f64], ScoreError> {
    match series.get(field) {
        Some(values) if !values.is_empty() => Ok(values),
        _ => Err(ScoreError::FieldUnavailable(field)),
    }
}
