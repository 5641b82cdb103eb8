//! Candidate list ingestion: downloads the spreadsheet CSV export and
//! turns it into raw instrument rows, plus the shuffle-and-sample step
//! that picks which candidates a run will screen.

use async_trait::async_trait;
use instrument_validation::{validate, ValidationConfig};
use rand::seq::SliceRandom;
use screener_core::{InstrumentRecord, InstrumentSource, RawInstrumentRow, SourceError};

const EXPORT_URL: &str = "https://docs.google.com/spreadsheets/d";

pub struct SheetSource {
    client: reqwest::Client,
    sheet_id: String,
}

impl SheetSource {
    pub fn new(sheet_id: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| SourceError::Http(e.to_string()))?;

        Ok(Self {
            client,
            sheet_id: sheet_id.into(),
        })
    }

    pub fn export_url(&self) -> String {
        format!("{}/{}/export?format=csv", EXPORT_URL, self.sheet_id)
    }
}

#[async_trait]
impl InstrumentSource for SheetSource {
    async fn fetch_rows(&self) -> Result<Vec<RawInstrumentRow>, SourceError> {
        let url = self.export_url();
        tracing::debug!("Downloading instrument list from {}", url);

        let response = self.client.get(&url).send().await.map_err(|e| {
            if e.is_timeout() {
                SourceError::Timeout(e.to_string())
            } else {
                SourceError::Http(e.to_string())
            }
        })?;

        let body = response
            .text()
            .await
            .map_err(|e| SourceError::Http(e.to_string()))?;

        parse_rows(&body)
    }
}

/// Parse a CSV export into raw rows, matching columns by header name.
///
/// Missing columns and blank cells become `None`/empty values on the row;
/// the validation pipeline decides what that means for each record.
pub fn parse_rows(csv_data: &str) -> Result<Vec<RawInstrumentRow>, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let headers = reader
        .headers()
        .map_err(|e| SourceError::Decode(e.to_string()))?
        .clone();
    let column = |name: &str| headers.iter().position(|h| h.trim() == name);

    let title_idx = column("Title");
    let long_title_idx = column("Long_Title");
    let subtitle_idx = column("Subtitle");
    let currency_idx = column("Currency");
    let isa_idx = column("ISA_eligible");
    let isin_idx = column("ISIN");
    let mic_idx = column("MIC");
    let symbol_idx = column("Symbol");
    let fractional_idx = column("Fractional_Enabled");

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|e| SourceError::Decode(e.to_string()))?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i)).map(|s| s.to_string())
        };

        rows.push(RawInstrumentRow {
            title: cell(title_idx),
            long_title: cell(long_title_idx),
            subtitle: cell(subtitle_idx),
            currency: cell(currency_idx),
            isa_eligible: cell(isa_idx),
            isin: cell(isin_idx),
            mic: cell(mic_idx),
            symbol: cell(symbol_idx),
            fractional_enabled: cell(fractional_idx),
        });
    }

    Ok(rows)
}

/// Shuffle the candidate list, validate each row, and keep at most
/// `sample` valid records. Rejections never abort the batch: schema
/// problems are logged at warn, business-rule rejections at info.
pub fn sample_candidates(
    mut rows: Vec<RawInstrumentRow>,
    config: &ValidationConfig,
    sample: usize,
) -> Vec<InstrumentRecord> {
    rows.shuffle(&mut rand::thread_rng());

    let mut records = Vec::with_capacity(sample);
    for row in &rows {
        if records.len() >= sample {
            break;
        }
        match validate(row, config) {
            Ok(record) => records.push(record),
            Err(e) if e.is_schema_failure() => {
                tracing::warn!("Skipping malformed row ({:?}): {}", row.title, e);
            }
            Err(e) => {
                tracing::info!("Skipping {:?}: {}", row.isin, e);
            }
        }
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str =
        "Title,Long_Title,Subtitle,Currency,ISA_eligible,ISIN,MIC,Symbol,Fractional_Enabled";

    fn valid_line() -> String {
        "test_title,test_long_title,test_subtitle,GBP,TRUE,IE00BCRY6557,XLON,EXAI,TRUE".to_string()
    }

    fn bad_isin_line() -> String {
        "test_title,test_long_title,test_subtitle,GBP,TRUE,IE00BCRY655,XLON,EXAI,TRUE".to_string()
    }

    #[test]
    fn test_parse_rows_by_header_name() {
        let csv = format!("{HEADER}\n{}\n", valid_line());
        let rows = parse_rows(&csv).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].isin.as_deref(), Some("IE00BCRY6557"));
        assert_eq!(rows[0].isa_eligible.as_deref(), Some("TRUE"));
    }

    #[test]
    fn test_parse_rows_header_order_is_irrelevant() {
        let csv = "ISIN,Title,Long_Title,Subtitle,Currency,ISA_eligible,MIC,Symbol,Fractional_Enabled\n\
                   IE00BCRY6557,t,lt,st,GBP,TRUE,XLON,EXAI,TRUE\n";
        let rows = parse_rows(csv).unwrap();
        assert_eq!(rows[0].isin.as_deref(), Some("IE00BCRY6557"));
        assert_eq!(rows[0].title.as_deref(), Some("t"));
    }

    #[test]
    fn test_parse_rows_missing_column_yields_none() {
        let csv = "Title,ISIN\nt,IE00BCRY6557\n";
        let rows = parse_rows(csv).unwrap();
        assert_eq!(rows[0].mic, None);
        assert_eq!(rows[0].isa_eligible, None);
    }

    #[test]
    fn test_parse_rows_header_only() {
        let rows = parse_rows(&format!("{HEADER}\n")).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_sample_caps_and_filters() {
        let csv = format!(
            "{HEADER}\n{}\n{}\n{}\n{}\n{}\n{}\n{}\n",
            valid_line(),
            valid_line(),
            bad_isin_line(),
            bad_isin_line(),
            valid_line(),
            valid_line(),
            valid_line(),
        );
        let rows = parse_rows(&csv).unwrap();
        let config = ValidationConfig::default();

        let one = sample_candidates(rows.clone(), &config, 1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].isin, "IE00BCRY6557");
        assert_eq!(one[0].lookup_symbol, "EXAI.L");

        let five = sample_candidates(rows.clone(), &config, 5);
        assert_eq!(five.len(), 5);

        // Only five of seven rows are valid
        let all = sample_candidates(rows, &config, 100);
        assert_eq!(all.len(), 5);
    }

    #[test]
    fn test_export_url() {
        let source = SheetSource::new("abc123").unwrap();
        assert_eq!(
            source.export_url(),
            "https://docs.google.com/spreadsheets/d/abc123/export?format=csv"
        );
    }
}
