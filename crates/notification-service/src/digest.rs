use screener_core::ScoredInstrument;

/// Render scored instruments as a plain-text digest: one record per block,
/// `field: value` lines, blocks separated by a blank line.
pub fn render_digest(results: &[ScoredInstrument]) -> String {
    let mut blocks = Vec::with_capacity(results.len());

    for record in results {
        blocks.push(format!(
            "ISIN: {}\ntotal_score: {}\ntimestamp: {}",
            record.isin,
            record.total_score,
            record.timestamp.to_rfc3339(),
        ));
    }

    blocks.join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn sample_results() -> Vec<ScoredInstrument> {
        vec![
            ScoredInstrument {
                isin: "US0378331005".to_string(),
                total_score: 15,
                timestamp: Utc.with_ymd_and_hms(2022, 12, 14, 16, 51, 23).unwrap(),
            },
            ScoredInstrument {
                isin: "US5949181045".to_string(),
                total_score: 6,
                timestamp: Utc.with_ymd_and_hms(2022, 12, 14, 17, 1, 23).unwrap(),
            },
        ]
    }

    #[test]
    fn test_render_digest_contains_all_fields() {
        let output = render_digest(&sample_results());

        assert!(output.contains("ISIN:"));
        assert!(output.contains("US0378331005"));
        assert!(output.contains("US5949181045"));
        assert!(output.contains("total_score: 15"));
        assert!(output.contains("total_score: 6"));
        assert!(output.contains("2022-12-14T17:01:23"));
    }

    #[test]
    fn test_records_are_blank_line_separated() {
        let output = render_digest(&sample_results());
        let blocks: Vec<&str> = output.split("\n\n").collect();

        assert_eq!(blocks.len(), 2);
        assert!(blocks[0].starts_with("ISIN: US0378331005"));
        assert!(blocks[1].starts_with("ISIN: US5949181045"));
    }

    #[test]
    fn test_empty_results_render_empty_body() {
        assert_eq!(render_digest(&[]), "");
    }
}
