use screener_core::{InstrumentRecord, RawInstrumentRow, ValidationError};

/// Free-text tokens that mark an instrument as fund-like.
const FUND_TOKENS: [&str; 2] = ["ETF", "ETC"];

/// Toggles for the business-rule checks. Both default to on; turning one
/// off skips that check entirely.
#[derive(Debug, Clone)]
pub struct ValidationConfig {
    pub require_isa_eligible: bool,
    pub exclude_fund_like_instruments: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            require_isa_eligible: true,
            exclude_fund_like_instruments: true,
        }
    }
}

/// Run one raw row through the validation pipeline, producing a fully
/// validated record with its derived lookup symbol, or the first rejection
/// encountered.
///
/// Check order: ISA eligibility, fund-classification filter, identifier
/// format, then general field shape; first failure wins. A row whose
/// eligibility flag or text fields are missing falls through to the schema
/// check.
pub fn validate(
    row: &RawInstrumentRow,
    config: &ValidationConfig,
) -> Result<InstrumentRecord, ValidationError> {
    // 1. ISA eligibility
    let isa_eligible = row.isa_eligible.as_deref().and_then(parse_flag);
    if config.require_isa_eligible && isa_eligible == Some(false) {
        return Err(ValidationError::EligibilityRejected);
    }

    // 2. Classification filter (case-sensitive substring match)
    if config.exclude_fund_like_instruments {
        for text in [row.long_title.as_deref(), row.subtitle.as_deref()]
            .into_iter()
            .flatten()
        {
            for token in FUND_TOKENS {
                if text.contains(token) {
                    return Err(ValidationError::ClassificationRejected(token.to_string()));
                }
            }
        }
    }

    // 3. Identifier format
    if let Some(isin) = row.isin.as_deref() {
        check_isin(isin)?;
    }

    // 4. General field validation
    build_record(row, isa_eligible)
}

/// Check a security identifier: must be non-empty, end in a decimal digit,
/// and satisfy the modulus-10 double-add-double checksum.
pub fn check_isin(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::IdentifierFormatInvalid(
            "identifier is missing".to_string(),
        ));
    }

    if !value.chars().next_back().is_some_and(|c| c.is_ascii_digit()) {
        return Err(ValidationError::IdentifierFormatInvalid(
            "check digit is not numeric".to_string(),
        ));
    }

    if !isin_checksum(value) {
        return Err(ValidationError::IdentifierFormatInvalid(
            "checksum failure".to_string(),
        ));
    }

    Ok(())
}

/// ISO 6166-style modulus-10 checksum. Letters map to `ord - 55` and their
/// decimal digits are concatenated in place; the digit string is then
/// walked from the right, doubling every other digit and summing the
/// decimal digits of each doubled value.
fn isin_checksum(value: &str) -> bool {
    let chars: Vec<char> = value.chars().collect();
    let (body, check) = chars.split_at(chars.len() - 1);
    let check_digit = match check[0].to_digit(10) {
        Some(d) => d,
        None => return false,
    };

    let mut converted = String::with_capacity(body.len() * 2);
    for c in body {
        match c.to_digit(10) {
            Some(d) => converted.push_str(&d.to_string()),
            None => converted.push_str(&((*c as i64) - 55).to_string()),
        }
    }

    let mut digits = Vec::with_capacity(converted.len());
    for c in converted.chars().rev() {
        match c.to_digit(10) {
            Some(d) => digits.push(d),
            // Character outside the digit/letter alphabet
            None => return false,
        }
    }

    let mut checksum = 0;
    for (i, d) in digits.iter().enumerate() {
        if i % 2 == 0 {
            let doubled = 2 * d;
            checksum += doubled / 10 + doubled % 10;
        } else {
            checksum += d;
        }
    }

    (checksum + check_digit) % 10 == 0
}

/// Derive the fundamentals-lookup symbol from the primary trading symbol
/// and its market identifier code.
///
/// Lowercase characters encode a venue-local suffix and are stripped
/// wherever they appear, as are literal dots. Stockholm share classes get a
/// hyphen before a trailing A/B. Venues absent from the suffix table pass
/// through unsuffixed.
pub fn derive_lookup_symbol(mic: &str, symbol: &str) -> String {
    let mut lookup: String = symbol
        .chars()
        .filter(|c| !c.is_lowercase() && *c != '.')
        .collect();

    if mic == "XSTO" && (lookup.ends_with('A') || lookup.ends_with('B')) {
        lookup.insert(lookup.len() - 1, '-');
    }

    lookup.push_str(venue_suffix(mic));
    lookup
}

fn venue_suffix(mic: &str) -> &'static str {
    match mic {
        "XLON" => ".L",
        "XETR" => ".DE",
        "XHEL" => ".HE",
        "XLIS" => ".LS",
        "XAMS" => ".AS",
        "XBRU" => ".BR",
        "XWBO" => ".VI",
        "XSTO" => ".ST",
        _ => "",
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "TRUE" | "True" | "true" | "1" => Some(true),
        "FALSE" | "False" | "false" | "0" => Some(false),
        _ => None,
    }
}

fn build_record(
    row: &RawInstrumentRow,
    isa_eligible: Option<bool>,
) -> Result<InstrumentRecord, ValidationError> {
    let field = |value: &Option<String>, name: &str| {
        value
            .clone()
            .ok_or_else(|| ValidationError::SchemaInvalid(format!("missing field {name}")))
    };

    let isa_eligible = match (&row.isa_eligible, isa_eligible) {
        (_, Some(flag)) => flag,
        (Some(raw), None) => {
            return Err(ValidationError::SchemaInvalid(format!(
                "ISA_eligible is not a boolean: {raw:?}"
            )))
        }
        (None, None) => {
            return Err(ValidationError::SchemaInvalid(
                "missing field ISA_eligible".to_string(),
            ))
        }
    };

    let fractional_enabled = match &row.fractional_enabled {
        Some(raw) => parse_flag(raw).ok_or_else(|| {
            ValidationError::SchemaInvalid(format!("Fractional_Enabled is not a boolean: {raw:?}"))
        })?,
        None => {
            return Err(ValidationError::SchemaInvalid(
                "missing field Fractional_Enabled".to_string(),
            ))
        }
    };

    let mic = field(&row.mic, "MIC")?;
    let symbol = field(&row.symbol, "Symbol")?;
    let lookup_symbol = derive_lookup_symbol(&mic, &symbol);

    Ok(InstrumentRecord {
        title: field(&row.title, "Title")?,
        long_title: field(&row.long_title, "Long_Title")?,
        subtitle: field(&row.subtitle, "Subtitle")?,
        currency: field(&row.currency, "Currency")?,
        isa_eligible,
        isin: field(&row.isin, "ISIN")?,
        mic,
        symbol,
        fractional_enabled,
        lookup_symbol,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_row() -> RawInstrumentRow {
        RawInstrumentRow {
            title: Some("test_title".to_string()),
            long_title: Some("test_long_title".to_string()),
            subtitle: Some("test_subtitle".to_string()),
            currency: Some("GBP".to_string()),
            isa_eligible: Some("TRUE".to_string()),
            isin: Some("IE00BCRY6557".to_string()),
            mic: Some("XLON".to_string()),
            symbol: Some("EXAI".to_string()),
            fractional_enabled: Some("TRUE".to_string()),
        }
    }

    #[test]
    fn test_isin_valid() {
        for isin in ["US7835132033", "NL0011585146", "IE00BLLZQ912", "IE00BCRY6557"] {
            assert_eq!(check_isin(isin), Ok(()), "{isin} should pass");
        }
    }

    #[test]
    fn test_isin_invalid() {
        for isin in [
            "EXAI",
            "US7835132",
            "7835132033",
            "US7835132034",
            "",
            "9gjh4395gj",
            "SomethingHere",
        ] {
            assert!(
                matches!(
                    check_isin(isin),
                    Err(ValidationError::IdentifierFormatInvalid(_))
                ),
                "{isin:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_lookup_symbol_derivation() {
        let cases = [
            ("XNAS", "AAPL", "AAPL"),
            ("XLON", "FOUR", "FOUR.L"),
            ("XSTO", "LUMI", "LUMI.ST"),
            ("XSTO", "LUMB", "LUM-B.ST"),
            ("XNAS", "PSEC", "PSEC"),
            ("XETR", "TTR1d", "TTR1.DE"),
            ("XWBO", "ANDRv", "ANDR.VI"),
            ("XNYS", "BRK.B", "BRKB"),
        ];
        for (mic, symbol, expected) in cases {
            assert_eq!(derive_lookup_symbol(mic, symbol), expected);
        }
    }

    #[test]
    fn test_lowercase_stripped_anywhere_not_just_trailing() {
        assert_eq!(derive_lookup_symbol("XETR", "TaTR1d"), "TTR1.DE");
    }

    #[test]
    fn test_eligibility_check_respects_config() {
        let mut row = valid_row();
        row.isa_eligible = Some("FALSE".to_string());

        let strict = ValidationConfig::default();
        assert_eq!(
            validate(&row, &strict),
            Err(ValidationError::EligibilityRejected)
        );

        let lax = ValidationConfig {
            require_isa_eligible: false,
            ..ValidationConfig::default()
        };
        let record = validate(&row, &lax).unwrap();
        assert!(!record.isa_eligible);
    }

    #[test]
    fn test_fund_filter_matches_either_text_field() {
        let config = ValidationConfig::default();

        let mut row = valid_row();
        row.long_title = Some("UCITS ETF".to_string());
        assert_eq!(
            validate(&row, &config),
            Err(ValidationError::ClassificationRejected("ETF".to_string()))
        );

        let mut row = valid_row();
        row.subtitle = Some("Gold ETC".to_string());
        assert_eq!(
            validate(&row, &config),
            Err(ValidationError::ClassificationRejected("ETC".to_string()))
        );

        // Case-sensitive: spelled-out names pass through
        let mut row = valid_row();
        row.long_title = Some("Not Exchange Traded Fund or Commodity".to_string());
        assert!(validate(&row, &config).is_ok());
    }

    #[test]
    fn test_fund_filter_skipped_when_disabled() {
        let config = ValidationConfig {
            exclude_fund_like_instruments: false,
            ..ValidationConfig::default()
        };
        let mut row = valid_row();
        row.long_title = Some("UCITS ETF".to_string());
        let record = validate(&row, &config).unwrap();
        assert_eq!(record.long_title, "UCITS ETF");
    }

    #[test]
    fn test_valid_row_yields_record_with_lookup_symbol() {
        let record = validate(&valid_row(), &ValidationConfig::default()).unwrap();
        assert_eq!(record.isin, "IE00BCRY6557");
        assert_eq!(record.lookup_symbol, "EXAI.L");
        assert!(record.isa_eligible);
        assert!(record.fractional_enabled);
    }

    #[test]
    fn test_bad_isin_beats_schema_problems() {
        // Identifier check runs before general field validation
        let mut row = valid_row();
        row.isin = Some("US7835132034".to_string());
        row.title = None;
        assert!(matches!(
            validate(&row, &ValidationConfig::default()),
            Err(ValidationError::IdentifierFormatInvalid(_))
        ));
    }

    #[test]
    fn test_missing_and_mistyped_fields_are_schema_invalid() {
        let config = ValidationConfig::default();

        let mut row = valid_row();
        row.title = None;
        let err = validate(&row, &config).unwrap_err();
        assert!(err.is_schema_failure());

        let mut row = valid_row();
        row.isa_eligible = Some("not truthy".to_string());
        let err = validate(&row, &config).unwrap_err();
        assert!(err.is_schema_failure());

        let mut row = valid_row();
        row.isin = None;
        let err = validate(&row, &config).unwrap_err();
        assert!(err.is_schema_failure());
    }

    #[test]
    fn test_business_rule_kinds_are_not_schema_failures() {
        assert!(!ValidationError::EligibilityRejected.is_schema_failure());
        assert!(!ValidationError::ClassificationRejected("ETF".to_string()).is_schema_failure());
        assert!(
            !ValidationError::IdentifierFormatInvalid("checksum failure".to_string())
                .is_schema_failure()
        );
    }
}
