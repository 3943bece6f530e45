//! Holdings source
//!
//! Reads the held-securities list from a Google Sheets spreadsheet via
//! the Sheets v4 values endpoint, with a local CSV file as an offline
//! fallback. Both sources produce the same `HoldingRecord` sequence the
//! analysis engine consumes.

use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::analysis::HoldingRecord;
use crate::config::SheetsSettings;
use crate::error::FolioError;

const SHEETS_API_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// Sheets values response; cells arrive as strings or numbers depending
/// on the sheet's cell formatting
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Fetch the holdings list from the configured spreadsheet range.
///
/// Unlike quote lookups, a failing holdings source aborts the run: there
/// is nothing to analyze without it.
pub async fn fetch_holdings(settings: &SheetsSettings) -> Result<Vec<HoldingRecord>> {
    info!(
        "Fetching holdings from spreadsheet {} range {}",
        settings.spreadsheet_id, settings.range
    );

    let client = Client::builder()
        .user_agent("Mozilla/5.0 (compatible; FolioBot/1.0)")
        .build()?;

    let url = format!(
        "{}/{}/values/{}",
        SHEETS_API_BASE_URL, settings.spreadsheet_id, settings.range
    );

    let response = client
        .get(&url)
        .query(&[("key", settings.api_key.as_str())])
        .send()
        .await
        .context("Failed to send request to the Sheets API")?;

    if !response.status().is_success() {
        return Err(FolioError::HoldingsSource(format!(
            "Sheets API returned error status: {}",
            response.status()
        ))
        .into());
    }

    let data: ValuesResponse = response
        .json()
        .await
        .context("Failed to parse Sheets API response")?;

    let holdings = parse_rows(
        &data.values,
        &settings.symbol_column,
        &settings.quantity_column,
    );
    info!("Loaded {} holdings from spreadsheet", holdings.len());
    Ok(holdings)
}

/// Load holdings from a local CSV file with `symbol,quantity` columns.
/// Used for offline runs and development.
pub fn load_holdings_csv(path: &Path) -> Result<Vec<HoldingRecord>> {
    info!("Loading holdings from {}", path.display());

    #[derive(Debug, Deserialize)]
    struct CsvHolding {
        symbol: String,
        quantity: String,
    }

    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open holdings file {}", path.display()))?;

    let mut holdings = Vec::new();
    for record in reader.deserialize() {
        let row: CsvHolding = record.context("Malformed holdings CSV row")?;
        let Some(symbol) = normalize_symbol(&row.symbol) else {
            continue;
        };
        match parse_quantity(&row.quantity) {
            Some(quantity) => holdings.push(HoldingRecord { symbol, quantity }),
            None => warn!(
                "Skipping {}: unparsable quantity '{}'",
                symbol, row.quantity
            ),
        }
    }

    Ok(holdings)
}

/// First row is the header; symbol and quantity columns are located by
/// their configured names. Rows without a usable symbol or quantity are
/// skipped.
fn parse_rows(
    values: &[Vec<Value>],
    symbol_column: &str,
    quantity_column: &str,
) -> Vec<HoldingRecord> {
    let Some((header, rows)) = values.split_first() else {
        return Vec::new();
    };

    let Some(symbol_idx) = find_column(header, symbol_column) else {
        warn!("Symbol column '{}' not found in header row", symbol_column);
        return Vec::new();
    };
    let Some(quantity_idx) = find_column(header, quantity_column) else {
        warn!(
            "Quantity column '{}' not found in header row",
            quantity_column
        );
        return Vec::new();
    };

    rows.iter()
        .filter_map(|row| {
            let symbol = normalize_symbol(&cell_text(row.get(symbol_idx)?))?;
            let raw_quantity = cell_text(row.get(quantity_idx)?);
            match parse_quantity(&raw_quantity) {
                Some(quantity) => Some(HoldingRecord { symbol, quantity }),
                None => {
                    warn!("Skipping {}: unparsable quantity '{}'", symbol, raw_quantity);
                    None
                }
            }
        })
        .collect()
}

fn find_column(header: &[Value], name: &str) -> Option<usize> {
    header.iter().position(|cell| cell_text(cell) == name)
}

fn cell_text(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => match n.as_i64() {
            Some(i) => i.to_string(),
            None => n.to_string(),
        },
        _ => String::new(),
    }
}

/// Bare numeric codes are Tokyo Stock Exchange securities and get the
/// `.T` suffix the quote provider expects; everything else passes
/// through untouched
fn normalize_symbol(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Some(format!("{}.T", trimmed));
    }
    Some(trimmed.to_string())
}

/// Quantities may carry thousands separators; negatives are rejected
fn parse_quantity(raw: &str) -> Option<Decimal> {
    let quantity = Decimal::from_str(&raw.replace(',', "")).ok()?;
    if quantity < Decimal::ZERO {
        return None;
    }
    Some(quantity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_normalize_symbol() {
        assert_eq!(normalize_symbol("AAPL"), Some("AAPL".to_string()));
        assert_eq!(normalize_symbol("  GOOGL "), Some("GOOGL".to_string()));
        assert_eq!(normalize_symbol("7203"), Some("7203.T".to_string()));
        assert_eq!(normalize_symbol("7203.T"), Some("7203.T".to_string()));
        assert_eq!(normalize_symbol(""), None);
        assert_eq!(normalize_symbol("   "), None);
    }

    #[test]
    fn test_parse_quantity() {
        assert_eq!(parse_quantity("10"), Some(dec!(10)));
        assert_eq!(parse_quantity("2.5"), Some(dec!(2.5)));
        assert_eq!(parse_quantity("1,200"), Some(dec!(1200)));
        assert_eq!(parse_quantity("-3"), None);
        assert_eq!(parse_quantity("ten"), None);
    }

    #[test]
    fn test_parse_rows() {
        let values = vec![
            vec![json!("symbol"), json!("quantity")],
            vec![json!("AAPL"), json!("10")],
            vec![json!(7203), json!(100)],
            vec![json!(""), json!("5")],
            vec![json!("BAD"), json!("n/a")],
        ];

        let holdings = parse_rows(&values, "symbol", "quantity");
        assert_eq!(holdings.len(), 2);
        assert_eq!(holdings[0].symbol, "AAPL");
        assert_eq!(holdings[0].quantity, dec!(10));
        assert_eq!(holdings[1].symbol, "7203.T");
        assert_eq!(holdings[1].quantity, dec!(100));
    }

    #[test]
    fn test_parse_rows_with_renamed_columns() {
        let values = vec![
            vec![json!("note"), json!("ticker"), json!("shares")],
            vec![json!("core position"), json!("MSFT"), json!("8")],
        ];

        let holdings = parse_rows(&values, "ticker", "shares");
        assert_eq!(holdings.len(), 1);
        assert_eq!(holdings[0].symbol, "MSFT");
    }

    #[test]
    fn test_parse_rows_missing_column_yields_empty() {
        let values = vec![
            vec![json!("name"), json!("quantity")],
            vec![json!("AAPL"), json!("10")],
        ];
        assert!(parse_rows(&values, "symbol", "quantity").is_empty());
    }

    #[test]
    fn test_parse_rows_empty_payload() {
        assert!(parse_rows(&[], "symbol", "quantity").is_empty());
    }

    #[test]
    fn test_load_holdings_csv() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("holdings.csv");
        std::fs::write(&path, "symbol,quantity\nAAPL,10\n7203,100\nVTI,2.5\n").unwrap();

        let holdings = load_holdings_csv(&path).unwrap();
        assert_eq!(holdings.len(), 3);
        assert_eq!(holdings[1].symbol, "7203.T");
        assert_eq!(holdings[2].quantity, dec!(2.5));
    }

    #[test]
    fn test_load_holdings_csv_missing_file() {
        assert!(load_holdings_csv(Path::new("/nonexistent/holdings.csv")).is_err());
    }
}
