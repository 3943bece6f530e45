//! Integration tests for the folio pipeline
//!
//! These tests verify end-to-end functionality without touching the
//! network:
//! - CSV holdings loading with symbol normalization
//! - Snapshot assembly with currency conversion
//! - Analysis invariants over assembled snapshots
//! - Report rendering
//! - CLI surface

use std::collections::HashMap;

use anyhow::Result;
use assert_cmd::Command;
use chrono::{Local, TimeZone};
use folio::analysis::report::render_report_at;
use folio::analysis::{analyze, HoldingRecord, PortfolioSnapshot, QuoteRecord};
use folio::quotes::assemble_snapshot;
use folio::sheets::load_holdings_csv;
use predicates::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn quote(price: Decimal, change: Decimal, name: &str, currency: &str) -> QuoteRecord {
    QuoteRecord {
        current_price: price,
        change_percent: change,
        company_name: name.to_string(),
        currency: currency.to_string(),
    }
}

fn holding(symbol: &str, quantity: Decimal) -> HoldingRecord {
    HoldingRecord {
        symbol: symbol.to_string(),
        quantity,
    }
}

/// Test helper: write a holdings CSV into a temp dir
fn write_holdings_csv(content: &str) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("holdings.csv");
    std::fs::write(&path, content)?;
    Ok((dir, path))
}

#[test]
fn test_csv_to_report_end_to_end() -> Result<()> {
    let (_dir, path) = write_holdings_csv("symbol,quantity\nAAPL,10\nGOOGL,5\n7203,100\n")?;
    let holdings = load_holdings_csv(&path)?;
    assert_eq!(holdings.len(), 3);
    assert_eq!(holdings[2].symbol, "7203.T");

    let mut quotes = HashMap::new();
    quotes.insert(
        "AAPL".to_string(),
        quote(dec!(150.00), dec!(1.35), "Apple Inc.", "USD"),
    );
    quotes.insert(
        "GOOGL".to_string(),
        quote(dec!(2800.00), dec!(1.82), "Alphabet Inc.", "USD"),
    );
    quotes.insert(
        "7203.T".to_string(),
        quote(dec!(3000), dec!(-0.80), "Toyota Motor Corporation", "JPY"),
    );

    let market = assemble_snapshot(holdings, quotes, dec!(150));

    // USD total 15,500 plus 300,000 yen converted at 150
    assert_eq!(market.snapshot.total_value, dec!(17500));
    assert_eq!(market.totals.total_usd, dec!(15500));
    assert_eq!(market.totals.total_jpy, dec!(300000));

    let analysis = analyze(&market.snapshot);
    assert_eq!(analysis.holding_count, 3);

    let weight_sum: Decimal = analysis.holdings.iter().map(|h| h.portfolio_weight).sum();
    assert!((weight_sum - dec!(100)).abs() < dec!(0.0001));

    let generated_at = Local.with_ymd_and_hms(2025, 6, 2, 9, 30, 0).unwrap();
    let report = render_report_at(&analysis, generated_at);
    assert!(report.contains("Apple Inc."));
    assert!(report.contains("Toyota Motor Corporation"));
    assert!(report.contains("Holdings: 3"));

    Ok(())
}

#[test]
fn test_reference_portfolio_metrics() {
    let mut quotes = HashMap::new();
    quotes.insert(
        "AAPL".to_string(),
        quote(dec!(150.00), dec!(1.35), "Apple Inc.", "USD"),
    );
    quotes.insert(
        "GOOGL".to_string(),
        quote(dec!(2800.00), dec!(1.82), "Alphabet Inc.", "USD"),
    );
    let snapshot = PortfolioSnapshot {
        holdings: vec![holding("AAPL", dec!(10)), holding("GOOGL", dec!(5))],
        quotes,
        total_value: dec!(15500.00),
    };

    let analysis = analyze(&snapshot);

    assert_eq!(analysis.holding_count, 2);
    assert!((analysis.holdings[0].portfolio_weight - dec!(9.677)).abs() < dec!(0.001));
    assert!((analysis.holdings[1].portfolio_weight - dec!(90.323)).abs() < dec!(0.001));
    assert!((analysis.distribution.concentration_top5 - dec!(100)).abs() < dec!(0.0001));
    assert!(!analysis.distribution.is_diversified);
    assert_eq!(analysis.performance.winners, 2);
    assert_eq!(analysis.performance.losers, 0);
    assert_eq!(analysis.performance.win_rate, dec!(100));
}

#[test]
fn test_unquoted_holding_degrades_gracefully() {
    let snapshot = PortfolioSnapshot {
        holdings: vec![holding("UNLISTED", dec!(42))],
        quotes: HashMap::new(),
        total_value: Decimal::ZERO,
    };

    let analysis = analyze(&snapshot);
    assert_eq!(analysis.holding_count, 0);
    assert!(analysis.holdings.is_empty());
    assert!(analysis.distribution.top_holdings.is_empty());
    assert_eq!(analysis.performance.daily_pnl, Decimal::ZERO);
    assert_eq!(analysis.risk.portfolio_volatility, Decimal::ZERO);
}

#[test]
fn test_analysis_invariants_hold() {
    let mut quotes = HashMap::new();
    quotes.insert("A".to_string(), quote(dec!(10), dec!(2.1), "A Corp", "USD"));
    quotes.insert("B".to_string(), quote(dec!(25), dec!(-3.4), "B Corp", "USD"));
    quotes.insert("C".to_string(), quote(dec!(7), dec!(0), "C Corp", "USD"));
    quotes.insert("D".to_string(), quote(dec!(90), dec!(6.2), "D Corp", "USD"));
    quotes.insert("E".to_string(), quote(dec!(15), dec!(-5.5), "E Corp", "USD"));
    quotes.insert("F".to_string(), quote(dec!(31), dec!(1.1), "F Corp", "USD"));
    let holdings = vec![
        holding("A", dec!(12)),
        holding("B", dec!(4)),
        holding("C", dec!(50)),
        holding("D", dec!(2)),
        holding("E", dec!(9)),
        holding("F", dec!(3)),
    ];
    let snapshot = PortfolioSnapshot::with_derived_total(holdings, quotes);

    let analysis = analyze(&snapshot);
    let dist = &analysis.distribution;
    let perf = &analysis.performance;

    let max_weight = analysis
        .holdings
        .iter()
        .map(|h| h.portfolio_weight)
        .max()
        .unwrap();
    assert!(dist.concentration_top5 >= max_weight);
    assert!(dist.concentration_top5 <= dec!(100.0001));
    assert_eq!(dist.is_diversified, dist.concentration_top5 < dec!(60));
    assert_eq!(dist.top_holdings.len(), 5);

    // One zero-change holding, so winners + losers stays below the count
    assert_eq!(perf.winners + perf.losers, 5);
    assert!(perf.winners + perf.losers <= analysis.holding_count);

    // |6.2| and |-5.5| exceed the 5-point cutoff
    assert_eq!(analysis.risk.high_volatility_holdings, 2);
    assert_eq!(analysis.risk.max_daily_loss, dec!(-5.5));
}

#[test]
fn test_structured_analysis_is_bit_identical_across_runs() {
    let mut quotes = HashMap::new();
    quotes.insert("A".to_string(), quote(dec!(10), dec!(2.1), "A Corp", "USD"));
    quotes.insert("B".to_string(), quote(dec!(25), dec!(-3.4), "B Corp", "USD"));
    let snapshot = PortfolioSnapshot::with_derived_total(
        vec![holding("A", dec!(1)), holding("B", dec!(2))],
        quotes,
    );

    let first = analyze(&snapshot);
    let second = analyze(&snapshot);
    assert_eq!(first, second);

    // No timestamp leaks into the structured record
    let first_json = serde_json::to_string(&first).unwrap();
    let second_json = serde_json::to_string(&second).unwrap();
    assert_eq!(first_json, second_json);
}

#[test]
fn test_cli_help_lists_subcommands() {
    Command::cargo_bin("folio")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("report"))
        .stdout(predicate::str::contains("holdings"))
        .stdout(predicate::str::contains("quotes"));
}

#[test]
fn test_cli_holdings_from_csv() -> Result<()> {
    let (_dir, path) = write_holdings_csv("symbol,quantity\nAAPL,10\n7203,100\n")?;
    let config_dir = tempfile::tempdir()?;

    Command::cargo_bin("folio")
        .unwrap()
        .env("XDG_CONFIG_HOME", config_dir.path())
        .args(["holdings", "--no-color", "--holdings-csv"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("AAPL"))
        .stdout(predicate::str::contains("7203.T"));

    Ok(())
}

#[test]
fn test_cli_names_missing_settings() -> Result<()> {
    let config_dir = tempfile::tempdir()?;

    Command::cargo_bin("folio")
        .unwrap()
        .env("XDG_CONFIG_HOME", config_dir.path())
        .env_remove("SPREADSHEET_ID")
        .env_remove("GOOGLE_SHEETS_API_KEY")
        .arg("holdings")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing holdings source settings"));

    Ok(())
}
