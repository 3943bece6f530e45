//! Market data source
//!
//! Fetches per-symbol quotes from the Yahoo Finance chart API, the
//! USD/JPY rate for currency conversion, and assembles the analysis
//! snapshot. Per-symbol failures are logged and skipped; the analysis
//! engine tolerates missing quotes by design.

use std::collections::HashMap;

use anyhow::{Context, Result};
use itertools::Itertools;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{info, warn};

use crate::analysis::{HoldingRecord, PortfolioSnapshot, QuoteRecord};
use crate::error::FolioError;
use crate::utils::{format_money, format_signed_percent};

const YAHOO_CHART_BASE_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const FX_SYMBOL: &str = "USDJPY=X";

/// Yahoo Finance chart API response
#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: String,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    meta: ChartMeta,
    indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
struct ChartMeta {
    #[serde(rename = "longName")]
    long_name: Option<String>,
    #[serde(rename = "shortName")]
    short_name: Option<String>,
    currency: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteIndicator>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteIndicator {
    #[serde(default)]
    close: Vec<Option<f64>>,
}

/// Native-currency subtotals and the rate used for conversion
#[derive(Debug, Clone, PartialEq)]
pub struct SnapshotTotals {
    pub total_usd: Decimal,
    pub total_jpy: Decimal,
    /// Everything expressed in yen: JPY holdings at face value plus USD
    /// holdings converted at the USD/JPY rate
    pub total_jpy_converted: Decimal,
    pub usd_jpy_rate: Decimal,
}

/// Everything the downstream pipeline needs: the currency-normalized
/// engine snapshot, display-oriented totals, and the quotes in their
/// native currencies for per-holding display
#[derive(Debug, Clone)]
pub struct MarketData {
    pub snapshot: PortfolioSnapshot,
    pub totals: SnapshotTotals,
    pub native_quotes: HashMap<String, QuoteRecord>,
}

fn quote_client() -> Result<Client> {
    Client::builder()
        .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
        .build()
        .context("Failed to build HTTP client")
}

/// Fetch a single symbol's quote: last close, daily change, display name
/// and currency.
pub async fn fetch_quote(client: &Client, symbol: &str) -> Result<QuoteRecord> {
    let url = format!("{}/{}", YAHOO_CHART_BASE_URL, symbol);

    let response = client
        .get(&url)
        .query(&[("range", "5d"), ("interval", "1d")])
        .send()
        .await
        .with_context(|| format!("Failed to send quote request for {}", symbol))?;

    if !response.status().is_success() {
        return Err(FolioError::Quote(format!(
            "quote API returned error status {} for {}",
            response.status(),
            symbol
        ))
        .into());
    }

    let data: ChartResponse = response
        .json()
        .await
        .with_context(|| format!("Failed to parse quote response for {}", symbol))?;

    if let Some(error) = data.chart.error {
        return Err(FolioError::Quote(format!(
            "quote API error for {}: {} - {}",
            symbol, error.code, error.description
        ))
        .into());
    }

    let result = data
        .chart
        .result
        .and_then(|r| r.into_iter().next())
        .ok_or_else(|| FolioError::Quote(format!("no chart data returned for {}", symbol)))?;

    quote_from_result(&result, symbol)
}

/// Derive the quote from a chart result: current = last non-null close,
/// previous = the one before it (or current when only one exists).
fn quote_from_result(result: &ChartResult, symbol: &str) -> Result<QuoteRecord> {
    let closes: Vec<f64> = result
        .indicators
        .quote
        .first()
        .map(|q| q.close.iter().flatten().copied().collect())
        .unwrap_or_default();

    let (&current, previous) = match closes.split_last() {
        Some((last, rest)) => (last, rest.last().copied().unwrap_or(*last)),
        None => {
            return Err(FolioError::Quote(format!("no close prices for {}", symbol)).into());
        }
    };

    let current_price = Decimal::from_f64_retain(current)
        .ok_or_else(|| FolioError::Quote(format!("unrepresentable price for {}", symbol)))?;
    let previous_price = Decimal::from_f64_retain(previous)
        .ok_or_else(|| FolioError::Quote(format!("unrepresentable price for {}", symbol)))?;

    let change_percent = if previous_price != Decimal::ZERO {
        (current_price - previous_price) / previous_price * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let company_name = result
        .meta
        .long_name
        .clone()
        .or_else(|| result.meta.short_name.clone())
        .unwrap_or_else(|| symbol.to_string());

    Ok(QuoteRecord {
        current_price,
        change_percent,
        company_name,
        currency: result
            .meta
            .currency
            .clone()
            .unwrap_or_else(|| "USD".to_string()),
    })
}

/// Fetch quotes for all symbols, skipping the ones that fail. The result
/// may therefore be missing entries; downstream analysis handles that.
pub async fn fetch_quotes(client: &Client, symbols: &[String]) -> HashMap<String, QuoteRecord> {
    info!("Fetching quotes for {}", symbols.iter().join(", "));

    let mut quotes = HashMap::new();
    for symbol in symbols {
        match fetch_quote(client, symbol).await {
            Ok(quote) => {
                info!(
                    "{}: {} ({})",
                    symbol,
                    format_money(quote.current_price, &quote.currency),
                    format_signed_percent(quote.change_percent)
                );
                quotes.insert(symbol.clone(), quote);
            }
            Err(e) => warn!("Skipping {}: {:#}", symbol, e),
        }
    }

    quotes
}

/// USD/JPY rate from the FX chart; falls back to the configured fixed
/// rate when the fetch fails.
pub async fn fetch_usd_jpy_rate(client: &Client, fallback: Decimal) -> Decimal {
    match fetch_quote(client, FX_SYMBOL).await {
        Ok(quote) => {
            info!("USD/JPY rate: {:.2}", quote.current_price);
            quote.current_price
        }
        Err(e) => {
            warn!("Using fallback USD/JPY rate {}: {:#}", fallback, e);
            fallback
        }
    }
}

/// Convenience entry for ad-hoc symbol lookups (CLI `quotes` command)
pub async fn lookup_quotes(symbols: &[String]) -> Result<HashMap<String, QuoteRecord>> {
    let client = quote_client()?;
    Ok(fetch_quotes(&client, symbols).await)
}

/// Fetch everything the pipeline needs for the given holdings and build
/// the snapshot.
pub async fn load_market_data(
    holdings: Vec<HoldingRecord>,
    fallback_rate: Decimal,
) -> Result<MarketData> {
    let client = quote_client()?;

    let symbols: Vec<String> = holdings.iter().map(|h| h.symbol.clone()).collect();
    let native_quotes = fetch_quotes(&client, &symbols).await;
    let usd_jpy_rate = fetch_usd_jpy_rate(&client, fallback_rate).await;

    Ok(assemble_snapshot(holdings, native_quotes, usd_jpy_rate))
}

/// Assemble the engine snapshot from native quotes.
///
/// The engine is currency-agnostic and expects a single unit, so yen
/// prices are converted to dollars here; the totals keep the native
/// subtotals (and the yen-converted grand total) for display.
pub fn assemble_snapshot(
    holdings: Vec<HoldingRecord>,
    native_quotes: HashMap<String, QuoteRecord>,
    usd_jpy_rate: Decimal,
) -> MarketData {
    let mut total_usd = Decimal::ZERO;
    let mut total_jpy = Decimal::ZERO;

    for holding in &holdings {
        let Some(quote) = native_quotes.get(&holding.symbol) else {
            continue;
        };
        let value = quote.current_price * holding.quantity;
        if quote.currency == "JPY" {
            total_jpy += value;
        } else {
            // Non-JPY currencies are treated as USD, as the quote
            // provider reports US-listed assets
            total_usd += value;
        }
    }

    let normalized_quotes: HashMap<String, QuoteRecord> = native_quotes
        .iter()
        .map(|(symbol, quote)| {
            let mut normalized = quote.clone();
            if quote.currency == "JPY" {
                if usd_jpy_rate > Decimal::ZERO {
                    normalized.current_price = quote.current_price / usd_jpy_rate;
                    normalized.currency = "USD".to_string();
                } else {
                    warn!("Non-positive USD/JPY rate; leaving {} unconverted", symbol);
                }
            }
            (symbol.clone(), normalized)
        })
        .collect();

    let total_value_usd = if usd_jpy_rate > Decimal::ZERO {
        total_usd + total_jpy / usd_jpy_rate
    } else {
        total_usd
    };

    let totals = SnapshotTotals {
        total_usd,
        total_jpy,
        total_jpy_converted: total_jpy + total_usd * usd_jpy_rate,
        usd_jpy_rate,
    };

    MarketData {
        snapshot: PortfolioSnapshot {
            holdings,
            quotes: normalized_quotes,
            total_value: total_value_usd,
        },
        totals,
        native_quotes,
    }
}
