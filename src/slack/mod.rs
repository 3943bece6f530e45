//! Slack delivery
//!
//! Posts the analysis report and the AI narrative to a Slack channel via
//! the Web API. Payload building and the portfolio summary are pure
//! functions; only the `SlackNotifier` methods touch the network.

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::analysis::{HoldingRecord, QuoteRecord};
use crate::config::SlackSettings;
use crate::error::FolioError;
use crate::quotes::SnapshotTotals;
use crate::utils::{format_amount, format_money, format_signed_percent};

const SLACK_API_BASE_URL: &str = "https://slack.com/api";

/// Report cadence; selects the delivery header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionKind {
    Daily,
    Monthly,
}

impl ExecutionKind {
    fn emoji(&self) -> &'static str {
        match self {
            ExecutionKind::Daily => "📅",
            ExecutionKind::Monthly => "📆",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ExecutionKind::Daily => "Daily",
            ExecutionKind::Monthly => "Monthly",
        }
    }
}

#[derive(Debug, Deserialize)]
struct SlackResponse {
    ok: bool,
    error: Option<String>,
    user: Option<String>,
    ts: Option<String>,
}

pub struct SlackNotifier {
    client: Client,
    settings: SlackSettings,
}

impl SlackNotifier {
    pub fn new(settings: SlackSettings) -> Self {
        Self {
            client: Client::new(),
            settings,
        }
    }

    /// Verify the token and report the bot identity
    pub async fn auth_test(&self) -> Result<String> {
        let data = self.call("auth.test", json!({})).await?;
        let user = data.user.unwrap_or_default();
        info!("Slack bot connected as {}", user);
        Ok(user)
    }

    /// Post the report message with Block Kit blocks
    pub async fn send_report(
        &self,
        summary: &str,
        report: &str,
        execution: ExecutionKind,
    ) -> Result<()> {
        let blocks = build_report_blocks(summary, report, execution);
        let data = self
            .call(
                "chat.postMessage",
                json!({
                    "channel": self.settings.channel,
                    "text": "📊 Investment advice report",
                    "blocks": blocks,
                }),
            )
            .await?;
        info!(
            "Slack report delivered: {}",
            data.ts.unwrap_or_default()
        );
        Ok(())
    }

    /// Post a plain-text message to the configured channel
    pub async fn send_message(&self, text: &str) -> Result<()> {
        self.call(
            "chat.postMessage",
            json!({
                "channel": self.settings.channel,
                "text": text,
            }),
        )
        .await?;
        Ok(())
    }

    async fn call(&self, method: &str, body: Value) -> Result<SlackResponse> {
        let response = self
            .client
            .post(format!("{}/{}", SLACK_API_BASE_URL, method))
            .bearer_auth(&self.settings.bot_token)
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to call Slack {}", method))?;

        let data: SlackResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to parse Slack {} response", method))?;

        if !data.ok {
            return Err(FolioError::Delivery(format!(
                "Slack {} failed: {}",
                method,
                data.error.unwrap_or_else(|| "unknown error".to_string())
            ))
            .into());
        }

        Ok(data)
    }
}

/// Block Kit payload for the report message: header, summary section,
/// report section, and a context hint
pub fn build_report_blocks(summary: &str, report: &str, execution: ExecutionKind) -> Value {
    json!([
        {
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": format!("{} {} investment advice report", execution.emoji(), execution.label())
            }
        },
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*Portfolio summary*\n```{}```", summary)
            }
        },
        {
            "type": "section",
            "text": {
                "type": "mrkdwn",
                "text": format!("*Analysis report*\n```{}```", report)
            }
        },
        {
            "type": "context",
            "elements": [
                {
                    "type": "mrkdwn",
                    "text": "💡 Generated automatically from the holdings spreadsheet"
                }
            ]
        }
    ])
}

/// Per-holding summary in native currencies, with a yen conversion for
/// dollar-denominated positions. Holdings without a quote are omitted.
pub fn format_portfolio_summary(
    holdings: &[HoldingRecord],
    native_quotes: &HashMap<String, QuoteRecord>,
    totals: &SnapshotTotals,
) -> String {
    let mut summary = format!(
        "💰 Total value: {}\n　(US holdings: {})\n💱 USD/JPY: {:.2}\n📈 Holdings: {}\n\n",
        format_amount(totals.total_jpy_converted, 0, "¥"),
        format_amount(totals.total_usd, 2, "$"),
        totals.usd_jpy_rate,
        holdings.len(),
    );

    for holding in holdings {
        let Some(quote) = native_quotes.get(&holding.symbol) else {
            continue;
        };

        let emoji = if quote.change_percent > Decimal::ZERO {
            "📈"
        } else if quote.change_percent < Decimal::ZERO {
            "📉"
        } else {
            "➡️"
        };

        summary.push_str(&format!(
            "{} {} ({}): {} shares\n",
            emoji, quote.company_name, holding.symbol, holding.quantity
        ));

        if quote.currency == "JPY" {
            summary.push_str(&format!(
                "   {} ({})\n",
                format_money(quote.current_price, "JPY"),
                format_signed_percent(quote.change_percent),
            ));
        } else {
            summary.push_str(&format!(
                "   {} ({}) ({})\n",
                format_money(quote.current_price, &quote.currency),
                format_amount(quote.current_price * totals.usd_jpy_rate, 0, "¥"),
                format_signed_percent(quote.change_percent),
            ));
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn totals() -> SnapshotTotals {
        SnapshotTotals {
            total_usd: dec!(1500.00),
            total_jpy: dec!(300000),
            total_jpy_converted: dec!(525000),
            usd_jpy_rate: dec!(150),
        }
    }

    fn sample_inputs() -> (Vec<HoldingRecord>, HashMap<String, QuoteRecord>) {
        let holdings = vec![
            HoldingRecord {
                symbol: "AAPL".to_string(),
                quantity: dec!(10),
            },
            HoldingRecord {
                symbol: "7203.T".to_string(),
                quantity: dec!(100),
            },
            HoldingRecord {
                symbol: "GHOST".to_string(),
                quantity: dec!(5),
            },
        ];

        let mut quotes = HashMap::new();
        quotes.insert(
            "AAPL".to_string(),
            QuoteRecord {
                current_price: dec!(150.00),
                change_percent: dec!(1.35),
                company_name: "Apple Inc.".to_string(),
                currency: "USD".to_string(),
            },
        );
        quotes.insert(
            "7203.T".to_string(),
            QuoteRecord {
                current_price: dec!(3000),
                change_percent: dec!(-0.80),
                company_name: "Toyota Motor Corporation".to_string(),
                currency: "JPY".to_string(),
            },
        );

        (holdings, quotes)
    }

    #[test]
    fn test_summary_totals_and_rate() {
        let (holdings, quotes) = sample_inputs();
        let summary = format_portfolio_summary(&holdings, &quotes, &totals());

        assert!(summary.contains("💰 Total value: ¥525,000"));
        assert!(summary.contains("(US holdings: $1,500.00)"));
        assert!(summary.contains("💱 USD/JPY: 150.00"));
        assert!(summary.contains("📈 Holdings: 3"));
    }

    #[test]
    fn test_summary_lists_native_prices_with_conversion() {
        let (holdings, quotes) = sample_inputs();
        let summary = format_portfolio_summary(&holdings, &quotes, &totals());

        // USD holding shows the yen conversion alongside
        assert!(summary.contains("📈 Apple Inc. (AAPL): 10 shares"));
        assert!(summary.contains("$150.00 (¥22,500) (+1.35%)"));
        // JPY holding shows yen only
        assert!(summary.contains("📉 Toyota Motor Corporation (7203.T): 100 shares"));
        assert!(summary.contains("¥3,000 (-0.80%)"));
        // Unquoted holding is omitted from the listing
        assert!(!summary.contains("GHOST"));
    }

    #[test]
    fn test_report_blocks_structure() {
        let blocks = build_report_blocks("SUMMARY", "REPORT", ExecutionKind::Daily);
        let blocks = blocks.as_array().unwrap();

        assert_eq!(blocks.len(), 4);
        assert_eq!(blocks[0]["type"], "header");
        assert!(blocks[0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("Daily investment advice report"));
        assert!(blocks[1]["text"]["text"].as_str().unwrap().contains("SUMMARY"));
        assert!(blocks[2]["text"]["text"].as_str().unwrap().contains("REPORT"));
        assert_eq!(blocks[3]["type"], "context");
    }

    #[test]
    fn test_monthly_header() {
        let blocks = build_report_blocks("", "", ExecutionKind::Monthly);
        assert!(blocks[0]["text"]["text"]
            .as_str()
            .unwrap()
            .contains("📆 Monthly investment advice report"));
    }
}
