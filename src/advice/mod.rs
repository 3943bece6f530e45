//! AI narrative generator
//!
//! Builds a compact digest of the analysis and asks the Gemini API for
//! an investment-advice narrative. Failures here are never fatal to a
//! run: the caller logs them and delivers the report without a
//! narrative.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::analysis::PortfolioAnalysis;
use crate::config::GeminiSettings;
use crate::utils::{format_currency, format_percent, format_signed_percent};

const GEMINI_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Deserialize)]
struct ContentPart {
    text: Option<String>,
}

/// Compact textual digest of the analysis, fed to the model as context
pub fn build_digest(analysis: &PortfolioAnalysis) -> String {
    let mut digest = format!(
        "Total portfolio value: {}\nHoldings: {}\nDaily return: {}\nRisk level: {} (volatility {})\nTop-5 concentration: {}\n\nPositions:\n",
        format_currency(analysis.total_value),
        analysis.holding_count,
        format_signed_percent(analysis.performance.daily_return_percent),
        analysis.risk.risk_level.as_str(),
        format_percent(analysis.risk.portfolio_volatility, 2),
        format_percent(analysis.distribution.concentration_top5, 1),
    );

    for holding in &analysis.holdings {
        digest.push_str(&format!(
            "- {} ({}): {} at {}, weight {}, daily {}\n",
            holding.company_name,
            holding.symbol,
            holding.quantity,
            format_currency(holding.current_price),
            format_percent(holding.portfolio_weight, 1),
            format_signed_percent(holding.daily_change_percent),
        ));
    }

    digest
}

fn build_prompt(digest: &str) -> String {
    format!(
        "You are an investment advisor. Based on the portfolio snapshot \
         below, give concise, practical advice: comment on diversification, \
         concentration and daily performance, and suggest at most three \
         concrete actions to consider. Do not give personalized financial \
         guarantees.\n\n{digest}"
    )
}

/// Ask Gemini for an advice narrative over the given analysis.
pub async fn generate_advice(
    settings: &GeminiSettings,
    analysis: &PortfolioAnalysis,
) -> Result<String> {
    info!("Requesting advice narrative from {}", settings.model);

    let client = Client::new();
    let url = format!(
        "{}/{}:generateContent",
        GEMINI_API_BASE_URL, settings.model
    );

    let body = json!({
        "contents": [{
            "parts": [{ "text": build_prompt(&build_digest(analysis)) }]
        }]
    });

    let response = client
        .post(&url)
        .query(&[("key", settings.api_key.as_str())])
        .json(&body)
        .send()
        .await
        .context("Failed to send request to the Gemini API")?;

    if !response.status().is_success() {
        return Err(anyhow::anyhow!(
            "Gemini API returned error status: {}",
            response.status()
        ));
    }

    let data: GenerateContentResponse = response
        .json()
        .await
        .context("Failed to parse Gemini response")?;

    let narrative: String = data
        .candidates
        .first()
        .and_then(|c| c.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|p| p.text.as_deref())
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if narrative.trim().is_empty() {
        return Err(anyhow::anyhow!("Gemini returned no narrative text"));
    }

    Ok(narrative)
}
