//! Textual report rendering for a portfolio analysis
//!
//! Pure formatting: all numbers come out of the analysis record as-is.
//! The generation timestamp is injected by the caller so the structured
//! analysis itself stays free of wall-clock state.

use chrono::{DateTime, Local};

use crate::analysis::PortfolioAnalysis;
use crate::utils::{format_currency, format_percent, format_signed_percent};

/// Render the multi-section analysis report with the current time as the
/// generation timestamp.
pub fn render_report(analysis: &PortfolioAnalysis) -> String {
    render_report_at(analysis, Local::now())
}

/// Render the report with an explicit generation timestamp.
pub fn render_report_at(analysis: &PortfolioAnalysis, generated_at: DateTime<Local>) -> String {
    if analysis.holdings.is_empty() {
        return "No portfolio data available.".to_string();
    }

    let perf = &analysis.performance;
    let risk = &analysis.risk;
    let dist = &analysis.distribution;

    let mut report = format!(
        "\
=== Portfolio Analysis Report ===
Generated: {generated}

[Overview]
Total portfolio value: {total}
Holdings: {count}

[Performance]
Daily P&L: {pnl}
Daily return: {ret}
Winners: {winners}
Losers: {losers}
Win rate: {win_rate}

[Risk]
Risk level: {risk_level}
Portfolio volatility: {volatility}
Max daily loss: {max_loss}
High-volatility holdings: {high_vol}
Risk score: {score}/10

[Distribution]
Top-5 concentration: {concentration}
Average weight: {avg_weight}
Diversification: {diversification}

[Top Holdings]
",
        generated = generated_at.format("%Y-%m-%d %H:%M:%S"),
        total = format_currency(analysis.total_value),
        count = analysis.holding_count,
        pnl = format_currency(perf.daily_pnl),
        ret = format_signed_percent(perf.daily_return_percent),
        winners = perf.winners,
        losers = perf.losers,
        win_rate = format_percent(perf.win_rate, 2),
        risk_level = risk.risk_level.as_str(),
        volatility = format_percent(risk.portfolio_volatility, 2),
        max_loss = format_signed_percent(risk.max_daily_loss),
        high_vol = risk.high_volatility_holdings,
        score = risk.risk_score,
        concentration = format_percent(dist.concentration_top5, 2),
        avg_weight = format_percent(dist.average_weight, 2),
        diversification = if dist.is_diversified {
            "good"
        } else {
            "needs improvement"
        },
    );

    for (rank, holding) in dist.top_holdings.iter().enumerate() {
        report.push_str(&format!(
            "{}. {} ({}): {}\n",
            rank + 1,
            holding.company_name,
            holding.symbol,
            format_percent(holding.portfolio_weight, 2),
        ));
    }

    report
}
