//! Output formatting module for CLI display
//!
//! This module handles all terminal output formatting, separating
//! the concerns of data calculation from presentation.

use colored::Colorize;
use rust_decimal::Decimal;
use tabled::{
    settings::{object::Columns, Alignment, Style},
    Table, Tabled,
};

use crate::analysis::{HoldingRecord, PortfolioAnalysis, QuoteRecord};
use crate::utils::{format_currency, format_money, format_percent, format_signed_percent};

/// Color a signed percent by its direction
fn colorize_change(change: Decimal) -> String {
    let text = format_signed_percent(change);
    if change > Decimal::ZERO {
        text.green().to_string()
    } else if change < Decimal::ZERO {
        text.red().to_string()
    } else {
        text
    }
}

/// Terminal table of the analyzed holdings plus a totals line
pub fn format_holdings_table(analysis: &PortfolioAnalysis) -> String {
    #[derive(Tabled)]
    struct HoldingRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Weight")]
        weight: String,
        #[tabled(rename = "Change")]
        change: String,
        #[tabled(rename = "Daily P&L")]
        pnl: String,
    }

    let mut output = format!("\n{} Portfolio\n\n", "📊".cyan().bold());

    if analysis.holdings.is_empty() {
        output.push_str("No holdings with available quotes.\n");
        return output;
    }

    let rows: Vec<HoldingRow> = analysis
        .holdings
        .iter()
        .map(|h| HoldingRow {
            symbol: h.symbol.clone(),
            name: h.company_name.clone(),
            quantity: h.quantity.to_string(),
            price: format_currency(h.current_price),
            value: format_currency(h.holding_value),
            weight: format_percent(h.portfolio_weight, 1),
            change: colorize_change(h.daily_change_percent),
            pnl: format_currency(h.daily_pnl),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..), Alignment::right());

    output.push_str(&table.to_string());
    output.push_str(&format!(
        "\n\nTotal value: {}   Daily P&L: {}   Risk: {} ({}/10)\n",
        format_currency(analysis.total_value),
        format_currency(analysis.performance.daily_pnl),
        analysis.risk.risk_level.as_str(),
        analysis.risk.risk_score,
    ));

    output
}

/// Terminal table for the `quotes` subcommand
pub fn format_quotes_table(quotes: &[(String, QuoteRecord)]) -> String {
    #[derive(Tabled)]
    struct QuoteRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Name")]
        name: String,
        #[tabled(rename = "Price")]
        price: String,
        #[tabled(rename = "Change")]
        change: String,
        #[tabled(rename = "Currency")]
        currency: String,
    }

    if quotes.is_empty() {
        return "No quotes available.\n".to_string();
    }

    let rows: Vec<QuoteRow> = quotes
        .iter()
        .map(|(symbol, q)| QuoteRow {
            symbol: symbol.clone(),
            name: q.company_name.clone(),
            price: format_money(q.current_price, &q.currency),
            change: colorize_change(q.change_percent),
            currency: q.currency.clone(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(2..), Alignment::right());

    format!("{table}\n")
}

/// Plain holdings listing for the `holdings` subcommand
pub fn format_holdings_list(holdings: &[HoldingRecord]) -> String {
    #[derive(Tabled)]
    struct HoldingListRow {
        #[tabled(rename = "Symbol")]
        symbol: String,
        #[tabled(rename = "Quantity")]
        quantity: String,
    }

    if holdings.is_empty() {
        return "No holdings found.\n".to_string();
    }

    let rows: Vec<HoldingListRow> = holdings
        .iter()
        .map(|h| HoldingListRow {
            symbol: h.symbol.clone(),
            quantity: h.quantity.to_string(),
        })
        .collect();

    let mut table = Table::new(&rows);
    table.with(Style::modern());
    table.modify(Columns::new(1..), Alignment::right());

    format!("{} holdings\n\n{}\n", holdings.len(), table)
}
