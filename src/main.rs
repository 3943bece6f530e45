use std::path::Path;

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use folio::analysis::report::render_report;
use folio::analysis::{analyze, HoldingRecord};
use folio::cli::{formatters, Cli, Commands};
use folio::config::Config;
use folio::slack::{format_portfolio_summary, ExecutionKind, SlackNotifier};
use folio::{advice, quotes, sheets};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let config = Config::load(cli.config.as_deref())?;
    let holdings_csv = cli.holdings_csv.clone();

    match cli.command {
        Commands::Run {
            execution,
            skip_notify,
        } => handle_run(holdings_csv.as_deref(), &config, execution.into(), skip_notify).await,

        Commands::Report => handle_report(holdings_csv.as_deref(), &config).await,

        Commands::Holdings => handle_holdings(holdings_csv.as_deref(), &config).await,

        Commands::Quotes { symbols } => handle_quotes(&symbols).await,
    }
}

/// Holdings come from the CSV fallback when given, otherwise from the
/// configured Google Sheets range
async fn load_holdings(csv: Option<&Path>, config: &Config) -> Result<Vec<HoldingRecord>> {
    match csv {
        Some(path) => sheets::load_holdings_csv(path),
        None => sheets::fetch_holdings(&config.require_sheets()?).await,
    }
}

/// Full pipeline: fetch, analyze, advise, deliver
async fn handle_run(
    csv: Option<&Path>,
    config: &Config,
    execution: ExecutionKind,
    skip_notify: bool,
) -> Result<()> {
    let holdings = load_holdings(csv, config).await?;
    if holdings.is_empty() {
        anyhow::bail!("holdings source returned no positions");
    }

    let market = quotes::load_market_data(holdings, config.fx.usd_jpy_fallback).await?;
    let analysis = analyze(&market.snapshot);
    let report = render_report(&analysis);
    println!("{report}");

    let narrative = match config.gemini_settings() {
        Some(settings) => match advice::generate_advice(&settings, &analysis).await {
            Ok(text) => {
                println!("\n=== AI Investment Advice ===\n{text}");
                Some(text)
            }
            Err(e) => {
                warn!("Advice generation failed, continuing without it: {:#}", e);
                None
            }
        },
        None => {
            info!("Gemini not configured; skipping narrative");
            None
        }
    };

    if skip_notify {
        info!("Slack delivery skipped (--skip-notify)");
        return Ok(());
    }

    match config.slack_settings() {
        Some(settings) => {
            let notifier = SlackNotifier::new(settings);
            notifier.auth_test().await?;

            let summary = format_portfolio_summary(
                &market.snapshot.holdings,
                &market.native_quotes,
                &market.totals,
            );
            notifier.send_report(&summary, &report, execution).await?;

            if let Some(text) = narrative {
                notifier
                    .send_message(&format!("🤖 *AI investment advice*\n```{text}```"))
                    .await?;
            }
        }
        None => info!("Slack not configured; skipping delivery"),
    }

    Ok(())
}

/// Fetch and analyze, print to the terminal only
async fn handle_report(csv: Option<&Path>, config: &Config) -> Result<()> {
    let holdings = load_holdings(csv, config).await?;
    let market = quotes::load_market_data(holdings, config.fx.usd_jpy_fallback).await?;
    let analysis = analyze(&market.snapshot);

    println!("{}", formatters::format_holdings_table(&analysis));
    println!("{}", render_report(&analysis));
    Ok(())
}

/// Show the parsed holdings list without fetching quotes
async fn handle_holdings(csv: Option<&Path>, config: &Config) -> Result<()> {
    let holdings = load_holdings(csv, config).await?;
    println!("{}", formatters::format_holdings_list(&holdings));
    Ok(())
}

/// Fetch and display quotes for ad-hoc symbols
async fn handle_quotes(symbols: &[String]) -> Result<()> {
    let quotes = quotes::lookup_quotes(symbols).await?;

    let listed: Vec<_> = symbols
        .iter()
        .filter_map(|s| quotes.get(s).map(|q| (s.clone(), q.clone())))
        .collect();

    println!("{}", formatters::format_quotes_table(&listed));
    Ok(())
}
