//! Portfolio analysis engine
//!
//! Pure, deterministic pipeline from a point-in-time snapshot (holdings +
//! quotes + total value) to weighted metrics, a diversification assessment
//! and a risk score. No I/O; invoking it twice with the same snapshot
//! yields identical output.

use std::collections::HashMap;

use itertools::Itertools;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, MathematicalOps};
use serde::{Deserialize, Serialize};

pub mod report;

/// Number of positions counted toward the concentration figure
const TOP_HOLDINGS: usize = 5;

/// A top-5 concentration at or above this weight (in percent) flags the
/// portfolio as insufficiently diversified
const DIVERSIFICATION_LIMIT_PCT: i64 = 60;

/// Absolute daily change (percentage points) above which a holding counts
/// as high-volatility
const HIGH_VOLATILITY_CUTOFF_PCT: i64 = 5;

fn default_currency() -> String {
    "USD".to_string()
}

/// One security position as read from the holdings source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingRecord {
    pub symbol: String,
    /// Non-negative; fractional quantities are allowed
    pub quantity: Decimal,
}

/// Latest price and daily change data for a symbol
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteRecord {
    pub current_price: Decimal,
    pub change_percent: Decimal,
    pub company_name: String,
    #[serde(default = "default_currency")]
    pub currency: String,
}

/// Input to the engine: holdings, quotes keyed by symbol, and the total
/// portfolio value. Holdings without a matching quote are excluded from
/// all downstream computation; a total value of zero degrades weights to
/// zero instead of dividing by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioSnapshot {
    pub holdings: Vec<HoldingRecord>,
    pub quotes: HashMap<String, QuoteRecord>,
    pub total_value: Decimal,
}

impl PortfolioSnapshot {
    /// Build a snapshot deriving the total from the quoted holdings
    pub fn with_derived_total(
        holdings: Vec<HoldingRecord>,
        quotes: HashMap<String, QuoteRecord>,
    ) -> Self {
        let total_value = holdings
            .iter()
            .filter_map(|h| quotes.get(&h.symbol).map(|q| q.current_price * h.quantity))
            .sum();
        Self {
            holdings,
            quotes,
            total_value,
        }
    }
}

/// Per-holding derived metrics; exists only for holdings with a quote
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HoldingAnalysis {
    pub symbol: String,
    pub company_name: String,
    pub quantity: Decimal,
    pub current_price: Decimal,
    pub holding_value: Decimal,
    /// Percent of total portfolio value; 0 when the total is not positive
    pub portfolio_weight: Decimal,
    pub daily_change_percent: Decimal,
    pub daily_pnl: Decimal,
}

/// Concentration and weight distribution across holdings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DistributionSummary {
    /// Largest positions by weight, descending, at most five
    pub top_holdings: Vec<HoldingAnalysis>,
    pub concentration_top5: Decimal,
    pub is_diversified: bool,
    pub average_weight: Decimal,
}

/// Aggregate daily performance over the quoted holdings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub daily_pnl: Decimal,
    pub daily_return_percent: Decimal,
    pub weighted_return: Decimal,
    pub winners: usize,
    pub losers: usize,
    pub win_rate: Decimal,
}

/// Categorical risk level derived from cross-sectional volatility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    fn from_volatility(volatility: Decimal) -> Self {
        if volatility > Decimal::from(3) {
            RiskLevel::High
        } else if volatility > Decimal::new(15, 1) {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// Volatility and loss characteristics of the current holdings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Unbiased sample standard deviation of daily changes; 0 for fewer
    /// than two holdings
    pub portfolio_volatility: Decimal,
    pub max_daily_loss: Decimal,
    pub high_volatility_holdings: usize,
    pub risk_level: RiskLevel,
    /// Heuristic 1..=10 rescaling of volatility, floor(volatility * 2)
    /// clamped; not a validated risk metric
    pub risk_score: u8,
}

/// Top-level analysis output, constructed fresh on every invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioAnalysis {
    pub total_value: Decimal,
    /// Count of holdings with a resolvable quote, not the raw input count
    pub holding_count: usize,
    pub holdings: Vec<HoldingAnalysis>,
    pub distribution: DistributionSummary,
    pub performance: PerformanceSummary,
    pub risk: RiskAssessment,
}

/// Run the full analysis pipeline over a snapshot.
///
/// Total over its input domain: an empty snapshot yields a record with
/// empty summaries, never an error.
pub fn analyze(snapshot: &PortfolioSnapshot) -> PortfolioAnalysis {
    let holdings = enrich_holdings(snapshot);

    PortfolioAnalysis {
        total_value: snapshot.total_value,
        holding_count: holdings.len(),
        distribution: distribution_summary(&holdings),
        performance: performance_summary(&holdings),
        risk: risk_assessment(&holdings),
        holdings,
    }
}

/// Join each holding with its quote and derive value, weight and P&L.
/// Holdings without a quote are skipped; that is an expected condition,
/// not a failure.
fn enrich_holdings(snapshot: &PortfolioSnapshot) -> Vec<HoldingAnalysis> {
    snapshot
        .holdings
        .iter()
        .filter_map(|holding| {
            let quote = snapshot.quotes.get(&holding.symbol)?;
            let holding_value = quote.current_price * holding.quantity;
            let portfolio_weight = if snapshot.total_value > Decimal::ZERO {
                holding_value / snapshot.total_value * Decimal::ONE_HUNDRED
            } else {
                Decimal::ZERO
            };

            Some(HoldingAnalysis {
                symbol: holding.symbol.clone(),
                company_name: quote.company_name.clone(),
                quantity: holding.quantity,
                current_price: quote.current_price,
                holding_value,
                portfolio_weight,
                daily_change_percent: quote.change_percent,
                daily_pnl: holding_value * quote.change_percent / Decimal::ONE_HUNDRED,
            })
        })
        .collect()
}

fn distribution_summary(holdings: &[HoldingAnalysis]) -> DistributionSummary {
    if holdings.is_empty() {
        return DistributionSummary::default();
    }

    // Stable sort: equal weights keep their input order
    let top_holdings: Vec<HoldingAnalysis> = holdings
        .iter()
        .cloned()
        .sorted_by(|a, b| b.portfolio_weight.cmp(&a.portfolio_weight))
        .take(TOP_HOLDINGS)
        .collect();

    let concentration_top5: Decimal = top_holdings.iter().map(|h| h.portfolio_weight).sum();
    let average_weight = holdings.iter().map(|h| h.portfolio_weight).sum::<Decimal>()
        / Decimal::from(holdings.len());

    DistributionSummary {
        top_holdings,
        concentration_top5,
        is_diversified: concentration_top5 < Decimal::from(DIVERSIFICATION_LIMIT_PCT),
        average_weight,
    }
}

fn performance_summary(holdings: &[HoldingAnalysis]) -> PerformanceSummary {
    if holdings.is_empty() {
        return PerformanceSummary::default();
    }

    let daily_pnl: Decimal = holdings.iter().map(|h| h.daily_pnl).sum();
    let invested: Decimal = holdings.iter().map(|h| h.holding_value).sum();

    let daily_return_percent = if invested > Decimal::ZERO {
        daily_pnl / invested * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    let weighted_return: Decimal = holdings
        .iter()
        .map(|h| h.portfolio_weight / Decimal::ONE_HUNDRED * h.daily_change_percent)
        .sum();

    // Zero-change holdings count toward neither side
    let winners = holdings
        .iter()
        .filter(|h| h.daily_change_percent > Decimal::ZERO)
        .count();
    let losers = holdings
        .iter()
        .filter(|h| h.daily_change_percent < Decimal::ZERO)
        .count();

    let win_rate = Decimal::from(winners) / Decimal::from(holdings.len()) * Decimal::ONE_HUNDRED;

    PerformanceSummary {
        daily_pnl,
        daily_return_percent,
        weighted_return,
        winners,
        losers,
        win_rate,
    }
}

fn risk_assessment(holdings: &[HoldingAnalysis]) -> RiskAssessment {
    if holdings.is_empty() {
        return RiskAssessment::default();
    }

    let changes: Vec<Decimal> = holdings.iter().map(|h| h.daily_change_percent).collect();
    let volatility = sample_std_dev(&changes);
    let max_daily_loss = changes.iter().copied().min().unwrap_or(Decimal::ZERO);
    let high_volatility_holdings = changes
        .iter()
        .filter(|c| c.abs() > Decimal::from(HIGH_VOLATILITY_CUTOFF_PCT))
        .count();

    RiskAssessment {
        portfolio_volatility: volatility,
        max_daily_loss,
        high_volatility_holdings,
        risk_level: RiskLevel::from_volatility(volatility),
        risk_score: risk_score(volatility),
    }
}

/// Unbiased (n-1) sample standard deviation; 0 for fewer than two samples
fn sample_std_dev(samples: &[Decimal]) -> Decimal {
    if samples.len() < 2 {
        return Decimal::ZERO;
    }

    let n = Decimal::from(samples.len());
    let mean = samples.iter().copied().sum::<Decimal>() / n;
    let sum_sq: Decimal = samples
        .iter()
        .map(|s| {
            let d = *s - mean;
            d * d
        })
        .sum();
    let variance = sum_sq / (n - Decimal::ONE);

    variance.sqrt().unwrap_or(Decimal::ZERO)
}

/// Coarse 1..=10 rescaling of volatility: floor(volatility * 2) clamped
/// into range. A display heuristic, not a validated risk metric.
fn risk_score(volatility: Decimal) -> u8 {
    (volatility * Decimal::TWO)
        .floor()
        .to_i64()
        .unwrap_or(i64::MAX)
        .clamp(1, 10) as u8
}
