use core_types::TradeEmotion;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Whole-set descriptive statistics over a user's closed trades.
///
/// This struct is the output of `AnalyticsEngine::summarize` and the body of
/// the summary endpoint. Every numeric field is zero for an empty trade set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryReport {
    pub total_trades: usize,
    pub winning_trades: usize,
    /// Trades with `pnl <= 0`; break-even trades are counted here.
    pub losing_trades: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(rename = "averagePnL", with = "rust_decimal::serde::float")]
    pub average_pnl: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub best_trade: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub worst_trade: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_win: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub average_loss: Decimal,
}

impl SummaryReport {
    /// Creates a new, zeroed-out report.
    pub fn new() -> Self {
        Self {
            total_trades: 0,
            winning_trades: 0,
            losing_trades: 0,
            win_rate: Decimal::ZERO,
            total_pnl: Decimal::ZERO,
            average_pnl: Decimal::ZERO,
            best_trade: Decimal::ZERO,
            worst_trade: Decimal::ZERO,
            average_win: Decimal::ZERO,
            average_loss: Decimal::ZERO,
        }
    }
}

impl Default for SummaryReport {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmotionPerformance {
    pub emotion: TradeEmotion,
    pub trade_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(rename = "averagePnL", with = "rust_decimal::serde::float")]
    pub average_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyPerformance {
    pub strategy: String,
    pub trade_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(rename = "averagePnL", with = "rust_decimal::serde::float")]
    pub average_pnl: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPerformance {
    pub coin: String,
    pub trade_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
    #[serde(rename = "averagePnL", with = "rust_decimal::serde::float")]
    pub average_pnl: Decimal,
}

/// Performance of trades opened during one UTC hour of the day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HourPerformance {
    pub hour: u32,
    pub trade_count: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub win_rate: Decimal,
    #[serde(rename = "totalPnL", with = "rust_decimal::serde::float")]
    pub total_pnl: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsightKind {
    Warning,
    Tip,
    Achievement,
}

impl fmt::Display for InsightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsightKind::Warning => write!(f, "Warning"),
            InsightKind::Tip => write!(f, "Tip"),
            InsightKind::Achievement => write!(f, "Achievement"),
        }
    }
}

/// A short, rule-triggered observation about trading behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub title: String,
    pub message: String,
    pub emoji: Option<String>,
}

impl Insight {
    pub fn new(kind: InsightKind, title: impl Into<String>, message: impl Into<String>, emoji: &str) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            emoji: Some(emoji.to_string()),
        }
    }
}

/// Envelope of the insights endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightsReport {
    pub insights: Vec<Insight>,
}
