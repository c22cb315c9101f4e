//! # Trade Diary Analytics Engine
//!
//! This crate turns a user's journal of trades into the statistics and
//! behavioural feedback shown on the dashboard.
//!
//! ## Architectural Principles
//!
//! - **Pure Logic:** This crate has no knowledge of storage or HTTP. It depends
//!   only on `core-types` and works on plain slices of `Trade`.
//! - **Stateless Calculation:** The `AnalyticsEngine` holds no state. Every view
//!   is recomputed from its input, so results always reflect the current data.
//! - **Closed Trades Only:** Trades without an exit are skipped by every view.
//!   A trade with `pnl <= 0` counts as a loss everywhere.
//!
//! ## Public API
//!
//! - `AnalyticsEngine`: Entry point for the summary, breakdowns and insights.
//! - `SummaryReport`, `EmotionPerformance`, `StrategyPerformance`,
//!   `CoinPerformance`, `HourPerformance`: The report shapes.
//! - `Insight`, `InsightKind`, `InsightsReport`: Output of the rule battery.
//! - `AnalyticsError`: The specific error types that can be returned from this crate.

pub mod aggregator;
pub mod engine;
pub mod error;
pub mod insights;
pub mod report;
pub mod summary;

#[cfg(test)]
mod test_support;

pub use engine::AnalyticsEngine;
pub use error::AnalyticsError;
pub use insights::{INSIGHT_SAMPLE_SIZE, longest_win_streak};
pub use report::{
    CoinPerformance, EmotionPerformance, HourPerformance, Insight, InsightKind, InsightsReport,
    StrategyPerformance, SummaryReport,
};
