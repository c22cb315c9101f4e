use crate::aggregator;
use crate::error::AnalyticsError;
use crate::insights;
use crate::report::{
    CoinPerformance, EmotionPerformance, HourPerformance, Insight, StrategyPerformance, SummaryReport,
};
use crate::summary;
use core_types::Trade;
use tracing::debug;

/// A stateless calculator for deriving trading-diary statistics.
///
/// Every method takes the user's trades as a plain slice and never mutates
/// them. Open trades are accepted in the input and skipped by each view.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine {}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whole-set statistics: counts, win rate, totals, extremes and averages.
    pub fn summarize(&self, trades: &[Trade]) -> Result<SummaryReport, AnalyticsError> {
        let report = summary::summarize(trades)?;
        debug!(
            input = trades.len(),
            closed = report.total_trades,
            total_pnl = %report.total_pnl,
            "Computed summary."
        );
        Ok(report)
    }

    pub fn by_emotion(&self, trades: &[Trade]) -> Result<Vec<EmotionPerformance>, AnalyticsError> {
        let rows = aggregator::by_emotion(trades)?;
        debug!(groups = rows.len(), "Computed emotion breakdown.");
        Ok(rows)
    }

    pub fn by_strategy(&self, trades: &[Trade]) -> Result<Vec<StrategyPerformance>, AnalyticsError> {
        let rows = aggregator::by_strategy(trades)?;
        debug!(groups = rows.len(), "Computed strategy breakdown.");
        Ok(rows)
    }

    pub fn by_coin(&self, trades: &[Trade]) -> Result<Vec<CoinPerformance>, AnalyticsError> {
        let rows = aggregator::by_coin(trades)?;
        debug!(groups = rows.len(), "Computed coin breakdown.");
        Ok(rows)
    }

    pub fn by_hour(&self, trades: &[Trade]) -> Result<Vec<HourPerformance>, AnalyticsError> {
        let rows = aggregator::by_hour(trades)?;
        debug!(groups = rows.len(), "Computed hour-of-day breakdown.");
        Ok(rows)
    }

    /// Runs the insight rule battery over the most recent closed trades.
    ///
    /// The result is never empty: a user without closed trades gets a single
    /// onboarding tip, and a sample on which no rule fires gets a fallback tip.
    pub fn generate_insights(&self, trades: &[Trade]) -> Result<Vec<Insight>, AnalyticsError> {
        let insights = insights::generate_insights(trades)?;
        debug!(count = insights.len(), "Generated insights.");
        Ok(insights)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed, TradeFixture};
    use core_types::TradeEmotion;
    use rust_decimal_macros::dec;

    #[test]
    fn engine_views_agree_on_totals() {
        let engine = AnalyticsEngine::new();
        let trades = vec![
            closed(dec!(40), 9).with_emotion(TradeEmotion::Calm).with_strategy("Swing"),
            closed(dec!(-15), 13).with_coin("ETH"),
            closed(dec!(5), 13).with_emotion(TradeEmotion::Calm),
        ];

        let summary = engine.summarize(&trades).unwrap();
        let coins = engine.by_coin(&trades).unwrap();
        let hours = engine.by_hour(&trades).unwrap();

        assert_eq!(summary.total_pnl, dec!(30));
        assert_eq!(coins.iter().map(|c| c.total_pnl).sum::<rust_decimal::Decimal>(), dec!(30));
        assert_eq!(hours.iter().map(|h| h.trade_count).sum::<usize>(), 3);
        assert_eq!(engine.by_emotion(&trades).unwrap()[0].trade_count, 2);
        assert_eq!(engine.by_strategy(&trades).unwrap().len(), 1);
    }

    #[test]
    fn empty_input_never_fails() {
        let engine = AnalyticsEngine::default();
        assert_eq!(engine.summarize(&[]).unwrap(), SummaryReport::default());
        assert!(engine.by_emotion(&[]).unwrap().is_empty());
        assert!(engine.by_strategy(&[]).unwrap().is_empty());
        assert!(engine.by_coin(&[]).unwrap().is_empty());
        assert!(engine.by_hour(&[]).unwrap().is_empty());
        assert_eq!(engine.generate_insights(&[]).unwrap().len(), 1);
    }
}
