use analytics::{
    AnalyticsEngine, CoinPerformance, EmotionPerformance, HourPerformance, InsightsReport,
    StrategyPerformance, SummaryReport, INSIGHT_SAMPLE_SIZE,
};
use core_types::{DateRange, Trade};
use database::TradeStore;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub mod error;

pub use error::AnalyzerError;

/// Read-side orchestration: fetches a user's closed trades from the store and
/// hands the snapshot to the analytics engine.
///
/// Each call is a single fetch-then-compute unit. A failed fetch fails the
/// call; nothing is cached between calls.
#[derive(Clone)]
pub struct Analyzer {
    store: Arc<dyn TradeStore>,
    engine: AnalyticsEngine,
}

impl Analyzer {
    pub fn new(store: Arc<dyn TradeStore>) -> Self {
        Self {
            store,
            engine: AnalyticsEngine::new(),
        }
    }

    /// Whole-set statistics, optionally restricted to trades entered in `range`.
    pub async fn summary(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<SummaryReport, AnalyzerError> {
        let trades = self.closed_trades(user_id, range).await?;
        Ok(self.engine.summarize(&trades)?)
    }

    pub async fn by_emotion(&self, user_id: Uuid) -> Result<Vec<EmotionPerformance>, AnalyzerError> {
        let trades = self.closed_trades(user_id, None).await?;
        Ok(self.engine.by_emotion(&trades)?)
    }

    pub async fn by_strategy(&self, user_id: Uuid) -> Result<Vec<StrategyPerformance>, AnalyzerError> {
        let trades = self.closed_trades(user_id, None).await?;
        Ok(self.engine.by_strategy(&trades)?)
    }

    pub async fn by_coin(&self, user_id: Uuid) -> Result<Vec<CoinPerformance>, AnalyzerError> {
        let trades = self.closed_trades(user_id, None).await?;
        Ok(self.engine.by_coin(&trades)?)
    }

    pub async fn by_hour(&self, user_id: Uuid) -> Result<Vec<HourPerformance>, AnalyzerError> {
        let trades = self.closed_trades(user_id, None).await?;
        Ok(self.engine.by_hour(&trades)?)
    }

    /// Insights over the user's most recent closed trades.
    pub async fn insights(&self, user_id: Uuid) -> Result<InsightsReport, AnalyzerError> {
        let trades = self
            .store
            .fetch_recent_closed_trades(user_id, INSIGHT_SAMPLE_SIZE)
            .await?;
        debug!(%user_id, sample = trades.len(), "Fetched insight sample.");
        let insights = self.engine.generate_insights(&trades)?;
        Ok(InsightsReport { insights })
    }

    async fn closed_trades(&self, user_id: Uuid, range: Option<DateRange>) -> Result<Vec<Trade>, AnalyzerError> {
        let trades = self.store.fetch_closed_trades(user_id, range).await?;
        debug!(%user_id, count = trades.len(), "Fetched closed trades.");
        Ok(trades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analytics::InsightKind;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use core_types::{BotTradeImport, NewTrade, TradeDirection, TradeEmotion, TradeFilter, TradePatch};
    use database::{DbError, MemoryTradeStore};
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 1, 9, 0, 0).unwrap() + Duration::days(n)
    }

    /// A closed long (entry 100, size 1000) realizing exactly `pnl`.
    fn closed(pnl: Decimal, entered: DateTime<Utc>) -> NewTrade {
        let mut input = NewTrade::new("BTC", TradeDirection::Long, dec!(100), dec!(1000), entered);
        input.exit_price = Some(dec!(100) + pnl / dec!(10));
        input.exit_time = Some(entered + Duration::hours(1));
        input
    }

    async fn seeded() -> (Analyzer, Uuid) {
        let store = Arc::new(MemoryTradeStore::new());
        let user = Uuid::new_v4();
        for (n, pnl) in [dec!(100), dec!(-50), dec!(200), dec!(-30)].into_iter().enumerate() {
            let mut input = closed(pnl, day(n as i64));
            input.emotion = Some(TradeEmotion::Calm);
            store.create_trade(user, input).await.unwrap();
        }
        store
            .create_trade(user, NewTrade::new("ETH", TradeDirection::Short, dec!(10), dec!(50), day(9)))
            .await
            .unwrap();
        (Analyzer::new(store), user)
    }

    #[tokio::test]
    async fn summary_covers_closed_trades_only() {
        let (analyzer, user) = seeded().await;
        let report = analyzer.summary(user, None).await.unwrap();
        assert_eq!(report.total_trades, 4);
        assert_eq!(report.total_pnl, dec!(220));
        assert_eq!(report.average_win, dec!(150));
        assert_eq!(report.average_loss, dec!(-40));
    }

    #[tokio::test]
    async fn summary_respects_the_date_range() {
        let (analyzer, user) = seeded().await;
        let range = DateRange::new(Some(day(1)), Some(day(2))).unwrap();
        let report = analyzer.summary(user, Some(range)).await.unwrap();
        assert_eq!(report.total_trades, 2);
        assert_eq!(report.total_pnl, dec!(150));
    }

    #[tokio::test]
    async fn breakdowns_are_per_user() {
        let (analyzer, user) = seeded().await;
        let emotions = analyzer.by_emotion(user).await.unwrap();
        assert_eq!(emotions.len(), 1);
        assert_eq!(emotions[0].trade_count, 4);

        let stranger = Uuid::new_v4();
        assert!(analyzer.by_coin(stranger).await.unwrap().is_empty());
        assert!(analyzer.by_strategy(stranger).await.unwrap().is_empty());
        assert!(analyzer.by_hour(stranger).await.unwrap().is_empty());
        assert_eq!(analyzer.summary(stranger, None).await.unwrap(), SummaryReport::default());
    }

    #[tokio::test]
    async fn new_user_gets_the_onboarding_tip() {
        let analyzer = Analyzer::new(Arc::new(MemoryTradeStore::new()));
        let report = analyzer.insights(Uuid::new_v4()).await.unwrap();
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].kind, InsightKind::Tip);
    }

    #[tokio::test]
    async fn insights_see_only_the_latest_hundred_trades() {
        let store = Arc::new(MemoryTradeStore::new());
        let user = Uuid::new_v4();
        // Old FOMO losses fall outside the sample once 100 newer trades exist.
        for n in 0..5 {
            let mut input = closed(dec!(-10), day(n));
            input.emotion = Some(TradeEmotion::Fomo);
            store.create_trade(user, input).await.unwrap();
        }
        for n in 0..100 {
            let pnl = if n % 2 == 0 { dec!(5) } else { dec!(-5) };
            store.create_trade(user, closed(pnl, day(30) + Duration::hours(n))).await.unwrap();
        }

        let analyzer = Analyzer::new(store);
        let report = analyzer.insights(user).await.unwrap();
        assert!(report.insights.iter().all(|i| i.title != "FOMO Warning"));
    }

    /// A store whose reads always fail.
    struct BrokenStore;

    #[async_trait]
    impl TradeStore for BrokenStore {
        async fn create_trade(&self, _: Uuid, _: NewTrade) -> Result<Trade, DbError> {
            Err(DbError::NotFound)
        }
        async fn get_trade(&self, _: Uuid, _: Uuid) -> Result<Option<Trade>, DbError> {
            Err(DbError::NotFound)
        }
        async fn list_trades(&self, _: Uuid, _: &TradeFilter) -> Result<Vec<Trade>, DbError> {
            Err(DbError::NotFound)
        }
        async fn update_trade(&self, _: Uuid, _: Uuid, _: TradePatch) -> Result<Option<Trade>, DbError> {
            Err(DbError::NotFound)
        }
        async fn delete_trade(&self, _: Uuid, _: Uuid) -> Result<bool, DbError> {
            Err(DbError::NotFound)
        }
        async fn import_bot_trades(&self, _: Uuid, _: Vec<BotTradeImport>) -> Result<Vec<Trade>, DbError> {
            Err(DbError::NotFound)
        }
        async fn fetch_closed_trades(&self, _: Uuid, _: Option<DateRange>) -> Result<Vec<Trade>, DbError> {
            Err(DbError::InvalidData("corrupt row".to_string()))
        }
        async fn fetch_recent_closed_trades(&self, _: Uuid, _: usize) -> Result<Vec<Trade>, DbError> {
            Err(DbError::InvalidData("corrupt row".to_string()))
        }
    }

    #[tokio::test]
    async fn store_failures_propagate_unmodified() {
        let analyzer = Analyzer::new(Arc::new(BrokenStore));
        let err = analyzer.summary(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Database(DbError::InvalidData(_))));
        let err = analyzer.insights(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, AnalyzerError::Database(DbError::InvalidData(_))));
    }
}
