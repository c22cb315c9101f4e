use crate::error::DbError;
use crate::store::{prepare_import, TradeStore};
use async_trait::async_trait;
use chrono::Utc;
use core_types::{BotTradeImport, DateRange, NewTrade, Trade, TradeFilter, TradePatch};
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// A process-local `TradeStore`.
///
/// Used by `serve --in-memory` and by tests. Nothing survives a restart.
/// Writers hold the lock for their whole read-modify-write, so a patch is
/// never interleaved with another write.
#[derive(Debug, Clone, Default)]
pub struct MemoryTradeStore {
    trades: Arc<RwLock<HashMap<Uuid, Trade>>>,
}

impl MemoryTradeStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn closed_trades_of(&self, user_id: Uuid) -> Vec<Trade> {
        self.trades
            .read()
            .await
            .values()
            .filter(|t| t.user_id == user_id && t.is_closed())
            .cloned()
            .collect()
    }
}

#[async_trait]
impl TradeStore for MemoryTradeStore {
    async fn create_trade(&self, user_id: Uuid, input: NewTrade) -> Result<Trade, DbError> {
        let trade = Trade::create(user_id, input, Utc::now())?;
        self.trades.write().await.insert(trade.id, trade.clone());
        info!(trade_id = %trade.id, coin = %trade.coin, "Trade created.");
        Ok(trade)
    }

    async fn get_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<Option<Trade>, DbError> {
        let trades = self.trades.read().await;
        Ok(trades.get(&trade_id).filter(|t| t.user_id == user_id).cloned())
    }

    async fn list_trades(&self, user_id: Uuid, filter: &TradeFilter) -> Result<Vec<Trade>, DbError> {
        let trades = self.trades.read().await;
        let mut matching: Vec<&Trade> = trades
            .values()
            .filter(|t| t.user_id == user_id && filter.matches(t))
            .collect();
        // Same order as the SQL store: entry time descending, then id.
        matching.sort_by_key(|t| (Reverse(t.entry_time), t.id));

        let offset = usize::try_from(filter.offset()).unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .skip(offset)
            .take(filter.page_size() as usize)
            .cloned()
            .collect())
    }

    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        patch: TradePatch,
    ) -> Result<Option<Trade>, DbError> {
        let mut trades = self.trades.write().await;
        let Some(trade) = trades.get_mut(&trade_id).filter(|t| t.user_id == user_id) else {
            return Ok(None);
        };
        trade.apply_patch(patch, Utc::now())?;
        info!(trade_id = %trade.id, "Trade updated.");
        Ok(Some(trade.clone()))
    }

    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<bool, DbError> {
        let mut trades = self.trades.write().await;
        if trades.get(&trade_id).is_some_and(|t| t.user_id == user_id) {
            trades.remove(&trade_id);
            info!(%trade_id, "Trade deleted.");
            return Ok(true);
        }
        Ok(false)
    }

    async fn import_bot_trades(
        &self,
        user_id: Uuid,
        rows: Vec<BotTradeImport>,
    ) -> Result<Vec<Trade>, DbError> {
        let imported = prepare_import(user_id, rows, Utc::now())?;
        let mut trades = self.trades.write().await;
        for trade in &imported {
            trades.insert(trade.id, trade.clone());
        }
        info!(count = imported.len(), "Bot trades imported.");
        Ok(imported)
    }

    async fn fetch_closed_trades(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Trade>, DbError> {
        let mut closed: Vec<Trade> = self
            .closed_trades_of(user_id)
            .await
            .into_iter()
            .filter(|t| range.is_none_or(|r| r.contains(t.entry_time)))
            .collect();
        closed.sort_by_key(|t| (t.entry_time, t.id));
        Ok(closed)
    }

    async fn fetch_recent_closed_trades(&self, user_id: Uuid, limit: usize) -> Result<Vec<Trade>, DbError> {
        let mut closed = self.closed_trades_of(user_id).await;
        closed.sort_by_key(|t| (Reverse(t.entry_time), t.id));
        closed.truncate(limit);
        Ok(closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone};
    use core_types::{CoreError, TradeDirection, TradeEmotion};
    use rust_decimal_macros::dec;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
    }

    fn closed(coin: &str, day: u32) -> NewTrade {
        let mut input = NewTrade::new(coin, TradeDirection::Long, dec!(100), dec!(1000), at(day, 10));
        input.exit_price = Some(dec!(110));
        input.exit_time = Some(at(day, 12));
        input
    }

    fn open(coin: &str, day: u32) -> NewTrade {
        NewTrade::new(coin, TradeDirection::Short, dec!(50), dec!(200), at(day, 9))
    }

    fn bot_row(coin: &str, day: u32) -> BotTradeImport {
        BotTradeImport {
            coin: coin.to_string(),
            entry_price: dec!(10),
            exit_price: dec!(9),
            position_size: dec!(100),
            direction: TradeDirection::Long,
            entry_time: at(day, 1),
            exit_time: at(day, 2),
            leverage: 1,
            bot_name: "GridBot".to_string(),
        }
    }

    #[tokio::test]
    async fn trades_are_scoped_to_their_owner() {
        let store = MemoryTradeStore::new();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();

        let trade = store.create_trade(alice, closed("btc", 1)).await.unwrap();
        assert_eq!(trade.coin, "BTC");
        assert_eq!(trade.pnl, Some(dec!(100)));

        assert!(store.get_trade(alice, trade.id).await.unwrap().is_some());
        assert!(store.get_trade(bob, trade.id).await.unwrap().is_none());
        assert!(store.list_trades(bob, &TradeFilter::default()).await.unwrap().is_empty());
        assert!(store.update_trade(bob, trade.id, TradePatch::default()).await.unwrap().is_none());
        assert!(!store.delete_trade(bob, trade.id).await.unwrap());
        assert!(store.fetch_closed_trades(bob, None).await.unwrap().is_empty());

        assert!(store.delete_trade(alice, trade.id).await.unwrap());
        assert!(store.get_trade(alice, trade.id).await.unwrap().is_none());
        assert!(!store.delete_trade(alice, trade.id).await.unwrap());
    }

    #[tokio::test]
    async fn invalid_create_is_rejected() {
        let store = MemoryTradeStore::new();
        let mut input = closed("ETH", 1);
        input.leverage = 0;
        let err = store.create_trade(Uuid::new_v4(), input).await.unwrap_err();
        assert!(matches!(err, DbError::Core(CoreError::InvalidInput(field, _)) if field == "leverage"));
    }

    #[tokio::test]
    async fn list_filters_orders_and_paginates() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();
        for day in 1..=5 {
            store.create_trade(user, closed("BTCUSDT", day)).await.unwrap();
        }
        let mut tagged = closed("ETH", 6);
        tagged.emotion = Some(TradeEmotion::Greed);
        tagged.strategy = Some("Breakout Retest".to_string());
        store.create_trade(user, tagged).await.unwrap();
        store.create_trade(user, open("SOL", 7)).await.unwrap();

        let all = store.list_trades(user, &TradeFilter::default()).await.unwrap();
        assert_eq!(all.len(), 7);
        assert!(all.windows(2).all(|w| w[0].entry_time >= w[1].entry_time));
        assert_eq!(all[0].coin, "SOL");

        let by_coin = TradeFilter { coin: Some("btc".into()), ..Default::default() };
        assert_eq!(store.list_trades(user, &by_coin).await.unwrap().len(), 5);

        let by_strategy = TradeFilter { strategy: Some("retest".into()), ..Default::default() };
        let found = store.list_trades(user, &by_strategy).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].emotion, Some(TradeEmotion::Greed));

        let shorts = TradeFilter { direction: Some(TradeDirection::Short), ..Default::default() };
        assert_eq!(store.list_trades(user, &shorts).await.unwrap()[0].coin, "SOL");

        let window = TradeFilter { start_date: Some(at(2, 0)), end_date: Some(at(4, 23)), ..Default::default() };
        assert_eq!(store.list_trades(user, &window).await.unwrap().len(), 3);

        let page_two = TradeFilter { page: Some(2), page_size: Some(3), ..Default::default() };
        let page = store.list_trades(user, &page_two).await.unwrap();
        assert_eq!(page.len(), 3);
        assert_eq!(page[0].id, all[3].id);

        let past_end = TradeFilter { page: Some(4), page_size: Some(3), ..Default::default() };
        assert!(store.list_trades(user, &past_end).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn update_recomputes_pnl() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();
        let trade = store.create_trade(user, open("BTC", 1)).await.unwrap();
        assert!(trade.pnl.is_none());

        let patch = TradePatch {
            exit_price: Some(dec!(45)),
            exit_time: Some(at(1, 15)),
            ..Default::default()
        };
        let updated = store.update_trade(user, trade.id, patch).await.unwrap().unwrap();
        // Short from 50 to 45 on a 200 position.
        assert_eq!(updated.pnl_percent, Some(dec!(10)));
        assert_eq!(updated.pnl, Some(dec!(20)));
        assert!(updated.updated_at.is_some());

        let stored = store.get_trade(user, trade.id).await.unwrap().unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn rejected_patch_leaves_trade_untouched() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();
        let trade = store.create_trade(user, closed("BTC", 1)).await.unwrap();

        let patch = TradePatch { entry_price: Some(dec!(-1)), notes: Some("oops".into()), ..Default::default() };
        assert!(store.update_trade(user, trade.id, patch).await.is_err());

        let stored = store.get_trade(user, trade.id).await.unwrap().unwrap();
        assert_eq!(stored, trade);
    }

    #[tokio::test]
    async fn import_is_all_or_nothing() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();

        let mut bad = bot_row("ETH", 2);
        bad.entry_price = dec!(0);
        let err = store.import_bot_trades(user, vec![bot_row("BTC", 1), bad]).await;
        assert!(err.is_err());
        assert!(store.list_trades(user, &TradeFilter::default()).await.unwrap().is_empty());

        let imported = store
            .import_bot_trades(user, vec![bot_row("BTC", 1), bot_row("eth", 2)])
            .await
            .unwrap();
        assert_eq!(imported.len(), 2);
        assert!(imported.iter().all(|t| t.is_from_bot && t.is_closed()));
        assert_eq!(imported[1].coin, "ETH");
        assert_eq!(imported[0].pnl, Some(dec!(-10)));

        let bots = TradeFilter { is_from_bot: Some(true), ..Default::default() };
        assert_eq!(store.list_trades(user, &bots).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn analytics_fetches_skip_open_trades() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();
        for day in 1..=4 {
            store.create_trade(user, closed("BTC", day)).await.unwrap();
        }
        store.create_trade(user, open("BTC", 5)).await.unwrap();

        let all = store.fetch_closed_trades(user, None).await.unwrap();
        assert_eq!(all.len(), 4);
        assert!(all.windows(2).all(|w| w[0].entry_time <= w[1].entry_time));

        let range = DateRange::new(Some(at(2, 10)), Some(at(3, 10))).unwrap();
        assert_eq!(store.fetch_closed_trades(user, Some(range)).await.unwrap().len(), 2);

        let recent = store.fetch_recent_closed_trades(user, 3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].entry_time, at(4, 10));
        assert_eq!(recent[2].entry_time, at(2, 10));
    }

    #[tokio::test]
    async fn concurrent_patches_are_serialized() {
        let store = MemoryTradeStore::new();
        let user = Uuid::new_v4();
        let trade_id = store.create_trade(user, closed("BTC", 1)).await.unwrap().id;

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let patch = TradePatch {
                        exit_price: Some(dec!(100) + rust_decimal::Decimal::from(i + 1)),
                        exit_time: Some(at(1, 10) + Duration::hours(1)),
                        ..Default::default()
                    };
                    store.update_trade(user, trade_id, patch).await.unwrap().unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        let stored = store.get_trade(user, trade_id).await.unwrap().unwrap();
        let exit = stored.exit_price.unwrap();
        // Whatever patch won last, PnL matches its exit price.
        assert_eq!(stored.pnl, Some((exit - dec!(100)) / dec!(100) * dec!(1000)));
    }
}
