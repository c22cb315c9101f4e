use crate::error::DbError;
use async_trait::async_trait;
use core_types::{BotTradeImport, DateRange, NewTrade, Trade, TradeFilter, TradePatch};
use uuid::Uuid;

/// Persistence of journal entries, always scoped to one owner.
///
/// Every method takes the acting user's id; a trade owned by someone else is
/// indistinguishable from a missing one. Writes run the PnL calculation
/// before anything is stored, so persisted rows always satisfy the trade
/// invariants.
#[async_trait]
pub trait TradeStore: Send + Sync {
    /// Validates, normalizes and stores a new trade.
    async fn create_trade(&self, user_id: Uuid, input: NewTrade) -> Result<Trade, DbError>;

    async fn get_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<Option<Trade>, DbError>;

    /// One page of the user's trades matching `filter`, newest entry first.
    async fn list_trades(&self, user_id: Uuid, filter: &TradeFilter) -> Result<Vec<Trade>, DbError>;

    /// Applies `patch` atomically. Returns `None` if the trade does not exist
    /// for this user; an invalid patch leaves the stored trade unchanged.
    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        patch: TradePatch,
    ) -> Result<Option<Trade>, DbError>;

    /// Returns whether a trade was removed.
    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<bool, DbError>;

    /// Stores a batch of closed bot trades, all or nothing.
    async fn import_bot_trades(
        &self,
        user_id: Uuid,
        rows: Vec<BotTradeImport>,
    ) -> Result<Vec<Trade>, DbError>;

    /// All closed trades of the user whose entry time falls in `range`.
    async fn fetch_closed_trades(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Trade>, DbError>;

    /// The `limit` most recent closed trades by entry time, newest first.
    async fn fetch_recent_closed_trades(&self, user_id: Uuid, limit: usize) -> Result<Vec<Trade>, DbError>;
}

/// Builds the trades for an import batch, failing on the first invalid row.
pub(crate) fn prepare_import(
    user_id: Uuid,
    rows: Vec<BotTradeImport>,
    now: chrono::DateTime<chrono::Utc>,
) -> Result<Vec<Trade>, DbError> {
    rows.into_iter()
        .map(|row| -> Result<Trade, DbError> {
            row.validate()?;
            Ok(Trade::create(user_id, row.into_new_trade(), now)?)
        })
        .collect()
}
