use crate::error::DbError;
use crate::store::{prepare_import, TradeStore};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use core_types::{
    BotTradeImport, DateRange, NewTrade, Trade, TradeDirection, TradeEmotion, TradeFilter, TradePatch,
};
use rust_decimal::Decimal;
use sqlx::postgres::{PgArguments, PgPool, Postgres};
use sqlx::query::Query;
use sqlx::{FromRow, QueryBuilder};
use tracing::info;
use uuid::Uuid;

const TRADE_COLUMNS: &str = "id, user_id, coin, entry_price, exit_price, leverage, position_size, \
     direction, entry_time, exit_time, pnl, pnl_percent, timeframe, strategy, emotion, notes, \
     is_from_bot, bot_name, created_at, updated_at";

/// The `DbRepository` is the PostgreSQL implementation of `TradeStore`.
/// It encapsulates all SQL queries and data access logic.
#[derive(Debug, Clone)]
pub struct DbRepository {
    pool: PgPool,
}

/// A row of the `trades` table. Enum columns are stored as their integer codes.
#[derive(Debug, Clone, FromRow)]
pub struct DbTrade {
    pub id: Uuid,
    pub user_id: Uuid,
    pub coin: String,
    pub entry_price: Decimal,
    pub exit_price: Option<Decimal>,
    pub leverage: i32,
    pub position_size: Decimal,
    pub direction: i16,
    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,
    pub pnl: Option<Decimal>,
    pub pnl_percent: Option<Decimal>,
    pub timeframe: String,
    pub strategy: Option<String>,
    pub emotion: Option<i16>,
    pub notes: Option<String>,
    pub is_from_bot: bool,
    pub bot_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TryFrom<DbTrade> for Trade {
    type Error = DbError;

    fn try_from(row: DbTrade) -> Result<Self, Self::Error> {
        let direction = TradeDirection::try_from(enum_code(row.direction, "direction")?)
            .map_err(|e| DbError::InvalidData(e.to_string()))?;
        let emotion = row
            .emotion
            .map(|code| {
                TradeEmotion::try_from(enum_code(code, "emotion")?).map_err(|e| DbError::InvalidData(e.to_string()))
            })
            .transpose()?;

        Ok(Trade {
            id: row.id,
            user_id: row.user_id,
            coin: row.coin,
            entry_price: row.entry_price,
            exit_price: row.exit_price,
            leverage: row.leverage,
            position_size: row.position_size,
            direction,
            entry_time: row.entry_time,
            exit_time: row.exit_time,
            pnl: row.pnl,
            pnl_percent: row.pnl_percent,
            timeframe: row.timeframe,
            strategy: row.strategy,
            emotion,
            notes: row.notes,
            is_from_bot: row.is_from_bot,
            bot_name: row.bot_name,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn enum_code(code: i16, column: &str) -> Result<u8, DbError> {
    u8::try_from(code).map_err(|_| DbError::InvalidData(format!("{} code {} is out of range", column, code)))
}

fn direction_code(direction: TradeDirection) -> i16 {
    i16::from(u8::from(direction))
}

fn emotion_code(emotion: Option<TradeEmotion>) -> Option<i16> {
    emotion.map(|e| i16::from(u8::from(e)))
}

/// Wraps a user-supplied fragment for `ILIKE`, escaping its wildcards.
fn contains_pattern(fragment: &str) -> String {
    let escaped = fragment.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_");
    format!("%{}%", escaped)
}

fn into_trades(rows: Vec<DbTrade>) -> Result<Vec<Trade>, DbError> {
    rows.into_iter().map(Trade::try_from).collect()
}

fn insert_query(trade: &Trade) -> Query<'_, Postgres, PgArguments> {
    sqlx::query(
        r#"
        INSERT INTO trades (
            id, user_id, coin, entry_price, exit_price, leverage, position_size,
            direction, entry_time, exit_time, pnl, pnl_percent, timeframe, strategy,
            emotion, notes, is_from_bot, bot_name, created_at, updated_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20
        )
        "#,
    )
    .bind(trade.id)
    .bind(trade.user_id)
    .bind(&trade.coin)
    .bind(trade.entry_price)
    .bind(trade.exit_price)
    .bind(trade.leverage)
    .bind(trade.position_size)
    .bind(direction_code(trade.direction))
    .bind(trade.entry_time)
    .bind(trade.exit_time)
    .bind(trade.pnl)
    .bind(trade.pnl_percent)
    .bind(&trade.timeframe)
    .bind(&trade.strategy)
    .bind(emotion_code(trade.emotion))
    .bind(&trade.notes)
    .bind(trade.is_from_bot)
    .bind(&trade.bot_name)
    .bind(trade.created_at)
    .bind(trade.updated_at)
}

impl DbRepository {
    /// Creates a new `DbRepository` with a shared database connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TradeStore for DbRepository {
    async fn create_trade(&self, user_id: Uuid, input: NewTrade) -> Result<Trade, DbError> {
        let trade = Trade::create(user_id, input, Utc::now())?;
        insert_query(&trade).execute(&self.pool).await?;
        info!(trade_id = %trade.id, coin = %trade.coin, "Trade created.");
        Ok(trade)
    }

    async fn get_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<Option<Trade>, DbError> {
        let sql = format!("SELECT {} FROM trades WHERE id = $1 AND user_id = $2", TRADE_COLUMNS);
        let row = sqlx::query_as::<_, DbTrade>(&sql)
            .bind(trade_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Trade::try_from).transpose()
    }

    async fn list_trades(&self, user_id: Uuid, filter: &TradeFilter) -> Result<Vec<Trade>, DbError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!("SELECT {} FROM trades WHERE user_id = ", TRADE_COLUMNS));
        builder.push_bind(user_id);

        if let Some(coin) = filter.coin_pattern() {
            builder.push(" AND coin ILIKE ").push_bind(contains_pattern(&coin));
        }
        if let Some(direction) = filter.direction {
            builder.push(" AND direction = ").push_bind(direction_code(direction));
        }
        if let Some(emotion) = filter.emotion {
            builder.push(" AND emotion = ").push_bind(emotion_code(Some(emotion)));
        }
        if let Some(strategy) = filter.strategy_pattern() {
            builder.push(" AND strategy ILIKE ").push_bind(contains_pattern(&strategy));
        }
        if let Some(is_from_bot) = filter.is_from_bot {
            builder.push(" AND is_from_bot = ").push_bind(is_from_bot);
        }
        if let Some(start) = filter.start_date {
            builder.push(" AND entry_time >= ").push_bind(start);
        }
        if let Some(end) = filter.end_date {
            builder.push(" AND entry_time <= ").push_bind(end);
        }

        builder
            .push(" ORDER BY entry_time DESC, id LIMIT ")
            .push_bind(i64::from(filter.page_size()))
            .push(" OFFSET ")
            // At most (u32::MAX - 1) * MAX_PAGE_SIZE, well inside i64.
            .push_bind(filter.offset() as i64);

        let rows = builder.build_query_as::<DbTrade>().fetch_all(&self.pool).await?;
        into_trades(rows)
    }

    async fn update_trade(
        &self,
        user_id: Uuid,
        trade_id: Uuid,
        patch: TradePatch,
    ) -> Result<Option<Trade>, DbError> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM trades WHERE id = $1 AND user_id = $2 FOR UPDATE", TRADE_COLUMNS);
        let row = sqlx::query_as::<_, DbTrade>(&sql)
            .bind(trade_id)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
        // Dropping the transaction rolls it back and releases the row lock.
        let Some(row) = row else {
            return Ok(None);
        };

        let mut trade = Trade::try_from(row)?;
        trade.apply_patch(patch, Utc::now())?;

        sqlx::query(
            r#"
            UPDATE trades SET
                coin = $3, entry_price = $4, exit_price = $5, leverage = $6, position_size = $7,
                direction = $8, entry_time = $9, exit_time = $10, pnl = $11, pnl_percent = $12,
                timeframe = $13, strategy = $14, emotion = $15, notes = $16, is_from_bot = $17,
                bot_name = $18, updated_at = $19
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(trade.id)
        .bind(trade.user_id)
        .bind(&trade.coin)
        .bind(trade.entry_price)
        .bind(trade.exit_price)
        .bind(trade.leverage)
        .bind(trade.position_size)
        .bind(direction_code(trade.direction))
        .bind(trade.entry_time)
        .bind(trade.exit_time)
        .bind(trade.pnl)
        .bind(trade.pnl_percent)
        .bind(&trade.timeframe)
        .bind(&trade.strategy)
        .bind(emotion_code(trade.emotion))
        .bind(&trade.notes)
        .bind(trade.is_from_bot)
        .bind(&trade.bot_name)
        .bind(trade.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!(trade_id = %trade.id, "Trade updated.");
        Ok(Some(trade))
    }

    async fn delete_trade(&self, user_id: Uuid, trade_id: Uuid) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM trades WHERE id = $1 AND user_id = $2")
            .bind(trade_id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(%trade_id, "Trade deleted.");
        }
        Ok(deleted)
    }

    /// Inserts the whole batch within a single transaction for atomicity.
    async fn import_bot_trades(
        &self,
        user_id: Uuid,
        rows: Vec<BotTradeImport>,
    ) -> Result<Vec<Trade>, DbError> {
        let imported = prepare_import(user_id, rows, Utc::now())?;

        let mut tx = self.pool.begin().await?;
        for trade in &imported {
            insert_query(trade).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        info!(count = imported.len(), "Bot trades imported.");
        Ok(imported)
    }

    async fn fetch_closed_trades(
        &self,
        user_id: Uuid,
        range: Option<DateRange>,
    ) -> Result<Vec<Trade>, DbError> {
        let range = range.unwrap_or_default();
        let sql = format!(
            r#"
            SELECT {} FROM trades
            WHERE user_id = $1 AND exit_price IS NOT NULL
              AND ($2::timestamptz IS NULL OR entry_time >= $2)
              AND ($3::timestamptz IS NULL OR entry_time <= $3)
            ORDER BY entry_time ASC, id
            "#,
            TRADE_COLUMNS
        );
        let rows = sqlx::query_as::<_, DbTrade>(&sql)
            .bind(user_id)
            .bind(range.start)
            .bind(range.end)
            .fetch_all(&self.pool)
            .await?;
        into_trades(rows)
    }

    async fn fetch_recent_closed_trades(&self, user_id: Uuid, limit: usize) -> Result<Vec<Trade>, DbError> {
        let sql = format!(
            "SELECT {} FROM trades WHERE user_id = $1 AND exit_price IS NOT NULL \
             ORDER BY entry_time DESC, id LIMIT $2",
            TRADE_COLUMNS
        );
        let rows = sqlx::query_as::<_, DbTrade>(&sql)
            .bind(user_id)
            // Callers pass the insight sample size.
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        into_trades(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn row() -> DbTrade {
        let entry = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        DbTrade {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            coin: "BTC".to_string(),
            entry_price: dec!(100),
            exit_price: Some(dec!(110)),
            leverage: 2,
            position_size: dec!(1000),
            direction: 0,
            entry_time: entry,
            exit_time: Some(entry),
            pnl: Some(dec!(200)),
            pnl_percent: Some(dec!(20)),
            timeframe: "1h".to_string(),
            strategy: None,
            emotion: Some(8),
            notes: None,
            is_from_bot: false,
            bot_name: None,
            created_at: entry,
            updated_at: None,
        }
    }

    #[test]
    fn row_decodes_enum_codes() {
        let trade = Trade::try_from(row()).unwrap();
        assert_eq!(trade.direction, TradeDirection::Long);
        assert_eq!(trade.emotion, Some(TradeEmotion::Anxious));
        assert_eq!(trade.pnl, Some(dec!(200)));
    }

    #[test]
    fn unknown_enum_codes_are_invalid_data() {
        let mut bad_direction = row();
        bad_direction.direction = 7;
        assert!(matches!(Trade::try_from(bad_direction), Err(DbError::InvalidData(_))));

        let mut negative_emotion = row();
        negative_emotion.emotion = Some(-1);
        assert!(matches!(Trade::try_from(negative_emotion), Err(DbError::InvalidData(_))));
    }

    #[test]
    fn enum_codes_round_trip_through_columns() {
        assert_eq!(direction_code(TradeDirection::Short), 1);
        assert_eq!(emotion_code(Some(TradeEmotion::Fomo)), Some(0));
        assert_eq!(emotion_code(None), None);
    }

    #[test]
    fn like_wildcards_are_escaped() {
        assert_eq!(contains_pattern("btc"), "%btc%");
        assert_eq!(contains_pattern("50%_off"), "%50\\%\\_off%");
    }

    #[test]
    fn largest_page_offset_fits_the_bind_type() {
        let filter = TradeFilter {
            page: Some(u32::MAX),
            page_size: Some(u32::MAX),
            ..TradeFilter::default()
        };
        let offset = filter.offset();
        assert!(offset <= i64::MAX as u64);
        assert_eq!(offset as i64, (i64::from(u32::MAX) - 1) * i64::from(core_types::structs::MAX_PAGE_SIZE));
    }
}
