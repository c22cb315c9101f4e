use crate::enums::{TradeDirection, TradeEmotion};
use crate::error::CoreError;
use crate::pnl::compute_pnl;
use crate::timestamp;
use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_TIMEFRAME: &str = "1h";
pub const DEFAULT_BOT_NAME: &str = "Unknown Bot";
pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 200;

/// A single journal entry: one position, open or closed, owned by one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Trade {
    pub id: Uuid,
    #[serde(skip)]
    pub user_id: Uuid,

    pub coin: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub exit_price: Option<Decimal>,
    pub leverage: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub position_size: Decimal,
    pub direction: TradeDirection,

    pub entry_time: DateTime<Utc>,
    pub exit_time: Option<DateTime<Utc>>,

    // Derived from the five pricing fields; only ever written by `recompute_pnl`.
    #[serde(rename = "pnL", default, with = "rust_decimal::serde::float_option")]
    pub pnl: Option<Decimal>,
    #[serde(rename = "pnLPercent", default, with = "rust_decimal::serde::float_option")]
    pub pnl_percent: Option<Decimal>,

    pub timeframe: String,
    pub strategy: Option<String>,
    pub emotion: Option<TradeEmotion>,
    pub notes: Option<String>,

    pub is_from_bot: bool,
    pub bot_name: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Trade {
    /// Builds a validated, normalized trade from a creation request and
    /// computes its PnL.
    pub fn create(user_id: Uuid, input: NewTrade, now: DateTime<Utc>) -> Result<Self, CoreError> {
        input.validate()?;

        let mut trade = Trade {
            id: Uuid::new_v4(),
            user_id,
            coin: normalize_coin(&input.coin),
            entry_price: input.entry_price,
            exit_price: input.exit_price,
            leverage: input.leverage,
            position_size: input.position_size,
            direction: input.direction,
            entry_time: input.entry_time,
            exit_time: input.exit_time,
            pnl: None,
            pnl_percent: None,
            timeframe: normalize_timeframe(input.timeframe),
            strategy: non_blank(input.strategy),
            emotion: input.emotion,
            notes: non_blank(input.notes),
            is_from_bot: input.is_from_bot,
            bot_name: non_blank(input.bot_name),
            created_at: now,
            updated_at: None,
        };
        trade.recompute_pnl()?;
        Ok(trade)
    }

    /// Applies a partial update and recomputes PnL.
    ///
    /// The trade is only modified if the patched result is valid; on error it
    /// is left exactly as it was.
    pub fn apply_patch(&mut self, patch: TradePatch, now: DateTime<Utc>) -> Result<(), CoreError> {
        let mut next = self.clone();

        if let Some(coin) = patch.coin {
            next.coin = normalize_coin(&coin);
        }
        if let Some(entry_price) = patch.entry_price {
            next.entry_price = entry_price;
        }
        if let Some(exit_price) = patch.exit_price {
            next.exit_price = Some(exit_price);
        }
        if let Some(leverage) = patch.leverage {
            next.leverage = leverage;
        }
        if let Some(position_size) = patch.position_size {
            next.position_size = position_size;
        }
        if let Some(direction) = patch.direction {
            next.direction = direction;
        }
        if let Some(entry_time) = patch.entry_time {
            next.entry_time = entry_time;
        }
        if let Some(exit_time) = patch.exit_time {
            next.exit_time = Some(exit_time);
        }
        if let Some(timeframe) = patch.timeframe {
            next.timeframe = normalize_timeframe(timeframe);
        }
        if let Some(strategy) = patch.strategy {
            // A blank strategy clears the annotation.
            next.strategy = non_blank(Some(strategy));
        }
        if let Some(emotion) = patch.emotion {
            next.emotion = Some(emotion);
        }
        if let Some(notes) = patch.notes {
            next.notes = non_blank(Some(notes));
        }
        if let Some(is_from_bot) = patch.is_from_bot {
            next.is_from_bot = is_from_bot;
        }
        if let Some(bot_name) = patch.bot_name {
            next.bot_name = non_blank(Some(bot_name));
        }

        validate_position(
            &next.coin,
            next.entry_price,
            next.exit_price,
            next.leverage,
            next.position_size,
            next.entry_time,
            next.exit_time,
        )?;
        next.updated_at = Some(now);
        next.recompute_pnl()?;

        *self = next;
        Ok(())
    }

    /// Recomputes `pnl` and `pnl_percent` from the pricing fields. Both are
    /// assigned together, and both are `None` while the trade is open.
    pub fn recompute_pnl(&mut self) -> Result<(), CoreError> {
        let result = compute_pnl(
            self.direction,
            self.entry_price,
            self.exit_price,
            self.leverage,
            self.position_size,
        )?;
        self.pnl = result.map(|r| r.pnl);
        self.pnl_percent = result.map(|r| r.pnl_percent);
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        self.exit_price.is_some()
    }

    /// Realized PnL, treating an open trade as zero.
    pub fn pnl_or_zero(&self) -> Decimal {
        self.pnl.unwrap_or(Decimal::ZERO)
    }

    /// A trade wins only with strictly positive PnL; break-even counts as a loss.
    pub fn is_win(&self) -> bool {
        self.pnl_or_zero() > Decimal::ZERO
    }

    /// Hour of day (UTC, 0–23) the position was opened.
    pub fn entry_hour(&self) -> u32 {
        self.entry_time.hour()
    }
}

/// A request to record a new trade, manual or bot-sourced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTrade {
    pub coin: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub position_size: Decimal,
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub exit_price: Option<Decimal>,
    #[serde(default = "default_leverage")]
    pub leverage: i32,
    #[serde(default)]
    pub exit_time: Option<DateTime<Utc>>,
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    #[serde(default)]
    pub strategy: Option<String>,
    #[serde(default)]
    pub emotion: Option<TradeEmotion>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub is_from_bot: bool,
    #[serde(default)]
    pub bot_name: Option<String>,
}

impl NewTrade {
    /// A minimal open trade; the remaining fields take their defaults.
    pub fn new(
        coin: impl Into<String>,
        direction: TradeDirection,
        entry_price: Decimal,
        position_size: Decimal,
        entry_time: DateTime<Utc>,
    ) -> Self {
        Self {
            coin: coin.into(),
            entry_price,
            position_size,
            direction,
            entry_time,
            exit_price: None,
            leverage: default_leverage(),
            exit_time: None,
            timeframe: default_timeframe(),
            strategy: None,
            emotion: None,
            notes: None,
            is_from_bot: false,
            bot_name: None,
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        validate_position(
            &self.coin,
            self.entry_price,
            self.exit_price,
            self.leverage,
            self.position_size,
            self.entry_time,
            self.exit_time,
        )
    }
}

/// A partial update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradePatch {
    pub coin: Option<String>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub entry_price: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub exit_price: Option<Decimal>,
    pub leverage: Option<i32>,
    #[serde(with = "rust_decimal::serde::float_option")]
    pub position_size: Option<Decimal>,
    pub direction: Option<TradeDirection>,
    pub entry_time: Option<DateTime<Utc>>,
    pub exit_time: Option<DateTime<Utc>>,
    pub timeframe: Option<String>,
    pub strategy: Option<String>,
    pub emotion: Option<TradeEmotion>,
    pub notes: Option<String>,
    pub is_from_bot: Option<bool>,
    pub bot_name: Option<String>,
}

/// A closed trade produced by an automated source (bot export, CSV file).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotTradeImport {
    pub coin: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub entry_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub exit_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub position_size: Decimal,
    pub direction: TradeDirection,
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    #[serde(default = "default_leverage")]
    pub leverage: i32,
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
}

impl BotTradeImport {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_position(
            &self.coin,
            self.entry_price,
            Some(self.exit_price),
            self.leverage,
            self.position_size,
            self.entry_time,
            Some(self.exit_time),
        )
    }

    /// Converts the import row into a closed, bot-flagged creation request.
    pub fn into_new_trade(self) -> NewTrade {
        NewTrade {
            coin: self.coin,
            entry_price: self.entry_price,
            position_size: self.position_size,
            direction: self.direction,
            entry_time: self.entry_time,
            exit_price: Some(self.exit_price),
            leverage: self.leverage,
            exit_time: Some(self.exit_time),
            timeframe: default_timeframe(),
            strategy: None,
            emotion: None,
            notes: None,
            is_from_bot: true,
            bot_name: Some(self.bot_name),
        }
    }
}

/// An optional, inclusive window on trade entry time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Result<Self, CoreError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(CoreError::InvalidInput(
                    "date_range".to_string(),
                    format!("start {} is after end {}", start, end),
                ));
            }
        }
        Ok(Self { start, end })
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        self.start.is_none_or(|start| timestamp >= start)
            && self.end.is_none_or(|end| timestamp <= end)
    }
}

/// Listing criteria for the trade history view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TradeFilter {
    /// Case-insensitive substring of the coin symbol.
    pub coin: Option<String>,
    pub direction: Option<TradeDirection>,
    pub emotion: Option<TradeEmotion>,
    /// Case-insensitive substring of the strategy label.
    pub strategy: Option<String>,
    pub is_from_bot: Option<bool>,
    #[serde(deserialize_with = "timestamp::deserialize_optional")]
    pub start_date: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "timestamp::deserialize_optional")]
    pub end_date: Option<DateTime<Utc>>,
    /// 1-based page number.
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl TradeFilter {
    pub fn matches(&self, trade: &Trade) -> bool {
        if let Some(coin) = self.coin_pattern() {
            if !trade.coin.to_lowercase().contains(&coin) {
                return false;
            }
        }
        if self.direction.is_some_and(|d| d != trade.direction) {
            return false;
        }
        if self.emotion.is_some() && self.emotion != trade.emotion {
            return false;
        }
        if let Some(strategy) = self.strategy_pattern() {
            match &trade.strategy {
                Some(s) if s.to_lowercase().contains(&strategy) => {}
                _ => return false,
            }
        }
        if self.is_from_bot.is_some_and(|b| b != trade.is_from_bot) {
            return false;
        }
        if self.start_date.is_some_and(|start| trade.entry_time < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| trade.entry_time > end) {
            return false;
        }
        true
    }

    pub fn coin_pattern(&self) -> Option<String> {
        self.coin.as_deref().map(str::trim).filter(|c| !c.is_empty()).map(str::to_lowercase)
    }

    pub fn strategy_pattern(&self) -> Option<String> {
        self.strategy.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_lowercase)
    }

    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn page_size(&self) -> u32 {
        self.page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page() - 1) * u64::from(self.page_size())
    }
}

fn validate_position(
    coin: &str,
    entry_price: Decimal,
    exit_price: Option<Decimal>,
    leverage: i32,
    position_size: Decimal,
    entry_time: DateTime<Utc>,
    exit_time: Option<DateTime<Utc>>,
) -> Result<(), CoreError> {
    if coin.trim().is_empty() {
        return Err(invalid("coin", "must not be empty".to_string()));
    }
    if entry_price <= Decimal::ZERO {
        return Err(invalid("entry_price", format!("must be positive, got {}", entry_price)));
    }
    if let Some(exit_price) = exit_price {
        if exit_price <= Decimal::ZERO {
            return Err(invalid("exit_price", format!("must be positive, got {}", exit_price)));
        }
    }
    if leverage < 1 {
        return Err(invalid("leverage", format!("must be at least 1, got {}", leverage)));
    }
    if position_size <= Decimal::ZERO {
        return Err(invalid("position_size", format!("must be positive, got {}", position_size)));
    }
    if let Some(exit_time) = exit_time {
        if exit_time < entry_time {
            return Err(invalid("exit_time", "must not precede entry_time".to_string()));
        }
    }
    Ok(())
}

fn invalid(field: &str, reason: String) -> CoreError {
    CoreError::InvalidInput(field.to_string(), reason)
}

fn normalize_coin(coin: &str) -> String {
    coin.trim().to_uppercase()
}

fn normalize_timeframe(timeframe: String) -> String {
    let trimmed = timeframe.trim();
    if trimmed.is_empty() {
        default_timeframe()
    } else {
        trimmed.to_string()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn default_leverage() -> i32 {
    1
}

fn default_timeframe() -> String {
    DEFAULT_TIMEFRAME.to_string()
}

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}
