//! Trade fixtures shared by the unit tests of this crate.

use chrono::{DateTime, Duration, TimeZone, Utc};
use core_types::{NewTrade, Trade, TradeDirection, TradeEmotion};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use uuid::Uuid;

pub fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap()
}

/// A closed long whose realized PnL is exactly `pnl` (size 1000, entry 100).
pub fn closed(pnl: Decimal, hour: u32) -> Trade {
    let entry_time = base_time() + Duration::hours(i64::from(hour));
    let mut input = NewTrade::new("BTC", TradeDirection::Long, dec!(100), dec!(1000), entry_time);
    input.exit_price = Some(dec!(100) + pnl / dec!(10));
    input.exit_time = Some(entry_time + Duration::minutes(30));
    let trade = Trade::create(Uuid::nil(), input, entry_time).unwrap();
    assert_eq!(trade.pnl, Some(pnl));
    trade
}

pub fn open(direction: TradeDirection, hour: u32) -> Trade {
    let entry_time = base_time() + Duration::hours(i64::from(hour));
    let input = NewTrade::new("BTC", direction, dec!(100), dec!(1000), entry_time);
    Trade::create(Uuid::nil(), input, entry_time).unwrap()
}

/// A sequence of closed trades, one per day, in ascending entry order.
pub fn daily_sequence(pnls: &[Decimal]) -> Vec<Trade> {
    pnls.iter()
        .enumerate()
        .map(|(day, pnl)| closed(*pnl, 12).entered_at(base_time() + Duration::days(day as i64) + Duration::hours(12)))
        .collect()
}

pub trait TradeFixture {
    fn with_emotion(self, emotion: TradeEmotion) -> Trade;
    fn with_strategy(self, strategy: &str) -> Trade;
    fn with_coin(self, coin: &str) -> Trade;
    fn from_bot(self) -> Trade;
    fn entered_at(self, entry_time: DateTime<Utc>) -> Trade;
}

impl TradeFixture for Trade {
    fn with_emotion(mut self, emotion: TradeEmotion) -> Trade {
        self.emotion = Some(emotion);
        self
    }

    fn with_strategy(mut self, strategy: &str) -> Trade {
        self.strategy = Some(strategy.to_string());
        self
    }

    fn with_coin(mut self, coin: &str) -> Trade {
        self.coin = coin.to_string();
        self
    }

    fn from_bot(mut self) -> Trade {
        self.is_from_bot = true;
        self.bot_name = Some("GridBot".to_string());
        self
    }

    fn entered_at(mut self, entry_time: DateTime<Utc>) -> Trade {
        self.entry_time = entry_time;
        self.exit_time = Some(entry_time + Duration::minutes(30));
        self
    }
}
