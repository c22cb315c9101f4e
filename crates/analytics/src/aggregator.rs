//! Grouped performance breakdowns.
//!
//! Every view groups closed trades by one dimension and reports count,
//! win rate, total and average PnL per group. Groups are collected in a
//! `BTreeMap` and then stable-sorted, so equal sort keys fall back to
//! ascending group key order.

use crate::error::AnalyticsError;
use crate::report::{CoinPerformance, EmotionPerformance, HourPerformance, StrategyPerformance};
use core_types::{Trade, TradeEmotion};
use rust_decimal::Decimal;
use std::collections::BTreeMap;

/// Running totals for one group of trades.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GroupStats {
    pub trade_count: usize,
    pub wins: usize,
    pub total_pnl: Decimal,
}

impl GroupStats {
    pub fn push(&mut self, trade: &Trade) -> Result<(), AnalyticsError> {
        self.trade_count += 1;
        if trade.is_win() {
            self.wins += 1;
        }
        self.total_pnl = checked_add(self.total_pnl, trade.pnl_or_zero())?;
        Ok(())
    }

    pub fn from_trades<'a, I>(trades: I) -> Result<Self, AnalyticsError>
    where
        I: IntoIterator<Item = &'a Trade>,
    {
        let mut stats = GroupStats::default();
        for trade in trades {
            stats.push(trade)?;
        }
        Ok(stats)
    }

    pub fn losses(&self) -> usize {
        self.trade_count - self.wins
    }

    /// Share of trades with `pnl > 0`, in percent.
    pub fn win_rate(&self) -> Result<Decimal, AnalyticsError> {
        percentage(self.wins, self.trade_count, "win_rate")
    }

    /// Share of trades with `pnl <= 0`, in percent.
    pub fn loss_rate(&self) -> Result<Decimal, AnalyticsError> {
        percentage(self.losses(), self.trade_count, "loss_rate")
    }

    pub fn average_pnl(&self) -> Result<Decimal, AnalyticsError> {
        mean(self.total_pnl, self.trade_count, "average_pnl")
    }
}

/// Groups closed trades by the key `selector` returns, skipping trades for
/// which it returns `None`. Open trades are never grouped.
pub fn group_by<'a, I, K, F>(trades: I, selector: F) -> Result<BTreeMap<K, GroupStats>, AnalyticsError>
where
    I: IntoIterator<Item = &'a Trade>,
    K: Ord,
    F: Fn(&Trade) -> Option<K>,
{
    let mut groups: BTreeMap<K, GroupStats> = BTreeMap::new();
    for trade in trades.into_iter().filter(|t| t.is_closed()) {
        if let Some(key) = selector(trade) {
            groups.entry(key).or_default().push(trade)?;
        }
    }
    Ok(groups)
}

/// Per-emotion performance, most frequently used emotion first.
pub fn by_emotion(trades: &[Trade]) -> Result<Vec<EmotionPerformance>, AnalyticsError> {
    let mut rows = group_by(trades, |t| t.emotion)?
        .into_iter()
        .map(|(emotion, stats): (TradeEmotion, GroupStats)| -> Result<_, AnalyticsError> {
            Ok(EmotionPerformance {
                emotion,
                trade_count: stats.trade_count,
                win_rate: stats.win_rate()?,
                total_pnl: stats.total_pnl,
                average_pnl: stats.average_pnl()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by(|a, b| b.trade_count.cmp(&a.trade_count));
    Ok(rows)
}

/// Per-strategy performance, most profitable strategy first.
pub fn by_strategy(trades: &[Trade]) -> Result<Vec<StrategyPerformance>, AnalyticsError> {
    let mut rows = group_by(trades, |t| t.strategy.clone())?
        .into_iter()
        .map(|(strategy, stats)| -> Result<_, AnalyticsError> {
            Ok(StrategyPerformance {
                strategy,
                trade_count: stats.trade_count,
                win_rate: stats.win_rate()?,
                total_pnl: stats.total_pnl,
                average_pnl: stats.average_pnl()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by(|a, b| b.total_pnl.cmp(&a.total_pnl));
    Ok(rows)
}

/// Per-coin performance, most traded coin first.
pub fn by_coin(trades: &[Trade]) -> Result<Vec<CoinPerformance>, AnalyticsError> {
    let mut rows = group_by(trades, |t| Some(t.coin.clone()))?
        .into_iter()
        .map(|(coin, stats)| -> Result<_, AnalyticsError> {
            Ok(CoinPerformance {
                coin,
                trade_count: stats.trade_count,
                win_rate: stats.win_rate()?,
                total_pnl: stats.total_pnl,
                average_pnl: stats.average_pnl()?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    rows.sort_by(|a, b| b.trade_count.cmp(&a.trade_count));
    Ok(rows)
}

/// Per-entry-hour performance, in hour order. Hours without trades are omitted.
pub fn by_hour(trades: &[Trade]) -> Result<Vec<HourPerformance>, AnalyticsError> {
    // BTreeMap iteration already yields ascending hours.
    group_by(trades, |t| Some(t.entry_hour()))?
        .into_iter()
        .map(|(hour, stats)| -> Result<_, AnalyticsError> {
            Ok(HourPerformance {
                hour,
                trade_count: stats.trade_count,
                win_rate: stats.win_rate()?,
                total_pnl: stats.total_pnl,
            })
        })
        .collect()
}

pub(crate) fn percentage(part: usize, whole: usize, metric: &str) -> Result<Decimal, AnalyticsError> {
    if whole == 0 {
        return Err(AnalyticsError::DivisionByZero(metric.to_string()));
    }
    Ok(Decimal::from(part) / Decimal::from(whole) * Decimal::ONE_HUNDRED)
}

pub(crate) fn mean(total: Decimal, count: usize, metric: &str) -> Result<Decimal, AnalyticsError> {
    if count == 0 {
        return Err(AnalyticsError::DivisionByZero(metric.to_string()));
    }
    total
        .checked_div(Decimal::from(count))
        .ok_or_else(|| AnalyticsError::Calculation(format!("overflow while computing {}", metric)))
}

pub(crate) fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, AnalyticsError> {
    a.checked_add(b)
        .ok_or_else(|| AnalyticsError::Calculation("PnL total overflowed".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed, open, TradeFixture};
    use core_types::TradeDirection;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    #[test]
    fn group_stats_treat_zero_as_loss() {
        let trades = vec![closed(dec!(10), 9), closed(dec!(0), 9), closed(dec!(-5), 9)];
        let stats = GroupStats::from_trades(&trades).unwrap();
        assert_eq!(stats.trade_count, 3);
        assert_eq!(stats.wins, 1);
        assert_eq!(stats.losses(), 2);
        assert_eq!(stats.total_pnl, dec!(5));
    }

    #[test]
    fn empty_group_rates_are_guarded() {
        let stats = GroupStats::default();
        assert!(matches!(stats.win_rate(), Err(AnalyticsError::DivisionByZero(_))));
        assert!(matches!(stats.average_pnl(), Err(AnalyticsError::DivisionByZero(_))));
    }

    #[test]
    fn emotion_view_skips_untagged_and_sorts_by_count() {
        let trades = vec![
            closed(dec!(10), 9).with_emotion(TradeEmotion::Calm),
            closed(dec!(-10), 9).with_emotion(TradeEmotion::Fomo),
            closed(dec!(-20), 9).with_emotion(TradeEmotion::Fomo),
            closed(dec!(30), 9).with_emotion(TradeEmotion::Fomo),
            closed(dec!(99), 9),
        ];
        let rows = by_emotion(&trades).unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].emotion, TradeEmotion::Fomo);
        assert_eq!(rows[0].trade_count, 3);
        assert_eq!(rows[0].total_pnl, dec!(0));
        assert_eq!(rows[0].average_pnl, dec!(0));
        assert_eq!(rows[0].win_rate.round_dp(2), dec!(33.33));
        assert_eq!(rows[1].emotion, TradeEmotion::Calm);
        assert_eq!(rows[1].win_rate, dec!(100));
    }

    #[test]
    fn strategy_view_sorts_by_total_pnl() {
        let trades = vec![
            closed(dec!(5), 9).with_strategy("Scalp"),
            closed(dec!(5), 9).with_strategy("Scalp"),
            closed(dec!(50), 9).with_strategy("Swing"),
            closed(dec!(-40), 9).with_strategy("Breakout"),
            closed(dec!(1000), 9),
        ];
        let rows = by_strategy(&trades).unwrap();
        let names: Vec<_> = rows.iter().map(|r| r.strategy.as_str()).collect();
        assert_eq!(names, vec!["Swing", "Scalp", "Breakout"]);
        assert_eq!(rows[1].trade_count, 2);
        assert_eq!(rows[1].average_pnl, dec!(5));
    }

    #[test]
    fn coin_view_sorts_by_count_with_key_tiebreak() {
        let trades = vec![
            closed(dec!(1), 9).with_coin("SOL"),
            closed(dec!(1), 9).with_coin("ETH"),
            closed(dec!(1), 9).with_coin("BTC"),
            closed(dec!(1), 9).with_coin("BTC"),
        ];
        let rows = by_coin(&trades).unwrap();
        let coins: Vec<_> = rows.iter().map(|r| r.coin.as_str()).collect();
        assert_eq!(coins, vec!["BTC", "ETH", "SOL"]);
    }

    #[test]
    fn hour_view_is_ascending() {
        let trades = vec![
            closed(dec!(1), 22),
            closed(dec!(-1), 3),
            closed(dec!(2), 14),
            closed(dec!(2), 3),
        ];
        let rows = by_hour(&trades).unwrap();
        let hours: Vec<_> = rows.iter().map(|r| r.hour).collect();
        assert_eq!(hours, vec![3, 14, 22]);
        assert_eq!(rows[0].trade_count, 2);
        assert_eq!(rows[0].win_rate, dec!(50));
    }

    #[test]
    fn open_trades_are_never_grouped() {
        let trades = vec![open(TradeDirection::Long, 9), closed(dec!(3), 9)];
        let rows = by_coin(&trades).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].trade_count, 1);
    }

    #[test]
    fn groups_are_exhaustive_and_disjoint() {
        let coins = ["BTC", "ETH", "SOL", "XRP"];
        let trades: Vec<Trade> = (0..40)
            .map(|i| {
                closed(Decimal::from(i % 7) - dec!(3), (i % 24) as u32)
                    .with_coin(coins[i as usize % coins.len()])
            })
            .collect();

        let by_coin_rows = by_coin(&trades).unwrap();
        let by_hour_rows = by_hour(&trades).unwrap();

        let coin_total: usize = by_coin_rows.iter().map(|r| r.trade_count).sum();
        let hour_total: usize = by_hour_rows.iter().map(|r| r.trade_count).sum();
        assert_eq!(coin_total, trades.len());
        assert_eq!(hour_total, trades.len());

        let distinct: HashSet<_> = by_coin_rows.iter().map(|r| r.coin.clone()).collect();
        assert_eq!(distinct.len(), by_coin_rows.len());

        let pnl_total: Decimal = by_coin_rows.iter().map(|r| r.total_pnl).sum();
        let expected: Decimal = trades.iter().map(|t| t.pnl_or_zero()).sum();
        assert_eq!(pnl_total, expected);
    }
}
