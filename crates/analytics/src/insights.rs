//! Heuristic behavioural insights.
//!
//! The engine runs a fixed, ordered battery of rules over a sample of the most
//! recent closed trades. Each rule reads the sample and emits at most one
//! insight; rules share no state. The thresholds are part of the product's
//! behaviour and are deliberately not configurable.

use crate::aggregator::{group_by, GroupStats};
use crate::error::AnalyticsError;
use crate::report::{Insight, InsightKind};
use core_types::{Trade, TradeEmotion};
use rust_decimal::prelude::*;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;
use tracing::debug;

/// How many of the most recent closed trades the battery looks at.
pub const INSIGHT_SAMPLE_SIZE: usize = 100;

const MIN_EMOTION_TRADES: usize = 5;
const FOMO_LOSS_RATE: Decimal = dec!(60);
const NIGHT_LAST_HOUR: u32 = 6;
const MIN_NIGHT_TRADES: usize = 5;
const NIGHT_LOSS_RATE: Decimal = dec!(65);
const MIN_STRATEGY_TRADES: usize = 5;
const MIN_COIN_TRADES: usize = 5;
const BEST_COIN_WIN_RATE: Decimal = dec!(60);
const WORST_COIN_WIN_RATE: Decimal = dec!(40);
const MIN_WIN_STREAK: usize = 5;
const CALM_WIN_RATE: Decimal = dec!(55);
const MIN_SOURCE_TRADES: usize = 10;
const SOURCE_WIN_RATE_GAP: Decimal = dec!(10);

type Rule = fn(&[&Trade]) -> Result<Option<Insight>, AnalyticsError>;

/// The battery, in display order.
const RULES: [(&str, Rule); 9] = [
    ("fomo_warning", fomo_warning),
    ("revenge_warning", revenge_warning),
    ("night_trading_warning", night_trading_warning),
    ("best_strategy", best_strategy),
    ("best_coin", best_coin),
    ("worst_coin", worst_coin),
    ("win_streak", win_streak),
    ("calm_trading", calm_trading),
    ("bot_vs_manual", bot_vs_manual),
];

/// Generates the ordered insight list for a user's trades.
///
/// Only closed trades are considered. The sample is the `INSIGHT_SAMPLE_SIZE`
/// most recent of them by entry time, so callers may pass a larger history.
pub fn generate_insights(trades: &[Trade]) -> Result<Vec<Insight>, AnalyticsError> {
    let sample = recent_closed_sample(trades);

    if sample.is_empty() {
        return Ok(vec![Insight::new(
            InsightKind::Tip,
            "First Step",
            "No trades recorded yet. Add your first trade and start analyzing!",
            "🚀",
        )]);
    }

    let mut insights = Vec::new();
    for (name, rule) in RULES {
        if let Some(insight) = rule(&sample)? {
            debug!(rule = name, title = %insight.title, "Insight rule fired.");
            insights.push(insight);
        }
    }

    if insights.is_empty() {
        insights.push(Insight::new(
            InsightKind::Tip,
            "More Data Needed",
            "Log more trades and tag them with emotions and strategies for a deeper analysis!",
            "📊",
        ));
    }

    Ok(insights)
}

fn recent_closed_sample(trades: &[Trade]) -> Vec<&Trade> {
    let mut sample: Vec<&Trade> = trades.iter().filter(|t| t.is_closed()).collect();
    sample.sort_by(|a, b| b.entry_time.cmp(&a.entry_time));
    sample.truncate(INSIGHT_SAMPLE_SIZE);
    sample
}

fn tagged<'a>(sample: &[&'a Trade], emotion: TradeEmotion) -> Vec<&'a Trade> {
    sample.iter().copied().filter(|t| t.emotion == Some(emotion)).collect()
}

fn fomo_warning(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let fomo = tagged(sample, TradeEmotion::Fomo);
    if fomo.len() < MIN_EMOTION_TRADES {
        return Ok(None);
    }

    let loss_rate = GroupStats::from_trades(fomo)?.loss_rate()?;
    if loss_rate < FOMO_LOSS_RATE {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Warning,
        "FOMO Warning",
        format!(
            "{}% of the trades you opened on FOMO ended in a loss. Don't rush, opportunities always come back!",
            percent(loss_rate)
        ),
        "😰",
    )))
}

fn revenge_warning(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let revenge = tagged(sample, TradeEmotion::Revenge);
    if revenge.is_empty() {
        return Ok(None);
    }

    let total = GroupStats::from_trades(revenge)?.total_pnl;
    if total >= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Warning,
        "Revenge Trading",
        format!(
            "Revenge trades cost you ${} in total. Take a break after a loss!",
            money(total.abs())
        ),
        "😤",
    )))
}

fn night_trading_warning(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let night: Vec<&Trade> = sample
        .iter()
        .copied()
        .filter(|t| t.entry_hour() <= NIGHT_LAST_HOUR)
        .collect();
    if night.len() < MIN_NIGHT_TRADES {
        return Ok(None);
    }

    let loss_rate = GroupStats::from_trades(night)?.loss_rate()?;
    if loss_rate < NIGHT_LOSS_RATE {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Warning,
        "Night Trading",
        format!(
            "{}% of the trades you opened between 00:00 and 06:00 ended in a loss. Avoid trading while tired!",
            percent(loss_rate)
        ),
        "🌙",
    )))
}

/// Groups the sample and lists the groups in order of first appearance.
///
/// The sample is newest first, so after a stable sort on a metric a tie goes
/// to the group holding the most recent trade.
fn groups_by_recency<K, F>(sample: &[&Trade], selector: F) -> Result<Vec<(K, GroupStats)>, AnalyticsError>
where
    K: Ord,
    F: Fn(&Trade) -> Option<K>,
{
    let mut first_seen: BTreeMap<K, usize> = BTreeMap::new();
    for (idx, trade) in sample.iter().copied().enumerate() {
        if let Some(key) = selector(trade) {
            first_seen.entry(key).or_insert(idx);
        }
    }

    let mut groups: Vec<(K, GroupStats)> = group_by(sample.iter().copied(), &selector)?.into_iter().collect();
    groups.sort_by_key(|(key, _)| first_seen.get(key).copied().unwrap_or(usize::MAX));
    Ok(groups)
}

fn best_strategy(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let mut groups = groups_by_recency(sample, |t| t.strategy.clone())?;
    groups.sort_by(|a, b| b.1.total_pnl.cmp(&a.1.total_pnl));

    // Only the single most profitable strategy is considered.
    let Some((strategy, stats)) = groups.into_iter().next() else {
        return Ok(None);
    };
    if stats.trade_count < MIN_STRATEGY_TRADES || stats.total_pnl <= Decimal::ZERO {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Achievement,
        "Best Strategy",
        format!(
            "The '{}' strategy earned ${}. Keep working with it!",
            strategy,
            money(stats.total_pnl)
        ),
        "🏆",
    )))
}

/// Coin groups with enough trades to be judged, most recently traded first.
fn qualifying_coins(sample: &[&Trade]) -> Result<Vec<(String, Decimal)>, AnalyticsError> {
    groups_by_recency(sample, |t| Some(t.coin.clone()))?
        .into_iter()
        .filter(|(_, stats)| stats.trade_count >= MIN_COIN_TRADES)
        .map(|(coin, stats)| stats.win_rate().map(|rate| (coin, rate)))
        .collect()
}

fn best_coin(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let mut coins = qualifying_coins(sample)?;
    coins.sort_by(|a, b| b.1.cmp(&a.1));

    let Some((coin, win_rate)) = coins.into_iter().next() else {
        return Ok(None);
    };
    if win_rate < BEST_COIN_WIN_RATE {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Tip,
        format!("{} Performance", coin),
        format!(
            "{}% win rate on your {} trades! This coin works well for you.",
            percent(win_rate),
            coin
        ),
        "💰",
    )))
}

fn worst_coin(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let mut coins = qualifying_coins(sample)?;
    coins.sort_by(|a, b| a.1.cmp(&b.1));

    let Some((coin, win_rate)) = coins.into_iter().next() else {
        return Ok(None);
    };
    if win_rate >= WORST_COIN_WIN_RATE {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Warning,
        format!("{} Caution", coin),
        format!(
            "Only {}% win rate on your {} trades. Reconsider trading this coin!",
            percent(win_rate),
            coin
        ),
        "⚠️",
    )))
}

/// Longest run of consecutive winning trades, in ascending entry order.
pub fn longest_win_streak(trades: &[&Trade]) -> usize {
    let mut ordered: Vec<&Trade> = trades.to_vec();
    ordered.sort_by(|a, b| a.entry_time.cmp(&b.entry_time));

    let mut longest = 0;
    let mut current = 0;
    for trade in ordered {
        if trade.is_win() {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

fn win_streak(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let streak = longest_win_streak(sample);
    if streak < MIN_WIN_STREAK {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Achievement,
        "Winning Streak",
        format!("Your longest winning streak: {} trades! Great performance!", streak),
        "🔥",
    )))
}

fn calm_trading(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let calm = tagged(sample, TradeEmotion::Calm);
    if calm.len() < MIN_EMOTION_TRADES {
        return Ok(None);
    }

    let win_rate = GroupStats::from_trades(calm)?.win_rate()?;
    if win_rate < CALM_WIN_RATE {
        return Ok(None);
    }

    Ok(Some(Insight::new(
        InsightKind::Tip,
        "Stay Calm, Win",
        format!(
            "Your win rate while calm: {}%. Keep your emotions under control!",
            percent(win_rate)
        ),
        "😎",
    )))
}

fn bot_vs_manual(sample: &[&Trade]) -> Result<Option<Insight>, AnalyticsError> {
    let (bot, manual): (Vec<&Trade>, Vec<&Trade>) = sample.iter().copied().partition(|t| t.is_from_bot);
    if bot.len() < MIN_SOURCE_TRADES || manual.len() < MIN_SOURCE_TRADES {
        return Ok(None);
    }

    let bot_rate = GroupStats::from_trades(bot)?.win_rate()?;
    let manual_rate = GroupStats::from_trades(manual)?.win_rate()?;
    if (bot_rate - manual_rate).abs() < SOURCE_WIN_RATE_GAP {
        return Ok(None);
    }

    let (better, rate) = if bot_rate > manual_rate {
        ("Bot", bot_rate)
    } else {
        ("Manual", manual_rate)
    };

    Ok(Some(Insight::new(
        InsightKind::Tip,
        "Bot vs Manual",
        format!(
            "{} trades perform better ({}% win rate). Adjust your approach accordingly!",
            better,
            percent(rate)
        ),
        "🤖",
    )))
}

/// Renders a percentage with no decimals.
fn percent(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.0}", rounded)
}

/// Renders a monetary amount with two decimals.
fn money(value: Decimal) -> String {
    let rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    format!("{:.2}", rounded)
}
