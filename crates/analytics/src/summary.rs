use crate::aggregator::{checked_add, mean, percentage};
use crate::error::AnalyticsError;
use crate::report::SummaryReport;
use core_types::Trade;
use rust_decimal::Decimal;

/// Computes whole-set statistics over closed trades.
///
/// Open trades in the input are ignored. An empty set yields the zeroed
/// `SummaryReport`; averages of an empty winning or losing subset are zero.
pub fn summarize(trades: &[Trade]) -> Result<SummaryReport, AnalyticsError> {
    let mut report = SummaryReport::new();

    let pnls: Vec<Decimal> = trades
        .iter()
        .filter(|t| t.is_closed())
        .map(Trade::pnl_or_zero)
        .collect();

    if pnls.is_empty() {
        return Ok(report);
    }

    let mut gross_profit = Decimal::ZERO;
    let mut gross_loss = Decimal::ZERO;

    for pnl in &pnls {
        report.total_pnl = checked_add(report.total_pnl, *pnl)?;
        if *pnl > Decimal::ZERO {
            report.winning_trades += 1;
            gross_profit = checked_add(gross_profit, *pnl)?;
        } else {
            report.losing_trades += 1;
            gross_loss = checked_add(gross_loss, *pnl)?;
        }
    }

    report.total_trades = pnls.len();
    report.win_rate = percentage(report.winning_trades, report.total_trades, "win_rate")?;
    report.average_pnl = mean(report.total_pnl, report.total_trades, "average_pnl")?;
    report.best_trade = pnls.iter().copied().max().unwrap_or_default();
    report.worst_trade = pnls.iter().copied().min().unwrap_or_default();

    if report.winning_trades > 0 {
        report.average_win = mean(gross_profit, report.winning_trades, "average_win")?;
    }
    if report.losing_trades > 0 {
        report.average_loss = mean(gross_loss, report.losing_trades, "average_loss")?;
    }

    Ok(report)
}
