//! Terminal rendering of the analytics views.

use analytics::{EmotionPerformance, Insight, SummaryReport};
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use rust_decimal::Decimal;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn money(value: Decimal) -> String {
    format!("{:.2}", value.round_dp(2))
}

fn rate(value: Decimal) -> String {
    format!("{:.2}%", value.round_dp(2))
}

pub fn summary_table(summary: &SummaryReport) -> Table {
    let mut table = new_table(vec!["Metric", "Value"]);
    table
        .add_row(vec!["Total Trades".to_string(), summary.total_trades.to_string()])
        .add_row(vec!["Winning Trades".to_string(), summary.winning_trades.to_string()])
        .add_row(vec!["Losing Trades".to_string(), summary.losing_trades.to_string()])
        .add_row(vec!["Win Rate".to_string(), rate(summary.win_rate)])
        .add_row(vec!["Total PnL".to_string(), money(summary.total_pnl)])
        .add_row(vec!["Average PnL".to_string(), money(summary.average_pnl)])
        .add_row(vec!["Best Trade".to_string(), money(summary.best_trade)])
        .add_row(vec!["Worst Trade".to_string(), money(summary.worst_trade)])
        .add_row(vec!["Average Win".to_string(), money(summary.average_win)])
        .add_row(vec!["Average Loss".to_string(), money(summary.average_loss)]);
    table
}

pub fn emotion_table(rows: &[EmotionPerformance]) -> Table {
    let mut table = new_table(vec!["Emotion", "Trades", "Win Rate", "Total PnL", "Average PnL"]);
    for row in rows {
        table.add_row(vec![
            format!("{} {}", row.emotion.emoji(), row.emotion.label()),
            row.trade_count.to_string(),
            rate(row.win_rate),
            money(row.total_pnl),
            money(row.average_pnl),
        ]);
    }
    table
}

pub fn insights_table(insights: &[Insight]) -> Table {
    let mut table = new_table(vec!["", "Type", "Title", "Message"]);
    for insight in insights {
        table.add_row(vec![
            insight.emoji.clone().unwrap_or_default(),
            insight.kind.to_string(),
            insight.title.clone(),
            insight.message.clone(),
        ]);
    }
    table
}
