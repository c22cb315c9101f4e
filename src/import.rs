//! Loading bot exports from disk.
//!
//! `.json` files hold an array of import rows in the API's wire format.
//! `.csv` files carry a header row; column names are matched
//! case-insensitively and `leverage` / `botName` are optional.

use anyhow::{bail, Context, Result};
use core_types::{structs::DEFAULT_BOT_NAME, timestamp::parse_timestamp, BotTradeImport, TradeDirection};
use rust_decimal::Decimal;
use std::{collections::HashMap, io::Read, path::Path, str::FromStr};

/// Reads every row of a bot export, choosing the parser by file extension.
pub fn load_import_file(path: &Path) -> Result<Vec<BotTradeImport>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("csv") => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("Failed to open {}", path.display()))?;
            parse_csv(file)
        }
        Some("json") => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
        }
        _ => bail!("Unsupported import file '{}': expected .csv or .json", path.display()),
    }
}

/// Parses CSV rows into import records.
pub fn parse_csv<R: Read>(reader: R) -> Result<Vec<BotTradeImport>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns: HashMap<String, usize> = reader
        .headers()
        .context("Failed to read CSV header")?
        .iter()
        .enumerate()
        .map(|(idx, name)| (name.to_ascii_lowercase(), idx))
        .collect();

    let mut rows = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        // Header is line 1.
        let line = row_idx + 2;
        let record = result.with_context(|| format!("Failed to read line {}", line))?;
        let row = CsvRow { columns: &columns, record: &record, line };

        rows.push(BotTradeImport {
            coin: row.required("coin")?.to_string(),
            entry_price: row.decimal("entryPrice")?,
            exit_price: row.decimal("exitPrice")?,
            position_size: row.decimal("positionSize")?,
            direction: parse_direction(row.required("direction")?)
                .with_context(|| format!("Invalid direction on line {}", line))?,
            entry_time: parse_timestamp(row.required("entryTime")?)
                .with_context(|| format!("Invalid entryTime on line {}", line))?,
            exit_time: parse_timestamp(row.required("exitTime")?)
                .with_context(|| format!("Invalid exitTime on line {}", line))?,
            leverage: match row.optional("leverage") {
                Some(raw) => raw
                    .parse()
                    .with_context(|| format!("Invalid leverage '{}' on line {}", raw, line))?,
                None => 1,
            },
            bot_name: row
                .optional("botName")
                .unwrap_or(DEFAULT_BOT_NAME)
                .to_string(),
        });
    }

    Ok(rows)
}

/// Accepts `long` / `short` in any case, or the numeric wire codes.
fn parse_direction(raw: &str) -> Result<TradeDirection> {
    if let Ok(code) = raw.parse::<u8>() {
        return Ok(TradeDirection::try_from(code)?);
    }
    Ok(TradeDirection::from_label(raw)?)
}

struct CsvRow<'a> {
    columns: &'a HashMap<String, usize>,
    record: &'a csv::StringRecord,
    line: usize,
}

impl<'a> CsvRow<'a> {
    fn optional(&self, column: &str) -> Option<&'a str> {
        self.columns
            .get(&column.to_ascii_lowercase())
            .and_then(|idx| self.record.get(*idx))
            .filter(|value| !value.is_empty())
    }

    fn required(&self, column: &str) -> Result<&'a str> {
        self.optional(column)
            .with_context(|| format!("Missing {} on line {}", column, self.line))
    }

    fn decimal(&self, column: &str) -> Result<Decimal> {
        let raw = self.required(column)?;
        Decimal::from_str(raw)
            .with_context(|| format!("Invalid {} '{}' on line {}", column, raw, self.line))
    }
}
