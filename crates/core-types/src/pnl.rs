use crate::enums::TradeDirection;
use crate::error::CoreError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// The realized result of a closed position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PnlResult {
    /// Profit or loss in quote currency.
    pub pnl: Decimal,
    /// Leveraged return relative to the entry price, in percent.
    pub pnl_percent: Decimal,
}

/// Computes the realized PnL of a position.
///
/// Returns `Ok(None)` for an open position (no exit price). No rounding is
/// applied; the result keeps the full precision of the decimal inputs.
///
/// * `pnl_percent = (price differential / entry_price) * 100 * leverage`
/// * `pnl = position_size * pnl_percent / 100`
///
/// where the differential is `exit - entry` for longs and `entry - exit` for shorts.
pub fn compute_pnl(
    direction: TradeDirection,
    entry_price: Decimal,
    exit_price: Option<Decimal>,
    leverage: i32,
    position_size: Decimal,
) -> Result<Option<PnlResult>, CoreError> {
    if entry_price <= Decimal::ZERO {
        return Err(CoreError::InvalidInput(
            "entry_price".to_string(),
            format!("must be positive, got {}", entry_price),
        ));
    }
    if leverage < 1 {
        return Err(CoreError::InvalidInput(
            "leverage".to_string(),
            format!("must be at least 1, got {}", leverage),
        ));
    }

    let Some(exit_price) = exit_price else {
        return Ok(None);
    };

    let differential = match direction {
        TradeDirection::Long => exit_price.checked_sub(entry_price),
        TradeDirection::Short => entry_price.checked_sub(exit_price),
    }
    .ok_or_else(|| overflow("price differential"))?;

    let pnl_percent = differential
        .checked_div(entry_price)
        .and_then(|ratio| ratio.checked_mul(HUNDRED))
        .and_then(|pct| pct.checked_mul(Decimal::from(leverage)))
        .ok_or_else(|| overflow("pnl_percent"))?;

    let pnl = pnl_percent
        .checked_div(HUNDRED)
        .and_then(|fraction| position_size.checked_mul(fraction))
        .ok_or_else(|| overflow("pnl"))?;

    Ok(Some(PnlResult { pnl, pnl_percent }))
}

fn overflow(metric: &str) -> CoreError {
    CoreError::Calculation(format!("arithmetic overflow while computing {}", metric))
}
