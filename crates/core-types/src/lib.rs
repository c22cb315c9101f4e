//! # Trade Diary Core Types
//!
//! The shared vocabulary of the workspace: the `Trade` entity, its write
//! inputs, listing filters and the PnL calculation that every write path runs
//! before a trade is persisted.
//!
//! This crate has no knowledge of storage or transport.

pub mod enums;
pub mod error;
pub mod pnl;
pub mod structs;
pub mod timestamp;

// Re-export the core types to provide a clean public API.
pub use enums::{TradeDirection, TradeEmotion};
pub use error::CoreError;
pub use pnl::{compute_pnl, PnlResult};
pub use structs::{BotTradeImport, DateRange, NewTrade, Trade, TradeFilter, TradePatch};
