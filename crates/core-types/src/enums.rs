use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The side of a position. Encoded on the wire as its declaration index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TradeDirection {
    /// Profits when the price goes up.
    Long,
    /// Profits when the price goes down.
    Short,
}

impl TradeDirection {
    /// Parses a case-insensitive label such as `"long"` or `"SHORT"`.
    pub fn from_label(label: &str) -> Result<Self, CoreError> {
        match label.trim().to_ascii_lowercase().as_str() {
            "long" => Ok(TradeDirection::Long),
            "short" => Ok(TradeDirection::Short),
            other => Err(CoreError::InvalidInput(
                "direction".to_string(),
                format!("unknown direction '{}'", other),
            )),
        }
    }
}

impl From<TradeDirection> for u8 {
    fn from(direction: TradeDirection) -> Self {
        match direction {
            TradeDirection::Long => 0,
            TradeDirection::Short => 1,
        }
    }
}

impl TryFrom<u8> for TradeDirection {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(TradeDirection::Long),
            1 => Ok(TradeDirection::Short),
            other => Err(CoreError::InvalidInput(
                "direction".to_string(),
                format!("{} is not a valid direction code", other),
            )),
        }
    }
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::Long => write!(f, "Long"),
            TradeDirection::Short => write!(f, "Short"),
        }
    }
}

/// The psychological state a trader tags a trade with at entry.
///
/// Variant order is significant: it defines the integer wire encoding
/// (`FOMO = 0` … `Anxious = 8`) and the tie-break order of emotion groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum TradeEmotion {
    Fomo,
    Fear,
    Greed,
    Revenge,
    Confident,
    Uncertain,
    Calm,
    Excited,
    Anxious,
}

impl TradeEmotion {
    pub const ALL: [TradeEmotion; 9] = [
        TradeEmotion::Fomo,
        TradeEmotion::Fear,
        TradeEmotion::Greed,
        TradeEmotion::Revenge,
        TradeEmotion::Confident,
        TradeEmotion::Uncertain,
        TradeEmotion::Calm,
        TradeEmotion::Excited,
        TradeEmotion::Anxious,
    ];

    /// Display label used by presentation code.
    pub fn label(&self) -> &'static str {
        match self {
            TradeEmotion::Fomo => "FOMO",
            TradeEmotion::Fear => "Fear",
            TradeEmotion::Greed => "Greed",
            TradeEmotion::Revenge => "Revenge",
            TradeEmotion::Confident => "Confident",
            TradeEmotion::Uncertain => "Uncertain",
            TradeEmotion::Calm => "Calm",
            TradeEmotion::Excited => "Excited",
            TradeEmotion::Anxious => "Anxious",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            TradeEmotion::Fomo => "😰",
            TradeEmotion::Fear => "😨",
            TradeEmotion::Greed => "🤑",
            TradeEmotion::Revenge => "😤",
            TradeEmotion::Confident => "😎",
            TradeEmotion::Uncertain => "🤔",
            TradeEmotion::Calm => "😌",
            TradeEmotion::Excited => "🤩",
            TradeEmotion::Anxious => "😟",
        }
    }
}

impl From<TradeEmotion> for u8 {
    fn from(emotion: TradeEmotion) -> Self {
        emotion as u8
    }
}

impl TryFrom<u8> for TradeEmotion {
    type Error = CoreError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        TradeEmotion::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| {
                CoreError::InvalidInput(
                    "emotion".to_string(),
                    format!("{} is not a valid emotion code", value),
                )
            })
    }
}

impl fmt::Display for TradeEmotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
