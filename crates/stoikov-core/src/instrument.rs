//! The closed registry of supported instruments.
//!
//! Instruments carry dense contiguous indices so per-instrument state can
//! live in fixed arrays with O(1) lookup and zero hashing. String resolution
//! happens once at the event boundary: `parse` returns `None` for unknown
//! symbols and the caller must drop the event without touching state.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Supported trading instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Instrument {
    Btc = 0,
    Eth = 1,
    Sol = 2,
    Bnb = 3,
}

impl Instrument {
    /// Number of supported instruments.
    pub const COUNT: usize = 4;

    /// All instruments in index order.
    pub const ALL: [Instrument; Self::COUNT] = [
        Instrument::Btc,
        Instrument::Eth,
        Instrument::Sol,
        Instrument::Bnb,
    ];

    /// Resolve a symbol string to an instrument.
    ///
    /// Accepts both the canonical exchange form (`"BTCUSDT"`) and the short
    /// form (`"BTC"`). Returns `None` for anything else; callers must ignore
    /// the event entirely in that case.
    pub fn parse(symbol: &str) -> Option<Self> {
        match symbol {
            "BTCUSDT" | "BTC" => Some(Self::Btc),
            "ETHUSDT" | "ETH" => Some(Self::Eth),
            "SOLUSDT" | "SOL" => Some(Self::Sol),
            "BNBUSDT" | "BNB" => Some(Self::Bnb),
            _ => None,
        }
    }

    /// Dense index in `[0, COUNT)`.
    #[inline]
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Inverse of `index`.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// Canonical exchange symbol (e.g. `"BTCUSDT"`).
    pub fn canonical(&self) -> &'static str {
        match self {
            Self::Btc => "BTCUSDT",
            Self::Eth => "ETHUSDT",
            Self::Sol => "SOLUSDT",
            Self::Bnb => "BNBUSDT",
        }
    }

    /// Short symbol (e.g. `"BTC"`).
    pub fn short(&self) -> &'static str {
        match self {
            Self::Btc => "BTC",
            Self::Eth => "ETH",
            Self::Sol => "SOL",
            Self::Bnb => "BNB",
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical())
    }
}

impl Serialize for Instrument {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.canonical())
    }
}

impl<'de> Deserialize<'de> for Instrument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).ok_or_else(|| D::Error::custom(format!("unknown instrument: {s}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_canonical_and_short() {
        assert_eq!(Instrument::parse("BTCUSDT"), Some(Instrument::Btc));
        assert_eq!(Instrument::parse("BTC"), Some(Instrument::Btc));
        assert_eq!(Instrument::parse("ETHUSDT"), Some(Instrument::Eth));
        assert_eq!(Instrument::parse("SOL"), Some(Instrument::Sol));
        assert_eq!(Instrument::parse("BNBUSDT"), Some(Instrument::Bnb));
    }

    #[test]
    fn test_parse_unknown() {
        assert_eq!(Instrument::parse("DOGEUSDT"), None);
        assert_eq!(Instrument::parse(""), None);
        assert_eq!(Instrument::parse("btcusdt"), None);
    }

    #[test]
    fn test_index_name_bijection() {
        for instrument in Instrument::ALL {
            assert_eq!(Instrument::from_index(instrument.index()), Some(instrument));
            assert_eq!(Instrument::parse(instrument.canonical()), Some(instrument));
            assert_eq!(Instrument::parse(instrument.short()), Some(instrument));
        }
        assert_eq!(Instrument::from_index(Instrument::COUNT), None);
    }

    #[test]
    fn test_indices_are_dense() {
        for (i, instrument) in Instrument::ALL.iter().enumerate() {
            assert_eq!(instrument.index(), i);
        }
    }

    #[test]
    fn test_serde_round_trip() {
        let json = serde_json::to_string(&Instrument::Eth).unwrap();
        assert_eq!(json, "\"ETHUSDT\"");
        let back: Instrument = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Instrument::Eth);
    }
}
