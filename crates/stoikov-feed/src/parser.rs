//! Book-ticker frame parsing.
//!
//! Inbound frames look like:
//!
//! ```json
//! {"u":400900217,"s":"BTCUSDT","b":"45000.10","B":"31.21","a":"45000.20","A":"40.66"}
//! ```
//!
//! The reference path deserializes through serde (tolerant of trailing and
//! unknown fields, whitespace trimmed from values). The fast path scans for
//! the key positions and parses the value slices directly, skipping the DOM.
//! The fast path is only promoted after it has produced exactly the same
//! result as the reference on `VALIDATION_TARGET` consecutive frames; any
//! disagreement resets the streak and demotes it.

use crate::error::{FeedError, FeedResult};
use serde::Deserialize;
use std::str::FromStr;
use stoikov_core::{Instrument, Price, Size, Tick};
use tracing::{debug, warn};

/// Consecutive exact agreements required before the fast path is trusted.
const VALIDATION_TARGET: u32 = 1000;

/// Raw book-ticker record as it appears on the wire. Numeric fields are
/// decimal strings; unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct RawBookTicker {
    /// Symbol, canonical form.
    s: String,
    /// Best bid price.
    b: String,
    /// Best ask price.
    a: String,
    /// Best bid size.
    #[serde(rename = "B", default)]
    bid_qty: Option<String>,
    /// Best ask size.
    #[serde(rename = "A", default)]
    ask_qty: Option<String>,
}

/// Which parser produced the tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserMode {
    /// serde reference path, validating the fast scanner on the side.
    Reference,
    /// Fast scanner, promoted after sustained agreement.
    Fast,
}

/// Stateful book-ticker parser with fast-path promotion.
pub struct TickParser {
    mode: ParserMode,
    agreement_streak: u32,
    /// Frames dropped because the symbol was not in the registry.
    unknown_symbols: u64,
    /// Frames rejected for invalid book data.
    invalid_ticks: u64,
}

impl Default for TickParser {
    fn default() -> Self {
        Self::new()
    }
}

impl TickParser {
    pub fn new() -> Self {
        Self {
            mode: ParserMode::Reference,
            agreement_streak: 0,
            unknown_symbols: 0,
            invalid_ticks: 0,
        }
    }

    pub fn mode(&self) -> ParserMode {
        self.mode
    }

    pub fn unknown_symbols(&self) -> u64 {
        self.unknown_symbols
    }

    pub fn invalid_ticks(&self) -> u64 {
        self.invalid_ticks
    }

    /// Parse one frame.
    ///
    /// `Ok(Some(tick))` for a valid record of a known instrument;
    /// `Ok(None)` when the symbol is unknown (event must be ignored);
    /// `Err(Protocol)` for malformed frames and `Err(InvalidTick)` for
    /// non-positive or crossed books.
    pub fn parse(&mut self, frame: &str) -> FeedResult<Option<Tick>> {
        let (symbol, bid, ask, bid_qty, ask_qty) = match self.mode {
            ParserMode::Fast => match Self::parse_fast(frame) {
                Ok(fields) => fields,
                Err(e) => {
                    // A frame the fast scanner cannot handle demotes it.
                    warn!(?e, "fast parser failed, demoting to reference path");
                    self.mode = ParserMode::Reference;
                    self.agreement_streak = 0;
                    Self::parse_reference(frame)?
                }
            },
            ParserMode::Reference => {
                let reference = Self::parse_reference(frame)?;
                self.validate_fast_path(frame, &reference);
                reference
            }
        };

        let Some(instrument) = Instrument::parse(&symbol) else {
            self.unknown_symbols += 1;
            return Ok(None);
        };

        let tick = Tick::new(instrument, bid, ask, bid_qty, ask_qty, 0.0);
        if !tick.is_valid() {
            self.invalid_ticks += 1;
            return Err(FeedError::InvalidTick(format!(
                "bid={bid} ask={ask} ({symbol})"
            )));
        }
        Ok(Some(tick))
    }

    fn validate_fast_path(&mut self, frame: &str, reference: &(String, Price, Price, Size, Size)) {
        match Self::parse_fast(frame) {
            Ok(fast) if &fast == reference => {
                self.agreement_streak += 1;
                if self.agreement_streak >= VALIDATION_TARGET {
                    debug!(
                        frames = self.agreement_streak,
                        "fast parser validated, switching over"
                    );
                    self.mode = ParserMode::Fast;
                }
            }
            Ok(_) | Err(_) => {
                self.agreement_streak = 0;
            }
        }
    }

    fn parse_reference(frame: &str) -> FeedResult<(String, Price, Price, Size, Size)> {
        let raw: RawBookTicker = serde_json::from_str(frame)
            .map_err(|e| FeedError::Protocol(format!("malformed frame: {e}")))?;

        let bid = parse_decimal::<Price>(&raw.b, "b")?;
        let ask = parse_decimal::<Price>(&raw.a, "a")?;
        let bid_qty = match &raw.bid_qty {
            Some(s) => parse_decimal::<Size>(s, "B")?,
            None => Size::ZERO,
        };
        let ask_qty = match &raw.ask_qty {
            Some(s) => parse_decimal::<Size>(s, "A")?,
            None => Size::ZERO,
        };

        Ok((raw.s, bid, ask, bid_qty, ask_qty))
    }

    fn parse_fast(frame: &str) -> FeedResult<(String, Price, Price, Size, Size)> {
        let symbol = scan_string_value(frame, "\"s\":\"")?;
        let bid = parse_decimal::<Price>(scan_string_value(frame, "\"b\":\"")?, "b")?;
        let ask = parse_decimal::<Price>(scan_string_value(frame, "\"a\":\"")?, "a")?;
        let bid_qty = match scan_string_value(frame, "\"B\":\"") {
            Ok(s) => parse_decimal::<Size>(s, "B")?,
            Err(_) => Size::ZERO,
        };
        let ask_qty = match scan_string_value(frame, "\"A\":\"") {
            Ok(s) => parse_decimal::<Size>(s, "A")?,
            Err(_) => Size::ZERO,
        };

        Ok((symbol.to_string(), bid, ask, bid_qty, ask_qty))
    }
}

/// Locate `key` in the frame and return the quoted value after it.
fn scan_string_value<'a>(frame: &'a str, key: &str) -> FeedResult<&'a str> {
    let start = frame
        .find(key)
        .ok_or_else(|| FeedError::Protocol(format!("missing {key}")))?
        + key.len();
    let end = frame[start..]
        .find('"')
        .ok_or_else(|| FeedError::Protocol(format!("unterminated value for {key}")))?;
    Ok(&frame[start..start + end])
}

fn parse_decimal<T: FromStr>(value: &str, field: &str) -> FeedResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FeedError::Protocol(format!("bad decimal in {field}: {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const FRAME: &str =
        r#"{"u":400900217,"s":"BTCUSDT","b":"45000.10","B":"31.21","a":"45000.20","A":"40.66"}"#;

    #[test]
    fn test_parse_valid_frame() {
        let mut parser = TickParser::new();
        let tick = parser.parse(FRAME).unwrap().unwrap();

        assert_eq!(tick.instrument, Instrument::Btc);
        assert_eq!(tick.bid.inner(), dec!(45000.10));
        assert_eq!(tick.ask.inner(), dec!(45000.20));
        assert_eq!(tick.bid_qty.inner(), dec!(31.21));
        assert_eq!(tick.ask_qty.inner(), dec!(40.66));
        assert_eq!(tick.volatility, 0.0);
    }

    #[test]
    fn test_trailing_and_unknown_fields_tolerated() {
        let mut parser = TickParser::new();
        let frame = r#"{"s":"ETHUSDT","b":"3000","a":"3001","B":"1","A":"1","T":123,"x":"y"}"#;
        let tick = parser.parse(frame).unwrap().unwrap();
        assert_eq!(tick.instrument, Instrument::Eth);
    }

    #[test]
    fn test_whitespace_in_values_tolerated() {
        let mut parser = TickParser::new();
        let frame = r#"{"s":"BTCUSDT","b":" 45000.10 ","a":" 45000.20 ","B":"1","A":"1"}"#;
        let tick = parser.parse(frame).unwrap().unwrap();
        assert_eq!(tick.bid.inner(), dec!(45000.10));
    }

    #[test]
    fn test_unknown_symbol_is_dropped_not_error() {
        let mut parser = TickParser::new();
        let frame = r#"{"s":"DOGEUSDT","b":"0.1","a":"0.2","B":"1","A":"1"}"#;
        assert!(parser.parse(frame).unwrap().is_none());
        assert_eq!(parser.unknown_symbols(), 1);
    }

    #[test]
    fn test_crossed_book_rejected() {
        let mut parser = TickParser::new();
        let frame = r#"{"s":"BTCUSDT","b":"45001","a":"45000","B":"1","A":"1"}"#;
        assert!(matches!(
            parser.parse(frame),
            Err(FeedError::InvalidTick(_))
        ));
        assert_eq!(parser.invalid_ticks(), 1);
    }

    #[test]
    fn test_non_positive_prices_rejected() {
        let mut parser = TickParser::new();
        for frame in [
            r#"{"s":"BTCUSDT","b":"0","a":"45000","B":"1","A":"1"}"#,
            r#"{"s":"BTCUSDT","b":"-1","a":"45000","B":"1","A":"1"}"#,
            r#"{"s":"BTCUSDT","b":"45000","a":"0","B":"1","A":"1"}"#,
        ] {
            assert!(matches!(
                parser.parse(frame),
                Err(FeedError::InvalidTick(_))
            ));
        }
    }

    #[test]
    fn test_malformed_frame_is_protocol_error() {
        let mut parser = TickParser::new();
        for frame in ["not json", "{}", r#"{"s":"BTCUSDT","b":"abc","a":"1","B":"1","A":"1"}"#] {
            assert!(matches!(parser.parse(frame), Err(FeedError::Protocol(_))));
        }
    }

    #[test]
    fn test_missing_sizes_default_to_zero() {
        // Touching-book frames without sizes still produce a tick; the
        // pipeline's own validity check decides what to do with it.
        let mut parser = TickParser::new();
        let frame = r#"{"s":"BTCUSDT","b":"45000","a":"45001"}"#;
        let tick = parser.parse(frame).unwrap().unwrap();
        assert!(tick.bid_qty.is_zero());
    }

    #[test]
    fn test_fast_path_promotion_after_streak() {
        let mut parser = TickParser::new();
        assert_eq!(parser.mode(), ParserMode::Reference);

        for i in 0..VALIDATION_TARGET {
            let frame = format!(
                r#"{{"u":{i},"s":"BTCUSDT","b":"45000.{:02}","B":"1.5","a":"45001.{:02}","A":"2.5"}}"#,
                i % 100,
                i % 100
            );
            parser.parse(&frame).unwrap().unwrap();
        }
        assert_eq!(parser.mode(), ParserMode::Fast);

        // And the fast path keeps producing identical results.
        let tick = parser.parse(FRAME).unwrap().unwrap();
        assert_eq!(tick.bid.inner(), dec!(45000.10));
    }

    #[test]
    fn test_fast_and_reference_agree_exactly() {
        let frames = [
            FRAME,
            r#"{"s":"SOLUSDT","b":"150.5","a":"150.6","B":"10","A":"12"}"#,
            r#"{"s":"BNBUSDT","b":"0.00001234","a":"0.00001240","B":"1000000","A":"999999"}"#,
        ];
        for frame in frames {
            let fast = TickParser::parse_fast(frame).unwrap();
            let reference = TickParser::parse_reference(frame).unwrap();
            assert_eq!(fast, reference);
        }
    }

    #[test]
    fn test_disagreement_resets_streak() {
        let mut parser = TickParser::new();
        for _ in 0..10 {
            parser.parse(FRAME).unwrap();
        }
        assert!(parser.agreement_streak >= 10);

        // Whitespace around a key defeats the positional scanner while serde
        // parses it fine; the streak must reset.
        let tricky = r#"{"s":"BTCUSDT","b" : "45000","a":"45001","B":"1","A":"1"}"#;
        let _ = parser.parse(tricky);
        assert_eq!(parser.agreement_streak, 0);
        assert_eq!(parser.mode(), ParserMode::Reference);
    }
}
