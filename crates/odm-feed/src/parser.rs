//! Message parsing for inbound ticks and oracle quotes.
//!
//! Transport-agnostic: the caller hands over a channel name and a JSON
//! payload (or a single JSON line carrying both). Malformed payloads are
//! returned as `FeedError` so the caller can drop them without touching the
//! tick buffer.
//!
//! Supported channels:
//! 1. `"tick"`:  `{"ref": 100.5, "t": 1700000000000, "oracle": 100.2}`
//!    (`t` and `oracle` optional; a missing `t` uses the receive time)
//! 2. `"quote"`: `{"value": 100.2}` or `{"value": null}` (quote absent)
//!
//! Numbers may be sent either as JSON numbers or as decimal strings.

use crate::error::{FeedError, FeedResult};
use odm_core::{InboundTick, OracleQuote};
use serde::Deserialize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

/// Parser counters.
#[derive(Debug, Default)]
pub struct ParserStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    ignored: AtomicU64,
}

impl ParserStats {
    pub fn record_accepted(&self) {
        self.accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> u64 {
        self.accepted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

/// Number sent either as a JSON number or as a string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Num(f64),
    Str(String),
}

impl RawNumber {
    fn to_f64(&self, field: &str) -> FeedResult<f64> {
        match self {
            Self::Num(v) => Ok(*v),
            Self::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|e| FeedError::ParseError(format!("{field}: {e}"))),
        }
    }
}

/// Raw tick payload.
#[derive(Debug, Deserialize)]
struct RawTick {
    #[serde(rename = "ref")]
    reference: Option<RawNumber>,
    t: Option<i64>,
    oracle: Option<RawNumber>,
}

/// Line envelope: `{"channel": "...", "data": {...}}`.
#[derive(Debug, Deserialize)]
struct RawEnvelope {
    channel: String,
    data: serde_json::Value,
}

/// Parsed inbound event.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEvent {
    /// Reference-price tick.
    Tick(InboundTick),
    /// Oracle quote update; None means the quote is absent.
    Quote(Option<OracleQuote>),
}

/// Inbound message parser.
#[derive(Debug, Default)]
pub struct MessageParser {
    stats: ParserStats,
}

impl MessageParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> &ParserStats {
        &self.stats
    }

    /// Parse one JSON line carrying a channel envelope.
    pub fn parse_line(&self, line: &str, recv_time_ms: i64) -> FeedResult<Option<FeedEvent>> {
        let envelope: RawEnvelope = serde_json::from_str(line).map_err(|e| {
            warn!(error = %e, "Rejected malformed line");
            self.stats.record_rejected();
            FeedError::from(e)
        })?;
        self.parse_channel_message(&envelope.channel, &envelope.data, recv_time_ms)
    }

    /// Parse a channel payload into an event.
    ///
    /// Returns `Ok(None)` for channels this parser does not handle.
    pub fn parse_channel_message(
        &self,
        channel: &str,
        data: &serde_json::Value,
        recv_time_ms: i64,
    ) -> FeedResult<Option<FeedEvent>> {
        let result = match channel {
            "tick" => self.parse_tick(data, recv_time_ms).map(FeedEvent::Tick),
            "quote" => self.parse_quote(data).map(FeedEvent::Quote),
            other => {
                debug!(channel = other, "Ignoring unknown channel");
                self.stats.record_ignored();
                return Ok(None);
            }
        };

        match result {
            Ok(event) => {
                self.stats.record_accepted();
                Ok(Some(event))
            }
            Err(e) => {
                warn!(channel, error = %e, "Rejected malformed message");
                self.stats.record_rejected();
                Err(e)
            }
        }
    }

    fn parse_tick(&self, data: &serde_json::Value, recv_time_ms: i64) -> FeedResult<InboundTick> {
        let raw: RawTick = serde_json::from_value(data.clone())?;

        let reference = raw
            .reference
            .ok_or(FeedError::MissingField("ref"))?
            .to_f64("ref")?;
        let oracle = raw.oracle.map(|o| o.to_f64("oracle")).transpose()?;
        let t = raw.t.unwrap_or(recv_time_ms);

        Ok(InboundTick::new(t, reference, oracle)?)
    }

    fn parse_quote(&self, data: &serde_json::Value) -> FeedResult<Option<OracleQuote>> {
        let value = data.get("value").ok_or(FeedError::MissingField("value"))?;
        if value.is_null() {
            return Ok(None);
        }

        let raw: RawNumber = serde_json::from_value(value.clone())?;
        let quote = OracleQuote::new(raw.to_f64("value")?)?;
        Ok(Some(quote))
    }
}
