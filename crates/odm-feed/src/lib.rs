//! Tick ingestion for the oracle deviation monitor.
//!
//! Parses inbound tick/quote payloads, keeps the most recent ticks in a
//! bounded FIFO buffer, and tracks the latest external oracle quote.

pub mod error;
pub mod parser;
pub mod quote_state;
pub mod tick_buffer;

pub use error::{FeedError, FeedResult};
pub use parser::{FeedEvent, MessageParser, ParserStats};
pub use quote_state::QuoteState;
pub use tick_buffer::{TickBuffer, DEFAULT_CAPACITY};
