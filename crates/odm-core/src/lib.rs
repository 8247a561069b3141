//! Core data model for the oracle deviation monitor.
//!
//! This crate provides the value types shared by every component:
//! - `PricePoint`: one (reference, oracle) observation at a timestamp
//! - `TriggerPoint`: a static-threshold crossing event
//! - `ThresholdBand`: an upper/lower deviation band around a price
//! - `InboundTick`, `OracleQuote`: transport-agnostic inbound shapes

pub mod error;
pub mod types;

pub use error::{CoreError, Result};
pub use types::{InboundTick, OracleQuote, PricePoint, ThresholdBand, TriggerPoint};
