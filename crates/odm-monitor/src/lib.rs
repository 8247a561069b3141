//! Oracle deviation monitor.
//!
//! Wires the components into one pipeline:
//! - Tick ingestion into the bounded buffer
//! - CDE, static and adaptive band recomputation
//! - Static deviation triggers
//! - Adaptive oracle selection
//! - Event loop fed by the simulator or stdin JSON lines

pub mod app;
pub mod config;
pub mod error;
pub mod monitor;

pub use app::{Application, MonitorEvent, MonitorHandle};
pub use config::{AppConfig, SourceKind};
pub use error::{AppError, AppResult};
pub use monitor::{Monitor, MonitorSnapshot};
