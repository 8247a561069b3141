//! Application orchestration.
//!
//! A source task feeds `MonitorEvent`s into an mpsc channel; the event loop
//! applies them one at a time to the shared `Monitor` under its write lock.
//! The loop ends when every sender is dropped (feed teardown) or on Ctrl-C.

use crate::config::{AppConfig, SimulationConfig, SourceKind};
use crate::error::{AppError, AppResult};
use crate::monitor::{Monitor, MonitorSnapshot};
use odm_core::{InboundTick, OracleQuote};
use odm_feed::{FeedEvent, MessageParser};
use odm_sim::Simulator;
use odm_telemetry::Metrics;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Shared monitor; the event loop is the only writer.
pub type MonitorHandle = Arc<RwLock<Monitor>>;

/// Inbound event for the monitor.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    Tick(InboundTick),
    Quote {
        quote: OracleQuote,
        received_at_ms: i64,
    },
    QuoteUnavailable,
    Reset,
}

impl MonitorEvent {
    /// Map a parsed feed event received at `recv_time_ms`.
    pub fn from_feed(event: FeedEvent, recv_time_ms: i64) -> Self {
        match event {
            FeedEvent::Tick(tick) => Self::Tick(tick),
            FeedEvent::Quote(Some(quote)) => Self::Quote {
                quote,
                received_at_ms: recv_time_ms,
            },
            FeedEvent::Quote(None) => Self::QuoteUnavailable,
        }
    }
}

/// Main application.
pub struct Application {
    config: AppConfig,
    monitor: MonitorHandle,
}

impl Application {
    /// Create a new application.
    pub fn new(config: AppConfig) -> AppResult<Self> {
        config.validate().map_err(AppError::Config)?;
        let monitor = Monitor::new(config.detector.clone(), config.buffer.capacity)?;

        Ok(Self {
            config,
            monitor: Arc::new(RwLock::new(monitor)),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle for readers.
    pub fn handle(&self) -> MonitorHandle {
        Arc::clone(&self.monitor)
    }

    /// Create the event channel with the configured capacity.
    pub fn channel(&self) -> (mpsc::Sender<MonitorEvent>, mpsc::Receiver<MonitorEvent>) {
        mpsc::channel(self.config.channel_capacity)
    }

    /// Apply one event under the write lock.
    pub fn dispatch(&self, event: MonitorEvent) {
        let mut monitor = self.monitor.write();
        match event {
            MonitorEvent::Tick(tick) => {
                monitor.on_tick(tick);
            }
            MonitorEvent::Quote {
                quote,
                received_at_ms,
            } => monitor.on_quote(quote, received_at_ms),
            MonitorEvent::QuoteUnavailable => monitor.on_quote_unavailable(),
            MonitorEvent::Reset => monitor.reset(),
        }
    }

    /// Drain `rx` until every sender is dropped.
    ///
    /// Returns the number of events applied.
    pub async fn run(&self, mut rx: mpsc::Receiver<MonitorEvent>) -> u64 {
        let mut events = 0u64;
        while let Some(event) = rx.recv().await {
            self.dispatch(event);
            events += 1;
        }
        debug!(events, "Event channel closed");
        events
    }

    /// Spawn the configured source and run the event loop to completion.
    pub async fn run_to_completion(&self) -> AppResult<MonitorSnapshot> {
        let (tx, rx) = self.channel();
        let kind = self.config.source.kind;

        info!(source = ?kind, "Starting event loop");

        let source = match kind {
            SourceKind::Simulator => {
                let sim = self.config.simulation.clone();
                tokio::spawn(async move { simulator_source(&sim, tx).await })
            }
            SourceKind::Stdin => tokio::spawn(async move {
                line_source(BufReader::new(tokio::io::stdin()), tx).await
            }),
        };

        tokio::select! {
            events = self.run(rx) => {
                info!(events, "Source finished");
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                source.abort();
                return Ok(self.monitor.read().snapshot());
            }
        }

        match source.await {
            Ok(Ok(sent)) => debug!(sent, "Source task completed"),
            Ok(Err(e)) => {
                error!(error = %e, "Source task failed");
                return Err(e);
            }
            Err(e) => return Err(AppError::Source(format!("Source task panicked: {e}"))),
        }

        Ok(self.monitor.read().snapshot())
    }
}

/// Replay a generated path, one tick per point at `t * tick_interval_ms`.
///
/// Each tick carries the simulated oracle as its paired quote. Returns the
/// number of ticks sent.
pub async fn simulator_source(
    config: &SimulationConfig,
    tx: mpsc::Sender<MonitorEvent>,
) -> AppResult<usize> {
    let points = Simulator::new(config.params.clone()).generate();
    info!(
        points = points.len(),
        tick_interval_ms = config.tick_interval_ms,
        "Replaying simulated path"
    );

    let mut sent = 0;
    for p in points {
        let Some(t) = p.t.checked_mul(config.tick_interval_ms) else {
            warn!(
                index = p.t,
                tick_interval_ms = config.tick_interval_ms,
                "Replay timestamp overflows, dropping simulated point"
            );
            Metrics::tick_dropped("invalid_data");
            continue;
        };
        let tick = match InboundTick::new(t, p.reference, Some(p.oracle)) {
            Ok(tick) => tick,
            Err(e) => {
                warn!(t, error = %e, "Dropping unusable simulated point");
                Metrics::tick_dropped("invalid_data");
                continue;
            }
        };

        tx.send(MonitorEvent::Tick(tick))
            .await
            .map_err(|_| AppError::Shutdown)?;
        sent += 1;
    }

    Ok(sent)
}

/// Read `{"channel": ..., "data": ...}` JSON lines and forward them.
///
/// Malformed lines are dropped and counted; blank lines are skipped.
/// Returns the number of events sent.
pub async fn line_source<R>(reader: R, tx: mpsc::Sender<MonitorEvent>) -> AppResult<usize>
where
    R: AsyncBufRead + Unpin,
{
    let parser = MessageParser::new();
    let mut lines = reader.lines();
    let mut sent = 0;

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let recv_time_ms = chrono::Utc::now().timestamp_millis();
        match parser.parse_line(line, recv_time_ms) {
            Ok(Some(event)) => {
                tx.send(MonitorEvent::from_feed(event, recv_time_ms))
                    .await
                    .map_err(|_| AppError::Shutdown)?;
                sent += 1;
            }
            Ok(None) => {}
            Err(e) => {
                Metrics::tick_dropped(e.reason());
            }
        }
    }

    info!(
        accepted = parser.stats().accepted(),
        rejected = parser.stats().rejected(),
        ignored = parser.stats().ignored(),
        "Input stream closed"
    );

    Ok(sent)
}
