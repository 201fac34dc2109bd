//! Core poll loop
//!
//! The Watcher is responsible for:
//! - Building a snapshot from the inventory every cycle
//! - Publishing it when it differs from the last published table
//! - Choosing how long to sleep based on what the cycle did
//! - Recovering from any failure in the cycle
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   instances   ┌─────────────────┐   snapshot   ┌─────────────┐
//! │  Inventory  │──────────────▶│ SnapshotBuilder │─────────────▶│  Publisher  │
//! └─────────────┘               └─────────────────┘              └─────────────┘
//!                                        ▲                              │
//!                                        │                              ▼
//!                               ┌─────────────────┐             ┌─────────────┐
//!                               │     Watcher     │             │  HostsSink  │
//!                               │ (baseline, I/O  │             └─────────────┘
//!                               │  cadence)       │
//!                               └─────────────────┘
//! ```
//!
//! ## Cycle States
//!
//! Idle → Polling → Idle (stable or active interval)
//!              └─→ Backoff (failure interval) → Idle
//!
//! A failed cycle leaves the baseline exactly as it was, so the next
//! successful cycle is compared against the last table that actually
//! reached the sink.

use crate::config::WatchConfig;
use crate::error::Error;
use crate::naming::NamingRules;
use crate::publisher::{PublishOutcome, Publisher};
use crate::schedule::Schedule;
use crate::snapshot::SnapshotBuilder;
use crate::traits::{HostsSink, InstanceFilter, Inventory, Sleeper};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, error, info, warn};

/// What one poll cycle did
#[derive(Debug)]
pub enum CycleOutcome {
    /// A new table was written
    Published {
        /// The table now on the sink
        content: String,
        /// Number of entries in it
        entries: usize,
    },
    /// The table matched the baseline, nothing written
    Unchanged,
    /// Query or write failed; nothing about the published state changed
    Failed { error: Error },
}

/// Events emitted by the Watcher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// Loop started
    Started {
        scope: String,
        sink: String,
    },

    /// A new table was published
    Published {
        entries: usize,
        published_at: chrono::DateTime<chrono::Utc>,
    },

    /// Inventory unchanged since the last publication
    Unchanged,

    /// Cycle failed and the loop is backing off
    CycleFailed {
        error: String,
        retry_in: Duration,
    },
}

/// Core poll loop
///
/// ## Lifecycle
///
/// 1. Create with [`Watcher::new()`]
/// 2. Start with [`Watcher::run()`]
/// 3. The loop runs until the process is terminated
///
/// There is no shutdown handle: the watcher is meant to run as a supervised
/// background process and is stopped by stopping the process.
///
/// ## Testing
///
/// [`Watcher::run_cycle()`] and [`Watcher::tick()`] drive single cycles.
/// Sleeping goes through the injected [`Sleeper`], so many cycles can be
/// simulated without wall-clock delay.
pub struct Watcher {
    builder: SnapshotBuilder,
    publisher: Publisher,
    schedule: Schedule,
    sleeper: Box<dyn Sleeper>,

    /// Last table that reached the sink; `None` until the first publication
    baseline: Option<String>,

    event_tx: mpsc::Sender<WatchEvent>,

    /// Set once the receiver is dropped; events are discarded from then on
    events_closed: bool,
}

impl Watcher {
    /// Create a new watcher
    ///
    /// # Returns
    ///
    /// A tuple of (watcher, event_receiver) where event_receiver yields watch events
    pub fn new(
        inventory: Box<dyn Inventory>,
        sink: Box<dyn HostsSink>,
        sleeper: Box<dyn Sleeper>,
        config: WatchConfig,
    ) -> crate::Result<(Self, mpsc::Receiver<WatchEvent>)> {
        config.validate()?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        let filter = InstanceFilter::running(config.scope_tag, config.scope);
        let rules = NamingRules::from_config(&config.naming);

        let watcher = Self {
            builder: SnapshotBuilder::new(inventory, rules, filter),
            publisher: Publisher::new(sink),
            schedule: Schedule::from_config(&config.schedule),
            sleeper,
            baseline: None,
            event_tx: tx,
            events_closed: false,
        };

        Ok((watcher, rx))
    }

    /// Last published table, if any
    pub fn baseline(&self) -> Option<&str> {
        self.baseline.as_deref()
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Run forever
    pub async fn run(mut self) {
        info!(
            "Watching scope {}={}, publishing to {}",
            self.builder.filter().tag_key,
            self.builder.filter().tag_value,
            self.publisher.describe()
        );
        let started = WatchEvent::Started {
            scope: self.builder.filter().tag_value.clone(),
            sink: self.publisher.describe(),
        };
        self.emit_event(started);

        loop {
            self.tick().await;
        }
    }

    /// Run one cycle, then sleep for the interval its outcome calls for
    ///
    /// # Returns
    ///
    /// The interval slept
    pub async fn tick(&mut self) -> Duration {
        let outcome = self.run_cycle().await;
        let pause = self.schedule.interval_after(&outcome);

        debug!("Sleeping {:?}", pause);
        self.sleeper.sleep(pause).await;

        pause
    }

    /// Run one cycle against the baseline and apply its outcome
    ///
    /// A published table becomes the new baseline. Unchanged and failed
    /// cycles leave the baseline untouched.
    pub async fn run_cycle(&mut self) -> CycleOutcome {
        let outcome = self.cycle(self.baseline.as_deref()).await;

        match &outcome {
            CycleOutcome::Published { content, entries } => {
                info!("Rendered {} hosts entries", entries);
                self.baseline = Some(content.clone());
                self.emit_event(WatchEvent::Published {
                    entries: *entries,
                    published_at: chrono::Utc::now(),
                });
            }
            CycleOutcome::Unchanged => {
                debug!("Hosts table unchanged");
                self.emit_event(WatchEvent::Unchanged);
            }
            CycleOutcome::Failed { error } => {
                let retry_in = self.schedule.failure;
                error!(error = ?error, "Poll cycle failed, backing off for {:?}: {}", retry_in, error);
                self.emit_event(WatchEvent::CycleFailed {
                    error: error.to_string(),
                    retry_in,
                });
            }
        }

        outcome
    }

    /// Build and publish one snapshot against `previous`
    ///
    /// Does not touch the watcher's own baseline.
    pub async fn cycle(&self, previous: Option<&str>) -> CycleOutcome {
        let snapshot = match self.builder.build().await {
            Ok(snapshot) => snapshot,
            Err(error) => return CycleOutcome::Failed { error },
        };

        match self.publisher.publish(&snapshot, previous).await {
            Ok(PublishOutcome::Unchanged) => CycleOutcome::Unchanged,
            Ok(PublishOutcome::Changed { content, entries }) => {
                CycleOutcome::Published { content, entries }
            }
            Err(error) => CycleOutcome::Failed { error },
        }
    }

    /// Whether the event receiver has been dropped
    pub fn events_closed(&self) -> bool {
        self.events_closed
    }

    // The loop never waits on observers
    fn emit_event(&mut self, event: WatchEvent) {
        if self.events_closed {
            return;
        }

        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Event receiver dropped, no further events will be emitted");
                self.events_closed = true;
            }
        }
    }
}
