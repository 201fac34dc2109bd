//! Poll cadence
//!
//! After each cycle the loop sleeps for one of three intervals:
//!
//! | Cycle outcome | Interval |
//! |---------------|----------|
//! | unchanged     | stable   |
//! | published     | active   |
//! | failed        | failure  |

use async_trait::async_trait;
use std::time::Duration;

use crate::config::ScheduleConfig;
use crate::engine::CycleOutcome;
use crate::traits::Sleeper;

/// Interval policy for the poll loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub stable: Duration,
    pub active: Duration,
    pub failure: Duration,
}

impl Schedule {
    pub fn from_config(config: &ScheduleConfig) -> Self {
        Self {
            stable: Duration::from_secs(config.stable_interval_secs),
            active: Duration::from_secs(config.active_interval_secs),
            failure: Duration::from_secs(config.failure_interval_secs),
        }
    }

    /// How long to wait after a cycle with this outcome
    pub fn interval_after(&self, outcome: &CycleOutcome) -> Duration {
        match outcome {
            CycleOutcome::Unchanged => self.stable,
            CycleOutcome::Published { .. } => self.active,
            CycleOutcome::Failed { .. } => self.failure,
        }
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::from_config(&ScheduleConfig::default())
    }
}

/// Wall-clock sleeper backed by `tokio::time::sleep`
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
