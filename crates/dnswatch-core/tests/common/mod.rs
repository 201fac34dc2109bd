//! Test doubles and common utilities for contract tests
//!
//! These doubles let tests script inventory answers, inject failures, and
//! observe sleeps without real I/O or wall-clock delay.

#![allow(dead_code)]

use dnswatch_core::error::{Error, Result};
use dnswatch_core::traits::{HostsSink, InstanceFilter, InstanceRecord, Inventory, Sleeper};
use dnswatch_core::{MemorySink, WatchConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

pub const SCOPE: &str = "corp";

/// A running instance in scope with an address and a role
pub fn instance(id: &str, address: &str, role: &str) -> InstanceRecord {
    InstanceRecord::new(id)
        .with_address(address.parse().unwrap())
        .with_tag("substrate:zone", SCOPE)
        .with_tag("substrate:role", role)
}

/// A running instance in scope with an address but no role tag
pub fn roleless(id: &str, address: &str) -> InstanceRecord {
    InstanceRecord::new(id)
        .with_address(address.parse().unwrap())
        .with_tag("substrate:zone", SCOPE)
}

/// Default configuration for the test scope
pub fn test_config() -> WatchConfig {
    WatchConfig::new(SCOPE)
}

/// Inventory whose answers the test controls
///
/// Clones share state, so the test keeps one handle while the watcher owns
/// another. Queued failures are returned before the instance list.
#[derive(Clone, Default)]
pub struct ScriptedInventory {
    instances: Arc<Mutex<Vec<InstanceRecord>>>,
    pending_failures: Arc<AtomicUsize>,
    call_count: Arc<AtomicUsize>,
    reverse: Arc<Mutex<bool>>,
}

impl ScriptedInventory {
    pub fn new(instances: Vec<InstanceRecord>) -> Self {
        let inventory = Self::default();
        inventory.set(instances);
        inventory
    }

    /// Replace the instance list
    pub fn set(&self, instances: Vec<InstanceRecord>) {
        *self.instances.lock().unwrap() = instances;
    }

    /// Make the next `count` queries fail
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Answer in reverse order from now on
    pub fn reverse_order(&self, reverse: bool) {
        *self.reverse.lock().unwrap() = reverse;
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Inventory for ScriptedInventory {
    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<InstanceRecord>> {
        self.call_count.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::inventory("simulated provider outage"));
        }

        let mut listed: Vec<_> = self
            .instances
            .lock()
            .unwrap()
            .iter()
            .filter(|instance| filter.matches(instance))
            .cloned()
            .collect();
        if *self.reverse.lock().unwrap() {
            listed.reverse();
        }
        Ok(listed)
    }

    fn provider_name(&self) -> &'static str {
        "scripted"
    }
}

/// Sink that records writes and can be told to fail
#[derive(Clone, Default)]
pub struct FlakySink {
    inner: MemorySink,
    pending_failures: Arc<AtomicUsize>,
    attempts: Arc<AtomicUsize>,
}

impl FlakySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` writes fail
    pub fn fail_next(&self, count: usize) {
        self.pending_failures.store(count, Ordering::SeqCst);
    }

    /// Writes that reached the sink (failed attempts excluded)
    pub async fn writes(&self) -> Vec<String> {
        self.inner.writes().await
    }

    pub async fn current(&self) -> Option<String> {
        self.inner.current().await
    }

    /// All write attempts, including failed ones
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HostsSink for FlakySink {
    async fn write_table(&self, content: &str) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failed = self
            .pending_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(Error::publish("simulated disk failure"));
        }

        self.inner.write_table(content).await
    }

    fn describe(&self) -> String {
        "flaky".to_string()
    }
}

/// Sleeper that records requested durations and returns immediately
///
/// Optionally forwards every duration on a channel, for tests that observe
/// a watcher running on its own task.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    slept: Arc<Mutex<Vec<Duration>>>,
    notify: Option<mpsc::UnboundedSender<Duration>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_channel() -> (Self, mpsc::UnboundedReceiver<Duration>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let sleeper = Self {
            slept: Arc::default(),
            notify: Some(tx),
        };
        (sleeper, rx)
    }

    pub fn slept(&self) -> Vec<Duration> {
        self.slept.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.slept.lock().unwrap().push(duration);
        if let Some(tx) = &self.notify {
            let _ = tx.send(duration);
        }
        tokio::task::yield_now().await;
    }
}

pub fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}
