//! Debounced publication
//!
//! The publisher compares a snapshot against the last published table and
//! only touches the sink when the bytes differ. It holds no memory of its
//! own: the caller passes the previous content in and keeps the returned
//! content as its new baseline.

use crate::error::Result;
use crate::snapshot::Snapshot;
use crate::traits::HostsSink;

/// Result of one publish attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Identical to the previous table, nothing written
    Unchanged,
    /// New table written
    Changed {
        /// The content now on the sink (the new baseline)
        content: String,
        /// Number of entries in the table
        entries: usize,
    },
}

impl PublishOutcome {
    pub fn is_changed(&self) -> bool {
        matches!(self, PublishOutcome::Changed { .. })
    }
}

/// Writes snapshots through a [`HostsSink`] when they differ from the previous table
pub struct Publisher {
    sink: Box<dyn HostsSink>,
}

impl Publisher {
    pub fn new(sink: Box<dyn HostsSink>) -> Self {
        Self { sink }
    }

    pub fn describe(&self) -> String {
        self.sink.describe()
    }

    /// Publish `snapshot` unless it matches `previous` byte for byte
    ///
    /// `previous` is `None` before anything was published; the first
    /// snapshot is then always written.
    pub async fn publish(&self, snapshot: &Snapshot, previous: Option<&str>) -> Result<PublishOutcome> {
        let content = snapshot.serialized();

        if previous == Some(content) {
            return Ok(PublishOutcome::Unchanged);
        }

        self.sink.write_table(content).await?;

        Ok(PublishOutcome::Changed {
            content: content.to_string(),
            entries: snapshot.len(),
        })
    }
}
