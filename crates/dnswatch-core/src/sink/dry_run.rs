use async_trait::async_trait;
use std::path::PathBuf;

use crate::Error;
use crate::traits::HostsSink;

/// Sink that logs the table it would write and leaves the filesystem alone
#[derive(Debug, Clone)]
pub struct DryRunSink {
    target: PathBuf,
}

impl DryRunSink {
    /// `target` is only used in log lines
    pub fn new(target: impl Into<PathBuf>) -> Self {
        Self {
            target: target.into(),
        }
    }
}

#[async_trait]
impl HostsSink for DryRunSink {
    async fn write_table(&self, content: &str) -> Result<(), Error> {
        tracing::info!(
            "[DRY-RUN] Would write {} line(s) to {}",
            content.lines().count(),
            self.target.display()
        );
        for line in content.lines() {
            tracing::debug!("[DRY-RUN] {}", line);
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("dry-run:{}", self.target.display())
    }
}
