// # Hosts Sink Trait
//
// Defines where a serialized hosts table ends up.
//
// ## Implementations
//
// - `FileSink`: atomic temp-file + rename replacement of one path
// - `MemorySink`: records every write (tests, embedding)
// - `DryRunSink`: logs what would be written

use async_trait::async_trait;

/// Trait for hosts table destinations
///
/// # Write Discipline
///
/// `write_table` replaces the destination content in full. A concurrent
/// reader must observe either the previous table or the new one, never a
/// mix of both and never a truncated table. On error the previous content
/// must be left as it was.
///
/// Sinks do not decide whether a write is needed; that is owned by
/// `Publisher`.
#[async_trait]
pub trait HostsSink: Send + Sync {
    /// Replace the destination content with `content`
    async fn write_table(&self, content: &str) -> Result<(), crate::Error>;

    /// Human-readable destination (for logging)
    fn describe(&self) -> String;
}
