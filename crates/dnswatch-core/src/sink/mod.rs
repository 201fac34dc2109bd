// # Hosts Sink Implementations
//
// This module provides implementations of the HostsSink trait for
// different destinations.

pub mod dry_run;
pub mod file;
pub mod memory;

pub use dry_run::DryRunSink;
pub use file::FileSink;
pub use memory::MemorySink;
