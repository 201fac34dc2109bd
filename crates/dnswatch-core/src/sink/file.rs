// # File Sink
//
// Writes the hosts table to the file the local resolver reads.
//
// ## Write Discipline
//
// - The full table goes to a temporary file in the same directory
// - The temporary file is flushed and synced
// - `rename` replaces the target in one step
//
// A resolver reloading concurrently sees either the old table or the new
// one. If any step fails, the target keeps its previous content.
//
// The temporary file is named `.<name>.tmp`: dnsmasq skips dotfiles when
// scanning a `--hostsdir`, so it never loads a half-written table.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::Error;
use crate::traits::HostsSink;

/// Atomic file-replacing sink
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileSink {
    /// Create a sink for `path`
    ///
    /// Creates the parent directory if it doesn't exist. Failure to do so is
    /// a configuration error.
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        let file_name = path.file_name().ok_or_else(|| {
            Error::config(format!("Output path must name a file: {}", path.display()))
        })?;
        let temp_path = path.with_file_name(format!(".{}.tmp", file_name.to_string_lossy()));

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create output directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        Ok(Self { path, temp_path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_temp(&self, content: &str) -> Result<(), Error> {
        let mut file = fs::File::create(&self.temp_path).await.map_err(|e| {
            Error::publish(format!(
                "Failed to create temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        file.write_all(content.as_bytes()).await.map_err(|e| {
            Error::publish(format!(
                "Failed to write to temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        file.flush().await.map_err(|e| {
            Error::publish(format!(
                "Failed to flush temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        file.sync_all().await.map_err(|e| {
            Error::publish(format!(
                "Failed to sync temp file {}: {}",
                self.temp_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

#[async_trait]
impl HostsSink for FileSink {
    async fn write_table(&self, content: &str) -> Result<(), Error> {
        if let Err(e) = self.write_temp(content).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(e);
        }

        if let Err(e) = fs::rename(&self.temp_path, &self.path).await {
            let _ = fs::remove_file(&self.temp_path).await;
            return Err(Error::publish(format!(
                "Failed to rename {} to {}: {}",
                self.temp_path.display(),
                self.path.display(),
                e
            )));
        }

        tracing::trace!("Hosts table written to {}", self.path.display());
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_sink_replaces_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ec2");
        let sink = FileSink::new(&path).await.unwrap();

        sink.write_table("10.0.0.1\ta.zone.local\n10.0.0.2\tb.zone.local\n")
            .await
            .unwrap();
        sink.write_table("10.0.0.3\tc.zone.local\n").await.unwrap();

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "10.0.0.3\tc.zone.local\n");
    }

    #[tokio::test]
    async fn test_file_sink_leaves_no_temp_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ec2");
        let sink = FileSink::new(&path).await.unwrap();

        sink.write_table("10.0.0.1\ta.zone.local\n").await.unwrap();

        let mut names = Vec::new();
        let mut read_dir = fs::read_dir(dir.path()).await.unwrap();
        while let Some(entry) = read_dir.next_entry().await.unwrap() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        assert_eq!(names, vec!["ec2".to_string()]);
    }

    #[tokio::test]
    async fn test_file_sink_creates_parent_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dnsmasq").join("extra-hosts").join("ec2");

        let sink = FileSink::new(&path).await.unwrap();
        sink.write_table("").await.unwrap();

        assert!(path.exists());
        assert_eq!(sink.describe(), path.display().to_string());
    }

    #[tokio::test]
    async fn test_file_sink_failed_write_keeps_previous_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ec2");
        let sink = FileSink::new(&path).await.unwrap();
        sink.write_table("10.0.0.1\ta.zone.local\n").await.unwrap();

        // A directory squatting on the temp path makes the next write fail
        fs::create_dir(dir.path().join(".ec2.tmp")).await.unwrap();
        let err = sink.write_table("10.0.0.9\tz.zone.local\n").await.unwrap_err();
        assert!(matches!(err, Error::Publish(_)));

        let content = fs::read_to_string(&path).await.unwrap();
        assert_eq!(content, "10.0.0.1\ta.zone.local\n");
    }

    #[tokio::test]
    async fn test_file_sink_rejects_directory_path() {
        let err = FileSink::new("/").await.unwrap_err();
        assert!(err.is_config());
    }
}
