// # File Inventory
//
// Inventory backed by a JSON document on disk.
//
// ## Purpose
//
// Lets dnswatch run against an inventory exported by some other tool
// (a cron job, a configuration management run, a test fixture). The
// document is re-read on every query, so replacing the file is how the
// inventory changes.
//
// ## File Format
//
// See [`InventoryDocument`]. A missing file is a query failure, not an
// empty inventory: an empty table would wipe every published name.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::Error;
use crate::config::InventoryConfig;
use crate::traits::{InstanceFilter, InstanceRecord, Inventory, InventoryDocument, InventoryFactory};

/// File-based inventory
#[derive(Debug, Clone)]
pub struct FileInventory {
    path: PathBuf,
}

impl FileInventory {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl Inventory for FileInventory {
    async fn list_instances(&self, filter: &InstanceFilter) -> Result<Vec<InstanceRecord>, Error> {
        let content = fs::read_to_string(&self.path).await.map_err(|e| {
            Error::inventory(format!(
                "Failed to read inventory file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        let document = InventoryDocument::parse(&content).map_err(|e| {
            Error::inventory(format!(
                "Failed to parse inventory file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(document.into_matching(filter))
    }

    fn provider_name(&self) -> &'static str {
        "file"
    }
}

/// Factory for creating file inventories
pub struct FileInventoryFactory;

impl InventoryFactory for FileInventoryFactory {
    fn create(&self, config: &InventoryConfig) -> Result<Box<dyn Inventory>, Error> {
        match config {
            InventoryConfig::File { path } => Ok(Box::new(FileInventory::new(path))),
            _ => Err(Error::config("Invalid config for file inventory")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn filter() -> InstanceFilter {
        InstanceFilter::running("substrate:zone", "corp")
    }

    #[tokio::test]
    async fn test_file_inventory_reads_and_filters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        fs::write(
            &path,
            r#"{"instances":[
                {"id":"i-1","private_address":"10.0.0.1","tags":{"substrate:zone":"corp"}},
                {"id":"i-2","private_address":"10.0.0.2","tags":{"substrate:zone":"lab"}},
                {"id":"i-3","state":"stopped","tags":{"substrate:zone":"corp"}}
            ]}"#,
        )
        .await
        .unwrap();

        let inventory = FileInventory::new(&path);
        let listed = inventory.list_instances(&filter()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, "i-1");
    }

    #[tokio::test]
    async fn test_file_inventory_rereads_on_every_query() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        fs::write(&path, r#"{"instances":[]}"#).await.unwrap();

        let inventory = FileInventory::new(&path);
        assert!(inventory.list_instances(&filter()).await.unwrap().is_empty());

        fs::write(
            &path,
            r#"{"instances":[{"id":"i-1","tags":{"substrate:zone":"corp"}}]}"#,
        )
        .await
        .unwrap();
        assert_eq!(inventory.list_instances(&filter()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_file_inventory_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let inventory = FileInventory::new(dir.path().join("absent.json"));
        let err = inventory.list_instances(&filter()).await.unwrap_err();
        assert!(matches!(err, Error::Inventory(_)));
    }

    #[tokio::test]
    async fn test_file_inventory_corrupt_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("inventory.json");
        fs::write(&path, b"corrupted json data").await.unwrap();

        let err = FileInventory::new(&path)
            .list_instances(&filter())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to parse inventory file"));
    }

    #[test]
    fn test_factory_rejects_other_configs() {
        let factory = FileInventoryFactory;
        assert!(factory.create(&InventoryConfig::default()).is_err());
        assert!(
            factory
                .create(&InventoryConfig::File {
                    path: "/var/lib/dnswatch/inventory.json".to_string()
                })
                .is_ok()
        );
    }
}
