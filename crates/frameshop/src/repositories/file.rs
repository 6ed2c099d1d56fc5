use std::sync::Arc;

use frameshop_core::shop::FileRecord;
use frameshop_core::storage::{
    Direction, KeySchema, KeyValue, KeyValues, KeyedStore, Repository,
};

use crate::error::Result;

/// Metadata of files attached to orders, keyed by order and file uuid.
pub struct FileRepository {
    repo: Repository<FileRecord>,
}

impl FileRepository {
    pub fn new(store: Arc<dyn KeyedStore>, table: impl Into<String>) -> Result<Self> {
        let schema = KeySchema::partition("orderUuid", |f: &FileRecord| {
            KeyValue::non_empty(&f.order_uuid)
        })
        .sorted_by("fileUuid", |f: &FileRecord| KeyValue::non_empty(&f.file_uuid));
        Ok(Self {
            repo: Repository::new(store, table, schema)?,
        })
    }

    pub async fn create_file(&self, file: &FileRecord) -> Result<()> {
        self.repo.put(file).await?;
        tracing::debug!(order_uuid = %file.order_uuid, file_uuid = %file.file_uuid, "File registered");
        Ok(())
    }

    pub async fn get_file(&self, order_uuid: &str, file_uuid: &str) -> Result<Option<FileRecord>> {
        Ok(self.repo.get(order_uuid, Some(file_uuid.into())).await?)
    }

    pub async fn get_files_by_order(&self, order_uuid: &str) -> Result<Vec<FileRecord>> {
        Ok(self
            .repo
            .get_by_partition_key(order_uuid, Direction::Ascending)
            .await?)
    }

    pub async fn delete_file(&self, order_uuid: &str, file_uuid: &str) -> Result<()> {
        self.delete_files(order_uuid, &[file_uuid]).await
    }

    pub async fn delete_files(&self, order_uuid: &str, file_uuids: &[&str]) -> Result<()> {
        let keys = file_uuids
            .iter()
            .map(|file_uuid| KeyValues::new(order_uuid, Some(KeyValue::from(*file_uuid))))
            .collect::<Vec<_>>();
        Ok(self.repo.batch_delete(&keys).await?)
    }
}
