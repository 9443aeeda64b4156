//! 内存存储
//!
//! 进程内保存全部记录，适合测试和临时表

use super::{PersistedState, StorageAdapter};
use crate::error::HBaseResult;
use crate::types::RegionKey;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Default)]
struct MemoryTable {
    schema_json: Option<String>,
    regions: BTreeMap<String, Option<String>>,
}

/// 内存存储，克隆后共享同一份数据
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    tables: Arc<RwLock<BTreeMap<String, MemoryTable>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageAdapter for MemoryStorage {
    fn load(&self, key: &RegionKey) -> HBaseResult<PersistedState> {
        let tables = self.tables.read();
        let Some(table) = tables.get(&key.table) else {
            return Ok(PersistedState::default());
        };
        Ok(PersistedState {
            schema_json: table.schema_json.clone(),
            rows_json: table.regions.get(&key.region).cloned().flatten(),
        })
    }

    fn save_schema(&self, table: &str, schema_json: &str) -> HBaseResult<()> {
        let mut tables = self.tables.write();
        tables.entry(table.to_string()).or_default().schema_json = Some(schema_json.to_string());
        Ok(())
    }

    fn save_rows(&self, key: &RegionKey, rows_json: &str) -> HBaseResult<()> {
        let mut tables = self.tables.write();
        tables
            .entry(key.table.clone())
            .or_default()
            .regions
            .insert(key.region.clone(), Some(rows_json.to_string()));
        Ok(())
    }

    fn ensure_region_exists(&self, key: &RegionKey) -> HBaseResult<()> {
        let mut tables = self.tables.write();
        tables
            .entry(key.table.clone())
            .or_default()
            .regions
            .entry(key.region.clone())
            .or_insert(None);
        Ok(())
    }

    fn drop_table(&self, table: &str) -> HBaseResult<()> {
        self.tables.write().remove(table);
        Ok(())
    }

    fn list_tables(&self) -> HBaseResult<Vec<String>> {
        let tables = self.tables.read();
        Ok(tables
            .iter()
            .filter(|(_, table)| table.schema_json.is_some())
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn list_regions(&self, table: &str) -> HBaseResult<Vec<String>> {
        let tables = self.tables.read();
        Ok(tables
            .get(table)
            .map(|t| t.regions.keys().cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let storage = MemoryStorage::new();
        let other = storage.clone();
        let key = RegionKey::default_region("t");

        storage.save_schema("t", "{}").unwrap();
        other.ensure_region_exists(&key).unwrap();
        assert_eq!(storage.load(&key).unwrap().rows_json, None);

        other.save_rows(&key, r#"{"1":{}}"#).unwrap();
        assert_eq!(storage.load(&key).unwrap().rows_json.as_deref(), Some(r#"{"1":{}}"#));
        assert_eq!(storage.list_regions("t").unwrap(), vec!["region1"]);

        storage.drop_table("t").unwrap();
        assert!(other.list_tables().unwrap().is_empty());
        storage.drop_table("t").unwrap();
    }
}
