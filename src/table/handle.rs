//! 表句柄
//!
//! 将表模式与存储适配器绑定，每次修改后立即写回

use super::schema::{ColumnFamilies, FamilyProperties, TableSchema};
use crate::error::HBaseResult;
use crate::hbase_error;
use crate::serializer::RecordSerializer;
use crate::storage::StorageAdapter;
use crate::types::{RegionKey, validate_identifier};
use rat_logger::debug;
use std::sync::Arc;

/// 持久化的表
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    storage: Arc<dyn StorageAdapter>,
    serializer: RecordSerializer,
}

impl Table {
    /// 创建表：保存模式并准备默认区域
    pub fn create(
        storage: Arc<dyn StorageAdapter>,
        name: impl Into<String>,
        column_families: ColumnFamilies,
    ) -> HBaseResult<Self> {
        Self::create_with(storage, RecordSerializer::default(), name, column_families)
    }

    /// 使用指定序列化器创建表
    pub fn create_with(
        storage: Arc<dyn StorageAdapter>,
        serializer: RecordSerializer,
        name: impl Into<String>,
        column_families: ColumnFamilies,
    ) -> HBaseResult<Self> {
        let schema = TableSchema::new(name, column_families)?;
        let table = Self {
            schema,
            storage,
            serializer,
        };
        table.persist()?;
        table
            .storage
            .ensure_region_exists(&RegionKey::default_region(table.name()))?;
        debug!("创建表: {}", table.name());
        Ok(table)
    }

    /// 打开已存在的表
    pub fn open(storage: Arc<dyn StorageAdapter>, name: &str) -> HBaseResult<Self> {
        Self::open_with(storage, RecordSerializer::default(), name)
    }

    /// 使用指定序列化器打开已存在的表
    pub fn open_with(
        storage: Arc<dyn StorageAdapter>,
        serializer: RecordSerializer,
        name: &str,
    ) -> HBaseResult<Self> {
        validate_identifier("table_name", name)?;
        let state = storage.load(&RegionKey::default_region(name))?;
        let json = state
            .schema_json
            .ok_or_else(|| hbase_error!(table_not_found, name))?;
        let schema = serializer.decode_schema(&json)?;
        Ok(Self {
            schema,
            storage,
            serializer,
        })
    }

    pub fn name(&self) -> &str {
        &self.schema.name
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn is_enabled(&self) -> bool {
        self.schema.enabled
    }

    pub fn column_families(&self) -> &ColumnFamilies {
        &self.schema.column_families
    }

    pub fn family(&self, family: &str) -> Option<&FamilyProperties> {
        self.schema.column_families.get(family)
    }

    fn persist(&self) -> HBaseResult<()> {
        let json = self.serializer.encode_schema(&self.schema)?;
        self.storage.save_schema(&self.schema.name, &json)
    }

    /// 启用表
    pub fn enable(&mut self) -> HBaseResult<()> {
        self.schema.set_enabled(true);
        self.persist()
    }

    /// 禁用表
    pub fn disable(&mut self) -> HBaseResult<()> {
        self.schema.set_enabled(false);
        self.persist()
    }

    /// 表描述
    pub fn describe(&self) -> String {
        self.schema.describe()
    }

    /// 修改列族版本
    pub fn alter(&mut self, family: &str, version: impl Into<String>) -> HBaseResult<()> {
        self.schema.alter(family, version)?;
        self.persist()
    }

    /// 添加列族；已存在时整体覆盖
    pub fn add_column_family(
        &mut self,
        family: impl Into<String>,
        version: impl Into<String>,
    ) -> HBaseResult<()> {
        self.schema.add_column_family(family, version);
        self.persist()
    }

    /// 删除列族
    pub fn drop_column_family(&mut self, family: &str) -> HBaseResult<()> {
        self.schema.drop_column_family(family)?;
        self.persist()
    }

    /// 删除表的全部持久化数据，包括所有区域
    pub fn drop(self) -> HBaseResult<()> {
        debug!("删除表: {}", self.schema.name);
        self.storage.drop_table(&self.schema.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HBaseError;
    use crate::storage::MemoryStorage;

    fn families() -> ColumnFamilies {
        vec![("cf1", FamilyProperties::with_version("1"))]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_create_persists_schema_and_region() {
        let storage = Arc::new(MemoryStorage::new());
        let table = Table::create(storage.clone(), "users", families()).unwrap();
        assert!(table.is_enabled());

        let state = storage.load(&RegionKey::default_region("users")).unwrap();
        assert_eq!(
            state.schema_json.as_deref(),
            Some(r#"{"enabled":true,"name":"users","column_families":{"cf1":{"version":"1"}}}"#)
        );
        assert_eq!(storage.list_regions("users").unwrap(), vec!["region1"]);
    }

    #[test]
    fn test_mutations_are_written_through() {
        let storage = Arc::new(MemoryStorage::new());
        let mut table = Table::create(storage.clone(), "users", families()).unwrap();

        table.disable().unwrap();
        table.add_column_family("cf2", "3").unwrap();
        table.alter("cf1", "2").unwrap();

        let reopened = Table::open(storage.clone(), "users").unwrap();
        assert!(!reopened.is_enabled());
        assert_eq!(reopened.column_families().names(), vec!["cf1", "cf2"]);
        assert_eq!(reopened.family("cf1").unwrap().version(), Some("2"));

        table.enable().unwrap();
        table.drop_column_family("cf2").unwrap();
        let reopened = Table::open(storage, "users").unwrap();
        assert!(reopened.is_enabled());
        assert_eq!(reopened.column_families().names(), vec!["cf1"]);
    }

    #[test]
    fn test_failed_mutation_does_not_persist() {
        let storage = Arc::new(MemoryStorage::new());
        let mut table = Table::create(storage.clone(), "users", families()).unwrap();
        assert!(matches!(
            table.alter("nope", "9"),
            Err(HBaseError::UnknownFamily { .. })
        ));
        assert!(matches!(
            table.drop_column_family("nope"),
            Err(HBaseError::UnknownFamily { .. })
        ));
        assert_eq!(Table::open(storage, "users").unwrap().schema(), table.schema());
    }

    #[test]
    fn test_open_missing_table() {
        let storage = Arc::new(MemoryStorage::new());
        assert!(matches!(
            Table::open(storage, "ghost"),
            Err(HBaseError::TableNotFound { .. })
        ));
    }

    #[test]
    fn test_drop_removes_everything() {
        let storage = Arc::new(MemoryStorage::new());
        let table = Table::create(storage.clone(), "users", families()).unwrap();
        table.drop().unwrap();
        assert!(storage.list_tables().unwrap().is_empty());
        assert!(storage.list_regions("users").unwrap().is_empty());
    }
}
