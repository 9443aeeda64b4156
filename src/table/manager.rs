//! 表管理器
//!
//! 统一管理表的创建、修改、删除和数据读写：缓存表模式和已打开的区域存储，
//! 串行化对同一存储的访问，并拒绝对已禁用表的数据操作

use super::cell_store::{CellStoreOptions, VersionedCellStore};
use super::handle::Table;
use super::schema::ColumnFamilies;
use crate::clock::Clock;
use crate::config::StoreConfig;
use crate::error::HBaseResult;
use crate::hbase_error;
use crate::serializer::{RecordSerializer, SerializerConfig};
use crate::storage::{JsonFileStorage, MemoryStorage, StorageAdapter};
use crate::types::{
    CellValue, DEFAULT_REGION, RegionKey, RowData, RowKey, Rows, validate_identifier,
};
use rat_logger::{debug, info};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// 表管理器
#[derive(Debug)]
pub struct TableManager {
    /// 存储适配器
    storage: Arc<dyn StorageAdapter>,
    /// 存储配置
    config: StoreConfig,
    /// 时间戳来源
    clock: Clock,
    /// 记录序列化器
    serializer: RecordSerializer,
    /// 表缓存
    table_cache: Arc<RwLock<HashMap<String, Table>>>,
    /// 已打开的区域存储
    store_cache: Arc<Mutex<HashMap<RegionKey, VersionedCellStore>>>,
}

impl TableManager {
    /// 创建新的表管理器
    pub fn new(storage: Arc<dyn StorageAdapter>, config: StoreConfig) -> HBaseResult<Self> {
        config.validate()?;
        let serializer =
            RecordSerializer::new(SerializerConfig::new().pretty(config.pretty_json));
        info!("创建表管理器: 默认区域={}, 最大版本数={}", config.default_region, config.max_versions);
        Ok(Self {
            storage,
            config,
            clock: Clock::system(),
            serializer,
            table_cache: Arc::new(RwLock::new(HashMap::new())),
            store_cache: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    /// 使用配置中的数据目录创建基于 JSON 文件的管理器
    pub fn from_config(config: StoreConfig) -> HBaseResult<Self> {
        let storage = Arc::new(JsonFileStorage::new(config.data_root.clone()));
        Self::new(storage, config)
    }

    /// 创建基于内存存储的管理器
    pub fn in_memory(config: StoreConfig) -> HBaseResult<Self> {
        Self::new(Arc::new(MemoryStorage::new()), config)
    }

    /// 替换时间戳来源
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn default_key(&self, table: &str) -> RegionKey {
        RegionKey::new(table, self.config.default_region.as_str())
    }

    /// 从缓存取表，未缓存时从存储加载
    fn cached_table<'a>(
        &self,
        tables: &'a mut HashMap<String, Table>,
        name: &str,
    ) -> HBaseResult<&'a mut Table> {
        match tables.entry(name.to_string()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let table = Table::open_with(self.storage.clone(), self.serializer.clone(), name)?;
                Ok(entry.insert(table))
            }
        }
    }

    /// 从缓存取区域存储，未缓存时打开
    fn cached_store<'a>(
        &self,
        stores: &'a mut HashMap<RegionKey, VersionedCellStore>,
        key: RegionKey,
    ) -> HBaseResult<&'a mut VersionedCellStore> {
        match stores.entry(key) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let options = CellStoreOptions::new()
                    .clock(self.clock.clone())
                    .serializer(self.serializer.clone());
                let store = VersionedCellStore::open_with_options(
                    self.storage.clone(),
                    entry.key().clone(),
                    self.config.max_versions,
                    options,
                )?;
                Ok(entry.insert(store))
            }
        }
    }

    /// 在表缓存中对表执行操作
    async fn with_table<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut Table) -> HBaseResult<R>,
    ) -> HBaseResult<R> {
        let mut tables = self.table_cache.write().await;
        f(self.cached_table(&mut tables, name)?)
    }

    /// 对默认区域执行数据操作；表不存在或已禁用时拒绝
    ///
    /// 表缓存锁一直持有到数据操作结束，禁用或删除表不会与之交错。
    /// 加锁顺序固定为先表缓存、后区域缓存
    async fn with_store<R>(
        &self,
        name: &str,
        f: impl FnOnce(&mut VersionedCellStore) -> HBaseResult<R>,
    ) -> HBaseResult<R> {
        let mut tables = self.table_cache.write().await;
        if !self.cached_table(&mut tables, name)?.is_enabled() {
            return Err(hbase_error!(table_disabled, name));
        }

        let mut stores = self.store_cache.lock().await;
        f(self.cached_store(&mut stores, self.default_key(name))?)
    }

    fn exists_in(&self, tables: &HashMap<String, Table>, name: &str) -> HBaseResult<bool> {
        if tables.contains_key(name) {
            return Ok(true);
        }
        Ok(self.storage.load(&self.default_key(name))?.schema_json.is_some())
    }

    /// 检查表是否存在
    pub async fn table_exists(&self, name: &str) -> HBaseResult<bool> {
        validate_identifier("table_name", name)?;
        let tables = self.table_cache.read().await;
        self.exists_in(&tables, name)
    }

    /// 创建表；检查与创建在同一把写锁下完成
    pub async fn create_table(
        &self,
        name: &str,
        column_families: ColumnFamilies,
    ) -> HBaseResult<()> {
        validate_identifier("table_name", name)?;
        let mut tables = self.table_cache.write().await;
        if self.exists_in(&tables, name)? {
            return Err(hbase_error!(table_exists, name));
        }

        let table = Table::create_with(
            self.storage.clone(),
            self.serializer.clone(),
            name,
            column_families,
        )?;
        if self.config.default_region != DEFAULT_REGION {
            self.storage.ensure_region_exists(&self.default_key(name))?;
        }

        tables.insert(name.to_string(), table);
        info!("成功创建表: {}", name);
        Ok(())
    }

    /// 列出所有表
    pub async fn list_tables(&self) -> HBaseResult<Vec<String>> {
        self.storage.list_tables()
    }

    /// 表描述
    pub async fn describe(&self, name: &str) -> HBaseResult<String> {
        self.with_table(name, |table| Ok(table.describe())).await
    }

    /// 表是否启用
    pub async fn is_enabled(&self, name: &str) -> HBaseResult<bool> {
        self.with_table(name, |table| Ok(table.is_enabled())).await
    }

    /// 启用表
    pub async fn enable_table(&self, name: &str) -> HBaseResult<()> {
        self.with_table(name, |table| table.enable()).await?;
        info!("表 {} 已启用", name);
        Ok(())
    }

    /// 禁用表
    pub async fn disable_table(&self, name: &str) -> HBaseResult<()> {
        self.with_table(name, |table| table.disable()).await?;
        info!("表 {} 已禁用", name);
        Ok(())
    }

    /// 修改列族版本
    pub async fn alter(&self, name: &str, family: &str, version: &str) -> HBaseResult<()> {
        self.with_table(name, |table| table.alter(family, version)).await?;
        debug!("表 {} 列族 {} 版本改为 {}", name, family, version);
        Ok(())
    }

    /// 添加列族；已存在时覆盖
    pub async fn add_column_family(
        &self,
        name: &str,
        family: &str,
        version: &str,
    ) -> HBaseResult<()> {
        self.with_table(name, |table| table.add_column_family(family, version))
            .await?;
        debug!("表 {} 添加列族 {}", name, family);
        Ok(())
    }

    /// 删除列族（不自动清理数据，需要时调用 [`TableManager::reconcile`]）
    pub async fn drop_column_family(&self, name: &str, family: &str) -> HBaseResult<()> {
        self.with_table(name, |table| table.drop_column_family(family))
            .await?;
        debug!("表 {} 删除列族 {}", name, family);
        Ok(())
    }

    /// 删除表及其全部区域数据；表不存在时不报错
    pub async fn drop_table(&self, name: &str) -> HBaseResult<()> {
        validate_identifier("table_name", name)?;
        // 两把锁持有到存储删除完成，期间的数据操作无法重新缓存该表
        let mut tables = self.table_cache.write().await;
        let mut stores = self.store_cache.lock().await;
        tables.remove(name);
        stores.retain(|key, _| key.table != name);

        self.storage.drop_table(name)?;
        info!("成功删除表: {}", name);
        Ok(())
    }

    /// 写入单元格
    pub async fn put(
        &self,
        name: &str,
        row: RowKey,
        family: &str,
        qualifier: &str,
        value: impl Into<CellValue>,
    ) -> HBaseResult<()> {
        let value = value.into();
        self.with_store(name, |store| store.put(row, family, qualifier, value))
            .await
    }

    /// 读取整行
    pub async fn get(&self, name: &str, row: RowKey) -> HBaseResult<RowData> {
        self.with_store(name, |store| store.get(row).cloned()).await
    }

    /// 删除单个版本
    pub async fn delete(
        &self,
        name: &str,
        row: RowKey,
        family: &str,
        qualifier: &str,
        timestamp: &str,
    ) -> HBaseResult<()> {
        self.with_store(name, |store| store.delete(row, family, qualifier, timestamp))
            .await
    }

    /// 删除整行
    pub async fn delete_all(&self, name: &str, row: RowKey) -> HBaseResult<()> {
        self.with_store(name, |store| store.delete_all(row)).await
    }

    /// 扫描全部行
    pub async fn scan(&self, name: &str) -> HBaseResult<Rows> {
        self.with_store(name, |store| Ok(store.scan().clone())).await
    }

    /// 行数
    pub async fn count(&self, name: &str) -> HBaseResult<usize> {
        self.with_store(name, |store| Ok(store.count())).await
    }

    /// 清空表数据
    pub async fn truncate(&self, name: &str) -> HBaseResult<()> {
        self.with_store(name, |store| store.truncate()).await?;
        info!("表 {} 已清空", name);
        Ok(())
    }

    /// 按当前模式清理表的所有区域，返回删除的行数
    pub async fn reconcile(&self, name: &str) -> HBaseResult<usize> {
        let mut tables = self.table_cache.write().await;
        let schema = self.cached_table(&mut tables, name)?.schema().clone();

        let mut regions = self.storage.list_regions(name)?;
        if !regions.contains(&self.config.default_region) {
            regions.push(self.config.default_region.clone());
        }

        let mut stores = self.store_cache.lock().await;
        let mut removed = 0;
        for region in regions {
            removed += self
                .cached_store(&mut stores, RegionKey::new(name, region))?
                .reconcile(&schema)?;
        }
        info!("表 {} 按模式清理完成，删除 {} 行", name, removed);
        Ok(removed)
    }

    /// 清除缓存
    pub async fn clear_cache(&self) {
        self.table_cache.write().await.clear();
        self.store_cache.lock().await.clear();
        info!("表管理器缓存已清除");
    }

    /// 获取统计信息
    pub async fn get_stats(&self) -> HashMap<String, serde_json::Value> {
        let mut stats = HashMap::new();

        stats.insert(
            "table_cache_size".to_string(),
            serde_json::Value::Number(self.table_cache.read().await.len().into()),
        );
        stats.insert(
            "store_cache_size".to_string(),
            serde_json::Value::Number(self.store_cache.lock().await.len().into()),
        );
        stats.insert(
            "max_versions".to_string(),
            serde_json::Value::Number(self.config.max_versions.into()),
        );
        stats.insert(
            "default_region".to_string(),
            serde_json::Value::String(self.config.default_region.clone()),
        );

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HBaseError;
    use crate::table::schema::FamilyProperties;

    fn families(names: &[&str]) -> ColumnFamilies {
        names
            .iter()
            .map(|name| (*name, FamilyProperties::with_version("1")))
            .collect()
    }

    fn manager(max_versions: u32) -> TableManager {
        let config = StoreConfig::builder().max_versions(max_versions).build().unwrap();
        TableManager::in_memory(config)
            .unwrap()
            .with_clock(Clock::manual(1_000))
    }

    #[tokio::test]
    async fn test_create_and_duplicate() {
        let manager = manager(1);
        manager.create_table("users", families(&["cf1"])).await.unwrap();
        assert!(manager.table_exists("users").await.unwrap());
        assert!(matches!(
            manager.create_table("users", families(&["cf1"])).await,
            Err(HBaseError::TableAlreadyExists { .. })
        ));
        assert_eq!(manager.list_tables().await.unwrap(), vec!["users"]);
    }

    #[tokio::test]
    async fn test_disabled_table_refuses_data_operations() {
        let manager = manager(1);
        manager.create_table("users", families(&["cf1"])).await.unwrap();
        manager.put("users", 1, "cf1", "q", "v").await.unwrap();

        manager.disable_table("users").await.unwrap();
        assert!(!manager.is_enabled("users").await.unwrap());
        assert!(matches!(
            manager.put("users", 2, "cf1", "q", "v").await,
            Err(HBaseError::TableDisabled { .. })
        ));
        assert!(matches!(
            manager.scan("users").await,
            Err(HBaseError::TableDisabled { .. })
        ));

        manager.enable_table("users").await.unwrap();
        assert_eq!(manager.count("users").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let manager = manager(1);
        assert!(matches!(
            manager.get("ghost", 1).await,
            Err(HBaseError::TableNotFound { .. })
        ));
        assert!(!manager.table_exists("ghost").await.unwrap());
        manager.drop_table("ghost").await.unwrap();
    }

    #[tokio::test]
    async fn test_drop_family_then_reconcile() {
        let manager = manager(1);
        manager.create_table("t", families(&["cf1", "cf2"])).await.unwrap();
        manager.put("t", 5, "cf1", "q", "a").await.unwrap();
        manager.put("t", 5, "cf2", "q", "b").await.unwrap();
        manager.put("t", 6, "cf1", "q", "c").await.unwrap();

        manager.drop_column_family("t", "cf2").await.unwrap();
        // 删除列族不会自动清理数据
        assert_eq!(manager.count("t").await.unwrap(), 2);

        assert_eq!(manager.reconcile("t").await.unwrap(), 1);
        let rows = manager.scan("t").await.unwrap();
        assert_eq!(rows.keys().copied().collect::<Vec<_>>(), vec![6]);
    }

    #[tokio::test]
    async fn test_drop_table_clears_caches() {
        let manager = manager(1);
        manager.create_table("t", families(&["cf1"])).await.unwrap();
        manager.put("t", 1, "cf1", "q", "v").await.unwrap();

        manager.drop_table("t").await.unwrap();
        assert!(!manager.table_exists("t").await.unwrap());

        manager.create_table("t", families(&["cf1"])).await.unwrap();
        assert_eq!(manager.count("t").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stats() {
        let manager = manager(2);
        manager.create_table("t", families(&["cf1"])).await.unwrap();
        manager.count("t").await.unwrap();
        let stats = manager.get_stats().await;
        assert_eq!(stats["table_cache_size"], serde_json::json!(1));
        assert_eq!(stats["store_cache_size"], serde_json::json!(1));
        assert_eq!(stats["max_versions"], serde_json::json!(2));

        manager.clear_cache().await;
        assert_eq!(manager.get_stats().await["table_cache_size"], serde_json::json!(0));
    }
}
