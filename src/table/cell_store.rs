//! 多版本单元格存储（HFile）
//!
//! 保存一个表区域的全部行：行号 -> 列族 -> 列 -> 时间戳 -> 值。
//! 每个单元格保留的版本数受 `version_limit` 限制，写入时不检查表模式，
//! 只在 [`VersionedCellStore::reconcile`] 时按模式清理

use super::schema::TableSchema;
use crate::clock::Clock;
use crate::error::{HBaseError, HBaseResult};
use crate::hbase_error;
use crate::serializer::RecordSerializer;
use crate::storage::StorageAdapter;
use crate::types::{CellValue, CellVersions, RegionKey, RowData, RowKey, Rows, validate_identifier};
use rat_logger::debug;
use std::cmp::Ordering;
use std::sync::Arc;

/// 打开存储时的可选项
#[derive(Debug, Clone, Default)]
pub struct CellStoreOptions {
    /// 时间戳来源
    pub clock: Clock,
    /// 记录序列化器
    pub serializer: RecordSerializer,
}

impl CellStoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn serializer(mut self, serializer: RecordSerializer) -> Self {
        self.serializer = serializer;
        self
    }
}

/// 按数值比较时间戳；无法解析的时间戳排在所有数值之前，其次按文本
fn compare_timestamps(a: &str, b: &str) -> Ordering {
    (a.parse::<i64>().ok(), a).cmp(&(b.parse::<i64>().ok(), b))
}

fn oldest_timestamp(versions: &CellVersions) -> Option<String> {
    versions
        .keys()
        .min_by(|a, b| compare_timestamps(a, b))
        .cloned()
}

/// 多版本单元格存储
#[derive(Debug)]
pub struct VersionedCellStore {
    key: RegionKey,
    rows: Rows,
    version_limit: u32,
    storage: Arc<dyn StorageAdapter>,
    clock: Clock,
    serializer: RecordSerializer,
}

impl VersionedCellStore {
    /// 打开存储，使用系统时钟
    pub fn open(
        storage: Arc<dyn StorageAdapter>,
        key: RegionKey,
        version_limit: u32,
    ) -> HBaseResult<Self> {
        Self::open_with_options(storage, key, version_limit, CellStoreOptions::default())
    }

    /// 打开存储；没有持久化数据时以空状态开始并立即写回
    pub fn open_with_options(
        storage: Arc<dyn StorageAdapter>,
        key: RegionKey,
        version_limit: u32,
        options: CellStoreOptions,
    ) -> HBaseResult<Self> {
        if version_limit == 0 {
            return Err(hbase_error!(validation, "version_limit", "保留版本数必须大于0"));
        }
        validate_identifier("table_name", &key.table)?;
        validate_identifier("region", &key.region)?;

        let state = storage.load(&key)?;
        let mut store = Self {
            key,
            rows: Rows::new(),
            version_limit,
            storage,
            clock: options.clock,
            serializer: options.serializer,
        };

        match state.rows_json {
            Some(json) => {
                store.rows = store.serializer.decode_rows(&json)?;
                debug!("加载区域 {}: {} 行", store.key, store.rows.len());
            }
            None => {
                debug!("区域 {} 无数据，初始化为空", store.key);
                store.persist()?;
            }
        }
        Ok(store)
    }

    pub fn key(&self) -> &RegionKey {
        &self.key
    }

    pub fn version_limit(&self) -> u32 {
        self.version_limit
    }

    fn persist(&self) -> HBaseResult<()> {
        let json = self.serializer.encode_rows(&self.rows)?;
        self.storage.save_rows(&self.key, &json)
    }

    /// 写入一个值，时间戳取当前秒数
    ///
    /// 版本数超过上限时只淘汰一个最旧的版本
    pub fn put(
        &mut self,
        row: RowKey,
        family: &str,
        qualifier: &str,
        value: impl Into<CellValue>,
    ) -> HBaseResult<()> {
        let timestamp = self.clock.timestamp();
        let versions = self
            .rows
            .entry(row)
            .or_default()
            .entry(family.to_string())
            .or_default()
            .entry(qualifier.to_string())
            .or_default();
        versions.insert(timestamp, value.into());

        if versions.len() > self.version_limit as usize {
            if let Some(oldest) = oldest_timestamp(versions) {
                debug!(
                    "单元格 {}:{}:{} 超出版本上限 {}，淘汰时间戳 {}",
                    row, family, qualifier, self.version_limit, oldest
                );
                versions.remove(&oldest);
            }
        }

        self.persist()
    }

    /// 获取整行
    pub fn get(&self, row: RowKey) -> HBaseResult<&RowData> {
        self.rows
            .get(&row)
            .ok_or_else(|| hbase_error!(row_not_found, row))
    }

    /// 获取单元格的全部版本
    pub fn get_cell(&self, row: RowKey, family: &str, qualifier: &str) -> Option<&CellVersions> {
        self.rows.get(&row)?.get(family)?.get(qualifier)
    }

    /// 删除单个版本；空的列与列族保留
    pub fn delete(
        &mut self,
        row: RowKey,
        family: &str,
        qualifier: &str,
        timestamp: &str,
    ) -> HBaseResult<()> {
        let removed = self
            .rows
            .get_mut(&row)
            .and_then(|r| r.get_mut(family))
            .and_then(|f| f.get_mut(qualifier))
            .and_then(|versions| versions.remove(timestamp));

        if removed.is_none() {
            return Err(HBaseError::CellVersionNotFound {
                row,
                family: family.to_string(),
                qualifier: qualifier.to_string(),
                timestamp: timestamp.to_string(),
            });
        }
        self.persist()
    }

    /// 删除整行
    pub fn delete_all(&mut self, row: RowKey) -> HBaseResult<()> {
        self.rows
            .remove(&row)
            .ok_or_else(|| hbase_error!(row_not_found, row))?;
        self.persist()
    }

    /// 全部行，行号升序
    pub fn scan(&self) -> &Rows {
        &self.rows
    }

    /// 行数
    pub fn count(&self) -> usize {
        self.rows.len()
    }

    /// 清空全部行
    pub fn truncate(&mut self) -> HBaseResult<()> {
        self.rows.clear();
        self.persist()
    }

    /// 按表模式清理数据
    ///
    /// 只要某行含有模式中不存在的列族，整行都会被删除（包括合法列族的数据）。
    /// 返回删除的行数
    pub fn reconcile(&mut self, schema: &TableSchema) -> HBaseResult<usize> {
        let stale: Vec<RowKey> = self
            .rows
            .iter()
            .filter(|(_, families)| families.keys().any(|family| !schema.has_family(family)))
            .map(|(row, _)| *row)
            .collect();

        for row in &stale {
            self.rows.remove(row);
        }
        debug!("区域 {} 按模式清理了 {} 行", self.key, stale.len());

        self.persist()?;
        Ok(stale.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use crate::table::schema::ColumnFamilies;

    fn open_store(storage: &Arc<MemoryStorage>, limit: u32, clock: &Clock) -> VersionedCellStore {
        VersionedCellStore::open_with_options(
            storage.clone(),
            RegionKey::default_region("t"),
            limit,
            CellStoreOptions::new().clock(clock.clone()),
        )
        .unwrap()
    }

    #[test]
    fn test_open_persists_empty_state() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open_store(&storage, 1, &Clock::manual(1));
        assert_eq!(store.count(), 0);
        let state = storage.load(&RegionKey::default_region("t")).unwrap();
        assert_eq!(state.rows_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_open_rejects_zero_limit() {
        let storage = Arc::new(MemoryStorage::new());
        let err = VersionedCellStore::open(storage, RegionKey::default_region("t"), 0).unwrap_err();
        assert!(matches!(err, HBaseError::ValidationError { .. }));
    }

    #[test]
    fn test_put_keeps_newest_versions() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Clock::manual(100);
        let mut store = open_store(&storage, 2, &clock);

        for value in ["v1", "v2", "v3"] {
            store.put(10, "cf1", "q1", value).unwrap();
            clock.advance(1);
        }

        let cell = store.get_cell(10, "cf1", "q1").unwrap();
        assert_eq!(cell.len(), 2);
        assert!(!cell.contains_key("100"));
        assert_eq!(cell.get("101"), Some(&CellValue::from("v2")));
        assert_eq!(cell.get("102"), Some(&CellValue::from("v3")));
    }

    #[test]
    fn test_same_second_overwrites() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Clock::manual(5);
        let mut store = open_store(&storage, 3, &clock);
        store.put(1, "cf", "q", 1).unwrap();
        store.put(1, "cf", "q", 2).unwrap();
        let cell = store.get_cell(1, "cf", "q").unwrap();
        assert_eq!(cell.len(), 1);
        assert_eq!(cell.get("5"), Some(&CellValue::Int(2)));
    }

    #[test]
    fn test_eviction_compares_numerically() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Clock::manual(9);
        let mut store = open_store(&storage, 1, &clock);

        store.put(1, "cf", "q", "old").unwrap();
        clock.set(10);
        store.put(1, "cf", "q", "new").unwrap();

        // 文本比较会认为 "10" < "9"
        let cell = store.get_cell(1, "cf", "q").unwrap();
        assert_eq!(cell.keys().collect::<Vec<_>>(), vec!["10"]);
    }

    #[test]
    fn test_single_eviction_per_put() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .save_rows(
                &RegionKey::default_region("t"),
                r#"{"1":{"cf":{"q":{"1":"a","2":"b","3":"c"}}}}"#,
            )
            .unwrap();
        let clock = Clock::manual(4);
        let mut store = open_store(&storage, 1, &clock);

        store.put(1, "cf", "q", "d").unwrap();
        let cell = store.get_cell(1, "cf", "q").unwrap();
        assert_eq!(cell.keys().collect::<Vec<_>>(), vec!["2", "3", "4"]);

        clock.advance(1);
        store.put(1, "cf", "q", "e").unwrap();
        assert_eq!(store.get_cell(1, "cf", "q").unwrap().len(), 3);
    }

    #[test]
    fn test_scan_is_ascending() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(1));
        for row in [30, -2, 7, 100, 8] {
            store.put(row, "cf", "q", row).unwrap();
        }
        store.delete_all(7).unwrap();
        let keys: Vec<RowKey> = store.scan().keys().copied().collect();
        assert_eq!(keys, vec![-2, 8, 30, 100]);
    }

    #[test]
    fn test_reload_preserves_order_and_values() {
        let storage = Arc::new(MemoryStorage::new());
        let clock = Clock::manual(50);
        {
            let mut store = open_store(&storage, 1, &clock);
            store.put(1, "cf", "a", "x").unwrap();
            store.put(3, "cf", "b", 2.5).unwrap();
            store.put(2, "cf", "c", 9).unwrap();
        }
        let store = open_store(&storage, 1, &clock);
        assert_eq!(store.scan().keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(
            store.get_cell(3, "cf", "b").unwrap().get("50"),
            Some(&CellValue::Float(2.5))
        );
        assert_eq!(
            store.get_cell(2, "cf", "c").unwrap().get("50"),
            Some(&CellValue::Int(9))
        );
    }

    #[test]
    fn test_get_missing_row() {
        let storage = Arc::new(MemoryStorage::new());
        let store = open_store(&storage, 1, &Clock::manual(1));
        assert!(matches!(store.get(42), Err(HBaseError::RowNotFound { row: 42 })));
    }

    #[test]
    fn test_delete_version_leaves_empty_maps() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(77));
        store.put(1, "cf", "q", "v").unwrap();

        let err = store.delete(1, "cf", "q", "78").unwrap_err();
        assert!(matches!(err, HBaseError::CellVersionNotFound { .. }));
        assert!(store.delete(2, "cf", "q", "77").is_err());
        assert!(store.delete(1, "other", "q", "77").is_err());

        store.delete(1, "cf", "q", "77").unwrap();
        let row = store.get(1).unwrap();
        assert!(row.get("cf").unwrap().get("q").unwrap().is_empty());
    }

    #[test]
    fn test_delete_all_missing_row_leaves_store_unchanged() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(1));
        store.put(2, "cf", "q", "v").unwrap();
        let before = store.scan().clone();

        assert!(matches!(store.delete_all(1), Err(HBaseError::RowNotFound { row: 1 })));
        assert_eq!(store.scan(), &before);
    }

    #[test]
    fn test_truncate() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(1));
        store.put(1, "cf", "q", "v").unwrap();
        store.truncate().unwrap();
        assert_eq!(store.count(), 0);
        let state = storage.load(&RegionKey::default_region("t")).unwrap();
        assert_eq!(state.rows_json.as_deref(), Some("{}"));
    }

    #[test]
    fn test_reconcile_drops_whole_rows() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(1));
        store.put(5, "cf1", "q", "keep?").unwrap();
        store.put(5, "cf2", "q", "stale").unwrap();
        store.put(6, "cf1", "q", "keep").unwrap();

        let schema = TableSchema::new("t", ColumnFamilies::new())
            .unwrap()
            .with_family("cf1", "1");
        assert_eq!(store.reconcile(&schema).unwrap(), 1);

        assert!(store.get(5).is_err());
        assert!(store.get(6).is_ok());
        let reopened = open_store(&storage, 1, &Clock::manual(1));
        assert_eq!(reopened.scan().keys().copied().collect::<Vec<_>>(), vec![6]);
    }

    #[test]
    fn test_reconcile_without_families_removes_every_row() {
        let storage = Arc::new(MemoryStorage::new());
        let mut store = open_store(&storage, 1, &Clock::manual(1));
        store.put(1, "cf1", "q", "a").unwrap();
        store.put(2, "cf2", "q", 7).unwrap();

        let schema = TableSchema::new("t", ColumnFamilies::new()).unwrap();
        assert_eq!(store.reconcile(&schema).unwrap(), 2);
        assert_eq!(store.count(), 0);

        let reopened = open_store(&storage, 1, &Clock::manual(1));
        assert!(reopened.scan().is_empty());
    }
}
