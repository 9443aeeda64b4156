//! JSON 文件存储
//!
//! 目录布局：
//! `{root}/tables/{table}/config.json` 保存表模式，
//! `{root}/tables/{table}/regions/{region}/hfile.json` 保存区域行数据

use super::{PersistedState, StorageAdapter};
use crate::error::HBaseResult;
use crate::hbase_error;
use crate::types::RegionKey;
use anyhow::Context;
use rat_logger::debug;
use std::fs;
use std::path::{Path, PathBuf};

const TABLES_DIR: &str = "tables";
const REGIONS_DIR: &str = "regions";
const SCHEMA_FILE: &str = "config.json";
const ROWS_FILE: &str = "hfile.json";

/// 基于目录树的 JSON 文件存储
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    root: PathBuf,
}

impl JsonFileStorage {
    /// 以给定目录为根创建存储，目录在首次写入时创建
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn tables_dir(&self) -> PathBuf {
        self.root.join(TABLES_DIR)
    }

    fn table_dir(&self, table: &str) -> PathBuf {
        self.tables_dir().join(table)
    }

    fn region_dir(&self, key: &RegionKey) -> PathBuf {
        self.table_dir(&key.table).join(REGIONS_DIR).join(&key.region)
    }

    /// 表模式文件路径
    pub fn schema_path(&self, table: &str) -> PathBuf {
        self.table_dir(table).join(SCHEMA_FILE)
    }

    /// 区域行数据文件路径
    pub fn rows_path(&self, key: &RegionKey) -> PathBuf {
        self.region_dir(key).join(ROWS_FILE)
    }

    fn read_optional(path: &Path) -> HBaseResult<Option<String>> {
        if !path.exists() {
            return Ok(None);
        }
        fs::read_to_string(path)
            .with_context(|| format!("读取 {}", path.display()))
            .map(Some)
            .map_err(|e| hbase_error!(persistence, format!("无法读取 {}", path.display()), e))
    }

    fn write_file(path: &Path, contents: &str) -> HBaseResult<()> {
        let parent = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(parent)
            .with_context(|| format!("创建目录 {}", parent.display()))
            .and_then(|_| {
                fs::write(path, contents).with_context(|| format!("写入 {}", path.display()))
            })
            .map_err(|e| hbase_error!(persistence, format!("无法写入 {}", path.display()), e))
    }

    fn list_dirs(dir: &Path) -> HBaseResult<Vec<String>> {
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let entries = fs::read_dir(dir)
            .with_context(|| format!("列出目录 {}", dir.display()))
            .map_err(|e| hbase_error!(persistence, format!("无法列出 {}", dir.display()), e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry
                .with_context(|| format!("读取目录项 {}", dir.display()))
                .map_err(|e| hbase_error!(persistence, format!("无法列出 {}", dir.display()), e))?;
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

impl StorageAdapter for JsonFileStorage {
    fn load(&self, key: &RegionKey) -> HBaseResult<PersistedState> {
        Ok(PersistedState {
            schema_json: Self::read_optional(&self.schema_path(&key.table))?,
            rows_json: Self::read_optional(&self.rows_path(key))?,
        })
    }

    fn save_schema(&self, table: &str, schema_json: &str) -> HBaseResult<()> {
        let path = self.schema_path(table);
        debug!("写入表模式: {}", path.display());
        Self::write_file(&path, schema_json)
    }

    fn save_rows(&self, key: &RegionKey, rows_json: &str) -> HBaseResult<()> {
        let path = self.rows_path(key);
        debug!("写入区域数据: {}", path.display());
        Self::write_file(&path, rows_json)
    }

    fn ensure_region_exists(&self, key: &RegionKey) -> HBaseResult<()> {
        let dir = self.region_dir(key);
        fs::create_dir_all(&dir)
            .with_context(|| format!("创建目录 {}", dir.display()))
            .map_err(|e| hbase_error!(persistence, format!("无法创建区域 {}", key), e))
    }

    fn drop_table(&self, table: &str) -> HBaseResult<()> {
        let dir = self.table_dir(table);
        if !dir.exists() {
            return Ok(());
        }
        debug!("删除表目录: {}", dir.display());
        fs::remove_dir_all(&dir)
            .with_context(|| format!("删除目录 {}", dir.display()))
            .map_err(|e| hbase_error!(persistence, format!("无法删除表 {}", table), e))
    }

    fn list_tables(&self) -> HBaseResult<Vec<String>> {
        let tables = Self::list_dirs(&self.tables_dir())?
            .into_iter()
            .filter(|table| self.schema_path(table).is_file())
            .collect();
        Ok(tables)
    }

    fn list_regions(&self, table: &str) -> HBaseResult<Vec<String>> {
        Self::list_dirs(&self.table_dir(table).join(REGIONS_DIR))
    }
}
