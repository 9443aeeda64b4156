//! 持久化适配器模块
//!
//! 提供统一的存储接口，屏蔽文件系统与内存存储的实现差异

use crate::error::HBaseResult;
use crate::types::RegionKey;
use std::fmt::Debug;

mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

/// 从存储中读取的原始记录
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedState {
    /// 表模式记录（JSON）
    pub schema_json: Option<String>,
    /// 区域行数据记录（JSON）
    pub rows_json: Option<String>,
}

/// 存储适配器trait，定义统一的持久化接口
///
/// 所有操作同步完成，失败以 `PersistenceFailure` 返回
pub trait StorageAdapter: Send + Sync + Debug {
    /// 读取表模式和指定区域的行数据，不存在的部分为 `None`
    fn load(&self, key: &RegionKey) -> HBaseResult<PersistedState>;

    /// 保存表模式记录
    fn save_schema(&self, table: &str, schema_json: &str) -> HBaseResult<()>;

    /// 保存区域行数据记录
    fn save_rows(&self, key: &RegionKey, rows_json: &str) -> HBaseResult<()>;

    /// 确保区域存在（只创建结构，不写数据）
    fn ensure_region_exists(&self, key: &RegionKey) -> HBaseResult<()>;

    /// 递归删除表的全部数据；表不存在时不报错
    fn drop_table(&self, table: &str) -> HBaseResult<()>;

    /// 列出所有已保存模式的表，按名称排序
    fn list_tables(&self) -> HBaseResult<Vec<String>>;

    /// 列出表的所有区域，按名称排序
    fn list_regions(&self, table: &str) -> HBaseResult<Vec<String>>;
}
