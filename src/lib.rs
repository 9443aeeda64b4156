//! rat_hbase - 简化版宽列存储
//!
//! 提供类 HBase 的数据模型：由列族组成的表模式，以及按
//! 行 / 列族 / 列 / 时间戳 寻址、版本数受限的单元格存储

// 导出所有公共模块
pub mod clock;
pub mod config;
pub mod error;
pub mod serializer;
pub mod storage;
pub mod table;
pub mod types;

// 重新导出常用类型和函数
pub use clock::Clock;
pub use config::{
    LogLevel, LoggingConfig, LoggingConfigBuilder, StoreConfig, StoreConfigBuilder, init_logging,
};
pub use error::{HBaseError, HBaseResult};
pub use serializer::{RecordSerializer, SerializerConfig};
pub use storage::{JsonFileStorage, MemoryStorage, PersistedState, StorageAdapter};
pub use table::{
    CellStoreOptions, ColumnFamilies, ColumnFamilyDescriptor, FamilyProperties, Table,
    TableManager, TableSchema, VersionedCellStore,
};
pub use types::*;

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
