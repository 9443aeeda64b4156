//! 表管理模块
//!
//! 提供表模式定义、多版本单元格存储和表管理器

pub mod cell_store;
pub mod handle;
pub mod manager;
pub mod schema;

pub use cell_store::{CellStoreOptions, VersionedCellStore};
pub use handle::Table;
pub use manager::TableManager;
pub use schema::{
    ColumnFamilies, ColumnFamilyDescriptor, FamilyProperties, TableSchema, VERSION_PROPERTY,
};
