//! 错误处理模块
//!
//! 提供统一的错误类型定义和中文错误信息

use thiserror::Error;

/// 宽列存储统一错误类型
#[derive(Error, Debug)]
pub enum HBaseError {
    /// 列族不存在（alter / drop 列族时）
    #[error("表 '{table}' 中不存在列族 '{family}'")]
    UnknownFamily { table: String, family: String },

    /// 行不存在
    #[error("行 {row} 不存在")]
    RowNotFound { row: i64 },

    /// 单元格版本路径不存在
    #[error("单元格版本不存在: 行={row}, 列族={family}, 列={qualifier}, 时间戳={timestamp}")]
    CellVersionNotFound {
        row: i64,
        family: String,
        qualifier: String,
        timestamp: String,
    },

    /// 底层存储读写失败
    #[error("持久化失败: {message}")]
    PersistenceFailure {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    /// 序列化/反序列化错误
    #[error("数据序列化失败: {message}")]
    SerializationError { message: String },

    /// 参数验证错误
    #[error("参数验证失败: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// 配置错误
    #[error("配置错误: {message}")]
    ConfigError { message: String },

    /// 表不存在
    #[error("表 '{table}' 不存在")]
    TableNotFound { table: String },

    /// 表已存在
    #[error("表 '{table}' 已存在")]
    TableAlreadyExists { table: String },

    /// 表已禁用
    #[error("表 '{table}' 已禁用，拒绝数据操作")]
    TableDisabled { table: String },
}

/// 结果类型别名
pub type HBaseResult<T> = Result<T, HBaseError>;

/// 错误构建器 - 提供便捷的错误创建方法
pub struct ErrorBuilder;

impl ErrorBuilder {
    /// 创建列族不存在错误
    pub fn unknown_family(table: impl Into<String>, family: impl Into<String>) -> HBaseError {
        HBaseError::UnknownFamily {
            table: table.into(),
            family: family.into(),
        }
    }

    /// 创建行不存在错误
    pub fn row_not_found(row: i64) -> HBaseError {
        HBaseError::RowNotFound { row }
    }

    /// 创建持久化错误
    pub fn persistence_failure(
        message: impl Into<String>,
        source: impl Into<anyhow::Error>,
    ) -> HBaseError {
        HBaseError::PersistenceFailure {
            message: message.into(),
            source: source.into(),
        }
    }

    /// 创建序列化错误
    pub fn serialization_error(message: impl Into<String>) -> HBaseError {
        HBaseError::SerializationError {
            message: message.into(),
        }
    }

    /// 创建验证错误
    pub fn validation_error(field: impl Into<String>, message: impl Into<String>) -> HBaseError {
        HBaseError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// 创建配置错误
    pub fn config_error(message: impl Into<String>) -> HBaseError {
        HBaseError::ConfigError {
            message: message.into(),
        }
    }

    /// 创建表不存在错误
    pub fn table_not_found(table: impl Into<String>) -> HBaseError {
        HBaseError::TableNotFound {
            table: table.into(),
        }
    }

    /// 创建表已存在错误
    pub fn table_already_exists(table: impl Into<String>) -> HBaseError {
        HBaseError::TableAlreadyExists {
            table: table.into(),
        }
    }

    /// 创建表已禁用错误
    pub fn table_disabled(table: impl Into<String>) -> HBaseError {
        HBaseError::TableDisabled {
            table: table.into(),
        }
    }
}

/// 便捷宏 - 快速创建错误
#[macro_export]
macro_rules! hbase_error {
    (unknown_family, $table:expr, $family:expr) => {
        $crate::error::ErrorBuilder::unknown_family($table, $family)
    };
    (row_not_found, $row:expr) => {
        $crate::error::ErrorBuilder::row_not_found($row)
    };
    (persistence, $msg:expr, $source:expr) => {
        $crate::error::ErrorBuilder::persistence_failure($msg, $source)
    };
    (serialization, $msg:expr) => {
        $crate::error::ErrorBuilder::serialization_error($msg)
    };
    (validation, $field:expr, $msg:expr) => {
        $crate::error::ErrorBuilder::validation_error($field, $msg)
    };
    (config, $msg:expr) => {
        $crate::error::ErrorBuilder::config_error($msg)
    };
    (table_not_found, $table:expr) => {
        $crate::error::ErrorBuilder::table_not_found($table)
    };
    (table_exists, $table:expr) => {
        $crate::error::ErrorBuilder::table_already_exists($table)
    };
    (table_disabled, $table:expr) => {
        $crate::error::ErrorBuilder::table_disabled($table)
    };
}
