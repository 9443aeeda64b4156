//! 通用数据类型定义
//!
//! 定义单元格值、行数据嵌套映射和区域标识

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// 默认区域名（单区域表）
pub const DEFAULT_REGION: &str = "region1";

/// 行标识
pub type RowKey = i64;

/// 单元格的全部版本：时间戳字符串 -> 值
pub type CellVersions = BTreeMap<String, CellValue>;

/// 列族内数据：列名 -> 版本
pub type FamilyData = BTreeMap<String, CellVersions>;

/// 一行数据：列族名 -> 列族内数据
pub type RowData = BTreeMap<String, FamilyData>;

/// 全部行，按行号升序
pub type Rows = BTreeMap<RowKey, RowData>;

static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.\-]*$").expect("标识符正则无效"));

/// 验证表名/区域名是否合法
pub fn validate_identifier(field: &str, value: &str) -> crate::error::HBaseResult<()> {
    if IDENTIFIER_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(crate::hbase_error!(
            validation,
            field,
            format!("'{}' 含有非法字符，只允许字母、数字、'_'、'-'、'.'，且不能以 '.' 或 '-' 开头", value)
        ))
    }
}

/// 单元格值
///
/// 持久化为裸 JSON 标量，整数优先于浮点数解析
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CellValue {
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
}

impl CellValue {
    /// 获取数据类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Int(_) => "int",
            CellValue::Float(_) => "float",
            CellValue::String(_) => "string",
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(fl) => write!(f, "{}", fl),
            CellValue::String(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::String(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::String(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Int(value)
    }
}

impl From<i32> for CellValue {
    fn from(value: i32) -> Self {
        CellValue::Int(value as i64)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Float(value)
    }
}

/// 存储标识：表名 + 区域名
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegionKey {
    /// 表名
    pub table: String,
    /// 区域名
    pub region: String,
}

impl RegionKey {
    pub fn new(table: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            region: region.into(),
        }
    }

    /// 表的默认区域
    pub fn default_region(table: impl Into<String>) -> Self {
        Self::new(table, DEFAULT_REGION)
    }
}

impl fmt::Display for RegionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.table, self.region)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_json_shape() {
        let values: Vec<CellValue> = serde_json::from_str(r#"[3, 2.5, "abc"]"#).unwrap();
        assert_eq!(
            values,
            vec![
                CellValue::Int(3),
                CellValue::Float(2.5),
                CellValue::String("abc".to_string())
            ]
        );
        assert_eq!(serde_json::to_string(&CellValue::from("v1")).unwrap(), r#""v1""#);
    }

    #[test]
    fn test_cell_value_type_name() {
        assert_eq!(CellValue::from(1).type_name(), "int");
        assert_eq!(CellValue::from(1.5).type_name(), "float");
        assert_eq!(CellValue::from("x").type_name(), "string");
    }

    #[test]
    fn test_validate_identifier() {
        assert!(validate_identifier("table", "users").is_ok());
        assert!(validate_identifier("table", "web_logs-2024.v1").is_ok());
        assert!(validate_identifier("table", "").is_err());
        assert!(validate_identifier("table", "../etc").is_err());
        assert!(validate_identifier("table", "a/b").is_err());
    }

    #[test]
    fn test_region_key_display() {
        assert_eq!(RegionKey::default_region("users").to_string(), "users/region1");
    }
}
