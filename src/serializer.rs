//! JSON序列化层
//!
//! 负责表模式记录和行数据记录与 JSON 文本之间的转换

use crate::error::HBaseResult;
use crate::hbase_error;
use crate::table::schema::TableSchema;
use crate::types::Rows;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// 序列化配置
#[derive(Debug, Clone, Default)]
pub struct SerializerConfig {
    /// 是否美化输出
    pub pretty: bool,
}

impl SerializerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置美化输出
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

/// 记录序列化器
#[derive(Debug, Clone, Default)]
pub struct RecordSerializer {
    config: SerializerConfig,
}

impl RecordSerializer {
    pub fn new(config: SerializerConfig) -> Self {
        Self { config }
    }

    /// 序列化表模式记录
    pub fn encode_schema(&self, schema: &TableSchema) -> HBaseResult<String> {
        self.encode(schema, "表模式")
    }

    /// 反序列化表模式记录
    pub fn decode_schema(&self, json: &str) -> HBaseResult<TableSchema> {
        Self::decode(json, "表模式")
    }

    /// 序列化行数据，行号升序
    pub fn encode_rows(&self, rows: &Rows) -> HBaseResult<String> {
        self.encode(rows, "行数据")
    }

    /// 反序列化行数据；行号键按数值解析并重新排序
    pub fn decode_rows(&self, json: &str) -> HBaseResult<Rows> {
        Self::decode(json, "行数据")
    }

    fn encode<T: Serialize>(&self, value: &T, what: &str) -> HBaseResult<String> {
        let result = if self.config.pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        result.map_err(|e| hbase_error!(serialization, format!("{}序列化失败: {}", what, e)))
    }

    fn decode<T: DeserializeOwned>(json: &str, what: &str) -> HBaseResult<T> {
        serde_json::from_str(json)
            .map_err(|e| hbase_error!(serialization, format!("{}解析失败: {}", what, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HBaseError;

    #[test]
    fn test_rows_reload_in_ascending_order() {
        let serializer = RecordSerializer::default();
        let rows = serializer
            .decode_rows(
                r#"{"1":{"cf":{"q":{"10":"a"}}},"3":{"cf":{"q":{"10":"c"}}},"2":{"cf":{"q":{"10":"b"}}}}"#,
            )
            .unwrap();
        assert_eq!(rows.keys().copied().collect::<Vec<_>>(), vec![1, 2, 3]);

        let json = serializer.encode_rows(&rows).unwrap();
        assert_eq!(
            json,
            r#"{"1":{"cf":{"q":{"10":"a"}}},"2":{"cf":{"q":{"10":"b"}}},"3":{"cf":{"q":{"10":"c"}}}}"#
        );
    }

    #[test]
    fn test_row_keys_sort_numerically() {
        let serializer = RecordSerializer::default();
        let rows = serializer.decode_rows(r#"{"10":{},"9":{},"100":{}}"#).unwrap();
        assert_eq!(serializer.encode_rows(&rows).unwrap(), r#"{"9":{},"10":{},"100":{}}"#);
    }

    #[test]
    fn test_non_numeric_row_key_rejected() {
        let err = RecordSerializer::default()
            .decode_rows(r#"{"abc":{}}"#)
            .unwrap_err();
        assert!(matches!(err, HBaseError::SerializationError { .. }));
    }

    #[test]
    fn test_pretty_output() {
        let serializer = RecordSerializer::new(SerializerConfig::new().pretty(true));
        let rows = serializer.decode_rows(r#"{"1":{}}"#).unwrap();
        assert!(serializer.encode_rows(&rows).unwrap().contains('\n'));
    }
}
