//! 表模式定义
//!
//! 定义表的列族、列族属性和启用状态。这里只做内存中的修改，
//! 持久化由 [`super::handle::Table`] 负责

use crate::error::HBaseResult;
use crate::hbase_error;
use crate::types::validate_identifier;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// 列族属性中保留的版本键
pub const VERSION_PROPERTY: &str = "version";

/// 列族属性
///
/// 按存储顺序保存全部属性。`version` 为保留属性，仅作为元数据保存，
/// 记录中没有该键时不会自动补上
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FamilyProperties(Vec<(String, String)>);

impl FamilyProperties {
    pub fn new() -> Self {
        Self::default()
    }

    /// 只含版本属性
    pub fn with_version(version: impl Into<String>) -> Self {
        Self::new().property(VERSION_PROPERTY, version)
    }

    /// 设置属性；已存在的键原位替换
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    /// 设置属性，返回旧值
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.0.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// 保留版本数
    pub fn version(&self) -> Option<&str> {
        self.get(VERSION_PROPERTY)
    }

    pub fn set_version(&mut self, version: impl Into<String>) {
        self.set(VERSION_PROPERTY, version);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 按存储顺序迭代全部属性
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for FamilyProperties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, value) in &self.0 {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FamilyProperties {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct PropertiesVisitor;

        impl<'de> Visitor<'de> for PropertiesVisitor {
            type Value = FamilyProperties;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("属性名到字符串值的映射")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut properties = FamilyProperties::new();
                while let Some((key, value)) = access.next_entry::<String, String>()? {
                    properties.set(key, value);
                }
                Ok(properties)
            }
        }

        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// 列族定义
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnFamilyDescriptor {
    /// 列族名
    pub name: String,
    /// 列族属性
    pub properties: FamilyProperties,
}

/// 有序列族集合
///
/// 保持插入顺序；覆盖已存在的列族时位置不变
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFamilies(Vec<ColumnFamilyDescriptor>);

impl ColumnFamilies {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或整体替换列族属性，返回旧属性
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        properties: FamilyProperties,
    ) -> Option<FamilyProperties> {
        let name = name.into();
        match self.0.iter_mut().find(|cf| cf.name == name) {
            Some(existing) => Some(std::mem::replace(&mut existing.properties, properties)),
            None => {
                self.0.push(ColumnFamilyDescriptor { name, properties });
                None
            }
        }
    }

    /// 删除列族
    pub fn remove(&mut self, name: &str) -> Option<FamilyProperties> {
        let index = self.0.iter().position(|cf| cf.name == name)?;
        Some(self.0.remove(index).properties)
    }

    pub fn get(&self, name: &str) -> Option<&FamilyProperties> {
        self.0.iter().find(|cf| cf.name == name).map(|cf| &cf.properties)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FamilyProperties> {
        self.0
            .iter_mut()
            .find(|cf| cf.name == name)
            .map(|cf| &mut cf.properties)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|cf| cf.name == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ColumnFamilyDescriptor> {
        self.0.iter()
    }

    /// 列族名，按存储顺序
    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|cf| cf.name.as_str()).collect()
    }
}

impl<K: Into<String>> FromIterator<(K, FamilyProperties)> for ColumnFamilies {
    fn from_iter<I: IntoIterator<Item = (K, FamilyProperties)>>(iter: I) -> Self {
        let mut families = ColumnFamilies::new();
        for (name, properties) in iter {
            families.insert(name, properties);
        }
        families
    }
}

impl Serialize for ColumnFamilies {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for cf in &self.0 {
            map.serialize_entry(&cf.name, &cf.properties)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ColumnFamilies {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FamiliesVisitor;

        impl<'de> Visitor<'de> for FamiliesVisitor {
            type Value = ColumnFamilies;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("列族名到列族属性的映射")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut families = ColumnFamilies::new();
                while let Some((name, properties)) =
                    access.next_entry::<String, FamilyProperties>()?
                {
                    families.insert(name, properties);
                }
                Ok(families)
            }
        }

        deserializer.deserialize_map(FamiliesVisitor)
    }
}

/// 表模式
///
/// 字段顺序即持久化记录中的键顺序
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// 是否启用
    pub enabled: bool,
    /// 表名
    pub name: String,
    /// 列族定义
    pub column_families: ColumnFamilies,
}

impl TableSchema {
    /// 创建新的表模式，默认启用
    pub fn new(name: impl Into<String>, column_families: ColumnFamilies) -> HBaseResult<Self> {
        let name = name.into();
        validate_identifier("table_name", &name)?;
        Ok(Self {
            enabled: true,
            name,
            column_families,
        })
    }

    /// 添加列族（构建时使用）
    pub fn with_family(mut self, family: impl Into<String>, version: impl Into<String>) -> Self {
        self.column_families
            .insert(family, FamilyProperties::with_version(version));
        self
    }

    /// 检查列族是否存在
    pub fn has_family(&self, family: &str) -> bool {
        self.column_families.contains(family)
    }

    /// 设置启用状态
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// 修改列族的版本属性
    pub fn alter(&mut self, family: &str, version: impl Into<String>) -> HBaseResult<()> {
        let properties = self
            .column_families
            .get_mut(family)
            .ok_or_else(|| hbase_error!(unknown_family, self.name.as_str(), family))?;
        properties.set_version(version);
        Ok(())
    }

    /// 添加列族；已存在时整体覆盖，不报错
    pub fn add_column_family(&mut self, family: impl Into<String>, version: impl Into<String>) {
        self.column_families
            .insert(family, FamilyProperties::with_version(version));
    }

    /// 删除列族
    pub fn drop_column_family(&mut self, family: &str) -> HBaseResult<FamilyProperties> {
        self.column_families
            .remove(family)
            .ok_or_else(|| hbase_error!(unknown_family, self.name.as_str(), family))
    }

    /// HBase 风格的表描述
    pub fn describe(&self) -> String {
        let status = if self.enabled { "enable" } else { "disable" };
        let header = format!(
            "Table {} is {}\n{}\nCOLUMN FAMILIES DESCRIPTION",
            self.name, status, self.name
        );

        let description: Vec<String> = self
            .column_families
            .iter()
            .map(|cf| {
                let props: Vec<String> = cf
                    .properties
                    .iter()
                    .map(|(key, value)| format!("{} => '{}'", key, value))
                    .collect();
                format!("{{NAME => '{}', {}}}", cf.name, props.join(", "))
            })
            .collect();

        format!("{}\n{}", header, description.join("\n"))
    }
}
