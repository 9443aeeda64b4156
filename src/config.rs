//! 配置模块
//!
//! 提供存储配置、日志配置及其构建器，支持 TOML 文件加载和保存

use crate::error::HBaseResult;
use crate::hbase_error;
use crate::types::{DEFAULT_REGION, validate_identifier};
use rat_logger::handler::term::TermConfig;
use rat_logger::{LevelFilter, LoggerBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: LogLevel,
    /// 终端输出是否着色
    pub enable_color: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            enable_color: true,
        }
    }
}

/// 日志配置构建器
#[derive(Debug, Default)]
pub struct LoggingConfigBuilder {
    config: LoggingConfig,
}

impl LoggingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.config.level = level;
        self
    }

    pub fn enable_color(mut self, enable_color: bool) -> Self {
        self.config.enable_color = enable_color;
        self
    }

    pub fn build(self) -> LoggingConfig {
        self.config
    }
}

/// 初始化终端日志
///
/// 库本身不会自动初始化日志，由调用者决定是否调用
pub fn init_logging(config: &LoggingConfig) -> HBaseResult<()> {
    let term_config = TermConfig {
        enable_color: config.enable_color,
        format: None,
        color: None,
    };

    LoggerBuilder::new()
        .with_level(config.level.into())
        .add_terminal_with_config(term_config)
        .init()
        .map_err(|e| hbase_error!(config, format!("日志系统初始化失败: {}", e)))
}

/// 存储配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// 数据根目录
    pub data_root: PathBuf,
    /// 默认区域名
    pub default_region: String,
    /// 每个单元格保留的最大版本数
    pub max_versions: u32,
    /// 是否美化 JSON 输出
    pub pretty_json: bool,
    /// 日志配置
    pub logging: LoggingConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_root: PathBuf::from("./data"),
            default_region: DEFAULT_REGION.to_string(),
            max_versions: 1,
            pretty_json: false,
            logging: LoggingConfig::default(),
        }
    }
}

impl StoreConfig {
    /// 创建构建器
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::new()
    }

    /// 验证配置
    pub fn validate(&self) -> HBaseResult<()> {
        if self.max_versions == 0 {
            return Err(hbase_error!(config, "max_versions 必须大于0"));
        }
        validate_identifier("default_region", &self.default_region)
            .map_err(|e| hbase_error!(config, e.to_string()))?;
        Ok(())
    }

    /// 从 TOML 文本解析
    pub fn from_toml_str(content: &str) -> HBaseResult<Self> {
        let config: StoreConfig = toml::from_str(content)
            .map_err(|e| hbase_error!(config, format!("解析配置失败: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> HBaseResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            hbase_error!(config, format!("读取配置文件 {} 失败: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// 转换为 TOML 文本
    pub fn to_toml_string(&self) -> HBaseResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| hbase_error!(config, format!("序列化配置失败: {}", e)))
    }

    /// 保存到 TOML 文件
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> HBaseResult<()> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        std::fs::write(path, content).map_err(|e| {
            hbase_error!(config, format!("写入配置文件 {} 失败: {}", path.display(), e))
        })
    }
}

/// 存储配置构建器
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_root(mut self, data_root: impl Into<PathBuf>) -> Self {
        self.config.data_root = data_root.into();
        self
    }

    pub fn default_region(mut self, region: impl Into<String>) -> Self {
        self.config.default_region = region.into();
        self
    }

    pub fn max_versions(mut self, max_versions: u32) -> Self {
        self.config.max_versions = max_versions;
        self
    }

    pub fn pretty_json(mut self, pretty_json: bool) -> Self {
        self.config.pretty_json = pretty_json;
        self
    }

    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.config.logging = logging;
        self
    }

    /// 构建并验证配置
    pub fn build(self) -> HBaseResult<StoreConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
