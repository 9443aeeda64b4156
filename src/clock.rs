//! 时间戳来源
//!
//! 单元格版本使用秒级时间戳，支持系统时钟和手动时钟两种策略

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

/// 时钟策略
#[derive(Clone, Debug, Default)]
pub enum Clock {
    /// 系统墙钟（秒）
    #[default]
    System,
    /// 手动推进的时钟，多个克隆共享同一时间
    Manual(Arc<AtomicI64>),
}

impl Clock {
    /// 系统时钟
    pub fn system() -> Self {
        Clock::System
    }

    /// 从给定秒数开始的手动时钟
    pub fn manual(start_secs: i64) -> Self {
        Clock::Manual(Arc::new(AtomicI64::new(start_secs)))
    }

    /// 当前时间（自纪元起的秒数）
    pub fn now_secs(&self) -> i64 {
        match self {
            Clock::System => chrono::Utc::now().timestamp(),
            Clock::Manual(secs) => secs.load(Ordering::SeqCst),
        }
    }

    /// 当前时间戳字符串，作为版本键
    pub fn timestamp(&self) -> String {
        self.now_secs().to_string()
    }

    /// 推进手动时钟，系统时钟忽略
    pub fn advance(&self, secs: i64) {
        if let Clock::Manual(current) = self {
            current.fetch_add(secs, Ordering::SeqCst);
        }
    }

    /// 设置手动时钟，系统时钟忽略
    pub fn set(&self, secs: i64) {
        if let Clock::Manual(current) = self {
            current.store(secs, Ordering::SeqCst);
        }
    }
}
