//! 覆盖层 Fork：写入落在私有覆盖层，委托存储保持不变
//!
//! - MemoryFork：所有键都走覆盖层，读时覆盖层优先、再回落到委托存储
//! - TransientFork：只隔离指定的一组键（起始为空，不回落），其余键直通委托存储

use std::collections::HashSet;
use std::sync::Arc;

use serde_json::Value;

use crate::memory::{PromptMemory, VolatileMemory};

/// 全量覆盖 Fork：整块草稿空间可随时丢弃
pub struct MemoryFork {
    delegate: Arc<dyn PromptMemory>,
    overlay: VolatileMemory,
}

impl MemoryFork {
    pub fn new(delegate: Arc<dyn PromptMemory>) -> Self {
        Self {
            delegate,
            overlay: VolatileMemory::new(),
        }
    }
}

impl PromptMemory for MemoryFork {
    fn has(&self, key: &str) -> bool {
        self.overlay.has(key) || self.delegate.has(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.overlay.get(key).or_else(|| self.delegate.get(key))
    }

    fn set(&self, key: &str, value: Value) {
        self.overlay.set(key, value);
    }

    /// 只删除覆盖层中的值；之后读取会重新看到委托存储的值
    fn delete(&self, key: &str) {
        self.overlay.delete(key);
    }

    fn clear(&self) {
        self.overlay.clear();
    }
}

/// 部分隔离 Fork：keys 中的键只存在于私有覆盖层
pub struct TransientFork {
    delegate: Arc<dyn PromptMemory>,
    keys: HashSet<String>,
    overlay: VolatileMemory,
}

impl TransientFork {
    pub fn new<I, K>(delegate: Arc<dyn PromptMemory>, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self {
            delegate,
            keys: keys.into_iter().map(Into::into).collect(),
            overlay: VolatileMemory::new(),
        }
    }

    fn is_transient(&self, key: &str) -> bool {
        self.keys.contains(key)
    }
}

impl PromptMemory for TransientFork {
    fn has(&self, key: &str) -> bool {
        if self.is_transient(key) {
            self.overlay.has(key)
        } else {
            self.delegate.has(key)
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        if self.is_transient(key) {
            self.overlay.get(key)
        } else {
            self.delegate.get(key)
        }
    }

    fn set(&self, key: &str, value: Value) {
        if self.is_transient(key) {
            self.overlay.set(key, value);
        } else {
            self.delegate.set(key, value);
        }
    }

    fn delete(&self, key: &str) {
        if self.is_transient(key) {
            self.overlay.delete(key);
        } else {
            self.delegate.delete(key);
        }
    }

    /// 只清空私有覆盖层
    fn clear(&self) {
        self.overlay.clear();
    }
}
