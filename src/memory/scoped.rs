//! 历史槽位 Fork：只隔离历史（与输入）槽位，其余键直通委托存储
//!
//! 修复循环在这里改写历史与纠正输入，失败时真实对话不受影响；
//! 其它共享状态（计数器、草稿变量）的读写直接落到委托存储，与 MemoryFork 的全量覆盖不同。

use std::sync::{Arc, RwLock};

use serde_json::Value;

use crate::memory::conversation::value_to_text;
use crate::memory::PromptMemory;

/// 隔离历史槽位与输入槽位的 Fork（修复循环使用）
///
/// 构造时从委托存储拷贝两个槽位的当前值（缺失时为空数组 / 空串）；
/// 两个槽位的读写都经过拷贝，返回值不会与内部状态或委托存储互相影响。
/// `clear()` 会清空委托存储，并把两个槽位重置为默认值。
pub struct ScopedHistoryFork {
    delegate: Arc<dyn PromptMemory>,
    history_variable: String,
    input_variable: String,
    history: RwLock<Vec<Value>>,
    input: RwLock<String>,
}

impl ScopedHistoryFork {
    pub fn new(
        delegate: Arc<dyn PromptMemory>,
        history_variable: impl Into<String>,
        input_variable: impl Into<String>,
    ) -> Self {
        let history_variable = history_variable.into();
        let input_variable = input_variable.into();
        let history = match delegate.get(&history_variable) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };
        let input = delegate
            .get(&input_variable)
            .map(|v| value_to_text(&v))
            .unwrap_or_default();
        Self {
            delegate,
            history_variable,
            input_variable,
            history: RwLock::new(history),
            input: RwLock::new(input),
        }
    }

    fn set_history(&self, value: Value) {
        let items = match value {
            Value::Array(items) => items,
            _ => Vec::new(),
        };
        *self.history.write().unwrap() = items;
    }

    fn set_input(&self, value: Value) {
        *self.input.write().unwrap() = value_to_text(&value);
    }
}

impl PromptMemory for ScopedHistoryFork {
    fn has(&self, key: &str) -> bool {
        if key == self.history_variable || key == self.input_variable {
            true
        } else {
            self.delegate.has(key)
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        if key == self.history_variable {
            Some(Value::Array(self.history.read().unwrap().clone()))
        } else if key == self.input_variable {
            Some(Value::String(self.input.read().unwrap().clone()))
        } else {
            self.delegate.get(key)
        }
    }

    fn set(&self, key: &str, value: Value) {
        if key == self.history_variable {
            self.set_history(value);
        } else if key == self.input_variable {
            self.set_input(value);
        } else {
            self.delegate.set(key, value);
        }
    }

    fn delete(&self, key: &str) {
        if key == self.history_variable {
            self.history.write().unwrap().clear();
        } else if key == self.input_variable {
            self.input.write().unwrap().clear();
        } else {
            self.delegate.delete(key);
        }
    }

    fn clear(&self) {
        self.delegate.clear();
        self.history.write().unwrap().clear();
        self.input.write().unwrap().clear();
    }
}

/// 只隔离历史槽位的简单 Fork：构造时拷贝一次，不做默认值填充
pub struct HistoryFork {
    delegate: Arc<dyn PromptMemory>,
    history_variable: String,
    history: RwLock<Option<Value>>,
}

impl HistoryFork {
    pub fn new(delegate: Arc<dyn PromptMemory>, history_variable: impl Into<String>) -> Self {
        let history_variable = history_variable.into();
        let history = delegate.get(&history_variable);
        Self {
            delegate,
            history_variable,
            history: RwLock::new(history),
        }
    }
}

impl PromptMemory for HistoryFork {
    fn has(&self, key: &str) -> bool {
        if key == self.history_variable {
            self.history.read().unwrap().is_some()
        } else {
            self.delegate.has(key)
        }
    }

    fn get(&self, key: &str) -> Option<Value> {
        if key == self.history_variable {
            self.history.read().unwrap().clone()
        } else {
            self.delegate.get(key)
        }
    }

    fn set(&self, key: &str, value: Value) {
        if key == self.history_variable {
            *self.history.write().unwrap() = Some(value);
        } else {
            self.delegate.set(key, value);
        }
    }

    fn delete(&self, key: &str) {
        if key == self.history_variable {
            *self.history.write().unwrap() = None;
        } else {
            self.delegate.delete(key);
        }
    }

    fn clear(&self) {
        self.delegate.clear();
        *self.history.write().unwrap() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::VolatileMemory;
    use serde_json::json;

    fn delegate() -> Arc<VolatileMemory> {
        Arc::new(VolatileMemory::from_values([
            ("history", json!([{"role": "user", "content": "hi"}])),
            ("input", json!("hi")),
            ("counter", json!(1)),
        ]))
    }

    #[test]
    fn test_scoped_fork_snapshots_slots() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        assert_eq!(fork.get("input"), Some(json!("hi")));
        assert_eq!(fork.get("history").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scoped_fork_defaults_when_delegate_empty() {
        let base: Arc<dyn PromptMemory> = Arc::new(VolatileMemory::new());
        let fork = ScopedHistoryFork::new(base, "history", "input");
        assert!(fork.has("history"));
        assert_eq!(fork.get("history"), Some(json!([])));
        assert_eq!(fork.get("input"), Some(json!("")));
    }

    #[test]
    fn test_scoped_fork_isolates_slots() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        fork.set("input", json!("fix it"));
        fork.set("history", json!([]));

        assert_eq!(base.get("input"), Some(json!("hi")));
        assert_eq!(base.get("history").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(fork.get("input"), Some(json!("fix it")));
    }

    #[test]
    fn test_scoped_fork_passes_other_keys() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        fork.set("counter", json!(2));
        assert_eq!(base.get("counter"), Some(json!(2)));

        base.set("other", json!("x"));
        assert_eq!(fork.get("other"), Some(json!("x")));
    }

    #[test]
    fn test_scoped_fork_not_perturbed_by_delegate() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        base.set("input", json!("later"));
        base.set("history", json!([]));
        assert_eq!(fork.get("input"), Some(json!("hi")));
        assert_eq!(fork.get("history").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scoped_fork_returned_history_is_a_copy() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        let mut history = fork.get("history").unwrap();
        history.as_array_mut().unwrap().clear();
        assert_eq!(fork.get("history").unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_scoped_fork_resets_invalid_writes() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        fork.set("history", json!("not a list"));
        assert_eq!(fork.get("history"), Some(json!([])));

        fork.set("input", Value::Null);
        assert_eq!(fork.get("input"), Some(json!("")));

        fork.set("history", json!([1]));
        fork.delete("history");
        assert_eq!(fork.get("history"), Some(json!([])));
    }

    #[test]
    fn test_scoped_fork_clear_reaches_delegate() {
        let base = delegate();
        let fork = ScopedHistoryFork::new(base.clone(), "history", "input");
        fork.clear();
        assert!(base.is_empty());
        assert_eq!(fork.get("history"), Some(json!([])));
        assert_eq!(fork.get("input"), Some(json!("")));
    }

    #[test]
    fn test_history_fork_no_default_seeding() {
        let base: Arc<dyn PromptMemory> = Arc::new(VolatileMemory::new());
        let fork = HistoryFork::new(base, "history");
        assert!(!fork.has("history"));
        assert_eq!(fork.get("history"), None);
    }

    #[test]
    fn test_history_fork_isolates_history_only() {
        let base = delegate();
        let fork = HistoryFork::new(base.clone(), "history");
        fork.set("history", json!([]));
        fork.set("input", json!("changed"));

        assert_eq!(base.get("history").unwrap().as_array().unwrap().len(), 1);
        assert_eq!(base.get("input"), Some(json!("changed")));

        fork.delete("history");
        assert!(!fork.has("history"));
        assert!(base.has("history"));
    }
}
