//! 键值存储抽象与内存实现
//!
//! PromptMemory 只要求 has/get/set/delete/clear 五个操作；引擎与各类 Fork 不对存储做其它假设。
//! 方法全部取 &self，实现自行负责内部可变性。

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value;

/// 键值存储 trait：值统一为 serde_json::Value，get 返回独立副本
pub trait PromptMemory: Send + Sync {
    fn has(&self, key: &str) -> bool;

    fn get(&self, key: &str) -> Option<Value>;

    fn set(&self, key: &str, value: Value);

    fn delete(&self, key: &str);

    fn clear(&self);
}

/// 进程内易失存储
#[derive(Debug, Default)]
pub struct VolatileMemory {
    values: RwLock<HashMap<String, Value>>,
}

impl VolatileMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 用初始键值创建
    pub fn from_values<I, K>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Self {
            values: RwLock::new(values.into_iter().map(|(k, v)| (k.into(), v)).collect()),
        }
    }

    pub fn len(&self) -> usize {
        self.values.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.read().unwrap().is_empty()
    }
}

impl PromptMemory for VolatileMemory {
    fn has(&self, key: &str) -> bool {
        self.values.read().unwrap().contains_key(key)
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.values.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.values.write().unwrap().insert(key.to_string(), value);
    }

    fn delete(&self, key: &str) {
        self.values.write().unwrap().remove(key);
    }

    fn clear(&self) {
        self.values.write().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_basic_operations() {
        let memory = VolatileMemory::new();
        assert!(!memory.has("a"));
        memory.set("a", json!(1));
        assert!(memory.has("a"));
        assert_eq!(memory.get("a"), Some(json!(1)));

        memory.delete("a");
        assert!(!memory.has("a"));
        assert_eq!(memory.get("a"), None);
    }

    #[test]
    fn test_clear() {
        let memory = VolatileMemory::from_values([("a", json!(1)), ("b", json!("x"))]);
        assert_eq!(memory.len(), 2);
        memory.clear();
        assert!(memory.is_empty());
    }

    #[test]
    fn test_get_returns_copy() {
        let memory = VolatileMemory::from_values([("list", json!([1, 2]))]);
        let mut list = memory.get("list").unwrap();
        list.as_array_mut().unwrap().push(json!(3));
        assert_eq!(memory.get("list"), Some(json!([1, 2])));
    }
}
