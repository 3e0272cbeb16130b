//! 短期记忆：对话历史
//!
//! 历史以 JSON 数组形式存放在 PromptMemory 的某个槽位中；每次追加后按上限从最旧处剪枝（滑动窗口）。

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::memory::PromptMemory;

/// 消息角色（与 LLM API 一致）
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }
}

/// 单条消息
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// 读取历史槽位中的消息；无法解析为 Message 的条目被跳过
pub fn load_history(memory: &dyn PromptMemory, key: &str) -> Vec<Message> {
    match memory.get(key) {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect(),
        _ => Vec::new(),
    }
}

/// 追加一条消息到历史槽位，超出 max_messages 时丢弃最旧的条目
pub fn append_history(
    memory: &dyn PromptMemory,
    key: &str,
    message: &Message,
    max_messages: usize,
) -> Result<(), serde_json::Error> {
    let mut items = match memory.get(key) {
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };
    items.push(serde_json::to_value(message)?);
    prune(&mut items, max_messages);
    memory.set(key, Value::Array(items));
    Ok(())
}

/// 超出上限时丢弃最旧的部分，保留最近 max 条
fn prune(items: &mut Vec<Value>, max: usize) {
    if items.len() > max {
        let excess = items.len() - max;
        items.drain(..excess);
    }
}

/// 把存储中的值当作文本读取：字符串原样，Null 为空，其它序列化为 JSON
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
