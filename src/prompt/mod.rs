//! Prompt 渲染抽象
//!
//! 模板组合与 token 预算策略属于外部渲染器；这里只定义渲染契约（文本或角色消息列表 + 长度 + 是否超长），
//! 以及一个最小的 ConversationPrompt：system + 历史槽位 + 输入槽位。

pub mod tokenizer;

use serde::{Deserialize, Serialize};

use crate::core::WaveError;
use crate::memory::conversation::value_to_text;
use crate::memory::{load_history, Message, PromptMemory};

pub use tokenizer::{CharTokenizer, Tokenizer};

/// 渲染结果
#[derive(Clone, Debug, PartialEq)]
pub struct RenderedPrompt<T> {
    pub output: T,
    /// token 长度
    pub length: usize,
    /// 是否超出预算
    pub too_long: bool,
}

/// 渲染产物（用于在 PromptResponse 中回显）
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RenderedOutput {
    Messages(Vec<Message>),
    Text(String),
}

/// Prompt：按当前存储渲染为文本或消息列表
pub trait Prompt: Send + Sync {
    fn render_as_text(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> Result<RenderedPrompt<String>, WaveError>;

    fn render_as_messages(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> Result<RenderedPrompt<Vec<Message>>, WaveError>;
}

/// 对话型 Prompt：system 指令、历史消息、当前输入（为空时省略）
#[derive(Debug, Clone)]
pub struct ConversationPrompt {
    system: String,
    history_variable: String,
    input_variable: String,
}

impl ConversationPrompt {
    pub fn new(system: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            history_variable: "history".to_string(),
            input_variable: "input".to_string(),
        }
    }

    pub fn with_history_variable(mut self, name: impl Into<String>) -> Self {
        self.history_variable = name.into();
        self
    }

    pub fn with_input_variable(mut self, name: impl Into<String>) -> Self {
        self.input_variable = name.into();
        self
    }

    fn messages(&self, memory: &dyn PromptMemory) -> Vec<Message> {
        let mut messages = Vec::new();
        if !self.system.is_empty() {
            messages.push(Message::system(self.system.clone()));
        }
        messages.extend(load_history(memory, &self.history_variable));
        let input = memory
            .get(&self.input_variable)
            .map(|v| value_to_text(&v))
            .unwrap_or_default();
        if !input.is_empty() {
            messages.push(Message::user(input));
        }
        messages
    }
}

impl Prompt for ConversationPrompt {
    fn render_as_text(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> Result<RenderedPrompt<String>, WaveError> {
        let text = self
            .messages(memory)
            .iter()
            .map(|m| format!("{}: {}", m.role.as_str(), m.content))
            .collect::<Vec<_>>()
            .join("\n");
        let length = tokenizer.count(&text);
        Ok(RenderedPrompt {
            output: text,
            length,
            too_long: length > max_tokens,
        })
    }

    fn render_as_messages(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        max_tokens: usize,
    ) -> Result<RenderedPrompt<Vec<Message>>, WaveError> {
        let messages = self.messages(memory);
        let length = messages.iter().map(|m| tokenizer.count(&m.content)).sum();
        Ok(RenderedPrompt {
            output: messages,
            length,
            too_long: length > max_tokens,
        })
    }
}
