//! 补全客户端抽象
//!
//! 后端（HTTP 客户端、本地模型、测试替身）实现 CompletionClient：渲染 prompt、调用模型，
//! 并自行把失败归类为 ResponseStatus（限流、超长、取消……）。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::{PromptResponse, WaveError};
use crate::memory::PromptMemory;
use crate::prompt::{Prompt, Tokenizer};

/// 调用参数（模型名、温度、输入预算、输出上限）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: Option<f32>,
    /// prompt 渲染的 token 预算
    pub max_input_tokens: usize,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            temperature: None,
            max_input_tokens: 4096,
            max_tokens: None,
        }
    }
}

impl CompletionOptions {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..Self::default()
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_input_tokens(mut self, max: usize) -> Self {
        self.max_input_tokens = max;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }
}

/// 补全客户端 trait
///
/// 后端失败以状态返回；Err 只用于真正的内部故障，引擎会把它转成 Error 状态。
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete_prompt(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        prompt: &dyn Prompt,
        options: &CompletionOptions,
    ) -> Result<PromptResponse, WaveError>;
}
