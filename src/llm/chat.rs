//! 聊天模型适配器
//!
//! 把任意「消息列表 -> 文本」的聊天模型包装成 CompletionClient：
//! 先按预算渲染 prompt（超长直接返回 TooLong，不调用模型），再调用模型，
//! 把 ChatError 归类为 RateLimited / Cancelled / TooLong / Error，并填充元数据（结束原因、token、耗时）。

use std::time::Instant;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::{PromptResponse, ResponseMetadata, WaveError};
use crate::llm::{CompletionClient, CompletionOptions};
use crate::memory::{Message, PromptMemory};
use crate::prompt::{Prompt, RenderedOutput, Tokenizer};

/// 聊天模型失败原因
#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    #[error("Context too long: {0}")]
    ContextTooLong(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

/// 聊天模型单次输出
#[derive(Debug, Clone, Default)]
pub struct ChatOutput {
    pub content: String,
    pub finish_reason: Option<String>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
}

impl ChatOutput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }
}

/// 聊天模型 trait：非流式完成
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn chat(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<ChatOutput, ChatError>;
}

/// ChatModel -> CompletionClient 适配器
pub struct ChatCompletionClient<M> {
    model: M,
}

impl<M: ChatModel> ChatCompletionClient<M> {
    pub fn new(model: M) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &M {
        &self.model
    }
}

#[async_trait]
impl<M: ChatModel> CompletionClient for ChatCompletionClient<M> {
    async fn complete_prompt(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        prompt: &dyn Prompt,
        options: &CompletionOptions,
    ) -> Result<PromptResponse, WaveError> {
        let rendered = prompt.render_as_messages(memory, tokenizer, options.max_input_tokens)?;
        let echo = RenderedOutput::Messages(rendered.output.clone());
        if rendered.too_long {
            return Ok(PromptResponse::too_long(format!(
                "The generated prompt length was too long by {} tokens.",
                rendered.length.saturating_sub(options.max_input_tokens)
            ))
            .with_prompt(echo));
        }

        let started = Instant::now();
        let result = self.model.chat(&rendered.output, options).await;
        let duration_ms = started.elapsed().as_millis() as u64;

        let response = match result {
            Ok(output) => {
                tracing::debug!(model = %options.model, duration_ms, "chat completion finished");
                PromptResponse::success(Message::assistant(output.content)).with_metadata(
                    ResponseMetadata {
                        finish_reason: output.finish_reason,
                        prompt_tokens: output.prompt_tokens,
                        completion_tokens: output.completion_tokens,
                        duration_ms: Some(duration_ms),
                    },
                )
            }
            Err(err) => {
                tracing::warn!(model = %options.model, error = %err, "chat completion failed");
                let text = err.to_string();
                let response = match err {
                    ChatError::RateLimited { .. } => PromptResponse::rate_limited(text),
                    ChatError::ContextTooLong(_) => PromptResponse::too_long(text),
                    ChatError::Cancelled => PromptResponse::cancelled(text),
                    ChatError::Other(_) => PromptResponse::error(text),
                };
                response.with_metadata(ResponseMetadata {
                    duration_ms: Some(duration_ms),
                    ..ResponseMetadata::default()
                })
            }
        };
        Ok(response.with_prompt(echo))
    }
}
