//! Mock 补全客户端（用于测试，无需 API）
//!
//! 按顺序吐出预设响应；像真实客户端一样先渲染 prompt（超长时返回 TooLong），
//! 并记录每次调用看到的消息，便于断言修复过程中模型看到了什么。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{PromptResponse, WaveError};
use crate::llm::{CompletionClient, CompletionOptions};
use crate::memory::{Message, PromptMemory};
use crate::prompt::{Prompt, RenderedOutput, Tokenizer};

/// 脚本化客户端：脚本耗尽后返回 Error 状态
#[derive(Debug, Default)]
pub struct MockCompletionClient {
    responses: Mutex<VecDeque<PromptResponse>>,
    calls: Mutex<Vec<Vec<Message>>>,
}

impl MockCompletionClient {
    pub fn new(responses: impl IntoIterator<Item = PromptResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// 每段文本作为一次成功的裸文本回复
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(texts.into_iter().map(PromptResponse::success_text))
    }

    /// 每次调用渲染出的消息列表
    pub fn calls(&self) -> Vec<Vec<Message>> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// 尚未消费的预设响应数
    pub fn remaining(&self) -> usize {
        self.responses.lock().unwrap().len()
    }
}

#[async_trait]
impl CompletionClient for MockCompletionClient {
    async fn complete_prompt(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        prompt: &dyn Prompt,
        options: &CompletionOptions,
    ) -> Result<PromptResponse, WaveError> {
        let rendered = prompt.render_as_messages(memory, tokenizer, options.max_input_tokens)?;
        self.calls.lock().unwrap().push(rendered.output.clone());
        if rendered.too_long {
            return Ok(PromptResponse::too_long(format!(
                "The generated prompt length was too long by {} tokens.",
                rendered.length.saturating_sub(options.max_input_tokens)
            )));
        }

        let next = self.responses.lock().unwrap().pop_front();
        let response = next
            .unwrap_or_else(|| PromptResponse::error("MockCompletionClient: no scripted responses left"));
        Ok(response.with_prompt(RenderedOutput::Messages(rendered.output)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ResponseStatus;
    use crate::memory::VolatileMemory;
    use crate::prompt::{CharTokenizer, ConversationPrompt};
    use serde_json::json;

    #[tokio::test]
    async fn test_mock_returns_scripted_in_order() {
        let client = MockCompletionClient::from_texts(["one", "two"]);
        let memory = VolatileMemory::from_values([("input", json!("hi"))]);
        let prompt = ConversationPrompt::new("sys");
        let options = CompletionOptions::default();

        let first = client
            .complete_prompt(&memory, &CharTokenizer, &prompt, &options)
            .await
            .unwrap();
        let second = client
            .complete_prompt(&memory, &CharTokenizer, &prompt, &options)
            .await
            .unwrap();
        let third = client
            .complete_prompt(&memory, &CharTokenizer, &prompt, &options)
            .await
            .unwrap();

        assert_eq!(first.text(), "one");
        assert_eq!(second.text(), "two");
        assert_eq!(third.status, ResponseStatus::Error);
        assert_eq!(client.call_count(), 3);
        assert_eq!(client.calls()[0].last(), Some(&Message::user("hi")));
    }

    #[tokio::test]
    async fn test_mock_reports_too_long() {
        let client = MockCompletionClient::from_texts(["unused"]);
        let memory = VolatileMemory::from_values([("input", json!("a long question"))]);
        let prompt = ConversationPrompt::new("");
        let options = CompletionOptions::default().with_max_input_tokens(5);

        let response = client
            .complete_prompt(&memory, &CharTokenizer, &prompt, &options)
            .await
            .unwrap();
        assert_eq!(response.status, ResponseStatus::TooLong);
        assert_eq!(
            response.text(),
            "The generated prompt length was too long by 10 tokens."
        );
        assert_eq!(client.remaining(), 1);
    }
}
