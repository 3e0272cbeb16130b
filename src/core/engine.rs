//! 补全 / 校验 / 修复主循环
//!
//! 用户输入 -> 调用后端 -> 规范化 -> 校验 ->
//! 通过则把「输入 + 回复」写入真实历史；
//! 不通过则在 ScopedHistoryFork 上带反馈重试（最多 max_repair_attempts 次），
//! 修复成功才把「原始输入 + 修复后的回复」提交到真实历史，失败时真实存储保持不变。
//! 后端失败（限流、超长、取消……）任何时候都原样返回，不进入修复；内部错误统一转为 Error 状态。

use std::sync::Arc;

use crate::config::{CompletionSection, WaveSection};
use crate::core::{PromptResponse, WaveError};
use crate::llm::{CompletionClient, CompletionOptions};
use crate::memory::conversation::value_to_text;
use crate::memory::{append_history, Message, PromptMemory, ScopedHistoryFork};
use crate::prompt::{CharTokenizer, Prompt, Tokenizer};
use crate::validation::{DefaultResponseValidator, PromptResponseValidator, Validation};

pub const DEFAULT_HISTORY_VARIABLE: &str = "history";
pub const DEFAULT_INPUT_VARIABLE: &str = "input";
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 10;
pub const DEFAULT_MAX_REPAIR_ATTEMPTS: usize = 3;

/// 校验器没有给出反馈时使用的通用反馈
pub const DEFAULT_REPAIR_FEEDBACK: &str = "The response was invalid. Try another strategy.";
/// 最后一次修复机会时追加到反馈末尾
pub const LAST_ATTEMPT_SUFFIX: &str =
    "\n\nThis is your last attempt, so think step by step before you answer.";

/// 补全引擎：一次配置，多次调用 complete_prompt
pub struct PromptWave {
    client: Arc<dyn CompletionClient>,
    prompt: Arc<dyn Prompt>,
    prompt_options: CompletionOptions,
    memory: Arc<dyn PromptMemory>,
    tokenizer: Arc<dyn Tokenizer>,
    validator: Arc<dyn PromptResponseValidator>,
    history_variable: String,
    /// None 时不读写输入槽位（修复反馈仍写入 Fork 的默认输入槽位）
    input_variable: Option<String>,
    max_history_messages: usize,
    max_repair_attempts: usize,
    log_repairs: bool,
}

impl PromptWave {
    /// 创建最小配置的引擎（默认校验器全部通过）
    pub fn new(
        client: Arc<dyn CompletionClient>,
        prompt: Arc<dyn Prompt>,
        memory: Arc<dyn PromptMemory>,
    ) -> Self {
        Self {
            client,
            prompt,
            prompt_options: CompletionOptions::default(),
            memory,
            tokenizer: Arc::new(CharTokenizer),
            validator: Arc::new(DefaultResponseValidator),
            history_variable: DEFAULT_HISTORY_VARIABLE.to_string(),
            input_variable: Some(DEFAULT_INPUT_VARIABLE.to_string()),
            max_history_messages: DEFAULT_MAX_HISTORY_MESSAGES,
            max_repair_attempts: DEFAULT_MAX_REPAIR_ATTEMPTS,
            log_repairs: false,
        }
    }

    /// 从配置创建（[wave] 与 [completion] 段）
    pub fn from_config(
        client: Arc<dyn CompletionClient>,
        prompt: Arc<dyn Prompt>,
        memory: Arc<dyn PromptMemory>,
        wave: &WaveSection,
        completion: &CompletionSection,
    ) -> Self {
        let input_variable = Some(wave.input_variable.clone()).filter(|v| !v.is_empty());
        Self {
            prompt_options: completion.to_options(),
            history_variable: wave.history_variable.clone(),
            input_variable,
            max_history_messages: wave.max_history_messages,
            max_repair_attempts: wave.max_repair_attempts,
            log_repairs: wave.log_repairs,
            ..Self::new(client, prompt, memory)
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.prompt_options = options;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: Arc<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    pub fn with_validator(mut self, validator: Arc<dyn PromptResponseValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_history_variable(mut self, name: impl Into<String>) -> Self {
        self.history_variable = name.into();
        self
    }

    /// None：不使用输入槽位
    pub fn with_input_variable(mut self, name: Option<String>) -> Self {
        self.input_variable = name;
        self
    }

    pub fn with_max_history_messages(mut self, max: usize) -> Self {
        self.max_history_messages = max;
        self
    }

    pub fn with_max_repair_attempts(mut self, max: usize) -> Self {
        self.max_repair_attempts = max;
        self
    }

    pub fn with_log_repairs(mut self, enabled: bool) -> Self {
        self.log_repairs = enabled;
        self
    }

    pub fn memory(&self) -> &Arc<dyn PromptMemory> {
        &self.memory
    }

    /// 执行一次补全；任何出口都是带状态的 PromptResponse，不返回 Err
    pub async fn complete_prompt(&self, input: Option<&str>) -> PromptResponse {
        match self.try_complete(input).await {
            Ok(response) => response,
            Err(err) => {
                tracing::warn!(error = %err, "prompt completion failed");
                PromptResponse::error(err.to_string())
            }
        }
    }

    async fn try_complete(&self, input: Option<&str>) -> Result<PromptResponse, WaveError> {
        let input = self.resolve_input(input);

        let response = self.call_backend(self.memory.as_ref()).await?;
        if !response.is_success() {
            return Ok(response);
        }
        let mut response = response.normalized();

        let validation = self
            .validator
            .validate_response(
                self.memory.as_ref(),
                self.tokenizer.as_ref(),
                &response,
                self.max_repair_attempts,
            )
            .await?;

        if validation.valid {
            if let Some(value) = validation.value {
                response.replace_content(value);
            }
            self.commit_turn(&input, &response)?;
            return Ok(response);
        }

        // 修复在 Fork 上进行：模型能看到自己的错误，真实历史不受影响
        let input_variable = self
            .input_variable
            .clone()
            .unwrap_or_else(|| DEFAULT_INPUT_VARIABLE.to_string());
        let fork = ScopedHistoryFork::new(
            self.memory.clone(),
            self.history_variable.clone(),
            input_variable.clone(),
        );
        self.push_history(&fork, &Message::user(input.clone()))?;
        if let Some(message) = response.structured() {
            self.push_history(&fork, message)?;
        }

        let repaired = self.repair(&fork, &input_variable, validation).await?;
        if repaired.is_success() {
            self.commit_turn(&input, &repaired)?;
        }
        Ok(repaired)
    }

    /// 修复循环：先检查是否耗尽，再发起下一次调用；最后一次机会的反馈带固定后缀
    async fn repair(
        &self,
        fork: &ScopedHistoryFork,
        input_variable: &str,
        mut validation: Validation,
    ) -> Result<PromptResponse, WaveError> {
        let mut remaining = self.max_repair_attempts;

        loop {
            let feedback = validation
                .feedback
                .take()
                .unwrap_or_else(|| DEFAULT_REPAIR_FEEDBACK.to_string());
            if remaining == 0 {
                tracing::warn!(
                    attempts = self.max_repair_attempts,
                    "repair attempts exhausted"
                );
                return Ok(PromptResponse::invalid_response(feedback));
            }

            let feedback = if remaining == 1 {
                format!("{feedback}{LAST_ATTEMPT_SUFFIX}")
            } else {
                feedback
            };
            if self.log_repairs {
                tracing::info!(remaining, feedback = %feedback, "repairing response");
            } else {
                tracing::debug!(remaining, "repairing response");
            }
            fork.set(input_variable, serde_json::Value::String(feedback));

            let response = self.call_backend(fork).await?;
            if !response.is_success() {
                return Ok(response);
            }
            let mut response = response.normalized();

            let next = self
                .validator
                .validate_response(fork, self.tokenizer.as_ref(), &response, remaining)
                .await?;
            if next.valid {
                if let Some(value) = next.value {
                    response.replace_content(value);
                }
                if self.log_repairs {
                    tracing::info!(remaining, "response repaired");
                }
                return Ok(response);
            }

            remaining -= 1;
            validation = next;
        }
    }

    fn resolve_input(&self, input: Option<&str>) -> String {
        match &self.input_variable {
            Some(name) => match input {
                Some(text) => {
                    self.memory
                        .set(name, serde_json::Value::String(text.to_string()));
                    text.to_string()
                }
                None => self
                    .memory
                    .get(name)
                    .map(|v| value_to_text(&v))
                    .unwrap_or_default(),
            },
            None => input.unwrap_or_default().to_string(),
        }
    }

    async fn call_backend(&self, memory: &dyn PromptMemory) -> Result<PromptResponse, WaveError> {
        let response = self
            .client
            .complete_prompt(
                memory,
                self.tokenizer.as_ref(),
                self.prompt.as_ref(),
                &self.prompt_options,
            )
            .await?;
        tracing::debug!(status = ?response.status, "backend call finished");
        Ok(response)
    }

    /// 把一轮（用户输入 + 助手回复）写入真实历史
    fn commit_turn(&self, input: &str, response: &PromptResponse) -> Result<(), WaveError> {
        let memory = self.memory.as_ref();
        self.push_history(memory, &Message::user(input))?;
        if let Some(message) = response.structured() {
            self.push_history(memory, message)?;
        }
        Ok(())
    }

    fn push_history(&self, memory: &dyn PromptMemory, message: &Message) -> Result<(), WaveError> {
        append_history(
            memory,
            &self.history_variable,
            message,
            self.max_history_messages,
        )?;
        Ok(())
    }
}
