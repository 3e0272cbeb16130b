//! 校验层：判断模型输出是否可接受，不可接受时给出修复反馈
//!
//! 校验器不直接改写响应；需要替换正文时通过 Validation::value 返回替换值。
//! 返回 Err 会中止整次补全（引擎转成 Error 状态），因此能给出反馈时应优先返回 invalid。

pub mod feedback;
pub mod json;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{PromptResponse, WaveError};
use crate::memory::PromptMemory;
use crate::prompt::Tokenizer;

pub use json::JsonResponseValidator;

/// 校验结果：valid 时可带替换值，invalid 时带修复反馈
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl Validation {
    pub fn valid() -> Self {
        Self {
            valid: true,
            feedback: None,
            value: None,
        }
    }

    /// 通过，并用 value 替换消息正文
    pub fn valid_with(value: Value) -> Self {
        Self {
            valid: true,
            feedback: None,
            value: Some(value),
        }
    }

    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self {
            valid: false,
            feedback: Some(feedback.into()),
            value: None,
        }
    }
}

/// 响应校验器 trait
#[async_trait]
pub trait PromptResponseValidator: Send + Sync {
    /// remaining_attempts：调用方还剩的修复次数（校验器可据此调整反馈力度）
    async fn validate_response(
        &self,
        memory: &dyn PromptMemory,
        tokenizer: &dyn Tokenizer,
        response: &PromptResponse,
        remaining_attempts: usize,
    ) -> Result<Validation, WaveError>;
}

/// 默认校验器：全部通过
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultResponseValidator;

#[async_trait]
impl PromptResponseValidator for DefaultResponseValidator {
    async fn validate_response(
        &self,
        _memory: &dyn PromptMemory,
        _tokenizer: &dyn Tokenizer,
        _response: &PromptResponse,
        _remaining_attempts: usize,
    ) -> Result<Validation, WaveError> {
        Ok(Validation::valid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::VolatileMemory;
    use crate::prompt::CharTokenizer;

    #[tokio::test]
    async fn test_default_validator_accepts_everything() {
        let memory = VolatileMemory::new();
        let response = PromptResponse::success_text("anything at all").normalized();
        let validation = DefaultResponseValidator
            .validate_response(&memory, &CharTokenizer, &response, 0)
            .await
            .unwrap();
        assert_eq!(validation, Validation::valid());
    }
}
