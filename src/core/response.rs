//! 后端单次调用结果：PromptResponse
//!
//! 后端可能返回结构化消息、裸字符串或什么都不返回；引擎在每次调用后立刻调用
//! normalized()，之后的逻辑只面对 ResponseMessage::Structured 一种形态。

use serde::{Deserialize, Serialize};

use crate::memory::Message;
use crate::prompt::RenderedOutput;

/// 调用状态（后端自行分类，引擎原样转发非 Success 状态）
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    Success,
    Error,
    RateLimited,
    InvalidResponse,
    TooLong,
    Cancelled,
}

/// 消息体：结构化消息或裸文本
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseMessage {
    Structured(Message),
    Text(String),
}

impl ResponseMessage {
    /// 消息正文（结构化消息取 content）
    pub fn text(&self) -> &str {
        match self {
            ResponseMessage::Structured(m) => &m.content,
            ResponseMessage::Text(t) => t,
        }
    }
}

/// 响应元数据：结束原因、token 数、耗时
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ResponseMetadata {
    pub finish_reason: Option<String>,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub duration_ms: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PromptResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<ResponseMessage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
    /// 回显本次渲染出的 prompt（可选）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<RenderedOutput>,
}

impl PromptResponse {
    pub fn new(status: ResponseStatus, message: Option<ResponseMessage>) -> Self {
        Self {
            status,
            message,
            metadata: None,
            prompt: None,
        }
    }

    pub fn success(message: Message) -> Self {
        Self::new(ResponseStatus::Success, Some(ResponseMessage::Structured(message)))
    }

    /// 成功但正文为裸文本（需经 normalized() 规范化）
    pub fn success_text(text: impl Into<String>) -> Self {
        Self::new(ResponseStatus::Success, Some(ResponseMessage::Text(text.into())))
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::with_text(ResponseStatus::Error, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::with_text(ResponseStatus::RateLimited, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::with_text(ResponseStatus::InvalidResponse, message)
    }

    pub fn too_long(message: impl Into<String>) -> Self {
        Self::with_text(ResponseStatus::TooLong, message)
    }

    pub fn cancelled(message: impl Into<String>) -> Self {
        Self::with_text(ResponseStatus::Cancelled, message)
    }

    fn with_text(status: ResponseStatus, message: impl Into<String>) -> Self {
        Self::new(status, Some(ResponseMessage::Text(message.into())))
    }

    pub fn with_metadata(mut self, metadata: ResponseMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_prompt(mut self, prompt: RenderedOutput) -> Self {
        self.prompt = Some(prompt);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == ResponseStatus::Success
    }

    /// 消息正文；无消息时为空串
    pub fn text(&self) -> &str {
        self.message.as_ref().map(ResponseMessage::text).unwrap_or("")
    }

    /// 结构化消息（未规范化或无消息时为 None）
    pub fn structured(&self) -> Option<&Message> {
        match &self.message {
            Some(ResponseMessage::Structured(m)) => Some(m),
            _ => None,
        }
    }

    /// 规范化：裸文本或缺失的消息包装为 assistant 消息
    pub fn normalized(mut self) -> Self {
        let message = match self.message.take() {
            Some(ResponseMessage::Structured(m)) => m,
            Some(ResponseMessage::Text(t)) => Message::assistant(t),
            None => Message::assistant(""),
        };
        self.message = Some(ResponseMessage::Structured(message));
        self
    }

    /// 用校验器给出的替换值覆盖正文：字符串原样，其它 JSON 序列化
    pub(crate) fn replace_content(&mut self, value: serde_json::Value) {
        let content = match value {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        match &mut self.message {
            Some(ResponseMessage::Structured(m)) => m.content = content,
            _ => self.message = Some(ResponseMessage::Structured(Message::assistant(content))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::Role;

    #[test]
    fn test_normalize_text() {
        let response = PromptResponse::success_text("hello").normalized();
        let message = response.structured().expect("structured");
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.content, "hello");
    }

    #[test]
    fn test_normalize_missing_message() {
        let response = PromptResponse::new(ResponseStatus::Success, None).normalized();
        assert_eq!(response.structured().map(|m| m.content.as_str()), Some(""));
    }

    #[test]
    fn test_normalize_keeps_structured() {
        let response = PromptResponse::success(Message::user("hi")).normalized();
        assert_eq!(response.structured().map(|m| m.role.clone()), Some(Role::User));
    }

    #[test]
    fn test_replace_content() {
        let mut response = PromptResponse::success(Message::assistant("raw"));
        response.replace_content(serde_json::json!({"a": 1}));
        assert_eq!(response.text(), r#"{"a":1}"#);

        response.replace_content(serde_json::json!("plain"));
        assert_eq!(response.text(), "plain");
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&PromptResponse::rate_limited("slow down")).unwrap();
        assert!(json.contains(r#""status":"rate_limited""#));
        assert!(json.contains(r#""message":"slow down""#));
    }
}
