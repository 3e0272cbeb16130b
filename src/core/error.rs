//! 引擎内部错误类型
//!
//! 后端失败（限流、超长、取消等）以 ResponseStatus 表达，不走这里；
//! WaveError 只表示内部故障，由 PromptWave 在最外层统一转成 Error 状态。

use thiserror::Error;

/// 补全 / 校验 / 修复过程中可能出现的内部错误
#[derive(Error, Debug)]
pub enum WaveError {
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    #[error("Validator failed: {0}")]
    Validator(String),

    #[error("Completion client failed: {0}")]
    Client(String),

    #[error("Prompt render failed: {0}")]
    Render(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for WaveError {
    fn from(err: config::ConfigError) -> Self {
        WaveError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WaveError::Validator("boom".to_string());
        assert_eq!(err.to_string(), "Validator failed: boom");
    }

    #[test]
    fn test_json_error_conversion() {
        let parse: Result<serde_json::Value, _> = serde_json::from_str("{");
        let err: WaveError = parse.unwrap_err().into();
        assert!(err.to_string().starts_with("JSON error:"));
    }
}
