//! JSON 校验器：从回复中提取 JSON 对象，并可选地按 JSON Schema 校验
//!
//! 多个候选对象时从最后一个往前试（模型改主意时通常把修正后的答案放在最后）；
//! 全部不满足时只用最后一个候选的违规生成反馈。

use async_trait::async_trait;
use jsonschema::Validator;
use schemars::JsonSchema;
use serde_json::Value;

use crate::core::{PromptResponse, WaveError};
use crate::memory::PromptMemory;
use crate::parse::parse_all;
use crate::prompt::Tokenizer;
use crate::validation::feedback::{schema_feedback, SchemaViolation};
use crate::validation::{PromptResponseValidator, Validation};

/// 未找到 JSON 对象时的默认反馈
pub const MISSING_JSON_FEEDBACK: &str =
    "No valid JSON objects were found in the response. Return a valid JSON object.";

pub struct JsonResponseValidator {
    schema: Option<Validator>,
    missing_json_feedback: String,
}

impl JsonResponseValidator {
    /// 不带 Schema：任意非空 JSON 对象即通过
    pub fn new() -> Self {
        Self {
            schema: None,
            missing_json_feedback: MISSING_JSON_FEEDBACK.to_string(),
        }
    }

    /// 带 Schema（构造时编译，Schema 本身非法时返回 InvalidSchema）
    pub fn with_schema(schema: &Value) -> Result<Self, WaveError> {
        let compiled = jsonschema::validator_for(schema)
            .map_err(|err| WaveError::InvalidSchema(err.to_string()))?;
        Ok(Self {
            schema: Some(compiled),
            missing_json_feedback: MISSING_JSON_FEEDBACK.to_string(),
        })
    }

    /// 由 Rust 类型生成 Schema（schemars）
    pub fn for_type<T: JsonSchema>() -> Result<Self, WaveError> {
        let schema = serde_json::to_value(schemars::schema_for!(T))?;
        Self::with_schema(&schema)
    }

    pub fn with_missing_json_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.missing_json_feedback = feedback.into();
        self
    }

    fn check(&self, candidates: Vec<Value>) -> Validation {
        let Some(schema) = &self.schema else {
            // 无 Schema：取最后一个候选
            return match candidates.into_iter().last() {
                Some(value) => Validation::valid_with(value),
                None => Validation::invalid(self.missing_json_feedback.clone()),
            };
        };

        let mut violations: Option<Vec<SchemaViolation>> = None;
        for candidate in candidates.into_iter().rev() {
            if schema.is_valid(&candidate) {
                return Validation::valid_with(candidate);
            }
            if violations.is_none() {
                violations = Some(
                    schema
                        .iter_errors(&candidate)
                        .map(|e| SchemaViolation::from_error(&e))
                        .collect(),
                );
            }
        }

        match violations {
            Some(violations) => Validation::invalid(schema_feedback(&violations)),
            None => Validation::invalid(self.missing_json_feedback.clone()),
        }
    }
}

impl Default for JsonResponseValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PromptResponseValidator for JsonResponseValidator {
    async fn validate_response(
        &self,
        _memory: &dyn PromptMemory,
        _tokenizer: &dyn Tokenizer,
        response: &PromptResponse,
        remaining_attempts: usize,
    ) -> Result<Validation, WaveError> {
        let candidates = parse_all(response.text());
        tracing::debug!(
            candidates = candidates.len(),
            remaining_attempts,
            "validating JSON response"
        );
        Ok(self.check(candidates))
    }
}
