//! JSON Schema 违规 -> 修复指令
//!
//! 每条违规翻译为一句祈使句（按下表第一条匹配的规则），全部拼成一段反馈注入下一轮输入：
//! 类型错误、多类型、多余属性、缺失属性、格式、重复元素、枚举、常量，其余原样引用并附 "Fix that"。

use jsonschema::error::{TypeKind, ValidationErrorKind};
use jsonschema::ValidationError;
use serde_json::Value;

use crate::memory::conversation::value_to_text;

/// 反馈开头
pub const SCHEMA_FEEDBACK_HEADER: &str = "The JSON returned had errors. Apply these fixes:";

/// 违规类别（只保留生成反馈所需的信息）
#[derive(Clone, Debug, PartialEq)]
pub enum ViolationKind {
    Type(String),
    Types(Vec<String>),
    AdditionalProperties(Vec<String>),
    Required(String),
    Format(String),
    UniqueItems,
    Enum(Vec<String>),
    Const(String),
    Other,
}

/// 一条 Schema 违规：字段名（instance.a.b[0] 形式）、类别、原始消息
#[derive(Clone, Debug, PartialEq)]
pub struct SchemaViolation {
    pub field: String,
    pub kind: ViolationKind,
    pub message: String,
}

impl SchemaViolation {
    pub fn from_error(error: &ValidationError<'_>) -> Self {
        let kind = match &error.kind {
            ValidationErrorKind::Type { kind } => match kind {
                TypeKind::Single(t) => ViolationKind::Type(t.to_string()),
                TypeKind::Multiple(types) => {
                    ViolationKind::Types(types.iter().map(|t| t.to_string()).collect())
                }
            },
            ValidationErrorKind::AdditionalProperties { unexpected } => {
                ViolationKind::AdditionalProperties(unexpected.clone())
            }
            ValidationErrorKind::Required { property } => {
                ViolationKind::Required(value_to_text(property))
            }
            ValidationErrorKind::Format { format } => ViolationKind::Format(format.clone()),
            ValidationErrorKind::UniqueItems => ViolationKind::UniqueItems,
            ValidationErrorKind::Enum { options } => ViolationKind::Enum(list_values(options)),
            ValidationErrorKind::Constant { expected_value } => {
                ViolationKind::Const(value_to_text(expected_value))
            }
            _ => ViolationKind::Other,
        };
        Self {
            field: field_name(&error.instance_path.to_string()),
            kind,
            message: error.to_string(),
        }
    }

    /// 该违规对应的修复指令（多余属性每个一条）
    pub fn fixes(&self) -> Vec<String> {
        let field = &self.field;
        match &self.kind {
            ViolationKind::Type(t) => vec![format!(r#"convert "{field}" to a {t}"#)],
            ViolationKind::Types(types) => vec![format!(
                r#"convert "{field}" to one of the allowed types: {}"#,
                types.join(", ")
            )],
            ViolationKind::AdditionalProperties(extra) => extra
                .iter()
                .map(|p| format!(r#"remove the "{p}" property from "{field}""#))
                .collect(),
            ViolationKind::Required(p) => vec![format!(r#"add the "{p}" property to "{field}""#)],
            ViolationKind::Format(format) => {
                vec![format!(r#"change the "{field}" property to be a {format}"#)]
            }
            ViolationKind::UniqueItems => {
                vec![format!(r#"remove all duplicate items from "{field}""#)]
            }
            ViolationKind::Enum(values) => vec![format!(
                r#"change the "{field}" property to be one of these values: {}"#,
                values.join(", ")
            )],
            ViolationKind::Const(value) => {
                vec![format!(r#"change the "{field}" property to be {value}"#)]
            }
            ViolationKind::Other => vec![format!(r#""{field}" {}. Fix that"#, self.message)],
        }
    }
}

/// 把违规列表拼成一段反馈
pub fn schema_feedback(violations: &[SchemaViolation]) -> String {
    let fixes: Vec<String> = violations.iter().flat_map(SchemaViolation::fixes).collect();
    format!("{SCHEMA_FEEDBACK_HEADER}\n{}", fixes.join("\n"))
}

/// JSON Pointer（/items/0/name）-> instance.items[0].name
pub fn field_name(pointer: &str) -> String {
    let mut name = String::from("instance");
    for segment in pointer.split('/').skip(1) {
        let segment = segment.replace("~1", "/").replace("~0", "~");
        if !segment.is_empty() && segment.chars().all(|c| c.is_ascii_digit()) {
            name.push_str(&format!("[{segment}]"));
        } else {
            name.push('.');
            name.push_str(&segment);
        }
    }
    name
}

fn list_values(options: &Value) -> Vec<String> {
    match options {
        Value::Array(items) => items.iter().map(value_to_text).collect(),
        other => vec![value_to_text(other)],
    }
}
