//! PromptWave - 带校验与自动修复的 LLM 补全引擎
//!
//! 模块划分：
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: PromptWave 引擎、PromptResponse、WaveError
//! - **llm**: 补全客户端抽象、聊天模型适配器与 Mock
//! - **memory**: 键值存储、对话历史与三种 Fork（修复时隔离历史 / 输入）
//! - **observability**: tracing 日志初始化
//! - **parse**: 容错 JSON 提取（从自由文本中找出对象）
//! - **prompt**: Prompt 渲染与分词器
//! - **validation**: 响应校验器（默认全通过、JSON / JSON Schema）与修复反馈

pub mod config;
pub mod core;
pub mod llm;
pub mod memory;
pub mod observability;
pub mod parse;
pub mod prompt;
pub mod validation;

pub use crate::core::{PromptResponse, PromptWave, ResponseStatus, WaveError};
