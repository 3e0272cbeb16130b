//! 核心编排层：补全 / 校验 / 修复引擎、响应类型与错误

pub mod engine;
pub mod error;
pub mod response;

pub use engine::PromptWave;
pub use error::WaveError;
pub use response::{PromptResponse, ResponseMessage, ResponseMetadata, ResponseStatus};
