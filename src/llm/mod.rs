//! 后端层：补全客户端抽象、聊天模型适配器与 Mock

pub mod chat;
pub mod mock;
pub mod traits;

pub use chat::{ChatCompletionClient, ChatError, ChatModel, ChatOutput};
pub use mock::MockCompletionClient;
pub use traits::{CompletionClient, CompletionOptions};
