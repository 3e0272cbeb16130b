//! 记忆层：键值存储抽象、对话历史、各种隔离粒度的 Fork

pub mod conversation;
pub mod fork;
pub mod scoped;
pub mod store;

pub use conversation::{append_history, load_history, Message, Role};
pub use fork::{MemoryFork, TransientFork};
pub use scoped::{HistoryFork, ScopedHistoryFork};
pub use store::{PromptMemory, VolatileMemory};
