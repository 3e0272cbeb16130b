//! 结构化提取：从不可信的模型输出中恢复 JSON 对象

pub mod json;

pub use json::{parse_all, parse_one};
