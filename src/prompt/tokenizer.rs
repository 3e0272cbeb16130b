//! 分词抽象
//!
//! 引擎本身不计数 token，只把 Tokenizer 透传给后端与校验器；CharTokenizer 是一个按字符切分的最小实现。

/// 分词器：encode 与 decode 互逆
pub trait Tokenizer: Send + Sync {
    fn encode(&self, text: &str) -> Vec<u32>;

    fn decode(&self, tokens: &[u32]) -> String;

    /// 文本 token 数
    fn count(&self, text: &str) -> usize {
        self.encode(text).len()
    }
}

/// 每个 Unicode 标量值一个 token
#[derive(Debug, Default, Clone, Copy)]
pub struct CharTokenizer;

impl Tokenizer for CharTokenizer {
    fn encode(&self, text: &str) -> Vec<u32> {
        text.chars().map(u32::from).collect()
    }

    fn decode(&self, tokens: &[u32]) -> String {
        tokens.iter().filter_map(|t| char::from_u32(*t)).collect()
    }

    fn count(&self, text: &str) -> usize {
        text.chars().count()
    }
}
