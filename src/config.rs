//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PROMPTWAVE__*` 覆盖
//! （双下划线表示嵌套，如 `PROMPTWAVE__WAVE__MAX_REPAIR_ATTEMPTS=5`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::engine::{
    DEFAULT_HISTORY_VARIABLE, DEFAULT_INPUT_VARIABLE, DEFAULT_MAX_HISTORY_MESSAGES,
    DEFAULT_MAX_REPAIR_ATTEMPTS,
};
use crate::llm::CompletionOptions;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub wave: WaveSection,
    #[serde(default)]
    pub completion: CompletionSection,
}

/// [wave] 段：历史 / 输入槽位与修复次数
#[derive(Debug, Clone, Deserialize)]
pub struct WaveSection {
    #[serde(default = "default_history_variable")]
    pub history_variable: String,
    /// 空串表示不使用输入槽位
    #[serde(default = "default_input_variable")]
    pub input_variable: String,
    #[serde(default = "default_max_history_messages")]
    pub max_history_messages: usize,
    #[serde(default = "default_max_repair_attempts")]
    pub max_repair_attempts: usize,
    /// 修复过程以 info 级别输出（否则为 debug）
    #[serde(default)]
    pub log_repairs: bool,
}

impl Default for WaveSection {
    fn default() -> Self {
        Self {
            history_variable: default_history_variable(),
            input_variable: default_input_variable(),
            max_history_messages: default_max_history_messages(),
            max_repair_attempts: default_max_repair_attempts(),
            log_repairs: false,
        }
    }
}

fn default_history_variable() -> String {
    DEFAULT_HISTORY_VARIABLE.to_string()
}

fn default_input_variable() -> String {
    DEFAULT_INPUT_VARIABLE.to_string()
}

fn default_max_history_messages() -> usize {
    DEFAULT_MAX_HISTORY_MESSAGES
}

fn default_max_repair_attempts() -> usize {
    DEFAULT_MAX_REPAIR_ATTEMPTS
}

/// [completion] 段：模型名、温度、输入预算、输出上限
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionSection {
    #[serde(default = "default_model")]
    pub model: String,
    pub temperature: Option<f32>,
    #[serde(default = "default_max_input_tokens")]
    pub max_input_tokens: usize,
    pub max_tokens: Option<u32>,
}

impl Default for CompletionSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            temperature: None,
            max_input_tokens: default_max_input_tokens(),
            max_tokens: None,
        }
    }
}

fn default_model() -> String {
    CompletionOptions::default().model
}

fn default_max_input_tokens() -> usize {
    CompletionOptions::default().max_input_tokens
}

impl CompletionSection {
    pub fn to_options(&self) -> CompletionOptions {
        CompletionOptions {
            model: self.model.clone(),
            temperature: self.temperature,
            max_input_tokens: self.max_input_tokens,
            max_tokens: self.max_tokens,
        }
    }
}

/// 加载 [wave] 与 [completion] 两段配置
///
/// 只取第一个存在的默认文件；config_path 指向的文件（存在时）覆盖其中的键，
/// 例如只改 `[wave] max_repair_attempts`。环境变量最后生效：
/// `PROMPTWAVE__COMPLETION__MODEL=gpt-4o` 覆盖模型名。缺失的键全部回落到 serde 默认值。
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PROMPTWAVE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

/// 重新从磁盘与环境变量加载配置（调用方决定是否用新配置重建引擎）
pub fn reload_config() -> Result<AppConfig, config::ConfigError> {
    load_config(None)
}
