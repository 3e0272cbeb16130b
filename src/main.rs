//! PromptWave 回放工具
//!
//! 用法：promptwave <responses.json> [schema.json] [input]
//! responses.json 为字符串数组，依次作为模型输出回放；经 JSON 校验器（可带 Schema）
//! 完整跑一遍补全 / 修复流程，最终响应以 JSON 打印到 stdout。

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context};
use promptwave::config::{load_config, WaveSection};
use promptwave::core::engine::DEFAULT_INPUT_VARIABLE;
use promptwave::llm::MockCompletionClient;
use promptwave::memory::VolatileMemory;
use promptwave::observability;
use promptwave::prompt::ConversationPrompt;
use promptwave::validation::JsonResponseValidator;
use promptwave::PromptWave;

const SYSTEM_PROMPT: &str = "You are a helpful assistant. Answer with a single JSON object.";

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// 回放用 prompt：未配置输入槽位时读取默认的 "input"（修复反馈也写在那里）
fn replay_prompt(wave: &WaveSection) -> ConversationPrompt {
    let prompt =
        ConversationPrompt::new(SYSTEM_PROMPT).with_history_variable(wave.history_variable.clone());
    if wave.input_variable.is_empty() {
        prompt
    } else {
        prompt.with_input_variable(wave.input_variable.clone())
    }
}

/// 回放用存储：未配置输入槽位时引擎不写存储，由这里把命令行输入预置到默认槽位
fn replay_memory(wave: &WaveSection, input: &str) -> VolatileMemory {
    if wave.input_variable.is_empty() {
        VolatileMemory::from_values([(DEFAULT_INPUT_VARIABLE, serde_json::json!(input))])
    } else {
        VolatileMemory::new()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(responses_path) = args.first() else {
        bail!("usage: promptwave <responses.json> [schema.json] [input]");
    };

    let config = load_config(None).context("Failed to load config")?;

    let responses: Vec<String> = serde_json::from_value(read_json(Path::new(responses_path))?)
        .context("responses file must be a JSON array of strings")?;
    let validator = match args.get(1) {
        Some(schema_path) => JsonResponseValidator::with_schema(&read_json(Path::new(schema_path))?)
            .context("Failed to compile schema")?,
        None => JsonResponseValidator::new(),
    };
    let input = args.get(2).map(String::as_str).unwrap_or("Return the result as JSON.");

    let client = Arc::new(MockCompletionClient::from_texts(responses));
    let wave = PromptWave::from_config(
        client.clone(),
        Arc::new(replay_prompt(&config.wave)),
        Arc::new(replay_memory(&config.wave, input)),
        &config.wave,
        &config.completion,
    )
    .with_validator(Arc::new(validator));

    let response = wave.complete_prompt(Some(input)).await;
    tracing::info!(
        status = ?response.status,
        calls = client.call_count(),
        "replay finished"
    );
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
