// コマンドハンドラー層
// 各CLIコマンドの実装

pub mod inspect;

use crate::cli::OutputFormat;
use anyhow::{Context, Result};
use serde::Serialize;

/// コマンド出力のテキスト表現
pub trait CommandOutput {
    fn to_text(&self) -> String;
}

/// 出力フォーマットに応じてコマンド出力を文字列化
pub fn render_output<T>(output: &T, format: &OutputFormat) -> Result<String>
where
    T: CommandOutput + Serialize,
{
    match format {
        OutputFormat::Text => Ok(output.to_text()),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).with_context(|| "Failed to serialize output")
        }
    }
}
