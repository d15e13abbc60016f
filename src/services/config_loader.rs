// 設定ファイル読み込みサービス
//
// core::config の純粋性を保つため、ファイルI/Oはこのサービスに集約する。

use crate::core::config::Config;
use anyhow::{Context, Result};
use std::path::Path;

/// 設定ファイル読み込みサービス
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// YAMLファイルから設定を読み込む
    ///
    /// 検証は行いません（CLIフラグで上書きした後に `Config::validate` を呼びます）。
    pub fn from_file(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// YAML文字列から設定を読み込む
    pub fn from_yaml(content: &str) -> Result<Config> {
        if content.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_saphyr::from_str(content).with_context(|| "Invalid config YAML")
    }
}
