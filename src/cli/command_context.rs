// コマンド共通コンテキスト
//
// 設定ファイル読み込みやパス解決の重複をCLI層で集約する。

use crate::core::config::Config;
use crate::core::inspector::InspectContext;
use crate::services::config_loader::ConfigLoader;
use crate::services::schema_assembler::TableFilter;
use crate::services::schema_engine::SchemaEngine;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// CLIコマンド共通の実行コンテキスト
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub project_path: PathBuf,
    /// 読み込んだ設定ファイル（存在しない場合は None）
    pub config_path: Option<PathBuf>,
    pub config: Config,
}

impl CommandContext {
    /// 設定ファイルを読み込んでコンテキストを作成
    ///
    /// 明示されたパスは存在しなければエラー、デフォルトパスは存在しなければ空の設定になります。
    /// 相対パスはプロジェクトルートからの相対として解決します。
    pub fn load_with_config(project_path: PathBuf, config_path: Option<PathBuf>) -> Result<Self> {
        let (config_path, config) = match config_path {
            Some(path) => {
                let path = if path.is_absolute() {
                    path
                } else {
                    project_path.join(path)
                };
                let config = ConfigLoader::from_file(&path)?;
                (Some(path), config)
            }
            None => {
                let path = project_path.join(Config::DEFAULT_CONFIG_PATH);
                if path.is_file() {
                    let config = ConfigLoader::from_file(&path)?;
                    (Some(path), config)
                } else {
                    (None, Config::default())
                }
            }
        };

        Ok(Self {
            project_path,
            config_path,
            config,
        })
    }

    /// 設定を検証
    pub fn validate(&self) -> Result<()> {
        self.config
            .validate()
            .with_context(|| "Invalid configuration")
    }

    /// 設定の接続プール設定でエンジンを作成
    pub fn engine(&self) -> SchemaEngine {
        SchemaEngine::with_defaults(self.config.connection.clone())
    }

    /// 設定のタイムアウトからデッドラインを作成
    pub fn inspect_context(&self) -> InspectContext {
        self.config
            .timeout_duration()
            .map(InspectContext::with_timeout)
            .unwrap_or_default()
    }

    /// 設定のテーブル指定からフィルターを作成
    pub fn table_filter(&self) -> TableFilter {
        TableFilter::from_config(&self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_default_config_is_empty() {
        let dir = TempDir::new().unwrap();
        let context = CommandContext::load_with_config(dir.path().to_path_buf(), None).unwrap();
        assert!(context.config_path.is_none());
        assert_eq!(context.config, Config::default());
        assert!(context.validate().is_err());
    }

    #[test]
    fn test_default_config_is_loaded() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(Config::DEFAULT_CONFIG_PATH),
            "source: \"text://CREATE TABLE t (id INT)\"\ntimeout: 3\n",
        )
        .unwrap();

        let context = CommandContext::load_with_config(dir.path().to_path_buf(), None).unwrap();
        assert!(context.config_path.is_some());
        assert!(context.validate().is_ok());
        assert!(context.inspect_context().deadline().is_some());
    }

    #[test]
    fn test_explicit_relative_config_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("alt.yaml"), "exclude_tables: [logs]\n").unwrap();

        let context = CommandContext::load_with_config(
            dir.path().to_path_buf(),
            Some(PathBuf::from("alt.yaml")),
        )
        .unwrap();
        assert_eq!(context.table_filter().exclude, vec!["logs"]);
    }

    #[test]
    fn test_explicit_missing_config_is_error() {
        let dir = TempDir::new().unwrap();
        let result = CommandContext::load_with_config(
            dir.path().to_path_buf(),
            Some(PathBuf::from("missing.yaml")),
        );
        assert!(result.is_err());
    }
}
