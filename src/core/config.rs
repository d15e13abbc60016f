// 設定管理
//
// 方言（Dialect）の定義と、インスペクション実行時の設定（YAML形式）を扱います。
// ファイルI/Oは services::config_loader に集約し、ここでは純粋な型と検証のみを提供します。

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// データベース方言
///
/// どのインスペクターと型マッピング表を使うかを決定します。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dialect {
    #[serde(rename = "mysql")]
    MySQL,
    #[serde(rename = "postgresql")]
    PostgreSQL,
    #[serde(rename = "sqlite")]
    SQLite,
    /// 生のDDLテキスト（接続なし）
    #[serde(rename = "text")]
    LiteralDdl,
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dialect::MySQL => write!(f, "mysql"),
            Dialect::PostgreSQL => write!(f, "postgresql"),
            Dialect::SQLite => write!(f, "sqlite"),
            Dialect::LiteralDdl => write!(f, "text"),
        }
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mysql" => Ok(Dialect::MySQL),
            "postgres" | "postgresql" => Ok(Dialect::PostgreSQL),
            "sqlite" => Ok(Dialect::SQLite),
            "text" | "file" | "ddl" => Ok(Dialect::LiteralDdl),
            other => Err(format!("Unknown dialect: {}", other)),
        }
    }
}

impl Dialect {
    /// ライブ接続を必要とする方言かどうか
    pub fn is_live(&self) -> bool {
        !matches!(self, Dialect::LiteralDdl)
    }

    /// 方言のデフォルトスキーマ名
    ///
    /// - MySQL: なし（DSNのデータベース名が必須）
    /// - PostgreSQL: public
    /// - SQLite: main
    pub fn default_schema(&self) -> Option<&'static str> {
        match self {
            Dialect::MySQL => None,
            Dialect::PostgreSQL => Some("public"),
            Dialect::SQLite => Some("main"),
            Dialect::LiteralDdl => None,
        }
    }
}

/// 接続プール設定
///
/// ライブインスペクション時に作成する接続プールのパラメータ。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// 最大コネクション数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// 最小コネクション数
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_connections: Option<u32>,

    /// 接続取得タイムアウト（秒）
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout: u64,

    /// アイドルタイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub idle_timeout: Option<u64>,
}

fn default_max_connections() -> u32 {
    2
}

fn default_acquire_timeout() -> u64 {
    30
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            max_connections: default_max_connections(),
            min_connections: None,
            acquire_timeout: default_acquire_timeout(),
            idle_timeout: None,
        }
    }
}

impl ConnectionSettings {
    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connection.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        if let Some(min) = self.min_connections {
            if min > self.max_connections {
                return Err(ConfigError::InvalidValue {
                    field: "connection.min_connections".to_string(),
                    reason: format!(
                        "must not exceed max_connections ({})",
                        self.max_connections
                    ),
                });
            }
        }

        Ok(())
    }
}

/// インスペクション設定
///
/// `.schemalens.yaml` の内容。CLIフラグが指定された場合はそちらが優先されます。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// ソースロケーター（DSN、DDLテキスト、またはDDLファイルパス）
    #[serde(default)]
    pub source: String,

    /// 対象テーブル（空の場合は全テーブル）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tables: Vec<String>,

    /// 除外テーブル
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_tables: Vec<String>,

    /// 中間テーブル（多対多の結合テーブル）を出力に残すかどうか
    #[serde(default)]
    pub keep_join_tables: bool,

    /// インスペクション全体のタイムアウト（秒）
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// 接続プール設定
    #[serde(default)]
    pub connection: ConnectionSettings,
}

impl Config {
    /// デフォルトの設定ファイルパス
    pub const DEFAULT_CONFIG_PATH: &'static str = ".schemalens.yaml";

    /// タイムアウトをDurationとして取得
    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout.map(Duration::from_secs)
    }

    /// 設定の妥当性を検証
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.source.trim().is_empty() {
            return Err(ConfigError::MissingSource);
        }

        if self.timeout == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "timeout".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        self.connection.validate()
    }
}
