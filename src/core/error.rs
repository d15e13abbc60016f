// エラー型定義
//
// インスペクション全体で使用されるエラー型と、致命的でない診断情報を提供します。
// thiserrorを使用して、InspectError と ConfigError を定義します。

use crate::core::config::Dialect;
use serde::Serialize;
use thiserror::Error;

/// インスペクションエラー
///
/// ソースの解決、ライブDBの読み取り、DDLテキストの解析で発生する致命的なエラー。
/// いずれも方言・ソース・位置などの文脈を保持したまま呼び出し元へ返します。
#[derive(Debug, Error)]
pub enum InspectError {
    /// Unrecognized scheme in a source locator
    #[error("Unsupported dialect '{scheme}' in source locator: {locator}")]
    UnsupportedDialect {
        /// スキーム（`://` の前の部分、存在しない場合は空文字）
        scheme: String,
        /// 秘匿化済みのロケーター
        locator: String,
    },

    /// Locator has a known scheme but cannot be used
    #[error("Invalid {dialect} source locator: {reason}")]
    InvalidLocator {
        /// 対象のデータベース方言
        dialect: Dialect,
        /// 不正な理由
        reason: String,
    },

    /// Connection, authentication or catalog query failure
    #[error("Inspection failed ({dialect}) during {stage}: {cause}")]
    InspectionFailed {
        /// 対象のデータベース方言
        dialect: Dialect,
        /// 失敗した処理段階（connect, tables, columns など）
        stage: String,
        /// エラー原因
        cause: String,
    },

    /// Deadline expired while waiting on the database
    #[error("Inspection deadline exceeded ({dialect}) during {stage}")]
    DeadlineExceeded {
        /// 対象のデータベース方言
        dialect: Dialect,
        /// タイムアウトした処理段階
        stage: String,
    },

    /// DDL text could not be parsed
    #[error(
        "DDL syntax error in statement {statement_index} at line {line}, column {column} near '{near}': {message}"
    )]
    DdlSyntax {
        /// ステートメント番号（1始まり）
        statement_index: usize,
        /// 入力全体での行番号（1始まり）
        line: usize,
        /// 行内の桁番号（1始まり）
        column: usize,
        /// エラー位置のトークン
        near: String,
        /// エラーメッセージ
        message: String,
    },

    /// Literal DDL source contained no statements
    #[error("No content to parse: {source_desc}")]
    EmptyInput {
        /// 入力の説明（ファイルパスまたは "inline text"）
        source_desc: String,
    },

    /// DDL file could not be read
    #[error("Failed to read DDL source: {path} (cause: {cause})")]
    SourceRead {
        /// ファイルパス
        path: String,
        /// エラー原因
        cause: String,
    },
}

impl InspectError {
    /// 未対応方言エラーかどうか
    pub fn is_unsupported_dialect(&self) -> bool {
        matches!(self, InspectError::UnsupportedDialect { .. })
    }

    /// 不正ロケーターエラーかどうか
    pub fn is_invalid_locator(&self) -> bool {
        matches!(self, InspectError::InvalidLocator { .. })
    }

    /// インスペクション失敗エラーかどうか
    pub fn is_inspection_failed(&self) -> bool {
        matches!(self, InspectError::InspectionFailed { .. })
    }

    /// タイムアウトエラーかどうか
    pub fn is_deadline_exceeded(&self) -> bool {
        matches!(self, InspectError::DeadlineExceeded { .. })
    }

    /// DDL構文エラーかどうか
    pub fn is_ddl_syntax(&self) -> bool {
        matches!(self, InspectError::DdlSyntax { .. })
    }

    /// 空入力エラーかどうか
    pub fn is_empty_input(&self) -> bool {
        matches!(self, InspectError::EmptyInput { .. })
    }

    /// エラーに関係する方言を取得
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            InspectError::InvalidLocator { dialect, .. }
            | InspectError::InspectionFailed { dialect, .. }
            | InspectError::DeadlineExceeded { dialect, .. } => Some(*dialect),
            InspectError::DdlSyntax { .. }
            | InspectError::EmptyInput { .. }
            | InspectError::SourceRead { .. } => Some(Dialect::LiteralDdl),
            InspectError::UnsupportedDialect { .. } => None,
        }
    }

    /// sqlxエラーからインスペクション失敗エラーを作成
    pub fn inspection_failed(dialect: Dialect, stage: &str, cause: impl std::fmt::Display) -> Self {
        InspectError::InspectionFailed {
            dialect,
            stage: stage.to_string(),
            cause: cause.to_string(),
        }
    }
}

/// 設定エラー
///
/// 設定ファイルの読み込み・検証時に発生するエラーを表現します。
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ソース未指定
    #[error("Source locator is not specified (set `source` in the config file or pass it on the command line)")]
    MissingSource,

    /// 不正な設定値
    #[error("Invalid config value for '{field}': {reason}")]
    InvalidValue {
        /// 設定項目名
        field: String,
        /// 不正な理由
        reason: String,
    },
}

/// 診断情報の種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// 型マッピング表に存在しない型（デフォルト型にフォールバック）
    UnmappedType,
    /// カタログ結果セットの読み取りに失敗した行（スキップ）
    MalformedRow,
    /// 制約が参照するカラムが見つからない
    UnresolvedColumn,
    /// 解析対象外として無視したステートメント
    IgnoredStatement,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DiagnosticKind::UnmappedType => write!(f, "unmapped type"),
            DiagnosticKind::MalformedRow => write!(f, "malformed row"),
            DiagnosticKind::UnresolvedColumn => write!(f, "unresolved column"),
            DiagnosticKind::IgnoredStatement => write!(f, "ignored statement"),
        }
    }
}

/// 診断情報
///
/// エラーではないが、生成結果に影響しうる事項を表します。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Diagnostic {
    /// 診断の種類
    pub kind: DiagnosticKind,
    /// メッセージ
    pub message: String,
    /// 関連するテーブル名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
    /// 関連するカラム名
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
}

impl Diagnostic {
    /// 新しい診断情報を作成
    pub fn new(kind: DiagnosticKind, message: String) -> Self {
        Self {
            kind,
            message,
            table: None,
            column: None,
        }
    }

    /// テーブル名を設定
    pub fn with_table(mut self, table: &str) -> Self {
        self.table = Some(table.to_string());
        self
    }

    /// カラム名を設定
    pub fn with_column(mut self, column: &str) -> Self {
        self.column = Some(column.to_string());
        self
    }

    /// 型フォールバックの診断を作成
    pub fn unmapped_type(table: &str, column: &str, native_type: &str, fallback: &str) -> Self {
        Self::new(
            DiagnosticKind::UnmappedType,
            format!(
                "native type '{}' is not mapped, falling back to '{}'",
                native_type, fallback
            ),
        )
        .with_table(table)
        .with_column(column)
    }

    /// 不正行の診断を作成
    pub fn malformed_row(table: Option<&str>, stage: &str, cause: impl std::fmt::Display) -> Self {
        let diagnostic = Self::new(
            DiagnosticKind::MalformedRow,
            format!("skipped unreadable {} row: {}", stage, cause),
        );
        match table {
            Some(table) => diagnostic.with_table(table),
            None => diagnostic,
        }
    }

    /// 診断を1行にフォーマット
    pub fn format(&self) -> String {
        let mut location = Vec::new();
        if let Some(table) = &self.table {
            location.push(format!("table: {}", table));
        }
        if let Some(column) = &self.column {
            location.push(format!("column: {}", column));
        }

        if location.is_empty() {
            format!("{}: {}", self.kind, self.message)
        } else {
            format!("{}: {} ({})", self.kind, self.message, location.join(", "))
        }
    }
}
