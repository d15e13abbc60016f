// DDLテキストパーサー
//
// セミコロン区切りの CREATE TABLE スクリプトを、データベースに接続せずに
// SchemaSnapshot に変換します。
// 解析は呼び出し単位で全か無かです。いずれかのステートメントで構文エラーが
// 発生した場合、それ以前のステートメントの結果も破棄してエラーを返します。

pub mod ast;
mod builder;
mod parser;

pub use parser::ParseError;

use crate::core::config::Dialect;
use crate::core::error::InspectError;
use crate::core::inspector::{InspectContext, SchemaInspector};
use crate::core::schema::SchemaSnapshot;
use crate::services::sql_splitter::{line_col, split_statements, StatementSpan};
use async_trait::async_trait;
use builder::SnapshotBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// インラインテキストを表すソース説明
pub const INLINE_SOURCE: &str = "inline text";

/// DDLテキストを解析
///
/// # Errors
///
/// - 空のステートメントしか含まない場合は `EmptyInput`
/// - 解析できないステートメントがある場合は `DdlSyntax`
pub fn parse_ddl(text: &str) -> Result<SchemaSnapshot, InspectError> {
    parse_ddl_source(text, INLINE_SOURCE)
}

/// ソース説明付きでDDLテキストを解析
pub fn parse_ddl_source(text: &str, source_desc: &str) -> Result<SchemaSnapshot, InspectError> {
    let spans = split_statements(text);
    if spans.is_empty() {
        return Err(InspectError::EmptyInput {
            source_desc: source_desc.to_string(),
        });
    }

    // すべてのステートメントを解析し終えてからスナップショットを組み立てる
    let mut statements = Vec::with_capacity(spans.len());
    for span in &spans {
        let statement =
            parser::parse_statement(text, span).map_err(|e| syntax_error(text, span, e))?;
        statements.push((span.index, statement));
    }

    let mut builder = SnapshotBuilder::new();
    for (index, statement) in statements {
        builder.apply(index, statement);
    }
    let snapshot = builder.finish();

    debug!(
        source = source_desc,
        statements = spans.len(),
        tables = snapshot.tables.len(),
        diagnostics = snapshot.diagnostics.len(),
        "Parsed DDL text"
    );

    Ok(snapshot)
}

fn syntax_error(text: &str, span: &StatementSpan<'_>, error: ParseError) -> InspectError {
    let (line, column) = line_col(text, error.offset);
    InspectError::DdlSyntax {
        statement_index: span.index,
        line,
        column,
        near: error.near,
        message: error.message,
    }
}

/// DDLの入力元
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DdlSource {
    /// 読み取り可能なファイルならパス、そうでなければDDLテキストそのもの
    Auto(String),
    /// ファイルパス（読み取れなければエラー）
    File(PathBuf),
}

impl DdlSource {
    /// 入力を読み込み、(DDLテキスト, ソース説明) を返す
    pub async fn load(&self) -> Result<(String, String), InspectError> {
        match self {
            DdlSource::Auto(value) => {
                if names_readable_file(value).await {
                    read_file(Path::new(value)).await
                } else {
                    Ok((value.clone(), INLINE_SOURCE.to_string()))
                }
            }
            DdlSource::File(path) => read_file(path).await,
        }
    }
}

/// 値が既存の通常ファイルを指しているかどうか
///
/// 改行を含む値はDDLテキストとみなします。
async fn names_readable_file(value: &str) -> bool {
    if value.is_empty() || value.contains('\n') {
        return false;
    }
    tokio::fs::metadata(value)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

async fn read_file(path: &Path) -> Result<(String, String), InspectError> {
    let display = path.display().to_string();
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| InspectError::SourceRead {
            path: display.clone(),
            cause: e.to_string(),
        })?;
    Ok((text, display))
}

/// DDLテキストインスペクター
///
/// 接続を持たないため、デッドラインは参照しません。
#[derive(Debug, Clone)]
pub struct DdlTextInspector {
    source: DdlSource,
}

impl DdlTextInspector {
    /// テキストまたはファイルパスから作成
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            source: DdlSource::Auto(value.into()),
        }
    }

    /// ファイルパスから作成
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            source: DdlSource::File(path.into()),
        }
    }

    pub fn source(&self) -> &DdlSource {
        &self.source
    }
}

#[async_trait]
impl SchemaInspector for DdlTextInspector {
    fn dialect(&self) -> Dialect {
        Dialect::LiteralDdl
    }

    fn schema_name(&self) -> Option<&str> {
        None
    }

    async fn inspect(
        &self,
        _ctx: &InspectContext,
        include_tables: &[String],
    ) -> Result<SchemaSnapshot, InspectError> {
        let (text, source_desc) = self.source.load().await?;
        let mut snapshot = parse_ddl_source(&text, &source_desc)?;

        if !include_tables.is_empty() {
            snapshot.tables.retain(|t| include_tables.contains(&t.name));
            snapshot.diagnostics.retain(|d| match &d.table {
                Some(table) => include_tables.contains(table),
                None => true,
            });
        }

        info!(
            dialect = %Dialect::LiteralDdl,
            source = %source_desc,
            tables = snapshot.tables.len(),
            "DDL inspection completed"
        );

        Ok(snapshot)
    }
}
