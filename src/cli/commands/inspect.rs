// inspectコマンドハンドラー
//
// スキーマソースの読み取り機能を実装します。
// - 設定ファイルとCLIフラグのマージ
// - ソースロケーターの解決とインスペクション
// - テーブル・カラム・インデックス・外部キーの表示

use crate::cli::command_context::CommandContext;
use crate::cli::commands::{render_output, CommandOutput};
use crate::cli::OutputFormat;
use crate::core::schema::TableDescriptor;
use crate::services::schema_assembler::{AssembledSchema, TableFilter};
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// inspectコマンドの出力構造体
#[derive(Debug, Clone, Serialize)]
pub struct InspectOutput {
    #[serde(flatten)]
    pub schema: AssembledSchema,
}

impl CommandOutput for InspectOutput {
    fn to_text(&self) -> String {
        let schema = &self.schema;
        let mut output = String::new();

        let header = match &schema.schema_name {
            Some(name) => format!("Schema: {} ({})", name, schema.dialect),
            None => format!("Schema ({})", schema.dialect),
        };
        output.push_str(&format!("{}\n", header.bold()));

        if schema.tables.is_empty() {
            output.push_str(&format!("\n{}\n", "No tables found.".yellow()));
        }

        for table in &schema.tables {
            output.push('\n');
            output.push_str(&format_table(table));
        }

        if !schema.diagnostics.is_empty() {
            output.push_str(&format!("\n{}\n", "Diagnostics:".yellow().bold()));
            for diagnostic in &schema.diagnostics {
                output.push_str(&format!("  - {}\n", diagnostic.format()));
            }
        }

        output.push_str(&format!(
            "\n{} table(s), {} diagnostic(s)",
            schema.tables.len(),
            schema.diagnostics.len()
        ));
        output
    }
}

/// テーブル1件分のテキストを作成
fn format_table(table: &TableDescriptor) -> String {
    let mut output = String::new();

    let title = match &table.comment {
        Some(comment) => format!("{} ({})", table.name.cyan().bold(), comment),
        None => table.name.cyan().bold().to_string(),
    };
    output.push_str(&format!("Table: {}\n", title));

    let name_width = table.columns.iter().map(|c| c.name.len()).max().unwrap_or(0);
    let native_width = table
        .columns
        .iter()
        .map(|c| c.native_type.len())
        .max()
        .unwrap_or(0);

    for column in &table.columns {
        let mut flags = vec![if column.nullable { "NULL" } else { "NOT NULL" }.to_string()];
        if column.is_primary_key {
            flags.push("PK".to_string());
        }
        if column.auto_increment {
            flags.push("AUTO".to_string());
        }
        if let Some(default) = &column.default_value {
            flags.push(format!("DEFAULT {}", default));
        }

        // 色付け前に桁揃えする
        let name = format!("{:<width$}", column.name, width = name_width);
        let native = format!("{:<width$}", column.native_type, width = native_width);
        let normalized = format!("{:<6}", column.normalized_type.as_str());
        output.push_str(&format!(
            "  {}  {}  {}  {}\n",
            name,
            native,
            normalized.green(),
            flags.join(" ")
        ));
    }

    if !table.primary_key_columns.is_empty() {
        output.push_str(&format!(
            "  Primary key: ({})\n",
            table.primary_key_columns.join(", ")
        ));
    }

    for index in &table.indexes {
        let kind = if index.unique { "Unique" } else { "Index" };
        output.push_str(&format!(
            "  {}: {} ({})\n",
            kind,
            index.name,
            index.columns.join(", ")
        ));
    }

    for fk in &table.foreign_keys {
        output.push_str(&format!(
            "  Foreign key: {} ({}) -> {}({})\n",
            fk.name,
            fk.columns.join(", "),
            fk.referenced_table,
            fk.referenced_columns.join(", ")
        ));
    }

    output
}

/// inspectコマンドの入力パラメータ
#[derive(Debug, Clone)]
pub struct InspectCommand {
    /// プロジェクトのルートパス
    pub project_path: PathBuf,
    /// カスタム設定ファイルパス
    pub config_path: Option<PathBuf>,
    /// ソースロケーター（設定ファイルより優先）
    pub source: Option<String>,
    /// 対象テーブル（空でなければ設定ファイルより優先）
    pub tables: Vec<String>,
    /// 除外テーブル（空でなければ設定ファイルより優先）
    pub exclude_tables: Vec<String>,
    /// 中間テーブルを残すかどうか
    pub keep_join_tables: bool,
    /// タイムアウト（秒）
    pub timeout: Option<u64>,
    /// 出力フォーマット
    pub format: OutputFormat,
}

/// inspectコマンドハンドラー
#[derive(Debug, Default)]
pub struct InspectCommandHandler {}

impl InspectCommandHandler {
    /// 新しいInspectCommandHandlerを作成
    pub fn new() -> Self {
        Self {}
    }

    /// inspectコマンドを実行
    ///
    /// # Arguments
    ///
    /// * `command` - inspectコマンドのパラメータ
    ///
    /// # Returns
    ///
    /// 成功時は組み立て済みスキーマの表示、失敗時はエラーメッセージ
    pub async fn execute(&self, command: &InspectCommand) -> Result<String> {
        let mut context = CommandContext::load_with_config(
            command.project_path.clone(),
            command.config_path.clone(),
        )?;
        self.apply_overrides(&mut context, command);
        context.validate()?;

        let filter = TableFilter::from_config(&context.config);
        let ctx = context.inspect_context();
        debug!(
            include = filter.include.len(),
            exclude = filter.exclude.len(),
            keep_join_tables = filter.keep_join_tables,
            timeout = ?context.config.timeout.map(Duration::from_secs),
            "Resolved inspect options"
        );

        let schema = context
            .engine()
            .load(&context.config.source, &filter, &ctx)
            .await
            .with_context(|| "Failed to inspect schema source")?;

        render_output(&InspectOutput { schema }, &command.format)
    }

    /// CLIフラグで設定を上書き
    fn apply_overrides(&self, context: &mut CommandContext, command: &InspectCommand) {
        let config = &mut context.config;
        if let Some(source) = &command.source {
            config.source = source.clone();
        }
        if !command.tables.is_empty() {
            config.tables = command.tables.clone();
        }
        if !command.exclude_tables.is_empty() {
            config.exclude_tables = command.exclude_tables.clone();
        }
        if command.keep_join_tables {
            config.keep_join_tables = true;
        }
        if command.timeout.is_some() {
            config.timeout = command.timeout;
        }
    }
}
