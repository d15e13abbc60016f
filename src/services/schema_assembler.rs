// スキーマアセンブラー
//
// スナップショットにテーブルフィルターを適用し、多対多の中間テーブルを除外して
// 下流のコード生成に渡すテーブル一覧を組み立てます。

use crate::core::config::{Config, Dialect};
use crate::core::error::Diagnostic;
use crate::core::schema::{SchemaSnapshot, TableDescriptor};
use serde::Serialize;
use tracing::debug;

/// テーブルフィルター
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableFilter {
    /// 対象テーブル（空の場合はすべて）
    pub include: Vec<String>,
    /// 除外テーブル（include より優先）
    pub exclude: Vec<String>,
    /// 中間テーブルを残すかどうか
    pub keep_join_tables: bool,
}

impl TableFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn exclude<I, S>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude = tables.into_iter().map(Into::into).collect();
        self
    }

    pub fn keep_join_tables(mut self, keep: bool) -> Self {
        self.keep_join_tables = keep;
        self
    }

    /// 設定ファイルの値からフィルターを作成
    pub fn from_config(config: &Config) -> Self {
        Self {
            include: config.tables.clone(),
            exclude: config.exclude_tables.clone(),
            keep_join_tables: config.keep_join_tables,
        }
    }

    /// テーブル名がフィルターを通過するかどうか
    pub fn admits(&self, table_name: &str) -> bool {
        if self.exclude.iter().any(|t| t == table_name) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|t| t == table_name)
    }
}

/// 組み立て済みのスキーマ
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssembledSchema {
    /// ソースの方言
    pub dialect: Dialect,
    /// スキーマ名（DDLテキストの場合は None）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema_name: Option<String>,
    /// テーブル一覧（ソースの順序を保持）
    pub tables: Vec<TableDescriptor>,
    /// 残ったテーブルに関する診断情報
    pub diagnostics: Vec<Diagnostic>,
}

impl AssembledSchema {
    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == table_name)
    }

    /// テーブル名の一覧を取得
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// スナップショットを組み立てる
///
/// 1. include / exclude でテーブルを絞り込む（exclude が優先）
/// 2. `keep_join_tables` が false なら中間テーブルを除外する
/// 3. 除外したテーブルの診断情報も取り除く
pub fn assemble(snapshot: SchemaSnapshot, filter: &TableFilter) -> AssembledSchema {
    let total = snapshot.tables.len();

    let mut dropped = Vec::new();
    let mut tables = Vec::with_capacity(total);
    for table in snapshot.tables {
        if !filter.admits(&table.name) {
            dropped.push(table.name);
            continue;
        }
        if !filter.keep_join_tables && table.is_join_table() {
            debug!(table = %table.name, "Dropped join table");
            dropped.push(table.name);
            continue;
        }
        tables.push(table);
    }

    let diagnostics: Vec<Diagnostic> = snapshot
        .diagnostics
        .into_iter()
        .filter(|d| match &d.table {
            Some(table) => !dropped.contains(table),
            None => true,
        })
        .collect();

    debug!(
        dialect = %snapshot.dialect,
        total = total,
        kept = tables.len(),
        dropped = dropped.len(),
        "Assembled schema"
    );

    AssembledSchema {
        dialect: snapshot.dialect,
        schema_name: snapshot.schema_name,
        tables,
        diagnostics,
    }
}
