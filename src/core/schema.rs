// スキーマドメインモデル
//
// ライブDBまたはDDLテキストから抽出した、方言非依存のスキーマ表現。
// SchemaSnapshot, TableDescriptor, ColumnDescriptor などの構造体を提供します。

use crate::core::config::Dialect;
use crate::core::error::Diagnostic;
use serde::Serialize;
use std::collections::HashSet;

/// 正規化済み型
///
/// すべてのネイティブ型はこの固定集合のいずれかに変換されます。
/// 日時・DECIMAL・JSON・UUID などは `String` に集約されます。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NormalizedType {
    Int32,
    Int64,
    Uint32,
    Uint64,
    Float,
    Double,
    String,
    Bytes,
    Bool,
}

impl NormalizedType {
    /// マッピング表に存在しない型のフォールバック先
    pub const FALLBACK: NormalizedType = NormalizedType::String;

    /// 型名を文字列として取得
    pub fn as_str(&self) -> &'static str {
        match self {
            NormalizedType::Int32 => "int32",
            NormalizedType::Int64 => "int64",
            NormalizedType::Uint32 => "uint32",
            NormalizedType::Uint64 => "uint64",
            NormalizedType::Float => "float",
            NormalizedType::Double => "double",
            NormalizedType::String => "string",
            NormalizedType::Bytes => "bytes",
            NormalizedType::Bool => "bool",
        }
    }

    /// 整数型かどうか
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            NormalizedType::Int32
                | NormalizedType::Int64
                | NormalizedType::Uint32
                | NormalizedType::Uint64
        )
    }

    /// 符号なし整数に拡張
    ///
    /// 64ビット整数は uint64、それ以外の整数は uint32 になります。
    /// 整数以外の型はそのまま返します。
    pub fn to_unsigned(self) -> NormalizedType {
        match self {
            NormalizedType::Int64 | NormalizedType::Uint64 => NormalizedType::Uint64,
            NormalizedType::Int32 | NormalizedType::Uint32 => NormalizedType::Uint32,
            other => other,
        }
    }
}

impl std::fmt::Display for NormalizedType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 1回のインスペクション結果
///
/// 呼び出しごとに新規作成され、キャッシュされません。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SchemaSnapshot {
    /// ソースの方言
    pub dialect: Dialect,

    /// スキーマ名（DDLテキストの場合は None）
    pub schema_name: Option<String>,

    /// テーブル定義（ソース順）
    pub tables: Vec<TableDescriptor>,

    /// 致命的でない診断情報
    pub diagnostics: Vec<Diagnostic>,
}

impl SchemaSnapshot {
    /// 空のスナップショットを作成
    pub fn new(dialect: Dialect, schema_name: Option<String>) -> Self {
        Self {
            dialect,
            schema_name,
            tables: Vec::new(),
            diagnostics: Vec::new(),
        }
    }

    /// テーブルを追加
    ///
    /// 同名のテーブルが既に存在する場合は、その位置で置き換えます。
    /// 置き換えが発生した場合は true を返します。
    pub fn upsert_table(&mut self, table: TableDescriptor) -> bool {
        match self.tables.iter_mut().find(|t| t.name == table.name) {
            Some(existing) => {
                *existing = table;
                true
            }
            None => {
                self.tables.push(table);
                false
            }
        }
    }

    /// 指定されたテーブルを取得
    pub fn get_table(&self, table_name: &str) -> Option<&TableDescriptor> {
        self.tables.iter().find(|t| t.name == table_name)
    }

    /// テーブル名の一覧を取得
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.name.as_str()).collect()
    }
}

/// テーブル定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableDescriptor {
    /// テーブル名
    pub name: String,

    /// テーブルコメント
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// 文字セット
    #[serde(skip_serializing_if = "Option::is_none")]
    pub charset: Option<String>,

    /// 照合順序
    #[serde(skip_serializing_if = "Option::is_none")]
    pub collation: Option<String>,

    /// カラム定義（序数位置順）
    pub columns: Vec<ColumnDescriptor>,

    /// プライマリキーのカラム名（キー順）
    pub primary_key_columns: Vec<String>,

    /// インデックス定義（プライマリキーを除く）
    pub indexes: Vec<IndexDescriptor>,

    /// 外部キー定義
    pub foreign_keys: Vec<ForeignKeyDescriptor>,
}

impl TableDescriptor {
    /// 新しいテーブルを作成
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            charset: None,
            collation: None,
            columns: Vec::new(),
            primary_key_columns: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
        }
    }

    /// 指定されたカラムを取得
    pub fn get_column(&self, column_name: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.name == column_name)
    }

    /// カラム名を大文字小文字を無視して解決
    ///
    /// 定義上の正確なカラム名を返します。
    pub fn resolve_column_name(&self, column_name: &str) -> Option<&str> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(column_name))
            .map(|c| c.name.as_str())
    }

    /// プライマリキーを設定
    ///
    /// 対象カラムの `is_primary_key` を立て、NOT NULL にします。
    /// 既にプライマリキーに含まれるカラムは重複登録しません。
    pub fn mark_primary_key(&mut self, column_name: &str) {
        if !self.primary_key_columns.iter().any(|c| c == column_name) {
            self.primary_key_columns.push(column_name.to_string());
        }
        if let Some(column) = self.columns.iter_mut().find(|c| c.name == column_name) {
            column.is_primary_key = true;
            column.nullable = false;
        }
    }

    /// 多対多の中間テーブルかどうか
    ///
    /// 2カラムの複合プライマリキーを持ち、外部キーがちょうど2つで、
    /// それぞれが単一カラムかつ両者のカラムがプライマリキーと一致する場合に true。
    /// あくまでヒューリスティックであり、別の理由で2カラムPKを持つテーブルも該当します。
    pub fn is_join_table(&self) -> bool {
        if self.primary_key_columns.len() != 2 || self.foreign_keys.len() != 2 {
            return false;
        }
        if self.foreign_keys.iter().any(|fk| fk.columns.len() != 1) {
            return false;
        }

        let pk: HashSet<&str> = self.primary_key_columns.iter().map(String::as_str).collect();
        let fk: HashSet<&str> = self
            .foreign_keys
            .iter()
            .map(|fk| fk.columns[0].as_str())
            .collect();

        pk.len() == 2 && pk == fk
    }
}

/// カラム定義
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnDescriptor {
    /// カラム名
    pub name: String,

    /// ソース上の型表記（例: "VARCHAR(100)", "int(10) unsigned"）
    pub native_type: String,

    /// 正規化済み型
    pub normalized_type: NormalizedType,

    /// NULL許可
    pub nullable: bool,

    /// デフォルト値（式の表記そのまま、文字列リテラルはクォートを外した値）
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,

    /// カラムコメント
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,

    /// プライマリキーに含まれるかどうか
    pub is_primary_key: bool,

    /// 自動採番（AUTO_INCREMENT / IDENTITY / serial）
    pub auto_increment: bool,
}

impl ColumnDescriptor {
    /// 新しいカラムを作成
    ///
    /// NULL許可がデフォルトです。
    pub fn new(
        name: impl Into<String>,
        native_type: impl Into<String>,
        normalized_type: NormalizedType,
    ) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            normalized_type,
            nullable: true,
            default_value: None,
            comment: None,
            is_primary_key: false,
            auto_increment: false,
        }
    }
}

/// インデックス定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexDescriptor {
    /// インデックス名
    pub name: String,

    /// 対象カラム（キー順）
    pub columns: Vec<String>,

    /// ユニーク制約かどうか
    pub unique: bool,
}

impl IndexDescriptor {
    pub fn new(name: impl Into<String>, columns: Vec<String>, unique: bool) -> Self {
        Self {
            name: name.into(),
            columns,
            unique,
        }
    }
}

/// 外部キー定義
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForeignKeyDescriptor {
    /// 制約名（無名の場合は生成名）
    pub name: String,

    /// 外部キーを持つテーブル
    pub owner_table: String,

    /// 参照元カラム（キー順）
    pub columns: Vec<String>,

    /// 参照先テーブル
    pub referenced_table: String,

    /// 参照先カラム（キー順、省略時は空）
    pub referenced_columns: Vec<String>,
}
