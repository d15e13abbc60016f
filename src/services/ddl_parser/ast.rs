// DDL構文木
//
// パーサーが生成するステートメント単位の構文木。
// スキーマモデルへの変換（制約カラムの解決など）はビルダーが担当します。

/// スキーマ修飾可能なオブジェクト名（`schema.table` など）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectName {
    pub parts: Vec<String>,
}

impl ObjectName {
    /// 最後のセグメント（テーブル名そのもの）
    pub fn name(&self) -> &str {
        self.parts.last().map(String::as_str).unwrap_or("")
    }
}

/// ステートメント
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// カラム定義を持つ CREATE TABLE
    CreateTable(CreateTable),

    /// カラム定義を持たない CREATE TABLE（LIKE / AS / PARTITION OF）
    DerivedTable {
        /// テーブル名
        name: ObjectName,
        /// 派生元の形式（"LIKE" など）
        form: String,
    },

    /// 解析対象外のステートメント
    Ignored {
        /// 先頭のキーワード（"INSERT", "CREATE INDEX" など）
        keyword: String,
    },
}

/// CREATE TABLE ステートメント
#[derive(Debug, Clone, PartialEq)]
pub struct CreateTable {
    pub name: ObjectName,
    pub if_not_exists: bool,
    pub temporary: bool,
    pub elements: Vec<TableElement>,
    pub options: Vec<TableOption>,
}

/// テーブル要素（カラム定義またはテーブル制約）
#[derive(Debug, Clone, PartialEq)]
pub enum TableElement {
    Column(ColumnDef),
    Constraint(TableConstraint),
}

/// カラム定義
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// カラム名
    pub name: String,
    /// 型のソース表記（型を省略したSQLiteのカラムでは空文字）
    pub data_type: String,
    /// カラム制約（出現順）
    pub constraints: Vec<ColumnConstraint>,
}

/// DEFAULT 句の値
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DefaultValue {
    /// DEFAULT NULL
    Null,
    /// 文字列リテラル（クォートを外した値）
    Literal(String),
    /// その他の式（ソース表記そのまま）
    Expression(String),
}

/// REFERENCES 句
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyRef {
    pub table: ObjectName,
    pub columns: Vec<String>,
}

/// カラム制約
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnConstraint {
    NotNull,
    Null,
    Default(DefaultValue),
    Comment(String),
    PrimaryKey,
    Unique,
    AutoIncrement,
    /// GENERATED ALWAYS AS (...) / AS (...)
    Generated,
    References(ForeignKeyRef),
    Check,
    Collate(String),
    CharacterSet(String),
    OnUpdate(String),
}

/// インデックスの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Plain,
    Fulltext,
    Spatial,
}

/// テーブル制約
#[derive(Debug, Clone, PartialEq)]
pub enum TableConstraint {
    PrimaryKey {
        name: Option<String>,
        columns: Vec<String>,
    },
    ForeignKey {
        name: Option<String>,
        columns: Vec<String>,
        reference: ForeignKeyRef,
    },
    Unique {
        name: Option<String>,
        columns: Vec<String>,
    },
    Index {
        name: Option<String>,
        columns: Vec<String>,
        kind: IndexKind,
    },
    Check {
        name: Option<String>,
    },
    /// 解釈しない制約（EXCLUDE など）
    Other,
}

/// テーブルオプション（解釈するもののみ）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableOption {
    Comment(String),
    Charset(String),
    Collate(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_name_last_segment() {
        let name = ObjectName {
            parts: vec!["public".to_string(), "users".to_string()],
        };
        assert_eq!(name.name(), "users");
    }
}
