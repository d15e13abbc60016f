// SQLite用型マッパー

use super::{NativeTypeSpec, TypeMapper};
use crate::core::config::Dialect;
use crate::core::schema::NormalizedType;
use crate::core::schema::NormalizedType::*;

/// SQLiteの基本型名 → 正規化型
///
/// SQLiteの INTEGER は64ビットのため int64 です。
const SQLITE_TYPES: &[(&str, NormalizedType)] = &[
    ("INTEGER", Int64),
    ("INT", Int64),
    ("TINYINT", Int64),
    ("SMALLINT", Int64),
    ("MEDIUMINT", Int64),
    ("BIGINT", Int64),
    ("BIG INT", Int64),
    ("INT2", Int64),
    ("INT8", Int64),
    ("REAL", Double),
    ("DOUBLE", Double),
    ("DOUBLE PRECISION", Double),
    ("FLOAT", Double),
    ("NUMERIC", String),
    ("DECIMAL", String),
    ("TEXT", String),
    ("CLOB", String),
    ("CHARACTER", String),
    ("VARCHAR", String),
    ("VARYING CHARACTER", String),
    ("NCHAR", String),
    ("NATIVE CHARACTER", String),
    ("NVARCHAR", String),
    ("BLOB", Bytes),
    ("BOOLEAN", Bool),
    ("DATE", String),
    ("DATETIME", String),
];

/// SQLite用型マッパー
pub struct SqliteTypeMapper;

impl TypeMapper for SqliteTypeMapper {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    fn table(&self) -> &'static [(&'static str, NormalizedType)] {
        SQLITE_TYPES
    }

    /// 型親和性の規則による推定
    ///
    /// ライブのSQLiteカタログでのみ使用し、DDLテキストの判定には使いません。
    fn infer(&self, spec: &NativeTypeSpec) -> Option<NormalizedType> {
        let base = spec.base.as_str();
        if base.is_empty() || base.contains("BLOB") {
            Some(Bytes)
        } else if base.contains("INT") {
            Some(Int64)
        } else if base.contains("CHAR") || base.contains("CLOB") || base.contains("TEXT") {
            Some(String)
        } else if base.contains("REAL") || base.contains("FLOA") || base.contains("DOUB") {
            Some(Double)
        } else {
            None
        }
    }
}
