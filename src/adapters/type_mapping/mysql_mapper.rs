// MySQL用型マッパー

use super::{NativeTypeSpec, TypeMapper};
use crate::core::config::Dialect;
use crate::core::schema::NormalizedType;
use crate::core::schema::NormalizedType::*;

/// MySQLの基本型名 → 正規化型
///
/// TINYINT(1) も int32 のまま扱います（BOOL/BOOLEAN と書かれた場合のみ bool）。
/// SERIAL はカタログ上 `bigint unsigned` として現れるため表に含めません。
const MYSQL_TYPES: &[(&str, NormalizedType)] = &[
    // 整数
    ("TINYINT", Int32),
    ("SMALLINT", Int32),
    ("MEDIUMINT", Int32),
    ("INT", Int32),
    ("INTEGER", Int32),
    ("BIGINT", Int64),
    ("YEAR", Int32),
    // 浮動小数点
    ("FLOAT", Float),
    ("DOUBLE", Double),
    ("DOUBLE PRECISION", Double),
    ("REAL", Double),
    // 固定小数点は精度を失わないよう文字列
    ("DECIMAL", String),
    ("DEC", String),
    ("NUMERIC", String),
    ("FIXED", String),
    // 文字列
    ("CHAR", String),
    ("VARCHAR", String),
    ("NCHAR", String),
    ("NVARCHAR", String),
    ("NATIONAL CHAR", String),
    ("NATIONAL VARCHAR", String),
    ("TINYTEXT", String),
    ("TEXT", String),
    ("MEDIUMTEXT", String),
    ("LONGTEXT", String),
    ("ENUM", String),
    ("SET", String),
    ("JSON", String),
    // バイナリ
    ("BINARY", Bytes),
    ("VARBINARY", Bytes),
    ("TINYBLOB", Bytes),
    ("BLOB", Bytes),
    ("MEDIUMBLOB", Bytes),
    ("LONGBLOB", Bytes),
    ("BIT", Bytes),
    // 日付・時刻
    ("DATE", String),
    ("TIME", String),
    ("DATETIME", String),
    ("TIMESTAMP", String),
    // 真偽値
    ("BOOLEAN", Bool),
    ("BOOL", Bool),
];

/// 単精度として扱えるFLOATの最大精度
///
/// FLOAT(p) は p が 0〜23 なら4バイト、24〜53 なら8バイトの列になります。
const MAX_SINGLE_PRECISION: u32 = 23;

/// MySQL用型マッパー
pub struct MySqlTypeMapper;

impl TypeMapper for MySqlTypeMapper {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    fn table(&self) -> &'static [(&'static str, NormalizedType)] {
        MYSQL_TYPES
    }

    fn refine(&self, spec: &NativeTypeSpec, normalized: NormalizedType) -> NormalizedType {
        if spec.unsigned {
            return normalized.to_unsigned();
        }

        // FLOAT(M,D) の M は表示桁数なので、単一パラメータの場合のみ精度として扱う
        if normalized == Float && spec.params.len() == 1 {
            if let Some(precision) = spec.precision() {
                if precision > MAX_SINGLE_PRECISION {
                    return Double;
                }
            }
        }

        normalized
    }
}
