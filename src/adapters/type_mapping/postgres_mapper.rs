// PostgreSQL用型マッパー

use super::{NativeTypeSpec, TypeMapper};
use crate::core::config::Dialect;
use crate::core::schema::NormalizedType;
use crate::core::schema::NormalizedType::*;

/// PostgreSQLの基本型名 → 正規化型
///
/// `format_type()` が返す長い表記（character varying 等）と、
/// DDLで使われる短い別名（int4, timestamptz 等）の両方を含みます。
const POSTGRES_TYPES: &[(&str, NormalizedType)] = &[
    // 整数
    ("SMALLINT", Int32),
    ("INT2", Int32),
    ("INTEGER", Int32),
    ("INT", Int32),
    ("INT4", Int32),
    ("BIGINT", Int64),
    ("INT8", Int64),
    ("SMALLSERIAL", Int32),
    ("SERIAL2", Int32),
    ("SERIAL", Int32),
    ("SERIAL4", Int32),
    ("BIGSERIAL", Int64),
    ("SERIAL8", Int64),
    ("OID", Uint32),
    // 浮動小数点
    ("REAL", Float),
    ("FLOAT4", Float),
    ("DOUBLE PRECISION", Double),
    ("FLOAT8", Double),
    ("FLOAT", Double),
    ("NUMERIC", String),
    ("DECIMAL", String),
    ("MONEY", String),
    // 文字列
    ("CHAR", String),
    ("CHARACTER", String),
    ("VARCHAR", String),
    ("CHARACTER VARYING", String),
    ("BPCHAR", String),
    ("TEXT", String),
    ("CITEXT", String),
    ("NAME", String),
    ("XML", String),
    ("TSVECTOR", String),
    ("TSQUERY", String),
    // バイナリ
    ("BYTEA", Bytes),
    ("BIT", String),
    ("BIT VARYING", String),
    ("VARBIT", String),
    // 日付・時刻
    ("DATE", String),
    ("TIME", String),
    ("TIME WITHOUT TIME ZONE", String),
    ("TIME WITH TIME ZONE", String),
    ("TIMETZ", String),
    ("TIMESTAMP", String),
    ("TIMESTAMP WITHOUT TIME ZONE", String),
    ("TIMESTAMP WITH TIME ZONE", String),
    ("TIMESTAMPTZ", String),
    ("INTERVAL", String),
    // 真偽値
    ("BOOLEAN", Bool),
    ("BOOL", Bool),
    // ネットワークアドレス
    ("CIDR", String),
    ("INET", String),
    ("MACADDR", String),
    ("MACADDR8", String),
    // JSON / UUID
    ("JSON", String),
    ("JSONB", String),
    ("UUID", String),
];

/// FLOAT(p) を単精度として扱う最大精度
const MAX_SINGLE_PRECISION: u32 = 24;

/// PostgreSQL用型マッパー
pub struct PostgresTypeMapper;

impl TypeMapper for PostgresTypeMapper {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    fn table(&self) -> &'static [(&'static str, NormalizedType)] {
        POSTGRES_TYPES
    }

    fn refine(&self, spec: &NativeTypeSpec, normalized: NormalizedType) -> NormalizedType {
        if spec.base == "FLOAT" {
            if let Some(precision) = spec.precision() {
                if precision <= MAX_SINGLE_PRECISION {
                    return Float;
                }
            }
        }

        if spec.unsigned {
            normalized.to_unsigned()
        } else {
            normalized
        }
    }
}
