// 型正規化サービス
//
// 方言ごとのネイティブ型表記を NormalizedType へ変換します。
// 変換表は方言ごとの静的データで、符号・精度による調整はその上に重ねるルールで行います。

mod mysql_mapper;
mod postgres_mapper;
mod sqlite_mapper;

pub use mysql_mapper::MySqlTypeMapper;
pub use postgres_mapper::PostgresTypeMapper;
pub use sqlite_mapper::SqliteTypeMapper;

use crate::core::config::Dialect;
use crate::core::error::Diagnostic;
use crate::core::schema::NormalizedType;
use tracing::debug;

/// 正規化済みの型表記
///
/// `int(10) unsigned zerofill` → base: "INT", unsigned: true, params: [10]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeTypeSpec {
    /// 括弧部分を除去し大文字化した基本型名（例: "DOUBLE PRECISION"）
    pub base: String,
    /// UNSIGNED 修飾の有無
    pub unsigned: bool,
    /// 最初の括弧内の数値パラメータ（長さ・精度・スケール）
    pub params: Vec<u32>,
    /// 配列型（PostgreSQLの `integer[]` など）
    pub is_array: bool,
}

impl NativeTypeSpec {
    /// ネイティブ型表記をパース
    pub fn parse(raw: &str) -> Self {
        let upper = raw.trim().to_uppercase();
        let (stripped, first_group) = strip_paren_groups(&upper);

        let mut text = stripped.trim().to_string();
        let mut is_array = false;
        while let Some(rest) = text.strip_suffix("[]") {
            text = rest.trim_end().to_string();
            is_array = true;
        }

        let mut unsigned = false;
        let mut words = Vec::new();
        for word in text.split_whitespace() {
            match word {
                "UNSIGNED" => unsigned = true,
                "SIGNED" | "ZEROFILL" => {}
                "ARRAY" => is_array = true,
                other => words.push(other),
            }
        }

        let params = first_group
            .map(|group| {
                group
                    .split(',')
                    .filter_map(|p| p.trim().parse::<u32>().ok())
                    .collect()
            })
            .unwrap_or_default();

        Self {
            base: words.join(" "),
            unsigned,
            params,
            is_array,
        }
    }

    /// 精度（最初のパラメータ）を取得
    pub fn precision(&self) -> Option<u32> {
        self.params.first().copied()
    }
}

/// 括弧グループをすべて除去し、最初のグループの中身を返す
///
/// ENUM('a)', 'b') のようにクォート内に括弧が含まれても壊れないよう、
/// シングルクォートの内側は括弧として数えません。
fn strip_paren_groups(input: &str) -> (String, Option<String>) {
    let mut output = String::with_capacity(input.len());
    let mut first_group: Option<String> = None;
    let mut current = String::new();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut groups_seen = 0usize;

    for ch in input.chars() {
        if depth == 0 {
            if ch == '(' {
                depth = 1;
                current.clear();
                output.push(' ');
            } else {
                output.push(ch);
            }
            continue;
        }

        match ch {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    if groups_seen == 0 {
                        first_group = Some(current.clone());
                    }
                    groups_seen += 1;
                    continue;
                }
            }
            _ => {}
        }
        current.push(ch);
    }

    (output, first_group)
}

/// 方言固有の型マッピング
///
/// 各方言は静的な変換表と、表引き後に適用する調整ルールを提供します。
pub trait TypeMapper: Send + Sync {
    /// 対象の方言
    fn dialect(&self) -> Dialect;

    /// 基本型名 → 正規化型 の変換表
    fn table(&self) -> &'static [(&'static str, NormalizedType)];

    /// 変換表を引く
    fn lookup(&self, base: &str) -> Option<NormalizedType> {
        self.table()
            .iter()
            .find(|(name, _)| *name == base)
            .map(|(_, normalized)| *normalized)
    }

    /// 表引き結果に符号・精度のルールを適用
    ///
    /// デフォルトでは UNSIGNED の整数を符号なし型に拡張します。
    fn refine(&self, spec: &NativeTypeSpec, normalized: NormalizedType) -> NormalizedType {
        if spec.unsigned {
            normalized.to_unsigned()
        } else {
            normalized
        }
    }

    /// 変換表に存在しない型の推定（SQLiteの型親和性など）
    fn infer(&self, _spec: &NativeTypeSpec) -> Option<NormalizedType> {
        None
    }

    /// 型表記を正規化
    fn map(&self, spec: &NativeTypeSpec) -> Option<NormalizedType> {
        if spec.is_array {
            return Some(NormalizedType::String);
        }
        self.lookup(&spec.base)
            .map(|normalized| self.refine(spec, normalized))
    }
}

/// 方言に対応するマッパーを取得
///
/// DDLテキストは単一の方言に属さないため None を返します。
pub fn mapper_for(dialect: Dialect) -> Option<&'static dyn TypeMapper> {
    match dialect {
        Dialect::MySQL => Some(&MySqlTypeMapper),
        Dialect::PostgreSQL => Some(&PostgresTypeMapper),
        Dialect::SQLite => Some(&SqliteTypeMapper),
        Dialect::LiteralDdl => None,
    }
}

/// DDLテキストで試行するマッパーの順序
const LITERAL_DDL_ORDER: [&dyn TypeMapper; 3] =
    [&MySqlTypeMapper, &PostgresTypeMapper, &SqliteTypeMapper];

/// DDLテキストでPostgreSQLの解釈を優先する型名
///
/// REAL は MySQL・SQLite では8バイト、PostgreSQL では4バイトの浮動小数点です。
/// ライブのPostgreSQLカタログと同じ結果になるよう、こちらを先に引きます。
const POSTGRES_FIRST_TYPES: &[&str] = &["REAL"];

/// DDLテキストの型表記を各方言の変換表で順に引く
fn map_literal(spec: &NativeTypeSpec) -> Option<NormalizedType> {
    if POSTGRES_FIRST_TYPES.contains(&spec.base.as_str()) {
        if let Some(normalized) = PostgresTypeMapper.map(spec) {
            return Some(normalized);
        }
    }
    LITERAL_DDL_ORDER
        .iter()
        .find_map(|mapper| mapper.map(spec))
}

/// ネイティブ型を正規化（未対応の型は None）
pub fn try_normalize(dialect: Dialect, native_type: &str) -> Option<NormalizedType> {
    let spec = NativeTypeSpec::parse(native_type);
    match mapper_for(dialect) {
        Some(mapper) => mapper.map(&spec).or_else(|| mapper.infer(&spec)),
        None => map_literal(&spec),
    }
}

/// ネイティブ型を正規化
///
/// 未対応の型は `NormalizedType::FALLBACK`（string）になります。
pub fn normalize(dialect: Dialect, native_type: &str) -> NormalizedType {
    try_normalize(dialect, native_type).unwrap_or(NormalizedType::FALLBACK)
}

/// カラムの型を正規化し、フォールバック時は診断情報を記録
pub fn normalize_column(
    dialect: Dialect,
    table: &str,
    column: &str,
    native_type: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizedType {
    match try_normalize(dialect, native_type) {
        Some(normalized) => normalized,
        None => {
            debug!(
                dialect = %dialect,
                table = table,
                column = column,
                native_type = native_type,
                "Unmapped native type, falling back to string"
            );
            diagnostics.push(Diagnostic::unmapped_type(
                table,
                column,
                native_type,
                NormalizedType::FALLBACK.as_str(),
            ));
            NormalizedType::FALLBACK
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::DiagnosticKind;

    #[test]
    fn test_spec_parse_strips_params_and_flags() {
        let spec = NativeTypeSpec::parse("int(10) unsigned zerofill");
        assert_eq!(spec.base, "INT");
        assert!(spec.unsigned);
        assert_eq!(spec.params, vec![10]);
        assert!(!spec.is_array);
    }

    #[test]
    fn test_spec_parse_multiword_with_inner_group() {
        let spec = NativeTypeSpec::parse("timestamp(6) with time zone");
        assert_eq!(spec.base, "TIMESTAMP WITH TIME ZONE");
        assert_eq!(spec.precision(), Some(6));
    }

    #[test]
    fn test_spec_parse_enum_with_parens_in_literals() {
        let spec = NativeTypeSpec::parse("enum('a)', 'b(')");
        assert_eq!(spec.base, "ENUM");
        assert!(spec.params.is_empty());
    }

    #[test]
    fn test_spec_parse_array() {
        let spec = NativeTypeSpec::parse("integer[]");
        assert_eq!(spec.base, "INTEGER");
        assert!(spec.is_array);
    }

    #[test]
    fn test_parameters_do_not_affect_result() {
        assert_eq!(
            normalize(Dialect::MySQL, "VARCHAR(10)"),
            normalize(Dialect::MySQL, "VARCHAR(255)")
        );
        assert_eq!(
            normalize(Dialect::MySQL, "INT(10) UNSIGNED"),
            normalize(Dialect::MySQL, "INT UNSIGNED")
        );
        assert_eq!(
            normalize(Dialect::LiteralDdl, "INT(10) UNSIGNED"),
            NormalizedType::Uint32
        );
    }

    #[test]
    fn test_literal_ddl_tries_each_dialect() {
        assert_eq!(normalize(Dialect::LiteralDdl, "INT"), NormalizedType::Int32);
        assert_eq!(normalize(Dialect::LiteralDdl, "bytea"), NormalizedType::Bytes);
        assert_eq!(normalize(Dialect::LiteralDdl, "BIGSERIAL"), NormalizedType::Int64);
        assert_eq!(normalize(Dialect::LiteralDdl, "SERIAL"), NormalizedType::Int32);
        assert_eq!(
            normalize(Dialect::LiteralDdl, "UNSIGNED BIG INT"),
            NormalizedType::Uint64
        );
    }

    #[test]
    fn test_literal_ddl_agrees_with_live_postgres() {
        for native in ["SERIAL", "smallserial", "REAL", "real"] {
            assert_eq!(
                normalize(Dialect::LiteralDdl, native),
                normalize(Dialect::PostgreSQL, native),
                "{}",
                native
            );
        }
        assert_eq!(normalize(Dialect::LiteralDdl, "REAL"), NormalizedType::Float);
        assert_eq!(normalize(Dialect::MySQL, "REAL"), NormalizedType::Double);
    }

    #[test]
    fn test_unmapped_type_falls_back_with_diagnostic() {
        let mut diagnostics = Vec::new();
        let normalized =
            normalize_column(Dialect::MySQL, "places", "shape", "GEOMETRY", &mut diagnostics);
        assert_eq!(normalized, NormalizedType::String);
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::UnmappedType);
        assert_eq!(diagnostics[0].column.as_deref(), Some("shape"));
    }

    #[test]
    fn test_mapped_type_records_no_diagnostic() {
        let mut diagnostics = Vec::new();
        normalize_column(Dialect::PostgreSQL, "t", "c", "text", &mut diagnostics);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_array_normalizes_to_string() {
        assert_eq!(
            normalize(Dialect::PostgreSQL, "integer[]"),
            NormalizedType::String
        );
    }
}
