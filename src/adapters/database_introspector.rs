// データベースイントロスペクター
//
// 稼働中のデータベースからスキーマ情報を取得するための抽象化レイヤー。
// 各方言固有の INFORMATION_SCHEMA / システムカタログ / PRAGMA クエリを実装します。
//
// 結果セットの各行は失敗しうる getter で読み取り、読めない行はスキップして
// 原因を CatalogRows::malformed に記録します（呼び出し元で診断情報に変換）。

use crate::core::config::Dialect;
use async_trait::async_trait;
use regex::Regex;
use sqlx::any::AnyRow;
use sqlx::{AnyPool, Row};
use std::sync::LazyLock;

/// `'literal'::type` 形式のデフォルト値（キャストは複数連なってもよい）
static CAST_LITERAL_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r#"^'((?:[^']|'')*)'(?:::[\w" .,()\[\]]+)*$"#).ok()
});

/// `NULL` または `NULL::type` 形式のデフォルト値
static CAST_NULL_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r#"^(?i)null(?:::[\w" .,()\[\]]+)*$"#).ok());

/// カタログクエリの結果
///
/// 読み取れた行と、スキップした行のエラー原因を保持します。
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogRows<T> {
    /// 読み取れた行
    pub items: Vec<T>,
    /// スキップした行のエラー原因
    pub malformed: Vec<String>,
}

impl<T> CatalogRows<T> {
    /// 行ごとにデコードし、失敗した行をスキップ
    pub(crate) fn decode<R, F>(rows: &[R], decode_row: F) -> Self
    where
        F: Fn(&R) -> Result<T, sqlx::Error>,
    {
        let mut items = Vec::with_capacity(rows.len());
        let mut malformed = Vec::new();
        for row in rows {
            match decode_row(row) {
                Ok(item) => items.push(item),
                Err(e) => malformed.push(e.to_string()),
            }
        }
        Self { items, malformed }
    }

    /// 読み取れた行を変換（スキップ情報は引き継ぐ）
    fn map_items<U, F>(self, f: F) -> CatalogRows<U>
    where
        F: FnOnce(Vec<T>) -> Vec<U>,
    {
        CatalogRows {
            items: f(self.items),
            malformed: self.malformed,
        }
    }
}

/// 生のテーブル情報
#[derive(Debug, Clone, PartialEq)]
pub struct RawTableInfo {
    /// テーブル名
    pub name: String,
    /// テーブルコメント
    pub comment: Option<String>,
    /// 文字セット
    pub charset: Option<String>,
    /// 照合順序
    pub collation: Option<String>,
}

/// 生のカラム情報（DB固有フォーマット）
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumnInfo {
    /// カラム名
    pub name: String,
    /// 型表記（MySQL: column_type、PostgreSQL: format_type、SQLite: 宣言型）
    pub column_type: String,
    /// NULL許可フラグ
    pub is_nullable: bool,
    /// デフォルト値
    pub default_value: Option<String>,
    /// カラムコメント
    pub comment: Option<String>,
    /// 自動採番フラグ
    pub auto_increment: bool,
}

/// 生のインデックス情報（プライマリキーを除く）
#[derive(Debug, Clone, PartialEq)]
pub struct RawIndexInfo {
    /// インデックス名
    pub name: String,
    /// インデックス対象のカラム（キー順）
    pub columns: Vec<String>,
    /// ユニーク制約フラグ
    pub unique: bool,
}

/// 生の外部キー情報
#[derive(Debug, Clone, PartialEq)]
pub struct RawForeignKeyInfo {
    /// 制約名
    pub name: String,
    /// 参照元カラム（キー順）
    pub columns: Vec<String>,
    /// 参照先テーブル
    pub referenced_table: String,
    /// 参照先カラム（キー順）
    pub referenced_columns: Vec<String>,
}

/// データベーススキーマ取得インターフェース
///
/// 各データベース方言固有のカタログクエリを抽象化します。
/// 接続プールの管理とタイムアウトは呼び出し元が行います。
#[async_trait]
pub trait DatabaseIntrospector: Send + Sync {
    /// 対象の方言
    fn dialect(&self) -> Dialect;

    /// テーブル一覧を取得（名前順）
    async fn get_tables(
        &self,
        pool: &AnyPool,
        schema: &str,
    ) -> Result<CatalogRows<RawTableInfo>, sqlx::Error>;

    /// カラム情報を取得（序数位置順）
    async fn get_columns(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawColumnInfo>, sqlx::Error>;

    /// プライマリキーのカラム名を取得（キー順）
    async fn get_primary_key(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<String>, sqlx::Error>;

    /// インデックス情報を取得
    async fn get_indexes(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawIndexInfo>, sqlx::Error>;

    /// 外部キー情報を取得
    async fn get_foreign_keys(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawForeignKeyInfo>, sqlx::Error>;
}

/// PostgreSQL用イントロスペクター
pub struct PostgresIntrospector;

/// MySQL用イントロスペクター
pub struct MySqlIntrospector;

/// SQLite用イントロスペクター
pub struct SqliteIntrospector;

/// 方言に応じたイントロスペクターを作成
///
/// DDLテキストはカタログを持たないため None を返します。
pub fn create_introspector(dialect: Dialect) -> Option<Box<dyn DatabaseIntrospector>> {
    match dialect {
        Dialect::PostgreSQL => Some(Box::new(PostgresIntrospector)),
        Dialect::MySQL => Some(Box::new(MySqlIntrospector)),
        Dialect::SQLite => Some(Box::new(SqliteIntrospector)),
        Dialect::LiteralDdl => None,
    }
}

/// キーの連続する行をまとめる（出現順を保持）
///
/// カタログクエリは `ORDER BY 名前, 序数` で並んでいる前提です。
fn group_ordered<K: PartialEq, V>(pairs: Vec<(K, V)>) -> Vec<(K, Vec<V>)> {
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();
    for (key, value) in pairs {
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => groups.push((key, vec![value])),
        }
    }
    groups
}

/// 空文字列を None に変換
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// `pg_get_expr` が返すデフォルト値を DDL と同じ表記に揃える
///
/// - `'active'::character varying` → `active`
/// - `NULL::text` → None
/// - `nextval('seq'::regclass)` や `now()` などの式はそのまま
fn postgres_default(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let text = raw.trim();

    if let Some(pattern) = CAST_NULL_PATTERN.as_ref() {
        if pattern.is_match(text) {
            return None;
        }
    }
    if let Some(captures) = CAST_LITERAL_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(text))
    {
        return Some(captures[1].replace("''", "'"));
    }
    Some(raw)
}

/// SQLite識別子のクォート
fn quote_sqlite_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

// =============================================================================
// PostgreSQL イントロスペクター実装
// =============================================================================

#[async_trait]
impl DatabaseIntrospector for PostgresIntrospector {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSQL
    }

    async fn get_tables(
        &self,
        pool: &AnyPool,
        schema: &str,
    ) -> Result<CatalogRows<RawTableInfo>, sqlx::Error> {
        // 文字セット・照合順序はデータベース単位の設定を使う
        let sql = r#"
            SELECT
                c.relname::text AS table_name,
                obj_description(c.oid, 'pg_class')::text AS table_comment,
                pg_encoding_to_char(d.encoding)::text AS charset,
                d.datcollate::text AS collation_name
            FROM pg_class c
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_database d ON d.datname = current_database()
            WHERE n.nspname = $1
                AND c.relkind IN ('r', 'p')
                AND NOT c.relispartition
            ORDER BY c.relname
        "#;

        let rows = sqlx::query(sql).bind(schema).fetch_all(pool).await?;
        Ok(CatalogRows::decode(&rows, |row| {
            Ok(RawTableInfo {
                name: row.try_get(0)?,
                comment: non_empty(row.try_get(1)?),
                charset: non_empty(row.try_get(2)?),
                collation: non_empty(row.try_get(3)?),
            })
        }))
    }

    async fn get_columns(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawColumnInfo>, sqlx::Error> {
        let sql = r#"
            SELECT
                a.attname::text AS column_name,
                format_type(a.atttypid, a.atttypmod)::text AS column_type,
                a.attnotnull AS not_null,
                pg_get_expr(ad.adbin, ad.adrelid)::text AS column_default,
                col_description(c.oid, a.attnum)::text AS column_comment,
                (a.attidentity <> ''
                    OR COALESCE(pg_get_expr(ad.adbin, ad.adrelid), '') LIKE 'nextval(%') AS auto_increment
            FROM pg_attribute a
            JOIN pg_class c ON c.oid = a.attrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            LEFT JOIN pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
            WHERE n.nspname = $1
                AND c.relname = $2
                AND a.attnum > 0
                AND NOT a.attisdropped
            ORDER BY a.attnum
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(CatalogRows::decode(&rows, |row| {
            let not_null: bool = row.try_get(2)?;
            Ok(RawColumnInfo {
                name: row.try_get(0)?,
                column_type: row.try_get(1)?,
                is_nullable: !not_null,
                default_value: postgres_default(row.try_get(3)?),
                comment: non_empty(row.try_get(4)?),
                auto_increment: row.try_get(5)?,
            })
        }))
    }

    async fn get_primary_key(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<String>, sqlx::Error> {
        let sql = r#"
            SELECT a.attname::text
            FROM pg_index i
            JOIN pg_class c ON c.oid = i.indrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = ANY(i.indkey)
            WHERE i.indisprimary
                AND n.nspname = $1
                AND c.relname = $2
            ORDER BY array_position(i.indkey::int2[], a.attnum)
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(CatalogRows::decode(&rows, |row| row.try_get(0)))
    }

    async fn get_indexes(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawIndexInfo>, sqlx::Error> {
        // 式インデックスの要素（attnum = 0）はカラムに結合できないため除外される
        let sql = r#"
            SELECT
                ic.relname::text AS index_name,
                a.attname::text AS column_name,
                i.indisunique AS is_unique
            FROM pg_index i
            JOIN pg_class c ON c.oid = i.indrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_class ic ON ic.oid = i.indexrelid
            JOIN LATERAL unnest(i.indkey::int2[]) WITH ORDINALITY AS k(attnum, ord) ON true
            JOIN pg_attribute a ON a.attrelid = c.oid AND a.attnum = k.attnum
            WHERE NOT i.indisprimary
                AND n.nspname = $1
                AND c.relname = $2
            ORDER BY ic.relname, k.ord
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        let decoded = CatalogRows::decode(&rows, |row| {
            let index_name: String = row.try_get(0)?;
            let column_name: String = row.try_get(1)?;
            let is_unique: bool = row.try_get(2)?;
            Ok(((index_name, is_unique), column_name))
        });

        Ok(decoded.map_items(|pairs| {
            group_ordered(pairs)
                .into_iter()
                .map(|((name, unique), columns)| RawIndexInfo {
                    name,
                    columns,
                    unique,
                })
                .collect()
        }))
    }

    async fn get_foreign_keys(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawForeignKeyInfo>, sqlx::Error> {
        // conkey と confkey を同じ序数で展開し、複合外部キーの対応を保つ
        let sql = r#"
            SELECT
                con.conname::text AS constraint_name,
                a.attname::text AS column_name,
                rc.relname::text AS referenced_table,
                ra.attname::text AS referenced_column
            FROM pg_constraint con
            JOIN pg_class c ON c.oid = con.conrelid
            JOIN pg_namespace n ON n.oid = c.relnamespace
            JOIN pg_class rc ON rc.oid = con.confrelid
            JOIN LATERAL unnest(con.conkey, con.confkey) WITH ORDINALITY AS k(attnum, refnum, ord) ON true
            JOIN pg_attribute a ON a.attrelid = con.conrelid AND a.attnum = k.attnum
            JOIN pg_attribute ra ON ra.attrelid = con.confrelid AND ra.attnum = k.refnum
            WHERE con.contype = 'f'
                AND n.nspname = $1
                AND c.relname = $2
            ORDER BY con.conname, k.ord
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(decode_foreign_key_rows(&rows))
    }
}

/// 外部キー行（制約名, カラム, 参照先テーブル, 参照先カラム）をデコードしてまとめる
fn decode_foreign_key_rows(rows: &[AnyRow]) -> CatalogRows<RawForeignKeyInfo> {
    let decoded = CatalogRows::decode(rows, |row| {
        let constraint_name: String = row.try_get(0)?;
        let column_name: String = row.try_get(1)?;
        let referenced_table: String = row.try_get(2)?;
        let referenced_column: String = row.try_get(3)?;
        Ok((
            (constraint_name, referenced_table),
            (column_name, referenced_column),
        ))
    });

    decoded.map_items(|pairs| {
        group_ordered(pairs)
            .into_iter()
            .map(|((name, referenced_table), parts)| {
                let (columns, referenced_columns) = parts.into_iter().unzip();
                RawForeignKeyInfo {
                    name,
                    columns,
                    referenced_table,
                    referenced_columns,
                }
            })
            .collect()
    })
}

// =============================================================================
// MySQL イントロスペクター実装
// =============================================================================
//
// information_schema の列はバージョンによってバイナリ文字列で返るため、
// 文字列は CHAR、数値は SIGNED にキャストして読み取ります。

#[async_trait]
impl DatabaseIntrospector for MySqlIntrospector {
    fn dialect(&self) -> Dialect {
        Dialect::MySQL
    }

    async fn get_tables(
        &self,
        pool: &AnyPool,
        schema: &str,
    ) -> Result<CatalogRows<RawTableInfo>, sqlx::Error> {
        let sql = r#"
            SELECT
                CAST(t.table_name AS CHAR) AS table_name,
                CAST(t.table_comment AS CHAR) AS table_comment,
                CAST(ccsa.character_set_name AS CHAR) AS charset,
                CAST(t.table_collation AS CHAR) AS collation_name
            FROM information_schema.tables t
            LEFT JOIN information_schema.collation_character_set_applicability ccsa
                ON ccsa.collation_name = t.table_collation
            WHERE t.table_schema = ?
                AND t.table_type = 'BASE TABLE'
            ORDER BY t.table_name
        "#;

        let rows = sqlx::query(sql).bind(schema).fetch_all(pool).await?;
        Ok(CatalogRows::decode(&rows, |row| {
            Ok(RawTableInfo {
                name: row.try_get(0)?,
                comment: non_empty(row.try_get(1)?),
                charset: non_empty(row.try_get(2)?),
                collation: non_empty(row.try_get(3)?),
            })
        }))
    }

    async fn get_columns(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawColumnInfo>, sqlx::Error> {
        let sql = r#"
            SELECT
                CAST(column_name AS CHAR) AS column_name,
                CAST(column_type AS CHAR) AS column_type,
                CAST(is_nullable AS CHAR) AS is_nullable,
                CAST(column_default AS CHAR) AS column_default,
                CAST(column_comment AS CHAR) AS column_comment,
                CAST(extra AS CHAR) AS extra
            FROM information_schema.columns
            WHERE table_schema = ? AND table_name = ?
            ORDER BY ordinal_position
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(CatalogRows::decode(&rows, |row| {
            let is_nullable: String = row.try_get(2)?;
            let extra: Option<String> = row.try_get(5)?;
            Ok(RawColumnInfo {
                name: row.try_get(0)?,
                column_type: row.try_get(1)?,
                is_nullable: is_nullable.eq_ignore_ascii_case("YES"),
                default_value: row.try_get(3)?,
                comment: non_empty(row.try_get(4)?),
                auto_increment: extra
                    .map(|e| e.to_lowercase().contains("auto_increment"))
                    .unwrap_or(false),
            })
        }))
    }

    async fn get_primary_key(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<String>, sqlx::Error> {
        let sql = r#"
            SELECT CAST(column_name AS CHAR)
            FROM information_schema.statistics
            WHERE table_schema = ? AND table_name = ?
                AND index_name = 'PRIMARY'
            ORDER BY seq_in_index
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(CatalogRows::decode(&rows, |row| row.try_get(0)))
    }

    async fn get_indexes(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawIndexInfo>, sqlx::Error> {
        // 関数インデックスの要素は column_name が NULL になる
        let sql = r#"
            SELECT
                CAST(index_name AS CHAR) AS index_name,
                CAST(column_name AS CHAR) AS column_name,
                CAST(non_unique AS SIGNED) AS non_unique
            FROM information_schema.statistics
            WHERE table_schema = ? AND table_name = ?
                AND index_name != 'PRIMARY'
            ORDER BY index_name, seq_in_index
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        let decoded = CatalogRows::decode(&rows, |row| {
            let index_name: String = row.try_get(0)?;
            let column_name: Option<String> = row.try_get(1)?;
            let non_unique: i64 = row.try_get(2)?;
            Ok(((index_name, non_unique == 0), column_name))
        });

        Ok(decoded.map_items(|pairs| {
            group_ordered(pairs)
                .into_iter()
                .map(|((name, unique), columns)| RawIndexInfo {
                    name,
                    columns: columns.into_iter().flatten().collect(),
                    unique,
                })
                .filter(|index| !index.columns.is_empty())
                .collect()
        }))
    }

    async fn get_foreign_keys(
        &self,
        pool: &AnyPool,
        schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawForeignKeyInfo>, sqlx::Error> {
        let sql = r#"
            SELECT
                CAST(constraint_name AS CHAR) AS constraint_name,
                CAST(column_name AS CHAR) AS column_name,
                CAST(referenced_table_name AS CHAR) AS referenced_table,
                CAST(referenced_column_name AS CHAR) AS referenced_column
            FROM information_schema.key_column_usage
            WHERE table_schema = ? AND table_name = ?
                AND referenced_table_name IS NOT NULL
            ORDER BY constraint_name, ordinal_position
        "#;

        let rows = sqlx::query(sql)
            .bind(schema)
            .bind(table_name)
            .fetch_all(pool)
            .await?;
        Ok(decode_foreign_key_rows(&rows))
    }
}

// =============================================================================
// SQLite イントロスペクター実装
// =============================================================================
//
// SQLiteは接続ごとに単一の main スキーマを持つため、schema 引数は使いません。

#[async_trait]
impl DatabaseIntrospector for SqliteIntrospector {
    fn dialect(&self) -> Dialect {
        Dialect::SQLite
    }

    async fn get_tables(
        &self,
        pool: &AnyPool,
        _schema: &str,
    ) -> Result<CatalogRows<RawTableInfo>, sqlx::Error> {
        let sql = r#"
            SELECT name
            FROM sqlite_master
            WHERE type = 'table'
                AND name NOT LIKE 'sqlite_%'
            ORDER BY name
        "#;

        let rows = sqlx::query(sql).fetch_all(pool).await?;
        Ok(CatalogRows::decode(&rows, |row| {
            Ok(RawTableInfo {
                name: row.try_get(0)?,
                comment: None,
                charset: None,
                collation: None,
            })
        }))
    }

    async fn get_columns(
        &self,
        pool: &AnyPool,
        _schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawColumnInfo>, sqlx::Error> {
        let sql = format!(
            "PRAGMA table_info({})",
            quote_sqlite_identifier(table_name)
        );
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        // cid, name, type, notnull, dflt_value, pk
        let decoded = CatalogRows::decode(&rows, |row| {
            let not_null: i64 = row.try_get(3)?;
            let pk: i64 = row.try_get(5)?;
            let column = RawColumnInfo {
                name: row.try_get(1)?,
                column_type: row.try_get(2)?,
                is_nullable: not_null == 0 && pk == 0,
                default_value: row.try_get(4)?,
                comment: None,
                auto_increment: false,
            };
            Ok((column, pk))
        });

        // 単一カラムの INTEGER PRIMARY KEY は rowid の別名（自動採番）
        let pk_count = decoded.items.iter().filter(|(_, pk)| *pk > 0).count();
        Ok(decoded.map_items(|items| {
            items
                .into_iter()
                .map(|(mut column, pk)| {
                    column.auto_increment = pk_count == 1
                        && pk > 0
                        && column.column_type.eq_ignore_ascii_case("INTEGER");
                    column
                })
                .collect()
        }))
    }

    async fn get_primary_key(
        &self,
        pool: &AnyPool,
        _schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<String>, sqlx::Error> {
        let sql = format!(
            "PRAGMA table_info({})",
            quote_sqlite_identifier(table_name)
        );
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        let decoded = CatalogRows::decode(&rows, |row| {
            let name: String = row.try_get(1)?;
            let pk: i64 = row.try_get(5)?;
            Ok((pk, name))
        });

        // pk はキー内の位置（1始まり）、0 はキー外
        Ok(decoded.map_items(|mut items| {
            items.retain(|(pk, _)| *pk > 0);
            items.sort_by_key(|(pk, _)| *pk);
            items.into_iter().map(|(_, name)| name).collect()
        }))
    }

    async fn get_indexes(
        &self,
        pool: &AnyPool,
        _schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawIndexInfo>, sqlx::Error> {
        let sql = format!(
            "PRAGMA index_list({})",
            quote_sqlite_identifier(table_name)
        );
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        // seq, name, unique, origin, partial
        let list = CatalogRows::decode(&rows, |row| {
            let name: String = row.try_get(1)?;
            let unique: i64 = row.try_get(2)?;
            Ok((name, unique == 1))
        });

        let mut malformed = list.malformed;
        let mut indexes = Vec::new();
        for (index_name, unique) in list.items {
            // 制約から自動生成されたシステムインデックスをスキップ
            if index_name.starts_with("sqlite_") {
                continue;
            }

            let info_sql = format!(
                "PRAGMA index_info({})",
                quote_sqlite_identifier(&index_name)
            );
            let info_rows = sqlx::query(&info_sql).fetch_all(pool).await?;

            // seqno, cid, name（式の要素は NULL）
            let info = CatalogRows::decode(&info_rows, |row| {
                row.try_get::<Option<String>, _>(2)
            });
            malformed.extend(info.malformed);

            let columns: Vec<String> = info.items.into_iter().flatten().collect();
            if !columns.is_empty() {
                indexes.push(RawIndexInfo {
                    name: index_name,
                    columns,
                    unique,
                });
            }
        }

        Ok(CatalogRows {
            items: indexes,
            malformed,
        })
    }

    async fn get_foreign_keys(
        &self,
        pool: &AnyPool,
        _schema: &str,
        table_name: &str,
    ) -> Result<CatalogRows<RawForeignKeyInfo>, sqlx::Error> {
        let sql = format!(
            "PRAGMA foreign_key_list({})",
            quote_sqlite_identifier(table_name)
        );
        let rows = sqlx::query(&sql).fetch_all(pool).await?;

        // id, seq, table, from, to（参照先省略時は NULL）
        let decoded = CatalogRows::decode(&rows, |row| {
            let id: i64 = row.try_get(0)?;
            let referenced_table: String = row.try_get(2)?;
            let from: String = row.try_get(3)?;
            let to: Option<String> = row.try_get(4)?;
            Ok(((id, referenced_table), (from, to)))
        });

        // SQLiteの外部キーは名前を持たないため、id から生成する
        Ok(decoded.map_items(|pairs| {
            group_ordered(pairs)
                .into_iter()
                .map(|((id, referenced_table), parts)| {
                    let (columns, referenced): (Vec<String>, Vec<Option<String>>) =
                        parts.into_iter().unzip();
                    RawForeignKeyInfo {
                        name: format!("fk_{}_{}", table_name, id),
                        columns,
                        referenced_table,
                        referenced_columns: referenced.into_iter().flatten().collect(),
                    }
                })
                .collect()
        }))
    }
}
