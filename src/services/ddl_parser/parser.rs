// DDLパーサー
//
// ステートメントを先頭のキーワードで分類し、CREATE TABLE だけを sqlparser で解析します。
// CREATE TABLE は MySQL → PostgreSQL → SQLite → 汎用 の順に方言を試し、
// 最初に受理した方言の結果を使います。
// カラム定義・型・式・外部キーは sqlparser に任せ、MySQLのインデックス定義
// （プレフィックス長や ASC/DESC を含むキー）とテーブルオプションはトークン列から読み取ります。

use super::ast::{
    ColumnConstraint, ColumnDef, CreateTable, DefaultValue, ForeignKeyRef, IndexKind, ObjectName,
    Statement, TableConstraint, TableElement, TableOption,
};
use crate::adapters::type_mapping::try_normalize;
use crate::core::config::Dialect;
use crate::services::sql_splitter::{skip_leading_comments, StatementSpan};
use regex::Regex;
use sqlparser::ast::{
    ColumnOption, Expr, Ident, ObjectName as SqlObjectName, TableConstraint as SqlTableConstraint,
    Value,
};
use sqlparser::dialect::{
    Dialect as SqlDialect, GenericDialect, MySqlDialect, PostgreSqlDialect, SQLiteDialect,
};
use sqlparser::parser::{Parser, ParserError};
use sqlparser::tokenizer::Token;
use std::fmt;
use std::sync::LazyLock;
use tracing::trace;

/// 解析せずに読み飛ばすステートメントの先頭キーワード
const IGNORABLE_KEYWORDS: &[&str] = &[
    "ALTER", "BEGIN", "COMMENT", "COMMIT", "DELETE", "DELIMITER", "DROP", "GRANT", "INSERT",
    "LOCK", "PRAGMA", "REPLACE", "REVOKE", "ROLLBACK", "SELECT", "SET", "START", "TRUNCATE",
    "UNLOCK", "UPDATE", "USE", "WITH",
];

/// CREATE と TABLE の間に置ける修飾語
const TABLE_MODIFIERS: &[&str] = &["TEMP", "TEMPORARY", "UNLOGGED", "GLOBAL", "LOCAL"];

/// sqlparser のエラーメッセージ末尾の位置情報
static LOCATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?s)^(?P<message>.*?)(?: at Line: (?P<line>\d+), Column: (?P<column>\d+))?$").ok()
});

/// 構文エラー
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// エラー位置（入力全体のバイトオフセット）
    pub offset: usize,
    /// エラー位置のトークン
    pub near: String,
    /// メッセージ
    pub message: String,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} near '{}'", self.message, self.near)
    }
}

/// 1ステートメントを解析
pub fn parse_statement(source: &str, span: &StatementSpan<'_>) -> Result<Statement, ParseError> {
    let body = skip_leading_comments(span.text);
    let body_offset = span.offset + (span.text.len() - body.len());
    let words = leading_words(body, 8);

    let Some(first) = words.first() else {
        return Err(unsupported(source, body_offset));
    };

    if first == "CREATE" {
        return match create_target(&words[1..]) {
            Some(target) if target == "TABLE" => parse_create_table(source, span),
            Some(target) => Ok(Statement::Ignored {
                keyword: format!("CREATE {}", target),
            }),
            None => Ok(Statement::Ignored {
                keyword: "CREATE".to_string(),
            }),
        };
    }
    if IGNORABLE_KEYWORDS.contains(&first.as_str()) {
        return Ok(Statement::Ignored {
            keyword: first.clone(),
        });
    }
    Err(unsupported(source, body_offset))
}

/// 先頭から連続する語を大文字で返す（語の間のコメントは読み飛ばす）
fn leading_words(text: &str, limit: usize) -> Vec<String> {
    let mut words = Vec::new();
    let mut rest = text;
    while words.len() < limit {
        let len = rest
            .char_indices()
            .find(|(i, c)| !(c.is_ascii_alphabetic() || *c == '_' || (*i > 0 && c.is_ascii_digit())))
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        if len == 0 {
            break;
        }
        words.push(rest[..len].to_ascii_uppercase());
        rest = skip_leading_comments(&rest[len..]);
    }
    words
}

/// CREATE の対象（OR REPLACE と一時表の修飾語を除いた最初の語）
fn create_target(words: &[String]) -> Option<&String> {
    let mut rest = words;
    if rest.len() >= 2 && rest[0] == "OR" && rest[1] == "REPLACE" {
        rest = &rest[2..];
    }
    rest.iter()
        .find(|word| !TABLE_MODIFIERS.contains(&word.as_str()))
}

/// 先頭のキーワードが解析対象外の場合のエラー
fn unsupported(source: &str, offset: usize) -> ParseError {
    let near: String = source[offset..]
        .chars()
        .take_while(|c| !c.is_whitespace() && *c != '(' && *c != ';')
        .take(30)
        .collect();
    ParseError {
        offset,
        near: if near.is_empty() {
            "end of input".to_string()
        } else {
            near
        },
        message: "unsupported statement".to_string(),
    }
}

// =============================================================================
// CREATE TABLE
// =============================================================================

/// 方言を順に試して CREATE TABLE を解析
///
/// どの方言でも解析できない場合は、最も先まで読み進めた方言のエラーを返します。
fn parse_create_table(source: &str, span: &StatementSpan<'_>) -> Result<Statement, ParseError> {
    let dialects: [(&str, &dyn SqlDialect); 4] = [
        ("mysql", &MySqlDialect {}),
        ("postgresql", &PostgreSqlDialect {}),
        ("sqlite", &SQLiteDialect {}),
        ("generic", &GenericDialect {}),
    ];

    let mut furthest: Option<ParseError> = None;
    for (name, dialect) in dialects {
        match parse_with_dialect(dialect, span.text) {
            Ok(statement) => {
                trace!(dialect = name, statement = span.index, "CREATE TABLE parsed");
                return Ok(statement);
            }
            Err(e) => {
                let error = locate_error(source, span, &e);
                trace!(
                    dialect = name,
                    statement = span.index,
                    error = %error,
                    "CREATE TABLE rejected"
                );
                if furthest.as_ref().is_none_or(|f| error.offset > f.offset) {
                    furthest = Some(error);
                }
            }
        }
    }

    Err(furthest.unwrap_or_else(|| unsupported(source, span.offset)))
}

fn parse_with_dialect(dialect: &dyn SqlDialect, text: &str) -> Result<Statement, ParserError> {
    let mut parser = Parser::new(dialect).try_with_sql(text)?;

    expect_word(&mut parser, "CREATE")?;
    if eat_word(&mut parser, "OR") {
        expect_word(&mut parser, "REPLACE")?;
    }
    let mut temporary = false;
    while let Some(modifier) = eat_any_word(&mut parser, TABLE_MODIFIERS) {
        temporary |= modifier == "TEMP" || modifier == "TEMPORARY";
    }
    expect_word(&mut parser, "TABLE")?;

    let if_not_exists = eat_words(&mut parser, &["IF", "NOT", "EXISTS"]);
    let name = object_name(&parser.parse_object_name(false)?);

    if let Some(form) = derived_table_form(&parser) {
        return Ok(Statement::DerivedTable { name, form });
    }

    parser.expect_token(&Token::LParen)?;
    let mut elements = Vec::new();
    if !parser.consume_token(&Token::RParen) {
        loop {
            elements.push(parse_table_element(&mut parser)?);
            if parser.consume_token(&Token::Comma) {
                continue;
            }
            parser.expect_token(&Token::RParen)?;
            break;
        }
    }

    let options = parse_table_options(&mut parser);

    Ok(Statement::CreateTable(CreateTable {
        name,
        if_not_exists,
        temporary,
        elements,
        options,
    }))
}

/// カラム定義を持たない CREATE TABLE の形式
fn derived_table_form(parser: &Parser) -> Option<String> {
    match word_at(parser, 0).as_deref() {
        Some("LIKE") => return Some("LIKE".to_string()),
        Some("AS") => return Some("AS".to_string()),
        Some("CLONE") => return Some("CLONE".to_string()),
        Some("PARTITION") if word_at(parser, 1).as_deref() == Some("OF") => {
            return Some("PARTITION OF".to_string())
        }
        _ => {}
    }
    if parser.peek_token().token == Token::LParen && word_at(parser, 1).as_deref() == Some("LIKE") {
        return Some("LIKE".to_string());
    }
    None
}

// ---- テーブル要素 ----

fn parse_table_element(parser: &mut Parser) -> Result<TableElement, ParserError> {
    if at_index_definition(parser) {
        return Ok(TableElement::Constraint(parse_index_definition(parser)?));
    }
    if word_at(parser, 0).as_deref() == Some("EXCLUDE") {
        parser.next_token();
        skip_to_element_end(parser)?;
        return Ok(TableElement::Constraint(TableConstraint::Other));
    }
    if let Some(constraint) = parser.parse_optional_table_constraint()? {
        return Ok(TableElement::Constraint(table_constraint(constraint)));
    }
    Ok(TableElement::Column(parse_column(parser)?))
}

/// 次の要素がインデックス系の定義（PRIMARY KEY / UNIQUE / KEY / INDEX / FULLTEXT / SPATIAL）かどうか
fn at_index_definition(parser: &Parser) -> bool {
    let first = word_at(parser, 0);
    match first.as_deref() {
        Some("PRIMARY") => word_at(parser, 1).as_deref() == Some("KEY"),
        Some("UNIQUE") | Some("FULLTEXT") | Some("SPATIAL") => true,
        Some("KEY") | Some("INDEX") => {
            if opens_key_parts(parser, 1) {
                return true;
            }
            // `key VARCHAR(10)` のように KEY という名前のカラムもありうる
            let names_type = word_at(parser, 1)
                .is_some_and(|word| try_normalize(Dialect::LiteralDdl, &word).is_some());
            !names_type && opens_key_parts(parser, 2)
        }
        Some("CONSTRAINT") => {
            let kind = if is_index_kind(word_at(parser, 1).as_deref()) {
                word_at(parser, 1)
            } else {
                word_at(parser, 2)
            };
            is_index_kind(kind.as_deref())
        }
        _ => false,
    }
}

fn is_index_kind(word: Option<&str>) -> bool {
    matches!(word, Some("PRIMARY") | Some("UNIQUE"))
}

/// n番目のトークンがキー列の開始（`(` または USING）かどうか
fn opens_key_parts(parser: &Parser, n: usize) -> bool {
    parser.peek_nth_token(n).token == Token::LParen || word_at(parser, n).as_deref() == Some("USING")
}

fn parse_index_definition(parser: &mut Parser) -> Result<TableConstraint, ParserError> {
    let mut name = None;
    if eat_word(parser, "CONSTRAINT") && !is_index_kind(word_at(parser, 0).as_deref()) {
        name = Some(parse_name(parser)?);
    }

    let constraint = if eat_word(parser, "PRIMARY") {
        expect_word(parser, "KEY")?;
        skip_index_type(parser);
        TableConstraint::PrimaryKey {
            name,
            columns: parse_key_parts(parser)?,
        }
    } else if eat_word(parser, "UNIQUE") {
        eat_any_word(parser, &["KEY", "INDEX"]);
        if eat_word(parser, "NULLS") {
            eat_word(parser, "NOT");
            expect_word(parser, "DISTINCT")?;
        }
        let index_name = parse_optional_index_name(parser)?;
        TableConstraint::Unique {
            name: name.or(index_name),
            columns: parse_key_parts(parser)?,
        }
    } else {
        let kind = match eat_any_word(parser, &["FULLTEXT", "SPATIAL"]).as_deref() {
            Some("FULLTEXT") => IndexKind::Fulltext,
            Some(_) => IndexKind::Spatial,
            None => IndexKind::Plain,
        };
        if eat_any_word(parser, &["KEY", "INDEX"]).is_none() && kind == IndexKind::Plain {
            return parser.expected("KEY or INDEX", parser.peek_token());
        }
        let index_name = parse_optional_index_name(parser)?;
        TableConstraint::Index {
            name: name.or(index_name),
            columns: parse_key_parts(parser)?,
            kind,
        }
    };

    // インデックスオプション（COMMENT, INVISIBLE, WITH PARSER など）
    skip_to_element_end(parser)?;
    Ok(constraint)
}

/// 省略可能なインデックス名と USING 句
fn parse_optional_index_name(parser: &mut Parser) -> Result<Option<String>, ParserError> {
    let has_name = matches!(parser.peek_token().token, Token::Word(_))
        && word_at(parser, 0).as_deref() != Some("USING");
    let name = if has_name {
        Some(parse_name(parser)?)
    } else {
        None
    };
    skip_index_type(parser);
    Ok(name)
}

fn skip_index_type(parser: &mut Parser) {
    if eat_word(parser, "USING") {
        parser.next_token();
    }
}

/// `(col [(len)] [ASC|DESC], ...)` を解析
///
/// 式によるキー（`(lower(name))`）は読み飛ばし、カラム一覧には含めません。
fn parse_key_parts(parser: &mut Parser) -> Result<Vec<String>, ParserError> {
    parser.expect_token(&Token::LParen)?;
    let mut columns = Vec::new();
    loop {
        if parser.peek_token().token == Token::LParen {
            skip_parenthesized(parser)?;
        } else {
            columns.push(parse_name(parser)?);
        }
        skip_until(parser, &[Token::Comma, Token::RParen])?;
        if parser.consume_token(&Token::Comma) {
            continue;
        }
        parser.expect_token(&Token::RParen)?;
        return Ok(columns);
    }
}

/// sqlparser が解析したテーブル制約（外部キー・CHECK）を変換
fn table_constraint(constraint: SqlTableConstraint) -> TableConstraint {
    match constraint {
        SqlTableConstraint::ForeignKey {
            name,
            columns,
            foreign_table,
            referred_columns,
            ..
        } => TableConstraint::ForeignKey {
            name: name.map(|n| n.value),
            columns: ident_values(columns),
            reference: ForeignKeyRef {
                table: object_name(&foreign_table),
                columns: ident_values(referred_columns),
            },
        },
        SqlTableConstraint::Check { name, .. } => TableConstraint::Check {
            name: name.map(|n| n.value),
        },
        _ => TableConstraint::Other,
    }
}

// ---- カラム定義 ----

fn parse_column(parser: &mut Parser) -> Result<ColumnDef, ParserError> {
    let def = parser.parse_column_def()?;

    let mut constraints = Vec::new();
    if let Some(collation) = &def.collation {
        constraints.push(ColumnConstraint::Collate(object_name_text(collation)));
    }
    constraints.extend(def.options.iter().filter_map(|o| column_constraint(&o.option)));

    // sqlparser がカラムオプションとして扱わない後続の句
    loop {
        if eat_word(parser, "COLLATE") {
            constraints.push(ColumnConstraint::Collate(parse_name(parser)?));
        } else if eat_any_word(parser, &["VISIBLE", "INVISIBLE"]).is_some() {
            continue;
        } else {
            match parser.parse_optional_column_option()? {
                Some(option) => constraints.extend(column_constraint(&option)),
                None => break,
            }
        }
    }

    Ok(ColumnDef {
        name: def.name.value,
        data_type: def.data_type.to_string(),
        constraints,
    })
}

fn column_constraint(option: &ColumnOption) -> Option<ColumnConstraint> {
    let constraint = match option {
        ColumnOption::NotNull => ColumnConstraint::NotNull,
        ColumnOption::Null => ColumnConstraint::Null,
        ColumnOption::Default(expr) => ColumnConstraint::Default(default_value(expr)),
        ColumnOption::Comment(comment) => ColumnConstraint::Comment(comment.clone()),
        ColumnOption::Unique { is_primary, .. } => {
            if *is_primary {
                ColumnConstraint::PrimaryKey
            } else {
                ColumnConstraint::Unique
            }
        }
        ColumnOption::ForeignKey {
            foreign_table,
            referred_columns,
            ..
        } => ColumnConstraint::References(ForeignKeyRef {
            table: object_name(foreign_table),
            columns: ident_values(referred_columns.clone()),
        }),
        ColumnOption::Check(_) => ColumnConstraint::Check,
        ColumnOption::OnUpdate(expr) => ColumnConstraint::OnUpdate(expr.to_string()),
        ColumnOption::CharacterSet(name) => ColumnConstraint::CharacterSet(object_name_text(name)),
        // 式を持たない GENERATED は IDENTITY 列
        ColumnOption::Generated {
            generation_expr, ..
        } => {
            if generation_expr.is_some() {
                ColumnConstraint::Generated
            } else {
                ColumnConstraint::AutoIncrement
            }
        }
        ColumnOption::Identity(_) => ColumnConstraint::AutoIncrement,
        // AUTO_INCREMENT（MySQL）/ AUTOINCREMENT（SQLite）
        ColumnOption::DialectSpecific(tokens) => {
            let auto_increment = tokens.iter().any(|token| {
                matches!(token, Token::Word(word)
                    if word.value.eq_ignore_ascii_case("AUTO_INCREMENT")
                        || word.value.eq_ignore_ascii_case("AUTOINCREMENT"))
            });
            if !auto_increment {
                return None;
            }
            ColumnConstraint::AutoIncrement
        }
        _ => return None,
    };
    Some(constraint)
}

/// DEFAULT 句の値
///
/// 文字列リテラルはキャスト（`'n'::character varying`）を外してクォートなしの値にします。
fn default_value(expr: &Expr) -> DefaultValue {
    match expr {
        Expr::Value(Value::Null) => DefaultValue::Null,
        Expr::Value(Value::SingleQuotedString(value))
        | Expr::Value(Value::DoubleQuotedString(value)) => DefaultValue::Literal(value.clone()),
        Expr::Cast { expr: inner, .. } => match default_value(inner) {
            DefaultValue::Expression(_) => DefaultValue::Expression(expr.to_string()),
            value => value,
        },
        other => DefaultValue::Expression(other.to_string()),
    }
}

// ---- テーブルオプション ----

/// 閉じ括弧以降のテーブルオプションを読み取る
///
/// COMMENT / CHARSET / COLLATE 以外（ENGINE, PARTITION BY, WITH など）は読み捨てます。
fn parse_table_options(parser: &mut Parser) -> Vec<TableOption> {
    let mut options = Vec::new();
    loop {
        let token = parser.next_token();
        let word = match &token.token {
            Token::EOF => break,
            Token::Word(word) if word.quote_style.is_none() => word.value.to_ascii_uppercase(),
            _ => continue,
        };
        let option: fn(String) -> TableOption = match word.as_str() {
            "COMMENT" => TableOption::Comment,
            "CHARSET" => TableOption::Charset,
            "CHARACTER" if eat_word(parser, "SET") => TableOption::Charset,
            "COLLATE" => TableOption::Collate,
            _ => continue,
        };
        parser.consume_token(&Token::Eq);
        if let Some(value) = option_value(parser) {
            options.push(option(value));
        }
    }
    options
}

/// オプション値（識別子または文字列）
fn option_value(parser: &mut Parser) -> Option<String> {
    match parser.next_token().token {
        Token::Word(word) => Some(word.value),
        Token::SingleQuotedString(value) | Token::DoubleQuotedString(value) => Some(value),
        _ => None,
    }
}

// =============================================================================
// トークン操作
// =============================================================================

/// n番目のトークンがクォートなしの語なら大文字で返す
fn word_at(parser: &Parser, n: usize) -> Option<String> {
    match parser.peek_nth_token(n).token {
        Token::Word(word) if word.quote_style.is_none() => Some(word.value.to_ascii_uppercase()),
        _ => None,
    }
}

fn eat_word(parser: &mut Parser, expected: &str) -> bool {
    if word_at(parser, 0).as_deref() == Some(expected) {
        parser.next_token();
        return true;
    }
    false
}

/// いずれかの語に一致すれば消費して返す
fn eat_any_word(parser: &mut Parser, expected: &[&str]) -> Option<String> {
    let word = word_at(parser, 0).filter(|word| expected.contains(&word.as_str()))?;
    parser.next_token();
    Some(word)
}

/// 語の並びがすべて一致する場合のみ消費
fn eat_words(parser: &mut Parser, expected: &[&str]) -> bool {
    let matches = expected
        .iter()
        .enumerate()
        .all(|(i, word)| word_at(parser, i).as_deref() == Some(*word));
    if matches {
        for _ in expected {
            parser.next_token();
        }
    }
    matches
}

fn expect_word(parser: &mut Parser, expected: &str) -> Result<(), ParserError> {
    if eat_word(parser, expected) {
        return Ok(());
    }
    parser.expected(expected, parser.peek_token())
}

/// 識別子（クォート付きを含む）
fn parse_name(parser: &mut Parser) -> Result<String, ParserError> {
    let token = parser.peek_token();
    if let Token::Word(word) = &token.token {
        let value = word.value.clone();
        parser.next_token();
        return Ok(value);
    }
    parser.expected("identifier", token)
}

/// 括弧で囲まれた範囲を対応する `)` まで読み飛ばす
fn skip_parenthesized(parser: &mut Parser) -> Result<(), ParserError> {
    parser.expect_token(&Token::LParen)?;
    let mut depth = 1usize;
    while depth > 0 {
        let token = parser.next_token();
        if token.token == Token::EOF {
            return parser.expected("')'", token);
        }
        match token.token {
            Token::LParen => depth += 1,
            Token::RParen => depth -= 1,
            _ => {}
        }
    }
    Ok(())
}

/// 括弧の外側で `stops` のいずれか（または終端）が現れるまで読み飛ばす
fn skip_until(parser: &mut Parser, stops: &[Token]) -> Result<(), ParserError> {
    loop {
        let token = parser.peek_token().token;
        if token == Token::EOF || stops.contains(&token) {
            return Ok(());
        }
        if token == Token::LParen {
            skip_parenthesized(parser)?;
        } else {
            parser.next_token();
        }
    }
}

/// テーブル要素の残りを `,` または `)` まで読み飛ばす
fn skip_to_element_end(parser: &mut Parser) -> Result<(), ParserError> {
    skip_until(parser, &[Token::Comma, Token::RParen])
}

// =============================================================================
// 変換
// =============================================================================

fn object_name(name: &SqlObjectName) -> ObjectName {
    ObjectName {
        parts: name.0.iter().map(|ident| ident.value.clone()).collect(),
    }
}

fn object_name_text(name: &SqlObjectName) -> String {
    object_name(name).parts.join(".")
}

fn ident_values(idents: Vec<Ident>) -> Vec<String> {
    idents.into_iter().map(|ident| ident.value).collect()
}

/// sqlparser のエラーを入力全体の位置に変換
///
/// 位置はステートメント内の1始まりの行・桁で報告されるため、ステートメントの開始位置を加えます。
/// 位置を持たないエラー（入力終端など）はステートメント終端を指します。
fn locate_error(source: &str, span: &StatementSpan<'_>, error: &ParserError) -> ParseError {
    let raw = match error {
        ParserError::TokenizerError(message) | ParserError::ParserError(message) => {
            message.clone()
        }
        ParserError::RecursionLimitExceeded => "recursion limit exceeded".to_string(),
    };
    let end = span.offset + span.text.len();

    let captures = LOCATION_PATTERN
        .as_ref()
        .and_then(|pattern| pattern.captures(&raw));
    let message = captures
        .as_ref()
        .and_then(|c| c.name("message"))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| raw.clone());
    let position = captures.as_ref().and_then(|c| {
        let line = c.name("line")?.as_str().parse::<usize>().ok()?;
        let column = c.name("column")?.as_str().parse::<usize>().ok()?;
        Some((line, column))
    });

    let found = message
        .rsplit_once("found: ")
        .map(|(_, found)| found.trim().to_string());
    let at_end = found.as_deref() == Some("EOF");

    let offset = match position {
        Some((line, column)) if !at_end => span.offset + offset_in(span.text, line, column),
        _ => end,
    };
    let near = match found {
        Some(found) if !at_end => found.chars().take(30).collect(),
        _ if offset >= end => "end of input".to_string(),
        _ => source[offset..end]
            .chars()
            .take_while(|c| !c.is_whitespace())
            .take(30)
            .collect(),
    };

    ParseError {
        offset,
        near,
        message,
    }
}

/// 1始まりの行・桁（文字単位）をバイトオフセットに変換
fn offset_in(text: &str, line: usize, column: usize) -> usize {
    let mut line_start = 0;
    for (index, content) in text.split('\n').enumerate() {
        if index + 1 == line {
            return line_start
                + content
                    .char_indices()
                    .nth(column.saturating_sub(1))
                    .map(|(i, _)| i)
                    .unwrap_or(content.len());
        }
        line_start += content.len() + 1;
    }
    text.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::sql_splitter::split_statements;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        let spans = split_statements(sql);
        parse_statement(sql, &spans[0])
    }

    fn parse_table(sql: &str) -> CreateTable {
        match parse(sql).unwrap() {
            Statement::CreateTable(create) => create,
            other => panic!("expected CREATE TABLE, got {:?}", other),
        }
    }

    fn columns(create: &CreateTable) -> Vec<&ColumnDef> {
        create
            .elements
            .iter()
            .filter_map(|e| match e {
                TableElement::Column(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn constraints(create: &CreateTable) -> Vec<&TableConstraint> {
        create
            .elements
            .iter()
            .filter_map(|e| match e {
                TableElement::Constraint(c) => Some(c),
                _ => None,
            })
            .collect()
    }

    fn default_of(column: &ColumnDef) -> Option<&DefaultValue> {
        column.constraints.iter().find_map(|k| match k {
            ColumnConstraint::Default(v) => Some(v),
            _ => None,
        })
    }

    #[test]
    fn test_simple_create_table() {
        let create = parse_table("CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(100) NOT NULL)");
        assert_eq!(create.name.name(), "users");
        let cols = columns(&create);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].data_type, "INT");
        assert_eq!(cols[0].constraints, vec![ColumnConstraint::PrimaryKey]);
        assert_eq!(cols[1].data_type, "VARCHAR(100)");
        assert_eq!(cols[1].constraints, vec![ColumnConstraint::NotNull]);
    }

    #[test]
    fn test_qualified_and_quoted_names() {
        let create = parse_table(r#"CREATE TABLE IF NOT EXISTS "public"."Order Items" ("id" integer)"#);
        assert!(create.if_not_exists);
        assert_eq!(create.name.parts, vec!["public", "Order Items"]);
        assert_eq!(columns(&create)[0].name, "id");

        let create = parse_table("CREATE TABLE `shop`.`order items` (`id` int)");
        assert_eq!(create.name.parts, vec!["shop", "order items"]);

        let create = parse_table("CREATE TABLE [items] ([id] integer)");
        assert_eq!(create.name.name(), "items");
        assert_eq!(columns(&create)[0].name, "id");
    }

    #[test]
    fn test_type_spelling_normalizes() {
        let create = parse_table(
            "CREATE TABLE t (a double precision, b character varying(20), c timestamp(6) with time zone, d int(10) unsigned, e integer[], f bigserial)",
        );
        let types: Vec<&str> = columns(&create).iter().map(|c| c.data_type.as_str()).collect();
        assert_eq!(types.len(), 6);
        let expected = [
            crate::core::schema::NormalizedType::Double,
            crate::core::schema::NormalizedType::String,
            crate::core::schema::NormalizedType::String,
            crate::core::schema::NormalizedType::Uint32,
            crate::core::schema::NormalizedType::String,
            crate::core::schema::NormalizedType::Int64,
        ];
        for (native, normalized) in types.iter().zip(expected) {
            assert_eq!(
                try_normalize(Dialect::LiteralDdl, native),
                Some(normalized),
                "{}",
                native
            );
        }
        assert_eq!(types[1].to_ascii_uppercase(), "CHARACTER VARYING(20)");
        assert_eq!(types[5], "bigserial");
    }

    #[test]
    fn test_character_set_is_not_part_of_type() {
        let create = parse_table("CREATE TABLE t (name VARCHAR(10) CHARACTER SET utf8mb4 COLLATE utf8mb4_bin NOT NULL)");
        let col = columns(&create)[0];
        assert_eq!(col.data_type, "VARCHAR(10)");
        assert!(col
            .constraints
            .contains(&ColumnConstraint::CharacterSet("utf8mb4".to_string())));
        assert!(col.constraints.contains(&ColumnConstraint::NotNull));
    }

    #[test]
    fn test_defaults() {
        let create = parse_table(
            "CREATE TABLE t (a INT DEFAULT NULL, b VARCHAR(5) DEFAULT 'x''y', c INT DEFAULT -1, d TIMESTAMP DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP, e varchar DEFAULT 'n'::character varying, f int DEFAULT nextval('seq'::regclass), g int DEFAULT (1 + 2), h text DEFAULT NULL::text)",
        );
        let cols = columns(&create);
        assert_eq!(default_of(cols[0]), Some(&DefaultValue::Null));
        assert_eq!(default_of(cols[1]), Some(&DefaultValue::Literal("x'y".to_string())));
        assert_eq!(default_of(cols[2]), Some(&DefaultValue::Expression("-1".to_string())));
        assert_eq!(
            default_of(cols[3]),
            Some(&DefaultValue::Expression("CURRENT_TIMESTAMP".to_string()))
        );
        assert_eq!(default_of(cols[4]), Some(&DefaultValue::Literal("n".to_string())));
        match default_of(cols[5]) {
            Some(DefaultValue::Expression(expr)) => {
                assert!(expr.starts_with("nextval('seq'"), "{}", expr)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(default_of(cols[6]), Some(&DefaultValue::Expression("(1 + 2)".to_string())));
        assert_eq!(default_of(cols[7]), Some(&DefaultValue::Null));
        assert!(cols[3]
            .constraints
            .contains(&ColumnConstraint::OnUpdate("CURRENT_TIMESTAMP".to_string())));
    }

    #[test]
    fn test_identity_and_generated_columns() {
        let create = parse_table(
            "CREATE TABLE t (id bigint GENERATED BY DEFAULT AS IDENTITY, total int GENERATED ALWAYS AS (a + b) STORED)",
        );
        let cols = columns(&create);
        assert_eq!(cols[0].constraints, vec![ColumnConstraint::AutoIncrement]);
        assert_eq!(cols[1].constraints, vec![ColumnConstraint::Generated]);

        let create = parse_table("CREATE TABLE t (x INT NOT NULL AUTO_INCREMENT)");
        assert_eq!(
            columns(&create)[0].constraints,
            vec![ColumnConstraint::NotNull, ColumnConstraint::AutoIncrement]
        );

        let create = parse_table("CREATE TABLE t (y INTEGER PRIMARY KEY AUTOINCREMENT)");
        assert_eq!(
            columns(&create)[0].constraints,
            vec![ColumnConstraint::PrimaryKey, ColumnConstraint::AutoIncrement]
        );
    }

    #[test]
    fn test_inline_references() {
        let create = parse_table(
            "CREATE TABLE posts (user_id INT NOT NULL REFERENCES users(id) ON DELETE CASCADE)",
        );
        let col = columns(&create)[0];
        assert_eq!(col.constraints.len(), 2);
        match &col.constraints[1] {
            ColumnConstraint::References(reference) => {
                assert_eq!(reference.table.name(), "users");
                assert_eq!(reference.columns, vec!["id"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_table_constraints() {
        let create = parse_table(
            "CREATE TABLE post_tags (
                post_id INT NOT NULL,
                tag_id INT NOT NULL,
                title VARCHAR(100),
                CONSTRAINT pk_post_tags PRIMARY KEY (post_id, tag_id),
                CONSTRAINT fk_post FOREIGN KEY (post_id) REFERENCES posts (id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags (id),
                UNIQUE KEY uq_title (title(20) DESC),
                KEY idx_tag USING BTREE (tag_id),
                FULLTEXT KEY ft_title (title),
                CHECK (post_id > 0)
            )",
        );
        let cons = constraints(&create);
        assert_eq!(cons.len(), 7);
        assert_eq!(
            cons[0],
            &TableConstraint::PrimaryKey {
                name: Some("pk_post_tags".to_string()),
                columns: vec!["post_id".to_string(), "tag_id".to_string()]
            }
        );
        match cons[1] {
            TableConstraint::ForeignKey { name, columns, reference } => {
                assert_eq!(name.as_deref(), Some("fk_post"));
                assert_eq!(columns, &vec!["post_id".to_string()]);
                assert_eq!(reference.table.name(), "posts");
            }
            other => panic!("unexpected {:?}", other),
        }
        assert!(matches!(cons[2], TableConstraint::ForeignKey { name: None, .. }));
        assert_eq!(
            cons[3],
            &TableConstraint::Unique {
                name: Some("uq_title".to_string()),
                columns: vec!["title".to_string()]
            }
        );
        assert_eq!(
            cons[4],
            &TableConstraint::Index {
                name: Some("idx_tag".to_string()),
                columns: vec!["tag_id".to_string()],
                kind: IndexKind::Plain
            }
        );
        assert!(matches!(cons[5], TableConstraint::Index { kind: IndexKind::Fulltext, .. }));
        assert!(matches!(cons[6], TableConstraint::Check { name: None }));
    }

    #[test]
    fn test_column_named_key() {
        let create = parse_table("CREATE TABLE kv (key VARCHAR(10) NOT NULL, value TEXT, KEY idx_value (value(10)))");
        let cols = columns(&create);
        assert_eq!(cols.len(), 2);
        assert_eq!(cols[0].name, "key");
        assert_eq!(constraints(&create).len(), 1);
    }

    #[test]
    fn test_table_options() {
        let create = parse_table(
            "CREATE TABLE t (id INT) ENGINE=InnoDB AUTO_INCREMENT=10 DEFAULT CHARSET=utf8mb4 COLLATE=utf8mb4_general_ci COMMENT='ユーザー'",
        );
        assert_eq!(
            create.options,
            vec![
                TableOption::Charset("utf8mb4".to_string()),
                TableOption::Collate("utf8mb4_general_ci".to_string()),
                TableOption::Comment("ユーザー".to_string())
            ]
        );
    }

    #[test]
    fn test_postgres_trailing_clauses_are_consumed() {
        let create = parse_table(
            "CREATE UNLOGGED TABLE m (id int) PARTITION BY RANGE (id) WITH (fillfactor = 70) TABLESPACE fast",
        );
        assert_eq!(columns(&create).len(), 1);
        assert!(!create.temporary);
        assert!(create.options.is_empty());
    }

    #[test]
    fn test_typeless_sqlite_column() {
        let create = parse_table("CREATE TEMP TABLE t (a, b PRIMARY KEY)");
        assert!(create.temporary);
        let cols = columns(&create);
        assert_eq!(cols[0].data_type, "");
        assert_eq!(cols[1].data_type, "");
        assert_eq!(cols[1].constraints, vec![ColumnConstraint::PrimaryKey]);
    }

    #[test]
    fn test_exclude_constraint_is_skipped() {
        let create = parse_table(
            "CREATE TABLE booking (room int, during tsrange, EXCLUDE USING gist (room WITH =, during WITH &&))",
        );
        assert_eq!(columns(&create).len(), 2);
        assert_eq!(constraints(&create), vec![&TableConstraint::Other]);
    }

    #[test]
    fn test_derived_tables() {
        assert_eq!(
            parse("CREATE TABLE copy LIKE users").unwrap(),
            Statement::DerivedTable {
                name: ObjectName { parts: vec!["copy".to_string()] },
                form: "LIKE".to_string()
            }
        );
        assert!(matches!(
            parse("CREATE TABLE t AS SELECT * FROM u").unwrap(),
            Statement::DerivedTable { .. }
        ));
        assert!(matches!(
            parse("CREATE TABLE t (LIKE u INCLUDING ALL)").unwrap(),
            Statement::DerivedTable { .. }
        ));
    }

    #[test]
    fn test_ignored_statements_are_not_tokenized() {
        assert_eq!(
            parse("SET @x = 'unterminated").unwrap(),
            Statement::Ignored { keyword: "SET".to_string() }
        );
        assert_eq!(
            parse("create unique index idx on t (a)").unwrap(),
            Statement::Ignored { keyword: "CREATE UNIQUE".to_string() }
        );
        assert_eq!(
            parse("CREATE OR REPLACE VIEW v AS SELECT 1").unwrap(),
            Statement::Ignored { keyword: "CREATE VIEW".to_string() }
        );
        assert_eq!(
            parse("-- header\nCREATE /* v2 */ FUNCTION f() RETURNS int AS $$ SELECT 'é' $$ LANGUAGE sql").unwrap(),
            Statement::Ignored { keyword: "CREATE FUNCTION".to_string() }
        );
    }

    #[test]
    fn test_unsupported_statement() {
        let err = parse("INVALID SQL STATEMENT").unwrap_err();
        assert_eq!(err.offset, 0);
        assert_eq!(err.near, "INVALID");
        assert!(err.message.contains("unsupported"));
    }

    #[test]
    fn test_error_positions() {
        let sql = "CREATE TABLE t (id INT, ?? INT)";
        let err = parse(sql).unwrap_err();
        assert_eq!(&sql[err.offset..err.offset + 1], "?");
        assert_eq!(err.near, "?");

        let sql = "CREATE TABLE t (\n  id INT,\n  PRIMARY (id)\n)";
        let err = parse(sql).unwrap_err();
        assert_eq!(&sql[err.offset..err.offset + 1], "(");

        let err = parse("CREATE TABLE t (id INT").unwrap_err();
        assert_eq!(err.near, "end of input");

        let err = parse("CREATE TABLE t (name TEXT COMMENT 'open").unwrap_err();
        assert!(err.message.to_lowercase().contains("unterminated"));
    }

    #[test]
    fn test_error_offset_is_relative_to_whole_input() {
        let sql = "CREATE TABLE a (id INT);\n-- 説明\nCREATE TABLE b (\n  名前 TEXT,\n  ???\n)";
        let spans = split_statements(sql);
        let err = parse_statement(sql, &spans[1]).unwrap_err();
        assert!(sql[err.offset..].starts_with("???"));
    }

    #[test]
    fn test_offset_in() {
        let text = "ab\ncdé\nf";
        assert_eq!(offset_in(text, 1, 1), 0);
        assert_eq!(offset_in(text, 2, 3), 5);
        assert_eq!(offset_in(text, 3, 1), 8);
        assert_eq!(offset_in(text, 9, 1), text.len());
    }
}
