// SQLステートメント分割
//
// SQL文字列をセミコロン区切りで個別のステートメントに分割します。
// シングルクォート、ダブルクォート、バッククォート、PostgreSQLドル引用符内の
// セミコロンはステートメント区切りとして扱いません。
// SQLコメント（行コメント `--` / `#`、ネスト可能なブロックコメント `/* */`）内の
// セミコロンも同様にスキップします。
//
// 各ステートメントは入力全体でのバイトオフセットを保持し、
// 構文エラーの行・桁番号の算出に使われます。

/// 分割されたステートメント
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatementSpan<'a> {
    /// ステートメント番号（空のステートメントを除いた1始まりの連番）
    pub index: usize,
    /// 前後の空白を除いたステートメント本文
    pub text: &'a str,
    /// 入力全体における本文先頭のバイトオフセット
    pub offset: usize,
}

/// 分割処理の状態
enum SplitState<'a> {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Backtick,
    DollarQuoted(&'a str),
    LineComment,
    /// ブロックコメント（ネスト深さを保持）
    BlockComment(u32),
}

/// SQL文字列を個別のステートメントに分割
///
/// 空のステートメントとコメントのみのステートメントは除外されます。
/// 区切り文字はすべてASCIIのため、バイト単位で走査してもUTF-8の境界を壊しません。
pub fn split_statements(sql: &str) -> Vec<StatementSpan<'_>> {
    let bytes = sql.as_bytes();
    let mut spans = Vec::new();
    let mut state = SplitState::Normal;
    let mut start = 0;
    let mut i = 0;

    let next_is = |i: usize, expected: u8| bytes.get(i + 1) == Some(&expected);

    while i < bytes.len() {
        let b = bytes[i];
        match state {
            SplitState::Normal => match b {
                b'\'' => {
                    state = SplitState::SingleQuoted;
                    i += 1;
                }
                b'"' => {
                    state = SplitState::DoubleQuoted;
                    i += 1;
                }
                b'`' => {
                    state = SplitState::Backtick;
                    i += 1;
                }
                b'-' if next_is(i, b'-') => {
                    state = SplitState::LineComment;
                    i += 2;
                }
                b'#' => {
                    state = SplitState::LineComment;
                    i += 1;
                }
                b'/' if next_is(i, b'*') => {
                    state = SplitState::BlockComment(1);
                    i += 2;
                }
                b'$' => match dollar_tag(sql, i) {
                    Some(tag) => {
                        state = SplitState::DollarQuoted(tag);
                        i += tag.len();
                    }
                    None => i += 1,
                },
                b';' => {
                    push_span(sql, start, i, &mut spans);
                    start = i + 1;
                    i += 1;
                }
                _ => i += 1,
            },
            SplitState::SingleQuoted => match b {
                // バックスラッシュエスケープ（MySQL）
                b'\\' => i += 2,
                b'\'' if next_is(i, b'\'') => i += 2,
                b'\'' => {
                    state = SplitState::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            SplitState::DoubleQuoted => match b {
                b'"' if next_is(i, b'"') => i += 2,
                b'"' => {
                    state = SplitState::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            SplitState::Backtick => match b {
                b'`' if next_is(i, b'`') => i += 2,
                b'`' => {
                    state = SplitState::Normal;
                    i += 1;
                }
                _ => i += 1,
            },
            SplitState::DollarQuoted(tag) => {
                if bytes[i..].starts_with(tag.as_bytes()) {
                    state = SplitState::Normal;
                    i += tag.len();
                } else {
                    i += 1;
                }
            }
            SplitState::LineComment => {
                if b == b'\n' {
                    state = SplitState::Normal;
                }
                i += 1;
            }
            SplitState::BlockComment(depth) => {
                if b == b'/' && next_is(i, b'*') {
                    state = SplitState::BlockComment(depth + 1);
                    i += 2;
                } else if b == b'*' && next_is(i, b'/') {
                    state = if depth == 1 {
                        SplitState::Normal
                    } else {
                        SplitState::BlockComment(depth - 1)
                    };
                    i += 2;
                } else {
                    i += 1;
                }
            }
        }
    }

    push_span(sql, start, sql.len(), &mut spans);
    spans
}

/// `start..end` のステートメントを追加（空・コメントのみの場合は追加しない）
fn push_span<'a>(sql: &'a str, start: usize, end: usize, spans: &mut Vec<StatementSpan<'a>>) {
    // エスケープで末尾を越えた場合に備えて丸める
    let end = end.min(sql.len());
    if start >= end {
        return;
    }
    let raw = &sql[start..end];
    let text = raw.trim();
    if text.is_empty() || skip_leading_comments(text).is_empty() {
        return;
    }
    let leading = raw.len() - raw.trim_start().len();
    spans.push(StatementSpan {
        index: spans.len() + 1,
        text,
        offset: start + leading,
    });
}

/// `$tag$` 形式のドル引用符開始タグを取得
///
/// タグは空、または英字/アンダースコアで始まる英数字/アンダースコア。
/// `$1` のような位置パラメータはタグとして扱いません。
fn dollar_tag(sql: &str, pos: usize) -> Option<&str> {
    let rest = &sql[pos + 1..];
    let end = rest.find('$')?;
    let inner = &rest[..end];
    let valid = match inner.chars().next() {
        None => true,
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && inner.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
    };
    if valid {
        Some(&sql[pos..pos + end + 2])
    } else {
        None
    }
}

/// 先頭の空白とコメントを読み飛ばした残りを返す
///
/// 閉じられていないブロックコメントは末尾まですべてコメントとして扱います。
pub fn skip_leading_comments(text: &str) -> &str {
    let mut remaining = text.trim_start();

    loop {
        if remaining.starts_with("--") || remaining.starts_with('#') {
            match remaining.find('\n') {
                Some(pos) => remaining = remaining[pos + 1..].trim_start(),
                None => return "",
            }
        } else if remaining.starts_with("/*") {
            let bytes = remaining.as_bytes();
            let mut depth: u32 = 1;
            let mut i = 2;
            while i < bytes.len() && depth > 0 {
                if bytes[i] == b'/' && bytes.get(i + 1) == Some(&b'*') {
                    depth += 1;
                    i += 2;
                } else if bytes[i] == b'*' && bytes.get(i + 1) == Some(&b'/') {
                    depth -= 1;
                    i += 2;
                } else {
                    i += 1;
                }
            }
            if depth > 0 {
                return "";
            }
            remaining = remaining[i..].trim_start();
        } else {
            return remaining;
        }
    }
}

/// バイトオフセットを1始まりの行・桁番号に変換
///
/// 桁番号は文字単位で数えます。
pub fn line_col(sql: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(sql.len());
    let before = sql.get(..offset).unwrap_or(sql);
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|pos| pos + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(sql: &str) -> Vec<&str> {
        split_statements(sql).into_iter().map(|s| s.text).collect()
    }

    #[test]
    fn test_simple_statements() {
        let sql = "CREATE TABLE users (id INT); INSERT INTO users VALUES (1);";
        assert_eq!(
            texts(sql),
            vec!["CREATE TABLE users (id INT)", "INSERT INTO users VALUES (1)"]
        );
    }

    #[test]
    fn test_index_and_offset() {
        let sql = "  SELECT 1;\n\n  SELECT 2";
        let spans = split_statements(sql);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].index, 1);
        assert_eq!(spans[0].offset, 2);
        assert_eq!(spans[1].index, 2);
        assert_eq!(&sql[spans[1].offset..], "SELECT 2");
    }

    #[test]
    fn test_empty_statements_are_skipped() {
        let spans = split_statements(";;  ; SELECT 1;;");
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].index, 1);
    }

    #[test]
    fn test_quoted_semicolons() {
        assert_eq!(texts("INSERT INTO t VALUES ('a;b'); SELECT 1;").len(), 2);
        assert_eq!(texts(r#"SELECT "col;name" FROM t; SELECT 1;"#).len(), 2);
        assert_eq!(texts("CREATE TABLE `a;b` (id INT); SELECT 1;").len(), 2);
    }

    #[test]
    fn test_escaped_quotes() {
        assert_eq!(
            texts("INSERT INTO t VALUES ('it''s'); SELECT 1;")[0],
            "INSERT INTO t VALUES ('it''s')"
        );
        assert_eq!(
            texts(r"INSERT INTO t VALUES ('it\'s;'); SELECT 1;")[0],
            r"INSERT INTO t VALUES ('it\'s;')"
        );
    }

    #[test]
    fn test_dollar_quoted_semicolon() {
        let sql = "CREATE FUNCTION f() RETURNS void AS $body$ BEGIN NULL; END; $body$ LANGUAGE plpgsql; SELECT 1;";
        assert_eq!(texts(sql).len(), 2);
        let sql = "CREATE FUNCTION f() RETURNS void AS $$ BEGIN NULL; END; $$ LANGUAGE plpgsql; SELECT 1;";
        assert_eq!(texts(sql).len(), 2);
    }

    #[test]
    fn test_dollar_quoted_non_ascii_body() {
        let sql = "CREATE FUNCTION f() RETURNS text AS $$ SELECT 'café; crème' $$ LANGUAGE sql;\nCREATE TABLE t (id INT);";
        let spans = split_statements(sql);
        assert_eq!(spans.len(), 2);
        assert!(spans[0].text.ends_with("LANGUAGE sql"));
        assert_eq!(spans[1].text, "CREATE TABLE t (id INT)");

        let sql = "SELECT $名前$ 日本語; $名前$; SELECT 2;";
        assert_eq!(texts(sql).len(), 3);
        let sql = "SELECT $t$ 終わらない本文";
        assert_eq!(texts(sql), vec!["SELECT $t$ 終わらない本文"]);
    }

    #[test]
    fn test_positional_parameter_is_not_dollar_quote() {
        let sql = "SELECT $1, $2; SELECT 2;";
        assert_eq!(texts(sql).len(), 2);
    }

    #[test]
    fn test_comments() {
        assert_eq!(
            texts("SELECT 1 -- comment; not a separator\nFROM t;"),
            vec!["SELECT 1 -- comment; not a separator\nFROM t"]
        );
        assert_eq!(
            texts("SELECT 1 # mysql; comment\nFROM t;"),
            vec!["SELECT 1 # mysql; comment\nFROM t"]
        );
        assert_eq!(
            texts("SELECT 1 /* outer /* inner; */ still; */ FROM t; SELECT 2;").len(),
            2
        );
    }

    #[test]
    fn test_comment_only_statement_filtered() {
        assert_eq!(texts("/* just a comment */; SELECT 1; -- trailing"), vec!["SELECT 1"]);
    }

    #[test]
    fn test_utf8_content() {
        let sql = "CREATE TABLE t (name VARCHAR(10) COMMENT '名前;氏名'); SELECT 1;";
        assert_eq!(texts(sql).len(), 2);
    }

    #[test]
    fn test_skip_leading_comments() {
        assert_eq!(skip_leading_comments("-- a\n/* b */ CREATE"), "CREATE");
        assert_eq!(skip_leading_comments("# only"), "");
        assert_eq!(skip_leading_comments("/* unterminated"), "");
    }

    #[test]
    fn test_line_col() {
        let sql = "a\nbc\n日本d";
        assert_eq!(line_col(sql, 0), (1, 1));
        assert_eq!(line_col(sql, 3), (2, 2));
        let d = sql.find('d').unwrap();
        assert_eq!(line_col(sql, d), (3, 3));
    }
}
