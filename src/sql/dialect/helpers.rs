//! Building blocks the dialect implementations compose.

use super::super::expr::JsonPathSegment;
use super::super::token::{Token, TokenStream};

/// ANSI identifier quoting. Used by Postgres and DuckDB.
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Used by ClickHouse.
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Single quotes with backslash escapes, for engines that treat `\` as an
/// escape inside literals (ClickHouse).
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Array positions are 1-based in the path; engines with 0-based arrays
/// shift positive positions down. Negative positions count from the end in
/// both conventions.
pub fn zero_based(index: i64) -> i64 {
    if index > 0 {
        index - 1
    } else {
        index
    }
}

/// `func(target, 'a', 1, ...)`: keys as string arguments, positions as
/// integer arguments. Used by ClickHouse (`JSONExtractString`).
pub fn emit_json_variadic(function: &str, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(function.into())).lparen().append(target);
    for segment in path {
        ts.comma().space().push(match segment {
            JsonPathSegment::Key(key) => Token::Str(key.clone()),
            JsonPathSegment::Index(index) => Token::Int(*index),
        });
    }
    ts.rparen();
    ts
}

/// `func(target, '$."a"[0]')` with a single JSONPath argument.
/// Used by DuckDB (`json_extract_string`).
pub fn emit_json_path(function: &str, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
    let mut json_path = String::from("$");
    for segment in path {
        match segment {
            JsonPathSegment::Key(key) => {
                json_path.push_str(&format!(".\"{}\"", key.replace('"', "\\\"")));
            }
            JsonPathSegment::Index(index) => {
                let index = zero_based(*index);
                if index < 0 {
                    json_path.push_str(&format!("[#{}]", index));
                } else {
                    json_path.push_str(&format!("[{}]", index));
                }
            }
        }
    }

    let mut ts = TokenStream::new();
    ts.push(Token::FunctionName(function.into()))
        .lparen()
        .append(target)
        .comma()
        .space()
        .push(Token::Str(json_path))
        .rparen();
    ts
}

/// `(target::json -> 'a' ->> 0)` using the arrow operators. Used by PostgreSQL.
pub fn emit_json_arrows(target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
    let mut ts = TokenStream::new();
    ts.append(target).push(Token::Operator("::json"));
    for (i, segment) in path.iter().enumerate() {
        let op = if i + 1 == path.len() { "->>" } else { "->" };
        ts.space().push(Token::Operator(op)).space().push(match segment {
            JsonPathSegment::Key(key) => Token::Str(key.clone()),
            JsonPathSegment::Index(index) => Token::Int(zero_based(*index)),
        });
    }
    ts.parenthesized()
}
