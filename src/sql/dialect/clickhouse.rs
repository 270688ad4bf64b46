//! ClickHouse, the primary columnar store behind the schema:
//! - Backtick identifier quoting
//! - Backslash escapes inside string literals
//! - Case-sensitive function names (`argMax`, `toDate`, `JSONExtractString`)
//! - JSON properties stored as strings, read with `JSONExtractString`

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::JsonPathSegment;
use crate::sql::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct ClickHouse;

impl SqlDialect for ClickHouse {
    fn name(&self) -> &'static str {
        "clickhouse"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_function_name(&self, name: &str) -> String {
        name.to_string()
    }

    /// Array positions are already 1-based here.
    fn emit_json_extract(&self, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
        helpers::emit_json_variadic("JSONExtractString", target, path)
    }
}
