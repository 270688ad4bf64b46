//! DuckDB prints like PostgreSQL for everything the schema layer emits,
//! except JSON access, which goes through `json_extract_string` with a
//! JSONPath argument.

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::JsonPathSegment;
use crate::sql::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct DuckDb;

impl SqlDialect for DuckDb {
    fn name(&self) -> &'static str {
        "duckdb"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn emit_json_extract(&self, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
        helpers::emit_json_path("json_extract_string", target, path)
    }
}
