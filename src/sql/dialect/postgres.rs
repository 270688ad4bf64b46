//! PostgreSQL: ANSI identifier quoting and `->` / `->>` for JSON access.

use super::helpers;
use super::SqlDialect;
use crate::sql::expr::JsonPathSegment;
use crate::sql::token::TokenStream;

#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn emit_json_extract(&self, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
        helpers::emit_json_arrows(target, path)
    }
}
