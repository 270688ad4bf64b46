//! SQL dialects.
//!
//! The schema layer runs into three dialect differences when printing:
//!
//! - Identifier quoting: `` ` `` (ClickHouse), `"` (PostgreSQL/DuckDB)
//! - Function name casing: ClickHouse function names are case-sensitive
//! - JSON property access: `JSONExtractString(...)` vs `->>` vs `json_extract_string(...)`
//!
//! ```
//! use vschema::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::ClickHouse;
//! assert_eq!(dialect.quote_identifier("events"), "`events`");
//! ```

mod clickhouse;
mod duckdb;
pub mod helpers;
mod postgres;

pub use clickhouse::ClickHouse;
pub use duckdb::DuckDb;
pub use postgres::Postgres;

use serde::{Deserialize, Serialize};

use super::expr::JsonPathSegment;
use super::token::TokenStream;

/// How one SQL dialect prints the constructs the schema layer emits.
pub trait SqlDialect: std::fmt::Debug {
    /// Dialect name for display and logging.
    fn name(&self) -> &'static str;

    fn quote_identifier(&self, ident: &str) -> String;

    /// Quote a string literal. Single quotes with `''` escaping unless overridden.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    /// Function names are upper-cased unless the dialect says otherwise.
    fn format_function_name(&self, name: &str) -> String {
        name.to_uppercase()
    }

    /// String-typed lookup into a JSON-encoded string column.
    ///
    /// `target` is the already-rendered column expression and `path` the
    /// steps below it, outermost first. `path` is never empty.
    fn emit_json_extract(&self, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream;
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    ClickHouse,
    Postgres,
    DuckDb,
}

impl Dialect {
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::ClickHouse => &ClickHouse,
            Dialect::Postgres => &Postgres,
            Dialect::DuckDb => &DuckDb,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_function_name(&self, name: &str) -> String {
        self.dialect().format_function_name(name)
    }

    fn emit_json_extract(&self, target: TokenStream, path: &[JsonPathSegment]) -> TokenStream {
        self.dialect().emit_json_extract(target, path)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
