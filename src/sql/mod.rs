//! SQL generation.
//!
//! A small typed builder used as the output currency of the schema layer:
//!
//! - [`expr`] - expression AST held by expression fields
//! - [`query`] - SELECT builder produced by lazy tables and joins
//! - [`token`] - tokens the builders lower to
//! - [`dialect`] - per-engine printing rules

pub mod dialect;
pub mod expr;
pub mod query;
pub mod token;


pub use dialect::{Dialect, SqlDialect};
pub use expr::{
    col, count_star, func, json_extract, lit_bool, lit_int, lit_str, max, min, star, sum,
    table_col, BinaryOperator, Expr, ExprExt, JsonPathSegment, Literal,
};
pub use query::{Join, JoinType, Query, SelectExpr, TableRef, TableSource};
pub use token::{Keyword, Token, TokenStream};
