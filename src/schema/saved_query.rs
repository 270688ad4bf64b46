//! Name validation for saved queries.
//!
//! A saved query's name is printed verbatim into generated SQL, so it must be
//! a plain identifier that cannot be mistaken for a keyword.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{SchemaError, SchemaResult};

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_$][A-Za-z0-9_$]*$").unwrap());

/// Keywords a saved query may not be named after (compared case-insensitively).
const RESERVED_WORDS: &[&str] = &[
    "all", "and", "any", "array", "as", "asc", "between", "by", "case", "cast", "cross", "delete",
    "desc", "distinct", "drop", "else", "end", "except", "exists", "false", "final", "from",
    "full", "group", "having", "in", "inner", "insert", "intersect", "interval", "is", "join",
    "left", "like", "limit", "not", "null", "offset", "on", "or", "order", "outer", "prewhere",
    "right", "sample", "select", "table", "then", "true", "union", "update", "using", "when",
    "where", "with",
];

/// Check that `name` is safe to print as a view name.
pub fn validate_saved_query_name(name: &str) -> SchemaResult<()> {
    if name.is_empty() {
        return Err(invalid(name, "name must not be empty"));
    }
    if !NAME_PATTERN.is_match(name) {
        return Err(invalid(
            name,
            "only letters, digits, '_' and '$' are allowed, and it may not start with a digit",
        ));
    }
    let lowered = name.to_ascii_lowercase();
    if RESERVED_WORDS.contains(&lowered.as_str()) {
        return Err(invalid(name, "it is a reserved keyword"));
    }
    Ok(())
}

fn invalid(name: &str, reason: &str) -> SchemaError {
    SchemaError::InvalidSavedQueryName {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}
