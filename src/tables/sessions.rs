//! Sessions: a lazy table aggregated on demand from `raw_sessions`.
//!
//! `raw_sessions` holds several partial rows per session. The lazy select
//! groups them by `session_id` and computes only the aggregates the query
//! actually asked for.

use crate::context::ResolutionContext;
use crate::error::{SchemaError, SchemaResult};
use crate::resolver::join_subquery;
use crate::schema::{DatabaseField, JoinFunction, LazyJoinToAdd, LazySelect, LazyTableToAdd, Table};
use crate::sql::{func, lit_str, max, min, sum, table_col, Expr, ExprExt, Join, Query, SelectExpr, TableRef};

const RAW: &str = "raw_sessions";

pub fn raw_sessions_table(partition_column: &str) -> Table {
    Table::builder("RawSessionsTable")
        .printed(RAW)
        .field("session_id", DatabaseField::string("session_id"))
        .field(partition_column, DatabaseField::integer(partition_column))
        .field("distinct_id", DatabaseField::string("distinct_id"))
        .field("min_timestamp", DatabaseField::datetime("min_timestamp"))
        .field("max_timestamp", DatabaseField::datetime("max_timestamp"))
        .field("pageview_count", DatabaseField::integer("pageview_count"))
        .field("entry_url", DatabaseField::string("entry_url"))
        .partition_column(partition_column)
        .build()
}

pub fn sessions_table(partition_column: &str) -> Table {
    Table::lazy(
        "SessionsTable",
        SessionsSelect {
            partition_column: partition_column.to_string(),
        },
    )
    .printed("sessions")
    .field("session_id", DatabaseField::string("session_id"))
    .field("distinct_id", DatabaseField::string("distinct_id"))
    .field("$start_timestamp", DatabaseField::datetime("$start_timestamp"))
    .field("$end_timestamp", DatabaseField::datetime("$end_timestamp"))
    .field("$entry_current_url", DatabaseField::string("$entry_current_url"))
    .field("$pageview_count", DatabaseField::integer("$pageview_count"))
    .field("$session_duration", DatabaseField::integer("$session_duration"))
    .partition_column(partition_column)
    .build()
}

/// Aggregate over `raw_sessions` backing each sessions field.
fn aggregate(field: &str) -> Option<Expr> {
    let raw = |column: &str| table_col(RAW, column);
    let expr = match field {
        "session_id" => raw("session_id"),
        "distinct_id" => min(raw("distinct_id")),
        "$start_timestamp" => min(raw("min_timestamp")),
        "$end_timestamp" => max(raw("max_timestamp")),
        "$entry_current_url" => func("argMin", vec![raw("entry_url"), raw("min_timestamp")]),
        "$pageview_count" => sum(raw("pageview_count")),
        "$session_duration" => func(
            "dateDiff",
            vec![lit_str("second"), min(raw("min_timestamp")), max(raw("max_timestamp"))],
        ),
        _ => return None,
    };
    Some(expr)
}

#[derive(Debug, Clone)]
pub struct SessionsSelect {
    partition_column: String,
}

impl LazySelect for SessionsSelect {
    fn lazy_select(
        &self,
        table_to_add: &LazyTableToAdd,
        context: &ResolutionContext<'_>,
        _node: &Query,
    ) -> SchemaResult<Query> {
        let mut select = Vec::with_capacity(table_to_add.fields_accessed.len().max(1));
        for (key, chain) in table_to_add.fields_accessed.iter() {
            let name = chain.first().map(ToString::to_string).unwrap_or_default();
            if chain.len() > 1 {
                return Err(SchemaError::resolution(format!(
                    "Field \"{}\" on sessions has no sub-fields",
                    name
                )));
            }
            let expr = aggregate(&name).ok_or_else(|| SchemaError::FieldNotFound {
                field: name.clone(),
                table: table_to_add.lazy_table.type_name().to_string(),
            })?;
            select.push(SelectExpr::new(expr).with_alias(key));
        }
        if select.is_empty() {
            select.push(SelectExpr::new(table_col(RAW, "session_id")).with_alias("session_id"));
        }

        let mut query = Query::new()
            .select(select)
            .from(TableRef::new(RAW).with_alias(RAW))
            .group_by(vec![table_col(RAW, "session_id")]);
        if let Some(tenant_id) = context.tenant_id {
            query = query.filter(table_col(RAW, &self.partition_column).eq(tenant_id));
        }
        Ok(query)
    }
}

/// Joins sessions on the session id carried by the parent row.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinToSessions;

impl JoinFunction for JoinToSessions {
    fn join(
        &self,
        join_to_add: &LazyJoinToAdd,
        context: &ResolutionContext<'_>,
        _node: &Query,
    ) -> SchemaResult<Join> {
        join_subquery(join_to_add, context)
    }
}
