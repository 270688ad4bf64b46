use crate::context::ResolutionContext;
use crate::error::SchemaResult;
use crate::resolver::{join_on_key, join_target_query};
use crate::schema::{DatabaseField, JoinFunction, LazyJoinToAdd, Table};
use crate::sql::{table_col, ExprExt, Join, Query};

pub fn persons_table(partition_column: &str) -> Table {
    Table::builder("PersonsTable")
        .printed_as("person", "persons")
        .field("id", DatabaseField::string("id"))
        .field("created_at", DatabaseField::datetime("created_at"))
        .field(partition_column, DatabaseField::integer(partition_column))
        .field("properties", DatabaseField::json("properties"))
        .field("is_identified", DatabaseField::boolean("is_identified"))
        .field("version", DatabaseField::integer("version").hidden())
        .field("is_deleted", DatabaseField::boolean("is_deleted").hidden())
        .partition_column(partition_column)
        .build()
}

/// Joins persons by id, leaving deleted persons out of the joined subquery.
#[derive(Debug, Clone, Copy, Default)]
pub struct JoinToPersons;

impl JoinFunction for JoinToPersons {
    fn join(
        &self,
        join_to_add: &LazyJoinToAdd,
        context: &ResolutionContext<'_>,
        _node: &Query,
    ) -> SchemaResult<Join> {
        let (subquery, to_key) = join_target_query(join_to_add, context)?;
        let subquery = subquery.filter(table_col(&join_to_add.to_table, "is_deleted").eq(false));
        Ok(join_on_key(join_to_add, subquery, &to_key))
    }
}
