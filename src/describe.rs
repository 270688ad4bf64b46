//! Serializable description of a registry, for tooling and front-ends.
//!
//! The description is a flat snapshot: nested virtual tables are inlined,
//! lazy joins report their target by name, and computed fields carry the
//! SQL they expand to in the requested dialect.

use serde::Serialize;

use crate::context::ResolutionContext;
use crate::error::SchemaResult;
use crate::schema::{ChainSegment, Database, FieldOrTable, JoinTarget, Table};
use crate::sql::Dialect;

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseSchema {
    pub dialect: Dialect,
    pub tables: Vec<TableSchema>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableSchema {
    /// Registry name.
    pub name: String,
    pub type_name: String,
    pub kind: &'static str,
    pub store_name: Option<String>,
    pub logical_name: Option<String>,
    pub partition_column: String,
    pub fields: Vec<FieldSchema>,
    /// Names `*` expands to.
    pub asterisk: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldSchema {
    pub name: String,
    #[serde(flatten)]
    pub entry: EntrySchema,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum EntrySchema {
    Field {
        column: String,
        field_type: &'static str,
        hidden: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        nullable: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        array: Option<bool>,
        #[serde(skip_serializing_if = "Option::is_none")]
        expression: Option<String>,
    },
    Traverser {
        chain: Vec<ChainSegment>,
    },
    Table {
        type_name: String,
        kind: &'static str,
        fields: Vec<FieldSchema>,
    },
    LazyJoin {
        target: String,
        from_field: Vec<ChainSegment>,
        to_field: Vec<ChainSegment>,
    },
    Custom {
        type_name: String,
    },
}

impl DatabaseSchema {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.iter().find(|t| t.name == name)
    }
}

/// Snapshot every table in `database`.
///
/// Fails when a table's `*` expansion fails, e.g. on an entry this layer
/// cannot classify.
pub fn describe_database(database: &Database, dialect: Dialect) -> SchemaResult<DatabaseSchema> {
    let context = ResolutionContext::new(dialect).with_database(database);
    let tables = database
        .tables()
        .map(|(name, table)| {
            let asterisk = table
                .get_asterisk()?
                .keys()
                .map(|k| k.to_string())
                .collect();
            Ok(TableSchema {
                name: name.to_string(),
                type_name: table.type_name().to_string(),
                kind: table.kind().kind_name(),
                store_name: table.to_printed_store_reference(&context).ok(),
                logical_name: table.to_printed_logical_name().ok(),
                partition_column: table.partition_column().to_string(),
                fields: describe_fields(table, dialect),
                asterisk,
            })
        })
        .collect::<SchemaResult<Vec<_>>>()?;
    Ok(DatabaseSchema { dialect, tables })
}

fn describe_fields(table: &Table, dialect: Dialect) -> Vec<FieldSchema> {
    table
        .fields()
        .map(|(name, entry)| FieldSchema {
            name: name.to_string(),
            entry: describe_entry(entry, dialect),
        })
        .collect()
}

fn describe_entry(entry: &FieldOrTable, dialect: Dialect) -> EntrySchema {
    match entry {
        FieldOrTable::Field(field) => EntrySchema::Field {
            column: field.name.clone(),
            field_type: field.field_type.type_name(),
            hidden: field.hidden,
            nullable: field.nullable,
            array: field.array,
            expression: field.expr().map(|expr| expr.to_sql(dialect)),
        },
        FieldOrTable::Traverser(traverser) => EntrySchema::Traverser {
            chain: traverser.chain.clone(),
        },
        FieldOrTable::Table(table) => EntrySchema::Table {
            type_name: table.type_name().to_string(),
            kind: table.kind().kind_name(),
            fields: describe_fields(table, dialect),
        },
        FieldOrTable::LazyJoin(join) => EntrySchema::LazyJoin {
            target: match &join.join_table {
                JoinTarget::Named(name) => name.clone(),
                JoinTarget::Table(table) => table
                    .to_printed_logical_name()
                    .unwrap_or_else(|_| table.type_name().to_string()),
            },
            from_field: join.from_field.clone(),
            to_field: join.to_field().to_vec(),
        },
        FieldOrTable::Custom(custom) => EntrySchema::Custom {
            type_name: custom.type_name().to_string(),
        },
    }
}
