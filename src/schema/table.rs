//! Tables: named, ordered field maps plus the printing and expansion rules
//! the compiler relies on.
//!
//! One struct covers every table variant; the [`TableKind`] tag decides how
//! the table prints, whether it is materialized lazily, and whether the
//! per-tenant guard applies.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use tracing::debug;

use super::field::{ChainSegment, DatabaseField, FieldOrTable};
use super::lazy::{LazySelect, LazyTableToAdd};
use super::saved_query::validate_saved_query_name;
use crate::context::ResolutionContext;
use crate::error::{SchemaError, SchemaResult};
use crate::sql::Query;

/// Column every physical table is partitioned (and guarded) by unless told otherwise.
pub const DEFAULT_PARTITION_COLUMN: &str = "team_id";

/// The two printed forms of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedNames {
    /// Name of the relation in the physical store.
    pub store: String,
    /// Name query authors use.
    pub logical: String,
}

/// Table variant.
#[derive(Debug, Clone)]
pub enum TableKind {
    /// A physical table.
    Standard,
    /// Replaced by a subquery built from the fields actually requested.
    Lazy {
        select: Option<Arc<dyn LazySelect>>,
    },
    /// Nested namespace over the parent's row; never joined.
    Virtual,
    /// A store-side callable relation such as `numbers(n)`.
    FunctionCall {
        name: String,
        min_args: Option<usize>,
        max_args: Option<usize>,
    },
    /// A user-defined view over raw query text.
    SavedQuery { name: String, query: String },
}

impl TableKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            TableKind::Standard => "standard",
            TableKind::Lazy { .. } => "lazy",
            TableKind::Virtual => "virtual",
            TableKind::FunctionCall { .. } => "function_call",
            TableKind::SavedQuery { .. } => "saved_query",
        }
    }

    /// Whether the compiler adds the per-tenant row guard when reading this
    /// table directly. Function calls have synthetic rows, saved queries
    /// guard inside their own text, and lazy tables guard inside the
    /// subquery they generate.
    pub fn has_tenant_guard(&self) -> bool {
        matches!(self, TableKind::Standard)
    }
}

/// A table in the schema graph.
#[derive(Debug, Clone)]
pub struct Table {
    type_name: String,
    kind: TableKind,
    fields: IndexMap<String, FieldOrTable>,
    printed: Option<PrintedNames>,
    avoid_asterisk: Vec<String>,
    partition_column: String,
}

impl Table {
    /// Start a standard table. `type_name` identifies the table in errors.
    pub fn builder(type_name: &str) -> TableBuilder {
        TableBuilder::new(type_name, TableKind::Standard)
    }

    /// Start a virtual table.
    pub fn virtual_table(type_name: &str) -> TableBuilder {
        TableBuilder::new(type_name, TableKind::Virtual)
    }

    /// Start a lazy table whose subquery is produced by `select`.
    pub fn lazy(type_name: &str, select: impl LazySelect + 'static) -> TableBuilder {
        TableBuilder::new(
            type_name,
            TableKind::Lazy {
                select: Some(Arc::new(select)),
            },
        )
    }

    /// Start a table function such as `numbers`.
    pub fn function_call(name: &str, min_args: Option<usize>, max_args: Option<usize>) -> TableBuilder {
        TableBuilder::new(
            "FunctionCallTable",
            TableKind::FunctionCall {
                name: name.to_string(),
                min_args,
                max_args,
            },
        )
    }

    /// Start a saved query. The name is validated when printed, not here.
    pub fn saved_query(name: &str, query: &str) -> TableBuilder {
        TableBuilder::new(
            "SavedQuery",
            TableKind::SavedQuery {
                name: name.to_string(),
                query: query.to_string(),
            },
        )
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn kind(&self) -> &TableKind {
        &self.kind
    }

    pub fn is_lazy(&self) -> bool {
        matches!(self.kind, TableKind::Lazy { .. })
    }

    pub fn is_virtual(&self) -> bool {
        matches!(self.kind, TableKind::Virtual)
    }

    pub fn partition_column(&self) -> &str {
        &self.partition_column
    }

    /// Declared entries, in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldOrTable)> {
        self.fields.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub fn has_field(&self, name: impl Into<ChainSegment>) -> bool {
        self.fields.contains_key(&name.into().to_string())
    }

    pub fn get_field(&self, name: impl Into<ChainSegment>) -> SchemaResult<&FieldOrTable> {
        let name = name.into().to_string();
        self.fields
            .get(&name)
            .ok_or_else(|| SchemaError::FieldNotFound {
                field: name,
                table: self.type_name.clone(),
            })
    }

    /// Name of the relation in the physical store.
    pub fn to_printed_store_reference(&self, _context: &ResolutionContext<'_>) -> SchemaResult<String> {
        match &self.kind {
            TableKind::SavedQuery { name, .. } => {
                validate_saved_query_name(name)?;
                Ok(name.clone())
            }
            TableKind::FunctionCall { name, .. } => Ok(name.clone()),
            _ => self
                .printed
                .as_ref()
                .map(|p| p.store.clone())
                .ok_or_else(|| {
                    SchemaError::unimplemented(format!("{}.to_printed_store_reference", self.type_name))
                }),
        }
    }

    /// Name query authors use for this table.
    pub fn to_printed_logical_name(&self) -> SchemaResult<String> {
        match &self.kind {
            TableKind::SavedQuery { name, .. } => {
                validate_saved_query_name(name)?;
                Ok(name.clone())
            }
            TableKind::FunctionCall { name, .. } => Ok(name.clone()),
            _ => self
                .printed
                .as_ref()
                .map(|p| p.logical.clone())
                .ok_or_else(|| {
                    SchemaError::unimplemented(format!("{}.to_printed_logical_name", self.type_name))
                }),
        }
    }

    /// Names left out of `*` expansion on top of the partition column.
    pub fn avoid_asterisk_fields(&self) -> &[String] {
        &self.avoid_asterisk
    }

    /// Fields a bare `*` yields, in declaration order.
    ///
    /// Structural entries (nested tables, joins, traversers) and hidden fields
    /// are skipped. An entry this layer cannot classify is an error rather
    /// than silently dropped.
    pub fn get_asterisk(&self) -> SchemaResult<IndexMap<&str, &DatabaseField>> {
        let mut avoid: HashSet<&str> = self.avoid_asterisk.iter().map(String::as_str).collect();
        avoid.insert(self.partition_column.as_str());

        let mut asterisk = IndexMap::new();
        for (key, entry) in &self.fields {
            if avoid.contains(key.as_str()) {
                continue;
            }
            match entry {
                FieldOrTable::Table(_) | FieldOrTable::LazyJoin(_) | FieldOrTable::Traverser(_) => {}
                FieldOrTable::Field(field) => {
                    if !field.hidden {
                        asterisk.insert(key.as_str(), field);
                    }
                }
                FieldOrTable::Custom(custom) => {
                    return Err(SchemaError::resolution(format!(
                        "Unknown field type {} for asterisk",
                        custom.type_name()
                    )));
                }
            }
        }
        Ok(asterisk)
    }

    /// Build the subquery standing in for this lazy table.
    pub fn lazy_select(
        &self,
        table_to_add: &LazyTableToAdd,
        context: &ResolutionContext<'_>,
        node: &Query,
    ) -> SchemaResult<Query> {
        match &self.kind {
            TableKind::Lazy {
                select: Some(select),
            } => {
                debug!(
                    table = %self.type_name,
                    fields = table_to_add.fields_accessed.len(),
                    "materializing lazy table"
                );
                select.lazy_select(table_to_add, context, node)
            }
            _ => Err(SchemaError::unimplemented(format!("{}.lazy_select", self.type_name))),
        }
    }

    /// Check an argument count against a table function's arity.
    pub fn validate_function_args(&self, count: usize) -> SchemaResult<()> {
        let TableKind::FunctionCall {
            name,
            min_args,
            max_args,
        } = &self.kind
        else {
            return Err(SchemaError::resolution(format!(
                "{} is not a table function",
                self.type_name
            )));
        };

        if let Some(min) = min_args {
            if count < *min {
                return Err(SchemaError::InvalidArguments {
                    table: name.clone(),
                    message: format!("expects at least {} argument(s), got {}", min, count),
                });
            }
        }
        if let Some(max) = max_args {
            if count > *max {
                return Err(SchemaError::InvalidArguments {
                    table: name.clone(),
                    message: format!("expects at most {} argument(s), got {}", max, count),
                });
            }
        }
        Ok(())
    }
}

/// Fluent construction of a [`Table`].
#[derive(Debug)]
#[must_use = "builders have no effect until build() is called"]
pub struct TableBuilder {
    table: Table,
}

impl TableBuilder {
    fn new(type_name: &str, kind: TableKind) -> Self {
        Self {
            table: Table {
                type_name: type_name.to_string(),
                kind,
                fields: IndexMap::new(),
                printed: None,
                avoid_asterisk: Vec::new(),
                partition_column: DEFAULT_PARTITION_COLUMN.to_string(),
            },
        }
    }

    /// Use the same name for the store reference and the logical name.
    pub fn printed(self, name: &str) -> Self {
        self.printed_as(name, name)
    }

    pub fn printed_as(mut self, store: &str, logical: &str) -> Self {
        self.table.printed = Some(PrintedNames {
            store: store.to_string(),
            logical: logical.to_string(),
        });
        self
    }

    /// Declare an entry. Redeclaring a name replaces the entry in place.
    pub fn field(mut self, name: &str, entry: impl Into<FieldOrTable>) -> Self {
        self.table.fields.insert(name.to_string(), entry.into());
        self
    }

    pub fn avoid_asterisk<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.table.avoid_asterisk.extend(names.into_iter().map(Into::into));
        self
    }

    pub fn partition_column(mut self, column: &str) -> Self {
        self.table.partition_column = column.to_string();
        self
    }

    pub fn build(self) -> Table {
        self.table
    }
}
