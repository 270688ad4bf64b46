//! Deferred constructs: lazy joins, lazy-table select builders, and the
//! per-pass accumulators that record which sub-fields were touched.

use std::sync::Arc;

use indexmap::IndexMap;
use tracing::{debug, trace};

use super::field::{chain_key, ChainSegment, FieldChain};
use super::table::Table;
use crate::context::ResolutionContext;
use crate::error::{SchemaError, SchemaResult};
use crate::sql::{Expr, Join, Query};

// =============================================================================
// Callbacks
// =============================================================================

/// Builds the join fragment for a [`LazyJoin`] from the fields accessed through it.
pub trait JoinFunction: std::fmt::Debug + Send + Sync {
    fn join(
        &self,
        join_to_add: &LazyJoinToAdd,
        context: &ResolutionContext<'_>,
        node: &Query,
    ) -> SchemaResult<Join>;
}

/// Builds the subquery that stands in for a lazy table.
///
/// The subquery must expose every key in `table_to_add.fields_accessed` as an
/// output name, and nothing the caller did not ask for is required.
pub trait LazySelect: std::fmt::Debug + Send + Sync {
    fn lazy_select(
        &self,
        table_to_add: &LazyTableToAdd,
        context: &ResolutionContext<'_>,
        node: &Query,
    ) -> SchemaResult<Query>;
}

// =============================================================================
// LazyJoin
// =============================================================================

/// Target of a lazy join: a table held directly, or one looked up by name.
#[derive(Debug, Clone)]
pub enum JoinTarget {
    Table(Arc<Table>),
    Named(String),
}

impl From<Table> for JoinTarget {
    fn from(table: Table) -> Self {
        JoinTarget::Table(Arc::new(table))
    }
}

impl From<Arc<Table>> for JoinTarget {
    fn from(table: Arc<Table>) -> Self {
        JoinTarget::Table(table)
    }
}

impl From<&str> for JoinTarget {
    fn from(name: &str) -> Self {
        JoinTarget::Named(name.to_string())
    }
}

/// A relationship to another table that is only materialized when used.
#[derive(Debug, Clone)]
pub struct LazyJoin {
    pub join_function: Arc<dyn JoinFunction>,
    pub join_table: JoinTarget,
    /// Local key, resolved against the table the join hangs off.
    pub from_field: FieldChain,
    /// Foreign key on the joined table; `from_field` is reused when unset.
    pub to_field: Option<FieldChain>,
}

impl LazyJoin {
    pub fn new(
        join_function: impl JoinFunction + 'static,
        join_table: impl Into<JoinTarget>,
        from_field: FieldChain,
    ) -> Self {
        Self {
            join_function: Arc::new(join_function),
            join_table: join_table.into(),
            from_field,
            to_field: None,
        }
    }

    pub fn with_to_field(mut self, to_field: FieldChain) -> Self {
        self.to_field = Some(to_field);
        self
    }

    /// Effective foreign key.
    pub fn to_field(&self) -> &[ChainSegment] {
        self.to_field.as_deref().unwrap_or(&self.from_field)
    }

    /// The joined table. A held table comes back as the same `Arc`; a name
    /// is looked up in the context's registry.
    pub fn resolve_table(&self, context: &ResolutionContext<'_>) -> SchemaResult<Arc<Table>> {
        match &self.join_table {
            JoinTarget::Table(table) => Ok(Arc::clone(table)),
            JoinTarget::Named(name) => {
                let database = context
                    .database
                    .ok_or_else(|| SchemaError::resolution("Database is not set"))?;
                trace!(table = %name, "resolving lazy join target by name");
                database.get_table(name)
            }
        }
    }

    /// Produce the join fragment for the accumulated request.
    pub fn join(
        &self,
        join_to_add: &LazyJoinToAdd,
        context: &ResolutionContext<'_>,
        node: &Query,
    ) -> SchemaResult<Join> {
        debug!(
            from = %join_to_add.from_table,
            to = %join_to_add.to_table,
            fields = join_to_add.fields_accessed.len(),
            "materializing lazy join"
        );
        self.join_function.join(join_to_add, context, node)
    }
}

// =============================================================================
// Accumulators
// =============================================================================

/// Request key → chain, in first-touched order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldsAccessed(IndexMap<String, FieldChain>);

impl FieldsAccessed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a request under its derived key.
    pub fn record_chain(&mut self, chain: &[ChainSegment]) -> SchemaResult<String> {
        let key = chain_key(chain);
        self.record(&key, chain.to_vec())?;
        Ok(key)
    }

    /// Insert `key`, or confirm it already maps to the same chain.
    pub fn record(&mut self, key: &str, chain: FieldChain) -> SchemaResult<()> {
        match self.0.get(key) {
            Some(existing) if *existing == chain => Ok(()),
            Some(existing) => Err(SchemaError::resolution(format!(
                "Field key \"{}\" already records {} and cannot also record {}",
                key,
                chain_key(existing),
                chain_key(&chain)
            ))),
            None => {
                self.0.insert(key.to_string(), chain);
                Ok(())
            }
        }
    }

    /// Union with another set. Conflicting keys fail as in [`record`](Self::record).
    pub fn merge(&mut self, other: &FieldsAccessed) -> SchemaResult<()> {
        for (key, chain) in &other.0 {
            self.record(key, chain.clone())?;
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&FieldChain> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldChain)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Pending materialization of a lazy table.
#[derive(Debug, Clone)]
pub struct LazyTableToAdd {
    pub lazy_table: Arc<Table>,
    pub fields_accessed: FieldsAccessed,
}

impl LazyTableToAdd {
    pub fn new(lazy_table: Arc<Table>) -> Self {
        Self {
            lazy_table,
            fields_accessed: FieldsAccessed::new(),
        }
    }
}

/// Pending materialization of a lazy join.
#[derive(Debug, Clone)]
pub struct LazyJoinToAdd {
    /// Alias of the relation the join hangs off.
    pub from_table: String,
    /// Alias given to the joined relation.
    pub to_table: String,
    pub lazy_join: LazyJoin,
    pub fields_accessed: FieldsAccessed,
    /// Local key, already resolved against `from_table`.
    pub from_expr: Expr,
}

impl LazyJoinToAdd {
    pub fn new(from_table: &str, to_table: &str, lazy_join: LazyJoin, from_expr: Expr) -> Self {
        Self {
            from_table: from_table.to_string(),
            to_table: to_table.to_string(),
            lazy_join,
            fields_accessed: FieldsAccessed::new(),
            from_expr,
        }
    }
}
