//! Field-chain resolution against the schema graph.
//!
//! A [`ResolutionPass`] works in two phases:
//!
//! 1. **Accumulate.** Each call to [`ResolutionPass::resolve`] walks one field
//!    chain. Plain fields become column references right away. Chains that
//!    run through a lazy join, or start on a lazy root table, are not
//!    resolved: the remaining chain is recorded on that construct's
//!    accumulator and the caller gets a reference to the name the deferred
//!    relation will expose.
//! 2. **Materialize.** [`ResolutionPass::finish`] sets the FROM clause, adds
//!    the tenant guard, and asks every touched lazy construct for its
//!    fragment exactly once, parents before children.
//!
//! ```text
//! events.person.properties.email
//!   events      direct scope (root)
//!   person      LazyJoin → register events__person, switch to deferred scope
//!   properties.email  recorded as "properties___email" on events__person
//! result:       events__person.properties___email
//! ```
//!
//! Join aliases are built from every name walked since the last relation,
//! so a join reached through a virtual table (`users.meta.link`) is
//! `users__meta__link` and never shares an alias with `users.link`.

use std::collections::HashMap;
use std::sync::Arc;

use indexmap::IndexMap;
use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::{debug, trace};

use crate::context::ResolutionContext;
use crate::error::{SchemaError, SchemaResult};
use crate::schema::{
    ChainSegment, FieldOrTable, FieldType, FieldsAccessed, LazyJoin, LazyJoinToAdd,
    LazyTableToAdd, Table, TableKind,
};
use crate::sql::{
    json_extract, table_col, Expr, ExprExt, Join, JsonPathSegment, Query, SelectExpr, TableRef,
};

/// Traverser splices deeper than this are treated as a cycle.
const MAX_SPLICES: usize = 32;

/// Accumulator a deferred scope records into.
#[derive(Debug, Clone)]
enum Owner {
    Root,
    Join(String),
}

#[derive(Debug, Clone)]
enum Scope {
    /// Fields read straight off the row of `alias`. `path` is the join alias
    /// stem: `alias` plus any virtual tables walked into.
    Direct {
        table: Arc<Table>,
        alias: String,
        path: String,
    },
    /// Fields requested from a relation that is materialized later.
    Deferred {
        table: Arc<Table>,
        alias: String,
        owner: Owner,
    },
}

/// One resolution pass over a single root table.
#[derive(Debug)]
pub struct ResolutionPass<'a> {
    context: ResolutionContext<'a>,
    root: Arc<Table>,
    alias: String,
    function_args: Vec<Expr>,
    lazy_table: Option<LazyTableToAdd>,
    lazy_joins: IndexMap<String, LazyJoinToAdd>,
}

impl<'a> ResolutionPass<'a> {
    pub fn new(context: ResolutionContext<'a>, root: Arc<Table>, alias: &str) -> Self {
        let lazy_table = root
            .is_lazy()
            .then(|| LazyTableToAdd::new(Arc::clone(&root)));
        Self {
            context,
            root,
            alias: alias.to_string(),
            function_args: Vec::new(),
            lazy_table,
            lazy_joins: IndexMap::new(),
        }
    }

    /// Arguments passed to a function-call root, e.g. `numbers(10)`.
    pub fn with_function_args(mut self, args: Vec<Expr>) -> Self {
        self.function_args = args;
        self
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// Pending lazy joins, keyed by the alias they will be joined under.
    pub fn lazy_joins(&self) -> &IndexMap<String, LazyJoinToAdd> {
        &self.lazy_joins
    }

    /// Pending materialization of the root, when the root is lazy.
    pub fn lazy_table(&self) -> Option<&LazyTableToAdd> {
        self.lazy_table.as_ref()
    }

    /// Resolve a field chain to an expression over the final query.
    pub fn resolve(&mut self, chain: &[ChainSegment]) -> SchemaResult<Expr> {
        if chain.is_empty() {
            return Err(SchemaError::resolution("Cannot resolve an empty field chain"));
        }
        trace!(chain = %crate::schema::chain_key(chain), root = %self.alias, "resolving field chain");
        let scope = if self.root.is_lazy() {
            Scope::Deferred {
                table: Arc::clone(&self.root),
                alias: self.alias.clone(),
                owner: Owner::Root,
            }
        } else {
            Scope::Direct {
                table: Arc::clone(&self.root),
                alias: self.alias.clone(),
                path: self.alias.clone(),
            }
        };
        self.walk(scope, chain.to_vec())
    }

    /// Expand `*` on the root into aliased select items.
    pub fn resolve_asterisk(&mut self) -> SchemaResult<Vec<SelectExpr>> {
        let names: Vec<String> = self
            .root
            .get_asterisk()?
            .keys()
            .map(|name| name.to_string())
            .collect();

        names
            .iter()
            .map(|name| {
                let expr = self.resolve(&[ChainSegment::from(name.as_str())])?;
                Ok(SelectExpr::new(expr).with_alias(name))
            })
            .collect()
    }

    fn walk(&mut self, mut scope: Scope, mut remaining: Vec<ChainSegment>) -> SchemaResult<Expr> {
        let mut splices = 0;
        loop {
            let Some(head) = remaining.first().cloned() else {
                return Err(SchemaError::resolution("Field chain ended on a table"));
            };
            let rest = remaining[1..].to_vec();

            match scope {
                Scope::Direct { table, alias, path } => {
                    let entry = table.get_field(&head)?.clone();
                    match entry {
                        FieldOrTable::Field(field) => {
                            let base = match field.expr() {
                                Some(expr) => expr.qualify(&alias),
                                None => table_col(&alias, &field.name),
                            };
                            if rest.is_empty() {
                                return Ok(base);
                            }
                            if field.field_type == FieldType::StringJson {
                                return Ok(json_extract(
                                    base,
                                    rest.iter().map(JsonPathSegment::from).collect(),
                                ));
                            }
                            return Err(SchemaError::resolution(format!(
                                "Field \"{}\" of type {} has no sub-fields",
                                head,
                                field.field_type.type_name()
                            )));
                        }
                        FieldOrTable::Traverser(traverser) => {
                            splices += 1;
                            if splices > MAX_SPLICES {
                                return Err(SchemaError::resolution(format!(
                                    "Field traversal through \"{}\" does not terminate",
                                    head
                                )));
                            }
                            remaining = [traverser.chain, rest].concat();
                            scope = Scope::Direct { table, alias, path };
                        }
                        FieldOrTable::Table(nested) => {
                            if rest.is_empty() {
                                return Err(select_whole(&head, nested.type_name()));
                            }
                            if !nested.is_virtual() {
                                return Err(SchemaError::resolution(format!(
                                    "Cannot read table \"{}\" ({}) through {}",
                                    head,
                                    nested.kind().kind_name(),
                                    table.type_name()
                                )));
                            }
                            remaining = rest;
                            scope = Scope::Direct {
                                table: nested,
                                alias,
                                path: format!("{}__{}", path, head),
                            };
                        }
                        FieldOrTable::LazyJoin(join) => {
                            if rest.is_empty() {
                                return Err(select_whole(&head, "LazyJoin"));
                            }
                            let from_expr = self.walk(
                                Scope::Direct {
                                    table: Arc::clone(&table),
                                    alias: alias.clone(),
                                    path: path.clone(),
                                },
                                join.from_field.clone(),
                            )?;
                            let to_alias = format!("{}__{}", path, head);
                            scope = self.enter_join(&alias, &to_alias, join, from_expr)?;
                            remaining = rest;
                        }
                        FieldOrTable::Custom(custom) => {
                            return Err(SchemaError::resolution(format!(
                                "Cannot resolve field \"{}\" of type {}",
                                head,
                                custom.type_name()
                            )));
                        }
                    }
                }
                Scope::Deferred {
                    table,
                    alias,
                    owner,
                } => {
                    let entry = table.get_field(&head)?.clone();
                    match entry {
                        FieldOrTable::LazyJoin(_) if rest.is_empty() => {
                            return Err(select_whole(&head, "LazyJoin"));
                        }
                        FieldOrTable::Table(nested) if rest.is_empty() => {
                            return Err(select_whole(&head, nested.type_name()));
                        }
                        FieldOrTable::LazyJoin(join) => {
                            let key = self
                                .accumulator(&owner)?
                                .record_chain(&join.from_field)?;
                            let from_expr = table_col(&alias, &key);
                            let to_alias = format!("{}__{}", alias, head);
                            scope = self.enter_join(&alias, &to_alias, join, from_expr)?;
                            remaining = rest;
                        }
                        FieldOrTable::Traverser(traverser) => {
                            splices += 1;
                            if splices > MAX_SPLICES {
                                return Err(SchemaError::resolution(format!(
                                    "Field traversal through \"{}\" does not terminate",
                                    head
                                )));
                            }
                            remaining = [traverser.chain, rest].concat();
                            scope = Scope::Deferred {
                                table,
                                alias,
                                owner,
                            };
                        }
                        FieldOrTable::Custom(custom) => {
                            return Err(SchemaError::resolution(format!(
                                "Cannot resolve field \"{}\" of type {}",
                                head,
                                custom.type_name()
                            )));
                        }
                        FieldOrTable::Field(_) | FieldOrTable::Table(_) => {
                            let key = self.accumulator(&owner)?.record_chain(&remaining)?;
                            trace!(relation = %alias, key = %key, "deferred field request");
                            return Ok(table_col(&alias, &key));
                        }
                    }
                }
            }
        }
    }

    /// Register (or reuse) the join `to_alias` hanging off relation `from_alias`.
    ///
    /// Reuse requires the same local key; anything else under the same alias
    /// would silently merge two different joins.
    fn enter_join(
        &mut self,
        from_alias: &str,
        to_alias: &str,
        join: LazyJoin,
        from_expr: Expr,
    ) -> SchemaResult<Scope> {
        let joined = join.resolve_table(&self.context)?;
        match self.lazy_joins.get(to_alias) {
            Some(existing) if existing.from_expr != from_expr => {
                return Err(SchemaError::resolution(format!(
                    "Lazy join alias \"{}\" is already used by a join on a different key",
                    to_alias
                )));
            }
            Some(_) => {}
            None => {
                debug!(from = %from_alias, to = %to_alias, "registering lazy join");
                self.lazy_joins.insert(
                    to_alias.to_string(),
                    LazyJoinToAdd::new(from_alias, to_alias, join, from_expr),
                );
            }
        }
        Ok(Scope::Deferred {
            table: joined,
            alias: to_alias.to_string(),
            owner: Owner::Join(to_alias.to_string()),
        })
    }

    fn accumulator(&mut self, owner: &Owner) -> SchemaResult<&mut FieldsAccessed> {
        match owner {
            Owner::Root => self
                .lazy_table
                .as_mut()
                .map(|table| &mut table.fields_accessed)
                .ok_or_else(|| SchemaError::resolution("Root table is not lazy")),
            Owner::Join(alias) => self
                .lazy_joins
                .get_mut(alias)
                .map(|join| &mut join.fields_accessed)
                .ok_or_else(|| {
                    SchemaError::resolution(format!("Lazy join \"{}\" was never registered", alias))
                }),
        }
    }

    /// Lazy joins in materialization order: every join after the join it hangs off.
    fn ordered_joins(&self) -> SchemaResult<Vec<&LazyJoinToAdd>> {
        let mut graph: DiGraph<&str, ()> = DiGraph::new();
        let mut nodes: HashMap<&str, NodeIndex> = HashMap::new();
        for alias in self.lazy_joins.keys() {
            nodes.insert(alias.as_str(), graph.add_node(alias.as_str()));
        }
        for (alias, join) in &self.lazy_joins {
            if let Some(parent) = nodes.get(join.from_table.as_str()) {
                graph.add_edge(*parent, nodes[alias.as_str()], ());
            }
        }

        let order = toposort(&graph, None).map_err(|cycle| {
            SchemaError::resolution(format!(
                "Lazy joins depend on each other in a cycle at \"{}\"",
                graph[cycle.node_id()]
            ))
        })?;

        Ok(order
            .into_iter()
            .filter_map(|idx| self.lazy_joins.get(graph[idx]))
            .collect())
    }

    /// Materialize everything the pass accumulated into `query`.
    pub fn finish(self, query: Query) -> SchemaResult<Query> {
        let context = self.context;
        let from = match self.root.kind() {
            TableKind::Lazy { .. } => {
                let to_add = self
                    .lazy_table
                    .clone()
                    .unwrap_or_else(|| LazyTableToAdd::new(Arc::clone(&self.root)));
                let select = self.root.lazy_select(&to_add, &context, &query)?;
                TableRef::subquery(select).with_alias(&self.alias)
            }
            TableKind::FunctionCall { name, .. } => {
                self.root.validate_function_args(self.function_args.len())?;
                TableRef::function(name, self.function_args.clone()).with_alias(&self.alias)
            }
            TableKind::Virtual => {
                return Err(SchemaError::resolution(format!(
                    "Cannot select from virtual table {} directly",
                    self.root.type_name()
                )));
            }
            TableKind::SavedQuery { query: text, .. } => {
                let name = self.root.to_printed_store_reference(&context)?;
                debug!(saved_query = %name, alias = %self.alias, "inlining saved query");
                TableRef::sql(text).with_alias(&self.alias)
            }
            TableKind::Standard => {
                TableRef::new(&self.root.to_printed_store_reference(&context)?).with_alias(&self.alias)
            }
        };
        let mut query = query.from(from);

        if let Some(tenant_id) = context.tenant_id {
            let partition = self.root.partition_column();
            if self.root.kind().has_tenant_guard() && self.root.has_field(partition) {
                query = query.filter(table_col(&self.alias, partition).eq(tenant_id));
            }
        }

        let ordered = self.ordered_joins()?;
        debug!(
            root = %self.alias,
            joins = ?ordered.iter().map(|j| j.to_table.as_str()).collect::<Vec<_>>(),
            "materializing lazy joins"
        );
        let mut fragments = Vec::with_capacity(ordered.len());
        for join_to_add in ordered {
            fragments.push(join_to_add.lazy_join.join(join_to_add, &context, &query)?);
        }
        Ok(fragments.into_iter().fold(query, Query::with_join))
    }
}

fn select_whole(name: &ChainSegment, type_name: &str) -> SchemaError {
    SchemaError::resolution(format!(
        "Cannot select {} \"{}\" directly, select one of its fields",
        type_name, name
    ))
}

/// Subquery over `table` exposing each accessed key under its own name.
///
/// Runs a nested pass, so the subquery carries its own tenant guard and any
/// joins the requested chains need.
pub fn select_fields(
    context: &ResolutionContext<'_>,
    table: &Arc<Table>,
    alias: &str,
    fields: &FieldsAccessed,
) -> SchemaResult<Query> {
    let mut pass = ResolutionPass::new(*context, Arc::clone(table), alias);
    let mut select = Vec::with_capacity(fields.len());
    for (key, chain) in fields.iter() {
        select.push(SelectExpr::new(pass.resolve(chain)?).with_alias(key));
    }
    pass.finish(Query::new().select(select))
}

/// Standard lazy join: `LEFT JOIN (subquery) AS to_table ON from_expr = to_table.to_key`.
pub fn join_subquery(join_to_add: &LazyJoinToAdd, context: &ResolutionContext<'_>) -> SchemaResult<Join> {
    let (subquery, to_key) = join_target_query(join_to_add, context)?;
    Ok(join_on_key(join_to_add, subquery, &to_key))
}

/// Subquery for the target of a join plus the name it exposes the foreign key under.
pub fn join_target_query(
    join_to_add: &LazyJoinToAdd,
    context: &ResolutionContext<'_>,
) -> SchemaResult<(Query, String)> {
    let table = join_to_add.lazy_join.resolve_table(context)?;
    let mut fields = join_to_add.fields_accessed.clone();
    let to_key = fields.record_chain(join_to_add.lazy_join.to_field())?;
    let subquery = select_fields(context, &table, &join_to_add.to_table, &fields)?;
    Ok((subquery, to_key))
}

/// Left-join `subquery` under the join's alias on its local key.
pub fn join_on_key(join_to_add: &LazyJoinToAdd, subquery: Query, to_key: &str) -> Join {
    Join::left(
        TableRef::subquery(subquery).with_alias(&join_to_add.to_table),
        join_to_add
            .from_expr
            .clone()
            .eq(table_col(&join_to_add.to_table, to_key)),
    )
}
