//! # vschema
//!
//! Schema virtualization and field resolution for a logical analytics query
//! language. Query authors write field chains such as
//! `events.person.properties.email`; this crate maps them onto the physical
//! tables and columns of the store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                 Settings (TOML)                          │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [tables::create_database]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Database: Table → Field / Traverser / Table / LazyJoin │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [resolver: accumulate, then materialize]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Query (FROM, tenant guard, lazy joins)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [sql::dialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │          SQL text (ClickHouse, PostgreSQL, DuckDB)       │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod context;
pub mod describe;
pub mod error;
pub mod resolver;
pub mod schema;
pub mod sql;
pub mod tables;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{SchemaSettings, Settings};
    pub use crate::context::ResolutionContext;
    pub use crate::error::{SchemaError, SchemaResult};
    pub use crate::resolver::{join_subquery, select_fields, ResolutionPass};
    pub use crate::schema::{
        chain, ChainSegment, Database, DatabaseField, FieldChain, FieldOrTable, FieldTraverser,
        FieldType, JoinFunction, LazyJoin, LazyJoinToAdd, LazySelect, LazyTableToAdd, Table,
        TableKind,
    };
    pub use crate::sql::{col, func, table_col, Dialect, Expr, ExprExt, Join, Query, TableRef};
    pub use crate::tables::create_database;
}

pub use context::ResolutionContext;
pub use error::{SchemaError, SchemaResult};
pub use schema::{Database, Table};
pub use sql::Dialect;
