//! Schema model: fields, tables, lazy constructs and the table registry.

pub mod database;
pub mod field;
pub mod lazy;
pub mod saved_query;
pub mod table;

pub use database::Database;
pub use field::{
    chain, chain_key, ChainSegment, CustomEntry, DatabaseField, FieldChain, FieldOrTable,
    FieldTraverser, FieldType,
};
pub use lazy::{
    FieldsAccessed, JoinFunction, JoinTarget, LazyJoin, LazyJoinToAdd, LazySelect,
    LazyTableToAdd,
};
pub use saved_query::validate_saved_query_name;
pub use table::{PrintedNames, Table, TableBuilder, TableKind, DEFAULT_PARTITION_COLUMN};
