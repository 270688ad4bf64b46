//! Field model: leaf column descriptors, traversal markers, and the
//! [`FieldOrTable`] sum type every table maps its names to.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::lazy::LazyJoin;
use super::table::Table;
use crate::sql::{Expr, JsonPathSegment};

// =============================================================================
// Chains
// =============================================================================

/// One step of a field chain: a name, or a numeric index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum ChainSegment {
    Name(String),
    Index(i64),
}

/// An ordered path through tables, e.g. `person → properties → email`.
pub type FieldChain = Vec<ChainSegment>;

impl ChainSegment {
    /// The segment as a name, if it is one.
    pub fn as_name(&self) -> Option<&str> {
        match self {
            ChainSegment::Name(name) => Some(name),
            ChainSegment::Index(_) => None,
        }
    }
}

impl fmt::Display for ChainSegment {
    /// The normalized key used for table lookups.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainSegment::Name(name) => f.write_str(name),
            ChainSegment::Index(index) => write!(f, "{}", index),
        }
    }
}

impl From<&str> for ChainSegment {
    fn from(name: &str) -> Self {
        ChainSegment::Name(name.to_string())
    }
}

impl From<String> for ChainSegment {
    fn from(name: String) -> Self {
        ChainSegment::Name(name)
    }
}

impl From<i64> for ChainSegment {
    fn from(index: i64) -> Self {
        ChainSegment::Index(index)
    }
}

impl From<&ChainSegment> for ChainSegment {
    fn from(segment: &ChainSegment) -> Self {
        segment.clone()
    }
}

/// Trailing segments below a JSON field: names become object keys and
/// indexes stay array positions.
impl From<&ChainSegment> for JsonPathSegment {
    fn from(segment: &ChainSegment) -> Self {
        match segment {
            ChainSegment::Name(name) => JsonPathSegment::Key(name.clone()),
            ChainSegment::Index(index) => JsonPathSegment::Index(*index),
        }
    }
}

/// Build a chain from anything segment-like.
///
/// ```
/// use vschema::schema::{chain, ChainSegment};
///
/// let c = chain(["person", "properties", "email"]);
/// assert_eq!(c.len(), 3);
/// assert_eq!(c[0], ChainSegment::Name("person".into()));
/// ```
pub fn chain<I, S>(segments: I) -> FieldChain
where
    I: IntoIterator<Item = S>,
    S: Into<ChainSegment>,
{
    segments.into_iter().map(Into::into).collect()
}

/// Join a chain into the dotted request key used by accumulators
/// (`["properties", "email"]` → `"properties___email"`).
pub fn chain_key(chain: &[ChainSegment]) -> String {
    chain
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("___")
}

// =============================================================================
// Database fields
// =============================================================================

/// Type tag of a [`DatabaseField`].
///
/// The tag alone tells the compiler how to cast and print values; only the
/// expression variant carries extra data.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Integer,
    Float,
    String,
    StringJson,
    StringArray,
    Date,
    DateTime,
    Boolean,
    /// Computed field: the expression is inlined wherever the field is read.
    Expression(Expr),
}

impl FieldType {
    /// Short, stable name of the type tag.
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::String => "string",
            FieldType::StringJson => "json",
            FieldType::StringArray => "array",
            FieldType::Date => "date",
            FieldType::DateTime => "datetime",
            FieldType::Boolean => "boolean",
            FieldType::Expression(_) => "expression",
        }
    }
}

/// A column (or computed column) on a table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatabaseField {
    /// Store-side column name.
    pub name: String,
    pub field_type: FieldType,
    pub array: Option<bool>,
    pub nullable: Option<bool>,
    /// Hidden fields resolve normally but never appear in `*` expansion.
    pub hidden: bool,
}

impl DatabaseField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            array: None,
            nullable: None,
            hidden: false,
        }
    }

    pub fn integer(name: &str) -> Self {
        Self::new(name, FieldType::Integer)
    }

    pub fn float(name: &str) -> Self {
        Self::new(name, FieldType::Float)
    }

    pub fn string(name: &str) -> Self {
        Self::new(name, FieldType::String)
    }

    pub fn json(name: &str) -> Self {
        Self::new(name, FieldType::StringJson)
    }

    pub fn string_array(name: &str) -> Self {
        Self::new(name, FieldType::StringArray)
    }

    pub fn date(name: &str) -> Self {
        Self::new(name, FieldType::Date)
    }

    pub fn datetime(name: &str) -> Self {
        Self::new(name, FieldType::DateTime)
    }

    pub fn boolean(name: &str) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    /// Computed field. Unqualified columns in `expr` refer to the row the
    /// field is read from.
    pub fn expression(name: &str, expr: Expr) -> Self {
        Self::new(name, FieldType::Expression(expr))
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = Some(true);
        self
    }

    pub fn array(mut self) -> Self {
        self.array = Some(true);
        self
    }

    /// The inlined expression, for computed fields.
    pub fn expr(&self) -> Option<&Expr> {
        match &self.field_type {
            FieldType::Expression(expr) => Some(expr),
            _ => None,
        }
    }
}

// =============================================================================
// Traversers
// =============================================================================

/// "This name means: continue resolving at `chain` from the current table."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldTraverser {
    pub chain: FieldChain,
}

impl FieldTraverser {
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<ChainSegment>,
    {
        Self {
            chain: chain(segments),
        }
    }
}

// =============================================================================
// FieldOrTable
// =============================================================================

/// An entry a downstream compiler places in a table that this layer does not
/// know how to expand or resolve.
pub trait CustomEntry: fmt::Debug + Send + Sync {
    /// Type name reported in errors.
    fn type_name(&self) -> &str;
}

/// Everything a table can map a name to.
#[derive(Debug, Clone)]
pub enum FieldOrTable {
    Field(DatabaseField),
    Traverser(FieldTraverser),
    /// A nested table of any kind (virtual, lazy, function-call, ...).
    Table(Arc<Table>),
    LazyJoin(LazyJoin),
    Custom(Arc<dyn CustomEntry>),
}

impl FieldOrTable {
    /// Name of the variant (or of the nested table's type), for diagnostics.
    pub fn type_name(&self) -> String {
        match self {
            FieldOrTable::Field(field) => format!("{}Field", capitalize(field.field_type.type_name())),
            FieldOrTable::Traverser(_) => "FieldTraverser".to_string(),
            FieldOrTable::Table(table) => table.type_name().to_string(),
            FieldOrTable::LazyJoin(_) => "LazyJoin".to_string(),
            FieldOrTable::Custom(entry) => entry.type_name().to_string(),
        }
    }

    pub fn as_field(&self) -> Option<&DatabaseField> {
        match self {
            FieldOrTable::Field(field) => Some(field),
            _ => None,
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

impl From<DatabaseField> for FieldOrTable {
    fn from(field: DatabaseField) -> Self {
        FieldOrTable::Field(field)
    }
}

impl From<FieldTraverser> for FieldOrTable {
    fn from(traverser: FieldTraverser) -> Self {
        FieldOrTable::Traverser(traverser)
    }
}

impl From<Table> for FieldOrTable {
    fn from(table: Table) -> Self {
        FieldOrTable::Table(Arc::new(table))
    }
}

impl From<Arc<Table>> for FieldOrTable {
    fn from(table: Arc<Table>) -> Self {
        FieldOrTable::Table(table)
    }
}

impl From<LazyJoin> for FieldOrTable {
    fn from(join: LazyJoin) -> Self {
        FieldOrTable::LazyJoin(join)
    }
}
