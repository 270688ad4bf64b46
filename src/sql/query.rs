//! SELECT builder.
//!
//! This is the fragment currency of the schema layer: lazy tables produce a
//! [`Query`] to stand in for themselves, lazy joins produce a [`Join`] whose
//! relation is usually a subquery, and saved queries contribute their body
//! as a derived table.

use super::dialect::Dialect;
use super::expr::{Expr, ExprExt};
use super::token::{Keyword, Token, TokenStream};

/// A SELECT list item.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct SelectExpr {
    pub expr: Expr,
    pub alias: Option<String>,
}

impl SelectExpr {
    pub fn new(expr: Expr) -> Self {
        Self { expr, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = self.expr.to_tokens_for_dialect(dialect);
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

impl From<Expr> for SelectExpr {
    fn from(expr: Expr) -> Self {
        SelectExpr::new(expr)
    }
}

/// What a FROM or JOIN item reads from.
#[derive(Debug, Clone, PartialEq)]
pub enum TableSource {
    /// A stored relation.
    Named(String),
    /// A table function: `numbers(10)`.
    Function { name: String, args: Vec<Expr> },
    /// A derived table built here.
    Subquery(Box<Query>),
    /// A derived table from configured query text, printed verbatim.
    Sql(String),
}

#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct TableRef {
    pub source: TableSource,
    pub alias: Option<String>,
}

impl TableRef {
    pub fn new(table: &str) -> Self {
        Self::from_source(TableSource::Named(table.into()))
    }

    pub fn function(name: &str, args: Vec<Expr>) -> Self {
        Self::from_source(TableSource::Function {
            name: name.into(),
            args,
        })
    }

    pub fn subquery(query: Query) -> Self {
        Self::from_source(TableSource::Subquery(Box::new(query)))
    }

    /// Derived table over query text. Trailing semicolons are dropped.
    pub fn sql(text: &str) -> Self {
        let text = text.trim().trim_end_matches(';').trim_end();
        Self::from_source(TableSource::Sql(text.to_string()))
    }

    fn from_source(source: TableSource) -> Self {
        Self { source, alias: None }
    }

    pub fn with_alias(mut self, alias: &str) -> Self {
        self.alias = Some(alias.into());
        self
    }

    fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = match &self.source {
            TableSource::Named(table) => {
                let mut ts = TokenStream::new();
                ts.push(Token::Ident(table.clone()));
                ts
            }
            TableSource::Function { name, args } => {
                let mut ts = TokenStream::new();
                ts.push(Token::FunctionName(name.clone()))
                    .lparen()
                    .comma_list(args, |arg| arg.to_tokens_for_dialect(dialect))
                    .rparen();
                ts
            }
            TableSource::Subquery(query) => query.to_tokens_for_dialect(dialect).parenthesized(),
            TableSource::Sql(text) => {
                let mut ts = TokenStream::new();
                ts.push(Token::Raw(text.clone()));
                ts.parenthesized()
            }
        };
        push_alias(&mut ts, self.alias.as_deref());
        ts
    }
}

fn push_alias(ts: &mut TokenStream, alias: Option<&str>) {
    if let Some(alias) = alias {
        ts.space()
            .push(Keyword::As)
            .space()
            .push(Token::Ident(alias.to_string()));
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub join_type: JoinType,
    pub table: TableRef,
    pub on: Expr,
}

impl Join {
    pub fn left(table: TableRef, on: Expr) -> Self {
        Self {
            join_type: JoinType::Left,
            table,
            on,
        }
    }

    pub fn inner(table: TableRef, on: Expr) -> Self {
        Self {
            join_type: JoinType::Inner,
            table,
            on,
        }
    }

    /// Alias the joined relation is visible under, if any.
    pub fn alias(&self) -> Option<&str> {
        self.table.alias.as_deref()
    }

    fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.push(match self.join_type {
            JoinType::Inner => Keyword::Inner,
            JoinType::Left => Keyword::Left,
        })
        .space()
        .push(Keyword::Join)
        .space()
        .append(self.table.to_tokens_for_dialect(dialect))
        .space()
        .push(Keyword::On)
        .space()
        .append(self.on.to_tokens_for_dialect(dialect));
        ts
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[must_use = "Query has no effect until converted to SQL with to_sql()"]
pub struct Query {
    pub select: Vec<SelectExpr>,
    pub from: Option<TableRef>,
    pub joins: Vec<Join>,
    pub where_clause: Option<Expr>,
    pub group_by: Vec<Expr>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, exprs: Vec<impl Into<SelectExpr>>) -> Self {
        self.select = exprs.into_iter().map(Into::into).collect();
        self
    }

    pub fn from(mut self, table: TableRef) -> Self {
        self.from = Some(table);
        self
    }

    pub fn with_join(mut self, join: Join) -> Self {
        self.joins.push(join);
        self
    }

    pub fn left_join(self, table: TableRef, on: Expr) -> Self {
        self.with_join(Join::left(table, on))
    }

    /// AND `condition` onto the WHERE clause. Existing conditions keep their
    /// own grouping, so an `a OR b` already present cannot absorb the new
    /// condition.
    pub fn filter(mut self, condition: Expr) -> Self {
        self.where_clause = Some(match self.where_clause {
            Some(existing) => existing.and(condition),
            None => condition,
        });
        self
    }

    pub fn group_by(mut self, exprs: Vec<Expr>) -> Self {
        self.group_by = exprs;
        self
    }

    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        ts.push(Keyword::Select).space().comma_list(&self.select, |item| {
            item.to_tokens_for_dialect(dialect)
        });

        if let Some(from) = &self.from {
            ts.space()
                .push(Keyword::From)
                .space()
                .append(from.to_tokens_for_dialect(dialect));
        }

        for join in &self.joins {
            ts.space().append(join.to_tokens_for_dialect(dialect));
        }

        if let Some(condition) = &self.where_clause {
            ts.space()
                .push(Keyword::Where)
                .space()
                .append(condition.to_tokens_for_dialect(dialect));
        }

        if !self.group_by.is_empty() {
            ts.space()
                .push(Keyword::GroupBy)
                .space()
                .comma_list(&self.group_by, |expr| expr.to_tokens_for_dialect(dialect));
        }

        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }
}

impl std::fmt::Display for Query {
    /// Formats the query in the default dialect (ClickHouse).
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql(Dialect::default()))
    }
}
