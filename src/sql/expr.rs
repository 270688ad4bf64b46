//! Expression AST.
//!
//! Expression fields in the schema hold one of these trees, and the resolver
//! produces one for every field chain it resolves. Operands are
//! parenthesized from operator precedence when printed, so a tree built from
//! `a OR b` and then ANDed with a guard keeps the guard on every row.

use super::dialect::{Dialect, SqlDialect};
use super::token::{Keyword, Token, TokenStream};

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `table.column`, or a bare `column` until [`Expr::qualify`] assigns a table.
    Column {
        table: Option<String>,
        column: String,
    },
    Literal(Literal),
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },
    Function {
        name: String,
        args: Vec<Expr>,
    },
    /// Bare `*`, as in `count(*)`.
    Star,
    /// String property read out of a JSON-encoded string column.
    ///
    /// Rendering is dialect-specific (see `SqlDialect::emit_json_extract`).
    JsonExtract {
        expr: Box<Expr>,
        path: Vec<JsonPathSegment>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    String(String),
    Bool(bool),
}

/// One step below a JSON column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonPathSegment {
    /// Object property.
    Key(String),
    /// Array element, 1-based; negative values count from the end.
    Index(i64),
}

impl From<&str> for JsonPathSegment {
    fn from(key: &str) -> Self {
        JsonPathSegment::Key(key.to_string())
    }
}

impl From<String> for JsonPathSegment {
    fn from(key: String) -> Self {
        JsonPathSegment::Key(key)
    }
}

impl From<i64> for JsonPathSegment {
    fn from(index: i64) -> Self {
        JsonPathSegment::Index(index)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

impl BinaryOperator {
    /// Binding strength; higher binds tighter.
    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Or => 1,
            BinaryOperator::And => 2,
            _ => 3,
        }
    }

    fn token(self) -> Token {
        match self {
            BinaryOperator::Eq => Token::Operator("="),
            BinaryOperator::Ne => Token::Operator("<>"),
            BinaryOperator::Lt => Token::Operator("<"),
            BinaryOperator::Gt => Token::Operator(">"),
            BinaryOperator::Lte => Token::Operator("<="),
            BinaryOperator::Gte => Token::Operator(">="),
            BinaryOperator::And => Token::Keyword(Keyword::And),
            BinaryOperator::Or => Token::Keyword(Keyword::Or),
        }
    }
}

impl Expr {
    pub fn to_tokens_for_dialect(&self, dialect: Dialect) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column { table, column } => {
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone())).push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::Int(*n),
                    Literal::Float(f) => Token::Float(*f),
                    Literal::String(s) => Token::Str(s.clone()),
                    Literal::Bool(b) => Token::Bool(*b),
                });
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(operand_tokens(left, *op, false, dialect))
                    .space()
                    .push(op.token())
                    .space()
                    .append(operand_tokens(right, *op, true, dialect));
            }

            Expr::Function { name, args } => {
                ts.push(Token::FunctionName(name.clone()))
                    .lparen()
                    .comma_list(args, |arg| arg.to_tokens_for_dialect(dialect))
                    .rparen();
            }

            Expr::Star => {
                ts.push(Token::Star);
            }

            Expr::JsonExtract { expr, path } => {
                ts.append(dialect.emit_json_extract(expr.to_tokens_for_dialect(dialect), path));
            }
        }

        ts
    }

    pub fn to_sql(&self, dialect: Dialect) -> String {
        self.to_tokens_for_dialect(dialect).serialize(dialect)
    }

    /// Qualify every unqualified column reference with `table`.
    ///
    /// Expression fields are declared relative to the row they live on; the
    /// resolver calls this with the alias that row is read from.
    pub fn qualify(&self, table: &str) -> Expr {
        match self {
            Expr::Column {
                table: None,
                column,
            } => table_col(table, column),
            Expr::Column { .. } | Expr::Literal(_) | Expr::Star => self.clone(),
            Expr::BinaryOp { left, op, right } => binary(left.qualify(table), *op, right.qualify(table)),
            Expr::Function { name, args } => Expr::Function {
                name: name.clone(),
                args: args.iter().map(|a| a.qualify(table)).collect(),
            },
            Expr::JsonExtract { expr, path } => Expr::JsonExtract {
                expr: Box::new(expr.qualify(table)),
                path: path.clone(),
            },
        }
    }
}

/// Operand of `parent`, parenthesized when it binds looser than `parent`
/// (or equally, on the right of a non-associative comparison).
fn operand_tokens(operand: &Expr, parent: BinaryOperator, right: bool, dialect: Dialect) -> TokenStream {
    let ts = operand.to_tokens_for_dialect(dialect);
    let Expr::BinaryOp { op, .. } = operand else {
        return ts;
    };
    let associative = matches!(parent, BinaryOperator::And | BinaryOperator::Or);
    let looser = op.precedence() < parent.precedence();
    let equal_on_right = right && op.precedence() == parent.precedence() && !associative;
    if looser || equal_on_right {
        ts.parenthesized()
    } else {
        ts
    }
}

// =============================================================================
// Builders
// =============================================================================

pub fn col(name: &str) -> Expr {
    Expr::Column {
        table: None,
        column: name.into(),
    }
}

pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        table: Some(table.into()),
        column: column.into(),
    }
}

pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

pub fn lit_bool(b: bool) -> Expr {
    Expr::Literal(Literal::Bool(b))
}

pub fn star() -> Expr {
    Expr::Star
}

pub fn func(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        name: name.into(),
        args,
    }
}

pub fn count_star() -> Expr {
    func("count", vec![star()])
}

pub fn sum(expr: Expr) -> Expr {
    func("sum", vec![expr])
}

pub fn min(expr: Expr) -> Expr {
    func("min", vec![expr])
}

pub fn max(expr: Expr) -> Expr {
    func("max", vec![expr])
}

pub fn json_extract(expr: Expr, path: Vec<JsonPathSegment>) -> Expr {
    Expr::JsonExtract {
        expr: Box::new(expr),
        path,
    }
}

/// Comparison and boolean operators, for building filters.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Eq, other.into())
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Ne, other.into())
    }

    fn gt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gt, other.into())
    }

    fn gte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Gte, other.into())
    }

    fn lt(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lt, other.into())
    }

    fn lte(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Lte, other.into())
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::And, other.into())
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        binary(self.into_expr(), BinaryOperator::Or, other.into())
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}

fn binary(left: Expr, op: BinaryOperator, right: Expr) -> Expr {
    Expr::BinaryOp {
        left: Box::new(left),
        op,
        right: Box::new(right),
    }
}

impl From<i64> for Expr {
    fn from(n: i64) -> Self {
        lit_int(n)
    }
}

impl From<f64> for Expr {
    fn from(f: f64) -> Self {
        Expr::Literal(Literal::Float(f))
    }
}

impl From<&str> for Expr {
    fn from(s: &str) -> Self {
        lit_str(s)
    }
}

impl From<bool> for Expr {
    fn from(b: bool) -> Self {
        lit_bool(b)
    }
}
