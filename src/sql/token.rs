//! Tokens: the flat form every builder type lowers to before printing.
//!
//! Nothing here knows about quoting or casing; a token only becomes text
//! when a [`Dialect`] serializes it.

use super::dialect::{Dialect, SqlDialect};

/// Reserved words the builder emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Select,
    From,
    Where,
    GroupBy,
    As,
    Left,
    Inner,
    Join,
    On,
    And,
    Or,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Select => "SELECT",
            Keyword::From => "FROM",
            Keyword::Where => "WHERE",
            Keyword::GroupBy => "GROUP BY",
            Keyword::As => "AS",
            Keyword::Left => "LEFT",
            Keyword::Inner => "INNER",
            Keyword::Join => "JOIN",
            Keyword::On => "ON",
            Keyword::And => "AND",
            Keyword::Or => "OR",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    /// Symbolic operator such as `=` or `->>`.
    Operator(&'static str),
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    Space,

    /// Table, column or alias name; quoted by the dialect.
    Ident(String),
    /// Function name; cased by the dialect.
    FunctionName(String),
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),

    /// Text printed as-is.
    ///
    /// Only saved query bodies from the operator's configuration go through
    /// here. Values from a query author must never reach this variant.
    Raw(String),
}

impl Token {
    pub fn serialize(&self, dialect: Dialect) -> String {
        match self {
            Token::Keyword(keyword) => keyword.as_str().into(),
            Token::Operator(op) => (*op).into(),
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::Space => " ".into(),
            Token::Ident(name) => dialect.quote_identifier(name),
            Token::FunctionName(name) => dialect.format_function_name(name),
            Token::Int(n) => n.to_string(),
            Token::Float(f) => {
                assert!(f.is_finite(), "non-finite float literal {f} has no SQL form");
                ryu::Buffer::new().format_finite(*f).to_string()
            }
            Token::Str(s) => dialect.quote_string(s),
            Token::Bool(b) => dialect.format_bool(*b).into(),
            Token::Raw(text) => text.clone(),
        }
    }
}

impl From<Keyword> for Token {
    fn from(keyword: Keyword) -> Self {
        Token::Keyword(keyword)
    }
}

/// Tokens collected in output order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, token: impl Into<Token>) -> &mut Self {
        self.tokens.push(token.into());
        self
    }

    /// Move every token of `other` onto the end of this stream.
    pub fn append(&mut self, other: TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens);
        self
    }

    /// Append `items`, each rendered by `render`, separated by `, `.
    pub fn comma_list<T>(&mut self, items: &[T], mut render: impl FnMut(&T) -> TokenStream) -> &mut Self {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.comma().space();
            }
            self.append(render(item));
        }
        self
    }

    /// Wrap the whole stream in parentheses.
    pub fn parenthesized(self) -> TokenStream {
        let mut ts = TokenStream::new();
        ts.lparen().append(self).rparen();
        ts
    }

    pub fn serialize(&self, dialect: Dialect) -> String {
        self.tokens.iter().map(|t| t.serialize(dialect)).collect()
    }

    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }

    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }

    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }

    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
}
