mod lexer;
mod unit;

pub use lexer::{tokenize, Lexer};
pub use unit::ValueUnit;

use crate::region::Region;
use serde::Serialize;
use std::fmt::Display;

/// Operators recognized by the [`Lexer`] and the evaluator.
#[derive(Debug, PartialEq, Eq, Copy, Clone, Serialize)]
pub enum Operator {
    /// +
    Add,
    /// -
    Subtract,
    /// *
    Multiply,
    /// /
    Divide,
    /// %
    Modulo,
    /// **
    Power,
    /// >
    Greater,
    /// <
    Lesser,
    /// ==
    Equal,
    /// !=
    NotEqual,
    /// >=
    GreaterOrEqual,
    /// <=
    LesserOrEqual,
    /// &&
    And,
    /// ||
    Or,
}

impl Operator {
    /// Return true if the [`Operator`] produces a boolean from two numbers.
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Operator::Greater
                | Operator::Lesser
                | Operator::Equal
                | Operator::NotEqual
                | Operator::GreaterOrEqual
                | Operator::LesserOrEqual
        )
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::Add => write!(f, "+"),
            Operator::Subtract => write!(f, "-"),
            Operator::Multiply => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
            Operator::Modulo => write!(f, "%"),
            Operator::Power => write!(f, "**"),
            Operator::Greater => write!(f, ">"),
            Operator::Lesser => write!(f, "<"),
            Operator::Equal => write!(f, "=="),
            Operator::NotEqual => write!(f, "!="),
            Operator::GreaterOrEqual => write!(f, ">="),
            Operator::LesserOrEqual => write!(f, "<="),
            Operator::And => write!(f, "&&"),
            Operator::Or => write!(f, "||"),
        }
    }
}

/// Kinds of [`Lexeme`] in a property value.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize)]
pub enum Token {
    /// Digits with an optional fraction, `10` or `.5`.
    Number,
    /// Unquoted word, such as a unit, a keyword like `auto`, or a local name.
    Identifier,
    /// Property of another element, `box.width` or `{{.card}}.height`.
    Reference,
    /// String literal, including its quotes.
    String,
    /// A boolean true.
    True,
    /// A boolean false.
    False,
    /// Describes an action taken on two values.
    Operator(Operator),
    /// !
    Exclamation,
    /// (
    OpenParen,
    /// )
    CloseParen,
    /// ?
    Question,
    /// :
    Colon,
    /// Whitespace between other tokens.
    Whitespace,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Number => write!(f, "number"),
            Token::Identifier => write!(f, "identifier"),
            Token::Reference => write!(f, "reference"),
            Token::String => write!(f, "string"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::Operator(operator) => write!(f, "{operator}"),
            Token::Exclamation => write!(f, "!"),
            Token::OpenParen => write!(f, "("),
            Token::CloseParen => write!(f, ")"),
            Token::Question => write!(f, "?"),
            Token::Colon => write!(f, ":"),
            Token::Whitespace => write!(f, "whitespace"),
        }
    }
}

/// A [`Token`] together with the text it was read from.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub struct Lexeme {
    pub token: Token,
    /// Area of the value text the lexeme was read from.
    pub region: Region,
    pub text: String,
}

impl Lexeme {
    /// Create a new [`Lexeme`] over the given region of the source.
    pub fn new(token: Token, source: &str, region: Region) -> Self {
        Self {
            token,
            region,
            text: source[region].to_string(),
        }
    }

    /// Return true if this [`Lexeme`] ends exactly where the given one begins.
    pub fn touches(&self, next: &Lexeme) -> bool {
        self.region.end == next.region.begin
    }
}
