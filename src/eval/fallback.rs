use super::shunt::has_operator;
use crate::value::Lexeme;
use std::fmt::Display;

/// Reasons an expression could not be reduced to a single value.
///
/// A `Fallback` never escapes [`evaluate`][`crate::evaluate`], which writes
/// the expression back out unevaluated instead.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Fallback {
    /// A `selector.property` reference with no entry in the registry.
    UnresolvedReference(String),
    /// Operands whose units, or kinds, the operator cannot combine.
    UnitMismatch(String),
    /// Division or modulo by zero, or any other non-finite result.
    DivisionByZero,
    /// Tokens that do not form an expression.
    MalformedExpression(String),
}

impl Display for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Fallback::UnresolvedReference(reference) => {
                write!(f, "unresolved reference `{reference}`")
            }
            Fallback::UnitMismatch(help) => write!(f, "unit mismatch: {help}"),
            Fallback::DivisionByZero => write!(f, "division by zero"),
            Fallback::MalformedExpression(help) => write!(f, "malformed expression: {help}"),
        }
    }
}

impl std::error::Error for Fallback {}

/// Reassemble the lexemes as unevaluated text.
///
/// Lexemes are separated by a single space wherever they were not adjacent
/// in the source, and the text is wrapped in `calc( .. )` when it contains
/// a binary operator, `?` or `:`. A `%` unit and a sign such as the one in
/// `-webkit-box` or `1px -2px` do not count.
pub fn reassemble(lexemes: &[Lexeme]) -> String {
    let mut text = String::new();
    for (n, lexeme) in lexemes.iter().enumerate() {
        if n > 0 && !lexemes[n - 1].touches(lexeme) {
            text.push(' ');
        }
        text.push_str(&lexeme.text);
    }

    if has_operator(lexemes) {
        format!("calc({text})")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::tokenize;

    #[test]
    fn test_reassemble_keeps_adjacency() {
        let lexemes = tokenize("10px   +5em").unwrap();

        assert_eq!(reassemble(&lexemes), "calc(10px +5em)");
    }

    #[test]
    fn test_reassemble_without_operator() {
        let lexemes = tokenize("1px  solid  red").unwrap();

        assert_eq!(reassemble(&lexemes), "1px solid red");
    }

    #[test]
    fn test_reassemble_value_lists() {
        for source in ["0 10%", "50% 50%", "-webkit-box", "1px -2px", "-1px auto"] {
            assert_eq!(reassemble(&tokenize(source).unwrap()), source);
        }
    }

    #[test]
    fn test_reassemble_operators() {
        let cases = [
            ("10%3", "calc(10%3)"),
            ("1px - 2px", "calc(1px - 2px)"),
            ("a ? b : c", "calc(a ? b : c)"),
        ];

        for (source, expected) in cases {
            assert_eq!(reassemble(&tokenize(source).unwrap()), expected);
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Fallback::UnresolvedReference("box.width".to_string()).to_string(),
            "unresolved reference `box.width`"
        );
        assert_eq!(Fallback::DivisionByZero.to_string(), "division by zero");
    }
}
