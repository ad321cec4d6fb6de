mod compare;
mod fallback;
mod registry;
mod shunt;

pub use fallback::Fallback;
pub use registry::{LocalContext, PropertyRegistry};

use crate::{
    log::Error,
    value::{tokenize, Lexeme, ValueUnit},
};
use serde::Serialize;
use std::fmt::Display;
use tracing::debug;

/// The result of reducing an expression.
#[derive(Debug, PartialEq, Clone, Serialize)]
pub enum Value {
    /// A number with an optional unit.
    Number(ValueUnit),
    /// The result of a comparison, or a `true`/`false` literal.
    Bool(bool),
    /// Opaque text, such as `red`, `auto` or a quoted string.
    Literal(String),
}

impl Value {
    /// Parse text into a [`Value`].
    ///
    /// Text that reads as a number with an optional unit becomes a
    /// [`Value::Number`], anything else is kept as a [`Value::Literal`].
    pub fn parse(text: &str) -> Self {
        match text.parse::<ValueUnit>() {
            Ok(unit) => Value::Number(unit),
            Err(_) => Value::Literal(text.to_string()),
        }
    }
}

impl From<ValueUnit> for Value {
    fn from(unit: ValueUnit) -> Self {
        Value::Number(unit)
    }
}

impl From<bool> for Value {
    fn from(bo: bool) -> Self {
        Value::Bool(bo)
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Number(nu) => nu.fmt(f),
            Value::Bool(bo) => bo.fmt(f),
            Value::Literal(li) => f.write_str(li),
        }
    }
}

/// Reduces value expressions, resolving names through an optional
/// [`LocalContext`] and references through an optional [`PropertyRegistry`].
///
/// # Examples
///
/// ```
/// use chtl::{Evaluator, PropertyRegistry, ValueUnit};
///
/// let registry = PropertyRegistry::new().with("box", "width", ValueUnit::new(100.0, "px"));
/// let evaluator = Evaluator::new().with_registry(&registry);
///
/// assert_eq!(evaluator.evaluate_text("box.width / 2").unwrap(), "50px");
/// assert_eq!(evaluator.evaluate_text("box.width + 1em").unwrap(), "calc(box.width + 1em)");
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct Evaluator<'a> {
    registry: Option<&'a PropertyRegistry>,
    local: Option<&'a LocalContext>,
}

impl<'a> Evaluator<'a> {
    /// Create a new [`Evaluator`] without a registry or local context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the [`PropertyRegistry`] used to resolve `selector.property`
    /// references.
    ///
    /// Returns the [`Evaluator`], so additional methods may be chained.
    pub fn with_registry(mut self, registry: &'a PropertyRegistry) -> Self {
        self.registry = Some(registry);

        self
    }

    /// Set the [`LocalContext`] used to resolve bare names.
    ///
    /// Returns the [`Evaluator`], so additional methods may be chained.
    pub fn with_local(mut self, local: &'a LocalContext) -> Self {
        self.local = Some(local);

        self
    }

    /// Reduce the lexemes to a single [`Value`].
    ///
    /// # Errors
    ///
    /// Returns the [`Fallback`] that stopped the reduction.
    pub fn reduce(&self, lexemes: &[Lexeme]) -> Result<Value, Fallback> {
        shunt::parse(lexemes)?.evaluate(self)
    }

    /// Reduce the lexemes to text.
    ///
    /// When the lexemes cannot be reduced, the expression is written back
    /// out unevaluated, wrapped in `calc( .. )` if it has operators.
    pub fn evaluate(&self, lexemes: &[Lexeme]) -> String {
        match self.reduce(lexemes) {
            Ok(value) => value.to_string(),
            Err(fallback) => {
                let text = fallback::reassemble(lexemes);
                debug!(reason = %fallback, %text, "fallback");

                text
            }
        }
    }

    /// Tokenize the text and reduce it with [`Evaluator::evaluate`].
    ///
    /// # Errors
    ///
    /// Returns an [`Error`] when the text cannot be tokenized.
    pub fn evaluate_text(&self, text: &str) -> Result<String, Error> {
        Ok(self.evaluate(&tokenize(text)?))
    }
}

/// Reduce the lexemes of one property value to text.
///
/// Never fails: an expression that cannot be reduced is returned as its
/// unevaluated text.
///
/// # Examples
///
/// ```
/// use chtl::{evaluate, tokenize};
///
/// let lexemes = tokenize("10px + 5px").unwrap();
///
/// assert_eq!(evaluate(&lexemes, None, None), "15px");
/// ```
pub fn evaluate(
    lexemes: &[Lexeme],
    registry: Option<&PropertyRegistry>,
    local: Option<&LocalContext>,
) -> String {
    Evaluator {
        registry,
        local,
    }
    .evaluate(lexemes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(source: &str) -> String {
        evaluate(&tokenize(source).unwrap(), None, None)
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(run("10px + 5px"), "15px");
        assert_eq!(run("10px / 2"), "5px");
        assert_eq!(run("(1.5em + 0.5em) * 3"), "6em");
        assert_eq!(run("100% / 3"), format!("{}%", 100.0 / 3.0));
        assert_eq!(run("5px - 5px"), "0px");
        assert_eq!(run("-(0px)"), "0px");
    }

    #[test]
    fn test_fallback() {
        assert_eq!(run("10px + 5em"), "calc(10px + 5em)");
        assert_eq!(run("10 / 0"), "calc(10 / 0)");
        assert_eq!(run("(1 + 2"), "calc((1 + 2)");
        assert_eq!(run("1px solid red"), "1px solid red");
        assert_eq!(run(""), "");
    }

    #[test]
    fn test_value_lists_stay_valid() {
        assert_eq!(run("0 10%"), "0 10%");
        assert_eq!(run("50% 50%"), "50% 50%");
        assert_eq!(run("-webkit-box"), "-webkit-box");
        assert_eq!(run("1px -2px"), "1px -2px");
        assert_eq!(run("-2px"), "-2px");
        assert_eq!(run("1px - 2px"), "-1px");
        assert_eq!(run("1px-2px"), "-1px");
    }

    #[test]
    fn test_power_rule() {
        assert_eq!(run("2px ** 3"), "8px");
        assert_eq!(run("2 ** 3px"), "calc(2 ** 3px)");
    }

    #[test]
    fn test_ternary() {
        assert_eq!(run("10 > 5 ? 20px : 30px"), "20px");
        assert_eq!(run("10 < 5 ? 20px : 30px"), "30px");
        assert_eq!(run("1 == 1 && 2 != 3"), "true");
        assert_eq!(run("0 || auto"), "auto");
        assert_eq!(run("1px > 1em ? 1 : 2"), "calc(1px > 1em ? 1 : 2)");
    }

    #[test]
    fn test_literals() {
        assert_eq!(run("red"), "red");
        assert_eq!(run("\"a b\""), "\"a b\"");
        assert_eq!(run("true"), "true");
        assert_eq!(run("red + 1"), "calc(red + 1)");
    }

    #[test]
    fn test_reference() {
        let registry = PropertyRegistry::new().with("box", "width", ValueUnit::new(100.0, "px"));
        let lexemes = tokenize("box.width / 2").unwrap();

        assert_eq!(evaluate(&lexemes, Some(&registry), None), "50px");
        assert_eq!(evaluate(&lexemes, None, None), "calc(box.width / 2)");
        assert_eq!(
            evaluate(&tokenize("box.width").unwrap(), Some(&registry), None),
            "100px"
        );
    }

    #[test]
    fn test_local_context() {
        let local = LocalContext::new()
            .with("gap", ValueUnit::new(4.0, "px"))
            .with("dense", true);
        let evaluator = Evaluator::new().with_local(&local);

        assert_eq!(evaluator.evaluate_text("gap * 2").unwrap(), "8px");
        assert_eq!(evaluator.evaluate_text("dense ? gap : gap * 3").unwrap(), "4px");
        assert_eq!(evaluator.evaluate_text("margin * 2").unwrap(), "calc(margin * 2)");
    }

    #[test]
    fn test_reduce() {
        let evaluator = Evaluator::new();

        assert_eq!(
            evaluator.reduce(&tokenize("2 > 1").unwrap()),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            evaluator.reduce(&tokenize("1 % 0").unwrap()),
            Err(Fallback::DivisionByZero)
        );
        assert!(evaluator.evaluate_text("a = b").is_err());
    }

    #[test]
    fn test_value_parse() {
        assert_eq!(Value::parse("12rem"), Value::Number(ValueUnit::new(12.0, "rem")));
        assert_eq!(Value::parse("solid"), Value::Literal("solid".to_string()));
        assert_eq!(Value::from(false).to_string(), "false");
    }
}
