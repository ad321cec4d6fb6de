use super::{
    compare::{apply_arithmetic, compare_values, is_truthy, negate},
    Evaluator, Fallback, Value,
};
use crate::value::{Lexeme, Operator, Token, ValueUnit};

/// Precedence of `? :`, the lowest of all operators.
const TERNARY: u8 = 1;

/// Precedence of prefix operators, the highest of all operators.
const UNARY: u8 = 8;

/// Return the precedence of a binary [`Operator`].
fn precedence(operator: Operator) -> u8 {
    match operator {
        Operator::Or => 2,
        Operator::And => 3,
        Operator::Greater
        | Operator::Lesser
        | Operator::Equal
        | Operator::NotEqual
        | Operator::GreaterOrEqual
        | Operator::LesserOrEqual => 4,
        Operator::Add | Operator::Subtract => 5,
        Operator::Multiply | Operator::Divide | Operator::Modulo => 6,
        Operator::Power => 7,
    }
}

/// Prefix operators.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub(super) enum Unary {
    /// -
    Negate,
    /// !
    Not,
}

/// A value, or a name that is looked up when the expression is evaluated.
#[derive(Debug, PartialEq, Clone)]
pub(super) enum Operand {
    Value(Value),
    /// Bare identifier, resolved through the [`LocalContext`][`super::LocalContext`].
    Name(String),
    /// Property of another element, resolved through the
    /// [`PropertyRegistry`][`super::PropertyRegistry`].
    Reference { selector: String, property: String },
}

/// Lexemes after units are attached to their numbers.
#[derive(Debug, PartialEq, Clone)]
enum Symbol {
    Operand(Operand),
    Binary(Operator),
    Unary(Unary),
    Open,
    Close,
    Question,
    Colon,
}

/// An operator waiting on the shunting-yard stack.
#[derive(Debug, PartialEq, Clone, Copy)]
enum Pending {
    Binary(Operator),
    Unary(Unary),
    Open,
    Question,
    /// A `?` whose `:` has been seen.
    Ternary,
}

impl Pending {
    fn precedence(self) -> u8 {
        match self {
            Pending::Binary(operator) => precedence(operator),
            Pending::Unary(_) => UNARY,
            Pending::Question | Pending::Ternary => TERNARY,
            Pending::Open => 0,
        }
    }

    /// Return the postfix [`Step`] for an operator, or `None` for a
    /// grouping marker.
    fn into_step(self) -> Option<Step> {
        match self {
            Pending::Binary(operator) => Some(Step::Binary(operator)),
            Pending::Unary(unary) => Some(Step::Unary(unary)),
            Pending::Ternary => Some(Step::Ternary),
            Pending::Open | Pending::Question => None,
        }
    }
}

/// One instruction of the postfix form.
#[derive(Debug, PartialEq, Clone)]
enum Step {
    Operand(Operand),
    Binary(Operator),
    Unary(Unary),
    Ternary,
}

/// A parsed expression.
#[derive(Debug, PartialEq, Clone)]
pub(super) enum Expr {
    Operand(Operand),
    Unary(Unary, Box<Expr>),
    Binary(Operator, Box<Expr>, Box<Expr>),
    /// Condition, then, otherwise.
    Ternary(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Expr {
    /// Reduce the expression to a single [`Value`].
    ///
    /// `&&` and `||` return one of their operands and skip the right one
    /// when the left decides, and `? :` evaluates only the selected branch.
    pub(super) fn evaluate(&self, scope: &Evaluator<'_>) -> Result<Value, Fallback> {
        match self {
            Expr::Operand(Operand::Value(value)) => Ok(value.clone()),
            Expr::Operand(Operand::Name(name)) => Ok(scope
                .local
                .and_then(|local| local.get(name))
                .cloned()
                .unwrap_or_else(|| Value::Literal(name.clone()))),
            Expr::Operand(Operand::Reference { selector, property }) => scope
                .registry
                .and_then(|registry| registry.get(selector, property))
                .cloned()
                .ok_or_else(|| Fallback::UnresolvedReference(format!("{selector}.{property}"))),
            Expr::Unary(Unary::Negate, operand) => negate(operand.evaluate(scope)?),
            Expr::Unary(Unary::Not, operand) => {
                Ok(Value::Bool(!is_truthy(&operand.evaluate(scope)?)))
            }
            Expr::Binary(Operator::And, left, right) => {
                let left = left.evaluate(scope)?;
                if is_truthy(&left) {
                    right.evaluate(scope)
                } else {
                    Ok(left)
                }
            }
            Expr::Binary(Operator::Or, left, right) => {
                let left = left.evaluate(scope)?;
                if is_truthy(&left) {
                    Ok(left)
                } else {
                    right.evaluate(scope)
                }
            }
            Expr::Binary(operator, left, right) => {
                let left = left.evaluate(scope)?;
                let right = right.evaluate(scope)?;

                if operator.is_comparison() {
                    compare_values(&left, *operator, &right).map(Value::Bool)
                } else {
                    apply_arithmetic(&left, *operator, &right)
                }
            }
            Expr::Ternary(condition, then, otherwise) => {
                if is_truthy(&condition.evaluate(scope)?) {
                    then.evaluate(scope)
                } else {
                    otherwise.evaluate(scope)
                }
            }
        }
    }
}

/// Parse the lexemes into an [`Expr`].
///
/// # Errors
///
/// Returns a [`Fallback`] when the lexemes do not form one expression.
pub(super) fn parse(lexemes: &[Lexeme]) -> Result<Expr, Fallback> {
    fold(to_postfix(attach_units(lexemes)?)?)
}

/// Merge numbers with the units that touch them, and tell prefix `-` apart
/// from subtraction.
fn attach_units(lexemes: &[Lexeme]) -> Result<Vec<Symbol>, Fallback> {
    let mut symbols: Vec<Symbol> = vec![];
    let mut index = 0;

    while let Some(lexeme) = lexemes.get(index) {
        let expects_operand = matches!(
            symbols.last(),
            None | Some(
                Symbol::Binary(_)
                    | Symbol::Unary(_)
                    | Symbol::Open
                    | Symbol::Question
                    | Symbol::Colon
            )
        );

        let symbol = match lexeme.token {
            Token::Number => {
                let magnitude = lexeme.text.parse::<f64>().map_err(|_| {
                    Fallback::MalformedExpression(format!("`{}` is not a number", lexeme.text))
                })?;
                let unit = match unit_of(lexemes, index) {
                    Some(unit) => {
                        index += 1;
                        unit.text.clone()
                    }
                    None => String::new(),
                };

                Symbol::Operand(Operand::Value(Value::Number(ValueUnit::new(magnitude, unit))))
            }
            Token::Identifier => Symbol::Operand(Operand::Name(lexeme.text.clone())),
            Token::Reference => {
                let (selector, property) = split_reference(&lexeme.text).ok_or_else(|| {
                    Fallback::MalformedExpression(format!(
                        "`{}` is not a property reference",
                        lexeme.text
                    ))
                })?;

                Symbol::Operand(Operand::Reference { selector, property })
            }
            Token::String => Symbol::Operand(Operand::Value(Value::Literal(lexeme.text.clone()))),
            Token::True => Symbol::Operand(Operand::Value(Value::Bool(true))),
            Token::False => Symbol::Operand(Operand::Value(Value::Bool(false))),
            Token::Operator(Operator::Subtract)
                if is_prefix_minus(lexemes, index, expects_operand) =>
            {
                Symbol::Unary(Unary::Negate)
            }
            Token::Operator(operator) => Symbol::Binary(operator),
            Token::Exclamation => Symbol::Unary(Unary::Not),
            Token::OpenParen => Symbol::Open,
            Token::CloseParen => Symbol::Close,
            Token::Question => Symbol::Question,
            Token::Colon => Symbol::Colon,
            Token::Whitespace => {
                index += 1;
                continue;
            }
        };
        index += 1;

        let starts_operand = matches!(
            symbol,
            Symbol::Operand(_) | Symbol::Unary(_) | Symbol::Open
        );
        if starts_operand != expects_operand {
            let reason = if expects_operand {
                format!("expected an operand before `{}`", lexeme.text)
            } else {
                format!("expected an operator before `{}`", lexeme.text)
            };

            return Err(Fallback::MalformedExpression(reason));
        }
        symbols.push(symbol);
    }

    match symbols.last() {
        Some(Symbol::Operand(_) | Symbol::Close) => Ok(symbols),
        Some(_) => Err(Fallback::MalformedExpression(
            "expression ends without an operand".to_string(),
        )),
        None => Err(Fallback::MalformedExpression("empty expression".to_string())),
    }
}

/// Return true if the lexemes hold a binary operator, `?` or `:` once units
/// are attached and prefix operators are told apart.
///
/// Unlike [`parse`], this never fails, so it also classifies text that is
/// not one expression, such as `0 10%` or `1px -2px`.
pub(super) fn has_operator(lexemes: &[Lexeme]) -> bool {
    let mut expects_operand = true;
    let mut index = 0;

    while let Some(lexeme) = lexemes.get(index) {
        match lexeme.token {
            Token::Number => {
                if unit_of(lexemes, index).is_some() {
                    index += 1;
                }
                expects_operand = false;
            }
            Token::Operator(Operator::Subtract)
                if is_prefix_minus(lexemes, index, expects_operand) =>
            {
                expects_operand = true
            }
            Token::Operator(_) | Token::Question | Token::Colon => return true,
            Token::Exclamation | Token::OpenParen => expects_operand = true,
            Token::Whitespace => {}
            _ => expects_operand = false,
        }
        index += 1;
    }

    false
}

/// Return the lexeme that is the unit of the number at `index`, if any.
///
/// An identifier touching the number is its unit. A touching `%` is a unit
/// unless another operand touches it from the right, as in `10%3`.
fn unit_of(lexemes: &[Lexeme], index: usize) -> Option<&Lexeme> {
    let number = lexemes.get(index)?;
    let next = lexemes.get(index + 1).filter(|next| number.touches(next))?;

    match next.token {
        Token::Identifier => Some(next),
        Token::Operator(Operator::Modulo) => match lexemes.get(index + 2) {
            Some(following) if next.touches(following) => matches!(
                following.token,
                Token::Operator(_) | Token::CloseParen | Token::Question | Token::Colon
            )
            .then_some(next),
            _ => Some(next),
        },
        _ => None,
    }
}

/// Return true if the `-` at `index` is a prefix operator.
///
/// It is when an operand is expected, and also when it is separated from a
/// previous operand by whitespace but touches the number after it, so
/// `1px -2px` is two values rather than a subtraction.
fn is_prefix_minus(lexemes: &[Lexeme], index: usize, expects_operand: bool) -> bool {
    if expects_operand {
        return true;
    }
    let Some(minus) = lexemes.get(index) else {
        return false;
    };
    let spaced = index
        .checked_sub(1)
        .and_then(|previous| lexemes.get(previous))
        .is_some_and(|previous| !previous.touches(minus));
    let signs_number = lexemes
        .get(index + 1)
        .is_some_and(|next| next.token == Token::Number && minus.touches(next));

    spaced && signs_number
}

/// Split a reference into its selector and property.
fn split_reference(text: &str) -> Option<(String, String)> {
    let (selector, property) = match text.strip_prefix("{{") {
        Some(rest) => {
            let (selector, property) = rest.split_once("}}.")?;
            (selector.trim(), property)
        }
        None => text.rsplit_once('.')?,
    };

    if selector.is_empty() || property.is_empty() {
        return None;
    }

    Some((selector.to_string(), property.to_string()))
}

/// Convert the symbols to postfix order with the shunting-yard algorithm.
///
/// `**` and `? :` are right-associative, all other binary operators are
/// left-associative.
fn to_postfix(symbols: Vec<Symbol>) -> Result<Vec<Step>, Fallback> {
    let mut output = vec![];
    let mut stack: Vec<Pending> = vec![];
    let malformed = |reason: &str| Fallback::MalformedExpression(reason.to_string());

    for symbol in symbols {
        match symbol {
            Symbol::Operand(operand) => output.push(Step::Operand(operand)),
            Symbol::Unary(unary) => stack.push(Pending::Unary(unary)),
            Symbol::Binary(operator) => {
                let incoming = precedence(operator);
                let is_right = operator == Operator::Power;

                while let Some(&top) = stack.last() {
                    let pops = match top {
                        Pending::Open | Pending::Question => false,
                        _ => {
                            top.precedence() > incoming
                                || (top.precedence() == incoming && !is_right)
                        }
                    };
                    if !pops {
                        break;
                    }
                    stack.pop();
                    output.extend(top.into_step());
                }
                stack.push(Pending::Binary(operator));
            }
            Symbol::Open => stack.push(Pending::Open),
            Symbol::Close => loop {
                match stack.pop() {
                    Some(Pending::Open) => break,
                    Some(Pending::Question) => return Err(malformed("`?` without a matching `:`")),
                    Some(top) => output.extend(top.into_step()),
                    None => return Err(malformed("unmatched `)`")),
                }
            },
            Symbol::Question => {
                while let Some(&top) = stack.last() {
                    if matches!(top, Pending::Open | Pending::Question)
                        || top.precedence() <= TERNARY
                    {
                        break;
                    }
                    stack.pop();
                    output.extend(top.into_step());
                }
                stack.push(Pending::Question);
            }
            Symbol::Colon => loop {
                match stack.pop() {
                    Some(Pending::Question) => {
                        stack.push(Pending::Ternary);
                        break;
                    }
                    Some(Pending::Open) | None => return Err(malformed("`:` without a matching `?`")),
                    Some(top) => output.extend(top.into_step()),
                }
            },
        }
    }

    while let Some(top) = stack.pop() {
        match top {
            Pending::Open => return Err(malformed("unmatched `(`")),
            Pending::Question => return Err(malformed("`?` without a matching `:`")),
            _ => output.extend(top.into_step()),
        }
    }

    Ok(output)
}

/// Fold the postfix steps into an [`Expr`] tree.
fn fold(steps: Vec<Step>) -> Result<Expr, Fallback> {
    let mut stack: Vec<Expr> = vec![];
    let pop = |stack: &mut Vec<Expr>| {
        stack
            .pop()
            .map(Box::new)
            .ok_or_else(|| Fallback::MalformedExpression("missing operand".to_string()))
    };

    for step in steps {
        let expr = match step {
            Step::Operand(operand) => Expr::Operand(operand),
            Step::Unary(unary) => Expr::Unary(unary, pop(&mut stack)?),
            Step::Binary(operator) => {
                let right = pop(&mut stack)?;
                let left = pop(&mut stack)?;

                Expr::Binary(operator, left, right)
            }
            Step::Ternary => {
                let otherwise = pop(&mut stack)?;
                let then = pop(&mut stack)?;
                let condition = pop(&mut stack)?;

                Expr::Ternary(condition, then, otherwise)
            }
        };
        stack.push(expr);
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(expr), true) => Ok(expr),
        _ => Err(Fallback::MalformedExpression(
            "expected exactly one value".to_string(),
        )),
    }
}
