use super::{Fallback, Value};
use crate::value::{Operator, ValueUnit};

/// Return true if the given [`Value`] is truthy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Bool(bo) => *bo,
        Value::Number(nu) => nu.magnitude != 0.0,
        Value::Literal(li) => !li.is_empty(),
    }
}

/// Compare the two [`Value`] instances with the given [`Operator`].
///
/// # Errors
///
/// Returns a [`Fallback`] if the two values cannot be compared, or the
/// `Operator` cannot be applied to them.
pub fn compare_values(left: &Value, operator: Operator, right: &Value) -> Result<bool, Fallback> {
    let result = match (left, right) {
        (Value::Number(left), Value::Number(right)) => {
            if left.unit != right.unit {
                return Err(Fallback::UnitMismatch(format!(
                    "`{left}` and `{right}` cannot be compared with `{operator}`"
                )));
            }
            let (left, right) = (left.magnitude, right.magnitude);
            match operator {
                Operator::Greater => left > right,
                Operator::Lesser => left < right,
                Operator::Equal => left == right,
                Operator::NotEqual => left != right,
                Operator::GreaterOrEqual => left >= right,
                Operator::LesserOrEqual => left <= right,
                unsupported => return Err(out_of_place(unsupported)),
            }
        }
        (Value::Bool(left), Value::Bool(right)) => match operator {
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            unsupported => {
                return Err(Fallback::UnitMismatch(format!(
                    "operator `{unsupported}` is invalid on boolean values"
                )))
            }
        },
        (Value::Literal(left), Value::Literal(right)) => match operator {
            Operator::Equal => left == right,
            Operator::NotEqual => left != right,
            unsupported => {
                return Err(Fallback::UnitMismatch(format!(
                    "operator `{unsupported}` is invalid on literal values"
                )))
            }
        },
        (left, right) => {
            return Err(Fallback::UnitMismatch(format!(
                "`{left}` and `{right}` cannot be compared"
            )))
        }
    };

    Ok(result)
}

/// Apply an arithmetic [`Operator`] to two numbers, checking their units.
///
/// # Errors
///
/// Returns a [`Fallback`] if either value is not a number, the units do not
/// combine, or the result is not finite.
pub fn apply_arithmetic(left: &Value, operator: Operator, right: &Value) -> Result<Value, Fallback> {
    let (left, right) = match (left, right) {
        (Value::Number(left), Value::Number(right)) => (left, right),
        (left, right) => {
            return Err(Fallback::UnitMismatch(format!(
                "operator `{operator}` is invalid on `{left}` and `{right}`"
            )))
        }
    };
    let mismatch = |rule: &str| {
        Fallback::UnitMismatch(format!("`{left} {operator} {right}` {rule}"))
    };

    let result = match operator {
        Operator::Add | Operator::Subtract => {
            if left.unit != right.unit {
                return Err(mismatch("needs both sides in the same unit"));
            }
            let magnitude = if operator == Operator::Add {
                left.magnitude + right.magnitude
            } else {
                left.magnitude - right.magnitude
            };

            ValueUnit::new(magnitude, left.unit.as_str())
        }
        Operator::Multiply => {
            if !left.is_unitless() && !right.is_unitless() {
                return Err(mismatch("needs at least one unitless side"));
            }
            let unit = if left.is_unitless() {
                &right.unit
            } else {
                &left.unit
            };

            ValueUnit::new(left.magnitude * right.magnitude, unit.as_str())
        }
        Operator::Divide | Operator::Modulo => {
            if right.magnitude == 0.0 {
                return Err(Fallback::DivisionByZero);
            }
            if !right.is_unitless() {
                return Err(mismatch("needs a unitless divisor"));
            }
            let magnitude = if operator == Operator::Divide {
                left.magnitude / right.magnitude
            } else {
                left.magnitude % right.magnitude
            };

            ValueUnit::new(magnitude, left.unit.as_str())
        }
        Operator::Power => {
            if !right.is_unitless() {
                return Err(mismatch("needs a unitless exponent"));
            }

            ValueUnit::new(left.magnitude.powf(right.magnitude), left.unit.as_str())
        }
        unsupported => return Err(out_of_place(unsupported)),
    };

    if !result.magnitude.is_finite() {
        return Err(Fallback::DivisionByZero);
    }

    Ok(Value::Number(result))
}

/// Negate a number, keeping its unit.
///
/// # Errors
///
/// Returns a [`Fallback`] if the value is not a number.
pub fn negate(value: Value) -> Result<Value, Fallback> {
    match value {
        Value::Number(nu) => Ok(Value::Number(ValueUnit::new(-nu.magnitude, nu.unit))),
        other => Err(Fallback::UnitMismatch(format!(
            "unary `-` is invalid on `{other}`"
        ))),
    }
}

/// Return the [`Fallback`] for an operator applied where it does not belong.
fn out_of_place(operator: Operator) -> Fallback {
    Fallback::MalformedExpression(format!("operator `{operator}` is out of place"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(magnitude: f64, unit: &str) -> Value {
        Value::Number(ValueUnit::new(magnitude, unit))
    }

    #[test]
    fn test_truthy() {
        let true_values = vec![
            number(1.0, "px"),
            number(-2.0, ""),
            Value::Bool(true),
            Value::Literal("a".to_string()),
        ];
        let false_values = vec![
            number(0.0, "px"),
            number(-0.0, ""),
            Value::Bool(false),
            Value::Literal(String::new()),
        ];

        for (left, right) in true_values.iter().zip(&false_values) {
            assert!(is_truthy(left));
            assert!(!is_truthy(right));
        }
    }

    #[test]
    fn test_compare_numbers() {
        let cases = [
            (Operator::Greater, 10.0, 5.0, true),
            (Operator::Greater, 5.0, 10.0, false),
            (Operator::Lesser, 5.0, 10.0, true),
            (Operator::Equal, 5.0, 5.0, true),
            (Operator::NotEqual, 5.0, 5.0, false),
            (Operator::GreaterOrEqual, 5.0, 5.0, true),
            (Operator::LesserOrEqual, 6.0, 5.0, false),
        ];

        for (operator, left, right, expected) in cases {
            assert_eq!(
                compare_values(&number(left, "px"), operator, &number(right, "px")),
                Ok(expected)
            );
        }
    }

    #[test]
    fn test_compare_incompatible() {
        assert!(matches!(
            compare_values(&number(1.0, "px"), Operator::Greater, &number(1.0, "em")),
            Err(Fallback::UnitMismatch(_))
        ));
        assert!(matches!(
            compare_values(&Value::Bool(true), Operator::Greater, &Value::Bool(false)),
            Err(Fallback::UnitMismatch(_))
        ));
        assert!(matches!(
            compare_values(&Value::Literal("a".to_string()), Operator::Equal, &number(1.0, "")),
            Err(Fallback::UnitMismatch(_))
        ));
        let literal = Value::Literal("a".to_string());
        assert_eq!(compare_values(&literal, Operator::Equal, &literal), Ok(true));
    }

    #[test]
    fn test_arithmetic_units() {
        let cases = [
            (number(10.0, "px"), Operator::Add, number(5.0, "px"), number(15.0, "px")),
            (number(3.0, ""), Operator::Multiply, number(2.0, "em"), number(6.0, "em")),
            (number(10.0, "%"), Operator::Modulo, number(4.0, ""), number(2.0, "%")),
            (number(2.0, "px"), Operator::Power, number(3.0, ""), number(8.0, "px")),
        ];
        for (left, operator, right, expected) in cases {
            assert_eq!(apply_arithmetic(&left, operator, &right), Ok(expected));
        }

        for (operator, left, right) in [
            (Operator::Subtract, "px", "em"),
            (Operator::Multiply, "px", "px"),
            (Operator::Divide, "px", "px"),
            (Operator::Modulo, "", "px"),
            (Operator::Power, "", "px"),
        ] {
            assert!(matches!(
                apply_arithmetic(&number(2.0, left), operator, &number(3.0, right)),
                Err(Fallback::UnitMismatch(_))
            ));
        }
    }

    #[test]
    fn test_arithmetic_division_by_zero() {
        for (left, operator, right) in [
            (10.0, Operator::Divide, 0.0),
            (10.0, Operator::Modulo, 0.0),
            (0.0, Operator::Power, -1.0),
        ] {
            assert_eq!(
                apply_arithmetic(&number(left, ""), operator, &number(right, "")),
                Err(Fallback::DivisionByZero)
            );
        }
    }

    #[test]
    fn test_arithmetic_on_literals() {
        let auto = Value::Literal("auto".to_string());

        assert!(matches!(
            apply_arithmetic(&auto, Operator::Add, &number(1.0, "")),
            Err(Fallback::UnitMismatch(_))
        ));
        assert!(matches!(negate(Value::Bool(true)), Err(Fallback::UnitMismatch(_))));
        assert_eq!(negate(number(2.0, "px")), Ok(number(-2.0, "px")));
    }
}
