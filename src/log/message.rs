use std::fmt::Display;

pub const UNBALANCED_BRACES: &str = "unbalanced braces";
pub const UNEXPECTED_TOKEN: &str = "unexpected token";
pub const INVALID_SYNTAX: &str = "invalid syntax";
pub const INVALID_REGISTRY: &str = "invalid registry";

/// Return a string describing an unexpected operator.
pub fn expected_operator<T>(received: T) -> String
where
    T: Display,
{
    format!(
        "expected operator like `+`, `-`, `*`, `/`, `%`, `**`, `==`, `!=`, `>=`, `<=`, \
        `&&`, `||`, found `{}`",
        received
    )
}

/// Return a string describing a `style` or `script` block that is never closed.
pub fn unclosed_block<T>(keyword: T) -> String
where
    T: Display,
{
    format!("the `{keyword}` block opened here is never closed, add a matching `}}`")
}
