//! CHTL - Unified Scanner and Value Evaluator
mod eval;
mod log;
mod region;
mod scan;
mod value;

pub use eval::{evaluate, Evaluator, Fallback, LocalContext, PropertyRegistry, Value};
pub use log::{
    Error, Pointer, Visual, INVALID_REGISTRY, INVALID_SYNTAX, UNBALANCED_BRACES, UNEXPECTED_TOKEN,
};
pub use region::Region;
pub use scan::{
    scan, Builder, Fragment, Kind, PlaceholderTable, Scan, Scanner, KEYWORDS, PLACEHOLDER_PREFIX,
};
pub use value::{tokenize, Lexeme, Lexer, Operator, Token, ValueUnit};
