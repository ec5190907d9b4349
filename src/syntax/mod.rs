//! Syntax module: lexer and parser for relation and rule literals.

mod parser;
mod token;

pub use parser::{parse_rel, parse_rule, Parser};
pub use token::Token;
