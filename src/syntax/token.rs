//! Token definitions for relation and rule literals.
//!
//! Uses the `logos` crate for lexing.

use logos::Logos;

/// Tokens of the tiny world literal language.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")] // Skip whitespace
pub enum Token {
    // Brackets
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    // Punctuation
    #[token("|")]
    Pipe,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("/")]
    Slash,

    // Operators
    #[token("-")]
    Minus,
    #[token("+=")]
    PlusEq,
    #[token("*=")]
    StarEq,

    // Variables: `_m` (grounded) or `?x` (pattern)
    #[regex(r"[_?][a-zA-Z0-9_]+", |lex| lex.slice().to_string())]
    Var(String),

    // Relation and type names, e.g. `jumps-over`
    #[regex(r"[a-zA-Z][a-zA-Z0-9_-]*", |lex| lex.slice().to_string())]
    Ident(String),

    // Literals
    #[regex(r"[0-9]+(\.[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    Number(f64),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Pipe => write!(f, "|"),
            Token::Comma => write!(f, ","),
            Token::Colon => write!(f, ":"),
            Token::Slash => write!(f, "/"),
            Token::Minus => write!(f, "-"),
            Token::PlusEq => write!(f, "+="),
            Token::StarEq => write!(f, "*="),
            Token::Var(s) => write!(f, "{}", s),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Number(n) => write!(f, "{}", n),
        }
    }
}
