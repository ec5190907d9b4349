//! Parser for relation and rule literals.
//!
//! Grammar:
//!
//! ```text
//! relation  := IDENT arg*
//! arg       := VAR (":" IDENT ("/" IDENT)*)?
//! rule      := "S" "(" relation ("|" condition ("," condition)*)? ")" ("+=" | "*=") NUMBER
//! condition := "-"? relation
//! ```

use super::token::Token;
use crate::error::{Result, TinyWorldError};
use crate::logic::{root_type_set, Condition, Relation, RelationArg, Rule, TypeSet, Weight};
use logos::Logos;
use std::iter::Peekable;
use std::ops::Range;

/// Keyword that opens a rule.
const RULE_KEYWORD: &str = "S";

/// Parser state.
pub struct Parser {
    tokens: Peekable<std::vec::IntoIter<(Token, Range<usize>)>>,
    end: usize,
}

impl Parser {
    /// Lex `input` into a parser. Fails on characters outside the language.
    pub fn new(input: &str) -> Result<Self> {
        let mut tokens = Vec::new();
        for (token, span) in Token::lexer(input).spanned() {
            match token {
                Ok(token) => tokens.push((token, span)),
                Err(()) => {
                    return Err(parse_error(
                        span.start,
                        format!("unexpected input `{}`", &input[span]),
                    ))
                }
            }
        }
        Ok(Self {
            tokens: tokens.into_iter().peekable(),
            end: input.len(),
        })
    }

    /// Peek at the next token without consuming it.
    fn peek(&mut self) -> Option<&Token> {
        self.tokens.peek().map(|(t, _)| t)
    }

    /// Consume and return the next token.
    fn next(&mut self) -> Option<Token> {
        self.tokens.next().map(|(t, _)| t)
    }

    /// Byte offset of the next token, or end of input.
    fn offset(&mut self) -> usize {
        let end = self.end;
        self.tokens.peek().map_or(end, |(_, span)| span.start)
    }

    fn error(&mut self, message: impl Into<String>) -> TinyWorldError {
        let offset = self.offset();
        parse_error(offset, message)
    }

    /// Expect a specific token, return error if not found.
    fn expect(&mut self, expected: Token) -> Result<()> {
        let offset = self.offset();
        match self.next() {
            Some(t) if t == expected => Ok(()),
            Some(t) => Err(parse_error(offset, format!("expected {}, got {}", expected, t))),
            None => Err(parse_error(offset, format!("expected {}, got end of input", expected))),
        }
    }

    fn expect_ident(&mut self, what: &str) -> Result<String> {
        let offset = self.offset();
        match self.next() {
            Some(Token::Ident(s)) => Ok(s),
            Some(t) => Err(parse_error(offset, format!("expected {}, got {}", what, t))),
            None => Err(parse_error(offset, format!("expected {}, got end of input", what))),
        }
    }

    /// Parse a type annotation after `:`, e.g. `monkey` or `cat/monkey`.
    fn parse_types(&mut self) -> Result<TypeSet> {
        let mut types = TypeSet::new();
        types.insert(self.expect_ident("type name")?);
        while let Some(Token::Slash) = self.peek() {
            self.next();
            types.insert(self.expect_ident("type name")?);
        }
        Ok(types)
    }

    /// Parse a relation: `jumps-over _m:monkey ?y`
    pub fn parse_relation(&mut self) -> Result<Relation> {
        let rel_name = self.expect_ident("relation name")?;

        let mut args = Vec::new();
        while let Some(Token::Var(_)) = self.peek() {
            let Some(Token::Var(var_name)) = self.next() else {
                unreachable!()
            };
            let var_types = if let Some(Token::Colon) = self.peek() {
                self.next();
                self.parse_types()?
            } else {
                root_type_set()
            };
            args.push(RelationArg::new(var_name, var_types));
        }

        Ok(Relation::new(rel_name, args))
    }

    /// Parse a possibly negated condition: `-is ?x:cat`
    fn parse_condition(&mut self) -> Result<Condition> {
        if let Some(Token::Minus) = self.peek() {
            self.next();
            return Ok(Condition::negative(self.parse_relation()?));
        }
        Ok(Condition::positive(self.parse_relation()?))
    }

    /// Parse a weight: `+= 1` or `*= 0.5`
    fn parse_weight(&mut self) -> Result<Weight> {
        let offset = self.offset();
        let additive = match self.next() {
            Some(Token::PlusEq) => true,
            Some(Token::StarEq) => false,
            Some(t) => return Err(parse_error(offset, format!("expected += or *=, got {}", t))),
            None => return Err(parse_error(offset, "expected += or *=, got end of input")),
        };
        let offset = self.offset();
        let value = match self.next() {
            Some(Token::Number(n)) => n,
            Some(t) => return Err(parse_error(offset, format!("expected weight, got {}", t))),
            None => return Err(parse_error(offset, "expected weight, got end of input")),
        };
        Ok(if additive {
            Weight::additive(value)
        } else {
            Weight::multiplicative(value)
        })
    }

    /// Parse a rule: `S(head | cond1, -cond2) += 1`
    pub fn parse_rule(&mut self) -> Result<Rule> {
        let keyword = self.expect_ident("`S`")?;
        if keyword != RULE_KEYWORD {
            return Err(parse_error(0, format!("rules start with `S(`, got `{}`", keyword)));
        }
        self.expect(Token::LParen)?;

        let head = self.parse_relation()?;
        let mut conditions = Vec::new();
        if let Some(Token::Pipe) = self.peek() {
            self.next();
            conditions.push(self.parse_condition()?);
            while let Some(Token::Comma) = self.peek() {
                self.next();
                conditions.push(self.parse_condition()?);
            }
        }
        self.expect(Token::RParen)?;

        let weight = self.parse_weight()?;
        Ok(Rule {
            head,
            conditions,
            weight,
        })
    }

    /// Fail unless all input has been consumed.
    pub fn finish(&mut self) -> Result<()> {
        match self.peek() {
            None => Ok(()),
            Some(t) => {
                let message = format!("unexpected trailing {}", t);
                Err(self.error(message))
            }
        }
    }
}

fn parse_error(offset: usize, message: impl Into<String>) -> TinyWorldError {
    TinyWorldError::Parse {
        location: format!("offset {}", offset),
        message: message.into(),
    }
}

/// Parse a single relation literal.
pub fn parse_rel(input: &str) -> Result<Relation> {
    let mut parser = Parser::new(input)?;
    let relation = parser.parse_relation()?;
    parser.finish()?;
    Ok(relation)
}

/// Parse a single rule literal.
pub fn parse_rule(input: &str) -> Result<Rule> {
    let mut parser = Parser::new(input)?;
    let rule = parser.parse_rule()?;
    parser.finish()?;
    Ok(rule)
}
