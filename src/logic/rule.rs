//! Weighted generative rules.
//!
//! `S(squishes ?x ?y | jumps-over ?x:monkey ?y, -runs-away ?x) += 2`
//! reads: when a monkey jumps over something and has not run away, a
//! squishing of that thing gains score 2.

use super::relation::Relation;
use std::fmt;

/// Whether a condition must hold or must fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sign {
    Positive,
    /// Negation as failure: holds when no scene fact unifies.
    Negative,
}

/// One condition of a rule body.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub pattern: Relation,
    pub sign: Sign,
}

impl Condition {
    pub fn positive(pattern: Relation) -> Self {
        Self {
            pattern,
            sign: Sign::Positive,
        }
    }

    pub fn negative(pattern: Relation) -> Self {
        Self {
            pattern,
            sign: Sign::Negative,
        }
    }

    pub fn is_negative(&self) -> bool {
        self.sign == Sign::Negative
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "-")?;
        }
        write!(f, "{}", self.pattern)
    }
}

/// How a rule's weight combines into a candidate's score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WeightMode {
    /// `+=`: summed with the other additive contributions.
    Additive,
    /// `*=`: multiplies the additive sum.
    Multiplicative,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weight {
    pub mode: WeightMode,
    pub value: f64,
}

impl Weight {
    pub fn additive(value: f64) -> Self {
        Self {
            mode: WeightMode::Additive,
            value,
        }
    }

    pub fn multiplicative(value: f64) -> Self {
        Self {
            mode: WeightMode::Multiplicative,
            value,
        }
    }
}

impl fmt::Display for Weight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.mode {
            WeightMode::Additive => write!(f, "+= {}", self.value),
            WeightMode::Multiplicative => write!(f, "*= {}", self.value),
        }
    }
}

/// A weighted rule: a head pattern derived when its conditions hold.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub head: Relation,
    pub conditions: Vec<Condition>,
    pub weight: Weight,
}

impl Rule {
    /// Every relation pattern the rule mentions, head first.
    pub fn patterns(&self) -> impl Iterator<Item = &Relation> {
        std::iter::once(&self.head).chain(self.conditions.iter().map(|c| &c.pattern))
    }

    pub fn positive_conditions(&self) -> impl Iterator<Item = &Relation> {
        self.conditions
            .iter()
            .filter(|c| !c.is_negative())
            .map(|c| &c.pattern)
    }

    pub fn negative_conditions(&self) -> impl Iterator<Item = &Relation> {
        self.conditions
            .iter()
            .filter(|c| c.is_negative())
            .map(|c| &c.pattern)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S({}", self.head)?;
        if !self.conditions.is_empty() {
            let conditions: Vec<String> = self.conditions.iter().map(|c| c.to_string()).collect();
            write!(f, " | {}", conditions.join(", "))?;
        }
        write!(f, ") {}", self.weight)
    }
}
