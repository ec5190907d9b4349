//! Tiny worlds: generative logic over typed relations.
//!
//! A world is a type hierarchy, a relation schema and a set of weighted
//! rules. Rules are matched against a story's scene (with negation as
//! failure) and every match proposes a next fact; scoring those proposals
//! gives a probability distribution to sample stories from.
//!
//! ```text
//! S(squishes ?x ?y | jumps ?x:monkey, is ?y) += 2
//! ```

pub mod error;
pub mod logic;
pub mod syntax;
pub mod world;

pub use error::{Result, TinyWorldError};
pub use logic::{
    apply_rule_match, apply_rules, match_rule, next_rel_distr_stats, unify, FreshNames,
    MatchLimits, RelDistrStats, Relation, RelationArg, RelationSchema, Rule, RuleMatch, Story,
    TypeHierarchy, TypeMap, TypeSet, UnifyState,
};
pub use syntax::{parse_rel, parse_rule};
pub use world::{Example, TinyWorldConfig, TinyWorldTask};
