//! Generative logic: typed relations, unification, rule matching and scoring.

mod matcher;
mod names;
mod relation;
mod rule;
mod scorer;
mod story;
mod types;
mod unify;

pub use matcher::{match_rule, MatchLimits, RuleMatch, DEFAULT_MAX_BRANCHES};
pub use names::{is_grounded, is_pattern_var, FreshNames, GROUNDED_PREFIX, PATTERN_PREFIX};
pub use relation::{RelName, Relation, RelationArg, RelationSchema, SchemaError, VarName};
pub use rule::{Condition, Rule, Sign, Weight, WeightMode};
pub use scorer::{
    apply_rules, apply_rules_with_limits, next_rel_distr_stats, total_score, RelDistrStats,
    RuleApplications,
};
pub use story::{apply_rule_match, Story};
pub use types::{root_type_set, type_set, TypeHierarchy, TypeMap, TypeName, TypeSet, ROOT_TYPE};
pub use unify::{unify, UnifyFailure, UnifyState};
