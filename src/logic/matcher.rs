//! Rule matching: a constrained join over the scene.
//!
//! Positive conditions are joined left to right. Each partial match is a
//! [`UnifyState`] on an explicit stack; a condition splits a partial match
//! into one branch per scene fact it unifies with. Completed branches are
//! then filtered by the negative conditions (negation as failure) and their
//! heads instantiated, allocating fresh entities for head-only variables.

use super::names::is_pattern_var;
use super::relation::{Relation, RelationArg, VarName};
use super::rule::{Rule, Weight};
use super::story::Story;
use super::types::{type_set, TypeSet};
use super::unify::{unify, UnifyState};
use crate::error::{Result, TinyWorldError};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use tracing::debug;

/// Default bound on the number of branches one rule match may create.
pub const DEFAULT_MAX_BRANCHES: usize = 100_000;

/// Resource bounds for matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchLimits {
    pub max_branches: usize,
}

impl Default for MatchLimits {
    fn default() -> Self {
        Self {
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }
}

/// One consistent way of satisfying a rule against a story.
#[derive(Debug, Clone)]
pub struct RuleMatch {
    /// Rule variable to scene variable, including fresh entities.
    pub substitution: IndexMap<VarName, VarName>,
    /// The instantiated head: the fact this match proposes.
    pub head: Relation,
    /// Entities the head introduces, with their assigned types.
    pub fresh_vars: IndexMap<VarName, TypeSet>,
    pub weight: Weight,
    /// The story that was matched, unchanged.
    pub story: Story,
}

/// Every match of `rule` against `story`.
///
/// Fails as a whole if any relation the rule mentions is missing from the
/// schema or has the wrong arity, or if the join outgrows `limits`.
pub fn match_rule(story: &Story, rule: &Rule, limits: &MatchLimits) -> Result<Vec<RuleMatch>> {
    for pattern in rule.patterns() {
        story.relations().check(pattern)?;
    }

    let positives: Vec<&Relation> = rule.positive_conditions().collect();
    let mut stack: Vec<(usize, UnifyState)> = vec![(0, story.new_unify_state())];
    let mut completed = Vec::new();
    let mut branches = 0usize;
    let mut pruned = 0usize;

    while let Some((next, state)) = stack.pop() {
        let Some(condition) = positives.get(next) else {
            completed.push(state);
            continue;
        };

        let mut children = Vec::new();
        for fact in story
            .scene()
            .iter()
            .filter(|f| f.rel_name == condition.rel_name)
        {
            let mut branch = state.clone();
            match unify(story.types(), condition, fact, &mut branch) {
                Ok(()) => children.push((next + 1, branch)),
                Err(_) => pruned += 1,
            }
        }

        branches += children.len();
        if branches > limits.max_branches {
            return Err(TinyWorldError::BranchLimit {
                rule: rule.to_string(),
                limit: limits.max_branches,
            });
        }
        // Reversed so branches complete in scene order.
        stack.extend(children.into_iter().rev());
    }

    let negatives: Vec<&Relation> = rule.negative_conditions().collect();
    let mut matches = Vec::new();
    for state in completed {
        if negatives.iter().any(|neg| holds(story, neg, &state)) {
            pruned += 1;
            continue;
        }
        if let Some(rule_match) = instantiate(story, rule, &state) {
            matches.push(rule_match);
        } else {
            pruned += 1;
        }
    }

    debug!(
        rule = %rule,
        matches = matches.len(),
        branches,
        pruned,
        "matched rule"
    );
    Ok(matches)
}

/// Whether some scene fact unifies with `pattern` under the branch bindings.
fn holds(story: &Story, pattern: &Relation, state: &UnifyState) -> bool {
    story
        .scene()
        .iter()
        .filter(|f| f.rel_name == pattern.rel_name)
        .any(|fact| {
            let mut probe = state.clone();
            unify(story.types(), pattern, fact, &mut probe).is_ok()
        })
}

/// Build the head fact for a completed branch.
///
/// Returns `None` when the head's declared or schema types leave some
/// argument without a type.
fn instantiate(story: &Story, rule: &Rule, state: &UnifyState) -> Option<RuleMatch> {
    let types = story.types();
    let required = story.relations().arg_types(&rule.head.rel_name)?;
    let mut names = story.names().clone();
    let mut substitution = state.var_substs.clone();
    let mut fresh_vars: IndexMap<VarName, TypeSet> = IndexMap::new();
    let mut head_types: FxHashMap<VarName, TypeSet> = FxHashMap::default();
    let mut head_vars = Vec::with_capacity(rule.head.arity());

    // Grounded head literals are in use before any fresh name is issued.
    for arg in rule.head.args.iter().filter(|a| !is_pattern_var(&a.var_name)) {
        names.add_name(&arg.var_name);
    }

    for (arg, required) in rule.head.args.iter().zip(required) {
        let var = if is_pattern_var(&arg.var_name) {
            match substitution.get(&arg.var_name) {
                Some(bound) => bound.clone(),
                None => {
                    let fresh = names.next_name();
                    substitution.insert(arg.var_name.clone(), fresh.clone());
                    fresh_vars.insert(fresh.clone(), TypeSet::new());
                    fresh
                }
            }
        } else {
            if story.var_type(&arg.var_name).is_none() && !fresh_vars.contains_key(&arg.var_name) {
                fresh_vars.insert(arg.var_name.clone(), TypeSet::new());
            }
            arg.var_name.clone()
        };

        let current = head_types
            .get(&var)
            .or_else(|| state.var_types.get(&var))
            .or_else(|| story.var_type(&var))
            .cloned();
        let declared = match current {
            Some(current) => types.intersect(&current, &arg.var_types)?,
            None => arg.var_types.clone(),
        };
        let narrowed = types.intersect(&declared, &type_set([required.as_str()]))?;
        head_types.insert(var.clone(), narrowed);
        head_vars.push(var);
    }

    let args = head_vars
        .into_iter()
        .map(|var| {
            let var_types = head_types.get(&var).cloned().unwrap_or_default();
            RelationArg::new(var, var_types)
        })
        .collect();
    for (var, var_types) in fresh_vars.iter_mut() {
        if let Some(t) = head_types.get(var) {
            *var_types = t.clone();
        }
    }

    Some(RuleMatch {
        substitution,
        head: Relation::new(rule.head.rel_name.clone(), args),
        fresh_vars,
        weight: rule.weight,
        story: story.clone(),
    })
}
