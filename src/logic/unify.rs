//! Unification of a relation pattern against a target relation.
//!
//! Unification binds pattern variables to target variables and narrows the
//! type sets of both sides to their intersection. It never widens a type
//! set, and a step that would empty one fails instead.

use super::names::is_pattern_var;
use super::relation::{Relation, RelationArg, VarName};
use super::types::{TypeMap, TypeSet};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use thiserror::Error;

/// Why a pattern does not unify with a target.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnifyFailure {
    #[error("relNameMismatch: `{pattern}` vs `{target}`")]
    RelNameMismatch { pattern: String, target: String },

    #[error("arityMismatch: {pattern} vs {target} arguments")]
    ArityMismatch { pattern: usize, target: usize },

    #[error("typeMismatch: `{var}` and `{target_var}` share no type")]
    TypeMismatch { var: VarName, target_var: VarName },

    #[error("inconsistentBinding: `{var}` is bound to `{bound}`, cannot bind `{target_var}`")]
    InconsistentBinding {
        var: VarName,
        bound: VarName,
        target_var: VarName,
    },
}

/// Bindings and narrowed types accumulated along one match branch.
///
/// Cloned whenever a branch splits; never shared between branches.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UnifyState {
    /// Pattern variable to the scene variable it is bound to.
    pub var_substs: IndexMap<VarName, VarName>,
    /// Current type set of every variable seen so far.
    pub var_types: FxHashMap<VarName, TypeSet>,
}

impl UnifyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A state that already knows the types of existing scene variables.
    pub fn with_var_types<'a, I>(var_types: I) -> Self
    where
        I: IntoIterator<Item = (&'a VarName, &'a TypeSet)>,
    {
        Self {
            var_substs: IndexMap::new(),
            var_types: var_types
                .into_iter()
                .map(|(v, t)| (v.clone(), t.clone()))
                .collect(),
        }
    }

    /// Current type set of `arg`: its known set narrowed by its declared set.
    pub fn resolve(&self, types: &TypeMap, arg: &RelationArg) -> Option<TypeSet> {
        match self.var_types.get(&arg.var_name) {
            Some(current) => types.intersect(current, &arg.var_types),
            None => Some(arg.var_types.clone()),
        }
    }
}

/// Unify `pattern` against `target`, updating `state`.
///
/// On failure `state` may hold partial updates; callers discard it.
pub fn unify(
    types: &TypeMap,
    pattern: &Relation,
    target: &Relation,
    state: &mut UnifyState,
) -> Result<(), UnifyFailure> {
    if pattern.rel_name != target.rel_name {
        return Err(UnifyFailure::RelNameMismatch {
            pattern: pattern.rel_name.clone(),
            target: target.rel_name.clone(),
        });
    }
    if pattern.arity() != target.arity() {
        return Err(UnifyFailure::ArityMismatch {
            pattern: pattern.arity(),
            target: target.arity(),
        });
    }

    for (p, t) in pattern.args.iter().zip(&target.args) {
        let mismatch = || UnifyFailure::TypeMismatch {
            var: p.var_name.clone(),
            target_var: t.var_name.clone(),
        };
        let p_types = state.resolve(types, p).ok_or_else(mismatch)?;
        let t_types = state.resolve(types, t).ok_or_else(mismatch)?;
        let shared = types.intersect(&p_types, &t_types).ok_or_else(mismatch)?;

        if is_pattern_var(&p.var_name) {
            match state.var_substs.get(&p.var_name) {
                Some(bound) if *bound != t.var_name => {
                    return Err(UnifyFailure::InconsistentBinding {
                        var: p.var_name.clone(),
                        bound: bound.clone(),
                        target_var: t.var_name.clone(),
                    });
                }
                Some(_) => {}
                None => {
                    state
                        .var_substs
                        .insert(p.var_name.clone(), t.var_name.clone());
                }
            }
        } else if p.var_name != t.var_name {
            // A grounded name in a pattern only matches itself.
            return Err(UnifyFailure::InconsistentBinding {
                var: p.var_name.clone(),
                bound: p.var_name.clone(),
                target_var: t.var_name.clone(),
            });
        }

        state.var_types.insert(p.var_name.clone(), shared.clone());
        state.var_types.insert(t.var_name.clone(), shared);
    }

    Ok(())
}
