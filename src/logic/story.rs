//! Stories: immutable snapshots of a growing scene.
//!
//! A [`Story`] holds the scene (grounded facts in order), the current type
//! set of every scene entity, and the name allocator. The type map and
//! relation schema are shared between all stories derived from the same
//! start. Deriving a story never changes the one it came from: the scene,
//! the entity types and the allocator are copy-on-write.

use super::matcher::{match_rule, MatchLimits, RuleMatch};
use super::names::{is_grounded, FreshNames};
use super::relation::{Relation, RelationArg, RelationSchema, VarName};
use super::rule::Rule;
use super::types::{type_set, TypeMap, TypeSet};
use super::unify::{unify, UnifyFailure, UnifyState};
use crate::error::{Result, TinyWorldError};
use indexmap::IndexMap;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone)]
pub struct Story {
    types: Rc<TypeMap>,
    relations: Rc<RelationSchema>,
    names: Rc<FreshNames>,
    var_types: Rc<IndexMap<VarName, TypeSet>>,
    scene: Rc<Vec<Relation>>,
}

impl Story {
    /// Start an empty story over a type map and relation schema.
    pub fn init(types: Rc<TypeMap>, relations: Rc<RelationSchema>) -> Self {
        Self {
            types,
            relations,
            names: Rc::new(FreshNames::new()),
            var_types: Rc::new(IndexMap::new()),
            scene: Rc::new(Vec::new()),
        }
    }

    pub fn types(&self) -> &TypeMap {
        &self.types
    }

    pub fn relations(&self) -> &RelationSchema {
        &self.relations
    }

    pub fn names(&self) -> &FreshNames {
        &self.names
    }

    /// Current type set of every scene entity, in order of introduction.
    pub fn var_types(&self) -> &IndexMap<VarName, TypeSet> {
        &self.var_types
    }

    pub fn var_type(&self, var: &str) -> Option<&TypeSet> {
        self.var_types.get(var)
    }

    pub fn scene(&self) -> &[Relation] {
        &self.scene
    }

    /// Number of distinct entities mentioned in the scene.
    pub fn entity_count(&self) -> usize {
        self.var_types.len()
    }

    /// The same story, with `names` also reserved in its allocator.
    ///
    /// Use this after merging entities from another world so fresh names
    /// cannot collide with them.
    pub fn with_names<I, S>(&self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut next = self.clone();
        Rc::make_mut(&mut next.names).add_names(names);
        next
    }

    /// A unify state seeded with the current types of scene entities.
    pub fn new_unify_state(&self) -> UnifyState {
        UnifyState::with_var_types(self.var_types.iter())
    }

    /// Unify `pattern` against `target` using this story's type map.
    pub fn unify(
        &self,
        pattern: &Relation,
        target: &Relation,
        state: &mut UnifyState,
    ) -> std::result::Result<(), UnifyFailure> {
        unify(&self.types, pattern, target, state)
    }

    /// Append caller-supplied facts, returning the extended story.
    ///
    /// Every fact must name a schema relation with the right arity, use only
    /// grounded variables, and have argument types inside the schema's
    /// types for their positions and compatible with what the story already
    /// knows about each entity. Nothing is committed unless all facts pass.
    pub fn extend_scene(&self, facts: &[Relation]) -> Result<Story> {
        let mut state = self.new_unify_state();
        let mut accepted = Vec::with_capacity(facts.len());

        for fact in facts {
            let required = self.relations.check(fact)?;
            if let Some(var) = fact.var_names().find(|v| !is_grounded(v)) {
                return Err(TinyWorldError::Config(format!(
                    "scene facts need grounded variables, `{}` in `{}` is not",
                    var, fact
                )));
            }

            let schema_pattern = Relation::new(
                fact.rel_name.clone(),
                required
                    .iter()
                    .enumerate()
                    .map(|(i, t)| RelationArg::new(format!("?{}", i), type_set([t.as_str()])))
                    .collect(),
            );
            unify(&self.types, &schema_pattern, fact, &mut state)?;
            state.var_substs.clear();
            state.var_types.retain(|v, _| is_grounded(v));
            accepted.push(fact);
        }

        let mut next = self.clone();
        let var_types = Rc::make_mut(&mut next.var_types);
        let names = Rc::make_mut(&mut next.names);
        let scene = Rc::make_mut(&mut next.scene);
        for fact in accepted {
            let mut args = Vec::with_capacity(fact.arity());
            for arg in &fact.args {
                let narrowed = state
                    .var_types
                    .get(&arg.var_name)
                    .cloned()
                    .unwrap_or_else(|| arg.var_types.clone());
                var_types.insert(arg.var_name.clone(), narrowed.clone());
                names.add_name(&arg.var_name);
                args.push(RelationArg::new(arg.var_name.clone(), narrowed));
            }
            scene.push(Relation::new(fact.rel_name.clone(), args));
        }

        debug!(added = facts.len(), scene_len = next.scene.len(), "extended scene");
        Ok(next)
    }

    /// Every way `rule` matches this story's scene.
    pub fn match_rule(&self, rule: &Rule) -> Result<Vec<RuleMatch>> {
        match_rule(self, rule, &MatchLimits::default())
    }

    /// As [`Story::match_rule`], with an explicit branch budget.
    pub fn match_rule_with_limits(&self, rule: &Rule, limits: &MatchLimits) -> Result<Vec<RuleMatch>> {
        match_rule(self, rule, limits)
    }
}

/// The story a match came from, extended with the match's derived fact.
///
/// Fresh entities introduced by the head are reserved in the new story's
/// allocator and get the types the head assigned them.
pub fn apply_rule_match(rule_match: &RuleMatch) -> Story {
    let mut next = rule_match.story.clone();
    Rc::make_mut(&mut next.names).add_names(rule_match.fresh_vars.keys().cloned());

    let var_types = Rc::make_mut(&mut next.var_types);
    for arg in &rule_match.head.args {
        var_types.insert(arg.var_name.clone(), arg.var_types.clone());
    }
    Rc::make_mut(&mut next.scene).push(rule_match.head.clone());

    trace!(fact = %rule_match.head, "applied rule match");
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::{root_type_set, type_set};
    use crate::syntax::{parse_rel, parse_rule};

    fn types() -> Rc<TypeMap> {
        Rc::new(
            TypeMap::from_groups([
                ("animal", vec!["cat", "monkey", "elephant"]),
                ("inanimate", vec!["rock", "tree", "flower"]),
                ("squishable", vec!["cat", "monkey", "flower", "tree"]),
            ])
            .unwrap(),
        )
    }

    fn story() -> Story {
        let types = types();
        let relations = RelationSchema::new(
            [
                ("jumps-over", vec!["animal", ""]),
                ("runs-away", vec!["animal"]),
                ("is", vec![""]),
                ("squishes", vec!["animal", "squishable"]),
            ],
            &types,
        )
        .unwrap();
        Story::init(types, Rc::new(relations))
    }

    #[test]
    fn test_extend_scene_records_entities() {
        let s = story()
            .extend_scene(&[parse_rel("jumps-over _m:monkey _f:flower").unwrap()])
            .unwrap();
        assert!(s.names().is_used("_m"));
        assert!(s.names().is_used("_f"));
        assert_eq!(s.var_type("_m"), Some(&type_set(["monkey"])));
        assert_eq!(s.var_type("_f"), Some(&type_set(["flower"])));
        assert_eq!(s.scene().len(), 1);
    }

    #[test]
    fn test_unify_against_scene_fact() {
        let s = story()
            .extend_scene(&[parse_rel("jumps-over _m:monkey _f:flower").unwrap()])
            .unwrap();

        let mut state = s.new_unify_state();
        let pattern = parse_rel("jumps-over ?x:animal ?y").unwrap();
        assert_eq!(s.unify(&pattern, &s.scene()[0], &mut state), Ok(()));
        assert_eq!(state.var_substs.get("?x").map(String::as_str), Some("_m"));
        assert_eq!(state.var_types.get("?x"), Some(&type_set(["monkey"])));

        let cat = parse_rel("jumps-over ?x:cat ?y").unwrap();
        assert!(matches!(
            s.unify(&cat, &s.scene()[0], &mut s.new_unify_state()),
            Err(UnifyFailure::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_extend_scene_rejects_schema_type_clash() {
        let s = story();
        let err = s.extend_scene(&[parse_rel("jumps-over _m:rock _f:flower").unwrap()]);
        assert!(matches!(err, Err(TinyWorldError::Unify(UnifyFailure::TypeMismatch { .. }))));
    }

    #[test]
    fn test_extend_scene_narrows_with_schema() {
        let s = story()
            .extend_scene(&[parse_rel("runs-away _x").unwrap()])
            .unwrap();
        assert_eq!(s.var_type("_x"), Some(&type_set(["animal"])));
        assert_eq!(s.scene()[0].to_string(), "runs-away _x:animal");
    }

    #[test]
    fn test_extend_scene_is_all_or_nothing() {
        let s = story()
            .extend_scene(&[parse_rel("is _c:cat").unwrap()])
            .unwrap();
        let err = s.extend_scene(&[
            parse_rel("runs-away _d:monkey").unwrap(),
            parse_rel("is _c:rock").unwrap(),
        ]);
        assert!(err.is_err());
        assert_eq!(s.scene().len(), 1);
        assert!(s.var_type("_d").is_none());
        assert!(!s.names().is_used("_d"));
    }

    #[test]
    fn test_extend_scene_schema_errors() {
        let s = story();
        let missing = s.extend_scene(&[parse_rel("flies _b").unwrap()]);
        assert!(matches!(missing, Err(TinyWorldError::Schema(_))));

        let arity = s.extend_scene(&[parse_rel("is _a _b").unwrap()]);
        assert!(matches!(arity, Err(TinyWorldError::Schema(_))));

        let pattern_var = s.extend_scene(&[parse_rel("is ?x").unwrap()]);
        assert!(matches!(pattern_var, Err(TinyWorldError::Config(_))));
    }

    #[test]
    fn test_old_handles_keep_their_prefix() {
        let s1 = story()
            .extend_scene(&[parse_rel("is _a:cat").unwrap()])
            .unwrap();
        let s2 = s1
            .extend_scene(&[parse_rel("runs-away _a").unwrap()])
            .unwrap();
        let s3 = s1
            .extend_scene(&[parse_rel("is _b:rock").unwrap()])
            .unwrap();

        assert_eq!(s1.scene().len(), 1);
        assert_eq!(s2.scene().len(), 2);
        assert_eq!(s3.scene().len(), 2);
        assert_eq!(s2.scene()[1].rel_name, "runs-away");
        assert_eq!(s3.scene()[1].rel_name, "is");
        assert!(s1.var_type("_b").is_none());
    }

    #[test]
    fn test_apply_rule_match_same_vars() {
        let rule = parse_rule("S(squishes ?x ?y | jumps-over ?x ?y) *= 1").unwrap();
        let s = story()
            .extend_scene(&[parse_rel("jumps-over _m:monkey _f:flower").unwrap()])
            .unwrap();
        let matches = s.match_rule(&rule).unwrap();
        let s2 = apply_rule_match(&matches[0]);

        assert_eq!(s2.scene().len(), 2);
        let derived = &s2.scene()[1];
        assert_eq!(derived.rel_name, "squishes");
        assert_eq!(derived.args[0].var_name, "_m");
        assert_eq!(derived.args[0].var_types, type_set(["monkey"]));
        assert_eq!(derived.args[1].var_name, "_f");
        assert_eq!(derived.args[1].var_types, type_set(["flower"]));
        assert_eq!(s.scene().len(), 1);
    }

    #[test]
    fn test_apply_rule_match_fresh_var_without_conditions() {
        let rule = parse_rule("S(is ?x) *= 1").unwrap();
        let s = story()
            .extend_scene(&[parse_rel("is _a:monkey").unwrap()])
            .unwrap();
        let matches = s.match_rule(&rule).unwrap();
        assert_eq!(matches.len(), 1);

        let s2 = apply_rule_match(&matches[0]);
        assert_eq!(s2.scene().len(), 2);
        assert_eq!(s2.scene()[1].rel_name, "is");
        assert_eq!(s2.scene()[1].args[0].var_name, "_b");
        assert_eq!(s2.scene()[1].args[0].var_types, root_type_set());
        assert!(s2.names().is_used("_b"));
        assert!(!s.names().is_used("_b"));
    }

    #[test]
    fn test_apply_rule_match_fresh_var_takes_schema_type() {
        let rule = parse_rule("S(squishes ?x ?z | jumps-over ?x ?y) *= 1").unwrap();
        let s = story()
            .extend_scene(&[parse_rel("jumps-over _m:monkey _f:flower").unwrap()])
            .unwrap();
        let matches = s.match_rule(&rule).unwrap();
        let s2 = apply_rule_match(&matches[0]);

        let derived = &s2.scene()[1];
        assert_eq!(derived.args[0].var_name, "_m");
        assert_eq!(derived.args[0].var_types, type_set(["monkey"]));
        assert_eq!(derived.args[1].var_name, "_a");
        assert_eq!(derived.args[1].var_types, type_set(["squishable"]));
        assert_eq!(s2.var_type("_a"), Some(&type_set(["squishable"])));
    }

    #[test]
    fn test_apply_is_deterministic() {
        let rule = parse_rule("S(runs-away ?z | jumps-over ?x ?y) += 1").unwrap();
        let fact = parse_rel("jumps-over _m:monkey _f:flower").unwrap();
        let a = story().extend_scene(&[fact.clone()]).unwrap();
        let b = story().extend_scene(&[fact]).unwrap();

        let ma = a.match_rule(&rule).unwrap();
        let mb = b.match_rule(&rule).unwrap();
        assert_eq!(apply_rule_match(&ma[0]).scene(), apply_rule_match(&mb[0]).scene());
    }

    #[test]
    fn test_with_names_reserves_merged_entities() {
        let rule = parse_rule("S(is ?x) += 1").unwrap();
        let s = story().with_names(["_a", "_b"]);
        let matches = s.match_rule(&rule).unwrap();
        assert_eq!(matches[0].head.args[0].var_name, "_c");
    }
}
