//! Scoring competing rule matches into a distribution over next facts.

use super::matcher::{MatchLimits, RuleMatch};
use super::rule::{Rule, WeightMode};
use super::story::Story;
use crate::error::Result;
use indexmap::IndexMap;
use serde::Serialize;
use tracing::debug;

/// Rule matches grouped by the canonical text of the fact they propose.
pub type RuleApplications = IndexMap<String, Vec<RuleMatch>>;

/// Score and probability of one candidate next fact.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RelDistrStats {
    #[serde(rename = "totalScore")]
    pub total_score: f64,
    pub prob: f64,
}

/// Match every rule against `story`, grouping matches by candidate fact.
///
/// Textually identical heads from different rules or matches share one
/// entry. Candidates appear in order of first proposal.
pub fn apply_rules(rules: &[Rule], story: &Story) -> Result<RuleApplications> {
    apply_rules_with_limits(rules, story, &MatchLimits::default())
}

/// As [`apply_rules`], with an explicit branch budget per rule.
pub fn apply_rules_with_limits(
    rules: &[Rule],
    story: &Story,
    limits: &MatchLimits,
) -> Result<RuleApplications> {
    let mut grouped = RuleApplications::new();
    for rule in rules {
        for rule_match in story.match_rule_with_limits(rule, limits)? {
            grouped
                .entry(rule_match.head.to_string())
                .or_default()
                .push(rule_match);
        }
    }
    Ok(grouped)
}

/// Combined score of the matches behind one candidate.
///
/// Additive weights are summed (0 when there are none) and the sum is
/// multiplied by every multiplicative weight (1 when there are none).
pub fn total_score(matches: &[RuleMatch]) -> f64 {
    let mut additive = 0.0;
    let mut multiplier = 1.0;
    for m in matches {
        match m.weight.mode {
            WeightMode::Additive => additive += m.weight.value,
            WeightMode::Multiplicative => multiplier *= m.weight.value,
        }
    }
    additive * multiplier
}

/// Total score and probability for every candidate.
///
/// Probabilities are scores over the sum of all scores; when that sum is
/// zero every probability is zero.
pub fn next_rel_distr_stats(grouped: &RuleApplications) -> IndexMap<String, RelDistrStats> {
    let scores: Vec<(&String, f64)> = grouped
        .iter()
        .map(|(key, matches)| (key, total_score(matches)))
        .collect();
    let sum: f64 = scores.iter().map(|(_, s)| s).sum();

    let stats: IndexMap<String, RelDistrStats> = scores
        .into_iter()
        .map(|(key, total_score)| {
            let prob = if sum == 0.0 { 0.0 } else { total_score / sum };
            (key.clone(), RelDistrStats { total_score, prob })
        })
        .collect();

    debug!(candidates = stats.len(), total = sum, "built next-fact distribution");
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::relation::{Relation, RelationSchema};
    use crate::logic::story::apply_rule_match;
    use crate::logic::types::TypeMap;
    use crate::syntax::{parse_rel, parse_rule};
    use std::rc::Rc;

    fn story_with(facts: &[&str]) -> Story {
        let types = Rc::new(
            TypeMap::from_groups([
                ("animal", vec!["cat", "monkey", "elephant"]),
                ("inanimate", vec!["rock", "tree", "flower"]),
                ("squishable", vec!["cat", "monkey", "flower", "tree"]),
            ])
            .unwrap(),
        );
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
        let facts: Vec<Relation> = facts.iter().map(|f| parse_rel(f).unwrap()).collect();
        Story::init(types, Rc::new(relations))
            .extend_scene(&facts)
            .unwrap()
    }

    fn rules(texts: &[&str]) -> Vec<Rule> {
        texts.iter().map(|r| parse_rule(r).unwrap()).collect()
    }

    #[test]
    fn test_additive_only() {
        let rules = rules(&[
            "S(squishes ?x ?y | jumps-over ?x:animal ?y:flower) += 1",
            "S(squishes ?x ?y | jumps-over ?x:monkey ?y:flower) += 5",
        ]);
        let s = story_with(&["jumps-over _m:monkey _f:flower", "jumps-over _c:cat _f:flower"]);

        let distr = next_rel_distr_stats(&apply_rules(&rules, &s).unwrap());
        assert_eq!(distr.len(), 2);

        let monkey = distr["squishes _m:monkey _f:flower"];
        assert!((monkey.total_score - 6.0).abs() < 1e-9);
        assert!((monkey.prob - 6.0 / 7.0).abs() < 1e-9);

        let cat = distr["squishes _c:cat _f:flower"];
        assert!((cat.total_score - 1.0).abs() < 1e-9);
        assert!((cat.prob - 1.0 / 7.0).abs() < 1e-9);
    }

    #[test]
    fn test_additive_and_multiplicative() {
        let rules = rules(&[
            "S(squishes ?x ?y | jumps-over ?x ?y) += 1",
            "S(squishes ?x ?y | jumps-over ?x:cat ?y:flower) *= 0",
        ]);
        let s = story_with(&["jumps-over _m:monkey _f:flower", "jumps-over _c:cat _f:flower"]);

        let distr = next_rel_distr_stats(&apply_rules(&rules, &s).unwrap());
        assert_eq!(distr.len(), 2);
        assert_eq!(distr["squishes _m:monkey _f:flower"].total_score, 1.0);
        assert_eq!(distr["squishes _m:monkey _f:flower"].prob, 1.0);
        assert_eq!(distr["squishes _c:cat _f:flower"].total_score, 0.0);
        assert_eq!(distr["squishes _c:cat _f:flower"].prob, 0.0);
    }

    #[test]
    fn test_multiplicative_only_scores_zero() {
        let rules = rules(&["S(runs-away ?x | jumps-over ?x ?y) *= 3"]);
        let s = story_with(&["jumps-over _m:monkey _f:flower"]);
        let distr = next_rel_distr_stats(&apply_rules(&rules, &s).unwrap());
        let only = distr["runs-away _m:monkey"];
        assert_eq!(only.total_score, 0.0);
        assert_eq!(only.prob, 0.0);
    }

    #[test]
    fn test_negative_rule_runs_dry() {
        let rules = rules(&["S(is ?x:cat | runs-away ?x, -is ?x:cat) += 1"]);
        let s = story_with(&["runs-away _c:cat"]);

        let apps = apply_rules(&rules, &s).unwrap();
        assert_eq!(apps.keys().collect::<Vec<_>>(), vec!["is _c:cat"]);

        let next = apply_rule_match(&apps["is _c:cat"][0]);
        let derived = &next.scene()[1];
        assert_eq!(derived.rel_name, "is");
        assert_eq!(derived.args[0].var_name, "_c");

        assert!(apply_rules(&rules, &next).unwrap().is_empty());
    }

    #[test]
    fn test_identical_heads_merge_across_rules() {
        let rules = rules(&["S(runs-away ?x) += 1", "S(runs-away ?y | is ?z) += 2"]);
        let s = story_with(&["is _a:rock"]);
        let apps = apply_rules(&rules, &s).unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps["runs-away _b:animal"].len(), 2);
        assert_eq!(next_rel_distr_stats(&apps)["runs-away _b:animal"].total_score, 3.0);
    }

    #[test]
    fn test_example_domain_with_helpers() {
        let rules = rules(&[
            "S(is ?x:cat) += 1",
            "S(is ?x | is ?y) *= 0.5",
            "S(jumps-over ?x ?y | is ?x:animal) += 5",
        ]);
        let s = story_with(&["is _a:cat"]);
        assert_eq!(s.match_rule(&rules[2]).unwrap().len(), 1);
        assert_eq!(s.match_rule(&rules[1]).unwrap().len(), 1);
    }
}
