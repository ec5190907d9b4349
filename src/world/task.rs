//! Seeded generation of tiny world token sequences.

use super::config::TinyWorldConfig;
use crate::error::{Result, TinyWorldError};
use crate::logic::{
    apply_rule_match, apply_rules_with_limits, next_rel_distr_stats, FreshNames, MatchLimits,
    RelDistrStats, Relation, RelationSchema, Rule, RuleApplications, Story, TypeMap, ROOT_TYPE,
};
use crate::syntax::{parse_rel, parse_rule};
use indexmap::IndexMap;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::rc::Rc;
use tracing::{debug, info};

/// Token separating relations in a rendered story.
pub const SEP_TOKEN: &str = ", ";

/// One training example: a story prefix and its continuation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Example {
    pub id: usize,
    pub input: Vec<String>,
    pub output: Vec<String>,
}

/// Generates stories, and token sequences from them, for one tiny world.
pub struct TinyWorldTask {
    config: TinyWorldConfig,
    rules: Vec<Rule>,
    init_story: Story,
    base_vocab: Vec<String>,
    limits: MatchLimits,
    rng: StdRng,
    example_id: usize,
}

impl TinyWorldTask {
    /// Build a task, validating the whole config up front.
    pub fn new(config: TinyWorldConfig) -> Result<Self> {
        let types = Rc::new(TypeMap::from_hierarchy(&config.type_hierarchy)?);
        let relations = Rc::new(RelationSchema::new(
            config.relation_kinds.iter().map(|(r, args)| (r.clone(), args.clone())),
            &types,
        )?);

        let rules = config
            .rules
            .iter()
            .map(|r| parse_rule(r))
            .collect::<Result<Vec<_>>>()?;
        for rule in &rules {
            check_rule(&relations, rule)?;
        }

        let base = config
            .base_story
            .iter()
            .map(|r| parse_rel(r))
            .collect::<Result<Vec<_>>>()?;
        let init_story = Story::init(types.clone(), relations.clone()).extend_scene(&base)?;
        if init_story.entity_count() > config.max_entity_limit {
            return Err(TinyWorldError::Config(format!(
                "base story mentions {} entities, more than the limit of {}",
                init_story.entity_count(),
                config.max_entity_limit
            )));
        }

        let mut fresh = FreshNames::new();
        let base_vocab = std::iter::once(SEP_TOKEN.to_string())
            .chain(relations.rel_names().cloned())
            .chain(types.type_names().cloned())
            .chain((0..config.max_entity_limit).map(|_| fresh.next_name()))
            .collect();

        info!(name = %config.name, rules = rules.len(), "built tiny world task");
        Ok(Self {
            limits: MatchLimits {
                max_branches: config.max_branches,
            },
            rng: StdRng::seed_from_u64(config.seed),
            config,
            rules,
            init_story,
            base_vocab,
            example_id: 0,
        })
    }

    pub fn config(&self) -> &TinyWorldConfig {
        &self.config
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Add a rule after checking its patterns against the schema.
    pub fn add_rule(&mut self, rule: Rule) -> Result<()> {
        check_rule(self.init_story.relations(), &rule)?;
        self.rules.push(rule);
        Ok(())
    }

    /// The story every generation starts from: the config's base story.
    pub fn init_story(&self) -> &Story {
        &self.init_story
    }

    /// Separator, relation names, type names and the first entity names.
    pub fn base_vocab(&self) -> &[String] {
        &self.base_vocab
    }

    /// Candidate next facts that keep the story within the entity limit.
    pub fn candidates(&self, story: &Story) -> Result<RuleApplications> {
        let mut grouped = apply_rules_with_limits(&self.rules, story, &self.limits)?;
        let limit = self.config.max_entity_limit;
        grouped.retain(|_, matches| {
            matches
                .first()
                .is_some_and(|m| story.entity_count() + m.fresh_vars.len() <= limit)
        });
        Ok(grouped)
    }

    /// Distribution over the next fact of `story`.
    pub fn next_distribution(&self, story: &Story) -> Result<IndexMap<String, RelDistrStats>> {
        Ok(next_rel_distr_stats(&self.candidates(story)?))
    }

    /// Sample and apply one next fact, or `None` when nothing can follow.
    pub fn step(&mut self, story: &Story) -> Result<Option<Story>> {
        let candidates = self.candidates(story)?;
        let weights: Vec<f64> = next_rel_distr_stats(&candidates)
            .values()
            .map(|s| s.total_score.max(0.0))
            .collect();
        if weights.iter().all(|w| *w == 0.0) {
            debug!(scene_len = story.scene().len(), "no candidate with positive score");
            return Ok(None);
        }

        let index = WeightedIndex::new(&weights)
            .map_err(|e| TinyWorldError::Config(format!("invalid rule weights: {}", e)))?
            .sample(&mut self.rng);
        let Some((fact, matches)) = candidates.get_index(index) else {
            return Ok(None);
        };
        debug!(%fact, score = weights[index], "sampled next fact");
        Ok(matches.first().map(apply_rule_match))
    }

    /// Generate up to `max_steps` facts on top of the initial story.
    pub fn gen_story(&mut self, max_steps: usize) -> Result<Story> {
        let mut story = self.init_story.clone();
        for _ in 0..max_steps {
            match self.step(&story)? {
                Some(next) => story = next,
                None => break,
            }
        }
        Ok(story)
    }

    /// Render a story's scene as tokens.
    pub fn story_tokens(story: &Story) -> Vec<String> {
        let mut tokens = Vec::new();
        for (i, relation) in story.scene().iter().enumerate() {
            if i > 0 {
                tokens.push(SEP_TOKEN.to_string());
            }
            tokens.extend(relation_tokens(relation));
        }
        tokens
    }

    /// Generate one example from a fresh story.
    pub fn gen_rand_example(&mut self) -> Result<Example> {
        let max_input_len = self.config.max_input_len;
        let target_len = max_input_len + self.config.max_output_len;

        let mut story = self.init_story.clone();
        let mut tokens = Self::story_tokens(&story);
        while tokens.len() < target_len {
            match self.step(&story)? {
                Some(next) => {
                    story = next;
                    tokens = Self::story_tokens(&story);
                }
                None => break,
            }
        }

        let input_end = tokens.len().min(max_input_len);
        let output_end = tokens.len().min(target_len);
        let example = Example {
            id: self.example_id,
            input: tokens[..input_end].to_vec(),
            output: tokens[input_end..output_end].to_vec(),
        };
        self.example_id += 1;
        Ok(example)
    }

    /// An endless stream of examples.
    pub fn examples(&mut self) -> impl Iterator<Item = Result<Example>> + '_ {
        std::iter::from_fn(move || Some(self.gen_rand_example()))
    }
}

fn check_rule(relations: &RelationSchema, rule: &Rule) -> Result<()> {
    for pattern in rule.patterns() {
        relations.check(pattern)?;
    }
    Ok(())
}

fn relation_tokens(relation: &Relation) -> Vec<String> {
    let mut tokens = vec![relation.rel_name.clone()];
    for arg in &relation.args {
        tokens.push(arg.var_name.clone());
        tokens.extend(
            arg.var_types
                .iter()
                .filter(|t| t.as_str() != ROOT_TYPE)
                .cloned(),
        );
    }
    tokens
}
