//! Tiny world task configuration.

use crate::error::Result;
use crate::logic::{TypeHierarchy, DEFAULT_MAX_BRANCHES};
use indexmap::IndexMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Everything needed to generate stories for one tiny world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TinyWorldConfig {
    pub name: String,
    pub seed: u64,
    pub max_input_len: usize,
    pub max_output_len: usize,
    pub type_hierarchy: TypeHierarchy,
    /// Relation name to the required type of each argument.
    pub relation_kinds: IndexMap<String, Vec<String>>,
    /// Relation literals the story starts from.
    pub base_story: Vec<String>,
    /// Rule literals.
    pub rules: Vec<String>,
    /// Most entities a generated story may mention.
    pub max_entity_limit: usize,
    /// Most join branches one rule match may create.
    pub max_branches: usize,
}

impl Default for TinyWorldConfig {
    fn default() -> Self {
        let type_hierarchy = TypeHierarchy::Groups(
            [
                ("animal", vec!["cat", "monkey", "elephant"]),
                ("inanimate", vec!["rock", "tree", "flower"]),
                ("squishable", vec!["cat", "monkey", "flower"]),
            ]
            .into_iter()
            .map(|(group, members)| {
                let members = members.into_iter().map(String::from).collect();
                (group.to_string(), TypeHierarchy::Leaves(members))
            })
            .collect(),
        );

        let relation_kinds = [
            ("is", vec![""]),
            ("runs-away", vec!["animal"]),
            ("squishes", vec!["animal", "squishable"]),
            ("jumps", vec!["animal"]),
        ]
        .into_iter()
        .map(|(rel, args)| (rel.to_string(), args.into_iter().map(String::from).collect()))
        .collect();

        let rules = [
            // Any kind of thing may be mentioned, monkeys most often.
            "S(is ?x:cat) += 1",
            "S(is ?x:monkey) += 2",
            "S(is ?x:elephant) += 1",
            "S(is ?x:rock) += 1",
            "S(is ?x:tree) += 1",
            "S(is ?x:flower) += 1",
            "S(is ?x:animal) += 1",
            "S(is ?x:inanimate) += 1",
            "S(is ?x:squishable) += 1",
            // A mentioned animal might jump.
            "S(jumps ?x | is ?x:animal) += 2",
            // Jumping monkeys and cats squish things, monkeys more often.
            "S(squishes ?x ?y | jumps ?x:monkey, is ?y) += 2",
            "S(squishes ?x ?y | jumps ?x:cat, is ?y) += 1",
            // Cats run away when elephants jump.
            "S(runs-away ?c | jumps ?e:elephant, is ?c:cat) += 2",
            "S(runs-away ?x | is ?c) += 1",
            "S(runs-away ?x) += 1",
            // A runaway we never called a cat may turn out to be one.
            "S(is ?x:cat | runs-away ?x, -is ?x:cat) += 1",
            // Runaways do nothing more.
            "S(jumps ?a | runs-away ?a:animal) *= 0",
            "S(squishes ?a ?y | runs-away ?a:animal, is ?y) *= 0",
            "S(runs-away ?a | runs-away ?a:animal) *= 0",
            // Squished animals neither run away nor jump.
            "S(runs-away ?y | squishes ?x ?y:animal) *= 0",
            "S(jumps ?y | squishes ?x ?y:animal) *= 0",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            name: "tiny synthetic world".to_string(),
            seed: 0,
            max_input_len: 10,
            max_output_len: 10,
            type_hierarchy,
            relation_kinds,
            base_story: Vec::new(),
            rules,
            max_entity_limit: 6,
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }
}

impl TinyWorldConfig {
    /// A world of `n_identity` interchangeable identities `i0..`, each
    /// mentioned with its own seeded weight in `0..100`.
    pub fn unigram(n_identity: usize, seed: u64) -> Self {
        let identities: Vec<String> = (0..n_identity).map(|i| format!("i{}", i)).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        let rules = identities
            .iter()
            .map(|id| format!("S(is ?x:{}) += {}", id, rng.gen_range(0..100)))
            .collect();

        let mut type_groups = IndexMap::new();
        type_groups.insert("t0".to_string(), TypeHierarchy::Leaves(identities));
        let mut relation_kinds = IndexMap::new();
        relation_kinds.insert("is".to_string(), vec![String::new()]);

        Self {
            name: "Generated Uni-Gram Tiny World".to_string(),
            seed: 42,
            max_input_len: 10,
            max_output_len: 20,
            type_hierarchy: TypeHierarchy::Groups(type_groups),
            relation_kinds,
            base_story: Vec::new(),
            rules,
            max_entity_limit: 6,
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }

    /// Load a config from a JSON file. Missing fields take default values.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
