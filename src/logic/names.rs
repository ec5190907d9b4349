//! Fresh entity names.

use indexmap::IndexSet;

/// Prefix of grounded (scene entity) variable names.
pub const GROUNDED_PREFIX: char = '_';

/// Prefix of rule pattern variable names.
pub const PATTERN_PREFIX: char = '?';

/// Whether a variable name refers to a scene entity.
pub fn is_grounded(var: &str) -> bool {
    var.starts_with(GROUNDED_PREFIX)
}

/// Whether a variable name is a rule pattern variable.
pub fn is_pattern_var(var: &str) -> bool {
    var.starts_with(PATTERN_PREFIX)
}

/// Issues grounded names that were never issued or registered before.
///
/// Names follow `_a`, `_b`, ..., `_z`, `_aa`, `_ab`, ... skipping anything
/// already in use.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FreshNames {
    used: IndexSet<String>,
    next_index: usize,
}

impl FreshNames {
    /// Create an allocator with no used names.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an allocator that will avoid every name in `names`.
    pub fn with_used<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut fresh = Self::new();
        fresh.add_names(names);
        fresh
    }

    /// Register names as used, e.g. when merging another world's entities.
    pub fn add_names<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for name in names {
            self.used.insert(name.into());
        }
    }

    /// Register a single name as used.
    pub fn add_name(&mut self, name: &str) {
        if !self.used.contains(name) {
            self.used.insert(name.to_string());
        }
    }

    /// Whether `name` has been issued or registered.
    pub fn is_used(&self, name: &str) -> bool {
        self.used.contains(name)
    }

    /// Every used name, in the order it was registered.
    pub fn used_names(&self) -> impl Iterator<Item = &str> {
        self.used.iter().map(String::as_str)
    }

    /// Issue and register the next unused name.
    pub fn next_name(&mut self) -> String {
        loop {
            let candidate = format!("{}{}", GROUNDED_PREFIX, letters(self.next_index));
            self.next_index += 1;
            if !self.used.contains(&candidate) {
                self.used.insert(candidate.clone());
                return candidate;
            }
        }
    }
}

/// Bijective base-26: 0 -> "a", 25 -> "z", 26 -> "aa".
fn letters(mut index: usize) -> String {
    let mut out = Vec::new();
    loop {
        out.push(b'a' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}
