//! Type hierarchy and type closures.
//!
//! A hierarchy is a tree whose leaves are lists of concrete type names and
//! whose internal nodes are named groups. The [`TypeMap`] built from it maps
//! every name to its closure: the concrete types it stands for. The root
//! alias `""` stands for every registered name.

use crate::error::{Result, TinyWorldError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Name of a type. `""` is the universal root.
pub type TypeName = String;

/// A set of type names. Equality is set-of-name equality.
pub type TypeSet = BTreeSet<TypeName>;

/// The universal root type.
pub const ROOT_TYPE: &str = "";

/// A type hierarchy as written in configuration.
///
/// ```json
/// { "animal": ["cat", "monkey"], "inanimate": ["rock"] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TypeHierarchy {
    /// Concrete types.
    Leaves(Vec<TypeName>),
    /// Named groups of sub-hierarchies.
    Groups(IndexMap<TypeName, TypeHierarchy>),
}

/// Build a type set from a list of names.
pub fn type_set<I, S>(names: I) -> TypeSet
where
    I: IntoIterator<Item = S>,
    S: Into<TypeName>,
{
    names.into_iter().map(Into::into).collect()
}

/// The type set `{""}`, compatible with everything.
pub fn root_type_set() -> TypeSet {
    type_set([ROOT_TYPE])
}

/// Closure map from type name to concrete member types. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeMap {
    closures: IndexMap<TypeName, TypeSet>,
}

impl TypeMap {
    /// Build the closure map for a hierarchy.
    pub fn from_hierarchy(hierarchy: &TypeHierarchy) -> Result<Self> {
        let mut builder = TypeMapBuilder::default();
        builder.add(hierarchy)?;
        Ok(builder.finish())
    }

    /// Build a closure map directly from group definitions, e.g.
    /// `[("animal", ["cat", "monkey"])]`. Groups may share members.
    pub fn from_groups<'a, I, M>(groups: I) -> Result<Self>
    where
        I: IntoIterator<Item = (&'a str, M)>,
        M: IntoIterator<Item = &'a str>,
    {
        let groups: IndexMap<TypeName, TypeHierarchy> = groups
            .into_iter()
            .map(|(name, members)| {
                let leaves = members.into_iter().map(str::to_string).collect();
                (name.to_string(), TypeHierarchy::Leaves(leaves))
            })
            .collect();
        Self::from_hierarchy(&TypeHierarchy::Groups(groups))
    }

    /// Closure of one type name, `None` for unknown names.
    pub fn closure(&self, name: &str) -> Option<&TypeSet> {
        self.closures.get(name)
    }

    /// Whether `name` is registered (the root always is).
    pub fn contains(&self, name: &str) -> bool {
        self.closures.contains_key(name)
    }

    /// Every registered name except the root, in registration order.
    pub fn type_names(&self) -> impl Iterator<Item = &TypeName> {
        self.closures.keys().filter(|n| n.as_str() != ROOT_TYPE)
    }

    /// Concrete types a set stands for: the union of its members' closures.
    pub fn concrete(&self, set: &TypeSet) -> TypeSet {
        set.iter()
            .filter_map(|t| self.closures.get(t))
            .flat_map(|c| c.iter().cloned())
            .collect()
    }

    /// Intersect two type sets by meaning.
    ///
    /// Returns `None` when no concrete type is shared. Otherwise the result
    /// keeps the named members of either side whose closure lies inside the
    /// shared concrete types, and spells out whatever those names leave
    /// uncovered.
    pub fn intersect(&self, a: &TypeSet, b: &TypeSet) -> Option<TypeSet> {
        let ca = self.concrete(a);
        let cb = self.concrete(b);
        let shared: TypeSet = ca.intersection(&cb).cloned().collect();
        if shared.is_empty() {
            return None;
        }

        let covered: Vec<(&TypeName, &TypeSet)> = a
            .iter()
            .chain(b.iter())
            .filter_map(|t| self.closures.get(t).map(|c| (t, c)))
            .filter(|(_, c)| !c.is_empty() && c.is_subset(&shared))
            .collect();

        let mut result = TypeSet::new();
        for (name, closure) in &covered {
            let subsumed = covered
                .iter()
                .any(|(other, oc)| other != name && closure.is_subset(oc) && closure.len() < oc.len());
            if !subsumed {
                result.insert((*name).clone());
            }
        }

        let reached = self.concrete(&result);
        for t in shared.difference(&reached) {
            result.insert(t.clone());
        }
        Some(result)
    }
}

#[derive(Default)]
struct TypeMapBuilder {
    closures: IndexMap<TypeName, TypeSet>,
    groups: BTreeSet<TypeName>,
    leaves: BTreeSet<TypeName>,
}

impl TypeMapBuilder {
    /// Register a sub-hierarchy, returning the concrete types beneath it.
    fn add(&mut self, hierarchy: &TypeHierarchy) -> Result<TypeSet> {
        match hierarchy {
            TypeHierarchy::Leaves(names) => {
                for name in names {
                    self.check_name(name)?;
                    if self.groups.contains(name) {
                        return Err(TinyWorldError::Config(format!(
                            "type `{}` is declared both as a group and as a concrete type",
                            name
                        )));
                    }
                    self.leaves.insert(name.clone());
                    self.closures.insert(name.clone(), type_set([name.as_str()]));
                }
                Ok(names.iter().cloned().collect())
            }
            TypeHierarchy::Groups(groups) => {
                let mut all = TypeSet::new();
                for (name, sub) in groups {
                    self.check_name(name)?;
                    if self.leaves.contains(name) {
                        return Err(TinyWorldError::Config(format!(
                            "type `{}` is declared both as a concrete type and as a group",
                            name
                        )));
                    }
                    if !self.groups.insert(name.clone()) {
                        return Err(TinyWorldError::Config(format!(
                            "type group `{}` is declared twice",
                            name
                        )));
                    }
                    let members = self.add(sub)?;
                    self.closures.insert(name.clone(), members.clone());
                    all.extend(members);
                }
                Ok(all)
            }
        }
    }

    fn check_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(TinyWorldError::Config(
                "the empty type name is reserved for the root".into(),
            ));
        }
        Ok(())
    }

    fn finish(mut self) -> TypeMap {
        let all: TypeSet = self.closures.keys().cloned().collect();
        self.closures.insert(ROOT_TYPE.to_string(), all);
        TypeMap {
            closures: self.closures,
        }
    }
}
