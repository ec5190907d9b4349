//! Relations and relation schemas.

use super::types::{TypeMap, TypeName, TypeSet, ROOT_TYPE};
use crate::error::{Result, TinyWorldError};
use indexmap::IndexMap;
use std::fmt;
use thiserror::Error;

/// Name of a relation, e.g. `jumps-over`.
pub type RelName = String;

/// Name of a variable: `_x` for scene entities, `?x` for rule patterns.
pub type VarName = String;

/// One argument of a relation: a variable and its compatible types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationArg {
    pub var_name: VarName,
    pub var_types: TypeSet,
}

impl RelationArg {
    pub fn new(var_name: impl Into<VarName>, var_types: TypeSet) -> Self {
        Self {
            var_name: var_name.into(),
            var_types,
        }
    }
}

impl fmt::Display for RelationArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.var_name)?;
        let named: Vec<&str> = self
            .var_types
            .iter()
            .map(String::as_str)
            .filter(|t| *t != ROOT_TYPE)
            .collect();
        if !named.is_empty() && named.len() == self.var_types.len() {
            write!(f, ":{}", named.join("/"))?;
        }
        Ok(())
    }
}

/// A relation over variables: `jumps-over _m:monkey _f:flower`.
///
/// The [`Display`](fmt::Display) form is canonical and is used as the key
/// for candidate facts.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Relation {
    pub rel_name: RelName,
    pub args: Vec<RelationArg>,
}

impl Relation {
    pub fn new(rel_name: impl Into<RelName>, args: Vec<RelationArg>) -> Self {
        Self {
            rel_name: rel_name.into(),
            args,
        }
    }

    pub fn arity(&self) -> usize {
        self.args.len()
    }

    /// Variable names in argument order, with repeats.
    pub fn var_names(&self) -> impl Iterator<Item = &str> {
        self.args.iter().map(|a| a.var_name.as_str())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rel_name)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Schema violations, fatal for the rule or facts that caused them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("relNameMissingFromStory: `{rel_name}`")]
    RelNameMissingFromStory { rel_name: RelName },

    #[error("relNameStoryArityMismatch: `{rel_name}` expects {expected} arguments, got {got}")]
    RelNameStoryArityMismatch {
        rel_name: RelName,
        expected: usize,
        got: usize,
    },
}

/// Per-relation positional type constraints. Defines each relation's arity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RelationSchema {
    relations: IndexMap<RelName, Vec<TypeName>>,
}

impl RelationSchema {
    /// Build a schema, checking every constraint names a known type.
    pub fn new<I, R, T>(relations: I, types: &TypeMap) -> Result<Self>
    where
        I: IntoIterator<Item = (R, Vec<T>)>,
        R: Into<RelName>,
        T: Into<TypeName>,
    {
        let mut schema = IndexMap::new();
        for (name, arg_types) in relations {
            let name: RelName = name.into();
            let arg_types: Vec<TypeName> = arg_types.into_iter().map(Into::into).collect();
            if let Some(unknown) = arg_types.iter().find(|t| !types.contains(t)) {
                return Err(TinyWorldError::Config(format!(
                    "relation `{}` uses unknown type `{}`",
                    name, unknown
                )));
            }
            if schema.insert(name.clone(), arg_types).is_some() {
                return Err(TinyWorldError::Config(format!(
                    "relation `{}` is declared twice",
                    name
                )));
            }
        }
        Ok(Self { relations: schema })
    }

    /// Required type of each position of `rel_name`.
    pub fn arg_types(&self, rel_name: &str) -> Option<&[TypeName]> {
        self.relations.get(rel_name).map(Vec::as_slice)
    }

    /// Relation names in declaration order.
    pub fn rel_names(&self) -> impl Iterator<Item = &RelName> {
        self.relations.keys()
    }

    /// Check that `relation` names a known relation with the right arity.
    pub fn check(&self, relation: &Relation) -> std::result::Result<&[TypeName], SchemaError> {
        let expected = self.arg_types(&relation.rel_name).ok_or_else(|| {
            SchemaError::RelNameMissingFromStory {
                rel_name: relation.rel_name.clone(),
            }
        })?;
        if expected.len() != relation.arity() {
            return Err(SchemaError::RelNameStoryArityMismatch {
                rel_name: relation.rel_name.clone(),
                expected: expected.len(),
                got: relation.arity(),
            });
        }
        Ok(expected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::types::{root_type_set, type_set};

    fn types() -> TypeMap {
        TypeMap::from_groups([("animal", vec!["cat", "monkey"])]).unwrap()
    }

    #[test]
    fn test_canonical_text() {
        let rel = Relation::new(
            "jumps-over",
            vec![
                RelationArg::new("_m", type_set(["monkey"])),
                RelationArg::new("_f", root_type_set()),
            ],
        );
        assert_eq!(rel.to_string(), "jumps-over _m:monkey _f");

        let multi = Relation::new("is", vec![RelationArg::new("_c", type_set(["monkey", "cat"]))]);
        assert_eq!(multi.to_string(), "is _c:cat/monkey");
    }

    #[test]
    fn test_schema_check() {
        let schema = RelationSchema::new([("runs-away", vec!["animal"])], &types()).unwrap();
        let ok = Relation::new("runs-away", vec![RelationArg::new("_c", root_type_set())]);
        assert!(schema.check(&ok).is_ok());

        let missing = Relation::new("flies", vec![]);
        assert!(matches!(
            schema.check(&missing),
            Err(SchemaError::RelNameMissingFromStory { .. })
        ));

        let wrong_arity = Relation::new("runs-away", vec![]);
        assert!(matches!(
            schema.check(&wrong_arity),
            Err(SchemaError::RelNameStoryArityMismatch { expected: 1, got: 0, .. })
        ));
    }

    #[test]
    fn test_schema_unknown_type() {
        let err = RelationSchema::new([("flies", vec!["bird"])], &types());
        assert!(err.is_err());
    }
}
