//! Label-selector compilation and matching
//!
//! Implements the standard Kubernetes label-selector semantics for the
//! scheduler's Seed filtering: `matchLabels` equality plus the four
//! `matchExpressions` operators (In, NotIn, Exists, DoesNotExist). A
//! selector is compiled once per pipeline run; compilation validates the
//! operator and value arity, and a compiled selector renders in the
//! canonical string form used in failure messages.

use crate::crd::SeedSelector;
use std::collections::BTreeMap;
use std::fmt;

/// Operator of a compiled requirement
#[derive(Debug, Clone, PartialEq, Eq)]
enum Operator {
    Equals,
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

/// A single compiled requirement
#[derive(Debug, Clone)]
struct Requirement {
    key: String,
    operator: Operator,
    values: Vec<String>,
}

/// A compiled label selector. An empty selector matches every label set.
#[derive(Debug, Clone, Default)]
pub struct Selector {
    requirements: Vec<Requirement>,
}

/// Errors raised while compiling a selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// The operator string is not one of In, NotIn, Exists, DoesNotExist
    UnknownOperator { key: String, operator: String },
    /// In/NotIn requires at least one value
    MissingValues { key: String, operator: String },
    /// Exists/DoesNotExist must not carry values
    UnexpectedValues { key: String, operator: String },
}

impl fmt::Display for SelectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SelectorError::UnknownOperator { key, operator } => {
                write!(f, "unknown operator '{}' for key '{}'", operator, key)
            }
            SelectorError::MissingValues { key, operator } => {
                write!(
                    f,
                    "operator '{}' for key '{}' requires at least one value",
                    operator, key
                )
            }
            SelectorError::UnexpectedValues { key, operator } => {
                write!(
                    f,
                    "operator '{}' for key '{}' must not carry values",
                    operator, key
                )
            }
        }
    }
}

impl std::error::Error for SelectorError {}

impl Selector {
    /// Compiles the label part of a [`SeedSelector`]. The `providerTypes`
    /// list is ignored here; the provider filter consumes it separately.
    pub fn compile(selector: &SeedSelector) -> Result<Selector, SelectorError> {
        let mut requirements = Vec::new();

        // match_labels first, in key order (BTreeMap iteration)
        for (key, value) in &selector.match_labels {
            requirements.push(Requirement {
                key: key.clone(),
                operator: Operator::Equals,
                values: vec![value.clone()],
            });
        }

        for expr in &selector.match_expressions {
            let operator = match expr.operator.as_str() {
                "In" => Operator::In,
                "NotIn" => Operator::NotIn,
                "Exists" => Operator::Exists,
                "DoesNotExist" => Operator::DoesNotExist,
                other => {
                    return Err(SelectorError::UnknownOperator {
                        key: expr.key.clone(),
                        operator: other.to_string(),
                    })
                }
            };

            match operator {
                Operator::In | Operator::NotIn if expr.values.is_empty() => {
                    return Err(SelectorError::MissingValues {
                        key: expr.key.clone(),
                        operator: expr.operator.clone(),
                    });
                }
                Operator::Exists | Operator::DoesNotExist if !expr.values.is_empty() => {
                    return Err(SelectorError::UnexpectedValues {
                        key: expr.key.clone(),
                        operator: expr.operator.clone(),
                    });
                }
                _ => {}
            }

            let mut values = expr.values.clone();
            values.sort();
            requirements.push(Requirement {
                key: expr.key.clone(),
                operator,
                values,
            });
        }

        Ok(Selector { requirements })
    }

    /// Returns true if the given label set satisfies every requirement.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self.operator {
            Operator::Equals | Operator::In => labels
                .get(&self.key)
                .is_some_and(|v| self.values.iter().any(|candidate| candidate == v)),
            // NotIn matches when the key is absent entirely
            Operator::NotIn => labels
                .get(&self.key)
                .map_or(true, |v| !self.values.iter().any(|candidate| candidate == v)),
            Operator::Exists => labels.contains_key(&self.key),
            Operator::DoesNotExist => !labels.contains_key(&self.key),
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for r in &self.requirements {
            if !first {
                write!(f, ",")?;
            }
            first = false;
            match r.operator {
                Operator::Equals => write!(f, "{}={}", r.key, r.values[0])?,
                Operator::In => write!(f, "{} in ({})", r.key, r.values.join(","))?,
                Operator::NotIn => write!(f, "{} notin ({})", r.key, r.values.join(","))?,
                Operator::Exists => write!(f, "{}", r.key)?,
                Operator::DoesNotExist => write!(f, "!{}", r.key)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::SelectorRequirement;

    fn labels(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn expression(key: &str, operator: &str, values: &[&str]) -> SelectorRequirement {
        SelectorRequirement {
            key: key.to_string(),
            operator: operator.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        }
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let selector = Selector::compile(&SeedSelector::default()).unwrap();
        assert!(selector.matches(&labels(&[])));
        assert!(selector.matches(&labels(&[("a", "b")])));
    }

    #[test]
    fn test_match_labels_equality() {
        let selector = Selector::compile(&SeedSelector {
            match_labels: labels(&[("environment", "production")]),
            ..Default::default()
        })
        .unwrap();
        assert!(selector.matches(&labels(&[("environment", "production"), ("extra", "1")])));
        assert!(!selector.matches(&labels(&[("environment", "staging")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn test_in_operator() {
        let selector = Selector::compile(&SeedSelector {
            match_expressions: vec![expression("zone", "In", &["a", "b"])],
            ..Default::default()
        })
        .unwrap();
        assert!(selector.matches(&labels(&[("zone", "a")])));
        assert!(selector.matches(&labels(&[("zone", "b")])));
        assert!(!selector.matches(&labels(&[("zone", "c")])));
        assert!(!selector.matches(&labels(&[])));
    }

    #[test]
    fn test_notin_operator_matches_absent_key() {
        let selector = Selector::compile(&SeedSelector {
            match_expressions: vec![expression("zone", "NotIn", &["a"])],
            ..Default::default()
        })
        .unwrap();
        assert!(!selector.matches(&labels(&[("zone", "a")])));
        assert!(selector.matches(&labels(&[("zone", "b")])));
        assert!(selector.matches(&labels(&[])));
    }

    #[test]
    fn test_exists_and_does_not_exist() {
        let selector = Selector::compile(&SeedSelector {
            match_expressions: vec![
                expression("ready", "Exists", &[]),
                expression("deprecated", "DoesNotExist", &[]),
            ],
            ..Default::default()
        })
        .unwrap();
        assert!(selector.matches(&labels(&[("ready", "whatever")])));
        assert!(!selector.matches(&labels(&[])));
        assert!(!selector.matches(&labels(&[("ready", "x"), ("deprecated", "y")])));
    }

    #[test]
    fn test_unknown_operator_is_error() {
        let err = Selector::compile(&SeedSelector {
            match_expressions: vec![expression("zone", "Matches", &["a"])],
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(
            err,
            SelectorError::UnknownOperator {
                key: "zone".to_string(),
                operator: "Matches".to_string()
            }
        );
    }

    #[test]
    fn test_in_without_values_is_error() {
        let err = Selector::compile(&SeedSelector {
            match_expressions: vec![expression("zone", "In", &[])],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SelectorError::MissingValues { .. }));
    }

    #[test]
    fn test_exists_with_values_is_error() {
        let err = Selector::compile(&SeedSelector {
            match_expressions: vec![expression("zone", "Exists", &["a"])],
            ..Default::default()
        })
        .unwrap_err();
        assert!(matches!(err, SelectorError::UnexpectedValues { .. }));
    }

    #[test]
    fn test_canonical_rendering() {
        let selector = Selector::compile(&SeedSelector {
            match_labels: labels(&[("b", "2"), ("a", "1")]),
            match_expressions: vec![
                expression("zone", "In", &["west", "east"]),
                expression("gone", "DoesNotExist", &[]),
                expression("present", "Exists", &[]),
            ],
            ..Default::default()
        })
        .unwrap();
        // match_labels in key order, values sorted, expressions in order
        assert_eq!(
            selector.to_string(),
            "a=1,b=2,zone in (east,west),!gone,present"
        );
    }
}
