//! # Relation Matching
//!
//! Maps an entity name (host, cluster, VM, VLAN) to the name of a related object through an
//! ordered list of `pattern = value` rules.
//!
//! A missing rule list and a rule list that matches nothing are different outcomes, see
//! [`Relation`]. Resolvers in the core crate rely on the difference to decide between "leave
//! the field alone" and "fall back to a default object".

use std::collections::BTreeMap;

use regex::Regex;
use serde::Deserialize;

use crate::error::{Result, SsotError};

/// Outcome of matching a subject against an optional rule list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation<'a> {
    /// No rule list was configured for this relation.
    Unconfigured,
    /// Rules exist, none matched.
    Unmatched,
    Matched(&'a str),
}

impl<'a> Relation<'a> {
    pub fn matched(&self) -> Option<&'a str> {
        match self {
            Relation::Matched(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    value: String,
}

/// Ordered `pattern -> value` rules. Evaluation order is the order of definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct RelationRules {
    rules: Vec<Rule>,
}

impl RelationRules {
    /// Builds rules from `"<pattern> = <value>"` entries.
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut rules = Vec::new();
        for entry in entries {
            let (pattern, value) = split_pair(entry.as_ref())?;
            rules.push(Rule {
                pattern: compile(pattern)?,
                value: value.to_string(),
            });
        }
        Ok(Self { rules })
    }

    pub fn from_pairs(pairs: &[(&str, &str)]) -> Result<Self> {
        let rules = pairs
            .iter()
            .map(|(pattern, value)| {
                Ok(Rule {
                    pattern: compile(pattern)?,
                    value: value.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    /// Value of the first rule whose pattern matches anywhere in `subject`.
    pub fn first_match(&self, subject: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| rule.pattern.is_match(subject))
            .map(|rule| rule.value.as_str())
    }
}

impl TryFrom<Vec<String>> for RelationRules {
    type Error = SsotError;

    fn try_from(entries: Vec<String>) -> Result<Self> {
        Self::parse(entries)
    }
}

/// Matches `subject` against `rules`, keeping "not configured" apart from "no match".
pub fn match_subject<'a>(subject: &str, rules: Option<&'a RelationRules>) -> Relation<'a> {
    let Some(rules) = rules else {
        return Relation::Unconfigured;
    };
    match rules.first_match(subject) {
        Some(value) => Relation::Matched(value),
        None => Relation::Unmatched,
    }
}

/// Exact-name remapping table, e.g. datacenter name to cluster group name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(try_from = "Vec<String>")]
pub struct NameMap(BTreeMap<String, String>);

impl NameMap {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// The mapped name, or `name` itself when there is no entry.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.get(name).unwrap_or(name)
    }
}

impl TryFrom<Vec<String>> for NameMap {
    type Error = SsotError;

    fn try_from(entries: Vec<String>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for entry in &entries {
            let (from, to) = split_pair(entry)?;
            map.insert(from.to_string(), to.to_string());
        }
        Ok(Self(map))
    }
}

/// Splits `"<left> = <right>"` on the last `=`; both sides are trimmed and must be non-empty.
pub fn split_pair(entry: &str) -> Result<(&str, &str)> {
    let Some((left, right)) = entry.rsplit_once('=') else {
        return Err(SsotError::Config(format!(
            "expected '<pattern> = <value>', got '{entry}'"
        )));
    };
    let (left, right) = (left.trim(), right.trim());
    if left.is_empty() || right.is_empty() {
        return Err(SsotError::Config(format!("empty side in relation '{entry}'")));
    }
    Ok((left, right))
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|source| SsotError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝
