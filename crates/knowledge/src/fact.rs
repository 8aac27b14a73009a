//! Facts and match patterns.
//!
//! A fact is an ordered tuple of strings; a pattern is a tuple of the same
//! arity whose entries either match exactly or are the `*` wildcard.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Wildcard token accepted in pattern positions.
pub const WILDCARD: &str = "*";

/// An ordered tuple of strings stored in a knowledge base.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact(Vec<String>);

impl Fact {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Fact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// One position of a [`Pattern`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternToken {
    Exact(String),
    Any,
}

/// A fact template: exact entries plus wildcards.
///
/// Patterns only match facts of the same arity; a wildcard matches any
/// single entry, never a span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern(Vec<PatternToken>);

impl Pattern {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            parts
                .into_iter()
                .map(|part| {
                    let part = part.as_ref();
                    if part == WILDCARD {
                        PatternToken::Any
                    } else {
                        PatternToken::Exact(part.to_string())
                    }
                })
                .collect(),
        )
    }

    pub fn matches(&self, fact: &Fact) -> bool {
        if self.0.len() != fact.len() {
            return false;
        }
        self.0
            .iter()
            .zip(fact.parts())
            .all(|(token, part)| match token {
                PatternToken::Any => true,
                PatternToken::Exact(expected) => expected == part,
            })
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .0
            .iter()
            .map(|token| match token {
                PatternToken::Any => WILDCARD,
                PatternToken::Exact(s) => s.as_str(),
            })
            .collect();
        write!(f, "({})", parts.join(", "))
    }
}

impl From<&Fact> for Pattern {
    /// The pattern matching exactly this fact.
    fn from(fact: &Fact) -> Self {
        Self(
            fact.parts()
                .iter()
                .map(|part| PatternToken::Exact(part.clone()))
                .collect(),
        )
    }
}
