use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// A user-defined tag name and the expressions that infer it from email text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPair {
    pub keyword: String,
    pub expressions: Vec<String>,
}

impl KeywordPair {
    pub fn new(keyword: impl Into<String>, expressions: Vec<String>) -> Self {
        Self {
            keyword: keyword.into(),
            expressions,
        }
    }

    /// A pair for a manually assigned tag: the tag name is its own expression.
    pub fn manual(tag: &str) -> Self {
        Self::new(tag, vec![tag.to_string()])
    }

    /// Compile each expression case-insensitively. Expressions that are not
    /// valid patterns are matched literally.
    pub fn patterns(&self) -> Vec<Regex> {
        self.expressions
            .iter()
            .filter(|e| !e.trim().is_empty())
            .filter_map(|e| {
                RegexBuilder::new(e)
                    .case_insensitive(true)
                    .build()
                    .or_else(|_| {
                        RegexBuilder::new(&regex::escape(e))
                            .case_insensitive(true)
                            .build()
                    })
                    .ok()
            })
            .collect()
    }

    pub fn matches(&self, text: &str) -> bool {
        self.patterns().iter().any(|re| re.is_match(text))
    }
}

/// Immutable list of keyword pairs. Appending produces a new list so the
/// list a command was parsed against stays valid until it is installed.
///
/// Patterns are compiled once per list, parallel to `pairs`.
#[derive(Debug, Clone, Default)]
pub struct KeywordPairList {
    pairs: Arc<Vec<KeywordPair>>,
    patterns: Arc<Vec<Vec<Regex>>>,
}

impl PartialEq for KeywordPairList {
    fn eq(&self, other: &Self) -> bool {
        self.pairs == other.pairs
    }
}

impl Eq for KeywordPairList {}

impl KeywordPairList {
    pub fn new(pairs: Vec<KeywordPair>) -> Self {
        let patterns = pairs.iter().map(KeywordPair::patterns).collect();
        Self {
            pairs: Arc::new(pairs),
            patterns: Arc::new(patterns),
        }
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeywordPair> {
        self.pairs.iter()
    }

    pub fn get(&self, keyword: &str) -> Option<&KeywordPair> {
        self.pairs.iter().find(|p| p.keyword == keyword)
    }

    /// Return a copy with `pair` appended. A pair for an existing keyword is
    /// merged into the copy of that pair instead of duplicating the keyword.
    pub fn add_and_copy(&self, pair: KeywordPair) -> Self {
        let mut pairs: Vec<KeywordPair> = self.pairs.as_ref().clone();
        match pairs.iter_mut().find(|p| p.keyword == pair.keyword) {
            Some(existing) => {
                for exp in pair.expressions {
                    if !existing.expressions.contains(&exp) {
                        existing.expressions.push(exp);
                    }
                }
            }
            None => pairs.push(pair),
        }
        Self::new(pairs)
    }

    /// Every pair whose expressions match `text`, in list order.
    pub fn matching(&self, text: &str) -> Vec<KeywordPair> {
        self.pairs
            .iter()
            .zip(self.patterns.iter())
            .filter(|(_, patterns)| patterns.iter().any(|re| re.is_match(text)))
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    pub fn to_vec(&self) -> Vec<KeywordPair> {
        self.pairs.as_ref().clone()
    }

    pub fn render(&self) -> String {
        if self.pairs.is_empty() {
            return "There is no keyword defined.".to_string();
        }
        let mut out = format!("Here are your keywords (total of {}):", self.len());
        for (i, pair) in self.pairs.iter().enumerate() {
            out.push_str(&format!(
                "\n{}. {}: {}",
                i + 1,
                pair.keyword,
                pair.expressions.join(", ")
            ));
        }
        out
    }
}
