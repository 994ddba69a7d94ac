use std::collections::BTreeMap;

use super::email_list::EmailList;

/// Result of looking up one or two tags in the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagQuery {
    /// Hashes of every email carrying all requested tags.
    Found(Vec<String>),
    Unknown(String),
    BothUnknown(String, String),
    OneUnknown {
        unknown: String,
        known: String,
        hashes: Vec<String>,
    },
    NoIntersection {
        first: (String, Vec<String>),
        second: (String, Vec<String>),
    },
}

/// Two-level index: root tag -> sub tag -> hashes of emails carrying both.
/// `index[t][t]` holds every email tagged `t`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    index: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl TagIndex {
    /// Build from scratch. There is no incremental update: tag removal is
    /// not tracked, so any tag change requires a full rebuild.
    pub fn build(emails: &EmailList) -> Self {
        let mut index: BTreeMap<String, BTreeMap<String, Vec<String>>> = BTreeMap::new();
        for email in emails.iter() {
            let names: Vec<&str> = email.tag_names().collect();
            for root in &names {
                for sub in &names {
                    let bucket = index
                        .entry(root.to_string())
                        .or_default()
                        .entry(sub.to_string())
                        .or_default();
                    if !bucket.iter().any(|h| h == email.hash()) {
                        bucket.push(email.hash().to_string());
                    }
                }
            }
        }
        Self { index }
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.index.contains_key(tag)
    }

    pub fn bucket(&self, root: &str, sub: &str) -> Option<&[String]> {
        self.index
            .get(root)
            .and_then(|subs| subs.get(sub))
            .map(Vec::as_slice)
    }

    pub fn query_one(&self, tag: &str) -> TagQuery {
        match self.bucket(tag, tag) {
            Some(hashes) => TagQuery::Found(hashes.to_vec()),
            None => TagQuery::Unknown(tag.to_string()),
        }
    }

    pub fn query_pair(&self, first: &str, second: &str) -> TagQuery {
        match (self.contains(first), self.contains(second)) {
            (false, false) => TagQuery::BothUnknown(first.to_string(), second.to_string()),
            (false, true) => TagQuery::OneUnknown {
                unknown: first.to_string(),
                known: second.to_string(),
                hashes: self.bucket(second, second).unwrap_or_default().to_vec(),
            },
            (true, false) => TagQuery::OneUnknown {
                unknown: second.to_string(),
                known: first.to_string(),
                hashes: self.bucket(first, first).unwrap_or_default().to_vec(),
            },
            (true, true) => match self.bucket(first, second) {
                Some(hashes) => TagQuery::Found(hashes.to_vec()),
                None => TagQuery::NoIntersection {
                    first: (
                        first.to_string(),
                        self.bucket(first, first).unwrap_or_default().to_vec(),
                    ),
                    second: (
                        second.to_string(),
                        self.bucket(second, second).unwrap_or_default().to_vec(),
                    ),
                },
            },
        }
    }

    /// Human-readable response for a query, numbering emails by their list position.
    pub fn render_query(query: &TagQuery, emails: &EmailList) -> String {
        match query {
            TagQuery::Found(hashes) => emails.render_hashes(hashes),
            TagQuery::Unknown(tag) => {
                format!("[Input content error] The tag #{} does not exists.", tag)
            }
            TagQuery::BothUnknown(a, b) => format!(
                "[Input content error] Both tags #{} and #{} do not exist.",
                a, b
            ),
            TagQuery::OneUnknown {
                unknown,
                known,
                hashes,
            } => format!(
                "[Input content error] The tag #{} does not exists.\nHere are the emails tagged with #{}:\n{}",
                unknown,
                known,
                emails.render_hashes(hashes)
            ),
            TagQuery::NoIntersection { first, second } => format!(
                "No email is tagged with both #{} and #{}\nHere are the emails tagged with #{}:\n{}\nHere are the emails tagged with #{}:\n{}",
                first.0,
                second.0,
                first.0,
                emails.render_hashes(&first.1),
                second.0,
                emails.render_hashes(&second.1)
            ),
        }
    }

    /// Every root tag with its email count and co-occurring sub tags.
    pub fn render(&self) -> String {
        if self.index.is_empty() {
            return "There is no tag in your email list.".to_string();
        }
        let mut out = format!("Here are your tags (total of {}):", self.index.len());
        for (root, subs) in &self.index {
            let count = subs.get(root).map(Vec::len).unwrap_or(0);
            out.push_str(&format!("\n#{} ({})", root, count));
            for (sub, hashes) in subs.iter().filter(|(s, _)| *s != root) {
                out.push_str(&format!("\n\t#{} ({})", sub, hashes.len()));
            }
        }
        out
    }
}
