use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use super::keyword::{KeywordPair, KeywordPairList};

const RECEIVED_FORMAT: &str = "%d/%m/%Y %H%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TagOrigin {
    /// Assigned by the user; survives re-tagging.
    Manual,
    /// Inferred from a keyword pair; recomputed on re-tagging.
    Matched,
}

/// A tag on an email, carrying the keyword definition that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub pair: KeywordPair,
    pub origin: TagOrigin,
}

impl Tag {
    pub fn name(&self) -> &str {
        &self.pair.keyword
    }
}

/// Stable fingerprint of a message, independent of its list position.
pub fn content_hash(subject: &str, from: &str, received: NaiveDateTime, body: &str) -> String {
    let received = received.to_string();
    let mut hasher = Sha256::new();
    for part in [subject, from, received.as_str(), body] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    hash: String,
    pub subject: String,
    pub from: String,
    pub received: NaiveDateTime,
    pub body: String,
    tags: Vec<Tag>,
}

impl Email {
    pub fn new(
        subject: impl Into<String>,
        from: impl Into<String>,
        received: NaiveDateTime,
        body: impl Into<String>,
    ) -> Self {
        let subject = subject.into();
        let from = from.into();
        let body = body.into();
        Self {
            hash: content_hash(&subject, &from, received, &body),
            subject,
            from,
            received,
            body,
            tags: Vec::new(),
        }
    }

    pub fn hash(&self) -> &str {
        &self.hash
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn tag_names(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(Tag::name)
    }

    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name() == name)
    }

    /// Attach a user tag. Returns false if a tag with that name already exists.
    pub fn add_manual_tag(&mut self, name: &str) -> bool {
        if self.has_tag(name) {
            return false;
        }
        self.tags.push(Tag {
            pair: KeywordPair::manual(name),
            origin: TagOrigin::Manual,
        });
        true
    }

    /// Recompute inferred tags against `keywords`. Manual tags are kept.
    pub fn retag(&mut self, keywords: &KeywordPairList) {
        self.tags.retain(|t| t.origin == TagOrigin::Manual);
        let text = format!("{}\n{}", self.subject, self.body);
        for pair in keywords.matching(&text) {
            if !self.has_tag(&pair.keyword) {
                self.tags.push(Tag {
                    pair,
                    origin: TagOrigin::Matched,
                });
            }
        }
    }

    /// The body with every span matched by one of the email's tags wrapped in `**`.
    pub fn highlight(&self) -> String {
        let mut spans: Vec<(usize, usize)> = self
            .tags
            .iter()
            .flat_map(|t| t.pair.patterns())
            .flat_map(|re| {
                re.find_iter(&self.body)
                    .filter(|m| !m.is_empty())
                    .map(|m| (m.start(), m.end()))
                    .collect::<Vec<_>>()
            })
            .collect();
        spans.sort_unstable();

        let mut merged: Vec<(usize, usize)> = Vec::new();
        for (start, end) in spans {
            match merged.last_mut() {
                Some(last) if start <= last.1 => last.1 = last.1.max(end),
                _ => merged.push((start, end)),
            }
        }

        let mut out = String::with_capacity(self.body.len() + merged.len() * 4);
        let mut cursor = 0;
        for (start, end) in merged {
            out.push_str(&self.body[cursor..start]);
            out.push_str("**");
            out.push_str(&self.body[start..end]);
            out.push_str("**");
            cursor = end;
        }
        out.push_str(&self.body[cursor..]);
        out
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | {} | {}",
            self.subject,
            self.from,
            self.received.format(RECEIVED_FORMAT)
        )?;
        for name in self.tag_names() {
            write!(f, " #{}", name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn received() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 3, 4)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap()
    }

    fn email(body: &str) -> Email {
        Email::new("Weekly sync", "alice@example.com", received(), body)
    }

    #[test]
    fn hash_is_stable_and_content_sensitive() {
        assert_eq!(email("hello").hash(), email("hello").hash());
        assert_ne!(email("hello").hash(), email("hello!").hash());
        assert_eq!(email("hello").hash().len(), 64);
    }

    #[test]
    fn retag_keeps_manual_tags_and_replaces_matched() {
        let mut e = email("the project update is late");
        e.add_manual_tag("starred");
        let keywords = KeywordPairList::new(vec![KeywordPair::new(
            "project",
            vec!["project update".into()],
        )]);
        e.retag(&keywords);
        assert_eq!(e.tag_names().collect::<Vec<_>>(), vec!["starred", "project"]);

        e.retag(&KeywordPairList::default());
        assert_eq!(e.tag_names().collect::<Vec<_>>(), vec!["starred"]);
    }

    #[test]
    fn retag_is_idempotent() {
        let mut e = email("lottery winner");
        let keywords = KeywordPairList::new(vec![KeywordPair::new("spam", vec!["lottery".into()])]);
        e.retag(&keywords);
        let once = e.clone();
        e.retag(&keywords);
        assert_eq!(e, once);
    }

    #[test]
    fn manual_tag_is_not_duplicated() {
        let mut e = email("x");
        assert!(e.add_manual_tag("a"));
        assert!(!e.add_manual_tag("a"));
        assert_eq!(e.tags().len(), 1);
    }

    #[test]
    fn highlight_wraps_matches() {
        let mut e = email("Please read the project update before Friday.");
        e.retag(&KeywordPairList::new(vec![KeywordPair::new(
            "project",
            vec!["project update".into(), "update".into()],
        )]));
        assert_eq!(
            e.highlight(),
            "Please read the **project update** before Friday."
        );
    }

    #[test]
    fn display_lists_tags() {
        let mut e = email("x");
        e.add_manual_tag("work");
        assert_eq!(
            e.to_string(),
            "Weekly sync | alice@example.com | 04/03/2030 0930 #work"
        );
    }
}
