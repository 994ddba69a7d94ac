use std::collections::HashSet;

use super::email::Email;
use super::keyword::KeywordPairList;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Most recently received first.
    #[default]
    Time,
    /// Accepted but not implemented; leaves the current order alone.
    Relevance,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmailList {
    emails: Vec<Email>,
    order: SortOrder,
}

impl EmailList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_emails(emails: Vec<Email>) -> Self {
        let mut list = Self {
            emails,
            order: SortOrder::default(),
        };
        list.sort_by_order();
        list
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Email> {
        self.emails.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Email> {
        self.emails.iter()
    }

    pub fn find_by_hash(&self, hash: &str) -> Option<&Email> {
        self.emails.iter().find(|e| e.hash() == hash)
    }

    pub(crate) fn set_order(&mut self, order: SortOrder) {
        self.order = order;
        self.sort_by_order();
    }

    pub(crate) fn sort_by_order(&mut self) {
        match self.order {
            SortOrder::Time => self.emails.sort_by(|a, b| b.received.cmp(&a.received)),
            SortOrder::Relevance => {}
        }
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Email> {
        if index < self.emails.len() {
            Some(self.emails.remove(index))
        } else {
            None
        }
    }

    pub(crate) fn clear(&mut self) {
        self.emails.clear();
    }

    /// Add user tags to one email, returning the names that were new.
    pub(crate) fn add_tags(&mut self, index: usize, tags: &[String]) -> Vec<String> {
        let Some(email) = self.emails.get_mut(index) else {
            return Vec::new();
        };
        tags.iter()
            .filter(|t| email.add_manual_tag(t))
            .cloned()
            .collect()
    }

    pub(crate) fn retag_all(&mut self, keywords: &KeywordPairList) {
        for email in &mut self.emails {
            email.retag(keywords);
        }
    }

    /// Merge `incoming` into the list by content hash. Known hashes keep the
    /// existing entry (and its tags); unknown ones are tagged and appended.
    /// Returns the number of emails added.
    pub(crate) fn reconcile(&mut self, incoming: Vec<Email>, keywords: &KeywordPairList) -> usize {
        let mut known: HashSet<String> = self.emails.iter().map(|e| e.hash().to_string()).collect();
        let mut added = 0;
        for mut email in incoming {
            if !known.insert(email.hash().to_string()) {
                continue;
            }
            email.retag(keywords);
            self.emails.push(email);
            added += 1;
        }
        self.sort_by_order();
        added
    }

    /// Approximate search by Levenshtein distance between `target` and the
    /// words of each subject and body. Returns `(position, distance)` pairs
    /// ordered by distance, then position.
    pub fn fuzzy_search(&self, target: &str) -> Vec<(usize, usize)> {
        let target = target.to_lowercase();
        let threshold = (target.chars().count() / 3).max(1);
        let mut hits: Vec<(usize, usize)> = self
            .emails
            .iter()
            .enumerate()
            .filter_map(|(i, e)| {
                let text = format!("{} {}", e.subject, e.body).to_lowercase();
                text.split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .map(|w| strsim::levenshtein(&target, w))
                    .min()
                    .filter(|d| *d <= threshold)
                    .map(|d| (i, d))
            })
            .collect();
        hits.sort_by_key(|&(i, d)| (d, i));
        hits
    }

    pub fn display_strings(&self) -> Vec<String> {
        self.emails.iter().map(|e| e.to_string()).collect()
    }

    pub fn render(&self) -> String {
        if self.emails.is_empty() {
            return "There is nothing in your email list.".to_string();
        }
        let mut out = format!("This is your list of emails (total of {}):", self.len());
        for (i, email) in self.emails.iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, email));
        }
        out
    }

    /// Render the emails with the given hashes, numbered by their position in this list.
    pub fn render_hashes(&self, hashes: &[String]) -> String {
        let lines: Vec<String> = hashes
            .iter()
            .filter_map(|h| {
                self.emails
                    .iter()
                    .position(|e| e.hash() == h)
                    .map(|i| format!("{}. {}", i + 1, self.emails[i]))
            })
            .collect();
        if lines.is_empty() {
            return "There is nothing to be shown.".to_string();
        }
        lines.join("\n")
    }
}
