use std::path::Path;

use super::{read_json, write_json};
use crate::core::email::Email;
use crate::core::email_list::EmailList;
use crate::error::StorageError;

/// Load the cached emails. Unreadable data degrades to an empty list.
pub fn load_emails(path: &Path) -> Vec<Email> {
    match read_json::<Vec<Email>>(path) {
        Ok(Some(emails)) => {
            log::info!("loaded {} email(s) from {}", emails.len(), path.display());
            emails
        }
        Ok(None) => Vec::new(),
        Err(e) => {
            log::error!("Failed to load emails from {}: {}", path.display(), e);
            Vec::new()
        }
    }
}

pub fn save_emails(path: &Path, emails: &EmailList) -> Result<(), StorageError> {
    let emails: Vec<&Email> = emails.iter().collect();
    write_json(path, &emails)?;
    log::debug!("saved {} email(s) to {}", emails.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keyword::{KeywordPair, KeywordPairList};
    use crate::core::model::Model;
    use chrono::NaiveDate;

    fn inbox() -> Vec<Email> {
        let received = NaiveDate::from_ymd_opt(2030, 8, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let mut starred = Email::new("Offer", "hr@corp.com", received, "welcome aboard");
        starred.add_manual_tag("starred");
        vec![
            starred,
            Email::new("Prize", "spam@lotto.biz", received, "you won the lottery"),
        ]
    }

    #[test]
    fn cache_round_trip_keeps_hashes_and_tags() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.json");
        let list = EmailList::from_emails(inbox());
        save_emails(&path, &list).unwrap();

        let loaded = EmailList::from_emails(load_emails(&path));
        assert_eq!(loaded, list);
        assert!(loaded.iter().any(|e| e.has_tag("starred")));
    }

    #[test]
    fn syncing_stored_content_twice_is_stable() {
        let keywords = KeywordPairList::new(vec![KeywordPair::new("spam", vec!["lottery".into()])]);
        let mut model = Model::new(Default::default(), Default::default(), keywords, 3);
        model.sync_emails(inbox());
        let first = model.emails().clone();
        model.sync_emails(inbox());
        assert_eq!(model.emails(), &first);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn missing_or_corrupt_cache_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("emails.json");
        assert!(load_emails(&path).is_empty());
        std::fs::write(&path, "{ not json").unwrap();
        assert!(load_emails(&path).is_empty());
    }
}
