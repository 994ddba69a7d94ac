use super::{ExecContext, Outcome};
use crate::core::email_list::SortOrder;
use crate::core::keyword::KeywordPairList;
use crate::core::tag_index::TagIndex;

#[derive(Debug, Clone, PartialEq)]
pub enum EmailCommand {
    List,
    /// One or two tags; two means the intersection.
    FilterByTag(Vec<String>),
    Show(usize),
    Delete(usize),
    Tag { index: usize, tags: Vec<String> },
    /// The keyword list to install, already extended at parse time.
    AddKeyword { keyword: String, keywords: KeywordPairList },
    FuzzySearch(String),
    Fetch,
    ListKeywords,
    ListAllTags,
    Sort(SortOrder),
    Clear,
}

impl EmailCommand {
    pub fn execute(self, ctx: &mut ExecContext) -> Outcome {
        match self {
            Self::List => Outcome::ok(ctx.model.emails().render()),
            Self::FilterByTag(tags) => {
                let index = ctx.model.tag_index();
                let query = match tags.as_slice() {
                    [one] => index.query_one(one),
                    [first, second] => index.query_pair(first, second),
                    _ => return Outcome::fail("Please enter one or two tags."),
                };
                Outcome::ok(TagIndex::render_query(&query, ctx.model.emails()))
            }
            Self::Show(index) => match ctx.model.emails().get(index) {
                Some(email) => Outcome::ok(format!(
                    "{}\n\n{}",
                    email,
                    email.highlight()
                )),
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Delete(index) => match ctx.model.delete_email(index) {
                Some(email) => Outcome::ok(format!(
                    "Noted. I've removed this email:\n  {}\nNow you have {} email(s) in the list.",
                    email,
                    ctx.model.emails().len()
                )),
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Tag { index, tags } => {
                if ctx.model.emails().get(index).is_none() {
                    return Outcome::fail("Index out of bounds.");
                }
                let added = ctx.model.tag_email(index, &tags);
                let line = ctx
                    .model
                    .emails()
                    .get(index)
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                if added.is_empty() {
                    Outcome::ok(format!("The email already has these tags:\n  {}", line))
                } else {
                    Outcome::ok(format!("Tags added:\n  {}", line))
                }
            }
            Self::AddKeyword { keyword, keywords } => {
                ctx.model.install_keywords(keywords);
                let tagged = ctx
                    .model
                    .emails()
                    .iter()
                    .filter(|e| e.has_tag(&keyword))
                    .count();
                log::info!("keyword {} installed, {} email(s) tagged", keyword, tagged);
                Outcome::ok(format!(
                    "Keyword #{} saved. {} email(s) now carry this tag.",
                    keyword, tagged
                ))
            }
            Self::FuzzySearch(target) => {
                let emails = ctx.model.emails();
                let hits = emails.fuzzy_search(&target);
                if hits.is_empty() {
                    return Outcome::ok(format!("There is no email similar to '{}'.", target));
                }
                let lines: Vec<String> = hits
                    .iter()
                    .filter_map(|&(i, _)| emails.get(i).map(|e| format!("{}. {}", i + 1, e)))
                    .collect();
                Outcome::ok(format!(
                    "Here are the emails similar to '{}':\n{}",
                    target,
                    lines.join("\n")
                ))
            }
            Self::Fetch => {
                let Some(source) = ctx.mail_source else {
                    return Outcome::fail("No mail source is configured.");
                };
                match source.fetch() {
                    Ok(emails) => {
                        let fetched = emails.len();
                        let added = ctx.model.sync_emails(emails);
                        log::info!("fetched {} email(s), {} new", fetched, added);
                        Outcome::ok(format!(
                            "Fetched {} email(s), {} new.\n{}",
                            fetched,
                            added,
                            ctx.model.emails().render()
                        ))
                    }
                    Err(e) => {
                        log::warn!("mail fetch failed: {}", e);
                        Outcome::fail(format!("Failed to fetch emails: {}", e))
                    }
                }
            }
            Self::ListKeywords => Outcome::ok(ctx.model.keywords().render()),
            Self::ListAllTags => Outcome::ok(ctx.model.tag_index().render()),
            Self::Sort(order) => {
                ctx.model.set_email_order(order);
                Outcome::ok(ctx.model.emails().render())
            }
            Self::Clear => {
                ctx.model.clear_emails();
                Outcome::ok("All emails have been removed from the local list.")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::email::Email;
    use crate::core::keyword::KeywordPair;
    use crate::core::model::Model;
    use crate::error::FetchError;
    use crate::sync::MailSource;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 4, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    struct FixedSource(Vec<Email>);

    impl MailSource for FixedSource {
        fn fetch(&self) -> Result<Vec<Email>, FetchError> {
            Ok(self.0.clone())
        }
    }

    fn inbox() -> Vec<Email> {
        vec![
            Email::new("Sprint", "pm@corp.com", at(1), "project update attached"),
            Email::new("Lunch", "bob@corp.com", at(2), "tacos?"),
        ]
    }

    #[test]
    fn fetch_twice_adds_nothing_new() {
        let source = FixedSource(inbox());
        let mut model = Model::default();
        let mut ctx = ExecContext::new(&mut model, at(3)).with_mail_source(&source);
        assert!(EmailCommand::Fetch.execute(&mut ctx).success);
        let before = ctx.model.emails().clone();
        let outcome = EmailCommand::Fetch.execute(&mut ctx);
        assert!(outcome.response.unwrap().starts_with("Fetched 2 email(s), 0 new."));
        assert_eq!(ctx.model.emails(), &before);
    }

    #[test]
    fn fetch_without_source_fails() {
        let mut model = Model::default();
        let mut ctx = ExecContext::new(&mut model, at(3));
        assert!(!EmailCommand::Fetch.execute(&mut ctx).success);
    }

    #[test]
    fn add_keyword_retags_existing_emails() {
        let mut model = Model::default();
        model.sync_emails(inbox());
        let keywords = model
            .keywords()
            .add_and_copy(KeywordPair::new("project", vec!["project update".into()]));
        let mut ctx = ExecContext::new(&mut model, at(3));
        let outcome = EmailCommand::AddKeyword {
            keyword: "project".into(),
            keywords,
        }
        .execute(&mut ctx);
        assert_eq!(
            outcome.response.as_deref(),
            Some("Keyword #project saved. 1 email(s) now carry this tag.")
        );
        let filtered = EmailCommand::FilterByTag(vec!["project".into()]).execute(&mut ctx);
        assert_eq!(
            filtered.response.as_deref(),
            Some("2. Sprint | pm@corp.com | 01/04/2030 1200 #project")
        );
    }

    #[test]
    fn show_highlights_matches() {
        let mut model = Model::default();
        model.sync_emails(inbox());
        model.install_keywords(KeywordPairList::new(vec![KeywordPair::new(
            "food",
            vec!["tacos".into()],
        )]));
        let mut ctx = ExecContext::new(&mut model, at(3));
        let outcome = EmailCommand::Show(0).execute(&mut ctx);
        assert!(outcome.response.unwrap().ends_with("**tacos**?"));
    }
}
