use chrono::NaiveDateTime;

use crate::command::{Effect, ExecContext, OutputMode, Outcome};
use crate::config::AppConfig;
use crate::core::email_list::EmailList;
use crate::core::keyword::KeywordPairList;
use crate::core::model::{Model, Projection};
use crate::parse::{Domain, ParseContext, parse_input};
use crate::store::{email_store, keyword_store, task_store};
use crate::sync::{ImapSource, MailSource};

/// The result of one input line: what to show and which lists changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub outcome: Outcome,
    pub projections: Vec<Projection>,
}

/// Application context: owns the model, the input mode and the collaborators
/// the commands need. Constructed once at startup.
pub struct App {
    config: AppConfig,
    model: Model,
    mode: Domain,
    mail_source: Option<Box<dyn MailSource>>,
    persist: bool,
}

impl App {
    /// Load state from the configured data directory.
    pub fn load(config: AppConfig, now: NaiveDateTime) -> Self {
        if let Err(e) = config.ensure_dirs() {
            log::error!("Failed to create {}: {}", config.data_directory.display(), e);
        }

        let tasks = task_store::load_tasks(&config.tasks_path(), now);
        let emails = EmailList::from_emails(email_store::load_emails(&config.emails_path()));
        let keywords = keyword_store::load_keywords(&config.keywords_path())
            .unwrap_or_else(|| KeywordPairList::new(config.keywords.clone()));
        let model = Model::new(tasks, emails, keywords, config.reminder_days);

        let mail_source = ImapSource::from_config(&config.imap)
            .map(|source| Box::new(source) as Box<dyn MailSource>);

        log::info!(
            "started with {} task(s), {} email(s), {} keyword(s)",
            model.tasks().len(),
            model.emails().len(),
            model.keywords().len()
        );

        Self {
            mode: config.default_mode,
            config,
            model,
            mail_source,
            persist: true,
        }
    }

    /// An app that never touches the filesystem.
    pub fn in_memory(model: Model) -> Self {
        Self {
            config: AppConfig::default(),
            model,
            mode: Domain::Task,
            mail_source: None,
            persist: false,
        }
    }

    pub fn with_mail_source(mut self, source: Box<dyn MailSource>) -> Self {
        self.mail_source = Some(source);
        self
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn mode(&self) -> Domain {
        self.mode
    }

    /// Prepend the current mode's prefix unless the line already names a domain.
    pub fn prefixed(&self, line: &str) -> String {
        let line = line.trim();
        let first = line.split_whitespace().next().unwrap_or_default();
        if Domain::from_prefix(first).is_some() {
            line.to_string()
        } else {
            format!("{} {}", self.mode.prefix(), line)
        }
    }

    /// Parse and run one user line.
    pub fn handle_line(&mut self, line: &str, now: NaiveDateTime) -> Reply {
        let line = self.prefixed(line);
        log::debug!("input: {}", line);

        let parsed = {
            let ctx = ParseContext::from_model(&self.model, now);
            parse_input(&line, &ctx)
        };
        let mut outcome = match parsed {
            Ok(command) => {
                let mut ctx = ExecContext::new(&mut self.model, now);
                if let Some(source) = self.mail_source.as_deref() {
                    ctx = ctx.with_mail_source(source);
                }
                command.execute(&mut ctx, OutputMode::Normal)
            }
            Err(e) => {
                log::debug!("email parse error: {}", e);
                Outcome::fail(e.to_string())
            }
        };

        if outcome.effect == Effect::Flip {
            self.mode = self.mode.flipped();
            outcome.response = Some(format!("Switched to {} mode.", self.mode.prefix()));
        }

        let projections = self.model.take_projections();
        self.persist_changes(&projections);
        Reply {
            outcome,
            projections,
        }
    }

    fn persist_changes(&self, projections: &[Projection]) {
        if !self.persist {
            return;
        }
        let tasks_changed = projections.iter().any(|p| matches!(p, Projection::Tasks(_)));
        let emails_changed = projections.iter().any(|p| matches!(p, Projection::Emails(_)));
        if tasks_changed {
            self.save_tasks();
        }
        if emails_changed {
            self.save_emails();
        }
    }

    fn save_tasks(&self) {
        if let Err(e) = task_store::save_tasks(&self.config.tasks_path(), self.model.tasks()) {
            log::error!("Failed to save tasks: {}", e);
        }
    }

    fn save_emails(&self) {
        if let Err(e) = email_store::save_emails(&self.config.emails_path(), self.model.emails()) {
            log::error!("Failed to save emails: {}", e);
        }
        if let Err(e) = keyword_store::save_keywords(&self.config.keywords_path(), self.model.keywords()) {
            log::error!("Failed to save keywords: {}", e);
        }
    }

    /// Flush everything to storage. Called on exit.
    pub fn save(&self) {
        if !self.persist {
            return;
        }
        self.save_tasks();
        self.save_emails();
        log::info!("state saved to {}", self.config.data_directory.display());
    }
}
