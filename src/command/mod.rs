pub mod email;
pub mod task;

use chrono::NaiveDateTime;

use crate::core::model::Model;
use crate::parse::Domain;
use crate::sync::MailSource;

pub use email::EmailCommand;
pub use task::{TaskChange, TaskCommand};

/// A parsed, validated operation. Each value is executed once.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Task(TaskCommand),
    Email(EmailCommand),
    /// Switch the shell's input mode to the other domain.
    Flip,
    Help(Domain),
    Exit,
    Invalid { reason: Option<String> },
}

/// What the shell should do after showing the response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Effect {
    #[default]
    None,
    Flip,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Normal,
    /// Replays from storage: keep the success flag, drop the text.
    Silent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub response: Option<String>,
    pub effect: Effect,
}

impl Outcome {
    pub fn ok(response: impl Into<String>) -> Self {
        Self {
            success: true,
            response: Some(response.into()),
            effect: Effect::None,
        }
    }

    pub fn fail(response: impl Into<String>) -> Self {
        Self {
            success: false,
            response: Some(response.into()),
            effect: Effect::None,
        }
    }

    fn with_effect(mut self, effect: Effect) -> Self {
        self.effect = effect;
        self
    }
}

/// Everything a command may touch while executing.
pub struct ExecContext<'a> {
    pub model: &'a mut Model,
    pub now: NaiveDateTime,
    pub mail_source: Option<&'a dyn MailSource>,
}

impl<'a> ExecContext<'a> {
    pub fn new(model: &'a mut Model, now: NaiveDateTime) -> Self {
        Self {
            model,
            now,
            mail_source: None,
        }
    }

    pub fn with_mail_source(mut self, source: &'a dyn MailSource) -> Self {
        self.mail_source = Some(source);
        self
    }
}

const INVALID_MSG: &str = "Invalid command. Type 'help' to see what you can do.";

const TASK_HELP: &str = "\
Task commands (prefix with 'task' in email mode):
  list
  todo NAME [-tag T]... [-priority P] [-doafter TEXT] [-link HASH]...
  deadline NAME -time T [...same options]
  event NAME -time T [...same options]
  done I | delete I
  find KEYWORD
  reminder [DAYS]
  doafter I -msg TEXT
  snooze I [-by DAYS]
  update I [-time T] [-doafter TEXT] [-priority P] [-tag T]...
  set I -priority HIGH|MEDIUM|LOW
  link I [-email J]...
  sort status|time|priority
  flip | help | bye
Times are dd/mm/yyyy HHmm or a weekday such as 'fri 0900'.";

const EMAIL_HELP: &str = "\
Email commands (prefix with 'email' in task mode):
  list [-tag A [-tag B]]
  show I | delete I
  update I -tag T...
  addKeyword NAME -exp EXPRESSION...
  listKeyword | listTag
  fuzzySearch WORD
  sort time|relevance
  fetch | clear
  flip | help | bye";

impl Command {
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::Invalid {
            reason: Some(reason.into()),
        }
    }

    pub fn execute(self, ctx: &mut ExecContext, mode: OutputMode) -> Outcome {
        let outcome = match self {
            Self::Task(cmd) => cmd.execute(ctx),
            Self::Email(cmd) => cmd.execute(ctx),
            Self::Flip => Outcome::ok("Input mode switched.").with_effect(Effect::Flip),
            Self::Help(Domain::Task) => Outcome::ok(TASK_HELP),
            Self::Help(Domain::Email) => Outcome::ok(EMAIL_HELP),
            Self::Exit => Outcome::ok("Bye. Hope to see you again soon!").with_effect(Effect::Exit),
            Self::Invalid { reason } => Outcome::fail(reason.unwrap_or_else(|| INVALID_MSG.to_string())),
        };
        match mode {
            OutputMode::Normal => outcome,
            OutputMode::Silent => Outcome {
                response: None,
                ..outcome
            },
        }
    }
}
