pub mod date;
pub mod email;
pub mod options;
pub mod task;

use chrono::NaiveDateTime;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

use crate::command::Command;
use crate::core::keyword::KeywordPairList;
use crate::core::model::Model;
use crate::error::EmailParseError;

pub use date::parse_time;
pub use options::{CommandOption, SplitInput, extract_all, extract_single, split};

/// `verb 12` with nothing after the index.
static INDEX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<verb>\w+)\s+(?P<index>\d+)\s*$").unwrap());

/// Indices with this many digits or more are rejected before conversion.
const MAX_INDEX_DIGITS: usize = 6;

pub const INVALID_INDEX_MSG: &str = "Invalid index. Index should be of range 1 ~ 99999.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Task,
    Email,
}

impl Domain {
    pub fn prefix(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Email => "email",
        }
    }

    pub fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "task" => Some(Self::Task),
            "email" => Some(Self::Email),
            _ => None,
        }
    }

    pub fn flipped(&self) -> Self {
        match self {
            Self::Task => Self::Email,
            Self::Email => Self::Task,
        }
    }
}

/// Snapshot of model facts the parsers validate against.
#[derive(Debug, Clone)]
pub struct ParseContext<'a> {
    pub task_count: usize,
    pub email_count: usize,
    pub keywords: &'a KeywordPairList,
    pub now: NaiveDateTime,
}

impl<'a> ParseContext<'a> {
    pub fn from_model(model: &'a Model, now: NaiveDateTime) -> Self {
        Self {
            task_count: model.tasks().len(),
            email_count: model.emails().len(),
            keywords: model.keywords(),
            now,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum IndexError {
    TooLarge,
    OutOfBounds { index: usize, len: usize },
}

/// Convert a 1-based textual index to a 0-based position checked against `len`.
pub(crate) fn parse_index(digits: &str, len: usize) -> Result<usize, IndexError> {
    let digits = digits.trim();
    if digits.len() >= MAX_INDEX_DIGITS {
        return Err(IndexError::TooLarge);
    }
    let index: usize = digits.parse().map_err(|_| IndexError::TooLarge)?;
    if index == 0 || index > len {
        return Err(IndexError::OutOfBounds { index, len });
    }
    Ok(index - 1)
}

/// The raw index text when `body` is exactly `verb <digits>`.
pub(crate) fn index_arg<'b>(body: &'b str, verb: &str) -> Option<&'b str> {
    let caps = INDEX_RE.captures(body)?;
    if caps.name("verb")?.as_str() != verb {
        return None;
    }
    caps.name("index").map(|m| m.as_str())
}

/// Parse one raw line. The line must start with a domain prefix; the
/// shell adds one for the current mode when the user leaves it out.
///
/// Task-domain problems always come back as `Command::Invalid`; the email
/// parser reports unknown verbs and bad indices as `Err`.
pub fn parse_input(line: &str, ctx: &ParseContext) -> Result<Command, EmailParseError> {
    let line = line.trim();
    let (prefix, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let Some(domain) = Domain::from_prefix(prefix) else {
        return Ok(Command::invalid(format!(
            "Please start your command with 'task' or 'email', not '{}'",
            prefix
        )));
    };

    let input = match split(rest) {
        Ok(input) => input,
        Err(e) => return Ok(Command::invalid(e.to_string())),
    };
    if input.is_empty() {
        return Ok(Command::invalid("There is no command after the prefix"));
    }

    match domain {
        Domain::Task => Ok(task::parse_task(&input, ctx)),
        Domain::Email => email::parse_email(&input, ctx),
    }
}
