use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;

/// Date format shared by task input, display and the save file.
pub const TIME_FORMAT: &str = "%d/%m/%Y %H%M";

/// The kind of a task. Deadlines and events carry their time inline so a
/// timed task can never exist without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TaskKind {
    ToDo,
    Deadline(NaiveDateTime),
    Event(NaiveDateTime),
}

impl TaskKind {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::ToDo => "todo",
            Self::Deadline(_) => "deadline",
            Self::Event(_) => "event",
        }
    }

    /// Build a kind from its command verb. Timed verbs need a time.
    pub fn from_verb(verb: &str, time: Option<NaiveDateTime>) -> Option<Self> {
        match verb {
            "todo" => Some(Self::ToDo),
            "deadline" => time.map(Self::Deadline),
            "event" => time.map(Self::Event),
            _ => None,
        }
    }

    pub fn time(&self) -> Option<NaiveDateTime> {
        match self {
            Self::ToDo => None,
            Self::Deadline(t) | Self::Event(t) => Some(*t),
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Self::ToDo => "[T]",
            Self::Deadline(_) => "[D]",
            Self::Event(_) => "[E]",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }

    /// Case-insensitive lookup by name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "HIGH" => Some(Self::High),
            "MEDIUM" => Some(Self::Medium),
            "LOW" => Some(Self::Low),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snooze {
    Moved(NaiveDateTime),
    Untimed,
    OutOfRange,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    pub kind: TaskKind,
    done: bool,
    pub do_after: Option<String>,
    pub tags: Vec<String>,
    pub linked_emails: Vec<String>,
    pub priority: Option<Priority>,
}

impl Task {
    pub fn new(name: impl Into<String>, kind: TaskKind) -> Self {
        Self {
            name: name.into(),
            kind,
            done: false,
            do_after: None,
            tags: Vec::new(),
            linked_emails: Vec::new(),
            priority: None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Completion is one-way; marking an already done task changes nothing.
    pub fn mark_done(&mut self) {
        self.done = true;
    }

    pub fn time(&self) -> Option<NaiveDateTime> {
        self.kind.time()
    }

    /// Replace the time of a deadline or event. Returns false for a todo.
    pub fn set_time(&mut self, time: NaiveDateTime) -> bool {
        match &mut self.kind {
            TaskKind::ToDo => false,
            TaskKind::Deadline(t) | TaskKind::Event(t) => {
                *t = time;
                true
            }
        }
    }

    pub fn add_tag(&mut self, tag: &str) -> bool {
        if self.tags.iter().any(|t| t == tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    pub fn link_email(&mut self, hash: &str) -> bool {
        if self.linked_emails.iter().any(|h| h == hash) {
            return false;
        }
        self.linked_emails.push(hash.to_string());
        true
    }

    /// Push a timed task back by `days`. A todo is left as it is, and so is
    /// a task whose new time would fall outside the calendar.
    pub fn snooze(&mut self, days: i64) -> Snooze {
        let Some(time) = self.time() else {
            return Snooze::Untimed;
        };
        let Some(new_time) = Duration::try_days(days).and_then(|d| time.checked_add_signed(d))
        else {
            return Snooze::OutOfRange;
        };
        self.set_time(new_time);
        Snooze::Moved(new_time)
    }

    /// Whether the task's time falls within `[now, now + day_limit days]`.
    pub fn is_near(&self, now: NaiveDateTime, day_limit: i64) -> bool {
        match self.time() {
            Some(time) => time >= now && time <= now + Duration::days(day_limit),
            None => false,
        }
    }

    /// Two timed tasks clash when their times are exactly equal.
    pub fn clashes_with(&self, other: &Task) -> bool {
        match (self.time(), other.time()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn matches_keyword(&self, keyword: &str) -> bool {
        self.to_string().contains(keyword)
    }

    /// Serialize to a save-file record that the task parser can replay.
    pub fn to_record(&self) -> String {
        let mut out = String::new();
        out.push_str(if self.done { "1 " } else { "0 " });
        out.push_str(self.kind.verb());
        out.push(' ');
        out.push_str(&self.name);
        if let Some(time) = self.time() {
            out.push_str(&format!(" -time {}", time.format(TIME_FORMAT)));
        }
        if let Some(ref after) = self.do_after {
            out.push_str(&format!(" -doafter {}", record_value(after)));
        }
        for tag in &self.tags {
            out.push_str(&format!(" -tag {}", record_value(tag)));
        }
        for hash in &self.linked_emails {
            out.push_str(&format!(" -link {}", hash));
        }
        if let Some(priority) = self.priority {
            out.push_str(&format!(" -priority {}", priority.as_str()));
        }
        out
    }
}

/// Option values lose one pair of surrounding quotes when read back, so a
/// value that is itself quoted gets an extra pair.
fn record_value(value: &str) -> Cow<'_, str> {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        Cow::Owned(format!("\"{}\"", value))
    } else {
        Cow::Borrowed(value)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.done { "[X]" } else { "[ ]" };
        write!(f, "{}{} {}", self.kind.marker(), status, self.name)?;
        match self.kind {
            TaskKind::Deadline(t) => write!(f, " (by: {})", t.format(TIME_FORMAT))?,
            TaskKind::Event(t) => write!(f, " (at: {})", t.format(TIME_FORMAT))?,
            TaskKind::ToDo => {}
        }
        for tag in &self.tags {
            write!(f, " #{}", tag)?;
        }
        if let Some(priority) = self.priority {
            write!(f, " Priority: {}", priority.as_str())?;
        }
        if let Some(ref after) = self.do_after {
            write!(f, "\n\tAfter which: {}", after)?;
        }
        Ok(())
    }
}
