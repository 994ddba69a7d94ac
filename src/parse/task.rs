use regex::Regex;
use std::sync::LazyLock;

use super::options::{SplitInput, extract_all, extract_single};
use super::{Domain, INVALID_INDEX_MSG, IndexError, ParseContext, index_arg, parse_index, parse_time};
use crate::command::{Command, TaskChange, TaskCommand};
use crate::core::task::{Priority, Task, TaskKind};
use crate::core::task_list::TaskSortKey;
use crate::error::SplitError;

static ADD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<verb>todo|deadline|event)\s+(?P<name>\w+[\s\w]*)$").unwrap()
});

static FIND_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^find\s+(?P<keyword>.+)$").unwrap());

static REMINDER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^reminder(?:\s+(?P<days>-?\d+))?\s*$").unwrap());

static SORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^sort\s+(?P<key>status|time|priority)\s*$").unwrap());

const DEFAULT_SNOOZE_DAYS: i64 = 3;
const MAX_DAY_DIGITS: usize = 6;

fn invalid(reason: impl Into<String>) -> Command {
    Command::invalid(reason)
}

fn from_split(e: SplitError) -> Command {
    invalid(e.to_string())
}

/// Resolve the index of `verb I`, or the invalid command describing why not.
fn task_index(input: &SplitInput, verb: &str, ctx: &ParseContext) -> Result<usize, Command> {
    let Some(digits) = index_arg(&input.body, verb) else {
        return Err(invalid(format!(
            "Please enter a task index after '{}', e.g. '{} 1'.",
            verb, verb
        )));
    };
    parse_index(digits, ctx.task_count).map_err(|e| match e {
        IndexError::TooLarge => invalid(INVALID_INDEX_MSG),
        IndexError::OutOfBounds { .. } => invalid("Index out of bounds."),
    })
}

/// A positive day count with fewer than six digits.
fn parse_days(text: &str) -> Option<i64> {
    let digits = text.trim().trim_start_matches('-');
    if digits.is_empty() || digits.len() >= MAX_DAY_DIGITS {
        return None;
    }
    text.trim().parse::<i64>().ok().filter(|d| *d > 0)
}

/// Parse a task-domain command. Never fails: anything unusable becomes
/// `Command::Invalid`, with no reason when the verb itself is unknown.
pub fn parse_task(input: &SplitInput, ctx: &ParseContext) -> Command {
    let result = match input.command.as_str() {
        "list" if input.body == "list" => Ok(Command::Task(TaskCommand::List)),
        "flip" if input.body == "flip" => Ok(Command::Flip),
        "help" if input.body == "help" => Ok(Command::Help(Domain::Task)),
        "bye" if input.body == "bye" => Ok(Command::Exit),
        "todo" | "deadline" | "event" => parse_add(input, ctx),
        "done" => task_index(input, "done", ctx).map(|i| Command::Task(TaskCommand::Done(i))),
        "delete" => task_index(input, "delete", ctx).map(|i| Command::Task(TaskCommand::Delete(i))),
        "find" => parse_find(input),
        "reminder" => parse_reminder(input),
        "doafter" => parse_do_after(input, ctx),
        "snooze" => parse_snooze(input, ctx),
        "update" => parse_update(input, ctx),
        "set" => parse_set(input, ctx),
        "link" => parse_link(input, ctx),
        "sort" => parse_sort(input),
        _ => Err(Command::Invalid { reason: None }),
    };
    result.unwrap_or_else(|invalid| invalid)
}

fn parse_add(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let Some(caps) = ADD_RE.captures(&input.body) else {
        return Err(invalid(format!(
            "Please give the {} a name made of words, e.g. '{} buy milk'.",
            input.command, input.command
        )));
    };
    let verb = &caps["verb"];
    let name = caps["name"].trim();

    let time = match extract_single(&input.options, "time").map_err(from_split)? {
        Some(phrase) => match parse_time(&phrase, ctx.now) {
            Some(t) => Some(t),
            None => {
                return Err(invalid(format!(
                    "'{}' is not a valid time. Use dd/mm/yyyy HHmm or a weekday such as 'fri 0900'.",
                    phrase
                )));
            }
        },
        None => None,
    };
    let Some(kind) = TaskKind::from_verb(verb, time) else {
        return Err(invalid(format!(
            "A {} needs a time. Add one with -time dd/mm/yyyy HHmm.",
            verb
        )));
    };

    let mut task = Task::new(name, kind);
    task.do_after = extract_single(&input.options, "doafter").map_err(from_split)?;
    if let Some(p) = extract_single(&input.options, "priority").map_err(from_split)? {
        task.priority = Some(parse_priority(&p)?);
    }
    for tag in extract_all(&input.options, "tag") {
        task.add_tag(&tag);
    }
    for hash in extract_all(&input.options, "link") {
        task.link_email(&hash);
    }
    Ok(Command::Task(TaskCommand::Add(task)))
}

fn parse_priority(text: &str) -> Result<Priority, Command> {
    Priority::from_name(text).ok_or_else(|| {
        invalid(format!(
            "'{}' is not a priority. Use HIGH, MEDIUM or LOW.",
            text
        ))
    })
}

fn parse_find(input: &SplitInput) -> Result<Command, Command> {
    let caps = FIND_RE
        .captures(&input.body)
        .ok_or_else(|| invalid("Please enter a keyword to find, e.g. 'find milk'."))?;
    Ok(Command::Task(TaskCommand::Find(caps["keyword"].trim().to_string())))
}

fn parse_reminder(input: &SplitInput) -> Result<Command, Command> {
    let caps = REMINDER_RE
        .captures(&input.body)
        .ok_or_else(|| invalid("Please enter a number of days, e.g. 'reminder 3'."))?;
    let cmd = match caps.name("days") {
        None => TaskCommand::Reminder {
            days: None,
            rejected: false,
        },
        Some(m) => match parse_days(m.as_str()) {
            Some(days) => TaskCommand::Reminder {
                days: Some(days),
                rejected: false,
            },
            None => TaskCommand::Reminder {
                days: None,
                rejected: true,
            },
        },
    };
    Ok(Command::Task(cmd))
}

fn parse_do_after(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let index = task_index(input, "doafter", ctx)?;
    let text = extract_single(&input.options, "msg")
        .map_err(from_split)?
        .ok_or_else(|| invalid("Please add a description with -msg."))?;
    Ok(Command::Task(TaskCommand::DoAfter { index, text }))
}

fn parse_snooze(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let index = task_index(input, "snooze", ctx)?;
    let days = match extract_single(&input.options, "by").map_err(from_split)? {
        Some(text) => parse_days(&text).ok_or_else(|| {
            invalid("Snooze duration should be a positive number of at most 5 digits.")
        })?,
        None => DEFAULT_SNOOZE_DAYS,
    };
    Ok(Command::Task(TaskCommand::Snooze { index, days }))
}

fn parse_update(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let index = task_index(input, "update", ctx)?;
    let mut changes = Vec::new();
    if let Some(phrase) = extract_single(&input.options, "time").map_err(from_split)? {
        let resolved = parse_time(&phrase, ctx.now);
        changes.push(TaskChange::Time { phrase, resolved });
    }
    if let Some(text) = extract_single(&input.options, "doafter").map_err(from_split)? {
        changes.push(TaskChange::DoAfter(text));
    }
    if let Some(name) = extract_single(&input.options, "priority").map_err(from_split)? {
        changes.push(TaskChange::Priority(name));
    }
    changes.extend(extract_all(&input.options, "tag").into_iter().map(TaskChange::Tag));

    if changes.is_empty() {
        return Err(invalid(
            "Please specify what to update with -time, -doafter, -priority or -tag.",
        ));
    }
    Ok(Command::Task(TaskCommand::Update { index, changes }))
}

fn parse_set(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let index = task_index(input, "set", ctx)?;
    let name = extract_single(&input.options, "priority")
        .map_err(from_split)?
        .ok_or_else(|| invalid("Please add a priority with -priority HIGH|MEDIUM|LOW."))?;
    let priority = parse_priority(&name)?;
    Ok(Command::Task(TaskCommand::SetPriority { index, priority }))
}

fn parse_link(input: &SplitInput, ctx: &ParseContext) -> Result<Command, Command> {
    let index = task_index(input, "link", ctx)?;
    let mut emails = Vec::new();
    for text in extract_all(&input.options, "email") {
        let position = parse_index(&text, ctx.email_count).map_err(|e| match e {
            IndexError::TooLarge => invalid(INVALID_INDEX_MSG),
            IndexError::OutOfBounds { index, len } => invalid(format!(
                "Email index {} is out of bounds of 1 to {}.",
                index, len
            )),
        })?;
        emails.push(position);
    }
    Ok(Command::Task(TaskCommand::Link { index, emails }))
}

fn parse_sort(input: &SplitInput) -> Result<Command, Command> {
    SORT_RE
        .captures(&input.body)
        .and_then(|caps| TaskSortKey::from_name(&caps["key"]))
        .map(|key| Command::Task(TaskCommand::Sort(key)))
        .ok_or_else(|| invalid("Please sort by status, time or priority."))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::keyword::KeywordPairList;
    use crate::parse::split;
    use chrono::{NaiveDate, NaiveDateTime};

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    fn parse(line: &str, tasks: usize) -> Command {
        let keywords = KeywordPairList::default();
        let ctx = ParseContext {
            task_count: tasks,
            email_count: 2,
            keywords: &keywords,
            now: now(),
        };
        parse_task(&split(line).unwrap(), &ctx)
    }

    fn reason(cmd: Command) -> Option<String> {
        match cmd {
            Command::Invalid { reason } => reason,
            other => panic!("expected invalid, got {:?}", other),
        }
    }

    #[test]
    fn unknown_verb_is_invalid_without_reason() {
        assert_eq!(parse("dance now", 0), Command::Invalid { reason: None });
    }

    #[test]
    fn add_deadline_with_options() {
        let cmd = parse(
            "deadline buy milk -time 01/01/2030 2300 -tag urgent -priority high -doafter drink it",
            0,
        );
        let Command::Task(TaskCommand::Add(task)) = cmd else {
            panic!("expected add");
        };
        assert_eq!(task.name, "buy milk");
        assert_eq!(
            task.kind,
            TaskKind::Deadline(
                NaiveDate::from_ymd_opt(2030, 1, 1)
                    .unwrap()
                    .and_hms_opt(23, 0, 0)
                    .unwrap()
            )
        );
        assert_eq!(task.tags, vec!["urgent"]);
        assert_eq!(task.priority, Some(Priority::High));
        assert_eq!(task.do_after.as_deref(), Some("drink it"));
    }

    #[test]
    fn timed_add_needs_resolvable_time() {
        assert!(reason(parse("deadline report", 0)).unwrap().contains("needs a time"));
        assert!(reason(parse("event party -time 32/01/2030 1200", 0))
            .unwrap()
            .contains("not a valid time"));
        assert!(reason(parse("todo read -priority urgent", 0)).is_some());
        assert!(reason(parse("todo read -doafter a -doafter b", 0)).is_some());
    }

    #[test]
    fn index_rules() {
        assert_eq!(parse("done 2", 2), Command::Task(TaskCommand::Done(1)));
        assert_eq!(reason(parse("done 1", 0)).as_deref(), Some("Index out of bounds."));
        assert_eq!(reason(parse("delete 3", 2)).as_deref(), Some("Index out of bounds."));
        assert_eq!(reason(parse("delete 123456", 2)).as_deref(), Some(INVALID_INDEX_MSG));
        assert!(reason(parse("done one", 2)).is_some());
        assert!(reason(parse("done 1 2", 2)).is_some());
    }

    #[test]
    fn snooze_defaults_to_three_days() {
        assert_eq!(
            parse("snooze 1", 1),
            Command::Task(TaskCommand::Snooze { index: 0, days: 3 })
        );
        assert_eq!(
            parse("snooze 1 -by 7", 1),
            Command::Task(TaskCommand::Snooze { index: 0, days: 7 })
        );
        assert!(reason(parse("snooze 1 -by 0", 1)).is_some());
    }

    #[test]
    fn reminder_window() {
        assert_eq!(
            parse("reminder", 0),
            Command::Task(TaskCommand::Reminder { days: None, rejected: false })
        );
        assert_eq!(
            parse("reminder 5", 0),
            Command::Task(TaskCommand::Reminder { days: Some(5), rejected: false })
        );
        assert_eq!(
            parse("reminder -2", 0),
            Command::Task(TaskCommand::Reminder { days: None, rejected: true })
        );
        assert_eq!(
            parse("reminder 1234567", 0),
            Command::Task(TaskCommand::Reminder { days: None, rejected: true })
        );
    }

    #[test]
    fn update_needs_an_attribute() {
        assert!(reason(parse("update 1", 1)).is_some());
        let Command::Task(TaskCommand::Update { index, changes }) =
            parse("update 1 -priority low -tag a -tag b", 1)
        else {
            panic!("expected update");
        };
        assert_eq!(index, 0);
        assert_eq!(changes.len(), 3);
    }

    #[test]
    fn set_priority_is_checked_at_parse_time() {
        assert_eq!(
            parse("set 1 -priority Medium", 1),
            Command::Task(TaskCommand::SetPriority { index: 0, priority: Priority::Medium })
        );
        assert!(reason(parse("set 1 -priority soon", 1)).is_some());
        assert!(reason(parse("set 1", 1)).is_some());
    }

    #[test]
    fn link_checks_email_indices() {
        assert_eq!(
            parse("link 1 -email 2 -email 1", 1),
            Command::Task(TaskCommand::Link { index: 0, emails: vec![1, 0] })
        );
        assert!(reason(parse("link 1 -email 3", 1)).unwrap().contains("out of bounds of 1 to 2"));
    }

    #[test]
    fn shell_and_sort_verbs() {
        assert_eq!(parse("flip", 0), Command::Flip);
        assert_eq!(parse("bye", 0), Command::Exit);
        assert_eq!(parse("help", 0), Command::Help(Domain::Task));
        assert_eq!(parse("sort time", 0), Command::Task(TaskCommand::Sort(TaskSortKey::Time)));
        assert!(reason(parse("sort name", 0)).is_some());
        assert_eq!(parse("list extra", 0), Command::Invalid { reason: None });
    }
}
