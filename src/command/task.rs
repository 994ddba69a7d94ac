use chrono::NaiveDateTime;

use super::{ExecContext, Outcome};
use crate::core::task::{Priority, Snooze, Task, TaskKind, TIME_FORMAT};
use crate::core::task_list::{TaskSortKey, render_selection};

/// One attribute change requested by `update`. Values are kept raw enough
/// that the whole change set can be checked before anything is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskChange {
    /// The phrase as typed and what it resolved to at parse time.
    Time {
        phrase: String,
        resolved: Option<NaiveDateTime>,
    },
    DoAfter(String),
    Priority(String),
    Tag(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum TaskCommand {
    List,
    Add(Task),
    Done(usize),
    Delete(usize),
    Find(String),
    /// `days` is `None` when no window was given or the given one was
    /// rejected, in which case the last valid window is used.
    Reminder { days: Option<i64>, rejected: bool },
    DoAfter { index: usize, text: String },
    Snooze { index: usize, days: i64 },
    Update { index: usize, changes: Vec<TaskChange> },
    SetPriority { index: usize, priority: Priority },
    /// Email positions to link; empty means "show what is linked".
    Link { index: usize, emails: Vec<usize> },
    Sort(TaskSortKey),
}

fn describe_clashes(ctx: &ExecContext, indices: &[usize]) -> String {
    let tasks = ctx.model.tasks();
    let selection: Vec<_> = indices
        .iter()
        .filter_map(|&i| tasks.get(i).map(|t| (i, t)))
        .collect();
    format!(
        "\nWarning: this task clashes with:\n{}",
        render_selection(&selection)
    )
}

impl TaskCommand {
    pub fn execute(self, ctx: &mut ExecContext) -> Outcome {
        match self {
            Self::List => Outcome::ok(ctx.model.tasks().render()),
            Self::Add(task) => {
                let clashes = ctx.model.tasks().clashes(&task, None);
                let index = ctx.model.add_task(task);
                let Some(added) = ctx.model.tasks().get(index) else {
                    return Outcome::fail("Task could not be added.");
                };
                log::debug!("added task {} at position {}", added.name, index + 1);
                let mut response = format!(
                    "Got it. I've added this task:\n  {}\nNow you have {} task(s) in the list.",
                    added,
                    ctx.model.tasks().len()
                );
                if !clashes.is_empty() {
                    response.push_str(&describe_clashes(ctx, &clashes));
                }
                Outcome::ok(response)
            }
            Self::Done(index) => match ctx.model.mark_task_done(index) {
                Some(was_done) => {
                    let task = ctx.model.tasks().get(index).map(|t| t.to_string()).unwrap_or_default();
                    if was_done {
                        Outcome::ok(format!("This task is already done:\n  {}", task))
                    } else {
                        Outcome::ok(format!("Nice! I've marked this task as done:\n  {}", task))
                    }
                }
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Delete(index) => match ctx.model.delete_task(index) {
                Some(task) => Outcome::ok(format!(
                    "Noted. I've removed this task:\n  {}\nNow you have {} task(s) in the list.",
                    task,
                    ctx.model.tasks().len()
                )),
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Find(keyword) => {
                let hits = ctx.model.tasks().find_keyword(&keyword);
                if hits.is_empty() {
                    Outcome::ok(format!("There is no task matching '{}'.", keyword))
                } else {
                    Outcome::ok(format!(
                        "Here are the matching tasks in your list:\n{}",
                        render_selection(&hits)
                    ))
                }
            }
            Self::Reminder { days, rejected } => {
                let mut response = String::new();
                if rejected {
                    response.push_str(&format!(
                        "Reminder days should be a positive number of at most 5 digits. Using {} day(s) instead.\n",
                        ctx.model.reminder_days()
                    ));
                }
                if let Some(days) = days {
                    ctx.model.set_reminder_days(days);
                }
                let days = ctx.model.reminder_days();
                let near = ctx.model.tasks().find_near(ctx.now, days);
                if near.is_empty() {
                    response.push_str(&format!("There is no task due in the next {} day(s).", days));
                } else {
                    response.push_str(&format!(
                        "Here are the tasks due in the next {} day(s):\n{}",
                        days,
                        render_selection(&near)
                    ));
                }
                Outcome::ok(response)
            }
            Self::DoAfter { index, text } => match ctx.model.set_task_do_after(index, &text) {
                Some(()) => Outcome::ok(format!(
                    "Do-after description added:\n  {}",
                    task_line(ctx, index)
                )),
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Snooze { index, days } => match ctx.model.snooze_task(index, days) {
                Some(Snooze::Moved(time)) => Outcome::ok(format!(
                    "Noted. I've snoozed this task by {} day(s) to {}:\n  {}",
                    days,
                    time.format(TIME_FORMAT),
                    task_line(ctx, index)
                )),
                Some(Snooze::Untimed) => Outcome::ok(format!(
                    "This task has no time to snooze, so nothing changed:\n  {}",
                    task_line(ctx, index)
                )),
                Some(Snooze::OutOfRange) => Outcome::fail(format!(
                    "Snoozing by {} day(s) puts the time out of range, so nothing changed:\n  {}",
                    days,
                    task_line(ctx, index)
                )),
                None => Outcome::fail("Index out of bounds."),
            },
            Self::Update { index, changes } => update(ctx, index, changes),
            Self::SetPriority { index, priority } => {
                match ctx.model.set_task_priority(index, priority) {
                    Some(()) => Outcome::ok(format!(
                        "Priority set to {}:\n  {}",
                        priority.as_str(),
                        task_line(ctx, index)
                    )),
                    None => Outcome::fail("Index out of bounds."),
                }
            }
            Self::Link { index, emails } => link(ctx, index, emails),
            Self::Sort(key) => {
                ctx.model.sort_tasks(key);
                Outcome::ok(format!(
                    "Tasks sorted by {}.\n{}",
                    key.as_str(),
                    ctx.model.tasks().render()
                ))
            }
        }
    }
}

fn task_line(ctx: &ExecContext, index: usize) -> String {
    ctx.model
        .tasks()
        .get(index)
        .map(|t| t.to_string())
        .unwrap_or_default()
}

/// Apply every change to a copy first; install the copy only if all succeed.
fn update(ctx: &mut ExecContext, index: usize, changes: Vec<TaskChange>) -> Outcome {
    let Some(original) = ctx.model.tasks().get(index) else {
        return Outcome::fail("Index out of bounds.");
    };
    let mut task = original.clone();

    for change in changes {
        match change {
            TaskChange::Time { phrase, resolved } => {
                if task.kind == TaskKind::ToDo {
                    return Outcome::fail("A todo task has no time to update. Nothing was changed.");
                }
                let Some(time) = resolved else {
                    return Outcome::fail(format!(
                        "'{}' is not a valid time. Nothing was changed.",
                        phrase
                    ));
                };
                task.set_time(time);
            }
            TaskChange::DoAfter(text) => task.do_after = Some(text),
            TaskChange::Priority(name) => match Priority::from_name(&name) {
                Some(p) => task.priority = Some(p),
                None => {
                    return Outcome::fail(format!(
                        "'{}' is not a priority (HIGH, MEDIUM or LOW). Nothing was changed.",
                        name
                    ));
                }
            },
            TaskChange::Tag(tag) => {
                task.add_tag(&tag);
            }
        }
    }

    let clashes = ctx.model.tasks().clashes(&task, Some(index));
    if !ctx.model.replace_task(index, task) {
        return Outcome::fail("Index out of bounds.");
    }
    let mut response = format!("Task updated:\n  {}", task_line(ctx, index));
    if !clashes.is_empty() {
        response.push_str(&describe_clashes(ctx, &clashes));
    }
    Outcome::ok(response)
}

fn link(ctx: &mut ExecContext, index: usize, emails: Vec<usize>) -> Outcome {
    let Some(task) = ctx.model.tasks().get(index) else {
        return Outcome::fail("Index out of bounds.");
    };

    if emails.is_empty() {
        if task.linked_emails.is_empty() {
            return Outcome::ok(format!("This task has no linked email:\n  {}", task));
        }
        let lines: Vec<String> = task
            .linked_emails
            .iter()
            .enumerate()
            .map(|(i, hash)| {
                let subject = ctx
                    .model
                    .emails()
                    .find_by_hash(hash)
                    .map(|e| e.subject.as_str())
                    .unwrap_or("(email no longer available)");
                format!("{}. {}", i + 1, subject)
            })
            .collect();
        return Outcome::ok(format!(
            "Here are the emails linked to this task:\n{}",
            lines.join("\n")
        ));
    }

    let mut hashes = Vec::with_capacity(emails.len());
    for position in emails {
        match ctx.model.emails().get(position) {
            Some(email) => hashes.push(email.hash().to_string()),
            None => {
                return Outcome::fail(format!(
                    "Email index {} is out of bounds. Nothing was linked.",
                    position + 1
                ));
            }
        }
    }

    match ctx.model.link_task_emails(index, &hashes) {
        Some(added) if added.is_empty() => {
            Outcome::ok("These emails are already linked to this task.")
        }
        Some(added) => {
            let subjects: Vec<String> = added
                .iter()
                .filter_map(|h| ctx.model.emails().find_by_hash(h))
                .map(|e| format!("  {}", e.subject))
                .collect();
            Outcome::ok(format!(
                "Linked {} email(s) to this task:\n  {}\n{}",
                added.len(),
                task_line(ctx, index),
                subjects.join("\n")
            ))
        }
        None => Outcome::fail("Index out of bounds."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{Command, OutputMode};
    use crate::core::email::Email;
    use crate::core::model::Model;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn run(model: &mut Model, cmd: TaskCommand) -> Outcome {
        let mut ctx = ExecContext::new(model, at(1, 0));
        Command::Task(cmd).execute(&mut ctx, OutputMode::Normal)
    }

    #[test]
    fn add_reports_clash() {
        let mut model = Model::default();
        let first = run(&mut model, TaskCommand::Add(Task::new("a", TaskKind::Deadline(at(2, 9)))));
        assert!(!first.response.unwrap().contains("clashes"));
        let second = run(&mut model, TaskCommand::Add(Task::new("b", TaskKind::Event(at(2, 9)))));
        assert!(second.success);
        assert!(second.response.unwrap().contains("clashes with:\n1. [D][ ] a"));
    }

    #[test]
    fn snooze_out_of_range_fails_without_change() {
        let end = NaiveDate::MAX.and_hms_opt(23, 59, 0).unwrap();
        let mut model = Model::default();
        model.add_task(Task::new("far", TaskKind::Deadline(end)));
        model.take_projections();

        let outcome = run(&mut model, TaskCommand::Snooze { index: 0, days: 1 });
        assert!(!outcome.success);
        assert!(outcome.response.unwrap().contains("out of range"));
        assert_eq!(model.tasks().get(0).unwrap().time(), Some(end));
        assert!(model.take_projections().is_empty());
    }

    #[test]
    fn update_is_all_or_nothing() {
        let mut model = Model::default();
        model.add_task(Task::new("read", TaskKind::ToDo));
        let outcome = run(
            &mut model,
            TaskCommand::Update {
                index: 0,
                changes: vec![
                    TaskChange::Priority("high".into()),
                    TaskChange::Time {
                        phrase: "fri".into(),
                        resolved: Some(at(4, 23)),
                    },
                ],
            },
        );
        assert!(!outcome.success);
        assert_eq!(model.tasks().get(0).unwrap().priority, None);

        let outcome = run(
            &mut model,
            TaskCommand::Update {
                index: 0,
                changes: vec![
                    TaskChange::Tag("books".into()),
                    TaskChange::Priority("urgent".into()),
                ],
            },
        );
        assert!(!outcome.success);
        assert!(model.tasks().get(0).unwrap().tags.is_empty());
    }

    #[test]
    fn update_applies_every_change() {
        let mut model = Model::default();
        model.add_task(Task::new("report", TaskKind::Deadline(at(3, 12))));
        let outcome = run(
            &mut model,
            TaskCommand::Update {
                index: 0,
                changes: vec![
                    TaskChange::Time {
                        phrase: "05/01/2030 0900".into(),
                        resolved: Some(at(5, 9)),
                    },
                    TaskChange::Priority("low".into()),
                    TaskChange::DoAfter("email boss".into()),
                ],
            },
        );
        assert!(outcome.success);
        let task = model.tasks().get(0).unwrap();
        assert_eq!(task.time(), Some(at(5, 9)));
        assert_eq!(task.priority, Some(Priority::Low));
        assert_eq!(task.do_after.as_deref(), Some("email boss"));
    }

    #[test]
    fn reminder_falls_back_to_last_valid_window() {
        let mut model = Model::default();
        model.add_task(Task::new("soon", TaskKind::Deadline(at(3, 0))));
        model.add_task(Task::new("later", TaskKind::Deadline(at(9, 0))));

        let outcome = run(&mut model, TaskCommand::Reminder { days: Some(10), rejected: false });
        assert!(outcome.response.unwrap().contains("2. [D][ ] later"));

        let outcome = run(&mut model, TaskCommand::Reminder { days: None, rejected: true });
        let response = outcome.response.unwrap();
        assert!(outcome.success);
        assert!(response.starts_with("Reminder days should be"));
        assert!(response.contains("later"));
        assert_eq!(model.reminder_days(), 10);
    }

    #[test]
    fn link_lists_then_adds() {
        let mut model = Model::default();
        model.add_task(Task::new("reply", TaskKind::ToDo));
        model.sync_emails(vec![Email::new("Invoice", "a@b.c", at(1, 8), "pay me")]);

        let outcome = run(&mut model, TaskCommand::Link { index: 0, emails: vec![] });
        assert!(outcome.response.unwrap().starts_with("This task has no linked email"));

        let outcome = run(&mut model, TaskCommand::Link { index: 0, emails: vec![0] });
        assert!(outcome.success);
        let outcome = run(&mut model, TaskCommand::Link { index: 0, emails: vec![0] });
        assert_eq!(
            outcome.response.as_deref(),
            Some("These emails are already linked to this task.")
        );
        assert_eq!(model.tasks().get(0).unwrap().linked_emails.len(), 1);

        let outcome = run(&mut model, TaskCommand::Link { index: 0, emails: vec![] });
        assert_eq!(
            outcome.response.as_deref(),
            Some("Here are the emails linked to this task:\n1. Invoice")
        );
    }

    #[test]
    fn stale_index_fails_without_mutation() {
        let mut model = Model::default();
        let outcome = run(&mut model, TaskCommand::Done(0));
        assert!(!outcome.success);
        assert!(model.tasks().is_empty());
    }
}
