use chrono::NaiveDateTime;
use std::path::Path;

use crate::command::{Command, ExecContext, OutputMode, TaskCommand};
use crate::core::model::Model;
use crate::core::task_list::TaskList;
use crate::error::StorageError;
use crate::parse::{ParseContext, parse_input};

/// One record per line: `<0|1> <verb> <name> [-option value]*`.
pub fn serialize_tasks(tasks: &TaskList) -> String {
    let mut out = String::new();
    for record in tasks.records() {
        out.push_str(&record);
        out.push('\n');
    }
    out
}

/// Rebuild a task list by replaying each record as a silent `task` add,
/// then applying the done flags to the tasks that were added.
pub fn replay_records(content: &str, now: NaiveDateTime) -> Result<TaskList, StorageError> {
    let mut model = Model::default();
    let mut done = Vec::new();

    for (n, line) in content.lines().enumerate() {
        let record = line.trim();
        if record.is_empty() {
            continue;
        }
        let corrupt = || StorageError::CorruptRecord {
            line: n + 1,
            record: record.to_string(),
        };

        let (flag, rest) = record.split_once(' ').ok_or_else(corrupt)?;
        let is_done = match flag {
            "0" => false,
            "1" => true,
            _ => return Err(corrupt()),
        };

        let command = {
            let ctx = ParseContext::from_model(&model, now);
            parse_input(&format!("task {}", rest), &ctx).map_err(|_| corrupt())?
        };
        if !matches!(command, Command::Task(TaskCommand::Add(_))) {
            return Err(corrupt());
        }

        let mut ctx = ExecContext::new(&mut model, now);
        let outcome = command.execute(&mut ctx, OutputMode::Silent);
        if !outcome.success {
            return Err(corrupt());
        }
        if is_done {
            done.push(model.tasks().len() - 1);
        }
    }

    for index in done {
        model.mark_task_done(index);
    }
    Ok(model.tasks().clone())
}

/// Load the task file. A missing file is an empty list; a corrupt one is
/// reported once and also yields an empty list.
pub fn load_tasks(path: &Path, now: NaiveDateTime) -> TaskList {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return TaskList::new(),
        Err(e) => {
            log::error!("Failed to read {}: {}", path.display(), e);
            return TaskList::new();
        }
    };
    match replay_records(&content, now) {
        Ok(tasks) => {
            log::info!("loaded {} task(s) from {}", tasks.len(), path.display());
            tasks
        }
        Err(e) => {
            log::error!("Invalid Save File! {}", e);
            TaskList::new()
        }
    }
}

pub fn save_tasks(path: &Path, tasks: &TaskList) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serialize_tasks(tasks))?;
    log::debug!("saved {} task(s) to {}", tasks.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Priority, Task, TaskKind};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 3, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample() -> TaskList {
        let mut todo = Task::new("read book", TaskKind::ToDo);
        todo.add_tag("leisure");
        todo.add_tag("\"x\"");
        todo.priority = Some(Priority::Low);

        let mut deadline = Task::new("buy milk", TaskKind::Deadline(at(1, 23, 0)));
        deadline.mark_done();
        deadline.do_after = Some("drink it".into());
        deadline.link_email("ab12cd");
        deadline.link_email("ef34");

        let mut event = Task::new("team lunch", TaskKind::Event(at(2, 12, 30)));
        event.add_tag("work");
        event.add_tag("food");
        event.priority = Some(Priority::High);
        event.do_after = Some("\"thank the host\"".into());
        event.mark_done();

        TaskList::from_tasks(vec![todo, deadline, event])
    }

    #[test]
    fn records_round_trip() {
        let tasks = sample();
        let replayed = replay_records(&serialize_tasks(&tasks), now()).unwrap();
        assert_eq!(replayed, tasks);
    }

    #[test]
    fn done_flags_follow_their_records() {
        let content = "1 todo first\n0 todo second\n1 event third -time 02/03/2030 1230\n";
        let tasks = replay_records(content, now()).unwrap();
        let flags: Vec<bool> = tasks.iter().map(|t| t.is_done()).collect();
        assert_eq!(flags, vec![true, false, true]);
    }

    #[test]
    fn corrupt_record_is_reported_with_line() {
        let content = "0 todo fine\n2 todo bad flag\n0 todo never read\n";
        match replay_records(content, now()) {
            Err(StorageError::CorruptRecord { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other),
        }
        assert!(replay_records("0 deadline no time\n", now()).is_err());
        assert!(replay_records("0 done 1\n", now()).is_err());
    }

    #[test]
    fn file_round_trip_and_degraded_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.txt");
        assert!(load_tasks(&path, now()).is_empty());

        save_tasks(&path, &sample()).unwrap();
        assert_eq!(load_tasks(&path, now()), sample());

        std::fs::write(&path, "garbage\n").unwrap();
        assert!(load_tasks(&path, now()).is_empty());
    }
}
