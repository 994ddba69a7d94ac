use chrono::NaiveDateTime;

use super::task::Task;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskSortKey {
    Status,
    Time,
    Priority,
}

impl TaskSortKey {
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "status" => Some(Self::Status),
            "time" => Some(Self::Time),
            "priority" => Some(Self::Priority),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Time => "time",
            Self::Priority => "priority",
        }
    }
}

/// Ordered, index-addressable task collection. Positions are the task
/// identity seen by the user and shift down after a delete.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskList {
    tasks: Vec<Task>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks }
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Task> {
        self.tasks.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Task> {
        self.tasks.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.tasks.iter()
    }

    pub(crate) fn push(&mut self, task: Task) {
        self.tasks.push(task);
    }

    pub(crate) fn remove(&mut self, index: usize) -> Option<Task> {
        if index < self.tasks.len() {
            Some(self.tasks.remove(index))
        } else {
            None
        }
    }

    /// Indices of tasks clashing with `task`, ignoring position `skip`.
    pub fn clashes(&self, task: &Task, skip: Option<usize>) -> Vec<usize> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(i, t)| Some(*i) != skip && t.clashes_with(task))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn find_near(&self, now: NaiveDateTime, day_limit: i64) -> Vec<(usize, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_near(now, day_limit))
            .collect()
    }

    pub fn find_keyword(&self, keyword: &str) -> Vec<(usize, &Task)> {
        self.tasks
            .iter()
            .enumerate()
            .filter(|(_, t)| t.matches_keyword(keyword))
            .collect()
    }

    /// Stable sort. Status puts open tasks first, time puts the earliest
    /// timed task first and todos last, priority goes HIGH to unset.
    pub(crate) fn sort_by(&mut self, key: TaskSortKey) {
        match key {
            TaskSortKey::Status => self.tasks.sort_by_key(|t| t.is_done()),
            TaskSortKey::Time => self.tasks.sort_by_key(|t| (t.time().is_none(), t.time())),
            TaskSortKey::Priority => {
                self.tasks.sort_by_key(|t| (t.priority.is_none(), t.priority))
            }
        }
    }

    /// One display line per task, as handed to the UI.
    pub fn display_strings(&self) -> Vec<String> {
        self.tasks.iter().map(|t| t.to_string()).collect()
    }

    pub fn render(&self) -> String {
        if self.tasks.is_empty() {
            return "There is nothing in your task list.".to_string();
        }
        let mut out = format!("Here are the tasks in your list (total of {}):", self.len());
        for (i, task) in self.tasks.iter().enumerate() {
            out.push_str(&format!("\n{}. {}", i + 1, task));
        }
        out
    }

    pub fn records(&self) -> Vec<String> {
        self.tasks.iter().map(Task::to_record).collect()
    }
}

/// Render a filtered selection keeping each task's position in the full list.
pub fn render_selection(selection: &[(usize, &Task)]) -> String {
    selection
        .iter()
        .map(|(i, t)| format!("{}. {}", i + 1, t))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::task::{Priority, TaskKind};
    use chrono::NaiveDate;

    fn at(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 1, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn sample() -> TaskList {
        let mut done = Task::new("file taxes", TaskKind::Deadline(at(9, 9)));
        done.mark_done();
        let mut todo = Task::new("read book", TaskKind::ToDo);
        todo.priority = Some(Priority::Low);
        let mut event = Task::new("team lunch", TaskKind::Event(at(2, 12)));
        event.priority = Some(Priority::High);
        TaskList::from_tasks(vec![done, todo, event])
    }

    #[test]
    fn remove_shifts_later_positions() {
        let mut list = sample();
        let removed = list.remove(0).unwrap();
        assert_eq!(removed.name, "file taxes");
        assert_eq!(list.get(0).unwrap().name, "read book");
        assert!(list.remove(5).is_none());
    }

    #[test]
    fn near_filter_keeps_positions() {
        let list = sample();
        let near = list.find_near(at(1, 0), 3);
        assert_eq!(near.len(), 1);
        assert_eq!(near[0].0, 2);
    }

    #[test]
    fn keyword_filter_matches_display_text() {
        let list = sample();
        let hits = list.find_keyword("book");
        assert_eq!(hits.len(), 1);
        assert_eq!(render_selection(&hits), "2. [T][ ] read book Priority: LOW");
    }

    #[test]
    fn clashes_skip_self() {
        let list = sample();
        let probe = Task::new("other lunch", TaskKind::Deadline(at(2, 12)));
        assert_eq!(list.clashes(&probe, None), vec![2]);
        assert!(list.clashes(&probe, Some(2)).is_empty());
    }

    #[test]
    fn sort_orders() {
        let mut list = sample();
        list.sort_by(TaskSortKey::Status);
        assert_eq!(list.get(2).unwrap().name, "file taxes");

        list.sort_by(TaskSortKey::Time);
        let names: Vec<_> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["team lunch", "file taxes", "read book"]);

        list.sort_by(TaskSortKey::Priority);
        let names: Vec<_> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["team lunch", "read book", "file taxes"]);
    }

    #[test]
    fn empty_list_renders_placeholder() {
        assert_eq!(TaskList::new().render(), "There is nothing in your task list.");
    }
}
