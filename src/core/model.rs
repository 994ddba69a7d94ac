use super::email::Email;
use super::email_list::{EmailList, SortOrder};
use super::keyword::KeywordPairList;
use super::tag_index::TagIndex;
use super::task::{Priority, Snooze, Task};
use super::task_list::{TaskList, TaskSortKey};

pub const DEFAULT_REMINDER_DAYS: i64 = 3;

/// A full re-projection of a collection after it changed, for the UI and stores.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    Tasks(Vec<String>),
    Emails(Vec<String>),
}

/// Process state: the two collections, the active keyword list and the tag
/// index derived from the emails. All mutation goes through the methods
/// below so projections and the index never go stale.
#[derive(Debug, Clone)]
pub struct Model {
    tasks: TaskList,
    emails: EmailList,
    keywords: KeywordPairList,
    tag_index: TagIndex,
    reminder_days: i64,
    pending: Vec<Projection>,
}

impl Default for Model {
    fn default() -> Self {
        Self::new(
            TaskList::new(),
            EmailList::new(),
            KeywordPairList::default(),
            DEFAULT_REMINDER_DAYS,
        )
    }
}

impl Model {
    pub fn new(
        tasks: TaskList,
        emails: EmailList,
        keywords: KeywordPairList,
        reminder_days: i64,
    ) -> Self {
        let tag_index = TagIndex::build(&emails);
        Self {
            tasks,
            emails,
            keywords,
            tag_index,
            reminder_days: if reminder_days > 0 {
                reminder_days
            } else {
                DEFAULT_REMINDER_DAYS
            },
            pending: Vec::new(),
        }
    }

    pub fn tasks(&self) -> &TaskList {
        &self.tasks
    }

    pub fn emails(&self) -> &EmailList {
        &self.emails
    }

    pub fn keywords(&self) -> &KeywordPairList {
        &self.keywords
    }

    pub fn tag_index(&self) -> &TagIndex {
        &self.tag_index
    }

    /// The last valid reminder window in days.
    pub fn reminder_days(&self) -> i64 {
        self.reminder_days
    }

    /// Drain the projections recorded since the last call.
    pub fn take_projections(&mut self) -> Vec<Projection> {
        std::mem::take(&mut self.pending)
    }

    fn project_tasks(&mut self) {
        self.pending
            .push(Projection::Tasks(self.tasks.display_strings()));
    }

    fn project_emails(&mut self) {
        self.tag_index = TagIndex::build(&self.emails);
        self.pending
            .push(Projection::Emails(self.emails.display_strings()));
    }

    // Tasks

    /// Append a task and return its position.
    pub fn add_task(&mut self, task: Task) -> usize {
        self.tasks.push(task);
        self.project_tasks();
        self.tasks.len() - 1
    }

    pub fn delete_task(&mut self, index: usize) -> Option<Task> {
        let removed = self.tasks.remove(index)?;
        self.project_tasks();
        Some(removed)
    }

    /// Swap in an already validated replacement for the task at `index`.
    pub fn replace_task(&mut self, index: usize, task: Task) -> bool {
        let Some(slot) = self.tasks.get_mut(index) else {
            return false;
        };
        *slot = task;
        self.project_tasks();
        true
    }

    fn with_task<R>(&mut self, index: usize, f: impl FnOnce(&mut Task) -> R) -> Option<R> {
        let result = f(self.tasks.get_mut(index)?);
        self.project_tasks();
        Some(result)
    }

    /// Mark done. Returns whether the task was already done.
    pub fn mark_task_done(&mut self, index: usize) -> Option<bool> {
        self.with_task(index, |t| {
            let was_done = t.is_done();
            t.mark_done();
            was_done
        })
    }

    pub fn set_task_priority(&mut self, index: usize, priority: Priority) -> Option<()> {
        self.with_task(index, |t| t.priority = Some(priority))
    }

    pub fn set_task_do_after(&mut self, index: usize, text: &str) -> Option<()> {
        self.with_task(index, |t| t.do_after = Some(text.to_string()))
    }

    /// Only a moved task is re-projected.
    pub fn snooze_task(&mut self, index: usize, days: i64) -> Option<Snooze> {
        let result = self.tasks.get_mut(index)?.snooze(days);
        if let Snooze::Moved(_) = result {
            self.project_tasks();
        }
        Some(result)
    }

    /// Link email hashes to a task, returning the ones that were not linked yet.
    pub fn link_task_emails(&mut self, index: usize, hashes: &[String]) -> Option<Vec<String>> {
        self.with_task(index, |t| {
            hashes
                .iter()
                .filter(|h| t.link_email(h))
                .cloned()
                .collect()
        })
    }

    pub fn sort_tasks(&mut self, key: TaskSortKey) {
        self.tasks.sort_by(key);
        self.project_tasks();
    }

    /// Record a new window. Non-positive values are ignored.
    pub fn set_reminder_days(&mut self, days: i64) -> bool {
        if days <= 0 {
            return false;
        }
        self.reminder_days = days;
        true
    }

    // Emails

    pub fn delete_email(&mut self, index: usize) -> Option<Email> {
        let removed = self.emails.remove(index)?;
        self.project_emails();
        Some(removed)
    }

    pub fn clear_emails(&mut self) {
        self.emails.clear();
        self.project_emails();
    }

    pub fn tag_email(&mut self, index: usize, tags: &[String]) -> Vec<String> {
        let added = self.emails.add_tags(index, tags);
        self.project_emails();
        added
    }

    /// Install a new keyword list and re-tag every email against it.
    pub fn install_keywords(&mut self, keywords: KeywordPairList) {
        self.keywords = keywords;
        self.emails.retag_all(&self.keywords);
        self.project_emails();
    }

    /// Reconcile fetched or stored emails by content hash. Returns how many were new.
    pub fn sync_emails(&mut self, incoming: Vec<Email>) -> usize {
        let added = self.emails.reconcile(incoming, &self.keywords);
        self.project_emails();
        added
    }

    pub fn set_email_order(&mut self, order: SortOrder) {
        self.emails.set_order(order);
        self.project_emails();
    }
}
