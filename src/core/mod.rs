pub mod email;
pub mod email_list;
pub mod keyword;
pub mod model;
pub mod tag_index;
pub mod task;
pub mod task_list;

pub use email::{Email, Tag, TagOrigin};
pub use email_list::{EmailList, SortOrder};
pub use keyword::{KeywordPair, KeywordPairList};
pub use model::{Model, Projection};
pub use tag_index::{TagIndex, TagQuery};
pub use task::{Priority, Task, TaskKind};
pub use task_list::{TaskList, TaskSortKey};
