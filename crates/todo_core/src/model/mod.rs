pub mod due_date;
mod task;

pub use due_date::DueDate;
pub use task::{Priority, Task, TaskInput, TaskPatch, normalize_text};
