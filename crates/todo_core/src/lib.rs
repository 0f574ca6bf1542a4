pub mod config;
pub mod error;
pub mod model;
pub mod storage;
pub mod store;
pub mod view;

pub use error::AppError;
pub use model::{DueDate, Priority, Task, TaskInput, TaskPatch};
pub use store::TaskStore;
pub use view::{TaskFilter, TaskSort, render};

#[cfg(test)]
mod tests {
    use crate::error::AppError;
    use crate::model::{Priority, Task};
    use time::macros::datetime;

    #[test]
    fn task_has_required_fields() {
        let task = Task {
            id: 1,
            text: "demo".to_string(),
            completed: false,
            priority: Priority::Low,
            due_date: None,
            created_date: datetime!(2025-12-20 00:00:00 UTC),
        };

        assert_eq!(task.id, 1);
        assert_eq!(task.text, "demo");
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.due_date, None);
    }

    #[test]
    fn app_error_exposes_code() {
        let err = AppError::invalid_input("missing text");
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(err.message(), "missing text");
        assert_eq!(err.to_string(), "invalid_input - missing text");
    }

    #[test]
    fn storage_errors_are_flagged() {
        assert!(AppError::io("disk full").is_storage());
        assert!(AppError::invalid_data("bad json").is_storage());
        assert!(!AppError::not_found("Todo not found").is_storage());
    }
}
