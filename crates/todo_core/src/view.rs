use crate::error::AppError;
use crate::model::Task;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskFilter {
    #[default]
    All,
    Completed,
    Active,
    HasDueDate,
    HighPriority,
    MediumPriority,
    LowPriority,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TaskSort {
    #[default]
    AddedDateAsc,
    AddedDateDesc,
    DueDateAsc,
    DueDateDesc,
    PriorityAsc,
    PriorityDesc,
}

impl TaskFilter {
    pub const ALL: [TaskFilter; 7] = [
        Self::All,
        Self::Completed,
        Self::Active,
        Self::HasDueDate,
        Self::HighPriority,
        Self::MediumPriority,
        Self::LowPriority,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Completed => "completed",
            Self::Active => "active",
            Self::HasDueDate => "has-due-date",
            Self::HighPriority => "high-priority",
            Self::MediumPriority => "medium-priority",
            Self::LowPriority => "low-priority",
        }
    }

    pub fn matches(self, task: &Task) -> bool {
        use crate::model::Priority;
        match self {
            Self::All => true,
            Self::Completed => task.completed,
            Self::Active => !task.completed,
            Self::HasDueDate => task.due_date.is_some(),
            Self::HighPriority => task.priority == Priority::High,
            Self::MediumPriority => task.priority == Priority::Medium,
            Self::LowPriority => task.priority == Priority::Low,
        }
    }
}

impl TaskSort {
    pub const ALL: [TaskSort; 6] = [
        Self::AddedDateAsc,
        Self::AddedDateDesc,
        Self::DueDateAsc,
        Self::DueDateDesc,
        Self::PriorityAsc,
        Self::PriorityDesc,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AddedDateAsc => "added-date-asc",
            Self::AddedDateDesc => "added-date-desc",
            Self::DueDateAsc => "due-date-asc",
            Self::DueDateDesc => "due-date-desc",
            Self::PriorityAsc => "priority-asc",
            Self::PriorityDesc => "priority-desc",
        }
    }

    pub fn compare(self, a: &Task, b: &Task) -> Ordering {
        match self {
            Self::AddedDateAsc => a.created_date.cmp(&b.created_date),
            Self::AddedDateDesc => b.created_date.cmp(&a.created_date),
            Self::DueDateAsc => compare_due_dates(a, b, false),
            Self::DueDateDesc => compare_due_dates(a, b, true),
            Self::PriorityAsc => a.priority.cmp(&b.priority),
            Self::PriorityDesc => b.priority.cmp(&a.priority),
        }
    }
}

// Unset due dates sink to the end in both directions.
fn compare_due_dates(a: &Task, b: &Task, descending: bool) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(left), Some(right)) if descending => right.cmp(&left),
        (Some(left), Some(right)) => left.cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn render(tasks: &[Task], filter: TaskFilter, sort: TaskSort) -> Vec<Task> {
    let mut shown: Vec<Task> = tasks
        .iter()
        .filter(|task| filter.matches(task))
        .cloned()
        .collect();
    shown.sort_by(|a, b| sort.compare(a, b));
    shown
}

impl fmt::Display for TaskFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for TaskSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskFilter {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|filter| filter.as_str() == wanted)
            .ok_or_else(|| AppError::invalid_input(format!("unknown filter '{wanted}'")))
    }
}

impl FromStr for TaskSort {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let wanted = raw.trim();
        Self::ALL
            .into_iter()
            .find(|sort| sort.as_str() == wanted)
            .ok_or_else(|| AppError::invalid_input(format!("unknown sort '{wanted}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::{TaskFilter, TaskSort, render};
    use crate::model::{Priority, Task};
    use time::OffsetDateTime;
    use time::macros::datetime;

    fn task(id: u64, priority: Priority, completed: bool, due: Option<&str>) -> Task {
        Task {
            id,
            text: format!("task {id}"),
            completed,
            priority,
            due_date: due.map(|raw| raw.parse().unwrap()),
            created_date: created(id),
        }
    }

    fn created(id: u64) -> OffsetDateTime {
        datetime!(2025-01-01 00:00:00 UTC) + time::Duration::minutes(id as i64)
    }

    fn ids(tasks: &[Task]) -> Vec<u64> {
        tasks.iter().map(|task| task.id).collect()
    }

    fn fixture() -> Vec<Task> {
        vec![
            task(3, Priority::High, false, Some("15/03/2025")),
            task(1, Priority::Low, true, None),
            task(4, Priority::Medium, false, Some("01/02/2025")),
            task(2, Priority::Low, false, Some("2025-12-01")),
            task(5, Priority::High, true, None),
        ]
    }

    #[test]
    fn completed_and_active_partition_the_list() {
        let tasks = fixture();
        let completed = render(&tasks, TaskFilter::Completed, TaskSort::AddedDateAsc);
        let active = render(&tasks, TaskFilter::Active, TaskSort::AddedDateAsc);

        assert!(completed.iter().all(|task| task.completed));
        assert!(active.iter().all(|task| !task.completed));
        assert_eq!(completed.len() + active.len(), tasks.len());
        assert_eq!(ids(&completed), vec![1, 5]);
    }

    #[test]
    fn all_filter_keeps_everything() {
        let tasks = fixture();
        assert_eq!(render(&tasks, TaskFilter::All, TaskSort::AddedDateAsc).len(), 5);
    }

    #[test]
    fn priority_and_due_date_filters() {
        let tasks = fixture();
        assert_eq!(
            ids(&render(&tasks, TaskFilter::HighPriority, TaskSort::AddedDateAsc)),
            vec![3, 5]
        );
        assert_eq!(
            ids(&render(&tasks, TaskFilter::MediumPriority, TaskSort::AddedDateAsc)),
            vec![4]
        );
        assert_eq!(
            ids(&render(&tasks, TaskFilter::LowPriority, TaskSort::AddedDateAsc)),
            vec![1, 2]
        );
        assert_eq!(
            ids(&render(&tasks, TaskFilter::HasDueDate, TaskSort::AddedDateAsc)),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn added_date_sorts_by_instant() {
        let tasks = fixture();
        assert_eq!(
            ids(&render(&tasks, TaskFilter::All, TaskSort::AddedDateAsc)),
            vec![1, 2, 3, 4, 5]
        );
        assert_eq!(
            ids(&render(&tasks, TaskFilter::All, TaskSort::AddedDateDesc)),
            vec![5, 4, 3, 2, 1]
        );
    }

    #[test]
    fn due_date_sorts_compare_dates_and_keep_unset_last() {
        let tasks = fixture();
        assert_eq!(
            ids(&render(&tasks, TaskFilter::All, TaskSort::DueDateAsc)),
            vec![4, 3, 2, 1, 5]
        );
        assert_eq!(
            ids(&render(&tasks, TaskFilter::All, TaskSort::DueDateDesc)),
            vec![2, 3, 4, 1, 5]
        );
    }

    #[test]
    fn priority_sort_is_monotone_and_stable() {
        let tasks = fixture();
        let ascending = render(&tasks, TaskFilter::All, TaskSort::PriorityAsc);
        assert!(ascending
            .windows(2)
            .all(|pair| pair[0].priority <= pair[1].priority));
        assert_eq!(ids(&ascending), vec![1, 2, 4, 3, 5]);

        let descending = render(&tasks, TaskFilter::All, TaskSort::PriorityDesc);
        assert_eq!(ids(&descending), vec![3, 5, 4, 1, 2]);
    }

    #[test]
    fn render_does_not_touch_input() {
        let tasks = fixture();
        let before = tasks.clone();
        render(&tasks, TaskFilter::Active, TaskSort::PriorityDesc);
        assert_eq!(tasks, before);
    }

    #[test]
    fn selectors_round_trip_through_names() {
        for filter in TaskFilter::ALL {
            assert_eq!(filter.as_str().parse::<TaskFilter>().unwrap(), filter);
        }
        for sort in TaskSort::ALL {
            assert_eq!(sort.to_string().parse::<TaskSort>().unwrap(), sort);
        }
        assert_eq!(
            serde_json::to_string(&TaskFilter::HasDueDate).unwrap(),
            "\"has-due-date\""
        );
    }

    #[test]
    fn unknown_selector_names_are_rejected() {
        assert_eq!(
            "done".parse::<TaskFilter>().unwrap_err().code(),
            "invalid_input"
        );
        assert_eq!(
            "priority".parse::<TaskSort>().unwrap_err().code(),
            "invalid_input"
        );
    }

    #[test]
    fn defaults_match_initial_view() {
        assert_eq!(TaskFilter::default(), TaskFilter::All);
        assert_eq!(TaskSort::default(), TaskSort::AddedDateAsc);
    }
}
