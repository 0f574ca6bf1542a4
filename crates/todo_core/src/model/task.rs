use crate::error::AppError;
use crate::model::due_date::{self, DueDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: u64,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, deserialize_with = "due_date::deserialize_optional")]
    pub due_date: Option<DueDate>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_date: OffsetDateTime,
}

/// Declaration order is the ranking used by priority sorts.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(AppError::invalid_input(format!(
                "priority '{other}' must be one of low, medium, high"
            ))),
        }
    }
}

/// Client-submitted fields for a new task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "due_date::deserialize_optional")]
    pub due_date: Option<DueDate>,
    #[serde(default)]
    pub priority: Option<Priority>,
}

impl TaskInput {
    pub fn new<T: Into<String>>(text: T) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_due_date(mut self, due_date: DueDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub(crate) fn into_task(self, id: u64, created_date: OffsetDateTime) -> Result<Task, AppError> {
        let text = normalize_text(self.text.as_deref().unwrap_or_default())?;
        Ok(Task {
            id,
            text,
            completed: false,
            priority: self.priority.unwrap_or_default(),
            due_date: self.due_date,
            created_date,
        })
    }
}

/// Partial update. `id` and `createdDate` are not fields here, so payloads
/// carrying them deserialize with those keys dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default, deserialize_with = "due_date::deserialize_patch")]
    pub due_date: Option<Option<DueDate>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.text.is_none()
            && self.completed.is_none()
            && self.priority.is_none()
            && self.due_date.is_none()
    }

    /// Checks the patch without touching any task.
    pub(crate) fn validate(&self) -> Result<(), AppError> {
        if let Some(text) = self.text.as_deref() {
            normalize_text(text)?;
        }
        Ok(())
    }

    pub(crate) fn apply(&self, task: &mut Task) -> Result<(), AppError> {
        let text = self.text.as_deref().map(normalize_text).transpose()?;

        if let Some(text) = text {
            task.text = text;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        Ok(())
    }
}

pub fn normalize_text(raw: &str) -> Result<String, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::invalid_input("Todo text is required"));
    }
    Ok(trimmed.to_string())
}
