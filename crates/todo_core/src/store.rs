use crate::error::AppError;
use crate::model::{Task, TaskInput, TaskPatch};
use crate::storage::json_store;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use time::OffsetDateTime;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    last_id: Mutex<u64>,
}

impl TaskStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        json_store::ensure_store(&path)?;
        info!(path = %path.display(), "opened task store");
        Ok(Self {
            path,
            last_id: Mutex::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn list(&self) -> Result<Vec<Task>, AppError> {
        json_store::load_tasks(&self.path)
    }

    pub fn get(&self, id: u64) -> Result<Task, AppError> {
        self.list()?
            .into_iter()
            .find(|task| task.id == id)
            .ok_or_else(not_found)
    }

    pub fn create(&self, input: TaskInput) -> Result<Task, AppError> {
        let mut last_id = self.writer()?;
        let mut tasks = self.list()?;

        let created_date = OffsetDateTime::now_utc();
        let id = next_id(&tasks, *last_id, created_date);
        let task = input.into_task(id, created_date)?;

        tasks.push(task.clone());
        json_store::save_tasks(&self.path, &tasks)?;
        *last_id = id;

        info!(id = task.id, text = %task.text, "added task");
        Ok(task)
    }

    pub fn update(&self, id: u64, patch: &TaskPatch) -> Result<Task, AppError> {
        patch.validate()?;

        let _guard = self.writer()?;
        let mut tasks = self.list()?;
        let Some(task) = tasks.iter_mut().find(|task| task.id == id) else {
            warn!(id, "update of unknown task");
            return Err(not_found());
        };

        patch.apply(task)?;
        let updated = task.clone();
        json_store::save_tasks(&self.path, &tasks)?;

        debug!(id, "updated task");
        Ok(updated)
    }

    pub fn delete(&self, id: u64) -> Result<Task, AppError> {
        let _guard = self.writer()?;
        let mut tasks = self.list()?;
        let Some(index) = tasks.iter().position(|task| task.id == id) else {
            warn!(id, "delete of unknown task");
            return Err(not_found());
        };

        let removed = tasks.remove(index);
        json_store::save_tasks(&self.path, &tasks)?;

        info!(id, "deleted task");
        Ok(removed)
    }

    /// Does not read the file first.
    pub fn reset(&self) -> Result<(), AppError> {
        let _guard = self.writer()?;
        json_store::save_tasks(&self.path, &[])?;
        info!("reset task store");
        Ok(())
    }

    fn writer(&self) -> Result<MutexGuard<'_, u64>, AppError> {
        self.last_id
            .lock()
            .map_err(|_| AppError::io("task store lock poisoned"))
    }
}

fn not_found() -> AppError {
    AppError::not_found("Todo not found")
}

fn next_id(tasks: &[Task], last_issued: u64, now: OffsetDateTime) -> u64 {
    let now_ms = u64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(0);
    let max_existing = tasks.iter().map(|task| task.id).max().unwrap_or(0);
    now_ms
        .max(last_issued.saturating_add(1))
        .max(max_existing.saturating_add(1))
}
