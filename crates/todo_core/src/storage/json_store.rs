use crate::error::AppError;
use crate::model::Task;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

pub const STORE_ENV_VAR: &str = "TODOAPP_STORE_PATH";
const STORE_FILE_NAME: &str = "todos.json";

pub fn default_store_path() -> Result<PathBuf, AppError> {
    if cfg!(windows) {
        let appdata =
            std::env::var("APPDATA").map_err(|_| AppError::invalid_data("APPDATA is not set"))?;
        Ok(PathBuf::from(appdata).join("todoapp").join(STORE_FILE_NAME))
    } else {
        let home = std::env::var("HOME").map_err(|_| AppError::invalid_data("HOME is not set"))?;
        Ok(PathBuf::from(home)
            .join(".config")
            .join("todoapp")
            .join(STORE_FILE_NAME))
    }
}

/// `TODOAPP_STORE_PATH` wins over the configured path, which wins over the
/// platform default.
pub fn store_path(configured: Option<&Path>) -> Result<PathBuf, AppError> {
    if let Ok(path) = std::env::var(STORE_ENV_VAR)
        && !path.trim().is_empty()
    {
        return Ok(PathBuf::from(path));
    }

    match configured {
        Some(path) => Ok(path.to_path_buf()),
        None => default_store_path(),
    }
}

/// Writes an empty collection if nothing exists at `path` yet.
pub fn ensure_store(path: &Path) -> Result<(), AppError> {
    if path.exists() {
        return Ok(());
    }
    save_tasks(path, &[])
}

pub fn load_tasks(path: &Path) -> Result<Vec<Task>, AppError> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err)))?;
    let tasks: Vec<Task> = serde_json::from_str(&content).map_err(|err| {
        AppError::invalid_data(format!("invalid JSON in {}: {}", path.display(), err))
    })?;

    debug!(path = %path.display(), count = tasks.len(), "loaded tasks");
    Ok(tasks)
}

pub fn save_tasks(path: &Path, tasks: &[Task]) -> Result<(), AppError> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|err| AppError::io(err.to_string()))?;

    let content = serde_json::to_string_pretty(tasks)
        .map_err(|err| AppError::invalid_data(err.to_string()))?;

    let mut file = NamedTempFile::new_in(dir).map_err(|err| AppError::io(err.to_string()))?;
    file.write_all(content.as_bytes())
        .and_then(|_| file.as_file().sync_all())
        .map_err(|err| AppError::io(err.to_string()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o600))
            .map_err(|err| AppError::io(err.to_string()))?;
    }

    file.persist(path)
        .map_err(|err| AppError::io(format!("{}: {}", path.display(), err.error)))?;

    debug!(path = %path.display(), count = tasks.len(), "saved tasks");
    Ok(())
}
