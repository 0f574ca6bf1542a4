use crate::AppState;
use crate::error::ApiError;
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, Uri};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use todo_core::{AppError, Task, TaskFilter, TaskInput, TaskPatch, TaskSort, TaskStore, render};
use tracing::warn;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ViewQuery {
    filter: Option<String>,
    sort: Option<String>,
}

pub(crate) async fn healthz() -> impl IntoResponse {
    Json(json!({"status": "ok"}))
}

pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    query: Result<Query<ViewQuery>, QueryRejection>,
) -> Result<Json<Vec<Task>>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| AppError::invalid_input(rejection.body_text()))?;
    let view = match (query.filter.as_deref(), query.sort.as_deref()) {
        (None, None) => None,
        (filter, sort) => Some((
            filter.map(str::parse::<TaskFilter>).transpose()?.unwrap_or_default(),
            sort.map(str::parse::<TaskSort>).transpose()?.unwrap_or_default(),
        )),
    };

    let tasks = with_store(&state, |store| store.list()).await?;
    Ok(Json(match view {
        Some((filter, sort)) => render(&tasks, filter, sort),
        None => tasks,
    }))
}

pub(crate) async fn get_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&raw_id)?;
    let task = with_store(&state, move |store| store.get(id)).await?;
    Ok(Json(task))
}

pub(crate) async fn create_task(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let input: TaskInput = parse_body(body)?;
    let task = with_store(&state, move |store| store.create(input)).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub(crate) async fn update_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&raw_id)?;
    let patch: TaskPatch = parse_body(body)?;
    let task = with_store(&state, move |store| store.update(id, &patch)).await?;
    Ok(Json(task))
}

pub(crate) async fn delete_task(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    let id = parse_id(&raw_id)?;
    let task = with_store(&state, move |store| store.delete(id)).await?;
    Ok(Json(task))
}

pub(crate) async fn reset_tasks(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    with_store(&state, |store| store.reset()).await?;
    Ok(Json(json!({"message": "Todos reset successfully"})))
}

pub(crate) async fn method_not_allowed() -> ApiError {
    AppError::method_not_supported("Method Not Allowed").into()
}

pub(crate) async fn fallback(State(state): State<AppState>, uri: Uri) -> ApiError {
    let root = state.settings.api_root.as_str();
    let path = uri.path();
    let under_root = path
        .strip_prefix(root)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'));
    if under_root {
        warn!(path, "unsupported path under collection root");
        AppError::method_not_supported("Method Not Allowed").into()
    } else {
        AppError::not_found("Not Found").into()
    }
}

fn parse_id(raw: &str) -> Result<u64, AppError> {
    raw.parse()
        .map_err(|_| AppError::invalid_input("Todo ID must be a positive integer"))
}

/// An empty body reads as `{}`; the content type is not checked.
fn parse_body<T>(body: Result<Bytes, BytesRejection>) -> Result<T, AppError>
where
    T: DeserializeOwned + Default,
{
    let bytes = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::invalid_input("Request body too large")
        } else {
            AppError::invalid_input(rejection.body_text())
        }
    })?;

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    serde_json::from_slice(&bytes).map_err(|err| {
        if err.is_data() {
            AppError::invalid_input(err.to_string())
        } else {
            AppError::invalid_input("Invalid JSON")
        }
    })
}

async fn with_store<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    F: FnOnce(&TaskStore) -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    let store: Arc<TaskStore> = Arc::clone(&state.store);
    let outcome = tokio::task::spawn_blocking(move || op(&store))
        .await
        .map_err(|err| AppError::io(format!("store task failed: {err}")))?;
    outcome.map_err(ApiError::from)
}

#[cfg(test)]
mod tests {
    use super::{parse_body, parse_id};
    use axum::body::Bytes;
    use todo_core::{Priority, TaskInput, TaskPatch};

    #[test]
    fn parse_id_rejects_non_numeric() {
        assert_eq!(parse_id("1733011200000").unwrap(), 1_733_011_200_000);
        assert_eq!(parse_id("abc").unwrap_err().code(), "invalid_input");
        assert_eq!(parse_id("-1").unwrap_err().code(), "invalid_input");
    }

    #[test]
    fn empty_body_reads_as_empty_object() {
        let patch: TaskPatch = parse_body(Ok(Bytes::from_static(b"  \n"))).unwrap();
        assert!(patch.is_empty());
    }

    #[test]
    fn malformed_body_is_invalid_json() {
        let err = parse_body::<TaskInput>(Ok(Bytes::from_static(b"{\"text\":"))).unwrap_err();
        assert_eq!(err.message(), "Invalid JSON");
    }

    #[test]
    fn wrongly_typed_body_reports_the_field() {
        let err = parse_body::<TaskInput>(Ok(Bytes::from_static(
            br#"{"text":"x","priority":"urgent"}"#,
        )))
        .unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert!(err.message().contains("urgent"));
    }

    #[test]
    fn well_formed_body_parses() {
        let input: TaskInput = parse_body(Ok(Bytes::from_static(
            br#"{"text":"ship","priority":"high","dueDate":"2024-12-30"}"#,
        )))
        .unwrap();
        assert_eq!(input.priority, Some(Priority::High));
        assert_eq!(input.due_date.unwrap().to_string(), "30/12/2024");
    }
}
