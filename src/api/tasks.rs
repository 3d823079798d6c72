use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Task, TaskInput, UploadFileRequest};
use crate::state::AppState;

/// Verify the task exists and belongs to the principal. A missing task is
/// NotFound here; the idempotent task delete maps that back to success.
async fn require_access(state: &AppState, user: &AuthUser, task_id: &str) -> Result<(), AppError> {
    let check = db::tasks::check_access(&state.db, &user.id, task_id).await?;
    if !check.exists {
        return Err(AppError::NotFound);
    }
    if !check.access {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Verify the task list exists and belongs to the principal.
async fn require_list(
    state: &AppState,
    user: &AuthUser,
    task_list_id: &str,
) -> Result<(), AppError> {
    let details = db::task_lists::get_task_list_details(&state.db, task_list_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if details.account_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_list_id): Path<String>,
    Json(body): Json<TaskInput>,
) -> Result<impl IntoResponse, AppError> {
    require_list(&state, &user, &task_list_id).await?;

    let task = db::tasks::create_task(&state.db, &task_list_id, &body).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn get_tasks(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_list_id): Path<String>,
) -> Result<Json<Vec<Task>>, AppError> {
    require_list(&state, &user, &task_list_id).await?;

    let tasks = db::tasks::get_tasks(&state.db, &task_list_id).await?;
    Ok(Json(tasks))
}

pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<TaskInput>,
) -> Result<Json<Task>, AppError> {
    require_access(&state, &user, &task_id).await?;

    let task = db::tasks::set_task(&state.db, &task_id, &body)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
) -> Result<StatusCode, AppError> {
    match require_access(&state, &user, &task_id).await {
        Ok(()) => {
            db::tasks::delete_task(&state.db, &state.store, &task_id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
        // Already gone: the delete is a successful no-op.
        Err(AppError::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(err),
    }
}

pub async fn upload_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_id): Path<String>,
    Json(body): Json<UploadFileRequest>,
) -> Result<impl IntoResponse, AppError> {
    require_access(&state, &user, &task_id).await?;

    let content = BASE64
        .decode(&body.content)
        .map_err(|_| AppError::BadRequest("File content must be base64".to_string()))?;

    let file = db::files::save_file(&state.db, &state.store, &task_id, &body.name, &content)
        .await?
        .ok_or(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        [(
            header::LOCATION,
            format!("/tasks/{task_id}/files/{}", file.id),
        )],
    ))
}

pub async fn get_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, file_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    require_access(&state, &user, &task_id).await?;

    let file = db::files::get_file(&state.db, &file_id)
        .await?
        .filter(|file| file.task_id == task_id)
        .ok_or(AppError::NotFound)?;

    let content = tokio::fs::read(&file.file_path).await?;
    Ok((
        [(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", file.name),
        )],
        content,
    ))
}

pub async fn delete_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path((task_id, file_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    require_access(&state, &user, &task_id).await?;

    // A file under a different task is not addressable at this path, so
    // the delete is a successful no-op just like a missing file.
    let owned = db::files::get_file(&state.db, &file_id)
        .await?
        .is_some_and(|file| file.task_id == task_id);
    if owned {
        db::files::delete_file(&state.db, &state.store, &file_id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
