use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{TaskList, TaskListDetails, TaskListNameRequest};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    /// Include completed tasks too; by default only open ones come back.
    #[serde(default, rename = "allTasks")]
    all_tasks: bool,
}

pub async fn get_task_lists(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<TaskList>>, AppError> {
    let lists = db::task_lists::get_task_lists(&state.db, &user.id).await?;
    Ok(Json(lists))
}

pub async fn create_task_list(
    State(state): State<AppState>,
    user: AuthUser,
    Json(body): Json<TaskListNameRequest>,
) -> Result<impl IntoResponse, AppError> {
    let list = db::task_lists::create_task_list(&state.db, &user.id, &body.name)
        .await?
        .ok_or(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/task-lists/{}", list.id))],
    ))
}

/// Fetch the list and verify the principal owns it; distinguishes
/// NotFound from Forbidden for the caller.
async fn owned_details(
    state: &AppState,
    user: &AuthUser,
    task_list_id: &str,
) -> Result<TaskListDetails, AppError> {
    let details = db::task_lists::get_task_list_details(&state.db, task_list_id)
        .await?
        .ok_or(AppError::NotFound)?;
    if details.account_id != user.id {
        return Err(AppError::Forbidden);
    }
    Ok(details)
}

pub async fn get_task_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_list_id): Path<String>,
    Query(query): Query<TaskListQuery>,
) -> Result<Json<TaskListDetails>, AppError> {
    let mut details = owned_details(&state, &user, &task_list_id).await?;
    if !query.all_tasks {
        details.tasks.retain(|task| task.completed.is_none());
    }
    Ok(Json(details))
}

pub async fn update_task_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_list_id): Path<String>,
    Json(body): Json<TaskListNameRequest>,
) -> Result<Json<TaskList>, AppError> {
    owned_details(&state, &user, &task_list_id).await?;

    let list = db::task_lists::rename_task_list(&state.db, &task_list_id, &body.name)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(list))
}

pub async fn delete_task_list(
    State(state): State<AppState>,
    user: AuthUser,
    Path(task_list_id): Path<String>,
) -> Result<StatusCode, AppError> {
    // Delete of a missing list is idempotent success, not NotFound.
    match owned_details(&state, &user, &task_list_id).await {
        Ok(_) => {
            db::task_lists::delete_task_list(&state.db, &state.store, &task_list_id).await?;
            Ok(StatusCode::NO_CONTENT)
        }
        Err(AppError::NotFound) => Ok(StatusCode::NO_CONTENT),
        Err(err) => Err(err),
    }
}
