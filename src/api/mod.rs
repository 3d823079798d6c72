mod accounts;
mod authn;
mod task_lists;
mod tasks;

use axum::routing::{get, post, put};
use axum::{Router, extract::State, http::StatusCode};

use crate::error::AppError;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/authn", post(authn::authenticate))
        .route("/accounts", post(accounts::create_account))
        .route(
            "/accounts/{username}",
            get(accounts::get_account)
                .put(accounts::update_account)
                .delete(accounts::delete_account),
        )
        .route(
            "/task-lists",
            get(task_lists::get_task_lists).post(task_lists::create_task_list),
        )
        .route(
            "/task-lists/{task_list_id}",
            get(task_lists::get_task_list)
                .put(task_lists::update_task_list)
                .delete(task_lists::delete_task_list),
        )
        .route(
            "/task-lists/{task_list_id}/tasks",
            get(tasks::get_tasks).post(tasks::create_task),
        )
        .route(
            "/tasks/{task_id}",
            put(tasks::update_task).delete(tasks::delete_task),
        )
        .route("/tasks/{task_id}/files", post(tasks::upload_file))
        .route(
            "/tasks/{task_id}/files/{file_id}",
            get(tasks::get_file).delete(tasks::delete_file),
        )
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    sqlx::query("select 1").execute(&state.db).await?;
    Ok(StatusCode::OK)
}
