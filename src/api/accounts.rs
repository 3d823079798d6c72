use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;

use crate::auth::AuthUser;
use crate::db;
use crate::error::AppError;
use crate::models::{Account, Credentials, UpdateAccountRequest};
use crate::state::AppState;

pub async fn create_account(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<impl IntoResponse, AppError> {
    if db::accounts::get_account(&state.db, &body.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "Username '{}' is already taken",
            body.username
        )));
    }

    let account = db::accounts::create_account(&state.db, &body.username, &body.password)
        .await?
        .ok_or(AppError::Internal)?;

    Ok((
        StatusCode::CREATED,
        [(header::LOCATION, format!("/accounts/{}", account.id))],
    ))
}

/// Account routes are self-service only: the path username must match the
/// authenticated principal.
fn require_self(user: &AuthUser, username: &str) -> Result<(), AppError> {
    if user.username == username {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub async fn get_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<Json<Account>, AppError> {
    require_self(&user, &username)?;

    let account = db::accounts::get_account(&state.db, &username)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(account))
}

pub async fn update_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
    Json(body): Json<UpdateAccountRequest>,
) -> Result<Json<Account>, AppError> {
    require_self(&user, &username)?;

    let account = db::accounts::update_account(&state.db, &username, &body)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(account))
}

pub async fn delete_account(
    State(state): State<AppState>,
    user: AuthUser,
    Path(username): Path<String>,
) -> Result<StatusCode, AppError> {
    require_self(&user, &username)?;

    db::accounts::delete_account(&state.db, &state.store, &username).await?;
    Ok(StatusCode::NO_CONTENT)
}
