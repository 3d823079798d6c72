use axum::Json;
use axum::extract::State;

use crate::auth;
use crate::db;
use crate::error::AppError;
use crate::models::Credentials;
use crate::state::AppState;

/// Exchange credentials for a bearer token. Bad credentials and unknown
/// usernames are indistinguishable to the caller.
pub async fn authenticate(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> Result<String, AppError> {
    let account = db::accounts::authenticate(&state.db, &body.username, &body.password)
        .await?
        .ok_or(AppError::Unauthorized)?;

    auth::issue_token(&account, &state.config.jwt)
}
