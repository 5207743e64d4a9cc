//! `GET /users`: the device's user table, passed through unmodified.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::GatewayResult;
use punchgate_core::User;
use punchgate_device::{DeviceConnector, DeviceSession};

#[derive(Debug, Serialize)]
pub struct UsersResponse {
    pub success: bool,
    pub users: Vec<User>,
}

pub async fn list_users<C: DeviceConnector>(
    State(state): State<AppState<C>>,
) -> GatewayResult<Json<UsersResponse>> {
    let users = state
        .manager
        .with_connection(|session| Box::pin(session.get_users()))
        .await?;

    info!(count = users.len(), "Fetched users");

    Ok(Json(UsersResponse {
        success: true,
        users,
    }))
}
