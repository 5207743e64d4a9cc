//! `GET /logs`: the attendance log, filtered by date range and user.
//!
//! Query parameters are validated before the device is contacted; the full
//! table is then fetched and narrowed in memory, keeping device order.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use serde::Serialize;
use tracing::info;

use super::AppState;
use crate::error::GatewayResult;
use crate::filter::{LogFilter, LogQuery};
use punchgate_core::LogRecord;
use punchgate_device::{DeviceConnector, DeviceSession};

#[derive(Debug, Serialize)]
pub struct LogsResponse {
    pub success: bool,
    pub logs: Vec<LogRecord>,
}

pub async fn list_logs<C: DeviceConnector>(
    State(state): State<AppState<C>>,
    query: Result<Query<LogQuery>, QueryRejection>,
) -> GatewayResult<Json<LogsResponse>> {
    let Query(query) = query?;
    let filter = LogFilter::from_query(&query)?;

    let records = state
        .manager
        .with_connection(|session| Box::pin(session.get_attendances()))
        .await?;

    let total = records.len();
    let logs = filter.apply(records);
    info!(total, matched = logs.len(), "Fetched attendance logs");

    Ok(Json(LogsResponse {
        success: true,
        logs,
    }))
}
