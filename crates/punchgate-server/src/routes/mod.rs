//! HTTP routes.
//!
//! | Method | Path      | Handler                 |
//! |--------|-----------|-------------------------|
//! | GET    | `/users`  | [`users::list_users`]   |
//! | GET    | `/logs`   | [`logs::list_logs`]     |
//! | GET    | `/health` | [`health::health_check`] |

pub mod health;
pub mod logs;
pub mod users;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::manager::ConnectionManager;
use punchgate_device::DeviceConnector;

/// Shared handler state.
pub struct AppState<C: DeviceConnector> {
    pub manager: Arc<ConnectionManager<C>>,
}

impl<C: DeviceConnector> AppState<C> {
    pub fn new(manager: Arc<ConnectionManager<C>>) -> Self {
        Self { manager }
    }
}

impl<C: DeviceConnector> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
        }
    }
}

/// Device-backed API routes.
pub fn api_router<C: DeviceConnector>(state: AppState<C>) -> Router {
    Router::new()
        .route("/users", get(users::list_users::<C>))
        .route("/logs", get(logs::list_logs::<C>))
        .with_state(state)
}

/// Complete application: API routes, health check, CORS and request tracing.
pub fn app<C: DeviceConnector>(manager: Arc<ConnectionManager<C>>) -> Router {
    api_router(AppState::new(manager))
        .merge(health::router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
