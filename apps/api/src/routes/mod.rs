pub mod health;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::handlers as auth;
use crate::session::handlers as session;
use crate::state::AppState;

/// Routes shared by the `/api` and `/api/v1` prefixes.
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/login/register", post(auth::handle_register))
        .route("/login/token", post(auth::handle_login))
        .route("/login/me", get(auth::handle_me))
        .route("/session/new", get(session::handle_new_session))
        .route("/session/get/:session_id", get(session::handle_get_session))
        .route("/session/list", get(session::handle_list_sessions))
        .route("/session/delete", get(session::handle_delete_session))
        .route(
            "/session/history/:session_id",
            get(session::handle_session_history),
        )
        .route("/session/ask", get(session::handle_ask))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http())
        // Added after the trace layer so health probes are not traced.
        .route("/api/healthy", get(health::health_handler))
        .with_state(state)
}
