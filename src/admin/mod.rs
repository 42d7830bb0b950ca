//! Admin HTTP API for editing bot content.

pub mod auth;
pub mod error;
mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{delete, get, post};
use tower_http::cors::CorsLayer;

use crate::config::AdminAuthConfig;
use crate::store::Database;

pub use auth::RequireAdmin;
pub use error::AdminError;

/// State shared across admin handlers.
#[derive(Clone)]
pub struct AdminState {
    pub db: Arc<dyn Database>,
    pub auth: Arc<AdminAuthConfig>,
}

/// Build the admin router.
pub fn admin_routes(db: Arc<dyn Database>, auth: AdminAuthConfig) -> Router {
    let state = AdminState {
        db,
        auth: Arc::new(auth),
    };

    Router::new()
        .route("/ping", get(routes::ping))
        .route("/auth/login", post(auth::login))
        .route("/start", get(routes::get_start).post(routes::update_start))
        .route(
            "/contacts",
            get(routes::get_contacts).post(routes::update_contacts),
        )
        .route(
            "/comments",
            get(routes::list_comments).post(routes::create_comment),
        )
        .route("/comments/{id}", delete(routes::delete_comment))
        .route(
            "/portfolios",
            get(routes::list_portfolios).post(routes::create_portfolio),
        )
        .route("/portfolios/{id}", delete(routes::delete_portfolio))
        .route("/users", get(routes::list_users))
        .route(
            "/calculate",
            get(routes::get_calculate).post(routes::update_calculate),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}
