//! Content CRUD handlers. Everything but `/ping` requires [`RequireAdmin`].

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::AdminState;
use super::auth::RequireAdmin;
use super::error::AdminResult;
use crate::bot::dispatcher::PING_REPLY;
use crate::content::{
    ContactContent, ContactContentUpdate, NewPortfolioEntry, NewReview, PortfolioEntry, Review,
    StartContent, StartContentUpdate, UserPage, WizardConfig, WizardConfigPatch,
};

#[derive(Debug, Serialize)]
pub(super) struct DeleteResponse {
    success: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct UserQuery {
    skip: Option<u32>,
    take: Option<u32>,
}

// ── Health ──────────────────────────────────────────────────────────────

pub(super) async fn ping() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "message": PING_REPLY }))
}

// ── Start / contacts ────────────────────────────────────────────────────

pub(super) async fn get_start(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
) -> AdminResult<Json<Option<StartContent>>> {
    Ok(Json(state.db.get_start().await?))
}

pub(super) async fn update_start(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Json(body): Json<StartContentUpdate>,
) -> AdminResult<Json<StartContent>> {
    Ok(Json(state.db.update_start(body).await?))
}

pub(super) async fn get_contacts(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
) -> AdminResult<Json<Option<ContactContent>>> {
    Ok(Json(state.db.get_contact().await?))
}

pub(super) async fn update_contacts(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Json(body): Json<ContactContentUpdate>,
) -> AdminResult<Json<ContactContent>> {
    Ok(Json(state.db.update_contact(body).await?))
}

// ── Reviews ─────────────────────────────────────────────────────────────

pub(super) async fn list_comments(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
) -> AdminResult<Json<Vec<Review>>> {
    Ok(Json(state.db.list_reviews().await?))
}

pub(super) async fn create_comment(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Json(body): Json<NewReview>,
) -> AdminResult<Json<Review>> {
    let review = state.db.create_review(&body).await?;
    info!(id = review.id, "Review created");
    Ok(Json(review))
}

pub(super) async fn delete_comment(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> AdminResult<Json<DeleteResponse>> {
    let success = state.db.delete_review(id).await?;
    info!(id, success, "Review delete");
    Ok(Json(DeleteResponse { success }))
}

// ── Portfolio ───────────────────────────────────────────────────────────

pub(super) async fn list_portfolios(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
) -> AdminResult<Json<Vec<PortfolioEntry>>> {
    Ok(Json(state.db.list_portfolio().await?))
}

pub(super) async fn create_portfolio(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Json(body): Json<NewPortfolioEntry>,
) -> AdminResult<Json<PortfolioEntry>> {
    let entry = state.db.create_portfolio_entry(&body).await?;
    info!(id = entry.id, "Portfolio entry created");
    Ok(Json(entry))
}

pub(super) async fn delete_portfolio(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Path(id): Path<i64>,
) -> AdminResult<Json<DeleteResponse>> {
    let success = state.db.delete_portfolio_entry(id).await?;
    info!(id, success, "Portfolio entry delete");
    Ok(Json(DeleteResponse { success }))
}

// ── Users ───────────────────────────────────────────────────────────────

pub(super) async fn list_users(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Query(query): Query<UserQuery>,
) -> AdminResult<Json<UserPage>> {
    Ok(Json(state.db.list_users(query.skip, query.take).await?))
}

// ── Wizard config ───────────────────────────────────────────────────────

pub(super) async fn get_calculate(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
) -> AdminResult<Json<Option<WizardConfig>>> {
    Ok(Json(state.db.get_wizard_config().await?))
}

pub(super) async fn update_calculate(
    _admin: RequireAdmin,
    State(state): State<AdminState>,
    Json(patch): Json<WizardConfigPatch>,
) -> AdminResult<Json<WizardConfig>> {
    Ok(Json(state.db.update_wizard_config(patch).await?))
}
