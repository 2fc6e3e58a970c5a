//! Read-only subscription inspection handlers: list, get.

use axum::extract::{Path, Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{ListSubscriptionsParams, SubscriptionListResponse};
use crate::app_state::AppState;
use crate::domain::SubscriptionId;
use crate::error::GatewayError;

/// `GET /subscriptions` — List live subscriptions, optionally by topic.
pub async fn list_subscriptions(
    State(state): State<AppState>,
    Query(params): Query<ListSubscriptionsParams>,
) -> impl IntoResponse {
    let data = state
        .dispatcher
        .registry()
        .list(params.topic.as_deref())
        .await;
    let total = data.len();
    Json(SubscriptionListResponse { data, total })
}

/// `GET /subscriptions/{id}` — Get one live subscription.
///
/// # Errors
///
/// Returns [`GatewayError::SubscriptionNotFound`] if no live subscription
/// has the given id.
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let subscription_id = SubscriptionId::from_uuid(id);
    let record = state
        .dispatcher
        .registry()
        .get(subscription_id)
        .await
        .ok_or(GatewayError::SubscriptionNotFound(subscription_id))?;
    Ok(Json(record))
}

/// Subscription routes, mounted under `/api/v1`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/subscriptions", get(list_subscriptions))
        .route("/subscriptions/{id}", get(get_subscription))
}
