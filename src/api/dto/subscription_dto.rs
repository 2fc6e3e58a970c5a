//! Subscription inspection DTOs.

use serde::{Deserialize, Serialize};

use crate::domain::SubscriberRecord;

/// Query parameters for `GET /api/v1/subscriptions`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListSubscriptionsParams {
    /// Only return subscriptions on this exact topic.
    #[serde(default)]
    pub topic: Option<String>,
}

/// Response body for `GET /api/v1/subscriptions`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionListResponse {
    /// Matching subscriptions, oldest first.
    pub data: Vec<SubscriberRecord>,
    /// Number of entries in `data`.
    pub total: usize,
}
