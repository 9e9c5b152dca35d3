//! Subscriber entity

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{Email, SubscriptionTier, UserId};

/// Account enrolled in scheduled re-snapshots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    pub id: Uuid,
    pub auth_user_id: UserId,
    pub email: Email,
    pub tier: SubscriptionTier,
}
