/*
 * Responsibility
 * - POST / の response DTO
 */
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::services::auth::UserId;

/// Local date-time with millisecond precision, e.g. `2024-05-01T09:30:15.042`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginMessage {
    pub message: String,
}

impl LoginMessage {
    pub fn for_user(uid: &UserId, at: NaiveDateTime) -> Self {
        Self {
            message: format!(
                "Successfully authentication for {} at {}",
                uid,
                at.format(TIMESTAMP_FORMAT)
            ),
        }
    }
}
