//! Data models for the subscribers domain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use validator::Validate;

/// Lowercase and trim an address so lookups and uniqueness are case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A subscriber eligible (when `active`) to receive the daily broadcast.
///
/// Records are never deleted; unsubscribing flips `active` to false.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub id: i64,
    pub name: String,
    /// Always stored lowercase.
    pub email: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// Input for registering a new subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewRecipient {
    #[validate(length(min = 1, max = 100, message = "name must be 1-100 characters"))]
    pub name: String,
    #[validate(email(message = "a valid email is required"))]
    pub email: String,
}

impl NewRecipient {
    /// Build an input with the name trimmed and the email normalized.
    pub fn new(name: impl AsRef<str>, email: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().trim().to_string(),
            email: normalize_email(email.as_ref()),
        }
    }
}

/// Outcome recorded for one delivery attempt.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DeliveryStatus {
    /// The transport accepted the message.
    Ok,
    /// The transport rejected the message or could not be reached.
    Error,
}

/// Immutable record of one send attempt for one recipient in one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLogEntry {
    pub id: i64,
    pub recipient_id: i64,
    pub sent_at: DateTime<Utc>,
    pub status: DeliveryStatus,
    pub info: String,
}

/// Delivery log entry joined with the recipient it was addressed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryLogView {
    pub id: i64,
    pub recipient_id: i64,
    pub name: String,
    pub email: String,
    pub status: DeliveryStatus,
    pub info: String,
    pub sent_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ana.Silva@Example.COM "), "ana.silva@example.com");
    }

    #[test]
    fn test_new_recipient_trims_and_normalizes() {
        let input = NewRecipient::new("  Ana ", "ANA@X.COM");
        assert_eq!(input.name, "Ana");
        assert_eq!(input.email, "ana@x.com");
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_new_recipient_validation() {
        assert!(NewRecipient::new("   ", "ana@x.com").validate().is_err());
        assert!(NewRecipient::new("Ana", "not-an-email").validate().is_err());
        assert!(NewRecipient::new("a".repeat(101), "ana@x.com").validate().is_err());
    }

    #[test]
    fn test_delivery_status_strings() {
        assert_eq!(DeliveryStatus::Ok.to_string(), "ok");
        assert_eq!(DeliveryStatus::Error.as_ref(), "error");
        assert_eq!("error".parse::<DeliveryStatus>().unwrap(), DeliveryStatus::Error);
        assert!("queued".parse::<DeliveryStatus>().is_err());
    }
}
