use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// An opaque device address accepted by the push provider.
///
/// Only constructed after the provider's grammar check has passed, so holding a
/// `PushToken` means the token is sendable.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PushToken(String);

impl PushToken {
    pub(crate) const fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PushToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Content fanned out to every valid token of a send request.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    pub data: Value,
}

/// One token paired with the shared payload; the unit submitted to the provider.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Message {
    pub to: PushToken,
    pub title: String,
    pub body: String,
    pub data: Value,
}

impl Message {
    #[must_use]
    pub fn new(to: PushToken, payload: &NotificationPayload) -> Self {
        Self { to, title: payload.title.clone(), body: payload.body.clone(), data: payload.data.clone() }
    }
}

/// Structured error attached to a ticket or receipt.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Provider acknowledgment for one submitted message.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Ticket {
    Ok {
        id: ReceiptId,
    },
    Error {
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<ErrorDetails>,
    },
}

impl Ticket {
    #[must_use]
    pub const fn receipt_id(&self) -> Option<&ReceiptId> {
        match self {
            Self::Ok { id } => Some(id),
            Self::Error { .. } => None,
        }
    }

    #[must_use]
    pub fn error_code(&self) -> Option<&str> {
        match self {
            Self::Ok { .. } => None,
            Self::Error { details, .. } => details.as_ref().and_then(|d| d.error.as_deref()),
        }
    }
}

/// Identifier used to look up the delivery receipt of a ticket.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(String);

impl ReceiptId {
    #[must_use]
    pub const fn new(id: String) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ReceiptId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReceiptStatus {
    Ok,
    Error,
    #[serde(other)]
    Unknown,
}

/// Final delivery outcome reported by the provider for one receipt id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    pub status: ReceiptStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

impl Receipt {
    #[must_use]
    pub const fn ok() -> Self {
        Self { status: ReceiptStatus::Ok, message: None, details: None }
    }

    #[must_use]
    pub fn error(message: Option<&str>, code: Option<&str>) -> Self {
        Self {
            status: ReceiptStatus::Error,
            message: message.map(str::to_string),
            details: code.map(|c| ErrorDetails { error: Some(c.to_string()), extra: Map::new() }),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OutcomeStatus {
    Ok,
    Error,
}

/// Classified receipt as reported back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReceiptOutcome {
    pub id: ReceiptId,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ReceiptOutcome {
    #[must_use]
    pub const fn ok(id: ReceiptId) -> Self {
        Self { id, status: OutcomeStatus::Ok, detail: None }
    }

    #[must_use]
    pub const fn error(id: ReceiptId, detail: Option<String>) -> Self {
        Self { id, status: OutcomeStatus::Error, detail }
    }
}
