use crate::domain::push::{NotificationPayload, ReceiptId};
use serde_json::{Map, Value};

pub const CHECK_PARAMS_MESSAGE: &str = "Require correct params.";

/// Parses a request body as JSON. Bodies not sent as `application/json`, empty
/// bodies and malformed ones are all read as `{}`.
#[must_use]
pub fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Value {
    if !content_type.is_some_and(is_json_content_type) {
        tracing::debug!(content_type = ?content_type, "Request body is not JSON, treating it as empty");
        return Value::Object(Map::new());
    }
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Value::Object(Map::new());
    }
    serde_json::from_slice(bytes).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "Request body is not valid JSON, treating it as empty");
        Value::Object(Map::new())
    })
}

/// Matches `application/json`, with or without parameters such as `charset`.
fn is_json_content_type(content_type: &str) -> bool {
    content_type.split(';').next().is_some_and(|essence| essence.trim().eq_ignore_ascii_case("application/json"))
}

/// A field counts as supplied when it is present and not null, `false`, `0` or `""`.
fn is_supplied(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Array(_) | Value::Object(_) | Value::Bool(true)) => true,
    }
}

#[derive(Debug)]
pub struct SendRequest {
    pub push_tokens: Vec<String>,
    pub payload: NotificationPayload,
}

impl SendRequest {
    /// Extracts `{pushTokens, title, content, data}` from a parsed body.
    ///
    /// # Errors
    /// Returns the JSON text of the body when a field is missing or has the wrong shape.
    pub fn from_body(body: &Value) -> Result<Self, String> {
        let echo = || serde_json::to_string(body).unwrap_or_default();

        let fields = ["pushTokens", "title", "content", "data"];
        if !fields.iter().all(|f| is_supplied(body.get(f))) {
            return Err(echo());
        }

        let (Some(Value::Array(raw_tokens)), Some(Value::String(title)), Some(Value::String(content))) =
            (body.get("pushTokens"), body.get("title"), body.get("content"))
        else {
            return Err(echo());
        };

        let push_tokens = raw_tokens
            .iter()
            .filter_map(|t| {
                if let Value::String(s) = t {
                    Some(s.clone())
                } else {
                    tracing::warn!(token = %t, "Push token is not a string, skipping");
                    None
                }
            })
            .collect();

        Ok(Self {
            push_tokens,
            payload: NotificationPayload {
                title: title.clone(),
                body: content.clone(),
                data: body.get("data").cloned().unwrap_or(Value::Null),
            },
        })
    }
}

#[derive(Debug)]
pub struct CheckRequest {
    pub ids: Vec<ReceiptId>,
}

impl CheckRequest {
    /// Extracts `{ids}` from a parsed body. Numeric ids are taken as their decimal text.
    ///
    /// # Errors
    /// Returns the fixed parameter error when `ids` is missing, not an array, or holds
    /// something other than strings and numbers.
    pub fn from_body(body: &Value) -> Result<Self, String> {
        let Some(Value::Array(raw_ids)) = body.get("ids") else {
            return Err(CHECK_PARAMS_MESSAGE.to_string());
        };

        let ids = raw_ids
            .iter()
            .map(|id| match id {
                Value::String(s) => Some(ReceiptId::new(s.clone())),
                Value::Number(n) => Some(ReceiptId::new(n.to_string())),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| CHECK_PARAMS_MESSAGE.to_string())?;

        Ok(Self { ids })
    }
}
