use crate::adapters::push::{PushError, PushProvider};
use crate::config::ProviderConfig;
use crate::domain::push::{Message, Receipt, ReceiptId, Ticket};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

const SEND_PATH: &str = "/--/api/v2/push/send";
const RECEIPTS_PATH: &str = "/--/api/v2/push/getReceipts";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Returns true if the token looks like an Expo push token.
///
/// Accepts `ExponentPushToken[...]`, `ExpoPushToken[...]`, and the bare
/// dashed 8-4-4-4-12 alphanumeric form.
#[must_use]
pub fn is_expo_push_token(token: &str) -> bool {
    let bracketed =
        (token.starts_with("ExponentPushToken[") || token.starts_with("ExpoPushToken[")) && token.ends_with(']');
    bracketed || is_dashed_identifier(token)
}

fn is_dashed_identifier(token: &str) -> bool {
    const GROUPS: [usize; 5] = [8, 4, 4, 4, 12];
    let mut parts = token.split('-');
    GROUPS
        .iter()
        .all(|&len| parts.next().is_some_and(|p| p.len() == len && p.bytes().all(|b| b.is_ascii_alphanumeric())))
        && parts.next().is_none()
}

#[derive(Debug, Deserialize)]
struct ExpoResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ExpoApiError>,
}

#[derive(Debug, Deserialize)]
struct ExpoApiError {
    code: Option<String>,
    #[serde(default)]
    message: String,
}

#[derive(Debug, Serialize)]
struct ReceiptsRequest<'a> {
    ids: &'a [ReceiptId],
}

/// HTTP client for the Expo push service.
#[derive(Clone, Debug)]
pub struct ExpoPushProvider {
    http: reqwest::Client,
    base_url: String,
    access_token: Option<String>,
}

impl ExpoPushProvider {
    /// Builds a client from the provider configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &ProviderConfig) -> anyhow::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(config.provider_connect_timeout_secs.max(1)))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone().filter(|t| !t.trim().is_empty()),
        })
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, PushError>
    where
        B: Serialize + ?Sized + Sync,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(format!("{}{}", self.base_url, path)).json(body);
        if let Some(token) = &self.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<ExpoResponse<T>>(&text) {
            Ok(parsed) => {
                if let Some(first) = parsed.errors.first() {
                    let code = first.code.as_deref().unwrap_or("UNKNOWN");
                    return Err(PushError::Rejected(format!("{code}: {}", first.message)));
                }
                if !status.is_success() {
                    return Err(PushError::Status { status: status.as_u16(), body: truncate(&text) });
                }
                parsed.data.ok_or_else(|| PushError::Decode("response has no data field".to_string()))
            }
            Err(_) if !status.is_success() => {
                Err(PushError::Status { status: status.as_u16(), body: truncate(&text) })
            }
            Err(e) => Err(PushError::Decode(e.to_string())),
        }
    }
}

fn truncate(text: &str) -> String {
    text.chars().take(MAX_ERROR_BODY_CHARS).collect()
}

#[async_trait]
impl PushProvider for ExpoPushProvider {
    fn is_valid_token(&self, token: &str) -> bool {
        is_expo_push_token(token)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(count = messages.len()), err)]
    async fn send_batch(&self, messages: &[Message]) -> Result<Vec<Ticket>, PushError> {
        self.post_json(SEND_PATH, messages).await
    }

    #[tracing::instrument(level = "debug", skip_all, fields(count = ids.len()), err)]
    async fn get_receipts(&self, ids: &[ReceiptId]) -> Result<HashMap<ReceiptId, Receipt>, PushError> {
        self.post_json(RECEIPTS_PATH, &ReceiptsRequest { ids }).await
    }
}
