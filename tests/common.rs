#![allow(dead_code)]

use async_trait::async_trait;
use expo_push_gateway::adapters::push::expo::is_expo_push_token;
use expo_push_gateway::adapters::push::{PushError, PushProvider};
use expo_push_gateway::api::{ServiceContainer, app_router};
use expo_push_gateway::config::Config;
use expo_push_gateway::domain::push::{ErrorDetails, Message, Receipt, ReceiptId, Ticket};
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, Once};
use std::time::Duration;

static INIT: Once = Once::new();

pub const REJECTED_TOKEN: &str = "ExponentPushToken[rejected]";

pub fn setup_tracing() {
    INIT.call_once(|| {
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "warn".into())
            .add_directive("expo_push_gateway=debug".parse().unwrap())
            .add_directive("tower=warn".parse().unwrap())
            .add_directive("hyper=warn".parse().unwrap())
            .add_directive("reqwest=warn".parse().unwrap());

        tracing_subscriber::fmt().with_env_filter(filter).init();
    });
}

pub fn get_test_config() -> Config {
    let mut config = Config::default();
    config.server.host = "127.0.0.1".to_string();
    config.server.port = 0;
    config.provider.provider_timeout_secs = 1;
    config
}

/// Provider double: one ok ticket per message with id = running index, receipts from a map.
#[derive(Debug)]
pub struct MockProvider {
    pub message_limit: usize,
    pub receipt_limit: usize,
    pub receipts: HashMap<ReceiptId, Receipt>,
    pub failing_send_calls: HashSet<usize>,
    pub failing_receipt_calls: HashSet<usize>,
    pub hang: bool,
    pub sent: Mutex<Vec<Vec<String>>>,
    pub receipt_calls: Mutex<usize>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self {
            message_limit: 100,
            receipt_limit: 300,
            receipts: HashMap::new(),
            failing_send_calls: HashSet::new(),
            failing_receipt_calls: HashSet::new(),
            hang: false,
            sent: Mutex::new(Vec::new()),
            receipt_calls: Mutex::new(0),
        }
    }
}

impl MockProvider {
    pub fn with_receipts<I>(receipts: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Receipt)>,
    {
        Self {
            receipts: receipts.into_iter().map(|(id, r)| (ReceiptId::from(id), r)).collect(),
            ..Self::default()
        }
    }

    pub fn sent_chunks(&self) -> Vec<Vec<String>> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushProvider for MockProvider {
    fn is_valid_token(&self, token: &str) -> bool {
        is_expo_push_token(token)
    }

    async fn send_batch(&self, messages: &[Message]) -> Result<Vec<Ticket>, PushError> {
        let (call, offset) = {
            let mut sent = self.sent.lock().unwrap();
            let offset: usize = sent.iter().map(Vec::len).sum();
            sent.push(messages.iter().map(|m| m.to.as_str().to_string()).collect());
            (sent.len() - 1, offset)
        };
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing_send_calls.contains(&call) {
            return Err(PushError::Status { status: 503, body: "mock outage".to_string() });
        }

        Ok(messages
            .iter()
            .enumerate()
            .map(|(i, m)| {
                if m.to.as_str() == REJECTED_TOKEN {
                    Ticket::Error {
                        message: "\"ExponentPushToken[rejected]\" is not a registered push notification recipient"
                            .to_string(),
                        details: Some(ErrorDetails {
                            error: Some("DeviceNotRegistered".to_string()),
                            ..ErrorDetails::default()
                        }),
                    }
                } else {
                    Ticket::Ok { id: ReceiptId::new((offset + i).to_string()) }
                }
            })
            .collect())
    }

    async fn get_receipts(&self, ids: &[ReceiptId]) -> Result<HashMap<ReceiptId, Receipt>, PushError> {
        let call = {
            let mut calls = self.receipt_calls.lock().unwrap();
            *calls += 1;
            *calls - 1
        };
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
        if self.failing_receipt_calls.contains(&call) {
            return Err(PushError::Rejected("mock outage".to_string()));
        }
        Ok(ids.iter().filter_map(|id| self.receipts.get(id).map(|r| (id.clone(), r.clone()))).collect())
    }

    fn message_chunk_limit(&self) -> usize {
        self.message_limit
    }

    fn receipt_chunk_limit(&self) -> usize {
        self.receipt_limit
    }
}

pub struct TestApp {
    pub server_url: String,
    pub client: reqwest::Client,
    pub provider: Arc<MockProvider>,
}

impl TestApp {
    pub async fn spawn(provider: MockProvider) -> Self {
        Self::spawn_with_config(get_test_config(), provider).await
    }

    pub async fn spawn_with_config(config: Config, provider: MockProvider) -> Self {
        setup_tracing();

        let provider = Arc::new(provider);
        let services = ServiceContainer::new(Arc::clone(&provider) as Arc<dyn PushProvider>, &config.provider);
        let router = app_router(&config, services);

        let listener = tokio::net::TcpListener::bind(format!("{}:{}", config.server.host, config.server.port))
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        Self { server_url: format!("http://{addr}"), client: reqwest::Client::new(), provider }
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> (reqwest::StatusCode, Value) {
        let resp = self.client.post(format!("{}{}", self.server_url, path)).json(body).send().await.unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    pub async fn post_raw(&self, path: &str, body: &'static str) -> (reqwest::StatusCode, Value) {
        self.post_with_content_type(path, "application/json", body).await
    }

    pub async fn post_with_content_type(
        &self,
        path: &str,
        content_type: &str,
        body: &'static str,
    ) -> (reqwest::StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{}", self.server_url, path))
            .header("Content-Type", content_type)
            .body(body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}
