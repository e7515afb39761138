use crate::domain::push::{Message, Receipt, ReceiptId, Ticket};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

pub mod expo;

/// Maximum number of messages the Expo service accepts in one send call.
pub const MESSAGE_CHUNK_LIMIT: usize = 100;
/// Maximum number of receipt ids the Expo service accepts in one lookup.
pub const RECEIPT_CHUNK_LIMIT: usize = 300;

#[derive(Error, Debug)]
pub enum PushError {
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Provider responded with status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Provider rejected the request: {0}")]
    Rejected(String),
    #[error("Malformed provider response: {0}")]
    Decode(String),
}

#[async_trait]
pub trait PushProvider: Send + Sync + std::fmt::Debug {
    /// Checks a raw token against the provider's token grammar.
    fn is_valid_token(&self, token: &str) -> bool;

    /// Submits one chunk of messages. Tickets are returned in submission order.
    ///
    /// # Errors
    /// Returns a `PushError` if the call itself fails; per-message failures are
    /// reported as `Ticket::Error` entries instead.
    async fn send_batch(&self, messages: &[Message]) -> Result<Vec<Ticket>, PushError>;

    /// Fetches the receipts for one chunk of ids. Ids the provider does not know
    /// yet are simply absent from the map.
    ///
    /// # Errors
    /// Returns a `PushError` if the call itself fails.
    async fn get_receipts(&self, ids: &[ReceiptId]) -> Result<HashMap<ReceiptId, Receipt>, PushError>;

    fn message_chunk_limit(&self) -> usize {
        MESSAGE_CHUNK_LIMIT
    }

    fn receipt_chunk_limit(&self) -> usize {
        RECEIPT_CHUNK_LIMIT
    }
}
