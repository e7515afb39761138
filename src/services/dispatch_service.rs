use crate::adapters::push::{PushError, PushProvider};
use crate::domain::push::{Message, NotificationPayload, PushToken, Ticket};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::timeout;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Push provider unavailable: {0}")]
    ProviderUnavailable(#[source] PushError),
    #[error("Push provider did not answer within {0:?}")]
    Timeout(Duration),
    #[error("Push provider returned {actual} tickets for {expected} messages")]
    TicketMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Debug)]
struct Metrics {
    sent: Counter<u64>,
    invalid_tokens: Counter<u64>,
    ticket_errors: Counter<u64>,
    provider_failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("expo-push-gateway");
        Self {
            sent: meter
                .u64_counter("push_messages_sent_total")
                .with_description("Total number of messages accepted by the push provider")
                .build(),
            invalid_tokens: meter
                .u64_counter("push_invalid_tokens_total")
                .with_description("Total number of tokens dropped for failing the provider's token grammar")
                .build(),
            ticket_errors: meter
                .u64_counter("push_ticket_errors_total")
                .with_description("Total number of tickets reporting an immediate delivery error")
                .build(),
            provider_failures: meter
                .u64_counter("push_provider_failures_total")
                .with_description("Total number of failed calls to the push provider")
                .build(),
        }
    }
}

/// Fans a notification out to a set of tokens, one provider-sized chunk at a time.
#[derive(Clone, Debug)]
pub struct DispatchService {
    provider: Arc<dyn PushProvider>,
    call_timeout: Duration,
    metrics: Metrics,
}

impl DispatchService {
    #[must_use]
    pub fn new(provider: Arc<dyn PushProvider>, call_timeout: Duration) -> Self {
        Self { provider, call_timeout, metrics: Metrics::new() }
    }

    /// Builds one message per token that passes the provider's grammar check.
    /// Invalid tokens are logged and skipped.
    pub fn build_messages(&self, tokens: &[String], payload: &NotificationPayload) -> Vec<Message> {
        let mut messages = Vec::with_capacity(tokens.len());
        for token in tokens {
            if !self.provider.is_valid_token(token) {
                tracing::warn!(token = %token, "Push token is not a valid Expo push token, skipping");
                self.metrics.invalid_tokens.add(1, &[]);
                continue;
            }
            messages.push(Message::new(PushToken::new_unchecked(token.clone()), payload));
        }
        messages
    }

    /// Sends `payload` to every valid token and returns the tickets of all chunks in
    /// submission order.
    ///
    /// # Errors
    /// Returns a `DispatchError` as soon as any chunk fails; tickets of earlier chunks
    /// are discarded.
    #[tracing::instrument(skip_all, fields(tokens = tokens.len()), err)]
    pub async fn send(&self, tokens: &[String], payload: &NotificationPayload) -> Result<Vec<Ticket>, DispatchError> {
        let messages = self.build_messages(tokens, payload);
        let limit = self.provider.message_chunk_limit().max(1);
        let mut tickets = Vec::with_capacity(messages.len());

        // Chunks go out strictly one after another to spread the load on the provider.
        // Every chunk is aggregated, not only the first one.
        for (index, chunk) in messages.chunks(limit).enumerate() {
            let chunk_tickets = self.send_chunk(index, chunk).await?;
            tickets.extend(chunk_tickets);
        }

        tracing::info!(messages = messages.len(), tickets = tickets.len(), "Dispatch completed");
        Ok(tickets)
    }

    async fn send_chunk(&self, index: usize, chunk: &[Message]) -> Result<Vec<Ticket>, DispatchError> {
        let tickets = match timeout(self.call_timeout, self.provider.send_batch(chunk)).await {
            Ok(Ok(tickets)) => tickets,
            Ok(Err(e)) => {
                tracing::error!(error = %e, chunk = index, "Failed to send push notification chunk");
                self.metrics.provider_failures.add(1, &[KeyValue::new("operation", "send")]);
                return Err(DispatchError::ProviderUnavailable(e));
            }
            Err(_) => {
                tracing::error!(chunk = index, timeout = ?self.call_timeout, "Push provider send timed out");
                self.metrics.provider_failures.add(1, &[KeyValue::new("operation", "send")]);
                return Err(DispatchError::Timeout(self.call_timeout));
            }
        };

        if tickets.len() != chunk.len() {
            tracing::error!(expected = chunk.len(), actual = tickets.len(), chunk = index, "Ticket count mismatch");
            self.metrics.provider_failures.add(1, &[KeyValue::new("operation", "send")]);
            return Err(DispatchError::TicketMismatch { expected: chunk.len(), actual: tickets.len() });
        }

        for (message, ticket) in chunk.iter().zip(&tickets) {
            if let Ticket::Error { message: reason, .. } = ticket {
                tracing::warn!(
                    token = %message.to,
                    error_code = ticket.error_code().unwrap_or("unknown"),
                    reason = %reason,
                    "Push provider rejected message"
                );
                self.metrics.ticket_errors.add(1, &[]);
            }
        }
        self.metrics.sent.add(chunk.len() as u64, &[]);

        Ok(tickets)
    }
}
