use crate::adapters::push::PushProvider;
use crate::domain::push::{Receipt, ReceiptId, ReceiptOutcome, ReceiptStatus};
use opentelemetry::{KeyValue, global, metrics::Counter};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

#[derive(Clone, Debug)]
struct Metrics {
    receipts: Counter<u64>,
    provider_failures: Counter<u64>,
}

impl Metrics {
    fn new() -> Self {
        let meter = global::meter("expo-push-gateway");
        Self {
            receipts: meter
                .u64_counter("push_receipts_total")
                .with_description("Total number of receipts returned by the push provider, by status")
                .build(),
            provider_failures: meter
                .u64_counter("push_provider_failures_total")
                .with_description("Total number of failed calls to the push provider")
                .build(),
        }
    }
}

/// Looks up delivery receipts and classifies them into outcomes.
#[derive(Clone, Debug)]
pub struct ReceiptService {
    provider: Arc<dyn PushProvider>,
    call_timeout: Duration,
    metrics: Metrics,
}

impl ReceiptService {
    #[must_use]
    pub fn new(provider: Arc<dyn PushProvider>, call_timeout: Duration) -> Self {
        Self { provider, call_timeout, metrics: Metrics::new() }
    }

    /// Fetches receipts for `ids` chunk by chunk and returns the outcomes in request order.
    ///
    /// A failing chunk is logged and skipped; outcomes from the other chunks are kept.
    /// Ids the provider has no receipt for yet produce no outcome. A repeated id is
    /// looked up and reported once, at its first position.
    #[tracing::instrument(skip_all, fields(ids = ids.len()))]
    pub async fn check(&self, ids: &[ReceiptId]) -> Vec<ReceiptOutcome> {
        let limit = self.provider.receipt_chunk_limit().max(1);
        let mut seen = HashSet::with_capacity(ids.len());
        let unique: Vec<ReceiptId> = ids.iter().filter(|id| seen.insert(*id)).cloned().collect();
        let mut outcomes = Vec::with_capacity(unique.len());

        // One lookup in flight at a time, same throttling as the send path.
        for (index, chunk) in unique.chunks(limit).enumerate() {
            let Some(receipts) = self.fetch_chunk(index, chunk).await else {
                continue;
            };

            for id in chunk {
                if let Some(receipt) = receipts.get(id) {
                    self.record(receipt);
                    classify(id, receipt, &mut outcomes);
                }
            }
        }

        outcomes
    }

    async fn fetch_chunk(&self, index: usize, chunk: &[ReceiptId]) -> Option<HashMap<ReceiptId, Receipt>> {
        match timeout(self.call_timeout, self.provider.get_receipts(chunk)).await {
            Ok(Ok(receipts)) => Some(receipts),
            Ok(Err(e)) => {
                tracing::error!(error = %e, chunk = index, "Failed to fetch push receipts");
                self.metrics.provider_failures.add(1, &[KeyValue::new("operation", "get_receipts")]);
                None
            }
            Err(_) => {
                tracing::error!(chunk = index, timeout = ?self.call_timeout, "Push receipt lookup timed out");
                self.metrics.provider_failures.add(1, &[KeyValue::new("operation", "get_receipts")]);
                None
            }
        }
    }

    fn record(&self, receipt: &Receipt) {
        let status = match receipt.status {
            ReceiptStatus::Ok => "ok",
            ReceiptStatus::Error => "error",
            ReceiptStatus::Unknown => "unknown",
        };
        self.metrics.receipts.add(1, &[KeyValue::new("status", status)]);
    }
}

/// Appends the outcome(s) for one receipt.
///
/// An error receipt carrying a structured code yields two entries: one with the
/// code and one with the message. Existing consumers rely on both being present.
fn classify(id: &ReceiptId, receipt: &Receipt, outcomes: &mut Vec<ReceiptOutcome>) {
    match receipt.status {
        ReceiptStatus::Ok => outcomes.push(ReceiptOutcome::ok(id.clone())),
        ReceiptStatus::Error => {
            let message = receipt.message.as_deref().unwrap_or_default();
            tracing::error!(receipt_id = %id, message = %message, "There was an error sending a notification");

            if let Some(code) = receipt.details.as_ref().and_then(|d| d.error.as_ref()) {
                tracing::error!(receipt_id = %id, error_code = %code, "Push receipt carries an error code");
                outcomes.push(ReceiptOutcome::error(id.clone(), Some(code.clone())));
            }
            outcomes.push(ReceiptOutcome::error(id.clone(), receipt.message.clone()));
        }
        ReceiptStatus::Unknown => {
            tracing::debug!(receipt_id = %id, "Ignoring receipt with unrecognized status");
        }
    }
}
