//! Worker pool draining the inbound order channel.
//!
//! Stands in for the broker subscription: the transport pushes raw JSON
//! payloads into an in-process channel and a fixed set of worker tasks
//! takes turns draining it. Two workers may process orders for the same
//! item at once; the store's conditional writes keep that safe.

use std::sync::Arc;

use domain::Order;
use ledger_store::LedgerStore;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;

use crate::processor::OrderProcessor;
use crate::publisher::OrderPublisher;

/// Default number of consumer workers.
pub const DEFAULT_WORKERS: usize = 4;

/// A pool of tasks consuming order payloads from one channel.
///
/// The pool stops once the sending side of the channel is dropped and
/// the backlog is drained; [`ConsumerPool::join`] waits for that.
pub struct ConsumerPool {
    handles: Vec<JoinHandle<()>>,
}

impl ConsumerPool {
    /// Spawns `workers` tasks draining `receiver` through `processor`.
    pub fn start<S, P>(
        workers: usize,
        receiver: mpsc::Receiver<String>,
        processor: Arc<OrderProcessor<S, P>>,
    ) -> Self
    where
        S: LedgerStore + 'static,
        P: OrderPublisher + 'static,
    {
        let receiver = Arc::new(Mutex::new(receiver));
        let handles = (0..workers)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let processor = Arc::clone(&processor);
                tokio::spawn(async move {
                    loop {
                        // Hold the lock only while waiting for one message
                        // so the other workers can take the next.
                        let message = receiver.lock().await.recv().await;
                        let Some(payload) = message else { break };
                        handle_payload(worker, &processor, &payload).await;
                    }
                    tracing::debug!(worker, "consumer worker stopped");
                })
            })
            .collect();

        tracing::info!(workers, "consumer pool started");
        Self { handles }
    }

    /// Returns the number of workers in the pool.
    pub fn worker_count(&self) -> usize {
        self.handles.len()
    }

    /// Waits for all workers to drain the channel and stop.
    ///
    /// The sending side must be dropped first, otherwise this never
    /// returns.
    pub async fn join(self) {
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn handle_payload<S, P>(worker: usize, processor: &OrderProcessor<S, P>, payload: &str)
where
    S: LedgerStore,
    P: OrderPublisher,
{
    let order: Order = match serde_json::from_str(payload) {
        Ok(order) => order,
        Err(e) => {
            metrics::counter!("orders_malformed_total").increment(1);
            tracing::warn!(worker, error = %e, "malformed order payload, dropping");
            return;
        }
    };

    if let Err(e) = processor.process(order).await {
        // The outcome is already recorded, so the transport's redelivery
        // re-answers without touching the ledger.
        tracing::error!(worker, order_id = %e.order_id, error = %e, "publish failed");
    }
}
