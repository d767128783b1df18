//! Service entry point: HTTP server plus the order consumer pool.

use std::sync::Arc;

use ledger_store::InMemoryLedgerStore;
use reservation::{ConsumerPool, InMemoryOrderPublisher, OrderProcessor, ReservationWorkflow};
use tokio::signal;
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use api::config::Config;
use api::routes::items::AppState;

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("received SIGINT, starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("received SIGTERM, starting graceful shutdown");
        }
    }
}

#[tokio::main]
async fn main() {
    let config = Config::from_env();

    // 1. Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Install Prometheus metrics recorder
    let prometheus_builder = metrics_exporter_prometheus::PrometheusBuilder::new();
    let metrics_handle = prometheus_builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    // 3. Wire the ledger store and the reservation pipeline. The channel
    // sender is the seat of the broker subscription; a real deployment
    // feeds it from the bus client.
    let store = InMemoryLedgerStore::new();
    let publisher = InMemoryOrderPublisher::new();
    let processor = Arc::new(OrderProcessor::new(
        ReservationWorkflow::new(store.clone()),
        publisher,
    ));
    let (order_tx, order_rx) = mpsc::channel::<String>(1024);
    let pool = ConsumerPool::start(config.consumer_workers, order_rx, processor);

    // 4. Build the application
    let state = Arc::new(AppState { store });
    let app = api::create_app(state, metrics_handle);

    // 5. Start server
    let addr = config.addr();
    tracing::info!(%addr, workers = config.consumer_workers, "starting stock service");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind address");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");

    // 6. Drain the consumer pool before exiting
    drop(order_tx);
    pool.join().await;

    tracing::info!("server shut down gracefully");
}
