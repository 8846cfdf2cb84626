use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use parcelis_api::{app, AppState};
use parcelis_carrier::HttpCarrierClient;
use parcelis_shipping::{ReconciliationJob, ShipmentOrchestrator};
use parcelis_store::{
    DbClient, FsLabelStore, PostgresOrderGateway, PostgresShipmentRepository,
};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parcelis_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = parcelis_store::app_config::Config::load().expect("Failed to load config");
    config
        .carrier
        .validate()
        .expect("Invalid carrier configuration");
    tracing::info!("Starting Parcelis API on port {}", config.server.port);

    let db = DbClient::new(&config.database.url)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    let shipments = Arc::new(PostgresShipmentRepository::new(db.pool.clone()));
    let orders = Arc::new(PostgresOrderGateway::new(db.pool.clone()));
    let labels = Arc::new(FsLabelStore::new(config.shipping.labels_dir.clone()));
    let carrier = Arc::new(
        HttpCarrierClient::new(config.carrier.clone()).expect("Failed to build carrier client"),
    );

    let orchestrator = Arc::new(ShipmentOrchestrator::new(
        orders,
        shipments.clone(),
        labels,
        carrier.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let job = ReconciliationJob::new(shipments, carrier)
        .with_interval(Duration::from_secs(config.shipping.sync_interval_seconds));
    let job_handle = tokio::spawn(job.run(shutdown_rx));

    let app = app(AppState { orchestrator });

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
        })
        .await
        .unwrap();

    // Let the in-flight sweep drain before the process exits.
    shutdown_tx.send(true).ok();
    job_handle.await.ok();
}
