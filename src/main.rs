use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use docket::application::ports::{
    CallbackNotifier, DocumentLookup, JobRepository, NotificationOutbox, ProcessingClient,
};
use docket::application::services::{
    IngestionService, IngestionWorker, JobDriver, NotificationDelivery, OutboxRelay,
};
use docket::infrastructure::notification::HttpCallbackNotifier;
use docket::infrastructure::observability::{TracingConfig, init_tracing};
use docket::infrastructure::persistence::{
    PgDocumentLookup, PgJobRepository, PgNotificationOutbox, create_pool, run_migrations,
};
use docket::infrastructure::processing::HttpProcessingClient;
use docket::presentation::{AppState, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env().map_err(anyhow::Error::msg)?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::from_settings(
        environment.as_str(),
        &settings.logging,
    ))?;

    let pool = create_pool(
        &settings.database.url,
        settings.database.max_connections,
        settings.database.connect_retry.policy(),
    )
    .await?;
    if settings.database.run_migrations {
        run_migrations(&pool).await?;
    }

    let job_repository: Arc<dyn JobRepository> = Arc::new(PgJobRepository::new(pool.clone()));
    let document_lookup: Arc<dyn DocumentLookup> = Arc::new(PgDocumentLookup::new(pool.clone()));
    let outbox: Arc<dyn NotificationOutbox> = Arc::new(PgNotificationOutbox::new(pool.clone()));

    let processing_client: Arc<dyn ProcessingClient> = Arc::new(HttpProcessingClient::new(
        &settings.processing.base_url,
        settings.processing.timeout(),
    )?);
    let notifier: Arc<dyn CallbackNotifier> =
        Arc::new(HttpCallbackNotifier::new(settings.callback.timeout())?);

    let delivery = Arc::new(NotificationDelivery::new(
        notifier,
        Arc::clone(&outbox),
        settings.callback.retry.policy(),
        settings.callback.max_delivery_attempts,
    ));
    let driver = Arc::new(JobDriver::new(
        Arc::clone(&job_repository),
        processing_client,
        Arc::clone(&delivery),
        settings.processing.retry.policy(),
        settings.callback.relay_grace(),
    ));

    let (sender, receiver) = mpsc::channel(settings.worker.queue_capacity.max(1));
    let ingestion_service = Arc::new(IngestionService::new(
        Arc::clone(&job_repository),
        document_lookup,
        sender,
    ));

    let worker = IngestionWorker::new(receiver, Arc::clone(&driver), settings.worker.concurrency);
    let worker_handle = tokio::spawn(worker.run());

    let interrupted = driver.fail_interrupted().await?;
    if interrupted > 0 {
        tracing::warn!(count = interrupted, "Failed jobs interrupted by previous shutdown");
    }
    ingestion_service.requeue_pending().await?;

    let relay = OutboxRelay::new(
        outbox,
        delivery,
        settings.callback.relay_interval(),
        settings.callback.relay_batch_size,
    );
    let relay_handle = tokio::spawn(relay.run());

    let router = create_router(AppState::new(Arc::clone(&ingestion_service)));
    drop(ingestion_service);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped, draining ingestion worker");
    relay_handle.abort();
    worker_handle.await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
