//! Verity HTTP server entrypoint.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tokio::signal;
use tokio::sync::watch;

use verity::analytics::AnalyticsConfig;
use verity::config::Config;
use verity::dedup::DedupConfig;
use verity::embedding::{Embedder, HttpEmbedder, HttpEmbedderConfig, StubEmbedder};
use verity::jobs::{JobConfig, JobQueue, JobTrigger, JobWorker, RedeliverySweeper};
use verity::search::{SearchAggregator, SearchConfig};
use verity::store::{MemoryStore, PgStore, Store};
use verity::vectordb::{ClaimIndex, MemoryClaimIndex, QdrantClaimIndex};
use verity::verdict::{GenaiVerdictGenerator, MockVerdictGenerator, VerdictConfig, VerdictGenerator};
use verity_server::gateway::{Backends, HandlerState, PipelineSettings, create_router_with_state};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if std::env::args().any(|arg| arg == "--health-check") {
        std::process::exit(run_health_check());
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    config.validate()?;
    let addr: SocketAddr = config.socket_addr().parse()?;

    let search_config = SearchConfig::from_env()?;
    let dedup_config = DedupConfig::from_env()?;
    dedup_config.validate()?;
    let job_config = JobConfig::from_env()?;
    job_config.validate()?;
    let verdict_config = VerdictConfig::from_env()?;
    verdict_config.validate()?;
    let analytics_config = AnalyticsConfig::from_env()?;
    analytics_config.validate()?;

    tracing::info!(
        bind_addr = %config.bind_addr,
        port = config.port,
        "Verity starting"
    );

    let search = Arc::new(SearchAggregator::from_config(search_config)?);
    let slowest_call = search
        .max_provider_timeout()
        .max(Some(verdict_config.timeout));
    job_config.validate_against(slowest_call)?;

    let store: Arc<dyn Store> = match &config.database_url {
        Some(url) => {
            let store = PgStore::connect(url, config.database_max_connections).await?;
            tracing::info!("Connected to Postgres");
            Arc::new(store)
        }
        None => {
            tracing::warn!("No VERITY_DATABASE_URL configured, using in-memory store");
            Arc::new(MemoryStore::new())
        }
    };

    let vector_size = config.embedding_dim as u64;
    let index: Arc<dyn ClaimIndex> = match &config.qdrant_url {
        Some(url) => {
            let index = QdrantClaimIndex::new(url, &config.qdrant_collection, vector_size)?;
            index.ensure_collection().await?;
            Arc::new(index)
        }
        None => {
            tracing::warn!("No VERITY_QDRANT_URL configured, using in-memory claim index");
            Arc::new(MemoryClaimIndex::with_vector_size(config.embedding_dim))
        }
    };

    let embedder: Arc<dyn Embedder> = match &config.embedding_url {
        Some(url) => {
            let http_config = HttpEmbedderConfig::new(url.clone(), config.embedding_dim)
                .with_api_key(config.embedding_api_key.clone())
                .with_timeout(config.embedding_timeout);
            Arc::new(HttpEmbedder::new(http_config)?)
        }
        None => {
            tracing::warn!("No VERITY_EMBEDDING_URL configured, running embedder in stub mode");
            Arc::new(StubEmbedder::new(config.embedding_dim))
        }
    };

    let verdicts: Arc<dyn VerdictGenerator> = if verdict_config.mock {
        tracing::warn!("VERITY_MOCK_VERDICTS set, verdicts are placeholders");
        Arc::new(MockVerdictGenerator::new())
    } else {
        Arc::new(GenaiVerdictGenerator::new(&verdict_config))
    };

    let (queue, receiver) = JobQueue::channel(job_config.queue_capacity);
    let trigger: Arc<dyn JobTrigger> = Arc::new(queue);

    let worker_concurrency = job_config.worker_concurrency;
    let redelivery_interval = job_config.redelivery_interval;
    let refresh_interval = analytics_config.refresh_interval;

    let state = HandlerState::assemble(
        Backends {
            store,
            index,
            embedder,
            verdicts,
            search,
        },
        PipelineSettings {
            dedup: dedup_config,
            jobs: job_config,
            analytics: analytics_config,
        },
        trigger,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let worker = JobWorker::new(Arc::clone(&state.orchestrator), worker_concurrency)
        .spawn(receiver, shutdown_rx.clone());

    let sweeper = Arc::new(RedeliverySweeper::new(
        Arc::clone(&state.orchestrator),
        redelivery_interval,
    ));
    sweeper.start();

    if let Some(interval) = refresh_interval {
        Arc::clone(&state.analytics).spawn_refresh(interval, shutdown_rx.clone());
    }

    let app = create_router_with_state(state);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    sweeper.shutdown();
    let _ = shutdown_tx.send(true);
    if tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await.is_err() {
        tracing::warn!("Job worker did not drain in time; unfinished jobs are abandoned");
    }

    tracing::info!("Verity shutdown complete");
    Ok(())
}

fn run_health_check() -> i32 {
    let port = std::env::var("VERITY_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);

    let url = format!("http://127.0.0.1:{}/healthz", port);

    let Ok(rt) = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    else {
        return 1;
    };

    rt.block_on(async {
        let Ok(client) = reqwest::Client::builder()
            .timeout(Duration::from_secs(1))
            .build()
        else {
            return 1;
        };

        match client.get(&url).send().await {
            Ok(res) if res.status().is_success() => 0,
            _ => 1,
        }
    })
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
