//! Test server harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::sync::{oneshot, watch};
use tokio::task::JoinHandle;

use verity::embedding::StubEmbedder;
use verity::jobs::{JobConfig, JobQueue, JobWorker};
use verity::search::{ScriptedProvider, SearchAggregator, SearchConfig, sample_results};
use verity::store::MemoryStore;
use verity::vectordb::MemoryClaimIndex;
use verity::verdict::{MockVerdictGenerator, VerdictLabel};
use verity_server::gateway::{Backends, HandlerState, PipelineSettings, create_router_with_state};

const STARTUP_WAIT_TIMEOUT_SECS: u64 = 5;
const STARTUP_POLL_INTERVAL_MS: u64 = 50;
const TEST_EMBEDDING_DIM: usize = 64;

#[derive(Debug, Clone)]
pub struct TestServerConfig {
    pub port: u16,
    pub verdict: VerdictLabel,
    pub job_timeout: Duration,
}

impl Default for TestServerConfig {
    fn default() -> Self {
        Self {
            port: 0,
            verdict: VerdictLabel::MostlyFalse,
            job_timeout: Duration::from_secs(5),
        }
    }
}

pub struct TestServer {
    pub addr: SocketAddr,
    pub store: Arc<MemoryStore>,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    worker_shutdown: watch::Sender<bool>,
}

impl TestServer {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub async fn shutdown(mut self) {
        let _ = self.worker_shutdown.send(true);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.worker_shutdown.send(true);
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

pub async fn find_available_port() -> std::io::Result<u16> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    Ok(addr.port())
}

pub async fn wait_for_server_ready(
    addr: SocketAddr,
    timeout: Duration,
    interval: Duration,
) -> Result<(), ServerStartupError> {
    let start = std::time::Instant::now();

    loop {
        if start.elapsed() > timeout {
            return Err(ServerStartupError::Timeout);
        }

        match tokio::net::TcpStream::connect(addr).await {
            Ok(_) => return Ok(()),
            Err(_) => {
                tokio::time::sleep(interval).await;
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServerStartupError {
    #[error("Server failed to start within timeout")]
    Timeout,
    #[error("Failed to bind to address: {0}")]
    BindError(#[from] std::io::Error),
    #[error("Server startup failed: {0}")]
    StartupFailed(String),
}

/// Spawns a server over in-memory backends with a live job worker.
///
/// Search is served by two scripted providers, verdicts by the mock generator, embeddings
/// by the stub embedder. Nothing outside the process is contacted.
pub async fn spawn_test_server(config: TestServerConfig) -> Result<TestServer, ServerStartupError> {
    let port = if config.port == 0 {
        find_available_port().await?
    } else {
        config.port
    };

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = TcpListener::bind(addr).await?;
    let local_addr = listener.local_addr()?;

    let search = SearchAggregator::new(
        vec![
            Arc::new(ScriptedProvider::returning(
                "brave",
                "Brave",
                sample_results("news.example", 3),
            )),
            Arc::new(ScriptedProvider::returning(
                "tavily",
                "Tavily",
                sample_results("crawl.example", 3),
            )),
        ],
        SearchConfig::default(),
    )
    .map_err(|e| ServerStartupError::StartupFailed(e.to_string()))?;

    let store = Arc::new(MemoryStore::new());
    let jobs = JobConfig {
        job_timeout: config.job_timeout,
        ..JobConfig::default()
    };
    let worker_concurrency = jobs.worker_concurrency;
    let (queue, receiver) = JobQueue::channel(jobs.queue_capacity);

    let state = HandlerState::assemble(
        Backends {
            store: store.clone(),
            index: Arc::new(MemoryClaimIndex::with_vector_size(TEST_EMBEDDING_DIM)),
            embedder: Arc::new(StubEmbedder::new(TEST_EMBEDDING_DIM)),
            verdicts: Arc::new(MockVerdictGenerator::new().with_verdict(config.verdict, None)),
            search: Arc::new(search),
        },
        PipelineSettings {
            jobs,
            ..PipelineSettings::default()
        },
        Arc::new(queue),
    );

    let (worker_shutdown, worker_shutdown_rx) = watch::channel(false);
    JobWorker::new(Arc::clone(&state.orchestrator), worker_concurrency)
        .spawn(receiver, worker_shutdown_rx);

    let app = create_router_with_state(state);

    let (shutdown_tx, shutdown_rx) = oneshot::channel();

    let server_handle = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
            .unwrap();
    });

    wait_for_server_ready(
        local_addr,
        Duration::from_secs(STARTUP_WAIT_TIMEOUT_SECS),
        Duration::from_millis(STARTUP_POLL_INTERVAL_MS),
    )
    .await?;

    Ok(TestServer {
        addr: local_addr,
        store,
        _server_handle: server_handle,
        shutdown_tx: Some(shutdown_tx),
        worker_shutdown,
    })
}
