//! Shared pipeline fixtures for integration tests.

use std::sync::Arc;
use std::time::Duration;

use verity::analytics::{AnalyticsConfig, AnalyticsService};
use verity::dedup::{ClaimDeduplicator, DedupConfig, SimilarityLookup};
use verity::embedding::FixtureEmbedder;
use verity::jobs::{JobConfig, JobOrchestrator, JobQueue, JobReceiver, JobStatusView};
use verity::search::{SearchAggregator, SearchConfig, SearchProvider};
use verity::store::{JobStatus, MemoryStore};
use verity::vectordb::MemoryClaimIndex;
use verity::verdict::MockVerdictGenerator;

pub const DIM: usize = 64;

/// Unit vector in the plane of the first two axes.
pub fn planar(x: f32, y: f32) -> Vec<f32> {
    let mut v = vec![0.0; DIM];
    v[0] = x;
    v[1] = y;
    v
}

pub struct Pipeline {
    pub orchestrator: Arc<JobOrchestrator>,
    pub analytics: Arc<AnalyticsService>,
    pub store: Arc<MemoryStore>,
    pub receiver: Option<JobReceiver>,
}

pub fn pipeline(
    embedder: FixtureEmbedder,
    providers: Vec<Arc<dyn SearchProvider>>,
    verdicts: MockVerdictGenerator,
) -> Pipeline {
    let store = Arc::new(MemoryStore::new());
    let dedup = Arc::new(ClaimDeduplicator::new(
        Arc::new(embedder),
        Arc::new(MemoryClaimIndex::with_vector_size(DIM)),
        store.clone(),
        DedupConfig::default(),
    ));
    let search = Arc::new(
        SearchAggregator::new(providers, SearchConfig::default()).expect("valid aggregator"),
    );
    let (queue, receiver) = JobQueue::channel(64);
    let jobs = JobConfig {
        job_timeout: Duration::from_secs(5),
        ..JobConfig::default()
    };

    let orchestrator = Arc::new(JobOrchestrator::new(
        store.clone(),
        search,
        Arc::new(verdicts),
        dedup.clone(),
        Arc::new(queue),
        jobs,
    ));

    let lookup: Arc<dyn SimilarityLookup> = dedup;
    let analytics = Arc::new(AnalyticsService::new(
        store.clone(),
        lookup,
        AnalyticsConfig::default(),
    ));

    Pipeline {
        orchestrator,
        analytics,
        store,
        receiver: Some(receiver),
    }
}

pub async fn wait_for_terminal(orchestrator: &JobOrchestrator, job_id: uuid::Uuid) -> JobStatusView {
    for _ in 0..200 {
        let view = orchestrator.get_status(job_id).await.expect("job exists");
        if matches!(view.status, JobStatus::Completed | JobStatus::Failed) {
            return view;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("job {job_id} never reached a terminal state");
}
