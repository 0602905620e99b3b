use std::sync::Arc;

use verity::analytics::{AnalyticsConfig, AnalyticsService};
use verity::dedup::{ClaimDeduplicator, DedupConfig, SimilarityLookup};
use verity::embedding::Embedder;
use verity::jobs::{JobConfig, JobOrchestrator, JobTrigger};
use verity::search::SearchAggregator;
use verity::store::Store;
use verity::vectordb::ClaimIndex;
use verity::verdict::VerdictGenerator;

/// External collaborators the pipeline is wired from.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn Store>,
    pub index: Arc<dyn ClaimIndex>,
    pub embedder: Arc<dyn Embedder>,
    pub verdicts: Arc<dyn VerdictGenerator>,
    pub search: Arc<SearchAggregator>,
}

/// Tunables for the components built on top of [`Backends`].
#[derive(Debug, Clone, Default)]
pub struct PipelineSettings {
    pub dedup: DedupConfig,
    pub jobs: JobConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Clone)]
pub struct HandlerState {
    pub orchestrator: Arc<JobOrchestrator>,

    pub search: Arc<SearchAggregator>,

    pub analytics: Arc<AnalyticsService>,

    pub store: Arc<dyn Store>,

    pub index: Arc<dyn ClaimIndex>,

    pub embedder: Arc<dyn Embedder>,

    pub verdicts: Arc<dyn VerdictGenerator>,
}

impl HandlerState {
    /// Builds the deduplicator, orchestrator and analytics service over shared backends.
    ///
    /// `trigger` is where new jobs are announced; the caller owns whatever consumes it.
    pub fn assemble(
        backends: Backends,
        settings: PipelineSettings,
        trigger: Arc<dyn JobTrigger>,
    ) -> Self {
        let Backends {
            store,
            index,
            embedder,
            verdicts,
            search,
        } = backends;

        let dedup = Arc::new(ClaimDeduplicator::new(
            Arc::clone(&embedder),
            Arc::clone(&index),
            Arc::clone(&store),
            settings.dedup,
        ));

        let orchestrator = Arc::new(JobOrchestrator::new(
            Arc::clone(&store),
            Arc::clone(&search),
            Arc::clone(&verdicts),
            Arc::clone(&dedup),
            trigger,
            settings.jobs,
        ));

        let lookup: Arc<dyn SimilarityLookup> = dedup;
        let analytics = Arc::new(AnalyticsService::new(
            Arc::clone(&store),
            lookup,
            settings.analytics,
        ));

        Self {
            orchestrator,
            search,
            analytics,
            store,
            index,
            embedder,
            verdicts,
        }
    }
}
