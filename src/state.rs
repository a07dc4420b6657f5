use std::sync::Arc;
use std::time::Instant;

use tokio::sync::RwLock;

use crate::services::goals::ProgressTracker;
use crate::store::{GraphStore, PrefsStore};

/// Shared handles for the HTTP layer. The graph store sits behind a single
/// RwLock: reads take snapshots, mutations serialize. Whole-graph exclusion
/// is sufficient at human-paced edit rates.
#[derive(Clone)]
pub struct AppState {
    started_at: Instant,
    graph: Arc<RwLock<GraphStore>>,
    prefs: Arc<PrefsStore>,
    progress: Arc<RwLock<ProgressTracker>>,
}

impl AppState {
    pub fn new(graph: GraphStore, prefs: PrefsStore) -> Self {
        let prefs = Arc::new(prefs);
        let progress = ProgressTracker::load(&prefs);
        Self {
            started_at: Instant::now(),
            graph: Arc::new(RwLock::new(graph)),
            prefs,
            progress: Arc::new(RwLock::new(progress)),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }

    pub fn graph(&self) -> Arc<RwLock<GraphStore>> {
        Arc::clone(&self.graph)
    }

    pub fn prefs(&self) -> Arc<PrefsStore> {
        Arc::clone(&self.prefs)
    }

    pub fn progress(&self) -> Arc<RwLock<ProgressTracker>> {
        Arc::clone(&self.progress)
    }
}
