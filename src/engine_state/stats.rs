//! Counters describing what the scheduler has done so far.

use std::fmt;

/// Running totals since the [`EngineState`](super::EngineState) was created.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamingStats {
    pub passes: u64,
    pub data_jobs_dispatched: u64,
    pub mesh_jobs_dispatched: u64,
    /// Meshes committed with a renderer handle
    pub meshes_committed: u64,
    /// Meshes committed as empty
    pub empty_meshes: u64,
    /// Background results discarded because their chunk was evicted meanwhile
    pub stale_results_dropped: u64,
    pub failed_tasks: u64,
    pub meshes_evicted: u64,
    pub data_evicted: u64,
    /// Passes on which the mesh queue head was waiting on data
    pub mesh_queue_stalls: u64,
}

impl fmt::Display for StreamingStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "passes={} data_jobs={} mesh_jobs={} meshes={} empty={} stale={} failed={} evicted_meshes={} evicted_data={} stalls={}",
            self.passes,
            self.data_jobs_dispatched,
            self.mesh_jobs_dispatched,
            self.meshes_committed,
            self.empty_meshes,
            self.stale_results_dropped,
            self.failed_tasks,
            self.meshes_evicted,
            self.data_evicted,
            self.mesh_queue_stalls
        )
    }
}
