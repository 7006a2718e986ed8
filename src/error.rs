//! Error types for the streaming pipeline

use thiserror::Error;

use crate::engine_state::voxels::coordinates::ChunkCoordinate;

/// Main error type for the streaming pipeline
///
/// Generation and meshing are total functions and have no variant here. The
/// only runtime failures are resource exhaustion while creating a mesh handle,
/// a background task unwinding, and configuration problems at startup.
#[derive(Debug, Error)]
pub enum StreamingError {
    /// The renderer could not create a mesh handle. Not retried.
    #[error("mesh allocation failed for chunk {coord:?}: {reason}")]
    MeshAllocation {
        coord: ChunkCoordinate,
        reason: String,
    },

    #[error("background task panicked before producing a result")]
    TaskPanicked,

    #[error("no usable GPU device: {0}")]
    DeviceUnavailable(String),

    #[error("failed to spawn worker thread: {0}")]
    WorkerSpawn(#[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to read configuration: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] serde_json::Error),
}
