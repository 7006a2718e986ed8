//! # Streaming Configuration
//!
//! Every tunable of the pipeline lives in [`StreamingConfig`]. The struct is
//! deserializable from JSON with per-field defaults, so a config file only needs
//! to name the knobs it changes:
//!
//! ```
//! use voxel_streaming::StreamingConfig;
//!
//! let config = StreamingConfig::from_json_str(r#"{ "render_distance": 3 }"#).unwrap();
//! assert_eq!(config.render_distance, 3);
//! assert_eq!(config.chunk_edge, 16);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::StreamingError;

/// Default chunk edge length in voxels.
pub const DEFAULT_CHUNK_EDGE: usize = 16;
/// Default render distance in chunks (Chebyshev).
pub const DEFAULT_RENDER_DISTANCE: i32 = 5;
/// Default number of data generation jobs dispatched per scheduling pass.
pub const DEFAULT_MAX_DATA_JOBS_PER_PASS: usize = 32;
/// Default number of mesh jobs dispatched per scheduling pass.
pub const DEFAULT_MAX_MESH_JOBS_PER_PASS: usize = 16;
/// Fixed noise seed used when none is configured.
pub const DEFAULT_NOISE_SEED: u32 = 0x5EED;
/// Default number of noise octaves.
pub const DEFAULT_NOISE_OCTAVES: usize = 4;
/// Scaling factor applied to world coordinates when sampling noise.
pub const DEFAULT_NOISE_FREQUENCY: f64 = 0.02;
/// Sampled values strictly above this are solid. Samples lie in [0, 1].
pub const DEFAULT_OCCUPANCY_THRESHOLD: f64 = 0.5;

/// Tunables for one streaming world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// Edge length of a cubic chunk, in voxels.
    pub chunk_edge: usize,
    /// Maximum Chebyshev distance, in chunks, at which meshes are kept.
    pub render_distance: i32,
    /// Data generation jobs dispatched per pass.
    pub max_data_jobs_per_pass: usize,
    /// Mesh jobs dispatched per pass.
    pub max_mesh_jobs_per_pass: usize,
    pub noise_seed: u32,
    pub noise_octaves: usize,
    pub noise_frequency: f64,
    pub occupancy_threshold: f64,
    /// Number of background worker threads.
    pub worker_threads: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            chunk_edge: DEFAULT_CHUNK_EDGE,
            render_distance: DEFAULT_RENDER_DISTANCE,
            max_data_jobs_per_pass: DEFAULT_MAX_DATA_JOBS_PER_PASS,
            max_mesh_jobs_per_pass: DEFAULT_MAX_MESH_JOBS_PER_PASS,
            noise_seed: DEFAULT_NOISE_SEED,
            noise_octaves: DEFAULT_NOISE_OCTAVES,
            noise_frequency: DEFAULT_NOISE_FREQUENCY,
            occupancy_threshold: DEFAULT_OCCUPANCY_THRESHOLD,
            worker_threads: default_worker_threads(),
        }
    }
}

fn default_worker_threads() -> usize {
    std::thread::available_parallelism()
        .map(|count| count.get())
        .unwrap_or(4)
}

impl StreamingConfig {
    /// Parses and validates a JSON configuration. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StreamingError> {
        let config: StreamingConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, StreamingError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Rejects values the scheduler cannot work with.
    pub fn validate(&self) -> Result<(), StreamingError> {
        if self.chunk_edge == 0 {
            return Err(StreamingError::InvalidConfig(
                "chunk_edge must be at least 1".into(),
            ));
        }
        if self.render_distance < 1 {
            return Err(StreamingError::InvalidConfig(format!(
                "render_distance must be at least 1, got {}",
                self.render_distance
            )));
        }
        if self.worker_threads == 0 {
            return Err(StreamingError::InvalidConfig(
                "worker_threads must be at least 1".into(),
            ));
        }
        if self.noise_octaves == 0 {
            return Err(StreamingError::InvalidConfig(
                "noise_octaves must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.occupancy_threshold) {
            return Err(StreamingError::InvalidConfig(format!(
                "occupancy_threshold must lie in [0, 1], got {}",
                self.occupancy_threshold
            )));
        }
        Ok(())
    }

    /// Distance beyond which chunk data is dropped unconditionally.
    pub fn data_retention_distance(&self) -> i32 {
        self.render_distance * 2
    }
}
