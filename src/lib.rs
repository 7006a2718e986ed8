#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxel Streaming
//!
//! A voxel-world streaming and meshing pipeline. Given a moving observer, it
//! keeps a cube of chunks around that observer generated and meshed in the
//! background, hands finished meshes to a renderer, and evicts chunks that
//! fall out of range.
//!
//! ## Key Modules
//!
//! * `core` - the shared resource container used across threads
//! * `config` - tunables, loadable from JSON
//! * `engine_state` - the scheduler plus voxels, meshing, task management and
//!   the renderer boundary
//!
//! ## Architecture
//!
//! Chunk data is generated from fractal noise on a worker pool and written
//! into a chunk registry under one lock. A chunk is meshed only once it and
//! all six face neighbours are generated, so faces on chunk borders are culled
//! correctly. Finished meshes come back to the owning thread, which turns them
//! into renderer handles through a [`MeshAllocator`].
//!
//! ## Usage
//!
//! ```
//! use cgmath::Point3;
//! use voxel_streaming::{EngineState, HeadlessMeshAllocator, StreamingConfig};
//!
//! let config = StreamingConfig {
//!     render_distance: 1,
//!     worker_threads: 2,
//!     ..StreamingConfig::default()
//! };
//! let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
//!
//! // Once per frame:
//! engine_state.update(Point3::new(8.0, 8.0, 8.0)).unwrap();
//! for entry in engine_state.render_queue().iter() {
//!     // draw entry.mesh at entry.origin
//!     let _ = (&entry.mesh, entry.origin);
//! }
//! ```

use cgmath::Point3;
use log::{info, warn};
use web_time::Instant;

pub mod config;
pub mod core;
pub mod engine_state;
pub mod error;

pub use config::StreamingConfig;
pub use engine_state::{
    rendering::{
        gpu_mesh_allocator::{GpuMesh, GpuMeshAllocator},
        mesh_allocator::{HeadlessMesh, HeadlessMeshAllocator, MeshAllocator},
        render_queue::{RenderEntry, RenderQueue},
        Vertex,
    },
    voxels::{
        coordinates::{world_to_chunk, ChunkCoordinate},
        registry::{DataState, MeshState},
    },
    EngineState, StreamingStats,
};
pub use error::StreamingError;

/// Number of scheduling passes the demo runs.
const DEMO_PASSES: usize = 240;
/// Observer speed of the demo, in voxels per pass.
const DEMO_SPEED: f32 = 0.75;

/// Runs the streaming demo: an observer flying along +X through a generated
/// world, with meshes uploaded to a GPU when one is available.
///
/// The first command line argument, if any, is a JSON configuration file.
pub fn run() -> Result<(), StreamingError> {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();

    info!("Logger initialized");

    let config = match std::env::args().nth(1) {
        Some(path) => {
            info!("Loading configuration from {}", path);
            StreamingConfig::from_json_file(path)?
        }
        None => StreamingConfig::default(),
    };

    match pollster::block_on(GpuMeshAllocator::request_headless_device()) {
        Ok((device, _queue)) => {
            let stats = fly_through(config, GpuMeshAllocator::new(device))?;
            info!("GPU run finished: {}", stats);
        }
        Err(error) => {
            warn!("{}; falling back to headless meshes", error);
            let stats = fly_through(config, HeadlessMeshAllocator::new())?;
            info!("Headless run finished: {}", stats);
        }
    }

    Ok(())
}

fn fly_through<A: MeshAllocator>(config: StreamingConfig, allocator: A) -> Result<StreamingStats, StreamingError> {
    let mut engine_state = EngineState::new(config, allocator)?;
    let mut rng = fastrand::Rng::with_seed(7);
    let mut observer = Point3::new(0.0f32, 0.0, 0.0);
    let start = Instant::now();

    for pass in 0..DEMO_PASSES {
        observer.x += DEMO_SPEED;
        observer.y += (rng.f32() - 0.5) * 0.2;
        observer.z += (rng.f32() - 0.5) * 0.2;

        engine_state.update(observer)?;

        if pass % 30 == 0 {
            info!(
                "Pass {} at chunk {:?}: {} meshes to render",
                pass,
                engine_state.observer_chunk(),
                engine_state.render_queue().len()
            );
        }
    }

    engine_state.wait_for_idle()?;
    engine_state.update(observer)?;
    info!(
        "Streamed {} passes in {:?}, {} meshes to render at the end",
        DEMO_PASSES,
        start.elapsed(),
        engine_state.render_queue().len()
    );

    Ok(*engine_state.stats())
}
