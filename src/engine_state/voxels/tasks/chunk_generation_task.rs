//! # Chunk Generation Task
//!
//! Generates the occupancy grid of one chunk on a worker thread and stores it
//! in the registry. Noise sampling happens before the registry lock is taken.

use std::sync::Arc;

use log::trace;
use web_time::Instant;

use crate::{
    core::MtResource,
    engine_state::{
        task_management::task::Task,
        voxels::{coordinates::ChunkCoordinate, generation::VoxelGenerator, registry::ChunkRegistry},
    },
};

/// Outcome of a chunk generation task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkGenerationResult {
    pub coord: ChunkCoordinate,
    /// `false` if the chunk was evicted or already written while generating.
    pub stored: bool,
}

/// A task that generates chunk data asynchronously.
pub struct ChunkGenerationTask<H: Send + Sync> {
    /// Registry the generated grid is written into
    registry: MtResource<ChunkRegistry<H>>,
    generator: Arc<VoxelGenerator>,
    /// The chunk to generate (in chunk coordinates)
    coord: ChunkCoordinate,
}

impl<H: Send + Sync> ChunkGenerationTask<H> {
    pub fn new(
        registry: MtResource<ChunkRegistry<H>>,
        generator: Arc<VoxelGenerator>,
        coord: ChunkCoordinate,
    ) -> Self {
        ChunkGenerationTask {
            registry,
            generator,
            coord,
        }
    }
}

impl<H: Send + Sync + 'static> Task for ChunkGenerationTask<H> {
    type Output = ChunkGenerationResult;

    fn process(self) -> ChunkGenerationResult {
        let start = Instant::now();
        let grid = self.generator.generate(self.coord);
        let solid = grid.occupied_count();

        let stored = self.registry.get_mut().mark_data_processed(self.coord, grid);

        trace!(
            "Generated chunk {:?}: {} solid voxels in {:?}",
            self.coord,
            solid,
            start.elapsed()
        );

        ChunkGenerationResult {
            coord: self.coord,
            stored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StreamingConfig;
    use crate::engine_state::voxels::registry::DataState;
    use cgmath::Point3;

    fn setup() -> (MtResource<ChunkRegistry<u8>>, Arc<VoxelGenerator>) {
        let config = StreamingConfig {
            chunk_edge: 4,
            ..StreamingConfig::default()
        };
        (
            MtResource::new(ChunkRegistry::new(4)),
            Arc::new(VoxelGenerator::new(&config)),
        )
    }

    #[test]
    fn test_stores_generated_grid() {
        let (registry, generator) = setup();
        let coord = Point3::new(0, -1, 2);
        registry.get_mut().ensure_data(coord);

        let result = ChunkGenerationTask::new(registry.clone(), generator.clone(), coord).process();

        assert!(result.stored);
        let registry = registry.get();
        assert_eq!(registry.data_state(coord), DataState::Ready);
        assert_eq!(**registry.data(coord).unwrap().grid(), generator.generate(coord));
    }

    #[test]
    fn test_evicted_chunk_is_not_resurrected() {
        let (registry, generator) = setup();
        let coord = Point3::new(3, 3, 3);

        let result = ChunkGenerationTask::new(registry.clone(), generator, coord).process();

        assert!(!result.stored);
        assert_eq!(registry.get().data_state(coord), DataState::Unrequested);
    }
}
