//! Task for building chunk meshes in a background thread.
//!
//! The task owns shared references to the grids it needs, captured under the
//! registry lock at dispatch time, so building never takes the lock.

use log::trace;
use web_time::Instant;

use crate::engine_state::{
    rendering::meshing::{build_culled_mesh, ChunkNeighbourhood, MeshData},
    task_management::task::Task,
    voxels::{coordinates::ChunkCoordinate, registry::NeighbourhoodGrids},
};

/// Mesh produced off-thread, waiting to be turned into a renderer handle on
/// the owning thread.
#[derive(Debug)]
pub struct PendingMeshResult {
    pub coord: ChunkCoordinate,
    pub mesh: MeshData,
}

/// Builds the face-culled mesh of one chunk.
pub struct ChunkMeshGenerationTask {
    coord: ChunkCoordinate,
    grids: NeighbourhoodGrids,
}

impl ChunkMeshGenerationTask {
    pub fn new(coord: ChunkCoordinate, grids: NeighbourhoodGrids) -> Self {
        ChunkMeshGenerationTask { coord, grids }
    }
}

impl Task for ChunkMeshGenerationTask {
    type Output = PendingMeshResult;

    fn process(self) -> PendingMeshResult {
        let start = Instant::now();
        let neighbours = [
            self.grids.neighbours[0].as_ref(),
            self.grids.neighbours[1].as_ref(),
            self.grids.neighbours[2].as_ref(),
            self.grids.neighbours[3].as_ref(),
            self.grids.neighbours[4].as_ref(),
            self.grids.neighbours[5].as_ref(),
        ];
        let mesh = build_culled_mesh(&ChunkNeighbourhood::new(&self.grids.center, neighbours));

        trace!(
            "Meshed chunk {:?}: {} faces in {:?}",
            self.coord,
            mesh.face_count(),
            start.elapsed()
        );

        PendingMeshResult {
            coord: self.coord,
            mesh,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine_state::voxels::chunk::VoxelGrid;
    use cgmath::Point3;
    use std::sync::Arc;

    #[test]
    fn test_builds_from_captured_grids() {
        let empty = Arc::new(VoxelGrid::empty(2));
        let grids = NeighbourhoodGrids {
            center: Arc::new(VoxelGrid::solid(2)),
            neighbours: std::array::from_fn(|_| empty.clone()),
        };

        let result = ChunkMeshGenerationTask::new(Point3::new(1, 2, 3), grids).process();

        assert_eq!(result.coord, Point3::new(1, 2, 3));
        assert_eq!(result.mesh.face_count(), 24);
    }
}
