//! # Mesh Allocation Boundary
//!
//! The streaming core never touches renderer resources directly. Finished
//! vertex and index lists are handed to a [`MeshAllocator`], which turns them
//! into an opaque handle and later releases that handle again. All allocator
//! calls happen on the thread that owns the [`EngineState`](crate::EngineState).
//!
//! Two allocators ship with the crate:
//! - [`GpuMeshAllocator`](super::gpu_mesh_allocator::GpuMeshAllocator) uploads
//!   into `wgpu` buffers
//! - [`HeadlessMeshAllocator`] keeps byte counts only, for tools and tests
//!   running without a device

use std::collections::HashMap;

use log::warn;

use crate::{
    engine_state::{rendering::Vertex, voxels::coordinates::ChunkCoordinate},
    error::StreamingError,
};

/// Creates and releases renderer-owned mesh handles.
pub trait MeshAllocator {
    /// Opaque handle to renderer-owned geometry.
    type Handle: Clone + Send + Sync + 'static;

    /// Creates a mesh from a non-empty vertex and index list.
    ///
    /// # Errors
    /// [`StreamingError::MeshAllocation`] when the renderer is out of memory.
    /// The scheduler treats this as fatal and does not retry.
    fn create_mesh(
        &mut self,
        coord: ChunkCoordinate,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<Self::Handle, StreamingError>;

    /// Gives a handle back. Called exactly once per created handle.
    fn release_mesh(&mut self, handle: Self::Handle);

    /// Called at the end of every scheduling pass, after the render queue has
    /// been rebuilt without any released handle.
    fn end_pass(&mut self) {}
}

/// Handle produced by [`HeadlessMeshAllocator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HeadlessMesh {
    pub id: u64,
    pub coord: ChunkCoordinate,
    pub vertex_count: usize,
    pub index_count: usize,
}

/// Allocator that tracks meshes in memory without any device.
///
/// An optional byte budget makes creation fail the way an exhausted GPU would.
#[derive(Debug, Default)]
pub struct HeadlessMeshAllocator {
    next_id: u64,
    live: HashMap<u64, u64>,
    allocated_bytes: u64,
    byte_budget: Option<u64>,
    meshes_created: u64,
    meshes_released: u64,
}

impl HeadlessMeshAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creation fails once live meshes would exceed `byte_budget` bytes.
    pub fn with_byte_budget(byte_budget: u64) -> Self {
        HeadlessMeshAllocator {
            byte_budget: Some(byte_budget),
            ..Self::default()
        }
    }

    pub fn live_mesh_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, handle: &HeadlessMesh) -> bool {
        self.live.contains_key(&handle.id)
    }

    pub fn allocated_bytes(&self) -> u64 {
        self.allocated_bytes
    }

    pub fn meshes_created(&self) -> u64 {
        self.meshes_created
    }

    pub fn meshes_released(&self) -> u64 {
        self.meshes_released
    }
}

impl MeshAllocator for HeadlessMeshAllocator {
    type Handle = HeadlessMesh;

    fn create_mesh(
        &mut self,
        coord: ChunkCoordinate,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<HeadlessMesh, StreamingError> {
        let bytes = (std::mem::size_of_val(vertices) + std::mem::size_of_val(indices)) as u64;

        if let Some(budget) = self.byte_budget {
            if self.allocated_bytes + bytes > budget {
                return Err(StreamingError::MeshAllocation {
                    coord,
                    reason: format!(
                        "{} bytes requested with {} of {} bytes in use",
                        bytes, self.allocated_bytes, budget
                    ),
                });
            }
        }

        let id = self.next_id;
        self.next_id += 1;
        self.live.insert(id, bytes);
        self.allocated_bytes += bytes;
        self.meshes_created += 1;

        Ok(HeadlessMesh {
            id,
            coord,
            vertex_count: vertices.len(),
            index_count: indices.len(),
        })
    }

    fn release_mesh(&mut self, handle: HeadlessMesh) {
        match self.live.remove(&handle.id) {
            Some(bytes) => {
                self.allocated_bytes -= bytes;
                self.meshes_released += 1;
            }
            None => warn!("Mesh {} for chunk {:?} released twice", handle.id, handle.coord),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    #[test]
    fn test_tracks_live_meshes_and_bytes() {
        let mut allocator = HeadlessMeshAllocator::new();
        let vertices = [Vertex::default(); 4];
        let indices = [0, 1, 3, 0, 3, 2];

        let first = allocator.create_mesh(Point3::new(0, 0, 0), &vertices, &indices).unwrap();
        let second = allocator.create_mesh(Point3::new(1, 0, 0), &vertices, &indices).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(allocator.allocated_bytes(), 2 * (4 * 24 + 6 * 4));

        allocator.release_mesh(first.clone());
        assert!(!allocator.is_live(&first));
        assert!(allocator.is_live(&second));
        assert_eq!(allocator.live_mesh_count(), 1);
        assert_eq!(allocator.meshes_released(), 1);
    }

    #[test]
    fn test_budget_exhaustion_fails() {
        let mut allocator = HeadlessMeshAllocator::with_byte_budget(100);
        let result = allocator.create_mesh(Point3::new(2, 0, 0), &[Vertex::default(); 4], &[0; 6]);

        assert!(matches!(
            result,
            Err(StreamingError::MeshAllocation { coord, .. }) if coord == Point3::new(2, 0, 0)
        ));
        assert_eq!(allocator.live_mesh_count(), 0);
    }
}
