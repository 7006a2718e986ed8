//! Mesh generation for voxel rendering.
//!
//! Meshing runs on worker threads and produces plain vertex and index lists
//! ([`MeshData`]). Turning those into renderer-owned geometry happens later on
//! the owning thread, through a [`MeshAllocator`](super::mesh_allocator::MeshAllocator).
//!
//! # Architecture
//! - `mesh/`: face culling, quad emission and the neighbourhood view

pub mod mesh;

pub use mesh::{build_culled_mesh, ChunkNeighbourhood, Face, MeshData};
