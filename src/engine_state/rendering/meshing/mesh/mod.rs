//! Mesh generation for voxel rendering.
//!
//! This module converts chunk occupancy into GPU-friendly vertex and index
//! lists using face culling: only faces between a solid and an empty voxel are
//! emitted.
//!
//! # Architecture
//! - [`MeshData`]: vertices and indices of one chunk
//! - [`Face`]: a single unit quad on one side of a voxel
//! - [`ChunkNeighbourhood`]: a chunk plus its six neighbours, for border culling
//!
//! # Usage
//! ```
//! use voxel_streaming::engine_state::{
//!     rendering::meshing::mesh::{build_culled_mesh, ChunkNeighbourhood},
//!     voxels::chunk::VoxelGrid,
//! };
//!
//! let center = VoxelGrid::solid(2);
//! let empty = VoxelGrid::empty(2);
//! let mesh = build_culled_mesh(&ChunkNeighbourhood::new(&center, [&empty; 6]));
//! assert_eq!(mesh.face_count(), 24);
//! ```

mod face;
#[allow(clippy::module_inception)]
mod mesh;
mod neighbourhood;

pub use face::Face;
pub use mesh::*;
pub use neighbourhood::ChunkNeighbourhood;
