//! # Voxel Data
//!
//! This module holds everything about chunk occupancy: how it is laid out,
//! generated, addressed and tracked.
//!
//! ## Architecture
//!
//! * **Chunk**: the occupancy grid of one chunk, one bit per voxel
//! * **Coordinates**: world/chunk conversion, adjacency and distances
//! * **Generation**: deterministic fractal-noise occupancy
//! * **Registry**: the data and mesh stores plus their work queues
//! * **Tasks**: background chunk generation
//!
//! ## Thread Safety
//!
//! Generated grids are immutable and shared as `Arc<VoxelGrid>`, so mesh tasks
//! read them without holding the registry lock. All registry mutation happens
//! under its single lock.

pub mod block_side;
pub mod chunk;
pub mod coordinates;
pub mod generation;
pub mod registry;
pub mod tasks;
