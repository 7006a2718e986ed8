//! Rendering side of the streaming pipeline.
//!
//! This module covers everything between finished occupancy and the external
//! renderer: mesh building, the allocator boundary that turns meshes into
//! renderer handles, and the per-frame render queue.

pub mod gpu_mesh_allocator;
pub mod mesh_allocator;
pub mod meshing;
pub mod render_queue;
pub mod tasks;
mod vertex;

// Re-export commonly used types
pub use vertex::Vertex;
