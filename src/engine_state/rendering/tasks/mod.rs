//! Background tasks for the rendering system.
//!
//! # Available Tasks
//! - `ChunkMeshGenerationTask`: builds chunk meshes in the background

pub mod chunk_mesh_generation_task;
