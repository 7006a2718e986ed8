//! # Voxel Task System
//!
//! Tasks related to voxel data generation, processed on the worker pool.

pub mod chunk_generation_task;
