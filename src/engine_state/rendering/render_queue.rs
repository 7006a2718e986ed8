//! Distance-filtered list of meshes to draw this frame.

use cgmath::Point3;

use crate::engine_state::voxels::{
    coordinates::{chebyshev_distance, chunk_to_world, ChunkCoordinate},
    registry::ChunkRegistry,
};

/// One drawable chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderEntry<H> {
    pub coord: ChunkCoordinate,
    pub mesh: H,
    /// World position of the chunk's minimum corner; vertex positions are
    /// relative to it.
    pub origin: Point3<f32>,
}

/// Meshes within render distance, nearest first.
///
/// Rebuilt at the end of every scheduling pass. Ties in distance are broken by
/// coordinate so the order is stable between passes.
#[derive(Debug, Clone)]
pub struct RenderQueue<H> {
    entries: Vec<RenderEntry<H>>,
}

impl<H> Default for RenderQueue<H> {
    fn default() -> Self {
        RenderQueue {
            entries: Vec::new(),
        }
    }
}

impl<H: Clone> RenderQueue<H> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the queue with every ready mesh within `render_distance` of
    /// `center`.
    pub fn rebuild(&mut self, registry: &ChunkRegistry<H>, center: ChunkCoordinate, render_distance: i32) {
        let edge = registry.edge();
        self.entries.clear();
        self.entries.extend(
            registry
                .ready_meshes()
                .filter(|(coord, _)| chebyshev_distance(*coord, center) <= render_distance)
                .map(|(coord, mesh)| RenderEntry {
                    coord,
                    mesh: mesh.clone(),
                    origin: chunk_to_world(coord, edge),
                }),
        );
        self.entries.sort_by_key(|entry| {
            (
                chebyshev_distance(entry.coord, center),
                entry.coord.x,
                entry.coord.y,
                entry.coord.z,
            )
        });
    }

    pub fn entries(&self) -> &[RenderEntry<H>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &RenderEntry<H>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, coord: ChunkCoordinate) -> bool {
        self.entries.iter().any(|entry| entry.coord == coord)
    }
}
