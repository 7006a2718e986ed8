//! # Chunk Module
//!
//! This module provides [`VoxelGrid`], the occupancy data of one chunk: a cube
//! of `edge³` voxels, each either solid or empty.
//!
//! ## Memory Layout
//!
//! Occupancy is stored as a bit vector, one bit per voxel, in row-major order:
//! x varies fastest, then y, then z. A 16³ chunk therefore costs 512 bytes.
//!
//! ### Performance Characteristics
//! - **Solidity Check**: O(1) - just check the bit
//! - **Occupied Iteration**: skips runs of empty voxels word by word
//!   (see [`chunk_iteration`])

use bitvec::prelude::BitVec;
use cgmath::Point3;

pub mod chunk_iteration;

use chunk_iteration::ChunkBlockIterator;

/// Occupancy of one chunk.
///
/// Grids are built once (by the generator or a test) and then shared
/// read-only, so there is no incremental block editing API beyond
/// [`VoxelGrid::set_block_solid`] used while constructing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoxelGrid {
    /// Edge length in voxels.
    edge: usize,
    /// One bit per voxel, x fastest, then y, then z.
    solid_array: BitVec,
}

impl VoxelGrid {
    /// Creates a grid with every voxel empty.
    pub fn empty(edge: usize) -> Self {
        VoxelGrid {
            edge,
            solid_array: BitVec::repeat(false, edge * edge * edge),
        }
    }

    /// Creates a grid with every voxel solid.
    pub fn solid(edge: usize) -> Self {
        VoxelGrid {
            edge,
            solid_array: BitVec::repeat(true, edge * edge * edge),
        }
    }

    /// Builds a grid by evaluating `is_solid(x, y, z)` for every voxel,
    /// visiting z outermost and x innermost so bits are pushed in storage order.
    pub fn from_fn(edge: usize, mut is_solid: impl FnMut(usize, usize, usize) -> bool) -> Self {
        let mut solid_array = BitVec::with_capacity(edge * edge * edge);
        for z in 0..edge {
            for y in 0..edge {
                for x in 0..edge {
                    solid_array.push(is_solid(x, y, z));
                }
            }
        }

        VoxelGrid { edge, solid_array }
    }

    /// Edge length of the grid in voxels.
    pub fn edge(&self) -> usize {
        self.edge
    }

    fn index(&self, x: usize, y: usize, z: usize) -> usize {
        debug_assert!(x < self.edge && y < self.edge && z < self.edge);
        x + self.edge * (y + self.edge * z)
    }

    /// Checks if the voxel at the specified chunk-local coordinates is solid.
    ///
    /// # Panics
    /// Panics if the coordinates are out of bounds.
    pub fn is_block_solid(&self, x: usize, y: usize, z: usize) -> bool {
        self.solid_array[self.index(x, y, z)]
    }

    /// Updates the solid state of one voxel.
    pub fn set_block_solid(&mut self, x: usize, y: usize, z: usize, solid: bool) {
        let index = self.index(x, y, z);
        self.solid_array.set(index, solid);
    }

    /// Number of solid voxels.
    pub fn occupied_count(&self) -> usize {
        self.solid_array.count_ones()
    }

    /// `true` if no voxel is solid.
    pub fn is_empty(&self) -> bool {
        self.solid_array.not_any()
    }

    /// Iterates the chunk-local positions of all solid voxels in storage order.
    pub fn occupied_voxels(&self) -> ChunkBlockIterator<'_> {
        ChunkBlockIterator::new(self.edge, &self.solid_array)
    }

    /// Chunk-local position of the voxel stored at `index`.
    pub(crate) fn position_of(edge: usize, index: usize) -> Point3<usize> {
        Point3::new(index % edge, (index / edge) % edge, index / (edge * edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_solid() {
        let empty = VoxelGrid::empty(4);
        assert!(empty.is_empty());
        assert_eq!(empty.occupied_count(), 0);

        let solid = VoxelGrid::solid(4);
        assert!(!solid.is_empty());
        assert_eq!(solid.occupied_count(), 64);
    }

    #[test]
    fn test_from_fn_matches_lookup() {
        let grid = VoxelGrid::from_fn(5, |x, y, z| (x + 2 * y + 3 * z) % 4 == 0);
        for z in 0..5 {
            for y in 0..5 {
                for x in 0..5 {
                    assert_eq!(grid.is_block_solid(x, y, z), (x + 2 * y + 3 * z) % 4 == 0);
                }
            }
        }
    }

    #[test]
    fn test_set_block_solid() {
        let mut grid = VoxelGrid::empty(3);
        grid.set_block_solid(2, 1, 0, true);
        assert!(grid.is_block_solid(2, 1, 0));
        assert!(!grid.is_block_solid(1, 2, 0));
        assert_eq!(grid.occupied_count(), 1);
    }
}
