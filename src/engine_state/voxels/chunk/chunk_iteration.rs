//! # Chunk Iteration Module
//!
//! An iterator over the solid voxels of a [`VoxelGrid`](super::VoxelGrid).
//!
//! Rather than testing every bit, the iterator walks the set bits of the
//! occupancy vector directly, so sparse chunks cost time proportional to their
//! solid voxel count and fully empty chunks cost one pass over the words.

use bitvec::{order::Lsb0, slice::IterOnes};
use cgmath::Point3;

use super::VoxelGrid;

/// An iterator over the chunk-local positions of all solid voxels.
///
/// Positions come out in storage order: x fastest, then y, then z. The mesher
/// relies on this for a fixed face emission order.
pub struct ChunkBlockIterator<'a> {
    edge: usize,
    set_bits: IterOnes<'a, usize, Lsb0>,
}

impl<'a> ChunkBlockIterator<'a> {
    pub(super) fn new(edge: usize, solid_array: &'a bitvec::slice::BitSlice) -> Self {
        ChunkBlockIterator {
            edge,
            set_bits: solid_array.iter_ones(),
        }
    }
}

impl Iterator for ChunkBlockIterator<'_> {
    type Item = Point3<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        self.set_bits
            .next()
            .map(|index| VoxelGrid::position_of(self.edge, index))
    }
}
