use crate::engine_state::voxels::{block_side::BlockSide, chunk::VoxelGrid};

/// Read-only view of a chunk and its six face neighbours, used to decide
/// face visibility across chunk borders.
#[derive(Clone, Copy)]
pub struct ChunkNeighbourhood<'a> {
    center: &'a VoxelGrid,
    /// Indexed by [`BlockSide`] discriminant.
    neighbours: [&'a VoxelGrid; 6],
}

impl<'a> ChunkNeighbourhood<'a> {
    pub fn new(center: &'a VoxelGrid, neighbours: [&'a VoxelGrid; 6]) -> Self {
        debug_assert!(neighbours
            .iter()
            .all(|neighbour| neighbour.edge() == center.edge()));
        ChunkNeighbourhood { center, neighbours }
    }

    pub fn center(&self) -> &'a VoxelGrid {
        self.center
    }

    /// Solidity of a voxel given in the center chunk's local coordinates.
    ///
    /// Coordinates one step outside the chunk along a single axis resolve into
    /// the matching neighbour. Anything further out, including diagonal
    /// positions, is treated as empty; face tests never reach those.
    pub fn is_solid(&self, x: i32, y: i32, z: i32) -> bool {
        let edge = self.center.edge() as i32;
        let inside = |v: i32| (0..edge).contains(&v);

        let side = match (inside(x), inside(y), inside(z)) {
            (true, true, true) => {
                return self
                    .center
                    .is_block_solid(x as usize, y as usize, z as usize)
            }
            (false, true, true) if x == -1 => BlockSide::FRONT,
            (false, true, true) if x == edge => BlockSide::BACK,
            (true, false, true) if y == -1 => BlockSide::BOTTOM,
            (true, false, true) if y == edge => BlockSide::TOP,
            (true, true, false) if z == -1 => BlockSide::LEFT,
            (true, true, false) if z == edge => BlockSide::RIGHT,
            _ => return false,
        };

        self.neighbours[side as usize].is_block_solid(
            x.rem_euclid(edge) as usize,
            y.rem_euclid(edge) as usize,
            z.rem_euclid(edge) as usize,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_reads_neighbour() {
        let center = VoxelGrid::empty(4);
        let empty = VoxelGrid::empty(4);
        let mut top = VoxelGrid::empty(4);
        top.set_block_solid(1, 0, 2, true);

        let mut neighbours = [&empty; 6];
        neighbours[BlockSide::TOP as usize] = &top;
        let neighbourhood = ChunkNeighbourhood::new(&center, neighbours);

        assert!(neighbourhood.is_solid(1, 4, 2));
        assert!(!neighbourhood.is_solid(1, 3, 2));
        assert!(!neighbourhood.is_solid(1, -1, 2));
        assert!(!neighbourhood.is_solid(-1, 4, 2));
    }
}
