//! # Block Side Module
//!
//! The six axis-aligned faces of a voxel, shared by chunk adjacency (which
//! neighbour lies across a face) and meshing (which quad a face emits).

use cgmath::Vector3;

/// Represents the six possible faces of a voxel block.
///
/// Each variant carries a stable integer value that is written into every
/// emitted vertex, so the renderer can recover the face normal.
#[derive(PartialEq, Eq, Hash, Copy, Clone, Debug)]
pub enum BlockSide {
    /// The face on the minimum X plane
    FRONT = 0,

    /// The face on the maximum X plane
    BACK = 1,

    /// The face on the minimum Y plane
    BOTTOM = 2,

    /// The face on the maximum Y plane
    TOP = 3,

    /// The face on the minimum Z plane
    LEFT = 4,

    /// The face on the maximum Z plane
    RIGHT = 5,
}

impl BlockSide {
    /// Order in which the mesher tests the faces of each voxel:
    /// down, up, left, right, back, front.
    pub const MESHING_ORDER: [BlockSide; 6] = [
        BlockSide::BOTTOM,
        BlockSide::TOP,
        BlockSide::LEFT,
        BlockSide::RIGHT,
        BlockSide::BACK,
        BlockSide::FRONT,
    ];

    /// Returns an array containing all six block faces in discriminant order.
    pub fn all() -> [BlockSide; 6] {
        [
            BlockSide::FRONT,
            BlockSide::BACK,
            BlockSide::BOTTOM,
            BlockSide::TOP,
            BlockSide::LEFT,
            BlockSide::RIGHT,
        ]
    }

    /// Unit offset from a voxel (or chunk) to the one sharing this face.
    pub fn normal(self) -> Vector3<i32> {
        match self {
            BlockSide::FRONT => Vector3::new(-1, 0, 0),
            BlockSide::BACK => Vector3::new(1, 0, 0),
            BlockSide::BOTTOM => Vector3::new(0, -1, 0),
            BlockSide::TOP => Vector3::new(0, 1, 0),
            BlockSide::LEFT => Vector3::new(0, 0, -1),
            BlockSide::RIGHT => Vector3::new(0, 0, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normals_are_distinct_and_cancel() {
        let normals = BlockSide::all().map(BlockSide::normal);
        let sum = normals
            .iter()
            .fold(Vector3::new(0, 0, 0), |acc, normal| acc + *normal);

        assert_eq!(sum, Vector3::new(0, 0, 0));
        for (i, normal) in normals.iter().enumerate() {
            assert!(!normals[i + 1..].contains(normal));
        }
    }

    #[test]
    fn test_meshing_order_covers_every_side() {
        for side in BlockSide::all() {
            assert_eq!(
                BlockSide::MESHING_ORDER.iter().filter(|s| **s == side).count(),
                1
            );
        }
    }
}
