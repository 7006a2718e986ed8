use cgmath::Point3;

use crate::engine_state::{rendering::Vertex, voxels::block_side::BlockSide};

/// Represents a single quad face of a voxel in the mesh.
///
/// A face is defined by four corner points (lower-left, lower-right, upper-left,
/// upper-right) in chunk-local voxel coordinates, and the side of the voxel it
/// covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Face {
    /// Lower-right corner of the face in chunk coordinates
    pub lr: Point3<usize>,
    /// Lower-left corner of the face in chunk coordinates
    pub ll: Point3<usize>,
    /// Upper-right corner of the face in chunk coordinates
    pub ur: Point3<usize>,
    /// Upper-left corner of the face in chunk coordinates
    pub ul: Point3<usize>,
    /// Which side of the voxel this face represents
    pub block_side: BlockSide,
}

impl Face {
    /// Creates the unit face on `block_side` of the voxel at `(i, j, k)`.
    ///
    /// The quad lies on the voxel's boundary plane in the direction of
    /// `block_side`: FRONT/BACK on the min/max X plane, BOTTOM/TOP on min/max
    /// Y, LEFT/RIGHT on min/max Z.
    pub fn new(i: usize, j: usize, k: usize, block_side: BlockSide) -> Self {
        match block_side {
            BlockSide::FRONT => Face {
                ll: Point3::new(i, j, k),
                lr: Point3::new(i, j, k + 1),
                ul: Point3::new(i, j + 1, k),
                ur: Point3::new(i, j + 1, k + 1),
                block_side,
            },

            BlockSide::BACK => Face {
                ll: Point3::new(i + 1, j, k + 1),
                lr: Point3::new(i + 1, j, k),
                ul: Point3::new(i + 1, j + 1, k + 1),
                ur: Point3::new(i + 1, j + 1, k),
                block_side,
            },

            BlockSide::BOTTOM => Face {
                ll: Point3::new(i, j, k + 1),
                lr: Point3::new(i, j, k),
                ul: Point3::new(i + 1, j, k + 1),
                ur: Point3::new(i + 1, j, k),
                block_side,
            },

            BlockSide::TOP => Face {
                ll: Point3::new(i, j + 1, k),
                lr: Point3::new(i, j + 1, k + 1),
                ul: Point3::new(i + 1, j + 1, k),
                ur: Point3::new(i + 1, j + 1, k + 1),
                block_side,
            },

            BlockSide::LEFT => Face {
                ll: Point3::new(i + 1, j, k),
                lr: Point3::new(i, j, k),
                ul: Point3::new(i + 1, j + 1, k),
                ur: Point3::new(i, j + 1, k),
                block_side,
            },

            BlockSide::RIGHT => Face {
                ll: Point3::new(i, j, k + 1),
                lr: Point3::new(i + 1, j, k + 1),
                ul: Point3::new(i, j + 1, k + 1),
                ur: Point3::new(i + 1, j + 1, k + 1),
                block_side,
            },
        }
    }

    /// The four corners as vertices, in the order ll, lr, ul, ur expected by
    /// [`generate_face_indices`](super::generate_face_indices).
    pub fn vertices(&self) -> [Vertex; 4] {
        [
            Vertex::new(corner(self.ll), self.block_side, 0, 1),
            Vertex::new(corner(self.lr), self.block_side, 1, 1),
            Vertex::new(corner(self.ul), self.block_side, 0, 0),
            Vertex::new(corner(self.ur), self.block_side, 1, 0),
        ]
    }
}

fn corner(point: Point3<usize>) -> Point3<i32> {
    Point3::new(point.x as i32, point.y as i32, point.z as i32)
}
