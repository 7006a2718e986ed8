//! Vertex data structure for voxel rendering.
//!
//! This module defines the vertex format emitted by the mesher and uploaded by
//! the mesh allocators.

use cgmath::Point3;

use crate::engine_state::voxels::block_side::BlockSide;

/// A vertex of a chunk mesh.
///
/// Positions are chunk-local voxel corners; the renderer adds the chunk origin
/// from the render queue entry. The face a vertex belongs to is recorded as its
/// [`BlockSide`] discriminant so the shader can recover the normal.
///
/// # Memory Layout
/// - Position: 3x i32 (12 bytes)
/// - Side: u32 (4 bytes)
/// - Texture Coordinates: [f32; 2] (8 bytes)
///
/// Total size: 24 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    x: i32,
    y: i32,
    z: i32,
    side: u32,
    /// UV texture coordinates, one unit per voxel
    tex_coords: [f32; 2],
}

impl Vertex {
    /// Creates a vertex at a chunk-local corner.
    pub fn new(pos: Point3<i32>, side: BlockSide, u: u8, v: u8) -> Self {
        Vertex {
            x: pos.x,
            y: pos.y,
            z: pos.z,
            side: side as u32,
            tex_coords: [u as f32, v as f32],
        }
    }

    pub fn position(&self) -> Point3<i32> {
        Point3::new(self.x, self.y, self.z)
    }

    /// Discriminant of the [`BlockSide`] this vertex's face points along.
    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn tex_coords(&self) -> [f32; 2] {
        self.tex_coords
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_casts_to_bytes() {
        let vertex = Vertex::new(Point3::new(1, 2, 3), BlockSide::TOP, 1, 0);
        let bytes: &[u8] = bytemuck::bytes_of(&vertex);
        assert_eq!(bytes.len(), 24);
        assert_eq!(vertex.side(), BlockSide::TOP as u32);
        assert_eq!(vertex.position(), Point3::new(1, 2, 3));
    }
}
