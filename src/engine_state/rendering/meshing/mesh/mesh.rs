//! Face-culled mesh construction.
//!
//! Every solid voxel is tested on each of its six faces; a face becomes a quad
//! only when the voxel across it is empty, looking into the neighbouring chunk
//! for voxels on the border. The whole chunk ends up in one vertex list and one
//! index list, drawable with a single indexed call.

use crate::engine_state::{rendering::Vertex, voxels::block_side::BlockSide};

use super::{face::Face, neighbourhood::ChunkNeighbourhood};

/// Vertex and index data of one chunk mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// `true` if no face was emitted.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn face_count(&self) -> usize {
        self.vertices.len() / 4
    }

    /// Appends one quad, offsetting its indices by the running vertex count.
    pub fn push_face(&mut self, face: &Face) {
        let indices = generate_face_indices(self.face_count() as u32);
        self.vertices.extend_from_slice(&face.vertices());
        self.indices.extend_from_slice(&indices);
    }

    /// Size of the vertex and index data in bytes.
    pub fn byte_size(&self) -> u64 {
        (std::mem::size_of_val(self.vertices.as_slice()) + std::mem::size_of_val(self.indices.as_slice())) as u64
    }
}

/// Index data for a face, adjusted by the number of previously generated faces.
///
/// The two triangles are `(ll, lr, ur)` and `(ll, ur, ul)`.
pub fn generate_face_indices(num_faces_generated: u32) -> [u32; 6] {
    let base = num_faces_generated * 4;
    [base, base + 1, base + 3, base, base + 3, base + 2]
}

/// Builds the face-culled mesh of the neighbourhood's center chunk.
///
/// Voxels are visited in storage order and their faces tested in
/// [`BlockSide::MESHING_ORDER`], so the output is deterministic.
pub fn build_culled_mesh(neighbourhood: &ChunkNeighbourhood<'_>) -> MeshData {
    let mut mesh = MeshData::default();

    for position in neighbourhood.center().occupied_voxels() {
        for side in BlockSide::MESHING_ORDER {
            let normal = side.normal();
            let exposed = !neighbourhood.is_solid(
                position.x as i32 + normal.x,
                position.y as i32 + normal.y,
                position.z as i32 + normal.z,
            );

            if exposed {
                mesh.push_face(&Face::new(position.x, position.y, position.z, side));
            }
        }
    }

    mesh
}
