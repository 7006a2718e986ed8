//! # Coordinate System
//!
//! Conversions between continuous world positions and the discrete chunk grid.
//!
//! World positions are `Point3<f32>` in voxel units; a chunk coordinate is the
//! integer index of a cube of `edge³` voxels. Conversion uses **floor**
//! division on every axis, so world x in `[-edge, 0)` lands in chunk `-1`
//! rather than being folded into chunk `0` by truncation.

use cgmath::{Point3, Vector3};

use super::block_side::BlockSide;

/// Integer index of a chunk on the chunk grid.
pub type ChunkCoordinate = Point3<i32>;

/// Returns the chunk containing `world_position`.
///
/// # Examples
/// ```
/// use cgmath::Point3;
/// use voxel_streaming::world_to_chunk;
///
/// assert_eq!(world_to_chunk(Point3::new(15.9, 0.0, 16.0), 16), Point3::new(0, 0, 1));
/// assert_eq!(world_to_chunk(Point3::new(-0.5, -16.0, -16.5), 16), Point3::new(-1, -1, -2));
/// ```
pub fn world_to_chunk(world_position: Point3<f32>, edge: usize) -> ChunkCoordinate {
    let edge = edge as f32;
    Point3::new(
        (world_position.x / edge).floor() as i32,
        (world_position.y / edge).floor() as i32,
        (world_position.z / edge).floor() as i32,
    )
}

/// Returns the world position of the minimum corner of `coord`.
pub fn chunk_to_world(coord: ChunkCoordinate, edge: usize) -> Point3<f32> {
    let edge = edge as f32;
    Point3::new(
        coord.x as f32 * edge,
        coord.y as f32 * edge,
        coord.z as f32 * edge,
    )
}

/// The six face-adjacent chunks, indexed by [`BlockSide`] discriminant.
pub fn neighbours(coord: ChunkCoordinate) -> [ChunkCoordinate; 6] {
    BlockSide::all().map(|side| coord + side.normal())
}

/// Max of the absolute per-axis differences.
pub fn chebyshev_distance(a: ChunkCoordinate, b: ChunkCoordinate) -> i32 {
    let delta = a - b;
    delta.x.abs().max(delta.y.abs()).max(delta.z.abs())
}

/// Every chunk whose Chebyshev distance from `center` is at most `radius`,
/// iterated x outermost, then y, then z.
pub fn chunks_within(center: ChunkCoordinate, radius: i32) -> impl Iterator<Item = ChunkCoordinate> {
    (-radius..=radius).flat_map(move |x| {
        (-radius..=radius).flat_map(move |y| {
            (-radius..=radius).map(move |z| center + Vector3::new(x, y, z))
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_to_chunk_positive() {
        assert_eq!(world_to_chunk(Point3::new(0.0, 0.0, 0.0), 16), Point3::new(0, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(16.0, 0.0, 0.0), 16), Point3::new(1, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(31.99, 32.0, 47.0), 16), Point3::new(1, 2, 2));
    }

    #[test]
    fn test_world_to_chunk_negative_uses_floor() {
        assert_eq!(world_to_chunk(Point3::new(-1.0, 0.0, 0.0), 16), Point3::new(-1, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(-15.0, 0.0, 0.0), 16), Point3::new(-1, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(-16.0, 0.0, 0.0), 16), Point3::new(-1, 0, 0));
        assert_eq!(world_to_chunk(Point3::new(-16.01, 0.0, 0.0), 16), Point3::new(-2, 0, 0));
    }

    #[test]
    fn test_chunk_to_world_inverts_world_to_chunk() {
        let coord = Point3::new(-3, 2, 7);
        let world = chunk_to_world(coord, 16);
        assert_eq!(world, Point3::new(-48.0, 32.0, 112.0));
        assert_eq!(world_to_chunk(world, 16), coord);
    }

    #[test]
    fn test_neighbours_are_at_distance_one() {
        let center = Point3::new(4, -2, 9);
        let around = neighbours(center);
        for neighbour in around {
            assert_eq!(chebyshev_distance(center, neighbour), 1);
        }
        assert_eq!(around[BlockSide::TOP as usize], Point3::new(4, -1, 9));
        assert_eq!(around[BlockSide::FRONT as usize], Point3::new(3, -2, 9));
    }

    #[test]
    fn test_chebyshev_distance() {
        assert_eq!(chebyshev_distance(Point3::new(0, 0, 0), Point3::new(6, 0, 0)), 6);
        assert_eq!(chebyshev_distance(Point3::new(1, 1, 1), Point3::new(-2, 3, 0)), 3);
    }

    #[test]
    fn test_chunks_within_cube() {
        let center = Point3::new(1, 0, 0);
        let cube: Vec<_> = chunks_within(center, 2).collect();
        assert_eq!(cube.len(), 125);
        assert!(cube.iter().all(|c| chebyshev_distance(center, *c) <= 2));
        assert_eq!(cube[0], Point3::new(-1, -2, -2));
    }
}
