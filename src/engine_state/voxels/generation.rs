//! # Voxel Data Generation
//!
//! Turns a chunk coordinate into its occupancy grid by sampling fractal
//! (multi-octave) Perlin noise at every voxel of the chunk.
//!
//! The generator is a pure function of its configuration and the coordinate:
//! the same seed and coordinate always produce a bit-identical grid, which lets
//! the scheduler discard and regenerate chunk data freely.

use cgmath::Point3;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::config::StreamingConfig;

use super::{chunk::VoxelGrid, coordinates::ChunkCoordinate};

/// Deterministic occupancy generator shared by all data generation tasks.
pub struct VoxelGenerator {
    noise: Fbm<Perlin>,
    edge: usize,
    threshold: f64,
}

impl VoxelGenerator {
    /// Creates a generator from the noise knobs of `config`.
    pub fn new(config: &StreamingConfig) -> Self {
        let noise = Fbm::<Perlin>::new(config.noise_seed)
            .set_octaves(config.noise_octaves)
            .set_frequency(config.noise_frequency)
            .set_persistence(0.5)
            .set_lacunarity(2.0);

        VoxelGenerator {
            noise,
            edge: config.chunk_edge,
            threshold: config.occupancy_threshold,
        }
    }

    /// Samples the noise at a world-space voxel position, remapped to [0, 1].
    pub fn sample(&self, voxel: Point3<i32>) -> f64 {
        let raw = self
            .noise
            .get([voxel.x as f64, voxel.y as f64, voxel.z as f64]);
        ((raw + 1.0) * 0.5).clamp(0.0, 1.0)
    }

    /// Generates the occupancy grid of `coord`.
    ///
    /// A voxel is solid when its sample is strictly above the threshold.
    pub fn generate(&self, coord: ChunkCoordinate) -> VoxelGrid {
        let edge = self.edge as i32;
        let origin = Point3::new(coord.x * edge, coord.y * edge, coord.z * edge);

        VoxelGrid::from_fn(self.edge, |x, y, z| {
            let voxel = Point3::new(
                origin.x + x as i32,
                origin.y + y as i32,
                origin.z + z as i32,
            );
            self.sample(voxel) > self.threshold
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> StreamingConfig {
        StreamingConfig {
            chunk_edge: 8,
            noise_frequency: 0.11,
            ..StreamingConfig::default()
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let generator = VoxelGenerator::new(&small_config());
        let coord = Point3::new(3, -1, 7);

        assert_eq!(generator.generate(coord), generator.generate(coord));

        let other_generator = VoxelGenerator::new(&small_config());
        assert_eq!(generator.generate(coord), other_generator.generate(coord));
    }

    #[test]
    fn test_samples_stay_in_unit_range() {
        let generator = VoxelGenerator::new(&small_config());
        for i in -20..20 {
            let sample = generator.sample(Point3::new(i * 7, i * 3, -i * 5));
            assert!((0.0..=1.0).contains(&sample));
        }
    }

    #[test]
    fn test_threshold_extremes() {
        let none = VoxelGenerator::new(&StreamingConfig {
            occupancy_threshold: 1.0,
            ..small_config()
        });
        assert!(none.generate(Point3::new(0, 0, 0)).is_empty());

        let grid = VoxelGenerator::new(&small_config()).generate(Point3::new(0, 0, 0));
        assert_eq!(grid.edge(), 8);
    }

    #[test]
    fn test_neighbouring_chunks_differ() {
        let generator = VoxelGenerator::new(&small_config());
        let mut distinct = false;
        for x in 1..6 {
            if generator.generate(Point3::new(0, 0, 0)) != generator.generate(Point3::new(x, 2, 0)) {
                distinct = true;
            }
        }
        assert!(distinct);
    }
}
