//! # GPU Mesh Allocator
//!
//! Uploads chunk meshes into `wgpu` vertex and index buffers, one pair per
//! chunk, and keeps simple memory analytics.
//!
//! Buffer creation runs inside an out-of-memory error scope so exhaustion is
//! reported as [`StreamingError::MeshAllocation`] instead of surfacing later as
//! an uncaptured device error. Released buffers are destroyed at the end of the
//! pass, once the render queue no longer references them.

use std::sync::Arc;

use log::{debug, info};
use wgpu::{util::DeviceExt, Buffer, Device};

use crate::{
    engine_state::{rendering::Vertex, voxels::coordinates::ChunkCoordinate},
    error::StreamingError,
};

use super::mesh_allocator::MeshAllocator;

/// Handle to one chunk's GPU geometry.
#[derive(Debug, Clone)]
pub struct GpuMesh {
    pub vertex_buffer: Arc<Buffer>,
    pub index_buffer: Arc<Buffer>,
    /// Number of indices to draw.
    pub index_count: u32,
}

impl GpuMesh {
    fn byte_size(&self) -> u64 {
        self.vertex_buffer.size() + self.index_buffer.size()
    }
}

/// Memory analytics of the allocator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MeshMemoryAnalytics {
    /// Bytes held by live meshes
    pub allocated_memory: u64,
    pub live_meshes: u64,
    /// Meshes created over the allocator's lifetime
    pub times_created: u64,
}

/// [`MeshAllocator`] backed by a `wgpu` device.
pub struct GpuMeshAllocator {
    device: Arc<Device>,
    released: Vec<GpuMesh>,
    analytics: MeshMemoryAnalytics,
}

impl GpuMeshAllocator {
    pub fn new(device: Arc<Device>) -> Self {
        GpuMeshAllocator {
            device,
            released: Vec::new(),
            analytics: MeshMemoryAnalytics::default(),
        }
    }

    /// Requests a device from the first available adapter, without a surface.
    ///
    /// # Errors
    /// [`StreamingError::DeviceUnavailable`] if there is no adapter or the
    /// device request fails.
    pub async fn request_headless_device() -> Result<(Arc<Device>, wgpu::Queue), StreamingError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            flags: wgpu::InstanceFlags::empty(),
            backend_options: wgpu::BackendOptions::from_env_or_default(),
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|error| StreamingError::DeviceUnavailable(error.to_string()))?;

        info!("Using adapter {:?}", adapter.get_info().name);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::downlevel_defaults(),
                label: Some("Voxel Streaming Device"),
                memory_hints: wgpu::MemoryHints::MemoryUsage,
                trace: wgpu::Trace::Off,
            })
            .await
            .map_err(|error| StreamingError::DeviceUnavailable(error.to_string()))?;

        Ok((Arc::new(device), queue))
    }

    pub fn analytics(&self) -> MeshMemoryAnalytics {
        self.analytics
    }
}

impl MeshAllocator for GpuMeshAllocator {
    type Handle = GpuMesh;

    fn create_mesh(
        &mut self,
        coord: ChunkCoordinate,
        vertices: &[Vertex],
        indices: &[u32],
    ) -> Result<GpuMesh, StreamingError> {
        self.device.push_error_scope(wgpu::ErrorFilter::OutOfMemory);

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Chunk Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Chunk Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        if let Some(error) = pollster::block_on(self.device.pop_error_scope()) {
            vertex_buffer.destroy();
            index_buffer.destroy();
            return Err(StreamingError::MeshAllocation {
                coord,
                reason: error.to_string(),
            });
        }

        let mesh = GpuMesh {
            vertex_buffer: Arc::new(vertex_buffer),
            index_buffer: Arc::new(index_buffer),
            index_count: indices.len() as u32,
        };

        self.analytics.allocated_memory += mesh.byte_size();
        self.analytics.live_meshes += 1;
        self.analytics.times_created += 1;

        Ok(mesh)
    }

    fn release_mesh(&mut self, handle: GpuMesh) {
        self.analytics.allocated_memory -= handle.byte_size();
        self.analytics.live_meshes -= 1;
        self.released.push(handle);
    }

    fn end_pass(&mut self) {
        if self.released.is_empty() {
            return;
        }

        debug!("Destroying {} released chunk meshes", self.released.len());
        for mesh in self.released.drain(..) {
            mesh.vertex_buffer.destroy();
            mesh.index_buffer.destroy();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Point3;

    use crate::engine_state::{
        rendering::meshing::{build_culled_mesh, ChunkNeighbourhood},
        voxels::chunk::VoxelGrid,
    };

    #[test]
    fn test_upload_and_release_when_a_device_exists() {
        let Ok((device, _queue)) = pollster::block_on(GpuMeshAllocator::request_headless_device()) else {
            return;
        };
        let mut allocator = GpuMeshAllocator::new(device);

        let center = VoxelGrid::solid(2);
        let empty = VoxelGrid::empty(2);
        let mesh = build_culled_mesh(&ChunkNeighbourhood::new(&center, [&empty; 6]));

        let handle = allocator
            .create_mesh(Point3::new(0, 0, 0), &mesh.vertices, &mesh.indices)
            .unwrap();
        assert_eq!(handle.index_count, 144);
        assert_eq!(allocator.analytics().live_meshes, 1);
        assert_eq!(allocator.analytics().allocated_memory, mesh.byte_size());

        allocator.release_mesh(handle);
        allocator.end_pass();
        assert_eq!(allocator.analytics().live_meshes, 0);
        assert_eq!(allocator.analytics().allocated_memory, 0);
    }
}
