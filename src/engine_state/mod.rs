//! # Engine State Module
//!
//! The streaming scheduler and the subsystems it drives.
//!
//! ## Key Components
//!
//! * `EngineState` - owns the registry, the worker pool and the mesh allocator,
//!   and runs one scheduling pass per [`EngineState::update`]
//! * `rendering` - mesh building, the allocator boundary and the render queue
//! * `task_management` - the worker pool and task handles
//! * `voxels` - chunk occupancy, generation and the chunk registry
//!
//! ## Scheduling Pass
//!
//! Each call to [`EngineState::update`] runs, in order:
//!
//! 1. Convert the observer position to its chunk (floor division)
//! 2. Collect finished background work
//! 3. Evict meshes beyond render distance and data nobody needs any more
//! 4. Request data and mesh slots for every chunk within render distance, and
//!    request again any data a queued mesh still waits on
//! 5. Dispatch data generation jobs, up to the per-pass budget
//! 6. Dispatch mesh jobs whose neighbourhood is fully generated, up to the
//!    per-pass budget
//! 7. Collect finished background work again
//! 8. Rebuild the render queue and close the pass on the allocator
//!
//! Only the owning thread touches the mesh store and the allocator. Workers
//! write generated data into the registry under its lock and hand meshes back
//! through [`TaskHandle`]s.

use std::sync::Arc;

use cgmath::Point3;
use log::{debug, error, trace};
use web_time::Instant;

use crate::{config::StreamingConfig, core::MtResource, error::StreamingError};

use rendering::{
    mesh_allocator::MeshAllocator,
    render_queue::RenderQueue,
    tasks::chunk_mesh_generation_task::{ChunkMeshGenerationTask, PendingMeshResult},
};
use task_management::{TaskHandle, TaskManager};
use voxels::{
    coordinates::{chebyshev_distance, chunks_within, neighbours, world_to_chunk, ChunkCoordinate},
    generation::VoxelGenerator,
    registry::{ChunkMesh, ChunkRegistry, DataState, MeshQueueHead, MeshState},
    tasks::chunk_generation_task::{ChunkGenerationResult, ChunkGenerationTask},
};

pub mod rendering;
pub mod stats;
pub mod task_management;
pub mod voxels;

pub use stats::StreamingStats;

/// The streaming scheduler.
///
/// # Examples
///
/// ```
/// use cgmath::Point3;
/// use voxel_streaming::{EngineState, HeadlessMeshAllocator, StreamingConfig};
///
/// let config = StreamingConfig {
///     chunk_edge: 4,
///     render_distance: 1,
///     worker_threads: 2,
///     ..StreamingConfig::default()
/// };
/// let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
///
/// for _ in 0..3 {
///     engine_state.update(Point3::new(0.0, 0.0, 0.0)).unwrap();
///     engine_state.wait_for_idle().unwrap();
/// }
/// assert!(engine_state.render_queue().len() <= 27);
/// ```
pub struct EngineState<A: MeshAllocator> {
    config: StreamingConfig,
    /// Both chunk stores and their queues, behind the single lock
    registry: MtResource<ChunkRegistry<A::Handle>>,
    generator: Arc<VoxelGenerator>,
    /// Task manager for asynchronous operations
    task_manager: TaskManager,
    allocator: A,
    /// Current chunk position of the observer
    current_player_chunk_position: ChunkCoordinate,
    data_tasks: Vec<(ChunkCoordinate, TaskHandle<ChunkGenerationResult>)>,
    mesh_tasks: Vec<(ChunkCoordinate, TaskHandle<PendingMeshResult>)>,
    render_queue: RenderQueue<A::Handle>,
    stats: StreamingStats,
}

impl<A: MeshAllocator> EngineState<A> {
    /// Validates `config`, spawns the worker pool and creates an empty world.
    pub fn new(config: StreamingConfig, allocator: A) -> Result<Self, StreamingError> {
        config.validate()?;

        let task_manager = TaskManager::new(config.worker_threads)?;
        let generator = Arc::new(VoxelGenerator::new(&config));
        let registry = MtResource::new(ChunkRegistry::new(config.chunk_edge));

        debug!(
            "Streaming {}³ chunks at render distance {} on {} workers",
            config.chunk_edge,
            config.render_distance,
            task_manager.num_workers()
        );

        Ok(Self {
            config,
            registry,
            generator,
            task_manager,
            allocator,
            current_player_chunk_position: Point3::new(0, 0, 0),
            data_tasks: Vec::new(),
            mesh_tasks: Vec::new(),
            render_queue: RenderQueue::new(),
            stats: StreamingStats::default(),
        })
    }

    /// Runs one scheduling pass around the observer's world position.
    ///
    /// # Errors
    /// Propagates [`StreamingError::MeshAllocation`] from the allocator. The
    /// pass is abandoned at that point; the error is not retried.
    pub fn update(&mut self, observer: Point3<f32>) -> Result<(), StreamingError> {
        let start = Instant::now();
        let center = world_to_chunk(observer, self.config.chunk_edge);
        if center != self.current_player_chunk_position {
            debug!("Observer entered chunk {:?}", center);
            self.current_player_chunk_position = center;
        }

        self.collect_finished_tasks()?;
        self.evict_out_of_range(center);
        self.request_chunks_around(center);
        self.dispatch_data_tasks();
        self.dispatch_mesh_tasks();
        self.collect_finished_tasks()?;

        self.render_queue
            .rebuild(&self.registry.get(), center, self.config.render_distance);
        self.allocator.end_pass();
        self.stats.passes += 1;

        let registry = self.registry.get();
        debug!(
            "Pass around {:?} in {:?}: {} data, {} meshes, {} data queued, {} mesh queued, {} in flight, {} to render",
            center,
            start.elapsed(),
            registry.data_count(),
            registry.mesh_count(),
            registry.data_queue_len(),
            registry.mesh_queue_len(),
            self.data_tasks.len() + self.mesh_tasks.len(),
            self.render_queue.len()
        );
        trace!("{}", self.stats);

        Ok(())
    }

    /// Blocks until all background work has finished, then commits every
    /// finished mesh. Work the blocked mesh queue has not dispatched yet is
    /// left for the next [`EngineState::update`].
    pub fn wait_for_idle(&mut self) -> Result<(), StreamingError> {
        self.task_manager.wait_for_idle();
        self.collect_finished_tasks()
    }

    fn collect_finished_tasks(&mut self) -> Result<(), StreamingError> {
        self.task_manager.process_completed_tasks();
        self.task_manager.process_queued_tasks();

        for (coord, mut handle) in std::mem::take(&mut self.data_tasks) {
            match handle.try_take() {
                None => self.data_tasks.push((coord, handle)),
                Some(Ok(result)) if !result.stored => {
                    trace!("Dropped generated data for evicted chunk {:?}", coord);
                    self.stats.stale_results_dropped += 1;
                }
                Some(Ok(_)) => {}
                Some(Err(error)) => {
                    error!("Generating chunk {:?} failed: {}", coord, error);
                    self.stats.failed_tasks += 1;
                    self.registry.get_mut().evict_data(coord);
                }
            }
        }

        let mut mesh_tasks = std::mem::take(&mut self.mesh_tasks).into_iter();
        while let Some((coord, mut handle)) = mesh_tasks.next() {
            match handle.try_take() {
                None => self.mesh_tasks.push((coord, handle)),
                Some(Ok(result)) => {
                    if let Err(error) = self.commit_mesh_result(result) {
                        self.mesh_tasks.extend(mesh_tasks);
                        return Err(error);
                    }
                }
                Some(Err(error)) => {
                    error!("Meshing chunk {:?} failed: {}", coord, error);
                    self.stats.failed_tasks += 1;
                    self.registry
                        .get_mut()
                        .evict_mesh(coord, &mut self.allocator);
                }
            }
        }

        Ok(())
    }

    /// Turns a finished mesh into a committed slot. Results for slots that are
    /// no longer building are dropped without touching the allocator.
    fn commit_mesh_result(&mut self, result: PendingMeshResult) -> Result<(), StreamingError> {
        let PendingMeshResult { coord, mesh } = result;

        if !self.registry.get().is_mesh_building(coord) {
            trace!("Dropped mesh for evicted chunk {:?}", coord);
            self.stats.stale_results_dropped += 1;
            return Ok(());
        }

        let committed = if mesh.is_empty() {
            ChunkMesh::Empty
        } else {
            ChunkMesh::Ready(
                self.allocator
                    .create_mesh(coord, &mesh.vertices, &mesh.indices)?,
            )
        };
        let is_empty = matches!(committed, ChunkMesh::Empty);

        if let Err(rejected) = self.registry.get_mut().commit_mesh(coord, committed) {
            if let ChunkMesh::Ready(handle) = rejected {
                self.allocator.release_mesh(handle);
            }
            return Ok(());
        }

        if is_empty {
            self.stats.empty_meshes += 1;
        } else {
            self.stats.meshes_committed += 1;
        }
        Ok(())
    }

    fn evict_out_of_range(&mut self, center: ChunkCoordinate) {
        let render_distance = self.config.render_distance;
        let retention_distance = self.config.data_retention_distance();
        let mut registry = self.registry.get_mut();

        let meshes: Vec<_> = registry
            .mesh_coordinates()
            .filter(|coord| chebyshev_distance(*coord, center) > render_distance)
            .collect();
        for coord in &meshes {
            registry.evict_mesh(*coord, &mut self.allocator);
        }

        let data: Vec<_> = registry
            .data_coordinates()
            .filter(|coord| {
                chebyshev_distance(*coord, center) > retention_distance
                    || registry.is_data_unneeded(*coord)
            })
            .collect();
        for coord in &data {
            registry.evict_data(*coord);
        }

        if !meshes.is_empty() || !data.is_empty() {
            trace!("Evicted {} meshes and {} data chunks", meshes.len(), data.len());
        }
        self.stats.meshes_evicted += meshes.len() as u64;
        self.stats.data_evicted += data.len() as u64;
    }

    fn request_chunks_around(&mut self, center: ChunkCoordinate) {
        let mut registry = self.registry.get_mut();

        for coord in chunks_within(center, self.config.render_distance) {
            match registry.mesh_state(coord) {
                MeshState::Unrequested => {}
                // Data under a queued mesh is dropped when its generation fails.
                MeshState::Queued => {}
                _ => continue,
            }

            registry.ensure_data(coord);
            for neighbour in neighbours(coord) {
                registry.ensure_data(neighbour);
            }
            registry.ensure_mesh_slot(coord);
        }
    }

    fn dispatch_data_tasks(&mut self) {
        for _ in 0..self.config.max_data_jobs_per_pass {
            let Some(coord) = self.registry.get_mut().pop_data_job() else {
                break;
            };

            let task = ChunkGenerationTask::new(self.registry.clone(), self.generator.clone(), coord);
            self.data_tasks.push((coord, self.task_manager.publish_task(task)));
            self.stats.data_jobs_dispatched += 1;
        }
    }

    fn dispatch_mesh_tasks(&mut self) {
        for _ in 0..self.config.max_mesh_jobs_per_pass {
            let head = self.registry.get_mut().next_mesh_job();
            match head {
                MeshQueueHead::Ready(coord, grids) => {
                    debug_assert!(self.registry.get().neighbourhood_grids(coord).is_some());
                    let task = ChunkMeshGenerationTask::new(coord, grids);
                    self.mesh_tasks.push((coord, self.task_manager.publish_task(task)));
                    self.stats.mesh_jobs_dispatched += 1;
                }
                MeshQueueHead::Blocked(coord) => {
                    trace!("Mesh queue waiting on data around {:?}", coord);
                    self.stats.mesh_queue_stalls += 1;
                    break;
                }
                MeshQueueHead::Empty => break,
            }
        }
    }

    // ---- accessors ----

    /// Meshes to draw, nearest first, as of the last pass.
    pub fn render_queue(&self) -> &RenderQueue<A::Handle> {
        &self.render_queue
    }

    pub fn registry(&self) -> &MtResource<ChunkRegistry<A::Handle>> {
        &self.registry
    }

    pub fn data_state(&self, coord: ChunkCoordinate) -> DataState {
        self.registry.get().data_state(coord)
    }

    pub fn mesh_state(&self, coord: ChunkCoordinate) -> MeshState {
        self.registry.get().mesh_state(coord)
    }

    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    pub fn stats(&self) -> &StreamingStats {
        &self.stats
    }

    pub fn config(&self) -> &StreamingConfig {
        &self.config
    }

    /// Chunk the observer was in during the last pass.
    pub fn observer_chunk(&self) -> ChunkCoordinate {
        self.current_player_chunk_position
    }

    /// Background jobs whose results have not been collected yet.
    pub fn tasks_outstanding(&self) -> usize {
        self.data_tasks.len() + self.mesh_tasks.len()
    }
}

impl<A: MeshAllocator> Drop for EngineState<A> {
    fn drop(&mut self) {
        let mut registry = self.registry.get_mut();
        let meshes: Vec<_> = registry.mesh_coordinates().collect();
        for coord in meshes {
            registry.evict_mesh(coord, &mut self.allocator);
        }
        drop(registry);
        self.allocator.end_pass();
    }
}
