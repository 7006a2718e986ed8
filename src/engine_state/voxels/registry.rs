//! # Chunk Registry
//!
//! The registry owns every chunk the streaming world currently tracks, split
//! into two stores keyed by [`ChunkCoordinate`]:
//!
//! - the **data store**, holding each chunk's occupancy grid and whether its
//!   generation has finished, and
//! - the **mesh store**, holding each chunk's mesh state: queued, building,
//!   empty, or a renderer-owned handle.
//!
//! The data generation queue and the mesh generation queue live here too. The
//! whole registry sits behind a single [`MtResource`](crate::core::MtResource)
//! lock; every mutation happens with that lock held, and it is never held across
//! noise sampling or mesh building.
//!
//! ## Neighbour access
//!
//! Chunks never point at each other. A neighbour is found by computing its
//! coordinate and looking it up, so evicting a chunk can never leave a
//! dangling reference behind.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use log::trace;

use crate::engine_state::rendering::mesh_allocator::MeshAllocator;

use super::{
    chunk::VoxelGrid,
    coordinates::{neighbours, ChunkCoordinate},
};

/// Data store entry: a chunk's occupancy and its generation progress.
#[derive(Debug)]
pub struct ChunkData {
    grid: Arc<VoxelGrid>,
    dispatched: bool,
    processed: bool,
}

impl ChunkData {
    fn new(edge: usize) -> Self {
        ChunkData {
            grid: Arc::new(VoxelGrid::empty(edge)),
            dispatched: false,
            processed: false,
        }
    }

    /// The occupancy grid. All empty until [`ChunkData::is_processed`].
    pub fn grid(&self) -> &Arc<VoxelGrid> {
        &self.grid
    }

    /// `true` once the generator has written this chunk's grid.
    pub fn is_processed(&self) -> bool {
        self.processed
    }
}

/// Mesh store entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ChunkMesh<H> {
    /// Slot reserved and waiting in the mesh queue.
    Queued,
    /// A mesh task is running for this slot.
    Building,
    /// Meshing finished and produced no visible face.
    Empty,
    /// Meshing finished and the renderer holds the geometry.
    Ready(H),
}

impl<H> ChunkMesh<H> {
    /// `true` for [`ChunkMesh::Empty`] and [`ChunkMesh::Ready`].
    pub fn is_committed(&self) -> bool {
        matches!(self, ChunkMesh::Empty | ChunkMesh::Ready(_))
    }
}

/// Where a coordinate stands in the data store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataState {
    Unrequested,
    Queued,
    Generating,
    Ready,
}

/// Where a coordinate stands in the mesh store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeshState {
    Unrequested,
    Queued,
    Building,
    Empty,
    Ready,
}

/// The grids a mesh task needs: the chunk itself plus its six face neighbours,
/// indexed by [`BlockSide`](super::block_side::BlockSide) discriminant.
#[derive(Debug, Clone)]
pub struct NeighbourhoodGrids {
    pub center: Arc<VoxelGrid>,
    pub neighbours: [Arc<VoxelGrid>; 6],
}

/// Outcome of inspecting the head of the mesh queue.
#[derive(Debug)]
pub enum MeshQueueHead {
    /// The head was ready; it has been popped and marked as building.
    Ready(ChunkCoordinate, NeighbourhoodGrids),
    /// The head is still waiting on generation and stays at the front.
    Blocked(ChunkCoordinate),
    /// Nothing left to mesh.
    Empty,
}

/// Both chunk stores and their work queues.
pub struct ChunkRegistry<H> {
    edge: usize,
    data: HashMap<ChunkCoordinate, ChunkData>,
    meshes: HashMap<ChunkCoordinate, ChunkMesh<H>>,
    data_queue: VecDeque<ChunkCoordinate>,
    mesh_queue: VecDeque<ChunkCoordinate>,
}

impl<H> ChunkRegistry<H> {
    /// Creates an empty registry for chunks of `edge³` voxels.
    pub fn new(edge: usize) -> Self {
        ChunkRegistry {
            edge,
            data: HashMap::new(),
            meshes: HashMap::new(),
            data_queue: VecDeque::new(),
            mesh_queue: VecDeque::new(),
        }
    }

    // ---- data store ----

    /// Makes sure a data entry exists for `coord`.
    ///
    /// The first call creates an empty, unprocessed entry and enqueues exactly
    /// one generation job; later calls are no-ops. Returns `true` if the entry
    /// was created.
    pub fn ensure_data(&mut self, coord: ChunkCoordinate) -> bool {
        if self.data.contains_key(&coord) {
            return false;
        }

        self.data.insert(coord, ChunkData::new(self.edge));
        self.data_queue.push_back(coord);
        true
    }

    /// Stores the generated grid for `coord`.
    ///
    /// Generation writes each entry once. Returns `false`, discarding `grid`,
    /// when the entry has been evicted since the job was dispatched or has
    /// already been written.
    pub fn mark_data_processed(&mut self, coord: ChunkCoordinate, grid: VoxelGrid) -> bool {
        match self.data.get_mut(&coord) {
            Some(entry) if !entry.processed => {
                debug_assert_eq!(grid.edge(), self.edge);
                entry.grid = Arc::new(grid);
                entry.dispatched = true;
                entry.processed = true;
                true
            }
            _ => {
                trace!("Discarding generated data for chunk {:?}", coord);
                false
            }
        }
    }

    /// Returns the data entry of `coord`, if tracked.
    pub fn data(&self, coord: ChunkCoordinate) -> Option<&ChunkData> {
        self.data.get(&coord)
    }

    pub fn data_state(&self, coord: ChunkCoordinate) -> DataState {
        match self.data.get(&coord) {
            None => DataState::Unrequested,
            Some(entry) if entry.processed => DataState::Ready,
            Some(entry) if entry.dispatched => DataState::Generating,
            Some(_) => DataState::Queued,
        }
    }

    /// Removes the data entry of `coord`. Returns `true` if one existed.
    pub fn evict_data(&mut self, coord: ChunkCoordinate) -> bool {
        self.data.remove(&coord).is_some()
    }

    /// Pops the next coordinate whose generation should start and marks it as
    /// generating. Queue entries for evicted or already dispatched chunks are
    /// dropped on the way.
    pub fn pop_data_job(&mut self) -> Option<ChunkCoordinate> {
        while let Some(coord) = self.data_queue.pop_front() {
            if let Some(entry) = self.data.get_mut(&coord) {
                if !entry.dispatched {
                    entry.dispatched = true;
                    return Some(coord);
                }
            }
        }
        None
    }

    /// Coordinates of every tracked data entry.
    pub fn data_coordinates(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.data.keys().copied()
    }

    /// `true` if the chunk's own mesh and all six neighbours' meshes are
    /// committed, so no pending or future mesh job in range depends on its data.
    pub fn is_data_unneeded(&self, coord: ChunkCoordinate) -> bool {
        self.is_mesh_committed(coord)
            && neighbours(coord)
                .iter()
                .all(|neighbour| self.is_mesh_committed(*neighbour))
    }

    /// The grids of `coord` and its six neighbours, only if all seven have
    /// finished generating. This is the dependency gate for meshing.
    pub fn neighbourhood_grids(&self, coord: ChunkCoordinate) -> Option<NeighbourhoodGrids> {
        let center = self.processed_grid(coord)?;
        let around = neighbours(coord);
        let mut grids = Vec::with_capacity(6);
        for neighbour in around {
            grids.push(self.processed_grid(neighbour)?);
        }

        Some(NeighbourhoodGrids {
            center,
            neighbours: grids.try_into().ok()?,
        })
    }

    fn processed_grid(&self, coord: ChunkCoordinate) -> Option<Arc<VoxelGrid>> {
        self.data
            .get(&coord)
            .filter(|entry| entry.processed)
            .map(|entry| entry.grid.clone())
    }

    // ---- mesh store ----

    /// Reserves a queued mesh slot for `coord` and appends it to the mesh queue.
    ///
    /// The chunk's data entry must already exist. Returns `true` if the slot
    /// was created.
    pub fn ensure_mesh_slot(&mut self, coord: ChunkCoordinate) -> bool {
        if self.meshes.contains_key(&coord) {
            return false;
        }
        debug_assert!(
            self.data.contains_key(&coord),
            "chunk {:?} mesh-queued without data",
            coord
        );
        if !self.data.contains_key(&coord) {
            return false;
        }

        self.meshes.insert(coord, ChunkMesh::Queued);
        self.mesh_queue.push_back(coord);
        true
    }

    /// Pops the mesh queue head if its neighbourhood is fully generated.
    ///
    /// Entries whose slot was evicted or already dispatched are discarded.
    /// A live entry that is not ready yet stays at the front and blocks the
    /// queue, so meshing follows enqueue order.
    pub fn next_mesh_job(&mut self) -> MeshQueueHead {
        while let Some(&coord) = self.mesh_queue.front() {
            if !matches!(self.meshes.get(&coord), Some(ChunkMesh::Queued)) {
                self.mesh_queue.pop_front();
                continue;
            }

            return match self.neighbourhood_grids(coord) {
                Some(grids) => {
                    self.mesh_queue.pop_front();
                    self.meshes.insert(coord, ChunkMesh::Building);
                    MeshQueueHead::Ready(coord, grids)
                }
                None => MeshQueueHead::Blocked(coord),
            };
        }

        MeshQueueHead::Empty
    }

    /// `true` if a mesh task for `coord` is running and may still commit.
    pub fn is_mesh_building(&self, coord: ChunkCoordinate) -> bool {
        matches!(self.meshes.get(&coord), Some(ChunkMesh::Building))
    }

    pub fn is_mesh_committed(&self, coord: ChunkCoordinate) -> bool {
        self.meshes
            .get(&coord)
            .is_some_and(|mesh| mesh.is_committed())
    }

    /// Fills the building slot of `coord` with a finished mesh.
    ///
    /// If the slot is gone or not building, the mesh is handed back so the
    /// caller can release whatever it holds.
    pub fn commit_mesh(&mut self, coord: ChunkCoordinate, mesh: ChunkMesh<H>) -> Result<(), ChunkMesh<H>> {
        match self.meshes.get_mut(&coord) {
            Some(slot @ ChunkMesh::Building) => {
                *slot = mesh;
                Ok(())
            }
            _ => Err(mesh),
        }
    }

    pub fn mesh(&self, coord: ChunkCoordinate) -> Option<&ChunkMesh<H>> {
        self.meshes.get(&coord)
    }

    pub fn mesh_state(&self, coord: ChunkCoordinate) -> MeshState {
        match self.meshes.get(&coord) {
            None => MeshState::Unrequested,
            Some(ChunkMesh::Queued) => MeshState::Queued,
            Some(ChunkMesh::Building) => MeshState::Building,
            Some(ChunkMesh::Empty) => MeshState::Empty,
            Some(ChunkMesh::Ready(_)) => MeshState::Ready,
        }
    }

    /// Removes the mesh entry of `coord`, releasing its handle through
    /// `allocator` first when it holds one. Returns `true` if an entry existed.
    pub fn evict_mesh<A>(&mut self, coord: ChunkCoordinate, allocator: &mut A) -> bool
    where
        A: MeshAllocator<Handle = H>,
    {
        match self.meshes.remove(&coord) {
            Some(ChunkMesh::Ready(handle)) => {
                allocator.release_mesh(handle);
                true
            }
            Some(_) => true,
            None => false,
        }
    }

    /// Coordinates of every tracked mesh entry.
    pub fn mesh_coordinates(&self) -> impl Iterator<Item = ChunkCoordinate> + '_ {
        self.meshes.keys().copied()
    }

    /// Every mesh that holds a renderer handle.
    pub fn ready_meshes(&self) -> impl Iterator<Item = (ChunkCoordinate, &H)> + '_ {
        self.meshes.iter().filter_map(|(coord, mesh)| match mesh {
            ChunkMesh::Ready(handle) => Some((*coord, handle)),
            _ => None,
        })
    }

    // ---- bookkeeping ----

    pub fn edge(&self) -> usize {
        self.edge
    }

    pub fn data_count(&self) -> usize {
        self.data.len()
    }

    pub fn mesh_count(&self) -> usize {
        self.meshes.len()
    }

    pub fn data_queue_len(&self) -> usize {
        self.data_queue.len()
    }

    pub fn mesh_queue_len(&self) -> usize {
        self.mesh_queue.len()
    }
}
