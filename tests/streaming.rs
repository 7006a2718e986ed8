//! End-to-end tests of the streaming scheduler against the headless allocator.

use cgmath::Point3;
use voxel_streaming::{
    engine_state::voxels::coordinates::{chebyshev_distance, chunks_within},
    ChunkCoordinate, DataState, EngineState, HeadlessMeshAllocator, MeshAllocator, MeshState, StreamingConfig,
    StreamingError,
};

fn test_config(chunk_edge: usize, render_distance: i32) -> StreamingConfig {
    StreamingConfig {
        chunk_edge,
        render_distance,
        max_data_jobs_per_pass: 100_000,
        max_mesh_jobs_per_pass: 100_000,
        noise_frequency: 0.15,
        occupancy_threshold: 0.45,
        worker_threads: 4,
        ..StreamingConfig::default()
    }
}

/// Runs passes with the pool drained in between until generation and meshing
/// around `observer` have settled, then one more pass to refresh the render queue.
fn converge<A: MeshAllocator>(engine_state: &mut EngineState<A>, observer: Point3<f32>) {
    for _ in 0..3 {
        engine_state.update(observer).unwrap();
        engine_state.wait_for_idle().unwrap();
    }
    engine_state.update(observer).unwrap();
}

fn is_committed(state: MeshState) -> bool {
    matches!(state, MeshState::Empty | MeshState::Ready)
}

fn ready_mesh_count<A: MeshAllocator>(engine_state: &EngineState<A>) -> usize {
    engine_state.registry().get().ready_meshes().count()
}

#[test]
fn test_initial_load_commits_every_mesh_in_range() {
    let mut engine_state = EngineState::new(test_config(4, 2), HeadlessMeshAllocator::new()).unwrap();
    let origin: ChunkCoordinate = Point3::new(0, 0, 0);

    converge(&mut engine_state, Point3::new(0.5, 0.5, 0.5));

    for coord in chunks_within(origin, 2) {
        assert!(is_committed(engine_state.mesh_state(coord)), "{:?}", coord);
    }
    assert_eq!(engine_state.registry().get().mesh_count(), 125);

    let ready = ready_mesh_count(&engine_state);
    assert!(ready > 0);
    assert_eq!(engine_state.render_queue().len(), ready);
    assert_eq!(engine_state.allocator().live_mesh_count(), ready);

    let distances: Vec<i32> = engine_state
        .render_queue()
        .iter()
        .map(|entry| chebyshev_distance(entry.coord, origin))
        .collect();
    assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_moving_observer_evicts_trailing_and_streams_leading_chunks() {
    let mut engine_state = EngineState::new(test_config(4, 2), HeadlessMeshAllocator::new()).unwrap();
    converge(&mut engine_state, Point3::new(0.5, 0.5, 0.5));

    let moved = Point3::new(4.5, 0.5, 0.5);
    engine_state.update(moved).unwrap();
    assert_eq!(engine_state.observer_chunk(), Point3::new(1, 0, 0));

    for y in -2..=2 {
        for z in -2..=2 {
            let trailing = Point3::new(-2, y, z);
            assert_eq!(engine_state.mesh_state(trailing), MeshState::Unrequested);
            assert!(!engine_state.render_queue().contains(trailing));
        }
    }

    engine_state.wait_for_idle().unwrap();
    engine_state.update(moved).unwrap();
    engine_state.wait_for_idle().unwrap();
    engine_state.update(moved).unwrap();

    for y in -2..=2 {
        for z in -2..=2 {
            assert!(is_committed(engine_state.mesh_state(Point3::new(3, y, z))));
        }
    }
    assert_eq!(
        engine_state.allocator().live_mesh_count(),
        ready_mesh_count(&engine_state)
    );
}

#[test]
fn test_meshes_beyond_render_distance_five_are_evicted() {
    let mut engine_state = EngineState::new(test_config(2, 5), HeadlessMeshAllocator::new()).unwrap();
    converge(&mut engine_state, Point3::new(2.5, 0.5, 0.5));
    assert!(is_committed(engine_state.mesh_state(Point3::new(6, 0, 0))));

    engine_state.update(Point3::new(0.5, 0.5, 0.5)).unwrap();

    assert_eq!(engine_state.mesh_state(Point3::new(6, 0, 0)), MeshState::Unrequested);
    assert!(is_committed(engine_state.mesh_state(Point3::new(4, 0, 0))));
    assert_ne!(engine_state.mesh_state(Point3::new(-5, 0, 0)), MeshState::Unrequested);
}

#[test]
fn test_empty_world_commits_empty_meshes_once() {
    let config = StreamingConfig {
        occupancy_threshold: 1.0,
        ..test_config(4, 2)
    };
    let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
    let observer = Point3::new(0.5, 0.5, 0.5);

    converge(&mut engine_state, observer);

    for coord in chunks_within(Point3::new(0, 0, 0), 2) {
        assert_eq!(engine_state.mesh_state(coord), MeshState::Empty);
    }
    assert!(engine_state.render_queue().is_empty());
    assert_eq!(engine_state.allocator().meshes_created(), 0);
    assert_eq!(engine_state.stats().empty_meshes, 125);

    converge(&mut engine_state, observer);
    assert_eq!(engine_state.stats().mesh_jobs_dispatched, 125);
}

#[test]
fn test_mesh_allocation_failure_is_surfaced() {
    let mut engine_state = EngineState::new(test_config(4, 1), HeadlessMeshAllocator::with_byte_budget(0)).unwrap();
    let observer = Point3::new(0.5, 0.5, 0.5);

    let mut failure = None;
    for _ in 0..4 {
        if let Err(error) = engine_state
            .update(observer)
            .and_then(|_| engine_state.wait_for_idle())
        {
            failure = Some(error);
            break;
        }
    }

    assert!(matches!(failure, Some(StreamingError::MeshAllocation { .. })));
    assert_eq!(engine_state.allocator().live_mesh_count(), 0);
}

#[test]
fn test_rapid_movement_never_leaks_meshes() {
    let config = StreamingConfig {
        max_data_jobs_per_pass: 8,
        max_mesh_jobs_per_pass: 4,
        ..test_config(4, 2)
    };
    let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
    let mut rng = fastrand::Rng::with_seed(42);

    for _ in 0..40 {
        let observer = Point3::new(
            rng.i32(-12..12) as f32,
            rng.i32(-12..12) as f32,
            rng.i32(-12..12) as f32,
        );
        engine_state.update(observer).unwrap();
    }

    let observer = Point3::new(1.0, 1.0, 1.0);
    for _ in 0..60 {
        engine_state.update(observer).unwrap();
        engine_state.wait_for_idle().unwrap();
    }
    engine_state.update(observer).unwrap();

    let center = engine_state.observer_chunk();
    let registry = engine_state.registry().get();
    assert!(registry
        .mesh_coordinates()
        .all(|coord| chebyshev_distance(coord, center) <= 2));
    assert!(registry
        .data_coordinates()
        .all(|coord| chebyshev_distance(coord, center) <= 4));
    assert_eq!(
        engine_state.allocator().live_mesh_count(),
        registry.ready_meshes().count()
    );
    assert_eq!(engine_state.render_queue().len(), registry.ready_meshes().count());
}

#[test]
fn test_mesh_results_for_evicted_chunks_are_dropped() {
    let config = StreamingConfig {
        worker_threads: 1,
        ..test_config(32, 1)
    };
    let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
    let origin: ChunkCoordinate = Point3::new(0, 0, 0);
    let observer = Point3::new(0.5, 0.5, 0.5);

    engine_state.update(observer).unwrap();
    engine_state.wait_for_idle().unwrap();
    engine_state.update(observer).unwrap();
    assert_eq!(engine_state.stats().mesh_jobs_dispatched, 27);

    engine_state.update(Point3::new(10_000.0, 0.0, 0.0)).unwrap();
    engine_state.wait_for_idle().unwrap();

    let stats = *engine_state.stats();
    assert!(stats.stale_results_dropped > 0);
    assert_eq!(
        stats.meshes_committed + stats.empty_meshes + stats.stale_results_dropped,
        27
    );
    for coord in chunks_within(origin, 1) {
        assert_eq!(engine_state.mesh_state(coord), MeshState::Unrequested);
    }
    assert_eq!(engine_state.allocator().live_mesh_count(), 0);
    assert_eq!(ready_mesh_count(&engine_state), 0);
}

#[test]
fn test_lost_neighbour_data_is_requested_again() {
    let config = StreamingConfig {
        worker_threads: 1,
        ..test_config(16, 1)
    };
    let mut engine_state = EngineState::new(config, HeadlessMeshAllocator::new()).unwrap();
    let observer = Point3::new(0.5, 0.5, 0.5);
    let last_queued = Point3::new(1, 1, 1);
    let border = Point3::new(2, 1, 1);

    engine_state.update(observer).unwrap();
    assert_eq!(engine_state.mesh_state(last_queued), MeshState::Queued);
    assert!(engine_state.registry().get_mut().evict_data(border));

    for _ in 0..5 {
        engine_state.update(observer).unwrap();
        engine_state.wait_for_idle().unwrap();
    }
    engine_state.update(observer).unwrap();

    assert!(is_committed(engine_state.mesh_state(last_queued)));
    assert_eq!(engine_state.data_state(border), DataState::Ready);
    for coord in chunks_within(Point3::new(0, 0, 0), 1) {
        assert!(is_committed(engine_state.mesh_state(coord)), "{:?}", coord);
    }
}

#[test]
fn test_dropping_engine_releases_meshes() {
    let mut engine_state = EngineState::new(test_config(4, 1), HeadlessMeshAllocator::new()).unwrap();
    converge(&mut engine_state, Point3::new(0.5, 0.5, 0.5));
    assert!(engine_state.allocator().live_mesh_count() > 0);

    let registry = engine_state.registry().clone();
    drop(engine_state);

    assert_eq!(registry.get().mesh_count(), 0);
}

#[test]
fn test_invalid_config_is_rejected() {
    let config = StreamingConfig {
        render_distance: 0,
        ..StreamingConfig::default()
    };

    assert!(matches!(
        EngineState::new(config, HeadlessMeshAllocator::new()),
        Err(StreamingError::InvalidConfig(_))
    ));
}
