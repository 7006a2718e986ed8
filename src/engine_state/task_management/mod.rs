//! # Task Management System
//!
//! This module provides the worker pool that runs chunk generation and mesh
//! building off the main thread.
//!
//! ## Architecture Overview
//!
//! - `TaskManager`: central coordinator for task distribution and worker management
//! - [`Task`]: a unit of work executed on a worker
//! - [`TaskHandle`]: the owner's side of a submitted job
//! - `TaskChannel`: the channel feeding one worker thread
//!
//! Each worker has a dedicated channel for task distribution. Jobs are handed
//! out round-robin, at most [`MAX_TASKS_IN_FLIGHT`] per worker; anything beyond
//! that waits in a FIFO backlog on the manager. Workers report every finished
//! job on one shared completion channel so the manager can refill them.
//!
//! ## Task Lifecycle
//! 1. Work is submitted via `TaskManager::submit()` or `TaskManager::publish_task()`
//! 2. The manager sends it to an available worker, or queues it
//! 3. The worker runs it and sends the result to the job's [`TaskHandle`]
//! 4. `process_completed_tasks()` and `process_queued_tasks()` run on the main
//!    thread each pass to keep workers busy
//!
//! ## Example Usage
//! ```rust
//! use voxel_streaming::engine_state::task_management::TaskManager;
//!
//! let mut task_manager = TaskManager::new(2).unwrap();
//! let handle = task_manager.submit(|| 6 * 7);
//!
//! task_manager.wait_for_idle();
//! assert_eq!(pollster::block_on(handle).unwrap(), 42);
//! ```

pub mod task;

use log::{error, info, trace};
use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::error::StreamingError;

pub use task::{Task, TaskHandle};

type Job = Box<dyn FnOnce() + Send>;

/// A communication channel between the main thread and one worker thread.
struct TaskChannel {
    task_sender: Sender<Job>,
    num_tasks_in_flight: usize,
    worker: JoinHandle<()>,
}

/// Manages a pool of worker threads and coordinates task execution.
///
/// Dropping the manager discards the backlog (those handles resolve to
/// [`StreamingError::TaskPanicked`]), lets workers finish what they were sent,
/// and joins every thread.
pub struct TaskManager {
    channels: Vec<TaskChannel>,
    queued_tasks: VecDeque<Job>,
    current_channel: usize,
    completion_receiver: Receiver<usize>,
}

/// Maximum number of jobs that can be in flight per worker channel.
pub const MAX_TASKS_IN_FLIGHT: usize = 2;

impl TaskManager {
    /// Creates a new `TaskManager` with `num_workers` worker threads.
    ///
    /// # Errors
    /// Returns [`StreamingError::InvalidConfig`] for zero workers and
    /// [`StreamingError::WorkerSpawn`] if a thread cannot be created.
    pub fn new(num_workers: usize) -> Result<Self, StreamingError> {
        if num_workers == 0 {
            return Err(StreamingError::InvalidConfig(
                "the task manager needs at least one worker".to_string(),
            ));
        }

        info!(
            "Available parallelism: {:?}, spawning {} workers",
            thread::available_parallelism(),
            num_workers
        );

        let (completion_tx, completion_rx) = channel::<usize>();
        let mut channels = Vec::with_capacity(num_workers);

        for worker_idx in 0..num_workers {
            let (task_tx, task_rx) = channel::<Job>();
            let done_tx = completion_tx.clone();

            let task_closure = move || {
                while let Ok(job) = task_rx.recv() {
                    if catch_unwind(AssertUnwindSafe(job)).is_err() {
                        error!("Task panicked on worker {}", worker_idx);
                    }
                    if done_tx.send(worker_idx).is_err() {
                        break;
                    }
                }
            };

            let worker = thread::Builder::new()
                .name(format!("voxel-worker-{worker_idx}"))
                .spawn(task_closure)
                .map_err(StreamingError::WorkerSpawn)?;

            channels.push(TaskChannel {
                task_sender: task_tx,
                num_tasks_in_flight: 0,
                worker,
            });
        }

        Ok(TaskManager {
            channels,
            queued_tasks: VecDeque::new(),
            current_channel: 0,
            completion_receiver: completion_rx,
        })
    }

    /// Submits a closure for execution and returns the handle of its result.
    pub fn submit<T, F>(&mut self, job: F) -> TaskHandle<T>
    where
        T: Send + 'static,
        F: FnOnce() -> T + Send + 'static,
    {
        let (sender, handle) = task::task_pair();
        self.publish_job(Box::new(move || {
            // The handle may already be gone; the result is then dropped.
            let _ = sender.send(job());
        }));
        handle
    }

    /// Submits a [`Task`] for execution.
    pub fn publish_task<T: Task>(&mut self, task: T) -> TaskHandle<T::Output> {
        self.submit(move || task.process())
    }

    /// Attempts to send a job to a specific worker channel, handing it back if
    /// the worker has disconnected.
    fn try_send_task(&mut self, job: Job, channel_idx: usize) -> Result<(), Job> {
        match self.channels[channel_idx].task_sender.send(job) {
            Ok(_) => {
                self.channels[channel_idx].num_tasks_in_flight += 1;
                Ok(())
            }
            Err(job) => Err(job.0),
        }
    }

    /// Finds the next worker below [`MAX_TASKS_IN_FLIGHT`], round-robin from
    /// the last used channel.
    fn find_available_channel(&self) -> Option<usize> {
        if self.channels.is_empty() {
            return None;
        }

        let start_channel = self.current_channel;
        let mut current = start_channel;

        loop {
            if self.channels[current].num_tasks_in_flight < MAX_TASKS_IN_FLIGHT {
                return Some(current);
            }
            current = (current + 1) % self.channels.len();
            if current == start_channel {
                return None;
            }
        }
    }

    /// Sends `job` to a worker or appends it to the backlog. Returns `true` if
    /// it went straight to a worker.
    fn publish_job(&mut self, job: Job) -> bool {
        if !self.queued_tasks.is_empty() {
            self.queued_tasks.push_back(job);
            return false;
        }

        match self.find_available_channel() {
            Some(channel_idx) => match self.try_send_task(job, channel_idx) {
                Ok(_) => {
                    self.current_channel = (channel_idx + 1) % self.channels.len();
                    true
                }
                Err(job) => {
                    self.queued_tasks.push_back(job);
                    false
                }
            },
            None => {
                self.queued_tasks.push_back(job);
                false
            }
        }
    }

    /// Moves backlog jobs onto workers until the backlog is empty or every
    /// worker is full.
    pub fn process_queued_tasks(&mut self) {
        while !self.queued_tasks.is_empty() {
            let Some(channel_idx) = self.find_available_channel() else {
                break;
            };
            let Some(job) = self.queued_tasks.pop_front() else {
                break;
            };

            match self.try_send_task(job, channel_idx) {
                Ok(_) => self.current_channel = (channel_idx + 1) % self.channels.len(),
                Err(job) => {
                    error!("Worker {} disconnected", channel_idx);
                    self.queued_tasks.push_front(job);
                    break;
                }
            }
        }
    }

    /// Accounts for every job workers have finished since the last call.
    /// Returns how many there were.
    pub fn process_completed_tasks(&mut self) -> usize {
        let mut completed = 0;
        while let Ok(worker_idx) = self.completion_receiver.try_recv() {
            self.record_completion(worker_idx);
            completed += 1;
        }
        completed
    }

    fn record_completion(&mut self, worker_idx: usize) {
        let channel = &mut self.channels[worker_idx];
        channel.num_tasks_in_flight = channel.num_tasks_in_flight.saturating_sub(1);
    }

    /// Blocks until every submitted job, including the backlog, has finished.
    pub fn wait_for_idle(&mut self) {
        loop {
            self.process_completed_tasks();
            self.process_queued_tasks();
            if self.is_idle() {
                return;
            }

            trace!(
                "Waiting on {} in-flight and {} queued tasks",
                self.tasks_in_flight(),
                self.queued_tasks.len()
            );
            match self.completion_receiver.recv() {
                Ok(worker_idx) => self.record_completion(worker_idx),
                Err(_) => {
                    error!("All workers exited with work outstanding");
                    return;
                }
            }
        }
    }

    /// `true` if no job is running or queued.
    pub fn is_idle(&self) -> bool {
        self.queued_tasks.is_empty() && self.tasks_in_flight() == 0
    }

    pub fn tasks_in_flight(&self) -> usize {
        self.channels
            .iter()
            .map(|channel| channel.num_tasks_in_flight)
            .sum()
    }

    pub fn num_workers(&self) -> usize {
        self.channels.len()
    }
}

impl Drop for TaskManager {
    fn drop(&mut self) {
        self.queued_tasks.clear();
        for TaskChannel {
            task_sender, worker, ..
        } in self.channels.drain(..)
        {
            drop(task_sender);
            if worker.join().is_err() {
                error!("Worker thread panicked during shutdown");
            }
        }
    }
}
