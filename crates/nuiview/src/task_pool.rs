//! Background task execution.
//!
//! Module rescans, class discovery and document reloads run here so the
//! host's interactive thread never waits on them.

use std::future::Future;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use async_executor::{Executor, Task};

/// A thread pool for executing async tasks.
///
/// # Example
///
/// ```ignore
/// use nuiview::TaskPool;
///
/// let pool = TaskPool::new(2)?;
/// let task = pool.spawn(async { 42 });
/// assert_eq!(futures_lite::future::block_on(task), 42);
/// ```
pub struct TaskPool {
    executor: Arc<Executor<'static>>,
    threads: Vec<thread::JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
}

impl TaskPool {
    /// Create a pool with `num_threads` workers (at least one).
    pub fn new(num_threads: usize) -> io::Result<Self> {
        let num_threads = num_threads.max(1);
        let executor = Arc::new(Executor::new());
        let shutdown = Arc::new(AtomicBool::new(false));
        let mut threads = Vec::with_capacity(num_threads);

        for i in 0..num_threads {
            let exec = executor.clone();
            let shutdown_flag = shutdown.clone();

            let handle = thread::Builder::new()
                .name(format!("nuiview-task-{}", i))
                .spawn(move || {
                    while !shutdown_flag.load(Ordering::Relaxed) {
                        if !exec.try_tick() {
                            thread::sleep(Duration::from_millis(1));
                        }
                    }
                })?;

            threads.push(handle);
        }

        tracing::debug!("TaskPool created with {} threads", num_threads);

        Ok(Self {
            executor,
            threads,
            shutdown,
        })
    }

    /// Uses max(1, num_cpus - 1) to leave one core for the host.
    pub fn default_threads() -> io::Result<Self> {
        Self::new(num_cpus::get().saturating_sub(1))
    }

    /// Spawn an async task on the pool.
    pub fn spawn<T>(&self, future: impl Future<Output = T> + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(future)
    }

    /// Run blocking work on the pool.
    pub fn spawn_blocking<T>(&self, work: impl FnOnce() -> T + Send + 'static) -> Task<T>
    where
        T: Send + 'static,
    {
        self.executor.spawn(async move { work() })
    }

    pub fn thread_count(&self) -> usize {
        self.threads.len()
    }

    /// Stop the workers and wait for them to exit.
    ///
    /// Tasks already running finish; queued tasks are not started.
    pub fn shutdown(mut self) {
        tracing::debug!("Shutting down TaskPool with {} threads", self.threads.len());

        self.shutdown.store(true, Ordering::Relaxed);

        let threads = std::mem::take(&mut self.threads);
        for handle in threads {
            if let Err(e) = handle.join() {
                tracing::error!("Task pool thread panicked: {:?}", e);
            }
        }
    }
}

impl Drop for TaskPool {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawn_and_await() {
        let pool = TaskPool::new(2).unwrap();
        assert_eq!(pool.thread_count(), 2);

        let task = pool.spawn(async { 42 });
        assert_eq!(pollster::block_on(task), 42);
    }

    #[test]
    fn test_spawn_blocking_in_order() {
        let pool = TaskPool::new(4).unwrap();

        let tasks: Vec<_> = (0..10).map(|i| pool.spawn_blocking(move || i * 2)).collect();
        let results: Vec<_> = tasks.into_iter().map(pollster::block_on).collect();

        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14, 16, 18]);
    }

    #[test]
    fn test_zero_threads_means_one() {
        let pool = TaskPool::new(0).unwrap();
        assert_eq!(pool.thread_count(), 1);
    }

    #[test]
    fn test_default_threads() {
        let pool = TaskPool::default_threads().unwrap();
        assert!(pool.thread_count() >= 1);
        assert!(pool.thread_count() <= num_cpus::get().max(1));
        pool.shutdown();
    }
}
