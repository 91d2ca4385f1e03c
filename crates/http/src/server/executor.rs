//! Strategies for running per-connection tasks.

use crate::protocol::ServerError;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tracing::{error, trace};

/// One connection's whole request/response cycle.
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// Runs tasks submitted by the accept loop.
///
/// Any `Fn(Task) + Send + Sync` closure is an executor as well.
pub trait Executor: Send + Sync {
    fn execute(&self, task: Task);
}

impl<F> Executor for F
where
    F: Fn(Task) + Send + Sync,
{
    fn execute(&self, task: Task) {
        self(task);
    }
}

/// Runs each task on the calling thread, serializing all connections.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlineExecutor;

impl Executor for InlineExecutor {
    fn execute(&self, task: Task) {
        task();
    }
}

/// Spawns one named thread per task.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPerTask;

impl Executor for ThreadPerTask {
    fn execute(&self, task: Task) {
        if let Err(e) = thread::Builder::new().name("socket-http-task".into()).spawn(task) {
            error!(cause = %e, "failed to spawn task thread, dropping connection");
        }
    }
}

/// A fixed set of workers pulling tasks from a shared channel.
///
/// Dropping the pool closes the channel, lets the workers drain what was queued and
/// joins them.
pub struct ThreadPool {
    sender: Mutex<Option<Sender<Task>>>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    pub fn new(size: usize) -> Result<Self, ServerError> {
        if size == 0 {
            return Err(ServerError::invalid_config("thread pool needs at least one worker"));
        }

        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));

        let mut workers = Vec::with_capacity(size);
        for id in 0..size {
            let receiver = Arc::clone(&receiver);
            let worker = thread::Builder::new()
                .name(format!("socket-http-worker-{id}"))
                .spawn(move || run_worker(id, &receiver))
                .map_err(|source| ServerError::Spawn { source })?;
            workers.push(worker);
        }

        Ok(Self { sender: Mutex::new(Some(sender)), workers })
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

fn run_worker(id: usize, receiver: &Mutex<Receiver<Task>>) {
    loop {
        let task = match receiver.lock() {
            Ok(receiver) => receiver.recv(),
            Err(_poisoned) => break,
        };

        let Ok(task) = task else {
            trace!(worker = id, "task channel closed, worker exits");
            break;
        };

        if catch_unwind(AssertUnwindSafe(task)).is_err() {
            error!(worker = id, "task panicked");
        }
    }
}

impl Executor for ThreadPool {
    fn execute(&self, task: Task) {
        let sent = match self.sender.lock() {
            Ok(sender) => sender.as_ref().map(|sender| sender.send(task)),
            Err(_poisoned) => None,
        };

        if !matches!(sent, Some(Ok(()))) {
            error!("thread pool is shut down, dropping connection");
        }
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        if let Ok(mut sender) = self.sender.lock() {
            sender.take();
        }
        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                error!("worker thread panicked");
            }
        }
    }
}

impl fmt::Debug for ThreadPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadPool").field("size", &self.workers.len()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc::channel;
    use std::time::Duration;

    #[test]
    fn inline_runs_on_caller() {
        let caller = thread::current().id();
        let (tx, rx) = channel();
        InlineExecutor.execute(Box::new(move || tx.send(thread::current().id()).unwrap()));
        assert_eq!(rx.try_recv().unwrap(), caller);
    }

    #[test]
    fn thread_per_task_uses_new_thread() {
        let caller = thread::current().id();
        let (tx, rx) = channel();
        ThreadPerTask.execute(Box::new(move || tx.send(thread::current().id()).unwrap()));
        assert_ne!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), caller);
    }

    #[test]
    fn closure_is_an_executor() {
        let count = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&count);
        let executor = move |task: Task| {
            seen.fetch_add(1, Ordering::SeqCst);
            task();
        };
        executor.execute(Box::new(|| {}));
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn pool_rejects_zero_workers() {
        assert!(matches!(ThreadPool::new(0), Err(ServerError::InvalidConfig { .. })));
    }

    #[test]
    fn pool_drains_on_drop() {
        let count = Arc::new(AtomicUsize::new(0));
        let pool = ThreadPool::new(3).unwrap();
        assert_eq!(pool.size(), 3);

        for _ in 0..20 {
            let count = Arc::clone(&count);
            pool.execute(Box::new(move || {
                count.fetch_add(1, Ordering::SeqCst);
            }));
        }
        drop(pool);

        assert_eq!(count.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn pool_survives_panicking_task() {
        let pool = ThreadPool::new(1).unwrap();
        pool.execute(Box::new(|| panic!("task failure")));

        let (tx, rx) = channel();
        pool.execute(Box::new(move || tx.send(()).unwrap()));
        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
