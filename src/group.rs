use std::future::Future;

use futures::future::join_all;
use log::error;
use tokio::task::JoinHandle;

/// Tasks of one batch. Spawned tasks run concurrently on the runtime;
/// [`TaskGroup::wait`] is the completion barrier.
#[derive(Debug, Default)]
pub struct TaskGroup {
    tasks: Vec<JoinHandle<()>>,
}

impl TaskGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tasks: Vec::with_capacity(capacity),
        }
    }

    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.push(tokio::spawn(task));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every spawned task and returns how many finished normally.
    /// A panicked task is logged and otherwise ignored.
    pub async fn wait(self) -> usize {
        let mut finished = 0;
        for res in join_all(self.tasks).await {
            match res {
                Ok(()) => finished += 1,
                Err(e) => error!("Task failed: {e}"),
            }
        }
        finished
    }
}
