use std::{num::NonZeroUsize, ops::Range, sync::Arc, time::Instant};

use anyhow::Result;
use log::info;

use crate::{
    dispatch::{Dispatcher, DispatcherFactory},
    group::TaskGroup,
};

/// Contiguous slice of job ids sharing one completion barrier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Batch {
    pub index: usize,
    pub start_id: usize,
    pub count: usize,
}

impl Batch {
    pub fn ids(&self) -> Range<usize> {
        self.start_id..self.start_id + self.count
    }
}

/// Partition of a run's request budget into fixed-width batches.
/// Only the last batch may be shorter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    total_requests: usize,
    batch_size: usize,
}

impl BatchPlan {
    pub fn new(total_requests: NonZeroUsize, batch_size: NonZeroUsize) -> Self {
        Self {
            total_requests: total_requests.get(),
            batch_size: batch_size.get(),
        }
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn num_batches(&self) -> usize {
        self.total_requests.div_ceil(self.batch_size)
    }

    pub fn batch(&self, index: usize) -> Option<Batch> {
        if index >= self.num_batches() {
            return None;
        }
        let start_id = index * self.batch_size;
        Some(Batch {
            index,
            start_id,
            count: self.batch_size.min(self.total_requests - start_id),
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = Batch> + use<> {
        let plan = *self;
        (0..plan.num_batches()).filter_map(move |i| plan.batch(i))
    }
}

/// Runs a plan batch by batch: every job of a batch is in flight at once,
/// and the next batch starts only after the whole current batch finished.
#[derive(Debug)]
pub struct BatchController<F> {
    factory: F,
    plan: BatchPlan,
}

impl<F: DispatcherFactory> BatchController<F> {
    pub fn new(factory: F, plan: BatchPlan) -> Self {
        Self { factory, plan }
    }

    /// Fails only if the factory cannot produce a dispatcher for a batch.
    /// Job failures are logged by the dispatcher and never surface here.
    pub async fn run(&self) -> Result<()> {
        let started = Instant::now();
        for batch in self.plan.iter() {
            info!(
                "Starting batch {} with {} requests...",
                batch.index + 1,
                batch.count
            );
            let dispatcher = Arc::new(self.factory.for_batch(&batch)?);
            self.run_batch(&batch, dispatcher).await;
            info!("Batch {} completed.", batch.index + 1);
        }
        info!(
            "All {} requests completed in {:.2?}",
            self.plan.total_requests(),
            started.elapsed()
        );
        Ok(())
    }

    async fn run_batch(&self, batch: &Batch, dispatcher: Arc<F::Dispatcher>) {
        let mut group = TaskGroup::with_capacity(batch.count);
        for id in batch.ids() {
            let dispatcher = dispatcher.clone();
            group.spawn(async move { dispatcher.dispatch(id).await });
        }
        group.wait().await;
    }
}
