use std::{
    num::NonZeroUsize,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow, bail};
use batch_loadgen::{
    Batch, BatchController, BatchPlan, Dispatcher, DispatcherFactory, dispatch::JobOutcome,
    params::CalcParams, random::SharedRng,
};
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Started(usize),
    Finished(usize),
}

#[derive(Debug, Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    failures: AtomicUsize,
}

impl Recorder {
    fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

#[derive(Debug)]
struct SlowDispatcher(Arc<Recorder>);

impl Dispatcher for SlowDispatcher {
    async fn dispatch(&self, id: usize) {
        self.0.push(Event::Started(id));
        let now = self.0.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.0.max_in_flight.fetch_max(now, Ordering::SeqCst);
        // uneven completion order inside a batch
        sleep(Duration::from_millis(10 * ((id * 7) % 5 + 1) as u64)).await;
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.0.push(Event::Finished(id));
    }
}

#[derive(Debug)]
struct FailingDispatcher(Arc<Recorder>);

impl Dispatcher for FailingDispatcher {
    async fn dispatch(&self, id: usize) {
        self.0.push(Event::Started(id));
        let outcome = JobOutcome::Failed {
            id,
            params: CalcParams::generate(&SharedRng::seeded(id as u64)),
            error: anyhow!("connection refused"),
        };
        assert!(!outcome.is_completed());
        outcome.log();
        self.0.failures.fetch_add(1, Ordering::SeqCst);
        self.0.push(Event::Finished(id));
    }
}

#[derive(Debug, Default)]
struct Factory {
    recorder: Arc<Recorder>,
    batches: Mutex<Vec<Batch>>,
    failing: bool,
}

enum Either {
    Slow(SlowDispatcher),
    Failing(FailingDispatcher),
}

impl Dispatcher for Either {
    async fn dispatch(&self, id: usize) {
        match self {
            Either::Slow(d) => d.dispatch(id).await,
            Either::Failing(d) => d.dispatch(id).await,
        }
    }
}

impl DispatcherFactory for Factory {
    type Dispatcher = Either;

    fn for_batch(&self, batch: &Batch) -> Result<Either> {
        self.batches.lock().unwrap().push(*batch);
        let recorder = self.recorder.clone();
        Ok(if self.failing {
            Either::Failing(FailingDispatcher(recorder))
        } else {
            Either::Slow(SlowDispatcher(recorder))
        })
    }
}

fn plan(total: usize, size: usize) -> BatchPlan {
    BatchPlan::new(
        NonZeroUsize::new(total).unwrap(),
        NonZeroUsize::new(size).unwrap(),
    )
}

fn started_ids(events: &[Event]) -> Vec<usize> {
    let mut ids: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            Event::Started(id) => Some(*id),
            Event::Finished(_) => None,
        })
        .collect();
    ids.sort_unstable();
    ids
}

/// No job of batch b+1 starts before every job of batch b finished.
fn assert_batch_barrier(events: &[Event], batch_size: usize) {
    for (pos, event) in events.iter().enumerate() {
        let Event::Started(id) = event else { continue };
        let batch = id / batch_size;
        for earlier in 0..batch * batch_size {
            let finished_at = events
                .iter()
                .position(|e| *e == Event::Finished(earlier))
                .unwrap_or_else(|| panic!("job {earlier} never finished"));
            assert!(
                finished_at < pos,
                "job {id} started before job {earlier} of an earlier batch finished"
            );
        }
    }
}

#[tokio::test(start_paused = true)]
async fn ten_requests_in_batches_of_three() {
    let factory = Factory::default();
    let recorder = factory.recorder.clone();
    let controller = BatchController::new(factory, plan(10, 3));
    controller.run().await.unwrap();

    let events = recorder.events();
    assert_eq!(events.len(), 20);
    assert_eq!(started_ids(&events), (0..10).collect::<Vec<_>>());
    assert_batch_barrier(&events, 3);
    assert_eq!(recorder.max_in_flight.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn one_client_per_batch() {
    let factory = Arc::new(Factory::default());
    let controller = BatchController::new(SharedFactory(factory.clone()), plan(10, 3));
    controller.run().await.unwrap();

    let batches = factory.batches.lock().unwrap().clone();
    let counts: Vec<_> = batches.iter().map(|b| b.count).collect();
    assert_eq!(counts, [3, 3, 3, 1]);
    let starts: Vec<_> = batches.iter().map(|b| b.start_id).collect();
    assert_eq!(starts, [0, 3, 6, 9]);
}

#[tokio::test(start_paused = true)]
async fn single_short_batch() {
    let factory = Factory::default();
    let recorder = factory.recorder.clone();
    BatchController::new(factory, plan(5, 10)).run().await.unwrap();

    let events = recorder.events();
    assert_eq!(started_ids(&events), (0..5).collect::<Vec<_>>());
    assert_eq!(recorder.max_in_flight.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn failing_jobs_do_not_stop_the_run() {
    let factory = Factory {
        failing: true,
        ..Default::default()
    };
    let recorder = factory.recorder.clone();
    BatchController::new(factory, plan(7, 2)).run().await.unwrap();

    assert_eq!(recorder.failures.load(Ordering::SeqCst), 7);
    assert_eq!(started_ids(&recorder.events()), (0..7).collect::<Vec<_>>());
    assert_batch_barrier(&recorder.events(), 2);
}

#[tokio::test(start_paused = true)]
async fn factory_error_aborts_before_next_batch() {
    struct Broken(Arc<Recorder>, AtomicUsize);

    impl DispatcherFactory for Broken {
        type Dispatcher = SlowDispatcher;

        fn for_batch(&self, _batch: &Batch) -> Result<SlowDispatcher> {
            if self.1.fetch_add(1, Ordering::SeqCst) == 1 {
                bail!("no client");
            }
            Ok(SlowDispatcher(self.0.clone()))
        }
    }

    let recorder = Arc::new(Recorder::default());
    let controller =
        BatchController::new(Broken(recorder.clone(), AtomicUsize::new(0)), plan(6, 3));
    assert!(controller.run().await.is_err());
    assert_eq!(started_ids(&recorder.events()), [0, 1, 2]);
}

struct SharedFactory(Arc<Factory>);

impl DispatcherFactory for SharedFactory {
    type Dispatcher = Either;

    fn for_batch(&self, batch: &Batch) -> Result<Either> {
        self.0.for_batch(batch)
    }
}
