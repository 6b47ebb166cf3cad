//! The coordinator: queued states, deadlines, active set and locks behind
//! one mutex.
//!
//! All four structures change together under a single `parking_lot::Mutex`,
//! so no caller ever observes a dataset whose deadline was armed but whose
//! state was not yet updated, or a dataset both queued and in progress.
//! The only I/O performed under the lock is creating a dirty marker.
//!
//! Workers are never started while the lock is held: a sweep pass decides
//! and records every dispatch under the lock, releases it, and only then
//! hands the orders to the [`WorkerDispatch`].

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::config::CoordinatorConfig;
use super::delay::DelayScheduler;
use super::locks::{LockId, LockRegistry};
use super::marker::DirtyMarkerStore;
use super::state::{transition, QueuedState, RequestedOp, WriteEffect};
use super::status::{QueueEntry, RequestStatus, ServiceStatus};
use crate::dataset::{DatasetId, DatasetRef};
use crate::error::CoordinatorError;
use crate::workers::{WorkOrder, WorkerDispatch, WorkerKind};

/// State guarded by the coordination lock.
#[derive(Debug)]
struct Inner {
    queue: HashMap<DatasetRef, QueuedState>,
    delays: DelayScheduler,
    active: HashSet<DatasetRef>,
    locks: LockRegistry,
}

/// Outcome of one sweep pass.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    /// Datasets handed to a worker, with the worker kind.
    pub dispatched: Vec<(DatasetId, WorkerKind)>,
    /// Archive requests dropped because the dataset was locked.
    pub dropped_archives: Vec<DatasetId>,
    /// Write-backs still inside their debounce window.
    pub deferred_writes: usize,
    /// Queued datasets skipped because a worker still owns them.
    pub skipped_active: usize,
}

impl SweepReport {
    /// Returns true if the pass changed nothing.
    pub fn is_idle(&self) -> bool {
        self.dispatched.is_empty() && self.dropped_archives.is_empty()
    }
}

/// Per-dataset deferred-operation coordinator.
///
/// Construct once with [`Coordinator::new`] and share the returned `Arc`
/// with request handlers, the sweeper and the dispatcher.
#[derive(Debug)]
pub struct Coordinator {
    config: Arc<CoordinatorConfig>,
    markers: DirtyMarkerStore,
    inner: Mutex<Inner>,
}

impl Coordinator {
    /// Creates a coordinator, creating the marker directory if needed.
    pub fn new(config: CoordinatorConfig) -> Result<Arc<Self>, CoordinatorError> {
        let markers = DirtyMarkerStore::open(config.marker_dir())?;
        info!(
            write_delay_ms = config.write_delay.as_millis() as u64,
            process_queue_interval_ms = config.process_queue_interval.as_millis() as u64,
            marker_dir = %markers.dir().display(),
            "Coordinator created"
        );

        Ok(Arc::new(Self {
            inner: Mutex::new(Inner {
                queue: HashMap::new(),
                delays: DelayScheduler::new(config.write_delay),
                active: HashSet::new(),
                locks: LockRegistry::new(),
            }),
            config: Arc::new(config),
            markers,
        }))
    }

    /// Returns the shared configuration.
    pub fn config(&self) -> &Arc<CoordinatorConfig> {
        &self.config
    }

    /// Returns the dirty marker store.
    pub fn markers(&self) -> &DirtyMarkerStore {
        &self.markers
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Requests
    // ─────────────────────────────────────────────────────────────────────────

    /// Merges a request for `dataset` into its queued state.
    ///
    /// Returns once the queue is updated; never waits for a worker. Fails
    /// only if the dirty marker cannot be created, in which case nothing
    /// changes.
    pub fn queue(&self, dataset: DatasetRef, op: RequestedOp) -> Result<(), CoordinatorError> {
        self.queue_at(dataset, op, Instant::now())
    }

    /// [`queue`](Self::queue) with an explicit clock reading.
    pub fn queue_at(
        &self,
        dataset: DatasetRef,
        op: RequestedOp,
        now: Instant,
    ) -> Result<(), CoordinatorError> {
        info!(dataset = %dataset, op = %op, "Requesting {} of dataset", op);

        let mut inner = self.inner.lock();
        let current = inner.queue.get(&dataset).copied();
        let step = transition(current, op);

        match step.effect {
            WriteEffect::None => {}
            WriteEffect::MarkAndArm => {
                self.markers.mark(dataset.id())?;
                self.arm(&mut inner, &dataset, now);
            }
            WriteEffect::Rearm => self.arm(&mut inner, &dataset, now),
        }

        if let Some(next) = step.next {
            if current != Some(next) {
                debug!(dataset_id = %dataset.id(), from = ?current, to = %next, "Queued state changed");
            }
            inner.queue.insert(dataset, next);
        }
        Ok(())
    }

    fn arm(&self, inner: &mut Inner, dataset: &DatasetRef, now: Instant) {
        inner.delays.arm(dataset.id(), now);
        debug!(
            dataset_id = %dataset.id(),
            delay_ms = inner.delays.delay().as_millis() as u64,
            "Write delayed"
        );
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Locks
    // ─────────────────────────────────────────────────────────────────────────

    /// Locks `datasets` against archival and returns the lock id.
    pub fn lock<I>(&self, datasets: I) -> LockId
    where
        I: IntoIterator<Item = DatasetId>,
    {
        let set: HashSet<DatasetId> = datasets.into_iter().collect();
        let size = set.len();
        let id = self.inner.lock().locks.acquire(set);
        debug!(lock_id = %id, datasets = size, "Lock acquired");
        id
    }

    /// Releases a lock. Unknown ids are ignored.
    pub fn unlock(&self, id: &LockId) -> bool {
        let released = self.inner.lock().locks.release(id);
        debug!(lock_id = %id, released, "Lock released");
        released
    }

    /// Returns true if any held lock covers `dataset`.
    pub fn is_locked(&self, dataset: DatasetId) -> bool {
        self.inner.lock().locks.is_locked(dataset)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Worker lifecycle
    // ─────────────────────────────────────────────────────────────────────────

    /// Releases `dataset` from the active set once its worker has finished.
    ///
    /// Returns true if the dataset was active.
    pub fn complete(&self, dataset: &DatasetRef) -> bool {
        let removed = self.inner.lock().active.remove(dataset);
        debug!(dataset_id = %dataset.id(), removed, "Worker completed");
        removed
    }

    /// Runs one sweep pass now.
    pub fn process_queue(self: &Arc<Self>, dispatcher: &dyn WorkerDispatch) -> SweepReport {
        self.process_queue_at(Instant::now(), dispatcher)
    }

    /// Runs one sweep pass as of `now`.
    ///
    /// Every eligible dataset is removed from the queue and marked active
    /// under the lock; workers are started after the lock is released.
    pub fn process_queue_at(
        self: &Arc<Self>,
        now: Instant,
        dispatcher: &dyn WorkerDispatch,
    ) -> SweepReport {
        let mut report = SweepReport::default();
        let mut starts: Vec<(DatasetRef, WorkerKind)> = Vec::new();

        {
            let mut guard = self.inner.lock();
            let Inner {
                queue,
                delays,
                active,
                locks,
            } = &mut *guard;

            queue.retain(|dataset, state| {
                if active.contains(dataset) {
                    report.skipped_active += 1;
                    return true;
                }
                let id = dataset.id();
                match *state {
                    QueuedState::WriteRequested | QueuedState::WriteThenArchiveRequested => {
                        if !delays.is_elapsed(id, now) {
                            report.deferred_writes += 1;
                            return true;
                        }
                        delays.clear(id);
                    }
                    QueuedState::ArchiveRequested => {
                        if locks.is_locked(id) {
                            // Dropped, not retried: a fresh archive request must re-queue it.
                            debug!(dataset = %dataset, "Archive skipped because a read is in progress");
                            report.dropped_archives.push(id);
                            return false;
                        }
                    }
                    QueuedState::RestoreRequested => {}
                }

                let kind = WorkerKind::for_state(*state);
                debug!(dataset = %dataset, state = %state, "Will process");
                active.insert(dataset.clone());
                starts.push((dataset.clone(), kind));
                false
            });
        }

        // Guards exist for every order before the first dispatch, so a
        // panicking dispatcher still releases the datasets it never started.
        let orders: Vec<WorkOrder> = starts
            .into_iter()
            .map(|(dataset, kind)| {
                report.dispatched.push((dataset.id(), kind));
                WorkOrder {
                    kind,
                    completion: CompletionGuard::new(Arc::clone(self), dataset.clone()),
                    dataset,
                    config: Arc::clone(&self.config),
                }
            })
            .collect();

        for order in orders {
            dispatcher.dispatch(order);
        }

        report
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    /// Captures queue, active set and locks in one consistent snapshot.
    ///
    /// A dataset that is both queued and active is reported only as
    /// `CHANGING`.
    pub fn status(&self) -> ServiceStatus {
        let inner = self.inner.lock();

        let mut queued: Vec<QueueEntry> = inner
            .queue
            .iter()
            .filter(|(dataset, _)| !inner.active.contains(*dataset))
            .map(|(dataset, state)| QueueEntry {
                dataset: dataset.clone(),
                request: RequestStatus::Queued(*state),
            })
            .collect();
        queued.sort_by_key(|e| e.dataset.id());

        let mut changing: Vec<QueueEntry> = inner
            .active
            .iter()
            .map(|dataset| QueueEntry {
                dataset: dataset.clone(),
                request: RequestStatus::Changing,
            })
            .collect();
        changing.sort_by_key(|e| e.dataset.id());

        queued.extend(changing);
        ServiceStatus {
            ops_queue: queued,
            lock_count: inner.locks.count(),
            locked_datasets: inner.locks.locked_datasets(),
        }
    }

    /// Datasets that are in progress or queued for restore.
    pub fn restoring(&self) -> HashSet<DatasetRef> {
        let inner = self.inner.lock();
        let mut result = inner.active.clone();
        result.extend(
            inner
                .queue
                .iter()
                .filter(|(_, state)| **state == QueuedState::RestoreRequested)
                .map(|(dataset, _)| dataset.clone()),
        );
        result
    }

    /// Returns the queued state of `dataset`, if any.
    pub fn queued_state(&self, dataset: DatasetId) -> Option<QueuedState> {
        self.inner
            .lock()
            .queue
            .get(&DatasetRef::from_id(dataset))
            .copied()
    }

    /// Returns true while a worker owns `dataset`.
    pub fn is_active(&self, dataset: DatasetId) -> bool {
        self.inner
            .lock()
            .active
            .contains(&DatasetRef::from_id(dataset))
    }

    /// Returns the write-back deadline of `dataset`, if one is armed.
    pub fn write_deadline(&self, dataset: DatasetId) -> Option<Instant> {
        self.inner.lock().delays.deadline(dataset)
    }
}

/// Reports a dispatched worker's completion to the coordinator.
///
/// Completion happens exactly once: on [`finish`](Self::finish) or, failing
/// that, when the guard is dropped, including during a panic unwind.
#[derive(Debug)]
pub struct CompletionGuard {
    coordinator: Arc<Coordinator>,
    dataset: DatasetRef,
    done: bool,
}

impl CompletionGuard {
    fn new(coordinator: Arc<Coordinator>, dataset: DatasetRef) -> Self {
        Self {
            coordinator,
            dataset,
            done: false,
        }
    }

    /// Returns the dataset this guard releases.
    pub fn dataset(&self) -> &DatasetRef {
        &self.dataset
    }

    /// Removes the dataset from the active set now.
    pub fn finish(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if !self.done {
            self.done = true;
            self.coordinator.complete(&self.dataset);
        }
    }
}

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::config::MAX_WRITE_DELAY_SECS;
    use crate::coordinator::state::fold_requests;
    use proptest::prelude::*;
    use std::time::Duration;
    use tempfile::TempDir;

    const DELAY: Duration = Duration::from_millis(500);

    /// Dispatcher that keeps every order so completion stays under test control.
    #[derive(Default)]
    struct HoldingDispatcher {
        orders: Mutex<Vec<WorkOrder>>,
    }

    impl HoldingDispatcher {
        fn kinds(&self) -> Vec<(DatasetId, WorkerKind)> {
            self.orders
                .lock()
                .iter()
                .map(|o| (o.dataset.id(), o.kind))
                .collect()
        }

        fn finish_all(&self) {
            let orders: Vec<WorkOrder> = self.orders.lock().drain(..).collect();
            for order in orders {
                order.completion.finish();
            }
        }
    }

    impl WorkerDispatch for HoldingDispatcher {
        fn dispatch(&self, order: WorkOrder) {
            self.orders.lock().push(order);
        }
    }

    fn setup() -> (TempDir, Arc<Coordinator>) {
        let temp_dir = TempDir::new().unwrap();
        let config = CoordinatorConfig::new(temp_dir.path()).with_write_delay(DELAY);
        let coordinator = Coordinator::new(config).unwrap();
        (temp_dir, coordinator)
    }

    fn ds(id: u64) -> DatasetRef {
        DatasetRef::from_id(id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queueing
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn write_creates_marker_and_deadline() {
        let (_temp, coordinator) = setup();
        let now = Instant::now();

        coordinator.queue_at(ds(1), RequestedOp::Write, now).unwrap();

        assert_eq!(
            coordinator.queued_state(DatasetId::new(1)),
            Some(QueuedState::WriteRequested)
        );
        assert_eq!(coordinator.write_deadline(DatasetId::new(1)), Some(now + DELAY));
        assert!(coordinator.markers().is_marked(DatasetId::new(1)));
    }

    #[test]
    fn archive_and_restore_have_no_deadline() {
        let (_temp, coordinator) = setup();

        coordinator.queue(ds(1), RequestedOp::Archive).unwrap();
        coordinator.queue(ds(2), RequestedOp::Restore).unwrap();

        assert!(coordinator.write_deadline(DatasetId::new(1)).is_none());
        assert!(coordinator.write_deadline(DatasetId::new(2)).is_none());
        assert!(!coordinator.markers().is_marked(DatasetId::new(1)));
    }

    #[test]
    fn repeated_writes_push_deadline_forward() {
        let (_temp, coordinator) = setup();
        let start = Instant::now();
        let id = DatasetId::new(1);

        coordinator.queue_at(ds(1), RequestedOp::Write, start).unwrap();
        let first = coordinator.write_deadline(id).unwrap();
        coordinator
            .queue_at(ds(1), RequestedOp::Write, start + Duration::from_millis(100))
            .unwrap();
        let second = coordinator.write_deadline(id).unwrap();

        assert!(second > first);
    }

    #[test]
    fn archive_on_pending_write_keeps_deadline() {
        let (_temp, coordinator) = setup();
        let now = Instant::now();
        let id = DatasetId::new(1);

        coordinator.queue_at(ds(1), RequestedOp::Write, now).unwrap();
        coordinator
            .queue_at(ds(1), RequestedOp::Archive, now + Duration::from_millis(200))
            .unwrap();

        assert_eq!(
            coordinator.queued_state(id),
            Some(QueuedState::WriteThenArchiveRequested)
        );
        assert_eq!(coordinator.write_deadline(id), Some(now + DELAY));
    }

    #[test]
    fn oversized_write_delay_does_not_panic() {
        let temp_dir = TempDir::new().unwrap();
        let config = CoordinatorConfig::new(temp_dir.path()).with_write_delay(Duration::MAX);
        let coordinator = Coordinator::new(config).unwrap();
        let now = Instant::now();

        coordinator.queue_at(ds(1), RequestedOp::Write, now).unwrap();
        coordinator.queue_at(ds(1), RequestedOp::Write, now).unwrap();

        assert_eq!(
            coordinator.write_deadline(DatasetId::new(1)),
            Some(now + Duration::from_secs(MAX_WRITE_DELAY_SECS))
        );
        let report = coordinator.process_queue_at(now, &HoldingDispatcher::default());
        assert_eq!(report.deferred_writes, 1);
    }

    #[test]
    fn marker_failure_leaves_state_unchanged() {
        let (_temp, coordinator) = setup();
        coordinator.queue(ds(1), RequestedOp::Archive).unwrap();
        std::fs::remove_dir_all(coordinator.markers().dir()).unwrap();

        let err = coordinator.queue(ds(1), RequestedOp::Write).unwrap_err();

        assert!(err.is_internal());
        assert_eq!(
            coordinator.queued_state(DatasetId::new(1)),
            Some(QueuedState::ArchiveRequested)
        );
        assert!(coordinator.write_deadline(DatasetId::new(1)).is_none());
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sweeping
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn write_waits_for_deadline() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        let now = Instant::now();
        coordinator.queue_at(ds(1), RequestedOp::Write, now).unwrap();

        let early = coordinator.process_queue_at(now + DELAY, &dispatcher);
        assert_eq!(early.deferred_writes, 1);
        assert!(early.dispatched.is_empty());

        let late = coordinator.process_queue_at(now + DELAY + Duration::from_millis(1), &dispatcher);
        assert_eq!(late.dispatched, vec![(DatasetId::new(1), WorkerKind::Writer)]);
        assert!(coordinator.queued_state(DatasetId::new(1)).is_none());
        assert!(coordinator.write_deadline(DatasetId::new(1)).is_none());
        assert!(coordinator.is_active(DatasetId::new(1)));
    }

    #[test]
    fn restore_and_archive_dispatch_immediately() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        coordinator.queue(ds(1), RequestedOp::Restore).unwrap();
        coordinator.queue(ds(2), RequestedOp::Archive).unwrap();

        coordinator.process_queue(&dispatcher);

        let mut kinds = dispatcher.kinds();
        kinds.sort_by_key(|(id, _)| *id);
        assert_eq!(
            kinds,
            vec![
                (DatasetId::new(1), WorkerKind::Restorer),
                (DatasetId::new(2), WorkerKind::Archiver),
            ]
        );
    }

    #[test]
    fn active_dataset_is_not_dispatched_again() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        coordinator.queue(ds(1), RequestedOp::Restore).unwrap();
        coordinator.process_queue(&dispatcher);

        coordinator.queue(ds(1), RequestedOp::Archive).unwrap();
        let report = coordinator.process_queue(&dispatcher);

        assert_eq!(report.skipped_active, 1);
        assert!(report.dispatched.is_empty());
        assert_eq!(
            coordinator.queued_state(DatasetId::new(1)),
            Some(QueuedState::ArchiveRequested)
        );

        dispatcher.finish_all();
        let report = coordinator.process_queue(&dispatcher);
        assert_eq!(report.dispatched, vec![(DatasetId::new(1), WorkerKind::Archiver)]);
    }

    #[test]
    fn locked_archive_is_dropped() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        let lock = coordinator.lock([DatasetId::new(4)]);
        coordinator.queue(ds(4), RequestedOp::Archive).unwrap();

        let report = coordinator.process_queue(&dispatcher);

        assert_eq!(report.dropped_archives, vec![DatasetId::new(4)]);
        assert!(report.dispatched.is_empty());
        assert!(coordinator.queued_state(DatasetId::new(4)).is_none());
        assert!(!coordinator.is_active(DatasetId::new(4)));

        coordinator.unlock(&lock);
        let report = coordinator.process_queue(&dispatcher);
        assert!(report.is_idle());
    }

    #[test]
    fn dropping_order_completes_dataset() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        coordinator.queue(ds(1), RequestedOp::Restore).unwrap();
        coordinator.process_queue(&dispatcher);
        assert!(coordinator.is_active(DatasetId::new(1)));

        dispatcher.orders.lock().clear();

        assert!(!coordinator.is_active(DatasetId::new(1)));
    }

    #[test]
    fn complete_unknown_dataset_is_noop() {
        let (_temp, coordinator) = setup();
        assert!(!coordinator.complete(&ds(99)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Introspection
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn status_reports_queued_then_changing() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        coordinator.queue(ds(2), RequestedOp::Restore).unwrap();
        coordinator.process_queue(&dispatcher);
        coordinator.queue(ds(2), RequestedOp::Archive).unwrap();
        coordinator.queue(ds(1), RequestedOp::Write).unwrap();
        coordinator.lock([DatasetId::new(7), DatasetId::new(3)]);
        coordinator.lock([DatasetId::new(3)]);

        let status = coordinator.status();

        assert_eq!(status.ops_queue.len(), 2);
        assert_eq!(
            status.queued_state(DatasetId::new(1)),
            Some(QueuedState::WriteRequested)
        );
        // Queued behind its own worker, so only shown as in progress.
        assert!(status.is_changing(DatasetId::new(2)));
        assert_eq!(status.lock_count, 2);
        assert_eq!(
            status.locked_datasets,
            vec![DatasetId::new(3), DatasetId::new(7)]
        );
    }

    #[test]
    fn restoring_includes_active_and_queued_restores() {
        let (_temp, coordinator) = setup();
        let dispatcher = HoldingDispatcher::default();
        coordinator.queue(ds(1), RequestedOp::Archive).unwrap();
        coordinator.process_queue(&dispatcher);
        coordinator.queue(ds(2), RequestedOp::Restore).unwrap();
        coordinator.queue(ds(3), RequestedOp::Write).unwrap();

        let restoring = coordinator.restoring();

        assert_eq!(restoring.len(), 2);
        assert!(restoring.contains(&ds(1)));
        assert!(restoring.contains(&ds(2)));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Request folding
    // ─────────────────────────────────────────────────────────────────────────

    fn any_op() -> impl Strategy<Value = RequestedOp> {
        prop_oneof![
            Just(RequestedOp::Write),
            Just(RequestedOp::Archive),
            Just(RequestedOp::Restore),
        ]
    }

    proptest! {
        #[test]
        fn queued_state_tracks_table_fold(ops in proptest::collection::vec(any_op(), 1..30)) {
            let (_temp, coordinator) = setup();
            let id = DatasetId::new(1);
            let start = Instant::now();

            for (i, op) in ops.iter().enumerate() {
                let now = start + Duration::from_millis(i as u64);
                coordinator.queue_at(ds(1), *op, now).unwrap();

                let state = coordinator.queued_state(id);
                prop_assert_eq!(state, fold_requests(ops[..=i].iter().copied()));

                let writing = state.map(|s| s.involves_write()).unwrap_or(false);
                prop_assert_eq!(coordinator.write_deadline(id).is_some(), writing);
                if writing {
                    prop_assert!(coordinator.markers().is_marked(id));
                }
            }
        }
    }
}
