//! Bounded circular job queue with blocking push/pop.

use super::semaphore::Semaphore;
use super::QueueError;
use crate::core::{BoxedJob, Result, ThreadError};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Fixed-length ring of job slots.
///
/// Slots in `[head, head + count)` (mod capacity) hold unconsumed jobs;
/// every other slot is `None`.
struct Ring {
    slots: Box<[Option<BoxedJob>]>,
    head: usize,
    tail: usize,
    count: usize,
}

impl Ring {
    fn with_capacity(capacity: usize) -> Result<Self> {
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|_| ThreadError::out_of_memory("job slots", capacity))?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots: slots.into_boxed_slice(),
            head: 0,
            tail: 0,
            count: 0,
        })
    }

    fn push(&mut self, job: BoxedJob) {
        debug_assert!(self.count < self.slots.len(), "push into a full ring");
        debug_assert!(self.slots[self.tail].is_none());
        self.slots[self.tail] = Some(job);
        self.tail = (self.tail + 1) % self.slots.len();
        self.count += 1;
    }

    fn pop(&mut self) -> Option<BoxedJob> {
        if self.count == 0 {
            return None;
        }
        let job = self.slots[self.head].take();
        debug_assert!(job.is_some(), "occupied slot was empty");
        self.head = (self.head + 1) % self.slots.len();
        self.count -= 1;
        job
    }

    /// Detaches the backing array, leaving an empty ring behind.
    fn release(&mut self) -> Box<[Option<BoxedJob>]> {
        self.head = 0;
        self.tail = 0;
        self.count = 0;
        std::mem::take(&mut self.slots)
    }
}

/// A fixed-capacity FIFO of jobs shared by producers and workers.
///
/// Two closable semaphores model the blocking conditions: `free_slots`
/// starts at `capacity` and is taken by producers, `items` starts at zero
/// and is taken by consumers. Every operation follows the same order:
/// take a permit, lock the ring, update cursors, unlock, release the
/// complementary permit. The ring lock is never held while waiting on a
/// semaphore.
///
/// # Example
///
/// ```rust
/// use rust_bounded_pool::core::ClosureJob;
/// use rust_bounded_pool::queue::BoundedJobQueue;
///
/// let queue = BoundedJobQueue::new(2).unwrap();
/// queue.enqueue(Box::new(ClosureJob::new(|| println!("hello")))).unwrap();
/// assert_eq!(queue.len(), 1);
///
/// let job = queue.dequeue().unwrap();
/// job.execute();
///
/// queue.destroy();
/// assert!(queue.dequeue().is_err());
/// ```
pub struct BoundedJobQueue {
    ring: Mutex<Ring>,
    free_slots: Semaphore,
    items: Semaphore,
    shutdown: AtomicBool,
    capacity: usize,
}

impl BoundedJobQueue {
    /// Creates a queue holding at most `capacity` jobs.
    ///
    /// # Errors
    ///
    /// - `ThreadError::InvalidArgument` if `capacity` is 0
    /// - `ThreadError::OutOfMemory` if the slot array cannot be allocated
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ThreadError::invalid_argument(
                "queue_capacity",
                "Queue capacity must be greater than 0",
            ));
        }

        Ok(Self {
            ring: Mutex::new(Ring::with_capacity(capacity)?),
            free_slots: Semaphore::new(capacity),
            items: Semaphore::new(0),
            shutdown: AtomicBool::new(false),
            capacity,
        })
    }

    /// Appends a job, blocking while the queue is full.
    ///
    /// Fails without blocking if shutdown was already requested. A producer
    /// blocked on a full queue is woken by [`destroy`](Self::destroy) and
    /// gets its job back in [`QueueError::Rejected`].
    pub fn enqueue(&self, job: BoxedJob) -> std::result::Result<(), QueueError> {
        if self.is_shutdown() {
            return Err(QueueError::Rejected(job));
        }
        if self.free_slots.acquire().is_err() {
            return Err(QueueError::Rejected(job));
        }

        let mut ring = self.ring.lock();
        // destroy() may have run between the permit and the lock
        if self.shutdown.load(Ordering::Acquire) {
            return Err(QueueError::Rejected(job));
        }
        ring.push(job);
        drop(ring);

        self.items.release();
        Ok(())
    }

    /// Removes the oldest job, blocking while the queue is empty.
    ///
    /// Once shutdown is requested this returns [`QueueError::ShutDown`],
    /// even if jobs remain queued.
    pub fn dequeue(&self) -> std::result::Result<BoxedJob, QueueError> {
        if self.items.acquire().is_err() {
            return Err(QueueError::ShutDown);
        }

        let mut ring = self.ring.lock();
        if self.shutdown.load(Ordering::Acquire) {
            return Err(QueueError::ShutDown);
        }
        let job = ring.pop();
        drop(ring);

        if job.is_some() {
            self.free_slots.release();
        }
        job.ok_or(QueueError::ShutDown)
    }

    /// Marks the queue as shut down, wakes every blocked producer and
    /// consumer, and releases the slot array.
    ///
    /// Jobs still queued are dropped without running. Returns how many were
    /// discarded; calls after the first return 0.
    pub fn destroy(&self) -> usize {
        let slots = {
            let mut ring = self.ring.lock();
            self.shutdown.store(true, Ordering::Release);
            ring.release()
        };

        self.free_slots.close();
        self.items.close();

        // Job destructors run outside the ring lock
        slots.into_vec().into_iter().flatten().count()
    }

    /// Returns true once [`destroy`](Self::destroy) has been called.
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Returns the fixed capacity of this queue.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of jobs currently queued.
    pub fn len(&self) -> usize {
        self.ring.lock().count
    }

    /// Returns true if no jobs are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for BoundedJobQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedJobQueue")
            .field("capacity", &self.capacity)
            .field("len", &self.len())
            .field("shutdown", &self.is_shutdown())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ClosureJob;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn create_test_job() -> BoxedJob {
        Box::new(ClosureJob::new(|| {}))
    }

    fn recording_job(log: &Arc<Mutex<Vec<usize>>>, value: usize) -> BoxedJob {
        let log = Arc::clone(log);
        Box::new(ClosureJob::new(move || log.lock().push(value)))
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let result = BoundedJobQueue::new(0);
        assert!(matches!(result, Err(ThreadError::InvalidArgument { .. })));
    }

    #[test]
    fn test_unallocatable_capacity_reports_out_of_memory() {
        let result = BoundedJobQueue::new(usize::MAX);
        assert!(matches!(
            result,
            Err(ThreadError::OutOfMemory {
                what: "job slots",
                ..
            })
        ));
    }

    #[test]
    fn test_enqueue_dequeue() {
        let queue = BoundedJobQueue::new(4).unwrap();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 4);

        queue.enqueue(create_test_job()).unwrap();
        assert_eq!(queue.len(), 1);

        let job = queue.dequeue().unwrap();
        assert_eq!(job.job_type(), "ClosureJob");
        assert!(queue.is_empty());
    }

    #[test]
    fn test_fifo_across_wraparound() {
        let queue = BoundedJobQueue::new(3).unwrap();
        let log = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            queue.enqueue(recording_job(&log, i)).unwrap();
        }
        for _ in 0..2 {
            queue.dequeue().unwrap().execute();
        }
        // tail wraps to the front of the slot array
        for i in 3..5 {
            queue.enqueue(recording_job(&log, i)).unwrap();
        }
        assert_eq!(queue.len(), 3);
        for _ in 0..3 {
            queue.dequeue().unwrap().execute();
        }

        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_enqueue_blocks_when_full() {
        let queue = Arc::new(BoundedJobQueue::new(1).unwrap());
        queue.enqueue(create_test_job()).unwrap();

        let q = Arc::clone(&queue);
        let handle = thread::spawn(move || {
            // This should block until the queue has space
            q.enqueue(create_test_job()).unwrap();
        });

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());
        assert_eq!(queue.len(), 1);

        queue.dequeue().unwrap();

        handle.join().unwrap();
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_dequeue_blocks_when_empty() {
        let queue = Arc::new(BoundedJobQueue::new(2).unwrap());

        let q = Arc::clone(&queue);
        let handle = thread::spawn(move || q.dequeue().map(|job| job.job_type().to_string()));

        thread::sleep(Duration::from_millis(50));
        assert!(!handle.is_finished());

        queue
            .enqueue(Box::new(ClosureJob::with_name(|| {}, "Wakeup")))
            .unwrap();
        assert_eq!(handle.join().unwrap().unwrap(), "Wakeup");
    }

    #[test]
    fn test_backpressure_three_producers_capacity_two() {
        let queue = Arc::new(BoundedJobQueue::new(2).unwrap());
        let (done_tx, done_rx) = crossbeam_channel::unbounded();

        let producers: Vec<_> = (0..3)
            .map(|_| {
                let q = Arc::clone(&queue);
                let done_tx = done_tx.clone();
                thread::spawn(move || {
                    q.enqueue(create_test_job()).unwrap();
                    done_tx.send(()).unwrap();
                })
            })
            .collect();

        // Exactly two producers get through promptly
        for _ in 0..2 {
            done_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert!(done_rx.recv_timeout(Duration::from_millis(100)).is_err());
        assert_eq!(queue.len(), 2);

        // Freeing a slot releases the third
        queue.dequeue().unwrap();
        done_rx.recv_timeout(Duration::from_secs(5)).unwrap();

        for producer in producers {
            producer.join().unwrap();
        }
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_destroy_wakes_blocked_consumers() {
        let queue = Arc::new(BoundedJobQueue::new(4).unwrap());
        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&queue);
                thread::spawn(move || q.dequeue().is_err())
            })
            .collect();

        thread::sleep(Duration::from_millis(50));
        queue.destroy();

        for consumer in consumers {
            assert!(consumer.join().unwrap(), "consumer should observe shutdown");
        }
    }

    #[test]
    fn test_destroy_wakes_blocked_producer_and_returns_job() {
        let queue = Arc::new(BoundedJobQueue::new(1).unwrap());
        queue.enqueue(create_test_job()).unwrap();

        let q = Arc::clone(&queue);
        let producer = thread::spawn(move || {
            match q.enqueue(Box::new(ClosureJob::with_name(|| {}, "Returned"))) {
                Err(QueueError::Rejected(job)) => job.job_type().to_string(),
                other => panic!("expected Rejected, got {:?}", other.is_ok()),
            }
        });

        thread::sleep(Duration::from_millis(50));
        queue.destroy();

        assert_eq!(producer.join().unwrap(), "Returned");
    }

    #[test]
    fn test_enqueue_after_destroy_fails_immediately() {
        let queue = BoundedJobQueue::new(2).unwrap();
        assert_eq!(queue.destroy(), 0);
        assert!(queue.is_shutdown());

        let err = queue.enqueue(create_test_job()).unwrap_err();
        assert!(matches!(err, QueueError::Rejected(_)));
        assert!(err.into_job().is_some());
    }

    #[test]
    fn test_destroy_discards_queued_jobs() {
        let queue = BoundedJobQueue::new(4).unwrap();
        let ran = Arc::new(AtomicUsize::new(0));
        let payload = Arc::new(());

        for _ in 0..3 {
            let ran = Arc::clone(&ran);
            let payload = Arc::clone(&payload);
            queue
                .enqueue(Box::new(ClosureJob::new(move || {
                    let _payload = payload;
                    ran.fetch_add(1, Ordering::SeqCst);
                })))
                .unwrap();
        }
        assert_eq!(Arc::strong_count(&payload), 4);

        assert_eq!(queue.destroy(), 3);
        assert_eq!(queue.destroy(), 0);

        // Items remained, but dequeue still reports shutdown
        assert!(matches!(queue.dequeue(), Err(QueueError::ShutDown)));
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert_eq!(Arc::strong_count(&payload), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_concurrent_producers_and_consumers() {
        let capacity = 8;
        let queue = Arc::new(BoundedJobQueue::new(capacity).unwrap());
        let executed: Arc<Vec<AtomicUsize>> =
            Arc::new((0..1000).map(|_| AtomicUsize::new(0)).collect());

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let q = Arc::clone(&queue);
                let executed = Arc::clone(&executed);
                thread::spawn(move || {
                    for i in 0..250 {
                        let id = p * 250 + i;
                        let executed = Arc::clone(&executed);
                        q.enqueue(Box::new(ClosureJob::new(move || {
                            executed[id].fetch_add(1, Ordering::SeqCst);
                        })))
                        .unwrap();
                        assert!(q.len() <= capacity);
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = Arc::clone(&queue);
                thread::spawn(move || {
                    for _ in 0..250 {
                        q.dequeue().unwrap().execute();
                    }
                })
            })
            .collect();

        for handle in producers.into_iter().chain(consumers) {
            handle.join().unwrap();
        }

        assert!(queue.is_empty());
        assert!(executed.iter().all(|count| count.load(Ordering::SeqCst) == 1));
    }
}
