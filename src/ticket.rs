//! Classic FIFO ticket lock (Mellor-Crummey & Scott, 1991).

use std::{
    hint::spin_loop,
    sync::atomic::{AtomicU32, Ordering},
};

use lock_api::{GuardSend, RawMutex};

/// A fair busy-wait lock.
///
/// `queue` is the next ticket to hand out; `dequeue` is the ticket currently
/// allowed into the critical section. Acquisition takes a ticket with a single
/// fetch-and-add and spins until `dequeue` catches up, so threads enter in
/// strictly increasing ticket order.
///
/// Both counters wrap at `u32::MAX`. The wait condition is an equality test
/// and [`queue_len`](Self::queue_len) subtracts with wrapping, so wraparound
/// is harmless as long as fewer than `2^32` threads contend at once.
///
/// Re-entrant acquisition deadlocks, and unlocking without holding the lock
/// hands the critical section to a waiter that has no right to it yet. Both
/// are contract violations; neither is detected.
pub struct RawTicketLock {
    queue: AtomicU32,
    dequeue: AtomicU32,
}

impl RawTicketLock {
    /// Number of threads currently holding or waiting for the lock.
    ///
    /// Racy by nature: the answer may be stale by the time the caller looks
    /// at it. Useful for contention polling, not for synchronization.
    pub fn queue_len(&self) -> u32 {
        let queue = self.queue.load(Ordering::Relaxed);
        let dequeue = self.dequeue.load(Ordering::Relaxed);
        queue.wrapping_sub(dequeue)
    }
}

unsafe impl RawMutex for RawTicketLock {
    const INIT: RawTicketLock = RawTicketLock {
        queue: AtomicU32::new(0),
        dequeue: AtomicU32::new(0),
    };

    type GuardMarker = GuardSend;

    fn lock(&self) {
        // The fetch_add is the only point that assigns waiting order; it must
        // be a single RMW or two threads could draw the same ticket.
        let ticket = self.queue.fetch_add(1, Ordering::Relaxed);
        while self.dequeue.load(Ordering::Acquire) != ticket {
            spin_loop();
        }
    }

    /// One shot, and it does not join the FCFS queue: failure takes no ticket
    /// and reserves no position.
    fn try_lock(&self) -> bool {
        let dequeue = self.dequeue.load(Ordering::Acquire);
        // Succeeds only if `queue` still equals the serving counter, i.e. the
        // lock was free at the instant of the exchange; the exchange itself
        // claims ticket `dequeue`. Two concurrent callers cannot both win the
        // exchange at the same expected value.
        self.queue
            .compare_exchange(
                dequeue,
                dequeue.wrapping_add(1),
                Ordering::Acquire,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    unsafe fn unlock(&self) {
        // RMW rather than a store: concurrent try_lock reads must observe a
        // single consistent modification order on both counters.
        self.dequeue.fetch_add(1, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.queue_len() != 0
    }
}
