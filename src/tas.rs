//! Test-and-set spinlock.

use std::{
    hint::spin_loop,
    sync::atomic::{AtomicBool, Ordering},
};

use lock_api::{GuardSend, RawMutex};

/// An unfair busy-wait lock: a single byte swapped between 0 and 1.
///
/// Waiters race on every release and arrival order is not preserved, so under
/// sustained contention a thread can lose the exchange indefinitely. Callers
/// that need fairness want [`RawTicketLock`](crate::RawTicketLock) instead.
///
/// Unlocking without holding the lock is a contract violation and is not
/// detected.
pub struct RawTasLock {
    locked: AtomicBool,
}

unsafe impl RawMutex for RawTasLock {
    const INIT: RawTasLock = RawTasLock {
        locked: AtomicBool::new(false),
    };

    type GuardMarker = GuardSend;

    fn lock(&self) {
        // Test-and-test-and-set: spin on plain loads between exchange
        // attempts so waiters read a shared cache line instead of bouncing it.
        while self.locked.swap(true, Ordering::Acquire) {
            while self.locked.load(Ordering::Relaxed) {
                spin_loop();
            }
        }
    }

    fn try_lock(&self) -> bool {
        self.locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }

    unsafe fn unlock(&self) {
        // A plain release store suffices: only the holder writes 0.
        self.locked.store(false, Ordering::Release);
    }

    fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Barrier,
    };

    use crossbeam_utils::thread::scope;
    use lock_api::RawMutex;

    use super::RawTasLock;
    use crate::TasMutex;

    #[test]
    fn cycle_returns_to_initial_state() {
        let lock = RawTasLock::INIT;
        assert!(!lock.is_locked());
        lock.lock();
        assert!(lock.is_locked());
        unsafe { lock.unlock() };
        assert!(!lock.is_locked());
    }

    #[test]
    fn try_lock_fails_while_held() {
        let lock = RawTasLock::INIT;
        assert!(lock.try_lock());
        assert!(!lock.try_lock());
        unsafe { lock.unlock() };
        assert!(lock.try_lock());
        unsafe { lock.unlock() };
    }

    #[test]
    fn no_increment_is_lost_under_contention() {
        const THREADS: u32 = 4;
        const OPS: u32 = 50_000;

        let mutex = TasMutex::new(0u32);
        let barrier = Barrier::new(THREADS as usize);
        scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|_| {
                    barrier.wait();
                    for _ in 0..OPS {
                        *mutex.lock() += 1;
                    }
                });
            }
        })
        .unwrap();

        assert_eq!(mutex.into_inner(), THREADS * OPS);
    }

    #[test]
    fn at_most_one_thread_in_section() {
        const THREADS: u32 = 4;
        const OPS: u32 = 10_000;

        let lock = RawTasLock::INIT;
        let in_section = AtomicU32::new(0);
        let barrier = Barrier::new(THREADS as usize);
        scope(|s| {
            for _ in 0..THREADS {
                s.spawn(|_| {
                    barrier.wait();
                    for _ in 0..OPS {
                        lock.lock();
                        assert_eq!(in_section.fetch_add(1, Ordering::AcqRel), 0);
                        in_section.fetch_sub(1, Ordering::AcqRel);
                        unsafe { lock.unlock() };
                    }
                });
            }
        })
        .unwrap();

        assert!(!lock.is_locked());
    }
}
