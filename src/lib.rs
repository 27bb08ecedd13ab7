//! Busy-wait locks built directly on atomics: a FIFO ticket lock and a
//! test-and-set spinlock, both exposed as [`lock_api::RawMutex`] impls.
//!
//! These are pure spin locks. They never sleep and never yield to the OS
//! scheduler, which makes them suitable only for critical sections short
//! enough that a context switch would cost more than the spin.

#![allow(clippy::declare_interior_mutable_const)]

mod tas;
mod ticket;

pub use tas::RawTasLock;
pub use ticket::RawTicketLock;

/// A fair mutex with strict first-come-first-served handoff.
pub type TicketMutex<T> = lock_api::Mutex<RawTicketLock, T>;

/// Guard for [`TicketMutex`]; releases the lock on drop.
pub type TicketMutexGuard<'a, T> = lock_api::MutexGuard<'a, RawTicketLock, T>;

/// An unfair test-and-set mutex.
pub type TasMutex<T> = lock_api::Mutex<RawTasLock, T>;

/// Guard for [`TasMutex`]; releases the lock on drop.
pub type TasMutexGuard<'a, T> = lock_api::MutexGuard<'a, RawTasLock, T>;
