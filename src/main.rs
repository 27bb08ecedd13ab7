//! Contention benchmark: throughput across many locks plus acquisition
//! fairness on a single lock, for each lock type.

use std::{iter, sync::Barrier, time};

use crossbeam_utils::{thread::scope, CachePadded};

fn main() {
    let mut args = std::env::args()
        .skip(1)
        .map(|it| it.parse::<u32>().unwrap());

    let options = Options {
        n_threads: args.next().unwrap_or(4),
        n_locks: args.next().unwrap_or(8),
        n_ops: args.next().unwrap_or(50_000),
        n_rounds: args.next().unwrap_or(10),
    };
    println!("{:#?}\n", options);

    bench::<mutexes::Std>("std::sync::Mutex", &options);
    bench::<mutexes::ParkingLot>("parking_lot::Mutex", &options);
    bench::<mutexes::Spin>("spin::Mutex", &options);
    bench::<mutexes::Ticket>("TicketMutex", &options);
    bench::<mutexes::Tas>("TasMutex", &options);
}

#[derive(Debug)]
struct Options {
    n_threads: u32,
    n_locks: u32,
    n_ops: u32,
    n_rounds: u32,
}

trait Mutex: Sync + Send + Default {
    fn with_lock(&self, f: impl FnOnce(&mut u32));
}

fn bench<M: Mutex>(label: &str, options: &Options) {
    let mut times = (0..options.n_rounds)
        .map(|_| run_throughput::<M>(options))
        .collect::<Vec<_>>();
    times.sort();
    let avg = times.iter().sum::<time::Duration>() / options.n_rounds;

    let (fewest, most) = run_fairness::<M>(options);

    println!(
        "{:<20} avg {:<12} min {:<12} max {:<12} ops/thread {}..{}",
        label,
        format!("{:?}", avg),
        format!("{:?}", times[0]),
        format!("{:?}", *times.last().unwrap()),
        fewest,
        most,
    )
}

fn xorshift(seed: u32) -> impl Iterator<Item = u32> {
    let mut random = seed;
    iter::repeat_with(move || {
        random ^= random << 13;
        random ^= random >> 17;
        random ^= random << 5;
        random
    })
}

/// One timed round: every thread walks a random stride over `n_locks` padded
/// locks, incrementing the counter under each. The exact final sum doubles as
/// a mutual-exclusion check.
fn run_throughput<M: Mutex>(options: &Options) -> time::Duration {
    let locks = &(0..options.n_locks)
        .map(|_| CachePadded::new(M::default()))
        .collect::<Vec<_>>();

    let start_barrier = &Barrier::new(options.n_threads as usize + 1);
    let end_barrier = &Barrier::new(options.n_threads as usize + 1);

    let elapsed = scope(|scope| {
        let thread_seeds = xorshift(0x6F4A_955E).scan(0x9BA2_BF27, |state, n| {
            *state ^= n;
            Some(*state)
        });
        for thread_seed in thread_seeds.take(options.n_threads as usize) {
            scope.spawn(move |_| {
                start_barrier.wait();
                let indexes = xorshift(thread_seed)
                    .map(|it| (it % options.n_locks) as usize)
                    .take(options.n_ops as usize);
                for idx in indexes {
                    locks[idx].with_lock(|cnt| *cnt += 1);
                }
                end_barrier.wait();
            });
        }

        start_barrier.wait();
        let start = time::Instant::now();
        end_barrier.wait();
        let elapsed = start.elapsed();

        let mut total = 0;
        for lock in locks.iter() {
            lock.with_lock(|cnt| total += *cnt);
        }
        assert_eq!(total, options.n_threads * options.n_ops);

        elapsed
    })
    .unwrap();
    elapsed
}

/// All threads contend on one lock until the shared counter reaches
/// `n_threads * n_ops`; returns the smallest and largest per-thread
/// acquisition counts. A fair lock keeps the spread tight.
fn run_fairness<M: Mutex>(options: &Options) -> (u32, u32) {
    let lock = &CachePadded::new(M::default());
    let target = options.n_threads * options.n_ops;
    let barrier = &Barrier::new(options.n_threads as usize);

    let counts = scope(|scope| {
        let handles = (0..options.n_threads)
            .map(|_| {
                scope.spawn(move |_| {
                    barrier.wait();
                    let mut mine = 0u32;
                    loop {
                        let mut done = false;
                        lock.with_lock(|cnt| {
                            if *cnt >= target {
                                done = true;
                            } else {
                                *cnt += 1;
                                mine += 1;
                            }
                        });
                        if done {
                            return mine;
                        }
                    }
                })
            })
            .collect::<Vec<_>>();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect::<Vec<_>>()
    })
    .unwrap();

    let fewest = *counts.iter().min().unwrap();
    let most = *counts.iter().max().unwrap();
    (fewest, most)
}

mod mutexes {
    use super::Mutex;

    pub(crate) type Std = std::sync::Mutex<u32>;
    pub(crate) type ParkingLot = lock_api::Mutex<parking_lot::RawMutex, u32>;
    pub(crate) type Spin = lock_api::Mutex<spin::mutex::Mutex<()>, u32>;
    pub(crate) type Ticket = lock_api::Mutex<ticket_spin::RawTicketLock, u32>;
    pub(crate) type Tas = lock_api::Mutex<ticket_spin::RawTasLock, u32>;

    impl Mutex for Std {
        fn with_lock(&self, f: impl FnOnce(&mut u32)) {
            let mut guard = self.lock().unwrap();
            f(&mut guard)
        }
    }

    impl<T: lock_api::RawMutex + Sync + Send> Mutex for lock_api::Mutex<T, u32> {
        fn with_lock(&self, f: impl FnOnce(&mut u32)) {
            let mut guard = self.lock();
            f(&mut guard)
        }
    }
}
