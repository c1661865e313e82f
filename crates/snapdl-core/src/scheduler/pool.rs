//! Bounded thread pool over a shared work queue.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{mpsc, Mutex, PoisonError};
use std::thread;

/// A job panicked; its slot carries this instead of a result.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("worker panicked on item {index}: {message}")]
pub struct JobPanicked {
    pub index: usize,
    pub message: String,
}

/// Runs `job` over `items` on at most `workers` threads.
///
/// `on_done` is called on the calling thread, once per item, in completion
/// order. The returned results are in input order. The pool size is clamped to
/// `1..=items.len()`; no threads are started for an empty list.
pub fn run_bounded<T, R, F, C>(
    items: Vec<T>,
    workers: usize,
    job: F,
    mut on_done: C,
) -> Vec<Result<R, JobPanicked>>
where
    T: Send,
    R: Send,
    F: Fn(usize, T) -> R + Sync,
    C: FnMut(usize, &Result<R, JobPanicked>),
{
    let count = items.len();
    if count == 0 {
        return Vec::new();
    }
    let work: Mutex<VecDeque<(usize, T)>> = Mutex::new(items.into_iter().enumerate().collect());
    let num_workers = workers.clamp(1, count);
    let mut slots: Vec<Option<Result<R, JobPanicked>>> = (0..count).map(|_| None).collect();

    thread::scope(|scope| {
        let (tx, rx) = mpsc::channel();
        for _ in 0..num_workers {
            let tx = tx.clone();
            let work = &work;
            let job = &job;
            scope.spawn(move || loop {
                // A job never runs while the lock is held, so poisoning cannot occur.
                let next = work
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some((index, item)) = next else {
                    break;
                };
                let res = panic::catch_unwind(AssertUnwindSafe(|| job(index, item))).map_err(
                    |payload| JobPanicked {
                        index,
                        message: panic_message(payload.as_ref()),
                    },
                );
                if tx.send((index, res)).is_err() {
                    break;
                }
            });
        }
        drop(tx);

        for (index, res) in rx {
            on_done(index, &res);
            slots[index] = Some(res);
        }
    });

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                Err(JobPanicked {
                    index,
                    message: "worker exited without a result".to_string(),
                })
            })
        })
        .collect()
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
