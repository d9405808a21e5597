//! Fire-once delayed effects on a virtual timeline.
//!
//! Nothing here sleeps. Effects are queued with a due time measured from the
//! session origin, and whoever owns the timeline drains the due ones after
//! reading a [`Clock`]. Scheduled effects cannot be cancelled.

use std::{
    cmp::{
        Ordering,
        Reverse,
    },
    collections::BinaryHeap,
    time::Duration,
};

/// Time elapsed since the session started.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Wall clock backed by tokio's instant, so paused test runtimes control it too.
#[derive(Clone, Copy, Debug)]
pub struct TokioClock {
    origin: tokio::time::Instant,
}

impl TokioClock {
    pub fn start() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Clock for TokioClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct TaskHandle {
    pub seq: u64,
    pub due: Duration,
}

#[derive(Debug)]
struct Entry<E> {
    due: Duration,
    seq: u64,
    effect: E,
}

impl<E> PartialEq for Entry<E> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<E> Eq for Entry<E> {}

impl<E> PartialOrd for Entry<E> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<E> Ord for Entry<E> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

#[derive(Debug)]
pub struct Timeline<E> {
    queue: BinaryHeap<Reverse<Entry<E>>>,
    next_seq: u64,
}

impl<E> Default for Timeline<E> {
    fn default() -> Self {
        Self {
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }
}

impl<E> Timeline<E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Duration, delay: Duration, effect: E) -> TaskHandle {
        let handle = TaskHandle {
            seq: self.next_seq,
            due: now.saturating_add(delay),
        };
        self.next_seq += 1;
        self.queue.push(Reverse(Entry {
            due: handle.due,
            seq: handle.seq,
            effect,
        }));
        handle
    }

    /// Removes and returns every effect due at or before `now` with its due
    /// time, earliest first; ties come out in scheduling order.
    pub fn drain_due(&mut self, now: Duration) -> Vec<(Duration, E)> {
        let mut due = Vec::new();
        while let Some(Reverse(entry)) = self.queue.peek() {
            if entry.due > now {
                break;
            }
            if let Some(Reverse(entry)) = self.queue.pop() {
                due.push((entry.due, entry.effect));
            }
        }
        due
    }

    pub fn next_due(&self) -> Option<Duration> {
        self.queue.peek().map(|Reverse(entry)| entry.due)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
