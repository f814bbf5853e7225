//! Cooperative timer queue on a virtual millisecond clock
//!
//! Tasks carry a payload `T` instead of a closure; the owner pops due payloads
//! and dispatches them itself. Ordering is by due time, then by insertion, so
//! two tasks due at the same instant run FIFO.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Handle returned for every scheduled task. Pass it to [`Scheduler::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CancelHandle(u64);

#[derive(Debug)]
struct Task<T> {
    payload: T,
    /// `Some` for repeating tasks
    interval: Option<u64>,
}

/// Single-threaded task queue
#[derive(Debug)]
pub struct Scheduler<T> {
    now_ms: u64,
    next_seq: u64,
    next_id: u64,
    /// (due, seq, task id); cancelled ids are skipped lazily
    queue: BinaryHeap<Reverse<(u64, u64, u64)>>,
    tasks: HashMap<u64, Task<T>>,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            next_seq: 0,
            next_id: 1,
            queue: BinaryHeap::new(),
            tasks: HashMap::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> u64 {
        self.now_ms
    }

    /// Number of live (not cancelled, not yet fired one-shot) tasks
    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    /// Run `payload` once, `delay_ms` from now
    pub fn schedule_after(&mut self, delay_ms: u64, payload: T) -> CancelHandle {
        self.insert(delay_ms, payload, None)
    }

    /// Run `payload` every `interval_ms`, first time one interval from now
    pub fn schedule_repeating(&mut self, interval_ms: u64, payload: T) -> CancelHandle {
        // A zero interval would never let the clock advance
        let interval_ms = interval_ms.max(1);
        self.insert(interval_ms, payload, Some(interval_ms))
    }

    /// Cancel a task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: CancelHandle) -> bool {
        self.tasks.remove(&handle.0).is_some()
    }

    /// Whether a handle still refers to a live task
    pub fn is_pending(&self, handle: CancelHandle) -> bool {
        self.tasks.contains_key(&handle.0)
    }

    /// Drop every task
    pub fn clear(&mut self) {
        self.tasks.clear();
        self.queue.clear();
    }

    fn insert(&mut self, delay_ms: u64, payload: T, interval: Option<u64>) -> CancelHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.tasks.insert(id, Task { payload, interval });
        self.push(self.now_ms + delay_ms, id);
        CancelHandle(id)
    }

    fn push(&mut self, due: u64, id: u64) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Reverse((due, seq, id)));
    }

    /// Set the clock to `until` once all due tasks have been drained
    pub fn advance_to(&mut self, until: u64) {
        if until > self.now_ms {
            self.now_ms = until;
        }
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pop the next task due at or before `until`, moving the clock to its due time.
    ///
    /// Repeating tasks are re-armed at `due + interval` before the payload is
    /// returned, so cancelling from inside the dispatch still takes effect.
    pub fn pop_due(&mut self, until: u64) -> Option<(CancelHandle, T)> {
        while let Some(&Reverse((due, _, id))) = self.queue.peek() {
            if due > until {
                return None;
            }
            self.queue.pop();

            let Some(task) = self.tasks.get(&id) else {
                // Cancelled
                continue;
            };
            let payload = task.payload.clone();
            let interval = task.interval;

            self.now_ms = self.now_ms.max(due);
            match interval {
                Some(interval) => self.push(due + interval, id),
                None => {
                    self.tasks.remove(&id);
                }
            }
            return Some((CancelHandle(id), payload));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(s: &mut Scheduler<&'static str>, until: u64) -> Vec<(u64, &'static str)> {
        let mut fired = Vec::new();
        while let Some((_, p)) = s.pop_due(until) {
            fired.push((s.now(), p));
        }
        s.advance_to(until);
        fired
    }

    #[test]
    fn test_one_shot_fires_once() {
        let mut s = Scheduler::new();
        s.schedule_after(10, "a");
        assert_eq!(s.pending(), 1);
        assert!(drain(&mut s, 9).is_empty());
        assert_eq!(drain(&mut s, 10), vec![(10, "a")]);
        assert_eq!(s.pending(), 0);
        assert!(drain(&mut s, 100).is_empty());
    }

    #[test]
    fn test_repeating_rearms() {
        let mut s = Scheduler::new();
        s.schedule_repeating(20, "tick");
        let fired = drain(&mut s, 100);
        assert_eq!(fired.len(), 5);
        assert_eq!(fired.last(), Some(&(100, "tick")));
        assert_eq!(s.pending(), 1);
    }

    #[test]
    fn test_same_due_time_is_fifo() {
        let mut s = Scheduler::new();
        s.schedule_after(5, "first");
        s.schedule_after(5, "second");
        s.schedule_after(1, "early");
        let order: Vec<_> = drain(&mut s, 5).into_iter().map(|(_, p)| p).collect();
        assert_eq!(order, vec!["early", "first", "second"]);
    }

    #[test]
    fn test_cancel() {
        let mut s = Scheduler::new();
        let rep = s.schedule_repeating(10, "rep");
        let once = s.schedule_after(15, "once");
        assert_eq!(drain(&mut s, 10).len(), 1);

        assert!(s.cancel(rep));
        assert!(!s.cancel(rep));
        assert!(s.is_pending(once));
        assert!(s.cancel(once));
        assert_eq!(s.pending(), 0);
        assert!(drain(&mut s, 1000).is_empty());
    }

    #[test]
    fn test_cancel_during_dispatch_stops_repeat() {
        let mut s = Scheduler::new();
        let rep = s.schedule_repeating(10, "rep");
        let (handle, _) = s.pop_due(10).unwrap();
        assert_eq!(handle, rep);
        s.cancel(handle);
        assert!(s.pop_due(1000).is_none());
    }

    #[test]
    fn test_clock_advances_without_tasks() {
        let mut s: Scheduler<()> = Scheduler::new();
        s.advance_to(250);
        assert_eq!(s.now(), 250);
        s.advance_to(100);
        assert_eq!(s.now(), 250);
    }
}
