//! Timer abstraction for the two periodic producers (spawner, clock) and the
//! one-shot target expiries.
//!
//! The session never talks to `setInterval` directly: it asks a [`Scheduler`]
//! for repeating or one-shot [`Task`]s and keeps the returned handles in
//! [`TimerSlot`]s. The browser binding implements the trait on top of the
//! window timers; [`ManualScheduler`] runs the same tasks on a virtual clock.

use std::collections::BTreeMap;

use crate::target::TargetId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskKind {
    Spawn,
    Clock,
    Expire(TargetId),
}

/// A scheduled callback. `generation` ties it to one `start()` so a task that
/// outlives its session is recognisably stale.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Task {
    pub kind: TaskKind,
    pub generation: u64,
}

pub trait Scheduler {
    type Handle;

    /// Fire `task` every `period_ms` until cancelled.
    fn every(&mut self, period_ms: u32, task: Task) -> Self::Handle;
    /// Fire `task` once after `delay_ms`.
    fn after(&mut self, delay_ms: u32, task: Task);
    fn cancel(&mut self, handle: Self::Handle);
}

/// Holder for a repeating timer handle. `Idle` is the explicit "not running"
/// sentinel; disarming always leaves the slot `Idle`.
#[derive(Debug)]
pub enum TimerSlot<H> {
    Idle,
    Armed(H),
}

impl<H> TimerSlot<H> {
    pub fn is_armed(&self) -> bool {
        matches!(self, TimerSlot::Armed(_))
    }

    pub fn arm<S: Scheduler<Handle = H>>(&mut self, sched: &mut S, period_ms: u32, task: Task) {
        self.disarm(sched);
        *self = TimerSlot::Armed(sched.every(period_ms, task));
    }

    /// Cancel the timer if armed. Safe to call any number of times.
    pub fn disarm<S: Scheduler<Handle = H>>(&mut self, sched: &mut S) {
        if let TimerSlot::Armed(h) = std::mem::replace(self, TimerSlot::Idle) {
            sched.cancel(h);
        }
    }
}

struct Entry {
    task: Task,
    due_ms: u64,
    period_ms: Option<u64>,
}

/// Deterministic scheduler driven by an explicit virtual clock.
///
/// Tasks are released one at a time in (due time, issue order), so a task
/// that cancels another prevents it from firing even when both are due at
/// the same instant.
#[derive(Default)]
pub struct ManualScheduler {
    now_ms: u64,
    next_id: u64,
    entries: BTreeMap<u64, Entry>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Number of live repeating timers.
    pub fn repeating(&self) -> usize {
        self.entries.values().filter(|e| e.period_ms.is_some()).count()
    }

    /// Number of live timers of any kind.
    pub fn pending(&self) -> usize {
        self.entries.len()
    }

    /// Release the next task due at or before `until_ms`, moving the virtual
    /// clock to its due time. Returns `None` when nothing more is due.
    pub fn next_due(&mut self, until_ms: u64) -> Option<Task> {
        let (&id, _) = self
            .entries
            .iter()
            .filter(|(_, e)| e.due_ms <= until_ms)
            .min_by_key(|(id, e)| (e.due_ms, **id))?;
        let entry = self.entries.get_mut(&id)?;
        self.now_ms = self.now_ms.max(entry.due_ms);
        let task = entry.task;
        let period = entry.period_ms;
        if let Some(p) = period {
            entry.due_ms += p;
        } else {
            self.entries.remove(&id);
        }
        Some(task)
    }

    /// Move the clock forward without releasing anything.
    pub fn park(&mut self, until_ms: u64) {
        self.now_ms = self.now_ms.max(until_ms);
    }

    fn insert(&mut self, delay_ms: u64, period_ms: Option<u64>, task: Task) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.insert(
            id,
            Entry {
                task,
                due_ms: self.now_ms + delay_ms,
                period_ms,
            },
        );
        id
    }
}

impl Scheduler for ManualScheduler {
    type Handle = u64;

    fn every(&mut self, period_ms: u32, task: Task) -> u64 {
        let p = u64::from(period_ms.max(1));
        self.insert(p, Some(p), task)
    }

    fn after(&mut self, delay_ms: u32, task: Task) {
        self.insert(u64::from(delay_ms), None, task);
    }

    fn cancel(&mut self, handle: u64) {
        self.entries.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(kind: TaskKind) -> Task {
        Task { kind, generation: 1 }
    }

    #[test]
    fn releases_in_due_then_issue_order() {
        let mut s = ManualScheduler::new();
        s.every(1000, task(TaskKind::Clock));
        s.every(500, task(TaskKind::Spawn));
        let mut fired = Vec::new();
        while let Some(t) = s.next_due(2000) {
            fired.push((s.now_ms(), t.kind));
        }
        assert_eq!(
            fired,
            vec![
                (500, TaskKind::Spawn),
                (1000, TaskKind::Clock),
                (1000, TaskKind::Spawn),
                (1500, TaskKind::Spawn),
                (2000, TaskKind::Clock),
                (2000, TaskKind::Spawn),
            ]
        );
    }

    #[test]
    fn one_shots_fire_once() {
        let mut s = ManualScheduler::new();
        s.after(300, task(TaskKind::Expire(TargetId(4))));
        assert_eq!(s.next_due(299), None);
        assert_eq!(s.next_due(300).map(|t| t.kind), Some(TaskKind::Expire(TargetId(4))));
        assert_eq!(s.next_due(10_000), None);
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn disarm_is_idempotent() {
        let mut s = ManualScheduler::new();
        let mut slot = TimerSlot::Idle;
        slot.arm(&mut s, 100, task(TaskKind::Spawn));
        assert!(slot.is_armed());
        assert_eq!(s.repeating(), 1);
        slot.disarm(&mut s);
        slot.disarm(&mut s);
        assert!(!slot.is_armed());
        assert_eq!(s.repeating(), 0);
        assert_eq!(s.next_due(1_000), None);
    }

    #[test]
    fn rearming_replaces_previous_timer() {
        let mut s = ManualScheduler::new();
        let mut slot = TimerSlot::Idle;
        slot.arm(&mut s, 100, task(TaskKind::Spawn));
        slot.arm(&mut s, 100, task(TaskKind::Spawn));
        assert_eq!(s.repeating(), 1);
    }
}
