//! Timer system for Horizon Arbor.
//!
//! Provides one-shot timers driven by an explicit clock. The owner supplies
//! the current [`Instant`] when starting timers and when polling for expired
//! ones, which keeps firing order deterministic and testable.
//!
//! [`DebounceSlot`] builds on [`TimerManager`] to hold at most one pending
//! timer per category: arming the slot again cancels the superseded timer
//! first.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use slotmap::{SlotMap, new_key_type};

use crate::error::{Result, TimerError};

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    fire_time: Instant,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
    /// Insertion sequence, breaks ties so equal deadlines fire in start order.
    seq: u64,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time && self.seq == other.seq
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other
            .fire_time
            .cmp(&self.fire_time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Manages pending one-shot timers.
#[derive(Debug, Default)]
pub struct TimerManager {
    /// All pending timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
    next_seq: u64,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a one-shot timer that fires `duration` after `now`.
    ///
    /// Returns the timer ID that can be used to cancel the timer.
    pub fn start_one_shot(&mut self, now: Instant, duration: Duration) -> TimerId {
        let fire_time = now + duration;
        let id = self.timers.insert(TimerData { fire_time });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time,
            seq: self.next_seq,
        });
        self.next_seq += 1;
        tracing::trace!(target: "horizon_arbor_core::timer", ?id, ?duration, "timer started");
        id
    }

    /// Stop and remove a timer.
    ///
    /// Returns an error if the timer already fired or was stopped.
    pub fn stop(&mut self, id: TimerId) -> Result<()> {
        if self.timers.remove(id).is_some() {
            tracing::trace!(target: "horizon_arbor_core::timer", ?id, "timer stopped");
            Ok(())
        } else {
            Err(TimerError::InvalidTimerId.into())
        }
    }

    /// Check if a timer is still pending.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// Time left at `now` before `id` fires, or `None` if it is not pending.
    pub fn remaining(&self, id: TimerId, now: Instant) -> Option<Duration> {
        self.timers
            .get(id)
            .map(|timer| timer.fire_time.saturating_duration_since(now))
    }

    /// Get the duration from `now` until the next timer fires, if any.
    pub fn time_until_next(&mut self, now: Instant) -> Option<Duration> {
        self.discard_stale_heads();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(now))
    }

    /// Remove and return all timers due at `now`, earliest first.
    #[tracing::instrument(skip(self), target = "horizon_arbor_core::timer", level = "trace")]
    pub fn process_expired(&mut self, now: Instant) -> Vec<TimerId> {
        let mut fired = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            // Stopped timers leave their queue entry behind.
            if self.timers.remove(entry.id).is_some() {
                tracing::trace!(target: "horizon_arbor_core::timer", id = ?entry.id, "timer fired");
                fired.push(entry.id);
            }
        }

        fired
    }

    /// Get the number of pending timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Stop every pending timer.
    pub fn clear(&mut self) {
        self.timers.clear();
        self.queue.clear();
    }

    fn discard_stale_heads(&mut self) {
        while let Some(entry) = self.queue.peek() {
            if self.timers.contains_key(entry.id) {
                break;
            }
            self.queue.pop();
        }
    }
}

/// A single pending-timer slot for one debounce category.
///
/// The slot remembers which target the pending timer was armed for. Arming
/// again cancels the previous timer before starting the new one, so a slot
/// never has more than one live timer.
#[derive(Debug)]
pub struct DebounceSlot<T> {
    pending: Option<(TimerId, T)>,
}

impl<T> Default for DebounceSlot<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> DebounceSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the slot for `target`, superseding any pending timer.
    pub fn arm(&mut self, timers: &mut TimerManager, now: Instant, delay: Duration, target: T) {
        self.cancel(timers);
        let id = timers.start_one_shot(now, delay);
        self.pending = Some((id, target));
    }

    /// Cancel the pending timer, returning its target.
    pub fn cancel(&mut self, timers: &mut TimerManager) -> Option<T> {
        let (id, target) = self.pending.take()?;
        // The timer may already have been drained by `process_expired`.
        let _ = timers.stop(id);
        Some(target)
    }

    /// If `fired` is this slot's timer, clear the slot and return its target.
    pub fn take_if_fired(&mut self, fired: TimerId) -> Option<T> {
        match &self.pending {
            Some((id, _)) if *id == fired => self.pending.take().map(|(_, target)| target),
            _ => None,
        }
    }

    /// The target the pending timer was armed for.
    pub fn target(&self) -> Option<&T> {
        self.pending.as_ref().map(|(_, target)| target)
    }

    /// Whether a timer is pending.
    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Time left at `now` before the pending timer fires.
    pub fn remaining(&self, timers: &TimerManager, now: Instant) -> Option<Duration> {
        let (id, _) = self.pending.as_ref()?;
        timers.remaining(*id, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_shot_fires_once() {
        let mut timers = TimerManager::new();
        let start = Instant::now();
        let id = timers.start_one_shot(start, Duration::from_millis(100));

        let left = timers.remaining(id, start + Duration::from_millis(40));
        assert_eq!(left, Some(Duration::from_millis(60)));
        assert!(timers.process_expired(start + Duration::from_millis(99)).is_empty());
        assert_eq!(timers.process_expired(start + Duration::from_millis(100)), vec![id]);
        assert!(timers.process_expired(start + Duration::from_secs(5)).is_empty());
        assert!(!timers.is_active(id));
        assert_eq!(timers.remaining(id, start), None);
    }

    #[test]
    fn test_stop_prevents_fire() {
        let mut timers = TimerManager::new();
        let start = Instant::now();
        let id = timers.start_one_shot(start, Duration::from_millis(10));

        assert!(timers.stop(id).is_ok());
        assert!(timers.stop(id).is_err());
        assert!(timers.process_expired(start + Duration::from_secs(1)).is_empty());
        assert_eq!(timers.active_count(), 0);
    }

    #[test]
    fn test_fire_order_by_deadline_then_start_order() {
        let mut timers = TimerManager::new();
        let start = Instant::now();
        let late = timers.start_one_shot(start, Duration::from_millis(300));
        let early = timers.start_one_shot(start, Duration::from_millis(100));
        let tie = timers.start_one_shot(start, Duration::from_millis(100));

        let fired = timers.process_expired(start + Duration::from_secs(1));
        assert_eq!(fired, vec![early, tie, late]);
    }

    #[test]
    fn test_time_until_next_skips_stopped() {
        let mut timers = TimerManager::new();
        let start = Instant::now();
        let first = timers.start_one_shot(start, Duration::from_millis(50));
        timers.start_one_shot(start, Duration::from_millis(200));
        timers.stop(first).unwrap();

        assert_eq!(timers.time_until_next(start), Some(Duration::from_millis(200)));
        timers.clear();
        assert_eq!(timers.time_until_next(start), None);
    }

    #[test]
    fn test_debounce_slot_supersedes() {
        let mut timers = TimerManager::new();
        let mut slot = DebounceSlot::new();
        let start = Instant::now();

        let delay = Duration::from_millis(1000);
        slot.arm(&mut timers, start, delay, "n1");
        slot.arm(&mut timers, start + Duration::from_millis(100), delay, "n2");
        slot.arm(&mut timers, start + Duration::from_millis(200), delay, "n3");
        assert_eq!(timers.active_count(), 1);
        assert_eq!(slot.target(), Some(&"n3"));
        assert_eq!(
            slot.remaining(&timers, start + Duration::from_millis(700)),
            Some(Duration::from_millis(500))
        );

        let fired = timers.process_expired(start + Duration::from_secs(5));
        assert_eq!(fired.len(), 1);
        assert_eq!(slot.take_if_fired(fired[0]), Some("n3"));
        assert!(!slot.is_armed());
    }

    #[test]
    fn test_debounce_slot_cancel() {
        let mut timers = TimerManager::new();
        let mut slot = DebounceSlot::new();
        let start = Instant::now();

        slot.arm(&mut timers, start, Duration::from_millis(10), 7);
        assert_eq!(slot.cancel(&mut timers), Some(7));
        assert_eq!(slot.cancel(&mut timers), None);
        assert_eq!(slot.remaining(&timers, start), None);
        assert!(timers.process_expired(start + Duration::from_secs(1)).is_empty());
    }
}
