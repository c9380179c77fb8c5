//! Event log.
//!
//! The world appends an [`Event`] for every observable state change driven
//! by the simulation: productions, stalls, placements, upgrades, sales, and
//! starvation. Events land in a fixed-capacity ring buffer; when it fills,
//! the oldest entries are dropped and `dropped_count` keeps track of how
//! many. Consumers poll the log between advances, there is no subscription
//! mechanism.

use crate::fixed::{Fixed64, Millis};
use crate::id::{NodeId, RecipeId, ResourceId};
use crate::node::StallReason;

/// An observable state change, stamped with the simulation time `at` which
/// it happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    ResourceProduced {
        node: NodeId,
        resource: ResourceId,
        amount: Fixed64,
        at: Millis,
    },
    /// A node entered a stalled state. Emitted on the transition, not on
    /// every stalled tick.
    NodeStalled {
        node: NodeId,
        reason: StallReason,
        at: Millis,
    },
    NodePlaced {
        node: NodeId,
        recipe: RecipeId,
        at: Millis,
    },
    NodeUpgraded {
        node: NodeId,
        level: u32,
        at: Millis,
    },
    ResourceSold {
        resource: ResourceId,
        amount: Fixed64,
        coins: Fixed64,
        at: Millis,
    },
    Starvation {
        lost: Fixed64,
        at: Millis,
    },
}

/// Discriminant-only view of [`Event`] for filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ResourceProduced,
    NodeStalled,
    NodePlaced,
    NodeUpgraded,
    ResourceSold,
    Starvation,
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::ResourceProduced { .. } => EventKind::ResourceProduced,
            Event::NodeStalled { .. } => EventKind::NodeStalled,
            Event::NodePlaced { .. } => EventKind::NodePlaced,
            Event::NodeUpgraded { .. } => EventKind::NodeUpgraded,
            Event::ResourceSold { .. } => EventKind::ResourceSold,
            Event::Starvation { .. } => EventKind::Starvation,
        }
    }

    pub fn at(&self) -> Millis {
        match self {
            Event::ResourceProduced { at, .. }
            | Event::NodeStalled { at, .. }
            | Event::NodePlaced { at, .. }
            | Event::NodeUpgraded { at, .. }
            | Event::ResourceSold { at, .. }
            | Event::Starvation { at, .. } => *at,
        }
    }
}

// ---------------------------------------------------------------------------
// Ring buffer
// ---------------------------------------------------------------------------

/// Fixed-capacity ring buffer of events. Oldest entries are overwritten
/// when full.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: Vec<Option<Event>>,
    /// Index of the oldest entry.
    head: usize,
    len: usize,
    total_written: u64,
}

impl EventLog {
    /// Create a log holding at most `capacity` events. Capacity is clamped
    /// to at least 1.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: vec![None; capacity],
            head: 0,
            len: 0,
            total_written: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.events.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Total events ever pushed, including dropped ones.
    pub fn total_written(&self) -> u64 {
        self.total_written
    }

    /// Events no longer in the log, whether overwritten or cleared.
    pub fn dropped_count(&self) -> u64 {
        self.total_written - self.len as u64
    }

    pub fn push(&mut self, event: Event) {
        let capacity = self.events.len();
        if self.len == capacity {
            // Full: overwrite the oldest slot and advance the head.
            self.events[self.head] = Some(event);
            self.head = (self.head + 1) % capacity;
        } else {
            let idx = (self.head + self.len) % capacity;
            self.events[idx] = Some(event);
            self.len += 1;
        }
        self.total_written += 1;
    }

    /// Iterate oldest to newest.
    pub fn iter(&self) -> EventLogIter<'_> {
        EventLogIter {
            log: self,
            offset: 0,
        }
    }

    /// Iterate only events of one kind, oldest to newest.
    pub fn of_kind(&self, kind: EventKind) -> impl Iterator<Item = &Event> {
        self.iter().filter(move |event| event.kind() == kind)
    }

    pub fn clear(&mut self) {
        self.events.fill(None);
        self.head = 0;
        self.len = 0;
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Iterator over an [`EventLog`], oldest first.
pub struct EventLogIter<'a> {
    log: &'a EventLog,
    offset: usize,
}

impl<'a> Iterator for EventLogIter<'a> {
    type Item = &'a Event;

    fn next(&mut self) -> Option<Self::Item> {
        if self.offset >= self.log.len {
            return None;
        }
        let idx = (self.log.head + self.offset) % self.log.events.len();
        self.offset += 1;
        self.log.events[idx].as_ref()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.log.len - self.offset;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for EventLogIter<'_> {}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::qty;

    fn produced(at: Millis) -> Event {
        Event::ResourceProduced {
            node: NodeId::default(),
            resource: ResourceId(0),
            amount: qty(1),
            at,
        }
    }

    // Test 1: Push and iterate in order
    // ---------------------------------

    #[test]
    fn push_and_iterate_in_order() {
        let mut log = EventLog::new(8);
        for at in 0..5 {
            log.push(produced(at));
        }

        assert_eq!(log.len(), 5);
        let times: Vec<Millis> = log.iter().map(Event::at).collect();
        assert_eq!(times, vec![0, 1, 2, 3, 4]);
    }

    // Test 2: Ring wraps and drops oldest
    // -----------------------------------

    #[test]
    fn ring_wraps_and_drops_oldest() {
        let mut log = EventLog::new(3);
        for at in 0..5 {
            log.push(produced(at));
        }

        assert_eq!(log.len(), 3);
        assert_eq!(log.total_written(), 5);
        assert_eq!(log.dropped_count(), 2);

        let times: Vec<Millis> = log.iter().map(Event::at).collect();
        assert_eq!(times, vec![2, 3, 4]);
    }

    // Test 3: Capacity is clamped to at least one
    // -------------------------------------------

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut log = EventLog::new(0);
        assert_eq!(log.capacity(), 1);

        log.push(produced(1));
        log.push(produced(2));
        assert_eq!(log.len(), 1);
        assert_eq!(log.iter().next().map(Event::at), Some(2));
    }

    // Test 4: Kind filtering
    // ----------------------

    #[test]
    fn of_kind_filters_events() {
        let mut log = EventLog::new(8);
        log.push(produced(1));
        log.push(Event::Starvation { lost: qty(2), at: 2 });
        log.push(produced(3));

        let starvations: Vec<_> = log.of_kind(EventKind::Starvation).collect();
        assert_eq!(starvations.len(), 1);
        assert_eq!(starvations[0].at(), 2);

        let productions: Vec<_> = log.of_kind(EventKind::ResourceProduced).collect();
        assert_eq!(productions.len(), 2);
    }

    // Test 5: Clear keeps capacity but forgets contents
    // -------------------------------------------------

    #[test]
    fn clear_resets_contents() {
        let mut log = EventLog::new(4);
        for at in 0..3 {
            log.push(produced(at));
        }
        log.clear();

        assert!(log.is_empty());
        assert_eq!(log.capacity(), 4);
        assert_eq!(log.iter().count(), 0);

        // The log keeps accepting events after a clear.
        log.push(produced(9));
        assert_eq!(log.len(), 1);
    }

    // Test 6: Iterator reports exact length
    // -------------------------------------

    #[test]
    fn iterator_is_exact_size() {
        let mut log = EventLog::new(4);
        for at in 0..6 {
            log.push(produced(at));
        }

        let mut iter = log.iter();
        assert_eq!(iter.len(), 4);
        iter.next();
        assert_eq!(iter.len(), 3);
    }
}
