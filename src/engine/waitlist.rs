use std::collections::HashMap;

use crate::model::*;

use super::EngineError;

/// Binary min-heap over `(priority, sequence)` with a `user_id → slot` map,
/// so arbitrary members can be re-ranked or removed in O(log n).
#[derive(Debug, Clone, Default)]
pub struct PriorityWaitlist {
    heap: Vec<WaitlistEntry>,
    slots: HashMap<UserId, usize>,
    next_sequence: Sequence,
}

impl PriorityWaitlist {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.slots.contains_key(&user_id)
    }

    /// Sequence the next inserted entry will receive.
    pub fn next_sequence(&self) -> Sequence {
        self.next_sequence
    }

    pub fn peek(&self) -> Option<&WaitlistEntry> {
        self.heap.first()
    }

    pub fn get(&self, user_id: UserId) -> Option<&WaitlistEntry> {
        self.slots.get(&user_id).map(|&i| &self.heap[i])
    }

    /// Entries in heap-array order (not sorted).
    pub fn iter(&self) -> impl Iterator<Item = &WaitlistEntry> {
        self.heap.iter()
    }

    /// Enqueue `user_id`, stamping it with the next arrival sequence.
    /// Callers must not enqueue a user that is already waiting.
    pub fn insert(&mut self, priority: Priority, user_id: UserId) -> WaitlistEntry {
        debug_assert!(!self.contains(user_id), "user {user_id} already waiting");
        let entry = WaitlistEntry {
            priority,
            sequence: self.next_sequence,
            user_id,
        };
        self.next_sequence += 1;

        let idx = self.heap.len();
        self.heap.push(entry);
        self.slots.insert(user_id, idx);
        self.sift_up(idx);
        entry
    }

    pub fn extract_min(&mut self) -> Option<WaitlistEntry> {
        if self.heap.is_empty() {
            return None;
        }
        Some(self.take(0))
    }

    /// Re-rank a waiting user. The arrival sequence is kept.
    pub fn update_priority(&mut self, user_id: UserId, priority: Priority) -> Result<(), EngineError> {
        let idx = *self
            .slots
            .get(&user_id)
            .ok_or(EngineError::NotWaiting(user_id))?;
        let old = self.heap[idx].priority;
        self.heap[idx].priority = priority;
        if priority < old {
            self.sift_up(idx);
        } else if priority > old {
            self.sift_down(idx);
        }
        Ok(())
    }

    pub fn remove(&mut self, user_id: UserId) -> Result<WaitlistEntry, EngineError> {
        let idx = *self
            .slots
            .get(&user_id)
            .ok_or(EngineError::NotWaiting(user_id))?;
        Ok(self.take(idx))
    }

    /// Drop every entry whose user id is in `[low, high]`. Rebuilds the heap
    /// bottom-up in O(n). Returns how many entries were dropped.
    pub fn remove_range(&mut self, low: UserId, high: UserId) -> usize {
        let before = self.heap.len();
        self.heap.retain(|e| !(low..=high).contains(&e.user_id));
        let removed = before - self.heap.len();
        if removed == 0 {
            return 0;
        }

        self.slots.clear();
        self.slots
            .extend(self.heap.iter().enumerate().map(|(i, e)| (e.user_id, i)));
        for i in (0..self.heap.len() / 2).rev() {
            self.sift_down(i);
        }
        removed
    }

    // ── Heap mechanics ───────────────────────────────────────

    /// Remove the entry at `idx`: swap in the last element and re-sift it.
    fn take(&mut self, idx: usize) -> WaitlistEntry {
        let last = self.heap.len() - 1;
        self.swap(idx, last);
        let entry = self.heap.pop().expect("heap is non-empty");
        self.slots.remove(&entry.user_id);
        if idx < self.heap.len() {
            let settled = self.sift_up(idx);
            if settled == idx {
                self.sift_down(idx);
            }
        }
        entry
    }

    fn swap(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        self.heap.swap(a, b);
        self.slots.insert(self.heap[a].user_id, a);
        self.slots.insert(self.heap[b].user_id, b);
    }

    /// Returns the slot the entry settled in.
    fn sift_up(&mut self, mut idx: usize) -> usize {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !self.heap[idx].precedes(&self.heap[parent]) {
                break;
            }
            self.swap(idx, parent);
            idx = parent;
        }
        idx
    }

    fn sift_down(&mut self, mut idx: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut smallest = idx;
            if left < len && self.heap[left].precedes(&self.heap[smallest]) {
                smallest = left;
            }
            if right < len && self.heap[right].precedes(&self.heap[smallest]) {
                smallest = right;
            }
            if smallest == idx {
                break;
            }
            self.swap(idx, smallest);
            idx = smallest;
        }
    }

    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        if self.slots.len() != self.heap.len() {
            return Err(format!("{} slots for {} entries", self.slots.len(), self.heap.len()));
        }
        for (i, e) in self.heap.iter().enumerate() {
            if self.slots.get(&e.user_id) != Some(&i) {
                return Err(format!("slot map stale for user {}", e.user_id));
            }
            if i > 0 && e.precedes(&self.heap[(i - 1) / 2]) {
                return Err(format!("heap order broken at slot {i}"));
            }
            if e.sequence >= self.next_sequence {
                return Err(format!("sequence {} not yet issued", e.sequence));
            }
        }
        Ok(())
    }
}
