use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::model::SeatId;

/// Unassigned seats. The lowest-numbered seat is always handed out first.
#[derive(Debug, Clone, Default)]
pub struct FreeSeatPool {
    seats: BinaryHeap<Reverse<SeatId>>,
}

impl FreeSeatPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.seats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    pub fn push(&mut self, seat: SeatId) {
        self.seats.push(Reverse(seat));
    }

    pub fn peek_min(&self) -> Option<SeatId> {
        self.seats.peek().map(|Reverse(s)| *s)
    }

    pub fn pop_min(&mut self) -> Option<SeatId> {
        self.seats.pop().map(|Reverse(s)| s)
    }

    pub fn iter(&self) -> impl Iterator<Item = SeatId> + '_ {
        self.seats.iter().map(|Reverse(s)| *s)
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, seat: SeatId) -> bool {
        self.iter().any(|s| s == seat)
    }
}

impl Extend<SeatId> for FreeSeatPool {
    fn extend<I: IntoIterator<Item = SeatId>>(&mut self, iter: I) {
        self.seats.extend(iter.into_iter().map(Reverse));
    }
}
