mod error;
pub mod index;
mod mutations;
pub mod pool;
mod queries;
#[cfg(test)]
mod tests;
pub mod waitlist;

pub use error::EngineError;
pub use index::{IndexError, OrderedIndex};
pub use pool::FreeSeatPool;
pub use waitlist::PriorityWaitlist;

use crate::model::*;

/// Seat admission engine: free seats, current reservations and the waitlist.
///
/// Every seat id in `1..=total_seats` lives in exactly one of `free` or
/// `reserved`; a user id is in at most one of `reserved` or `waitlist`.
/// Each public operation leaves both properties intact.
#[derive(Debug, Default)]
pub struct Engine {
    pub(super) free: FreeSeatPool,
    pub(super) reserved: OrderedIndex<UserId, SeatId>,
    pub(super) waitlist: PriorityWaitlist,
    /// Highest seat id ever created.
    pub(super) total_seats: SeatId,
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `seat_id` to the head of the waitlist, or return it to the free pool.
    pub(super) fn admit_or_free(&mut self, seat_id: SeatId) -> Option<Reservation> {
        match self.waitlist.extract_min() {
            Some(entry) => {
                self.assign(entry.user_id, seat_id);
                metrics::counter!(crate::observability::WAITLIST_ADMISSIONS_TOTAL).increment(1);
                tracing::debug!(user_id = entry.user_id, seat_id, priority = entry.priority, "admitted from waitlist");
                Some(Reservation::new(seat_id, entry.user_id))
            }
            None => {
                self.free.push(seat_id);
                None
            }
        }
    }

    pub(super) fn assign(&mut self, user_id: UserId, seat_id: SeatId) {
        self.reserved
            .insert(user_id, seat_id)
            .expect("user being seated holds no reservation");
    }

    /// Check seat conservation and requester disjointness across all three structures.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        use std::collections::HashSet;

        self.reserved.check_invariants()?;
        self.waitlist.check_invariants()?;

        let mut seen = HashSet::new();
        for seat in self.free.iter() {
            if !seen.insert(seat) {
                return Err(format!("seat {seat} twice in free pool"));
            }
        }
        for (user, &seat) in self.reserved.iter() {
            if !seen.insert(seat) {
                return Err(format!("seat {seat} (user {user}) held twice or also free"));
            }
            if self.waitlist.contains(*user) {
                return Err(format!("user {user} both seated and waiting"));
            }
        }
        let expected: HashSet<SeatId> = (1..=self.total_seats).collect();
        if seen != expected {
            return Err(format!("{} seats accounted for, {} created", seen.len(), self.total_seats));
        }
        if !self.free.is_empty() && !self.waitlist.is_empty() {
            return Err("free seats while users are waiting".into());
        }
        Ok(())
    }
}
