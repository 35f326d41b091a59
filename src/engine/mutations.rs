use tracing::debug;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError};

impl Engine {
    /// Create the first `count` seats. A repeated call adds capacity like
    /// [`Engine::add_seats`] instead of resetting.
    pub fn initialize(&mut self, count: u32) -> Result<SeatsAdded, EngineError> {
        let added = self.grow(count)?;
        debug!(count, total = self.total_seats, admitted = added.admissions.len(), "initialize");
        Ok(added)
    }

    /// Seat `user_id` on the lowest free seat, or queue it at `priority`.
    pub fn reserve(&mut self, user_id: UserId, priority: Priority) -> Result<ReserveOutcome, EngineError> {
        if let Some(&seat_id) = self.reserved.search(&user_id) {
            return Err(EngineError::AlreadyReserved { user_id, seat_id });
        }
        if self.waitlist.contains(user_id) {
            return Err(EngineError::AlreadyWaiting(user_id));
        }

        let outcome = match self.free.pop_min() {
            Some(seat_id) => {
                self.assign(user_id, seat_id);
                ReserveOutcome::Reserved(seat_id)
            }
            None => {
                let entry = self.waitlist.insert(priority, user_id);
                debug!(user_id, priority, sequence = entry.sequence, "waitlisted");
                ReserveOutcome::Waitlisted
            }
        };
        debug!(user_id, priority, ?outcome, "reserve");
        Ok(outcome)
    }

    /// Cancel `user_id`'s hold on `seat_id`. The seat passes straight to the
    /// head of the waitlist if anyone is waiting.
    pub fn cancel(&mut self, seat_id: SeatId, user_id: UserId) -> Result<Cancellation, EngineError> {
        match self.reserved.search(&user_id) {
            Some(&held) if held == seat_id => {}
            _ => return Err(EngineError::MismatchedCancel { seat_id, user_id }),
        }
        self.reserved.delete(&user_id);
        let admitted = self.admit_or_free(seat_id).map(|r| r.user_id);
        debug!(seat_id, user_id, ?admitted, "cancel");
        Ok(Cancellation {
            cancelled: Reservation::new(seat_id, user_id),
            admitted,
        })
    }

    /// Append `count` seats after the highest existing seat id. New seats go
    /// to waiters in seat order before any reach the free pool.
    pub fn add_seats(&mut self, count: u32) -> Result<SeatsAdded, EngineError> {
        let added = self.grow(count)?;
        debug!(count, total = self.total_seats, admitted = added.admissions.len(), "add_seats");
        Ok(added)
    }

    fn grow(&mut self, count: u32) -> Result<SeatsAdded, EngineError> {
        let total = self
            .total_seats
            .checked_add(count)
            .filter(|&t| t <= MAX_TOTAL_SEATS)
            .ok_or(EngineError::LimitExceeded("too many seats"))?;
        let first = self.total_seats + 1;
        self.total_seats = total;
        let admissions = (first..=total)
            .filter_map(|seat_id| self.admit_or_free(seat_id))
            .collect();
        Ok(SeatsAdded {
            first,
            count,
            admissions,
        })
    }

    /// Release every reservation and waitlist entry with a user id in
    /// `[low, high]`. Freed seats are handed out in ascending seat order, each
    /// to the current head of the waitlist. An inverted range releases nothing.
    pub fn release_range(&mut self, low: UserId, high: UserId) -> Released {
        let mut freed: Vec<Reservation> = self
            .reserved
            .remove_range(&low, &high)
            .into_iter()
            .map(|(user_id, seat_id)| Reservation::new(seat_id, user_id))
            .collect();
        freed.sort_by_key(|r| r.seat_id);

        let withdrawn = if low <= high {
            self.waitlist.remove_range(low, high)
        } else {
            0
        };

        let admissions = freed
            .iter()
            .filter_map(|r| self.admit_or_free(r.seat_id))
            .collect::<Vec<_>>();
        debug!(low, high, freed = freed.len(), withdrawn, admitted = admissions.len(), "release_range");
        Released {
            low,
            high,
            freed,
            withdrawn,
            admissions,
        }
    }

    /// Re-rank a waiting user, keeping its original arrival order for ties.
    pub fn update_priority(&mut self, user_id: UserId, priority: Priority) -> Result<(), EngineError> {
        let result = self.waitlist.update_priority(user_id, priority);
        debug!(user_id, priority, ok = result.is_ok(), "update_priority");
        result
    }

    pub fn exit_waitlist(&mut self, user_id: UserId) -> Result<(), EngineError> {
        let result = self.waitlist.remove(user_id).map(|_| ());
        debug!(user_id, ok = result.is_ok(), "exit_waitlist");
        result
    }
}
