use crate::model::*;

use super::Engine;

impl Engine {
    pub fn available(&self) -> Availability {
        Availability {
            free_seats: self.free.len(),
            waitlist_len: self.waitlist.len(),
        }
    }

    /// All current reservations, ascending by seat id.
    pub fn reservations(&self) -> Vec<Reservation> {
        let mut out: Vec<Reservation> = self
            .reserved
            .iter()
            .map(|(&user_id, &seat_id)| Reservation::new(seat_id, user_id))
            .collect();
        out.sort_unstable_by_key(|r| r.seat_id);
        out
    }

    /// Waiting users in the order they would be admitted.
    pub fn waiting(&self) -> Vec<WaitlistEntry> {
        let mut out: Vec<WaitlistEntry> = self.waitlist.iter().copied().collect();
        out.sort_unstable_by_key(|e| e.rank());
        out
    }

    pub fn seat_of(&self, user_id: UserId) -> Option<SeatId> {
        self.reserved.search(&user_id).copied()
    }

    pub fn is_waiting(&self, user_id: UserId) -> bool {
        self.waitlist.contains(user_id)
    }

    /// Highest seat id ever created.
    pub fn total_seats(&self) -> SeatId {
        self.total_seats
    }

    pub fn reserved_count(&self) -> usize {
        self.reserved.len()
    }

    pub fn waitlist_len(&self) -> usize {
        self.waitlist.len()
    }

    /// Seat the next immediate reservation would receive.
    pub fn next_free_seat(&self) -> Option<SeatId> {
        self.free.peek_min()
    }
}
