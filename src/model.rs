use serde::{Deserialize, Serialize};

/// Requester identity.
pub type UserId = i64;

/// Seat number, starting at 1.
pub type SeatId = u32;

/// Waitlist priority. Lower values are served first.
pub type Priority = i64;

/// Arrival stamp handed out to waitlist entries, never reused.
pub type Sequence = u64;

/// A seat held by a requester.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub seat_id: SeatId,
    pub user_id: UserId,
}

impl Reservation {
    pub fn new(seat_id: SeatId, user_id: UserId) -> Self {
        Self { seat_id, user_id }
    }
}

/// A requester waiting for a seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaitlistEntry {
    pub priority: Priority,
    pub sequence: Sequence,
    pub user_id: UserId,
}

impl WaitlistEntry {
    /// Heap ordering key. `user_id` never participates in ordering.
    pub fn rank(&self) -> (Priority, Sequence) {
        (self.priority, self.sequence)
    }

    pub fn precedes(&self, other: &WaitlistEntry) -> bool {
        self.rank() < other.rank()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Availability {
    pub free_seats: usize,
    pub waitlist_len: usize,
}

// ── Operation results ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveOutcome {
    Reserved(SeatId),
    Waitlisted,
}

/// A cancelled reservation, plus the waiter that inherited the seat (if any).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cancellation {
    pub cancelled: Reservation,
    pub admitted: Option<UserId>,
}

/// New seats `first..first + count`, and the admissions they produced in seat order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatsAdded {
    pub first: SeatId,
    pub count: u32,
    pub admissions: Vec<Reservation>,
}

/// Result of releasing every requester in `[low, high]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Released {
    pub low: UserId,
    pub high: UserId,
    /// Freed reservations, ascending by seat.
    pub freed: Vec<Reservation>,
    /// Waitlist entries dropped because their id fell in the range.
    pub withdrawn: usize,
    /// Freed seats handed to waiters, ascending by seat.
    pub admissions: Vec<Reservation>,
}

/// Structured result of one command, as recorded in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Initialized {
        count: u32,
        admissions: Vec<Reservation>,
    },
    Availability(Availability),
    Reserved(Reservation),
    Waitlisted {
        user_id: UserId,
    },
    Cancelled {
        cancelled: Reservation,
        admitted: Option<Reservation>,
    },
    CancelRejected {
        seat_id: SeatId,
        user_id: UserId,
    },
    SeatsAdded {
        count: u32,
        admissions: Vec<Reservation>,
    },
    Released {
        low: UserId,
        high: UserId,
        /// Reservations dropped by the release, ascending by seat.
        freed: Vec<Reservation>,
        admissions: Vec<Reservation>,
    },
    PriorityUpdated {
        user_id: UserId,
        priority: Priority,
    },
    PriorityNotUpdated {
        user_id: UserId,
    },
    LeftWaitlist {
        user_id: UserId,
    },
    NotInWaitlist {
        user_id: UserId,
    },
    AlreadyReserved(Reservation),
    AlreadyWaiting {
        user_id: UserId,
    },
    Reservations {
        reservations: Vec<Reservation>,
    },
    InvalidSeatCount {
        command: String,
    },
    InvalidInput {
        line: String,
        detail: String,
    },
    Terminated,
}

impl Outcome {
    /// Failures are recoverable, but counted separately in metrics.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            Outcome::CancelRejected { .. }
                | Outcome::PriorityNotUpdated { .. }
                | Outcome::NotInWaitlist { .. }
                | Outcome::AlreadyReserved(_)
                | Outcome::AlreadyWaiting { .. }
                | Outcome::InvalidSeatCount { .. }
                | Outcome::InvalidInput { .. }
        )
    }
}
