use crate::model::{SeatId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// UpdatePriority / ExitWaitlist target is not on the waitlist.
    NotWaiting(UserId),
    /// The (seat, user) pair is not a live reservation.
    MismatchedCancel { seat_id: SeatId, user_id: UserId },
    AlreadyReserved { user_id: UserId, seat_id: SeatId },
    AlreadyWaiting(UserId),
    LimitExceeded(&'static str),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::NotWaiting(id) => write!(f, "user {id} is not on the waitlist"),
            EngineError::MismatchedCancel { seat_id, user_id } => {
                write!(f, "user {user_id} has no reservation for seat {seat_id}")
            }
            EngineError::AlreadyReserved { user_id, seat_id } => {
                write!(f, "user {user_id} already holds seat {seat_id}")
            }
            EngineError::AlreadyWaiting(id) => write!(f, "user {id} is already waiting"),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {}
