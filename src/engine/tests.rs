use proptest::prelude::*;

use super::*;

fn engine_with(seats: u32) -> Engine {
    let mut engine = Engine::new();
    engine.initialize(seats).unwrap();
    engine
}

fn avail(engine: &Engine) -> (usize, usize) {
    let a = engine.available();
    (a.free_seats, a.waitlist_len)
}

// ── Scenarios ────────────────────────────────────────────

#[test]
fn fill_then_waitlist() {
    let mut engine = engine_with(2);
    assert_eq!(engine.reserve(1, 1), Ok(ReserveOutcome::Reserved(1)));
    assert_eq!(engine.reserve(2, 1), Ok(ReserveOutcome::Reserved(2)));
    assert_eq!(engine.reserve(3, 5), Ok(ReserveOutcome::Waitlisted));
    assert_eq!(avail(&engine), (0, 1));
    assert_eq!(
        engine.reservations(),
        vec![Reservation::new(1, 1), Reservation::new(2, 2)]
    );
    engine.check_invariants().unwrap();
}

#[test]
fn cancel_hands_seat_to_waiter() {
    let mut engine = engine_with(2);
    engine.reserve(1, 1).unwrap();
    engine.reserve(2, 1).unwrap();
    engine.reserve(3, 5).unwrap();

    let c = engine.cancel(1, 1).unwrap();
    assert_eq!(c.cancelled, Reservation::new(1, 1));
    assert_eq!(c.admitted, Some(3));
    assert_eq!(engine.seat_of(3), Some(1));
    assert_eq!(engine.seat_of(1), None);
    assert_eq!(avail(&engine), (0, 0));
    engine.check_invariants().unwrap();
}

#[test]
fn add_seats_admits_waiter_directly() {
    let mut engine = engine_with(1);
    engine.reserve(1, 1).unwrap();
    engine.reserve(2, 1).unwrap();

    let added = engine.add_seats(1).unwrap();
    assert_eq!(added.first, 2);
    assert_eq!(added.admissions, vec![Reservation::new(2, 2)]);
    assert_eq!(avail(&engine), (0, 0));
    assert_eq!(engine.next_free_seat(), None);
    engine.check_invariants().unwrap();
}

#[test]
fn update_priority_changes_next_admission() {
    let mut engine = engine_with(0);
    engine.reserve(10, 2).unwrap();
    engine.reserve(20, 1).unwrap();
    engine.update_priority(10, 0).unwrap();

    let added = engine.add_seats(1).unwrap();
    assert_eq!(added.admissions, vec![Reservation::new(1, 10)]);
    assert!(engine.is_waiting(20));
}

#[test]
fn release_range_reassigns_in_seat_order() {
    let mut engine = engine_with(5);
    // Users 3,4,9 take seats 1,2,3; user 2 takes 4; user 1 takes 5.
    for user in [3, 4, 9, 2, 1] {
        engine.reserve(user, 1).unwrap();
    }
    engine.reserve(50, 3).unwrap();
    engine.reserve(60, 1).unwrap();
    engine.reserve(70, 2).unwrap();

    let released = engine.release_range(1, 2);
    assert_eq!(
        released.freed,
        vec![Reservation::new(4, 2), Reservation::new(5, 1)]
    );
    // Seat 4 goes to the best waiter (60), seat 5 to the next (70).
    assert_eq!(
        released.admissions,
        vec![Reservation::new(4, 60), Reservation::new(5, 70)]
    );
    assert!(engine.is_waiting(50));
    assert_eq!(avail(&engine), (0, 1));
    engine.check_invariants().unwrap();
}

#[test]
fn release_range_out_of_enumeration_order() {
    // User 1 holds seat 5 and user 2 holds seat 3: seats are handed out 3 then 5.
    let mut engine = engine_with(5);
    for user in [10, 11, 2, 12, 1] {
        engine.reserve(user, 0).unwrap();
    }
    assert_eq!(engine.seat_of(1), Some(5));
    assert_eq!(engine.seat_of(2), Some(3));
    engine.reserve(100, 1).unwrap();
    engine.reserve(200, 1).unwrap();

    let released = engine.release_range(1, 2);
    assert_eq!(
        released.admissions,
        vec![Reservation::new(3, 100), Reservation::new(5, 200)]
    );
}

// ── Reserve ──────────────────────────────────────────────

#[test]
fn reserve_takes_lowest_free_seat() {
    let mut engine = engine_with(3);
    engine.reserve(1, 0).unwrap();
    engine.reserve(2, 0).unwrap();
    engine.reserve(3, 0).unwrap();
    engine.cancel(2, 2).unwrap();
    engine.cancel(1, 1).unwrap();
    assert_eq!(engine.next_free_seat(), Some(1));
    assert_eq!(engine.reserve(4, 0), Ok(ReserveOutcome::Reserved(1)));
    assert_eq!(engine.reserve(5, 0), Ok(ReserveOutcome::Reserved(2)));
}

#[test]
fn reserve_twice_rejected() {
    let mut engine = engine_with(2);
    engine.reserve(1, 0).unwrap();
    assert_eq!(
        engine.reserve(1, 0),
        Err(EngineError::AlreadyReserved { user_id: 1, seat_id: 1 })
    );
    // Nothing changed
    assert_eq!(avail(&engine), (1, 0));
}

#[test]
fn reserve_while_waiting_rejected() {
    let mut engine = engine_with(0);
    engine.reserve(1, 4).unwrap();
    assert_eq!(engine.reserve(1, 0), Err(EngineError::AlreadyWaiting(1)));
    assert_eq!(engine.waiting()[0].priority, 4);
}

#[test]
fn reserve_before_initialize_waitlists() {
    let mut engine = Engine::new();
    assert_eq!(engine.reserve(7, 1), Ok(ReserveOutcome::Waitlisted));
    let added = engine.initialize(2).unwrap();
    assert_eq!(added.admissions, vec![Reservation::new(1, 7)]);
    assert_eq!(avail(&engine), (1, 0));
    engine.check_invariants().unwrap();
}

// ── Cancel ───────────────────────────────────────────────

#[test]
fn cancel_wrong_seat_rejected() {
    let mut engine = engine_with(2);
    engine.reserve(1, 0).unwrap();
    assert_eq!(
        engine.cancel(2, 1),
        Err(EngineError::MismatchedCancel { seat_id: 2, user_id: 1 })
    );
    assert_eq!(engine.seat_of(1), Some(1));
}

#[test]
fn cancel_without_reservation_rejected() {
    let mut engine = engine_with(2);
    assert_eq!(
        engine.cancel(1, 9),
        Err(EngineError::MismatchedCancel { seat_id: 1, user_id: 9 })
    );
}

#[test]
fn cancel_without_waiters_frees_seat() {
    let mut engine = engine_with(2);
    engine.reserve(1, 0).unwrap();
    let c = engine.cancel(1, 1).unwrap();
    assert_eq!(c.admitted, None);
    assert_eq!(avail(&engine), (2, 0));
    engine.check_invariants().unwrap();
}

// ── Capacity ─────────────────────────────────────────────

#[test]
fn initialize_twice_is_additive() {
    let mut engine = engine_with(3);
    let added = engine.initialize(2).unwrap();
    assert_eq!(added.first, 4);
    assert_eq!(engine.total_seats(), 5);
    assert_eq!(avail(&engine), (5, 0));
}

#[test]
fn add_seats_numbering_continues_after_reassignments() {
    let mut engine = engine_with(2);
    engine.reserve(1, 0).unwrap();
    engine.cancel(1, 1).unwrap();
    let added = engine.add_seats(3).unwrap();
    assert_eq!(added.first, 3);
    assert_eq!(engine.total_seats(), 5);
    assert_eq!(avail(&engine), (5, 0));
}

#[test]
fn add_seats_partially_drains_waitlist() {
    let mut engine = engine_with(0);
    engine.reserve(1, 2).unwrap();
    engine.reserve(2, 1).unwrap();
    let added = engine.add_seats(4).unwrap();
    assert_eq!(
        added.admissions,
        vec![Reservation::new(1, 2), Reservation::new(2, 1)]
    );
    assert_eq!(avail(&engine), (2, 0));
    assert_eq!(engine.next_free_seat(), Some(3));
    engine.check_invariants().unwrap();
}

#[test]
fn add_zero_seats_is_noop() {
    let mut engine = engine_with(2);
    let added = engine.add_seats(0).unwrap();
    assert_eq!(added.count, 0);
    assert!(added.admissions.is_empty());
    assert_eq!(engine.total_seats(), 2);
}

#[test]
fn add_seats_over_limit_rejected() {
    let mut engine = engine_with(10);
    let result = engine.add_seats(crate::limits::MAX_TOTAL_SEATS);
    assert!(matches!(result, Err(EngineError::LimitExceeded(_))));
    assert_eq!(engine.total_seats(), 10);
    assert_eq!(avail(&engine), (10, 0));
}

// ── Waitlist operations ──────────────────────────────────

#[test]
fn update_priority_for_seated_user_is_not_waiting() {
    let mut engine = engine_with(1);
    engine.reserve(1, 0).unwrap();
    assert_eq!(engine.update_priority(1, 0), Err(EngineError::NotWaiting(1)));
    assert_eq!(engine.exit_waitlist(1), Err(EngineError::NotWaiting(1)));
    assert_eq!(engine.seat_of(1), Some(1));
}

#[test]
fn exit_waitlist_removes_only_that_user() {
    let mut engine = engine_with(0);
    engine.reserve(1, 1).unwrap();
    engine.reserve(2, 1).unwrap();
    engine.reserve(3, 1).unwrap();
    engine.exit_waitlist(2).unwrap();
    let order: Vec<UserId> = engine.waiting().iter().map(|e| e.user_id).collect();
    assert_eq!(order, vec![1, 3]);
    assert_eq!(engine.exit_waitlist(2), Err(EngineError::NotWaiting(2)));
}

#[test]
fn release_range_drops_waiters_without_seats() {
    let mut engine = engine_with(1);
    engine.reserve(100, 0).unwrap();
    engine.reserve(5, 0).unwrap();
    engine.reserve(6, 0).unwrap();
    engine.reserve(200, 9).unwrap();

    let released = engine.release_range(1, 10);
    assert!(released.freed.is_empty());
    assert_eq!(released.withdrawn, 2);
    assert!(released.admissions.is_empty());
    assert_eq!(engine.waitlist_len(), 1);
    assert!(engine.is_waiting(200));
}

#[test]
fn release_range_withdraws_before_reassigning() {
    // A waiter inside the range must not receive a seat freed by the same release.
    let mut engine = engine_with(1);
    engine.reserve(1, 0).unwrap();
    engine.reserve(2, 0).unwrap();
    engine.reserve(50, 9).unwrap();

    let released = engine.release_range(1, 2);
    assert_eq!(released.admissions, vec![Reservation::new(1, 50)]);
    assert_eq!(released.withdrawn, 1);
    engine.check_invariants().unwrap();
}

#[test]
fn release_range_surplus_seats_return_to_pool() {
    let mut engine = engine_with(3);
    for user in 1..=3 {
        engine.reserve(user, 0).unwrap();
    }
    engine.reserve(10, 0).unwrap();
    let released = engine.release_range(1, 3);
    assert_eq!(released.admissions, vec![Reservation::new(1, 10)]);
    assert_eq!(avail(&engine), (2, 0));
    assert_eq!(engine.next_free_seat(), Some(2));
    engine.check_invariants().unwrap();
}

#[test]
fn release_inverted_range_is_empty() {
    let mut engine = engine_with(2);
    engine.reserve(1, 0).unwrap();
    let released = engine.release_range(5, 1);
    assert!(released.freed.is_empty());
    assert_eq!(engine.reserved_count(), 1);
}

#[test]
fn reservations_sorted_by_seat() {
    let mut engine = engine_with(3);
    engine.reserve(30, 0).unwrap();
    engine.reserve(10, 0).unwrap();
    engine.reserve(20, 0).unwrap();
    let seats: Vec<(SeatId, UserId)> = engine
        .reservations()
        .iter()
        .map(|r| (r.seat_id, r.user_id))
        .collect();
    assert_eq!(seats, vec![(1, 30), (2, 10), (3, 20)]);
}

// ── Properties ───────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Reserve(UserId, Priority),
    Cancel(SeatId, UserId),
    AddSeats(u32),
    Release(UserId, UserId),
    Update(UserId, Priority),
    Exit(UserId),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        6 => (0i64..40, 0i64..4).prop_map(|(u, p)| Op::Reserve(u, p)),
        3 => (1u32..12, 0i64..40).prop_map(|(s, u)| Op::Cancel(s, u)),
        1 => (0u32..3).prop_map(Op::AddSeats),
        1 => (0i64..40, 0i64..6).prop_map(|(lo, w)| Op::Release(lo, lo + w)),
        2 => (0i64..40, 0i64..4).prop_map(|(u, p)| Op::Update(u, p)),
        1 => (0i64..40).prop_map(Op::Exit),
    ]
}

proptest! {
    /// No reachable state double-books a seat, loses a seat, or has a user
    /// both seated and waiting.
    #[test]
    fn invariants_hold(initial in 0u32..8, ops in prop::collection::vec(op(), 1..200)) {
        let mut engine = engine_with(initial);
        for op in ops {
            match op {
                Op::Reserve(u, p) => { let _ = engine.reserve(u, p); }
                Op::Cancel(s, u) => { let _ = engine.cancel(s, u); }
                Op::AddSeats(n) => { let _ = engine.add_seats(n); }
                Op::Release(lo, hi) => { engine.release_range(lo, hi); }
                Op::Update(u, p) => { let _ = engine.update_priority(u, p); }
                Op::Exit(u) => { let _ = engine.exit_waitlist(u); }
            }
            prop_assert!(engine.check_invariants().is_ok(), "{:?}", engine.check_invariants());
        }
    }

    /// Identical command sequences give identical seat assignments.
    #[test]
    fn deterministic(ops in prop::collection::vec(op(), 1..100)) {
        let run = |ops: &[Op]| {
            let mut engine = engine_with(3);
            for op in ops {
                match *op {
                    Op::Reserve(u, p) => { let _ = engine.reserve(u, p); }
                    Op::Cancel(s, u) => { let _ = engine.cancel(s, u); }
                    Op::AddSeats(n) => { let _ = engine.add_seats(n); }
                    Op::Release(lo, hi) => { engine.release_range(lo, hi); }
                    Op::Update(u, p) => { let _ = engine.update_priority(u, p); }
                    Op::Exit(u) => { let _ = engine.exit_waitlist(u); }
                }
            }
            (engine.reservations(), engine.waiting())
        };
        prop_assert_eq!(run(ops.as_slice()), run(ops.as_slice()));
    }
}
