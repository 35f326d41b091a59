use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, warn};

use crate::command::{Command, CommandError, parse_command};
use crate::engine::{Engine, EngineError};
use crate::model::*;
use crate::observability::*;
use crate::transcript::{OutputFormat, Transcript, output_path};

/// Counts from one pass over a command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSummary {
    /// Commands that parsed and reached the engine.
    pub executed: usize,
    /// Outcomes recorded as rejections, including unparseable lines.
    pub rejected: usize,
    /// Lines dropped without a transcript entry.
    pub skipped: usize,
    /// True if the log ended with `Quit()`.
    pub terminated: bool,
}

/// Drives one engine from a sequence of command lines, recording every
/// outcome in order.
#[derive(Debug, Default)]
pub struct Runner {
    engine: Engine,
    transcript: Transcript,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn into_transcript(self) -> Transcript {
        self.transcript
    }

    /// Execute one command against the engine and return its outcome.
    /// The outcome is not added to the transcript.
    pub fn execute(&mut self, cmd: Command) -> Outcome {
        let label = command_label(&cmd);
        let start = Instant::now();

        let outcome = self.dispatch(cmd);

        let status = if outcome.is_rejection() { "rejected" } else { "ok" };
        metrics::counter!(OPERATIONS_TOTAL, "command" => label, "status" => status).increment(1);
        metrics::histogram!(OPERATION_DURATION_SECONDS, "command" => label)
            .record(start.elapsed().as_secs_f64());
        self.publish_gauges();
        outcome
    }

    fn dispatch(&mut self, cmd: Command) -> Outcome {
        let engine = &mut self.engine;
        match cmd {
            Command::Initialize { count } => match engine.initialize(count) {
                Ok(added) => Outcome::Initialized {
                    count: added.count,
                    admissions: added.admissions,
                },
                Err(e) => refused(cmd, e),
            },
            Command::Available => Outcome::Availability(engine.available()),
            Command::Reserve { user_id, priority } => match engine.reserve(user_id, priority) {
                Ok(ReserveOutcome::Reserved(seat_id)) => Outcome::Reserved(Reservation::new(seat_id, user_id)),
                Ok(ReserveOutcome::Waitlisted) => Outcome::Waitlisted { user_id },
                Err(e) => refused(cmd, e),
            },
            Command::Cancel { seat_id, user_id } => match engine.cancel(seat_id, user_id) {
                Ok(c) => Outcome::Cancelled {
                    cancelled: c.cancelled,
                    admitted: c.admitted.map(|user| Reservation::new(seat_id, user)),
                },
                Err(e) => refused(cmd, e),
            },
            Command::AddSeats { count } => match engine.add_seats(count) {
                Ok(added) => Outcome::SeatsAdded {
                    count: added.count,
                    admissions: added.admissions,
                },
                Err(e) => refused(cmd, e),
            },
            Command::ReleaseSeats { low, high } => {
                let released = engine.release_range(low, high);
                Outcome::Released {
                    low,
                    high,
                    freed: released.freed,
                    admissions: released.admissions,
                }
            }
            Command::UpdatePriority { user_id, priority } => match engine.update_priority(user_id, priority) {
                Ok(()) => Outcome::PriorityUpdated { user_id, priority },
                Err(e) => refused(cmd, e),
            },
            Command::ExitWaitlist { user_id } => match engine.exit_waitlist(user_id) {
                Ok(()) => Outcome::LeftWaitlist { user_id },
                Err(e) => refused(cmd, e),
            },
            Command::PrintReservations => Outcome::Reservations {
                reservations: engine.reservations(),
            },
            Command::Quit => Outcome::Terminated,
        }
    }

    fn publish_gauges(&self) {
        let a = self.engine.available();
        metrics::gauge!(SEATS_FREE).set(a.free_seats as f64);
        metrics::gauge!(SEATS_RESERVED).set(self.engine.reserved_count() as f64);
        metrics::gauge!(WAITLIST_DEPTH).set(a.waitlist_len as f64);
    }

    /// Feed `lines` in order until they run out or a `Quit()` is seen.
    /// Lines after `Quit()` are never parsed.
    pub fn run_lines<I, S>(&mut self, lines: I) -> RunSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut summary = RunSummary::default();
        for (idx, line) in lines.into_iter().enumerate() {
            let line = line.as_ref();
            let line_no = idx + 1;

            let cmd = match parse_command(line) {
                Ok(cmd) => cmd,
                Err(CommandError::Empty) => continue,
                Err(CommandError::UnknownCommand(name)) => {
                    warn!(line = line_no, %name, "skipping unknown command");
                    metrics::counter!(INVALID_LINES_TOTAL, "reason" => "unknown").increment(1);
                    summary.skipped += 1;
                    continue;
                }
                Err(e) => {
                    warn!(line = line_no, error = %e, "rejecting malformed command");
                    metrics::counter!(INVALID_LINES_TOTAL, "reason" => "malformed").increment(1);
                    let outcome = match e {
                        CommandError::InvalidCount(name) => Outcome::InvalidSeatCount {
                            command: name.to_string(),
                        },
                        other => Outcome::InvalidInput {
                            line: line.trim().to_string(),
                            detail: other.to_string(),
                        },
                    };
                    summary.rejected += 1;
                    self.transcript.push(outcome);
                    continue;
                }
            };

            let quit = cmd == Command::Quit;
            let outcome = self.execute(cmd);
            summary.executed += 1;
            if outcome.is_rejection() {
                summary.rejected += 1;
            }
            self.transcript.push(outcome);
            if quit {
                summary.terminated = true;
                break;
            }
        }
        summary
    }

    /// Run the command log at `input` and write its transcript beside it.
    /// Returns the summary and the path written.
    pub fn run_file(input: &Path, format: OutputFormat) -> io::Result<(RunSummary, PathBuf)> {
        let text = fs::read_to_string(input)?;
        info!(input = %input.display(), "running command log");

        let mut runner = Runner::new();
        let summary = runner.run_lines(text.lines());

        let out = output_path(input);
        runner.transcript.save(&out, format)?;
        info!(
            output = %out.display(),
            executed = summary.executed,
            rejected = summary.rejected,
            skipped = summary.skipped,
            terminated = summary.terminated,
            "transcript written"
        );
        Ok((summary, out))
    }
}

/// Map an engine refusal to the outcome recorded for `cmd`.
fn refused(cmd: Command, err: EngineError) -> Outcome {
    match err {
        EngineError::NotWaiting(user_id) => match cmd {
            Command::UpdatePriority { .. } => Outcome::PriorityNotUpdated { user_id },
            _ => Outcome::NotInWaitlist { user_id },
        },
        EngineError::MismatchedCancel { seat_id, user_id } => Outcome::CancelRejected { seat_id, user_id },
        EngineError::AlreadyReserved { user_id, seat_id } => {
            Outcome::AlreadyReserved(Reservation::new(seat_id, user_id))
        }
        EngineError::AlreadyWaiting(user_id) => Outcome::AlreadyWaiting { user_id },
        EngineError::LimitExceeded(_) => Outcome::InvalidSeatCount {
            command: cmd.name().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&str]) -> (RunSummary, Vec<String>) {
        let mut runner = Runner::new();
        let summary = runner.run_lines(lines.iter().copied());
        (summary, runner.transcript().lines())
    }

    #[test]
    fn cancel_hands_seat_to_waiter() {
        let (summary, lines) = run(&[
            "Initialize(2)",
            "Reserve(1, 1)",
            "Reserve(2, 1)",
            "Reserve(3, 1)",
            "Cancel(1, 1)",
            "Quit()",
        ]);
        assert_eq!(
            lines,
            vec![
                "2 Seats are made available for reservation",
                "User 1 reserved seat 1",
                "User 2 reserved seat 2",
                "User 3 is added to the waiting list",
                "User 1 canceled their reservation",
                "User 3 reserved seat 1",
                "Program Terminated!!",
            ]
        );
        assert_eq!(summary.executed, 6);
        assert_eq!(summary.rejected, 0);
        assert!(summary.terminated);
    }

    #[test]
    fn lines_after_quit_are_ignored() {
        let (summary, lines) = run(&["Initialize(1)", "Quit()", "Reserve(1, 1)", "garbage"]);
        assert_eq!(lines.last().map(String::as_str), Some("Program Terminated!!"));
        assert_eq!(lines.len(), 2);
        assert_eq!(summary.executed, 2);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn missing_quit_still_runs_to_end() {
        let (summary, lines) = run(&["Initialize(1)", "Available()"]);
        assert!(!summary.terminated);
        assert_eq!(lines[1], "Total Seats Available : 1, Waitlist : 0");
    }

    #[test]
    fn blank_lines_skipped_silently() {
        let (summary, lines) = run(&["", "Initialize(1)", "   ", "Quit()"]);
        assert_eq!(lines.len(), 2);
        assert_eq!(summary.skipped, 0);
    }

    #[test]
    fn unknown_command_is_skipped() {
        let (summary, lines) = run(&["Initialize(1)", "Book(1, 2)", "Available()"]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn bad_seat_count_reports_invalid_input() {
        let (summary, lines) = run(&["AddSeats(many)", "Initialize(-3)"]);
        assert_eq!(summary.rejected, 2);
        assert_eq!(
            lines,
            vec![
                "Invalid input. Please provide a valid number of seats.",
                "Invalid input. Please provide a valid number of seats.",
            ]
        );
    }

    #[test]
    fn malformed_known_command_is_recorded() {
        let mut runner = Runner::new();
        let summary = runner.run_lines(["Reserve(1)"]);
        assert_eq!(summary.rejected, 1);
        assert!(matches!(
            &runner.transcript().outcomes()[0],
            Outcome::InvalidInput { line, .. } if line == "Reserve(1)"
        ));
    }

    #[test]
    fn refusals_map_to_outcomes() {
        let mut runner = Runner::new();
        runner.execute(Command::Initialize { count: 1 });
        runner.execute(Command::Reserve { user_id: 1, priority: 1 });
        runner.execute(Command::Reserve { user_id: 2, priority: 1 });

        assert_eq!(
            runner.execute(Command::Reserve { user_id: 1, priority: 1 }),
            Outcome::AlreadyReserved(Reservation::new(1, 1))
        );
        assert_eq!(
            runner.execute(Command::Reserve { user_id: 2, priority: 5 }),
            Outcome::AlreadyWaiting { user_id: 2 }
        );
        assert_eq!(
            runner.execute(Command::Cancel { seat_id: 1, user_id: 2 }),
            Outcome::CancelRejected { seat_id: 1, user_id: 2 }
        );
        assert_eq!(
            runner.execute(Command::UpdatePriority { user_id: 1, priority: 0 }),
            Outcome::PriorityNotUpdated { user_id: 1 }
        );
        assert_eq!(
            runner.execute(Command::ExitWaitlist { user_id: 9 }),
            Outcome::NotInWaitlist { user_id: 9 }
        );
        assert_eq!(
            runner.execute(Command::ExitWaitlist { user_id: 2 }),
            Outcome::LeftWaitlist { user_id: 2 }
        );
    }

    #[test]
    fn seat_limit_reports_invalid_count() {
        let mut runner = Runner::new();
        let outcome = runner.execute(Command::AddSeats {
            count: crate::limits::MAX_TOTAL_SEATS + 1,
        });
        assert_eq!(
            outcome,
            Outcome::InvalidSeatCount {
                command: "AddSeats".into()
            }
        );
        assert_eq!(runner.engine().total_seats(), 0);
    }

    #[test]
    fn inverted_release_range_releases_nothing() {
        let mut runner = Runner::new();
        let summary = runner.run_lines(["Initialize(1)", "Reserve(1, 1)", "ReleaseSeats(5, 1)"]);
        assert_eq!(summary.rejected, 0);
        assert_eq!(
            runner.transcript().lines()[2],
            "Reservations of the Users in the range [5, 1] are released"
        );
        assert_eq!(runner.engine().seat_of(1), Some(1));
    }

    #[test]
    fn released_outcome_lists_freed_seats() {
        let mut runner = Runner::new();
        runner.run_lines(["Initialize(3)", "Reserve(4, 1)", "Reserve(2, 1)", "Reserve(3, 1)", "Reserve(9, 1)"]);
        let outcome = runner.execute(Command::ReleaseSeats { low: 2, high: 4 });
        assert_eq!(
            outcome,
            Outcome::Released {
                low: 2,
                high: 4,
                freed: vec![Reservation::new(1, 4), Reservation::new(2, 2), Reservation::new(3, 3)],
                admissions: vec![Reservation::new(1, 9)],
            }
        );
    }

    #[test]
    fn run_file_writes_beside_input() {
        let dir = std::env::temp_dir().join(format!("seatq_test_runner_{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let input = dir.join("run_file_writes.txt");
        fs::write(&input, "Initialize(1)\nReserve(4, 2)\nPrintReservations()\nQuit()\n").unwrap();

        let (summary, out) = Runner::run_file(&input, OutputFormat::Text).unwrap();
        assert_eq!(out, dir.join("run_file_writes_output_file.txt"));
        assert!(summary.terminated);
        assert_eq!(
            fs::read_to_string(&out).unwrap(),
            "1 Seats are made available for reservation\n\
             User 4 reserved seat 1\n\
             Seat 1, User 4\n\
             Program Terminated!!"
        );
    }

    #[test]
    fn run_file_missing_input_errors() {
        let missing = std::env::temp_dir().join("seatq_test_runner_missing/none.txt");
        assert!(Runner::run_file(&missing, OutputFormat::Text).is_err());
    }
}
