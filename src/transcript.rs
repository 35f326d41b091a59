use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::model::*;

/// How a transcript is written to disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per outcome.
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(OutputFormat::Text),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format: {other}")),
        }
    }
}

/// Render one outcome to its transcript lines.
pub fn render(outcome: &Outcome) -> Vec<String> {
    match outcome {
        Outcome::Initialized { count, admissions } => {
            let mut lines = vec![format!("{count} Seats are made available for reservation")];
            lines.extend(admissions.iter().map(reserved_line));
            lines
        }
        Outcome::Availability(a) => vec![format!(
            "Total Seats Available : {}, Waitlist : {}",
            a.free_seats, a.waitlist_len
        )],
        Outcome::Reserved(r) => vec![reserved_line(r)],
        Outcome::Waitlisted { user_id } => vec![format!("User {user_id} is added to the waiting list")],
        Outcome::Cancelled { cancelled, admitted } => {
            let mut lines = vec![format!("User {} canceled their reservation", cancelled.user_id)];
            lines.extend(admitted.iter().map(reserved_line));
            lines
        }
        Outcome::CancelRejected { seat_id, user_id } => {
            vec![format!("User {user_id} has no reservation for seat {seat_id} to cancel")]
        }
        Outcome::SeatsAdded { count, admissions } => {
            let mut lines = vec![format!("Additional {count} Seats are made available for reservation")];
            lines.extend(admissions.iter().map(reserved_line));
            lines
        }
        Outcome::Released { low, high, admissions, .. } => {
            let mut lines = vec![format!(
                "Reservations of the Users in the range [{low}, {high}] are released"
            )];
            lines.extend(admissions.iter().map(reserved_line));
            lines
        }
        Outcome::PriorityUpdated { user_id, priority } => {
            vec![format!("User {user_id} priority has been updated to {priority}")]
        }
        Outcome::PriorityNotUpdated { user_id } => vec![format!("User {user_id} priority is not updated")],
        Outcome::LeftWaitlist { user_id } => vec![format!("User {user_id} is removed from the waiting list")],
        Outcome::NotInWaitlist { user_id } => vec![format!("User {user_id} is not in waitlist")],
        Outcome::AlreadyReserved(r) => vec![format!("User {} already holds seat {}", r.user_id, r.seat_id)],
        Outcome::AlreadyWaiting { user_id } => vec![format!("User {user_id} is already in the waiting list")],
        Outcome::Reservations { reservations } => reservations
            .iter()
            .map(|r| format!("Seat {}, User {}", r.seat_id, r.user_id))
            .collect(),
        Outcome::InvalidSeatCount { .. } => {
            vec!["Invalid input. Please provide a valid number of seats.".to_string()]
        }
        Outcome::InvalidInput { detail, .. } => vec![format!("Invalid input: {detail}")],
        Outcome::Terminated => vec!["Program Terminated!!".to_string()],
    }
}

fn reserved_line(r: &Reservation) -> String {
    format!("User {} reserved seat {}", r.user_id, r.seat_id)
}

/// `<dir>/<stem>_output_file.txt` for an input at `<dir>/<stem>.<ext>`.
pub fn output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(format!("{stem}_output_file.txt"))
}

/// Outcomes accumulated over a run, in command order.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    outcomes: Vec<Outcome>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, outcome: Outcome) {
        self.outcomes.push(outcome);
    }

    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn lines(&self) -> Vec<String> {
        self.outcomes.iter().flat_map(render).collect()
    }

    pub fn to_text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut out = String::new();
        for outcome in &self.outcomes {
            out.push_str(&serde_json::to_string(outcome)?);
            out.push('\n');
        }
        Ok(out)
    }

    /// Write the whole transcript to `path`, replacing any previous file.
    pub fn save(&self, path: &Path, format: OutputFormat) -> io::Result<()> {
        let body = match format {
            OutputFormat::Text => self.to_text(),
            OutputFormat::Json => self
                .to_json_lines()
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?,
        };
        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(body.as_bytes())?;
        writer.flush()
    }
}
