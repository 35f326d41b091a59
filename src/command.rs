use crate::limits::*;
use crate::model::*;

/// Parsed command from one line of a command log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Initialize {
        count: u32,
    },
    Available,
    Reserve {
        user_id: UserId,
        priority: Priority,
    },
    Cancel {
        seat_id: SeatId,
        user_id: UserId,
    },
    AddSeats {
        count: u32,
    },
    ReleaseSeats {
        low: UserId,
        high: UserId,
    },
    UpdatePriority {
        user_id: UserId,
        priority: Priority,
    },
    ExitWaitlist {
        user_id: UserId,
    },
    PrintReservations,
    Quit,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Initialize { .. } => "Initialize",
            Command::Available => "Available",
            Command::Reserve { .. } => "Reserve",
            Command::Cancel { .. } => "Cancel",
            Command::AddSeats { .. } => "AddSeats",
            Command::ReleaseSeats { .. } => "ReleaseSeats",
            Command::UpdatePriority { .. } => "UpdatePriority",
            Command::ExitWaitlist { .. } => "ExitWaitlist",
            Command::PrintReservations => "PrintReservations",
            Command::Quit => "Quit",
        }
    }
}

/// Parse a line of the form `Name(arg, ...)`.
pub fn parse_command(line: &str) -> Result<Command, CommandError> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Err(CommandError::Empty);
    }
    if trimmed.len() > MAX_LINE_LEN {
        return Err(CommandError::Parse(format!("line longer than {MAX_LINE_LEN} bytes")));
    }

    let (name, rest) = trimmed
        .split_once('(')
        .ok_or_else(|| CommandError::Parse(format!("missing '(' in {trimmed:?}")))?;
    let name = name.trim();
    let body = rest
        .trim_end()
        .strip_suffix(')')
        .ok_or_else(|| CommandError::Parse(format!("missing ')' in {trimmed:?}")))?;
    let args = split_args(body)?;

    match name {
        "Initialize" => {
            let [count] = arity::<1>("Initialize", &args)?;
            Ok(Command::Initialize {
                count: parse_count("Initialize", count)?,
            })
        }
        "Available" => {
            arity::<0>("Available", &args)?;
            Ok(Command::Available)
        }
        "Reserve" => {
            let [user, priority] = arity::<2>("Reserve", &args)?;
            Ok(Command::Reserve {
                user_id: parse_i64(user)?,
                priority: parse_i64(priority)?,
            })
        }
        "Cancel" => {
            let [seat, user] = arity::<2>("Cancel", &args)?;
            Ok(Command::Cancel {
                seat_id: parse_u32(seat)?,
                user_id: parse_i64(user)?,
            })
        }
        "AddSeats" => {
            let [count] = arity::<1>("AddSeats", &args)?;
            Ok(Command::AddSeats {
                count: parse_count("AddSeats", count)?,
            })
        }
        "ReleaseSeats" => {
            let [low, high] = arity::<2>("ReleaseSeats", &args)?;
            Ok(Command::ReleaseSeats {
                low: parse_i64(low)?,
                high: parse_i64(high)?,
            })
        }
        "UpdatePriority" => {
            let [user, priority] = arity::<2>("UpdatePriority", &args)?;
            Ok(Command::UpdatePriority {
                user_id: parse_i64(user)?,
                priority: parse_i64(priority)?,
            })
        }
        "ExitWaitlist" => {
            let [user] = arity::<1>("ExitWaitlist", &args)?;
            Ok(Command::ExitWaitlist {
                user_id: parse_i64(user)?,
            })
        }
        "PrintReservations" => {
            arity::<0>("PrintReservations", &args)?;
            Ok(Command::PrintReservations)
        }
        "Quit" => {
            arity::<0>("Quit", &args)?;
            Ok(Command::Quit)
        }
        other => Err(CommandError::UnknownCommand(other.to_string())),
    }
}

// ── Helpers ───────────────────────────────────────────────────

fn split_args(body: &str) -> Result<Vec<&str>, CommandError> {
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    let args: Vec<&str> = body.split(',').map(str::trim).collect();
    if args.len() > MAX_ARGS {
        return Err(CommandError::Parse(format!("too many arguments: {}", args.len())));
    }
    if args.iter().any(|a| a.is_empty()) {
        return Err(CommandError::Parse("empty argument".into()));
    }
    Ok(args)
}

fn arity<'a, const N: usize>(name: &'static str, args: &[&'a str]) -> Result<[&'a str; N], CommandError> {
    <[&str; N]>::try_from(args).map_err(|_| CommandError::WrongArity(name, N, args.len()))
}

fn parse_i64(s: &str) -> Result<i64, CommandError> {
    s.parse()
        .map_err(|e| CommandError::Parse(format!("bad integer {s:?}: {e}")))
}

fn parse_u32(s: &str) -> Result<u32, CommandError> {
    let v = parse_i64(s)?;
    u32::try_from(v).map_err(|_| CommandError::InvalidArgument(format!("{v} out of u32 range")))
}

/// Seat counts: any non-negative integer that fits a seat id.
fn parse_count(name: &'static str, s: &str) -> Result<u32, CommandError> {
    let v = parse_i64(s).map_err(|_| CommandError::InvalidCount(name))?;
    u32::try_from(v).map_err(|_| CommandError::InvalidCount(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    Parse(String),
    Empty,
    UnknownCommand(String),
    WrongArity(&'static str, usize, usize),
    InvalidArgument(String),
    /// Seat count for Initialize / AddSeats is not a usable number.
    InvalidCount(&'static str),
}

impl CommandError {
    /// Command name, when the line got far enough to identify one.
    pub fn command(&self) -> Option<&'static str> {
        match self {
            CommandError::WrongArity(name, ..) | CommandError::InvalidCount(name) => Some(*name),
            _ => None,
        }
    }
}

impl std::fmt::Display for CommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::Parse(s) => write!(f, "parse error: {s}"),
            CommandError::Empty => write!(f, "empty command"),
            CommandError::UnknownCommand(name) => write!(f, "unknown command: {name}"),
            CommandError::WrongArity(name, expected, got) => {
                write!(f, "{name}: expected {expected} arguments, got {got}")
            }
            CommandError::InvalidArgument(s) => write!(f, "invalid argument: {s}"),
            CommandError::InvalidCount(name) => write!(f, "{name}: invalid seat count"),
        }
    }
}

impl std::error::Error for CommandError {}
