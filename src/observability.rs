use std::net::SocketAddr;

use crate::command::Command;

// ── RED metrics (command-driven) ────────────────────────────────

/// Counter: total commands executed. Labels: command, status.
pub const OPERATIONS_TOTAL: &str = "seatq_operations_total";

/// Histogram: command latency in seconds. Labels: command.
pub const OPERATION_DURATION_SECONDS: &str = "seatq_operation_duration_seconds";

/// Counter: log lines that could not be parsed.
pub const INVALID_LINES_TOTAL: &str = "seatq_invalid_lines_total";

// ── USE metrics (seat utilization) ──────────────────────────────

/// Gauge: seats in the free pool.
pub const SEATS_FREE: &str = "seatq_seats_free";

/// Gauge: seats currently reserved.
pub const SEATS_RESERVED: &str = "seatq_seats_reserved";

/// Gauge: requesters on the waitlist.
pub const WAITLIST_DEPTH: &str = "seatq_waitlist_depth";

/// Counter: seats handed straight from a release or new capacity to a waiter.
pub const WAITLIST_ADMISSIONS_TOTAL: &str = "seatq_waitlist_admissions_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Command variant to a short label for metrics.
pub fn command_label(cmd: &Command) -> &'static str {
    match cmd {
        Command::Initialize { .. } => "initialize",
        Command::Available => "available",
        Command::Reserve { .. } => "reserve",
        Command::Cancel { .. } => "cancel",
        Command::AddSeats { .. } => "add_seats",
        Command::ReleaseSeats { .. } => "release_seats",
        Command::UpdatePriority { .. } => "update_priority",
        Command::ExitWaitlist { .. } => "exit_waitlist",
        Command::PrintReservations => "print_reservations",
        Command::Quit => "quit",
    }
}
