use std::path::PathBuf;
use std::process::ExitCode;

use tracing::info;

use seatq::runner::Runner;
use seatq::transcript::OutputFormat;

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let (Some(input), None) = (args.next(), args.next()) else {
        eprintln!("usage: seatq <command-log>");
        return Ok(ExitCode::FAILURE);
    };
    let input = PathBuf::from(input);

    let format: OutputFormat = match std::env::var("SEATQ_FORMAT") {
        Ok(s) => s.parse()?,
        Err(_) => OutputFormat::default(),
    };
    let metrics_port: Option<u16> = std::env::var("SEATQ_METRICS_PORT")
        .ok()
        .and_then(|s| s.parse().ok());
    seatq::observability::init(metrics_port)?;

    info!("seatq starting");
    info!("  input: {}", input.display());
    info!("  format: {format:?}");
    info!("  metrics: {}", metrics_port.map_or("disabled".to_string(), |p| format!("http://0.0.0.0:{p}/metrics")));

    let (summary, output) = Runner::run_file(&input, format)?;
    info!(
        "seatq finished: {} commands, {} rejected, output at {}",
        summary.executed,
        summary.rejected,
        output.display()
    );
    Ok(ExitCode::SUCCESS)
}
