/// Most seats that may ever be created. Seat ids are `u32`.
pub const MAX_TOTAL_SEATS: u32 = 10_000_000;

/// Longest command line the runner will parse, in bytes.
pub const MAX_LINE_LEN: usize = 1024;

/// Most arguments any command accepts.
pub const MAX_ARGS: usize = 2;
