//! Bitmask-gated debug output, matching the `-d N` flag: bit 0 echoes the
//! parsed command line, bit 1 traces executor decisions. No logging crate —
//! neither the original shell nor the teacher reach for one here.

use std::sync::atomic::{AtomicU8, Ordering};

static DEBUG_LEVEL: AtomicU8 = AtomicU8::new(0);

pub const ECHO: u8 = 1 << 0;
pub const TRACE: u8 = 1 << 1;

pub fn set_level(level: u8) {
    DEBUG_LEVEL.store(level, Ordering::Relaxed);
}

fn enabled(bit: u8) -> bool {
    DEBUG_LEVEL.load(Ordering::Relaxed) & bit != 0
}

pub fn echo_command(line: &str) {
    if enabled(ECHO) {
        eprintln!("+ {}", line);
    }
}

pub fn trace(msg: &str) {
    if enabled(TRACE) {
        eprintln!("# {}", msg);
    }
}
