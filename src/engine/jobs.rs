//! The background-job registry: 8 fixed slots mapping slot index -> PID,
//! `0` meaning empty. Shared between the main/executor path (inserter) and
//! the SIGCHLD handler (remover); mutation from the handler side is
//! restricted to async-signal-safe operations (no locks, no allocation),
//! and mutation from the executor side is serialized by blocking SIGCHLD
//! around the insert (see `signals::block_all`).

use std::os::raw::c_int;
use std::sync::atomic::{AtomicI32, Ordering};

const NUM_SLOTS: usize = 8;

static SLOTS: [AtomicI32; NUM_SLOTS] = [
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
    AtomicI32::new(0),
];

/// Insert `pid` into the first empty slot. Caller is responsible for
/// blocking signals around this call per the Background executor case.
pub fn insert(pid: i32) {
    for slot in SLOTS.iter() {
        if slot
            .compare_exchange(0, pid, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return;
        }
    }
}

fn remove(pid: i32) -> bool {
    for slot in SLOTS.iter() {
        if slot
            .compare_exchange(pid, 0, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            return true;
        }
    }
    false
}

/// Snapshot of the non-empty slots, in slot order, for `bjobs`.
pub fn snapshot() -> Vec<i32> {
    SLOTS
        .iter()
        .map(|s| s.load(Ordering::SeqCst))
        .filter(|&pid| pid != 0)
        .collect()
}

/// Send SIGKILL to every registered background job, for `bjobs -k`.
pub fn kill_all() {
    for slot in SLOTS.iter() {
        let pid = slot.load(Ordering::SeqCst);
        if pid != 0 {
            unsafe {
                libc::kill(pid, libc::SIGKILL);
            }
        }
    }
}

/// Format `[<pid>]` into a fixed buffer without allocating, returning the
/// slice actually written. Async-signal-safe.
fn format_bracketed_pid(pid: i32, buf: &mut [u8; 16]) -> usize {
    let mut digits = [0u8; 10];
    let mut n = pid;
    let mut ndigits = 0;
    if n == 0 {
        digits[0] = b'0';
        ndigits = 1;
    } else {
        while n > 0 {
            digits[ndigits] = b'0' + (n % 10) as u8;
            n /= 10;
            ndigits += 1;
        }
    }

    let mut pos = 0;
    buf[pos] = b'[';
    pos += 1;
    for i in (0..ndigits).rev() {
        buf[pos] = digits[i];
        pos += 1;
    }
    buf[pos] = b']';
    pos += 1;
    pos
}

/// SIGCHLD handler: reap every exited child without blocking, and for each
/// one that is a registered background job, clear its slot and write
/// `[<pid>]` (no trailing newline) to stdout. Async-signal-safe: no
/// allocation, no locks, errno saved and restored around the body.
pub extern "C" fn handle_sigchld(_sig: c_int) {
    let saved_errno = unsafe { *libc::__errno_location() };

    loop {
        let pid = unsafe { libc::waitpid(-1, std::ptr::null_mut(), libc::WNOHANG) };
        if pid <= 0 {
            break;
        }
        if remove(pid) {
            let mut buf = [0u8; 16];
            let len = format_bracketed_pid(pid, &mut buf);
            unsafe {
                libc::write(libc::STDOUT_FILENO, buf.as_ptr() as *const _, len);
            }
        }
    }

    unsafe {
        *libc::__errno_location() = saved_errno;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_bracketed_pid_matches_decimal() {
        let mut buf = [0u8; 16];
        let len = format_bracketed_pid(4242, &mut buf);
        assert_eq!(&buf[..len], b"[4242]");
    }

    #[test]
    fn format_bracketed_pid_single_digit() {
        let mut buf = [0u8; 16];
        let len = format_bracketed_pid(7, &mut buf);
        assert_eq!(&buf[..len], b"[7]");
    }

    #[test]
    fn insert_uses_first_empty_slot_and_remove_clears_it() {
        insert(999_001);
        assert!(snapshot().contains(&999_001));
        assert!(remove(999_001));
        assert!(!snapshot().contains(&999_001));
    }
}
