//! Streaming byte- and line-based chunkers, ported from `escribir_bytes`/
//! `escribir_lineas`: read into a fixed `BSIZE` buffer and fan the bytes out
//! across a sequence of numbered output files, tracking how many
//! bytes/lines the currently-open output file still owes.

use std::os::fd::{BorrowedFd, IntoRawFd};
use std::os::unix::io::RawFd;

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;
use nix::unistd::{close, read, write};

const OUTPUT_MODE: Mode = Mode::from_bits_truncate(0o700);

fn write_all(fd: RawFd, mut buf: &[u8]) -> nix::Result<()> {
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };
    while !buf.is_empty() {
        let n = write(borrowed, buf)?;
        buf = &buf[n..];
    }
    Ok(())
}

fn open_output(prefix: &str, index: u32) -> nix::Result<RawFd> {
    let name = format!("{}{}", prefix, index);
    let owned = open(name.as_str(), OFlag::O_CREAT | OFlag::O_RDWR | OFlag::O_TRUNC, OUTPUT_MODE)?;
    Ok(owned.into_raw_fd())
}

/// Split `fd`'s contents into `<prefix>0`, `<prefix>1`, ... of `nbytes`
/// bytes each (the last file may be shorter).
pub fn write_bytes(fd: RawFd, prefix: &str, nbytes: usize, bsize: usize) -> nix::Result<()> {
    let mut buf = vec![0u8; bsize];
    let mut incomplete_fd: Option<RawFd> = None;
    let mut remaining = 0usize;
    let mut next_index = 0u32;
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };

    loop {
        let n = read(borrowed, &mut buf)?;
        if n == 0 {
            break;
        }
        let mut cursor = 0usize;
        let mut in_buffer = n;

        if let Some(out_fd) = incomplete_fd {
            let take = remaining.min(in_buffer);
            write_all(out_fd, &buf[cursor..cursor + take])?;
            cursor += take;
            in_buffer -= take;
            remaining -= take;
            if remaining == 0 {
                close(out_fd)?;
                incomplete_fd = None;
            }
        }

        while in_buffer > 0 {
            let out_fd = open_output(prefix, next_index)?;
            next_index += 1;
            let take = nbytes.min(in_buffer);
            write_all(out_fd, &buf[cursor..cursor + take])?;
            cursor += take;
            in_buffer -= take;
            if take < nbytes {
                incomplete_fd = Some(out_fd);
                remaining = nbytes - take;
            } else {
                close(out_fd)?;
            }
        }
    }

    if let Some(out_fd) = incomplete_fd {
        close(out_fd)?;
    }
    Ok(())
}

/// Returns the byte offset (relative to `from`) just past the `want`-th
/// newline in `buf[from..end]`, or the offset past the last newline found
/// if fewer than `want` exist. `None` only when no newline exists at all.
fn first_n_newlines(buf: &[u8], from: usize, want: usize, end: usize) -> Option<usize> {
    let mut seen = 0usize;
    let mut last_offset = None;
    for i in from..end {
        if buf[i] == b'\n' {
            seen += 1;
            last_offset = Some(i - from + 1);
            if seen == want {
                break;
            }
        }
    }
    last_offset
}

fn count_newlines(buf: &[u8], from: usize, len: usize) -> usize {
    buf[from..from + len].iter().filter(|&&b| b == b'\n').count()
}

/// Split `fd`'s contents into `<prefix>0`, `<prefix>1`, ... of `nlines`
/// newline-terminated lines each.
pub fn write_lines(fd: RawFd, prefix: &str, nlines: usize, bsize: usize) -> nix::Result<()> {
    let mut buf = vec![0u8; bsize];
    let mut incomplete_fd: Option<RawFd> = None;
    let mut remaining = nlines;
    let mut next_index = 0u32;
    let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };

    loop {
        let n = read(borrowed, &mut buf)?;
        if n == 0 {
            break;
        }
        let mut cursor = 0usize;
        let mut in_buffer = n;

        if let Some(out_fd) = incomplete_fd {
            let found = first_n_newlines(&buf, cursor, remaining, cursor + in_buffer);
            let consumed = found.map(|o| count_newlines(&buf, cursor, o)).unwrap_or(0);

            if consumed >= remaining {
                let off = found.unwrap();
                write_all(out_fd, &buf[cursor..cursor + off])?;
                close(out_fd)?;
                incomplete_fd = None;
                cursor += off;
                in_buffer -= off;
                remaining = nlines;
            } else {
                write_all(out_fd, &buf[cursor..cursor + in_buffer])?;
                remaining -= consumed;
                cursor += in_buffer;
                in_buffer = 0;
            }
        }

        while in_buffer > 0 {
            let out_fd = open_output(prefix, next_index)?;
            next_index += 1;

            let found = first_n_newlines(&buf, cursor, remaining, cursor + in_buffer);
            let consumed = found.map(|o| count_newlines(&buf, cursor, o)).unwrap_or(0);

            if consumed < remaining {
                write_all(out_fd, &buf[cursor..cursor + in_buffer])?;
                incomplete_fd = Some(out_fd);
                remaining -= consumed;
                cursor += in_buffer;
                in_buffer = 0;
            } else {
                let off = found.unwrap();
                write_all(out_fd, &buf[cursor..cursor + off])?;
                close(out_fd)?;
                cursor += off;
                in_buffer -= off;
                remaining = nlines;
            }
        }
    }

    if let Some(out_fd) = incomplete_fd {
        close(out_fd)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::os::fd::IntoRawFd;

    fn fd_for_bytes(data: &[u8]) -> RawFd {
        let mut tmp = tempfile::tempfile().unwrap();
        tmp.write_all(data).unwrap();
        use std::io::Seek;
        tmp.seek(std::io::SeekFrom::Start(0)).unwrap();
        tmp.into_raw_fd()
    }

    #[test]
    fn first_n_newlines_stops_early_when_want_is_reached() {
        let buf = b"a\nb\nc\nd\n";
        assert_eq!(first_n_newlines(buf, 0, 2, buf.len()), Some(4));
    }

    #[test]
    fn first_n_newlines_returns_last_complete_line_when_short() {
        let buf = b"a\nb\nc";
        assert_eq!(first_n_newlines(buf, 0, 5, buf.len()), Some(4));
    }

    #[test]
    fn first_n_newlines_none_when_no_newline_at_all() {
        let buf = b"abcde";
        assert_eq!(first_n_newlines(buf, 0, 1, buf.len()), None);
    }

    #[test]
    fn count_newlines_counts_in_window() {
        let buf = b"a\nb\nc\n";
        assert_eq!(count_newlines(buf, 0, buf.len()), 3);
    }

    #[test]
    fn write_bytes_splits_evenly_with_remainder() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("in").display().to_string();
        let fd = fd_for_bytes(b"ABCDEFG");

        write_bytes(fd, &prefix, 3, 1024).unwrap();

        assert_eq!(fs::read_to_string(format!("{}0", prefix)).unwrap(), "ABC");
        assert_eq!(fs::read_to_string(format!("{}1", prefix)).unwrap(), "DEF");
        assert_eq!(fs::read_to_string(format!("{}2", prefix)).unwrap(), "G");
        assert!(!std::path::Path::new(&format!("{}3", prefix)).exists());
    }

    #[test]
    fn write_bytes_honors_small_read_buffer() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("in").display().to_string();
        let fd = fd_for_bytes(b"ABCDEFG");

        write_bytes(fd, &prefix, 3, 2).unwrap();

        assert_eq!(fs::read_to_string(format!("{}0", prefix)).unwrap(), "ABC");
        assert_eq!(fs::read_to_string(format!("{}1", prefix)).unwrap(), "DEF");
        assert_eq!(fs::read_to_string(format!("{}2", prefix)).unwrap(), "G");
    }

    #[test]
    fn write_lines_splits_by_line_count() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("lines").display().to_string();
        let fd = fd_for_bytes(b"1\n2\n3\n4\n5\n");

        write_lines(fd, &prefix, 2, 1024).unwrap();

        assert_eq!(fs::read_to_string(format!("{}0", prefix)).unwrap(), "1\n2\n");
        assert_eq!(fs::read_to_string(format!("{}1", prefix)).unwrap(), "3\n4\n");
        assert_eq!(fs::read_to_string(format!("{}2", prefix)).unwrap(), "5\n");
    }

    #[test]
    fn write_lines_concatenation_matches_input_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("lines").display().to_string();
        let input = b"alpha\nbeta\ngamma\ndelta\nepsilon\n".to_vec();
        let fd = fd_for_bytes(&input);

        write_lines(fd, &prefix, 2, 5).unwrap();

        let mut joined = Vec::new();
        let mut i = 0;
        loop {
            let path = format!("{}{}", prefix, i);
            if !std::path::Path::new(&path).exists() {
                break;
            }
            joined.extend(fs::read(&path).unwrap());
            i += 1;
        }
        assert_eq!(joined, input);
    }
}
