//! `psplit`: split one or more inputs (or stdin) into numbered output files
//! by byte count or line count, optionally processing several inputs
//! concurrently with a bounded worker pool. The hardest engineering in the
//! built-in set, ported from the source's `run_psplit`/`escribir_bytes`/
//! `escribir_lineas`.

mod chunker;
mod pool;

use std::os::fd::IntoRawFd;
use std::os::unix::io::RawFd;

use nix::fcntl::{open, OFlag};
use nix::sys::stat::Mode;

const DEFAULT_NBYTES: i64 = 1024;
const DEFAULT_BSIZE: i64 = 1024;
const MAX_BSIZE: i64 = 1_048_576;

struct Options {
    nlines: i64,
    nbytes: i64,
    bsize: i64,
    procs: i64,
    files: Vec<String>,
}

enum ParseResult {
    Parsed(Options),
    Help,
    Error(String),
}

fn parse_options(args: &[String]) -> ParseResult {
    let mut nlines = 0i64;
    let mut nbytes = DEFAULT_NBYTES;
    let mut bsize = DEFAULT_BSIZE;
    let mut procs = 1i64;
    let mut files = Vec::new();
    let mut i = 0usize;

    // GNU getopt permutes argv so options may follow operands; scan the
    // whole list rather than stopping at the first non-option.
    while i < args.len() {
        let arg = args[i].as_str();
        if arg == "-h" {
            return ParseResult::Help;
        }
        if !arg.starts_with('-') || arg.len() < 2 {
            files.push(args[i].clone());
            i += 1;
            continue;
        }
        let letter = arg.as_bytes()[1] as char;
        if !"lbsp".contains(letter) {
            return ParseResult::Help;
        }

        let value_str = if arg.len() > 2 {
            arg[2..].to_string()
        } else {
            i += 1;
            match args.get(i) {
                Some(v) => v.clone(),
                None => {
                    return ParseResult::Error(format!(
                        "option requires an argument -- '{}'",
                        letter
                    ))
                }
            }
        };

        let value: i64 = match value_str.parse() {
            Ok(v) => v,
            Err(_) => return ParseResult::Error(format!("invalid value for -{}", letter)),
        };

        match letter {
            'l' => nlines = value,
            'b' => nbytes = value,
            's' => bsize = value,
            'p' => procs = value,
            _ => unreachable!(),
        }
        i += 1;
    }

    if nlines != 0 && nbytes != DEFAULT_NBYTES {
        return ParseResult::Error("opciones incompatibles".to_string());
    }
    if bsize < 1 || bsize > MAX_BSIZE {
        return ParseResult::Error("invalid -s option".to_string());
    }
    if procs < 1 {
        return ParseResult::Error("invalid -p option".to_string());
    }

    ParseResult::Parsed(Options {
        nlines,
        nbytes,
        bsize,
        procs,
        files,
    })
}

fn print_usage() {
    println!("usage: psplit [-l N] [-b N] [-s N] [-p N] [-h] [file ...]");
}

pub fn run(args: &[String]) {
    let opts = match parse_options(args) {
        ParseResult::Parsed(o) => o,
        ParseResult::Help => {
            print_usage();
            return;
        }
        ParseResult::Error(msg) => {
            eprintln!("psplit: {}", msg);
            return;
        }
    };

    if opts.files.is_empty() {
        chunk_dispatch(libc::STDIN_FILENO, "stdin", &opts);
        return;
    }

    if opts.files.len() > 1 && opts.procs > 1 {
        let opts_ref = &opts;
        pool::run_parallel(&opts.files, opts.procs as usize, |path| {
            run_one_file(path, opts_ref);
        });
    } else {
        for path in &opts.files {
            run_one_file(path, &opts);
        }
    }
}

fn run_one_file(path: &str, opts: &Options) {
    match open(path, OFlag::O_RDONLY, Mode::empty()) {
        Ok(owned) => {
            let fd: RawFd = owned.into_raw_fd();
            chunk_dispatch(fd, path, opts);
            let _ = nix::unistd::close(fd);
        }
        Err(e) => eprintln!("psplit: {}: {}", path, e),
    }
}

fn chunk_dispatch(fd: RawFd, prefix: &str, opts: &Options) {
    let result = if opts.nbytes != DEFAULT_NBYTES {
        chunker::write_bytes(fd, prefix, opts.nbytes as usize, opts.bsize as usize)
    } else if opts.nlines != 0 {
        chunker::write_lines(fd, prefix, opts.nlines as usize, opts.bsize as usize)
    } else {
        chunker::write_bytes(fd, prefix, opts.nbytes as usize, opts.bsize as usize)
    };

    if let Err(e) = result {
        eprintln!("psplit: {}: {}", prefix, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn option_following_an_operand_still_takes_effect() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, b"ABCDEFG").unwrap();

        run(&[input.display().to_string(), "-b".to_string(), "3".to_string()]);

        assert_eq!(fs::read_to_string(format!("{}0", input.display())).unwrap(), "ABC");
        assert_eq!(fs::read_to_string(format!("{}1", input.display())).unwrap(), "DEF");
        assert_eq!(fs::read_to_string(format!("{}2", input.display())).unwrap(), "G");
    }

    #[test]
    fn incompatible_l_and_b_produce_no_output_files() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, b"ABCDEFG").unwrap();

        run(&[
            "-l".to_string(),
            "2".to_string(),
            "-b".to_string(),
            "2".to_string(),
            input.display().to_string(),
        ]);

        assert!(!std::path::Path::new(&format!("{}0", input.display())).exists());
    }

    #[test]
    fn default_byte_mode_splits_file_by_1024() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, b"hello world").unwrap();

        run(&[input.display().to_string()]);

        assert_eq!(
            fs::read_to_string(format!("{}0", input.display())).unwrap(),
            "hello world"
        );
    }

    #[test]
    fn explicit_byte_mode_splits_as_configured() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, b"ABCDEFG").unwrap();

        run(&["-b".to_string(), "3".to_string(), input.display().to_string()]);

        assert_eq!(fs::read_to_string(format!("{}0", input.display())).unwrap(), "ABC");
        assert_eq!(fs::read_to_string(format!("{}1", input.display())).unwrap(), "DEF");
        assert_eq!(fs::read_to_string(format!("{}2", input.display())).unwrap(), "G");
    }

    #[test]
    fn out_of_range_bsize_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        fs::write(&input, b"data").unwrap();

        run(&["-s".to_string(), "0".to_string(), input.display().to_string()]);
        assert!(!std::path::Path::new(&format!("{}0", input.display())).exists());
    }

    #[test]
    fn parallel_mode_processes_every_input() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        fs::write(&a, b"aaa").unwrap();
        fs::write(&b, b"bbb").unwrap();

        run(&[
            "-b".to_string(),
            "3".to_string(),
            "-p".to_string(),
            "2".to_string(),
            a.display().to_string(),
            b.display().to_string(),
        ]);

        assert_eq!(fs::read_to_string(format!("{}0", a.display())).unwrap(), "aaa");
        assert_eq!(fs::read_to_string(format!("{}0", b.display())).unwrap(), "bbb");
    }
}
