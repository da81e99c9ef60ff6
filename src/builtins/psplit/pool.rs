//! Bounded worker-process pool for parallel `psplit` invocations: up to
//! `PROCS` inputs are chunked concurrently, with the numerically-smallest
//! in-flight PID reaped first to make room for the next one — a deliberate
//! heuristic (PIDs increase nearly monotonically on Linux) rather than a
//! FIFO, matching the source.

use nix::sys::wait::waitpid;
use nix::unistd::{fork, ForkResult, Pid};

/// Run `work(path)` for every entry in `files`, at most `procs` concurrently.
pub fn run_parallel<F>(files: &[String], procs: usize, work: F)
where
    F: Fn(&str) + Copy,
{
    let mut running: Vec<Option<Pid>> = vec![None; procs];
    let mut next_file = 0usize;
    let mut spawned = 0usize;
    let mut reaped = 0usize;

    while next_file < files.len() {
        while running.iter().any(|s| s.is_none()) && next_file < files.len() {
            let path = files[next_file].clone();
            match unsafe { fork() } {
                Ok(ForkResult::Child) => {
                    work(&path);
                    std::process::exit(0);
                }
                Ok(ForkResult::Parent { child }) => {
                    if let Some(slot) = running.iter_mut().find(|s| s.is_none()) {
                        *slot = Some(child);
                    }
                    next_file += 1;
                    spawned += 1;
                }
                Err(e) => {
                    eprintln!("coresh: psplit: fork: {}", e);
                    return;
                }
            }
        }

        if let Some(oldest) = running.iter().flatten().min().copied() {
            if waitpid(oldest, None).is_ok() {
                if let Some(slot) = running.iter_mut().find(|s| **s == Some(oldest)) {
                    *slot = None;
                }
                reaped += 1;
            }
        }
    }

    for _ in 0..(spawned - reaped) {
        let _ = waitpid(Pid::from_raw(-1), None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn runs_every_input_and_respects_the_pool_bound() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<String> = (0..5)
            .map(|i| dir.path().join(format!("marker{}", i)).display().to_string())
            .collect();

        run_parallel(&files, 2, |path| {
            fs::write(path, b"done").unwrap();
        });

        for path in &files {
            assert_eq!(fs::read(path).unwrap(), b"done");
        }
    }

    #[test]
    fn pool_of_one_still_drains_every_input() {
        let dir = tempfile::tempdir().unwrap();
        let files: Vec<String> = (0..3)
            .map(|i| dir.path().join(format!("seq{}", i)).display().to_string())
            .collect();

        run_parallel(&files, 1, |path| {
            fs::write(path, b"x").unwrap();
        });

        for path in &files {
            assert!(std::path::Path::new(path).exists());
        }
    }
}
