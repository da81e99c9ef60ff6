//! Tree-walking executor: maps each AST node to POSIX process creation,
//! file-descriptor plumbing, and waiting. Built on raw `fork`/`waitpid` from
//! `nix` plus `libc::{dup2,close,pipe}` directly — `nix`'s fd-ownership
//! wrappers for those don't play well across a `fork` boundary, so this
//! follows the same path the rest of the ecosystem takes there.

use std::ffi::CString;
use std::os::fd::IntoRawFd;

use nix::sys::wait::waitpid;
use nix::unistd::{execvp, fork, ForkResult, Pid};

use crate::builtins;
use crate::diagnostics;
use crate::engine::jobs;
use crate::engine::redirect;
use crate::engine::state::ShellState;
use crate::parser::{Cmd, ExecCmd, Redirect};
use crate::signals;

fn fatal(context: &str, err: impl std::fmt::Display) -> ! {
    eprintln!("coresh: {}: {}", context, err);
    std::process::exit(1);
}

fn to_cstrings(argv: &[String]) -> Vec<CString> {
    argv.iter()
        .map(|s| CString::new(s.as_str()).unwrap_or_default())
        .collect()
}

/// Replace the current process image, searching `$PATH` via `execvp`
/// exactly as the C source does. Never returns on success.
fn exec_external(argv: &[String]) -> ! {
    if argv.is_empty() || argv[0].is_empty() {
        std::process::exit(0);
    }
    let cargs = to_cstrings(argv);
    match execvp(&cargs[0], &cargs) {
        Ok(_) => unreachable!("execvp does not return on success"),
        Err(e) => {
            eprintln!("coresh: {}: {}", argv[0], e);
            std::process::exit(127);
        }
    }
}

fn wait_one(pid: Pid) {
    if let Err(e) = waitpid(pid, None) {
        fatal("waitpid", e);
    }
}

/// Entry point used by the main loop for a freshly parsed command tree.
pub fn execute(cmd: &Cmd, state: &mut ShellState) {
    run_tree(cmd, state);
}

fn run_in_child(cmd: &Cmd, state: &mut ShellState) -> ! {
    run_tree(cmd, state);
    std::process::exit(0);
}

fn run_tree(cmd: &Cmd, state: &mut ShellState) {
    match cmd {
        Cmd::Exec(e) => run_exec(e, state),
        Cmd::Redirect(r) => run_redirect(r, state),
        Cmd::Pipe(l, r) => run_pipe(l, r, state),
        Cmd::List(l, r) => run_list(l, r, state),
        Cmd::Background(inner) => run_background(inner, state),
        Cmd::Subshell(inner) => run_subshell(inner, state),
    }
}

fn run_exec(e: &ExecCmd, state: &mut ShellState) {
    if e.argv.is_empty() || e.argv[0].is_empty() {
        return;
    }

    if builtins::is_builtin(&e.argv[0]) {
        diagnostics::trace(&format!("builtin: {}", e.argv.join(" ")));
        builtins::dispatch(&e.argv[0], &e.argv, state);
        return;
    }

    diagnostics::trace(&format!("exec: {}", e.argv.join(" ")));
    match unsafe { fork() } {
        Ok(ForkResult::Child) => exec_external(&e.argv),
        Ok(ForkResult::Parent { child }) => wait_one(child),
        Err(err) => fatal("fork", err),
    }
}

fn run_list(left: &Cmd, right: &Cmd, state: &mut ShellState) {
    run_tree(left, state);
    run_tree(right, state);
}

fn run_redirect(r: &Redirect, state: &mut ShellState) {
    if let Cmd::Exec(e) = r.inner.as_ref() {
        if !e.argv.is_empty() && builtins::is_builtin(&e.argv[0]) {
            run_redirect_builtin_inplace(r, e, state);
            return;
        }
    }

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            apply_redirect_or_die(r);
            match r.inner.as_ref() {
                Cmd::Exec(e) => exec_external(&e.argv),
                other => run_in_child(other, state),
            }
        }
        Ok(ForkResult::Parent { child }) => wait_one(child),
        Err(err) => fatal("fork", err),
    }
}

/// Close the target descriptor and open the file in its place. POSIX's
/// lowest-available-fd rule means `open` ordinarily lands right back on
/// the descriptor we just closed; `dup2` is a fallback for when it doesn't.
fn apply_redirect_or_die(r: &Redirect) {
    let target_fd = r.op.target_fd();
    unsafe {
        libc::close(target_fd);
    }
    match redirect::open_target(r) {
        Ok(owned) => {
            let fd = owned.into_raw_fd();
            if fd != target_fd {
                unsafe {
                    if libc::dup2(fd, target_fd) < 0 {
                        fatal("dup2", std::io::Error::last_os_error());
                    }
                    libc::close(fd);
                }
            }
        }
        Err(e) => fatal(&r.file, e),
    }
}

fn run_redirect_builtin_inplace(r: &Redirect, e: &ExecCmd, state: &mut ShellState) {
    let target_fd = r.op.target_fd();
    let saved_fd = unsafe { libc::dup(target_fd) };
    if saved_fd < 0 {
        fatal("dup", std::io::Error::last_os_error());
    }

    match redirect::open_target(r) {
        Ok(owned) => {
            let fd = owned.into_raw_fd();
            unsafe {
                if libc::dup2(fd, target_fd) < 0 {
                    fatal("dup2", std::io::Error::last_os_error());
                }
                libc::close(fd);
            }

            builtins::dispatch(&e.argv[0], &e.argv, state);

            unsafe {
                libc::dup2(saved_fd, target_fd);
                libc::close(saved_fd);
            }
        }
        Err(err) => {
            unsafe {
                libc::close(saved_fd);
            }
            eprintln!("coresh: {}: {}", r.file, err);
        }
    }
}

fn run_pipe(left: &Cmd, right: &Cmd, state: &mut ShellState) {
    let mut fds = [0i32; 2];
    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        fatal("pipe", std::io::Error::last_os_error());
    }
    let (read_fd, write_fd) = (fds[0], fds[1]);

    let prev = signals::block_sigchld().unwrap_or_else(|e| fatal("sigprocmask", e));

    let left_pid = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            unsafe {
                libc::close(read_fd);
                if write_fd != 1 {
                    libc::dup2(write_fd, 1);
                    libc::close(write_fd);
                }
            }
            run_in_child(left, state);
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(err) => fatal("fork", err),
    };

    let right_pid = match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            unsafe {
                libc::close(write_fd);
                if read_fd != 0 {
                    libc::dup2(read_fd, 0);
                    libc::close(read_fd);
                }
            }
            run_in_child(right, state);
        }
        Ok(ForkResult::Parent { child }) => child,
        Err(err) => fatal("fork", err),
    };

    unsafe {
        libc::close(read_fd);
        libc::close(write_fd);
    }

    wait_one(left_pid);
    wait_one(right_pid);

    signals::restore_mask(&prev).unwrap_or_else(|e| fatal("sigprocmask", e));
}

fn run_background(inner: &Cmd, state: &mut ShellState) {
    let prev = signals::block_sigchld().unwrap_or_else(|e| fatal("sigprocmask", e));

    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            signals::restore_mask(&prev).unwrap_or_else(|e| fatal("sigprocmask", e));
            run_in_child(inner, state);
        }
        Ok(ForkResult::Parent { child }) => {
            println!("[{}]", child.as_raw());
            let _ = signals::block_all().unwrap_or_else(|e| fatal("sigprocmask", e));
            jobs::insert(child.as_raw());
            signals::restore_mask(&prev).unwrap_or_else(|e| fatal("sigprocmask", e));
        }
        Err(err) => fatal("fork", err),
    }
}

fn run_subshell(inner: &Cmd, state: &mut ShellState) {
    match unsafe { fork() } {
        Ok(ForkResult::Child) => run_in_child(inner, state),
        Ok(ForkResult::Parent { child }) => wait_one(child),
        Err(err) => fatal("fork", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_line;
    use std::fs;

    fn run(line: &str) {
        let mut state = ShellState::new(0);
        let cmd = parse_line(line).unwrap().unwrap();
        execute(&cmd, &mut state);
    }

    #[test]
    fn redirect_creates_and_truncates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        run(&format!("echo hello > {}", path.display()));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hello\n");
    }

    #[test]
    fn append_redirect_does_not_truncate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "first\n").unwrap();
        run(&format!("echo second >> {}", path.display()));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }

    #[test]
    fn pipeline_connects_stdout_to_stdin() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        run(&format!("echo hi | cat > {}", path.display()));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "hi\n");
    }

    #[test]
    fn subshell_runs_its_list_in_a_forked_child() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.txt");
        run(&format!("(echo a ; echo b) > {}", path.display()));
        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "a\nb\n");
    }

    #[test]
    fn background_command_returns_immediately_and_registers_pid() {
        let mut state = ShellState::new(0);
        let cmd = parse_line("true &").unwrap().unwrap();
        execute(&cmd, &mut state);

        let snapshot = jobs::snapshot();
        assert_eq!(snapshot.len(), 1);

        // The SIGCHLD reaper isn't installed under `cargo test`; reap
        // directly so the process doesn't leave a zombie behind.
        let _ = waitpid(Pid::from_raw(snapshot[0]), None);
    }

    #[test]
    fn cd_then_cwd_reports_new_directory() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = fs::canonicalize(dir.path()).unwrap();
        let original = std::env::current_dir().unwrap();

        run(&format!("cd {}", canonical.display()));
        assert_eq!(std::env::current_dir().unwrap(), canonical);

        std::env::set_current_dir(original).unwrap();
    }
}
