//! Signal discipline for the shell process.
//!
//! Unlike a naive port, forked children here do *not* get their dispositions
//! reset to `SigDfl` before `execvp`: SIGINT stays blocked and SIGQUIT stays
//! ignored across `fork`+`exec`, and children inherit both. A child that
//! wants SIGINT back is free to unblock it itself; the shell makes no
//! promise beyond default POSIX inheritance. The one spot that does restore
//! a saved mask is the executor's Background case, and it restores the
//! shell's own prior mask, not `SigDfl`.

use nix::sys::signal::{
    sigaction, sigprocmask, SaFlags, SigAction, SigHandler, SigSet, SigmaskHow, Signal,
};

use crate::engine::jobs;

/// Install the SIGCHLD reaper, block SIGINT, and ignore SIGQUIT. Called once
/// at startup, before the first prompt.
pub fn init() -> nix::Result<()> {
    install_sigchld_reaper()?;
    block_sigint()?;
    ignore_sigquit()?;
    Ok(())
}

fn install_sigchld_reaper() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(jobs::handle_sigchld),
        SaFlags::SA_RESTART | SaFlags::SA_NOCLDSTOP,
        SigSet::empty(),
    );
    unsafe { sigaction(Signal::SIGCHLD, &action) }?;
    Ok(())
}

fn block_sigint() -> nix::Result<()> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGINT);
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), None)
}

fn ignore_sigquit() -> nix::Result<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::empty(), SigSet::empty());
    unsafe { sigaction(Signal::SIGQUIT, &action) }?;
    Ok(())
}

/// Block only SIGCHLD, returning the previous mask so it can be restored.
pub fn block_sigchld() -> nix::Result<SigSet> {
    let mut set = SigSet::empty();
    set.add(Signal::SIGCHLD);
    let mut prev = SigSet::empty();
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), Some(&mut prev))?;
    Ok(prev)
}

/// Block every signal, returning the previous mask.
pub fn block_all() -> nix::Result<SigSet> {
    let set = SigSet::all();
    let mut prev = SigSet::empty();
    sigprocmask(SigmaskHow::SIG_BLOCK, Some(&set), Some(&mut prev))?;
    Ok(prev)
}

/// Restore a previously saved mask.
pub fn restore_mask(prev: &SigSet) -> nix::Result<()> {
    sigprocmask(SigmaskHow::SIG_SETMASK, Some(prev), None)
}
