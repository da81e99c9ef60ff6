//! Opens the target file for a `Redirect` node using the exact
//! `(flags, mode, fd)` triple the AST node carries.

use std::os::fd::OwnedFd;

use nix::fcntl::open;

use crate::parser::Redirect;

/// Open `redirect.file` with its op's flags/mode, returning the owned fd to
/// `dup2` onto `redirect.op.target_fd()`.
pub fn open_target(redirect: &Redirect) -> nix::Result<OwnedFd> {
    open(redirect.file.as_str(), redirect.op.flags(), redirect.op.mode())
}
