//! The command AST: a tagged-variant tree with six node kinds. Argument and
//! filename text is copied into owned `String`s at parse time rather than
//! kept as (offset, length) views into the input line — the "null-terminate
//! pass" becomes a `Vec<String>` -> `Vec<CString>` conversion done once at
//! `execvp` time (see `engine::exec`).

use nix::fcntl::OFlag;
use nix::sys::stat::Mode;

pub const MAX_ARGS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecCmd {
    pub argv: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectOp {
    In,
    Out,
    Append,
}

impl RedirectOp {
    /// The `(flags, mode, fd)` triple the spec pins down exactly.
    pub fn flags(self) -> OFlag {
        match self {
            RedirectOp::In => OFlag::O_RDONLY,
            RedirectOp::Out => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_TRUNC,
            RedirectOp::Append => OFlag::O_WRONLY | OFlag::O_CREAT | OFlag::O_APPEND,
        }
    }

    pub fn mode(self) -> Mode {
        match self {
            RedirectOp::In => Mode::empty(),
            RedirectOp::Out | RedirectOp::Append => Mode::from_bits_truncate(0o700),
        }
    }

    pub fn target_fd(self) -> i32 {
        match self {
            RedirectOp::In => 0,
            RedirectOp::Out | RedirectOp::Append => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub inner: Box<Cmd>,
    pub file: String,
    pub op: RedirectOp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    Exec(ExecCmd),
    Redirect(Redirect),
    Pipe(Box<Cmd>, Box<Cmd>),
    List(Box<Cmd>, Box<Cmd>),
    Background(Box<Cmd>),
    Subshell(Box<Cmd>),
}

impl Cmd {
    pub fn exec(argv: Vec<String>) -> Cmd {
        Cmd::Exec(ExecCmd { argv })
    }

    pub fn redirect(inner: Cmd, op: RedirectOp, file: String) -> Cmd {
        Cmd::Redirect(Redirect {
            inner: Box::new(inner),
            file,
            op,
        })
    }

    pub fn pipe(left: Cmd, right: Cmd) -> Cmd {
        Cmd::Pipe(Box::new(left), Box::new(right))
    }

    pub fn list(left: Cmd, right: Cmd) -> Cmd {
        Cmd::List(Box::new(left), Box::new(right))
    }

    pub fn background(inner: Cmd) -> Cmd {
        Cmd::Background(Box::new(inner))
    }

    pub fn subshell(inner: Cmd) -> Cmd {
        Cmd::Subshell(Box::new(inner))
    }
}
