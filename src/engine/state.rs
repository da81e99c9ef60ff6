//! Shell-process-wide mutable state that does not belong to the OS
//! environment directly. The current working directory and `$OLDPWD` are
//! tracked through `getcwd`/`chdir`/the environment itself, not duplicated
//! here — see spec §5's "process-wide mutable state" list.

pub struct ShellState {
    pub debug_level: u8,
}

impl ShellState {
    pub fn new(debug_level: u8) -> Self {
        ShellState { debug_level }
    }
}
