//! `cwd`: print the current working directory. `getcwd` failure is fatal —
//! it means the working directory has been removed out from under the
//! shell, an unrecoverable invariant violation per the error-handling
//! policy for syscall failures.

pub fn run() {
    match std::env::current_dir() {
        Ok(path) => println!("cwd: {}", path.display()),
        Err(e) => {
            eprintln!("coresh: getcwd: {}", e);
            std::process::exit(1);
        }
    }
}
