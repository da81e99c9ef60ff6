//! `cd [path]`: three behaviors in priority order (no argument, `-`, other
//! argument). `chdir` failures are treated as ordinary user errors here
//! (non-fatal, message and continue) rather than the source's inconsistent
//! mix of fatal/non-fatal across the three branches — `chdir` is not in the
//! set of syscalls the error-handling design marks fatal.

use std::env;

pub fn run(args: &[String]) {
    if args.len() > 1 {
        println!("cd: Demasiados argumentos");
        return;
    }

    let prior = match env::current_dir() {
        Ok(p) => p,
        Err(e) => {
            eprintln!("coresh: cd: {}", e);
            return;
        }
    };

    match args.first().map(|s| s.as_str()) {
        None => {
            let Ok(home) = env::var("HOME") else {
                return;
            };
            if let Err(e) = env::set_current_dir(&home) {
                eprintln!("coresh: cd: {}: {}", home, e);
            }
            set_oldpwd(&prior);
        }
        Some("-") => {
            let Ok(oldpwd) = env::var("OLDPWD") else {
                println!("cd: OLDPWD not set");
                return;
            };
            if let Err(e) = env::set_current_dir(&oldpwd) {
                eprintln!("coresh: cd: {}: {}", oldpwd, e);
            }
            set_oldpwd(&prior);
        }
        Some(path) => {
            if let Err(e) = env::set_current_dir(path) {
                eprintln!("coresh: cd: {}: {}", path, e);
            }
            set_oldpwd(&prior);
        }
    }
}

fn set_oldpwd(prior: &std::path::Path) {
    unsafe {
        env::set_var("OLDPWD", prior);
    }
}
