//! `bjobs [-k|-h]`: list, or kill, the background-job registry.

use crate::engine::jobs;

pub fn run(args: &[String]) {
    match args.first().map(|s| s.as_str()) {
        Some("-k") => jobs::kill_all(),
        Some("-h") => print_usage(),
        Some(_) => print_usage(),
        None => {
            for pid in jobs::snapshot() {
                println!("[{}]", pid);
            }
        }
    }
}

fn print_usage() {
    println!("usage: bjobs [-k | -h]");
}
