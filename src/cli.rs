//! Hand-rolled parsing of the shell's own arguments: `-d <level>` and `-h`.
//! Out of scope per the core spec (an external collaborator), kept minimal
//! and dependency-free like the original `getopt(argc, argv, "d:h")` loop.

pub struct Args {
    pub debug_level: u8,
}

pub enum ParseOutcome {
    Run(Args),
    PrintHelpAndExit,
}

pub fn parse<I: IntoIterator<Item = String>>(args: I) -> ParseOutcome {
    let mut debug_level = 0u8;
    let mut iter = args.into_iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "-h" => return ParseOutcome::PrintHelpAndExit,
            "-d" => {
                if let Some(value) = iter.next() {
                    debug_level = value.parse().unwrap_or(0);
                }
            }
            _ => {}
        }
    }

    ParseOutcome::Run(Args { debug_level })
}

pub fn print_usage() {
    println!("usage: coresh [-d level] [-h]");
}
