mod builtins;
mod cli;
mod diagnostics;
mod engine;
mod parser;
mod signals;

use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

use engine::ShellState;
use parser::ParseError;

/// `<username>@<basename-of-cwd>> `, exactly as the source's `get_cmd()`
/// builds it from the password-database entry and `getcwd()`.
fn build_prompt() -> String {
    let user = nix::unistd::User::from_uid(nix::unistd::getuid())
        .ok()
        .flatten()
        .map(|u| u.name)
        .unwrap_or_else(|| "?".to_string());

    let dir = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("?"));
    let base = dir
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());

    format!("{}@{}> ", user, base)
}

fn main() -> rustyline::Result<()> {
    if signals::init().is_err() {
        eprintln!("coresh: failed to install signal handlers");
        std::process::exit(1);
    }

    // Process-wide mutable state: $OLDPWD starts unset.
    unsafe {
        std::env::remove_var("OLDPWD");
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let debug_level = match cli::parse(args) {
        cli::ParseOutcome::PrintHelpAndExit => {
            cli::print_usage();
            return Ok(());
        }
        cli::ParseOutcome::Run(a) => a.debug_level,
    };
    diagnostics::set_level(debug_level);

    let mut rl = DefaultEditor::new()?;
    let mut state = ShellState::new(debug_level);

    loop {
        let prompt = build_prompt();
        match rl.readline(&prompt) {
            Ok(line) => {
                let _ = rl.add_history_entry(line.as_str());
                diagnostics::echo_command(&line);
                run_line(&line, &mut state);
            }
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("coresh: {:?}", err);
                break;
            }
        }
    }

    Ok(())
}

fn run_line(line: &str, state: &mut ShellState) {
    match parser::parse_line(line) {
        Ok(None) => {}
        Ok(Some(cmd)) => engine::execute(&cmd, state),
        Err(ParseError::Syntax(msg)) => eprintln!("coresh: {}", msg),
        Err(ParseError::TooManyArgs) => {
            eprintln!("coresh: too many arguments");
            std::process::exit(1);
        }
    }
}
