use clap::Parser;
use smart_organizer::cli::{Cli, init_logging, run};
use smart_organizer::output::OutputFormatter;
use std::io;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.no_color {
        colored::control::set_override(false);
    }

    OutputFormatter::banner("=== Smart File Organizer ===");

    let stdin = io::stdin();
    let mut input = stdin.lock();

    match run(&cli, &mut input, &mut io::stdout()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            e.report();
            ExitCode::from(e.exit_code())
        }
    }
}
