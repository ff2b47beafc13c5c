use anyhow::Result;

use matchplay_scoring::cli::Command;
use matchplay_scoring::{
    handle_completions, handle_list, handle_migrate, handle_scoreboard, handle_serve_docs,
    interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(command)
}

fn execute_command(command: Command) -> Result<()> {
    match command {
        Command::ServeDocs { port, database } => handle_serve_docs(port, database),
        Command::List => handle_list(),
        Command::Scoreboard { id } => handle_scoreboard(&id),
        Command::Migrate {
            data_dir,
            remote_url,
        } => handle_migrate(data_dir, remote_url),
        Command::Completions { shell } => handle_completions(shell),
    }
}
