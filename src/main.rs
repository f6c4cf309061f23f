use clap::Parser;
use foldertidy::cli::{Cli, run_cli_with_config};
use foldertidy::interactive::run_interactive;
use foldertidy::output::OutputFormatter;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();
    let _log_guard = foldertidy::init_tracing(&cli.log_level, cli.run_log_dir().as_deref());

    let result = if cli.interactive {
        run_interactive(&cli.directory, cli.config.as_deref())
    } else {
        run_cli_with_config(cli.organize_command(), &cli.directory, cli.config.as_deref())
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            OutputFormatter::error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
