use std::process::ExitCode;

use clap::Parser;
use crossterm::terminal;

use arbor_shell::{AppState, Cli, CliDriver, Size, shell_config};

fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut app = AppState::from_cli(&cli);
    if let Some(address) = cli.address.as_deref() {
        app.apply_address(address);
    }

    let config = shell_config(&cli, app.logger.clone());
    let (width, height) = terminal::size().unwrap_or((80, 24));
    let runtime = match app.build_runtime(config, Size::new(width, height)) {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("arbor: {err}");
            return ExitCode::FAILURE;
        }
    };

    let result = CliDriver::new(runtime).run();
    app.unsubscribe();
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("arbor: {err}");
            ExitCode::FAILURE
        }
    }
}
