use std::io;
use std::process::ExitCode;

use clap::Parser;
use tm_monitor::cli::Cli;
use tm_monitor::config::MonitorSettings;
use tm_monitor::error::MonitorError;
use tm_monitor::report::Reporter;
use tm_monitor::{logging, pipeline};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let settings = MonitorSettings::from_env();
    let locator = cli.locator();
    let mut reporter = Reporter::new(io::stdout(), io::stderr());

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            let error = MonitorError::Unexpected(format!("start runtime: {e}"));
            reporter.emit_error(&error);
            return ExitCode::from(error.exit_code());
        }
    };

    let code = runtime.block_on(pipeline::run(&settings, &locator, &mut reporter));
    ExitCode::from(code)
}
