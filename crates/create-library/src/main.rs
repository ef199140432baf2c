//! create-library - Build, test, lint and scaffold Boostpack TypeScript libraries

use scripts_core::config::load_host_config;
use scripts_core::{Boostpack, Logger};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Diagnostics filter, e.g. `CREATE_LIBRARY_LOG=debug`
const LOG_ENV: &str = "CREATE_LIBRARY_LOG";

fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> anyhow::Result<i32> {
    let cwd = std::env::current_dir()?;
    let host = load_host_config(&cwd)?;
    scripts_core::run(&Boostpack, host, std::env::args().collect()).await
}

#[tokio::main]
async fn main() -> ExitCode {
    // Ensure terminal cursor is restored on panic
    let default_panic = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = console::Term::stderr().show_cursor();
        default_panic(info);
    }));

    // Handle Ctrl+C gracefully
    ctrlc::set_handler(move || {
        let _ = console::Term::stderr().show_cursor();
        std::process::exit(130);
    })
    .ok();

    init_tracing();

    let code = match run().await {
        Ok(code) => code,
        Err(err) => {
            Logger::new().error(format!("{:#}", err));
            1
        }
    };

    // Ensure cursor is visible on normal exit
    let _ = console::Term::stderr().show_cursor();

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
