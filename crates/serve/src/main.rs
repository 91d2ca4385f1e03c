//! `socket-http`: serves `404 Not Found` to every request until killed.

mod config;

use clap::Parser;
use config::Config;
use socket_http::handler::NotFoundHandler;
use std::process::ExitCode;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

fn main() -> ExitCode {
    let config = Config::parse();

    let subscriber = FmtSubscriber::builder().with_max_level(Level::INFO).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    let started = config
        .server_builder()
        .and_then(|builder| builder.handler(NotFoundHandler).build())
        .and_then(|server| server.start());

    match started {
        Ok(handle) => {
            info!(address = %handle.local_addr(), threads = config.threads, "server started");
            handle.join();
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(cause = %e, "failed to start server");
            ExitCode::FAILURE
        }
    }
}
