#![deny(warnings)]
#![warn(unused_extern_crates)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::panic)]
#![deny(clippy::unreachable)]
#![deny(clippy::await_holding_lock)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::trivially_copy_pass_by_ref)]
// We allow expect since it forces good error messages at the least.
#![allow(clippy::expect_used)]

use clap::Parser;
use recipes_cli::RecipesClientParser;
use std::process::ExitCode;
use tokio::runtime;
use tokio::signal::unix::{signal, SignalKind};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

async fn signal_handler(opt: RecipesClientParser) -> ExitCode {
    // We need a signal handler so an interrupted request exits cleanly, and
    // to deal with sigpipe on linux.
    let mut signal_int = signal(SignalKind::interrupt()).expect("Invalid Signal");
    let mut signal_quit = signal(SignalKind::quit()).expect("Invalid Signal");
    let mut signal_term = signal(SignalKind::terminate()).expect("Invalid Signal");
    let mut signal_pipe = signal(SignalKind::pipe()).expect("Invalid Signal");

    tokio::select! {
        code = opt.exec() => {
            code
        }
        _ = signal_int.recv() => {
            ExitCode::FAILURE
        }
        _ = signal_quit.recv() => {
            ExitCode::SUCCESS
        }
        _ = signal_term.recv() => {
            ExitCode::SUCCESS
        }
        _ = signal_pipe.recv() => {
            ExitCode::SUCCESS
        }
    }
}

fn main() -> ExitCode {
    let opt = RecipesClientParser::parse();

    let fmt_layer = fmt::layer().with_writer(std::io::stderr);

    let filter_layer = if opt.debug() {
        match EnvFilter::try_new("recipes_client=debug,recipes_cli=debug") {
            Ok(f) => f,
            Err(e) => {
                eprintln!("ERROR! Unable to start tracing {:?}", e);
                return ExitCode::FAILURE;
            }
        }
    } else {
        match EnvFilter::try_from_default_env() {
            Ok(f) => f,
            Err(_) => EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .parse_lossy("recipes_client=warn,recipes_cli=info"),
        }
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt_layer)
        .init();

    let rt = runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to initialise tokio runtime!");

    rt.block_on(signal_handler(opt))
}
