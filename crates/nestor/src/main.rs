// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

mod core;
mod infra;
mod ioc;
mod nestor;

use crate::infra::cli;
use crate::infra::reporting::console::ConsoleReporter;
use std::process::ExitCode;
use tikv_jemallocator::Jemalloc;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    cli::troubleshooting::setup_troubleshooting();

    match run().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(incident) => {
            ConsoleReporter::new(console::colors_enabled_stderr()).report_failure(&incident);
            ExitCode::FAILURE
        },
    }
}

async fn run() -> anyhow::Result<()> {
    let (task, invocation) = cli::parsing::parse_arguments()?;

    let nestor = ioc::create_nestor(&invocation);
    nestor.execute(task).await
}
