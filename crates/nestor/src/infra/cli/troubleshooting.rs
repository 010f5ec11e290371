// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use env_logger::Target;
use log::LevelFilter;

pub static LOGGING_ENV_VARIABLE: &str = "RUST_LOG";

pub fn setup_troubleshooting() {
    better_panic::Settings::auto().most_recent_first(false).install();
    human_panic::setup_panic!();

    // Console chunks go to stdout, so diagnostics stay on stderr
    env_logger::Builder::new()
        .filter_level(LevelFilter::Warn)
        .parse_env(LOGGING_ENV_VARIABLE)
        .target(Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_level(false)
        .format_file(false)
        .format_target(false)
        .init();
}
