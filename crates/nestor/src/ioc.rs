// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::cache::EntityCache;
use crate::core::locator::LocatorSettings;
use crate::infra::cli::parsing::Invocation;
use crate::infra::networking::http::HTTP_CLIENT;
use crate::infra::networking::jenkins::JenkinsClient;
use crate::infra::reporting::console::ConsoleReporter;
use crate::nestor::Nestor;
use std::time::Duration;

pub static MILLIS_TO_SETTLE_AFTER_LAUNCH: u64 = 2000;
pub static MILLIS_TO_LOCATE_LAUNCHED_BUILD: u64 = 10000;
pub static MILLIS_BETWEEN_CONSOLE_POLLS: u64 = 1000;

fn jenkins_client(server_url: &str) -> JenkinsClient {
    JenkinsClient::new(server_url.to_string(), HTTP_CLIENT.clone())
}

fn locator_settings() -> LocatorSettings {
    LocatorSettings {
        settle_interval: Duration::from_millis(MILLIS_TO_SETTLE_AFTER_LAUNCH),
        timeout_budget: Duration::from_millis(MILLIS_TO_LOCATE_LAUNCHED_BUILD),
    }
}

pub fn create_nestor(invocation: &Invocation) -> Nestor {
    let cache = EntityCache::new(jenkins_client(&invocation.server_url));
    let console_interval = Duration::from_millis(MILLIS_BETWEEN_CONSOLE_POLLS);
    let console_reporter = ConsoleReporter::new(invocation.use_colors);
    Nestor::new(cache, locator_settings(), console_interval, console_reporter)
}
