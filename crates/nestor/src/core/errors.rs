// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum NestorError {
    #[error("Job {0} does not exist")]
    JobNotFound(String),

    #[error("Build {0} does not exist")]
    BuildNotFound(String),

    #[error("Jenkins requires authentication - set username and password in JENKINS_URL")]
    AuthRequired,

    #[error("Authentication failed - incorrect username and/or password in JENKINS_URL")]
    AuthFailed,

    #[error("Job {0} requires build parameters")]
    ParametersRequired(String),

    #[error("Job {0} was already scheduled")]
    AlreadyScheduled(String),

    #[error("Variant {variant} does not exist for build {build}")]
    VariantNotFound { build: String, variant: String },

    #[error("Timeout has expired, build #{0} still does not exist")]
    LocateTimeout(u64),

    #[error("Unable to find a build matching launch {0}")]
    BuildNotLocated(String),

    #[error("Not a Jenkins server")]
    NotJenkins,

    #[error("nestor.remote : {0}")]
    Transport(String),
}

impl NestorError {
    pub fn transport(cause: impl std::fmt::Display) -> Self {
        Self::Transport(cause.to_string())
    }
}
