// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::cache::EntityCache;
use crate::core::entities::{BuildId, JobId, LaunchedBuild};
use crate::core::errors::NestorError;
use crate::core::grab::{BuildAttribute, GrabFailure, grab};
use crate::core::interfaces::BuildProbe;
use crate::core::models::BuildNumber;
use std::time::Duration;
use tokio::time::sleep;

#[cfg(test)]
use std::collections::VecDeque;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocatorSettings {
    pub settle_interval: Duration,
    pub timeout_budget: Duration,
}

#[derive(Clone, Debug, PartialEq)]
pub enum LocatorState {
    AwaitingWindow,
    Probing { candidate: u64 },
    Matched(BuildId),
    VariantNotFound { build: String, variant: String },
    TimedOut { candidate: u64 },
    Failed { candidate: u64 },
}

/// What a probe learned about one candidate build
#[derive(Clone, Debug, PartialEq)]
pub struct ProbedBuild {
    pub build: BuildId,
    pub name: String,
    pub uuid: Option<String>,
    pub variants: Vec<(String, BuildId)>,
}

pub enum BuildProber<'a> {
    Remote(RemoteBuildProber<'a>),
    #[cfg(test)]
    Scripted(ScriptedBuildProber),
}

impl BuildProbe for BuildProber<'_> {
    async fn probe(&mut self, number: u64) -> anyhow::Result<ProbedBuild> {
        match self {
            BuildProber::Remote(delegate) => delegate.probe(number).await,
            #[cfg(test)]
            BuildProber::Scripted(fake) => fake.probe(number).await,
        }
    }
}

pub struct RemoteBuildProber<'a> {
    cache: &'a mut EntityCache,
    job: JobId,
}

impl<'a> RemoteBuildProber<'a> {
    pub fn new(cache: &'a mut EntityCache, job: JobId) -> Self {
        Self { cache, job }
    }
}

impl BuildProbe for RemoteBuildProber<'_> {
    async fn probe(&mut self, number: u64) -> anyhow::Result<ProbedBuild> {
        // A fresh entity per probe : an earlier failed lookup must not be served from memory
        let build = self.cache.build(self.job, BuildNumber::Exact(number));

        let grabbed = grab(
            &mut *self.cache,
            build,
            &[BuildAttribute::Source, BuildAttribute::Children],
        )
        .await
        .map_err(GrabFailure::into_error)?;

        let uuid = grabbed
            .get(BuildAttribute::Source)
            .and_then(|value| value.as_source())
            .and_then(|source| source.uuid.clone());

        let variants = grabbed
            .get(BuildAttribute::Children)
            .and_then(|value| value.as_children())
            .unwrap_or_default()
            .iter()
            .map(|child| {
                let variant = self.cache.build_entity(*child).variant().unwrap_or_default();
                (variant.to_string(), *child)
            })
            .collect();

        Ok(ProbedBuild {
            build,
            name: self.cache.build_entity(build).name().to_string(),
            uuid,
            variants,
        })
    }
}

/// Finds the build created by a launch, disambiguating concurrent launches by UUID.
///
/// Only one probe is outstanding at any time. The single recoverable condition is
/// the expected build not existing yet, retried within the timeout budget.
pub struct BuildLocator {
    settings: LocatorSettings,
    estimated_number: u64,
    next_number: u64,
    uuid: Option<String>,
    variant: Option<String>,
    remaining_budget: Duration,
    probed: Vec<u64>,
    state: LocatorState,
}

impl BuildLocator {
    pub fn new(launched: &LaunchedBuild, variant: Option<String>, settings: LocatorSettings) -> Self {
        Self {
            settings,
            estimated_number: launched.estimated_number(),
            next_number: launched.next_number,
            uuid: launched.uuid.clone(),
            variant,
            remaining_budget: settings.timeout_budget,
            probed: vec![],
            state: LocatorState::AwaitingWindow,
        }
    }

    pub fn state(&self) -> &LocatorState {
        &self.state
    }

    pub fn probed_candidates(&self) -> &[u64] {
        &self.probed
    }

    pub async fn locate(&mut self, prober: &mut BuildProber<'_>) -> anyhow::Result<BuildId> {
        loop {
            match self.state.clone() {
                LocatorState::AwaitingWindow => {
                    sleep(self.settings.settle_interval).await;
                    self.state = LocatorState::Probing {
                        candidate: self.estimated_number,
                    };
                },
                LocatorState::Probing { candidate } => {
                    self.probed.push(candidate);
                    let outcome = prober.probe(candidate).await;
                    self.state = self.next_state(candidate, outcome).await;
                },
                LocatorState::Matched(build) => return Ok(build),
                LocatorState::VariantNotFound { build, variant } => {
                    return Err(NestorError::VariantNotFound { build, variant }.into());
                },
                LocatorState::TimedOut { candidate } => {
                    return Err(NestorError::LocateTimeout(candidate).into());
                },
                LocatorState::Failed { .. } => {
                    let launch = self.uuid.clone().unwrap_or_else(|| "without UUID".to_string());
                    return Err(NestorError::BuildNotLocated(launch).into());
                },
            }
        }
    }

    async fn next_state(&mut self, candidate: u64, outcome: anyhow::Result<ProbedBuild>) -> LocatorState {
        let probed = match outcome {
            Ok(probed) => probed,
            Err(error) if candidate == self.next_number => {
                log::info!("[nestor.locator] build #{} not available yet ({})", candidate, error);
                self.remaining_budget = self.remaining_budget.saturating_sub(self.settings.settle_interval);

                if self.remaining_budget.is_zero() {
                    return LocatorState::TimedOut { candidate };
                }

                sleep(self.settings.settle_interval).await;
                return LocatorState::Probing { candidate };
            },
            Err(error) => {
                log::info!("[nestor.locator] cannot locate build #{} ({})", candidate, error);
                return LocatorState::Failed { candidate };
            },
        };

        let found = probed.uuid.clone();

        match (found.as_deref(), self.uuid.as_deref()) {
            (Some(found), Some(expected)) if found != expected => {
                log::info!("[nestor.locator] build #{} belongs to launch {}", candidate, found);
                LocatorState::Probing {
                    candidate: candidate + 1,
                }
            },
            (Some(found), Some(_)) => {
                log::info!("[nestor.locator] build #{} has matching UUID ({})", candidate, found);
                self.select_variant(probed)
            },
            _ => {
                log::info!("[nestor.locator] build #{} has no UUID, assuming this is the one", candidate);
                self.select_variant(probed)
            },
        }
    }

    fn select_variant(&self, probed: ProbedBuild) -> LocatorState {
        let Some(requested) = &self.variant else {
            return LocatorState::Matched(probed.build);
        };

        match probed.variants.iter().find(|(variant, _)| variant == requested) {
            Some((_, child)) => LocatorState::Matched(*child),
            None => LocatorState::VariantNotFound {
                build: probed.name,
                variant: requested.clone(),
            },
        }
    }
}

#[cfg(test)]
pub struct ScriptedBuildProber {
    outcomes: VecDeque<Result<ProbedBuild, String>>,
    queried_at: Vec<tokio::time::Instant>,
}

#[cfg(test)]
impl ScriptedBuildProber {
    pub fn new(outcomes: Vec<Result<ProbedBuild, String>>) -> Self {
        Self {
            outcomes: outcomes.into(),
            queried_at: vec![],
        }
    }

    pub fn queried_at(&self) -> &[tokio::time::Instant] {
        &self.queried_at
    }
}

#[cfg(test)]
impl BuildProbe for ScriptedBuildProber {
    async fn probe(&mut self, number: u64) -> anyhow::Result<ProbedBuild> {
        self.queried_at.push(tokio::time::Instant::now());

        match self.outcomes.pop_front() {
            Some(Ok(probed)) => Ok(probed),
            Some(Err(reason)) => anyhow::bail!(reason),
            None => anyhow::bail!("build #{} does not exist", number),
        }
    }
}
