// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::cache::EntityCache;
use crate::core::entities::BuildId;
use crate::core::errors::NestorError;
use crate::core::grab::{BuildAttribute, GrabFailure, JobAttribute, grab};
use crate::core::locator::{BuildLocator, BuildProber, LocatorSettings, RemoteBuildProber};
use crate::core::models::BuildNumber;
use crate::core::streaming::ConsoleStreamer;
use crate::infra::reporting::console::ConsoleReporter;
use crate::nestor::NestorTask::{
    LaunchJob, ShowBuildStatus, ShowDashboard, ShowExecutors, ShowJob, ShowQueue, ShowVersion, StopJob,
    StreamConsole,
};
use std::time::Duration;

#[derive(Clone, Debug, PartialEq)]
pub enum NestorTask {
    LaunchJob {
        job: String,
        parameters: Option<String>,
        console: bool,
        follow: Option<String>,
        interval: Option<Duration>,
    },
    StreamConsole {
        job: String,
        interval: Option<Duration>,
    },
    StopJob {
        job: String,
    },
    ShowDashboard,
    ShowExecutors,
    ShowJob {
        job: String,
    },
    ShowBuildStatus {
        job: String,
        number: u64,
        console: bool,
        follow: Option<String>,
    },
    ShowQueue,
    ShowVersion,
}

pub struct Nestor {
    cache: EntityCache,
    locator_settings: LocatorSettings,
    console_interval: Duration,
    console_reporter: ConsoleReporter,
}

impl Nestor {
    pub(crate) fn new(
        cache: EntityCache,
        locator_settings: LocatorSettings,
        console_interval: Duration,
        console_reporter: ConsoleReporter,
    ) -> Self {
        Self {
            cache,
            locator_settings,
            console_interval,
            console_reporter,
        }
    }

    pub async fn execute(mut self, task: NestorTask) -> anyhow::Result<()> {
        match task {
            LaunchJob {
                job,
                parameters,
                console,
                follow,
                interval,
            } => self.launch_job(&job, parameters.as_deref(), console, follow, interval).await,
            StreamConsole { job, interval } => {
                let job_id = self.cache.job(&job);
                let build_id = self.cache.last_build(job_id);
                self.stream_console(build_id, interval).await
            },
            StopJob { job } => {
                let job_id = self.cache.job(&job);
                self.cache.stop(job_id).await?;
                self.console_reporter.report_stopped(&job);
                Ok(())
            },
            ShowDashboard => self.show_dashboard().await,
            ShowExecutors => {
                let computers = self.cache.remote().executors().await?;
                self.console_reporter.report_executors(&computers);
                Ok(())
            },
            ShowJob { job } => self.show_job(&job).await,
            ShowBuildStatus {
                job,
                number,
                console,
                follow,
            } => self.show_build_status(&job, number, console, follow).await,
            ShowQueue => {
                let tasks = self.cache.remote().queue().await?;
                self.console_reporter.report_queue(&tasks);
                Ok(())
            },
            ShowVersion => {
                let version = self.cache.remote().version().await?;
                self.console_reporter.report_version(&version);
                Ok(())
            },
        }
    }

    async fn launch_job(
        &mut self,
        job: &str,
        parameters: Option<&str>,
        console: bool,
        follow: Option<String>,
        interval: Option<Duration>,
    ) -> anyhow::Result<()> {
        let job_id = self.cache.job(job);
        let launched = self.cache.launch(job_id, parameters).await?;
        self.console_reporter.report_launched(job);

        if !console {
            return Ok(());
        }

        let mut locator = BuildLocator::new(&launched, follow, self.locator_settings);
        let mut prober = BuildProber::Remote(RemoteBuildProber::new(&mut self.cache, job_id));
        let located = locator.locate(&mut prober).await?;

        let build = self.cache.build_entity(located);
        log::info!(
            "[nestor.locator] located {} as build {} after probing {:?}",
            build,
            build.number(),
            locator.probed_candidates()
        );

        self.console_reporter.report_console_started();
        self.stream_console(located, interval).await
    }

    async fn show_dashboard(&mut self) -> anyhow::Result<()> {
        let mut listing = vec![];

        for job_id in self.cache.dashboard().await? {
            let status = self.cache.job_status(job_id).await?;
            listing.push((self.cache.job_entity(job_id).name().to_string(), status));
        }

        self.console_reporter.report_dashboard(&listing);
        Ok(())
    }

    async fn show_job(&mut self, job: &str) -> anyhow::Result<()> {
        let job_id = self.cache.job(job);
        let grabbed = grab(
            &mut self.cache,
            job_id,
            &[JobAttribute::Status, JobAttribute::HealthReport],
        )
        .await
        .map_err(GrabFailure::into_error)?;

        let status = grabbed
            .get(JobAttribute::Status)
            .and_then(|value| value.as_status())
            .ok_or_else(|| NestorError::JobNotFound(job.to_string()))?;

        let health_reports = grabbed
            .get(JobAttribute::HealthReport)
            .and_then(|value| value.as_health_report())
            .unwrap_or_default();

        let name = self.cache.job_entity(grabbed.origin).name();
        self.console_reporter.report_job(name, status, health_reports);
        Ok(())
    }

    async fn show_build_status(
        &mut self,
        job: &str,
        number: u64,
        console: bool,
        follow: Option<String>,
    ) -> anyhow::Result<()> {
        let job_id = self.cache.job(job);
        let build_id = self.cache.build(job_id, BuildNumber::from(number));

        let grabbed = grab(
            &mut self.cache,
            build_id,
            &[BuildAttribute::Source, BuildAttribute::Children],
        )
        .await
        .map_err(GrabFailure::into_error)?;

        let source = grabbed
            .get(BuildAttribute::Source)
            .and_then(|value| value.as_source())
            .ok_or_else(|| NestorError::BuildNotFound(self.cache.build_entity(build_id).name().to_string()))?;

        self.console_reporter.report_build_status(job, source);

        let children = grabbed
            .get(BuildAttribute::Children)
            .and_then(|value| value.as_children())
            .unwrap_or_default();

        for child in children {
            let (origin, result) = match grab(&mut self.cache, *child, &[BuildAttribute::Result]).await {
                Ok(resolved) => {
                    let result = resolved
                        .get(BuildAttribute::Result)
                        .and_then(|value| value.as_result())
                        .map(|result| result.to_string())
                        .unwrap_or_else(|| "UNKNOWN".to_string());
                    (resolved.origin, result)
                },
                Err(failure) => (failure.partial.origin, "QUEUED".to_string()),
            };

            self.console_reporter
                .report_variant(&result, self.cache.build_entity(origin).name());
        }

        if !console {
            return Ok(());
        }

        let target = match follow {
            None => build_id,
            Some(variant) => self.find_variant(build_id, children, variant)?,
        };

        self.console_reporter.report_console_started();
        self.stream_console(target, None).await
    }

    fn find_variant(&self, build_id: BuildId, children: &[BuildId], variant: String) -> anyhow::Result<BuildId> {
        let found = children
            .iter()
            .copied()
            .find(|child| self.cache.build_entity(*child).variant() == Some(variant.as_str()));

        match found {
            Some(child) => Ok(child),
            None => {
                let build = self.cache.build_entity(build_id).name().to_string();
                Err(NestorError::VariantNotFound { build, variant }.into())
            },
        }
    }

    async fn stream_console(&self, build_id: BuildId, interval: Option<Duration>) -> anyhow::Result<()> {
        let owner = self.cache.job_entity(self.cache.owning_job(build_id));
        log::info!("[nestor.console] streaming {} ({})", self.cache.build_entity(build_id), owner.url());

        let streamer = ConsoleStreamer::new(self.cache.remote(), interval.unwrap_or(self.console_interval));
        let mut line_open = false;
        streamer
            .stream(self.cache.build_entity(build_id), |chunk| {
                if !chunk.is_empty() {
                    line_open = !chunk.ends_with('\n');
                }
                self.console_reporter.report_console_chunk(chunk)
            })
            .await?;

        self.console_reporter.report_console_finished(line_open);
        Ok(())
    }
}
