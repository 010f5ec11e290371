// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::entities::{Build, BuildId, BuildParent, Job, JobId, LaunchedBuild};
use crate::core::errors::NestorError;
use crate::core::models::{
    BuildNumber, BuildResult, BuildSnapshot, DashboardEntry, DashboardSnapshot, JobSnapshot, JobStatus,
    LaunchSnapshot, MatrixRun,
};
use crate::infra::networking::jenkins::{JenkinsClient, RemoteRequest};
use reqwest::StatusCode;
use reqwest::header::ACCEPT;

pub static LAUNCH_TOKEN: &str = "nestor";

/// Owns every Job and Build known to this process.
///
/// Each entity is fetched at most once; derived fields are computed when the
/// snapshot arrives and served from memory afterwards. There is no invalidation :
/// fresh data requires a fresh entity.
pub struct EntityCache {
    remote: JenkinsClient,
    jobs: Vec<Job>,
    builds: Vec<Build>,
}

impl EntityCache {
    pub fn new(remote: JenkinsClient) -> Self {
        Self {
            remote,
            jobs: vec![],
            builds: vec![],
        }
    }

    pub fn remote(&self) -> &JenkinsClient {
        &self.remote
    }

    pub fn job(&mut self, name: &str) -> JobId {
        let job = Job::named(self.remote.base_url(), name);
        log::info!("[nestor.cache] job {}", job.url);
        self.jobs.push(job);
        JobId(self.jobs.len() - 1)
    }

    pub fn listed_job(&mut self, entry: DashboardEntry) -> JobId {
        let job = Job::listed(entry);
        log::info!("[nestor.cache] listed job {}", job.url);
        self.jobs.push(job);
        JobId(self.jobs.len() - 1)
    }

    pub fn build(&mut self, job_id: JobId, number: BuildNumber) -> BuildId {
        let build = Build::top_level(job_id, &self.jobs[job_id.0], number);
        log::info!("[nestor.cache] build {}", build.url);
        self.builds.push(build);
        BuildId(self.builds.len() - 1)
    }

    pub fn last_build(&mut self, job_id: JobId) -> BuildId {
        self.build(job_id, BuildNumber::Latest)
    }

    pub fn job_entity(&self, job_id: JobId) -> &Job {
        &self.jobs[job_id.0]
    }

    pub fn build_entity(&self, build_id: BuildId) -> &Build {
        &self.builds[build_id.0]
    }

    pub async fn load_job(&mut self, job_id: JobId) -> anyhow::Result<JobId> {
        if self.jobs[job_id.0].is_loaded() {
            return Ok(job_id);
        }

        let job = &self.jobs[job_id.0];

        let request = RemoteRequest::get(format!("{}api/json", job.url))
            .reject(StatusCode::NOT_FOUND, NestorError::JobNotFound(job.name.clone()));

        let snapshot = self.remote.execute(&request).await?.json::<JobSnapshot>()?;

        let job = &mut self.jobs[job_id.0];
        if job.status.is_none() {
            let color = snapshot.color.as_deref().unwrap_or("notbuilt");
            job.status = Some(JobStatus::from_color(color));
        }
        job.snapshot = Some(snapshot);

        log::info!("[nestor.cache] loaded {} (listed = {})", job.url, job.is_listed());
        Ok(job_id)
    }

    pub async fn job_status(&mut self, job_id: JobId) -> anyhow::Result<JobStatus> {
        if let Some(status) = &self.jobs[job_id.0].status {
            return Ok(status.clone());
        }

        self.load_job(job_id).await?;
        self.cached_job_status(job_id)
    }

    pub async fn job_health_report(&mut self, job_id: JobId) -> anyhow::Result<Vec<String>> {
        if !self.jobs[job_id.0].is_loaded() {
            self.load_job(job_id).await?;
        }

        let reports = self.jobs[job_id.0]
            .snapshot
            .iter()
            .flat_map(|snapshot| snapshot.health_report.iter())
            .map(|report| report.description.clone())
            .collect();

        Ok(reports)
    }

    pub async fn load_build(&mut self, build_id: BuildId) -> anyhow::Result<BuildId> {
        if self.builds[build_id.0].is_loaded() {
            return Ok(build_id);
        }

        let build = &self.builds[build_id.0];

        let request = RemoteRequest::get(format!("{}api/json", build.url))
            .reject(StatusCode::NOT_FOUND, NestorError::BuildNotFound(build.name.clone()));

        let snapshot = self.remote.execute(&request).await?.json::<BuildSnapshot>()?;

        let job_id = self.builds[build_id.0].job;
        let build = &mut self.builds[build_id.0];
        build.renumber(snapshot.number, &self.jobs[job_id.0]);
        build.url = snapshot.url.clone();
        build.result = Some(snapshot.derived_result());

        let variants = snapshot
            .runs
            .iter()
            .filter_map(|run| variant_for_run(&snapshot, run))
            .collect::<Vec<_>>();

        build.snapshot = Some(snapshot);
        log::info!("[nestor.cache] loaded {}", build.url);

        let children = variants
            .into_iter()
            .map(|variant| {
                let child = Build::variant_of(
                    build_id,
                    &self.builds[build_id.0],
                    &self.jobs[job_id.0],
                    variant,
                );
                log::info!("[nestor.cache] variant build {}", child.url);
                self.builds.push(child);
                BuildId(self.builds.len() - 1)
            })
            .collect();

        self.builds[build_id.0].children = Some(children);
        Ok(build_id)
    }

    pub async fn build_source(&mut self, build_id: BuildId) -> anyhow::Result<BuildSnapshot> {
        if let Some(snapshot) = &self.builds[build_id.0].snapshot {
            return Ok(snapshot.clone());
        }

        self.load_build(build_id).await?;
        self.builds[build_id.0]
            .snapshot
            .clone()
            .ok_or_else(|| NestorError::BuildNotFound(self.builds[build_id.0].name.clone()).into())
    }

    pub async fn build_result(&mut self, build_id: BuildId) -> anyhow::Result<BuildResult> {
        if let Some(result) = &self.builds[build_id.0].result {
            return Ok(result.clone());
        }

        self.load_build(build_id).await?;
        Ok(self.builds[build_id.0].result.clone().unwrap_or(BuildResult::Unknown))
    }

    pub async fn build_children(&mut self, build_id: BuildId) -> anyhow::Result<Vec<BuildId>> {
        if let Some(children) = &self.builds[build_id.0].children {
            return Ok(children.clone());
        }

        self.load_build(build_id).await?;
        Ok(self.builds[build_id.0].children.clone().unwrap_or_default())
    }

    /// Resolves the owning job by walking parent links
    pub fn owning_job(&self, build_id: BuildId) -> JobId {
        match self.builds[build_id.0].parent {
            BuildParent::Job(job_id) => job_id,
            BuildParent::Build(parent_id) => self.owning_job(parent_id),
        }
    }

    pub async fn dashboard(&mut self) -> anyhow::Result<Vec<JobId>> {
        let request = RemoteRequest::get(format!("{}/api/json", self.remote.base_url()));
        let snapshot = self.remote.execute(&request).await?.json::<DashboardSnapshot>()?;

        let jobs = snapshot
            .jobs
            .into_iter()
            .map(|entry| self.listed_job(entry))
            .collect();

        Ok(jobs)
    }

    pub async fn launch(&mut self, job_id: JobId, parameters: Option<&str>) -> anyhow::Result<LaunchedBuild> {
        let job = &self.jobs[job_id.0];
        let name = job.name.clone();

        let request = match parameters {
            None => RemoteRequest::get(format!("{}build", job.url)),
            Some(_) => RemoteRequest::post(format!("{}buildWithParameters", job.url)),
        };

        let request = request
            .query("token", LAUNCH_TOKEN)
            .query("json", launch_parameters(parameters))
            .header(ACCEPT, "application/json")
            .accept(StatusCode::OK)
            .accept(StatusCode::FOUND)
            .reject(StatusCode::NOT_FOUND, NestorError::JobNotFound(name.clone()))
            .reject(
                StatusCode::METHOD_NOT_ALLOWED,
                NestorError::ParametersRequired(name.clone()),
            );

        let snapshot = self.remote.execute(&request).await?.json::<LaunchSnapshot>()?;

        let uuid = match snapshot.scheduled_item {
            None => None,
            Some(None) => return Err(NestorError::AlreadyScheduled(name).into()),
            Some(Some(item)) => item.uuid,
        };

        let build = self.build(job_id, BuildNumber::from(snapshot.next_build_number));
        let last_completed = snapshot
            .last_completed_build
            .map(|reference| reference.number)
            .unwrap_or_default();

        log::info!(
            "[nestor.cache] launched {} (next = {}, last completed = {})",
            name,
            snapshot.next_build_number,
            last_completed
        );

        Ok(LaunchedBuild {
            build,
            next_number: snapshot.next_build_number,
            last_completed,
            uuid,
        })
    }

    pub async fn stop(&mut self, job_id: JobId) -> anyhow::Result<()> {
        let job = &self.jobs[job_id.0];

        let request = RemoteRequest::get(format!("{}lastBuild/stop", job.url))
            .reject(StatusCode::NOT_FOUND, NestorError::JobNotFound(job.name.clone()));

        self.remote.execute(&request).await?;
        Ok(())
    }

    fn cached_job_status(&self, job_id: JobId) -> anyhow::Result<JobStatus> {
        let job = &self.jobs[job_id.0];
        job.status
            .clone()
            .ok_or_else(|| NestorError::JobNotFound(job.name.clone()).into())
    }
}

fn launch_parameters(parameters: Option<&str>) -> String {
    let parameter = parameters
        .unwrap_or_default()
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
            serde_json::json!({ "name": name, "value": value })
        })
        .collect::<Vec<_>>();

    serde_json::json!({ "parameter": parameter }).to_string()
}

/// Matrix runs live under `<job url><variant>/<number>/`
fn variant_for_run(parent: &BuildSnapshot, run: &MatrixRun) -> Option<String> {
    let number_segment = format!("{}/", parent.number);
    let from_parent_url = parent
        .url
        .strip_suffix(&number_segment)
        .and_then(|job_url| run.url.strip_prefix(job_url))
        .and_then(|suffix| suffix.split('/').next())
        .filter(|variant| !variant.is_empty());

    let variant = from_parent_url.or_else(|| {
        let mut segments = run.url.trim_end_matches('/').rsplit('/');
        segments.next();
        segments.next().filter(|variant| !variant.is_empty())
    });

    if variant.is_none() {
        log::warn!("[nestor.cache] cannot extract variant from {}", run.url);
    }

    variant.map(str::to_string)
}
