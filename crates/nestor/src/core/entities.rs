// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::models::{BuildNumber, BuildResult, BuildSnapshot, DashboardEntry, JobSnapshot, JobStatus};
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct JobId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BuildId(pub(crate) usize);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildParent {
    Job(JobId),
    Build(BuildId),
}

#[derive(Debug)]
pub struct Job {
    pub(crate) name: String,
    pub(crate) url: String,
    pub(crate) listing: Option<DashboardEntry>,
    pub(crate) snapshot: Option<JobSnapshot>,
    pub(crate) status: Option<JobStatus>,
}

impl Job {
    pub(crate) fn named(server_url: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            url: format!("{}/job/{}/", server_url, name),
            listing: None,
            snapshot: None,
            status: None,
        }
    }

    pub(crate) fn listed(entry: DashboardEntry) -> Self {
        let status = entry.color.as_deref().map(JobStatus::from_color);

        Self {
            name: entry.name.clone(),
            url: entry.url.clone(),
            listing: Some(entry),
            snapshot: None,
            status,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_listed(&self) -> bool {
        self.listing.is_some()
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }
}

#[derive(Debug)]
pub struct Build {
    pub(crate) job: JobId,
    pub(crate) parent: BuildParent,
    pub(crate) number: BuildNumber,
    pub(crate) variant: Option<String>,
    pub(crate) url: String,
    pub(crate) name: String,
    pub(crate) snapshot: Option<BuildSnapshot>,
    pub(crate) result: Option<BuildResult>,
    pub(crate) children: Option<Vec<BuildId>>,
}

impl Build {
    pub(crate) fn top_level(job_id: JobId, job: &Job, number: BuildNumber) -> Self {
        Self {
            job: job_id,
            parent: BuildParent::Job(job_id),
            number,
            variant: None,
            url: format!("{}{}/", job.url, number),
            name: format!("{}#{}", job.name, number),
            snapshot: None,
            result: None,
            children: None,
        }
    }

    pub(crate) fn variant_of(parent_id: BuildId, parent: &Build, job: &Job, variant: String) -> Self {
        Self {
            job: parent.job,
            parent: BuildParent::Build(parent_id),
            number: parent.number,
            url: format!("{}{}/{}/", job.url, variant, parent.number),
            name: format!("{} {}", parent.name, variant),
            variant: Some(variant),
            snapshot: None,
            result: None,
            children: None,
        }
    }

    pub(crate) fn renumber(&mut self, number: u64, job: &Job) {
        self.number = BuildNumber::Exact(number);

        if let BuildParent::Job(_) = self.parent {
            self.name = format!("{}#{}", job.name, self.number);
        }
    }

    pub fn number(&self) -> BuildNumber {
        self.number
    }

    pub fn variant(&self) -> Option<&str> {
        self.variant.as_deref()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_loaded(&self) -> bool {
        self.snapshot.is_some()
    }
}

impl Display for Build {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Outcome of a successful launch : a pending build plus what is needed to locate it later
#[derive(Clone, Debug, PartialEq)]
pub struct LaunchedBuild {
    pub build: BuildId,
    pub next_number: u64,
    pub last_completed: u64,
    pub uuid: Option<String>,
}

impl LaunchedBuild {
    pub fn estimated_number(&self) -> u64 {
        self.last_completed + 1
    }
}
