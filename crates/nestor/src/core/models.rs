// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Deserializer};
use std::fmt::{Display, Formatter};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum JobStatus {
    Ok,
    Aborted,
    Fail,
    Warn,
    Other(String),
}

impl JobStatus {
    /// Jenkins reports job status as a ball color, suffixed with `_anime` while a build runs
    pub fn from_color(color: &str) -> Self {
        let color = color.replace("_anime", "");

        match color.as_str() {
            "blue" | "green" => JobStatus::Ok,
            "grey" => JobStatus::Aborted,
            "red" => JobStatus::Fail,
            "yellow" => JobStatus::Warn,
            other => JobStatus::Other(other.to_uppercase()),
        }
    }
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Ok => f.write_str("OK"),
            JobStatus::Aborted => f.write_str("ABORTED"),
            JobStatus::Fail => f.write_str("FAIL"),
            JobStatus::Warn => f.write_str("WARN"),
            JobStatus::Other(token) => f.write_str(token),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildNumber {
    Latest,
    Exact(u64),
}

impl From<u64> for BuildNumber {
    fn from(value: u64) -> Self {
        match value {
            0 => BuildNumber::Latest,
            number => BuildNumber::Exact(number),
        }
    }
}

impl Display for BuildNumber {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildNumber::Latest => f.write_str("lastBuild"),
            BuildNumber::Exact(number) => f.write_fmt(format_args!("{}", number)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BuildResult {
    Success,
    Unstable,
    Failure,
    NotBuilt,
    Aborted,
    #[serde(skip)]
    InProgress,
    #[serde(other)]
    Unknown,
}

impl Display for BuildResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            BuildResult::Success => "SUCCESS",
            BuildResult::Unstable => "UNSTABLE",
            BuildResult::Failure => "FAILURE",
            BuildResult::NotBuilt => "NOT_BUILT",
            BuildResult::Aborted => "ABORTED",
            BuildResult::InProgress => "IN PROGRESS",
            BuildResult::Unknown => "UNKNOWN",
        };

        f.write_str(token)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct HealthReport {
    pub description: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSnapshot {
    pub color: Option<String>,
    #[serde(default)]
    pub health_report: Vec<HealthReport>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct DashboardEntry {
    pub name: String,
    pub url: String,
    pub color: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardSnapshot {
    #[serde(default)]
    pub jobs: Vec<DashboardEntry>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BuildParameter {
    pub name: String,
    pub value: Option<serde_json::Value>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct BuildAction {
    #[serde(default)]
    pub parameters: Vec<BuildParameter>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MatrixRun {
    pub url: String,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildSnapshot {
    pub number: u64,
    pub url: String,
    #[serde(default)]
    pub building: bool,
    pub result: Option<BuildResult>,
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub estimated_duration: i64,
    #[serde(default)]
    pub timestamp: i64,
    #[serde(default, deserialize_with = "actions_skipping_nulls")]
    pub actions: Vec<BuildAction>,
    pub uuid: Option<String>,
    #[serde(default)]
    pub runs: Vec<MatrixRun>,
}

impl BuildSnapshot {
    pub fn derived_result(&self) -> BuildResult {
        if self.building {
            return BuildResult::InProgress;
        }

        self.result.clone().unwrap_or(BuildResult::Unknown)
    }

    pub fn parameters(&self) -> Vec<(String, String)> {
        self.actions
            .iter()
            .flat_map(|action| action.parameters.iter())
            .map(|parameter| {
                let value = match &parameter.value {
                    None => String::new(),
                    Some(serde_json::Value::String(text)) => text.clone(),
                    Some(other) => other.to_string(),
                };
                (parameter.name.clone(), value)
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct BuildReference {
    pub number: u64,
}

#[derive(Debug, Deserialize)]
pub struct ScheduledItem {
    pub uuid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchSnapshot {
    pub next_build_number: u64,
    pub last_completed_build: Option<BuildReference>,
    // Outer None : field absent, Some(None) : explicit null
    #[serde(default, deserialize_with = "present_even_if_null")]
    pub scheduled_item: Option<Option<ScheduledItem>>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutableReference {
    pub url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutorSnapshot {
    #[serde(default)]
    pub idle: bool,
    #[serde(default)]
    pub likely_stuck: bool,
    #[serde(default)]
    pub progress: i64,
    pub current_executable: Option<ExecutableReference>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputerSnapshot {
    pub display_name: String,
    #[serde(default)]
    pub executors: Vec<ExecutorSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutorsSnapshot {
    #[serde(default)]
    pub computer: Vec<ComputerSnapshot>,
}

#[derive(Debug, Deserialize)]
pub struct QueuedTask {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct QueuedItem {
    pub task: QueuedTask,
}

#[derive(Debug, Deserialize)]
pub struct QueueSnapshot {
    #[serde(default)]
    pub items: Vec<QueuedItem>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ExecutorInfo {
    pub idle: bool,
    pub stuck: bool,
    pub progress: i64,
    pub job_name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ComputerExecutors {
    pub name: String,
    pub executors: Vec<ExecutorInfo>,
}

fn present_even_if_null<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

fn actions_skipping_nulls<'de, D>(deserializer: D) -> Result<Vec<BuildAction>, D::Error>
where
    D: Deserializer<'de>,
{
    let actions = Vec::<Option<BuildAction>>::deserialize(deserializer)?;
    Ok(actions.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use crate::core::models::{BuildNumber, BuildResult, BuildSnapshot, JobSnapshot, JobStatus, LaunchSnapshot};
    use assertor::{BooleanAssertion, EqualityAssertion};

    #[test]
    fn should_derive_job_status_from_color() {
        assertor::assert_that!(JobStatus::from_color("blue")).is_equal_to(JobStatus::Ok);
        assertor::assert_that!(JobStatus::from_color("green_anime")).is_equal_to(JobStatus::Ok);
        assertor::assert_that!(JobStatus::from_color("grey")).is_equal_to(JobStatus::Aborted);
        assertor::assert_that!(JobStatus::from_color("red_anime")).is_equal_to(JobStatus::Fail);
        assertor::assert_that!(JobStatus::from_color("yellow")).is_equal_to(JobStatus::Warn);
    }

    #[test]
    fn should_keep_unknown_colors_as_uppercased_tokens() {
        let status = JobStatus::from_color("notbuilt_anime");

        assertor::assert_that!(status.clone()).is_equal_to(JobStatus::Other("NOTBUILT".to_string()));
        assertor::assert_that!(status.to_string()).is_equal_to("NOTBUILT".to_string());
    }

    #[test]
    fn should_map_build_zero_to_latest() {
        assertor::assert_that!(BuildNumber::from(0)).is_equal_to(BuildNumber::Latest);
        assertor::assert_that!(BuildNumber::from(7)).is_equal_to(BuildNumber::Exact(7));
        assertor::assert_that!(BuildNumber::Latest.to_string()).is_equal_to("lastBuild".to_string());
    }

    #[test]
    fn should_derive_in_progress_result_while_building() {
        let payload = r#"
            {
              "number": 12,
              "url": "http://localhost:8080/job/nestor/12/",
              "building": true,
              "result": null,
              "actions": [
                null,
                {},
                { "parameters": [ { "name": "BRANCH", "value": "main" }, { "name": "DRY_RUN", "value": true } ] }
              ]
            }
        "#;

        let snapshot: BuildSnapshot = serde_json::from_str(payload).unwrap();

        assertor::assert_that!(snapshot.derived_result()).is_equal_to(BuildResult::InProgress);
        assertor::assert_that!(snapshot.parameters()).is_equal_to(vec![
            ("BRANCH".to_string(), "main".to_string()),
            ("DRY_RUN".to_string(), "true".to_string()),
        ]);
    }

    #[test]
    fn should_preserve_unknown_result_tokens() {
        let payload = r#"{ "number": 3, "url": "http://localhost/job/a/3/", "result": "CANCELLED" }"#;

        let snapshot: BuildSnapshot = serde_json::from_str(payload).unwrap();

        assertor::assert_that!(snapshot.derived_result()).is_equal_to(BuildResult::Unknown);
    }

    #[test]
    fn should_ignore_fields_nestor_does_not_display() {
        let job = r#"
            {
              "name": "nestor",
              "url": "http://localhost:8080/job/nestor/",
              "color": "blue",
              "healthReport": [ { "description": "Build stability: No recent builds failed.", "score": 100 } ]
            }
        "#;
        let build = r#"
            {
              "number": 12,
              "url": "http://localhost:8080/job/nestor/12/",
              "runs": [ { "number": 12, "url": "http://localhost:8080/job/nestor/os=linux/12/" } ]
            }
        "#;

        let job: JobSnapshot = serde_json::from_str(job).unwrap();
        let build: BuildSnapshot = serde_json::from_str(build).unwrap();

        assertor::assert_that!(job.color).is_equal_to(Some("blue".to_string()));
        assertor::assert_that!(job.health_report[0].description.clone())
            .is_equal_to("Build stability: No recent builds failed.".to_string());
        assertor::assert_that!(build.runs[0].url.clone())
            .is_equal_to("http://localhost:8080/job/nestor/os=linux/12/".to_string());
    }

    #[test]
    fn should_distinguish_absent_and_null_scheduled_items() {
        let absent = r#"{ "nextBuildNumber": 5, "lastCompletedBuild": { "number": 4 } }"#;
        let null = r#"{ "nextBuildNumber": 5, "lastCompletedBuild": null, "scheduledItem": null }"#;

        let absent: LaunchSnapshot = serde_json::from_str(absent).unwrap();
        let null: LaunchSnapshot = serde_json::from_str(null).unwrap();

        assertor::assert_that!(absent.scheduled_item.is_none()).is_true();
        assertor::assert_that!(matches!(null.scheduled_item, Some(None))).is_true();
    }
}
