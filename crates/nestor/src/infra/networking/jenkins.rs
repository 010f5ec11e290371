// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::errors::NestorError;
use crate::core::models::{ComputerExecutors, ExecutorInfo, ExecutorsSnapshot, QueueSnapshot};
use crate::infra::networking::http::HTTPClient;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;

pub static URL_DEFAULT_JENKINS: &str = "http://localhost:8080";

pub static HEADER_JENKINS_VERSION: &str = "x-jenkins";

/// What to do with a response carrying a given status code
#[derive(Clone, Debug, PartialEq)]
pub enum StatusHandling {
    Accept,
    Reject(NestorError),
}

/// Immutable description of one call against Jenkins, handlers included.
///
/// Statuses without a registered handler are accepted when they are 2xx and
/// turned into transport errors otherwise.
#[derive(Clone, Debug)]
pub struct RemoteRequest {
    method: Method,
    url: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    handlers: HashMap<StatusCode, StatusHandling>,
}

impl RemoteRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url.into())
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url.into())
    }

    pub fn head(url: impl Into<String>) -> Self {
        Self::new(Method::HEAD, url.into())
    }

    fn new(method: Method, url: String) -> Self {
        let handlers = HashMap::from([
            (StatusCode::UNAUTHORIZED, StatusHandling::Reject(NestorError::AuthFailed)),
            (StatusCode::FORBIDDEN, StatusHandling::Reject(NestorError::AuthRequired)),
        ]);

        Self {
            method,
            url,
            query: vec![],
            headers: HeaderMap::new(),
            handlers,
        }
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: &'static str) -> Self {
        self.headers.insert(name, HeaderValue::from_static(value));
        self
    }

    pub fn accept(mut self, status: StatusCode) -> Self {
        self.handlers.insert(status, StatusHandling::Accept);
        self
    }

    pub fn reject(mut self, status: StatusCode, error: NestorError) -> Self {
        self.handlers.insert(status, StatusHandling::Reject(error));
        self
    }

    fn handling_for(&self, status: StatusCode) -> StatusHandling {
        match self.handlers.get(&status) {
            Some(handling) => handling.clone(),
            None if status.is_success() => StatusHandling::Accept,
            None => StatusHandling::Reject(NestorError::Transport(format!(
                "{} {} answered with HTTP status {}",
                self.method, self.url, status
            ))),
        }
    }
}

#[derive(Debug)]
pub struct RemoteResponse {
    pub headers: HeaderMap,
    pub body: String,
}

impl RemoteResponse {
    pub fn json<T: DeserializeOwned>(&self) -> anyhow::Result<T> {
        let parsed = serde_json::from_str::<T>(&self.body).map_err(NestorError::transport)?;
        Ok(parsed)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

pub struct JenkinsClient {
    base_url: String,
    http_client: Arc<HTTPClient>,
}

impl JenkinsClient {
    pub fn new(base_url: String, http_client: Arc<HTTPClient>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self { base_url, http_client }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn execute(&self, request: &RemoteRequest) -> anyhow::Result<RemoteResponse> {
        log::info!("[nestor.remote] {} {}", request.method, request.url);

        let response = self
            .http_client
            .request(request.method.clone(), &request.url)
            .query(&request.query)
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(NestorError::transport)?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(NestorError::transport)?;

        match request.handling_for(status) {
            StatusHandling::Accept => Ok(RemoteResponse { headers, body }),
            StatusHandling::Reject(error) => {
                log::info!("[nestor.remote] {} rejected with {}", request.url, status);
                Err(error.into())
            },
        }
    }

    pub async fn executors(&self) -> anyhow::Result<Vec<ComputerExecutors>> {
        let request = RemoteRequest::get(format!("{}/computer/api/json", self.base_url)).query("depth", 1);
        let snapshot = self.execute(&request).await?.json::<ExecutorsSnapshot>()?;

        let computers = snapshot
            .computer
            .into_iter()
            .map(|computer| ComputerExecutors {
                name: computer.display_name,
                executors: computer
                    .executors
                    .into_iter()
                    .map(|executor| ExecutorInfo {
                        idle: executor.idle,
                        stuck: executor.likely_stuck,
                        progress: executor.progress,
                        job_name: match executor.idle {
                            true => None,
                            false => executor
                                .current_executable
                                .and_then(|executable| job_name_from_url(&executable.url)),
                        },
                    })
                    .collect(),
            })
            .collect();

        Ok(computers)
    }

    pub async fn queue(&self) -> anyhow::Result<Vec<String>> {
        let request = RemoteRequest::get(format!("{}/queue/api/json", self.base_url));
        let snapshot = self.execute(&request).await?.json::<QueueSnapshot>()?;
        Ok(snapshot.items.into_iter().map(|item| item.task.name).collect())
    }

    pub async fn version(&self) -> anyhow::Result<String> {
        let request = RemoteRequest::head(self.base_url.clone());
        let response = self.execute(&request).await?;

        match response.header(HEADER_JENKINS_VERSION) {
            Some(version) => Ok(version.to_string()),
            None => Err(NestorError::NotJenkins.into()),
        }
    }
}

fn job_name_from_url(url: &str) -> Option<String> {
    let (_, after_job) = url.rsplit_once("/job/")?;
    let name = after_job.split('/').next().unwrap_or_default();
    match name.is_empty() {
        true => None,
        false => Some(name.to_string()),
    }
}
