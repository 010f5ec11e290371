// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use crate::core::entities::Build;
use crate::core::errors::NestorError;
use crate::infra::networking::jenkins::{JenkinsClient, RemoteRequest};
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::sleep;

pub static HEADER_MORE_DATA: &str = "x-more-data";
pub static HEADER_TEXT_SIZE: &str = "x-text-size";

/// Tails the progressive console log of a build until Jenkins reports no more data
pub struct ConsoleStreamer<'a> {
    remote: &'a JenkinsClient,
    polling_interval: Duration,
}

impl<'a> ConsoleStreamer<'a> {
    pub fn new(remote: &'a JenkinsClient, polling_interval: Duration) -> Self {
        Self {
            remote,
            polling_interval,
        }
    }

    pub async fn stream(&self, build: &Build, mut on_chunk: impl FnMut(&str)) -> anyhow::Result<()> {
        let url = format!("{}logText/progressiveText", build.url());
        let mut offset = 0_u64;

        loop {
            let request = RemoteRequest::get(url.as_str())
                .query("start", offset)
                .reject(StatusCode::NOT_FOUND, NestorError::BuildNotFound(build.name().to_string()));

            let response = self.remote.execute(&request).await?;

            if !response.body.is_empty() {
                on_chunk(&response.body);
            }

            if response.header(HEADER_MORE_DATA) != Some("true") {
                log::info!("[nestor.console] {} fully streamed ({} bytes)", build, offset);
                return Ok(());
            }

            offset = response
                .header(HEADER_TEXT_SIZE)
                .and_then(|size| size.parse::<u64>().ok())
                .ok_or_else(|| NestorError::Transport(format!("missing {} for {}", HEADER_TEXT_SIZE, build)))?;

            sleep(self.polling_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::core::cache::EntityCache;
    use crate::core::errors::NestorError;
    use crate::core::models::BuildNumber;
    use crate::core::streaming::ConsoleStreamer;
    use crate::infra::networking::http::HTTP_CLIENT;
    use crate::infra::networking::jenkins::JenkinsClient;
    use assertor::{BooleanAssertion, EqualityAssertion};
    use httpmock::{MockServer, Then, When};
    use std::time::{Duration, Instant};

    fn responds_with_chunk(start: &str, body: &str, more_data: bool, text_size: &str) -> impl FnOnce(When, Then) {
        let (start, body, text_size) = (start.to_string(), body.to_string(), text_size.to_string());

        move |when, then| {
            when.method("GET")
                .path("/job/nestor/7/logText/progressiveText")
                .query_param("start", start);

            then.status(200)
                .header("content-type", "text/plain; charset=UTF-8")
                .header("x-more-data", more_data.to_string())
                .header("x-text-size", text_size)
                .body(body);
        }
    }

    #[tokio::test]
    async fn should_stream_chunks_until_no_more_data() {
        let mock_server = MockServer::start();
        let mut cache = EntityCache::new(JenkinsClient::new(mock_server.base_url(), HTTP_CLIENT.clone()));

        let first = mock_server.mock(responds_with_chunk("0", "A", true, "1"));
        let second = mock_server.mock(responds_with_chunk("1", "B", true, "2"));
        let third = mock_server.mock(responds_with_chunk("2", "", false, "2"));

        let job = cache.job("nestor");
        let build = cache.build(job, BuildNumber::Exact(7));

        let interval = Duration::from_millis(250);
        let streamer = ConsoleStreamer::new(cache.remote(), interval);

        let mut chunks = vec![];
        let started = Instant::now();
        let streamed = streamer
            .stream(cache.build_entity(build), |chunk| chunks.push(chunk.to_string()))
            .await;
        let elapsed = started.elapsed();

        first.assert_calls(1);
        second.assert_calls(1);
        third.assert_calls(1);
        assertor::assert_that!(streamed.is_ok()).is_true();
        assertor::assert_that!(chunks).is_equal_to(vec!["A".to_string(), "B".to_string()]);
        assertor::assert_that!(elapsed >= interval * 2).is_true();
        assertor::assert_that!(elapsed < interval * 3).is_true();
    }

    #[tokio::test]
    async fn should_abort_streaming_on_transport_failure() {
        let mock_server = MockServer::start();
        let mut cache = EntityCache::new(JenkinsClient::new(mock_server.base_url(), HTTP_CLIENT.clone()));

        let first = mock_server.mock(responds_with_chunk("0", "Started by user admin", true, "21"));
        let failing = mock_server.mock(|when, then| {
            when.method("GET")
                .path("/job/nestor/7/logText/progressiveText")
                .query_param("start", "21");
            then.status(500);
        });

        let job = cache.job("nestor");
        let build = cache.build(job, BuildNumber::Exact(7));
        let streamer = ConsoleStreamer::new(cache.remote(), Duration::from_millis(5));

        let mut chunks = vec![];
        let streamed = streamer
            .stream(cache.build_entity(build), |chunk| chunks.push(chunk.to_string()))
            .await;

        first.assert_calls(1);
        failing.assert_calls(1);
        assertor::assert_that!(chunks).is_equal_to(vec!["Started by user admin".to_string()]);
        assertor::assert_that!(matches!(
            streamed.unwrap_err().downcast_ref::<NestorError>(),
            Some(NestorError::Transport(_))
        ))
        .is_true();
    }

    #[tokio::test]
    async fn should_report_missing_build_logs() {
        let mock_server = MockServer::start();
        let mut cache = EntityCache::new(JenkinsClient::new(mock_server.base_url(), HTTP_CLIENT.clone()));

        mock_server.mock(|when, then| {
            when.method("GET").path("/job/nestor/lastBuild/logText/progressiveText");
            then.status(404);
        });

        let job = cache.job("nestor");
        let build = cache.last_build(job);
        let streamer = ConsoleStreamer::new(cache.remote(), Duration::from_millis(5));

        let streamed = streamer.stream(cache.build_entity(build), |_| {}).await;

        assertor::assert_that!(streamed.unwrap_err().downcast_ref::<NestorError>())
            .is_equal_to(Some(&NestorError::BuildNotFound("nestor#lastBuild".to_string())));
    }
}
