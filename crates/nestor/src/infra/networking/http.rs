// Copyright 2025 Dotanuki Labs
// SPDX-License-Identifier: MIT

use reqwest::header;
use std::sync::{Arc, LazyLock};
use std::time::Duration;

pub type HTTPClient = reqwest::Client;

pub static HTTP_TIMEOUT_SECONDS: u64 = 30;

pub static HTTP_CLIENT: LazyLock<Arc<HTTPClient>> = LazyLock::new(|| {
    let user_agent = format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let mut headers = header::HeaderMap::new();
    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&user_agent).expect("user agent is a valid header value"),
    );

    let client = HTTPClient::builder()
        .default_headers(headers)
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECONDS))
        .build()
        .expect("cannot build HTTP client");

    Arc::new(client)
});
