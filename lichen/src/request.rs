// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! Shared HTTP plumbing for remote servers and source downloads.

use std::sync::OnceLock;

use reqwest::{Response, Result};
use url::Url;

use crate::environment;

static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

/// The process-wide HTTP client; every remote shares one connection pool
pub fn client() -> &'static reqwest::Client {
    CLIENT.get_or_init(|| {
        reqwest::ClientBuilder::new()
            .user_agent(format!("{}/{}", environment::NAME, environment::VERSION))
            .build()
            .expect("build reqwest client")
    })
}

/// Start a GET, failing early on a non-success status. Callers decide
/// whether to stream or collect the body.
pub async fn get(url: Url) -> Result<Response> {
    client().get(url).send().await?.error_for_status()
}
