// SPDX-FileCopyrightText: Copyright © 2024-2025 Lichen Developers
//
// SPDX-License-Identifier: MPL-2.0

//! HTTP/JSON backend for opam scheme remotes.
//!
//! `opam://host[:port]` maps onto `http://host:port` with the package
//! collection at `/packages`. Archives travel hex encoded inside the JSON
//! publication bodies so the wire stays a single round trip per operation.

use bytes::Bytes;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use spec::NV;

use crate::environment;
use crate::remote::Remote;
use crate::request;

use super::Key;

pub struct Server {
    base: String,
}

impl Server {
    pub fn new(remote: &Remote) -> Self {
        Self {
            base: format!(
                "http://{}:{}/",
                remote.hostname(),
                remote.port().unwrap_or(environment::DEFAULT_PORT)
            ),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(Url::parse(&format!("{}{path}", self.base))?)
    }

    pub async fn list(&self) -> Result<Vec<NV>, Error> {
        let response = request::get(self.endpoint("packages")?).await?;

        Ok(serde_json::from_slice(&response.bytes().await?)?)
    }

    pub async fn get_spec(&self, nv: &NV) -> Result<Vec<u8>, Error> {
        let response = request::get(self.endpoint(&format!("packages/{nv}/spec"))?).await?;

        Ok(response.bytes().await?.to_vec())
    }

    pub async fn get_archive(&self, nv: &NV) -> Result<Option<Bytes>, Error> {
        let response = request::client()
            .get(self.endpoint(&format!("packages/{nv}/archive"))?)
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        Ok(Some(response.error_for_status()?.bytes().await?))
    }

    pub async fn new_archive(
        &self,
        nv: &NV,
        spec: &[u8],
        archive: Option<&[u8]>,
    ) -> Result<Key, Error> {
        let response = request::client()
            .post(self.endpoint(&format!("packages/{nv}"))?)
            .json(&Publication::new(spec, archive, None))
            .send()
            .await?
            .error_for_status()?;

        Ok(Key::from(response.text().await?.trim().to_owned()))
    }

    pub async fn update_archive(
        &self,
        nv: &NV,
        spec: &[u8],
        archive: Option<&[u8]>,
        key: &Key,
    ) -> Result<(), Error> {
        request::client()
            .put(self.endpoint(&format!("packages/{nv}"))?)
            .json(&Publication::new(spec, archive, Some(key)))
            .send()
            .await?
            .error_for_status()?;

        Ok(())
    }
}

/// Body of a `new_archive` / `update_archive` request
#[derive(Debug, Serialize, Deserialize)]
struct Publication {
    spec: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    archive: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    key: Option<String>,
}

impl Publication {
    fn new(spec: &[u8], archive: Option<&[u8]>, key: Option<&Key>) -> Self {
        Self {
            spec: String::from_utf8_lossy(spec).into_owned(),
            archive: archive.map(hex::encode),
            key: key.map(|key| key.as_str().to_owned()),
        }
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("endpoint")]
    Endpoint(#[from] url::ParseError),
    #[error("request")]
    Request(#[from] reqwest::Error),
    #[error("listing")]
    Listing(#[from] serde_json::Error),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn base_url_mapping() {
        let remote = Remote::parse("packages.example").unwrap();
        let server = Server::new(&remote);
        assert_eq!(
            server.endpoint("packages").unwrap().as_str(),
            "http://packages.example:9999/packages"
        );

        let explicit = Remote::parse("opam://packages.example:4000").unwrap();
        let server = Server::new(&explicit);
        assert_eq!(
            server
                .endpoint("packages/lwt-2.3.1/spec")
                .unwrap()
                .as_str(),
            "http://packages.example:4000/packages/lwt-2.3.1/spec"
        );
    }
}
