//! OCI distribution client over reqwest.
//!
//! Docker Hub style auth: a pull-scoped bearer token is fetched per
//! repository from the token endpoint and cached for the client's lifetime.

use super::{gguf, Descriptor, Manifest, Registry, RegistryError};
use crate::classify::{ConfigBlob, ModelFileHeader};
use crate::config::Config;
use regex::Regex;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::LazyLock;
use tokio::sync::Mutex;

const MANIFEST_ACCEPT: &str = "application/vnd.oci.image.manifest.v1+json, \
     application/vnd.docker.distribution.manifest.v2+json";

static NEXT_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"<([^>]+)>\s*;\s*rel="?next"?"#).unwrap());

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    tags: Option<Vec<String>>,
}

pub struct OciRegistryClient {
    http: reqwest::Client,
    base_url: String,
    auth_url: Option<String>,
    auth_service: String,
    credentials: Option<(String, String)>,
    tokens: Mutex<HashMap<String, String>>,
    header_probe_bytes: u64,
    header_max_bytes: u64,
}

impl OciRegistryClient {
    pub fn new(config: &Config) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        let credentials = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => Some((user.clone(), pass.clone())),
            _ => None,
        };

        Ok(Self {
            http,
            base_url: config.registry_url(),
            auth_url: config.auth_url.clone(),
            auth_service: config.auth_service.clone(),
            credentials,
            tokens: Mutex::new(HashMap::new()),
            header_probe_bytes: config.header_probe_bytes.max(1),
            header_max_bytes: config.header_max_bytes,
        })
    }

    /// Pull token for `repository`, or `None` when auth is disabled.
    async fn token(&self, repository: &str) -> Result<Option<String>, RegistryError> {
        let Some(auth_url) = &self.auth_url else {
            return Ok(None);
        };

        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.get(repository) {
            return Ok(Some(token.clone()));
        }

        let scope = format!("repository:{}:pull", repository);
        let mut req = self
            .http
            .get(auth_url)
            .query(&[("service", self.auth_service.as_str()), ("scope", scope.as_str())]);
        if let Some((user, pass)) = &self.credentials {
            req = req.basic_auth(user, Some(pass));
        }

        let resp = req.send().await?;
        if !resp.status().is_success() {
            return Err(RegistryError::Auth(format!(
                "{} returned HTTP {} for {}",
                auth_url,
                resp.status(),
                scope
            )));
        }

        let body: TokenResponse = resp.json().await?;
        let token = body
            .token
            .or(body.access_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RegistryError::Auth(format!("no token in response for {}", scope)))?;

        log::debug!("[REGISTRY] Obtained pull token for {}", repository);
        tokens.insert(repository.to_string(), token.clone());
        Ok(Some(token))
    }

    async fn get(
        &self,
        repository: &str,
        url: &str,
        headers: &[(&str, String)],
    ) -> Result<reqwest::Response, RegistryError> {
        let mut req = self.http.get(url);
        if let Some(token) = self.token(repository).await? {
            req = req.bearer_auth(token);
        }
        for (name, value) in headers {
            req = req.header(*name, value);
        }

        let resp = req.send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(RegistryError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }

    fn blob_url(&self, repository: &str, digest: &str) -> String {
        format!("{}/v2/{}/blobs/{}", self.base_url, repository, digest)
    }

    /// Read at most `len` bytes from the start of a blob.
    ///
    /// Servers that ignore `Range` still work: the body is streamed and the
    /// connection dropped once enough bytes arrived.
    async fn fetch_prefix(&self, repository: &str, url: &str, len: u64) -> Result<Vec<u8>, RegistryError> {
        let range = format!("bytes=0-{}", len.saturating_sub(1));
        let mut resp = self.get(repository, url, &[("Range", range)]).await?;

        let mut buf = Vec::with_capacity(len as usize);
        while let Some(chunk) = resp.chunk().await? {
            buf.extend_from_slice(&chunk);
            if buf.len() as u64 >= len {
                break;
            }
        }
        buf.truncate(len as usize);
        Ok(buf)
    }
}

/// Check a `sha256:` digest; other algorithms are accepted unchecked.
fn verify_digest(expected: &str, bytes: &[u8]) -> Result<(), RegistryError> {
    let Some(hex) = expected.strip_prefix("sha256:") else {
        return Ok(());
    };
    let actual = format!("{:x}", Sha256::digest(bytes));
    if actual != hex {
        return Err(RegistryError::DigestMismatch {
            expected: expected.to_string(),
            actual: format!("sha256:{}", actual),
        });
    }
    Ok(())
}

/// Absolute URL of the `rel="next"` page from a `Link` header.
fn next_page(base_url: &str, link: Option<&str>) -> Option<String> {
    let captures = NEXT_LINK.captures(link?)?;
    let target = captures.get(1)?.as_str();
    if target.starts_with("http://") || target.starts_with("https://") {
        Some(target.to_string())
    } else {
        Some(format!("{}{}", base_url, target))
    }
}

impl Registry for OciRegistryClient {
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>, RegistryError> {
        log::info!("[REGISTRY] Listing tags for repository: {}", repository);

        let mut tags = Vec::new();
        let mut url = Some(format!("{}/v2/{}/tags/list", self.base_url, repository));
        while let Some(page_url) = url.take() {
            let resp = self.get(repository, &page_url, &[]).await?;
            let link = resp
                .headers()
                .get(reqwest::header::LINK)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string);
            let page: TagList = resp.json().await?;
            tags.extend(page.tags.unwrap_or_default());
            url = next_page(&self.base_url, link.as_deref());
        }

        log::info!("[REGISTRY] Found {} tags: {:?}", tags.len(), tags);
        Ok(tags)
    }

    async fn manifest(&self, repository: &str, tag: &str) -> Result<Manifest, RegistryError> {
        let url = format!("{}/v2/{}/manifests/{}", self.base_url, repository, tag);
        let resp = self
            .get(repository, &url, &[("Accept", MANIFEST_ACCEPT.to_string())])
            .await?;
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn config_blob(&self, repository: &str, config: &Descriptor) -> Result<ConfigBlob, RegistryError> {
        let url = self.blob_url(repository, &config.digest);
        let bytes = self.get(repository, &url, &[]).await?.bytes().await?;
        verify_digest(&config.digest, &bytes)?;
        Ok(ConfigBlob::from_json(&bytes)?)
    }

    async fn model_file_header(
        &self,
        repository: &str,
        layer: &Descriptor,
    ) -> Result<ModelFileHeader, RegistryError> {
        let url = self.blob_url(repository, &layer.digest);
        let limit = if layer.size > 0 {
            layer.size.min(self.header_max_bytes)
        } else {
            self.header_max_bytes
        };
        let mut want = self.header_probe_bytes.min(limit);

        loop {
            let prefix = self.fetch_prefix(repository, &url, want).await?;
            match gguf::parse_header(&prefix, layer.size) {
                Ok(header) => return Ok(header),
                Err(e) if gguf::is_truncated(&e) && (prefix.len() as u64) == want && want < limit => {
                    want = want.saturating_mul(2).min(limit);
                    log::debug!(
                        "[REGISTRY] GGUF header of {} exceeds prefix, retrying with {} bytes",
                        layer.digest,
                        want
                    );
                }
                Err(e) => return Err(RegistryError::Gguf(e.to_string())),
            }
        }
    }
}
