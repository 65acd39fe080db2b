//! HTTP client for the remote back-office API
//!
//! Every endpoint answers with the same envelope:
//! `{success, message?, data?, meta?}`. Transport failures, non-2xx
//! statuses, `success: false` and undecodable bodies map onto distinct
//! [`CoreError`] variants.

use hyper::body::Bytes;
use hyper::client::HttpConnector;
use hyper::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use hyper::{Body, Client, Method, Request, StatusCode};
use opsdesk_config::RemoteConfig;
use opsdesk_core::{CoreError, CoreResult, PageMeta};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

/// Response envelope shared by all endpoints
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    pub data: Option<T>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
    // Some list endpoints put counts at the top level instead of in `meta`
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

fn default_success() -> bool {
    true
}

impl<T> Envelope<T> {
    /// Pagination metadata, from `meta` or from top-level counts
    pub fn page_meta(&self) -> Option<PageMeta> {
        if let Some(meta) = self.meta {
            return Some(meta);
        }
        match (self.page, self.limit, self.total, self.total_pages) {
            (Some(page), Some(limit), Some(total), Some(total_pages)) => Some(PageMeta {
                page,
                limit,
                total,
                total_pages,
            }),
            _ => None,
        }
    }
}

/// Join `base`, `path` and URL-encoded query `pairs`
pub fn build_url(base: &str, path: &str, pairs: &[(String, String)]) -> String {
    let mut url = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    if !pairs.is_empty() {
        let query: Vec<String> = pairs
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect();
        url.push('?');
        url.push_str(&query.join("&"));
    }
    url
}

/// Map a finished HTTP exchange onto an envelope or an error
pub fn decode_envelope<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> CoreResult<Envelope<T>> {
    if !status.is_success() {
        let message = serde_json::from_slice::<Envelope<serde_json::Value>>(body)
            .ok()
            .and_then(|e| e.message)
            .or_else(|| status.canonical_reason().map(str::to_string))
            .unwrap_or_else(|| "request failed".to_string());
        return Err(CoreError::Status {
            status: status.as_u16(),
            message,
        });
    }

    let envelope: Envelope<T> = serde_json::from_slice(body).map_err(|e| CoreError::Decode {
        message: e.to_string(),
    })?;

    if !envelope.success {
        return Err(CoreError::Rejected {
            message: envelope
                .message
                .clone()
                .unwrap_or_else(|| "request was not accepted".to_string()),
        });
    }
    Ok(envelope)
}

pub struct RemoteApi {
    client: Client<HttpConnector>,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl RemoteApi {
    pub fn new(config: &RemoteConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim().trim_end_matches('/').to_string(),
            token: config
                .token
                .as_ref()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty()),
            timeout: config.timeout(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        pairs: &[(String, String)],
    ) -> CoreResult<Envelope<T>> {
        let url = build_url(&self.base_url, path, pairs);
        let (status, body) = self.execute(Method::GET, &url, None).await?;
        decode_envelope(status, &body)
    }

    /// Send a mutation and return the envelope's message
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> CoreResult<String> {
        let url = build_url(&self.base_url, path, &[]);
        let payload = match body {
            Some(value) => Some(serde_json::to_vec(&value).map_err(|e| CoreError::Internal {
                message: e.to_string(),
            })?),
            None => None,
        };
        let (status, body) = self.execute(method, &url, payload).await?;
        let envelope: Envelope<serde_json::Value> = decode_envelope(status, &body)?;
        Ok(envelope.message.unwrap_or_else(|| "OK".to_string()))
    }

    async fn execute(
        &self,
        method: Method,
        url: &str,
        payload: Option<Vec<u8>>,
    ) -> CoreResult<(StatusCode, Bytes)> {
        let mut builder = Request::builder()
            .method(method.clone())
            .uri(url)
            .header(ACCEPT, "application/json");
        if let Some(token) = &self.token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match payload {
            Some(bytes) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(bytes)
            }
            None => Body::empty(),
        };
        let request = builder.body(body).map_err(|e| CoreError::Internal {
            message: format!("invalid request for {}: {}", url, e),
        })?;

        log::debug!(target: "opsdesk::remote", "{} {}", method, url);

        let exchange = async {
            let response = self.client.request(request).await?;
            let status = response.status();
            let bytes = hyper::body::to_bytes(response.into_body()).await?;
            Ok::<_, hyper::Error>((status, bytes))
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(Ok((status, bytes))) => {
                if !status.is_success() {
                    log::warn!(target: "opsdesk::remote", "{} {} -> {}", method, url, status);
                }
                Ok((status, bytes))
            }
            Ok(Err(e)) => Err(CoreError::Transport {
                message: e.to_string(),
            }),
            Err(_) => Err(CoreError::Transport {
                message: format!("timed out after {}s", self.timeout.as_secs()),
            }),
        }
    }
}
