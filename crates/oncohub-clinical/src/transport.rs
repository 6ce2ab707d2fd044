//! HTTP transport for the clinical records client.
//!
//! `ReqwestTransport` is capped to the hosts named in the FHIR configuration
//! (token endpoint and FHIR base) and applies a per-request timeout.
//! `mock::MockTransport` replays scripted responses for tests.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::debug;
use url::Url;

use oncohub_common::{OncohubError, Result};
use oncohub_config::FhirConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

/// The two request kinds the clinical records client needs.
#[async_trait]
pub trait ClinicalTransport: Send + Sync {
    /// `application/x-www-form-urlencoded` POST.
    async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<TransportResponse>;

    async fn get(&self, url: &Url, headers: &[(&str, String)]) -> Result<TransportResponse>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
    allowlist: HashSet<String>,
}

impl ReqwestTransport {
    pub fn new(config: &FhirConfig) -> Result<Self> {
        let mut allowlist = HashSet::new();
        for endpoint in [&config.token_url, &config.base_url] {
            let url = Url::parse(endpoint)
                .map_err(|e| OncohubError::Config(format!("invalid endpoint {}: {}", endpoint, e)))?;
            let host = url
                .host_str()
                .ok_or_else(|| OncohubError::Config(format!("endpoint has no host: {}", endpoint)))?;
            allowlist.insert(host.to_string());
        }

        let client = ClientBuilder::new()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| OncohubError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, allowlist })
    }

    /// Exact host match only.
    pub fn is_allowed(&self, url: &Url) -> bool {
        url.host_str().map(|h| self.allowlist.contains(h)).unwrap_or(false)
    }

    fn check(&self, url: &Url) -> Result<()> {
        if self.is_allowed(url) {
            Ok(())
        } else {
            Err(OncohubError::Config(format!(
                "Network capabilities capped: host not in allowlist for URL {}",
                url
            )))
        }
    }

    async fn finish(resp: reqwest::Response) -> Result<TransportResponse> {
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(map_reqwest)?;
        debug!(status, bytes = body.len(), "Clinical system responded");
        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest(e: reqwest::Error) -> OncohubError {
    if e.is_timeout() {
        OncohubError::Timeout(e.to_string())
    } else {
        OncohubError::Http(e)
    }
}

#[async_trait]
impl ClinicalTransport for ReqwestTransport {
    async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<TransportResponse> {
        self.check(url)?;
        let resp = self
            .client
            .post(url.clone())
            .form(form)
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::finish(resp).await
    }

    async fn get(&self, url: &Url, headers: &[(&str, String)]) -> Result<TransportResponse> {
        self.check(url)?;
        let mut req = self.client.get(url.clone());
        for (name, value) in headers {
            req = req.header(*name, value.as_str());
        }
        let resp = req.send().await.map_err(map_reqwest)?;
        Self::finish(resp).await
    }
}

pub mod mock {
    //! Scripted transport: replies are consumed in order and every request is recorded.

    use std::collections::VecDeque;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    use super::*;

    fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
        m.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum MockReply {
        Response(TransportResponse),
        Timeout,
        Status(u16),
    }

    #[derive(Debug, Clone, PartialEq)]
    pub struct RecordedRequest {
        pub method: &'static str,
        pub url: String,
        pub form: Vec<(String, String)>,
        pub headers: Vec<(String, String)>,
    }

    #[derive(Debug, Default)]
    pub struct MockTransport {
        replies: Mutex<VecDeque<MockReply>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn reply(self, status: u16, body: impl Into<String>) -> Self {
            self.push(MockReply::Response(TransportResponse::new(status, body)))
        }

        pub fn timeout(self) -> Self {
            self.push(MockReply::Timeout)
        }

        pub fn status(self, status: u16) -> Self {
            self.push(MockReply::Status(status))
        }

        fn push(self, reply: MockReply) -> Self {
            lock(&self.replies).push_back(reply);
            self
        }

        pub fn requests(&self) -> Vec<RecordedRequest> {
            lock(&self.requests).clone()
        }

        pub fn request_count(&self) -> usize {
            lock(&self.requests).len()
        }

        fn next(&self, request: RecordedRequest) -> Result<TransportResponse> {
            lock(&self.requests).push(request);
            match lock(&self.replies).pop_front() {
                Some(MockReply::Response(r)) => Ok(r),
                Some(MockReply::Status(status)) => Ok(TransportResponse::new(status, "")),
                Some(MockReply::Timeout) => Err(OncohubError::Timeout("mock timeout".to_string())),
                None => Err(OncohubError::Config("mock transport has no scripted reply".to_string())),
            }
        }
    }

    #[async_trait]
    impl ClinicalTransport for MockTransport {
        async fn post_form(&self, url: &Url, form: &[(&str, &str)]) -> Result<TransportResponse> {
            self.next(RecordedRequest {
                method: "POST",
                url: url.to_string(),
                form: form.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
                headers: Vec::new(),
            })
        }

        async fn get(&self, url: &Url, headers: &[(&str, String)]) -> Result<TransportResponse> {
            self.next(RecordedRequest {
                method: "GET",
                url: url.to_string(),
                form: Vec::new(),
                headers: headers.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            })
        }
    }
}
