use std::{path::Path, time::Duration};

use async_trait::async_trait;
use hostcraft_config::LogType;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::{fs::File, io::AsyncWriteExt};
use tracing::{debug, trace};

use crate::NetError;

const USER_AGENT: &str = concat!("hostcraft/", env!("CARGO_PKG_VERSION"));
const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Status code and body of a completed request, whatever the status.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_str(&self.body)
    }

    /// Body truncated for inclusion in diagnostics.
    pub fn excerpt(&self) -> String {
        const MAX: usize = 512;
        if self.body.len() <= MAX {
            return self.body.clone();
        }
        let mut end = MAX;
        while !self.body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &self.body[..end])
    }
}

/// Network seam. Non-2xx answers are returned as responses, not errors, so
/// callers can inspect OAuth error bodies; only `download` treats them as
/// failures.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, NetError>;

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError>;

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError>;

    /// Streams `url` into `dest`, returning the number of bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64, NetError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self, NetError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| NetError::request("<client>", e))?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn execute(
        &self,
        url: &str,
        request: RequestBuilder,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError> {
        let mut request = request
            .header("Accept", "application/json")
            .timeout(REQUEST_TIMEOUT);
        if let Some(token) = bearer {
            request = request.header("Authorization", format!("Bearer {}", token));
        }

        let response = request
            .send()
            .await
            .map_err(|e| NetError::request(url, e))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| NetError::request(url, e))?;

        trace!(
            log_type = LogType::Network.as_str(),
            status,
            bytes = body.len(),
            "Response from {}",
            url
        );
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, NetError> {
        debug!(log_type = LogType::Network.as_str(), "GET {}", url);
        self.execute(url, self.client.get(url), bearer).await
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError> {
        debug!(log_type = LogType::Network.as_str(), "POST {} (form)", url);
        self.execute(url, self.client.post(url).form(form), bearer)
            .await
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError> {
        debug!(log_type = LogType::Network.as_str(), "POST {} (json)", url);
        self.execute(url, self.client.post(url).json(body), bearer)
            .await
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, NetError> {
        debug!(
            log_type = LogType::Network.as_str(),
            "Downloading {} to {}",
            url,
            dest.display()
        );
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetError::request(url, e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(NetError::Status {
                url: url.to_string(),
                status,
                body,
            });
        }

        let mut file = File::create(dest).await?;
        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| NetError::request(url, e))?
        {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        file.sync_all().await?;

        Ok(written)
    }
}
