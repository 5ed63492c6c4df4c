use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::{HttpResponse, HttpTransport, NetError};

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub form: Vec<(String, String)>,
    pub json: Option<serde_json::Value>,
    pub bearer: Option<String>,
}

#[derive(Debug, Clone)]
enum DownloadOutcome {
    Bytes(Vec<u8>),
    Fail,
}

#[derive(Debug, Default)]
struct MockState {
    responses: HashMap<String, VecDeque<HttpResponse>>,
    downloads: HashMap<String, VecDeque<DownloadOutcome>>,
    requests: Vec<RecordedRequest>,
}

/// Scripted transport. Responses queued for a URL are served in order and the
/// last one repeats, which suits polling endpoints.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, url: &str, status: u16, body: &str) -> Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry(url.to_string())
            .or_default()
            .push_back(HttpResponse::new(status, body));
        self
    }

    pub fn with_json(self, url: &str, body: serde_json::Value) -> Self {
        self.with_response(url, 200, &body.to_string())
    }

    pub fn with_download(self, url: &str, bytes: &[u8]) -> Self {
        self.push_download(url, DownloadOutcome::Bytes(bytes.to_vec()));
        self
    }

    pub fn with_download_failure(self, url: &str) -> Self {
        self.push_download(url, DownloadOutcome::Fail);
        self
    }

    fn push_download(&self, url: &str, outcome: DownloadOutcome) {
        self.state
            .lock()
            .unwrap()
            .downloads
            .entry(url.to_string())
            .or_default()
            .push_back(outcome);
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn request_count(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    fn record(&self, request: RecordedRequest) -> Result<HttpResponse, NetError> {
        let mut state = self.state.lock().unwrap();
        let url = request.url.clone();
        state.requests.push(request);

        let queue = state
            .responses
            .get_mut(&url)
            .ok_or_else(|| NetError::request(&url, "no scripted response"))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| NetError::request(&url, "no scripted response"))
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> Result<HttpResponse, NetError> {
        self.record(RecordedRequest {
            method: "GET",
            url: url.to_string(),
            form: Vec::new(),
            json: None,
            bearer: bearer.map(str::to_string),
        })
    }

    async fn post_form(
        &self,
        url: &str,
        form: &[(&str, &str)],
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError> {
        self.record(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            json: None,
            bearer: bearer.map(str::to_string),
        })
    }

    async fn post_json(
        &self,
        url: &str,
        body: &serde_json::Value,
        bearer: Option<&str>,
    ) -> Result<HttpResponse, NetError> {
        self.record(RecordedRequest {
            method: "POST",
            url: url.to_string(),
            form: Vec::new(),
            json: Some(body.clone()),
            bearer: bearer.map(str::to_string),
        })
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64, NetError> {
        let outcome = {
            let mut state = self.state.lock().unwrap();
            state.requests.push(RecordedRequest {
                method: "DOWNLOAD",
                url: url.to_string(),
                form: Vec::new(),
                json: None,
                bearer: None,
            });
            let queue = state
                .downloads
                .get_mut(url)
                .ok_or_else(|| NetError::request(url, "no scripted download"))?;
            if queue.len() > 1 {
                queue.pop_front()
            } else {
                queue.front().cloned()
            }
        };

        match outcome {
            Some(DownloadOutcome::Bytes(bytes)) => {
                tokio::fs::write(dest, &bytes).await?;
                Ok(bytes.len() as u64)
            }
            Some(DownloadOutcome::Fail) | None => {
                // Leave a truncated file behind like an interrupted transfer would.
                tokio::fs::write(dest, b"").await?;
                Err(NetError::request(url, "connection reset"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_last_response_repeats() {
        let mock = MockTransport::new()
            .with_response("https://a.test/poll", 400, "pending")
            .with_response("https://a.test/poll", 200, "done");

        assert_eq!(mock.get("https://a.test/poll", None).await.unwrap().body, "pending");
        assert_eq!(mock.get("https://a.test/poll", None).await.unwrap().body, "done");
        assert_eq!(mock.get("https://a.test/poll", None).await.unwrap().body, "done");
        assert_eq!(mock.request_count("https://a.test/poll"), 3);
    }

    #[tokio::test]
    async fn test_unscripted_url_fails() {
        let mock = MockTransport::new();
        assert!(mock.get("https://a.test/unknown", None).await.is_err());
        assert_eq!(mock.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("server.jar");
        let mock = MockTransport::new().with_download("https://a.test/server.jar", b"jar");

        let written = mock.download("https://a.test/server.jar", &dest).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(std::fs::read(&dest).unwrap(), b"jar");
    }
}
