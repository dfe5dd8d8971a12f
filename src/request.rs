use crate::error::{FetchError, FetchResult};
use serde::de::DeserializeOwned;
use std::collections::HashMap;

#[cfg(test)]
use std::sync::Mutex;

// =========================================================
// HTTP interface
// =========================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
}

impl From<HttpMethod> for reqwest::Method {
    fn from(m: HttpMethod) -> Self {
        match m {
            HttpMethod::Get => reqwest::Method::GET,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub url: String,
    pub method: HttpMethod,
    pub headers: HashMap<String, String>,
}

impl HttpRequest {
    pub fn new(url: &str, method: HttpMethod) -> Self {
        Self {
            url: url.to_string(),
            method,
            headers: HashMap::new(),
        }
    }

    pub fn with_header(mut self, key: &str, value: &str) -> Self {
        self.headers.insert(key.to_string(), value.to_string());
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> FetchResult<T> {
        serde_json::from_str(&self.body).map_err(FetchError::from)
    }
}

/// HTTP seam the gateway is written against.
///
/// Fetches run on spawned Tokio tasks, so implementations must be
/// `Send + Sync`.
#[async_trait::async_trait]
pub trait HttpClient: Send + Sync {
    async fn send(&self, req: HttpRequest) -> FetchResult<HttpResponse>;
}

// =========================================================
// reqwest client (production)
// =========================================================

#[derive(Clone, Default)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, req: HttpRequest) -> FetchResult<HttpResponse> {
        let mut builder = self.client.request(req.method.into(), &req.url);

        for (k, v) in &req.headers {
            builder = builder.header(k, v);
        }

        let resp = builder
            .send()
            .await
            .map_err(|e| FetchError::from(e).in_op_with("http.send", req.url.clone()))?;

        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| FetchError::from(e).in_op_with("http.read_body", req.url.clone()))?;

        Ok(HttpResponse { status, body })
    }
}

// =========================================================
// Test double: MockHttpClient
// =========================================================

#[cfg(test)]
pub struct MockHttpClient {
    // URL -> (Status, Response Body)
    responses: Mutex<HashMap<String, (u16, String)>>,
    // URLs that fail before any response, as a dropped connection would
    unreachable: Mutex<Vec<String>>,
    // (URL, Method, Headers)
    pub requests: Mutex<Vec<(String, HttpMethod, HashMap<String, String>)>>,
}

#[cfg(test)]
impl MockHttpClient {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            unreachable: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn mock_response(&self, url: &str, status: u16, body: serde_json::Value) {
        self.mock_raw(url, status, &body.to_string());
    }

    pub fn mock_raw(&self, url: &str, status: u16, body: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), (status, body.to_string()));
    }

    pub fn mock_unreachable(&self, url: &str) {
        self.unreachable.lock().unwrap().push(url.to_string());
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl HttpClient for MockHttpClient {
    async fn send(&self, req: HttpRequest) -> FetchResult<HttpResponse> {
        self.requests
            .lock()
            .unwrap()
            .push((req.url.clone(), req.method, req.headers.clone()));

        if self.unreachable.lock().unwrap().contains(&req.url) {
            return Err(FetchError::network("connection refused").in_op_with("http.send", req.url));
        }

        let responses = self.responses.lock().unwrap();
        if let Some((status, body)) = responses.get(&req.url) {
            Ok(HttpResponse {
                status: *status,
                body: body.clone(),
            })
        } else {
            Ok(HttpResponse {
                status: 404,
                body: "Not Found".to_string(),
            })
        }
    }
}
