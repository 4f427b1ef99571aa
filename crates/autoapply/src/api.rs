//! Client for the AI backend that generates cover letters, resumes and answers.
//!
//! The engine never calls this; step functions that need generated text hold a client.

use reqwest::{Client, Method};
use serde_json::Value;
use tracing::debug;

use crate::{config::ApiConfig, Error, Result};

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session_token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session_token: config.session_token.clone(),
        }
    }

    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    pub fn is_authenticated(&self) -> bool {
        self.session_token.is_some()
    }

    /// Send a JSON request and return the JSON response body.
    pub async fn request(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.url(endpoint);
        debug!("API {} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(token) = &self.session_token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::Api(format!(
                "request to {} failed: {} - {}",
                endpoint, status, text
            )));
        }

        Ok(response.json().await?)
    }

    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value> {
        self.request(endpoint, Method::POST, Some(body)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str, token: Option<&str>) -> ApiClient {
        ApiClient::new(&ApiConfig {
            base_url: base_url.to_string(),
            session_token: token.map(String::from),
        })
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = client("http://localhost:3000/", None);
        assert_eq!(api.url("/api/cover-letter"), "http://localhost:3000/api/cover-letter");
        assert_eq!(api.url("api/resume"), "http://localhost:3000/api/resume");
    }

    #[test]
    fn token_marks_client_authenticated() {
        assert!(!client("http://localhost:3000", None).is_authenticated());
        assert!(client("http://localhost:3000", Some("abc")).is_authenticated());
    }

    #[tokio::test]
    async fn unreachable_backend_is_http_error() {
        let api = client("http://127.0.0.1:9", None);
        let err = api.post("/api/answer", &serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }
}
