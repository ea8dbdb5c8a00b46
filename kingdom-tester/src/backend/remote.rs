use async_trait::async_trait;
use kingdom_game::{ContentTransport, TransportError, TransportResponse};
use reqwest::header::CONTENT_TYPE;
use std::time::Duration;

/// Posts to a live content endpoint.
pub struct RemoteBackend {
    client: reqwest::Client,
    endpoint: String,
}

impl RemoteBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> reqwest::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait(?Send)]
impl ContentTransport for RemoteBackend {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|err| TransportError(err.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| TransportError(err.to_string()))?;
        log::debug!("{} answered {status}", self.endpoint);
        Ok(TransportResponse { status, body })
    }
}
