//! Browser `fetch` transport and `setTimeout` sleeper for the core flow.
use async_trait::async_trait;
use kingdom_game::{ContentTransport, Sleeper, TransportError, TransportResponse};
use std::time::Duration;

use crate::dom;

/// Posts every request to one content endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTransport {
    endpoint: String,
}

impl FetchTransport {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait(?Send)]
impl ContentTransport for FetchTransport {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError> {
        let (status, body) = dom::post_json(&self.endpoint, &body)
            .await
            .map_err(|err| TransportError(dom::js_error_message(&err)))?;
        Ok(TransportResponse { status, body })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeoutSleeper;

#[async_trait(?Send)]
impl Sleeper for TimeoutSleeper {
    async fn sleep(&self, duration: Duration) {
        let ms = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        if let Err(err) = dom::sleep_ms(ms).await {
            log::warn!("timer failed: {}", dom::js_error_message(&err));
        }
    }
}
