mod remote;
mod scripted;

pub use remote::RemoteBackend;
pub use scripted::ScriptedBackend;

use async_trait::async_trait;
use clap::ValueEnum;
use kingdom_game::{ContentTransport, Sleeper, TransportError, TransportResponse};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// Seeded in-process content service (fast, deterministic)
    Scripted,
    /// Live content endpoint over HTTP
    Remote,
}

impl BackendKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scripted => "scripted",
            Self::Remote => "remote",
        }
    }
}

/// Where a headless run gets its content from.
pub enum Backend {
    Scripted(ScriptedBackend),
    Remote(RemoteBackend),
}

impl Backend {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Scripted(_) => "scripted",
            Self::Remote(_) => "remote",
        }
    }

    /// Calls served and outages injected, when the backend keeps count.
    pub fn counters(&self) -> Option<(u32, u32)> {
        match self {
            Self::Scripted(backend) => Some((backend.calls(), backend.outages())),
            Self::Remote(_) => None,
        }
    }
}

#[async_trait(?Send)]
impl ContentTransport for Backend {
    async fn post_json(&self, body: String) -> Result<TransportResponse, TransportError> {
        match self {
            Self::Scripted(backend) => backend.post_json(body).await,
            Self::Remote(backend) => backend.post_json(body).await,
        }
    }
}

/// Recipe for a fresh backend per run.
#[derive(Debug, Clone)]
pub enum BackendPlan {
    Scripted { outage_rate: f64 },
    Remote { endpoint: String, timeout: Duration },
}

impl BackendPlan {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build(&self, content_seed: u64) -> reqwest::Result<Backend> {
        match self {
            Self::Scripted { outage_rate } => Ok(Backend::Scripted(ScriptedBackend::new(
                content_seed,
                *outage_rate,
            ))),
            Self::Remote { endpoint, timeout } => {
                Ok(Backend::Remote(RemoteBackend::new(endpoint.clone(), *timeout)?))
            }
        }
    }

    /// Scripted replies arrive within a scheduler tick, so polling there runs
    /// on a virtual clock; live runs really wait.
    pub fn sleeper(&self) -> Box<dyn Sleeper> {
        match self {
            Self::Scripted { .. } => Box::new(VirtualSleeper),
            Self::Remote { .. } => Box::new(TokioSleeper),
        }
    }
}

pub struct TokioSleeper;

#[async_trait(?Send)]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Counts the interval as elapsed after handing control to other local tasks.
pub struct VirtualSleeper;

#[async_trait(?Send)]
impl Sleeper for VirtualSleeper {
    async fn sleep(&self, _duration: Duration) {
        tokio::task::yield_now().await;
    }
}
