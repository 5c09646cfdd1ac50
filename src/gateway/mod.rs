//! External knowledge gateway
//!
//! Answers weather, encyclopedia and news queries. Every method is total: a
//! failure is reported inside the returned text, never as an error.

mod http;

pub use http::HttpGateway;

use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Best-effort answers from outside the dialogue engine
#[async_trait]
pub trait KnowledgeGateway: Send + Sync {
    async fn weather(&self, location: &str) -> String;

    async fn wikipedia_summary(&self, topic: &str) -> String;

    async fn news_headlines(&self, category: &str) -> String;
}

/// The three gateway services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayService {
    Weather,
    Wikipedia,
    News,
}

impl GatewayService {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Wikipedia => "wikipedia",
            Self::News => "news",
        }
    }

    pub fn unavailable_message(&self) -> &'static str {
        match self {
            Self::Weather => "⚠️ Weather service is currently unavailable.",
            Self::Wikipedia => "⚠️ Wikipedia service is currently unavailable.",
            Self::News => "⚠️ News service is currently unavailable.",
        }
    }
}

impl std::fmt::Display for GatewayService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Await a gateway call, answering with the service's unavailable text on timeout
pub async fn call_with_timeout<F>(service: GatewayService, timeout: Duration, call: F) -> String
where
    F: Future<Output = String>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(answer) => answer,
        Err(_) => {
            warn!("{} gateway call timed out after {:?}", service, timeout);
            service.unavailable_message().to_string()
        }
    }
}
