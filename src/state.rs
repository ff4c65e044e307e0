// Application state shared by all handlers.
//
// Only immutable collaborators live here: every request runs its own
// pipeline and nothing is cached between requests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use reqwest::Client;

use crate::config::{Config, TrackerConfig};
use crate::gateway::{GroqGateway, ModelGateway};
use crate::tracker::{IssueTracker, JiraClient};

/// Central application state. Clone-friendly - everything inside is an Arc.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn ModelGateway>,
    pub tracker: Arc<dyn IssueTracker>,
    pub start_time: Instant,
    /// `true` once the listener is bound.
    pub ready: Arc<AtomicBool>,
}

impl AppState {
    /// Wire the real Groq gateway and Jira client from configuration.
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .connect_timeout(Duration::from_secs(5))
            .user_agent(concat!("storytests-backend/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;

        if config.groq.api_key.is_none() {
            tracing::warn!("GROQ_API_KEY not set - /api/generate will fail until it is configured");
        }
        match &config.jira {
            TrackerConfig::Configured(jira) => {
                tracing::info!(base_url = %jira.base_url, "issue tracker integration enabled");
            }
            TrackerConfig::Missing(missing) => {
                tracing::warn!(
                    "issue tracker integration disabled (missing {})",
                    missing.join(", ")
                );
            }
        }

        tracing::info!(model = %config.groq.model, "AppState initialised");

        Ok(Self::with_collaborators(
            Arc::new(GroqGateway::new(client.clone(), config.groq.clone())),
            Arc::new(JiraClient::new(client, config.jira.clone())),
        ))
    }

    /// Build state around arbitrary collaborators (tests inject fakes here).
    pub fn with_collaborators(
        gateway: Arc<dyn ModelGateway>,
        tracker: Arc<dyn IssueTracker>,
    ) -> Self {
        Self {
            gateway,
            tracker,
            start_time: Instant::now(),
            ready: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::Relaxed);
        tracing::info!("Backend marked as READY");
    }
}
