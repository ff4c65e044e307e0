// Service configuration, read from the environment (after `.env`).

use std::time::Duration;

use anyhow::{Context, Result};
use url::Url;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
const DEFAULT_GROQ_TIMEOUT_SECS: u64 = 60;
const DEFAULT_JIRA_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CORS_ORIGINS: [&str; 4] = [
    "http://localhost:5173",
    "http://127.0.0.1:5173",
    "http://localhost:3000",
    "http://127.0.0.1:3000",
];

const JIRA_VARS: [&str; 3] = ["JIRA_BASE_URL", "JIRA_EMAIL", "JIRA_API_TOKEN"];

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub groq: GroqSettings,
    pub jira: TrackerConfig,
    pub cors_origins: Vec<String>,
}

/// Generation-service settings. `api_key == None` leaves the gateway
/// unconfigured; calls then fail instead of the process refusing to start.
#[derive(Debug, Clone)]
pub struct GroqSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: Url,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct JiraSettings {
    pub base_url: Url,
    pub email: String,
    pub api_token: String,
    pub timeout: Duration,
}

/// Issue-tracker integration needs all three of base URL, email and token.
#[derive(Debug, Clone)]
pub enum TrackerConfig {
    Configured(JiraSettings),
    Missing(Vec<&'static str>),
}

impl TrackerConfig {
    pub fn is_configured(&self) -> bool {
        matches!(self, TrackerConfig::Configured(_))
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.parse().with_context(|| format!("PORT is not a valid port: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let groq = GroqSettings {
            api_key: get("GROQ_API_KEY"),
            model: get("GROQ_MODEL").unwrap_or_else(|| DEFAULT_GROQ_MODEL.to_string()),
            base_url: parse_url(
                "GROQ_BASE_URL",
                &get("GROQ_BASE_URL").unwrap_or_else(|| DEFAULT_GROQ_BASE_URL.to_string()),
            )?,
            timeout: secs(get("GROQ_TIMEOUT_SECS"), "GROQ_TIMEOUT_SECS", DEFAULT_GROQ_TIMEOUT_SECS)?,
        };

        let jira_values: Vec<Option<String>> = JIRA_VARS.iter().map(|k| get(*k)).collect();
        let jira = match (&jira_values[0], &jira_values[1], &jira_values[2]) {
            (Some(base), Some(email), Some(token)) => TrackerConfig::Configured(JiraSettings {
                base_url: parse_url("JIRA_BASE_URL", base)?,
                email: email.clone(),
                api_token: token.clone(),
                timeout: secs(get("JIRA_TIMEOUT_SECS"), "JIRA_TIMEOUT_SECS", DEFAULT_JIRA_TIMEOUT_SECS)?,
            }),
            _ => TrackerConfig::Missing(
                JIRA_VARS
                    .iter()
                    .zip(&jira_values)
                    .filter(|(_, v)| v.is_none())
                    .map(|(k, _)| *k)
                    .collect(),
            ),
        };

        let cors_origins = match get("CORS_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect(),
            None => DEFAULT_CORS_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        Ok(Self { port, groq, jira, cors_origins })
    }
}

fn parse_url(var: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).with_context(|| format!("{var} is not a valid URL: {raw}"))?;
    if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
        anyhow::bail!("{var} must be an http(s) base URL: {raw}");
    }
    Ok(url)
}

fn secs(raw: Option<String>, var: &str, default: u64) -> Result<Duration> {
    let secs = match raw {
        Some(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{var} must be a whole number of seconds: {raw}"))?,
        None => default,
    };
    if secs == 0 {
        anyhow::bail!("{var} must be greater than zero");
    }
    Ok(Duration::from_secs(secs))
}
