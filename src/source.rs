use std::env;
use std::fs;
use std::time::Duration;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;

use crate::dataset::Dataset;
use crate::duration::DurationPolicy;

const DEFAULT_PATH: &str = "data/bgstats.json";
const REQUEST_TIMEOUT_SECS: u64 = 10;

static CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Where and how to load the export. Resolved once at startup from the
/// first CLI argument, then the environment, then the bundled default.
#[derive(Debug, Clone)]
pub struct LoadSettings {
    pub source: String,
    pub policy: DurationPolicy,
    pub min_plays: u32,
}

impl LoadSettings {
    pub fn from_env_and_args(mut args: impl Iterator<Item = String>) -> LoadSettings {
        let source = args
            .next()
            .or_else(|| env::var("BGSTATS_URL").ok())
            .or_else(|| env::var("BGSTATS_PATH").ok())
            .unwrap_or_else(|| DEFAULT_PATH.to_string());
        let policy = env::var("BGSTATS_DURATION_POLICY")
            .ok()
            .and_then(|raw| DurationPolicy::from_env_str(&raw))
            .unwrap_or_default();
        let min_plays = env::var("BGSTATS_MIN_PLAYS")
            .ok()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .unwrap_or(0);
        LoadSettings {
            source,
            policy,
            min_plays,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.source.starts_with("http://") || self.source.starts_with("https://")
    }
}

/// The single fetch-and-parse boundary. Anything that fails here is a load
/// failure surfaced as one message; past this point the dataset is
/// immutable and computation cannot fail.
pub fn load_dataset(settings: &LoadSettings) -> Result<Dataset> {
    let raw = if settings.is_remote() {
        fetch_remote(&settings.source)?
    } else {
        fs::read_to_string(&settings.source)
            .with_context(|| format!("read dataset file {}", settings.source))?
    };
    Dataset::from_json_str(&raw, settings.policy)
}

fn fetch_remote(url: &str) -> Result<String> {
    let resp = http_client()?
        .get(url)
        .send()
        .with_context(|| format!("fetch dataset from {url}"))?;
    let status = resp.status();
    let body = resp.text().context("failed reading dataset body")?;
    if !status.is_success() {
        return Err(anyhow::anyhow!("http {}: {}", status, body));
    }
    Ok(body)
}
