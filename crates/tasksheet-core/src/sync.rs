use std::time::Duration;

use anyhow::{Context, anyhow};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The endpoint acknowledged the record.
    Saved,
    /// Delivery could not be observed; success is assumed, not
    /// confirmed. Treat as non-authoritative.
    Assumed,
    /// Transport error or non-success status. Detail is already
    /// logged; the local list is untouched.
    Failed(String),
}

impl SyncOutcome {
    pub fn notice_text(&self) -> &'static str {
        match self {
            SyncOutcome::Saved | SyncOutcome::Assumed => "Saved to sheet.",
            SyncOutcome::Failed(_) => "Could not save to sheet.",
        }
    }
}

/// Best-effort mirror of a newly created task to the external sheet.
/// Implementations fire exactly once per add, never retry, and never
/// touch the already-persisted local list.
pub trait SyncAdapter {
    fn notify_created(&self, task: &Task) -> SyncOutcome;
}

#[derive(Serialize)]
struct CreatedRecord<'a> {
    title: &'a str,
    status: &'a str,
}

/// Direct POST variant: JSON body, readable response.
pub struct JsonPostSync {
    client: reqwest::blocking::Client,
    endpoint: String,
}

impl JsonPostSync {
    pub fn new(endpoint: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed building HTTP client for sheet sync")?;
        Ok(Self { client, endpoint })
    }
}

impl SyncAdapter for JsonPostSync {
    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    fn notify_created(&self, task: &Task) -> SyncOutcome {
        let record = CreatedRecord {
            title: &task.title,
            status: &task.status,
        };

        match self.client.post(&self.endpoint).json(&record).send() {
            Ok(response) if response.status().is_success() => {
                info!(status = %response.status(), "sheet accepted new task");
                SyncOutcome::Saved
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().unwrap_or_default();
                warn!(status = %status, body = %body, "sheet rejected new task");
                SyncOutcome::Failed(format!("HTTP {status}"))
            }
            Err(err) => {
                warn!(error = %err, "sheet request failed");
                SyncOutcome::Failed(err.to_string())
            }
        }
    }
}

/// The opaque field identifiers the form endpoint expects, mapped from
/// configuration (`sync.field.*`).
#[derive(Debug, Clone)]
pub struct FormFields {
    pub title: String,
    pub status: String,
    pub created: String,
}

/// Form-submit variant, for endpoints whose responses cannot be read
/// cross-origin. The request is capped at `sync.assume.ms` and the
/// outcome is reported as assumed success either way; this reproduces
/// the source heuristic and must not be read as confirmation.
pub struct FormPostSync {
    client: reqwest::blocking::Client,
    endpoint: String,
    fields: FormFields,
}

impl FormPostSync {
    pub fn new(endpoint: String, fields: FormFields, assume_after: Duration) -> anyhow::Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(assume_after)
            .build()
            .context("failed building HTTP client for form sync")?;
        Ok(Self {
            client,
            endpoint,
            fields,
        })
    }
}

impl SyncAdapter for FormPostSync {
    #[tracing::instrument(skip(self, task), fields(id = task.id))]
    fn notify_created(&self, task: &Task) -> SyncOutcome {
        let form = [
            (self.fields.title.as_str(), task.title.as_str()),
            (self.fields.status.as_str(), task.status.as_str()),
            (self.fields.created.as_str(), task.created_at.as_str()),
        ];

        match self.client.post(&self.endpoint).form(&form).send() {
            Ok(response) => {
                debug!(status = %response.status(), "form submission completed");
            }
            Err(err) if err.is_timeout() => {
                debug!("form submission still in flight at deadline; assuming delivered");
            }
            Err(err) => {
                warn!(error = %err, "form submission outcome unobservable; assuming delivered");
            }
        }

        SyncOutcome::Assumed
    }
}

/// Picks the adapter from `sync.mode`. `off` (the default) means no
/// mirroring at all.
pub fn from_config(cfg: &Config) -> anyhow::Result<Option<Box<dyn SyncAdapter>>> {
    let mode = cfg.get("sync.mode").unwrap_or_else(|| "off".to_string());

    match mode.as_str() {
        "off" => Ok(None),
        "json" => {
            let url = require_url(cfg)?;
            let timeout = millis(cfg, "sync.timeout.ms", 10_000)?;
            Ok(Some(Box::new(JsonPostSync::new(url, timeout)?)))
        }
        "form" => {
            let url = require_url(cfg)?;
            let assume_after = millis(cfg, "sync.assume.ms", 1_500)?;
            let fields = FormFields {
                title: cfg
                    .get("sync.field.title")
                    .unwrap_or_else(|| "title".to_string()),
                status: cfg
                    .get("sync.field.status")
                    .unwrap_or_else(|| "status".to_string()),
                created: cfg
                    .get("sync.field.created")
                    .unwrap_or_else(|| "createdAt".to_string()),
            };
            Ok(Some(Box::new(FormPostSync::new(url, fields, assume_after)?)))
        }
        other => Err(anyhow!("invalid sync.mode: {other} (expected off, json, or form)")),
    }
}

fn require_url(cfg: &Config) -> anyhow::Result<String> {
    cfg.get("sync.url")
        .filter(|url| !url.trim().is_empty())
        .ok_or_else(|| anyhow!("sync.url must be set when sync.mode is enabled"))
}

fn millis(cfg: &Config, key: &str, default: u64) -> anyhow::Result<Duration> {
    Ok(Duration::from_millis(cfg.get_u64(key)?.unwrap_or(default)))
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    fn config_with(overrides: &[(&str, &str)]) -> Config {
        let mut cfg = Config::load(Some(Path::new("/dev/null"))).expect("load config");
        cfg.apply_overrides(
            overrides
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string())),
        );
        cfg
    }

    #[test]
    fn sync_off_yields_no_adapter() {
        let cfg = config_with(&[]);
        assert!(from_config(&cfg).expect("from_config").is_none());
    }

    #[test]
    fn enabled_modes_require_a_url() {
        let cfg = config_with(&[("sync.mode", "json")]);
        assert!(from_config(&cfg).is_err());

        let cfg = config_with(&[("sync.mode", "form"), ("sync.url", "   ")]);
        assert!(from_config(&cfg).is_err());
    }

    #[test]
    fn unknown_mode_is_rejected() {
        let cfg = config_with(&[("sync.mode", "webhook"), ("sync.url", "http://x")]);
        assert!(from_config(&cfg).is_err());
    }
}
