use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, Url};
use std::fmt;
use tracing::{debug, info};

use crate::config::Config;
use crate::model::{DayKey, LogEntry};

pub mod model;

pub use model::{SheetPayload, SheetResponse};

/// Mirror sink contract. The coordinator only ever makes one best-effort
/// call per sync; retries and failure policy live on the caller's side.
#[async_trait]
pub trait MirrorService: Send + Sync {
    async fn push_day(&self, day: DayKey, entry: &LogEntry) -> Result<SheetResponse>;
}

/// HTTP client for the spreadsheet webhook.
#[derive(Clone)]
pub struct SheetClient {
    http: Client,
    webhook_url: Url,
}

impl fmt::Debug for SheetClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // The webhook URL embeds the deployment secret; keep it out of logs.
        f.debug_struct("SheetClient").finish_non_exhaustive()
    }
}

impl SheetClient {
    pub fn new(webhook_url: Url) -> Self {
        let http = Client::builder()
            .user_agent("punchlog/0.1")
            .build()
            .expect("reqwest client");
        Self { http, webhook_url }
    }

    /// Build the client from config; `None` when the mirror is disabled.
    pub fn from_config(cfg: &Config) -> Result<Option<Self>> {
        if !cfg.sheet.enabled {
            return Ok(None);
        }
        let url = Url::parse(&cfg.sheet.webhook_url).context("invalid sheet.webhook_url")?;
        Ok(Some(Self::new(url)))
    }
}

#[async_trait]
impl MirrorService for SheetClient {
    async fn push_day(&self, day: DayKey, entry: &LogEntry) -> Result<SheetResponse> {
        let payload = SheetPayload::from_entry(day, entry, &Local);
        info!(%day, "pushing day to sheet mirror");
        debug!(
            payload = %serde_json::to_string(&payload).unwrap_or_else(|_| format!("{:?}", payload)),
            "sheet request payload"
        );

        let res = self
            .http
            .post(self.webhook_url.clone())
            .json(&payload)
            .send()
            .await
            .context("failed to reach sheet webhook")?;

        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            return Err(anyhow!("sheet webhook error {}: {}", status, body));
        }

        let response: SheetResponse = res
            .json()
            .await
            .context("invalid sheet webhook response JSON")?;
        debug!(result = %response.result, "sheet response");
        Ok(response)
    }
}
