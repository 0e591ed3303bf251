//! Outbound Slack Web API client.

use std::time::Duration;

use anyhow::{Context, Result};
use serde_json::{json, Value};
use tracing::warn;

use crate::domain::models::SlackConfig;
use crate::infrastructure::slack::types::SlackContext;

/// Client for posting messages back to Slack outside the request/response
/// cycle (used by the async event workers).
pub struct SlackClient {
    http: reqwest::Client,
    api_base: String,
}

impl SlackClient {
    pub fn new(config: &SlackConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build Slack HTTP client")?;

        Ok(Self {
            http,
            api_base: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Post a message to the channel in `context`, optionally threaded.
    ///
    /// Delivery is best-effort: failures are logged and dropped, never
    /// surfaced to the caller (there is nobody left to surface them to).
    pub async fn post_message(&self, text: &str, context: &SlackContext, thread_ts: Option<&str>) {
        let Some(token) = Self::api_token(&context.team_id) else {
            warn!(team_id = %context.team_id, "no Slack API token configured for team");
            return;
        };

        let mut payload = json!({
            "channel": context.channel_id,
            "text": text,
        });
        if let Some(thread_ts) = thread_ts {
            payload["thread_ts"] = Value::String(thread_ts.to_string());
        }

        let url = format!("{}/chat.postMessage", self.api_base);
        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await;

        match response {
            Err(e) => warn!("failed to post message to Slack: {e}"),
            Ok(response) if !response.status().is_success() => {
                warn!(
                    "failed to post message to Slack: received HTTP {}",
                    response.status()
                );
            }
            Ok(response) => {
                // Slack reports API-level errors in the body with HTTP 200.
                match response.json::<Value>().await {
                    Ok(body) if body.get("ok").and_then(Value::as_bool) != Some(true) => {
                        let error = body
                            .get("error")
                            .and_then(Value::as_str)
                            .unwrap_or("unknown");
                        warn!("failed to post message to Slack: received error: {error}");
                    }
                    Ok(_) => {}
                    Err(e) => warn!("failed to read Slack response: {e}"),
                }
            }
        }
    }

    /// Per-team bot token, from the `SLACK_API_TOKEN_<team>` environment.
    fn api_token(team_id: &str) -> Option<String> {
        std::env::var(format!("SLACK_API_TOKEN_{team_id}")).ok()
    }
}
