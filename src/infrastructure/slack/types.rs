//! Slack value types and text helpers.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use serde_json::{json, Value};

static ESCAPED_TOKEN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^<.*?>$").expect("escaped token pattern is valid")
});

static USER_ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^<@(?P<user_id>U\w+)(\|.*?)?>$")
        .case_insensitive(true)
        .build()
        .expect("user id pattern is valid")
});

/// The requesting user plus the (team, channel) scope of a Slack request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackContext {
    pub user_id: String,
    pub channel_id: String,
    pub team_id: String,
}

impl SlackContext {
    pub fn new(
        user_id: impl Into<String>,
        channel_id: impl Into<String>,
        team_id: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            channel_id: channel_id.into(),
            team_id: team_id.into(),
        }
    }
}

/// A response to a Slack request, visible either to the whole channel
/// (broadcast) or only to the requester (ephemeral).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlackResponse {
    pub text: String,
    pub ephemeral: bool,
}

impl SlackResponse {
    /// A broadcast response, visible to the whole channel.
    pub fn broadcast(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: false,
        }
    }

    /// A response visible only to the requester.
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
        }
    }

    /// Serialize as Slack slash-command response JSON.
    pub fn to_json(&self) -> Value {
        json!({
            "text": self.text,
            "response_type": if self.ephemeral { "ephemeral" } else { "in_channel" },
        })
    }
}

/// A parsed Slack Events API callback.
#[derive(Debug, Clone)]
pub struct SlackEvent {
    pub event_type: String,
    /// User id of the bot itself, from the event authorizations.
    pub authorized_user_id: String,
    pub context: SlackContext,
    /// Message text, for message-like events.
    pub text: String,
    pub thread_ts: Option<String>,
}

impl SlackEvent {
    /// Parse an `event_callback` payload.
    pub fn from_json(payload: &Value) -> Result<Self> {
        let event = payload
            .get("event")
            .ok_or_else(|| anyhow!("event payload missing 'event'"))?;
        let event_type = event
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("event payload missing event type"))?
            .to_lowercase();
        let user_id = event
            .get("user")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("event payload missing user"))?;
        let channel_id = event
            .get("channel")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("event payload missing channel"))?;
        let team_id = payload
            .get("team_id")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("event payload missing team_id"))?;
        let authorized_user_id = payload
            .get("authorizations")
            .and_then(|a| a.get(0))
            .and_then(|a| a.get("user_id"))
            .and_then(Value::as_str)
            .context("event payload missing authorizations")?;

        Ok(Self {
            event_type,
            authorized_user_id: authorized_user_id.to_string(),
            context: SlackContext::new(user_id, channel_id, team_id),
            text: event
                .get("text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            thread_ts: event
                .get("thread_ts")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

/// Extract the user id from a Slack mention token like `<@U123|name>`.
pub fn parse_user_id(token: &str) -> Option<String> {
    USER_ID_PATTERN
        .captures(token)
        .map(|captures| captures["user_id"].to_string())
}

/// Format a user id as a Slack mention.
pub fn slack_mention(user_id: &str) -> String {
    format!("<@{user_id}>")
}

/// Escape message tokens for Slack, leaving already-escaped mentions and
/// links untouched.
pub fn slack_escape(tokens: &[&str]) -> String {
    tokens
        .iter()
        .map(|token| {
            if ESCAPED_TOKEN_PATTERN.is_match(token) {
                (*token).to_string()
            } else {
                token
                    .replace('&', "&amp;")
                    .replace('<', "&lt;")
                    .replace('>', "&gt;")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
