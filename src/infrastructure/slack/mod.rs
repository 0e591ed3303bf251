pub mod client;
pub mod types;

pub use client::SlackClient;
pub use types::{
    parse_user_id, slack_escape, slack_mention, SlackContext, SlackEvent, SlackResponse,
};
