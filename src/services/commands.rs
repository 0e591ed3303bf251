//! Slash command parsing and dispatch.
//!
//! Every user-facing interaction flows through [`CommandHandler::handle`],
//! whether it arrived as a slash command or an app mention. Responses are
//! either broadcast to the channel or ephemeral to the requester.

use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::{error, info, warn};

use crate::domain::models::{HaikuLine, LinePosition, Scope, SyllableCount};
use crate::domain::ports::LineRepository;
use crate::infrastructure::slack::{
    parse_user_id, slack_escape, slack_mention, SlackContext, SlackResponse,
};
use crate::services::blame::BlameTracker;
use crate::services::composer::PoemComposer;
use crate::services::stats::StatsAggregator;

/// Accepts `5`, `7`, `five`, `seven` (optionally pluralized) with an optional
/// position suffix like `5[first]`, `5[^]`, `5[$]`.
static SYLLABLE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    RegexBuilder::new(r"^(?P<count>5|7|five|seven)s?(\[(?P<position>\^|\$|1st|first|last)\])?$")
        .case_insensitive(true)
        .build()
        .expect("syllable pattern is valid")
});

/// A parsed syllable spec token.
struct SyllableSpec {
    syllables: SyllableCount,
    position: Option<LinePosition>,
    /// The position token as the user typed it, for error messages.
    position_token: Option<String>,
}

fn parse_syllable_spec(token: &str) -> Option<SyllableSpec> {
    let captures = SYLLABLE_PATTERN.captures(token)?;

    let syllables = match captures["count"].to_lowercase().as_str() {
        "5" | "five" => SyllableCount::Five,
        _ => SyllableCount::Seven,
    };

    let position_token = captures
        .name("position")
        .map(|m| m.as_str().to_string());
    let position = position_token
        .as_deref()
        .map(|token| match token.to_lowercase().as_str() {
            "^" | "1st" | "first" => LinePosition::First,
            _ => LinePosition::Last,
        });

    Some(SyllableSpec {
        syllables,
        position,
        position_token,
    })
}

fn format_count(n: i64) -> String {
    let digits: Vec<char> = n.to_string().chars().collect();
    let mut formatted = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }
    formatted
}

/// Dispatches parsed commands to the composer, repositories, and aggregators.
pub struct CommandHandler {
    lines: Arc<dyn LineRepository>,
    composer: PoemComposer,
    stats: StatsAggregator,
    blame: BlameTracker,
}

impl CommandHandler {
    pub fn new(
        lines: Arc<dyn LineRepository>,
        composer: PoemComposer,
        stats: StatsAggregator,
        blame: BlameTracker,
    ) -> Self {
        Self {
            lines,
            composer,
            stats,
            blame,
        }
    }

    /// Handle a command invocation. `command` is the invocation prefix as
    /// displayed to the user (`/haiku` or the bot mention), `text` is
    /// everything after it. Never fails: internal errors are logged and
    /// turned into an ephemeral apology.
    pub async fn handle(&self, command: &str, text: &str, context: &SlackContext) -> SlackResponse {
        match self.dispatch(command, text, context).await {
            Ok(response) => response,
            Err(e) => {
                error!(
                    user_id = %context.user_id,
                    team_id = %context.team_id,
                    "failed to handle command '{command} {text}': {e:#}"
                );
                SlackResponse::ephemeral("⚠️ Something went wrong! Please try again later.")
            }
        }
    }

    async fn dispatch(
        &self,
        command: &str,
        text: &str,
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let text = text.trim();
        if text.is_empty() {
            return self.generate(context, None, None).await;
        }

        let mut args: Vec<&str> = text.split_whitespace().collect();
        let subcommand = args.remove(0).to_lowercase();

        match subcommand.as_str() {
            "add" | "remove" => {
                self.handle_add_remove(command, &subcommand, &args, context)
                    .await
            }
            "blame" | "praise" => {
                if !args.is_empty() {
                    return Ok(SlackResponse::ephemeral(format!(
                        "Usage: {command} {subcommand}"
                    )));
                }
                self.blame_response(context).await
            }
            "claim" => self.handle_claim(command, &args, context).await,
            "about" => self.handle_about(command, &args, context).await,
            "by" => self.handle_by(command, &args, context).await,
            "stats" => self.handle_stats(command, &args, context).await,
            "version" => {
                if !args.is_empty() {
                    return Ok(SlackResponse::ephemeral(format!("Usage: {command} version")));
                }
                Ok(SlackResponse::ephemeral(format!(
                    "🤖 haikubot version {}",
                    crate::VERSION
                )))
            }
            _ => Ok(Self::help(command)),
        }
    }

    fn help(command: &str) -> SlackResponse {
        SlackResponse::ephemeral(format!(
            "Usage:\n\
             *{command}* => generate a random haiku from remembered lines\n\
             *{command} about <topic>* => generate a random haiku about a specific topic or keyword\n\
             *{command} by <user>* => generate a random haiku by a specific user\n\
             *{command} add 5|7 <line>* => remember a line of 5 or 7 syllables\n\
             *{command} remove 5|7 <line>* => remove a line of 5 or 7 syllables\n\
             *{command} claim 5|7 <line>* => claim a line of 5 or 7 syllables from another user\n\
             *{command} blame* => show the users who wrote the last haiku in this channel\n\
             *{command} stats* => show statistics about remembered lines and poems\n\
             *{command} stats for <user>* => show statistics about a specific user"
        ))
    }

    async fn handle_add_remove(
        &self,
        command: &str,
        subcommand: &str,
        args: &[&str],
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let spec = if args.len() >= 2 {
            parse_syllable_spec(args[0])
        } else {
            None
        };
        let Some(spec) = spec else {
            if subcommand == "add" {
                return Ok(SlackResponse::ephemeral(format!(
                    "Usage:\n\
                     *{command} add 5|7 <line>* => remember a line of 5 or 7 syllables\n\
                     *{command} add 5[first] <line>* => remember 5 syllables to appear as the first line in a haiku\n\
                     *{command} add 5[last] <line>* => remember 5 syllables to appear as the last line in a haiku"
                )));
            }
            return Ok(SlackResponse::ephemeral(format!(
                "Usage: {command} remove 5|7 <line>"
            )));
        };

        let line = slack_escape(&args[1..]);
        if subcommand == "add" {
            if spec.syllables == SyllableCount::Seven {
                if let Some(token) = &spec.position_token {
                    return Ok(SlackResponse::ephemeral(format!(
                        "Position ({token}) may only be included for 5-syllable lines!"
                    )));
                }
            }
            self.add_line(&line, spec.syllables, spec.position, context)
                .await
        } else {
            self.remove_line(&line, spec.syllables, context).await
        }
    }

    async fn handle_claim(
        &self,
        command: &str,
        args: &[&str],
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let spec = if args.len() >= 2 {
            parse_syllable_spec(args[0])
        } else {
            None
        };
        let Some(spec) = spec else {
            return Ok(SlackResponse::ephemeral(format!(
                "Usage: {command} claim 5|7 <line>"
            )));
        };
        if let Some(token) = &spec.position_token {
            return Ok(SlackResponse::ephemeral(format!(
                "Position ({token}) may only be included when adding lines!"
            )));
        }

        let line = slack_escape(&args[1..]);
        self.claim_line(&line, spec.syllables, context).await
    }

    async fn handle_about(
        &self,
        command: &str,
        args: &[&str],
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        if args.is_empty() {
            return Ok(SlackResponse::ephemeral(format!(
                "Usage: {command} about <topic>"
            )));
        }
        let search_term = slack_escape(args);
        // Match-anything patterns are just an unconstrained generation.
        if matches!(search_term.as_str(), "." | ".*" | ".+") {
            return self.generate(context, None, None).await;
        }
        self.generate(context, None, Some(&search_term)).await
    }

    async fn handle_by(
        &self,
        command: &str,
        args: &[&str],
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        if args.len() != 1 {
            return Ok(SlackResponse::ephemeral(format!(
                "Usage: {command} by <user>"
            )));
        }
        let user_id = if args[0].eq_ignore_ascii_case("me") {
            context.user_id.clone()
        } else {
            match parse_user_id(args[0]) {
                Some(user_id) => user_id,
                None => {
                    return Ok(SlackResponse::ephemeral(format!(
                        "You need to tag a user by name! Example: {command} by {}",
                        slack_mention(&context.user_id)
                    )));
                }
            }
        };
        self.generate(context, Some(&user_id), None).await
    }

    async fn handle_stats(
        &self,
        command: &str,
        args: &[&str],
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let mut user_id = None;
        if !args.is_empty() {
            let preposition_ok = matches!(
                args[0].to_lowercase().as_str(),
                "about" | "by" | "for"
            );
            if args.len() != 2 || !preposition_ok {
                return Ok(SlackResponse::ephemeral(format!(
                    "Usage: {command} stats [for <user>]"
                )));
            }
            user_id = if args[1].eq_ignore_ascii_case("me") {
                Some(context.user_id.clone())
            } else {
                match parse_user_id(args[1]) {
                    Some(user_id) => Some(user_id),
                    None => {
                        return Ok(SlackResponse::ephemeral(format!(
                            "You need to tag a user by name! Example: {command} stats for {}",
                            slack_mention(&context.user_id)
                        )));
                    }
                }
            };
        }
        self.stats_response(context, user_id.as_deref()).await
    }

    async fn generate(
        &self,
        context: &SlackContext,
        user_id: Option<&str>,
        search_term: Option<&str>,
    ) -> Result<SlackResponse> {
        let scope = Scope::new(&context.team_id, &context.channel_id);
        if let Some(poem) = self.composer.generate(&scope, user_id, search_term).await? {
            return Ok(SlackResponse::broadcast(poem.text()));
        }

        let mut error = String::from("⚠️ Failed to generate a haiku");
        if let Some(user_id) = user_id {
            error.push_str(&format!(" by {}", slack_mention(user_id)));
        }
        if let Some(search_term) = search_term {
            error.push_str(&format!(" about \"{search_term}\""));
        }
        error.push('!');
        // Broadcast, not ephemeral: this also happens as the echo after
        // adding a line, where the whole channel should see it.
        Ok(SlackResponse::broadcast(error))
    }

    async fn add_line(
        &self,
        text: &str,
        syllables: SyllableCount,
        position: Option<LinePosition>,
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let line = HaikuLine::new(
            text,
            syllables,
            &context.user_id,
            Scope::new(&context.team_id, &context.channel_id),
            position,
        );
        line.validate()?;

        if let Err(e) = self.lines.add(&line).await {
            warn!(
                user_id = %context.user_id,
                team_id = %context.team_id,
                "failed to add line: {e:#}"
            );
            return Ok(SlackResponse::ephemeral(format!(
                "⚠️ Failed to add line: {text}"
            )));
        }

        info!(
            user_id = %context.user_id,
            team_id = %context.team_id,
            channel_id = %context.channel_id,
            "added line: {text}"
        );
        // Echo the new line back inside a freshly generated poem.
        let anchored = format!("^{}$", regex::escape(text));
        self.generate(context, None, Some(&anchored)).await
    }

    async fn remove_line(
        &self,
        text: &str,
        syllables: SyllableCount,
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let removed = self
            .lines
            .remove(text, syllables, &context.team_id)
            .await?;
        if removed == 0 {
            return Ok(SlackResponse::ephemeral(format!(
                "⚠️ Failed to remove line: {text}"
            )));
        }

        info!(
            user_id = %context.user_id,
            team_id = %context.team_id,
            channel_id = %context.channel_id,
            "removed line: {text}"
        );
        Ok(SlackResponse::broadcast(format!("✅ Removed: {text}")))
    }

    async fn claim_line(
        &self,
        text: &str,
        syllables: SyllableCount,
        context: &SlackContext,
    ) -> Result<SlackResponse> {
        let Some(existing) = self.lines.find(text, syllables, &context.team_id).await? else {
            // Claiming a line nobody remembered just adds it.
            return self.add_line(text, syllables, None, context).await;
        };

        if existing.owner == context.user_id {
            return Ok(SlackResponse::ephemeral(
                "You can't claim a line from yourself!",
            ));
        }

        if !self
            .lines
            .claim(text, syllables, &context.team_id, &context.user_id)
            .await?
        {
            return Ok(SlackResponse::ephemeral(format!(
                "⚠️ Failed to claim line: {text}"
            )));
        }

        info!(
            user_id = %context.user_id,
            team_id = %context.team_id,
            original_owner = %existing.owner,
            "claimed line: {text}"
        );
        Ok(SlackResponse::broadcast(format!(
            "{} claimed \"{text}\" from {}",
            slack_mention(&context.user_id),
            slack_mention(&existing.owner)
        )))
    }

    async fn blame_response(&self, context: &SlackContext) -> Result<SlackResponse> {
        let Some(authors) = self
            .blame
            .latest_authors(&context.team_id, &context.channel_id)
            .await?
        else {
            return Ok(SlackResponse::ephemeral(
                "⚠️ Failed to find the latest haiku for this channel!",
            ));
        };

        let mentions = authors
            .iter()
            .map(|user_id| slack_mention(user_id))
            .collect::<Vec<_>>()
            .join(", ");
        let mut response = format!("The last haiku was brought to you by: {mentions}");
        if authors.windows(2).all(|pair| pair[0] == pair[1]) {
            // Solo effort.
            response.push_str(" 🎰");
        }
        Ok(SlackResponse::broadcast(response))
    }

    async fn stats_response(
        &self,
        context: &SlackContext,
        user_id: Option<&str>,
    ) -> Result<SlackResponse> {
        let stats = self.stats.stats(&context.team_id, user_id).await?;

        let response = if let Some(user_id) = user_id {
            format!(
                "*Total lines by {}:* {}\n  \
                 *5 syllables:* {}\n  \
                 *7 syllables:* {}\n\
                 *Total poems contributed to:* {}\n\
                 *Total possible poems:* {}",
                slack_mention(user_id),
                format_count(stats.total_lines()),
                format_count(stats.five_syllable_lines),
                format_count(stats.seven_syllable_lines),
                format_count(stats.total_poems),
                format_count(stats.possible_combinations()),
            )
        } else {
            format!(
                "*Total lines:* {}\n  \
                 *5 syllables:* {}\n  \
                 *7 syllables:* {}\n\
                 *Total poems generated:* {}\n\
                 *Total possible poems:* {}\n\
                 *Total unique contributors:* {}",
                format_count(stats.total_lines()),
                format_count(stats.five_syllable_lines),
                format_count(stats.seven_syllable_lines),
                format_count(stats.total_poems),
                format_count(stats.possible_combinations()),
                format_count(stats.unique_owners),
            )
        };
        Ok(SlackResponse::broadcast(response))
    }
}
