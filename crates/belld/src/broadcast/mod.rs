//! The recurring broadcasts and the machinery they share.

mod christmas;
mod new_year;
mod year_progress;

pub use christmas::Christmas;
pub use new_year::NewYear;
pub use year_progress::YearProgress;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serenity::all::{ChannelId, CreateMessage, EditMessage, GetMessages, UserId};
use serenity::async_trait;
use serenity::client::Context as SerenityContext;
use thiserror::Error;
use tracing::warn;

use crate::announce::{self, MessageRef, Reconcile};
use crate::config::Config;

/// Which dispatcher timer a broadcast rides on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interval {
    Daily,
    Minutely,
}

/// One recurring content unit.
///
/// The default `update` is the single-message reconciliation: edit the
/// channel's latest message when it is ours, otherwise send. Variants
/// with richer channel choreography override it.
#[async_trait]
pub trait Broadcast: Send + Sync {
    fn name(&self) -> &'static str;

    fn channel_id(&self) -> ChannelId;

    fn interval(&self) -> Interval;

    /// Whether this broadcast has anything to say right now.
    fn enabled(&self, now: DateTime<Utc>) -> bool;

    fn render(&self, now: DateTime<Utc>) -> String;

    async fn update(&self, ctx: &SerenityContext, bot: UserId, now: DateTime<Utc>) -> Result<()> {
        update_single(ctx, self.channel_id(), bot, &self.render(now)).await
    }
}

/// Edit-or-send against the channel's most recent message. A failed
/// history fetch degrades to sending a fresh message: a duplicate in the
/// channel beats a silently missing update.
pub(crate) async fn update_single(
    ctx: &SerenityContext,
    channel: ChannelId,
    bot: UserId,
    content: &str,
) -> Result<()> {
    let history = fetch_history(ctx, channel, bot, 1).await;

    match announce::single_action(&history) {
        Reconcile::Edit(id) => {
            channel
                .edit_message(&ctx.http, id, EditMessage::new().content(content))
                .await
                .context("Failed to edit countdown message")?;
        }
        Reconcile::Send => {
            channel
                .send_message(&ctx.http, CreateMessage::new().content(content))
                .await
                .context("Failed to send countdown message")?;
        }
    }
    Ok(())
}

/// Snapshots the last `limit` messages of a channel or thread, newest
/// first. Transient fetch failures are logged and flattened to an empty
/// history so reconciliation falls through to `Send`.
pub(crate) async fn fetch_history(
    ctx: &SerenityContext,
    channel: ChannelId,
    bot: UserId,
    limit: u8,
) -> Vec<MessageRef> {
    match channel
        .messages(&ctx.http, GetMessages::new().limit(limit))
        .await
    {
        Ok(messages) => messages
            .iter()
            .map(|message| MessageRef::of(message, bot))
            .collect(),
        Err(e) => {
            warn!(channel = channel.get(), error = %e, "History fetch failed, assuming empty");
            Vec::new()
        }
    }
}

/// Broadcast-configuration problems, all fatal at startup.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Unknown reference timezone: {0}")]
    UnknownTimezone(String),
    #[error("Channel id for `{0}` must be a nonzero Discord snowflake")]
    InvalidChannel(&'static str),
}

/// Every broadcast this process runs, built once at startup.
pub struct Registry {
    pub broadcasts: Vec<Box<dyn Broadcast>>,
    pub timezone: Tz,
}

/// Validates the configuration and assembles the broadcast list.
pub fn registry(config: &Config) -> Result<Registry, RegistryError> {
    let timezone: Tz = config
        .schedule
        .timezone
        .parse()
        .map_err(|_| RegistryError::UnknownTimezone(config.schedule.timezone.clone()))?;

    let channel = |name: &'static str, id: u64| {
        if id == 0 {
            Err(RegistryError::InvalidChannel(name))
        } else {
            Ok(ChannelId::new(id))
        }
    };

    let broadcasts: Vec<Box<dyn Broadcast>> = vec![
        Box::new(YearProgress::new(
            channel("year_progress", config.channels.year_progress)?,
            timezone,
        )),
        Box::new(Christmas::new(
            channel("christmas", config.channels.christmas)?,
            timezone,
        )),
        Box::new(NewYear::new(channel("new_year", config.channels.new_year)?)),
    ];

    Ok(Registry {
        broadcasts,
        timezone,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChannelsConfig, DiscordConfig, ScheduleConfig};

    fn config() -> Config {
        Config {
            discord: DiscordConfig {
                token: "token".to_string(),
            },
            channels: ChannelsConfig {
                year_progress: 1,
                christmas: 2,
                new_year: 3,
            },
            schedule: ScheduleConfig {
                timezone: "Europe/London".to_string(),
            },
        }
    }

    #[test]
    fn registry_builds_all_three_broadcasts() {
        let registry = registry(&config()).unwrap();
        assert_eq!(registry.broadcasts.len(), 3);
        assert_eq!(registry.timezone, chrono_tz::Europe::London);

        let daily = registry
            .broadcasts
            .iter()
            .filter(|b| b.interval() == Interval::Daily)
            .count();
        assert_eq!(daily, 2);
    }

    #[test]
    fn registry_rejects_unknown_timezone() {
        let mut bad = config();
        bad.schedule.timezone = "Europe/Atlantis".to_string();
        assert!(matches!(
            registry(&bad),
            Err(RegistryError::UnknownTimezone(_))
        ));
    }

    #[test]
    fn registry_rejects_zero_channel_id() {
        let mut bad = config();
        bad.channels.christmas = 0;
        assert!(matches!(
            registry(&bad),
            Err(RegistryError::InvalidChannel("christmas"))
        ));
    }
}
