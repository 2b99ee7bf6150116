use std::time::Duration as StdDuration;

use anyhow::{Context as _, Result};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, EditMessage, GetMessages, UserId,
};
use serenity::async_trait;
use serenity::client::Context as SerenityContext;
use tracing::{error, info, warn};

use crate::announce::{self, GreetingCheck, GreetingStep, MessageRef, Reconcile};
use crate::broadcast::{self, Broadcast, Interval};
use crate::render;
use crate::timezone::{self, TimezoneBucket};

/// Substring that marks a thread message as a midnight greeting.
pub const GREETING_MARKER: &str = "Happy New Year";

const EMBED_COLOR: u32 = 0x2C2F33;

/// Minute-by-minute New Year broadcast: a single edited-in-place
/// dashboard of every timezone bucket, plus one greeting per arrived
/// bucket posted to the year's celebration thread.
pub struct NewYear {
    channel: ChannelId,
}

impl NewYear {
    pub fn new(channel: ChannelId) -> Self {
        Self { channel }
    }

    /// Keeps exactly one live dashboard message in the channel: edit the
    /// newest bot message with an embed, or send the first one.
    async fn update_dashboard(
        &self,
        ctx: &SerenityContext,
        bot: UserId,
        buckets: &[TimezoneBucket],
        now: DateTime<Utc>,
    ) -> Result<()> {
        let shown = timezone::dashboard_buckets(buckets);
        let description = if shown.is_empty() {
            "Waiting for timezone data...".to_string()
        } else {
            render::dashboard_block(&shown, now)
        };
        let embed = CreateEmbed::new()
            .color(EMBED_COLOR)
            .description(description)
            .footer(CreateEmbedFooter::new(format!(
                "Updated every {}",
                humantime::format_duration(StdDuration::from_secs(60))
            )));
        let content = self.render(now);

        let history = broadcast::fetch_history(ctx, self.channel, bot, 5).await;
        match announce::dashboard_action(&history) {
            Reconcile::Edit(id) => {
                self.channel
                    .edit_message(
                        &ctx.http,
                        id,
                        EditMessage::new().content(content).embed(embed),
                    )
                    .await
                    .context("Failed to edit dashboard")?;
            }
            Reconcile::Send => {
                self.channel
                    .send_message(
                        &ctx.http,
                        CreateMessage::new().content(content).embed(embed),
                    )
                    .await
                    .context("Failed to send dashboard")?;
            }
        }
        Ok(())
    }

    /// Walks arrived buckets, most recently arrived first, and posts at
    /// most one missing greeting per tick. The skip/send/stop policy
    /// lives in [`announce::greeting_step`].
    async fn process_greetings(
        &self,
        ctx: &SerenityContext,
        bot: UserId,
        buckets: &[TimezoneBucket],
        now: DateTime<Utc>,
    ) {
        let year = timezone::target_year(now);

        for bucket in timezone::arrived_recently(buckets) {
            let (check, thread) = self.inspect_thread(ctx, bot, bucket, year).await;
            match announce::greeting_step(check) {
                GreetingStep::Skip => continue,
                GreetingStep::Stop => break,
                GreetingStep::Send => {
                    if let Some(thread) = thread
                        && let Err(e) = self.send_greeting(ctx, thread, bucket, year).await
                    {
                        warn!(bucket = %bucket.name, error = %e, "Failed to send greeting");
                    }
                    break;
                }
            }
        }
    }

    /// Determines whether `bucket` still needs its greeting in the
    /// year's celebration thread. Failures are logged and flattened to
    /// [`GreetingCheck::CheckFailed`], never raised.
    async fn inspect_thread(
        &self,
        ctx: &SerenityContext,
        bot: UserId,
        bucket: &TimezoneBucket,
        year: i32,
    ) -> (GreetingCheck, Option<ChannelId>) {
        let thread_name = format!("in {year}");
        let thread = match self.find_thread(ctx, &thread_name).await {
            Ok(Some(thread)) => thread,
            Ok(None) => return (GreetingCheck::ThreadMissing, None),
            Err(e) => {
                warn!(bucket = %bucket.name, error = %e, "Greeting check failed");
                return (GreetingCheck::CheckFailed, None);
            }
        };

        // Unlike the edit-or-send modes, a failed history fetch must not
        // degrade to "send": that would repeat greetings on every flaky
        // tick.
        let history: Vec<MessageRef> = match thread
            .messages(&ctx.http, GetMessages::new().limit(5))
            .await
        {
            Ok(messages) => messages
                .iter()
                .map(|message| MessageRef::of(message, bot))
                .collect(),
            Err(e) => {
                warn!(bucket = %bucket.name, error = %e, "Greeting check failed");
                return (GreetingCheck::CheckFailed, Some(thread));
            }
        };

        if announce::already_announced(&history, &[GREETING_MARKER, &bucket.name]) {
            (GreetingCheck::AlreadyGreeted, Some(thread))
        } else {
            (GreetingCheck::Ungreeted, Some(thread))
        }
    }

    async fn send_greeting(
        &self,
        ctx: &SerenityContext,
        thread: ChannelId,
        bucket: &TimezoneBucket,
        year: i32,
    ) -> Result<()> {
        info!(bucket = %bucket.name, year, "Sending missing greeting");
        thread
            .send_message(
                &ctx.http,
                CreateMessage::new().content(greeting_text(bucket, year)),
            )
            .await
            .context("Failed to send greeting")?;
        Ok(())
    }

    /// Finds the celebration thread by name, case-insensitively, under
    /// this broadcast's channel. Checks the gateway cache before falling
    /// back to listing the guild's active threads.
    async fn find_thread(&self, ctx: &SerenityContext, name: &str) -> Result<Option<ChannelId>> {
        let parent = self
            .channel
            .to_channel(&ctx.http)
            .await
            .context("Failed to resolve countdown channel")?
            .guild()
            .context("New Year channel is not a guild channel")?;
        let guild_id = parent.guild_id;

        let matches =
            |t: &serenity::all::GuildChannel| {
                t.parent_id == Some(self.channel) && t.name.eq_ignore_ascii_case(name)
            };

        let cached = ctx
            .cache
            .guild(guild_id)
            .and_then(|guild| guild.threads.iter().find(|t| matches(t)).map(|t| t.id));
        if cached.is_some() {
            return Ok(cached);
        }

        let active = guild_id
            .get_active_threads(&ctx.http)
            .await
            .context("Failed to list active threads")?;
        Ok(active.threads.iter().find(|t| matches(t)).map(|t| t.id))
    }
}

#[async_trait]
impl Broadcast for NewYear {
    fn name(&self) -> &'static str {
        "new-year-countdown"
    }

    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    fn interval(&self) -> Interval {
        Interval::Minutely
    }

    fn enabled(&self, now: DateTime<Utc>) -> bool {
        celebration_window(now)
    }

    fn render(&self, _now: DateTime<Utc>) -> String {
        "🎉 As we eagerly await the arrival of the New Year, let's check in on the countdown times across the globe! 🌍\n"
            .to_string()
    }

    async fn update(&self, ctx: &SerenityContext, bot: UserId, now: DateTime<Utc>) -> Result<()> {
        let buckets = timezone::catalog(now);

        // The two passes are independent: a dashboard hiccup must not
        // cost an arrived timezone its greeting.
        if let Err(e) = self.update_dashboard(ctx, bot, &buckets, now).await {
            error!(error = %e, "Dashboard update failed");
        }
        self.process_greetings(ctx, bot, &buckets, now).await;
        Ok(())
    }
}

fn greeting_text(bucket: &TimezoneBucket, year: i32) -> String {
    format!(
        "🎉🥂 **{GREETING_MARKER} {year}** 🥂🎉 to all our friends in **{} ({})**! May the coming year be filled with joy, prosperity, and happiness. 🌟🎆",
        bucket.name, bucket.offset
    )
}

/// The broadcast only runs from one hour before midnight in the world's
/// earliest timezone until two hours after midnight in the latest.
fn celebration_window(now: DateTime<Utc>) -> bool {
    let year = match now.month() {
        12 => now.year() + 1,
        1 => now.year(),
        _ => return false,
    };

    let first = chrono_tz::Pacific::Kiritimati
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .earliest();
    let last = chrono_tz::Etc::GMTPlus12
        .with_ymd_and_hms(year, 1, 1, 0, 0, 0)
        .earliest();
    let (Some(first), Some(last)) = (first, last) else {
        return false;
    };

    let opens = first.with_timezone(&Utc) - Duration::hours(1);
    let closes = last.with_timezone(&Utc) + Duration::hours(2);
    now >= opens && now <= closes
}
