use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration as StdDuration;

use anyhow::{Context as _, Result};
use chrono::Utc;
use serenity::all::{GatewayIntents, UserId};
use serenity::async_trait;
use serenity::client::Context as SerenityContext;
use serenity::prelude::*;
use tracing::{error, info};

use crate::almanac;
use crate::broadcast::{self, Interval, Registry};
use crate::config::Config;

struct Handler {
    registry: Arc<Registry>,
    dispatching: AtomicBool,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, ctx: SerenityContext, ready: serenity::model::gateway::Ready) {
        info!(user = %ready.user.name, "Bot connected");

        // `ready` fires again after a session resume; the timer loops
        // must only be spawned once.
        if self.dispatching.swap(true, Ordering::SeqCst) {
            return;
        }

        let bot = ready.user.id;
        let registry = self.registry.clone();
        tokio::spawn(run_daily(ctx.clone(), registry.clone(), bot));
        tokio::spawn(run_minutely(ctx, registry, bot));
    }
}

/// Fires one tick at every midnight of the reference timezone. The wait
/// is recomputed each lap so DST transitions shift the trigger with the
/// local clock.
async fn run_daily(ctx: SerenityContext, registry: Arc<Registry>, bot: UserId) {
    let tz = registry.timezone;
    info!(timezone = %tz, "Starting daily dispatcher");

    loop {
        let now = Utc::now().with_timezone(&tz);
        let wait = almanac::next_local_midnight(now)
            .map(|next| next.signed_duration_since(&now))
            .and_then(|d| d.to_std().ok())
            .unwrap_or(StdDuration::from_secs(24 * 60 * 60));

        tokio::time::sleep(wait).await;
        run_tick(&ctx, &registry, bot, Interval::Daily).await;
    }
}

async fn run_minutely(ctx: SerenityContext, registry: Arc<Registry>, bot: UserId) {
    info!("Starting minutely dispatcher");

    let mut ticker = tokio::time::interval(StdDuration::from_secs(60));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    loop {
        ticker.tick().await;
        run_tick(&ctx, &registry, bot, Interval::Minutely).await;
    }
}

/// Runs every enabled broadcast registered for this interval. One
/// broadcast failing is logged and must not stop the others.
async fn run_tick(ctx: &SerenityContext, registry: &Registry, bot: UserId, interval: Interval) {
    let now = Utc::now();

    for broadcast in registry
        .broadcasts
        .iter()
        .filter(|b| b.interval() == interval && b.enabled(now))
    {
        if let Err(e) = broadcast.update(ctx, bot, now).await {
            error!(broadcast = broadcast.name(), error = %e, "Broadcast update failed");
        }
    }
}

pub async fn run(config: Config) -> Result<()> {
    let registry = broadcast::registry(&config).context("Invalid broadcast configuration")?;
    info!(
        broadcasts = registry.broadcasts.len(),
        timezone = %registry.timezone,
        "Broadcast registry built"
    );

    let handler = Handler {
        registry: Arc::new(registry),
        dispatching: AtomicBool::new(false),
    };

    let intents = GatewayIntents::GUILDS;
    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .await
        .context("Failed to create client")?;

    info!("Starting bot");
    client.start().await.context("Client error")?;

    Ok(())
}
