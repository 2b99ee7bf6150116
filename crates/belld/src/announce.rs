//! Decision core of the announcement engine.
//!
//! Every tick re-reads recent channel history instead of keeping local
//! state, then decides whether to edit the bot's previous message or
//! send a fresh one. The functions here only look at [`MessageRef`]
//! snapshots, so the decisions stay testable without a gateway.

use serenity::all::{Message, MessageId, UserId};

/// The slice of a fetched message the engine cares about.
#[derive(Debug, Clone)]
pub struct MessageRef {
    pub id: MessageId,
    pub from_bot: bool,
    pub has_embed: bool,
    pub content: String,
}

impl MessageRef {
    pub fn of(message: &Message, bot: UserId) -> Self {
        Self {
            id: message.id,
            from_bot: message.author.id == bot,
            has_embed: !message.embeds.is_empty(),
            content: message.content.clone(),
        }
    }
}

/// What to do with freshly rendered content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconcile {
    /// Edit the identified message in place.
    Edit(MessageId),
    /// Post a new message.
    Send,
}

/// Single-message mode: edit the channel's latest message when it is
/// ours, otherwise send. `history` is ordered newest first; an empty
/// history (including a failed fetch) always sends.
pub fn single_action(history: &[MessageRef]) -> Reconcile {
    match history.first() {
        Some(last) if last.from_bot => Reconcile::Edit(last.id),
        _ => Reconcile::Send,
    }
}

/// Dashboard mode: edit the newest bot message carrying an embed so a
/// channel keeps exactly one live dashboard.
pub fn dashboard_action(history: &[MessageRef]) -> Reconcile {
    history
        .iter()
        .find(|message| message.from_bot && message.has_embed)
        .map(|message| Reconcile::Edit(message.id))
        .unwrap_or(Reconcile::Send)
}

/// The newest bot-authored message, if any.
pub fn last_bot_message(history: &[MessageRef]) -> Option<&MessageRef> {
    history.iter().find(|message| message.from_bot)
}

/// Whether the most recent bot message already carries every marker.
/// Older bot messages are ignored: a greeting buried under newer bot
/// traffic counts as not announced.
pub fn already_announced(history: &[MessageRef], markers: &[&str]) -> bool {
    last_bot_message(history)
        .is_some_and(|message| markers.iter().all(|marker| message.content.contains(marker)))
}

/// What the greeting pass learned about one arrived bucket's thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingCheck {
    /// The thread exists and carries no greeting for this bucket yet.
    Ungreeted,
    /// The bucket's greeting is already in the thread.
    AlreadyGreeted,
    /// No celebration thread exists; nothing to do this tick.
    ThreadMissing,
    /// The check itself failed.
    CheckFailed,
}

/// What to do with one bucket during the greeting pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GreetingStep {
    /// Move on to the next bucket.
    Skip,
    /// Send this bucket's greeting, then end the pass.
    Send,
    /// End the pass without sending.
    Stop,
}

/// Per-bucket greeting policy: an already-greeted bucket is skipped, an
/// ungreeted one receives the tick's single greeting, and a missing
/// thread or failed check ends the pass until the next tick.
pub fn greeting_step(check: GreetingCheck) -> GreetingStep {
    match check {
        GreetingCheck::AlreadyGreeted => GreetingStep::Skip,
        GreetingCheck::Ungreeted => GreetingStep::Send,
        GreetingCheck::ThreadMissing | GreetingCheck::CheckFailed => GreetingStep::Stop,
    }
}

/// Folds [`greeting_step`] over per-bucket checks, ordered most recently
/// arrived first, and returns the index of the one bucket to greet this
/// tick, if any.
pub fn next_greeting<I>(checks: I) -> Option<usize>
where
    I: IntoIterator<Item = GreetingCheck>,
{
    for (index, check) in checks.into_iter().enumerate() {
        match greeting_step(check) {
            GreetingStep::Skip => continue,
            GreetingStep::Send => return Some(index),
            GreetingStep::Stop => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(id: u64, from_bot: bool, has_embed: bool, content: &str) -> MessageRef {
        MessageRef {
            id: MessageId::new(id),
            from_bot,
            has_embed,
            content: content.to_string(),
        }
    }

    #[test]
    fn empty_history_sends() {
        assert_eq!(single_action(&[]), Reconcile::Send);
    }

    #[test]
    fn foreign_last_message_sends() {
        let history = vec![
            message(3, false, false, "hi"),
            message(2, true, false, "old countdown"),
        ];
        assert_eq!(single_action(&history), Reconcile::Send);
    }

    #[test]
    fn own_last_message_edits_and_is_idempotent() {
        let history = vec![message(7, true, false, "countdown")];
        assert_eq!(single_action(&history), Reconcile::Edit(MessageId::new(7)));
        // A second tick over unchanged history must edit again, never send.
        assert_eq!(single_action(&history), Reconcile::Edit(MessageId::new(7)));
    }

    #[test]
    fn dashboard_skips_bot_messages_without_embeds() {
        let history = vec![
            message(5, true, false, "greeting"),
            message(4, false, false, "chatter"),
            message(3, true, true, "dashboard"),
            message(2, true, true, "older dashboard"),
        ];
        assert_eq!(
            dashboard_action(&history),
            Reconcile::Edit(MessageId::new(3))
        );
    }

    #[test]
    fn dashboard_sends_when_no_embed_found() {
        let history = vec![
            message(5, true, false, "text only"),
            message(4, false, true, "someone else's embed"),
        ];
        assert_eq!(dashboard_action(&history), Reconcile::Send);
    }

    #[test]
    fn announced_requires_all_markers() {
        let history = vec![message(9, true, false, "Happy New Year to Asia/Tokyo!")];
        assert!(already_announced(&history, &["Happy New Year", "Asia/Tokyo"]));
        assert!(!already_announced(
            &history,
            &["Happy New Year", "Asia/Seoul"]
        ));
    }

    #[test]
    fn announced_only_consults_newest_bot_message() {
        let history = vec![
            message(9, true, false, "Happy New Year to Asia/Seoul!"),
            message(8, true, false, "Happy New Year to Asia/Tokyo!"),
        ];
        assert!(!already_announced(
            &history,
            &["Happy New Year", "Asia/Tokyo"]
        ));
    }

    #[test]
    fn announced_is_false_without_bot_messages() {
        let history = vec![message(9, false, false, "Happy New Year everyone")];
        assert!(!already_announced(&history, &["Happy New Year"]));
    }

    #[test]
    fn greeting_pass_targets_exactly_one_bucket() {
        use GreetingCheck::*;
        assert_eq!(next_greeting([Ungreeted, Ungreeted]), Some(0));
        assert_eq!(
            next_greeting([AlreadyGreeted, AlreadyGreeted, Ungreeted, Ungreeted]),
            Some(2)
        );
    }

    #[test]
    fn already_greeted_buckets_are_skipped_not_terminal() {
        use GreetingCheck::*;
        assert_eq!(next_greeting([AlreadyGreeted, Ungreeted]), Some(1));
        assert_eq!(next_greeting([AlreadyGreeted, AlreadyGreeted]), None);
    }

    #[test]
    fn missing_thread_ends_the_pass() {
        use GreetingCheck::*;
        assert_eq!(next_greeting([AlreadyGreeted, ThreadMissing, Ungreeted]), None);
    }

    #[test]
    fn failed_check_ends_the_pass() {
        use GreetingCheck::*;
        assert_eq!(next_greeting([CheckFailed, Ungreeted]), None);
        assert_eq!(next_greeting(Vec::new()), None);
    }
}
