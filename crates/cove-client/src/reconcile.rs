use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use cove_types::api::{GroupedReaction, MessageItem, Page};

use crate::cache::{MessageCache, Snapshot, View, ViewKey};

/// Namespace for provisional ids. A server id is a bare UUID, so a
/// provisional entry can never collide with a confirmed one and is always
/// recognizable in the cache.
pub const OPTIMISTIC_PREFIX: &str = "optimistic-";

/// The viewer's own profile, used to synthesize the author snapshot on
/// provisional messages before the server echoes the real one.
#[derive(Debug, Clone)]
pub struct Profile {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
}

#[derive(Debug, Clone)]
pub struct MessageDraft {
    pub content: String,
    pub image_url: Option<String>,
}

/// Which cached view a reaction toggle addresses. A toggle in a thread
/// sidebar may target either the thread root or one of its replies.
#[derive(Debug, Clone)]
pub enum ReactionTarget {
    Channel {
        channel_id: String,
        message_id: String,
    },
    Thread {
        thread_id: String,
        message_id: String,
    },
}

/// Correlation state threaded from `begin_*` to `complete_*`/`fail`:
/// the provisional id (when the mutation inserted an entity) and the
/// pre-mutation snapshots of every view that was touched.
#[derive(Debug)]
#[must_use = "a mutation context must be settled via complete_* or fail"]
pub struct MutationContext {
    correlation_id: Option<String>,
    snapshots: Vec<Snapshot>,
}

impl MutationContext {
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }
}

/// User-facing outcome of a settled mutation. The embedding UI renders
/// these as toasts; the reconciler itself never blocks on them.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    Success(&'static str),
    Error(&'static str),
}

fn optimistic_id() -> String {
    format!("{OPTIMISTIC_PREFIX}{}", Uuid::new_v4())
}

/// Optimistic per-emoji adjustment, applied before the server confirms a
/// toggle. An existing entry is decremented and dropped at zero; otherwise
/// a fresh single-count entry is appended.
///
/// On decrement the viewer flag is cleared unconditionally — this assumes
/// the removed reaction was the viewer's own. The server's authoritative
/// aggregate overwrites this view when the round-trip settles, so the
/// window of divergence is bounded by one round-trip.
pub fn bump_reactions(reactions: &[GroupedReaction], emoji: &str) -> Vec<GroupedReaction> {
    if let Some(found) = reactions.iter().find(|r| r.emoji == emoji) {
        let dec = found.count - 1;

        if dec == 0 {
            return reactions.iter().filter(|r| r.emoji != emoji).cloned().collect();
        }

        return reactions
            .iter()
            .map(|r| {
                if r.emoji == emoji {
                    GroupedReaction {
                        emoji: r.emoji.clone(),
                        count: dec,
                        reacted_by_me: false,
                    }
                } else {
                    r.clone()
                }
            })
            .collect();
    }

    let mut next = reactions.to_vec();
    next.push(GroupedReaction {
        emoji: emoji.to_string(),
        count: 1,
        reacted_by_me: true,
    });
    next
}

impl MessageCache {
    /// Optimistically insert a new root message at the top of the channel
    /// view. Returns the mutation context and the provisional entity (the
    /// caller sends the real request and settles with one of the two
    /// `complete`/`fail` calls; there is no automatic retry).
    pub fn begin_send_message(
        &mut self,
        channel_id: &str,
        draft: &MessageDraft,
        author: &Profile,
    ) -> (MutationContext, MessageItem) {
        let key = ViewKey::ChannelList(channel_id.to_string());

        // A stale in-flight page must not overwrite the provisional state.
        self.cancel_fetch(&key);
        let snapshot = self.snapshot(&key);

        let provisional = synthesize_message(channel_id, None, draft, author);

        if !matches!(self.get(&key), Some(View::Channel(_))) {
            self.insert(key.clone(), View::Channel(Vec::new()));
        }
        if let Some(View::Channel(pages)) = self.get_mut(&key) {
            match pages.first_mut() {
                Some(first) => first.items.insert(0, provisional.clone()),
                None => pages.push(Page {
                    items: vec![provisional.clone()],
                    next_cursor: None,
                }),
            }
        }

        (
            MutationContext {
                correlation_id: Some(provisional.id.clone()),
                snapshots: vec![snapshot],
            },
            provisional,
        )
    }

    /// Swap the provisional root message for the server-confirmed one, in
    /// place: the item keeps its array position so the list does not jump
    /// even if the server timestamp would order it differently.
    pub fn complete_send_message(
        &mut self,
        ctx: MutationContext,
        confirmed: MessageItem,
    ) -> Notice {
        let key = ViewKey::ChannelList(confirmed.channel_id.clone());

        if let (Some(temp_id), Some(View::Channel(pages))) =
            (ctx.correlation_id.as_deref(), self.get_mut(&key))
        {
            replace_in_pages(pages, temp_id, confirmed);
        }

        Notice::Success("Message sent")
    }

    /// Optimistically append a reply to the thread view and bump the
    /// parent's reply count in the channel view. Both writes happen in this
    /// one synchronous call, so no render can observe the count and the
    /// reply list disagreeing.
    pub fn begin_send_reply(
        &mut self,
        channel_id: &str,
        thread_id: &str,
        draft: &MessageDraft,
        author: &Profile,
    ) -> (MutationContext, MessageItem) {
        let thread_key = ViewKey::Thread(thread_id.to_string());
        let list_key = ViewKey::ChannelList(channel_id.to_string());

        self.cancel_fetch(&thread_key);
        self.cancel_fetch(&list_key);

        let snapshots = vec![self.snapshot(&thread_key), self.snapshot(&list_key)];

        let provisional = synthesize_message(channel_id, Some(thread_id), draft, author);

        if let Some(View::Thread(thread)) = self.get_mut(&thread_key) {
            thread.messages.push(provisional.clone());
        }

        if let Some(View::Channel(pages)) = self.get_mut(&list_key) {
            for page in pages {
                for item in &mut page.items {
                    if item.id == thread_id {
                        item.reply_count += 1;
                    }
                }
            }
        }

        (
            MutationContext {
                correlation_id: Some(provisional.id.clone()),
                snapshots,
            },
            provisional,
        )
    }

    /// Swap the provisional reply for the confirmed one, in place. The
    /// bumped parent reply count already matches the server.
    pub fn complete_send_reply(&mut self, ctx: MutationContext, confirmed: MessageItem) -> Notice {
        if let Some(thread_id) = confirmed.thread_id.clone() {
            let key = ViewKey::Thread(thread_id);

            if let (Some(temp_id), Some(View::Thread(thread))) =
                (ctx.correlation_id.as_deref(), self.get_mut(&key))
            {
                if let Some(slot) = thread.messages.iter_mut().find(|m| m.id == temp_id) {
                    *slot = confirmed;
                }
            }
        }

        Notice::Success("Reply sent")
    }

    /// Optimistically adjust the reaction aggregates of one message in one
    /// cached view.
    pub fn begin_toggle_reaction(
        &mut self,
        target: &ReactionTarget,
        emoji: &str,
    ) -> MutationContext {
        match target {
            ReactionTarget::Channel {
                channel_id,
                message_id,
            } => {
                let key = ViewKey::ChannelList(channel_id.clone());
                self.cancel_fetch(&key);
                let snapshot = self.snapshot(&key);

                if let Some(View::Channel(pages)) = self.get_mut(&key) {
                    for page in pages {
                        for item in &mut page.items {
                            if item.id == *message_id {
                                item.reactions = bump_reactions(&item.reactions, emoji);
                            }
                        }
                    }
                }

                MutationContext {
                    correlation_id: None,
                    snapshots: vec![snapshot],
                }
            }
            ReactionTarget::Thread {
                thread_id,
                message_id,
            } => {
                let key = ViewKey::Thread(thread_id.clone());
                self.cancel_fetch(&key);
                let snapshot = self.snapshot(&key);

                if let Some(View::Thread(thread)) = self.get_mut(&key) {
                    if message_id == thread_id {
                        thread.parent.reactions = bump_reactions(&thread.parent.reactions, emoji);
                    } else if let Some(m) =
                        thread.messages.iter_mut().find(|m| m.id == *message_id)
                    {
                        m.reactions = bump_reactions(&m.reactions, emoji);
                    }
                }

                MutationContext {
                    correlation_id: None,
                    snapshots: vec![snapshot],
                }
            }
        }
    }

    /// Overwrite the optimistic aggregates with the server's authoritative
    /// ones, closing the divergence window of `bump_reactions`.
    pub fn complete_toggle_reaction(
        &mut self,
        _ctx: MutationContext,
        target: &ReactionTarget,
        reactions: Vec<GroupedReaction>,
    ) -> Notice {
        match target {
            ReactionTarget::Channel {
                channel_id,
                message_id,
            } => {
                let key = ViewKey::ChannelList(channel_id.clone());
                if let Some(View::Channel(pages)) = self.get_mut(&key) {
                    for page in pages {
                        for item in &mut page.items {
                            if item.id == *message_id {
                                item.reactions = reactions.clone();
                            }
                        }
                    }
                }
            }
            ReactionTarget::Thread {
                thread_id,
                message_id,
            } => {
                let key = ViewKey::Thread(thread_id.clone());
                if let Some(View::Thread(thread)) = self.get_mut(&key) {
                    if message_id == thread_id {
                        thread.parent.reactions = reactions;
                    } else if let Some(m) =
                        thread.messages.iter_mut().find(|m| m.id == *message_id)
                    {
                        m.reactions = reactions;
                    }
                }
            }
        }

        Notice::Success("Reaction updated")
    }

    /// Roll back a failed mutation: every touched view is restored to its
    /// exact pre-mutation snapshot. No provisional state survives.
    pub fn fail(&mut self, ctx: MutationContext) -> Notice {
        debug!("mutation failed, restoring {} view(s)", ctx.snapshots.len());

        for snapshot in ctx.snapshots {
            self.restore(snapshot);
        }

        Notice::Error("Something went wrong.")
    }
}

fn synthesize_message(
    channel_id: &str,
    thread_id: Option<&str>,
    draft: &MessageDraft,
    author: &Profile,
) -> MessageItem {
    let now = Utc::now();

    MessageItem {
        id: optimistic_id(),
        channel_id: channel_id.to_string(),
        thread_id: thread_id.map(Into::into),
        content: draft.content.clone(),
        image_url: draft.image_url.clone(),
        author_id: author.id.clone(),
        author_name: author.name.clone(),
        author_email: author.email.clone(),
        author_avatar: author.avatar.clone(),
        created_at: now,
        updated_at: now,
        reply_count: 0,
        reactions: vec![],
    }
}

fn replace_in_pages(pages: &mut [Page], temp_id: &str, confirmed: MessageItem) {
    for page in pages {
        if let Some(slot) = page.items.iter_mut().find(|m| m.id == temp_id) {
            *slot = confirmed;
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cove_types::api::ThreadView;

    fn profile() -> Profile {
        Profile {
            id: "u1".into(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            avatar: "https://avatars.example/ada".into(),
        }
    }

    fn draft(content: &str) -> MessageDraft {
        MessageDraft {
            content: content.into(),
            image_url: None,
        }
    }

    fn item(id: &str, channel: &str, thread: Option<&str>) -> MessageItem {
        let ts = "2026-01-01T10:00:00Z".parse().unwrap();
        MessageItem {
            id: id.into(),
            channel_id: channel.into(),
            thread_id: thread.map(Into::into),
            content: format!("content {id}"),
            image_url: None,
            author_id: "u1".into(),
            author_name: "Ada".into(),
            author_email: "ada@example.com".into(),
            author_avatar: "https://avatars.example/ada".into(),
            created_at: ts,
            updated_at: ts,
            reply_count: 0,
            reactions: vec![],
        }
    }

    fn reaction(emoji: &str, count: u64, mine: bool) -> GroupedReaction {
        GroupedReaction {
            emoji: emoji.into(),
            count,
            reacted_by_me: mine,
        }
    }

    fn seeded_channel(cache: &mut MessageCache, channel: &str, ids: &[&str]) {
        let page = Page {
            items: ids.iter().map(|id| item(id, channel, None)).collect(),
            next_cursor: None,
        };
        cache.insert(
            ViewKey::ChannelList(channel.to_string()),
            View::Channel(vec![page]),
        );
    }

    // -- bump algorithm --

    #[test]
    fn bump_appends_fresh_entry() {
        let next = bump_reactions(&[], "👍");
        assert_eq!(next, vec![reaction("👍", 1, true)]);
    }

    #[test]
    fn bump_removes_entry_at_zero() {
        let next = bump_reactions(&[reaction("👍", 1, true)], "👍");
        assert!(next.is_empty());
    }

    #[test]
    fn bump_decrements_and_clears_viewer_flag() {
        // Known simplification: the flag is cleared even when the viewer was
        // not among the reactors; the server overwrites this on settle.
        let next = bump_reactions(&[reaction("👍", 3, false), reaction("🎉", 1, true)], "👍");
        assert_eq!(next, vec![reaction("👍", 2, false), reaction("🎉", 1, true)]);
    }

    // -- send message --

    #[test]
    fn send_message_prepends_to_first_page() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["old"]);

        let (ctx, provisional) = cache.begin_send_message("ch1", &draft("hello"), &profile());

        assert!(provisional.id.starts_with(OPTIMISTIC_PREFIX));
        assert_eq!(ctx.correlation_id(), Some(provisional.id.as_str()));

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                let ids: Vec<_> = pages[0].items.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, vec![provisional.id.as_str(), "old"]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn send_message_creates_view_when_absent() {
        let mut cache = MessageCache::new();

        let (_ctx, provisional) = cache.begin_send_message("ch1", &draft("hello"), &profile());

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                assert_eq!(pages.len(), 1);
                assert_eq!(pages[0].items[0].id, provisional.id);
                assert_eq!(pages[0].next_cursor, None);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn confirmation_replaces_in_place() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["old"]);

        let (ctx, provisional) = cache.begin_send_message("ch1", &draft("hello"), &profile());

        let mut confirmed = item("server-id", "ch1", None);
        confirmed.content = "hello".into();
        let notice = cache.complete_send_message(ctx, confirmed);
        assert_eq!(notice, Notice::Success("Message sent"));

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                // Same position, new identity.
                let ids: Vec<_> = pages[0].items.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, vec!["server-id", "old"]);
                assert!(!pages[0].items.iter().any(|m| m.id == provisional.id));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn failed_send_restores_snapshot_exactly() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a", "b"]);
        let key = ViewKey::ChannelList("ch1".into());
        let before = cache.get(&key).cloned();

        let (ctx, _provisional) = cache.begin_send_message("ch1", &draft("oops"), &profile());
        assert_ne!(cache.get(&key).cloned(), before);

        let notice = cache.fail(ctx);
        assert_eq!(notice, Notice::Error("Something went wrong."));
        assert_eq!(cache.get(&key).cloned(), before);
    }

    #[test]
    fn failed_send_on_empty_cache_leaves_no_view_behind() {
        let mut cache = MessageCache::new();
        let key = ViewKey::ChannelList("ch1".into());

        let (ctx, _provisional) = cache.begin_send_message("ch1", &draft("oops"), &profile());
        assert!(cache.get(&key).is_some());

        cache.fail(ctx);
        assert!(cache.get(&key).is_none());
    }

    // -- send reply --

    #[test]
    fn reply_updates_thread_and_parent_count_together() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["root", "other"]);
        cache.insert(
            ViewKey::Thread("root".into()),
            View::Thread(ThreadView {
                parent: item("root", "ch1", None),
                messages: vec![item("r1", "ch1", Some("root"))],
            }),
        );

        let (_ctx, provisional) =
            cache.begin_send_reply("ch1", "root", &draft("a reply"), &profile());

        match cache.get(&ViewKey::Thread("root".into())).unwrap() {
            View::Thread(thread) => {
                let ids: Vec<_> = thread.messages.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, vec!["r1", provisional.id.as_str()]);
            }
            other => panic!("unexpected view: {other:?}"),
        }

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                let root = pages[0].items.iter().find(|m| m.id == "root").unwrap();
                let other = pages[0].items.iter().find(|m| m.id == "other").unwrap();
                assert_eq!(root.reply_count, 1);
                assert_eq!(other.reply_count, 0);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn failed_reply_rolls_back_both_views() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["root"]);
        cache.insert(
            ViewKey::Thread("root".into()),
            View::Thread(ThreadView {
                parent: item("root", "ch1", None),
                messages: vec![],
            }),
        );

        let thread_key = ViewKey::Thread("root".into());
        let list_key = ViewKey::ChannelList("ch1".into());
        let thread_before = cache.get(&thread_key).cloned();
        let list_before = cache.get(&list_key).cloned();

        let (ctx, _provisional) =
            cache.begin_send_reply("ch1", "root", &draft("a reply"), &profile());

        cache.fail(ctx);

        assert_eq!(cache.get(&thread_key).cloned(), thread_before);
        assert_eq!(cache.get(&list_key).cloned(), list_before);
    }

    #[test]
    fn confirmed_reply_replaces_by_correlation_id() {
        let mut cache = MessageCache::new();
        cache.insert(
            ViewKey::Thread("root".into()),
            View::Thread(ThreadView {
                parent: item("root", "ch1", None),
                messages: vec![],
            }),
        );

        let (ctx, _provisional) =
            cache.begin_send_reply("ch1", "root", &draft("a reply"), &profile());

        let confirmed = item("server-reply", "ch1", Some("root"));
        cache.complete_send_reply(ctx, confirmed);

        match cache.get(&ViewKey::Thread("root".into())).unwrap() {
            View::Thread(thread) => {
                assert_eq!(thread.messages.len(), 1);
                assert_eq!(thread.messages[0].id, "server-reply");
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    // -- toggle reaction --

    #[test]
    fn toggle_bumps_only_the_target_message() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a", "b"]);

        let target = ReactionTarget::Channel {
            channel_id: "ch1".into(),
            message_id: "a".into(),
        };
        let _ctx = cache.begin_toggle_reaction(&target, "👍");

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                let a = pages[0].items.iter().find(|m| m.id == "a").unwrap();
                let b = pages[0].items.iter().find(|m| m.id == "b").unwrap();
                assert_eq!(a.reactions, vec![reaction("👍", 1, true)]);
                assert!(b.reactions.is_empty());
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn toggle_on_thread_parent_and_reply() {
        let mut cache = MessageCache::new();
        let mut parent = item("root", "ch1", None);
        parent.reactions = vec![reaction("🎉", 1, true)];
        cache.insert(
            ViewKey::Thread("root".into()),
            View::Thread(ThreadView {
                parent,
                messages: vec![item("r1", "ch1", Some("root"))],
            }),
        );

        let _ctx = cache.begin_toggle_reaction(
            &ReactionTarget::Thread {
                thread_id: "root".into(),
                message_id: "root".into(),
            },
            "🎉",
        );
        let _ctx = cache.begin_toggle_reaction(
            &ReactionTarget::Thread {
                thread_id: "root".into(),
                message_id: "r1".into(),
            },
            "👍",
        );

        match cache.get(&ViewKey::Thread("root".into())).unwrap() {
            View::Thread(thread) => {
                assert!(thread.parent.reactions.is_empty());
                assert_eq!(thread.messages[0].reactions, vec![reaction("👍", 1, true)]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn server_aggregates_overwrite_optimistic_bump() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a"]);

        let target = ReactionTarget::Channel {
            channel_id: "ch1".into(),
            message_id: "a".into(),
        };
        let ctx = cache.begin_toggle_reaction(&target, "👍");

        // Server knows about another reactor the optimistic bump could not.
        let authoritative = vec![reaction("👍", 2, true)];
        cache.complete_toggle_reaction(ctx, &target, authoritative.clone());

        match cache.get(&ViewKey::ChannelList("ch1".into())).unwrap() {
            View::Channel(pages) => {
                assert_eq!(pages[0].items[0].reactions, authoritative);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn failed_toggle_restores_previous_reactions() {
        let mut cache = MessageCache::new();
        let mut page_item = item("a", "ch1", None);
        page_item.reactions = vec![reaction("👍", 2, false)];
        cache.insert(
            ViewKey::ChannelList("ch1".into()),
            View::Channel(vec![Page {
                items: vec![page_item],
                next_cursor: None,
            }]),
        );

        let key = ViewKey::ChannelList("ch1".into());
        let before = cache.get(&key).cloned();

        let target = ReactionTarget::Channel {
            channel_id: "ch1".into(),
            message_id: "a".into(),
        };
        let ctx = cache.begin_toggle_reaction(&target, "👍");
        assert_ne!(cache.get(&key).cloned(), before);

        cache.fail(ctx);
        assert_eq!(cache.get(&key).cloned(), before);
    }

    // -- fetch cancellation --

    #[test]
    fn stale_fetch_after_mutation_is_dropped() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a"]);
        let key = ViewKey::ChannelList("ch1".into());

        let generation = cache.begin_fetch(&key);

        // The optimistic write supersedes the in-flight fetch.
        let (_ctx, _provisional) = cache.begin_send_message("ch1", &draft("hi"), &profile());

        let stale_page = Page {
            items: vec![item("stale", "ch1", None)],
            next_cursor: None,
        };
        let applied = cache.complete_channel_fetch("ch1", generation, None, stale_page);
        assert!(!applied);

        match cache.get(&key).unwrap() {
            View::Channel(pages) => {
                assert!(!pages.iter().any(|p| p.items.iter().any(|m| m.id == "stale")));
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn fresh_fetch_applies() {
        let mut cache = MessageCache::new();
        let key = ViewKey::ChannelList("ch1".into());

        let generation = cache.begin_fetch(&key);
        let page = Page {
            items: vec![item("a", "ch1", None)],
            next_cursor: None,
        };
        assert!(cache.complete_channel_fetch("ch1", generation, None, page));

        match cache.get(&key).unwrap() {
            View::Channel(pages) => assert_eq!(pages[0].items[0].id, "a"),
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn first_page_refetch_replaces_instead_of_duplicating() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a", "b"]);
        let key = ViewKey::ChannelList("ch1".into());

        let generation = cache.begin_fetch(&key);
        let refreshed = Page {
            items: vec![item("a", "ch1", None), item("b", "ch1", None)],
            next_cursor: None,
        };
        assert!(cache.complete_channel_fetch("ch1", generation, None, refreshed));

        match cache.get(&key).unwrap() {
            View::Channel(pages) => {
                assert_eq!(pages.len(), 1);
                let ids: Vec<_> = pages[0].items.iter().map(|m| m.id.as_str()).collect();
                assert_eq!(ids, vec!["a", "b"]);
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }

    #[test]
    fn cursored_fetch_extends_the_view() {
        let mut cache = MessageCache::new();
        seeded_channel(&mut cache, "ch1", &["a"]);
        let key = ViewKey::ChannelList("ch1".into());

        let generation = cache.begin_fetch(&key);
        let older = Page {
            items: vec![item("z", "ch1", None)],
            next_cursor: None,
        };
        assert!(cache.complete_channel_fetch("ch1", generation, Some("a"), older));

        match cache.get(&key).unwrap() {
            View::Channel(pages) => {
                assert_eq!(pages.len(), 2);
                assert_eq!(pages[1].items[0].id, "z");
            }
            other => panic!("unexpected view: {other:?}"),
        }
    }
}
