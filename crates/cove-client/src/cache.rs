use std::collections::HashMap;

use cove_types::api::{Page, ThreadView};

/// Key of one cached view: the root message list of a channel, or the reply
/// list of a thread.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ViewKey {
    ChannelList(String),
    Thread(String),
}

/// One cached view. The channel variant is the ordered collection of cursor
/// pages exactly as fetched; the thread variant mirrors the thread endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Channel(Vec<Page>),
    Thread(ThreadView),
}

/// A deep copy of one view (or a record of its absence), taken before an
/// optimistic mutation so a failed round-trip can restore it verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub key: ViewKey,
    view: Option<View>,
}

/// Client-held cache of paginated message views.
///
/// The cache is the only state the reconciliation layer mutates; the server
/// remains the single source of truth and overwrites cached views on fetch.
/// A per-key generation counter implements fetch cancellation: an optimistic
/// write bumps the generation, and a fetch completion carrying a stale
/// generation is dropped so it cannot clobber the optimistic state.
#[derive(Debug, Default)]
pub struct MessageCache {
    views: HashMap<ViewKey, View>,
    fetch_gen: HashMap<ViewKey, u64>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &ViewKey) -> Option<&View> {
        self.views.get(key)
    }

    pub fn insert(&mut self, key: ViewKey, view: View) {
        self.views.insert(key, view);
    }

    pub(crate) fn get_mut(&mut self, key: &ViewKey) -> Option<&mut View> {
        self.views.get_mut(key)
    }

    pub fn snapshot(&self, key: &ViewKey) -> Snapshot {
        Snapshot {
            key: key.clone(),
            view: self.views.get(key).cloned(),
        }
    }

    pub fn restore(&mut self, snapshot: Snapshot) {
        match snapshot.view {
            Some(view) => {
                self.views.insert(snapshot.key, view);
            }
            None => {
                self.views.remove(&snapshot.key);
            }
        }
    }

    /// Start a fetch for a key. The returned generation must be passed back
    /// to the matching `complete_*_fetch` call.
    pub fn begin_fetch(&mut self, key: &ViewKey) -> u64 {
        *self.fetch_gen.entry(key.clone()).or_insert(0)
    }

    /// Supersede any in-flight fetch for the key.
    pub fn cancel_fetch(&mut self, key: &ViewKey) {
        *self.fetch_gen.entry(key.clone()).or_insert(0) += 1;
    }

    /// Apply a fetched page to a channel view. `cursor` is the cursor the
    /// fetch was issued with: a cursorless fetch is the first page and
    /// resets the view, so a refresh replaces rather than duplicates;
    /// a cursored fetch extends the view with the next (older) page.
    /// Returns false when the fetch was superseded and the page was dropped.
    pub fn complete_channel_fetch(
        &mut self,
        channel_id: &str,
        generation: u64,
        cursor: Option<&str>,
        page: Page,
    ) -> bool {
        let key = ViewKey::ChannelList(channel_id.to_string());
        if self.fetch_gen.get(&key).copied().unwrap_or(0) != generation {
            return false;
        }

        if cursor.is_none() || !matches!(self.views.get(&key), Some(View::Channel(_))) {
            self.views.insert(key.clone(), View::Channel(vec![page]));
            return true;
        }
        if let Some(View::Channel(pages)) = self.views.get_mut(&key) {
            pages.push(page);
        }
        true
    }

    /// Replace a thread view with a fetched one. Returns false when the
    /// fetch was superseded.
    pub fn complete_thread_fetch(
        &mut self,
        thread_id: &str,
        generation: u64,
        thread: ThreadView,
    ) -> bool {
        let key = ViewKey::Thread(thread_id.to_string());
        if self.fetch_gen.get(&key).copied().unwrap_or(0) != generation {
            return false;
        }

        self.views.insert(key, View::Thread(thread));
        true
    }
}
