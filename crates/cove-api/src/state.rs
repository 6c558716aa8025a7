use std::sync::Arc;

use crate::store::MessageStore;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub store: MessageStore,
}
