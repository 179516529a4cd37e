//! Per-identity event sequencing.
//!
//! Events for one identity are processed to completion (handler ran,
//! session persisted) before the next one is admitted; different
//! identities proceed concurrently. A cancel command does not queue: it
//! bumps the identity's generation counter and writes the terminal state
//! immediately, and whatever an in-flight handler computes under the old
//! generation is discarded instead of persisted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::Mutex;

use tandir_core::ChatId;

use crate::conversation::{ChatEvent, Conversation};
use crate::session::SessionStore;

#[derive(Default)]
struct IdentityEntry {
    queue: Mutex<()>,
    generation: AtomicU64,
}

/// Routes chat events into the conversation machine, serialized per
/// identity.
#[derive(Clone)]
pub struct Dispatcher {
    conversation: Conversation,
    sessions: SessionStore,
    entries: Arc<DashMap<ChatId, Arc<IdentityEntry>>>,
}

impl Dispatcher {
    /// Create a dispatcher.
    #[must_use]
    pub fn new(conversation: Conversation, sessions: SessionStore) -> Self {
        Self {
            conversation,
            sessions,
            entries: Arc::new(DashMap::new()),
        }
    }

    fn entry(&self, identity: ChatId) -> Arc<IdentityEntry> {
        self.entries
            .entry(identity)
            .or_insert_with(|| Arc::new(IdentityEntry::default()))
            .clone()
    }

    /// Process one event for one identity.
    pub async fn dispatch(&self, identity: ChatId, event: ChatEvent) {
        let entry = self.entry(identity);

        // Cancel always wins: no queueing behind an in-flight call.
        if event.is_cancel() {
            entry.generation.fetch_add(1, Ordering::SeqCst);

            let mut session = match self.sessions.get(identity).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::error!(%identity, error = %e, "failed to load session for cancel");
                    return;
                }
            };
            self.conversation.cancel(&mut session).await;
            if let Err(e) = self.sessions.save(&session).await {
                tracing::error!(%identity, error = %e, "failed to persist cancelled session");
            }
            return;
        }

        let _turn = entry.queue.lock().await;
        let generation = entry.generation.load(Ordering::SeqCst);

        let mut session = match self.sessions.get(identity).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(%identity, error = %e, "failed to load session");
                return;
            }
        };

        self.conversation.handle(&mut session, event).await;

        // A cancel has run while the handler was in flight: its result is
        // stale and must not clobber the terminal state.
        if entry.generation.load(Ordering::SeqCst) != generation {
            tracing::info!(%identity, "discarding stale handler result after cancel");
            return;
        }

        if let Err(e) = self.sessions.save(&session).await {
            tracing::error!(%identity, error = %e, "failed to persist session");
        }
    }
}
