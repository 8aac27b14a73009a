//! Knowledge service contract and the in-memory reference store.

use std::sync::Mutex;
use std::sync::mpsc::{Receiver, Sender, channel};

use crate::fact::{Fact, Pattern};

/// Change feeds delivered to one subscriber.
///
/// Each receiver carries one class of change for facts matching the
/// subscribed pattern. Dropping a receiver ends that feed; the store prunes
/// the subscription once all three are gone.
pub struct SubscriptionFeeds {
    pub added: Receiver<Fact>,
    /// `(old, new)` pairs for facts replaced in place.
    pub updated: Receiver<(Fact, Fact)>,
    pub removed: Receiver<Fact>,
}

/// Tuple-space collaborator contract.
///
/// All calls take `&self`: implementations serialize internally so the
/// service can be shared across behaviors and sensors.
pub trait KnowledgeService: Send + Sync {
    fn exists(&self, pattern: &Pattern) -> bool;

    /// Removes and returns the first matching fact.
    fn pop(&self, pattern: &Pattern) -> Option<Fact>;

    /// Returns the first matching fact without removing it.
    fn peek(&self, pattern: &Pattern) -> Option<Fact>;

    fn all(&self, pattern: &Pattern) -> Vec<Fact>;

    /// Replaces every fact matching `old` with `new`. Returns whether
    /// anything matched.
    fn update(&self, old: &Pattern, new: Fact) -> bool;

    /// Stores a fact. Fire-and-forget: duplicates are ignored.
    fn push(&self, fact: Fact);

    fn subscribe(&self, pattern: Pattern) -> SubscriptionFeeds;
}

struct Subscriber {
    pattern: Pattern,
    added: Sender<Fact>,
    updated: Sender<(Fact, Fact)>,
    removed: Sender<Fact>,
}

/// In-memory reference implementation with set semantics.
#[derive(Default)]
pub struct InMemoryKnowledgeBase {
    facts: Mutex<Vec<Fact>>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl InMemoryKnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.facts.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Notifies matching subscribers, pruning any whose feeds are gone.
    fn notify<F>(&self, fact: &Fact, send: F)
    where
        F: Fn(&Subscriber) -> bool,
    {
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|subscriber| {
            if !subscriber.pattern.matches(fact) {
                return true;
            }
            send(subscriber)
        });
    }
}

impl KnowledgeService for InMemoryKnowledgeBase {
    fn exists(&self, pattern: &Pattern) -> bool {
        let facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
        facts.iter().any(|f| pattern.matches(f))
    }

    fn pop(&self, pattern: &Pattern) -> Option<Fact> {
        let removed = {
            let mut facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
            let index = facts.iter().position(|f| pattern.matches(f))?;
            facts.remove(index)
        };
        self.notify(&removed, |s| s.removed.send(removed.clone()).is_ok());
        Some(removed)
    }

    fn peek(&self, pattern: &Pattern) -> Option<Fact> {
        let facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
        facts.iter().find(|f| pattern.matches(f)).cloned()
    }

    fn all(&self, pattern: &Pattern) -> Vec<Fact> {
        let facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
        facts.iter().filter(|f| pattern.matches(f)).cloned().collect()
    }

    fn update(&self, old: &Pattern, new: Fact) -> bool {
        let replaced: Vec<Fact> = {
            let mut facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
            let mut replaced = Vec::new();
            facts.retain(|f| {
                if old.matches(f) {
                    replaced.push(f.clone());
                    false
                } else {
                    true
                }
            });
            if replaced.is_empty() {
                return false;
            }
            if !facts.contains(&new) {
                facts.push(new.clone());
            }
            replaced
        };
        for old_fact in &replaced {
            self.notify(old_fact, |s| {
                s.updated.send((old_fact.clone(), new.clone())).is_ok()
            });
        }
        // The replacement may interest subscribers the old facts did not;
        // those already told via `updated` do not also see an add.
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.retain(|subscriber| {
            if !subscriber.pattern.matches(&new)
                || replaced.iter().any(|f| subscriber.pattern.matches(f))
            {
                return true;
            }
            subscriber.added.send(new.clone()).is_ok()
        });
        true
    }

    fn push(&self, fact: Fact) {
        {
            let mut facts = self.facts.lock().unwrap_or_else(|e| e.into_inner());
            if facts.contains(&fact) {
                return;
            }
            facts.push(fact.clone());
        }
        tracing::debug!(%fact, "fact stored");
        self.notify(&fact, |s| s.added.send(fact.clone()).is_ok());
    }

    fn subscribe(&self, pattern: Pattern) -> SubscriptionFeeds {
        let (added_tx, added_rx) = channel();
        let (updated_tx, updated_rx) = channel();
        let (removed_tx, removed_rx) = channel();
        let mut subscribers = self.subscribers.lock().unwrap_or_else(|e| e.into_inner());
        subscribers.push(Subscriber {
            pattern,
            added: added_tx,
            updated: updated_tx,
            removed: removed_tx,
        });
        SubscriptionFeeds {
            added: added_rx,
            updated: updated_rx,
            removed: removed_rx,
        }
    }
}
