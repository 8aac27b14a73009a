//! Knowledge-backed sensors for the behavior engine.
//!
//! A [`FactCache`] subscribes to one pattern and keeps an existence flag
//! current from the change feeds; [`KnowledgeSensor`] exposes that flag to
//! a manager as a boolean sensor.

use std::sync::Arc;

use arbiter_engine::{EngineError, Sensor, SensorValue};

use crate::fact::Pattern;
use crate::store::{KnowledgeService, SubscriptionFeeds};

/// Subscription-fed existence cache for one pattern.
///
/// `refresh` drains the change feeds; the store is only queried again when
/// a removal arrived (another matching fact may remain), so steady state
/// costs no knowledge-base call.
pub struct FactCache {
    service: Arc<dyn KnowledgeService>,
    pattern: Pattern,
    feeds: SubscriptionFeeds,
    exists: bool,
}

impl FactCache {
    pub fn new(service: Arc<dyn KnowledgeService>, pattern: Pattern) -> Self {
        let feeds = service.subscribe(pattern.clone());
        let exists = service.exists(&pattern);
        Self {
            service,
            pattern,
            feeds,
            exists,
        }
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    pub fn exists(&self) -> bool {
        self.exists
    }

    /// Applies all pending change events and returns the current flag.
    ///
    /// The three feeds carry no global ordering, so a cycle that saw a
    /// removal cannot be resolved from events alone and re-queries the
    /// store instead.
    pub fn refresh(&mut self) -> bool {
        let mut added = false;
        let mut removed = false;
        while self.feeds.added.try_recv().is_ok() {
            added = true;
        }
        while self.feeds.updated.try_recv().is_ok() {
            // An in-place replacement keeps a matching fact present.
            added = true;
        }
        while self.feeds.removed.try_recv().is_ok() {
            removed = true;
        }
        if removed {
            self.exists = self.service.exists(&self.pattern);
        } else if added {
            self.exists = true;
        }
        if added || removed {
            tracing::debug!(pattern = %self.pattern, exists = self.exists, "fact cache refreshed");
        }
        self.exists
    }
}

/// Boolean sensor reporting whether any fact matches a pattern.
pub struct KnowledgeSensor {
    name: String,
    cache: FactCache,
    committed: Option<SensorValue>,
}

impl KnowledgeSensor {
    pub fn new(name: &str, service: Arc<dyn KnowledgeService>, pattern: Pattern) -> Self {
        Self {
            name: arbiter_engine::sanitize_name(name),
            cache: FactCache::new(service, pattern),
            committed: None,
        }
    }
}

impl Sensor for KnowledgeSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn sync(&mut self) -> Option<SensorValue> {
        let exists = self.cache.refresh();
        self.committed = Some(SensorValue::Bool(exists));
        self.committed
    }

    fn value(&self) -> arbiter_engine::Result<SensorValue> {
        self.committed.ok_or_else(|| EngineError::UninitializedSensor {
            name: self.name.clone(),
        })
    }
}
