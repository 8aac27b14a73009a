//! Client-side access to a knowledge service with lazy connection.
//!
//! Discovery of the actual service instance can be slow or racy at agent
//! startup, so the client connects in two stages: a bounded wait at
//! construction, and, if that times out, an unbounded wait deferred to the
//! first real call. Initialization is a one-shot gate under a mutex:
//! concurrent first callers trigger exactly one connect.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{KnowledgeError, Result};
use crate::fact::{Fact, Pattern};
use crate::store::{KnowledgeService, SubscriptionFeeds};

/// Resolves a live [`KnowledgeService`] instance.
pub trait ServiceConnector: Send + Sync {
    /// Attempts to reach the service. `None` waits without bound; a
    /// timeout bounds the attempt and may come back empty.
    fn connect(&self, timeout: Option<Duration>) -> Option<Arc<dyn KnowledgeService>>;
}

/// Lazily connected client over a [`ServiceConnector`].
pub struct KnowledgeBaseClient {
    connector: Box<dyn ServiceConnector>,
    service: Mutex<Option<Arc<dyn KnowledgeService>>>,
}

impl KnowledgeBaseClient {
    /// Bounded wait attempted at construction before deferring to first use.
    pub const EAGER_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates the client, eagerly attempting a bounded connect.
    ///
    /// A miss here is not an error: the connect is retried, unbounded, on
    /// the first actual call.
    pub fn new(connector: Box<dyn ServiceConnector>) -> Self {
        Self::with_eager_timeout(connector, Self::EAGER_CONNECT_TIMEOUT)
    }

    pub fn with_eager_timeout(connector: Box<dyn ServiceConnector>, timeout: Duration) -> Self {
        let service = connector.connect(Some(timeout));
        if service.is_none() {
            tracing::info!(
                timeout_ms = timeout.as_millis() as u64,
                "knowledge service not up yet, deferring connect to first use"
            );
        }
        Self {
            connector,
            service: Mutex::new(service),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.service
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    /// One-shot initialization gate: re-checks under the lock, so
    /// concurrent first callers race to the lock, not to the connect.
    fn service(&self) -> Result<Arc<dyn KnowledgeService>> {
        let mut slot = self.service.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(service) = slot.as_ref() {
            return Ok(Arc::clone(service));
        }
        tracing::debug!("connecting to knowledge service on first use");
        let service = self
            .connector
            .connect(None)
            .ok_or_else(|| KnowledgeError::Unavailable("connector gave up".to_string()))?;
        *slot = Some(Arc::clone(&service));
        Ok(service)
    }

    pub fn exists(&self, pattern: &Pattern) -> Result<bool> {
        Ok(self.service()?.exists(pattern))
    }

    pub fn pop(&self, pattern: &Pattern) -> Result<Option<Fact>> {
        Ok(self.service()?.pop(pattern))
    }

    pub fn peek(&self, pattern: &Pattern) -> Result<Option<Fact>> {
        Ok(self.service()?.peek(pattern))
    }

    pub fn all(&self, pattern: &Pattern) -> Result<Vec<Fact>> {
        Ok(self.service()?.all(pattern))
    }

    pub fn update(&self, old: &Pattern, new: Fact) -> Result<bool> {
        Ok(self.service()?.update(old, new))
    }

    /// Fire-and-forget store. Connection errors are logged, not surfaced.
    pub fn push(&self, fact: Fact) {
        match self.service() {
            Ok(service) => service.push(fact),
            Err(e) => tracing::warn!(error = %e, %fact, "fact dropped"),
        }
    }

    pub fn subscribe(&self, pattern: Pattern) -> Result<SubscriptionFeeds> {
        Ok(self.service()?.subscribe(pattern))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::store::InMemoryKnowledgeBase;

    use super::*;

    /// Connector that refuses bounded attempts unless told otherwise,
    /// counting every connect.
    struct FlakyConnector {
        service: Arc<InMemoryKnowledgeBase>,
        bounded_succeeds: bool,
        connects: Arc<AtomicUsize>,
    }

    impl ServiceConnector for FlakyConnector {
        fn connect(&self, timeout: Option<Duration>) -> Option<Arc<dyn KnowledgeService>> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if timeout.is_some() && !self.bounded_succeeds {
                return None;
            }
            Some(self.service.clone())
        }
    }

    fn client(
        bounded_succeeds: bool,
    ) -> (
        KnowledgeBaseClient,
        Arc<InMemoryKnowledgeBase>,
        Arc<AtomicUsize>,
    ) {
        let service = Arc::new(InMemoryKnowledgeBase::new());
        let connects = Arc::new(AtomicUsize::new(0));
        let connector = Box::new(FlakyConnector {
            service: service.clone(),
            bounded_succeeds,
            connects: connects.clone(),
        });
        (
            KnowledgeBaseClient::with_eager_timeout(connector, Duration::from_millis(1)),
            service,
            connects,
        )
    }

    #[test]
    fn eager_connect_binds_at_construction() {
        let (client, service, _) = client(true);
        assert!(client.is_connected());
        service.push(Fact::new(["x"]));
        assert!(client.exists(&Pattern::new(["x"])).unwrap());
    }

    #[test]
    fn missed_eager_connect_defers_to_first_use() {
        let (client, service, _) = client(false);
        assert!(!client.is_connected());

        service.push(Fact::new(["x"]));
        // First call performs the unbounded connect.
        assert!(client.exists(&Pattern::new(["x"])).unwrap());
        assert!(client.is_connected());
    }

    #[test]
    fn initialization_happens_exactly_once() {
        let (client, _, connects) = client(false);

        let pattern = Pattern::new(["x"]);
        let _ = client.exists(&pattern).unwrap();
        let _ = client.exists(&pattern).unwrap();
        let _ = client.peek(&pattern).unwrap();

        // One bounded miss at construction, one unbounded connect on first
        // use, nothing after.
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }
}
