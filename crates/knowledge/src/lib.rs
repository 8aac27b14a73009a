//! Tuple-space knowledge base collaborator.
//!
//! Facts are ordered string tuples matched by wildcard patterns. The
//! [`KnowledgeService`] trait is the collaborator contract; the in-memory
//! store is the reference implementation and test double. Clients reach a
//! service through a lazily connecting [`KnowledgeBaseClient`], and
//! [`KnowledgeSensor`] surfaces fact existence to a behavior manager as a
//! boolean sensor.

pub mod client;
pub mod error;
pub mod fact;
pub mod sensor;
pub mod store;

pub use client::{KnowledgeBaseClient, ServiceConnector};
pub use error::{KnowledgeError, Result};
pub use fact::{Fact, Pattern, PatternToken, WILDCARD};
pub use sensor::{FactCache, KnowledgeSensor};
pub use store::{InMemoryKnowledgeBase, KnowledgeService, SubscriptionFeeds};
