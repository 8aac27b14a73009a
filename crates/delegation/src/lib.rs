//! Goal delegation for the arbiter behavior engine.
//!
//! Lets a behavior transfer responsibility for its promised effects to
//! another manager instead of executing locally. A goal travels as a
//! [`GoalDescription`] (planner facts plus a satisfaction threshold), is
//! tracked by a [`GoalWrapper`] state machine, and reaches its target
//! through a [`ManagerEndpoint`]. [`DelegationBehavior`] and
//! [`DelegableBehavior`] plug the protocol into a manager's decision
//! cycle; the latter bids a declared local cost against the target's
//! estimate and falls back to local work when delegation loses or dies.

pub mod behavior;
pub mod client;
pub mod describe;
pub mod endpoint;
pub mod error;
pub mod wrapper;

pub use behavior::{DelegableBehavior, DelegationBehavior, LocalWork};
pub use client::{DelegableClient, DelegationClient, ExecutionMode, WorkFallback};
pub use describe::{GoalDescription, describe_effects, goal_from_description};
pub use endpoint::{LocalManagerEndpoint, ManagerEndpoint};
pub use error::{DelegationError, Result};
pub use wrapper::{DelegationState, GoalWrapper};
