//! Lifecycle wrapper around one delegated goal.
//!
//! A [`GoalWrapper`] owns the wire description of a goal, tracks where it
//! stands at the target manager, and is the only component that talks to
//! the endpoint about this goal. State transitions:
//!
//! ```text
//! Created -> Sent -> { Active <-> Satisfied } -> Terminated
//!                          \----> Orphaned <---/
//! ```
//!
//! `Orphaned` is entered when the liveness probe fails; the failure is
//! cached so repeat checks on a dead target answer immediately instead of
//! waiting out the probe timeout again.

use std::sync::Arc;
use std::time::Duration;

use crate::describe::GoalDescription;
use crate::endpoint::ManagerEndpoint;
use crate::error::{DelegationError, Result};

/// Where a delegated goal currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelegationState {
    /// Built locally, not yet registered anywhere.
    Created,
    /// Registered at the target, fulfillment not yet observed.
    Sent,
    /// Registered and below the satisfaction threshold.
    Active,
    /// Registered and at or above the satisfaction threshold.
    Satisfied,
    /// The target manager stopped answering liveness probes.
    Orphaned,
    /// Unregistered; terminal.
    Terminated,
}

impl DelegationState {
    /// Whether the goal is (believed to be) registered at a target.
    pub fn is_sent(self) -> bool {
        matches!(self, Self::Sent | Self::Active | Self::Satisfied)
    }
}

/// Handle for one goal delegated to one endpoint.
pub struct GoalWrapper {
    description: GoalDescription,
    endpoint: Arc<dyn ManagerEndpoint>,
    state: DelegationState,
    probe_timeout: Duration,
    /// Set after the first failed probe; short-circuits later checks.
    known_dead: bool,
}

impl GoalWrapper {
    /// Default liveness probe timeout for a target not yet known dead.
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_millis(500);

    pub fn new(description: GoalDescription, endpoint: Arc<dyn ManagerEndpoint>) -> Self {
        Self {
            description,
            endpoint,
            state: DelegationState::Created,
            probe_timeout: Self::DEFAULT_PROBE_TIMEOUT,
            known_dead: false,
        }
    }

    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn state(&self) -> DelegationState {
        self.state
    }

    pub fn goal_name(&self) -> &str {
        &self.description.name
    }

    pub fn description(&self) -> &GoalDescription {
        &self.description
    }

    pub fn endpoint_prefix(&self) -> String {
        self.endpoint.prefix()
    }

    /// Registers the goal at the target manager.
    ///
    /// On failure the wrapper rolls back to `Created`, so the caller may
    /// retry against the same or another endpoint.
    pub fn send(&mut self) -> Result<()> {
        if self.state.is_sent() {
            return Ok(());
        }
        match self.endpoint.register_goal(&self.description) {
            Ok(()) => {
                tracing::debug!(
                    goal = %self.description.name,
                    target = %self.endpoint.prefix(),
                    "delegated goal registered"
                );
                self.state = DelegationState::Sent;
                Ok(())
            }
            Err(e) => {
                self.state = DelegationState::Created;
                Err(DelegationError::SendFailed {
                    goal: self.description.name.clone(),
                    message: e.to_string(),
                })
            }
        }
    }

    /// Probes the target manager.
    ///
    /// The first failed probe marks the goal orphaned and is cached:
    /// every later call answers `false` without touching the endpoint.
    pub fn check_alive(&mut self) -> bool {
        if self.known_dead {
            return false;
        }
        if self.endpoint.probe(self.probe_timeout) {
            return true;
        }
        tracing::warn!(
            goal = %self.description.name,
            target = %self.endpoint.prefix(),
            "liveness probe failed, goal is orphaned"
        );
        self.known_dead = true;
        if self.state.is_sent() {
            self.state = DelegationState::Orphaned;
        }
        false
    }

    /// Polls the goal's fulfillment and moves between `Active` and
    /// `Satisfied`. No-op unless the goal is sent.
    pub fn update(&mut self) -> Result<()> {
        if !self.state.is_sent() {
            return Ok(());
        }
        let fulfillment = self.endpoint.goal_fulfillment(&self.description.name)?;
        self.state = if fulfillment >= self.description.satisfaction_threshold {
            DelegationState::Satisfied
        } else {
            DelegationState::Active
        };
        Ok(())
    }

    /// Unregisters the goal at the target. Idempotent; safe on a goal that
    /// was never sent or whose target is already gone.
    pub fn terminate(&mut self) -> Result<()> {
        if matches!(self.state, DelegationState::Terminated) {
            return Ok(());
        }
        if self.state.is_sent() && !self.known_dead {
            self.endpoint.unregister_goal(&self.description.name)?;
        }
        self.state = DelegationState::Terminated;
        Ok(())
    }

    /// Resets an orphaned goal back to `Created` so it can be re-sent to a
    /// new endpoint.
    pub fn reassign(&mut self, endpoint: Arc<dyn ManagerEndpoint>) {
        self.endpoint = endpoint;
        self.state = DelegationState::Created;
        self.known_dead = false;
    }
}
