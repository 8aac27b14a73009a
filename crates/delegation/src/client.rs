//! Delegation clients: per-behavior bookkeeping over delegated goals.
//!
//! A [`DelegationClient`] owns every goal its behavior has delegated and
//! runs the recurring maintenance pass (liveness, fulfillment updates,
//! orphan recovery). [`DelegableClient`] layers cost bidding on top for
//! behaviors that can also do the work themselves.

use std::sync::Arc;

use crate::describe::GoalDescription;
use crate::endpoint::ManagerEndpoint;
use crate::error::{DelegationError, Result};
use crate::wrapper::{DelegationState, GoalWrapper};

/// Invoked when a delegated goal must be handed back to local execution.
pub type WorkFallback = Box<dyn FnMut() + Send>;

/// Which execution mode a delegable goal ended up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    Delegated,
    Local,
}

struct Delegation {
    wrapper: GoalWrapper,
    fallback: Option<WorkFallback>,
}

/// Bookkeeping for all goals one behavior has delegated.
#[derive(Default)]
pub struct DelegationClient {
    endpoint: Option<Arc<dyn ManagerEndpoint>>,
    delegations: Vec<Delegation>,
}

impl DelegationClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the manager future delegations are sent to.
    pub fn register(&mut self, endpoint: Arc<dyn ManagerEndpoint>) {
        tracing::debug!(target = %endpoint.prefix(), "delegation manager registered");
        self.endpoint = Some(endpoint);
    }

    pub fn is_registered(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Delegates a goal to the registered manager.
    pub fn delegate(&mut self, description: GoalDescription) -> Result<()> {
        self.delegate_with_fallback(description, None)
    }

    /// Delegates a goal, keeping a fallback to invoke if the target later
    /// orphans it and no re-delegation is possible.
    pub fn delegate_with_fallback(
        &mut self,
        description: GoalDescription,
        fallback: Option<WorkFallback>,
    ) -> Result<()> {
        let endpoint = self
            .endpoint
            .clone()
            .ok_or(DelegationError::NoManagerRegistered)?;
        let mut wrapper = GoalWrapper::new(description, endpoint);
        wrapper.send()?;
        self.delegations.push(Delegation { wrapper, fallback });
        Ok(())
    }

    /// States of all non-terminated delegations, by goal name.
    pub fn states(&self) -> Vec<(String, DelegationState)> {
        self.delegations
            .iter()
            .map(|d| (d.wrapper.goal_name().to_string(), d.wrapper.state()))
            .collect()
    }

    pub fn has_active_delegations(&self) -> bool {
        self.delegations
            .iter()
            .any(|d| d.wrapper.state().is_sent())
    }

    /// One maintenance pass: probe liveness, refresh fulfillment, and
    /// recover orphans.
    ///
    /// An orphaned goal is re-sent to the currently registered manager if
    /// that is a different, reachable target; otherwise its fallback fires
    /// (once) and the delegation is terminated.
    pub fn do_step(&mut self) {
        for delegation in &mut self.delegations {
            if !delegation.wrapper.state().is_sent() {
                if delegation.wrapper.state() == DelegationState::Orphaned {
                    Self::recover(delegation, self.endpoint.as_ref());
                }
                continue;
            }
            if !delegation.wrapper.check_alive() {
                Self::recover(delegation, self.endpoint.as_ref());
                continue;
            }
            if let Err(e) = delegation.wrapper.update() {
                tracing::warn!(
                    goal = %delegation.wrapper.goal_name(),
                    error = %e,
                    "fulfillment poll failed"
                );
            }
        }
    }

    fn recover(delegation: &mut Delegation, endpoint: Option<&Arc<dyn ManagerEndpoint>>) {
        if let Some(endpoint) = endpoint {
            if endpoint.prefix() != delegation.wrapper.endpoint_prefix() {
                delegation.wrapper.reassign(endpoint.clone());
                match delegation.wrapper.send() {
                    Ok(()) => {
                        tracing::info!(
                            goal = %delegation.wrapper.goal_name(),
                            target = %endpoint.prefix(),
                            "orphaned goal re-delegated"
                        );
                        return;
                    }
                    Err(e) => {
                        tracing::warn!(
                            goal = %delegation.wrapper.goal_name(),
                            error = %e,
                            "re-delegation failed"
                        );
                    }
                }
            }
        }
        // Invalidate the delegation before any local work begins. The
        // target is gone, so terminate only updates local state here.
        let fallback = delegation.fallback.take();
        let _ = delegation.wrapper.terminate();
        if let Some(mut fallback) = fallback {
            tracing::info!(
                goal = %delegation.wrapper.goal_name(),
                "falling back to local execution"
            );
            fallback();
        }
    }

    /// Terminates every outstanding delegation. Idempotent: already
    /// terminated goals are skipped and produce no second unregister.
    pub fn terminate_all(&mut self) {
        for delegation in &mut self.delegations {
            if let Err(e) = delegation.wrapper.terminate() {
                tracing::warn!(
                    goal = %delegation.wrapper.goal_name(),
                    error = %e,
                    "terminating delegated goal failed"
                );
            }
        }
        self.delegations.clear();
    }
}

/// Client for behaviors that can execute their goal themselves.
#[derive(Default)]
pub struct DelegableClient {
    inner: DelegationClient,
}

impl DelegableClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, endpoint: Arc<dyn ManagerEndpoint>) {
        self.inner.register(endpoint);
    }

    pub fn is_registered(&self) -> bool {
        self.inner.is_registered()
    }

    pub fn do_step(&mut self) {
        self.inner.do_step();
    }

    pub fn terminate_all(&mut self) {
        self.inner.terminate_all();
    }

    /// Bids delegation against local execution.
    ///
    /// The goal is delegated only when a manager is registered and its cost
    /// estimate does not exceed `own_cost`. Every other outcome — no
    /// manager, an estimation error, a losing bid, a failed send — invokes
    /// the fallback immediately and reports [`ExecutionMode::Local`].
    pub fn delegate_or_work(
        &mut self,
        description: GoalDescription,
        own_cost: f64,
        mut fallback: WorkFallback,
    ) -> ExecutionMode {
        let Some(endpoint) = self.inner.endpoint.clone() else {
            fallback();
            return ExecutionMode::Local;
        };
        match endpoint.estimate_cost(&description) {
            Ok(remote_cost) if remote_cost <= own_cost => {
                tracing::debug!(
                    goal = %description.name,
                    remote_cost,
                    own_cost,
                    "delegation wins the bid"
                );
            }
            Ok(remote_cost) => {
                tracing::debug!(
                    goal = %description.name,
                    remote_cost,
                    own_cost,
                    "local execution wins the bid"
                );
                fallback();
                return ExecutionMode::Local;
            }
            Err(e) => {
                tracing::warn!(goal = %description.name, error = %e, "cost estimate failed");
                fallback();
                return ExecutionMode::Local;
            }
        }
        let mut wrapper = GoalWrapper::new(description, endpoint);
        match wrapper.send() {
            Ok(()) => {
                self.inner.delegations.push(Delegation {
                    wrapper,
                    fallback: Some(fallback),
                });
                ExecutionMode::Delegated
            }
            Err(e) => {
                tracing::warn!(error = %e, "delegation failed, executing locally");
                fallback();
                ExecutionMode::Local
            }
        }
    }
}
