//! Manager endpoints: the registration surface a delegated goal targets.
//!
//! The transport is out of scope; anything that can register, unregister,
//! and report on goals behind a probe-able address implements
//! [`ManagerEndpoint`]. [`LocalManagerEndpoint`] adapts an in-process
//! manager, which is also what the tests delegate against.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use arbiter_engine::Manager;

use crate::describe::{GoalDescription, goal_from_description};
use crate::error::{DelegationError, Result};

/// A (possibly remote) manager a goal can be delegated to.
pub trait ManagerEndpoint: Send + Sync {
    /// Prefix identifying the target manager.
    fn prefix(&self) -> String;

    /// Registers the described goal at the target manager.
    fn register_goal(&self, description: &GoalDescription) -> Result<()>;

    /// Unregisters a previously registered goal. Unknown goals are a no-op
    /// so termination stays idempotent.
    fn unregister_goal(&self, goal_name: &str) -> Result<()>;

    /// Current fulfillment of a registered goal.
    fn goal_fulfillment(&self, goal_name: &str) -> Result<f64>;

    /// Estimated cost of pursuing the described goal at this manager,
    /// bid against a delegator's declared local cost.
    fn estimate_cost(&self, description: &GoalDescription) -> Result<f64>;

    /// Whether the registration endpoint answers within the timeout.
    fn probe(&self, timeout: Duration) -> bool;
}

/// In-process endpoint over a shared manager.
pub struct LocalManagerEndpoint {
    manager: Arc<Mutex<Manager>>,
}

impl LocalManagerEndpoint {
    pub fn new(manager: Arc<Mutex<Manager>>) -> Self {
        Self { manager }
    }
}

impl ManagerEndpoint for LocalManagerEndpoint {
    fn prefix(&self) -> String {
        let manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        manager.prefix().to_string()
    }

    fn register_goal(&self, description: &GoalDescription) -> Result<()> {
        let mut manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        let goal = goal_from_description(description, manager.sensors())?;
        manager.add_goal(goal).map_err(|e| DelegationError::Endpoint {
            endpoint: manager.prefix().to_string(),
            message: e.to_string(),
        })
    }

    fn unregister_goal(&self, goal_name: &str) -> Result<()> {
        let mut manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        manager.remove_goal(goal_name);
        Ok(())
    }

    fn goal_fulfillment(&self, goal_name: &str) -> Result<f64> {
        let manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        manager
            .goal_fulfillment(goal_name)
            .ok_or_else(|| DelegationError::Endpoint {
                endpoint: manager.prefix().to_string(),
                message: format!("goal '{goal_name}' is not registered"),
            })
    }

    fn estimate_cost(&self, description: &GoalDescription) -> Result<f64> {
        // How far the target currently is from the described goal: a
        // manager already near satisfaction bids low.
        let manager = self.manager.lock().unwrap_or_else(|e| e.into_inner());
        let goal = goal_from_description(description, manager.sensors())?;
        let fulfillment = goal
            .evaluate(manager.sensors())
            .map(|e| e.fulfillment)
            .unwrap_or(0.0);
        Ok((1.0 - fulfillment).max(0.0))
    }

    fn probe(&self, _timeout: Duration) -> bool {
        // An in-process manager is reachable as long as it exists.
        true
    }
}
