//! Hierarchical composition: a manager nested inside a behavior.
//!
//! A [`NetworkBehavior`] exposes a whole sub-network of behaviors to a
//! parent manager as one behavior. Every effect it promises upward becomes
//! an internal permanent goal of the nested manager, so a hierarchy of
//! managers can each pursue externally promised effects without the parent
//! knowing the child's internal structure.

use crate::behavior::{Behavior, BehaviorSpec, LifecycleResult};
use crate::condition::condition_from_effect;
use crate::effect::Effect;
use crate::error::{EngineError, Result};
use crate::goal::Goal;
use crate::manager::{Manager, ManagerConfig};

/// Who drives the nested manager's decision cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NestedStepping {
    /// The parent's `do_step` call runs one nested cycle.
    Automatic,
    /// The embedder calls [`NetworkBehavior::step_nested`] itself.
    Manual,
}

/// A behavior that encapsulates a nested manager.
pub struct NetworkBehavior {
    name: String,
    manager: Manager,
    stepping: NestedStepping,
    correlations: Vec<Effect>,
    goal_counter: u64,
}

impl NetworkBehavior {
    /// Creates the behavior with an initially deactivated nested manager
    /// whose prefix is `<name>/manager`.
    pub fn new(name: &str, config: ManagerConfig, stepping: NestedStepping) -> Self {
        let mut manager = Manager::new(&format!("{name}/manager"), config);
        manager.deactivate();
        Self {
            name: name.to_string(),
            manager,
            stepping,
            correlations: Vec::new(),
            goal_counter: 0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Access to the nested manager for registering sensors, behaviors,
    /// and extra goals.
    pub fn manager_mut(&mut self) -> &mut Manager {
        &mut self.manager
    }

    pub fn manager(&self) -> &Manager {
        &self.manager
    }

    /// Promises an effect upward and synthesizes the internal permanent
    /// goal that makes the nested manager work on it: boolean effects ask
    /// for the indicated truth value, numeric effects keep pushing the
    /// sensor in the indicated direction (never reaching satisfaction).
    ///
    /// Fails if the effect names a sensor the nested manager does not have.
    pub fn promise_effect(&mut self, effect: Effect) -> Result<()> {
        let sensor = self
            .manager
            .sensor_id(&effect.sensor_name)
            .ok_or_else(|| EngineError::UnknownSensor(effect.sensor_name.clone()))?;

        // The counter and the 'X' separator keep generated names unique
        // even when several effects target the same sensor.
        let goal_name = format!(
            "{}/goals/{}X{}",
            self.name, self.goal_counter, effect.sensor_name
        );
        self.goal_counter += 1;

        let goal = Goal::new(&goal_name)
            .with_condition(condition_from_effect(&effect, sensor))
            .permanent(true);
        self.manager.add_goal(goal)?;
        self.correlations.push(effect);
        Ok(())
    }

    /// Promises an effect upward without a nested goal; the parent's
    /// planner sees it, but nothing inside the sub-network pursues it.
    pub fn add_correlation(&mut self, effect: Effect) {
        self.correlations.push(effect);
    }

    /// Runs one nested decision cycle. Only meaningful while started.
    pub fn step_nested(&mut self) {
        self.manager.step();
    }

    /// Parent-facing registration data carrying the promised correlations.
    pub fn build_spec(&self, priority: f64, preconditions: Vec<crate::condition::Condition>) -> BehaviorSpec {
        BehaviorSpec {
            name: self.name.clone(),
            preconditions,
            correlations: self.correlations.clone(),
            priority,
            requires_step: self.stepping == NestedStepping::Automatic,
        }
    }
}

impl Behavior for NetworkBehavior {
    fn start(&mut self) -> LifecycleResult {
        self.manager.activate();
        Ok(())
    }

    fn do_step(&mut self) -> LifecycleResult {
        if self.stepping == NestedStepping::Automatic {
            self.manager.step();
        }
        Ok(())
    }

    fn stop(&mut self) -> LifecycleResult {
        self.manager.deactivate();
        Ok(())
    }

    fn is_interruptible(&self) -> bool {
        self.manager.is_interruptible()
    }
}
