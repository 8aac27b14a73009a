//! Behaviors that hand their goal to another manager.
//!
//! [`DelegationBehavior`] only ever delegates: its correlations describe
//! what it wants done, and starting it ships that description to the
//! registered delegation manager. [`DelegableBehavior`] can also do the
//! work itself and bids its declared local cost against the target's
//! estimate.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use arbiter_engine::{Behavior, BehaviorSpec, Condition, Effect, LifecycleResult, SensorHandle};

use crate::client::{DelegableClient, DelegationClient};
use crate::describe::describe_effects;
use crate::endpoint::ManagerEndpoint;

/// Default satisfaction threshold for delegated goals.
const DEFAULT_THRESHOLD: f64 = 1.0;

/// Behavior whose only action is delegating its promised effects.
pub struct DelegationBehavior {
    name: String,
    satisfaction_threshold: f64,
    /// Correlations with a bound sensor; these travel in the description.
    delegable: Vec<(Effect, SensorHandle)>,
    /// Correlations without a sensor binding; declared to the local
    /// planner only, never delegated.
    planner_only: Vec<Effect>,
    client: DelegationClient,
}

impl DelegationBehavior {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            satisfaction_threshold: DEFAULT_THRESHOLD,
            delegable: Vec::new(),
            planner_only: Vec::new(),
            client: DelegationClient::new(),
        }
    }

    pub fn with_satisfaction_threshold(mut self, threshold: f64) -> Self {
        self.satisfaction_threshold = threshold;
        self
    }

    /// Adds a correlation whose sensor is known; it will be part of the
    /// delegated goal description.
    pub fn add_correlation(&mut self, effect: Effect, sensor: SensorHandle) {
        self.delegable.push((effect, sensor));
    }

    /// Adds a correlation with no registered sensor. It is still declared
    /// to the local planner but excluded from delegation.
    pub fn add_planner_effect(&mut self, effect: Effect) {
        self.planner_only.push(effect);
    }

    pub fn register_manager(&mut self, endpoint: Arc<dyn ManagerEndpoint>) {
        self.client.register(endpoint);
    }

    /// Registration spec declaring every correlation, delegable or not.
    pub fn build_spec(&self, priority: f64, preconditions: Vec<Condition>) -> BehaviorSpec {
        let mut spec = BehaviorSpec::new(&self.name).with_priority(priority);
        for condition in preconditions {
            spec = spec.with_precondition(condition);
        }
        for (effect, _) in &self.delegable {
            spec = spec.with_correlation(effect.clone());
        }
        for effect in &self.planner_only {
            spec = spec.with_correlation(effect.clone());
        }
        spec
    }

    pub fn has_active_delegations(&self) -> bool {
        self.client.has_active_delegations()
    }
}

impl Behavior for DelegationBehavior {
    fn start(&mut self) -> LifecycleResult {
        if !self.client.is_registered() {
            tracing::error!(
                behavior = %self.name,
                "no delegation manager registered, goal stays un-pursued"
            );
            return Ok(());
        }
        let description = describe_effects(
            &format!("{}/goal", self.name),
            self.satisfaction_threshold,
            &self.delegable,
        );
        self.client.delegate(description).map_err(Into::into)
    }

    fn do_step(&mut self) -> LifecycleResult {
        self.client.do_step();
        Ok(())
    }

    fn stop(&mut self) -> LifecycleResult {
        self.client.terminate_all();
        Ok(())
    }
}

/// Work a delegable behavior can perform itself.
pub trait LocalWork: Send {
    fn start_work(&mut self) -> LifecycleResult;

    fn do_step_work(&mut self) -> LifecycleResult {
        Ok(())
    }

    fn stop_work(&mut self) -> LifecycleResult;
}

/// Behavior that delegates when a manager is registered and the bid wins,
/// and otherwise executes its own work.
///
/// Exactly one of {delegated, local} mode is active between `start` and
/// `stop`. The fallback path (losing bid, send failure, orphaned goal)
/// flips to local mode only after the delegation state is invalidated.
pub struct DelegableBehavior {
    name: String,
    satisfaction_threshold: f64,
    own_cost: f64,
    delegable: Vec<(Effect, SensorHandle)>,
    client: DelegableClient,
    work: Arc<Mutex<dyn LocalWork>>,
    local_mode: Arc<AtomicBool>,
}

impl DelegableBehavior {
    pub fn new(name: &str, own_cost: f64, work: Arc<Mutex<dyn LocalWork>>) -> Self {
        Self {
            name: name.to_string(),
            satisfaction_threshold: DEFAULT_THRESHOLD,
            own_cost,
            delegable: Vec::new(),
            client: DelegableClient::new(),
            work,
            local_mode: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn with_satisfaction_threshold(mut self, threshold: f64) -> Self {
        self.satisfaction_threshold = threshold;
        self
    }

    pub fn add_correlation(&mut self, effect: Effect, sensor: SensorHandle) {
        self.delegable.push((effect, sensor));
    }

    pub fn register_manager(&mut self, endpoint: Arc<dyn ManagerEndpoint>) {
        self.client.register(endpoint);
    }

    pub fn build_spec(&self, priority: f64, preconditions: Vec<Condition>) -> BehaviorSpec {
        let mut spec = BehaviorSpec::new(&self.name).with_priority(priority);
        for condition in preconditions {
            spec = spec.with_precondition(condition);
        }
        for (effect, _) in &self.delegable {
            spec = spec.with_correlation(effect.clone());
        }
        spec
    }

    /// Whether the behavior is currently doing the work itself.
    pub fn is_local_mode(&self) -> bool {
        self.local_mode.load(Ordering::SeqCst)
    }

    fn fallback(&self) -> Box<dyn FnMut() + Send> {
        let work = self.work.clone();
        let local_mode = self.local_mode.clone();
        let name = self.name.clone();
        Box::new(move || {
            local_mode.store(true, Ordering::SeqCst);
            let mut work = work.lock().unwrap_or_else(|e| e.into_inner());
            if let Err(e) = work.start_work() {
                tracing::error!(behavior = %name, error = %e, "local work failed to start");
            }
        })
    }
}

impl Behavior for DelegableBehavior {
    fn start(&mut self) -> LifecycleResult {
        self.local_mode.store(false, Ordering::SeqCst);
        let description = describe_effects(
            &format!("{}/goal", self.name),
            self.satisfaction_threshold,
            &self.delegable,
        );
        let fallback = self.fallback();
        let mode = self
            .client
            .delegate_or_work(description, self.own_cost, fallback);
        tracing::debug!(behavior = %self.name, ?mode, "execution mode decided");
        Ok(())
    }

    fn do_step(&mut self) -> LifecycleResult {
        if self.local_mode.load(Ordering::SeqCst) {
            let mut work = self.work.lock().unwrap_or_else(|e| e.into_inner());
            work.do_step_work()
        } else {
            self.client.do_step();
            Ok(())
        }
    }

    fn stop(&mut self) -> LifecycleResult {
        // Outstanding delegations go first; local work (if any) second.
        self.client.terminate_all();
        if self.local_mode.swap(false, Ordering::SeqCst) {
            let mut work = self.work.lock().unwrap_or_else(|e| e.into_inner());
            work.stop_work()
        } else {
            Ok(())
        }
    }
}
