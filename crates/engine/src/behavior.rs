//! Behavior contract and registration data.

use crate::condition::Condition;
use crate::effect::Effect;

/// Error type behaviors may raise from lifecycle calls. The manager absorbs
/// these per-behavior: a failure is logged and excludes the behavior for the
/// remainder of the current cycle, never aborting the cycle itself.
pub type BehaviorError = Box<dyn std::error::Error + Send + Sync>;

pub type LifecycleResult = std::result::Result<(), BehaviorError>;

/// Executable body of a behavior.
///
/// The manager drives the lifecycle: `start` when the behavior enters the
/// executing set, `do_step` every cycle it stays there (if its spec asks
/// for per-cycle stepping), `stop` when it leaves. `stop` must be safe to
/// call even if `start` never completed successfully.
pub trait Behavior: Send {
    fn start(&mut self) -> LifecycleResult;

    fn do_step(&mut self) -> LifecycleResult {
        Ok(())
    }

    fn stop(&mut self) -> LifecycleResult;

    /// Whether a running instance of this behavior may be preempted.
    fn is_interruptible(&self) -> bool {
        true
    }
}

/// Registration data describing a behavior to its manager.
#[derive(Clone)]
pub struct BehaviorSpec {
    pub name: String,
    pub preconditions: Vec<Condition>,
    pub correlations: Vec<Effect>,
    /// Tie-breaker between equally activated behaviors; higher wins.
    pub priority: f64,
    /// Whether the manager must call `do_step` every cycle, or the behavior
    /// drives itself once started.
    pub requires_step: bool,
}

impl BehaviorSpec {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            preconditions: Vec::new(),
            correlations: Vec::new(),
            priority: 0.0,
            requires_step: true,
        }
    }

    pub fn with_precondition(mut self, condition: Condition) -> Self {
        self.preconditions.push(condition);
        self
    }

    pub fn with_correlation(mut self, effect: Effect) -> Self {
        self.correlations.push(effect);
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_requires_step(mut self, requires_step: bool) -> Self {
        self.requires_step = requires_step;
        self
    }
}
