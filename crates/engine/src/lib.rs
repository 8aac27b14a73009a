//! Activation-based behavior arbitration engine.
//!
//! The engine arbitrates among competing behaviors using continuous
//! activation values derived from sensed state, optionally consulting an
//! external symbolic planner for long-horizon guidance.
//!
//! Modules are organized bottom-up along the data model:
//! - [`sensor`]: two-slot sensed values and the registry managers own
//! - [`activator`]: activation schemes mapping values to activation/wish
//! - [`condition`]: combinators composing (sensor, activator) leaves
//! - [`effect`]: declared correlations of behavior execution
//! - [`behavior`] and [`goal`]: the units the manager arbitrates
//! - [`manager`]: the per-cycle decision algorithm
//! - [`network`]: a nested manager exposed as a single behavior
//! - [`pddl`] and [`planner`]: planner facts, problem export, solver hook

pub mod activator;
pub mod behavior;
pub mod condition;
pub mod effect;
pub mod error;
pub mod goal;
pub mod manager;
pub mod network;
pub mod pddl;
pub mod planner;
pub mod sensor;

pub use activator::{ActivationBounds, Activator, Direction};
pub use behavior::{Behavior, BehaviorError, BehaviorSpec, LifecycleResult};
pub use condition::{Condition, ConditionEvaluation, MultiReduce, Wish, condition_from_effect};
pub use effect::Effect;
pub use error::{EngineError, Result};
pub use goal::{Goal, GoalEvaluation};
pub use manager::{Manager, ManagerConfig};
pub use network::{NestedStepping, NetworkBehavior};
pub use pddl::{CompareOp, PlannerFact, fact_holds, sanitize_name};
pub use planner::{ActionSpec, Plan, Planner, PlannerError, PlannerProblem, ReferencePlanner};
pub use sensor::{
    DynamicSensor, DynamicSourceHandle, NameGenerator, RawSensor, Sensor, SensorHandle, SensorId,
    SensorRegistry, SensorType, SensorValue,
};
