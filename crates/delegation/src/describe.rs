//! Transferable goal descriptions.
//!
//! Delegation never ships live conditions across the wire: a goal travels
//! as a [`GoalDescription`], a named conjunction of planner facts plus a
//! satisfaction threshold. The sending side renders its correlations into
//! facts; the receiving side reconstructs real conditions against its own
//! sensor registry.

use arbiter_engine::{
    Activator, CompareOp, Condition, Effect, Goal, PlannerFact, SensorHandle, SensorRegistry,
    SensorType,
};
use serde::{Deserialize, Serialize};

use crate::error::{DelegationError, Result};

/// Wire form of a delegated goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GoalDescription {
    pub name: String,
    pub satisfaction_threshold: f64,
    /// Conjunction of precondition facts, one per delegated condition.
    pub conditions: Vec<PlannerFact>,
}

impl GoalDescription {
    /// Textual goal representation: the conjunction of all condition facts.
    pub fn representation(&self) -> String {
        self.conditions
            .iter()
            .map(|fact| fact.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Renders correlations with bound sensors into a goal description.
///
/// Boolean effects become predicates asking for the indicated truth value.
/// Numeric effects become comparisons one indicator-step beyond the
/// sensor's last known value; a sensor that never delivered a value counts
/// from zero (logged, since the target is then a guess).
pub fn describe_effects(
    goal_name: &str,
    satisfaction_threshold: f64,
    correlations: &[(Effect, SensorHandle)],
) -> GoalDescription {
    let mut conditions = Vec::with_capacity(correlations.len());
    for (effect, sensor) in correlations {
        let fact = match effect.kind {
            SensorType::Bool => PlannerFact::Predicate {
                name: effect.sensor_name.clone(),
                negated: !effect.is_rising(),
            },
            SensorType::Int | SensorType::Float => {
                let current = sensor.latest().and_then(|v| v.as_number()).unwrap_or_else(|| {
                    tracing::warn!(
                        sensor = %effect.sensor_name,
                        "no value yet, describing numeric target from zero"
                    );
                    0.0
                });
                PlannerFact::Compare {
                    name: effect.sensor_name.clone(),
                    op: if effect.is_rising() { CompareOp::Ge } else { CompareOp::Le },
                    value: current + effect.indicator,
                }
            }
        };
        conditions.push(fact);
    }
    GoalDescription {
        name: goal_name.to_string(),
        satisfaction_threshold,
        conditions,
    }
}

/// Reconstructs an engine goal from a wire description against the target
/// manager's sensors.
///
/// Predicates map to boolean activators, comparisons to threshold
/// activators. Compound facts and unknown sensors are rejected: a
/// delegated goal must be expressible in the target's own terms.
pub fn goal_from_description(
    description: &GoalDescription,
    sensors: &SensorRegistry,
) -> Result<Goal> {
    let mut goal = Goal::new(&description.name)
        .with_satisfaction_threshold(description.satisfaction_threshold);
    for fact in &description.conditions {
        let (sensor_name, activator) = match fact {
            PlannerFact::Predicate { name, negated } => (name, Activator::boolean(!negated)),
            PlannerFact::Compare { name, op, value } => (
                name,
                Activator::threshold(*value, matches!(op, CompareOp::Ge)),
            ),
            other => {
                return Err(DelegationError::InvalidGoalDescription(format!(
                    "unsupported condition fact: {other}"
                )));
            }
        };
        let id = sensors.id_of(sensor_name).ok_or_else(|| {
            DelegationError::InvalidGoalDescription(format!(
                "target manager has no sensor '{sensor_name}'"
            ))
        })?;
        goal = goal.with_condition(Condition::leaf(id, activator));
    }
    Ok(goal)
}
