//! Conditions: composition of sensors and activators.
//!
//! A condition composes one or more (sensor, activator) leaves through
//! combinators into a single satisfaction value, a deterministic list of
//! wishes, and planner facts for both its precondition and current-state
//! form. Conditions hold [`SensorId`] handles, never sensors; evaluation
//! always runs against the registry's committed snapshot.

use crate::activator::{ActivationBounds, Activator};
use crate::effect::Effect;
use crate::error::Result;
use crate::pddl::PlannerFact;
use crate::sensor::{SensorId, SensorRegistry, SensorType};

/// A wish: how a sensor should move to better satisfy a condition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Wish {
    pub sensor: SensorId,
    pub indicator: f64,
}

/// Result of evaluating a condition against a committed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConditionEvaluation {
    pub satisfaction: f64,
    pub wishes: Vec<Wish>,
}

/// Reduction applied by a multi-sensor condition across its per-sensor
/// satisfactions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiReduce {
    Min,
    Max,
    Mean,
}

/// Closed combinator set over (sensor, activator) leaves.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// One activator applied to one sensor.
    Leaf { sensor: SensorId, activator: Activator },

    /// One activator applied across several sensors at once.
    Multi {
        sensors: Vec<SensorId>,
        activator: Activator,
        reduce: MultiReduce,
    },

    /// Conjunction: satisfaction is the minimum of the parts.
    And(Vec<Condition>),

    /// Disjunction: satisfaction is the maximum of the parts.
    Or(Vec<Condition>),

    /// Negation: satisfaction is `max - s + min` over the given bounds;
    /// wishes are sign-inverted.
    Not(Box<Condition>, ActivationBounds),
}

impl Condition {
    pub fn leaf(sensor: SensorId, activator: Activator) -> Self {
        Condition::Leaf { sensor, activator }
    }

    pub fn negate(condition: Condition) -> Self {
        Condition::Not(Box::new(condition), ActivationBounds::default())
    }

    /// Evaluates satisfaction and wishes against the committed snapshot.
    ///
    /// Sub-conditions are visited in declaration order, keeping wish lists
    /// reproducible for the planner export.
    pub fn evaluate(&self, sensors: &SensorRegistry) -> Result<ConditionEvaluation> {
        match self {
            Condition::Leaf { sensor, activator } => {
                let name = sensors.name_of(*sensor);
                let value = sensors.value(*sensor)?;
                Ok(ConditionEvaluation {
                    satisfaction: activator.activation(name, value)?,
                    wishes: vec![Wish {
                        sensor: *sensor,
                        indicator: activator.wish(name, value)?,
                    }],
                })
            }
            Condition::Multi {
                sensors: ids,
                activator,
                reduce,
            } => {
                // Without sensors there is no evidence to satisfy on.
                if ids.is_empty() {
                    return Ok(ConditionEvaluation {
                        satisfaction: 0.0,
                        wishes: Vec::new(),
                    });
                }
                let mut satisfactions = Vec::with_capacity(ids.len());
                let mut wishes = Vec::with_capacity(ids.len());
                for id in ids {
                    let name = sensors.name_of(*id);
                    let value = sensors.value(*id)?;
                    satisfactions.push(activator.activation(name, value)?);
                    wishes.push(Wish {
                        sensor: *id,
                        indicator: activator.wish(name, value)?,
                    });
                }
                let satisfaction = match reduce {
                    MultiReduce::Min => satisfactions.iter().copied().fold(f64::MAX, f64::min),
                    MultiReduce::Max => satisfactions.iter().copied().fold(f64::MIN, f64::max),
                    MultiReduce::Mean => {
                        satisfactions.iter().sum::<f64>() / satisfactions.len() as f64
                    }
                };
                Ok(ConditionEvaluation { satisfaction, wishes })
            }
            Condition::And(parts) => {
                // Empty conjunction is trivially satisfied.
                let mut satisfaction = if parts.is_empty() { 1.0 } else { f64::MAX };
                let mut wishes = Vec::new();
                for part in parts {
                    let eval = part.evaluate(sensors)?;
                    satisfaction = satisfaction.min(eval.satisfaction);
                    wishes.extend(eval.wishes);
                }
                Ok(ConditionEvaluation { satisfaction, wishes })
            }
            Condition::Or(parts) => {
                // Empty disjunction is never satisfied.
                let mut satisfaction = if parts.is_empty() { 0.0 } else { f64::MIN };
                let mut wishes = Vec::new();
                for part in parts {
                    let eval = part.evaluate(sensors)?;
                    satisfaction = satisfaction.max(eval.satisfaction);
                    wishes.extend(eval.wishes);
                }
                Ok(ConditionEvaluation { satisfaction, wishes })
            }
            Condition::Not(inner, bounds) => {
                let eval = inner.evaluate(sensors)?;
                Ok(ConditionEvaluation {
                    satisfaction: bounds.max - eval.satisfaction + bounds.min,
                    wishes: eval
                        .wishes
                        .into_iter()
                        .map(|w| Wish {
                            sensor: w.sensor,
                            indicator: -w.indicator,
                        })
                        .collect(),
                })
            }
        }
    }

    /// Precondition fact at the given satisfaction threshold.
    pub fn precondition_fact(
        &self,
        sensors: &SensorRegistry,
        threshold: f64,
    ) -> Result<PlannerFact> {
        match self {
            Condition::Leaf { sensor, activator } => {
                let name = sensors.name_of(*sensor);
                let value = sensors.value(*sensor)?;
                activator.precondition_fact(name, value, threshold)
            }
            Condition::Multi {
                sensors: ids,
                activator,
                ..
            } => {
                let mut parts = Vec::with_capacity(ids.len());
                for id in ids {
                    let name = sensors.name_of(*id);
                    let value = sensors.value(*id)?;
                    parts.push(activator.precondition_fact(name, value, threshold)?);
                }
                Ok(PlannerFact::And(parts))
            }
            Condition::And(conds) => {
                let mut parts = Vec::with_capacity(conds.len());
                for cond in conds {
                    parts.push(cond.precondition_fact(sensors, threshold)?);
                }
                Ok(PlannerFact::And(parts))
            }
            Condition::Or(conds) => {
                let mut parts = Vec::with_capacity(conds.len());
                for cond in conds {
                    parts.push(cond.precondition_fact(sensors, threshold)?);
                }
                Ok(PlannerFact::Or(parts))
            }
            Condition::Not(inner, _) => Ok(PlannerFact::Not(Box::new(
                inner.precondition_fact(sensors, threshold)?,
            ))),
        }
    }

    /// Current-state facts, one per referenced sensor, in declaration order.
    pub fn state_facts(&self, sensors: &SensorRegistry) -> Result<Vec<PlannerFact>> {
        let mut facts = Vec::new();
        self.collect_state_facts(sensors, &mut facts)?;
        Ok(facts)
    }

    fn collect_state_facts(
        &self,
        sensors: &SensorRegistry,
        out: &mut Vec<PlannerFact>,
    ) -> Result<()> {
        match self {
            Condition::Leaf { sensor, activator } => {
                let name = sensors.name_of(*sensor);
                let value = sensors.value(*sensor)?;
                out.push(activator.state_fact(name, value)?);
            }
            Condition::Multi {
                sensors: ids,
                activator,
                ..
            } => {
                for id in ids {
                    let name = sensors.name_of(*id);
                    let value = sensors.value(*id)?;
                    out.push(activator.state_fact(name, value)?);
                }
            }
            Condition::And(parts) | Condition::Or(parts) => {
                for part in parts {
                    part.collect_state_facts(sensors, out)?;
                }
            }
            Condition::Not(inner, _) => inner.collect_state_facts(sensors, out)?,
        }
        Ok(())
    }

    /// Names of sensors this condition references, in declaration order.
    pub fn sensor_ids(&self) -> Vec<SensorId> {
        let mut ids = Vec::new();
        self.collect_sensor_ids(&mut ids);
        ids
    }

    fn collect_sensor_ids(&self, out: &mut Vec<SensorId>) {
        match self {
            Condition::Leaf { sensor, .. } => out.push(*sensor),
            Condition::Multi { sensors, .. } => out.extend(sensors.iter().copied()),
            Condition::And(parts) | Condition::Or(parts) => {
                for part in parts {
                    part.collect_sensor_ids(out);
                }
            }
            Condition::Not(inner, _) => inner.collect_sensor_ids(out),
        }
    }
}

/// Builds the canonical condition pursuing an effect on a sensor: boolean
/// effects ask for the indicated truth value, numeric effects keep pushing
/// the sensor in the indicated direction.
pub fn condition_from_effect(effect: &Effect, sensor: SensorId) -> Condition {
    let activator = match effect.kind {
        SensorType::Bool => Activator::boolean(effect.is_rising()),
        SensorType::Int | SensorType::Float => {
            Activator::greedy(effect.is_rising(), effect.indicator.abs())
        }
    };
    Condition::leaf(sensor, activator)
}
