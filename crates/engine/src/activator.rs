//! Activation schemes.
//!
//! An activator maps a sensor value to an activation level inside its
//! configured bounds and to a *wish*: a signed indicator in `[-1, 1]`
//! describing how the value should move to gain activation. The variants
//! form a closed set behind one capability surface (activation, wish,
//! direction, precondition fact, state fact), selected at construction, so
//! the manager's evaluation loop stays variant-agnostic.

use crate::error::{EngineError, Result};
use crate::pddl::{CompareOp, PlannerFact};
use crate::sensor::{SensorType, SensorValue};

/// Direction in which a sensor value gains activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    pub fn indicator(&self) -> f64 {
        match self {
            Direction::Rising => 1.0,
            Direction::Falling => -1.0,
        }
    }
}

/// Activation output bounds. All activation values an activator produces
/// lie in `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActivationBounds {
    pub min: f64,
    pub max: f64,
}

impl Default for ActivationBounds {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

/// Compares a boolean value against a desired truth value.
#[derive(Debug, Clone, PartialEq)]
pub struct BooleanActivator {
    pub desired: bool,
    pub bounds: ActivationBounds,
}

/// Compares a numeric value against a threshold.
///
/// `is_minimum` selects the satisfying side: the threshold is a lower bound
/// when true, an upper bound otherwise. An optional `value_range` grades the
/// wish linearly instead of the constant ±1.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdActivator {
    pub threshold: f64,
    pub is_minimum: bool,
    pub value_range: Option<f64>,
    pub bounds: ActivationBounds,
}

/// Linear activation slope between a zero-activation and a full-activation
/// value.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearActivator {
    zero: f64,
    full: f64,
    pub bounds: ActivationBounds,
}

/// Open-ended activator that keeps pushing a value in one direction.
///
/// Never satisfied: the wish is a constant ±1 and the precondition fact
/// always targets one `step` beyond the current value. Used for goals that
/// pursue an effect indefinitely.
#[derive(Debug, Clone, PartialEq)]
pub struct GreedyActivator {
    pub maximize: bool,
    pub step: f64,
    pub bounds: ActivationBounds,
}

/// Closed set of activation schemes.
#[derive(Debug, Clone, PartialEq)]
pub enum Activator {
    Boolean(BooleanActivator),
    Threshold(ThresholdActivator),
    Linear(LinearActivator),
    Greedy(GreedyActivator),
}

impl Activator {
    pub fn boolean(desired: bool) -> Self {
        Activator::Boolean(BooleanActivator {
            desired,
            bounds: ActivationBounds::default(),
        })
    }

    pub fn threshold(threshold: f64, is_minimum: bool) -> Self {
        Activator::Threshold(ThresholdActivator {
            threshold,
            is_minimum,
            value_range: None,
            bounds: ActivationBounds::default(),
        })
    }

    pub fn threshold_with_range(threshold: f64, is_minimum: bool, value_range: f64) -> Self {
        Activator::Threshold(ThresholdActivator {
            threshold,
            is_minimum,
            value_range: Some(value_range),
            bounds: ActivationBounds::default(),
        })
    }

    /// Fails when `zero == full`: a linear slope needs a non-zero range.
    pub fn linear(zero: f64, full: f64) -> Result<Self> {
        if zero == full {
            return Err(EngineError::InvalidRange(zero));
        }
        Ok(Activator::Linear(LinearActivator {
            zero,
            full,
            bounds: ActivationBounds::default(),
        }))
    }

    pub fn greedy(maximize: bool, step: f64) -> Self {
        Activator::Greedy(GreedyActivator {
            maximize,
            step: step.abs(),
            bounds: ActivationBounds::default(),
        })
    }

    pub fn with_bounds(mut self, bounds: ActivationBounds) -> Self {
        match &mut self {
            Activator::Boolean(a) => a.bounds = bounds,
            Activator::Threshold(a) => a.bounds = bounds,
            Activator::Linear(a) => a.bounds = bounds,
            Activator::Greedy(a) => a.bounds = bounds,
        }
        self
    }

    pub fn bounds(&self) -> ActivationBounds {
        match self {
            Activator::Boolean(a) => a.bounds,
            Activator::Threshold(a) => a.bounds,
            Activator::Linear(a) => a.bounds,
            Activator::Greedy(a) => a.bounds,
        }
    }

    /// Direction that increases activation.
    pub fn direction(&self) -> Direction {
        match self {
            Activator::Boolean(a) => {
                if a.desired {
                    Direction::Rising
                } else {
                    Direction::Falling
                }
            }
            Activator::Threshold(a) => {
                if a.is_minimum {
                    Direction::Rising
                } else {
                    Direction::Falling
                }
            }
            Activator::Linear(a) => {
                if a.full > a.zero {
                    Direction::Rising
                } else {
                    Direction::Falling
                }
            }
            Activator::Greedy(a) => {
                if a.maximize {
                    Direction::Rising
                } else {
                    Direction::Falling
                }
            }
        }
    }

    /// Activation level for the value, within the configured bounds.
    pub fn activation(&self, sensor: &str, value: SensorValue) -> Result<f64> {
        match self {
            Activator::Boolean(a) => {
                let v = expect_bool(sensor, value)?;
                Ok(if v == a.desired { a.bounds.max } else { a.bounds.min })
            }
            Activator::Threshold(a) => {
                let v = expect_number(sensor, value)?;
                let satisfied = if a.is_minimum {
                    v >= a.threshold
                } else {
                    v <= a.threshold
                };
                Ok(if satisfied { a.bounds.max } else { a.bounds.min })
            }
            Activator::Linear(a) => {
                let v = expect_number(sensor, value)?;
                let raw = (v - a.zero) / a.range();
                let scaled = raw * (a.bounds.max - a.bounds.min) + a.bounds.min;
                Ok(scaled.clamp(a.bounds.min, a.bounds.max))
            }
            Activator::Greedy(a) => {
                // Never satisfied: there is always one more step to take.
                expect_number(sensor, value)?;
                Ok(a.bounds.min)
            }
        }
    }

    /// Signed wish in `[-1, 1]`: how the value should move to gain
    /// activation, `0` when no change is required.
    pub fn wish(&self, sensor: &str, value: SensorValue) -> Result<f64> {
        match self {
            Activator::Boolean(a) => {
                let v = expect_bool(sensor, value)?;
                Ok(if v == a.desired {
                    0.0
                } else if a.desired {
                    1.0
                } else {
                    -1.0
                })
            }
            Activator::Threshold(a) => {
                let v = expect_number(sensor, value)?;
                let satisfied = if a.is_minimum {
                    v >= a.threshold
                } else {
                    v <= a.threshold
                };
                if satisfied {
                    Ok(0.0)
                } else if let Some(range) = a.value_range {
                    Ok(((a.threshold - v) / range).clamp(-1.0, 1.0))
                } else {
                    Ok(self.direction().indicator())
                }
            }
            Activator::Linear(a) => {
                let v = expect_number(sensor, value)?;
                let missing = (a.full - v) / a.range().abs();
                Ok(match self.direction() {
                    Direction::Rising => missing.clamp(0.0, 1.0),
                    Direction::Falling => missing.clamp(-1.0, 0.0),
                })
            }
            Activator::Greedy(_) => Ok(self.direction().indicator()),
        }
    }

    /// Precondition fact for the planner.
    ///
    /// `threshold` is the satisfaction level the fact must encode (a goal's
    /// satisfaction threshold); `value` is the current committed value,
    /// needed by the open-ended greedy scheme.
    pub fn precondition_fact(
        &self,
        sensor: &str,
        value: SensorValue,
        threshold: f64,
    ) -> Result<PlannerFact> {
        match self {
            Activator::Boolean(a) => Ok(PlannerFact::Predicate {
                name: sensor.to_string(),
                negated: !a.desired,
            }),
            Activator::Threshold(a) => Ok(PlannerFact::Compare {
                name: sensor.to_string(),
                op: if a.is_minimum { CompareOp::Ge } else { CompareOp::Le },
                value: a.threshold,
            }),
            Activator::Linear(a) => {
                // Render the sensor value at which activation reaches the
                // requested threshold, so the fact holds exactly when the
                // runtime satisfaction does.
                let span = a.bounds.max - a.bounds.min;
                let fraction = if span == 0.0 {
                    1.0
                } else {
                    ((threshold - a.bounds.min) / span).clamp(0.0, 1.0)
                };
                let bound = a.zero + fraction * a.range();
                Ok(PlannerFact::Compare {
                    name: sensor.to_string(),
                    op: match self.direction() {
                        Direction::Rising => CompareOp::Ge,
                        Direction::Falling => CompareOp::Le,
                    },
                    value: bound,
                })
            }
            Activator::Greedy(a) => {
                let v = expect_number(sensor, value)?;
                let step = if a.maximize { a.step } else { -a.step };
                Ok(PlannerFact::Compare {
                    name: sensor.to_string(),
                    op: if a.maximize { CompareOp::Ge } else { CompareOp::Le },
                    value: v + step,
                })
            }
        }
    }

    /// Current-state fact for the planner: a boolean literal or a numeric
    /// equality.
    pub fn state_fact(&self, sensor: &str, value: SensorValue) -> Result<PlannerFact> {
        match self {
            Activator::Boolean(_) => {
                let v = expect_bool(sensor, value)?;
                Ok(PlannerFact::Predicate {
                    name: sensor.to_string(),
                    negated: !v,
                })
            }
            _ => {
                let v = expect_number(sensor, value)?;
                Ok(PlannerFact::NumericEq {
                    name: sensor.to_string(),
                    value: v,
                })
            }
        }
    }
}

impl LinearActivator {
    fn range(&self) -> f64 {
        self.full - self.zero
    }
}

fn expect_bool(sensor: &str, value: SensorValue) -> Result<bool> {
    value.as_bool().ok_or_else(|| EngineError::WrongValueType {
        name: sensor.to_string(),
        expected: SensorType::Bool,
        actual: value.kind(),
    })
}

fn expect_number(sensor: &str, value: SensorValue) -> Result<f64> {
    value.as_number().ok_or_else(|| EngineError::WrongValueType {
        name: sensor.to_string(),
        expected: SensorType::Float,
        actual: value.kind(),
    })
}
