//! Goals: desired world states driving activation spreading.

use crate::condition::{Condition, Wish};
use crate::error::{EngineError, Result};
use crate::sensor::SensorRegistry;

/// A goal registered at a manager.
///
/// Fulfillment aggregates the satisfaction of all conditions (conjunctive:
/// the minimum). A permanent goal is pursued forever; an achievement goal is
/// retired by the manager once fulfillment reaches its threshold.
#[derive(Clone)]
pub struct Goal {
    pub name: String,
    pub conditions: Vec<Condition>,
    pub priority: f64,
    pub satisfaction_threshold: f64,
    pub permanent: bool,
}

/// Per-cycle evaluation of a goal.
#[derive(Debug, Clone)]
pub struct GoalEvaluation {
    pub fulfillment: f64,
    pub wishes: Vec<Wish>,
}

impl Goal {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            conditions: Vec::new(),
            priority: 1.0,
            satisfaction_threshold: 1.0,
            permanent: false,
        }
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_priority(mut self, priority: f64) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_satisfaction_threshold(mut self, threshold: f64) -> Self {
        self.satisfaction_threshold = threshold;
        self
    }

    pub fn permanent(mut self, permanent: bool) -> Self {
        self.permanent = permanent;
        self
    }

    /// Evaluates fulfillment and wishes against the committed snapshot.
    ///
    /// A goal without conditions is trivially fulfilled.
    pub fn evaluate(&self, sensors: &SensorRegistry) -> Result<GoalEvaluation> {
        let mut fulfillment = f64::MAX;
        let mut wishes = Vec::new();
        for condition in &self.conditions {
            let eval = condition.evaluate(sensors)?;
            fulfillment = fulfillment.min(eval.satisfaction);
            wishes.extend(eval.wishes);
        }
        if self.conditions.is_empty() {
            fulfillment = 1.0;
        }
        Ok(GoalEvaluation { fulfillment, wishes })
    }

    /// Like [`evaluate`](Self::evaluate), but an unevaluable condition only
    /// costs itself: it counts as unsatisfied and contributes no wish, while
    /// the remaining conditions still report theirs. Errors are handed to
    /// `on_error`. The decision cycle uses this so one sensor without a
    /// value does not silence a goal's other wishes.
    pub fn evaluate_tolerant<F>(&self, sensors: &SensorRegistry, mut on_error: F) -> GoalEvaluation
    where
        F: FnMut(&EngineError),
    {
        let mut fulfillment = f64::MAX;
        let mut wishes = Vec::new();
        for condition in &self.conditions {
            match condition.evaluate(sensors) {
                Ok(eval) => {
                    fulfillment = fulfillment.min(eval.satisfaction);
                    wishes.extend(eval.wishes);
                }
                Err(e) => {
                    on_error(&e);
                    fulfillment = fulfillment.min(0.0);
                }
            }
        }
        if self.conditions.is_empty() {
            fulfillment = 1.0;
        }
        GoalEvaluation { fulfillment, wishes }
    }

    /// Whether the goal should still spread activation given its current
    /// fulfillment.
    pub fn is_active(&self, fulfillment: f64) -> bool {
        self.permanent || fulfillment < self.satisfaction_threshold
    }
}
