//! Symbolic planner interface.
//!
//! The engine exports its goal set and registered behaviors as a problem
//! description; an external classical solver returns an ordered action
//! sequence or a failure. Planning is advisory: the manager only uses the
//! next planned action as an activation boost, and a solver failure or
//! timeout simply omits that boost.

use thiserror::Error;

use crate::effect::Effect;
use crate::pddl::{CompareOp, PlannerFact, fact_holds};

/// Errors an external solver can report.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("no plan found for the current goal set")]
    Unsolvable,

    #[error("planner timed out")]
    Timeout,

    #[error("planner failed: {0}")]
    Failed(String),
}

/// One plannable action, derived from a registered behavior.
#[derive(Debug, Clone)]
pub struct ActionSpec {
    /// Behavior name; plans refer to actions by this name.
    pub name: String,
    pub precondition: PlannerFact,
    pub effects: Vec<Effect>,
}

/// Problem description handed to the solver.
#[derive(Debug, Clone)]
pub struct PlannerProblem {
    /// Conjunction of the active goals' precondition facts.
    pub goal: PlannerFact,
    /// Current-state facts for every sensor referenced by a condition.
    pub init: Vec<PlannerFact>,
    pub actions: Vec<ActionSpec>,
}

/// Ordered action sequence returned by a solver.
#[derive(Debug, Clone, Default)]
pub struct Plan {
    pub actions: Vec<String>,
}

impl Plan {
    pub fn next_action(&self) -> Option<&str> {
        self.actions.first().map(String::as_str)
    }
}

/// External solver contract.
pub trait Planner: Send {
    fn solve(&mut self, problem: &PlannerProblem) -> Result<Plan, PlannerError>;
}

/// Trivial reference solver.
///
/// Returns the empty plan when the goal already holds in the initial state;
/// otherwise performs a single-step lookahead, picking the first action
/// whose effects push some goal-relevant sensor in a useful direction. Real
/// deployments plug a STRIPS/PDDL solver in instead; this one keeps tests
/// and small setups self-contained.
#[derive(Debug, Default)]
pub struct ReferencePlanner;

impl Planner for ReferencePlanner {
    fn solve(&mut self, problem: &PlannerProblem) -> Result<Plan, PlannerError> {
        if fact_holds(&problem.goal, &problem.init) {
            return Ok(Plan::default());
        }

        let wanted = direction_hints(&problem.goal);
        for action in &problem.actions {
            let helps = action.effects.iter().any(|effect| {
                wanted
                    .iter()
                    .any(|(name, rising)| *name == effect.sensor_name && *rising == effect.is_rising())
            });
            if helps {
                return Ok(Plan {
                    actions: vec![action.name.clone()],
                });
            }
        }
        Err(PlannerError::Unsolvable)
    }
}

/// Extracts (sensor, rising) hints from a goal fact: which direction each
/// referenced sensor must move for the fact to hold.
fn direction_hints(goal: &PlannerFact) -> Vec<(String, bool)> {
    let mut hints = Vec::new();
    collect_hints(goal, false, &mut hints);
    hints
}

fn collect_hints(fact: &PlannerFact, negated: bool, out: &mut Vec<(String, bool)>) {
    match fact {
        PlannerFact::Predicate { name, negated: n } => {
            out.push((name.clone(), !(n ^ negated)));
        }
        PlannerFact::Compare { name, op, .. } => {
            let rising = matches!(op, CompareOp::Ge) ^ negated;
            out.push((name.clone(), rising));
        }
        PlannerFact::NumericEq { .. } => {}
        PlannerFact::And(parts) | PlannerFact::Or(parts) => {
            for part in parts {
                collect_hints(part, negated, out);
            }
        }
        PlannerFact::Not(inner) => collect_hints(inner, !negated, out),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::SensorType;

    fn compare(name: &str, op: CompareOp, value: f64) -> PlannerFact {
        PlannerFact::Compare {
            name: name.to_string(),
            op,
            value,
        }
    }

    #[test]
    fn satisfied_goal_yields_empty_plan() {
        let mut planner = ReferencePlanner;
        let problem = PlannerProblem {
            goal: compare("battery", CompareOp::Ge, 50.0),
            init: vec![PlannerFact::NumericEq {
                name: "battery".to_string(),
                value: 80.0,
            }],
            actions: vec![],
        };
        let plan = planner.solve(&problem).unwrap();
        assert!(plan.next_action().is_none());
    }

    #[test]
    fn picks_action_pushing_towards_goal() {
        let mut planner = ReferencePlanner;
        let problem = PlannerProblem {
            goal: compare("battery", CompareOp::Ge, 80.0),
            init: vec![PlannerFact::NumericEq {
                name: "battery".to_string(),
                value: 20.0,
            }],
            actions: vec![
                ActionSpec {
                    name: "explore".to_string(),
                    precondition: PlannerFact::And(vec![]),
                    effects: vec![Effect::new("battery", -0.5, SensorType::Float)],
                },
                ActionSpec {
                    name: "recharge".to_string(),
                    precondition: PlannerFact::And(vec![]),
                    effects: vec![Effect::new("battery", 1.0, SensorType::Float)],
                },
            ],
        };
        let plan = planner.solve(&problem).unwrap();
        assert_eq!(plan.next_action(), Some("recharge"));
    }

    #[test]
    fn unsolvable_when_no_action_helps() {
        let mut planner = ReferencePlanner;
        let problem = PlannerProblem {
            goal: compare("battery", CompareOp::Ge, 80.0),
            init: vec![],
            actions: vec![],
        };
        assert!(matches!(
            planner.solve(&problem),
            Err(PlannerError::Unsolvable)
        ));
    }
}
