//! Planner-fact representation.
//!
//! Conditions and goals describe themselves to an external classical planner
//! as *facts*: boolean predicates, numeric comparisons, and numeric
//! equalities, optionally composed with `and`/`or`/`not`. Facts are kept
//! structured so the engine can both render them as PDDL-style text and
//! evaluate them directly (see [`fact_holds`]) without a text round trip.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Comparison operator used by numeric precondition facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
pub enum CompareOp {
    /// Value must be greater than or equal to the bound.
    #[strum(serialize = ">=")]
    Ge,
    /// Value must be less than or equal to the bound.
    #[strum(serialize = "<=")]
    Le,
}

/// A structured planner fact.
///
/// `Predicate` and the compound forms appear in precondition position;
/// `Predicate` and `NumericEq` describe current state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PlannerFact {
    /// Boolean predicate `(name)` or its negation `(not (name))`.
    Predicate { name: String, negated: bool },

    /// Numeric comparison `( op (name) value )`.
    Compare {
        name: String,
        op: CompareOp,
        value: f64,
    },

    /// Numeric equality `( = (name) value )`, the state form of a fluent.
    NumericEq { name: String, value: f64 },

    /// Conjunction of sub-facts.
    And(Vec<PlannerFact>),

    /// Disjunction of sub-facts.
    Or(Vec<PlannerFact>),

    /// Negated sub-fact.
    Not(Box<PlannerFact>),
}

impl fmt::Display for PlannerFact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerFact::Predicate { name, negated } => {
                if *negated {
                    write!(f, "(not ({name}))")
                } else {
                    write!(f, "({name})")
                }
            }
            PlannerFact::Compare { name, op, value } => {
                write!(f, "( {op} ({name}) {value} )")
            }
            PlannerFact::NumericEq { name, value } => write!(f, "( = ({name}) {value} )"),
            PlannerFact::And(parts) => write_compound(f, "and", parts),
            PlannerFact::Or(parts) => write_compound(f, "or", parts),
            PlannerFact::Not(inner) => write!(f, "(not {inner})"),
        }
    }
}

fn write_compound(f: &mut fmt::Formatter<'_>, op: &str, parts: &[PlannerFact]) -> fmt::Result {
    write!(f, "({op}")?;
    for part in parts {
        write!(f, " {part}")?;
    }
    write!(f, ")")
}

impl PlannerFact {
    /// Names of all sensors referenced by this fact.
    pub fn sensor_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            PlannerFact::Predicate { name, .. }
            | PlannerFact::Compare { name, .. }
            | PlannerFact::NumericEq { name, .. } => out.push(name),
            PlannerFact::And(parts) | PlannerFact::Or(parts) => {
                for part in parts {
                    part.collect_names(out);
                }
            }
            PlannerFact::Not(inner) => inner.collect_names(out),
        }
    }
}

/// Sanitizes an arbitrary string into a planner-safe identifier.
///
/// Alphanumerics, `_` and `-` are kept; every other character (whitespace,
/// `/` separators from hierarchical prefixes, punctuation) becomes `_`.
pub fn sanitize_name(raw: &str) -> String {
    raw.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// State value a fact evaluator resolves sensor names against.
#[derive(Debug, Clone, Copy, PartialEq)]
enum StateValue {
    Bool(bool),
    Number(f64),
}

/// Checks whether a precondition fact holds in the state described by
/// `state` facts (`Predicate` and `NumericEq` entries).
///
/// Unknown sensor names evaluate to not-holding, matching the engine's rule
/// that an unevaluable condition counts as unsatisfied.
pub fn fact_holds(precondition: &PlannerFact, state: &[PlannerFact]) -> bool {
    let mut values: HashMap<&str, StateValue> = HashMap::new();
    for fact in state {
        match fact {
            PlannerFact::Predicate { name, negated } => {
                values.insert(name, StateValue::Bool(!negated));
            }
            PlannerFact::NumericEq { name, value } => {
                values.insert(name, StateValue::Number(*value));
            }
            _ => {}
        }
    }
    eval_fact(precondition, &values)
}

fn eval_fact(fact: &PlannerFact, values: &HashMap<&str, StateValue>) -> bool {
    match fact {
        PlannerFact::Predicate { name, negated } => {
            matches!(values.get(name.as_str()), Some(StateValue::Bool(b)) if *b != *negated)
        }
        PlannerFact::Compare { name, op, value } => match values.get(name.as_str()) {
            Some(StateValue::Number(v)) => match op {
                CompareOp::Ge => *v >= *value,
                CompareOp::Le => *v <= *value,
            },
            _ => false,
        },
        PlannerFact::NumericEq { name, value } => {
            matches!(values.get(name.as_str()), Some(StateValue::Number(v)) if *v == *value)
        }
        PlannerFact::And(parts) => parts.iter().all(|p| eval_fact(p, values)),
        PlannerFact::Or(parts) => parts.iter().any(|p| eval_fact(p, values)),
        PlannerFact::Not(inner) => !eval_fact(inner, values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn predicate(name: &str, negated: bool) -> PlannerFact {
        PlannerFact::Predicate {
            name: name.to_string(),
            negated,
        }
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_name("robot/battery level"), "robot_battery_level");
        assert_eq!(sanitize_name("door-open_2"), "door-open_2");
    }

    #[test]
    fn display_renders_pddl_text() {
        assert_eq!(predicate("door_open", false).to_string(), "(door_open)");
        assert_eq!(
            predicate("door_open", true).to_string(),
            "(not (door_open))"
        );
        let cmp = PlannerFact::Compare {
            name: "battery".to_string(),
            op: CompareOp::Ge,
            value: 80.0,
        };
        assert_eq!(cmp.to_string(), "( >= (battery) 80 )");
        let and = PlannerFact::And(vec![predicate("a", false), predicate("b", true)]);
        assert_eq!(and.to_string(), "(and (a) (not (b)))");
    }

    #[test]
    fn fact_holds_resolves_predicates_and_fluents() {
        let state = vec![
            predicate("door_open", false),
            PlannerFact::NumericEq {
                name: "battery".to_string(),
                value: 50.0,
            },
        ];

        assert!(fact_holds(&predicate("door_open", false), &state));
        assert!(!fact_holds(&predicate("door_open", true), &state));
        assert!(fact_holds(
            &PlannerFact::Compare {
                name: "battery".to_string(),
                op: CompareOp::Ge,
                value: 50.0,
            },
            &state
        ));
        assert!(!fact_holds(
            &PlannerFact::Compare {
                name: "battery".to_string(),
                op: CompareOp::Ge,
                value: 51.0,
            },
            &state
        ));
    }

    #[test]
    fn unknown_names_do_not_hold() {
        assert!(!fact_holds(&predicate("missing", false), &[]));
        // A negated compound over an unknown name still evaluates.
        assert!(fact_holds(
            &PlannerFact::Not(Box::new(predicate("missing", false))),
            &[]
        ));
    }
}
