//! Manager: the per-cycle decision algorithm.
//!
//! A manager owns sensors, behaviors, and goals, and runs the decision
//! cycle: sense, evaluate, spread activation, select, dispatch. Cycles are
//! synchronous and never overlap for the same manager; sensor feed updates
//! are the only concurrent inputs and are isolated by the two-slot sensor
//! buffer.

use std::collections::HashSet;

use crate::behavior::{Behavior, BehaviorSpec};
use crate::error::{EngineError, Result};
use crate::goal::Goal;
use crate::pddl::PlannerFact;
use crate::planner::{ActionSpec, Plan, Planner, PlannerProblem};
use crate::sensor::{Sensor, SensorId, SensorRegistry};

/// Tunable policy of a manager.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Minimum total activation a behavior needs to be executed.
    pub activation_threshold: f64,
    /// Minimum precondition satisfaction for a behavior to be executable.
    /// The default requires fully satisfied preconditions.
    pub precondition_threshold: f64,
    /// Weight of a behavior's own precondition satisfaction.
    pub situation_weight: f64,
    /// Weight of goal wishes a behavior's correlations advance.
    pub cooperation_weight: f64,
    /// Weight of goal wishes a behavior's correlations oppose.
    pub conflict_weight: f64,
    /// Fixed activation boost for the next planned action.
    pub plan_boost: f64,
    /// Whether `is_interruptible` considers only currently executing
    /// behaviors or every registered one.
    pub only_running_for_interruptible: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 0.1,
            precondition_threshold: 1.0,
            situation_weight: 1.0,
            cooperation_weight: 1.0,
            conflict_weight: 1.0,
            plan_boost: 1.0,
            only_running_for_interruptible: true,
        }
    }
}

struct RegisteredBehavior {
    spec: BehaviorSpec,
    body: Box<dyn Behavior>,
    activation: f64,
    executable: bool,
    running: bool,
    /// Set when a lifecycle call failed; the behavior sits out the next
    /// cycle's selection, then gets a fresh chance.
    faulted: bool,
}

/// Decision-making core owning behaviors, goals, and sensors.
pub struct Manager {
    prefix: String,
    config: ManagerConfig,
    sensors: SensorRegistry,
    behaviors: Vec<RegisteredBehavior>,
    goals: Vec<Goal>,
    planner: Option<Box<dyn Planner>>,
    current_plan: Option<Plan>,
    activated: bool,
    cycle: u64,
}

impl Manager {
    pub fn new(prefix: &str, config: ManagerConfig) -> Self {
        Self {
            prefix: prefix.to_string(),
            config,
            sensors: SensorRegistry::new(),
            behaviors: Vec::new(),
            goals: Vec::new(),
            planner: None,
            current_plan: None,
            activated: true,
            cycle: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------

    pub fn add_sensor(&mut self, sensor: Box<dyn Sensor>) -> Result<SensorId> {
        self.sensors.add(sensor)
    }

    pub fn sensor_id(&self, name: &str) -> Option<SensorId> {
        self.sensors.id_of(name)
    }

    pub fn sensors(&self) -> &SensorRegistry {
        &self.sensors
    }

    pub fn add_behavior(&mut self, spec: BehaviorSpec, body: Box<dyn Behavior>) -> Result<()> {
        if self.behaviors.iter().any(|b| b.spec.name == spec.name) {
            return Err(EngineError::DuplicateBehavior(spec.name));
        }
        tracing::debug!(manager = %self.prefix, behavior = %spec.name, "behavior registered");
        self.behaviors.push(RegisteredBehavior {
            spec,
            body,
            activation: 0.0,
            executable: false,
            running: false,
            faulted: false,
        });
        Ok(())
    }

    pub fn add_goal(&mut self, goal: Goal) -> Result<()> {
        if self.goals.iter().any(|g| g.name == goal.name) {
            return Err(EngineError::DuplicateGoal(goal.name));
        }
        tracing::debug!(manager = %self.prefix, goal = %goal.name, "goal registered");
        self.goals.push(goal);
        Ok(())
    }

    /// Unregisters a goal. Returns whether it existed; removing an unknown
    /// goal is a no-op so termination paths stay idempotent.
    pub fn remove_goal(&mut self, name: &str) -> bool {
        let before = self.goals.len();
        self.goals.retain(|g| g.name != name);
        let removed = self.goals.len() != before;
        if removed {
            tracing::debug!(manager = %self.prefix, goal = %name, "goal unregistered");
        }
        removed
    }

    pub fn goal_names(&self) -> Vec<&str> {
        self.goals.iter().map(|g| g.name.as_str()).collect()
    }

    /// Plugs in an external symbolic solver.
    pub fn set_planner(&mut self, planner: Box<dyn Planner>) {
        self.planner = Some(planner);
    }

    // ------------------------------------------------------------------
    // Activation state
    // ------------------------------------------------------------------

    pub fn activate(&mut self) {
        self.activated = true;
    }

    /// Deactivates the manager and stops every running behavior.
    pub fn deactivate(&mut self) {
        self.activated = false;
        for behavior in &mut self.behaviors {
            if behavior.running {
                stop_behavior(&self.prefix, behavior);
            }
        }
    }

    pub fn is_activated(&self) -> bool {
        self.activated
    }

    /// Whether this manager's activity may be interrupted, per the
    /// configured policy: either every currently running behavior must be
    /// interruptible, or every registered one.
    pub fn is_interruptible(&self) -> bool {
        self.behaviors
            .iter()
            .filter(|b| !self.config.only_running_for_interruptible || b.running)
            .all(|b| b.body.is_interruptible())
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn running_behaviors(&self) -> Vec<&str> {
        self.behaviors
            .iter()
            .filter(|b| b.running)
            .map(|b| b.spec.name.as_str())
            .collect()
    }

    pub fn activation_of(&self, name: &str) -> Option<f64> {
        self.behaviors
            .iter()
            .find(|b| b.spec.name == name)
            .map(|b| b.activation)
    }

    /// Fulfillment of a registered goal at the last committed snapshot.
    pub fn goal_fulfillment(&self, name: &str) -> Option<f64> {
        let goal = self.goals.iter().find(|g| g.name == name)?;
        goal.evaluate(&self.sensors).ok().map(|e| e.fulfillment)
    }

    // ------------------------------------------------------------------
    // Decision cycle
    // ------------------------------------------------------------------

    /// Runs one decision cycle. Does nothing while deactivated.
    pub fn step(&mut self) {
        if !self.activated {
            return;
        }
        self.cycle += 1;
        tracing::debug!(manager = %self.prefix, cycle = self.cycle, "decision cycle");

        // Sense: one sync per sensor per cycle.
        self.sensors.sync_all();

        // Evaluate goals; retire satisfied achievement goals.
        let goal_states = self.evaluate_goals();

        // Consult the symbolic planner, if any. Failures only cost the boost.
        let planned_action = self.consult_planner(&goal_states);

        // Spread activation.
        self.spread_activation(&goal_states, planned_action.as_deref());

        // Select and dispatch.
        self.select_and_dispatch();
    }

    fn evaluate_goals(&mut self) -> Vec<ActiveGoal> {
        let mut states = Vec::new();
        let mut retired = Vec::new();

        for goal in &self.goals {
            // One unevaluable condition counts as unsatisfied; the goal's
            // remaining conditions still contribute their wishes.
            let eval = goal.evaluate_tolerant(&self.sensors, |e| {
                log_evaluation_error(&self.prefix, &self.sensors, e);
            });
            tracing::debug!(
                manager = %self.prefix,
                goal = %goal.name,
                fulfillment = eval.fulfillment,
                "goal evaluated"
            );
            if !goal.permanent && eval.fulfillment >= goal.satisfaction_threshold {
                tracing::info!(manager = %self.prefix, goal = %goal.name, "achievement goal satisfied, retiring");
                retired.push(goal.name.clone());
                continue;
            }
            if goal.is_active(eval.fulfillment) {
                states.push(ActiveGoal {
                    priority: goal.priority,
                    wishes: eval
                        .wishes
                        .iter()
                        .map(|w| (w.sensor, w.indicator))
                        .collect(),
                });
            }
        }

        for name in retired {
            self.goals.retain(|g| g.name != name);
        }
        states
    }

    fn consult_planner(&mut self, goals: &[ActiveGoal]) -> Option<String> {
        self.current_plan = None;
        if self.planner.is_none() || goals.is_empty() {
            return None;
        }
        let problem = match self.export_problem() {
            Ok(problem) => problem,
            Err(e) => {
                log_evaluation_error(&self.prefix, &self.sensors, &e);
                return None;
            }
        };
        let planner = self.planner.as_mut()?;
        match planner.solve(&problem) {
            Ok(plan) => {
                let next = plan.next_action().map(str::to_string);
                tracing::debug!(manager = %self.prefix, next = ?next, "plan received");
                self.current_plan = Some(plan);
                next
            }
            Err(e) => {
                tracing::warn!(manager = %self.prefix, error = %e, "planner failed, skipping boost");
                None
            }
        }
    }

    /// Exports the current goal set and behavior repertoire as a planner
    /// problem.
    pub fn export_problem(&self) -> Result<PlannerProblem> {
        let mut goal_parts = Vec::new();
        let mut init = Vec::new();
        let mut seen: HashSet<SensorId> = HashSet::new();

        for goal in &self.goals {
            for condition in &goal.conditions {
                goal_parts
                    .push(condition.precondition_fact(&self.sensors, goal.satisfaction_threshold)?);
                self.collect_init_facts(condition, &mut seen, &mut init)?;
            }
        }

        let mut actions = Vec::new();
        for behavior in &self.behaviors {
            let mut pre_parts = Vec::new();
            for condition in &behavior.spec.preconditions {
                pre_parts
                    .push(condition.precondition_fact(&self.sensors, self.config.precondition_threshold)?);
                self.collect_init_facts(condition, &mut seen, &mut init)?;
            }
            actions.push(ActionSpec {
                name: behavior.spec.name.clone(),
                precondition: PlannerFact::And(pre_parts),
                effects: behavior.spec.correlations.clone(),
            });
        }

        Ok(PlannerProblem {
            goal: PlannerFact::And(goal_parts),
            init,
            actions,
        })
    }

    fn collect_init_facts(
        &self,
        condition: &crate::condition::Condition,
        seen: &mut HashSet<SensorId>,
        init: &mut Vec<PlannerFact>,
    ) -> Result<()> {
        // One state fact per sensor, regardless of how many conditions
        // reference it.
        let fresh: Vec<SensorId> = condition
            .sensor_ids()
            .into_iter()
            .filter(|id| seen.insert(*id))
            .collect();
        if fresh.is_empty() {
            return Ok(());
        }
        for fact in condition.state_facts(&self.sensors)? {
            let Some(name) = fact.sensor_names().first().copied() else {
                continue;
            };
            if fresh
                .iter()
                .any(|id| self.sensors.name_of(*id) == name)
            {
                init.push(fact);
            }
        }
        Ok(())
    }

    fn spread_activation(&mut self, goals: &[ActiveGoal], planned_action: Option<&str>) {
        let config = &self.config;
        for behavior in &mut self.behaviors {
            // Own precondition satisfaction, weighted.
            let satisfaction = precondition_satisfaction(
                &self.prefix,
                &behavior.spec,
                &self.sensors,
            );
            behavior.executable = satisfaction >= config.precondition_threshold;
            let mut activation = satisfaction * config.situation_weight;

            // Goal cooperation and conflict links.
            for goal in goals {
                for (sensor, wish) in &goal.wishes {
                    let sensor_name = self.sensors.name_of(*sensor);
                    for effect in &behavior.spec.correlations {
                        if effect.sensor_name != sensor_name {
                            continue;
                        }
                        let agreement = wish * effect.indicator;
                        if agreement > 0.0 {
                            activation += goal.priority * agreement * config.cooperation_weight;
                        } else if agreement < 0.0 {
                            activation -= goal.priority * agreement.abs() * config.conflict_weight;
                        }
                    }
                }
            }

            // Guidance from the symbolic plan.
            if planned_action == Some(behavior.spec.name.as_str()) {
                activation += config.plan_boost;
            }

            behavior.activation = activation;
            tracing::debug!(
                manager = %self.prefix,
                behavior = %behavior.spec.name,
                activation,
                executable = behavior.executable,
                "activation spread"
            );
        }
    }

    fn select_and_dispatch(&mut self) {
        // Running non-interruptible behaviors cannot be preempted; they are
        // retained before any candidate is considered.
        let mut selected: HashSet<usize> = self
            .behaviors
            .iter()
            .enumerate()
            .filter(|(_, b)| b.running && !b.body.is_interruptible())
            .map(|(i, _)| i)
            .collect();

        // Rank by activation desc, priority desc, name asc.
        let mut ranked: Vec<usize> = (0..self.behaviors.len()).collect();
        ranked.sort_by(|&a, &b| {
            let (ba, bb) = (&self.behaviors[a], &self.behaviors[b]);
            bb.activation
                .total_cmp(&ba.activation)
                .then(bb.spec.priority.total_cmp(&ba.spec.priority))
                .then(ba.spec.name.cmp(&bb.spec.name))
        });

        for index in ranked {
            if selected.contains(&index) {
                continue;
            }
            let behavior = &self.behaviors[index];
            if behavior.faulted {
                continue;
            }
            if behavior.activation < self.config.activation_threshold {
                // Ranked descending: nothing below remains eligible.
                break;
            }
            if !behavior.executable {
                continue;
            }
            let conflicts = selected.iter().any(|&other| {
                correlations_conflict(&self.behaviors[index].spec, &self.behaviors[other].spec)
            });
            if conflicts {
                continue;
            }
            selected.insert(index);
        }

        // Faults recorded during dispatch below exclude a behavior from the
        // next cycle's selection; last cycle's have now served their turn.
        for behavior in &mut self.behaviors {
            behavior.faulted = false;
        }

        // Dispatch transitions.
        for index in 0..self.behaviors.len() {
            let keep = selected.contains(&index);
            let behavior = &mut self.behaviors[index];
            if behavior.running && !keep {
                stop_behavior(&self.prefix, behavior);
            } else if !behavior.running && keep {
                start_behavior(&self.prefix, behavior);
            } else if behavior.running && keep && behavior.spec.requires_step {
                if let Err(e) = behavior.body.do_step() {
                    tracing::error!(
                        manager = %self.prefix,
                        behavior = %behavior.spec.name,
                        error = %e,
                        "do_step failed, behavior sits out the next selection"
                    );
                    behavior.faulted = true;
                }
            }
        }
    }
}

/// Per-cycle snapshot of an active goal used for spreading.
struct ActiveGoal {
    priority: f64,
    wishes: Vec<(SensorId, f64)>,
}

fn precondition_satisfaction(
    prefix: &str,
    spec: &BehaviorSpec,
    sensors: &SensorRegistry,
) -> f64 {
    let mut satisfaction = f64::MAX;
    for condition in &spec.preconditions {
        match condition.evaluate(sensors) {
            Ok(eval) => satisfaction = satisfaction.min(eval.satisfaction),
            Err(e) => {
                log_evaluation_error(prefix, sensors, &e);
                // An unevaluable condition counts as unsatisfied.
                return 0.0;
            }
        }
    }
    if spec.preconditions.is_empty() {
        satisfaction = 1.0;
    }
    satisfaction
}

fn log_evaluation_error(prefix: &str, sensors: &SensorRegistry, error: &EngineError) {
    match error {
        EngineError::UninitializedSensor { name } => {
            // An optional sensor without a value yet is expected noise.
            let optional = sensors
                .id_of(name)
                .is_some_and(|id| sensors.is_optional(id));
            if optional {
                tracing::debug!(manager = %prefix, error = %error, "optional sensor not delivered yet");
            } else {
                tracing::warn!(manager = %prefix, error = %error, "condition unevaluable this cycle");
            }
        }
        other => {
            tracing::warn!(manager = %prefix, error = %other, "condition evaluation failed");
        }
    }
}

/// Two behaviors conflict if they declare opposite-direction effects on the
/// same sensor; such pairs are never executed together.
fn correlations_conflict(a: &BehaviorSpec, b: &BehaviorSpec) -> bool {
    a.correlations.iter().any(|ea| {
        b.correlations.iter().any(|eb| {
            ea.sensor_name == eb.sensor_name && ea.indicator * eb.indicator < 0.0
        })
    })
}

fn start_behavior(prefix: &str, behavior: &mut RegisteredBehavior) {
    match behavior.body.start() {
        Ok(()) => {
            tracing::info!(manager = %prefix, behavior = %behavior.spec.name, "behavior started");
            behavior.running = true;
        }
        Err(e) => {
            tracing::error!(
                manager = %prefix,
                behavior = %behavior.spec.name,
                error = %e,
                "start failed, behavior sits out the next selection"
            );
            behavior.faulted = true;
        }
    }
}

fn stop_behavior(prefix: &str, behavior: &mut RegisteredBehavior) {
    if let Err(e) = behavior.body.stop() {
        tracing::error!(
            manager = %prefix,
            behavior = %behavior.spec.name,
            error = %e,
            "stop failed"
        );
        behavior.faulted = true;
    } else {
        tracing::info!(manager = %prefix, behavior = %behavior.spec.name, "behavior stopped");
    }
    // The behavior leaves the executing set even if its stop handler failed.
    behavior.running = false;
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::activator::Activator;
    use crate::behavior::LifecycleResult;
    use crate::condition::Condition;
    use crate::effect::Effect;
    use crate::sensor::{RawSensor, SensorType, SensorValue};

    /// Counts lifecycle calls; optionally fails on start.
    struct Probe {
        starts: Arc<AtomicUsize>,
        steps: Arc<AtomicUsize>,
        stops: Arc<AtomicUsize>,
        interruptible: bool,
        fail_start: bool,
        fail_step_once: bool,
    }

    impl Probe {
        fn new() -> (Self, Arc<AtomicUsize>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
            let starts = Arc::new(AtomicUsize::new(0));
            let steps = Arc::new(AtomicUsize::new(0));
            let stops = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    starts: Arc::clone(&starts),
                    steps: Arc::clone(&steps),
                    stops: Arc::clone(&stops),
                    interruptible: true,
                    fail_start: false,
                    fail_step_once: false,
                },
                starts,
                steps,
                stops,
            )
        }
    }

    impl Behavior for Probe {
        fn start(&mut self) -> LifecycleResult {
            if self.fail_start {
                return Err("boom".into());
            }
            self.starts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn do_step(&mut self) -> LifecycleResult {
            if self.fail_step_once {
                self.fail_step_once = false;
                return Err("step boom".into());
            }
            self.steps.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&mut self) -> LifecycleResult {
            self.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn is_interruptible(&self) -> bool {
            self.interruptible
        }
    }

    fn manager() -> Manager {
        Manager::new("test", ManagerConfig::default())
    }

    #[test]
    fn satisfied_behavior_starts_once_then_steps() {
        let mut m = manager();
        let id = m
            .add_sensor(Box::new(
                RawSensor::new("ready").with_initial(SensorValue::Bool(true)),
            ))
            .unwrap();
        let (probe, starts, steps, stops) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("worker")
                .with_precondition(Condition::leaf(id, Activator::boolean(true))),
            Box::new(probe),
        )
        .unwrap();

        for _ in 0..3 {
            m.step();
        }
        assert_eq!(starts.load(Ordering::SeqCst), 1);
        // Started on cycle 1, stepped on cycles 2 and 3.
        assert_eq!(steps.load(Ordering::SeqCst), 2);
        assert_eq!(stops.load(Ordering::SeqCst), 0);
        assert_eq!(m.running_behaviors(), vec!["worker"]);

        m.deactivate();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(m.running_behaviors().is_empty());
    }

    #[test]
    fn wish_direction_ranks_cooperating_behavior_higher() {
        let mut m = manager();
        let id = m
            .add_sensor(Box::new(
                RawSensor::new("battery").with_initial(SensorValue::Float(30.0)),
            ))
            .unwrap();
        m.add_goal(
            Goal::new("charged")
                .with_condition(Condition::leaf(id, Activator::linear(20.0, 80.0).unwrap())),
        )
        .unwrap();

        let (up, ..) = Probe::new();
        let (down, ..) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("recharge")
                .with_correlation(Effect::new("battery", 1.0, SensorType::Float)),
            Box::new(up),
        )
        .unwrap();
        m.add_behavior(
            BehaviorSpec::new("explore")
                .with_correlation(Effect::new("battery", -1.0, SensorType::Float)),
            Box::new(down),
        )
        .unwrap();

        m.step();
        let recharge = m.activation_of("recharge").unwrap();
        let explore = m.activation_of("explore").unwrap();
        assert!(
            recharge > explore,
            "cooperating behavior must outrank opposing one ({recharge} <= {explore})"
        );
    }

    #[test]
    fn conflicting_behaviors_are_not_executed_together() {
        let mut m = manager();
        let id = m
            .add_sensor(Box::new(
                RawSensor::new("battery").with_initial(SensorValue::Float(30.0)),
            ))
            .unwrap();
        m.add_goal(
            Goal::new("charged")
                .with_condition(Condition::leaf(id, Activator::linear(20.0, 80.0).unwrap())),
        )
        .unwrap();

        let (up, up_starts, ..) = Probe::new();
        let (down, down_starts, ..) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("recharge")
                .with_correlation(Effect::new("battery", 1.0, SensorType::Float)),
            Box::new(up),
        )
        .unwrap();
        m.add_behavior(
            BehaviorSpec::new("explore")
                .with_correlation(Effect::new("battery", -1.0, SensorType::Float))
                .with_priority(5.0),
            Box::new(down),
        )
        .unwrap();

        m.step();
        assert_eq!(up_starts.load(Ordering::SeqCst), 1);
        assert_eq!(down_starts.load(Ordering::SeqCst), 0);
        assert_eq!(m.running_behaviors(), vec!["recharge"]);
    }

    #[test]
    fn non_interruptible_running_behavior_is_not_preempted() {
        let mut m = manager();
        let id = m
            .add_sensor(Box::new(
                RawSensor::new("battery").with_initial(SensorValue::Float(30.0)),
            ))
            .unwrap();

        let (mut holder, holder_starts, _, holder_stops) = Probe::new();
        holder.interruptible = false;
        m.add_behavior(
            BehaviorSpec::new("holder")
                .with_correlation(Effect::new("battery", -1.0, SensorType::Float)),
            Box::new(holder),
        )
        .unwrap();
        m.step();
        assert_eq!(holder_starts.load(Ordering::SeqCst), 1);

        // A goal arrives that a new, conflicting behavior would serve better.
        m.add_goal(
            Goal::new("charged")
                .with_condition(Condition::leaf(id, Activator::linear(20.0, 80.0).unwrap()))
                .with_priority(10.0),
        )
        .unwrap();
        let (rival, rival_starts, ..) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("rival")
                .with_correlation(Effect::new("battery", 1.0, SensorType::Float)),
            Box::new(rival),
        )
        .unwrap();

        m.step();
        assert_eq!(holder_stops.load(Ordering::SeqCst), 0, "not preempted");
        assert_eq!(rival_starts.load(Ordering::SeqCst), 0, "conflict blocked");
        assert_eq!(m.running_behaviors(), vec!["holder"]);
        assert!(!m.is_interruptible());
    }

    #[test]
    fn failing_start_does_not_abort_the_cycle() {
        let mut m = manager();
        let (mut bad, bad_starts, ..) = Probe::new();
        bad.fail_start = true;
        let (good, good_starts, ..) = Probe::new();

        m.add_behavior(
            BehaviorSpec::new("bad").with_priority(10.0),
            Box::new(bad),
        )
        .unwrap();
        m.add_behavior(BehaviorSpec::new("good"), Box::new(good)).unwrap();

        m.step();
        assert_eq!(bad_starts.load(Ordering::SeqCst), 0);
        assert_eq!(good_starts.load(Ordering::SeqCst), 1);
        assert_eq!(m.running_behaviors(), vec!["good"]);
    }

    #[test]
    fn unevaluable_condition_does_not_silence_other_goal_wishes() {
        let mut m = manager();
        let late = m
            .add_sensor(Box::new(RawSensor::new("late").with_optional(true)))
            .unwrap();
        let live = m
            .add_sensor(Box::new(
                RawSensor::new("progress").with_initial(SensorValue::Float(0.0)),
            ))
            .unwrap();
        m.add_goal(
            Goal::new("advance")
                .with_condition(Condition::leaf(late, Activator::boolean(true)))
                .with_condition(Condition::leaf(live, Activator::greedy(true, 1.0))),
        )
        .unwrap();

        let (probe, ..) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("worker")
                .with_correlation(Effect::new("progress", 1.0, SensorType::Float)),
            Box::new(probe),
        )
        .unwrap();

        m.step();
        // Situation baseline 1.0 plus the live condition's cooperation wish;
        // the valueless sensor only costs its own condition.
        assert_eq!(m.activation_of("worker").unwrap(), 2.0);
        assert_eq!(m.running_behaviors(), vec!["worker"]);
    }

    #[test]
    fn faulted_step_sidelines_the_behavior_for_one_cycle() {
        let mut m = manager();
        let (mut flaky, starts, steps, stops) = Probe::new();
        flaky.fail_step_once = true;
        m.add_behavior(BehaviorSpec::new("flaky"), Box::new(flaky)).unwrap();

        m.step();
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        // The failing step marks the behavior faulted.
        m.step();
        assert_eq!(steps.load(Ordering::SeqCst), 0);

        // Next selection skips it, stopping the running instance.
        m.step();
        assert_eq!(stops.load(Ordering::SeqCst), 1);
        assert!(m.running_behaviors().is_empty());

        // The fault is spent; the behavior is eligible again.
        m.step();
        assert_eq!(starts.load(Ordering::SeqCst), 2);
        assert_eq!(m.running_behaviors(), vec!["flaky"]);
    }

    #[test]
    fn achievement_goal_is_retired_once_satisfied() {
        let mut m = manager();
        let sensor = RawSensor::new("docked");
        let feed = sensor.handle();
        let id = m.add_sensor(Box::new(sensor)).unwrap();
        m.add_goal(
            Goal::new("dock").with_condition(Condition::leaf(id, Activator::boolean(true))),
        )
        .unwrap();

        feed.update(SensorValue::Bool(false));
        m.step();
        assert_eq!(m.goal_names(), vec!["dock"]);

        feed.update(SensorValue::Bool(true));
        m.step();
        assert!(m.goal_names().is_empty(), "satisfied achievement goal retired");
    }

    #[test]
    fn planner_boost_breaks_activation_ties() {
        struct FixedPlanner(String);
        impl Planner for FixedPlanner {
            fn solve(
                &mut self,
                _problem: &PlannerProblem,
            ) -> std::result::Result<Plan, crate::planner::PlannerError> {
                Ok(Plan {
                    actions: vec![self.0.clone()],
                })
            }
        }

        let mut m = manager();
        let id = m
            .add_sensor(Box::new(
                RawSensor::new("progress").with_initial(SensorValue::Float(0.0)),
            ))
            .unwrap();
        m.add_goal(
            Goal::new("advance")
                .with_condition(Condition::leaf(id, Activator::greedy(true, 1.0))),
        )
        .unwrap();
        m.set_planner(Box::new(FixedPlanner("plan_b".to_string())));

        let (a, ..) = Probe::new();
        let (b, ..) = Probe::new();
        m.add_behavior(
            BehaviorSpec::new("plan_a")
                .with_correlation(Effect::new("progress", 1.0, SensorType::Float)),
            Box::new(a),
        )
        .unwrap();
        m.add_behavior(
            BehaviorSpec::new("plan_b")
                .with_correlation(Effect::new("progress", 1.0, SensorType::Float)),
            Box::new(b),
        )
        .unwrap();

        m.step();
        assert!(m.activation_of("plan_b").unwrap() > m.activation_of("plan_a").unwrap());
    }

    #[test]
    fn deactivated_manager_does_not_cycle() {
        let mut m = manager();
        let (probe, starts, ..) = Probe::new();
        m.add_behavior(BehaviorSpec::new("worker"), Box::new(probe)).unwrap();
        m.deactivate();
        m.step();
        assert_eq!(starts.load(Ordering::SeqCst), 0);
    }
}
