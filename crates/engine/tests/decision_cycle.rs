//! End-to-end decision cycle: a small robot setup with a battery sensor, a
//! recharge/explore behavior pair, and a nested sub-network.

use anyhow::Result;
use arbiter_engine::{
    Activator, Behavior, BehaviorSpec, Condition, Effect, Goal, LifecycleResult, Manager,
    ManagerConfig, NestedStepping, NetworkBehavior, RawSensor, ReferencePlanner, SensorHandle,
    SensorType, SensorValue,
};

/// Opt-in cycle traces via RUST_LOG.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Behavior that drives a sensor feed while it runs, simulating the world
/// reacting to execution.
struct FeedDriver {
    feed: SensorHandle,
    delta: f64,
}

impl FeedDriver {
    fn new(feed: SensorHandle, delta: f64) -> Self {
        Self { feed, delta }
    }
}

impl Behavior for FeedDriver {
    fn start(&mut self) -> LifecycleResult {
        Ok(())
    }

    fn do_step(&mut self) -> LifecycleResult {
        let current = self
            .feed
            .latest()
            .and_then(|v| v.as_number())
            .unwrap_or(0.0);
        self.feed.update(SensorValue::Float(current + self.delta));
        Ok(())
    }

    fn stop(&mut self) -> LifecycleResult {
        Ok(())
    }
}

#[test]
fn low_battery_selects_recharge_until_goal_is_met() -> Result<()> {
    init_tracing();
    let mut manager = Manager::new("robot", ManagerConfig::default());
    manager.set_planner(Box::new(ReferencePlanner));

    let battery = RawSensor::new("battery");
    let feed = battery.handle();
    feed.update(SensorValue::Float(20.0));
    let battery_id = manager.add_sensor(Box::new(battery))?;

    manager.add_goal(
        Goal::new("charged")
            .with_condition(Condition::leaf(battery_id, Activator::linear(20.0, 80.0)?)),
    )?;

    let recharge = FeedDriver::new(feed.clone(), 20.0);
    let explore = FeedDriver::new(feed.clone(), -5.0);
    manager.add_behavior(
        BehaviorSpec::new("recharge")
            .with_correlation(Effect::new("battery", 1.0, SensorType::Float)),
        Box::new(recharge),
    )?;
    manager.add_behavior(
        BehaviorSpec::new("explore")
            .with_correlation(Effect::new("battery", -1.0, SensorType::Float)),
        Box::new(explore),
    )?;

    // While the goal is unsatisfied, recharge wins every cycle; the driver
    // raises the battery by 20 per stepped cycle until the goal is met.
    let mut cycles = 0;
    loop {
        manager.step();
        cycles += 1;
        if manager.goal_fulfillment("charged").is_none() {
            break;
        }
        assert_eq!(manager.running_behaviors(), vec!["recharge"]);
        assert!(cycles < 10, "goal should have been reached by now");
    }

    // The achievement goal is retired once fulfilled.
    assert!(manager.goal_names().is_empty());
    assert!(feed.latest().and_then(|v| v.as_number()).unwrap() >= 80.0);
    Ok(())
}

#[test]
fn network_behavior_pursues_promised_effect_in_sub_network() -> Result<()> {
    init_tracing();
    // Parent manager with a single network behavior promising to raise
    // "progress"; the sub-network holds the behavior that actually does it.
    let mut parent = Manager::new("parent", ManagerConfig::default());

    let progress = RawSensor::new("progress");
    let parent_feed = progress.handle();
    parent_feed.update(SensorValue::Float(0.0));
    let progress_id = parent.add_sensor(Box::new(progress))?;

    parent.add_goal(
        Goal::new("advance")
            .with_condition(Condition::leaf(progress_id, Activator::greedy(true, 1.0)))
            .permanent(true),
    )?;

    let mut network = NetworkBehavior::new(
        "mover",
        ManagerConfig::default(),
        NestedStepping::Automatic,
    );
    // The nested manager observes the same feed through its own sensor.
    let nested_sensor = RawSensor::new("progress");
    let nested_feed = nested_sensor.handle();
    nested_feed.update(SensorValue::Float(0.0));
    network.manager_mut().add_sensor(Box::new(nested_sensor))?;
    network.promise_effect(Effect::new("progress", 1.0, SensorType::Float))?;

    let worker = FeedDriver::new(parent_feed.clone(), 1.0);
    network.manager_mut().add_behavior(
        BehaviorSpec::new("step_forward")
            .with_correlation(Effect::new("progress", 1.0, SensorType::Float)),
        Box::new(worker),
    )?;

    let spec = network.build_spec(0.0, Vec::new());
    parent.add_behavior(spec, Box::new(network))?;

    // Cycle 1 starts the network (activating the nested manager); from
    // cycle 2 on, each parent step runs one nested cycle, and from nested
    // cycle 2 on the worker moves the feed.
    for _ in 0..4 {
        parent.step();
        let value = parent_feed.latest().and_then(|v| v.as_number()).unwrap();
        nested_feed.update(SensorValue::Float(value));
    }
    assert_eq!(parent.running_behaviors(), vec!["mover"]);
    assert!(
        parent_feed.latest().and_then(|v| v.as_number()).unwrap() >= 1.0,
        "sub-network worker must have advanced the promised sensor"
    );
    Ok(())
}
