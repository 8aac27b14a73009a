//! End-to-end delegation: a behavior ships its goal to a second manager
//! and that manager's own decision cycle gets the work done.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use arbiter_delegation::{
    DelegableBehavior, DelegationBehavior, LocalManagerEndpoint, LocalWork,
};
use arbiter_engine::{
    Behavior, BehaviorSpec, Effect, LifecycleResult, Manager, ManagerConfig, RawSensor,
    SensorHandle, SensorType, SensorValue,
};

/// Opt-in delegation traces via RUST_LOG.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Behavior that raises a sensor feed while it runs.
struct Producer {
    feed: SensorHandle,
    delta: f64,
}

impl Behavior for Producer {
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

/// Worker manager with a `supply` sensor and a producer that raises it.
fn worker_manager() -> Result<(Arc<Mutex<Manager>>, SensorHandle)> {
    let mut manager = Manager::new("worker", ManagerConfig::default());
    let supply = RawSensor::new("supply");
    let feed = supply.handle();
    feed.update(SensorValue::Float(0.0));
    manager.add_sensor(Box::new(supply))?;
    manager.add_behavior(
        BehaviorSpec::new("produce")
            .with_correlation(Effect::new("supply", 1.0, SensorType::Float)),
        Box::new(Producer {
            feed: feed.clone(),
            delta: 0.5,
        }),
    )?;
    Ok((Arc::new(Mutex::new(manager)), feed))
}

#[test]
fn delegated_goal_is_pursued_by_the_target_manager() -> Result<()> {
    init_tracing();
    let (worker, supply) = worker_manager()?;
    let endpoint = Arc::new(LocalManagerEndpoint::new(worker.clone()));

    let mut restock = DelegationBehavior::new("restock");
    restock.add_correlation(Effect::new("supply", 1.0, SensorType::Float), supply.clone());
    restock.register_manager(endpoint);

    // Starting the behavior registers an achievement goal "supply >= 1"
    // at the worker (current 0 plus the indicator).
    restock.start().map_err(|e| anyhow!(e))?;
    {
        let worker = worker.lock().unwrap();
        assert_eq!(worker.goal_names(), vec!["restock/goal"]);
    }

    // The worker's own cycle now favors the producer until the goal is
    // met and retired.
    let mut cycles = 0;
    loop {
        worker.lock().unwrap().step();
        restock.do_step().map_err(|e| anyhow!(e))?;
        cycles += 1;
        if worker.lock().unwrap().goal_names().is_empty() {
            break;
        }
        assert!(cycles < 10, "worker should have met the goal by now");
    }
    assert!(supply.latest().and_then(|v| v.as_number()).unwrap() >= 1.0);

    // Stop terminates the delegation; the goal was already retired at the
    // target, so the unregister is a no-op rather than an error.
    restock.stop().map_err(|e| anyhow!(e))?;
    assert!(!restock.has_active_delegations());
    Ok(())
}

#[test]
fn parent_manager_arbitration_triggers_the_delegation() -> Result<()> {
    init_tracing();
    let (worker, supply) = worker_manager()?;
    let endpoint = Arc::new(LocalManagerEndpoint::new(worker.clone()));

    // The parent observes its own copy of the supply feed and holds a
    // permanent goal wishing it upward; the delegation behavior is its
    // only way to affect it.
    let mut parent = Manager::new("parent", ManagerConfig::default());
    let parent_sensor = RawSensor::new("supply");
    let parent_feed = parent_sensor.handle();
    parent_feed.update(SensorValue::Float(0.0));
    let supply_id = parent.add_sensor(Box::new(parent_sensor))?;

    parent.add_goal(
        arbiter_engine::Goal::new("stocked")
            .with_condition(arbiter_engine::Condition::leaf(
                supply_id,
                arbiter_engine::Activator::greedy(true, 1.0),
            ))
            .permanent(true),
    )?;

    let mut restock = DelegationBehavior::new("restock");
    restock.add_correlation(Effect::new("supply", 1.0, SensorType::Float), supply.clone());
    restock.register_manager(endpoint);
    let spec = restock.build_spec(0.0, Vec::new());
    parent.add_behavior(spec, Box::new(restock))?;

    for _ in 0..4 {
        parent.step();
        worker.lock().unwrap().step();
        let value = supply.latest().and_then(|v| v.as_number()).unwrap();
        parent_feed.update(SensorValue::Float(value));
    }

    assert_eq!(parent.running_behaviors(), vec!["restock"]);
    assert!(supply.latest().and_then(|v| v.as_number()).unwrap() >= 1.0);
    Ok(())
}

#[derive(Default)]
struct CountingWork {
    starts: Arc<AtomicUsize>,
}

impl LocalWork for CountingWork {
    fn start_work(&mut self) -> LifecycleResult {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_work(&mut self) -> LifecycleResult {
        Ok(())
    }
}

#[test]
fn delegable_behavior_switches_from_local_to_delegated() -> Result<()> {
    init_tracing();
    let (worker, supply) = worker_manager()?;

    let work = CountingWork::default();
    let starts = work.starts.clone();
    // Local cost is high, so a reachable worker wins the bid.
    let mut behavior = DelegableBehavior::new("stocker", 2.0, Arc::new(Mutex::new(work)));
    behavior.add_correlation(Effect::new("supply", 1.0, SensorType::Float), supply.clone());

    // No manager registered: local execution starts immediately.
    behavior.start().map_err(|e| anyhow!(e))?;
    assert!(behavior.is_local_mode());
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    behavior.stop().map_err(|e| anyhow!(e))?;

    // With a manager registered, the next start delegates instead.
    behavior.register_manager(Arc::new(LocalManagerEndpoint::new(worker.clone())));
    behavior.start().map_err(|e| anyhow!(e))?;
    assert!(!behavior.is_local_mode());
    assert_eq!(starts.load(Ordering::SeqCst), 1);
    assert_eq!(worker.lock().unwrap().goal_names(), vec!["stocker/goal"]);

    behavior.stop().map_err(|e| anyhow!(e))?;
    assert!(worker.lock().unwrap().goal_names().is_empty());
    Ok(())
}
