//! Sensor value pipeline.
//!
//! Sensors decouple asynchronous feed delivery from the manager's decision
//! cycle with a two-slot buffer: feeds write the `latest` slot at any time,
//! while `sync` freezes it into the `committed` slot exactly once per cycle.
//! Every condition evaluated within one cycle therefore observes one
//! consistent value per sensor, at the cost of the snapshot being at most
//! one update stale.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::pddl::sanitize_name;

/// A sensed value, the only value shape the engine evaluates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SensorValue {
    Bool(bool),
    Int(i64),
    Float(f64),
}

/// The kind of value a sensor produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SensorType {
    Bool,
    Int,
    Float,
}

impl SensorValue {
    pub fn kind(&self) -> SensorType {
        match self {
            SensorValue::Bool(_) => SensorType::Bool,
            SensorValue::Int(_) => SensorType::Int,
            SensorValue::Float(_) => SensorType::Float,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SensorValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric view of the value. Booleans are not numbers.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            SensorValue::Int(i) => Some(*i as f64),
            SensorValue::Float(f) => Some(*f),
            SensorValue::Bool(_) => None,
        }
    }
}

/// Contract every sensor implementation fulfills towards the manager.
///
/// `sync` is called by the owning manager exactly once per decision cycle;
/// `value` reads the committed snapshot and fails until the first `sync`
/// has delivered a value.
pub trait Sensor: Send {
    /// Planner-safe sensor name.
    fn name(&self) -> &str;

    /// Whether an uninitialized value is tolerated during a cycle.
    fn optional(&self) -> bool {
        false
    }

    /// Freezes the latest value into the committed slot and returns it.
    fn sync(&mut self) -> Option<SensorValue>;

    /// Reads the committed value.
    fn value(&self) -> Result<SensorValue>;
}

/// Feed-side handle to a [`RawSensor`]'s latest-value slot.
///
/// Handles are cheap to clone and safe to use from any thread; they never
/// touch the committed slot the evaluation path reads.
#[derive(Clone)]
pub struct SensorHandle {
    name: Arc<str>,
    latest: Arc<Mutex<Option<SensorValue>>>,
}

impl SensorHandle {
    /// Overwrites the latest value. Called from feed contexts.
    pub fn update(&self, value: SensorValue) {
        let mut slot = self.latest.lock().unwrap_or_else(|e| e.into_inner());
        *slot = Some(value);
    }

    /// Last value delivered by any feed, committed or not.
    pub fn latest(&self) -> Option<SensorValue> {
        *self.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// The standard two-slot sensor.
pub struct RawSensor {
    name: String,
    optional: bool,
    latest: Arc<Mutex<Option<SensorValue>>>,
    committed: Option<SensorValue>,
}

impl RawSensor {
    /// Creates a sensor; the name is sanitized into a planner-safe
    /// identifier.
    pub fn new(name: &str) -> Self {
        Self {
            name: sanitize_name(name),
            optional: false,
            latest: Arc::new(Mutex::new(None)),
            committed: None,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    pub fn with_initial(self, value: SensorValue) -> Self {
        self.handle().update(value);
        self
    }

    /// Returns a feed handle bound to this sensor's latest-value slot.
    pub fn handle(&self) -> SensorHandle {
        SensorHandle {
            name: Arc::from(self.name.as_str()),
            latest: Arc::clone(&self.latest),
        }
    }
}

impl Sensor for RawSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn optional(&self) -> bool {
        self.optional
    }

    fn sync(&mut self) -> Option<SensorValue> {
        let latest = *self.latest.lock().unwrap_or_else(|e| e.into_inner());
        self.committed = latest;
        self.committed
    }

    fn value(&self) -> Result<SensorValue> {
        self.committed.ok_or_else(|| EngineError::UninitializedSensor {
            name: self.name.clone(),
        })
    }
}

/// Aggregation function applied by a [`DynamicSensor`] on `sync`.
pub type Aggregator = Box<dyn Fn(&[SensorValue]) -> SensorValue + Send>;

/// Sensor tracking a dynamic population of sources.
///
/// Each source writes its own slot in a shared map; `sync` copies the
/// current values out under the lock, releases it, and only then runs the
/// aggregator. The lock is never held while computing the aggregate.
pub struct DynamicSensor {
    name: String,
    optional: bool,
    default: SensorValue,
    sources: Arc<Mutex<HashMap<String, SensorValue>>>,
    aggregator: Aggregator,
    committed: Option<SensorValue>,
}

impl DynamicSensor {
    pub fn new(name: &str, default: SensorValue, aggregator: Aggregator) -> Self {
        Self {
            name: sanitize_name(name),
            optional: false,
            default,
            sources: Arc::new(Mutex::new(HashMap::new())),
            aggregator,
            committed: None,
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = optional;
        self
    }

    /// Returns an update handle for the named source, creating its slot on
    /// first use.
    pub fn source_handle(&self, source: &str) -> DynamicSourceHandle {
        DynamicSourceHandle {
            source: source.to_string(),
            sources: Arc::clone(&self.sources),
        }
    }

    /// Drops a source from the population.
    pub fn remove_source(&self, source: &str) {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources.remove(source);
    }
}

/// Feed handle for one source of a [`DynamicSensor`].
#[derive(Clone)]
pub struct DynamicSourceHandle {
    source: String,
    sources: Arc<Mutex<HashMap<String, SensorValue>>>,
}

impl DynamicSourceHandle {
    pub fn update(&self, value: SensorValue) {
        let mut sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
        sources.insert(self.source.clone(), value);
    }
}

impl Sensor for DynamicSensor {
    fn name(&self) -> &str {
        &self.name
    }

    fn optional(&self) -> bool {
        self.optional
    }

    fn sync(&mut self) -> Option<SensorValue> {
        // Copy out, release, then compute.
        let values: Vec<SensorValue> = {
            let sources = self.sources.lock().unwrap_or_else(|e| e.into_inner());
            sources.values().copied().collect()
        };
        let aggregated = if values.is_empty() {
            self.default
        } else {
            (self.aggregator)(&values)
        };
        self.committed = Some(aggregated);
        self.committed
    }

    fn value(&self) -> Result<SensorValue> {
        self.committed.ok_or_else(|| EngineError::UninitializedSensor {
            name: self.name.clone(),
        })
    }
}

/// Non-owning reference to a sensor registered in a [`SensorRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SensorId(usize);

/// Registry of sensors owned by a manager.
///
/// Conditions reference sensors through [`SensorId`] handles instead of
/// owning them, so teardown order stays explicit and one `sync` per cycle
/// covers every condition referencing the same sensor.
#[derive(Default)]
pub struct SensorRegistry {
    sensors: Vec<Box<dyn Sensor>>,
    by_name: HashMap<String, SensorId>,
}

impl SensorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sensor and returns its handle. Names must be unique.
    pub fn add(&mut self, sensor: Box<dyn Sensor>) -> Result<SensorId> {
        let name = sensor.name().to_string();
        if self.by_name.contains_key(&name) {
            return Err(EngineError::DuplicateSensor(name));
        }
        let id = SensorId(self.sensors.len());
        self.sensors.push(sensor);
        self.by_name.insert(name, id);
        Ok(id)
    }

    pub fn id_of(&self, name: &str) -> Option<SensorId> {
        self.by_name.get(name).copied()
    }

    pub fn name_of(&self, id: SensorId) -> &str {
        self.sensors[id.0].name()
    }

    pub fn is_optional(&self, id: SensorId) -> bool {
        self.sensors[id.0].optional()
    }

    /// Committed value of the sensor.
    pub fn value(&self, id: SensorId) -> Result<SensorValue> {
        self.sensors[id.0].value()
    }

    /// Syncs every registered sensor exactly once.
    pub fn sync_all(&mut self) {
        for sensor in &mut self.sensors {
            sensor.sync();
        }
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }
}

/// Explicit default-name generator, scoped to whichever context constructs
/// sensors and behaviors. Replaces process-wide instance counters so tests
/// stay hermetic.
#[derive(Default)]
pub struct NameGenerator {
    counters: HashMap<String, u64>,
}

impl NameGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `<kind>_<n>` with a per-kind monotonic counter.
    pub fn next(&mut self, kind: &str) -> String {
        let counter = self.counters.entry(kind.to_string()).or_insert(0);
        let name = format!("{kind}_{counter}");
        *counter += 1;
        name
    }
}
