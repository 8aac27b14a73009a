//! Effects (correlations) of behavior execution.

use serde::{Deserialize, Serialize};

use crate::sensor::SensorType;

/// Declared expected impact of executing a behavior on a named sensor.
///
/// The indicator is a signed magnitude in `[-1, 1]`: its sign is the
/// expected direction, and for numeric sensors its magnitude the expected
/// slope of change per execution step. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effect {
    pub sensor_name: String,
    pub indicator: f64,
    pub kind: SensorType,
}

impl Effect {
    pub fn new(sensor_name: &str, indicator: f64, kind: SensorType) -> Self {
        Self {
            sensor_name: sensor_name.to_string(),
            indicator: indicator.clamp(-1.0, 1.0),
            kind,
        }
    }

    /// Whether this effect pushes the sensor in the rising direction.
    pub fn is_rising(&self) -> bool {
        self.indicator > 0.0
    }
}
