//! Stub sensor and decision-process collaborators
//!
//! These record what the controller asked of them so tests can assert
//! on recovery behavior (sight re-registration, process restarts).

use crate::core::types::EntityId;
use crate::world::{DecisionAsset, DecisionProcess, SensorRig, SightConfig};

/// Sensor rig that only remembers what was configured
#[derive(Debug, Default)]
pub struct RecordingSensorRig {
    pub configured: Vec<SightConfig>,
    pub forget_count: usize,
}

impl SensorRig for RecordingSensorRig {
    fn configure_sight(&mut self, config: SightConfig) {
        self.configured.push(config);
    }

    fn forget_all(&mut self) {
        self.forget_count += 1;
    }
}

/// Decision process that always starts and counts lifecycle calls
///
/// `fail_starts` makes the next start attempts refuse, for exercising
/// BehaviorTreeStartFailed reporting and recovery.
#[derive(Debug, Default)]
pub struct ScriptedDecision {
    pub running: bool,
    pub starts: usize,
    pub restarts: usize,
    pub stops: usize,
    pub fail_starts: usize,
}

impl DecisionProcess for ScriptedDecision {
    fn start(&mut self, _asset: &DecisionAsset, _bot: EntityId) -> bool {
        self.starts += 1;
        if self.fail_starts > 0 {
            self.fail_starts -= 1;
            return false;
        }
        self.running = true;
        true
    }

    fn restart(&mut self) {
        self.restarts += 1;
    }

    fn stop(&mut self) {
        self.running = false;
        self.stops += 1;
    }
}
