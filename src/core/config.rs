//! Bot configuration with documented constants
//!
//! All tuned values are collected here with explanations of their purpose
//! and how they interact with each other. A single canonical parameter set
//! is used for every controller; per-bot variation is possible by cloning
//! and editing a config before construction.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::core::error::{BotError, Result};

/// Configuration for a bot controller and its subsystems
///
/// These values have been tuned to produce reliable maze-solving behavior.
/// Changing them affects how aggressively the bot detects and recovers
/// from failures.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    // === PERCEPTION ===
    /// Interval between perception sweeps (seconds)
    ///
    /// Perception is idempotent, so running it more often only costs
    /// world queries. 0.5s keeps reaction latency below typical
    /// movement time between waypoints.
    pub perception_interval: f32,

    /// How far the bot can see entities (world units)
    pub sight_radius: f32,

    /// Distance at which an already-seen entity is lost (world units)
    ///
    /// Kept larger than sight_radius so perception doesn't flicker
    /// at the boundary.
    pub lose_sight_radius: f32,

    /// Field of view in degrees
    pub peripheral_vision_degrees: f32,

    /// How long a stimulus stays in sensor memory (seconds)
    pub sight_max_age: f32,

    // === STUCK DETECTION ===
    /// Minimum displacement per check to count as moving (world units)
    ///
    /// Compared against squared distance, so jitter from collision
    /// resolution below this threshold does not reset the stuck timer.
    pub stuck_threshold: f32,

    /// Time below the displacement threshold before the bot is
    /// declared stuck (seconds)
    pub max_stuck_time: f32,

    // === STATE WATCHDOG ===
    /// Maximum time allowed in one behavioral state (seconds)
    ///
    /// A bot seeking the same key for longer than this has almost
    /// certainly failed its task; the watchdog forces a full reset.
    pub max_time_in_state: f32,

    // === RECOVERY ===
    /// Minimum time between automatic recovery attempts (seconds)
    ///
    /// Prevents recovery-attempt storms while an error persists.
    /// Enforced by the controller tick, not by the recovery engine.
    pub recovery_attempt_interval: f32,

    /// Acceptance radius used for recovery moves (world units)
    ///
    /// Larger than the normal arrival radius so a recovery move can
    /// succeed even when the exact point is blocked.
    pub recovery_acceptance_radius: f32,

    /// Initial search radius when probing for a random reachable
    /// point during navigation recovery (world units)
    pub recovery_probe_radius: f32,

    /// Ceiling for the probe radius; the radius doubles on each
    /// failed probe until it exceeds this (world units)
    pub recovery_probe_radius_max: f32,

    /// Probe radius used by the full state reset when no valid
    /// location is stored (world units)
    pub reset_probe_radius: f32,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            // Perception
            perception_interval: 0.5,
            sight_radius: 1500.0,
            lose_sight_radius: 2000.0,
            peripheral_vision_degrees: 90.0,
            sight_max_age: 5.0,

            // Stuck detection
            stuck_threshold: 50.0,
            max_stuck_time: 3.0,

            // State watchdog
            max_time_in_state: 15.0,

            // Recovery
            recovery_attempt_interval: 5.0,
            recovery_acceptance_radius: 200.0,
            recovery_probe_radius: 500.0,
            recovery_probe_radius_max: 3000.0,
            reset_probe_radius: 1000.0,
        }
    }
}

impl BotConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a TOML file, falling back to defaults for
    /// missing fields.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.lose_sight_radius < self.sight_radius {
            return Err(BotError::InvalidConfig(format!(
                "lose_sight_radius ({}) must be >= sight_radius ({})",
                self.lose_sight_radius, self.sight_radius
            )));
        }

        if self.recovery_probe_radius_max < self.recovery_probe_radius {
            return Err(BotError::InvalidConfig(format!(
                "recovery_probe_radius_max ({}) must be >= recovery_probe_radius ({})",
                self.recovery_probe_radius_max, self.recovery_probe_radius
            )));
        }

        if self.stuck_threshold <= 0.0 || self.max_stuck_time <= 0.0 {
            return Err(BotError::InvalidConfig(
                "stuck_threshold and max_stuck_time must be positive".into(),
            ));
        }

        if self.perception_interval <= 0.0 {
            return Err(BotError::InvalidConfig(
                "perception_interval must be positive".into(),
            ));
        }

        if self.recovery_attempt_interval <= 0.0 {
            return Err(BotError::InvalidConfig(
                "recovery_attempt_interval must be positive".into(),
            ));
        }

        // a zero probe radius would keep the doubling loop at zero forever
        if self.recovery_probe_radius <= 0.0
            || self.recovery_acceptance_radius <= 0.0
            || self.reset_probe_radius <= 0.0
        {
            return Err(BotError::InvalidConfig(
                "recovery radii must be positive".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(BotConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_sight_radii_rejected() {
        let config = BotConfig {
            sight_radius: 2000.0,
            lose_sight_radius: 1500.0,
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_recovery_radii_rejected() {
        let config = BotConfig {
            recovery_probe_radius: 0.0,
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());

        let config = BotConfig {
            recovery_attempt_interval: 0.0,
            ..BotConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: BotConfig = toml::from_str("max_stuck_time = 5.0").unwrap();
        assert_eq!(config.max_stuck_time, 5.0);
        assert_eq!(config.stuck_threshold, BotConfig::default().stuck_threshold);
    }
}
