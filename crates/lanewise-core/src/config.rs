//! Device configuration.
//!
//! The configuration fixes the launch geometry for every kernel the device
//! runs: how many lanes make up a group, how many lanes may be live at
//! once, and whether group-collective shortcuts are allowed. It can be
//! built from defaults, detected from the host, or loaded from JSON.

use serde::{Deserialize, Serialize};

use crate::error::{DeviceError, Result};

/// Launch geometry and capability flags for a [`crate::Device`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Number of lanes per work-group. Must be a nonzero power of two.
    #[serde(default = "default_group_size")]
    pub group_size: usize,

    /// Upper bound on concurrently live lanes across all groups of one
    /// dispatch. The device caps the group count at `lane_budget / group_size`
    /// and folds oversized inputs into per-lane serial tiles instead.
    #[serde(default = "default_lane_budget")]
    pub lane_budget: usize,

    /// Allow group-collective reduce and scan passes for operations that
    /// carry an identity element. When disabled, every kernel uses the
    /// guarded tree passes.
    #[serde(default = "default_collective_ops")]
    pub collective_ops: bool,
}

fn default_group_size() -> usize {
    8
}

fn default_lane_budget() -> usize {
    64
}

fn default_collective_ops() -> bool {
    true
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            group_size: default_group_size(),
            lane_budget: default_lane_budget(),
            collective_ops: default_collective_ops(),
        }
    }
}

impl DeviceConfig {
    /// Pick a geometry suited to the host: default group size, lane budget
    /// scaled to the available hardware parallelism.
    #[must_use]
    pub fn detect() -> Self {
        let threads = std::thread::available_parallelism()
            .map(std::num::NonZeroUsize::get)
            .unwrap_or(4);
        let group_size = default_group_size();
        Self {
            group_size,
            lane_budget: threads.max(1).next_power_of_two() * group_size,
            collective_ops: true,
        }
    }

    /// Load configuration from a JSON file.
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DeviceError::ConfigLoad(format!("failed to read {path}: {e}")))?;
        Self::from_json(&content)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| DeviceError::ConfigLoad(format!("failed to parse config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Check the geometry invariants.
    pub fn validate(&self) -> Result<()> {
        if !self.group_size.is_power_of_two() {
            return Err(DeviceError::InvalidGroupSize(self.group_size));
        }
        if self.lane_budget < self.group_size {
            return Err(DeviceError::BudgetTooSmall {
                budget: self.lane_budget,
                group_size: self.group_size,
            });
        }
        Ok(())
    }
}
