//! Tunables for every pipeline stage.
//!
//! All structs deserialize with per-field defaults, so a config file
//! only needs to mention what it changes.

use crate::ChainError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub walk: WalkConfig,
    pub gaps: GapConfig,
    pub elevation: ElevationConfig,
    pub smoothing: SmoothingConfig,
    pub timing: TimingConfig,
}

impl Config {
    pub fn validate(&self) -> Result<(), ChainError> {
        self.walk.validate()?;
        self.gaps.validate()?;
        self.elevation.validate()?;
        self.smoothing.validate()?;
        self.timing.validate()
    }
}

fn positive(name: &str, value: f64) -> Result<(), ChainError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(ChainError::Config(format!("{name} must be positive, got {value}")))
    }
}

/// What the walker does when no link heads along the route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectPolicy {
    /// Go back to probing route points for any nearby panorama.
    #[default]
    Reset,

    /// Stop walking.
    Terminate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Target distance between dense route points.
    pub spacing_m: f64,

    /// Search radius when probing a route point for a panorama.
    pub probe_radius_m: f64,

    /// Distance under which the nearest-point scan may stop early.
    pub proximity_m: f64,

    /// Largest accepted difference between a link's yaw and the
    /// route's heading.
    pub max_yaw_diff_deg: f64,

    /// Largest accepted distance from a panorama to the route.
    pub max_offset_m: f64,

    pub on_reject: RejectPolicy,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            spacing_m: 1.0,
            probe_radius_m: 3.0,
            proximity_m: 10.0,
            max_yaw_diff_deg: 20.0,
            max_offset_m: 10.0,
            on_reject: RejectPolicy::Reset,
        }
    }
}

impl WalkConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        positive("walk.spacing_m", self.spacing_m)?;
        positive("walk.probe_radius_m", self.probe_radius_m)?;
        positive("walk.proximity_m", self.proximity_m)?;
        positive("walk.max_yaw_diff_deg", self.max_yaw_diff_deg)?;
        positive("walk.max_offset_m", self.max_offset_m)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapConfig {
    /// Neighbours further apart than this get gap points between
    /// them.
    pub threshold_m: f64,

    /// Target route-index distance between inserted points.
    pub index_step: usize,
}

impl Default for GapConfig {
    fn default() -> Self {
        Self {
            threshold_m: 20.0,
            index_step: 10,
        }
    }
}

impl GapConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        positive("gaps.threshold_m", self.threshold_m)?;
        if self.index_step == 0 {
            return Err(ChainError::Config("gaps.index_step must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElevationConfig {
    /// Locations per elevation request.
    pub batch_size: usize,
}

impl Default for ElevationConfig {
    fn default() -> Self {
        Self { batch_size: 256 }
    }
}

impl ElevationConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        if self.batch_size == 0 {
            return Err(ChainError::Config("elevation.batch_size must be positive".into()));
        }
        Ok(())
    }
}

/// Shape of one smoothing kernel, see [`Kernel`](crate::smooth::Kernel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub half_window: usize,
    pub offset: usize,
}

impl Window {
    pub const fn new(half_window: usize, offset: usize) -> Self {
        Self {
            half_window,
            offset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    pub yaw: Window,
    pub elevation: Window,
    pub yaw_delta: Window,
    pub gradient: Window,
    pub penalty: Window,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            yaw: Window::new(8, 1),
            elevation: Window::new(16, 1),
            yaw_delta: Window::new(16, 1),
            gradient: Window::new(16, 1),
            penalty: Window::new(16, 1),
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        for (name, window) in [
            ("yaw", self.yaw),
            ("elevation", self.elevation),
            ("yaw_delta", self.yaw_delta),
            ("gradient", self.gradient),
            ("penalty", self.penalty),
        ] {
            if window.half_window == 0 {
                return Err(ChainError::Config(format!(
                    "smoothing.{name}.half_window must be positive"
                )));
            }
            if window.offset == 0 {
                return Err(ChainError::Config(format!(
                    "smoothing.{name}.offset must be positive"
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Traversal speed at `speed == 1`.
    pub base_speed_mps: f64,

    /// Turn penalty is `-smoothed_yaw_delta² / turn_penalty_divisor`.
    pub turn_penalty_divisor: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            base_speed_mps: 10.0,
            turn_penalty_divisor: 100.0,
        }
    }
}

impl TimingConfig {
    pub fn validate(&self) -> Result<(), ChainError> {
        positive("timing.base_speed_mps", self.base_speed_mps)?;
        positive("timing.turn_penalty_divisor", self.turn_penalty_divisor)
    }
}
