use crate::error::{Error, Result};
use crate::math;
use serde_derive::{Deserialize, Serialize};

/// Session constants of the tracker, fixed once the tracker is built.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    /// Process/observation noise of the box position, relative to box height
    pub std_weight_position: f32,
    /// Process noise of the box velocity, relative to box height
    pub std_weight_velocity: f32,
    /// Squared Mahalanobis bound above which a detection is unreachable for a track
    pub gating_threshold: f32,
    /// Gate on the box centre only instead of the full `(cx, cy, a, h)` measurement
    pub gate_position_only: bool,
    /// Largest cosine distance accepted as an appearance match
    pub max_cosine_distance: f32,
    /// Smallest IoU accepted by the overlap fallback pass
    pub min_iou: f32,
    /// Consecutive matches needed to confirm a tentative track
    pub n_init: u32,
    /// Missed frames a confirmed track survives
    pub max_age: u32,
    /// Appearance samples kept per track, unbounded when `None`
    pub nn_budget: Option<usize>,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            std_weight_position: 1. / 20.,
            std_weight_velocity: 1. / 160.,
            gating_threshold: math::CHI2INV95[3],
            gate_position_only: false,
            max_cosine_distance: 0.5,
            min_iou: 0.3,
            n_init: 3,
            max_age: 100,
            nn_budget: None,
        }
    }
}

impl TrackerConfig {
    pub fn with_max_age(mut self, max_age: u32) -> Self {
        self.max_age = max_age;
        self
    }

    pub fn with_n_init(mut self, n_init: u32) -> Self {
        self.n_init = n_init;
        self
    }

    pub fn with_max_cosine_distance(mut self, distance: f32) -> Self {
        self.max_cosine_distance = distance;
        self
    }

    pub fn with_nn_budget(mut self, budget: Option<usize>) -> Self {
        self.nn_budget = budget;
        self
    }

    pub fn with_min_iou(mut self, min_iou: f32) -> Self {
        self.min_iou = min_iou;
        self
    }

    /// Centre-only gating with the 2-dof chi-square bound
    pub fn with_position_gating(mut self) -> Self {
        self.gate_position_only = true;
        self.gating_threshold = math::CHI2INV95[1];
        self
    }

    pub fn validate(&self) -> Result<()> {
        positive("std_weight_position", self.std_weight_position)?;
        positive("std_weight_velocity", self.std_weight_velocity)?;
        positive("gating_threshold", self.gating_threshold)?;

        if !(0.0..=2.0).contains(&self.max_cosine_distance) {
            return Err(Error::config(
                "max_cosine_distance",
                format!("must lie in [0, 2], got {}", self.max_cosine_distance),
            ));
        }

        if !(0.0..=1.0).contains(&self.min_iou) {
            return Err(Error::config(
                "min_iou",
                format!("must lie in [0, 1], got {}", self.min_iou),
            ));
        }

        if self.n_init == 0 {
            return Err(Error::config("n_init", "must be at least 1"));
        }

        if self.max_age == 0 {
            return Err(Error::config("max_age", "must be at least 1"));
        }

        if self.nn_budget == Some(0) {
            return Err(Error::config("nn_budget", "must hold at least one sample"));
        }

        Ok(())
    }
}

/// How the area outside the followed track is hidden
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum RedactMode {
    Blur { sigma: f32 },
    Mask,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct RedactConfig {
    pub mode: RedactMode,
    /// Fraction of the box extent added on every side that still fits in the frame
    pub expansion: f32,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            mode: RedactMode::Blur {
                sigma: math::sigma_for_kernel(45),
            },
            expansion: 0.10,
        }
    }
}

impl RedactConfig {
    pub fn mask() -> Self {
        Self {
            mode: RedactMode::Mask,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let RedactMode::Blur { sigma } = self.mode {
            positive("mode.sigma", sigma)?;
        }

        if !self.expansion.is_finite() || self.expansion < 0.0 {
            return Err(Error::config(
                "expansion",
                format!("must be a non-negative number, got {}", self.expansion),
            ));
        }

        Ok(())
    }
}

fn positive(field: &'static str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::config(
            field,
            format!("must be a positive number, got {}", value),
        ))
    }
}
