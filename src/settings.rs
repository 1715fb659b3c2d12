//! Simulation settings
//!
//! Loaded from JSON by the host; everything has a sensible default.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigError;

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Particle pool capacity for this preset
    pub fn max_particles(&self) -> usize {
        match self {
            QualityPreset::Low => PARTICLE_CAPACITY / 4,
            QualityPreset::Medium => PARTICLE_CAPACITY,
            QualityPreset::High => PARTICLE_CAPACITY * 2,
        }
    }
}

/// Simulation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Cosmetic quality preset (particle budget)
    pub quality: QualityPreset,
    /// Particle effects on/off
    pub particles: bool,
    /// Seed for cosmetic randomness
    pub seed: u64,

    // === Timing ===
    /// Host frame time clamp in seconds
    pub max_frame_dt: f32,
    /// Micro-integration rate
    pub substep_hz: u32,

    // === World ===
    /// Quadtree node capacity before subdividing
    pub index_capacity: usize,
    /// Camera viewport size used for the visible-object query
    pub viewport: (f32, f32),
    /// Actor trail history length
    pub trail_length: usize,

    // === Attempts ===
    /// Seconds between death and automatic restart
    pub respawn_delay: f32,
    /// Restart automatically after death
    pub auto_restart: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            quality: QualityPreset::Medium,
            particles: true,
            seed: 0x5eed,

            max_frame_dt: MAX_FRAME_DT,
            substep_hz: SUBSTEP_HZ,

            index_capacity: INDEX_CAPACITY,
            viewport: (VIEWPORT_W, VIEWPORT_H),
            trail_length: TRAIL_LENGTH,

            respawn_delay: 1.0,
            auto_restart: true,
        }
    }
}

impl Settings {
    /// Create settings from a quality preset
    pub fn from_preset(preset: QualityPreset) -> Self {
        Self {
            quality: preset,
            ..Self::default()
        }
    }

    /// Effective particle pool capacity
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.quality.max_particles()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let settings = Self::from_json(&json)?;
        log::info!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }
}
