//! Dashline - side-scrolling rhythm platformer simulation core
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spatial index, collisions, actor modes, triggers)
//! - `settings`: Data-driven simulation configuration
//! - `error`: Errors raised while loading levels, settings and replays
//!
//! Rendering, audio, editor and persistence of user progress are host concerns.
//! They consume the core through [`sim::Level`], [`sim::RenderFrame`] and
//! [`sim::GameEvent`].

pub mod error;
pub mod settings;
pub mod sim;

pub use error::{ConfigError, LevelError, ReplayError};
pub use settings::{QualityPreset, Settings};

/// Simulation configuration constants
pub mod consts {
    /// Game-time units per second. Velocities are expressed per 60 Hz frame.
    pub const FRAME_UNITS_PER_SEC: f32 = 60.0;
    /// Micro-integration rate (4 substeps per 60 Hz frame)
    pub const SUBSTEP_HZ: u32 = 240;
    /// Frame-units covered by one substep (a quarter of a frame)
    pub const SUBSTEP_UNITS: f32 = FRAME_UNITS_PER_SEC / SUBSTEP_HZ as f32;
    /// Largest host frame fed into the accumulator (prevents spiral of death)
    pub const MAX_FRAME_DT: f32 = 1.0 / 30.0;

    /// Actor hitbox edge length (mini halves it)
    pub const ACTOR_SIZE: f32 = 30.0;
    /// Spawn position, measured from the level's left edge and floor
    pub const SPAWN_X: f32 = 60.0;
    /// Number of trail positions kept per actor
    pub const TRAIL_LENGTH: usize = 30;

    /// Nominal particle pool capacity
    pub const PARTICLE_CAPACITY: usize = 1000;
    /// Objects a quadtree node holds before subdividing
    pub const INDEX_CAPACITY: usize = 8;
    /// Quadtree nodes stop subdividing at this depth
    pub const INDEX_MAX_DEPTH: u32 = 8;

    /// Camera viewport (world units)
    pub const VIEWPORT_W: f32 = 800.0;
    pub const VIEWPORT_H: f32 = 450.0;
}

/// Substeps in one fixed game frame at `substep_hz`, never zero
#[inline]
pub fn substeps_per_frame(substep_hz: u32) -> u32 {
    let frame_hz = consts::FRAME_UNITS_PER_SEC as u32;
    (substep_hz.saturating_add(frame_hz / 2) / frame_hz).max(1)
}

/// Wrap an angle in degrees to [0, 360)
#[inline]
pub fn normalize_degrees(angle: f32) -> f32 {
    let wrapped = angle % 360.0;
    if wrapped < 0.0 { wrapped + 360.0 } else { wrapped }
}

/// Move `current` toward `target` by `factor` of the remaining distance
#[inline]
pub fn approach(current: f32, target: f32, factor: f32) -> f32 {
    current + (target - current) * factor.clamp(0.0, 1.0)
}
