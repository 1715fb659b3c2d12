//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by object handle)
//! - No rendering or platform dependencies

pub mod actor;
pub mod collision;
pub mod driver;
pub mod level;
pub mod particles;
pub mod quadtree;
pub mod rect;
pub mod replay;
pub mod state;
pub mod tick;
pub mod triggers;

pub use actor::{Actor, ActorInput, Mode, ModeParams, Pose};
pub use collision::{Resolution, resolve_move};
pub use driver::Simulation;
pub use level::{
    GroupId, GroupMutation, Level, LevelObject, LevelStore, ObjectId, ObjectKind, OrbEffect, PortalEffect,
    PortalValue, TriggerEffect, TriggerParams,
};
pub use particles::{Particle, ParticleKind, ParticlePool};
pub use quadtree::QuadTree;
pub use rect::Rect;
pub use replay::{ReplayAction, ReplayEvent, ReplayLog, ReplayPlayer};
pub use state::{ActorSlot, GameEvent, GamePhase, GameState, RenderFrame};
pub use tick::{TickInput, tick};
