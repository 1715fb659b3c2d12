//! The player actor and its eight locomotion modes
//!
//! Velocities are in world units per 60 Hz frame and `gdt` is elapsed game
//! time in frame-units. Each mode binds a constant [`ModeParams`] tuple and a
//! vertical-velocity rule; horizontal velocity is always recomputed from the
//! mode's base speed.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::consts::*;
use crate::{approach, normalize_degrees};

/// Gravity multiplier while mini
pub const MINI_GRAVITY_SCALE: f32 = 0.8;
/// Robot must hold this many game frames on the ground before a jump
pub const ROBOT_MIN_HOLD: u32 = 3;
/// Robot jump fires by itself once the charge reaches this many game frames
pub const ROBOT_MAX_CHARGE: u32 = 15;
/// Robot impulse scale at the minimum hold, growing per extra frame held
pub const ROBOT_BASE_SCALE: f32 = 0.6;
pub const ROBOT_SCALE_PER_FRAME: f32 = 0.05;
/// Spider flip impulse relative to its jump impulse
pub const SPIDER_IMPULSE_SCALE: f32 = 1.5;

/// Locomotion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Cube,
    Ship,
    Ball,
    Ufo,
    Wave,
    Robot,
    Spider,
    Swing,
}

/// Per-mode physics constants
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModeParams {
    /// Horizontal speed before the global multiplier
    pub base_speed: f32,
    /// Downward acceleration per frame-unit (scaled by the gravity flip)
    pub gravity: f32,
    /// Vertical velocity set by a jump (negative is up)
    pub jump_impulse: f32,
    /// Thrust bias for flying modes
    pub thrust: f32,
    /// Vertical speed cap; the exact vertical speed for ball and wave
    pub constant_speed: f32,
}

const MODE_TABLE: [ModeParams; 8] = [
    // Cube
    ModeParams { base_speed: 6.0, gravity: 0.95, jump_impulse: -12.0, thrust: 0.0, constant_speed: 15.0 },
    // Ship
    ModeParams { base_speed: 6.0, gravity: 0.15, jump_impulse: -9.0, thrust: 0.45, constant_speed: 8.0 },
    // Ball
    ModeParams { base_speed: 6.0, gravity: 0.0, jump_impulse: -9.0, thrust: 0.0, constant_speed: 9.0 },
    // Ufo
    ModeParams { base_speed: 6.0, gravity: 0.6, jump_impulse: -8.5, thrust: 0.0, constant_speed: 10.0 },
    // Wave
    ModeParams { base_speed: 6.0, gravity: 0.0, jump_impulse: -9.0, thrust: 0.0, constant_speed: 6.0 },
    // Robot
    ModeParams { base_speed: 6.0, gravity: 0.9, jump_impulse: -11.0, thrust: 0.0, constant_speed: 15.0 },
    // Spider
    ModeParams { base_speed: 6.0, gravity: 0.95, jump_impulse: -12.0, thrust: 0.0, constant_speed: 15.0 },
    // Swing
    ModeParams { base_speed: 6.0, gravity: 0.15, jump_impulse: -9.0, thrust: 0.45, constant_speed: 8.0 },
];

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::Cube,
        Mode::Ship,
        Mode::Ball,
        Mode::Ufo,
        Mode::Wave,
        Mode::Robot,
        Mode::Spider,
        Mode::Swing,
    ];

    pub fn params(self) -> &'static ModeParams {
        &MODE_TABLE[self as usize]
    }

    pub fn name(self) -> &'static str {
        match self {
            Mode::Cube => "cube",
            Mode::Ship => "ship",
            Mode::Ball => "ball",
            Mode::Ufo => "ufo",
            Mode::Wave => "wave",
            Mode::Robot => "robot",
            Mode::Spider => "spider",
            Mode::Swing => "swing",
        }
    }

    pub fn from_name(name: &str) -> Option<Mode> {
        let name = name.to_ascii_lowercase();
        Mode::ALL.into_iter().find(|m| m.name() == name)
    }
}

/// Input as seen by one actor for one game frame
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActorInput {
    pub held: bool,
    /// First frame of a hold
    pub edge: bool,
    /// First frame after a hold ended
    pub released: bool,
}

/// Pose handed to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub mode: Mode,
    pub mini: bool,
    pub mirror: bool,
    pub gravity_flip: f32,
}

#[derive(Debug, Clone)]
pub struct Actor {
    /// Bounding box center
    pub pos: Vec2,
    pub vel: Vec2,
    pub mode: Mode,
    /// +1 pulls down, -1 pulls up
    pub gravity_flip: f32,
    pub mini: bool,
    pub mirror: bool,
    /// Degrees, cosmetic
    pub rotation: f32,
    pub on_ground: bool,
    /// Consecutive game frames the input has been held
    pub jump_held: u32,
    /// Robot charge while grounded, in game frames
    pub charge: u32,
    /// Dash orb hold in progress
    pub dashing: bool,
    /// Recent positions, newest last
    pub trail: VecDeque<Vec2>,
    trail_length: usize,
    /// Position after the last collision resolution
    anchor: Vec2,
}

impl Actor {
    pub fn new(spawn: Vec2, trail_length: usize) -> Self {
        Self {
            pos: spawn,
            vel: Vec2::ZERO,
            mode: Mode::Cube,
            gravity_flip: 1.0,
            mini: false,
            mirror: false,
            rotation: 0.0,
            on_ground: false,
            jump_held: 0,
            charge: 0,
            dashing: false,
            trail: VecDeque::with_capacity(trail_length),
            trail_length,
            anchor: spawn,
        }
    }

    /// Canonical spawn pose for a level of the given height
    pub fn spawn_point(level_height: f32) -> Vec2 {
        Vec2::new(SPAWN_X, level_height - ACTOR_SIZE / 2.0)
    }

    pub fn size(&self) -> Vec2 {
        if self.mini {
            Vec2::splat(ACTOR_SIZE / 2.0)
        } else {
            Vec2::splat(ACTOR_SIZE)
        }
    }

    pub fn bbox(&self) -> Rect {
        Rect::from_center(self.pos, self.size())
    }

    /// Bounding box at the last resolved position
    pub fn anchor_bbox(&self) -> Rect {
        Rect::from_center(self.anchor, self.size())
    }

    /// Mode constants with the mini adjustment applied
    pub fn params(&self) -> ModeParams {
        let mut params = *self.mode.params();
        if self.mini {
            params.gravity *= MINI_GRAVITY_SCALE;
        }
        params
    }

    /// Switch mode; returns false if already in it
    pub fn set_mode(&mut self, mode: Mode) -> bool {
        if self.mode == mode {
            return false;
        }
        self.mode = mode;
        self.charge = 0;
        self.dashing = false;
        true
    }

    /// Resize the hitbox, keeping the face on the gravity side in place
    pub fn set_mini(&mut self, mini: bool) {
        let before = self.size().y;
        self.mini = mini;
        let shift = (before - self.size().y) / 2.0 * self.gravity_flip;
        self.pos.y += shift;
        self.anchor.y += shift;
    }

    pub fn flip_gravity(&mut self) {
        self.gravity_flip = -self.gravity_flip;
    }

    /// Fold this game frame's held state into the hold counter and derive edges
    pub fn read_input(&mut self, held: bool) -> ActorInput {
        let was_held = self.jump_held > 0;
        self.jump_held = if held { self.jump_held.saturating_add(1) } else { 0 };
        ActorInput {
            held,
            edge: held && self.jump_held == 1,
            released: !held && was_held,
        }
    }

    /// Jump impulse along the current gravity, scaled by `factor`
    pub fn launch(&mut self, factor: f32) {
        self.vel.y = self.params().jump_impulse * self.gravity_flip * factor;
        self.on_ground = false;
    }

    /// Recompute velocity and rotation for a frame covering `gdt` frame-units
    pub fn update_velocity(&mut self, input: ActorInput, speed_multiplier: f32, gdt: f32) {
        let params = self.params();
        let direction = if self.mirror { -1.0 } else { 1.0 };
        self.vel.x = params.base_speed * speed_multiplier * direction;

        if self.dashing {
            if input.held {
                self.vel.y = 0.0;
                self.update_rotation(gdt);
                return;
            }
            self.dashing = false;
        }

        self.apply_mode_rule(&params, input, gdt);
        self.update_rotation(gdt);
    }

    fn apply_mode_rule(&mut self, p: &ModeParams, input: ActorInput, gdt: f32) {
        let flip = self.gravity_flip;
        match self.mode {
            Mode::Cube => {
                self.vel.y += p.gravity * flip * gdt;
                self.cap_fall(p.constant_speed);
                if input.held && self.on_ground {
                    self.launch(1.0);
                }
            }
            Mode::Ship | Mode::Swing => {
                let bias = if input.held { -p.thrust } else { p.thrust };
                self.vel.y += (p.gravity + bias) * flip * gdt;
                self.vel.y = self.vel.y.clamp(-p.constant_speed, p.constant_speed);
            }
            Mode::Ball => {
                if input.edge && self.on_ground {
                    self.flip_gravity();
                    self.on_ground = false;
                }
                self.vel.y = p.constant_speed * self.gravity_flip;
            }
            Mode::Ufo => {
                self.vel.y += p.gravity * flip * gdt;
                if input.edge {
                    self.launch(1.0);
                }
                self.vel.y = self.vel.y.clamp(-p.constant_speed, p.constant_speed);
            }
            Mode::Wave => {
                let sign = if input.held { -1.0 } else { 1.0 };
                self.vel.y = sign * p.constant_speed * flip;
            }
            Mode::Robot => {
                self.vel.y += p.gravity * flip * gdt;
                self.cap_fall(p.constant_speed);
                if !self.on_ground {
                    self.charge = 0;
                    return;
                }
                if input.held {
                    self.charge += 1;
                }
                let saturated = self.charge >= ROBOT_MAX_CHARGE;
                if self.charge >= ROBOT_MIN_HOLD && (input.released || saturated) {
                    let extra = (self.charge - ROBOT_MIN_HOLD) as f32;
                    let max_scale =
                        ROBOT_BASE_SCALE + (ROBOT_MAX_CHARGE - ROBOT_MIN_HOLD) as f32 * ROBOT_SCALE_PER_FRAME;
                    let scale = (ROBOT_BASE_SCALE + extra * ROBOT_SCALE_PER_FRAME).min(max_scale);
                    self.launch(scale);
                    self.charge = 0;
                } else if !input.held {
                    self.charge = 0;
                }
            }
            Mode::Spider => {
                self.vel.y += p.gravity * flip * gdt;
                self.cap_fall(p.constant_speed);
                if input.edge && self.on_ground {
                    // Launch toward the new floor
                    self.vel.y = p.jump_impulse * flip * SPIDER_IMPULSE_SCALE;
                    self.flip_gravity();
                    self.on_ground = false;
                }
            }
        }
    }

    /// Terminal velocity in the gravity direction only
    fn cap_fall(&mut self, cap: f32) {
        if self.vel.y * self.gravity_flip > cap {
            self.vel.y = cap * self.gravity_flip;
        }
    }

    fn update_rotation(&mut self, gdt: f32) {
        let flip = self.gravity_flip;
        self.rotation = match self.mode {
            Mode::Cube => {
                if self.on_ground {
                    let snapped = (self.rotation / 90.0).round() * 90.0;
                    approach(self.rotation, snapped, 0.5 * gdt)
                } else {
                    self.rotation + self.vel.x * flip * gdt
                }
            }
            Mode::Ball => self.rotation + self.vel.x * 2.0 * flip * gdt,
            Mode::Ship | Mode::Wave => self.vel.y.atan2(self.vel.x.abs()).to_degrees() * self.direction(),
            Mode::Swing => self.vel.y * 3.0 * self.direction(),
            Mode::Ufo => approach(self.rotation, self.vel.y * 1.5, 0.3 * gdt),
            Mode::Robot => approach(self.rotation, 0.0, 0.5 * gdt),
            Mode::Spider => {
                let upright = if flip > 0.0 { 0.0 } else { 180.0 };
                approach(self.rotation, upright, 0.5 * gdt)
            }
        };
        self.rotation = normalize_degrees(self.rotation);
    }

    fn direction(&self) -> f32 {
        if self.mirror { -1.0 } else { 1.0 }
    }

    /// Micro-integration: move by `units` frame-units of velocity.
    /// No collision or state changes happen here.
    #[inline]
    pub fn advance(&mut self, units: f32) {
        self.pos += self.vel * units;
    }

    /// Movement since the last resolution
    pub fn displacement(&self) -> Vec2 {
        self.pos - self.anchor
    }

    /// Commit a resolved position
    pub fn settle(&mut self, pos: Vec2) {
        self.pos = pos;
        self.anchor = pos;
    }

    /// Jump to a position without sweeping the path in between
    pub fn teleport(&mut self, pos: Vec2) {
        self.settle(pos);
        self.trail.clear();
    }

    pub fn record_trail(&mut self) {
        if self.trail_length == 0 {
            return;
        }
        if self.trail.len() >= self.trail_length {
            self.trail.pop_front();
        }
        self.trail.push_back(self.pos);
    }

    pub fn pose(&self) -> Pose {
        Pose {
            x: self.pos.x,
            y: self.pos.y,
            rotation: self.rotation,
            mode: self.mode,
            mini: self.mini,
            mirror: self.mirror,
            gravity_flip: self.gravity_flip,
        }
    }
}
