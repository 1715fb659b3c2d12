//! Fixed-capacity cosmetic particle pool
//!
//! Slots are allocated once. The first `active` slots are live; a particle
//! that expires is swapped with the last live slot, so removal is O(1) and
//! live particles are unordered. Randomness comes from a seeded PCG stream and
//! never feeds back into gameplay.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// Downward pull on particles (units/s²)
const PARTICLE_GRAVITY: f32 = 600.0;
/// Velocity retained per second
const PARTICLE_DRAG: f32 = 0.2;

/// What spawned a particle (renderer picks color and shape from this)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ParticleKind {
    #[default]
    Coin,
    Orb,
    Pad,
    Portal,
    Death,
}

impl ParticleKind {
    /// (min speed, max speed, size) in units/s and units
    fn profile(self) -> (f32, f32, f32) {
        match self {
            ParticleKind::Coin => (60.0, 180.0, 3.0),
            ParticleKind::Orb => (80.0, 220.0, 2.5),
            ParticleKind::Pad => (40.0, 160.0, 2.0),
            ParticleKind::Portal => (30.0, 90.0, 2.0),
            ParticleKind::Death => (150.0, 420.0, 4.0),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds remaining
    pub life: f32,
    /// Seconds at spawn (for fade)
    pub max_life: f32,
    pub size: f32,
    pub kind: ParticleKind,
}

impl Particle {
    /// 1.0 at spawn, 0.0 at expiry
    pub fn fade(&self) -> f32 {
        if self.max_life > 0.0 {
            (self.life / self.max_life).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticlePool {
    slots: Vec<Particle>,
    active: usize,
    rng: Pcg32,
}

impl ParticlePool {
    pub fn new(capacity: usize, seed: u64) -> Self {
        Self {
            slots: vec![Particle::default(); capacity],
            active: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn len(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    /// Live particles (unordered)
    pub fn active(&self) -> &[Particle] {
        &self.slots[..self.active]
    }

    /// Activate up to `count` particles at `pos`. Requests beyond the free
    /// capacity are dropped. Returns how many were spawned.
    pub fn spawn(&mut self, pos: Vec2, kind: ParticleKind, count: usize) -> usize {
        let spawned = count.min(self.slots.len() - self.active);
        let (min_speed, max_speed, size) = kind.profile();
        for _ in 0..spawned {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let speed = self.rng.random_range(min_speed..max_speed);
            let life = self.rng.random_range(0.4..0.8);
            self.slots[self.active] = Particle {
                pos,
                vel: Vec2::from_angle(angle) * speed,
                life,
                max_life: life,
                size: size * self.rng.random_range(0.7..1.3),
                kind,
            };
            self.active += 1;
        }
        spawned
    }

    /// Step every live particle by `dt` seconds and retire expired ones
    pub fn advance(&mut self, dt: f32) {
        let drag = PARTICLE_DRAG.powf(dt);
        let mut i = 0;
        while i < self.active {
            let p = &mut self.slots[i];
            p.life -= dt;
            if p.life <= 0.0 {
                self.active -= 1;
                self.slots.swap(i, self.active);
                // Re-examine the particle swapped into slot i
                continue;
            }
            p.vel.y += PARTICLE_GRAVITY * dt;
            p.vel *= drag;
            p.pos += p.vel * dt;
            i += 1;
        }
    }

    pub fn clear(&mut self) {
        self.active = 0;
    }
}
