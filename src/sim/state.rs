//! Game state and core simulation types
//!
//! `GameState` is the single simulation context: every system receives it
//! explicitly and it is the only writer of level objects, the spatial index,
//! the actors and the particle pool.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::actor::{Actor, Pose};
use super::level::{Level, LevelStore, ObjectId};
use super::particles::{Particle, ParticlePool};
use super::quadtree::QuadTree;
use super::rect::Rect;
use crate::consts::FRAME_UNITS_PER_SEC;
use crate::settings::Settings;
use crate::substeps_per_frame;

/// Current phase of an attempt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Actor under control
    Playing,
    /// Actor died; restart after `respawn_in` seconds
    Dead { respawn_in: f32 },
    /// Finish reached
    Complete,
}

/// Which actor an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorSlot {
    Primary,
    Dual,
}

/// Events for the host (scoring, audio, UI)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Death { actor: ActorSlot },
    LevelComplete,
    CoinCollected { id: u32 },
    OrbCollected,
}

/// Everything a renderer needs for one frame
#[derive(Debug, Clone)]
pub struct RenderFrame<'a> {
    pub player: Pose,
    pub dual: Option<Pose>,
    pub camera: Rect,
    /// Objects intersecting the camera viewport
    pub visible: Vec<ObjectId>,
    pub particles: &'a [Particle],
    /// Percent of the level width reached
    pub progress: f32,
}

/// Complete simulation context
#[derive(Debug, Clone)]
pub struct GameState {
    pub level: LevelStore,
    /// Snapshot over `level`; rebuilt after every positional change
    pub index: QuadTree<ObjectId>,
    pub player: Actor,
    /// Second actor while a dual portal is active
    pub dual: Option<Actor>,
    pub particles: ParticlePool,
    /// Global speed multiplier set by speed portals
    pub speed_multiplier: f32,
    pub phase: GamePhase,
    pub coins: u32,
    pub collected_coins: Vec<u32>,
    pub orbs: u32,
    /// Attempts started on this level, counting the current one
    pub attempts: u32,
    /// Substep ticks elapsed in the current attempt
    pub time_ticks: u64,
    pub best_progress: f32,
    /// Pending host events, drained by the host
    pub events: Vec<GameEvent>,
    pub(crate) has_finish: bool,
    pub(crate) respawn_delay: f32,
    /// Frame-units of velocity covered by one substep
    pub(crate) substep_units: f32,
    /// Substeps in one fixed game frame
    pub(crate) frame_substeps: u32,
    index_capacity: usize,
    trail_length: usize,
}

impl GameState {
    pub fn new(level: Level, settings: &Settings) -> Self {
        let store = LevelStore::from_level(level);
        let index = store.spatial_index(settings.index_capacity);
        let spawn = Actor::spawn_point(store.height());
        let has_finish = store.has_finish();
        log::info!(
            "Level ready: {} objects, {}x{}, index depth {}",
            store.len(),
            store.width(),
            store.height(),
            index.depth()
        );
        Self {
            player: Actor::new(spawn, settings.trail_length),
            dual: None,
            particles: ParticlePool::new(settings.max_particles(), settings.seed),
            speed_multiplier: 1.0,
            phase: GamePhase::Playing,
            coins: 0,
            collected_coins: Vec::new(),
            orbs: 0,
            attempts: 1,
            time_ticks: 0,
            best_progress: 0.0,
            events: Vec::new(),
            has_finish,
            respawn_delay: settings.respawn_delay,
            substep_units: FRAME_UNITS_PER_SEC / settings.substep_hz.max(1) as f32,
            frame_substeps: substeps_per_frame(settings.substep_hz),
            index_capacity: settings.index_capacity,
            trail_length: settings.trail_length,
            level: store,
            index,
        }
    }

    /// Substeps covered by one call to [`tick`](super::tick::tick)
    pub fn frame_substeps(&self) -> u32 {
        self.frame_substeps
    }

    /// Rebuild the spatial index from the live objects
    pub fn rebuild_index(&mut self) {
        self.index = self.level.spatial_index(self.index_capacity);
    }

    /// Full level reset: objects, flags, actors, counters and elapsed time
    pub fn restart(&mut self) {
        self.level.reset();
        self.rebuild_index();
        self.has_finish = self.level.has_finish();
        self.player = Actor::new(Actor::spawn_point(self.level.height()), self.trail_length);
        self.dual = None;
        self.particles.clear();
        self.speed_multiplier = 1.0;
        self.phase = GamePhase::Playing;
        self.coins = 0;
        self.collected_coins.clear();
        self.orbs = 0;
        self.time_ticks = 0;
        self.attempts += 1;
        log::info!("Attempt {}", self.attempts);
    }

    pub fn trail_length(&self) -> usize {
        self.trail_length
    }

    pub fn actor(&self, slot: ActorSlot) -> Option<&Actor> {
        match slot {
            ActorSlot::Primary => Some(&self.player),
            ActorSlot::Dual => self.dual.as_ref(),
        }
    }

    pub fn actor_mut(&mut self, slot: ActorSlot) -> Option<&mut Actor> {
        match slot {
            ActorSlot::Primary => Some(&mut self.player),
            ActorSlot::Dual => self.dual.as_mut(),
        }
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Percent of the level width the primary actor has reached
    pub fn progress(&self) -> f32 {
        let width = self.level.width();
        if width <= 0.0 {
            return 0.0;
        }
        (self.player.pos.x / width * 100.0).clamp(0.0, 100.0)
    }

    /// Camera viewport keeping the player a third of the way in, clamped to the level
    pub fn camera(&self, viewport: (f32, f32)) -> Rect {
        let (w, h) = viewport;
        let max_x = (self.level.width() - w).max(0.0);
        let max_y = (self.level.height() - h).max(0.0);
        let x = (self.player.pos.x - w / 3.0).clamp(0.0, max_x);
        let y = (self.player.pos.y - h / 2.0).clamp(0.0, max_y);
        Rect::new(x, y, w, h)
    }

    /// Objects intersecting `view`, in handle order
    pub fn visible_objects(&self, view: &Rect) -> Vec<ObjectId> {
        let mut ids = self.index.query(view);
        ids.sort_unstable();
        ids
    }

    pub fn render_frame(&self, viewport: (f32, f32)) -> RenderFrame<'_> {
        let camera = self.camera(viewport);
        RenderFrame {
            player: self.player.pose(),
            dual: self.dual.as_ref().map(Actor::pose),
            visible: self.visible_objects(&camera),
            camera,
            particles: self.particles.active(),
            progress: self.progress(),
        }
    }

    /// Spawn a second actor mirroring the primary with opposite gravity
    pub(crate) fn spawn_dual(&mut self) {
        let mut twin = Actor::new(self.player.pos, self.trail_length);
        twin.mode = self.player.mode;
        twin.mini = self.player.mini;
        twin.mirror = self.player.mirror;
        twin.gravity_flip = -self.player.gravity_flip;
        twin.vel = Vec2::new(self.player.vel.x, -self.player.vel.y);
        self.dual = Some(twin);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::level::{GroupMutation, LevelObject};

    fn level() -> Level {
        let mut level = Level::new(3000.0, 600.0);
        level.objects = (0..30)
            .map(|i| LevelObject::block(i as f32 * 100.0, 500.0, 50.0, 50.0).with_group(i % 2))
            .collect();
        level
    }

    #[test]
    fn test_new_state_spawns_on_floor() {
        let state = GameState::new(level(), &Settings::default());
        assert_eq!(state.player.bbox().bottom(), 600.0);
        assert_eq!(state.phase, GamePhase::Playing);
        assert_eq!(state.attempts, 1);
        assert_eq!(state.particles.capacity(), 1000);
        assert_eq!(state.index.len(), 30);
    }

    #[test]
    fn test_camera_clamped_and_visible_query() {
        let mut state = GameState::new(level(), &Settings::default());
        let cam = state.camera((800.0, 450.0));
        assert_eq!(cam.x, 0.0);
        assert_eq!(cam.y, 150.0);

        state.player.pos.x = 1500.0;
        let frame = state.render_frame((800.0, 450.0));
        assert!((frame.camera.x - (1500.0 - 800.0 / 3.0)).abs() < 1e-3);
        assert!(!frame.visible.is_empty());
        for id in &frame.visible {
            assert!(state.level.get(*id).unwrap().rect.intersects(&frame.camera));
        }
        assert!((frame.progress - 50.0).abs() < 1e-3);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut state = GameState::new(level(), &Settings::default());
        state.level.apply_to_group(1, GroupMutation::Translate { dx: 0.0, dy: -100.0 });
        state.rebuild_index();
        state.coins = 3;
        state.speed_multiplier = 2.0;
        state.player.pos.x = 900.0;
        state.phase = GamePhase::Dead { respawn_in: 0.5 };
        state.spawn_dual();

        state.restart();
        assert_eq!(state.attempts, 2);
        assert_eq!(state.coins, 0);
        assert_eq!(state.speed_multiplier, 1.0);
        assert!(state.dual.is_none());
        assert!(state.is_playing());
        assert_eq!(state.level.get(ObjectId(1)).unwrap().rect.y, 500.0);
        assert_eq!(state.visible_objects(&Rect::new(100.0, 490.0, 10.0, 20.0)), vec![ObjectId(1)]);
    }

    #[test]
    fn test_dual_spawns_with_opposite_gravity() {
        let mut state = GameState::new(level(), &Settings::default());
        state.spawn_dual();
        let dual = state.actor(ActorSlot::Dual).unwrap();
        assert_eq!(dual.gravity_flip, -1.0);
        assert_eq!(dual.pos, state.player.pos);
    }
}
