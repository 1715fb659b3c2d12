//! Fixed game frame update
//!
//! One call covers one game frame of `frame_substeps` substeps: velocity
//! rules, micro-integration, collision, then contacts. The host frame rate
//! only decides how many game frames run per host frame, never what happens
//! inside one.

use super::actor::Actor;
use super::collision::resolve_move;
use super::state::{ActorSlot, GameState};
use super::triggers::{complete, process_contacts};
use crate::consts::FRAME_UNITS_PER_SEC;

/// Input commands for a single frame (deterministic)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickInput {
    /// Jump input is down
    pub held: bool,
}

const SLOTS: [ActorSlot; 2] = [ActorSlot::Primary, ActorSlot::Dual];

/// Advance the game state by one fixed game frame
pub fn tick(state: &mut GameState, input: &TickInput) {
    let substeps = state.frame_substeps;
    let gdt = substeps as f32 * state.substep_units;
    let dt = gdt / FRAME_UNITS_PER_SEC;

    // Dead or finished: only cosmetic effects keep running
    if !state.is_playing() {
        state.particles.advance(dt);
        return;
    }
    state.time_ticks += u64::from(substeps);

    let speed = state.speed_multiplier;
    for slot in SLOTS {
        if let Some(actor) = state.actor_mut(slot) {
            let actor_input = actor.read_input(input.held);
            actor.update_velocity(actor_input, speed, gdt);
        }
    }

    for _ in 0..substeps {
        substep(state);
    }

    for slot in SLOTS {
        resolve(state, slot);
    }

    for slot in SLOTS {
        if !state.is_playing() {
            break;
        }
        process_contacts(state, slot);
    }

    if state.is_playing() && !state.has_finish && state.player.bbox().left() > state.level.width() {
        complete(state);
    }

    state.best_progress = state.best_progress.max(state.progress());
    state.particles.advance(dt);
}

/// Micro-integration of every active actor. Positions only; collision and
/// contacts wait for the end of the game frame.
pub fn substep(state: &mut GameState) {
    let units = state.substep_units;
    state.player.advance(units);
    if let Some(dual) = state.dual.as_mut() {
        dual.advance(units);
    }
}

/// Resolve the displacement accumulated since the last game frame against solids
fn resolve(state: &mut GameState, slot: ActorSlot) {
    let GameState {
        index,
        level,
        player,
        dual,
        ..
    } = state;
    let actor: &mut Actor = match slot {
        ActorSlot::Primary => player,
        ActorSlot::Dual => match dual.as_mut() {
            Some(dual) => dual,
            None => return,
        },
    };

    let res = resolve_move(index, level, actor.anchor_bbox(), actor.displacement(), actor.gravity_flip);
    actor.settle(res.rect.center());
    actor.on_ground = res.landed;
    if res.landed || res.bonked {
        actor.vel.y = 0.0;
    }
    actor.record_trail();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::actor::Mode;
    use crate::sim::level::{Level, LevelObject, ObjectId, ObjectKind, PortalEffect, PortalValue};
    use crate::sim::rect::Rect;
    use crate::sim::state::{GameEvent, GamePhase};
    use glam::Vec2;

    fn state_with(objects: Vec<LevelObject>) -> GameState {
        let mut level = Level::new(2000.0, 600.0);
        level.objects = objects;
        GameState::new(level, &Settings::default())
    }

    fn idle() -> TickInput {
        TickInput::default()
    }

    #[test]
    fn test_substep_rate_keeps_game_frame_length() {
        let mut fine = state_with(vec![LevelObject::block(300.0, 540.0, 120.0, 60.0)]);
        let mut level = Level::new(2000.0, 600.0);
        level.objects = vec![LevelObject::block(300.0, 540.0, 120.0, 60.0)];
        let settings = Settings {
            substep_hz: 120,
            ..Settings::default()
        };
        let mut coarse = GameState::new(level, &settings);
        assert_eq!(fine.frame_substeps(), 4);
        assert_eq!(coarse.frame_substeps(), 2);

        for frame in 0..90u32 {
            let input = TickInput { held: frame % 20 < 4 };
            tick(&mut fine, &input);
            tick(&mut coarse, &input);
        }
        assert!((fine.player.pos - coarse.player.pos).length() < 1e-2);
        assert_eq!(fine.player.on_ground, coarse.player.on_ground);
    }

    #[test]
    fn test_runs_along_floor() {
        let mut state = state_with(vec![]);
        for _ in 0..10 {
            tick(&mut state, &idle());
        }
        assert!(state.player.on_ground);
        assert_eq!(state.player.vel.y, 0.0);
        assert_eq!(state.player.bbox().bottom(), 600.0);
        assert!((state.player.pos.x - 120.0).abs() < 1e-3);
        assert_eq!(state.time_ticks, 40);
        assert_eq!(state.player.trail.len(), 10);
    }

    #[test]
    fn test_grounded_landing_on_first_contact() {
        let mut state = state_with(vec![LevelObject::block(0.0, 500.0, 600.0, 50.0)]);
        state.player.settle(Vec2::new(100.0, 440.0));

        let mut landed = false;
        for _ in 0..120 {
            tick(&mut state, &idle());
            let bottom = state.player.bbox().bottom();
            if bottom >= 500.0 - 1e-3 && !landed {
                assert!(state.player.on_ground, "touched the block without landing");
                assert_eq!(state.player.vel.y, 0.0);
                landed = true;
            }
            assert!(bottom <= 500.0 + 1e-3);
        }
        assert!(landed);
        assert!(state.player.on_ground);
    }

    #[test]
    fn test_micro_integration_skips_collision() {
        let mut state = state_with(vec![LevelObject::block(100.0, 0.0, 50.0, 600.0)]);
        state.player.settle(Vec2::new(80.0, 585.0));
        state.player.vel = Vec2::new(20.0, 0.0);
        for _ in 0..4 {
            substep(&mut state);
        }
        // Inside the wall until the frame resolves
        assert_eq!(state.player.pos.x, 100.0);

        resolve(&mut state, ActorSlot::Primary);
        assert_eq!(state.player.bbox().right(), 100.0);
    }

    #[test]
    fn test_cube_jump_clears_ground() {
        let mut state = state_with(vec![]);
        tick(&mut state, &idle());
        assert!(state.player.on_ground);

        tick(&mut state, &TickInput { held: true });
        assert!(!state.player.on_ground);
        assert!(state.player.bbox().bottom() < 600.0);
    }

    #[test]
    fn test_cube_hold_jumps_again_after_landing() {
        let mut state = state_with(vec![]);
        tick(&mut state, &idle());
        let held = TickInput { held: true };
        let mut jumps = 0;
        for _ in 0..90 {
            let grounded = state.player.on_ground;
            tick(&mut state, &held);
            if grounded && !state.player.on_ground {
                jumps += 1;
            }
        }
        assert!(jumps >= 2, "jumped {jumps} times");
        assert!(state.player.jump_held >= 90);
    }

    #[test]
    fn test_mode_portal_switches_next_tick_once() {
        let portal = LevelObject::new(
            ObjectKind::Portal {
                effect: PortalEffect::Mode,
                value: Some(PortalValue::Name("ship".into())),
            },
            Rect::new(200.0, 450.0, 40.0, 150.0),
        );
        let mut state = state_with(vec![portal]);

        let mut switched = false;
        for _ in 0..60 {
            tick(&mut state, &idle());
            if state.player.bbox().intersects(&Rect::new(200.0, 450.0, 40.0, 150.0)) {
                assert_eq!(state.player.mode, Mode::Ship);
                switched = true;
                break;
            }
        }
        assert!(switched);
        assert!(state.level.get(ObjectId(0)).unwrap().used);

        // Crossing again does nothing
        state.player.set_mode(Mode::Cube);
        state.player.settle(Vec2::new(150.0, 585.0));
        for _ in 0..30 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.player.mode, Mode::Cube);
    }

    #[test]
    fn test_mini_portals_on_floor_keep_actor_in_level() {
        let mini = |x: f32| {
            LevelObject::new(
                ObjectKind::Portal {
                    effect: PortalEffect::Mini,
                    value: None,
                },
                Rect::new(x, 450.0, 40.0, 150.0),
            )
        };
        let mut state = state_with(vec![mini(200.0), mini(400.0)]);

        for _ in 0..120 {
            tick(&mut state, &idle());
            assert!(state.player.bbox().bottom() <= 600.0 + 1e-3);
        }
        assert!(state.level.get(ObjectId(1)).unwrap().used);
        assert!(!state.player.mini);
        assert!(state.player.on_ground);
        assert!(state.is_playing());
        assert!((state.player.bbox().bottom() - 600.0).abs() < 1e-3);
    }

    #[test]
    fn test_spike_death_stops_the_actor() {
        let mut state = state_with(vec![LevelObject::spike(150.0, 570.0, 30.0, 30.0)]);
        for _ in 0..60 {
            tick(&mut state, &idle());
        }
        assert!(matches!(state.phase, GamePhase::Dead { .. }));
        let events = state.drain_events();
        assert_eq!(events, vec![GameEvent::Death { actor: ActorSlot::Primary }]);

        let frozen = state.player.pos;
        let ticks = state.time_ticks;
        tick(&mut state, &idle());
        assert_eq!(state.player.pos, frozen);
        assert_eq!(state.time_ticks, ticks);
    }

    #[test]
    fn test_level_without_finish_completes_past_right_edge() {
        let mut state = GameState::new(Level::new(200.0, 600.0), &Settings::default());
        for _ in 0..60 {
            tick(&mut state, &idle());
        }
        assert_eq!(state.phase, GamePhase::Complete);
        assert_eq!(state.best_progress, 100.0);
        assert_eq!(state.drain_events(), vec![GameEvent::LevelComplete]);
    }

    #[test]
    fn test_dual_actor_lands_on_ceiling() {
        let portal = LevelObject::new(
            ObjectKind::Portal {
                effect: PortalEffect::Dual,
                value: None,
            },
            Rect::new(100.0, 450.0, 20.0, 150.0),
        );
        let mut state = state_with(vec![portal]);
        for _ in 0..120 {
            tick(&mut state, &idle());
        }
        let dual = state.dual.as_ref().unwrap();
        assert_eq!(dual.gravity_flip, -1.0);
        assert!(dual.on_ground);
        assert_eq!(dual.bbox().top(), 0.0);
        assert_eq!(state.player.bbox().bottom(), 600.0);
    }

    #[test]
    fn test_determinism() {
        let objects = vec![
            LevelObject::block(300.0, 540.0, 120.0, 60.0),
            LevelObject::block(600.0, 500.0, 200.0, 100.0),
        ];
        let mut a = state_with(objects.clone());
        let mut b = state_with(objects);

        for frame in 0..180u32 {
            let input = TickInput { held: frame % 37 < 9 };
            tick(&mut a, &input);
            tick(&mut b, &input);
        }

        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.player.pose(), b.player.pose());
        assert_eq!(a.player.vel, b.player.vel);
    }
}
