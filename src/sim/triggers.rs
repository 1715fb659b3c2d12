//! Contact dispatch for interactive objects
//!
//! Every interactive object fires at most once per attempt: the first
//! qualifying overlap applies its effect and sets `used`, after which further
//! overlaps are ignored until a level reset. Objects whose payload cannot be
//! applied (unknown effect, missing target) are left untouched.

use glam::Vec2;

use super::actor::Mode;
use super::level::{GroupMutation, ObjectId, ObjectKind, OrbEffect, PortalEffect, PortalValue, TriggerEffect, TriggerParams};
use super::particles::ParticleKind;
use super::state::{ActorSlot, GameEvent, GamePhase, GameState};

/// Pad launch relative to the mode's jump impulse
pub const PAD_FACTOR: f32 = 1.5;

/// Dispatch every object overlapping the actor in `slot`, in handle order
pub fn process_contacts(state: &mut GameState, slot: ActorSlot) {
    let Some(actor) = state.actor(slot) else {
        return;
    };
    let mut hits = state.index.query(&actor.bbox());
    hits.sort_unstable();

    for id in hits {
        if !state.is_playing() {
            break;
        }
        dispatch(state, slot, id);
    }
}

/// Apply one object's effect if it is live and overlapping. Returns true if
/// the effect fired.
pub fn dispatch(state: &mut GameState, slot: ActorSlot, id: ObjectId) -> bool {
    let Some(actor) = state.actor(slot) else {
        return false;
    };
    let bbox = actor.bbox();
    let input_held = actor.jump_held > 0;
    let Some(obj) = state.level.get(id) else {
        return false;
    };
    // The index may predate a trigger that moved this object
    if obj.used || !obj.kind.is_interactive() || !obj.rect.intersects(&bbox) {
        return false;
    }
    let kind = obj.kind.clone();
    let at = obj.rect.center();

    let fired = match kind {
        ObjectKind::Spike => {
            kill(state, slot);
            true
        }
        ObjectKind::Coin { id: coin } => {
            state.coins += 1;
            state.collected_coins.push(coin);
            state.emit(GameEvent::CoinCollected { id: coin });
            state.particles.spawn(at, ParticleKind::Coin, 12);
            true
        }
        ObjectKind::Portal { effect, value } => {
            let fired = apply_portal(state, slot, effect, value.as_ref());
            if fired {
                state.particles.spawn(at, ParticleKind::Portal, 8);
            }
            fired
        }
        // Orbs wait for input while the actor overlaps them; a hold carried
        // in from before the overlap counts
        ObjectKind::Orb { effect, id: orb_id } if input_held => apply_orb(state, slot, effect, orb_id, at),
        ObjectKind::Orb { .. } => false,
        ObjectKind::Pad => {
            if let Some(actor) = state.actor_mut(slot) {
                actor.dashing = false;
                actor.launch(PAD_FACTOR);
            }
            state.particles.spawn(at, ParticleKind::Pad, 10);
            true
        }
        ObjectKind::Tele {
            target_x: Some(x),
            target_y: Some(y),
        } => match state.actor_mut(slot) {
            Some(actor) => {
                actor.teleport(Vec2::new(x, y));
                true
            }
            None => false,
        },
        ObjectKind::Tele { .. } => false,
        ObjectKind::Finish => {
            complete(state);
            true
        }
        ObjectKind::Trigger {
            effect,
            target_group,
            params,
        } => apply_trigger(state, effect, target_group, &params),
        ObjectKind::Block | ObjectKind::Unknown => false,
    };

    if fired {
        if let Some(obj) = state.level.get_mut(id) {
            obj.used = true;
        }
    }
    fired
}

fn apply_portal(state: &mut GameState, slot: ActorSlot, effect: PortalEffect, value: Option<&PortalValue>) -> bool {
    if effect == PortalEffect::Dual {
        if state.dual.take().is_none() {
            state.spawn_dual();
        }
        log::debug!("Dual mode {}", if state.dual.is_some() { "on" } else { "off" });
        return true;
    }
    if effect == PortalEffect::Speed {
        return match value.and_then(PortalValue::as_number) {
            Some(speed) if speed.is_finite() && speed > 0.0 => {
                state.speed_multiplier = speed;
                log::debug!("Speed multiplier {speed}");
                true
            }
            _ => false,
        };
    }

    let Some(actor) = state.actor_mut(slot) else {
        return false;
    };
    match effect {
        PortalEffect::Mode => {
            // Unrecognized names keep the current mode
            let Some(mode) = value.and_then(PortalValue::as_name).and_then(Mode::from_name) else {
                return false;
            };
            if actor.set_mode(mode) {
                log::debug!("{slot:?} mode -> {}", mode.name());
            }
            true
        }
        PortalEffect::Gravity => {
            actor.flip_gravity();
            actor.on_ground = false;
            true
        }
        PortalEffect::Mini => {
            actor.set_mini(!actor.mini);
            true
        }
        PortalEffect::Mirror => {
            actor.mirror = !actor.mirror;
            true
        }
        PortalEffect::Dual | PortalEffect::Speed | PortalEffect::Unknown => false,
    }
}

fn apply_orb(state: &mut GameState, slot: ActorSlot, effect: OrbEffect, orb_id: Option<u32>, at: Vec2) -> bool {
    let Some(factor) = effect.factor() else {
        return false;
    };
    let Some(actor) = state.actor_mut(slot) else {
        return false;
    };
    if factor == 0.0 {
        actor.dashing = true;
        actor.vel.y = 0.0;
        actor.on_ground = false;
    } else {
        actor.dashing = false;
        actor.launch(factor);
    }
    state.particles.spawn(at, ParticleKind::Orb, 10);
    if orb_id.is_some() {
        state.orbs += 1;
        state.emit(GameEvent::OrbCollected);
    }
    true
}

fn apply_trigger(
    state: &mut GameState,
    effect: TriggerEffect,
    target_group: Option<u32>,
    params: &TriggerParams,
) -> bool {
    let Some(group) = target_group else {
        return false;
    };
    let mutation = match effect {
        TriggerEffect::Move if params.dx.is_some() || params.dy.is_some() => GroupMutation::Translate {
            dx: params.dx.unwrap_or(0.0),
            dy: params.dy.unwrap_or(0.0),
        },
        TriggerEffect::Color => match params.color {
            Some(color) => GroupMutation::Color(color),
            None => return false,
        },
        TriggerEffect::Alpha => match params.alpha {
            Some(alpha) => GroupMutation::Alpha(alpha),
            None => return false,
        },
        TriggerEffect::Move | TriggerEffect::Unknown => return false,
    };

    let count = state.level.apply_to_group(group, mutation);
    if mutation.is_positional() {
        state.rebuild_index();
    }
    log::debug!("Trigger {mutation:?} on group {group} ({count} objects)");
    true
}

/// End the attempt
pub fn kill(state: &mut GameState, slot: ActorSlot) {
    if !state.is_playing() {
        return;
    }
    let at = state.actor(slot).map_or(Vec2::ZERO, |a| a.pos);
    state.phase = GamePhase::Dead {
        respawn_in: state.respawn_delay,
    };
    state.emit(GameEvent::Death { actor: slot });
    state.particles.spawn(at, ParticleKind::Death, 40);
    log::info!(
        "Died at {:.0}% on attempt {}",
        state.progress(),
        state.attempts
    );
}

/// Finish the level
pub fn complete(state: &mut GameState) {
    if !state.is_playing() {
        return;
    }
    state.phase = GamePhase::Complete;
    state.best_progress = 100.0;
    state.emit(GameEvent::LevelComplete);
    log::info!(
        "Level complete on attempt {} with {} coins",
        state.attempts,
        state.coins
    );
}
