//! Frame scheduler
//!
//! Converts host frame time into whole substeps and runs a [`tick`] for every
//! full game frame they add up to. Frame time is clamped before it enters the
//! accumulator; partial substeps and substeps short of a game frame carry to
//! the next host frame. Input comes either from the host (`press`/`release`,
//! optionally recorded) or from a replay, which takes precedence while it is
//! loaded. Both are sampled at game frame boundaries, so a replay reproduces
//! the run at any host frame rate.

use super::level::Level;
use super::replay::{ReplayAction, ReplayLog, ReplayPlayer};
use super::state::{GameEvent, GamePhase, GameState, RenderFrame};
use super::tick::{TickInput, tick};
use crate::settings::Settings;

/// Slack when comparing the accumulator against a whole substep
const ACCUMULATOR_EPSILON: f64 = 1e-9;

/// Clamp a host frame delta into `[0, max]`; non-finite deltas count as zero
pub fn clamp_frame_delta(dt: f32, max: f32) -> f32 {
    if dt.is_finite() { dt.clamp(0.0, max.max(0.0)) } else { 0.0 }
}

/// Whole substeps available in `accumulator`, and the carried remainder
pub fn plan_substeps(accumulator: f64, step: f64) -> (u32, f64) {
    let mut remaining = accumulator;
    let mut substeps = 0u32;
    while remaining + ACCUMULATOR_EPSILON >= step {
        remaining -= step;
        substeps += 1;
    }
    (substeps, remaining.max(0.0))
}

#[derive(Debug)]
pub struct Simulation {
    settings: Settings,
    state: GameState,
    accumulator: f64,
    /// Substep length in seconds
    step: f64,
    /// Substeps released but not yet run as a game frame
    pending: u32,
    paused: bool,
    /// Current input level (live or replayed)
    held: bool,
    recorder: Option<ReplayLog>,
    playback: Option<ReplayPlayer>,
}

impl Simulation {
    pub fn new(level: Level, settings: Settings) -> Self {
        let state = GameState::new(level, &settings);
        Self {
            step: 1.0 / f64::from(settings.substep_hz.max(1)),
            settings,
            state,
            accumulator: 0.0,
            pending: 0,
            paused: false,
            held: false,
            recorder: None,
            playback: None,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Advance by one host frame of `dt` seconds. Returns the substeps run.
    pub fn frame(&mut self, dt: f32) -> u32 {
        if self.paused {
            return 0;
        }
        let dt = clamp_frame_delta(dt, self.settings.max_frame_dt);
        self.accumulator += f64::from(dt);
        let (released, remaining) = plan_substeps(self.accumulator, self.step);
        self.accumulator = remaining;
        self.pending += released;

        let per_frame = self.state.frame_substeps();
        let mut substeps = 0;
        while self.pending >= per_frame {
            self.pending -= per_frame;
            self.apply_replay();
            tick(&mut self.state, &TickInput { held: self.held });
            substeps += per_frame;
        }
        log::trace!(
            "frame dt={dt:.4} substeps={substeps} pending={} carry={:.5} ticks={}",
            self.pending,
            self.accumulator,
            self.state.time_ticks
        );

        let respawn_due = match &mut self.state.phase {
            GamePhase::Dead { respawn_in } => {
                *respawn_in -= dt;
                *respawn_in <= 0.0
            }
            _ => false,
        };
        if respawn_due && self.settings.auto_restart {
            self.restart();
        }
        substeps
    }

    /// Feed replay actions that are due at the current tick
    fn apply_replay(&mut self) {
        let Some(player) = self.playback.as_mut() else {
            return;
        };
        for event in player.drain_due(self.state.time_ticks) {
            self.held = event.action == ReplayAction::Jump;
        }
    }

    /// Input went down. Ignored during replay playback.
    pub fn press(&mut self) {
        self.live_input(ReplayAction::Jump);
    }

    /// Input went up. Ignored during replay playback.
    pub fn release(&mut self) {
        self.live_input(ReplayAction::Release);
    }

    fn live_input(&mut self, action: ReplayAction) {
        if self.playback.is_some() {
            return;
        }
        let held = action == ReplayAction::Jump;
        if held == self.held {
            return;
        }
        self.held = held;
        if let Some(log) = self.recorder.as_mut() {
            log.record(self.state.time_ticks, action);
        }
    }

    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Start a fresh attempt. Playback rewinds; recording starts over.
    pub fn restart(&mut self) {
        self.state.restart();
        self.accumulator = 0.0;
        self.pending = 0;
        self.held = false;
        if let Some(log) = self.recorder.as_mut() {
            log.clear();
        }
        if let Some(player) = self.playback.as_mut() {
            player.rewind();
        }
    }

    /// Record live input from now on
    pub fn start_recording(&mut self) {
        self.recorder = Some(ReplayLog::new());
    }

    /// Stop recording and hand back the log
    pub fn take_recording(&mut self) -> Option<ReplayLog> {
        self.recorder.take()
    }

    pub fn recording(&self) -> Option<&ReplayLog> {
        self.recorder.as_ref()
    }

    /// Drive input from `log`, starting a fresh attempt
    pub fn play_replay(&mut self, log: ReplayLog) {
        log::info!("Replaying {} input events", log.len());
        self.recorder = None;
        self.playback = Some(ReplayPlayer::new(log));
        self.restart();
    }

    /// Return input control to the host
    pub fn stop_replay(&mut self) {
        self.playback = None;
        self.held = false;
    }

    pub fn is_replaying(&self) -> bool {
        self.playback.is_some()
    }

    pub fn render_frame(&self) -> RenderFrame<'_> {
        self.state.render_frame(self.settings.viewport)
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::actor::Mode;
    use crate::sim::level::LevelObject;

    const FRAME_DT: f32 = 1.0 / 60.0;

    fn level() -> Level {
        let mut level = Level::new(4000.0, 600.0);
        level.objects = vec![
            LevelObject::block(400.0, 540.0, 200.0, 60.0),
            LevelObject::block(800.0, 500.0, 300.0, 100.0),
            LevelObject::block(1300.0, 420.0, 200.0, 180.0),
        ];
        level
    }

    #[test]
    fn test_plan_substeps_carries_remainder() {
        let step = 1.0 / 240.0;
        let (n, rem) = plan_substeps(step * 2.5, step);
        assert_eq!(n, 2);
        assert!((rem - step * 0.5).abs() < 1e-12);

        let (n, rem) = plan_substeps(step * 0.5, step);
        assert_eq!(n, 0);
        assert!((rem - step * 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_clamp_frame_delta() {
        assert_eq!(clamp_frame_delta(1.0, 1.0 / 30.0), 1.0 / 30.0);
        assert_eq!(clamp_frame_delta(-0.5, 1.0 / 30.0), 0.0);
        assert_eq!(clamp_frame_delta(f32::NAN, 1.0 / 30.0), 0.0);
        assert_eq!(clamp_frame_delta(0.01, 1.0 / 30.0), 0.01);
    }

    #[test]
    fn test_frame_runs_four_substeps_at_60hz() {
        let mut sim = Simulation::new(level(), Settings::default());
        let total: u32 = (0..60).map(|_| sim.frame(FRAME_DT)).sum();
        assert_eq!(total, 240);
        assert_eq!(sim.state().time_ticks, 240);
    }

    #[test]
    fn test_stalled_frame_is_clamped() {
        let mut sim = Simulation::new(level(), Settings::default());
        assert_eq!(sim.frame(2.0), 8);
    }

    #[test]
    fn test_partial_game_frame_is_carried() {
        let mut sim = Simulation::new(level(), Settings::default());
        // 0.006 s is one substep and a bit; no game frame yet
        assert_eq!(sim.frame(0.006), 0);
        assert_eq!(sim.frame(0.003), 0);
        assert_eq!(sim.state().time_ticks, 0);
        // 0.017 s in total covers four substeps
        assert_eq!(sim.frame(0.008), 4);
        assert_eq!(sim.state().time_ticks, 4);
        assert_eq!(sim.frame(0.001), 0);
    }

    #[test]
    fn test_fast_host_runs_game_frame_every_other_frame() {
        let mut sim = Simulation::new(level(), Settings::default());
        let ran: Vec<u32> = (0..6).map(|_| sim.frame(1.0 / 120.0)).collect();
        assert_eq!(ran, vec![0, 4, 0, 4, 0, 4]);
        assert_eq!(sim.state().time_ticks, 12);
    }

    #[test]
    fn test_pause_preserves_state() {
        let mut sim = Simulation::new(level(), Settings::default());
        sim.frame(FRAME_DT);
        let pose = sim.state().player.pose();

        sim.pause();
        assert_eq!(sim.frame(FRAME_DT), 0);
        assert_eq!(sim.state().player.pose(), pose);
        assert_eq!(sim.state().time_ticks, 4);

        sim.resume();
        assert_eq!(sim.frame(FRAME_DT), 4);
        assert_ne!(sim.state().player.pose(), pose);
    }

    #[test]
    fn test_death_auto_restarts() {
        let mut level = level();
        level.objects.push(LevelObject::spike(200.0, 570.0, 30.0, 30.0));
        let settings = Settings {
            respawn_delay: 0.5,
            ..Settings::default()
        };
        let mut sim = Simulation::new(level, settings);

        let mut died = false;
        for _ in 0..120 {
            sim.frame(FRAME_DT);
            if sim.drain_events().iter().any(|e| matches!(e, GameEvent::Death { .. })) {
                died = true;
                break;
            }
        }
        assert!(died);
        assert!(matches!(sim.state().phase, GamePhase::Dead { .. }));

        for _ in 0..31 {
            sim.frame(FRAME_DT);
        }
        assert!(sim.state().is_playing());
        assert_eq!(sim.state().attempts, 2);
    }

    #[test]
    fn test_no_auto_restart_waits_for_host() {
        let mut level = level();
        level.objects.push(LevelObject::spike(200.0, 570.0, 30.0, 30.0));
        let settings = Settings {
            auto_restart: false,
            ..Settings::default()
        };
        let mut sim = Simulation::new(level, settings);
        for _ in 0..300 {
            sim.frame(FRAME_DT);
        }
        assert!(matches!(sim.state().phase, GamePhase::Dead { .. }));
        sim.restart();
        assert!(sim.state().is_playing());
        assert_eq!(sim.state().time_ticks, 0);
    }

    #[test]
    fn test_replay_reproduces_live_run() {
        let frames: Vec<f32> = (0..400).map(|i| [FRAME_DT, 1.0 / 50.0, 1.0 / 75.0][i % 3]).collect();

        let mut live = Simulation::new(level(), Settings::default());
        live.start_recording();
        for (i, dt) in frames.iter().enumerate() {
            match i % 45 {
                5 => live.press(),
                14 => live.release(),
                _ => {}
            }
            live.frame(*dt);
        }
        let log = live.take_recording().unwrap();
        assert!(!log.is_empty());

        let mut replay = Simulation::new(level(), Settings::default());
        replay.play_replay(log);
        // Live input is ignored while replaying
        replay.press();
        for dt in &frames {
            replay.frame(*dt);
        }

        assert_eq!(replay.state().time_ticks, live.state().time_ticks);
        assert_eq!(replay.state().player.pose(), live.state().player.pose());
        assert_eq!(replay.state().player.vel, live.state().player.vel);
    }

    /// Run `frames` host frames of `dt`, pressing over `[press, release)`
    fn run_recorded(dt: f32, frames: usize, press: usize, release: usize) -> Simulation {
        let mut sim = Simulation::new(level(), Settings::default());
        sim.start_recording();
        for i in 0..frames {
            if i == press {
                sim.press();
            } else if i == release {
                sim.release();
            }
            sim.frame(dt);
        }
        sim
    }

    #[test]
    fn test_replay_at_other_frame_rate_matches() {
        let mut live = run_recorded(FRAME_DT, 40, 10, 30);
        let log = live.take_recording().unwrap();
        assert_eq!(log.len(), 2);
        let end = live.state().time_ticks;
        assert_eq!(end, 160);

        for dt in [1.0 / 120.0, 1.0 / 144.0, 1.0 / 30.0] {
            let mut replay = Simulation::new(level(), Settings::default());
            replay.play_replay(log.clone());
            while replay.state().time_ticks < end {
                replay.frame(dt);
            }
            assert_eq!(replay.state().time_ticks, end, "dt {dt}");
            assert_eq!(replay.state().player.pose(), live.state().player.pose(), "dt {dt}");
            assert_eq!(replay.state().player.vel, live.state().player.vel, "dt {dt}");
        }
    }

    #[test]
    fn test_robot_charge_ignores_host_frame_rate() {
        let launch_tick = |dt: f32| {
            let mut sim = Simulation::new(level(), Settings::default());
            sim.state_mut().player.set_mode(Mode::Robot);
            // Settle onto the floor before charging
            while !sim.state().player.on_ground {
                sim.frame(dt);
            }
            sim.press();
            let mut grounded_ticks = sim.state().time_ticks;
            while sim.state().player.on_ground {
                grounded_ticks = sim.state().time_ticks;
                sim.frame(dt);
            }
            (grounded_ticks, sim.state().player.vel.y)
        };
        let (ticks_60, vy_60) = launch_tick(FRAME_DT);
        let (ticks_144, vy_144) = launch_tick(1.0 / 144.0);
        assert_eq!(ticks_60, ticks_144);
        assert_eq!(vy_60, vy_144);
    }

    #[test]
    fn test_render_frame_uses_viewport() {
        let sim = Simulation::new(level(), Settings::default());
        let frame = sim.render_frame();
        assert_eq!(frame.camera.w, 800.0);
        assert_eq!(frame.camera.h, 450.0);
        assert!(frame.visible.iter().any(|id| id.0 == 0));
        assert!(frame.dual.is_none());
    }
}
