//! Dashline headless runner
//!
//! Loads a level (or builds a demo level), drives the simulation at 60 fps
//! with scripted or replayed input and prints a summary.

#[cfg(not(target_arch = "wasm32"))]
use std::process::ExitCode;

#[cfg(not(target_arch = "wasm32"))]
use dashline::sim::{GameEvent, GamePhase, Level, ReplayLog, Simulation};
#[cfg(not(target_arch = "wasm32"))]
use dashline::{QualityPreset, Settings};

#[cfg(not(target_arch = "wasm32"))]
const HOST_FPS: f32 = 60.0;

#[cfg(not(target_arch = "wasm32"))]
#[derive(Debug, Default)]
struct Options {
    level: Option<String>,
    replay: Option<String>,
    record: Option<String>,
    settings: Option<String>,
    quality: Option<QualityPreset>,
    seconds: Option<f32>,
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> ExitCode {
    env_logger::init();
    match run_cli() {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::from(1)
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly on the web
}

#[cfg(not(target_arch = "wasm32"))]
fn run_cli() -> Result<(), String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("{}", usage_text());
        return Ok(());
    }
    let options = parse_args(&args)?;

    let mut settings = match &options.settings {
        Some(path) => Settings::load(path).map_err(|e| format!("settings {path}: {e}"))?,
        None => Settings::default(),
    };
    if let Some(quality) = options.quality {
        settings.quality = quality;
    }

    let level = match &options.level {
        Some(path) => Level::load(path).map_err(|e| format!("level {path}: {e}"))?,
        None => {
            log::info!("No level given, running the demo level");
            demo::level()
        }
    };

    let mut sim = Simulation::new(level, settings);
    let scripted = match &options.replay {
        Some(path) => {
            let log = ReplayLog::load(path).map_err(|e| format!("replay {path}: {e}"))?;
            sim.play_replay(log);
            false
        }
        None => true,
    };
    if options.record.is_some() {
        sim.start_recording();
    }

    let seconds = options.seconds.unwrap_or(30.0).max(0.0);
    let frames = (seconds * HOST_FPS).round() as u32;
    let dt = 1.0 / HOST_FPS;
    let mut deaths = 0u32;

    for frame in 0..frames {
        if scripted {
            if demo::input_held(frame) {
                sim.press();
            } else {
                sim.release();
            }
        }
        sim.frame(dt);

        for event in sim.drain_events() {
            match event {
                GameEvent::Death { actor } => {
                    deaths += 1;
                    log::debug!("{actor:?} died at frame {frame}");
                }
                GameEvent::CoinCollected { id } => log::debug!("Coin {id} at frame {frame}"),
                GameEvent::OrbCollected => log::debug!("Orb at frame {frame}"),
                GameEvent::LevelComplete => log::debug!("Finish at frame {frame}"),
            }
        }
        if sim.state().phase == GamePhase::Complete {
            break;
        }
    }

    if let (Some(path), Some(log)) = (&options.record, sim.recording()) {
        log.save(path).map_err(|e| format!("replay {path}: {e}"))?;
        log::info!("Saved {} input events to {path}", log.len());
    }

    let state = sim.state();
    let view = sim.render_frame();
    println!("quality:       {}", sim.settings().quality.as_str());
    println!("phase:         {:?}", state.phase);
    println!("attempts:      {}", state.attempts);
    println!("deaths:        {deaths}");
    println!("coins:         {}", state.coins);
    println!("orbs:          {}", state.orbs);
    println!("best progress: {:.1}%", state.best_progress);
    println!(
        "final pose:    ({:.1}, {:.1}) {} rot {:.0}",
        view.player.x,
        view.player.y,
        view.player.mode.name(),
        view.player.rotation
    );
    println!("visible:       {} objects, {} particles", view.visible.len(), view.particles.len());
    Ok(())
}

#[cfg(not(target_arch = "wasm32"))]
fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut options = Options::default();
    let mut index = 0usize;
    while index < args.len() {
        let arg = args[index].as_str();
        let value = || {
            args.get(index + 1)
                .cloned()
                .ok_or_else(|| format!("missing value for {arg}"))
        };
        match arg {
            "--replay" => options.replay = Some(value()?),
            "--record" => options.record = Some(value()?),
            "--settings" => options.settings = Some(value()?),
            "--quality" => {
                let name = value()?;
                options.quality = Some(
                    QualityPreset::from_name(&name)
                        .ok_or_else(|| format!("invalid --quality value '{name}' (expected low, medium or high)"))?,
                );
            }
            "--seconds" => {
                let raw = value()?;
                options.seconds = Some(
                    raw.parse::<f32>()
                        .map_err(|_| format!("invalid --seconds value '{raw}' (expected a number)"))?,
                );
            }
            other if other.starts_with("--") => return Err(format!("unknown option '{other}'\n{}", usage_text())),
            path => {
                if options.level.is_some() {
                    return Err(format!("unexpected argument '{path}'"));
                }
                options.level = Some(path.to_string());
                index += 1;
                continue;
            }
        }
        index += 2;
    }
    Ok(options)
}

#[cfg(not(target_arch = "wasm32"))]
fn usage_text() -> String {
    [
        "usage: dashline [level.json] [options]",
        "  --replay <file>     drive input from a recorded replay",
        "  --record <file>     save the input of this run as a replay",
        "  --settings <file>   load simulation settings",
        "  --quality <preset>  low, medium or high particle budget",
        "  --seconds <n>       simulated seconds to run (default 30)",
    ]
    .join("\n")
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use dashline::sim::{
        Level, LevelObject, ObjectKind, OrbEffect, PortalEffect, PortalValue, Rect, TriggerEffect, TriggerParams,
    };

    const HEIGHT: f32 = 600.0;

    fn object(kind: ObjectKind, x: f32, y: f32, w: f32, h: f32) -> LevelObject {
        LevelObject::new(kind, Rect::new(x, y, w, h))
    }

    fn portal(effect: PortalEffect, value: Option<PortalValue>, x: f32) -> LevelObject {
        object(ObjectKind::Portal { effect, value }, x, HEIGHT - 150.0, 40.0, 150.0)
    }

    /// A short course touching every object kind
    pub fn level() -> Level {
        let mut level = Level::new(6000.0, HEIGHT);
        let floor = HEIGHT - 30.0;
        level.objects = vec![
            LevelObject::spike(500.0, floor, 30.0, 30.0),
            object(ObjectKind::Coin { id: 1 }, 700.0, floor - 80.0, 20.0, 20.0),
            LevelObject::block(900.0, HEIGHT - 60.0, 240.0, 60.0),
            object(ObjectKind::Pad, 1300.0, floor + 20.0, 30.0, 10.0),
            object(
                ObjectKind::Orb {
                    effect: OrbEffect::Yellow,
                    id: Some(1),
                },
                1500.0,
                floor - 120.0,
                30.0,
                30.0,
            ),
            portal(PortalEffect::Mode, Some(PortalValue::Name("ship".into())), 1800.0),
            LevelObject::block(2100.0, 0.0, 200.0, 200.0),
            portal(PortalEffect::Mode, Some(PortalValue::Name("cube".into())), 2600.0),
            object(
                ObjectKind::Trigger {
                    effect: TriggerEffect::Move,
                    target_group: Some(1),
                    params: TriggerParams {
                        dy: Some(-200.0),
                        ..Default::default()
                    },
                },
                2800.0,
                0.0,
                20.0,
                HEIGHT,
            ),
            LevelObject::block(3100.0, HEIGHT - 200.0, 60.0, 200.0).with_group(1),
            portal(PortalEffect::Speed, Some(PortalValue::Number(1.3)), 3400.0),
            object(ObjectKind::Coin { id: 2 }, 3800.0, floor - 40.0, 20.0, 20.0),
            portal(PortalEffect::Gravity, None, 4200.0),
            portal(PortalEffect::Gravity, None, 4800.0),
            object(
                ObjectKind::Tele {
                    target_x: Some(5300.0),
                    target_y: Some(HEIGHT - 15.0),
                },
                5000.0,
                0.0,
                20.0,
                HEIGHT,
            ),
            object(ObjectKind::Finish, 5800.0, 0.0, 40.0, HEIGHT),
        ];
        level
    }

    /// Tap for a few frames roughly every half second
    pub fn input_held(frame: u32) -> bool {
        frame % 32 < 6
    }
}
