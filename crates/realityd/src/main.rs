use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use reality_core::audio::AudioCues;
use reality_core::clock::{Clock, SystemClock};
use reality_core::config::RealityConfig;
use reality_core::events::{Channel, Command, Event};
use reality_core::io::frame::Frame;
use reality_core::io::prefs::Preferences;
use reality_core::orchestrator::{FrameOrchestrator, Renderer};
use reality_core::state::{Ending, Zone};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, trace, warn};

const DEFAULT_FPS: u32 = 60;

#[derive(Parser, Debug)]
#[command(name = "realityd", about = "Real-time simulation reality loop driven from stdin")]
struct Args {
    /// Optional path to a config JSON document.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Display refresh rate. Falls back to the stored preference, then 60.
    #[arg(long)]
    fps: Option<u32>,

    /// Answer every choice request with the last offered choice.
    #[arg(long)]
    autopilot: bool,

    /// Wait for a `start` command instead of starting immediately.
    #[arg(long = "wait-for-start")]
    wait_for_start: bool,

    /// Exit once the ending has been shown.
    #[arg(long = "exit-on-ending")]
    exit_on_ending: bool,

    /// Preference store for UI and debug settings.
    #[arg(long, value_name = "PATH", default_value = "realityd.prefs.json")]
    prefs: PathBuf,
}

#[derive(Debug, PartialEq)]
enum Input {
    Command(Command),
    Quit,
}

fn parse_input(line: &str) -> Result<Option<Input>> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = words.collect();
    let input = match (verb, rest.as_slice()) {
        ("start", []) => Input::Command(Command::Start),
        ("pause", []) => Input::Command(Command::Pause),
        ("resume", []) => Input::Command(Command::Resume),
        ("quit" | "exit", []) => Input::Quit,
        ("choose", [id]) => Input::Command(Command::make_choice(*id)),
        ("glitch", []) => Input::Command(Command::DiscoverGlitch { at: [0.0; 3] }),
        ("glitch", [x, y, z]) => {
            let axis = |value: &str| {
                value
                    .parse::<f32>()
                    .with_context(|| format!("invalid coordinate {value:?}"))
            };
            Input::Command(Command::DiscoverGlitch {
                at: [axis(*x)?, axis(*y)?, axis(*z)?],
            })
        }
        _ => bail!("unrecognised input {line:?}"),
    };
    Ok(Some(input))
}

/// Logs the on-screen message whenever it changes.
#[derive(Default)]
struct LogRenderer {
    message: String,
}

impl Renderer for LogRenderer {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        trace!(t = frame.t, delta = frame.delta, "frame");
        for event in &frame.events {
            let json = serde_json::to_string(event)?;
            info!(event = %json, "event");
        }
        if frame.message != self.message {
            self.message.clone_from(&frame.message);
            info!(
                zone = %frame.state.current_zone,
                consciousness = frame.state.consciousness,
                fulfillment = frame.state.fulfillment,
                "{}",
                frame.message
            );
        }
        Ok(())
    }
}

struct LogAudio;

impl AudioCues for LogAudio {
    fn zone_transition(&mut self, zone: Zone) {
        info!(%zone, "audio: transition cue");
    }

    fn glitch(&mut self, count: u32) {
        info!(count, "audio: glitch cue");
    }

    fn ending(&mut self, ending: Ending) {
        info!(%ending, "audio: ending cue");
    }
}

fn install_autopilot(orch: &mut FrameOrchestrator<SystemClock>) {
    let catalog = orch.narrative().catalog().clone();
    let zone = Rc::new(Cell::new(orch.narrative().state().current_zone));

    let latest = Rc::clone(&zone);
    orch.bus_mut().subscribe(Channel::ZoneChange, move |event, _| {
        if let Event::ZoneChange { zone } = event {
            latest.set(*zone);
        }
    });
    orch.bus_mut().subscribe(Channel::RequestChoices, move |_, outbox| {
        if let Some(choice) = catalog.offered(zone.get()).last() {
            info!(choice = %choice.text, "autopilot");
            outbox.send(Command::make_choice(choice.id.clone()));
        }
    });
}

/// Run one display frame. Returns `false` once the loop should stop; the
/// caller still disposes and saves preferences.
fn run_frame<C: Clock>(orch: &mut FrameOrchestrator<C>, exit_on_ending: bool) -> bool {
    match orch.tick() {
        Ok(_) => !(exit_on_ending && orch.narrative().is_ended()),
        Err(err) => {
            error!(?err, "frame failed");
            false
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut prefs = Preferences::load_or_default(&args.prefs)?;
    let fps = args
        .fps
        .or_else(|| prefs.get("fps"))
        .unwrap_or(DEFAULT_FPS)
        .max(1);
    let autopilot = args.autopilot || prefs.get("autopilot").unwrap_or(false);

    let config = match &args.config {
        Some(path) => RealityConfig::load_from_path(path)
            .with_context(|| format!("failed to read config {:?}", path))?,
        None => RealityConfig::default(),
    };

    let mut orch = FrameOrchestrator::new(
        &config,
        SystemClock::default(),
        Box::new(LogRenderer::default()),
        Box::new(LogAudio),
    )?;
    if autopilot {
        install_autopilot(&mut orch);
    }
    if !args.wait_for_start {
        orch.start()?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut refresh = tokio::time::interval(Duration::from_secs_f64(1.0 / f64::from(fps)));
    refresh.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(fps, autopilot, "realityd ready");
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                if !run_frame(&mut orch, args.exit_on_ending) {
                    break;
                }
            }
            line = lines.next_line(), if stdin_open => {
                match line.context("failed to read stdin")? {
                    Some(line) => match parse_input(&line) {
                        Ok(Some(Input::Command(command))) => orch.send(command),
                        Ok(Some(Input::Quit)) => break,
                        Ok(None) => {}
                        Err(err) => warn!(%err, "ignoring input"),
                    },
                    None => stdin_open = false,
                }
            }
            _ = &mut shutdown => {
                info!("interrupt received");
                break;
            }
        }
    }

    orch.dispose();
    prefs.set("fps", fps)?;
    prefs.set("autopilot", autopilot)?;
    prefs
        .save()
        .with_context(|| format!("failed to save preferences {:?}", args.prefs))?;
    Ok(())
}
