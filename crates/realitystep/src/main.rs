use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;
use reality_core::audio::SilentAudio;
use reality_core::clock::ManualClock;
use reality_core::config::RealityConfig;
use reality_core::events::{Channel, Command};
use reality_core::io::frame::Frame;
use reality_core::orchestrator::{FrameOrchestrator, Renderer};
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "realitystep",
    about = "Headless fixed-step runner emitting NDJSON frames"
)]
struct Args {
    /// Optional path to a config JSON document. Defaults apply otherwise.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Number of display frames to simulate.
    #[arg(long)]
    frames: u64,

    /// Simulated display refresh rate.
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// Output NDJSON file path.
    #[arg(long)]
    out: PathBuf,

    /// Choice ids answered, in order, each time choices are requested.
    #[arg(long = "choose", value_name = "ID")]
    choose: Vec<String>,

    /// Discover a glitch every N frames.
    #[arg(long = "glitch-every", value_name = "FRAMES")]
    glitch_every: Option<u64>,

    /// Stop after the frame on which the ending resolves.
    #[arg(long = "stop-on-ending")]
    stop_on_ending: bool,
}

struct NdjsonRenderer<W: Write> {
    writer: W,
}

impl<W: Write> Renderer for NdjsonRenderer<W> {
    fn render(&mut self, frame: &Frame) -> Result<()> {
        let line = frame.to_ndjson()?;
        self.writer.write_all(line.as_bytes())?;
        Ok(())
    }

    fn dispose(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

struct RunSummary {
    frames: u64,
    ended: bool,
}

fn run<W: Write + 'static>(config: &RealityConfig, args: &Args, writer: W) -> Result<RunSummary> {
    ensure!(
        args.fps.is_finite() && args.fps > 0.0,
        "--fps must be positive, got {}",
        args.fps
    );
    let frame_seconds = 1.0 / args.fps;

    let mut orch = FrameOrchestrator::new(
        config,
        ManualClock::default(),
        Box::new(NdjsonRenderer { writer }),
        Box::new(SilentAudio),
    )?;

    if !args.choose.is_empty() {
        let mut answers: VecDeque<String> = args.choose.iter().cloned().collect();
        orch.bus_mut().subscribe(Channel::RequestChoices, move |_, outbox| {
            if let Some(id) = answers.pop_front() {
                outbox.send(Command::make_choice(id));
            }
        });
    }

    orch.start()?;
    let mut frames = 0;
    for index in 0..args.frames {
        if let Some(every) = args.glitch_every.filter(|every| *every > 0) {
            if index > 0 && index % every == 0 {
                orch.send(Command::DiscoverGlitch { at: [0.0, 1.0, 0.0] });
            }
        }
        orch.clock_mut().advance(frame_seconds);
        orch.tick()?;
        frames += 1;
        if args.stop_on_ending && orch.narrative().is_ended() {
            break;
        }
    }

    let ended = orch.narrative().is_ended();
    if let Some(ending) = orch.narrative().ending() {
        info!(%ending, frames, "run ended");
    }
    orch.dispose();
    Ok(RunSummary { frames, ended })
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => RealityConfig::load_from_path(path)
            .with_context(|| format!("failed to read config {:?}", path))?,
        None => RealityConfig::default(),
    };

    let file =
        File::create(&args.out).with_context(|| format!("failed to create {:?}", args.out))?;
    let summary = run(&config, &args, BufWriter::new(file))?;
    info!(
        frames = summary.frames,
        ended = summary.ended,
        out = ?args.out,
        "wrote frames"
    );
    Ok(())
}
