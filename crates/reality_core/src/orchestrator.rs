//! Per-frame update/render sequencing.
//!
//! The host calls [`FrameOrchestrator::tick`] once per display refresh.
//! While running, a tick drains inbound commands, advances the narrative,
//! feeds the derived scalars to every visual subsystem, dispatches the
//! frame's events and renders once. While paused, only commands are drained
//! and the last state is rendered again without consuming clock time.

use std::fmt;

use anyhow::Result;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, trace, warn};

use crate::audio::AudioCues;
use crate::clock::Clock;
use crate::config::{OrchestratorConfig, RealityConfig};
use crate::events::{Command, Event, EventBus};
use crate::io::frame::{make_frame, Frame};
use crate::narrative::NarrativeSystem;
use crate::scene::{FrameInputs, Scene};
use crate::unit::sanitize_delta;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    NotStarted,
    Running,
    Paused,
    Disposed,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::NotStarted => "not started",
            LoopState::Running => "running",
            LoopState::Paused => "paused",
            LoopState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoopError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: LoopState,
    },
}

/// Consumer of rendered frames.
pub trait Renderer {
    fn render(&mut self, frame: &Frame) -> Result<()>;

    fn dispose(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Result of one [`FrameOrchestrator::tick`].
#[derive(Clone, Debug)]
pub struct TickOutcome {
    pub state: LoopState,
    /// Simulated seconds consumed by this tick.
    pub delta: f64,
    /// Events dispatched during this tick, in publication order.
    pub events: Vec<Event>,
    /// The frame handed to the renderer, if one was rendered.
    pub frame: Option<Frame>,
}

pub struct FrameOrchestrator<C: Clock> {
    config: OrchestratorConfig,
    narrative: NarrativeSystem,
    scene: Scene,
    bus: EventBus,
    clock: C,
    renderer: Box<dyn Renderer>,
    audio: Box<dyn AudioCues>,
    state: LoopState,
    last_time: f64,
    frames_rendered: u64,
}

impl<C: Clock> fmt::Debug for FrameOrchestrator<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameOrchestrator")
            .field("state", &self.state)
            .field("frames_rendered", &self.frames_rendered)
            .field("narrative", &self.narrative)
            .field("bus", &self.bus)
            .finish_non_exhaustive()
    }
}

impl<C: Clock> FrameOrchestrator<C> {
    pub fn new(
        config: &RealityConfig,
        clock: C,
        renderer: Box<dyn Renderer>,
        audio: Box<dyn AudioCues>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: config.orchestrator.clone(),
            narrative: NarrativeSystem::new(config),
            scene: Scene::new(&config.orchestrator),
            bus: EventBus::new(),
            clock,
            renderer,
            audio,
            state: LoopState::NotStarted,
            last_time: 0.0,
            frames_rendered: 0,
        })
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn narrative(&self) -> &NarrativeSystem {
        &self.narrative
    }

    /// Debug access to the narrative system, e.g. for override hooks.
    pub fn narrative_mut(&mut self) -> &mut NarrativeSystem {
        &mut self.narrative
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Queue a command for the next tick.
    pub fn send(&mut self, command: Command) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.bus.send(command);
    }

    pub fn start(&mut self) -> Result<(), LoopError> {
        self.transition("start", LoopState::NotStarted, LoopState::Running)?;
        self.last_time = self.clock.now();
        info!("simulation started");
        Ok(())
    }

    pub fn pause(&mut self) -> Result<(), LoopError> {
        if self.state != LoopState::Running {
            return Err(LoopError::InvalidTransition {
                action: "pause",
                state: self.state,
            });
        }
        // Running time up to the pause still reaches the accumulators.
        let delta = self.consume_clock();
        self.advance(delta);
        self.state = LoopState::Paused;
        info!(delta, "simulation paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), LoopError> {
        self.transition("resume", LoopState::Paused, LoopState::Running)?;
        // Time spent paused is never handed to the accumulators.
        self.last_time = self.clock.now();
        info!("simulation resumed");
        Ok(())
    }

    /// Stop the loop and release every subsystem. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.state == LoopState::Disposed {
            return;
        }
        self.state = LoopState::Disposed;
        self.scene.dispose();
        if let Err(err) = self.renderer.dispose() {
            warn!(?err, "renderer dispose failed");
        }
        self.bus.clear();
        info!(frames = self.frames_rendered, "simulation disposed");
    }

    fn transition(
        &mut self,
        action: &'static str,
        from: LoopState,
        to: LoopState,
    ) -> Result<(), LoopError> {
        if self.state != from {
            return Err(LoopError::InvalidTransition {
                action,
                state: self.state,
            });
        }
        self.state = to;
        Ok(())
    }

    /// One display-refresh callback.
    pub fn tick(&mut self) -> Result<TickOutcome> {
        if self.state == LoopState::Disposed {
            return Ok(self.outcome(0.0, Vec::new(), None));
        }

        self.apply_commands();

        let delta = match self.state {
            LoopState::Running => {
                let delta = self.consume_clock();
                self.advance(delta);
                delta
            }
            _ => 0.0,
        };

        let events = self.bus.dispatch();
        self.cue_audio(&events);

        let frame = match self.state {
            LoopState::Running | LoopState::Paused => Some(self.render(delta, events.clone())?),
            LoopState::NotStarted | LoopState::Disposed => None,
        };
        Ok(self.outcome(delta, events, frame))
    }

    fn outcome(&self, delta: f64, events: Vec<Event>, frame: Option<Frame>) -> TickOutcome {
        TickOutcome {
            state: self.state,
            delta,
            events,
            frame,
        }
    }

    fn consume_clock(&mut self) -> f64 {
        let now = self.clock.now();
        let delta = sanitize_delta(now - self.last_time, self.config.max_frame_delta);
        if now.is_finite() {
            self.last_time = now;
        }
        trace!(delta, "frame delta");
        delta
    }

    fn advance(&mut self, delta: f64) {
        // An ended narrative is frozen; only the visuals keep moving.
        if !self.narrative.is_ended() {
            for event in self.narrative.step(delta) {
                self.bus.publish(event);
            }
        }
        let state = self.narrative.state();
        let inputs = FrameInputs {
            consciousness: state.consciousness(),
            fulfillment: state.fulfillment(),
            time_elapsed: state.time_elapsed,
            delta,
        };
        self.scene.update(&inputs);
    }

    fn apply_commands(&mut self) {
        for command in self.bus.take_commands() {
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: Command) {
        let result = match command {
            Command::Start => self.start(),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(),
            Command::MakeChoice { id } => {
                for event in self.narrative.resolve_choice(&id) {
                    self.bus.publish(event);
                }
                Ok(())
            }
            Command::DiscoverGlitch { at } => {
                let events = self.narrative.on_glitch_discovered();
                if !events.is_empty() {
                    self.scene.glitch.spawn(at);
                }
                for event in events {
                    self.bus.publish(event);
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            warn!(%err, "dropping command");
        }
    }

    fn cue_audio(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::ZoneChange { zone } => self.audio.zone_transition(*zone),
                Event::GlitchDiscovered { count } => self.audio.glitch(*count),
                Event::Ending { ending, .. } => self.audio.ending(*ending),
                Event::ChoiceMade { .. } | Event::RequestChoices => {}
            }
        }
    }

    fn render(&mut self, delta: f64, events: Vec<Event>) -> Result<Frame> {
        let frame = make_frame(
            self.frames_rendered,
            self.state,
            delta,
            &self.narrative,
            &self.scene,
            events,
        );
        self.renderer.render(&frame)?;
        self.frames_rendered += 1;
        Ok(frame)
    }
}
