//! Narrative progression core of the simulation-reality art piece.
//!
//! A [`narrative::NarrativeSystem`] owns the player's progress and resolves
//! zones, choices, glitches and the ending. A
//! [`orchestrator::FrameOrchestrator`] drives it once per display frame,
//! feeds the visual subsystems in [`scene`] and hands a [`io::frame::Frame`]
//! to the renderer.

pub mod audio;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod events;
pub mod io;
pub mod message;
pub mod narrative;
pub mod orchestrator;
pub mod scene;
pub mod state;
pub mod unit;
pub mod zone;

pub use catalog::{Choice, ChoiceCatalog, Consequences};
pub use config::{ConfigError, RealityConfig};
pub use events::{Channel, Command, Event, EventBus, Outbox, SubscriptionId};
pub use narrative::NarrativeSystem;
pub use orchestrator::{FrameOrchestrator, LoopError, LoopState, Renderer, TickOutcome};
pub use state::{Ending, PlayerState, PlayerStateSnapshot, Zone};
