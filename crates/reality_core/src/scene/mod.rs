//! Per-frame models of the visual subsystems.
//!
//! Each subsystem owns the uniform values a renderer would upload and
//! advances them from the scalars the orchestrator hands it. Nothing here
//! keeps a reference to narrative state between frames.

pub mod glitch;
pub mod grid;
pub mod orb;
pub mod particles;

use serde::Serialize;

use crate::config::OrchestratorConfig;

pub use glitch::{GlitchSystem, GlitchUniforms};
pub use grid::{GridSystem, GridUniforms};
pub use orb::{OrbSystem, OrbUniforms};
pub use particles::ParticleSystem;

/// Values derived from narrative state for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameInputs {
    pub consciousness: f64,
    pub fulfillment: f64,
    pub time_elapsed: f64,
    /// Simulated seconds since the previous update.
    pub delta: f64,
}

pub trait Subsystem {
    fn update(&mut self, inputs: &FrameInputs);

    /// Release everything the subsystem holds. Must be idempotent.
    fn dispose(&mut self);
}

/// Uniform values of the whole scene, as consumed by a renderer.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SceneUniforms {
    pub grid: GridUniforms,
    pub orb: OrbUniforms,
    pub glitch: GlitchUniforms,
    pub particles: usize,
}

#[derive(Debug)]
pub struct Scene {
    pub grid: GridSystem,
    pub orb: OrbSystem,
    pub particles: ParticleSystem,
    pub glitch: GlitchSystem,
}

impl Scene {
    pub fn new(config: &OrchestratorConfig) -> Self {
        Self {
            grid: GridSystem::default(),
            orb: OrbSystem::default(),
            particles: ParticleSystem::new(config.particle_count, &config.rng_seed),
            glitch: GlitchSystem::new(config.glitch_lifetime),
        }
    }

    /// Update subsystems in draw order.
    pub fn update(&mut self, inputs: &FrameInputs) {
        let systems: [&mut dyn Subsystem; 4] = [
            &mut self.grid,
            &mut self.orb,
            &mut self.particles,
            &mut self.glitch,
        ];
        for system in systems {
            system.update(inputs);
        }
    }

    pub fn dispose(&mut self) {
        self.grid.dispose();
        self.orb.dispose();
        self.particles.dispose();
        self.glitch.dispose();
    }

    pub fn uniforms(&self) -> SceneUniforms {
        SceneUniforms {
            grid: self.grid.uniforms().clone(),
            orb: self.orb.uniforms().clone(),
            glitch: self.glitch.uniforms(),
            particles: self.particles.len(),
        }
    }
}
