use serde::Serialize;

use super::{FrameInputs, Subsystem};

const GLITCH_PER_CONSCIOUSNESS: f32 = 0.5;
const BASE_WAVE_AMPLITUDE: f32 = 0.2;
const WAVE_AMPLITUDE_GAIN: f32 = 0.6;

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GridUniforms {
    pub time: f32,
    pub glitch_intensity: f32,
    pub wave_amplitude: f32,
}

/// Undulating floor grid. Glitches harder as consciousness rises.
#[derive(Debug, Default)]
pub struct GridSystem {
    uniforms: GridUniforms,
}

impl GridSystem {
    pub fn uniforms(&self) -> &GridUniforms {
        &self.uniforms
    }
}

impl Subsystem for GridSystem {
    fn update(&mut self, inputs: &FrameInputs) {
        self.uniforms.time += inputs.delta as f32;
        self.uniforms.glitch_intensity = inputs.consciousness as f32 * GLITCH_PER_CONSCIOUSNESS;
        self.uniforms.wave_amplitude =
            BASE_WAVE_AMPLITUDE + WAVE_AMPLITUDE_GAIN * inputs.fulfillment as f32;
    }

    fn dispose(&mut self) {
        self.uniforms = GridUniforms::default();
    }
}
