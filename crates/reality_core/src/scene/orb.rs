use std::f64::consts::TAU;

use serde::Serialize;

use super::{FrameInputs, Subsystem};
use crate::unit::lerp;

/// Orb color at zero fulfillment.
const COLD: [f64; 3] = [0.1, 0.4, 1.0];
/// Orb color at full fulfillment.
const WARM: [f64; 3] = [1.0, 0.75, 0.2];
const PULSE_HZ: f64 = 0.5;
const PULSE_DEPTH: f64 = 0.08;
const ORBIT_RADIUS: f64 = 0.6;
const BASE_ORBIT_SPEED: f64 = 0.2;
const ORBIT_SPEED_GAIN: f64 = 0.8;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OrbUniforms {
    pub color: [f32; 3],
    pub scale: f32,
    pub position: [f32; 3],
}

impl Default for OrbUniforms {
    fn default() -> Self {
        Self {
            color: COLD.map(|c| c as f32),
            scale: 1.0,
            position: [0.0, 1.5, 0.0],
        }
    }
}

/// Central orb: color follows fulfillment, orbit speed follows consciousness.
#[derive(Debug, Default)]
pub struct OrbSystem {
    uniforms: OrbUniforms,
    orbit_phase: f64,
}

impl OrbSystem {
    pub fn uniforms(&self) -> &OrbUniforms {
        &self.uniforms
    }
}

pub fn fulfillment_color(fulfillment: f64) -> [f32; 3] {
    [0, 1, 2].map(|i| lerp(COLD[i], WARM[i], fulfillment) as f32)
}

impl Subsystem for OrbSystem {
    fn update(&mut self, inputs: &FrameInputs) {
        let speed = BASE_ORBIT_SPEED + ORBIT_SPEED_GAIN * inputs.consciousness;
        self.orbit_phase = (self.orbit_phase + speed * inputs.delta).rem_euclid(TAU);
        let pulse = (inputs.time_elapsed * PULSE_HZ * TAU).sin();

        self.uniforms.color = fulfillment_color(inputs.fulfillment);
        self.uniforms.scale = (1.0 + PULSE_DEPTH * pulse) as f32;
        self.uniforms.position = [
            (ORBIT_RADIUS * self.orbit_phase.cos()) as f32,
            1.5,
            (ORBIT_RADIUS * self.orbit_phase.sin()) as f32,
        ];
    }

    fn dispose(&mut self) {
        self.uniforms = OrbUniforms::default();
        self.orbit_phase = 0.0;
    }
}
