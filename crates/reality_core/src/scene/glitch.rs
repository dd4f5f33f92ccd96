use serde::Serialize;

use super::{FrameInputs, Subsystem};

#[derive(Clone, Debug, PartialEq)]
pub struct GlitchMark {
    pub position: [f32; 3],
    /// Simulated seconds since the mark spawned.
    pub age: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct GlitchUniforms {
    pub active: usize,
    /// Opacity of the freshest mark.
    pub peak_opacity: f32,
}

/// Interactive glitch marks left where the player found a glitch.
///
/// Marks fade linearly over `lifetime` seconds of simulated time, so they
/// stop fading while the orchestrator is paused.
#[derive(Debug)]
pub struct GlitchSystem {
    marks: Vec<GlitchMark>,
    lifetime: f64,
}

impl GlitchSystem {
    pub fn new(lifetime: f64) -> Self {
        Self {
            marks: Vec::new(),
            lifetime,
        }
    }

    pub fn spawn(&mut self, position: [f32; 3]) {
        self.marks.push(GlitchMark { position, age: 0.0 });
    }

    pub fn marks(&self) -> &[GlitchMark] {
        &self.marks
    }

    pub fn opacity(&self, mark: &GlitchMark) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - mark.age / self.lifetime).clamp(0.0, 1.0) as f32
    }

    pub fn uniforms(&self) -> GlitchUniforms {
        GlitchUniforms {
            active: self.marks.len(),
            peak_opacity: self
                .marks
                .iter()
                .map(|mark| self.opacity(mark))
                .fold(0.0, f32::max),
        }
    }
}

impl Subsystem for GlitchSystem {
    fn update(&mut self, inputs: &FrameInputs) {
        for mark in &mut self.marks {
            mark.age += inputs.delta;
        }
        let lifetime = self.lifetime;
        self.marks.retain(|mark| mark.age < lifetime);
    }

    fn dispose(&mut self) {
        self.marks.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(system: &mut GlitchSystem, delta: f64) {
        system.update(&FrameInputs {
            delta,
            ..FrameInputs::default()
        });
    }

    #[test]
    fn marks_fade_then_expire() {
        let mut system = GlitchSystem::new(1.0);
        system.spawn([0.0, 1.0, 0.0]);
        assert_eq!(system.uniforms().peak_opacity, 1.0);

        tick(&mut system, 0.25);
        assert!((system.uniforms().peak_opacity - 0.75).abs() < 1e-6);

        tick(&mut system, 0.75);
        assert_eq!(system.uniforms(), GlitchUniforms::default());
    }

    #[test]
    fn zero_delta_holds_fade() {
        let mut system = GlitchSystem::new(1.0);
        system.spawn([0.0; 3]);
        tick(&mut system, 0.5);
        for _ in 0..10 {
            tick(&mut system, 0.0);
        }
        assert!((system.uniforms().peak_opacity - 0.5).abs() < 1e-6);
    }
}
