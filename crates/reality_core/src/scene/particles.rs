use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_seeder::Seeder;

use super::{FrameInputs, Subsystem};

/// Half-extent of the particle volume on the x and z axes.
pub const HALF_WIDTH: f32 = 10.0;
pub const FLOOR: f32 = 0.0;
pub const CEILING: f32 = 8.0;

const BASE_SPEED: f32 = 0.3;
const SPEED_GAIN: f32 = 1.7;

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub position: [f32; 3],
    pub velocity: [f32; 3],
}

/// Fixed pool of drifting motes. Drift speed scales with consciousness.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: ChaCha8Rng,
}

impl ParticleSystem {
    pub fn new(count: usize, seed: &str) -> Self {
        let mut rng: ChaCha8Rng = Seeder::from(seed).make_rng();
        let particles = (0..count).map(|_| spawn(&mut rng)).collect();
        Self { particles, rng }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }
}

fn spawn(rng: &mut ChaCha8Rng) -> Particle {
    Particle {
        position: [
            rng.gen_range(-HALF_WIDTH..HALF_WIDTH),
            rng.gen_range(FLOOR..CEILING),
            rng.gen_range(-HALF_WIDTH..HALF_WIDTH),
        ],
        velocity: [
            rng.gen_range(-0.1..0.1),
            rng.gen_range(0.2..1.0),
            rng.gen_range(-0.1..0.1),
        ],
    }
}

fn wrap_horizontal(value: f32) -> f32 {
    (value + HALF_WIDTH).rem_euclid(2.0 * HALF_WIDTH) - HALF_WIDTH
}

impl Subsystem for ParticleSystem {
    fn update(&mut self, inputs: &FrameInputs) {
        let speed = BASE_SPEED + SPEED_GAIN * inputs.consciousness as f32;
        let step = speed * inputs.delta as f32;
        for particle in &mut self.particles {
            for axis in 0..3 {
                particle.position[axis] += particle.velocity[axis] * step;
            }
            particle.position[0] = wrap_horizontal(particle.position[0]);
            particle.position[2] = wrap_horizontal(particle.position[2]);
            if particle.position[1] >= CEILING {
                particle.position[0] = self.rng.gen_range(-HALF_WIDTH..HALF_WIDTH);
                particle.position[1] = FLOOR;
                particle.position[2] = self.rng.gen_range(-HALF_WIDTH..HALF_WIDTH);
            }
        }
    }

    fn dispose(&mut self) {
        self.particles.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn in_bounds(particle: &Particle) -> bool {
        let [x, y, z] = particle.position;
        (-HALF_WIDTH..=HALF_WIDTH).contains(&x)
            && (FLOOR..CEILING).contains(&y)
            && (-HALF_WIDTH..=HALF_WIDTH).contains(&z)
    }

    #[test]
    fn same_seed_same_particles() {
        let a = ParticleSystem::new(16, "seed");
        let b = ParticleSystem::new(16, "seed");
        let c = ParticleSystem::new(16, "other");
        assert_eq!(a.particles(), b.particles());
        assert_ne!(a.particles(), c.particles());
    }

    #[test]
    fn particles_stay_inside_volume() {
        let mut system = ParticleSystem::new(64, "bounds");
        for _ in 0..2_000 {
            system.update(&FrameInputs {
                consciousness: 1.0,
                fulfillment: 0.0,
                time_elapsed: 0.0,
                delta: 0.05,
            });
        }
        assert_eq!(system.len(), 64);
        assert!(system.particles().iter().all(in_bounds));
    }

    #[test]
    fn zero_delta_freezes_motion() {
        let mut system = ParticleSystem::new(8, "frozen");
        let before = system.particles().to_vec();
        system.update(&FrameInputs {
            consciousness: 1.0,
            ..FrameInputs::default()
        });
        assert_eq!(system.particles(), before.as_slice());
    }

    #[test]
    fn dispose_releases_pool() {
        let mut system = ParticleSystem::new(8, "dispose");
        system.dispose();
        system.dispose();
        assert!(system.is_empty());
    }
}
