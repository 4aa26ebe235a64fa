use eframe::egui::{Pos2, Vec2, pos2, vec2};
use rand::Rng;

/// Surface area, in square points, that one particle accounts for at density 1.
pub const AREA_PER_PARTICLE: f32 = 15_000.0;
pub const MAX_SPEED: f32 = 0.15;
pub const MIN_RADIUS: f32 = 0.5;
pub const MAX_RADIUS: f32 = 1.2;
pub const MAX_PARTICLES: usize = 5_000;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    pub position: Pos2,
    pub velocity: Vec2,
    pub radius: f32,
}

pub fn particle_count(width: f32, height: f32, density: f32) -> usize {
    let count = (width * height / AREA_PER_PARTICLE * density).floor();
    // NaN fails the comparison; an overflowed count saturates and is capped later.
    if count > 0.0 { count as usize } else { 0 }
}

/// Owns every particle of one mount. Only replaced by remounting.
#[derive(Clone, Debug, Default)]
pub struct ParticleStore {
    particles: Vec<Particle>,
}

impl ParticleStore {
    pub fn initialize(width: f32, height: f32, density: f32, rng: &mut impl Rng) -> Self {
        let mut count = particle_count(width, height, density);
        if count > MAX_PARTICLES {
            log::warn!(
                "{count} particles requested for {width}x{height} at density {density}, capping at {MAX_PARTICLES}"
            );
            count = MAX_PARTICLES;
        }

        let mut particles = Vec::with_capacity(count);
        for _ in 0..count {
            particles.push(Particle {
                position: pos2(rng.r#gen::<f32>() * width, rng.r#gen::<f32>() * height),
                velocity: vec2(
                    (rng.r#gen::<f32>() - 0.5) * (MAX_SPEED * 2.0),
                    (rng.r#gen::<f32>() - 0.5) * (MAX_SPEED * 2.0),
                ),
                radius: MIN_RADIUS + rng.r#gen::<f32>() * (MAX_RADIUS - MIN_RADIUS),
            });
        }

        Self { particles }
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

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }
}
