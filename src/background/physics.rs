use super::particles::Particle;
use super::viewport::SurfaceState;

/// Advances every particle by one tick and turns it back at the surface edges.
///
/// Positions are never clamped: a particle can sit past an edge for one tick
/// before its velocity points back inside.
pub(super) fn step_particles(particles: &mut [Particle], surface: &SurfaceState) {
    let width = surface.width();
    let height = surface.height();

    for particle in particles {
        particle.position += particle.velocity;

        if particle.position.x < 0.0 {
            particle.velocity.x = particle.velocity.x.abs();
        } else if particle.position.x > width {
            particle.velocity.x = -particle.velocity.x.abs();
        }

        if particle.position.y < 0.0 {
            particle.velocity.y = particle.velocity.y.abs();
        } else if particle.position.y > height {
            particle.velocity.y = -particle.velocity.y.abs();
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use eframe::egui::{pos2, vec2};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::super::particles::{MAX_SPEED, ParticleStore};
    use super::super::viewport::Viewport;
    use super::*;

    fn surface(width: f32, height: f32) -> SurfaceState {
        SurfaceState::new(Viewport::new(width, height, 1.0))
    }

    fn particle(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
        Particle {
            position: pos2(x, y),
            velocity: vec2(vx, vy),
            radius: 1.0,
        }
    }

    #[test]
    fn interior_particle_moves_by_velocity() {
        let mut particles = [particle(100.0, 200.0, 0.1, -0.05)];
        step_particles(&mut particles, &surface(800.0, 600.0));
        assert_relative_eq!(particles[0].position.x, 100.1, epsilon = 1e-4);
        assert_relative_eq!(particles[0].position.y, 199.95, epsilon = 1e-4);
        assert_eq!(particles[0].velocity, vec2(0.1, -0.05));
    }

    #[test]
    fn overshooting_right_edge_flips_vx_without_clamping() {
        let mut particles = [particle(799.9, 100.0, 0.3, 0.0)];
        step_particles(&mut particles, &surface(800.0, 600.0));
        assert_relative_eq!(particles[0].position.x, 800.2, epsilon = 1e-3);
        assert!(particles[0].position.x > 800.0);
        assert_eq!(particles[0].velocity.x, -0.3);
        assert_eq!(particles[0].velocity.y, 0.0);
    }

    #[test]
    fn particle_past_edge_heading_out_is_reflected() {
        let mut particles = [particle(800.01, 300.0, 0.1, 0.0)];
        step_particles(&mut particles, &surface(800.0, 600.0));
        assert!(particles[0].velocity.x < 0.0);
    }

    #[test]
    fn axes_reflect_independently() {
        let mut particles = [particle(0.05, 599.95, -0.1, 0.1)];
        step_particles(&mut particles, &surface(800.0, 600.0));
        assert_eq!(particles[0].velocity, vec2(0.1, -0.1));

        let mut particles = [particle(400.0, 0.05, 0.1, -0.1)];
        step_particles(&mut particles, &surface(800.0, 600.0));
        assert_eq!(particles[0].velocity, vec2(0.1, 0.1));
    }

    #[test]
    fn particle_left_outside_by_shrink_drifts_back() {
        let mut particles = [particle(900.0, 300.0, -0.15, 0.0)];
        let bounds = surface(800.0, 600.0);
        for _ in 0..2_000 {
            step_particles(&mut particles, &bounds);
        }
        assert!(particles[0].position.x <= 800.0 + MAX_SPEED);
    }

    #[test]
    fn overshoot_stays_within_one_step() {
        let bounds = surface(640.0, 360.0);
        let mut store = ParticleStore::initialize(640.0, 360.0, 3.0, &mut StdRng::seed_from_u64(9));
        assert!(!store.is_empty());

        let slack = MAX_SPEED + 1e-3;
        for _ in 0..10_000 {
            step_particles(store.particles_mut(), &bounds);
            for particle in store.particles() {
                assert!(particle.position.x >= -slack && particle.position.x <= 640.0 + slack);
                assert!(particle.position.y >= -slack && particle.position.y <= 360.0 + slack);
            }
        }
    }
}
