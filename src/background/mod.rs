mod canvas;
mod grid;
mod particles;
mod physics;
mod proximity;
mod scheduler;
mod viewport;

use rand::Rng;

use crate::config::RenderConfig;

pub use canvas::PixelSurface;
pub use scheduler::{HostEvents, SchedulerState};
pub use viewport::Viewport;

use particles::{Particle, ParticleStore};
use physics::step_particles;
use proximity::{FrameStats, ProximityRenderer};
use scheduler::{FrameScheduler, TickId};
use viewport::SurfaceState;

/// The particle plexus painted behind the host's content.
///
/// One value is one mount: it owns the particles, the backing store and the
/// host registrations. [`AnimatedBackground::stop`] (or dropping it) ends the
/// mount; a new configuration means mounting a new one.
pub struct AnimatedBackground {
    config: RenderConfig,
    scheduler: FrameScheduler,
    scene: Option<Scene>,
}

struct Scene {
    surface: SurfaceState,
    canvas: PixelSurface,
    particles: ParticleStore,
    renderer: ProximityRenderer,
    max_texture_side: usize,
    last_stats: FrameStats,
}

impl AnimatedBackground {
    /// Seeds the particles for `viewport` and starts the frame loop.
    ///
    /// When no backing store can be created for the viewport the background
    /// is inert: it registers nothing with the host and never draws.
    pub fn mount(
        config: RenderConfig,
        viewport: Viewport,
        max_texture_side: usize,
        events: &HostEvents,
        rng: &mut impl Rng,
    ) -> Self {
        let canvas = match PixelSurface::new(viewport, max_texture_side) {
            Ok(canvas) => canvas,
            Err(error) => {
                log::warn!("animated background disabled: {error:#}");
                return Self {
                    config,
                    scheduler: FrameScheduler::stopped(events),
                    scene: None,
                };
            }
        };

        let surface = SurfaceState::new(viewport);
        let particles =
            ParticleStore::initialize(surface.width(), surface.height(), config.density, rng);
        log::info!(
            "mounted animated background: {} particles on {}x{} points ({}x{} px), {:?} neighbor search",
            particles.len(),
            surface.width(),
            surface.height(),
            surface.backing_size[0],
            surface.backing_size[1],
            config.neighbor_search,
        );

        Self {
            config,
            scheduler: FrameScheduler::start(events),
            scene: Some(Scene {
                surface,
                canvas,
                particles,
                renderer: ProximityRenderer::default(),
                max_texture_side,
                last_stats: FrameStats::default(),
            }),
        }
    }

    /// Runs one frame if `tick` is the one this mount asked for. Returns whether it drew.
    pub fn tick(&mut self, tick: TickId) -> bool {
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };
        if !self.scheduler.begin_tick(tick) {
            return false;
        }

        step_particles(scene.particles.particles_mut(), &scene.surface);
        scene.last_stats = scene.renderer.render(
            scene.particles.particles(),
            &scene.surface,
            &self.config,
            &mut scene.canvas,
        );
        scene.canvas.mark_dirty();
        log::trace!(
            "tick {}: {} lines between {} particles",
            self.scheduler.ticks(),
            scene.last_stats.lines,
            scene.last_stats.particles
        );

        self.scheduler.request_next();
        true
    }

    /// Adopts a new viewport. Particles keep their positions and velocities.
    ///
    /// Returns `false` when the viewport was not adopted: the mount is stopped
    /// or inert, or the surface cannot take the new size.
    pub fn resize(&mut self, viewport: Viewport) -> bool {
        if self.scheduler.state() == SchedulerState::Stopped {
            return false;
        }
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };

        if let Err(error) = scene.canvas.resize(viewport, scene.max_texture_side) {
            log::warn!("ignoring resize to {:?}: {error:#}", viewport.css_size);
            return false;
        }
        scene.surface = SurfaceState::new(viewport);
        log::debug!(
            "background resized to {}x{} points at ratio {} ({}x{} px)",
            scene.surface.width(),
            scene.surface.height(),
            scene.surface.pixel_ratio(),
            scene.surface.backing_size[0],
            scene.surface.backing_size[1],
        );
        true
    }

    /// Ends the mount. Safe to call any number of times.
    pub fn stop(&mut self) {
        if self.scheduler.stop() {
            log::info!(
                "stopped animated background after {} ticks",
                self.scheduler.ticks()
            );
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    pub fn is_inert(&self) -> bool {
        self.scene.is_none()
    }

    pub fn ticks(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn surface(&self) -> Option<&PixelSurface> {
        self.scene.as_ref().map(|scene| &scene.canvas)
    }

    pub fn surface_state(&self) -> Option<&SurfaceState> {
        self.scene.as_ref().map(|scene| &scene.surface)
    }

    pub fn particles(&self) -> &[Particle] {
        self.scene
            .as_ref()
            .map(|scene| scene.particles.particles())
            .unwrap_or_default()
    }

    pub fn last_stats(&self) -> FrameStats {
        self.scene
            .as_ref()
            .map_or_else(FrameStats::default, |scene| scene.last_stats)
    }
}

impl Drop for AnimatedBackground {
    fn drop(&mut self) {
        self.stop();
    }
}
