use eframe::egui::{Pos2, Rect, pos2};

use crate::config::{NeighborSearch, RenderConfig, Rgb};

use super::canvas::Canvas;
use super::grid::UniformGrid;
use super::particles::Particle;
use super::viewport::SurfaceState;

pub const TRAIL_ALPHA: f32 = 0.05;
pub const LINE_MAX_ALPHA: f32 = 0.15;
pub const LINE_WIDTH: f32 = 0.3;
pub const DOT_ALPHA: f32 = 0.4;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub particles: usize,
    pub lines: usize,
}

pub(super) fn distance(a: Pos2, b: Pos2) -> f32 {
    (a - b).length()
}

/// Stroke opacity for a pair at `distance`, or `None` when it is not connected.
pub fn line_opacity(distance: f32, threshold: f32) -> Option<f32> {
    (distance < threshold).then(|| (1.0 - distance / threshold) * LINE_MAX_ALPHA)
}

/// Paints one frame: trail overlay, then per particle its outgoing lines and its dot.
#[derive(Default)]
pub(super) struct ProximityRenderer {
    grid: UniformGrid,
    neighbors: Vec<(usize, f32)>,
}

impl ProximityRenderer {
    pub(super) fn render(
        &mut self,
        particles: &[Particle],
        surface: &SurfaceState,
        config: &RenderConfig,
        canvas: &mut impl Canvas,
    ) -> FrameStats {
        let bounds = Rect::from_min_max(pos2(0.0, 0.0), pos2(surface.width(), surface.height()));
        canvas.fill_rect(bounds, Rgb::BLACK, TRAIL_ALPHA);

        let threshold = config.connection_distance;
        if config.neighbor_search == NeighborSearch::Grid {
            self.grid
                .rebuild(particles, surface.width(), surface.height(), threshold);
        }

        let mut lines = 0;
        for (index, particle) in particles.iter().enumerate() {
            match config.neighbor_search {
                NeighborSearch::Pairwise => {
                    self.neighbors.clear();
                    for (other, candidate) in particles.iter().enumerate().skip(index + 1) {
                        let distance = distance(particle.position, candidate.position);
                        if distance < threshold {
                            self.neighbors.push((other, distance));
                        }
                    }
                }
                NeighborSearch::Grid => {
                    self.grid
                        .neighbors_after(index, particles, threshold, &mut self.neighbors);
                }
            }

            for &(other, distance) in &self.neighbors {
                let Some(opacity) = line_opacity(distance, threshold) else {
                    continue;
                };
                canvas.stroke_line(
                    particle.position,
                    particles[other].position,
                    LINE_WIDTH,
                    config.line_color,
                    opacity,
                );
                lines += 1;
            }

            canvas.fill_circle(
                particle.position,
                particle.radius,
                config.dot_color,
                DOT_ALPHA,
            );
        }

        FrameStats {
            particles: particles.len(),
            lines,
        }
    }
}
