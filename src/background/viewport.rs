use eframe::egui::{Context, Vec2, vec2};

/// Host viewport as reported by the window: size in points plus the pixel ratio.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub css_size: Vec2,
    pub pixel_ratio: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32, pixel_ratio: f32) -> Self {
        Self {
            css_size: vec2(width, height),
            pixel_ratio,
        }
    }

    pub fn from_context(ctx: &Context) -> Self {
        Self {
            css_size: ctx.content_rect().size(),
            pixel_ratio: ctx.pixels_per_point(),
        }
    }

    /// Backing store size in device pixels, `round(css * ratio)`.
    pub fn backing_size(self) -> [usize; 2] {
        let scaled = self.css_size * self.pixel_ratio;
        [
            scaled.x.round().max(0.0) as usize,
            scaled.y.round().max(0.0) as usize,
        ]
    }

    pub fn is_usable(self) -> bool {
        self.css_size.x.is_finite()
            && self.css_size.y.is_finite()
            && self.css_size.x >= 1.0
            && self.css_size.y >= 1.0
            && self.pixel_ratio.is_finite()
            && self.pixel_ratio > 0.0
    }
}

/// Surface dimensions shared by the physics bounds and the renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceState {
    pub viewport: Viewport,
    pub backing_size: [usize; 2],
}

impl SurfaceState {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            backing_size: viewport.backing_size(),
        }
    }

    pub fn width(&self) -> f32 {
        self.viewport.css_size.x
    }

    pub fn height(&self) -> f32 {
        self.viewport.css_size.y
    }

    pub fn pixel_ratio(&self) -> f32 {
        self.viewport.pixel_ratio
    }
}
