use std::sync::Arc;

use anyhow::{Result, bail, ensure};
use eframe::egui::{Color32, ColorImage, Pos2, Rect, Vec2};

use crate::config::Rgb;

use super::viewport::Viewport;

/// Drawing primitives in CSS-space coordinates.
pub trait Canvas {
    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32);
    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Rgb, alpha: f32);
    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Rgb, alpha: f32);
}

/// Persistent backing store at device resolution.
///
/// Pixels survive between frames, which is what makes the translucent
/// overlay read as trails. Everything drawn is scaled by the pixel ratio.
///
/// The store is the texture image itself. Uploading shares it through the
/// `Arc`; drawing writes in place once the uploaded copy has been released.
pub struct PixelSurface {
    scale: f32,
    image: Arc<ColorImage>,
    revision: u64,
}

impl PixelSurface {
    pub fn new(viewport: Viewport, max_side: usize) -> Result<Self> {
        let size = Self::checked_size(viewport, max_side)?;
        Ok(Self {
            scale: viewport.pixel_ratio,
            image: Arc::new(ColorImage::filled(size, Color32::BLACK)),
            revision: 0,
        })
    }

    fn checked_size(viewport: Viewport, max_side: usize) -> Result<[usize; 2]> {
        ensure!(
            viewport.is_usable(),
            "viewport {:?} at ratio {} cannot back a drawing surface",
            viewport.css_size,
            viewport.pixel_ratio
        );

        let size = viewport.backing_size();
        if size[0] == 0 || size[1] == 0 {
            bail!("backing store would be empty ({}x{})", size[0], size[1]);
        }
        if size[0] > max_side || size[1] > max_side {
            bail!(
                "backing store {}x{} exceeds the maximum texture side {max_side}",
                size[0],
                size[1]
            );
        }
        Ok(size)
    }

    /// Reallocates the backing store, clearing it. On failure the old store is kept.
    pub fn resize(&mut self, viewport: Viewport, max_side: usize) -> Result<()> {
        let size = Self::checked_size(viewport, max_side)?;
        self.scale = viewport.pixel_ratio;
        if size != self.size() {
            self.image = Arc::new(ColorImage::filled(size, Color32::BLACK));
        } else {
            self.pixels_mut().fill(Color32::BLACK);
        }
        self.revision += 1;
        Ok(())
    }

    pub fn size(&self) -> [usize; 2] {
        self.image.size
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Bumped whenever the pixel contents change.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.revision += 1;
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color32 {
        self.image.pixels[y * self.image.size[0] + x]
    }

    /// The backing store as an uploadable image.
    pub fn image(&self) -> &Arc<ColorImage> {
        &self.image
    }

    // Copies only while a previous upload still holds the image.
    fn pixels_mut(&mut self) -> &mut [Color32] {
        &mut Arc::make_mut(&mut self.image).pixels
    }

    /// Pixel span `[start, end)` covering `[min, max]` in device units.
    fn span(min: f32, max: f32, limit: usize) -> (usize, usize) {
        let start = min.floor().max(0.0);
        let end = max.ceil().min(limit as f32);
        if start >= end {
            return (0, 0);
        }
        (start as usize, end as usize)
    }
}

/// Source-over blend of an opaque `color` (0-255 channels) onto `pixel`.
fn blend(pixel: &mut Color32, color: [f32; 3], amount: f32) {
    let amount = amount.clamp(0.0, 1.0);
    if amount <= 0.0 {
        return;
    }
    let inverse = 1.0 - amount;
    let mix =
        |channel: u8, source: f32| (f32::from(channel) * inverse + source * amount).round() as u8;
    *pixel = Color32::from_rgb(
        mix(pixel.r(), color[0]),
        mix(pixel.g(), color[1]),
        mix(pixel.b(), color[2]),
    );
}

fn segment_distance(point: Vec2, from: Vec2, to: Vec2) -> f32 {
    let segment = to - from;
    let length_sq = segment.length_sq();
    if length_sq <= f32::EPSILON {
        return (point - from).length();
    }
    let t = ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0);
    (point - (from + segment * t)).length()
}

impl Canvas for PixelSurface {
    fn fill_rect(&mut self, rect: Rect, color: Rgb, alpha: f32) {
        let [width, height] = self.size();
        let (x0, x1) = Self::span(rect.min.x * self.scale, rect.max.x * self.scale, width);
        let (y0, y1) = Self::span(rect.min.y * self.scale, rect.max.y * self.scale, height);
        if x0 == x1 || y0 == y1 {
            return;
        }
        let color = color.channels();
        let pixels = self.pixels_mut();
        for y in y0..y1 {
            for pixel in &mut pixels[y * width + x0..y * width + x1] {
                blend(pixel, color, alpha);
            }
        }
    }

    fn stroke_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Rgb, alpha: f32) {
        let [surface_width, surface_height] = self.size();
        let from = from.to_vec2() * self.scale;
        let to = to.to_vec2() * self.scale;
        let width = width * self.scale;
        let half_width = width * 0.5;
        let max_coverage = width.min(1.0);
        let reach = half_width + 1.0;
        let color = color.channels();

        let delta = to - from;
        let steep = delta.y.abs() > delta.x.abs();
        // Walk the major axis and only test a narrow band around the line.
        let (major_from, major_to) = if steep { (from.y, to.y) } else { (from.x, to.x) };
        let (major_min, major_max) = (major_from.min(major_to), major_from.max(major_to));
        let major_limit = if steep { surface_height } else { surface_width };
        let minor_limit = if steep { surface_width } else { surface_height };
        let (start, end) = Self::span(major_min - reach, major_max + reach, major_limit);
        if start == end {
            return;
        }

        let pixels = self.pixels_mut();
        for major in start..end {
            let center = major as f32 + 0.5;
            let t = if (major_to - major_from).abs() <= f32::EPSILON {
                0.0
            } else {
                ((center - major_from) / (major_to - major_from)).clamp(0.0, 1.0)
            };
            let minor_center = if steep {
                from.x + delta.x * t
            } else {
                from.y + delta.y * t
            };
            let (minor_start, minor_end) =
                Self::span(minor_center - reach, minor_center + reach, minor_limit);

            for minor in minor_start..minor_end {
                let (x, y) = if steep { (minor, major) } else { (major, minor) };
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let distance = segment_distance(sample, from, to);
                let coverage = (half_width + 0.5 - distance).clamp(0.0, max_coverage);
                if coverage > 0.0 {
                    blend(&mut pixels[y * surface_width + x], color, alpha * coverage);
                }
            }
        }
    }

    fn fill_circle(&mut self, center: Pos2, radius: f32, color: Rgb, alpha: f32) {
        let [width, height] = self.size();
        let center = center.to_vec2() * self.scale;
        let radius = radius * self.scale;
        let reach = radius + 1.0;
        let (x0, x1) = Self::span(center.x - reach, center.x + reach, width);
        let (y0, y1) = Self::span(center.y - reach, center.y + reach, height);
        if x0 == x1 || y0 == y1 {
            return;
        }
        let color = color.channels();
        // Sub-pixel discs never cover more than their own area.
        let max_coverage = (std::f32::consts::PI * radius * radius).min(1.0);

        let pixels = self.pixels_mut();
        for y in y0..y1 {
            for x in x0..x1 {
                let sample = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let distance = (sample - center).length();
                let coverage = (radius + 0.5 - distance).clamp(0.0, max_coverage);
                if coverage > 0.0 {
                    blend(&mut pixels[y * width + x], color, alpha * coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use eframe::egui::pos2;

    use super::*;

    fn surface(width: f32, height: f32, ratio: f32) -> PixelSurface {
        PixelSurface::new(Viewport::new(width, height, ratio), 8192).unwrap()
    }

    fn lit(surface: &PixelSurface) -> usize {
        surface
            .image()
            .pixels
            .iter()
            .filter(|pixel| pixel.r() > 0)
            .count()
    }

    fn grey(value: u8) -> Color32 {
        Color32::from_rgb(value, value, value)
    }

    #[test]
    fn creation_fails_for_unusable_surfaces() {
        assert!(PixelSurface::new(Viewport::new(0.0, 100.0, 1.0), 8192).is_err());
        assert!(PixelSurface::new(Viewport::new(100.0, 100.0, f32::NAN), 8192).is_err());
        assert!(PixelSurface::new(Viewport::new(5000.0, 100.0, 2.0), 8192).is_err());
        assert_eq!(surface(100.0, 50.0, 2.0).size(), [200, 100]);
    }

    #[test]
    fn new_surface_is_opaque_black() {
        let canvas = surface(3.0, 2.0, 1.0);
        assert_eq!(canvas.image().size, [3, 2]);
        assert_eq!(canvas.image().pixels, vec![Color32::BLACK; 6]);
    }

    #[test]
    fn overlay_fades_towards_its_colour() {
        let mut canvas = surface(4.0, 4.0, 1.0);
        let bounds = Rect::from_min_max(pos2(0.0, 0.0), pos2(4.0, 4.0));
        canvas.fill_rect(bounds, Rgb::WHITE, 1.0);
        canvas.fill_rect(bounds, Rgb::BLACK, 0.05);
        // 255 * 0.95 = 242.25
        assert!(canvas.image().pixels.iter().all(|&pixel| pixel == grey(242)));
    }

    #[test]
    fn rect_is_scaled_by_pixel_ratio() {
        let mut canvas = surface(10.0, 10.0, 2.0);
        canvas.fill_rect(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Rgb::WHITE,
            1.0,
        );
        assert_eq!(lit(&canvas), 4);
        assert_eq!(canvas.pixel(1, 1), Color32::WHITE);
        assert_eq!(canvas.pixel(2, 2), Color32::BLACK);
    }

    #[test]
    fn colour_channels_blend_independently() {
        let mut canvas = surface(2.0, 2.0, 1.0);
        canvas.fill_rect(
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Rgb::new(200, 100, 0),
            0.5,
        );
        assert_eq!(canvas.pixel(0, 0), Color32::from_rgb(100, 50, 0));
        assert_eq!(canvas.pixel(1, 0), Color32::BLACK);
    }

    #[test]
    fn line_covers_pixels_along_its_path_only() {
        let mut canvas = surface(50.0, 50.0, 1.0);
        canvas.stroke_line(pos2(5.5, 10.5), pos2(40.5, 10.5), 1.0, Rgb::WHITE, 1.0);
        for x in 6..40 {
            assert!(canvas.pixel(x, 10).r() > 229);
        }
        assert_eq!(canvas.pixel(20, 20), Color32::BLACK);
        assert_eq!(canvas.pixel(45, 10), Color32::BLACK);
    }

    #[test]
    fn thin_line_is_faint() {
        let mut canvas = surface(50.0, 50.0, 1.0);
        canvas.stroke_line(pos2(5.5, 5.5), pos2(40.5, 40.5), 0.3, Rgb::WHITE, 1.0);
        let brightest = canvas
            .image()
            .pixels
            .iter()
            .map(|pixel| pixel.r())
            .max()
            .unwrap_or(0);
        assert!(brightest > 0);
        assert!(brightest <= 77);
    }

    #[test]
    fn circle_is_centred_and_clipped() {
        let mut canvas = surface(20.0, 20.0, 1.0);
        canvas.fill_circle(pos2(10.0, 10.0), 3.0, Rgb::WHITE, 1.0);
        assert_eq!(canvas.pixel(10, 10), Color32::WHITE);
        assert_eq!(canvas.pixel(0, 0), Color32::BLACK);

        canvas.fill_circle(pos2(-0.5, 19.5), 2.0, Rgb::WHITE, 1.0);
        assert!(canvas.pixel(0, 19).r() > 0);
    }

    #[test]
    fn drawing_off_surface_is_ignored() {
        let mut canvas = surface(20.0, 20.0, 1.0);
        canvas.fill_circle(pos2(-100.0, -100.0), 2.0, Rgb::WHITE, 1.0);
        canvas.stroke_line(pos2(-50.0, 40.0), pos2(-10.0, 80.0), 1.0, Rgb::WHITE, 1.0);
        canvas.fill_rect(
            Rect::from_min_max(pos2(30.0, 30.0), pos2(40.0, 40.0)),
            Rgb::WHITE,
            1.0,
        );
        assert_eq!(lit(&canvas), 0);
    }

    #[test]
    fn resize_reallocates_and_keeps_old_store_on_failure() {
        let mut canvas = surface(10.0, 10.0, 1.0);
        canvas.fill_circle(pos2(5.0, 5.0), 2.0, Rgb::WHITE, 1.0);
        let before = canvas.revision();

        canvas.resize(Viewport::new(20.0, 10.0, 1.5), 8192).unwrap();
        assert_eq!(canvas.size(), [30, 15]);
        assert_eq!(canvas.scale(), 1.5);
        assert_eq!(lit(&canvas), 0);
        assert!(canvas.revision() > before);

        assert!(canvas.resize(Viewport::new(0.0, 0.0, 1.0), 8192).is_err());
        assert_eq!(canvas.size(), [30, 15]);
    }

    #[test]
    fn same_size_resize_clears_in_place() {
        let mut canvas = surface(10.0, 10.0, 1.0);
        canvas.fill_circle(pos2(5.0, 5.0), 2.0, Rgb::WHITE, 1.0);
        let buffer = canvas.image().pixels.as_ptr();

        canvas.resize(Viewport::new(10.0, 10.0, 1.0), 8192).unwrap();
        assert_eq!(lit(&canvas), 0);
        assert_eq!(canvas.image().pixels.as_ptr(), buffer);
    }

    #[test]
    fn frames_draw_into_the_same_buffer_after_upload() {
        let mut canvas = surface(320.0, 200.0, 2.0);
        let buffer = canvas.image().pixels.as_ptr();
        let bounds = Rect::from_min_max(pos2(0.0, 0.0), pos2(320.0, 200.0));

        for frame in 0..5 {
            // The texture upload holds a clone until the frame is painted.
            let uploaded = Arc::clone(canvas.image());
            drop(uploaded);

            canvas.fill_rect(bounds, Rgb::BLACK, 0.05);
            canvas.stroke_line(pos2(10.0, 10.0), pos2(90.0, 60.0), 0.3, Rgb::WHITE, 0.15);
            canvas.fill_circle(pos2(50.0, 50.0), 1.0, Rgb::WHITE, 0.4);
            canvas.mark_dirty();
            assert_eq!(canvas.image().pixels.as_ptr(), buffer, "frame {frame}");
        }
    }

    #[test]
    fn pending_upload_keeps_its_snapshot() {
        let mut canvas = surface(10.0, 10.0, 1.0);
        let uploaded = Arc::clone(canvas.image());

        canvas.fill_circle(pos2(5.0, 5.0), 2.0, Rgb::WHITE, 1.0);
        assert_eq!(uploaded.pixels[5 * 10 + 5], Color32::BLACK);
        assert_eq!(canvas.pixel(5, 5), Color32::WHITE);
    }
}
