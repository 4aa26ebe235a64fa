use std::sync::Arc;

use eframe::egui::{Color32, Context, LayerId, Rect, TextureHandle, TextureOptions, pos2};

use crate::background::PixelSurface;

/// GPU copy of the background's backing store, painted under every panel.
#[derive(Default)]
pub(super) struct Backdrop {
    texture: Option<TextureHandle>,
    uploaded_revision: Option<u64>,
}

impl Backdrop {
    pub(super) fn sync(&mut self, ctx: &Context, surface: &PixelSurface) {
        if self.uploaded_revision == Some(surface.revision()) {
            return;
        }

        // Shares the backing store; the texture delta releases it once painted.
        let image = Arc::clone(surface.image());
        match self.texture.as_mut() {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture =
                    Some(ctx.load_texture("animated-background", image, TextureOptions::LINEAR));
            }
        }
        self.uploaded_revision = Some(surface.revision());
    }

    pub(super) fn clear(&mut self) {
        self.texture = None;
        self.uploaded_revision = None;
    }

    pub(super) fn paint(&self, ctx: &Context) {
        let painter = ctx.layer_painter(LayerId::background());
        let rect = ctx.content_rect();
        painter.rect_filled(rect, 0.0, Color32::BLACK);

        if let Some(texture) = &self.texture {
            painter.image(
                texture.id(),
                rect,
                Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
                Color32::WHITE,
            );
        }
    }
}

