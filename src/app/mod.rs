use eframe::egui::Context;
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::background::{HostEvents, Viewport};
use crate::config::RenderConfig;

mod backdrop;
mod host;
mod ui;

use backdrop::Backdrop;
use host::{FrameOutcome, Host};
use ui::FpsCounter;

/// Window host: mounts the animated background and draws its content on top.
pub struct PlexusApp {
    host: Host,
    backdrop: Backdrop,
    fps: FpsCounter,
}

impl PlexusApp {
    pub fn new(cc: &eframe::CreationContext<'_>, config: RenderConfig, seed: Option<u64>) -> Self {
        let repaint_ctx = cc.egui_ctx.clone();
        let events = HostEvents::new(move || repaint_ctx.request_repaint());
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Self {
            host: Host::new(config, rng, events),
            backdrop: Backdrop::default(),
            fps: FpsCounter::default(),
        }
    }

    fn max_texture_side(ctx: &Context) -> usize {
        ctx.input(|input| input.max_texture_side)
    }

    fn pump_host_events(&mut self, ctx: &Context) {
        let outcome = self
            .host
            .pump(Viewport::from_context(ctx), Self::max_texture_side(ctx));
        if outcome == FrameOutcome::Mounted {
            self.backdrop.clear();
        }

        if let Some(surface) = self.host.surface() {
            self.backdrop.sync(ctx, surface);
        }
    }
}

impl eframe::App for PlexusApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        self.fps.update(ctx);
        self.pump_host_events(ctx);
        self.backdrop.paint(ctx);

        let mut action = None;
        ui::show_overlay(
            ctx,
            self.host.background(),
            self.host.config(),
            &self.fps,
            &mut action,
        );

        match action {
            Some(ui::OverlayAction::Remount) => {
                self.host
                    .remount(Viewport::from_context(ctx), Self::max_texture_side(ctx));
                self.backdrop.clear();
            }
            Some(ui::OverlayAction::Stop) => {
                self.host.unmount();
                self.backdrop.clear();
            }
            None => {}
        }
    }
}
