use eframe::egui::{self, Color32, Context, RichText};

use crate::background::{AnimatedBackground, SchedulerState};
use crate::config::RenderConfig;

use super::FpsCounter;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::app) enum OverlayAction {
    Remount,
    Stop,
}

fn status_text(background: Option<&AnimatedBackground>) -> &'static str {
    match background {
        None => "unmounted",
        Some(background) if background.is_inert() => "inert (no drawing surface)",
        Some(background) => match background.state() {
            SchedulerState::Running => "running",
            SchedulerState::Stopped => "stopped",
        },
    }
}

/// Host content drawn over the background: a small status card.
pub(in crate::app) fn show_overlay(
    ctx: &Context,
    background: Option<&AnimatedBackground>,
    config: &RenderConfig,
    fps: &FpsCounter,
    action: &mut Option<OverlayAction>,
) {
    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.inner_margin(16.0))
        .show(ctx, |ui| {
            egui::Frame::group(ui.style())
                .fill(Color32::from_black_alpha(170))
                .show(ui, |ui| {
                    ui.set_max_width(320.0);
                    ui.heading(RichText::new("plexus-backdrop").color(Color32::WHITE));
                    ui.label(format!("background: {}", status_text(background)));

                    if let Some(fps_text) = fps.display_text() {
                        ui.label(fps_text);
                    }

                    if let Some(background) = background {
                        let stats = background.last_stats();
                        ui.label(format!(
                            "particles: {}   lines: {}   ticks: {}",
                            stats.particles,
                            stats.lines,
                            background.ticks()
                        ));
                        if let Some(surface) = background.surface_state() {
                            ui.label(format!(
                                "surface: {:.0}x{:.0} pt @ {:.2}x ({}x{} px)",
                                surface.width(),
                                surface.height(),
                                surface.pixel_ratio(),
                                surface.backing_size[0],
                                surface.backing_size[1],
                            ));
                        }
                    }

                    ui.label(format!(
                        "density {:.2}, connection distance {:.0}, {:?} search",
                        config.density, config.connection_distance, config.neighbor_search
                    ));

                    ui.horizontal(|ui| {
                        if ui.button("Remount").clicked() {
                            *action = Some(OverlayAction::Remount);
                        }
                        let running =
                            background.is_some_and(|background| !background.is_inert());
                        if ui
                            .add_enabled(running, egui::Button::new("Stop"))
                            .clicked()
                        {
                            *action = Some(OverlayAction::Stop);
                        }
                    });
                });
        });
}
