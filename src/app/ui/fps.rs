use std::collections::VecDeque;

use eframe::egui::Context;

const FPS_SAMPLE_WINDOW: usize = 180;

#[derive(Default)]
pub(in crate::app) struct FpsCounter {
    current: f32,
    samples: VecDeque<f32>,
}

impl FpsCounter {
    pub(in crate::app) fn update(&mut self, ctx: &Context) {
        let dt = ctx.input(|input| input.stable_dt);
        self.record(dt);
    }

    fn record(&mut self, dt: f32) {
        if dt <= f32::EPSILON {
            return;
        }

        self.current = (1.0 / dt).clamp(0.0, 1000.0);
        self.samples.push_back(self.current);
        while self.samples.len() > FPS_SAMPLE_WINDOW {
            self.samples.pop_front();
        }
    }

    pub(in crate::app) fn display_text(&self) -> Option<String> {
        if self.samples.is_empty() {
            return None;
        }

        let mut parts = vec![format!("FPS {:.0}", self.current)];
        let avg = self.samples.iter().sum::<f32>() / self.samples.len() as f32;
        parts.push(format!("avg {avg:.1}"));
        if self.current > f32::EPSILON {
            parts.push(format!("{:.1} ms", 1000.0 / self.current));
        }

        Some(parts.join(" | "))
    }
}
