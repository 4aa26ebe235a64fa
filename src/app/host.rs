use rand::rngs::StdRng;

use crate::background::{AnimatedBackground, HostEvents, PixelSurface, Viewport};
use crate::config::RenderConfig;

/// Owns the current mount and decides, frame by frame, when to mount,
/// resize or tick it.
pub(super) struct Host {
    config: RenderConfig,
    rng: StdRng,
    events: HostEvents,
    mount: Option<Mount>,
    unmounted_by_user: bool,
}

struct Mount {
    background: AnimatedBackground,
    viewport: Viewport,
}

/// What a frame did to the mount.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FrameOutcome {
    Idle,
    Mounted,
    Resized,
    Ticked,
    ResizedAndTicked,
}

impl FrameOutcome {
    fn with_tick(self, ticked: bool) -> Self {
        match (self, ticked) {
            (Self::Idle, true) => Self::Ticked,
            (Self::Resized, true) => Self::ResizedAndTicked,
            (outcome, _) => outcome,
        }
    }
}

impl Host {
    pub(super) fn new(config: RenderConfig, rng: StdRng, events: HostEvents) -> Self {
        Self {
            config,
            rng,
            events,
            mount: None,
            unmounted_by_user: false,
        }
    }

    pub(super) fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub(super) fn background(&self) -> Option<&AnimatedBackground> {
        self.mount.as_ref().map(|mount| &mount.background)
    }

    pub(super) fn surface(&self) -> Option<&PixelSurface> {
        self.background()
            .and_then(|background| background.surface())
    }

    /// Viewport the mount currently draws at.
    pub(super) fn mounted_viewport(&self) -> Option<Viewport> {
        self.mount.as_ref().map(|mount| mount.viewport)
    }

    pub(super) fn remount(&mut self, viewport: Viewport, max_texture_side: usize) {
        if let Some(mut previous) = self.mount.take() {
            previous.background.stop();
            log::debug!("remounting animated background");
        }
        self.unmounted_by_user = false;

        let background = AnimatedBackground::mount(
            self.config,
            viewport,
            max_texture_side,
            &self.events,
            &mut self.rng,
        );
        self.mount = Some(Mount {
            background,
            viewport,
        });
    }

    pub(super) fn unmount(&mut self) {
        if let Some(mut mount) = self.mount.take() {
            mount.background.stop();
        }
        self.unmounted_by_user = true;
    }

    /// An inert mount is retried once the window reports a different, usable viewport.
    fn needs_mount(&self, viewport: Viewport) -> bool {
        match &self.mount {
            None => !self.unmounted_by_user && viewport.is_usable(),
            Some(mount) => {
                mount.background.is_inert() && viewport.is_usable() && viewport != mount.viewport
            }
        }
    }

    /// Feeds one frame's viewport to the mount and runs its pending tick.
    pub(super) fn pump(&mut self, viewport: Viewport, max_texture_side: usize) -> FrameOutcome {
        let resized = self.events.observe_viewport(viewport);

        let outcome = if self.needs_mount(viewport) {
            self.remount(viewport, max_texture_side);
            FrameOutcome::Mounted
        } else if let (Some(viewport), Some(mount)) = (resized, self.mount.as_mut())
            && mount.background.resize(viewport)
        {
            mount.viewport = viewport;
            FrameOutcome::Resized
        } else {
            FrameOutcome::Idle
        };

        let ticked = match (self.events.take_tick(), self.mount.as_mut()) {
            (Some(tick), Some(mount)) => mount.background.tick(tick),
            _ => false,
        };
        outcome.with_tick(ticked)
    }
}
