mod fps;
mod overlay;

pub(super) use fps::FpsCounter;
pub(super) use overlay::{OverlayAction, show_overlay};
