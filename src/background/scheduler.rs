use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use super::viewport::Viewport;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TickId(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct ListenerId(u64);

// Shared by every host so ids from different hosts never collide.
static NEXT_REGISTRATION_ID: AtomicU64 = AtomicU64::new(1);

fn next_registration_id() -> u64 {
    NEXT_REGISTRATION_ID.fetch_add(1, Ordering::Relaxed)
}

#[derive(Default)]
struct EventState {
    pending_tick: Option<TickId>,
    resize_listeners: Vec<ListenerId>,
    last_viewport: Option<Viewport>,
}

/// Host side of the refresh-tick and resize sources.
///
/// The window owns one of these and pumps it once per frame; mounted
/// backgrounds hold registrations that release themselves when dropped.
#[derive(Clone)]
pub struct HostEvents {
    state: Rc<RefCell<EventState>>,
    waker: Rc<dyn Fn()>,
}

impl Default for HostEvents {
    fn default() -> Self {
        Self::new(|| {})
    }
}

impl HostEvents {
    /// `waker` is called whenever a tick is requested, so the host can schedule a redraw.
    pub fn new(waker: impl Fn() + 'static) -> Self {
        Self {
            state: Rc::new(RefCell::new(EventState::default())),
            waker: Rc::new(waker),
        }
    }

    pub fn request_tick(&self) -> TickHandle {
        let id = TickId(next_registration_id());
        self.state.borrow_mut().pending_tick = Some(id);
        (self.waker)();
        TickHandle {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    pub fn subscribe_resize(&self) -> ResizeSubscription {
        let id = ListenerId(next_registration_id());
        self.state.borrow_mut().resize_listeners.push(id);
        ResizeSubscription {
            id,
            state: Rc::downgrade(&self.state),
        }
    }

    /// Takes the tick due for this display refresh, if one was requested.
    pub fn take_tick(&self) -> Option<TickId> {
        self.state.borrow_mut().pending_tick.take()
    }

    /// Records the current viewport. Returns it when it changed and someone is listening.
    pub fn observe_viewport(&self, viewport: Viewport) -> Option<Viewport> {
        let mut state = self.state.borrow_mut();
        let changed = state.last_viewport != Some(viewport);
        state.last_viewport = Some(viewport);
        (changed && !state.resize_listeners.is_empty()).then_some(viewport)
    }

    pub fn has_pending_tick(&self) -> bool {
        self.state.borrow().pending_tick.is_some()
    }

    pub fn resize_listener_count(&self) -> usize {
        self.state.borrow().resize_listeners.len()
    }
}

/// An outstanding tick request. Dropping it before the tick fires cancels it.
#[derive(Debug)]
pub struct TickHandle {
    id: TickId,
    state: Weak<RefCell<EventState>>,
}

impl TickHandle {
    pub fn id(&self) -> TickId {
        self.id
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        let Some(shared) = self.state.upgrade() else {
            return;
        };
        let mut state = shared.borrow_mut();
        if state.pending_tick == Some(self.id) {
            state.pending_tick = None;
        }
    }
}

#[derive(Debug)]
pub struct ResizeSubscription {
    id: ListenerId,
    state: Weak<RefCell<EventState>>,
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Some(state) = self.state.upgrade() {
            state
                .borrow_mut()
                .resize_listeners
                .retain(|listener| *listener != self.id);
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerState {
    Running,
    Stopped,
}

/// Two-state frame loop. Stopped is terminal for the mount.
pub(super) struct FrameScheduler {
    state: SchedulerState,
    events: HostEvents,
    pending: Option<TickHandle>,
    resize: Option<ResizeSubscription>,
    ticks: u64,
}

impl FrameScheduler {
    pub(super) fn start(events: &HostEvents) -> Self {
        Self {
            state: SchedulerState::Running,
            events: events.clone(),
            resize: Some(events.subscribe_resize()),
            pending: Some(events.request_tick()),
            ticks: 0,
        }
    }

    /// A scheduler that never runs, for backgrounds without a surface.
    pub(super) fn stopped(events: &HostEvents) -> Self {
        Self {
            state: SchedulerState::Stopped,
            events: events.clone(),
            pending: None,
            resize: None,
            ticks: 0,
        }
    }

    pub(super) fn state(&self) -> SchedulerState {
        self.state
    }

    /// Accepts `tick` if it is the one this scheduler is waiting for.
    pub(super) fn begin_tick(&mut self, tick: TickId) -> bool {
        let expected = self
            .pending
            .as_ref()
            .is_some_and(|handle| handle.id() == tick);
        if self.state == SchedulerState::Stopped || !expected {
            return false;
        }

        self.pending = None;
        self.ticks += 1;
        true
    }

    pub(super) fn request_next(&mut self) {
        if self.state == SchedulerState::Running {
            self.pending = Some(self.events.request_tick());
        }
    }

    pub(super) fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Releases the tick request and the resize subscription. Returns whether
    /// this call did the transition.
    pub(super) fn stop(&mut self) -> bool {
        let was_running = self.state == SchedulerState::Running;
        self.state = SchedulerState::Stopped;
        self.pending = None;
        self.resize = None;
        was_running
    }
}
