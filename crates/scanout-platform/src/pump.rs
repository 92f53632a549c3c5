// SPDX-License-Identifier: CEPL-1.0
use tracing::debug;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::ControlFlow;
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpKey {
    Escape,
    Space,
    Other,
}

/// The subset of window-system events the pump reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpEvent {
    CloseRequested,
    KeyReleased(PumpKey),
    Resized { width: u32, height: u32 },
}

impl PumpEvent {
    pub fn from_window_event(event: &WindowEvent) -> Option<Self> {
        match event {
            WindowEvent::CloseRequested => Some(Self::CloseRequested),
            WindowEvent::Resized(size) => Some(Self::Resized {
                width: size.width,
                height: size.height,
            }),
            WindowEvent::KeyboardInput { event, .. } if event.state == ElementState::Released => {
                let key = match event.physical_key {
                    PhysicalKey::Code(KeyCode::Escape) => PumpKey::Escape,
                    PhysicalKey::Code(KeyCode::Space) => PumpKey::Space,
                    _ => PumpKey::Other,
                };
                Some(Self::KeyReleased(key))
            }
            _ => None,
        }
    }
}

/// Poll while running, block while paused or minimized, stop for good once
/// quit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PumpState {
    #[default]
    Running,
    /// Paused with Space; only Space resumes.
    Paused,
    /// Zero-size window; the next real size resumes.
    Minimized,
    Quit,
}

impl PumpState {
    pub fn on_event(self, event: PumpEvent) -> Self {
        let next = match (self, event) {
            (Self::Quit, _) => Self::Quit,
            (_, PumpEvent::CloseRequested) => Self::Quit,
            (_, PumpEvent::KeyReleased(PumpKey::Escape)) => Self::Quit,
            (Self::Running, PumpEvent::KeyReleased(PumpKey::Space)) => Self::Paused,
            (Self::Paused, PumpEvent::KeyReleased(PumpKey::Space)) => Self::Running,
            (Self::Running, PumpEvent::Resized { width, height }) if width == 0 || height == 0 => {
                Self::Minimized
            }
            (Self::Minimized, PumpEvent::Resized { width, height }) if width != 0 && height != 0 => {
                Self::Running
            }
            (state, _) => state,
        };
        if next != self {
            debug!("pump {:?} -> {:?} on {:?}", self, next, event);
        }
        next
    }

    pub fn is_quit(self) -> bool {
        self == Self::Quit
    }

    pub fn is_paused(self) -> bool {
        matches!(self, Self::Paused | Self::Minimized)
    }

    pub fn control_flow(self) -> ControlFlow {
        match self {
            Self::Running => ControlFlow::Poll,
            Self::Paused | Self::Minimized | Self::Quit => ControlFlow::Wait,
        }
    }
}
