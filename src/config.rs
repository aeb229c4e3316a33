//! Panel configuration.

use bitflags::bitflags;

use crate::geometry::Size;
use crate::imgui::EventType;

bitflags! {
    /// A set of immediate-mode event types.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct EventMask: u32 {
        const LAYOUT           = 1 << 0;
        const REPAINT          = 1 << 1;
        const MOUSE_DOWN       = 1 << 2;
        const MOUSE_UP         = 1 << 3;
        const MOUSE_MOVE       = 1 << 4;
        const MOUSE_DRAG       = 1 << 5;
        const KEY_DOWN         = 1 << 6;
        const KEY_UP           = 1 << 7;
        const SCROLL_WHEEL     = 1 << 8;
        const TOUCH_DOWN       = 1 << 9;
        const TOUCH_UP         = 1 << 10;
        const TOUCH_MOVE       = 1 << 11;
        const TOUCH_ENTER      = 1 << 12;
        const TOUCH_LEAVE      = 1 << 13;
        const VALIDATE_COMMAND = 1 << 14;
        const EXECUTE_COMMAND  = 1 << 15;
        const USED             = 1 << 16;
        const IGNORE           = 1 << 17;
    }
}

impl EventMask {
    pub fn of(event_type: EventType) -> Self {
        match event_type {
            EventType::Layout => EventMask::LAYOUT,
            EventType::Repaint => EventMask::REPAINT,
            EventType::MouseDown => EventMask::MOUSE_DOWN,
            EventType::MouseUp => EventMask::MOUSE_UP,
            EventType::MouseMove => EventMask::MOUSE_MOVE,
            EventType::MouseDrag => EventMask::MOUSE_DRAG,
            EventType::KeyDown => EventMask::KEY_DOWN,
            EventType::KeyUp => EventMask::KEY_UP,
            EventType::ScrollWheel => EventMask::SCROLL_WHEEL,
            EventType::TouchDown => EventMask::TOUCH_DOWN,
            EventType::TouchUp => EventMask::TOUCH_UP,
            EventType::TouchMove => EventMask::TOUCH_MOVE,
            EventType::TouchEnter => EventMask::TOUCH_ENTER,
            EventType::TouchLeave => EventMask::TOUCH_LEAVE,
            EventType::ValidateCommand => EventMask::VALIDATE_COMMAND,
            EventType::ExecuteCommand => EventMask::EXECUTE_COMMAND,
            EventType::Used => EventMask::USED,
            EventType::Ignore => EventMask::IGNORE,
        }
    }
}

/// Which immediate-mode events a panel delivers to its IMGUI containers, and
/// which of them are preceded by a layout pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventInterests {
    pub wanted: EventMask,
    pub layout_pass: EventMask,
}

impl EventInterests {
    pub fn wants_event(&self, event_type: EventType) -> bool {
        self.wanted.contains(EventMask::of(event_type))
    }

    pub fn wants_layout_pass(&self, event_type: EventType) -> bool {
        self.layout_pass.contains(EventMask::of(event_type))
    }

    pub fn with_mouse_move(mut self, wanted: bool) -> Self {
        self.wanted.set(EventMask::MOUSE_MOVE, wanted);
        self
    }

    /// Only run a layout pass before events that can change layout.
    pub fn with_less_layout_events(mut self) -> Self {
        self.layout_pass = EventMask::REPAINT
            | EventMask::MOUSE_DOWN
            | EventMask::KEY_DOWN
            | EventMask::EXECUTE_COMMAND;
        self
    }
}

impl Default for EventInterests {
    fn default() -> Self {
        Self {
            wanted: EventMask::all() - EventMask::MOUSE_MOVE,
            layout_pass: EventMask::all() - EventMask::LAYOUT,
        }
    }
}

/// Configuration for a panel created with [`crate::Tree::create_panel`].
///
/// # Example
///
/// ```rust
/// use uitree::prelude::*;
///
/// let config = PanelConfig::new()
///     .name("inspector")
///     .pixels_per_point(2.0)
///     .root_size(Size::new(400.0, 300.0));
/// assert_eq!(config.name, "inspector");
/// ```
#[derive(Debug, Clone)]
pub struct PanelConfig {
    pub name: String,
    pub pixels_per_point: f32,
    pub interests: EventInterests,
    pub root_size: Size,
}

impl PanelConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn pixels_per_point(mut self, pixels_per_point: f32) -> Self {
        self.pixels_per_point = pixels_per_point;
        self
    }

    pub fn interests(mut self, interests: EventInterests) -> Self {
        self.interests = interests;
        self
    }

    pub fn root_size(mut self, size: Size) -> Self {
        self.root_size = size;
        self
    }
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            name: String::from("panel"),
            pixels_per_point: 1.0,
            interests: EventInterests::default(),
            root_size: Size::zero(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_interests() {
        let interests = EventInterests::default();
        assert!(interests.wants_event(EventType::Repaint));
        assert!(interests.wants_event(EventType::MouseDown));
        assert!(!interests.wants_event(EventType::MouseMove));
        assert!(interests.wants_layout_pass(EventType::MouseDown));
        assert!(!interests.wants_layout_pass(EventType::Layout));
    }

    #[test]
    fn test_less_layout_events() {
        let interests = EventInterests::default().with_less_layout_events();
        assert!(interests.wants_layout_pass(EventType::Repaint));
        assert!(!interests.wants_layout_pass(EventType::MouseUp));
    }
}
