use crate::geometry::Rect;

/// Immediate-mode event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// Synthetic pass that only records layout requests.
    Layout,
    Repaint,
    MouseDown,
    MouseUp,
    MouseMove,
    MouseDrag,
    KeyDown,
    KeyUp,
    ScrollWheel,
    TouchDown,
    TouchUp,
    TouchMove,
    TouchEnter,
    TouchLeave,
    ValidateCommand,
    ExecuteCommand,
    /// Already consumed by a control.
    Used,
    Ignore,
}

/// Command name sent to a container after keyboard focus moved into it.
pub const NEW_KEYBOARD_FOCUS: &str = "NewKeyboardFocus";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
}

/// An immediate-mode event as seen by handlers.
#[derive(Debug, Clone, PartialEq)]
pub struct ImEvent {
    kind: EventType,
    pub character: Option<char>,
    pub modifiers: Modifiers,
    pub mouse_position: (f32, f32),
    pub button: u8,
    pub command_name: Option<String>,
    pub display_index: i32,
    pub is_direct_manipulation_device: bool,
}

impl ImEvent {
    pub fn new(kind: EventType) -> Self {
        Self {
            kind,
            character: None,
            modifiers: Modifiers::default(),
            mouse_position: (0.0, 0.0),
            button: 0,
            command_name: None,
            display_index: 0,
            is_direct_manipulation_device: false,
        }
    }

    pub fn layout() -> Self {
        Self::new(EventType::Layout)
    }

    pub fn repaint() -> Self {
        Self::new(EventType::Repaint)
    }

    pub fn mouse(kind: EventType, x: f32, y: f32) -> Self {
        Self {
            mouse_position: (x, y),
            ..Self::new(kind)
        }
    }

    pub fn key_down(character: char) -> Self {
        Self {
            character: Some(character),
            ..Self::new(EventType::KeyDown)
        }
    }

    /// Tab key press. `backward` is shift+tab.
    pub fn tab(backward: bool) -> Self {
        let mut event = Self::key_down('\t');
        event.modifiers.shift = backward;
        event
    }

    pub fn command(name: impl Into<String>) -> Self {
        Self {
            command_name: Some(name.into()),
            ..Self::new(EventType::ExecuteCommand)
        }
    }

    pub fn kind(&self) -> EventType {
        self.kind
    }

    /// The type the event currently carries, including `Used`.
    pub fn raw_type(&self) -> EventType {
        self.kind
    }

    pub fn set_kind(&mut self, kind: EventType) {
        self.kind = kind;
    }

    pub fn is_used(&self) -> bool {
        self.kind == EventType::Used
    }

    /// Mark the event as consumed. Layout and repaint events cannot be used.
    pub fn use_event(&mut self) {
        match self.kind {
            EventType::Layout | EventType::Repaint => {
                log::warn!("cannot use() a {:?} event", self.kind);
            }
            _ => self.kind = EventType::Used,
        }
    }

    pub fn is_tab(&self) -> bool {
        self.kind == EventType::KeyDown && matches!(self.character, Some('\t') | Some('\u{19}'))
    }

    pub fn is_backward_tab(&self) -> bool {
        self.is_tab() && (self.modifiers.shift || self.character == Some('\u{19}'))
    }

    pub fn is_mouse_inside(&self, rect: &Rect) -> bool {
        rect.contains(self.mouse_position.0, self.mouse_position.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_use_event() {
        let mut event = ImEvent::mouse(EventType::MouseDown, 1.0, 2.0);
        event.use_event();
        assert!(event.is_used());

        let mut repaint = ImEvent::repaint();
        repaint.use_event();
        assert_eq!(repaint.kind(), EventType::Repaint);
    }

    #[test]
    fn test_tab_detection() {
        assert!(ImEvent::tab(false).is_tab());
        assert!(!ImEvent::tab(false).is_backward_tab());
        assert!(ImEvent::tab(true).is_backward_tab());
        assert!(ImEvent::key_down('\u{19}').is_backward_tab());
        assert!(!ImEvent::key_down('a').is_tab());
    }
}
