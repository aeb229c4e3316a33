use crate::error::GuiError;
use crate::geometry::{Color, Rect, Size};
use crate::imgui::state;
use crate::imgui::{EventType, ImEvent};
use crate::transform::Transform;
use crate::tree::ElementId;

/// Rects requested by a handler, recorded during layout events and replayed
/// in the same order during every other event.
///
/// Entries stack vertically. A width of zero or less stretches to the
/// available width.
#[derive(Debug, Default)]
pub struct LayoutCache {
    entries: Vec<Size>,
    cursor: usize,
    recording: bool,
    available_width: f32,
    width: f32,
    height: f32,
}

impl LayoutCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn begin(&mut self, kind: EventType, available: Rect) {
        self.cursor = 0;
        self.available_width = available.width;
        self.recording = kind == EventType::Layout;
        if self.recording {
            self.entries.clear();
        }
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = 0;
    }

    pub(crate) fn end(&mut self) {
        if self.recording {
            self.width = self.entries.iter().fold(0.0, |acc, e| acc.max(e.width));
            self.height = self.entries.iter().map(|e| e.height).sum();
            self.recording = false;
        }
    }

    /// Reserve the next rect.
    pub fn reserve(&mut self, width: f32, height: f32) -> Result<Rect, GuiError> {
        let y: f32 = self.entries.iter().take(self.cursor).map(|e| e.height).sum();

        let size = if self.recording {
            let size = Size::new(width.max(0.0), height.max(0.0));
            self.entries.push(size);
            size
        } else {
            *self
                .entries
                .get(self.cursor)
                .ok_or(GuiError::LayoutMismatch {
                    index: self.cursor,
                    available: self.entries.len(),
                })?
        };
        self.cursor += 1;

        let width = if size.width <= 0.0 {
            self.available_width
        } else {
            size.width
        };
        Ok(Rect::new(0.0, y, width, size.height))
    }

    /// Width measured by the last layout event, rounded up.
    pub fn measured_width(&self) -> f32 {
        self.width.ceil()
    }

    pub fn measured_height(&self) -> f32 {
        self.height.ceil()
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }
}

/// What a handler sees during one replay.
pub struct GuiFrame<'a> {
    event: &'a mut ImEvent,
    cache: &'a mut LayoutCache,
    element: ElementId,
}

impl<'a> GuiFrame<'a> {
    pub(crate) fn new(event: &'a mut ImEvent, cache: &'a mut LayoutCache, element: ElementId) -> Self {
        Self {
            event,
            cache,
            element,
        }
    }

    /// Container being replayed.
    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn event(&self) -> &ImEvent {
        &*self.event
    }

    pub fn event_mut(&mut self) -> &mut ImEvent {
        &mut *self.event
    }

    pub fn event_type(&self) -> EventType {
        self.event.kind()
    }

    pub fn use_event(&mut self) {
        self.event.use_event();
    }

    pub fn layout_rect(&mut self, width: f32, height: f32) -> Result<Rect, GuiError> {
        self.cache.reserve(width, height)
    }

    pub fn control_id(&mut self, focusable: bool) -> i32 {
        state::get_control_id(focusable)
    }

    pub fn keyboard_control(&self) -> i32 {
        state::keyboard_control()
    }

    pub fn set_keyboard_control(&mut self, id: i32) {
        state::set_keyboard_control(id);
    }

    pub fn hot_control(&self) -> i32 {
        state::hot_control()
    }

    pub fn set_hot_control(&mut self, id: i32) {
        state::set_hot_control(id);
    }

    /// Push a clip rect in the current drawing space.
    pub fn push_clip(&mut self, rect: Rect) {
        state::push_clip(state::matrix(), rect);
    }

    pub fn pop_clip(&mut self) -> bool {
        state::pop_clip()
    }

    pub fn set_color(&mut self, color: Color) {
        state::set_color(color);
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        state::set_enabled(enabled);
    }

    pub fn set_changed(&mut self, changed: bool) {
        state::set_changed(changed);
    }

    pub fn set_matrix(&mut self, matrix: Transform) {
        state::set_matrix(matrix);
    }

    /// Unwind out of the current replay.
    pub fn exit_gui(&self) -> Result<(), GuiError> {
        Err(GuiError::ExitGui)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_then_replay() {
        let mut cache = LayoutCache::new();
        let available = Rect::new(0.0, 0.0, 200.0, 100.0);

        cache.begin(EventType::Layout, available);
        assert_eq!(cache.reserve(50.0, 20.5).unwrap(), Rect::new(0.0, 0.0, 50.0, 20.5));
        assert_eq!(cache.reserve(0.0, 10.0).unwrap(), Rect::new(0.0, 20.5, 200.0, 10.0));
        cache.end();
        assert_eq!(cache.measured_width(), 50.0);
        assert_eq!(cache.measured_height(), 31.0);

        cache.begin(EventType::Repaint, available);
        assert_eq!(cache.reserve(999.0, 999.0).unwrap(), Rect::new(0.0, 0.0, 50.0, 20.5));
        cache.reserve(0.0, 0.0).unwrap();
        assert_eq!(
            cache.reserve(1.0, 1.0),
            Err(GuiError::LayoutMismatch {
                index: 2,
                available: 2
            })
        );
        cache.end();
        assert_eq!(cache.entry_count(), 2);
    }
}
