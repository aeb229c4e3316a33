//! Element behaviours.
//!
//! Structure lives in the [`Tree`]; an [`Element`] only supplies behaviour:
//! where its children go, how it measures and how it reacts to events.

use crate::error::{GuiError, Result};
use crate::events::{ElementEvent, EventResponse};
use crate::geometry::Size;
use crate::imgui::ImguiContainer;
use crate::layout::MeasureMode;
use crate::tree::{ElementId, Tree};

pub trait Element {
    /// Element that receives children added through the logical API.
    ///
    /// `Some(this)` inserts physically into this element. Returning another
    /// element redirects there. `None` means the element does not accept
    /// children through the logical API.
    fn content_container(&self, this: ElementId) -> Option<ElementId> {
        Some(this)
    }

    /// Whether the element measures its own content while it has no children.
    fn requires_measure(&self) -> bool {
        false
    }

    fn focusable(&self) -> bool {
        false
    }

    /// Evaluated when building the focus ring.
    fn can_grab_focus(&self) -> bool {
        true
    }

    fn measure(
        &mut self,
        _tree: &mut Tree,
        _this: ElementId,
        _width: f32,
        _width_mode: MeasureMode,
        _height: f32,
        _height_mode: MeasureMode,
    ) -> Size {
        Size::undefined()
    }

    fn handle_event(
        &mut self,
        _tree: &mut Tree,
        _this: ElementId,
        _event: &mut ElementEvent,
    ) -> std::result::Result<EventResponse, GuiError> {
        Ok(EventResponse::Ignored)
    }

    fn as_imgui_container(&self) -> Option<&ImguiContainer> {
        None
    }

    fn as_imgui_container_mut(&mut self) -> Option<&mut ImguiContainer> {
        None
    }
}

/// Plain element with no behaviour of its own.
#[derive(Debug, Default)]
pub struct VisualElement {
    _private: (),
}

impl VisualElement {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Element for VisualElement {}

/// Element whose logical children live inside an inner content element.
#[derive(Debug, Default)]
pub struct Composite {
    content: Option<ElementId>,
}

impl Composite {
    /// Build a composite with its content element already in place.
    ///
    /// Returns `(composite, content)`. The composite is marked as a
    /// composite root.
    pub fn build(tree: &mut Tree) -> Result<(ElementId, ElementId)> {
        let content = tree.create_element(VisualElement::new());
        let composite = tree.create_element(Composite {
            content: Some(content),
        });
        tree.hierarchy(composite).add(content)?;
        tree.set_composite_root(composite, true);
        Ok((composite, content))
    }

    /// A composite without a content element. Logical insertion into it fails.
    pub fn sealed() -> Self {
        Self { content: None }
    }
}

impl Element for Composite {
    fn content_container(&self, _this: ElementId) -> Option<ElementId> {
        self.content
    }
}
