//! Structural notifications and element events.
//!
//! Mutations never call back into the tree. Instead they bump per-element
//! version counters, forward the change to the owning panel and append to a
//! drainable hierarchy-change queue. Observers registered with
//! [`Tree::on_element_added`] / [`Tree::on_element_removed`] are plain
//! closures fired once the mutation is complete.

use bitflags::bitflags;

use crate::focus::FocusChangeDirection;
use crate::imgui::ImEvent;
use crate::tree::{ElementId, Tree};

bitflags! {
    /// What aspect of an element changed.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct VersionChange: u8 {
        const HIERARCHY = 0b0001;
        const LAYOUT    = 0b0010;
        const REPAINT   = 0b0100;
        const TRANSFORM = 0b1000;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HierarchyChange {
    AddedToParent,
    RemovedFromParent,
    ChildrenReordered,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventResponse {
    Ignored,
    Handled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerType {
    Mouse,
    Touch,
    Pen,
}

impl PointerType {
    pub fn is_direct_manipulation(self) -> bool {
        matches!(self, PointerType::Touch | PointerType::Pen)
    }
}

/// Retained-mode input event kinds that can carry an immediate-mode event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    MouseDown,
    MouseUp,
    MouseMove,
    Wheel,
    KeyDown,
    KeyUp,
    Command,
    PointerDown,
    PointerUp,
    PointerMove,
    PointerEnter,
    PointerLeave,
}

impl InputKind {
    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            InputKind::PointerDown
                | InputKind::PointerUp
                | InputKind::PointerMove
                | InputKind::PointerEnter
                | InputKind::PointerLeave
        )
    }

    /// Events whose position only makes sense inside the target's bounds.
    pub fn is_local(self) -> bool {
        matches!(
            self,
            InputKind::MouseDown
                | InputKind::MouseUp
                | InputKind::MouseMove
                | InputKind::PointerDown
                | InputKind::PointerUp
                | InputKind::PointerMove
        )
    }
}

#[derive(Debug, Clone)]
pub struct InputEvent {
    pub kind: InputKind,
    pub imgui: ImEvent,
    pub pointer_type: PointerType,
}

impl InputEvent {
    pub fn new(kind: InputKind, imgui: ImEvent) -> Self {
        Self {
            kind,
            imgui,
            pointer_type: PointerType::Mouse,
        }
    }

    pub fn with_pointer_type(mut self, pointer_type: PointerType) -> Self {
        self.pointer_type = pointer_type;
        self.imgui.is_direct_manipulation_device = pointer_type.is_direct_manipulation();
        self
    }
}

/// Events delivered to an element's [`crate::Element::handle_event`].
#[derive(Debug, Clone)]
pub enum ElementEvent {
    Focus {
        direction: FocusChangeDirection,
        delegated: bool,
    },
    Blur,
    NavigationMove,
    NavigationSubmit,
    NavigationCancel,
    Input(InputEvent),
}

impl Tree {
    /// Bump the version of `id` and forward the change to its panel.
    ///
    /// Layout changes also mark the element's layout dirty.
    pub fn increment_version(&mut self, id: ElementId, change: VersionChange) {
        let panel = match self.node_mut(id) {
            Some(node) => {
                node.version = node.version.wrapping_add(1);
                node.panel
            }
            None => return,
        };

        if change.contains(VersionChange::LAYOUT) {
            self.mark_needs_layout(id);
        }

        if let Some(panel) = panel.and_then(|p| self.panels.get_mut(p.index())) {
            panel.on_version_changed(id, change);
        }
    }

    /// Forward a change to a panel directly. Used for elements that were just
    /// detached and no longer know their panel.
    pub(crate) fn notify_panel(
        &mut self,
        panel: Option<crate::panel::PanelId>,
        id: ElementId,
        change: VersionChange,
    ) {
        if let Some(node) = self.node_mut(id) {
            node.version = node.version.wrapping_add(1);
        }
        if let Some(panel) = panel.and_then(|p| self.panels.get_mut(p.index())) {
            panel.on_version_changed(id, change);
        }
    }

    pub(crate) fn record_hierarchy_change(&mut self, id: ElementId, change: HierarchyChange) {
        log::trace!("hierarchy change {:?} on {:?}", change, id);
        self.hierarchy_changes.push((id, change));
    }

    /// Take all hierarchy changes recorded since the last drain.
    pub fn drain_hierarchy_changes(&mut self) -> Vec<(ElementId, HierarchyChange)> {
        std::mem::take(&mut self.hierarchy_changes)
    }

    /// Register a callback fired after a child is inserted into `id`.
    pub fn on_element_added(&mut self, id: ElementId, f: impl FnMut(ElementId, usize) + 'static) {
        if let Some(node) = self.node_mut(id) {
            node.observers.added.push(Box::new(f));
        }
    }

    /// Register a callback fired after a child is removed from `id`.
    pub fn on_element_removed(&mut self, id: ElementId, f: impl FnMut(ElementId) + 'static) {
        if let Some(node) = self.node_mut(id) {
            node.observers.removed.push(Box::new(f));
        }
    }

    pub(crate) fn fire_element_added(&mut self, owner: ElementId, child: ElementId, index: usize) {
        if let Some(node) = self.node_mut(owner) {
            for callback in node.observers.added.iter_mut() {
                callback(child, index);
            }
        }
    }

    pub(crate) fn fire_element_removed(&mut self, owner: ElementId, child: ElementId) {
        if let Some(node) = self.node_mut(owner) {
            for callback in node.observers.removed.iter_mut() {
                callback(child);
            }
        }
    }

    /// Deliver an event to an element's behaviour.
    pub fn dispatch_event(
        &mut self,
        id: ElementId,
        event: &mut ElementEvent,
    ) -> Result<EventResponse, crate::error::GuiError> {
        self.with_element_mut(id, |element, tree| element.handle_event(tree, id, event))
            .unwrap_or(Ok(EventResponse::Ignored))
    }
}
