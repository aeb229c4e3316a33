//! Panels: the per-window context an element tree is attached to.

use std::collections::HashMap;

use crate::config::{EventInterests, PanelConfig};
use crate::element::VisualElement;
use crate::events::VersionChange;
use crate::focus::FocusController;
use crate::geometry::Rect;
use crate::imgui::ImEvent;
use crate::transform::Transform;
use crate::tree::{ElementId, Tree};

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct PanelId(u32);

impl PanelId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// State the renderer publishes before asking elements to repaint.
#[derive(Debug, Clone)]
pub struct RepaintData {
    pub current_offset: Transform,
    pub current_world_clip: Rect,
    pub repaint_event: ImEvent,
}

impl Default for RepaintData {
    fn default() -> Self {
        Self {
            current_offset: Transform::IDENTITY,
            current_world_clip: Rect::ZERO,
            repaint_event: ImEvent::repaint(),
        }
    }
}

pub struct Panel {
    id: PanelId,
    name: String,
    pixels_per_point: f32,
    interests: EventInterests,
    root: ElementId,
    pub(crate) during_layout: bool,
    imgui_container_count: usize,
    focus: FocusController,
    repaint: RepaintData,
    version_changes: HashMap<ElementId, VersionChange>,
    scheduled: Vec<(ElementId, VersionChange)>,
    repaint_requested: bool,
    mouse_capture: Option<ElementId>,
}

impl Panel {
    pub fn id(&self) -> PanelId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn root(&self) -> ElementId {
        self.root
    }

    pub fn pixels_per_point(&self) -> f32 {
        self.pixels_per_point
    }

    pub fn interests(&self) -> EventInterests {
        self.interests
    }

    pub fn set_interests(&mut self, interests: EventInterests) {
        self.interests = interests;
    }

    pub fn is_in_layout_phase(&self) -> bool {
        self.during_layout
    }

    /// Number of IMGUI containers currently attached to this panel.
    pub fn imgui_container_count(&self) -> usize {
        self.imgui_container_count
    }

    pub fn focus(&self) -> &FocusController {
        &self.focus
    }

    pub fn focus_mut(&mut self) -> &mut FocusController {
        &mut self.focus
    }

    pub fn repaint_data(&self) -> &RepaintData {
        &self.repaint
    }

    pub fn set_repaint_data(&mut self, data: RepaintData) {
        self.repaint = data;
    }

    /// Take the accumulated version changes, one entry per element.
    pub fn take_version_changes(&mut self) -> Vec<(ElementId, VersionChange)> {
        self.version_changes.drain().collect()
    }

    pub fn repaint_requested(&self) -> bool {
        self.repaint_requested
    }

    pub fn take_repaint_request(&mut self) -> bool {
        std::mem::take(&mut self.repaint_requested)
    }

    pub fn capture_mouse(&mut self, id: ElementId) {
        self.mouse_capture = Some(id);
    }

    pub fn release_mouse(&mut self, id: ElementId) {
        if self.mouse_capture == Some(id) {
            self.mouse_capture = None;
        }
    }

    pub fn mouse_capture(&self) -> Option<ElementId> {
        self.mouse_capture
    }

    /// Defer a version change until the current layout computation ends.
    pub fn schedule(&mut self, id: ElementId, change: VersionChange) {
        self.scheduled.push((id, change));
    }

    pub fn scheduled_count(&self) -> usize {
        self.scheduled.len()
    }

    pub(crate) fn on_version_changed(&mut self, id: ElementId, change: VersionChange) {
        *self.version_changes.entry(id).or_default() |= change;
        if change.intersects(VersionChange::REPAINT | VersionChange::LAYOUT) {
            self.repaint_requested = true;
        }
    }

    pub(crate) fn on_element_attached(&mut self, _id: ElementId, is_imgui: bool) {
        if is_imgui {
            self.imgui_container_count += 1;
        }
    }

    pub(crate) fn on_element_detached(&mut self, id: ElementId, is_imgui: bool) {
        if is_imgui {
            self.imgui_container_count = self.imgui_container_count.saturating_sub(1);
        }
        self.focus.on_element_detached(id);
        if self.mouse_capture == Some(id) {
            self.mouse_capture = None;
        }
        self.version_changes.remove(&id);
    }
}

impl Tree {
    /// Create a panel with a fresh root element attached to it.
    pub fn create_panel(&mut self, config: PanelConfig) -> PanelId {
        let id = PanelId(self.panels.len() as u32);
        let root = self.create_element(VisualElement::new());
        if let Some(node) = self.node_mut(root) {
            node.panel = Some(id);
            node.name = Some(config.name.clone());
            node.layout_rect = Rect::from_size(config.root_size);
        }

        log::debug!("created panel {:?} ({})", id, config.name);
        self.panels.push(Panel {
            id,
            name: config.name,
            pixels_per_point: config.pixels_per_point,
            interests: config.interests,
            root,
            during_layout: false,
            imgui_container_count: 0,
            focus: FocusController::default(),
            repaint: RepaintData::default(),
            version_changes: HashMap::new(),
            scheduled: Vec::new(),
            repaint_requested: false,
            mouse_capture: None,
        });
        id
    }

    /// Apply changes deferred with [`Panel::schedule`].
    pub fn run_scheduled(&mut self, panel: PanelId) {
        let scheduled = match self.panel_mut(panel) {
            Some(p) => std::mem::take(&mut p.scheduled),
            None => return,
        };
        for (id, change) in scheduled {
            self.increment_version(id, change);
        }
    }
}
