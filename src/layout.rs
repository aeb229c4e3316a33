//! Layout mirror and measurement.
//!
//! Every element owns a [`LayoutNode`] whose child list mirrors the physical
//! children. Elements that measure their own content (text, IMGUI containers)
//! have a measure function, but only while they have no children: inserting
//! the first child removes it and removing the last child restores it.
//!
//! Dirty flags bubble up to the nearest relayout boundary (or the root), which
//! is added to the layout queue. A panel is in its layout phase only inside
//! [`Tree::run_layout_pass`]; hierarchy mutations fail there.

use crate::error::{HierarchyError, Result};
use crate::geometry::Size;
use crate::panel::PanelId;
use crate::tree::{ElementId, Tree};

/// How the available space along one axis constrains a measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    Undefined,
    Exactly,
    AtMost,
}

#[derive(Debug, Default)]
pub struct LayoutNode {
    pub(crate) children: Vec<ElementId>,
    pub(crate) measure_defined: bool,
    pub(crate) is_dirty: bool,
    pub(crate) is_relayout_boundary: bool,
    pub(crate) measured: Option<Size>,
}

/// Resolve a measured value against the available space and its mode.
pub fn clamp_measured(measured: f32, available: f32, mode: MeasureMode) -> f32 {
    match mode {
        MeasureMode::Exactly => available,
        MeasureMode::AtMost => measured.min(available),
        MeasureMode::Undefined => measured,
    }
}

impl Tree {
    /// Mark `id` as needing layout and queue its relayout boundary.
    pub fn mark_needs_layout(&mut self, id: ElementId) {
        let mut current = id;

        loop {
            let node = match self.node_mut(current) {
                Some(node) => node,
                None => return,
            };

            // Boundary is already queued.
            if node.layout.is_dirty {
                return;
            }
            node.layout.is_dirty = true;

            if node.layout.is_relayout_boundary {
                self.layout_roots.insert(current);
                return;
            }

            match node.physical_parent {
                Some(parent) => current = parent,
                None => {
                    self.layout_roots.insert(current);
                    return;
                }
            }
        }
    }

    pub fn is_dirty(&self, id: ElementId) -> bool {
        self.node(id).map(|n| n.layout.is_dirty).unwrap_or(false)
    }

    pub fn clear_dirty(&mut self, id: ElementId) {
        if let Some(node) = self.node_mut(id) {
            node.layout.is_dirty = false;
        }
    }

    pub fn set_relayout_boundary(&mut self, id: ElementId, is_boundary: bool) {
        if let Some(node) = self.node_mut(id) {
            node.layout.is_relayout_boundary = is_boundary;
        }
    }

    /// Take the queued relayout boundaries, clearing their dirty subtrees.
    pub fn take_layout_roots(&mut self) -> Vec<ElementId> {
        let roots: Vec<ElementId> = self.layout_roots.drain().collect();
        for &root in &roots {
            let mut stack = vec![root];
            while let Some(current) = stack.pop() {
                if let Some(node) = self.node_mut(current) {
                    if node.layout.is_dirty {
                        node.layout.is_dirty = false;
                        stack.extend_from_slice(&node.layout.children);
                    }
                }
            }
        }
        roots
    }

    pub fn has_measure_function(&self, id: ElementId) -> bool {
        self.node(id).map(|n| n.layout.measure_defined).unwrap_or(false)
    }

    /// Last size returned by [`Tree::measure`].
    pub fn measured_size(&self, id: ElementId) -> Option<Size> {
        self.node(id).and_then(|n| n.layout.measured)
    }

    /// Ask an element to measure its content.
    ///
    /// Returns `Ok(None)` when the element currently has no measure function.
    pub fn measure(
        &mut self,
        id: ElementId,
        width: f32,
        width_mode: MeasureMode,
        height: f32,
        height_mode: MeasureMode,
    ) -> Result<Option<Size>> {
        if !self.node_or_err(id)?.layout.measure_defined {
            return Ok(None);
        }

        let size = self.with_element_mut(id, |element, tree| {
            element.measure(tree, id, width, width_mode, height, height_mode)
        });

        if let (Some(size), Some(node)) = (size, self.node_mut(id)) {
            node.layout.measured = Some(size);
        }
        Ok(size)
    }

    /// Run `f` with the panel in its layout phase.
    ///
    /// Work scheduled on the panel while the phase is active runs once it ends.
    pub fn run_layout_pass<R>(&mut self, panel: PanelId, f: impl FnOnce(&mut Tree) -> R) -> Result<R> {
        let entry = self.panel_mut(panel).ok_or(HierarchyError::StalePanel(panel))?;
        entry.during_layout = true;
        log::trace!("layout pass start on {:?}", panel);

        let result = f(self);

        if let Some(entry) = self.panel_mut(panel) {
            entry.during_layout = false;
        }
        self.run_scheduled(panel);
        Ok(result)
    }

    /// True when `id` belongs to a panel that is computing layout.
    pub fn is_in_layout_phase(&self, id: ElementId) -> bool {
        self.panel_of(id)
            .and_then(|p| self.panel(p))
            .map(|p| p.during_layout)
            .unwrap_or(false)
    }
}
