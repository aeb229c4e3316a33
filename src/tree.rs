//! Arena-based element storage.
//!
//! The Tree owns every element of every panel using a sparse-set layout with
//! generational indices. Structural data (parents, child lists, layout mirror,
//! panel membership, flags) lives in the node; the element's behaviour lives
//! next to it behind `Box<dyn Element>` and is extracted while it runs so it
//! can mutate the tree.
//!
//! ## Key Features
//!
//! - **Generational Indices**: ElementId contains index + generation so a
//!   stale id never resolves to an element allocated later in the same slot.
//!
//! - **Dense Storage**: Nodes are stored contiguously and removed with
//!   swap-remove.
//!
//! - **Dual Parents**: Each node records its physical parent (the one whose
//!   child list contains it) and its logical parent (the element user code
//!   added it to, which may be a composite wrapping the physical parent).

use std::collections::HashSet;

use bitflags::bitflags;

use crate::child_list::{ChildList, ChildListPool};
use crate::element::Element;
use crate::error::{HierarchyError, Result};
use crate::events::HierarchyChange;
use crate::geometry::{LanguageDirection, Rect};
use crate::imgui::ImguiContainer;
use crate::layout::LayoutNode;
use crate::panel::{Panel, PanelId};
use crate::transform::Transform;

/// Unique identifier for an element in the tree.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct ElementId {
    index: u32,
    generation: u32,
}

impl ElementId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Combines generation (high bits) with index (low bits).
    pub fn as_u64(self) -> u64 {
        ((self.generation as u64) << 32) | (self.index as u64)
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
    pub struct ElementFlags: u16 {
        /// Root of a composite control. Bounds event retargeting.
        const COMPOSITE_ROOT        = 1 << 0;
        /// Top-level container of a window's content.
        const ROOT_VISUAL_CONTAINER = 1 << 1;
        const IMGUI_CONTAINER       = 1 << 2;
        /// Behaviour supplies a measure function while it has no children.
        const REQUIRE_MEASURE       = 1 << 3;
        const FOCUSABLE             = 1 << 4;
        /// Locally enabled. Effective state also depends on ancestors.
        const ENABLED               = 1 << 5;
    }
}

#[derive(Default)]
pub(crate) struct Observers {
    pub(crate) added: Vec<Box<dyn FnMut(ElementId, usize)>>,
    pub(crate) removed: Vec<Box<dyn FnMut(ElementId)>>,
}

pub(crate) struct Node {
    /// `None` while the behaviour is extracted by `with_element_mut`.
    pub(crate) element: Option<Box<dyn Element>>,
    pub(crate) name: Option<String>,
    pub(crate) physical_parent: Option<ElementId>,
    pub(crate) logical_parent: Option<ElementId>,
    pub(crate) children: ChildList,
    pub(crate) layout: LayoutNode,
    pub(crate) panel: Option<PanelId>,
    pub(crate) flags: ElementFlags,
    pub(crate) enabled_in_hierarchy: bool,
    pub(crate) language_direction: LanguageDirection,
    pub(crate) local_language_direction: LanguageDirection,
    /// Number of IMGUI containers strictly below this element.
    pub(crate) imgui_descendants: usize,
    pub(crate) version: u64,
    pub(crate) layout_rect: Rect,
    pub(crate) observers: Observers,
    sparse_index: u32,
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

/// Central store for the element hierarchy of every panel.
pub struct Tree {
    dense: Vec<Node>,
    sparse: Vec<Option<SparseEntry>>,
    /// Generation to hand out next for each sparse slot.
    generations: Vec<u32>,
    free_indices: Vec<u32>,
    pub(crate) pool: ChildListPool,
    pub(crate) panels: Vec<Panel>,
    pub(crate) layout_roots: HashSet<ElementId>,
    pub(crate) hierarchy_changes: Vec<(ElementId, HierarchyChange)>,
}

impl Tree {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            generations: Vec::new(),
            free_indices: Vec::new(),
            pool: ChildListPool::new(),
            panels: Vec::new(),
            layout_roots: HashSet::new(),
            hierarchy_changes: Vec::new(),
        }
    }

    /// Store an element and return its id. The element starts detached.
    pub fn create_element(&mut self, element: impl Element + 'static) -> ElementId {
        self.create_boxed(Box::new(element))
    }

    pub fn create_boxed(&mut self, element: Box<dyn Element>) -> ElementId {
        let (sparse_index, generation) = match self.free_indices.pop() {
            Some(idx) => (idx, self.generations[idx as usize]),
            None => {
                let idx = self.sparse.len() as u32;
                self.sparse.push(None);
                self.generations.push(0);
                (idx, 0)
            }
        };

        let mut flags = ElementFlags::ENABLED;
        if element.requires_measure() {
            flags |= ElementFlags::REQUIRE_MEASURE;
        }
        if element.focusable() {
            flags |= ElementFlags::FOCUSABLE;
        }
        if element.as_imgui_container().is_some() {
            flags |= ElementFlags::IMGUI_CONTAINER;
        }

        let mut layout = LayoutNode::default();
        layout.measure_defined = flags.contains(ElementFlags::REQUIRE_MEASURE);

        let id = ElementId::new(sparse_index, generation);
        let dense_index = self.dense.len();
        self.dense.push(Node {
            element: Some(element),
            name: None,
            physical_parent: None,
            logical_parent: None,
            children: ChildList::default(),
            layout,
            panel: None,
            flags,
            enabled_in_hierarchy: true,
            language_direction: LanguageDirection::Inherit,
            local_language_direction: LanguageDirection::Inherit,
            imgui_descendants: 0,
            version: 0,
            layout_rect: Rect::ZERO,
            observers: Observers::default(),
            sparse_index,
        });
        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index,
            generation,
        });

        log::trace!("created element {:?}", id);
        id
    }

    /// Detach `id` and drop it together with its whole physical subtree.
    pub fn destroy_element(&mut self, id: ElementId) -> Result<()> {
        if !self.contains_element(id) {
            return Err(HierarchyError::StaleElement(id));
        }
        self.remove_from_hierarchy(id)?;

        let mut doomed = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node(current) {
                stack.extend_from_slice(node.children.as_slice());
                doomed.push(current);
            }
        }

        for current in doomed {
            self.unregister(current);
        }
        Ok(())
    }

    fn unregister(&mut self, id: ElementId) {
        let dense_index = match self.get_dense_index(id) {
            Some(idx) => idx,
            None => return,
        };

        let last_dense_index = self.dense.len() - 1;
        let mut removed = self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse_idx as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }

        if let Some(panel) = removed.panel.and_then(|p| self.panels.get_mut(p.index())) {
            panel.on_element_detached(id, removed.flags.contains(ElementFlags::IMGUI_CONTAINER));
        }
        self.pool.release(&mut removed.children);

        self.sparse[id.index as usize] = None;
        self.generations[id.index as usize] = id.generation.wrapping_add(1);
        self.free_indices.push(id.index);
        self.layout_roots.remove(&id);
    }

    fn get_dense_index(&self, id: ElementId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub(crate) fn node(&self, id: ElementId) -> Option<&Node> {
        self.get_dense_index(id).map(|idx| &self.dense[idx])
    }

    pub(crate) fn node_mut(&mut self, id: ElementId) -> Option<&mut Node> {
        self.get_dense_index(id).map(move |idx| &mut self.dense[idx])
    }

    /// Node plus the child-list pool, borrowed together.
    pub(crate) fn node_and_pool_mut(&mut self, id: ElementId) -> Option<(&mut Node, &mut ChildListPool)> {
        let idx = self.get_dense_index(id)?;
        Some((&mut self.dense[idx], &mut self.pool))
    }

    pub(crate) fn node_or_err(&self, id: ElementId) -> Result<&Node> {
        self.node(id).ok_or(HierarchyError::StaleElement(id))
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn element_count(&self) -> usize {
        self.dense.len()
    }

    /// Access an element's behaviour. Returns `None` for stale ids and for
    /// elements whose behaviour is currently running.
    pub fn with_element<R>(&self, id: ElementId, f: impl FnOnce(&dyn Element) -> R) -> Option<R> {
        self.node(id)
            .and_then(|node| node.element.as_deref())
            .map(f)
    }

    /// Run `f` with the element's behaviour and the tree.
    ///
    /// The behaviour is taken out of its node for the duration of the call, so
    /// `f` may freely mutate the tree. Re-entrant calls for the same id
    /// return `None`.
    pub fn with_element_mut<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut dyn Element, &mut Tree) -> R,
    ) -> Option<R> {
        let mut element = self.node_mut(id)?.element.take()?;

        let result = f(&mut *element, self);

        // The element may have been destroyed by `f`.
        if let Some(node) = self.node_mut(id) {
            node.element = Some(element);
        }

        Some(result)
    }

    /// Run `f` against an element's IMGUI container behaviour, if it has one.
    pub fn with_imgui_container_mut<R>(
        &mut self,
        id: ElementId,
        f: impl FnOnce(&mut ImguiContainer, &mut Tree) -> R,
    ) -> Option<R> {
        self.with_element_mut(id, |element, tree| {
            element.as_imgui_container_mut().map(|container| f(container, tree))
        })
        .flatten()
    }

    pub fn name(&self, id: ElementId) -> Option<&str> {
        self.node(id).and_then(|n| n.name.as_deref())
    }

    pub fn set_name(&mut self, id: ElementId, name: impl Into<String>) {
        if let Some(node) = self.node_mut(id) {
            node.name = Some(name.into());
        }
    }

    pub fn flags(&self, id: ElementId) -> ElementFlags {
        self.node(id).map(|n| n.flags).unwrap_or_default()
    }

    pub fn set_composite_root(&mut self, id: ElementId, value: bool) {
        if let Some(node) = self.node_mut(id) {
            node.flags.set(ElementFlags::COMPOSITE_ROOT, value);
        }
    }

    pub fn set_root_visual_container(&mut self, id: ElementId, value: bool) {
        if let Some(node) = self.node_mut(id) {
            node.flags.set(ElementFlags::ROOT_VISUAL_CONTAINER, value);
        }
    }

    pub fn set_focusable(&mut self, id: ElementId, value: bool) {
        if let Some(node) = self.node_mut(id) {
            node.flags.set(ElementFlags::FOCUSABLE, value);
        }
    }

    /// Set the local enabled state and recompute the effective state of the
    /// subtree.
    pub fn set_enabled(&mut self, id: ElementId, enabled: bool) {
        let parent_enabled = match self.node_mut(id) {
            Some(node) => {
                node.flags.set(ElementFlags::ENABLED, enabled);
                node.physical_parent
            }
            None => return,
        }
        .map(|p| self.enabled_in_hierarchy(p))
        .unwrap_or(true);
        self.propagate_enabled(id, parent_enabled);
    }

    pub fn enabled_self(&self, id: ElementId) -> bool {
        self.flags(id).contains(ElementFlags::ENABLED)
    }

    pub fn enabled_in_hierarchy(&self, id: ElementId) -> bool {
        self.node(id).map(|n| n.enabled_in_hierarchy).unwrap_or(false)
    }

    pub(crate) fn propagate_enabled(&mut self, id: ElementId, parent_enabled: bool) {
        let mut stack = vec![(id, parent_enabled)];
        while let Some((current, inherited)) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                let effective = inherited && node.flags.contains(ElementFlags::ENABLED);
                node.enabled_in_hierarchy = effective;
                stack.extend(node.children.as_slice().iter().map(|&c| (c, effective)));
            }
        }
    }

    /// Set the explicit reading direction. `Inherit` falls back to the parent's.
    pub fn set_language_direction(&mut self, id: ElementId, direction: LanguageDirection) {
        let parent = match self.node_mut(id) {
            Some(node) => {
                node.language_direction = direction;
                node.physical_parent
            }
            None => return,
        };
        let resolved = match direction {
            LanguageDirection::Inherit => parent
                .map(|p| self.local_language_direction(p))
                .unwrap_or(LanguageDirection::Inherit),
            explicit => explicit,
        };
        self.propagate_language_direction(id, resolved);
    }

    pub fn language_direction(&self, id: ElementId) -> LanguageDirection {
        self.node(id).map(|n| n.language_direction).unwrap_or_default()
    }

    /// Effective direction after inheritance.
    pub fn local_language_direction(&self, id: ElementId) -> LanguageDirection {
        self.node(id).map(|n| n.local_language_direction).unwrap_or_default()
    }

    pub(crate) fn propagate_language_direction(&mut self, id: ElementId, resolved: LanguageDirection) {
        if let Some(node) = self.node_mut(id) {
            node.local_language_direction = resolved;
        }
        let mut stack: Vec<ElementId> = self.physical_children(id).to_vec();
        while let Some(current) = stack.pop() {
            if let Some(node) = self.node_mut(current) {
                if node.language_direction == LanguageDirection::Inherit {
                    node.local_language_direction = resolved;
                    stack.extend_from_slice(node.children.as_slice());
                }
            }
        }
    }

    /// Number of IMGUI containers strictly below `id`.
    pub fn imgui_container_descendant_count(&self, id: ElementId) -> usize {
        self.node(id).map(|n| n.imgui_descendants).unwrap_or(0)
    }

    pub fn version(&self, id: ElementId) -> u64 {
        self.node(id).map(|n| n.version).unwrap_or(0)
    }

    pub fn panel_of(&self, id: ElementId) -> Option<PanelId> {
        self.node(id).and_then(|n| n.panel)
    }

    /// Rect relative to the physical parent, as assigned by layout.
    pub fn layout_rect(&self, id: ElementId) -> Rect {
        self.node(id).map(|n| n.layout_rect).unwrap_or(Rect::ZERO)
    }

    pub fn set_layout_rect(&mut self, id: ElementId, rect: Rect) {
        if let Some(node) = self.node_mut(id) {
            node.layout_rect = rect;
        }
    }

    /// Accumulated offset of `id` from the root of its tree.
    pub fn world_transform(&self, id: ElementId) -> Transform {
        let mut x = 0.0;
        let mut y = 0.0;
        let mut current = self.node(id).and_then(|n| n.physical_parent);
        if let Some(node) = self.node(id) {
            x += node.layout_rect.x;
            y += node.layout_rect.y;
        }
        while let Some(parent) = current {
            let Some(node) = self.node(parent) else { break };
            x += node.layout_rect.x;
            y += node.layout_rect.y;
            current = node.physical_parent;
        }
        Transform::translate(x, y)
    }

    /// Layout rect of `id` in world space.
    pub fn world_bound(&self, id: ElementId) -> Rect {
        let size = self.layout_rect(id).size();
        self.world_transform(id).transform_rect(&Rect::from_size(size))
    }

    /// Physical parent: the element whose child list holds `id`.
    pub fn physical_parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.physical_parent)
    }

    /// Logical parent: the element `id` was added to through the content API.
    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.node(id).and_then(|n| n.logical_parent)
    }

    pub fn physical_children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn physical_child_count(&self, id: ElementId) -> usize {
        self.physical_children(id).len()
    }

    /// Mirror of the physical children kept by the layout node.
    pub fn layout_children(&self, id: ElementId) -> &[ElementId] {
        self.node(id).map(|n| n.layout.children.as_slice()).unwrap_or(&[])
    }

    /// True while `id` holds a pooled child buffer instead of the shared
    /// empty sentinel.
    pub fn has_owned_child_list(&self, id: ElementId) -> bool {
        self.node(id).map(|n| !n.children.is_shared()).unwrap_or(false)
    }

    pub fn pooled_child_lists_in_use(&self) -> usize {
        self.pool.in_use()
    }

    pub fn panel(&self, id: PanelId) -> Option<&Panel> {
        self.panels.get(id.index())
    }

    pub fn panel_mut(&mut self, id: PanelId) -> Option<&mut Panel> {
        self.panels.get_mut(id.index())
    }
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::VisualElement;

    struct Counter {
        measured: bool,
    }

    impl Element for Counter {
        fn requires_measure(&self) -> bool {
            self.measured
        }
    }

    #[test]
    fn test_create_and_destroy() {
        let mut tree = Tree::new();
        let a = tree.create_element(VisualElement::new());
        let b = tree.create_element(VisualElement::new());

        assert!(tree.contains_element(a));
        assert!(tree.contains_element(b));
        assert_eq!(tree.element_count(), 2);

        tree.destroy_element(a).unwrap();
        assert!(!tree.contains_element(a));
        assert!(tree.contains_element(b));
        assert_eq!(tree.element_count(), 1);
    }

    #[test]
    fn test_generation_prevents_stale_access() {
        let mut tree = Tree::new();
        let first = tree.create_element(VisualElement::new());
        tree.destroy_element(first).unwrap();

        let second = tree.create_element(VisualElement::new());
        assert!(!tree.contains_element(first));
        assert!(tree.contains_element(second));
        assert_ne!(first, second);
        assert_eq!(
            tree.destroy_element(first),
            Err(HierarchyError::StaleElement(first))
        );
    }

    #[test]
    fn test_destroy_takes_subtree() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let child = tree.create_element(VisualElement::new());
        let grandchild = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(child).unwrap();
        tree.hierarchy(child).add(grandchild).unwrap();

        tree.destroy_element(child).unwrap();
        assert!(tree.contains_element(root));
        assert!(!tree.contains_element(child));
        assert!(!tree.contains_element(grandchild));
        assert_eq!(tree.physical_child_count(root), 0);
        assert!(!tree.has_owned_child_list(root));
        assert_eq!(tree.pooled_child_lists_in_use(), 0);
    }

    #[test]
    fn test_with_element_mut_is_not_reentrant() {
        let mut tree = Tree::new();
        let id = tree.create_element(VisualElement::new());

        let inner = tree.with_element_mut(id, |_, tree| tree.with_element_mut(id, |_, _| ()));
        assert_eq!(inner, Some(None));
        assert!(tree.with_element(id, |_| ()).is_some());
    }

    #[test]
    fn test_requires_measure_sets_flag_and_measure_function() {
        let mut tree = Tree::new();
        let plain = tree.create_element(Counter { measured: false });
        let measured = tree.create_element(Counter { measured: true });

        assert!(!tree.flags(plain).contains(ElementFlags::REQUIRE_MEASURE));
        assert!(tree.flags(measured).contains(ElementFlags::REQUIRE_MEASURE));
        assert!(tree.has_measure_function(measured));
        assert!(!tree.has_measure_function(plain));
    }

    #[test]
    fn test_enabled_propagates() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let child = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(child).unwrap();

        tree.set_enabled(root, false);
        assert!(!tree.enabled_in_hierarchy(child));
        assert!(tree.enabled_self(child));

        tree.set_enabled(root, true);
        assert!(tree.enabled_in_hierarchy(child));
    }

    #[test]
    fn test_world_transform_accumulates_offsets() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let child = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(child).unwrap();
        tree.set_layout_rect(root, Rect::new(10.0, 20.0, 200.0, 200.0));
        tree.set_layout_rect(child, Rect::new(5.0, 5.0, 50.0, 40.0));

        assert_eq!(tree.world_bound(child), Rect::new(15.0, 25.0, 50.0, 40.0));
    }
}
