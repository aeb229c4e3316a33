//! Physical hierarchy mutations.
//!
//! [`Hierarchy`] edits the physical child list of one element and keeps the
//! layout mirror, IMGUI descendant counts, inherited state and panel
//! membership consistent with it. Every call validates its arguments before
//! touching anything, so a failed call leaves the tree unchanged.

use std::cmp::Ordering;

use crate::error::{HierarchyError, Result};
use crate::events::{HierarchyChange, VersionChange};
use crate::geometry::LanguageDirection;
use crate::panel::PanelId;
use crate::tree::{ElementFlags, ElementId, Tree};

const STRUCTURE: VersionChange = VersionChange::HIERARCHY.union(VersionChange::LAYOUT);

/// Handle for the physical children of one element.
pub struct Hierarchy<'a> {
    tree: &'a mut Tree,
    owner: ElementId,
}

impl Tree {
    /// Physical-hierarchy access for `owner`.
    pub fn hierarchy(&mut self, owner: ElementId) -> Hierarchy<'_> {
        Hierarchy { tree: self, owner }
    }

    /// Detach `child` from its physical parent. No-op when already detached.
    pub fn remove_from_hierarchy(&mut self, child: ElementId) -> Result<()> {
        match self.node_or_err(child)?.physical_parent {
            Some(parent) => self.hierarchy(parent).remove(child),
            None => Ok(()),
        }
    }

    pub fn bring_to_front(&mut self, id: ElementId) -> Result<()> {
        match self.node_or_err(id)?.physical_parent {
            Some(parent) => self.hierarchy(parent).bring_to_front(id),
            None => Ok(()),
        }
    }

    pub fn send_to_back(&mut self, id: ElementId) -> Result<()> {
        match self.node_or_err(id)?.physical_parent {
            Some(parent) => self.hierarchy(parent).send_to_back(id),
            None => Ok(()),
        }
    }

    /// Move `id` right before `sibling` in their parent's child list.
    pub fn place_behind(&mut self, id: ElementId, sibling: ElementId) -> Result<()> {
        let parent = self.shared_parent(id, sibling)?;
        self.hierarchy(parent).place_behind(id, sibling)
    }

    /// Move `id` right after `sibling` in their parent's child list.
    pub fn place_in_front(&mut self, id: ElementId, sibling: ElementId) -> Result<()> {
        let parent = self.shared_parent(id, sibling)?;
        self.hierarchy(parent).place_in_front(id, sibling)
    }

    fn shared_parent(&self, a: ElementId, b: ElementId) -> Result<ElementId> {
        let parent_a = self.node_or_err(a)?.physical_parent;
        let parent_b = self.node_or_err(b)?.physical_parent;
        match (parent_a, parent_b) {
            (Some(pa), Some(pb)) if pa == pb => Ok(pa),
            _ => Err(HierarchyError::NotSiblings),
        }
    }

    fn ensure_not_in_layout(&self, id: ElementId) -> Result<()> {
        if self.is_in_layout_phase(id) {
            log::error!("hierarchy of {:?} modified during layout", id);
            return Err(HierarchyError::DuringLayout);
        }
        Ok(())
    }

    /// IMGUI containers in the subtree rooted at `id`, `id` included.
    fn imgui_weight(&self, id: ElementId) -> usize {
        self.node(id)
            .map(|n| n.imgui_descendants + n.flags.contains(ElementFlags::IMGUI_CONTAINER) as usize)
            .unwrap_or(0)
    }

    /// Apply `delta` to `start` and every ancestor of it.
    fn change_imgui_descendants(&mut self, start: ElementId, delta: isize) {
        if delta == 0 {
            return;
        }
        let mut current = Some(start);
        while let Some(id) = current {
            let Some(node) = self.node_mut(id) else { break };
            node.imgui_descendants = (node.imgui_descendants as isize + delta).max(0) as usize;
            current = node.physical_parent;
        }
    }

    fn attach_to_parent(&mut self, child: ElementId, parent: ElementId) {
        let (enabled, direction, panel) = match self.node(parent) {
            Some(p) => (p.enabled_in_hierarchy, p.local_language_direction, p.panel),
            None => return,
        };
        let inherits = match self.node_mut(child) {
            Some(node) => {
                node.physical_parent = Some(parent);
                node.logical_parent = Some(parent);
                node.language_direction == LanguageDirection::Inherit
            }
            None => return,
        };

        self.propagate_enabled(child, enabled);
        if inherits {
            self.propagate_language_direction(child, direction);
        }
        self.set_panel_recursive(child, panel);
    }

    fn detach_from_parent(&mut self, child: ElementId) {
        let inherits = match self.node_mut(child) {
            Some(node) => {
                node.physical_parent = None;
                node.logical_parent = None;
                node.language_direction == LanguageDirection::Inherit
            }
            None => return,
        };

        self.propagate_enabled(child, true);
        if inherits {
            self.propagate_language_direction(child, LanguageDirection::Inherit);
        }
        self.set_panel_recursive(child, None);
    }

    fn set_panel_recursive(&mut self, root: ElementId, panel: Option<PanelId>) {
        let mut changed = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let Some(node) = self.node_mut(id) else { continue };
            // Children always share their parent's panel.
            if node.panel == panel {
                continue;
            }
            let old = std::mem::replace(&mut node.panel, panel);
            changed.push((id, old, node.flags.contains(ElementFlags::IMGUI_CONTAINER)));
            stack.extend_from_slice(node.children.as_slice());
        }

        for (id, old, is_imgui) in changed {
            if let Some(p) = old.and_then(|p| self.panels.get_mut(p.index())) {
                p.on_element_detached(id, is_imgui);
            }
            if let Some(p) = panel.and_then(|p| self.panels.get_mut(p.index())) {
                p.on_element_attached(id, is_imgui);
            }
        }
    }

    /// Put the measure function back once an element that needs one is a
    /// leaf again.
    fn restore_measure_function(&mut self, id: ElementId) {
        if let Some(node) = self.node_mut(id) {
            if node.children.is_empty() && node.flags.contains(ElementFlags::REQUIRE_MEASURE) {
                node.layout.measure_defined = true;
            }
        }
    }
}

impl Hierarchy<'_> {
    pub fn owner(&self) -> ElementId {
        self.owner
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.tree.physical_parent(self.owner)
    }

    pub fn child_count(&self) -> usize {
        self.tree.physical_child_count(self.owner)
    }

    pub fn children(&self) -> &[ElementId] {
        self.tree.physical_children(self.owner)
    }

    pub fn element_at(&self, index: usize) -> Option<ElementId> {
        self.children().get(index).copied()
    }

    pub fn index_of(&self, child: ElementId) -> Option<usize> {
        self.children().iter().position(|&c| c == child)
    }

    pub fn add(&mut self, child: ElementId) -> Result<()> {
        let count = self.tree.node_or_err(self.owner)?.children.len();
        self.insert(count, child)
    }

    pub fn insert(&mut self, index: usize, child: ElementId) -> Result<()> {
        let owner = self.owner;
        let tree = &mut *self.tree;

        let count = tree.node_or_err(owner)?.children.len();
        tree.node_or_err(child)?;
        if index > count {
            return Err(HierarchyError::IndexOutOfRange { index, count });
        }
        if child == owner {
            return Err(HierarchyError::SelfInsertion);
        }
        if tree.contains(child, owner) {
            return Err(HierarchyError::WouldCreateCycle);
        }
        tree.ensure_not_in_layout(owner)?;
        tree.ensure_not_in_layout(child)?;

        tree.remove_from_hierarchy(child)?;

        let Some((node, pool)) = tree.node_and_pool_mut(owner) else {
            return Err(HierarchyError::StaleElement(owner));
        };
        pool.materialize(&mut node.children);
        // Structural children and a measure function are mutually exclusive.
        node.layout.measure_defined = false;

        let Some(list) = node.children.owned_mut() else {
            return Err(HierarchyError::StaleElement(owner));
        };
        let position = if index >= list.len() {
            list.push(child);
            node.layout.children.push(child);
            list.len() - 1
        } else {
            list.insert(index, child);
            node.layout.children.insert(index, child);
            index
        };

        let weight = tree.imgui_weight(child);
        tree.change_imgui_descendants(owner, weight as isize);

        tree.attach_to_parent(child, owner);

        log::trace!("inserted {:?} into {:?} at {}", child, owner, position);
        tree.record_hierarchy_change(child, HierarchyChange::AddedToParent);
        tree.increment_version(child, VersionChange::HIERARCHY);
        tree.increment_version(owner, STRUCTURE);
        tree.fire_element_added(owner, child, position);
        Ok(())
    }

    pub fn remove(&mut self, child: ElementId) -> Result<()> {
        self.tree.node_or_err(child)?;
        let index = self
            .tree
            .node_or_err(self.owner)?
            .children
            .index_of(child)
            .ok_or(HierarchyError::NotAChild(child))?;
        self.remove_at(index).map(|_| ())
    }

    /// Remove and return the child at `index`.
    pub fn remove_at(&mut self, index: usize) -> Result<ElementId> {
        let owner = self.owner;
        let tree = &mut *self.tree;

        let node = tree.node_or_err(owner)?;
        let count = node.children.len();
        let panel = node.panel;
        let child = node
            .children
            .get(index)
            .ok_or(HierarchyError::IndexOutOfRange { index, count })?;
        tree.ensure_not_in_layout(owner)?;

        tree.record_hierarchy_change(child, HierarchyChange::RemovedFromParent);

        if let Some((node, pool)) = tree.node_and_pool_mut(owner) {
            if let Some(list) = node.children.owned_mut() {
                list.remove(index);
            }
            node.layout.children.remove(index);
            if node.children.is_empty() {
                pool.release(&mut node.children);
            }
        }

        let weight = tree.imgui_weight(child);
        tree.change_imgui_descendants(owner, -(weight as isize));

        tree.detach_from_parent(child);
        tree.restore_measure_function(owner);

        log::trace!("removed {:?} from {:?}", child, owner);
        tree.notify_panel(panel, child, VersionChange::HIERARCHY);
        tree.increment_version(owner, STRUCTURE);
        tree.fire_element_removed(owner, child);
        Ok(child)
    }

    /// Remove every child.
    ///
    /// Fires one removal notification per child but bumps the owner's
    /// version once.
    pub fn clear(&mut self) -> Result<()> {
        let owner = self.owner;
        let tree = &mut *self.tree;

        let panel = tree.node_or_err(owner)?.panel;
        tree.ensure_not_in_layout(owner)?;
        if tree.physical_child_count(owner) == 0 {
            return Ok(());
        }

        let snapshot = match tree.node_and_pool_mut(owner) {
            Some((node, pool)) => {
                let snapshot = pool.copy(node.children.as_slice());
                pool.release(&mut node.children);
                node.layout.children.clear();
                snapshot
            }
            None => return Err(HierarchyError::StaleElement(owner)),
        };
        tree.restore_measure_function(owner);

        for &child in &snapshot {
            tree.record_hierarchy_change(child, HierarchyChange::RemovedFromParent);
            tree.detach_from_parent(child);
            tree.notify_panel(panel, child, VersionChange::HIERARCHY);
            tree.fire_element_removed(owner, child);
        }

        let removed = tree.node(owner).map(|n| n.imgui_descendants).unwrap_or(0);
        tree.change_imgui_descendants(owner, -(removed as isize));

        log::trace!("cleared {} children of {:?}", snapshot.len(), owner);
        tree.pool.recycle(snapshot);
        tree.increment_version(owner, STRUCTURE);
        Ok(())
    }

    /// Reorder the children with `compare` and rebuild the layout mirror.
    pub fn sort(&mut self, mut compare: impl FnMut(&Tree, ElementId, ElementId) -> Ordering) -> Result<()> {
        let owner = self.owner;
        let tree = &mut *self.tree;

        let count = tree.node_or_err(owner)?.children.len();
        tree.ensure_not_in_layout(owner)?;
        if count <= 1 {
            return Ok(());
        }

        let children = tree.physical_children(owner).to_vec();
        let mut ordered = tree.pool.copy(&children);
        ordered.sort_by(|&a, &b| compare(&*tree, a, b));

        if let Some(node) = tree.node_mut(owner) {
            if let Some(list) = node.children.owned_mut() {
                list.clear();
                list.extend_from_slice(&ordered);
            }
            node.layout.children.clear();
            node.layout.children.extend_from_slice(&ordered);
        }
        tree.pool.recycle(ordered);

        tree.record_hierarchy_change(owner, HierarchyChange::ChildrenReordered);
        tree.increment_version(owner, STRUCTURE);
        Ok(())
    }

    pub(crate) fn bring_to_front(&mut self, child: ElementId) -> Result<()> {
        let current = self.index_of(child).ok_or(HierarchyError::NotAChild(child))?;
        let count = self.child_count();
        if current + 1 >= count {
            return Ok(());
        }
        self.move_child(child, current, count)
    }

    pub(crate) fn send_to_back(&mut self, child: ElementId) -> Result<()> {
        let current = self.index_of(child).ok_or(HierarchyError::NotAChild(child))?;
        if current == 0 {
            return Ok(());
        }
        self.move_child(child, current, 0)
    }

    pub(crate) fn place_behind(&mut self, child: ElementId, over: ElementId) -> Result<()> {
        let current = self.index_of(child).ok_or(HierarchyError::NotAChild(child))?;
        let mut next = self.index_of(over).ok_or(HierarchyError::NotAChild(over))?;
        if next > 0 && current < next {
            next -= 1;
        }
        self.move_child(child, current, next)
    }

    pub(crate) fn place_in_front(&mut self, child: ElementId, under: ElementId) -> Result<()> {
        let current = self.index_of(child).ok_or(HierarchyError::NotAChild(child))?;
        let mut next = self.index_of(under).ok_or(HierarchyError::NotAChild(under))?;
        if current > next {
            next += 1;
        }
        self.move_child(child, current, next)
    }

    fn move_child(&mut self, child: ElementId, current: usize, next: usize) -> Result<()> {
        if current == next {
            return Ok(());
        }
        let owner = self.owner;
        let tree = &mut *self.tree;
        tree.ensure_not_in_layout(owner)?;

        tree.record_hierarchy_change(child, HierarchyChange::RemovedFromParent);
        if let Some(node) = tree.node_mut(owner) {
            if let Some(list) = node.children.owned_mut() {
                list.remove(current);
                node.layout.children.remove(current);
                if next >= list.len() {
                    list.push(child);
                    node.layout.children.push(child);
                } else {
                    list.insert(next, child);
                    node.layout.children.insert(next, child);
                }
            }
        }
        tree.record_hierarchy_change(child, HierarchyChange::AddedToParent);
        tree.increment_version(owner, STRUCTURE);
        Ok(())
    }
}
