//! Logical child API.
//!
//! These calls go through an element's content container, so adding to a
//! composite places the child inside the composite's content element while
//! its logical parent stays the composite.

use std::cmp::Ordering;

use crate::error::{HierarchyError, Result};
use crate::tree::{ElementId, Tree};

impl Tree {
    /// The element that directly receives logical children of `id`.
    ///
    /// An element whose behaviour is currently running is its own container.
    pub fn content_container(&self, id: ElementId) -> Result<ElementId> {
        self.node_or_err(id)?;
        match self.with_element(id, |e| e.content_container(id)) {
            Some(Some(container)) => Ok(container),
            Some(None) => Err(HierarchyError::NoContentContainer),
            None => Ok(id),
        }
    }

    /// Follow content containers until one points at itself.
    fn resolve_container(&self, id: ElementId) -> Result<ElementId> {
        let mut current = id;
        loop {
            let next = self.content_container(current)?;
            if next == current {
                return Ok(current);
            }
            current = next;
        }
    }

    pub fn add(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let count = self.child_count(parent);
        self.insert(parent, count, child)
    }

    pub fn insert(&mut self, parent: ElementId, index: usize, child: ElementId) -> Result<()> {
        self.node_or_err(child)?;
        let container = self.content_container(parent)?;
        if container == parent {
            self.hierarchy(parent).insert(index, child)?;
        } else {
            self.insert(container, index, child)?;
        }

        if let Some(node) = self.node_mut(child) {
            node.logical_parent = Some(parent);
        }
        Ok(())
    }

    /// Add straight into `parent`'s physical children.
    pub fn add_ignoring_content_container(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        self.hierarchy(parent).add(child)
    }

    pub fn insert_ignoring_content_container(
        &mut self,
        parent: ElementId,
        index: usize,
        child: ElementId,
    ) -> Result<()> {
        self.hierarchy(parent).insert(index, child)
    }

    pub fn remove(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        let container = self.resolve_container(parent)?;
        self.hierarchy(container).remove(child)
    }

    pub fn remove_at(&mut self, parent: ElementId, index: usize) -> Result<ElementId> {
        let container = self.resolve_container(parent)?;
        self.hierarchy(container).remove_at(index)
    }

    pub fn clear(&mut self, parent: ElementId) -> Result<()> {
        let container = self.resolve_container(parent)?;
        self.hierarchy(container).clear()
    }

    pub fn sort(
        &mut self,
        parent: ElementId,
        compare: impl FnMut(&Tree, ElementId, ElementId) -> Ordering,
    ) -> Result<()> {
        let container = self.resolve_container(parent)?;
        self.hierarchy(container).sort(compare)
    }

    /// Logical children of `parent`. Empty when it has no content container.
    pub fn children(&self, parent: ElementId) -> &[ElementId] {
        match self.resolve_container(parent) {
            Ok(container) => self.physical_children(container),
            Err(_) => &[],
        }
    }

    pub fn child_count(&self, parent: ElementId) -> usize {
        self.children(parent).len()
    }

    pub fn index_of(&self, parent: ElementId, child: ElementId) -> Option<usize> {
        self.children(parent).iter().position(|&c| c == child)
    }

    pub fn element_at(&self, parent: ElementId, index: usize) -> Result<ElementId> {
        let children = self.children(parent);
        children
            .get(index)
            .copied()
            .ok_or(HierarchyError::IndexOutOfRange {
                index,
                count: children.len(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Composite, VisualElement};

    #[test]
    fn test_add_to_plain_element_is_physical() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let child = tree.create_element(VisualElement::new());

        tree.add(root, child).unwrap();
        assert_eq!(tree.parent(child), Some(root));
        assert_eq!(tree.physical_parent(child), Some(root));
        assert_eq!(tree.children(root), &[child]);
    }

    #[test]
    fn test_add_to_composite_redirects() {
        let mut tree = Tree::new();
        let (composite, content) = Composite::build(&mut tree).unwrap();
        let child = tree.create_element(VisualElement::new());

        tree.add(composite, child).unwrap();
        assert_eq!(tree.parent(child), Some(composite));
        assert_eq!(tree.physical_parent(child), Some(content));
        assert_eq!(tree.children(composite), &[child]);
        assert_eq!(tree.child_count(composite), 1);
        assert_eq!(tree.physical_children(composite), &[content]);
        assert_eq!(tree.element_at(composite, 0), Ok(child));
        assert_eq!(tree.index_of(composite, child), Some(0));

        tree.remove(composite, child).unwrap();
        assert_eq!(tree.parent(child), None);
        assert_eq!(tree.child_count(composite), 0);
    }

    #[test]
    fn test_nested_composites_resolve_to_innermost_content() {
        let mut tree = Tree::new();
        let (outer, outer_content) = Composite::build(&mut tree).unwrap();
        let (inner, inner_content) = Composite::build(&mut tree).unwrap();
        tree.add_ignoring_content_container(outer_content, inner).unwrap();

        let child = tree.create_element(VisualElement::new());
        tree.add(inner, child).unwrap();
        assert_eq!(tree.physical_parent(child), Some(inner_content));
        assert_eq!(tree.parent(child), Some(inner));
        assert_eq!(tree.children(outer), &[inner]);
    }

    #[test]
    fn test_ignoring_content_container() {
        let mut tree = Tree::new();
        let (composite, content) = Composite::build(&mut tree).unwrap();
        let decoration = tree.create_element(VisualElement::new());

        tree.insert_ignoring_content_container(composite, 0, decoration)
            .unwrap();
        assert_eq!(tree.physical_children(composite), &[decoration, content]);
        assert_eq!(tree.parent(decoration), Some(composite));
    }

    #[test]
    fn test_element_at_out_of_range() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        assert_eq!(
            tree.element_at(root, 0),
            Err(HierarchyError::IndexOutOfRange { index: 0, count: 0 })
        );
    }
}
