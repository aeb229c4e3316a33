//! Read-only queries over the physical tree.

use crate::error::Result;
use crate::tree::{ElementFlags, ElementId, Tree};

impl Tree {
    /// True when `ancestor` is a strict physical ancestor of `child`.
    pub fn contains(&self, ancestor: ElementId, child: ElementId) -> bool {
        let mut current = self.physical_parent(child);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.physical_parent(id);
        }
        false
    }

    fn depth(&self, id: ElementId) -> usize {
        let mut depth = 0;
        let mut current = self.physical_parent(id);
        while let Some(parent) = current {
            depth += 1;
            current = self.physical_parent(parent);
        }
        depth
    }

    /// Nearest element that is an ancestor of (or equal to) both `a` and `b`.
    ///
    /// Elements of different panels never share an ancestor.
    pub fn find_common_ancestor(&self, a: ElementId, b: ElementId) -> Result<Option<ElementId>> {
        let panel_a = self.node_or_err(a)?.panel;
        let panel_b = self.node_or_err(b)?.panel;
        if panel_a != panel_b {
            return Ok(None);
        }

        let mut depth_a = self.depth(a);
        let mut depth_b = self.depth(b);
        let mut a = Some(a);
        let mut b = Some(b);

        while depth_a > depth_b {
            a = a.and_then(|id| self.physical_parent(id));
            depth_a -= 1;
        }
        while depth_b > depth_a {
            b = b.and_then(|id| self.physical_parent(id));
            depth_b -= 1;
        }

        while a != b {
            a = a.and_then(|id| self.physical_parent(id));
            b = b.and_then(|id| self.physical_parent(id));
        }
        Ok(a)
    }

    /// Element an event from `this` should appear to come from when observed
    /// relative to `against`.
    ///
    /// Finds the composite root enclosing `against` (or the tree root), then
    /// walks up from `this`. If that boundary is reached, the outermost
    /// composite root crossed on the way is returned, so the internals of a
    /// composite are hidden from observers outside it. If the boundary is
    /// never reached `this` is returned unchanged.
    pub fn retarget_element(&self, this: ElementId, against: Option<ElementId>) -> ElementId {
        let Some(against) = against else {
            return this;
        };

        let mut boundary = self.physical_parent(against).unwrap_or(against);
        while let Some(parent) = self.physical_parent(boundary) {
            if self.flags(boundary).contains(ElementFlags::COMPOSITE_ROOT) {
                break;
            }
            boundary = parent;
        }

        let mut candidate = this;
        let mut current = self.physical_parent(this);
        while current.is_some() {
            current = current.and_then(|id| self.physical_parent(id));
            if current == Some(boundary) {
                return candidate;
            }
            if let Some(id) = current {
                if self.flags(id).contains(ElementFlags::COMPOSITE_ROOT) {
                    candidate = id;
                }
            }
        }
        this
    }

    /// Root of the tree `id` lives in: the panel root when attached.
    pub fn root(&self, id: ElementId) -> ElementId {
        if let Some(panel) = self.panel_of(id).and_then(|p| self.panel(p)) {
            return panel.root();
        }
        let mut current = id;
        while let Some(parent) = self.physical_parent(current) {
            current = parent;
        }
        current
    }

    /// Outermost ancestor (or self) flagged as a root visual container.
    pub fn root_visual_container(&self, id: ElementId) -> Option<ElementId> {
        let mut found = None;
        let mut current = Some(id);
        while let Some(element) = current {
            if self.flags(element).contains(ElementFlags::ROOT_VISUAL_CONTAINER) {
                found = Some(element);
            }
            current = self.physical_parent(element);
        }
        found
    }

    /// Nearest strict ancestor for which `predicate` holds.
    pub fn first_ancestor_where(
        &self,
        id: ElementId,
        mut predicate: impl FnMut(&Tree, ElementId) -> bool,
    ) -> Option<ElementId> {
        let mut current = self.physical_parent(id);
        while let Some(ancestor) = current {
            if predicate(self, ancestor) {
                return Some(ancestor);
            }
            current = self.physical_parent(ancestor);
        }
        None
    }

    /// Follow child indices from `root`.
    pub fn element_at_tree_path(&self, root: ElementId, path: &[usize]) -> Option<ElementId> {
        let mut current = root;
        for &index in path {
            current = *self.physical_children(current).get(index)?;
        }
        Some(current)
    }

    /// First element in depth-first order, starting with `root`, for which
    /// `predicate` holds.
    pub fn find_element_in_tree(
        &self,
        root: ElementId,
        mut predicate: impl FnMut(&Tree, ElementId) -> bool,
    ) -> Option<ElementId> {
        let mut current = Some(root);
        while let Some(id) = current {
            if predicate(self, id) {
                return Some(id);
            }
            current = self.next_element_depth_first(id, Some(root));
        }
        None
    }

    pub fn find_by_name(&self, root: ElementId, name: &str) -> Option<ElementId> {
        self.find_element_in_tree(root, |tree, id| tree.name(id) == Some(name))
    }

    /// Pre-order successor of `id`, staying inside `scope` when given.
    pub fn next_element_depth_first(&self, id: ElementId, scope: Option<ElementId>) -> Option<ElementId> {
        if let Some(&first) = self.physical_children(id).first() {
            return Some(first);
        }

        let mut current = id;
        loop {
            if Some(current) == scope {
                return None;
            }
            let parent = self.physical_parent(current)?;
            let siblings = self.physical_children(parent);
            let index = siblings.iter().position(|&c| c == current)?;
            if let Some(&next) = siblings.get(index + 1) {
                return Some(next);
            }
            current = parent;
        }
    }

    /// Pre-order predecessor of `id`, staying inside `scope` when given.
    pub fn previous_element_depth_first(
        &self,
        id: ElementId,
        scope: Option<ElementId>,
    ) -> Option<ElementId> {
        if Some(id) == scope {
            return None;
        }
        let parent = self.physical_parent(id)?;
        let siblings = self.physical_children(parent);
        let index = siblings.iter().position(|&c| c == id)?;
        if index == 0 {
            return Some(parent);
        }

        let mut current = siblings[index - 1];
        while let Some(&last) = self.physical_children(current).last() {
            current = last;
        }
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::VisualElement;

    fn chain(tree: &mut Tree, parent: ElementId, len: usize) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut current = parent;
        for _ in 0..len {
            let next = tree.create_element(VisualElement::new());
            tree.hierarchy(current).add(next).unwrap();
            out.push(next);
            current = next;
        }
        out
    }

    #[test]
    fn test_contains_is_strict() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let c = chain(&mut tree, root, 3);

        assert!(tree.contains(root, c[2]));
        assert!(tree.contains(c[0], c[2]));
        assert!(!tree.contains(c[2], c[0]));
        assert!(!tree.contains(root, root));
    }

    #[test]
    fn test_common_ancestor_of_self_and_descendant() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let c = chain(&mut tree, root, 2);

        assert_eq!(tree.find_common_ancestor(c[1], c[1]), Ok(Some(c[1])));
        assert_eq!(tree.find_common_ancestor(c[0], c[1]), Ok(Some(c[0])));
    }

    #[test]
    fn test_common_ancestor_of_detached_trees() {
        let mut tree = Tree::new();
        let a = tree.create_element(VisualElement::new());
        let b = tree.create_element(VisualElement::new());
        assert_eq!(tree.find_common_ancestor(a, b), Ok(None));
    }

    #[test]
    fn test_depth_first_walk() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let a = tree.create_element(VisualElement::new());
        let a1 = tree.create_element(VisualElement::new());
        let b = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(a).unwrap();
        tree.hierarchy(a).add(a1).unwrap();
        tree.hierarchy(root).add(b).unwrap();

        let mut order = vec![root];
        let mut current = root;
        while let Some(next) = tree.next_element_depth_first(current, Some(root)) {
            order.push(next);
            current = next;
        }
        assert_eq!(order, vec![root, a, a1, b]);

        assert_eq!(tree.previous_element_depth_first(b, Some(root)), Some(a1));
        assert_eq!(tree.previous_element_depth_first(a1, Some(root)), Some(a));
        assert_eq!(tree.previous_element_depth_first(a, Some(root)), Some(root));
        assert_eq!(tree.previous_element_depth_first(root, Some(root)), None);
    }

    #[test]
    fn test_tree_path_and_find() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let c = chain(&mut tree, root, 3);
        tree.set_name(c[2], "leaf");

        assert_eq!(tree.element_at_tree_path(root, &[0, 0, 0]), Some(c[2]));
        assert_eq!(tree.element_at_tree_path(root, &[1]), None);
        assert_eq!(tree.find_by_name(root, "leaf"), Some(c[2]));
        assert_eq!(
            tree.first_ancestor_where(c[2], |_, id| id == c[0]),
            Some(c[0])
        );
        assert_eq!(tree.root(c[2]), root);
    }

    #[test]
    fn test_root_visual_container_is_outermost() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let c = chain(&mut tree, root, 3);
        tree.set_root_visual_container(c[0], true);
        tree.set_root_visual_container(c[1], true);

        assert_eq!(tree.root_visual_container(c[2]), Some(c[0]));
        assert_eq!(tree.root_visual_container(root), None);
    }

    #[test]
    fn test_retarget_hides_composite_internals() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let outside = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(outside).unwrap();
        let c = chain(&mut tree, root, 4);
        let (composite, leaf) = (c[0], c[3]);
        tree.set_composite_root(composite, true);

        assert_eq!(tree.retarget_element(leaf, Some(outside)), composite);
        assert_eq!(tree.retarget_element(leaf, None), leaf);

        let inside = tree.create_element(VisualElement::new());
        tree.hierarchy(c[1]).add(inside).unwrap();
        assert_eq!(tree.retarget_element(leaf, Some(inside)), leaf);
    }

    #[test]
    fn test_retarget_through_nested_composites() {
        let mut tree = Tree::new();
        let root = tree.create_element(VisualElement::new());
        let outside = tree.create_element(VisualElement::new());
        tree.hierarchy(root).add(outside).unwrap();
        // root -> outer -> c1 -> inner -> c3 -> leaf
        let c = chain(&mut tree, root, 5);
        let (outer, inner, leaf) = (c[0], c[2], c[4]);
        tree.set_composite_root(outer, true);
        tree.set_composite_root(inner, true);

        // Outside both: the outermost composite root crossed wins.
        assert_eq!(tree.retarget_element(leaf, Some(outside)), outer);

        // Between the two roots: only the inner composite is hidden.
        let between = tree.create_element(VisualElement::new());
        tree.hierarchy(c[1]).add(between).unwrap();
        assert_eq!(tree.retarget_element(leaf, Some(between)), inner);

        // Inside the inner composite: nothing to hide.
        let sibling = tree.create_element(VisualElement::new());
        tree.hierarchy(c[3]).add(sibling).unwrap();
        assert_eq!(tree.retarget_element(leaf, Some(sibling)), leaf);
    }
}
