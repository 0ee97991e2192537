//! Ancestor and descendant queries over a location tree

use std::collections::{BTreeSet, HashSet};

use super::tree::{LocationTree, TreeNode};

/// Chain from the furthest reachable ancestor down to `id` itself
///
/// The upward walk stops at a missing parent or at the first repeated id, so a
/// parent cycle yields the partial chain walked so far. Unknown ids give an
/// empty chain.
pub fn ancestors_of<'a, N: TreeNode>(tree: &LocationTree<'a, N>, id: &str) -> Vec<&'a N> {
    let mut chain = Vec::new();
    let mut seen: HashSet<&'a str> = HashSet::new();
    let mut current = tree.by_id(id);

    while let Some(node) = current {
        if !seen.insert(node.node_id()) {
            break;
        }
        chain.push(node);
        current = tree.parent_of(node.node_id());
    }

    chain.reverse();
    chain
}

/// `id` and every node reachable below it
pub fn descendants_of<'a, N: TreeNode>(tree: &LocationTree<'a, N>, id: &str) -> HashSet<&'a str> {
    let mut found: HashSet<&'a str> = HashSet::new();
    let Some(start) = tree.by_id(id) else {
        return found;
    };

    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if !found.insert(node.node_id()) {
            continue;
        }
        for &child in tree.children_of(Some(node.node_id())) {
            if !found.contains(child.node_id()) {
                stack.push(child);
            }
        }
    }

    found
}

/// Labels of the ancestor chain joined with `separator`
pub fn breadcrumb<N: TreeNode>(tree: &LocationTree<'_, N>, id: &str, separator: &str) -> String {
    ancestors_of(tree, id)
        .iter()
        .map(|n| n.label())
        .collect::<Vec<_>>()
        .join(separator)
}

/// Branch selection: selecting a node selects its whole subtree
#[derive(Debug, Clone, Default)]
pub struct Selection {
    selected: BTreeSet<String>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select (or deselect) `id` together with all of its descendants
    pub fn toggle_branch<N: TreeNode>(
        &mut self,
        tree: &LocationTree<'_, N>,
        id: &str,
        select: bool,
    ) {
        for member in descendants_of(tree, id) {
            if select {
                self.selected.insert(member.to_string());
            } else {
                self.selected.remove(member);
            }
        }
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }

    /// Every selected location; the set is closed under descendants because
    /// selection always toggles whole branches
    pub fn location_ids(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Keep the items stored somewhere inside the selection
    pub fn filter_items<'i, T, F>(&self, items: &'i [T], location_of: F) -> Vec<&'i T>
    where
        F: Fn(&T) -> Option<&str>,
    {
        items
            .iter()
            .filter(|item| location_of(*item).is_some_and(|loc| self.selected.contains(loc)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tree::testing::{named, node};

    fn sorted(set: HashSet<&str>) -> Vec<&str> {
        let mut v: Vec<&str> = set.into_iter().collect();
        v.sort();
        v
    }

    #[test]
    fn test_ancestor_chain_root_first() {
        let nodes = vec![node("A", None), node("B", Some("A")), node("C", Some("B"))];
        let tree = LocationTree::build(&nodes);

        let chain: Vec<&str> = ancestors_of(&tree, "C").iter().map(|n| n.node_id()).collect();
        assert_eq!(chain, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_ancestor_chain_stops_on_cycle() {
        let nodes = vec![node("A", Some("B")), node("B", Some("A"))];
        let tree = LocationTree::build(&nodes);

        let chain: Vec<&str> = ancestors_of(&tree, "A").iter().map(|n| n.node_id()).collect();
        assert_eq!(chain, vec!["B", "A"]);
    }

    #[test]
    fn test_ancestor_chain_of_self_loop_and_unknown() {
        let nodes = vec![node("S", Some("S"))];
        let tree = LocationTree::build(&nodes);

        assert_eq!(ancestors_of(&tree, "S").len(), 1);
        assert!(ancestors_of(&tree, "missing").is_empty());
    }

    #[test]
    fn test_ancestor_chain_stops_at_missing_parent() {
        let nodes = vec![node("O", Some("ghost")), node("P", Some("O"))];
        let tree = LocationTree::build(&nodes);

        let chain: Vec<&str> = ancestors_of(&tree, "P").iter().map(|n| n.node_id()).collect();
        assert_eq!(chain, vec!["O", "P"]);
    }

    #[test]
    fn test_descendant_set() {
        let nodes = vec![
            node("R", None),
            node("X", Some("R")),
            node("Y", Some("R")),
            node("Z", Some("X")),
            node("other", None),
        ];
        let tree = LocationTree::build(&nodes);

        assert_eq!(sorted(descendants_of(&tree, "R")), vec!["R", "X", "Y", "Z"]);
        assert_eq!(sorted(descendants_of(&tree, "Z")), vec!["Z"]);
        assert!(descendants_of(&tree, "nope").is_empty());
    }

    #[test]
    fn test_descendant_set_terminates_on_cycle() {
        let nodes = vec![node("A", Some("B")), node("B", Some("A")), node("S", Some("S"))];
        let tree = LocationTree::build(&nodes);

        assert_eq!(sorted(descendants_of(&tree, "A")), vec!["A", "B"]);
        assert_eq!(sorted(descendants_of(&tree, "S")), vec!["S"]);
    }

    #[test]
    fn test_breadcrumb() {
        let nodes = vec![
            named("h", None, "House"),
            named("k", Some("h"), "Kitchen"),
            named("p", Some("k"), "Pantry"),
        ];
        let tree = LocationTree::build(&nodes);

        assert_eq!(breadcrumb(&tree, "p", " / "), "House / Kitchen / Pantry");
    }

    #[test]
    fn test_selection_selects_and_deselects_branch() {
        let nodes = vec![
            node("R", None),
            node("X", Some("R")),
            node("Z", Some("X")),
            node("Q", None),
        ];
        let tree = LocationTree::build(&nodes);
        let mut selection = Selection::new();

        selection.toggle_branch(&tree, "R", true);
        assert!(selection.is_selected("Z"));
        assert!(!selection.is_selected("Q"));

        selection.toggle_branch(&tree, "X", false);
        assert!(selection.is_selected("R"));
        assert!(!selection.is_selected("X"));
        assert!(!selection.is_selected("Z"));
    }

    #[test]
    fn test_selection_filters_items_by_descendants() {
        let nodes = vec![node("R", None), node("X", Some("R")), node("Q", None)];
        let tree = LocationTree::build(&nodes);
        let items = vec![("lamp", Some("X")), ("rake", Some("Q")), ("loose", None)];

        let mut selection = Selection::new();
        selection.toggle_branch(&tree, "R", true);
        let kept = selection.filter_items(&items, |item| item.1);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "lamp");
    }

    #[test]
    fn test_deselected_sub_branch_drops_its_items() {
        let nodes = vec![node("R", None), node("X", Some("R")), node("Z", Some("X"))];
        let tree = LocationTree::build(&nodes);
        let items = vec![("shelf", Some("R")), ("jar", Some("Z"))];

        let mut selection = Selection::new();
        selection.toggle_branch(&tree, "R", true);
        selection.toggle_branch(&tree, "X", false);

        assert!(!selection.location_ids().contains("Z"));
        let kept = selection.filter_items(&items, |item| item.1);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].0, "shelf");
    }
}
