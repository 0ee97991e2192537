//! Flatten a location tree into an ordered, depth-annotated display list
//!
//! The output drives the `tree` command: roots first in sibling order, the
//! children of expanded nodes directly after their parent, then every node
//! that cannot be reached from a root in a separate "unreachable" group.

use std::collections::HashSet;

use super::query::ancestors_of;
use super::tree::{LocationTree, TreeNode};

/// What to show
#[derive(Debug, Clone, Default)]
pub struct FlattenOptions {
    /// Ids whose children are visible
    pub expanded: HashSet<String>,
    /// Treat every node as expanded
    pub expand_all: bool,
    /// Case-insensitive substring matched against labels
    pub filter: Option<String>,
}

impl FlattenOptions {
    /// Everything expanded, no filter
    pub fn all() -> Self {
        Self {
            expand_all: true,
            ..Default::default()
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        let filter = filter.into();
        self.filter = if filter.trim().is_empty() { None } else { Some(filter) };
        self
    }
}

/// One visible row
#[derive(Debug, Clone)]
pub struct VisibleNode<'a, N> {
    pub node: &'a N,
    /// Root = 0; unreachable nodes are always 0
    pub depth: usize,
    /// Children are shown below this row
    pub expanded: bool,
    pub has_children: bool,
    /// The node's own label matches the active filter
    pub matched: bool,
    /// The node is not reachable from any root
    pub unreachable: bool,
}

/// Display list plus a count of rows in the unreachable group
#[derive(Debug)]
pub struct Flattened<'a, N> {
    pub rows: Vec<VisibleNode<'a, N>>,
    pub unreachable: usize,
}

impl<'a, N> Flattened<'a, N> {
    /// Rows reached from a root
    pub fn tree_rows(&self) -> &[VisibleNode<'a, N>] {
        &self.rows[..self.rows.len() - self.unreachable]
    }

    /// Rows in the unreachable group
    pub fn unreachable_rows(&self) -> &[VisibleNode<'a, N>] {
        &self.rows[self.rows.len() - self.unreachable..]
    }
}

/// Produce the visible rows for a tree
pub fn flatten<'a, N: TreeNode>(
    tree: &LocationTree<'a, N>,
    options: &FlattenOptions,
) -> Flattened<'a, N> {
    let needle = options.filter.as_ref().map(|f| f.to_lowercase());
    let is_match = |node: &N| {
        needle
            .as_deref()
            .is_some_and(|n| node.label().to_lowercase().contains(n))
    };

    // With a filter, only matches and their ancestors are relevant, and the
    // ancestors are forced open so each match is visible.
    let mut relevant: HashSet<&'a str> = HashSet::new();
    let mut forced_open: HashSet<&'a str> = HashSet::new();
    if needle.is_some() {
        for node in tree.iter().filter(|n| is_match(*n)) {
            let chain = ancestors_of(tree, node.node_id());
            for (i, ancestor) in chain.iter().enumerate() {
                relevant.insert(ancestor.node_id());
                if i + 1 < chain.len() {
                    forced_open.insert(ancestor.node_id());
                }
            }
        }
    }

    let visible = |node: &N| needle.is_none() || relevant.contains(node.node_id());
    let is_open = |node: &N| {
        options.expand_all
            || options.expanded.contains(node.node_id())
            || forced_open.contains(node.node_id())
    };

    let mut rows = Vec::new();
    let mut emitted: HashSet<&'a str> = HashSet::with_capacity(tree.len());

    let mut stack: Vec<(&'a N, usize)> = tree.roots().iter().rev().map(|&n| (n, 0)).collect();
    while let Some((node, depth)) = stack.pop() {
        if !visible(node) || !emitted.insert(node.node_id()) {
            continue;
        }

        let children = tree.children_of(Some(node.node_id()));
        let expanded = is_open(node);
        rows.push(VisibleNode {
            node,
            depth,
            expanded,
            has_children: !children.is_empty(),
            matched: is_match(node),
            unreachable: false,
        });

        if expanded {
            for &child in children.iter().rev() {
                if !emitted.contains(child.node_id()) {
                    stack.push((child, depth + 1));
                }
            }
        }
    }

    let reachable = tree.reachable();
    let mut unreachable = 0;
    for node in tree.iter() {
        if reachable.contains(node.node_id()) || !visible(node) {
            continue;
        }
        if !emitted.insert(node.node_id()) {
            continue;
        }
        rows.push(VisibleNode {
            node,
            depth: 0,
            expanded: false,
            has_children: !tree.children_of(Some(node.node_id())).is_empty(),
            matched: is_match(node),
            unreachable: true,
        });
        unreachable += 1;
    }

    Flattened { rows, unreachable }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::tree::testing::{named, node};

    fn labels<N: TreeNode>(rows: &[VisibleNode<'_, N>]) -> Vec<String> {
        rows.iter().map(|r| r.node.label().to_string()).collect()
    }

    fn expanded(ids: &[&str]) -> FlattenOptions {
        FlattenOptions {
            expanded: ids.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_collapsed_tree_shows_only_roots() {
        let nodes = vec![node("A", None), node("B", Some("A")), node("C", None)];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::default());

        assert_eq!(labels(&flat.rows), vec!["A", "C"]);
        assert!(flat.rows[0].has_children);
        assert!(!flat.rows[0].expanded);
    }

    #[test]
    fn test_expanded_children_follow_parent_with_depth() {
        let nodes = vec![
            node("A", None),
            node("B", Some("A")),
            node("C", Some("B")),
            node("D", None),
        ];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &expanded(&["A"]));

        assert_eq!(labels(&flat.rows), vec!["A", "B", "D"]);
        let depths: Vec<usize> = flat.rows.iter().map(|r| r.depth).collect();
        assert_eq!(depths, vec![0, 1, 0]);
    }

    #[test]
    fn test_expand_all_covers_every_id_exactly_once() {
        let nodes = vec![
            node("R", None),
            node("X", Some("R")),
            node("Y", Some("X")),
            node("A", Some("B")),
            node("B", Some("A")),
            node("S", Some("S")),
            node("O", Some("nowhere")),
            node("P", Some("O")),
        ];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::all());

        let mut seen: Vec<&str> = flat.rows.iter().map(|r| r.node.node_id()).collect();
        assert_eq!(seen.len(), nodes.len());
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), nodes.len());
    }

    #[test]
    fn test_filter_forces_ancestors_visible() {
        let nodes = vec![
            named("k", None, "Kitchen"),
            named("p", Some("k"), "Pantry"),
            named("t", Some("p"), "Top Shelf"),
            named("g", None, "Garage"),
        ];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::default().with_filter("Top"));

        assert_eq!(labels(&flat.rows), vec!["Kitchen", "Pantry", "Top Shelf"]);
        assert!(flat.rows[0].expanded);
        assert!(flat.rows[1].expanded);
        assert!(flat.rows[2].matched);
        assert!(!flat.rows[0].matched);
    }

    #[test]
    fn test_filter_is_case_insensitive_and_hides_unrelated_branches() {
        let nodes = vec![
            named("k", None, "Kitchen"),
            named("d", Some("k"), "Drawer"),
            named("g", None, "Garage"),
        ];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::all().with_filter("gar"));

        assert_eq!(labels(&flat.rows), vec!["Garage"]);
    }

    #[test]
    fn test_unreachable_bucket_holds_orphan_once() {
        let nodes = vec![node("A", None), node("O", Some("ghost"))];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::all());

        assert_eq!(labels(flat.tree_rows()), vec!["A"]);
        assert_eq!(labels(flat.unreachable_rows()), vec!["O"]);
        assert!(flat.unreachable_rows()[0].unreachable);
        assert_eq!(flat.unreachable_rows()[0].depth, 0);
    }

    #[test]
    fn test_unreachable_bucket_respects_filter() {
        let nodes = vec![named("a", Some("b"), "Attic"), named("b", Some("a"), "Basement")];
        let tree = LocationTree::build(&nodes);
        let flat = flatten(&tree, &FlattenOptions::all().with_filter("attic"));

        // Basement is the parent of Attic, so it is kept as an ancestor
        assert_eq!(flat.unreachable, 2);
        assert!(flat.rows.iter().any(|r| r.matched && r.node.label() == "Attic"));
    }

    #[test]
    fn test_blank_filter_is_ignored() {
        let opts = FlattenOptions::all().with_filter("   ");
        assert!(opts.filter.is_none());
    }
}
