//! Tree builder - indexes a flat list of location records by parent
//!
//! The parent relation is *supposed* to form a forest, but nothing in the
//! on-disk data guarantees it. The index is therefore built without any
//! validation: dangling parents, self-parents and cycles are all accepted and
//! surfaced later by the rollup and flatten passes.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A record that can be placed in a location tree
pub trait TreeNode {
    /// Unique identifier of this node
    fn node_id(&self) -> &str;

    /// Identifier of the parent node, `None` for a root
    fn parent_id(&self) -> Option<&str>;

    /// Display label (not required to be unique)
    fn label(&self) -> &str;

    /// Explicit sibling position, lower first
    fn sort_order(&self) -> Option<i64> {
        None
    }
}

/// Parent -> children index over a snapshot of nodes
#[derive(Debug)]
pub struct LocationTree<'a, N> {
    /// Nodes in input order (duplicates removed)
    nodes: Vec<&'a N>,
    /// Node id -> position in `nodes`
    index: HashMap<&'a str, usize>,
    /// Parent id -> ordered children
    children: HashMap<&'a str, Vec<&'a N>>,
    /// Nodes without a parent, ordered
    roots: Vec<&'a N>,
    /// Nodes whose parent id does not exist in the snapshot
    dangling: Vec<&'a N>,
    /// Records dropped because their id was already taken
    duplicates: Vec<&'a N>,
}

impl<'a, N: TreeNode> LocationTree<'a, N> {
    /// Index a flat list of nodes
    pub fn build(records: &'a [N]) -> Self {
        let mut nodes: Vec<&'a N> = Vec::with_capacity(records.len());
        let mut index: HashMap<&'a str, usize> = HashMap::with_capacity(records.len());
        let mut duplicates = Vec::new();

        for record in records {
            if index.contains_key(record.node_id()) {
                duplicates.push(record);
                continue;
            }
            index.insert(record.node_id(), nodes.len());
            nodes.push(record);
        }

        let mut children: HashMap<&'a str, Vec<&'a N>> = HashMap::new();
        let mut roots = Vec::new();
        let mut dangling = Vec::new();

        for &node in &nodes {
            match normalized_parent(node) {
                None => roots.push(node),
                Some(parent) if index.contains_key(parent) => {
                    children.entry(parent).or_default().push(node);
                }
                Some(parent) => {
                    tracing::debug!(id = node.node_id(), parent, "location parent does not exist");
                    dangling.push(node);
                }
            }
        }

        let position = |n: &N| index.get(n.node_id()).copied().unwrap_or(usize::MAX);
        let compare = |a: &&'a N, b: &&'a N| sibling_order(*a, *b, position(*a), position(*b));

        roots.sort_by(compare);
        for siblings in children.values_mut() {
            siblings.sort_by(compare);
        }

        Self {
            nodes,
            index,
            children,
            roots,
            dangling,
            duplicates,
        }
    }

    /// Ordered children of a node, or the roots when `parent` is `None`
    pub fn children_of(&self, parent: Option<&str>) -> &[&'a N] {
        match parent {
            None => &self.roots,
            Some(id) => self.children.get(id).map(Vec::as_slice).unwrap_or(&[]),
        }
    }

    /// Look up a node by id
    pub fn by_id(&self, id: &str) -> Option<&'a N> {
        self.index.get(id).map(|&i| self.nodes[i])
    }

    /// Parent of a node, if the node exists and its parent exists
    pub fn parent_of(&self, id: &str) -> Option<&'a N> {
        self.by_id(id)
            .and_then(normalized_parent)
            .and_then(|parent| self.by_id(parent))
    }

    /// Whether the snapshot contains this id
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Root nodes in sibling order
    pub fn roots(&self) -> &[&'a N] {
        &self.roots
    }

    /// Nodes whose parent reference points at nothing
    pub fn dangling(&self) -> &[&'a N] {
        &self.dangling
    }

    /// Records ignored because an earlier record used the same id
    pub fn duplicates(&self) -> &[&'a N] {
        &self.duplicates
    }

    /// All nodes in input order
    pub fn iter(&self) -> impl Iterator<Item = &'a N> + '_ {
        self.nodes.iter().copied()
    }

    /// Number of distinct nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Ids reachable by descending from the roots
    ///
    /// Independent of any expand/collapse state; used to decide which nodes
    /// belong in the unreachable bucket.
    pub fn reachable(&self) -> HashSet<&'a str> {
        let mut seen: HashSet<&'a str> = HashSet::with_capacity(self.nodes.len());
        let mut stack: Vec<&'a N> = self.roots.iter().rev().copied().collect();

        while let Some(node) = stack.pop() {
            if !seen.insert(node.node_id()) {
                continue;
            }
            for &child in self.children_of(Some(node.node_id())).iter().rev() {
                if !seen.contains(child.node_id()) {
                    stack.push(child);
                }
            }
        }

        seen
    }
}

/// Treat an empty parent string the same as no parent
fn normalized_parent<N: TreeNode>(node: &N) -> Option<&str> {
    node.parent_id().map(str::trim).filter(|p| !p.is_empty())
}

/// Sibling ordering: explicit sort order first, then name, then input order
fn sibling_order<N: TreeNode>(a: &N, b: &N, pos_a: usize, pos_b: usize) -> Ordering {
    let by_order = match (a.sort_order(), b.sort_order()) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };

    by_order
        .then_with(|| a.label().to_lowercase().cmp(&b.label().to_lowercase()))
        .then_with(|| pos_a.cmp(&pos_b))
}

#[cfg(test)]
pub(crate) mod testing {
    use super::TreeNode;

    /// Minimal node for engine tests
    #[derive(Debug, Clone)]
    pub struct Node {
        pub id: String,
        pub parent: Option<String>,
        pub name: String,
        pub order: Option<i64>,
    }

    impl TreeNode for Node {
        fn node_id(&self) -> &str {
            &self.id
        }

        fn parent_id(&self) -> Option<&str> {
            self.parent.as_deref()
        }

        fn label(&self) -> &str {
            &self.name
        }

        fn sort_order(&self) -> Option<i64> {
            self.order
        }
    }

    /// Node named after its id
    pub fn node(id: &str, parent: Option<&str>) -> Node {
        named(id, parent, id)
    }

    pub fn named(id: &str, parent: Option<&str>, name: &str) -> Node {
        Node {
            id: id.to_string(),
            parent: parent.map(String::from),
            name: name.to_string(),
            order: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{named, node};
    use super::*;

    fn ids<N: TreeNode>(nodes: &[&N]) -> Vec<String> {
        nodes.iter().map(|n| n.node_id().to_string()).collect()
    }

    #[test]
    fn test_build_indexes_children_and_roots() {
        let nodes = vec![
            node("A", None),
            node("B", Some("A")),
            node("C", Some("A")),
            node("D", None),
        ];
        let tree = LocationTree::build(&nodes);

        assert_eq!(ids(tree.roots()), vec!["A", "D"]);
        assert_eq!(ids(tree.children_of(Some("A"))), vec!["B", "C"]);
        assert!(tree.children_of(Some("B")).is_empty());
        assert_eq!(tree.by_id("C").map(|n| n.name.as_str()), Some("C"));
        assert!(tree.by_id("Z").is_none());
        assert_eq!(tree.parent_of("B").map(|n| n.id.as_str()), Some("A"));
    }

    #[test]
    fn test_sibling_order_uses_sort_order_then_name_then_input() {
        let mut first = named("1", Some("R"), "zebra");
        first.order = Some(2);
        let mut second = named("2", Some("R"), "apple");
        second.order = Some(1);
        let third = named("3", Some("R"), "Mango");
        let fourth = named("4", Some("R"), "banana");
        let fifth = named("5", Some("R"), "banana");

        let nodes = vec![node("R", None), first, second, third, fourth, fifth];
        let tree = LocationTree::build(&nodes);

        assert_eq!(ids(tree.children_of(Some("R"))), vec!["2", "1", "4", "5", "3"]);
    }

    #[test]
    fn test_dangling_parent_is_not_a_root() {
        let nodes = vec![node("A", None), node("O", Some("missing"))];
        let tree = LocationTree::build(&nodes);

        assert_eq!(ids(tree.roots()), vec!["A"]);
        assert_eq!(ids(tree.dangling()), vec!["O"]);
        assert!(tree.children_of(Some("missing")).is_empty());
    }

    #[test]
    fn test_empty_parent_string_is_root() {
        let nodes = vec![node("A", Some("  "))];
        let tree = LocationTree::build(&nodes);
        assert_eq!(ids(tree.roots()), vec!["A"]);
    }

    #[test]
    fn test_self_parent_is_its_own_child() {
        let nodes = vec![node("S", Some("S"))];
        let tree = LocationTree::build(&nodes);

        assert!(tree.roots().is_empty());
        assert_eq!(ids(tree.children_of(Some("S"))), vec!["S"]);
        assert!(tree.reachable().is_empty());
    }

    #[test]
    fn test_duplicate_ids_keep_first() {
        let nodes = vec![named("A", None, "first"), named("A", None, "second")];
        let tree = LocationTree::build(&nodes);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree.by_id("A").map(|n| n.name.as_str()), Some("first"));
        assert_eq!(tree.duplicates().len(), 1);
    }

    #[test]
    fn test_reachable_excludes_cycles_and_orphans() {
        let nodes = vec![
            node("R", None),
            node("X", Some("R")),
            node("A", Some("B")),
            node("B", Some("A")),
            node("O", Some("gone")),
        ];
        let tree = LocationTree::build(&nodes);
        let reachable = tree.reachable();

        assert!(reachable.contains("R"));
        assert!(reachable.contains("X"));
        assert!(!reachable.contains("A"));
        assert!(!reachable.contains("B"));
        assert!(!reachable.contains("O"));
    }
}
