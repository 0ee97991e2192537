//! Cycle-safe aggregation of per-location metrics
//!
//! `aggregate(id) = metric(id) + sum(aggregate(child))` for every location.
//! Cycles in the parent relation are found in a single pass over the whole
//! snapshot before any sums are taken, and every edge between two members of
//! the same cycle is treated as absent. The result does not depend on which
//! node a traversal happens to start from.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::ops::Add;

use super::tree::{LocationTree, TreeNode};

/// A value that can be summed up a location tree
pub trait Metric: Copy + Default + Add<Output = Self> {}

impl<T: Copy + Default + Add<Output = T>> Metric for T {}

/// Count, value and depreciated value of the items under a location
#[derive(Debug, Clone, Copy, Default, PartialEq, serde::Serialize)]
pub struct LocationTotals {
    pub item_count: u64,
    pub value: f64,
    pub depreciated_value: f64,
}

impl Add for LocationTotals {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            item_count: self.item_count + other.item_count,
            value: self.value + other.value,
            depreciated_value: self.depreciated_value + other.depreciated_value,
        }
    }
}

/// Direct and rolled-up metric for every location in a snapshot
#[derive(Debug, Clone)]
pub struct Rollup<M> {
    direct: HashMap<String, M>,
    totals: HashMap<String, M>,
    cycle_members: BTreeSet<String>,
}

impl<M: Metric> Rollup<M> {
    /// Aggregate `metric` over the tree
    ///
    /// `metric` is called exactly once per location id.
    pub fn compute<N, F>(tree: &LocationTree<'_, N>, metric: F) -> Self
    where
        N: TreeNode,
        F: Fn(&str) -> M,
    {
        let cycle_members = find_cycle_members(tree);
        if !cycle_members.is_empty() {
            tracing::debug!(count = cycle_members.len(), "location cycle detected");
        }

        let direct: HashMap<String, M> = tree
            .iter()
            .map(|n| (n.node_id().to_string(), metric(n.node_id())))
            .collect();

        let members = &cycle_members;
        let kept_children = move |id: &str| {
            let in_cycle = members.contains(id);
            tree.children_of(Some(id))
                .iter()
                .copied()
                .filter(move |child| !(in_cycle && members.contains(child.node_id())))
        };

        let mut totals: HashMap<String, M> = HashMap::with_capacity(direct.len());
        let mut visiting: HashSet<&str> = HashSet::new();

        for start in tree.iter() {
            if totals.contains_key(start.node_id()) {
                continue;
            }

            // Post-order walk; `true` marks a node whose children are done
            let mut stack: Vec<(&N, bool)> = vec![(start, false)];
            while let Some((node, children_done)) = stack.pop() {
                let id = node.node_id();

                if children_done {
                    let mut total = direct.get(id).copied().unwrap_or_default();
                    for child in kept_children(id) {
                        total = total + totals.get(child.node_id()).copied().unwrap_or_default();
                    }
                    totals.insert(id.to_string(), total);
                    visiting.remove(id);
                    continue;
                }

                if totals.contains_key(id) || !visiting.insert(id) {
                    continue;
                }

                stack.push((node, true));
                for child in kept_children(id) {
                    let child_id = child.node_id();
                    if !totals.contains_key(child_id) && !visiting.contains(child_id) {
                        stack.push((child, false));
                    }
                }
            }
        }

        Self {
            direct,
            totals,
            cycle_members: cycle_members.into_iter().map(String::from).collect(),
        }
    }

    /// Metric of the location's own items
    pub fn direct(&self, id: &str) -> M {
        self.direct.get(id).copied().unwrap_or_default()
    }

    /// Metric of the location and everything below it
    pub fn aggregate(&self, id: &str) -> M {
        self.totals.get(id).copied().unwrap_or_default()
    }

    /// Ids of every location that sits on a parent cycle
    pub fn cycle_members(&self) -> &BTreeSet<String> {
        &self.cycle_members
    }

    pub fn is_cycle_member(&self, id: &str) -> bool {
        self.cycle_members.contains(id)
    }

    /// Sum of every location's direct metric, each counted once
    pub fn grand_total(&self) -> M {
        self.direct.values().fold(M::default(), |acc, &m| acc + m)
    }
}

/// Walk parent links from every node and collect the nodes that lie on a cycle
///
/// Each node has at most one parent, so cycles are simple and disjoint; a
/// node is on a cycle exactly when following parents from it returns to it.
fn find_cycle_members<'a, N: TreeNode>(tree: &LocationTree<'a, N>) -> HashSet<&'a str> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        OnPath,
        Done,
    }

    let mut marks: HashMap<&'a str, Mark> = HashMap::with_capacity(tree.len());
    let mut members: HashSet<&'a str> = HashSet::new();

    for start in tree.iter() {
        let mut path: Vec<&'a str> = Vec::new();
        let mut current = Some(start);

        while let Some(node) = current {
            let id = node.node_id();
            match marks.get(id) {
                Some(Mark::Done) => break,
                Some(Mark::OnPath) => {
                    if let Some(pos) = path.iter().position(|&p| p == id) {
                        members.extend(path[pos..].iter().copied());
                    }
                    break;
                }
                None => {
                    marks.insert(id, Mark::OnPath);
                    path.push(id);
                    current = tree.parent_of(id);
                }
            }
        }

        for id in path {
            marks.insert(id, Mark::Done);
        }
    }

    members
}
